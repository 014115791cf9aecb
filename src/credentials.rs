use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RealError, Result};

/// Temporary AWS credentials as handed out by the identity pool.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretKey")]
    pub secret_key: String,
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    #[serde(
        rename = "Expiration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration: Option<DateTime<Utc>>,
}

impl AwsCredentials {
    pub fn new(access_key_id: &str, secret_key: &str, session_token: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_key: secret_key.to_string(),
            session_token: session_token.to_string(),
            expiration: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<REDACTED>")
            .field("session_token", &"<REDACTED>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// User pool tokens from a password sign-in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoolTokens {
    #[serde(rename = "IdToken")]
    pub id_token: String,
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "RefreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for UserPoolTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserPoolTokens(<REDACTED>)")
    }
}

/// The on-disk credential bundle written by `sign-in-user` and read by `delete-user`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensFile {
    pub credentials: AwsCredentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<UserPoolTokens>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl TokensFile {
    pub fn from_credentials(credentials: AwsCredentials) -> Self {
        Self {
            credentials,
            tokens: None,
            user_id: None,
            username: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let tokens: TokensFile = serde_json::from_str(&raw)?;
        if tokens.credentials.access_key_id.is_empty() || tokens.credentials.secret_key.is_empty() {
            return Err(RealError::InvalidInput(format!(
                "Credential file {:?} has an empty AccessKeyId or SecretKey",
                path
            )));
        }
        Ok(tokens)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
