//! Minimal client for the Cognito user pool and identity pool JSON APIs.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

use crate::config::CognitoConfig;
use crate::credentials::{AwsCredentials, UserPoolTokens};
use crate::error::{RealError, Result};

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const USER_POOL_SERVICE: &str = "AWSCognitoIdentityProviderService";
const IDENTITY_POOL_SERVICE: &str = "AWSCognitoIdentityService";

#[derive(Deserialize)]
struct ServiceError {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<UserPoolTokens>,
    #[serde(rename = "ChallengeName")]
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
struct GetIdResponse {
    #[serde(rename = "IdentityId")]
    identity_id: String,
}

#[derive(Deserialize)]
struct RawCredentials {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,
    #[serde(rename = "SecretKey")]
    secret_key: String,
    #[serde(rename = "SessionToken")]
    session_token: String,
    #[serde(rename = "Expiration")]
    expiration: Option<f64>,
}

#[derive(Deserialize)]
struct GetCredentialsResponse {
    #[serde(rename = "IdentityId")]
    identity_id: String,
    #[serde(rename = "Credentials")]
    credentials: RawCredentials,
}

/// Credentials for an identity pool identity.
#[derive(Debug, Clone)]
pub struct IdentityCredentials {
    pub identity_id: String,
    pub credentials: AwsCredentials,
}

#[derive(Debug, Clone)]
pub struct CognitoClient {
    config: CognitoConfig,
    region: String,
    http: reqwest::Client,
}

impl CognitoClient {
    pub fn new(config: CognitoConfig, region: &str) -> Self {
        Self {
            config,
            region: region.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &CognitoConfig {
        &self.config
    }

    fn logins(&self, id_token: &str) -> HashMap<String, String> {
        HashMap::from([(self.config.login_provider(&self.region), id_token.to_string())])
    }

    pub async fn sign_up(&self, username: &str, password: &str, email: &str) -> Result<()> {
        let body = json!({
            "ClientId": self.config.client_id,
            "Username": username,
            "Password": password,
            "UserAttributes": [{"Name": "email", "Value": email}],
        });
        let _: Value = self
            .call(&self.config.idp_endpoint, USER_POOL_SERVICE, "SignUp", &body)
            .await?;
        tracing::debug!(target: "real_integration::cognito", "Signed up user pool user {}", username);
        Ok(())
    }

    /// Removes a user pool user, authenticated by that user's own access token.
    pub async fn delete_user(&self, access_token: &str) -> Result<()> {
        let body = json!({"AccessToken": access_token});
        let _: Value = self
            .call(&self.config.idp_endpoint, USER_POOL_SERVICE, "DeleteUser", &body)
            .await?;
        Ok(())
    }

    pub async fn initiate_password_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserPoolTokens> {
        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.config.client_id,
            "AuthParameters": {"USERNAME": username, "PASSWORD": password},
        });
        let response: InitiateAuthResponse = self
            .call(&self.config.idp_endpoint, USER_POOL_SERVICE, "InitiateAuth", &body)
            .await?;

        match (response.authentication_result, response.challenge_name) {
            (Some(tokens), _) => Ok(tokens),
            (None, Some(challenge)) => Err(RealError::IdentityProvider {
                kind: "UnsupportedChallenge".to_string(),
                message: format!("Sign-in requires the {} challenge", challenge),
            }),
            (None, None) => Err(RealError::UnexpectedResponse(
                "InitiateAuth returned no AuthenticationResult".to_string(),
            )),
        }
    }

    /// Resolve an identity pool identity, unauthenticated when `id_token` is `None`.
    pub async fn get_id(&self, id_token: Option<&str>) -> Result<String> {
        let mut body = json!({"IdentityPoolId": self.config.identity_pool_id});
        if let Some(token) = id_token {
            body["Logins"] = json!(self.logins(token));
        }
        let response: GetIdResponse = self
            .call(&self.config.identity_endpoint, IDENTITY_POOL_SERVICE, "GetId", &body)
            .await?;
        Ok(response.identity_id)
    }

    pub async fn get_credentials_for_identity(
        &self,
        identity_id: &str,
        id_token: &str,
    ) -> Result<IdentityCredentials> {
        let body = json!({
            "IdentityId": identity_id,
            "Logins": self.logins(id_token),
        });
        let response: GetCredentialsResponse = self
            .call(
                &self.config.identity_endpoint,
                IDENTITY_POOL_SERVICE,
                "GetCredentialsForIdentity",
                &body,
            )
            .await?;

        let raw = response.credentials;
        Ok(IdentityCredentials {
            identity_id: response.identity_id,
            credentials: AwsCredentials {
                access_key_id: raw.access_key_id,
                secret_key: raw.secret_key,
                session_token: raw.session_token,
                expiration: raw.expiration.and_then(epoch_to_datetime),
            },
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &Url,
        service: &str,
        operation: &str,
        body: &Value,
    ) -> Result<T> {
        let response = self
            .http
            .post(endpoint.clone())
            .header("Content-Type", AMZ_JSON)
            .header("X-Amz-Target", format!("{}.{}", service, operation))
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(service_error(operation, status.as_u16(), &text));
        }
        // Some operations answer 200 with an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }
}

fn service_error(operation: &str, status: u16, body: &str) -> RealError {
    match serde_json::from_str::<ServiceError>(body) {
        Ok(ServiceError {
            error_type: Some(error_type),
            message,
        }) => RealError::IdentityProvider {
            kind: error_type
                .rsplit('#')
                .next()
                .unwrap_or(error_type.as_str())
                .to_string(),
            message: message.unwrap_or_else(|| format!("{} failed", operation)),
        },
        _ => RealError::UnexpectedResponse(format!(
            "{} returned {}: {}",
            operation, status, body
        )),
    }
}

fn epoch_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds.trunc() as i64, 0).single()
}
