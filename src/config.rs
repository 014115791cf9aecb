use reqwest::Url;

use crate::error::{RealError, Result};

pub const GRAPHQL_URL_VAR: &str = "APPSYNC_GRAPHQL_URL";
pub const REGION_VAR: &str = "AWS_REGION";
pub const USER_POOL_ID_VAR: &str = "COGNITO_USER_POOL_ID";
pub const CLIENT_ID_VAR: &str = "COGNITO_TESTING_CLIENT_ID";
pub const IDENTITY_POOL_ID_VAR: &str = "COGNITO_IDENTITY_POOL_ID";
pub const EMAIL_DOMAIN_VAR: &str = "COGNITO_TEST_EMAIL_DOMAIN";
pub const IDP_ENDPOINT_VAR: &str = "COGNITO_IDP_ENDPOINT";
pub const IDENTITY_ENDPOINT_VAR: &str = "COGNITO_IDENTITY_ENDPOINT";

const DEFAULT_EMAIL_DOMAIN: &str = "real.app";

/// Settings for the user pool and identity pool used to provision test users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CognitoConfig {
    pub user_pool_id: String,
    /// App client allowed to run `USER_PASSWORD_AUTH`
    pub client_id: String,
    pub identity_pool_id: String,
    pub email_domain: String,
    pub idp_endpoint: Url,
    pub identity_endpoint: Url,
}

impl CognitoConfig {
    /// Returns `Ok(None)` when none of the Cognito ids are set, and an error when
    /// only some of them are.
    pub fn from_vars<F>(region: &str, lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_pool_id = non_empty(&lookup, USER_POOL_ID_VAR);
        let client_id = non_empty(&lookup, CLIENT_ID_VAR);
        let identity_pool_id = non_empty(&lookup, IDENTITY_POOL_ID_VAR);

        let (user_pool_id, client_id, identity_pool_id) =
            match (user_pool_id, client_id, identity_pool_id) {
                (None, None, None) => return Ok(None),
                (Some(pool), Some(client), Some(identity)) => (pool, client, identity),
                _ => {
                    return Err(RealError::Configuration(format!(
                        "{}, {} and {} must all be defined to provision users",
                        USER_POOL_ID_VAR, CLIENT_ID_VAR, IDENTITY_POOL_ID_VAR
                    )));
                }
            };

        let idp_endpoint = match non_empty(&lookup, IDP_ENDPOINT_VAR) {
            Some(url) => parse_url(IDP_ENDPOINT_VAR, &url)?,
            None => parse_url(
                IDP_ENDPOINT_VAR,
                &format!("https://cognito-idp.{}.amazonaws.com/", region),
            )?,
        };
        let identity_endpoint = match non_empty(&lookup, IDENTITY_ENDPOINT_VAR) {
            Some(url) => parse_url(IDENTITY_ENDPOINT_VAR, &url)?,
            None => parse_url(
                IDENTITY_ENDPOINT_VAR,
                &format!("https://cognito-identity.{}.amazonaws.com/", region),
            )?,
        };

        Ok(Some(Self {
            user_pool_id,
            client_id,
            identity_pool_id,
            email_domain: non_empty(&lookup, EMAIL_DOMAIN_VAR)
                .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string()),
            idp_endpoint,
            identity_endpoint,
        }))
    }

    /// The provider name identity pools expect as the key of a `Logins` map.
    pub fn login_provider(&self, region: &str) -> String {
        format!("cognito-idp.{}.amazonaws.com/{}", region, self.user_pool_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealConfig {
    /// AppSync GraphQL endpoint
    pub graphql_url: Url,

    /// AWS region requests are signed for
    pub region: String,

    /// Only needed by tooling that provisions or signs in users
    pub cognito: Option<CognitoConfig>,
}

impl RealConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(target: "real_integration::config", "Loaded environment from {:?}", path),
            Err(_) => tracing::debug!(target: "real_integration::config", "No .env file found, using process environment only"),
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = non_empty(&lookup, GRAPHQL_URL_VAR).ok_or_else(|| {
            RealError::Configuration(format!("Env var {} must be defined", GRAPHQL_URL_VAR))
        })?;
        let graphql_url = parse_url(GRAPHQL_URL_VAR, &raw_url)?;

        let region = match non_empty(&lookup, REGION_VAR) {
            Some(region) => region,
            None => region_from_host(&graphql_url).ok_or_else(|| {
                RealError::Configuration(format!(
                    "Env var {} must be defined when it cannot be derived from {}",
                    REGION_VAR, graphql_url
                ))
            })?,
        };

        let cognito = CognitoConfig::from_vars(&region, &lookup)?;

        Ok(Self {
            graphql_url,
            region,
            cognito,
        })
    }

    pub fn require_cognito(&self) -> Result<&CognitoConfig> {
        self.cognito.as_ref().ok_or_else(|| {
            RealError::Configuration(format!(
                "{}, {} and {} must be defined",
                USER_POOL_ID_VAR, CLIENT_ID_VAR, IDENTITY_POOL_ID_VAR
            ))
        })
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_url(name: &str, raw: &str) -> Result<Url> {
    Url::parse(raw)
        .map_err(|e| RealError::Configuration(format!("{} is not a valid URL ({}): {}", name, raw, e)))
}

/// AppSync hosts look like `<api-id>.appsync-api.<region>.amazonaws.com`.
fn region_from_host(url: &Url) -> Option<String> {
    let labels: Vec<&str> = url.host_str()?.split('.').collect();
    let pos = labels.iter().position(|label| *label == "appsync-api")?;
    labels.get(pos + 1).map(|region| region.to_string())
}
