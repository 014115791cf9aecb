use async_trait::async_trait;
use uuid::Uuid;

use crate::cognito::CognitoClient;
use crate::config::RealConfig;
use crate::credentials::{AwsCredentials, TokensFile};
use crate::error::Result;
use crate::graphql::{GraphqlClient, GraphqlClientFactory};
use crate::users;

/// A provisioned test user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

/// An identity together with a client authenticated as that identity.
/// The client holds the only copy of the identity's credentials.
#[derive(Debug, Clone)]
pub struct Login {
    pub identity: Identity,
    pub client: GraphqlClient,
}

impl Login {
    pub fn new(identity: Identity, client: GraphqlClient) -> Self {
        Self { identity, client }
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }

    pub fn credentials(&self) -> &AwsCredentials {
        self.client.credentials()
    }
}

/// Creates brand-new authenticated identities.
#[async_trait]
pub trait SessionProvisioner: Send + Sync {
    /// Either returns a fully usable login or an error, never a half-created one.
    async fn provision(&self) -> Result<Login>;
}

/// Provisions users through the Cognito user pool and identity pool, then
/// registers them with the backend.
#[derive(Debug, Clone)]
pub struct CognitoProvisioner {
    cognito: CognitoClient,
    factory: GraphqlClientFactory,
}

impl CognitoProvisioner {
    pub fn new(config: &RealConfig) -> Result<Self> {
        let cognito = CognitoClient::new(config.require_cognito()?.clone(), &config.region);
        let factory = GraphqlClientFactory::new(config.graphql_url.clone(), &config.region);
        Ok(Self { cognito, factory })
    }

    /// Signs in an existing user and returns the bundle `delete-user` consumes.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<TokensFile> {
        let tokens = self.cognito.initiate_password_auth(username, password).await?;
        let identity_id = self.cognito.get_id(Some(&tokens.id_token)).await?;
        let identity = self
            .cognito
            .get_credentials_for_identity(&identity_id, &tokens.id_token)
            .await?;

        tracing::info!(target: "real_integration::provisioner", "Signed in {} as {}", username, identity.identity_id);

        Ok(TokensFile {
            tokens: Some(tokens),
            user_id: Some(identity.identity_id),
            username: Some(username.to_string()),
            ..TokensFile::from_credentials(identity.credentials)
        })
    }
}

fn generate_username() -> String {
    format!("itest{}", &Uuid::new_v4().simple().to_string()[..8])
}

fn generate_password() -> String {
    format!("{}-Aa1!", Uuid::new_v4())
}

#[async_trait]
impl SessionProvisioner for CognitoProvisioner {
    async fn provision(&self) -> Result<Login> {
        let user_id = self.cognito.get_id(None).await?;
        let username = generate_username();
        let password = generate_password();
        let email = format!("{}@{}", username, self.cognito.config().email_domain);

        self.cognito.sign_up(&user_id, &password, &email).await?;
        let tokens = self.cognito.initiate_password_auth(&user_id, &password).await?;
        let identity = self
            .cognito
            .get_credentials_for_identity(&user_id, &tokens.id_token)
            .await?;

        let client = self.factory.client(identity.credentials);
        let user = match users::create_cognito_only_user(&client, &username).await {
            Ok(user) => user,
            Err(e) => {
                // No backend user exists yet, only the user pool entry
                if let Err(delete_err) = self.cognito.delete_user(&tokens.access_token).await {
                    tracing::warn!(
                        target: "real_integration::provisioner",
                        "Failed to remove user pool user {} after a failed sign-up: {}",
                        user_id,
                        delete_err
                    );
                }
                return Err(e);
            }
        };
        if let Err(e) = users::ensure_same_user(&user_id, &user) {
            if let Err(delete_err) = users::delete_user(&client).await {
                tracing::warn!(
                    target: "real_integration::provisioner",
                    "Failed to delete mismatched backend user {}: {}",
                    user.user_id,
                    delete_err
                );
            }
            return Err(e);
        }

        tracing::info!(target: "real_integration::provisioner", "Provisioned test user {} ({})", user.username, user.user_id);

        Ok(Login::new(
            Identity {
                user_id: user.user_id,
                username: user.username,
            },
            client,
        ))
    }
}
