use crate::graphql::GraphqlError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, RealError>;

#[derive(Error, Debug)]
pub enum RealError {
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Logging setup error: {0}")]
    LoggingSetup(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Identity provider error ({kind}): {message}")]
    IdentityProvider { kind: String, message: String },

    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    Graphql(Vec<GraphqlError>),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Request signing error: {0}")]
    Signing(String),

    #[error("Login not found: {0}")]
    LoginNotFound(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

fn format_graphql_errors(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Box<dyn std::error::Error + Send + Sync>> for RealError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        RealError::Other(anyhow::anyhow!(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_display_joins_messages() {
        let err = RealError::Graphql(vec![
            GraphqlError {
                message: "Post does not exist".to_string(),
                error_type: None,
                path: None,
            },
            GraphqlError {
                message: "Not authorized".to_string(),
                error_type: Some("Unauthorized".to_string()),
                path: None,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Post does not exist; Not authorized"
        );
    }

    #[test]
    fn test_identity_provider_error_display() {
        let err = RealError::IdentityProvider {
            kind: "UsernameExistsException".to_string(),
            message: "User already exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Identity provider error (UsernameExistsException): User already exists"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RealError = io.into();
        assert!(matches!(err, RealError::Filesystem(_)));
    }
}
