use serde::Deserialize;
use serde_json::json;

use crate::error::{RealError, Result};
use crate::graphql::{GraphqlClient, documents};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelfUser {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "postCount", default)]
    pub post_count: Option<u64>,
}

/// Registers the backend user for a freshly signed-up identity.
pub async fn create_cognito_only_user(
    client: &GraphqlClient,
    username: &str,
) -> Result<UserSummary> {
    let response = client
        .mutate(
            documents::CREATE_COGNITO_ONLY_USER,
            json!({"username": username}),
        )
        .await?
        .ensure_no_errors()?;
    response.extract("/createCognitoOnlyUser")
}

/// Drops everything the user created and recreates the user as `new_username`.
pub async fn reset_user(client: &GraphqlClient, new_username: Option<&str>) -> Result<()> {
    let variables = match new_username {
        Some(username) => json!({"newUsername": username}),
        None => json!({}),
    };
    client
        .mutate(documents::RESET_USER, variables)
        .await?
        .ensure_no_errors()?;
    Ok(())
}

/// Deletes the user the client is authenticated as.
pub async fn delete_user(client: &GraphqlClient) -> Result<UserSummary> {
    let response = client
        .mutate(documents::DELETE_USER, json!({}))
        .await?
        .ensure_no_errors()?;
    response.extract("/user")
}

pub async fn fetch_self(client: &GraphqlClient) -> Result<SelfUser> {
    let response = client
        .query(documents::SELF, json!({}))
        .await?
        .ensure_no_errors()?;
    response.extract("/self")
}

/// Guards against a backend user that does not belong to the signed-in identity.
pub fn ensure_same_user(expected_user_id: &str, user: &UserSummary) -> Result<()> {
    if user.user_id == expected_user_id {
        Ok(())
    } else {
        Err(RealError::UnexpectedResponse(format!(
            "Expected user {} but backend returned {}",
            expected_user_id, user.user_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::AwsCredentials;
    use crate::graphql::GraphqlClientFactory;
    use mockito::Matcher;
    use reqwest::Url;

    fn client_for(server: &mockito::ServerGuard) -> GraphqlClient {
        let url = Url::parse(&format!("{}/graphql", server.url())).unwrap();
        GraphqlClientFactory::new(url, "us-east-1").client(AwsCredentials::new("AKID", "s", "t"))
    }

    #[tokio::test]
    async fn test_delete_user_returns_summary() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("mutation DeleteUser".to_string()))
            .with_status(200)
            .with_body(r#"{"data": {"user": {"userId": "us-east-1:abc", "username": "itest"}}}"#)
            .create_async()
            .await;

        let user = delete_user(&client_for(&server)).await.unwrap();
        assert_eq!(
            user,
            UserSummary {
                user_id: "us-east-1:abc".to_string(),
                username: "itest".to_string(),
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_user_surfaces_graphql_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data": {"user": null}, "errors": [{"message": "User does not exist"}]}"#)
            .create_async()
            .await;

        let result = delete_user(&client_for(&server)).await;
        assert!(matches!(result, Err(RealError::Graphql(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reset_user_sends_new_username() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({"variables": {"newUsername": "itest"}})))
            .with_status(200)
            .with_body(r#"{"data": {"resetUser": {"userId": "u", "username": "itest"}}}"#)
            .create_async()
            .await;

        reset_user(&client_for(&server), Some("itest")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_self_without_post_count() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data": {"self": {"userId": "u", "username": "n", "postCount": null}}}"#)
            .create_async()
            .await;

        let user = fetch_self(&client_for(&server)).await.unwrap();
        assert_eq!(user.post_count, None);
        mock.assert_async().await;
    }

    #[test]
    fn test_ensure_same_user() {
        let user = UserSummary {
            user_id: "a".to_string(),
            username: "n".to_string(),
        };
        assert!(ensure_same_user("a", &user).is_ok());
        assert!(matches!(
            ensure_same_user("b", &user),
            Err(RealError::UnexpectedResponse(_))
        ));
    }
}
