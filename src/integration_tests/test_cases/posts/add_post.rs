use crate::RealError;
use crate::graphql::documents;
use crate::integration_tests::core::*;
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

pub struct AddPostTestCase {
    login_name: String,
    post_name: String,
    text: String,
}

impl AddPostTestCase {
    pub fn new(login_name: &str, post_name: &str) -> Self {
        Self {
            login_name: login_name.to_string(),
            post_name: post_name.to_string(),
            text: format!("integration post {}", post_name),
        }
    }
}

#[async_trait]
impl TestCase for AddPostTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        tracing::info!(
            "Adding post '{}' as login: {}",
            self.post_name,
            self.login_name
        );

        let login = context.get_login(&self.login_name)?;
        let post_id = Uuid::new_v4().to_string();

        let response = login
            .client
            .mutate(
                documents::ADD_POST,
                json!({ "postId": post_id, "postType": "TEXT_ONLY", "text": self.text }),
            )
            .await?
            .ensure_no_errors()?;

        let returned_id = response.str_field("/addPost/postId")?;
        ensure_eq(returned_id, post_id.as_str(), "addPost postId")?;
        let activity = response
            .field("/addPost/hasNewCommentActivity")
            .and_then(|value| value.as_bool());
        ensure_eq(activity, Some(false), "hasNewCommentActivity on a new post")?;

        tracing::info!("✓ Post '{}' created with id {}", self.post_name, post_id);
        context.add_post_id(&self.post_name, post_id);
        Ok(())
    }
}
