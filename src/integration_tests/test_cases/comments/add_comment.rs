use crate::RealError;
use crate::graphql::documents;
use crate::integration_tests::core::*;
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

pub struct AddCommentTestCase {
    login_name: String,
    post_name: String,
    comment_name: String,
}

impl AddCommentTestCase {
    pub fn new(login_name: &str, post_name: &str, comment_name: &str) -> Self {
        Self {
            login_name: login_name.to_string(),
            post_name: post_name.to_string(),
            comment_name: comment_name.to_string(),
        }
    }
}

#[async_trait]
impl TestCase for AddCommentTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        tracing::info!(
            "Commenting '{}' on post '{}' as login: {}",
            self.comment_name,
            self.post_name,
            self.login_name
        );

        let login = context.get_login(&self.login_name)?;
        let post_id = context.get_post_id(&self.post_name)?;
        let comment_id = Uuid::new_v4().to_string();

        let response = login
            .client
            .mutate(
                documents::ADD_COMMENT,
                json!({
                    "commentId": comment_id,
                    "postId": post_id,
                    "text": format!("comment {}", self.comment_name),
                }),
            )
            .await?
            .ensure_no_errors()?;

        ensure_eq(
            response.str_field("/addComment/commentId")?,
            comment_id.as_str(),
            "addComment commentId",
        )?;

        tracing::info!("✓ Comment '{}' added with id {}", self.comment_name, comment_id);
        context.add_comment_id(&self.comment_name, comment_id);
        Ok(())
    }
}
