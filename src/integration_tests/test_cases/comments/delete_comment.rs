use crate::RealError;
use crate::graphql::documents;
use crate::integration_tests::core::*;
use async_trait::async_trait;
use serde_json::json;

pub struct DeleteCommentTestCase {
    login_name: String,
    comment_name: String,
}

impl DeleteCommentTestCase {
    pub fn new(login_name: &str, comment_name: &str) -> Self {
        Self {
            login_name: login_name.to_string(),
            comment_name: comment_name.to_string(),
        }
    }
}

#[async_trait]
impl TestCase for DeleteCommentTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        tracing::info!(
            "Deleting comment '{}' as login: {}",
            self.comment_name,
            self.login_name
        );

        let login = context.get_login(&self.login_name)?;
        let comment_id = context.get_comment_id(&self.comment_name)?;

        let response = login
            .client
            .mutate(documents::DELETE_COMMENT, json!({ "commentId": comment_id }))
            .await?
            .ensure_no_errors()?;

        ensure_eq(
            response.str_field("/deleteComment/commentId")?,
            comment_id.as_str(),
            "deleteComment commentId",
        )?;

        tracing::info!("✓ Comment '{}' deleted", self.comment_name);
        Ok(())
    }
}
