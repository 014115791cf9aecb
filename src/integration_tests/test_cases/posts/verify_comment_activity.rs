use crate::RealError;
use crate::graphql::documents;
use crate::integration_tests::core::*;
use async_trait::async_trait;
use serde_json::json;

/// Reads a post as `login_name` and checks its `hasNewCommentActivity` flag.
/// `None` means the viewer must not see the flag at all.
pub struct VerifyCommentActivityTestCase {
    login_name: String,
    post_name: String,
    expected: Option<bool>,
}

impl VerifyCommentActivityTestCase {
    pub fn new(login_name: &str, post_name: &str, expected: Option<bool>) -> Self {
        Self {
            login_name: login_name.to_string(),
            post_name: post_name.to_string(),
            expected,
        }
    }
}

#[async_trait]
impl TestCase for VerifyCommentActivityTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        let login = context.get_login(&self.login_name)?;
        let post_id = context.get_post_id(&self.post_name)?;

        let response = login
            .client
            .query(documents::POST, json!({ "postId": post_id }))
            .await?
            .ensure_no_errors()?;

        ensure_eq(
            response.str_field("/post/postId")?,
            post_id.as_str(),
            "post lookup",
        )?;
        let activity: Option<bool> = response
            .field("/post/hasNewCommentActivity")
            .and_then(|value| value.as_bool());
        ensure_eq(
            activity,
            self.expected,
            &format!(
                "hasNewCommentActivity of '{}' seen by {}",
                self.post_name, self.login_name
            ),
        )?;

        tracing::info!(
            "✓ {} sees hasNewCommentActivity={:?} on '{}'",
            self.login_name,
            activity,
            self.post_name
        );
        Ok(())
    }
}
