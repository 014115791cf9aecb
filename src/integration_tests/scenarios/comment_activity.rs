use crate::integration_tests::{
    core::*,
    test_cases::{comments::*, posts::*, shared::*},
};
use crate::{RealError, SessionProvisioner};
use async_trait::async_trait;
use std::sync::Arc;

/// Exercises the `hasNewCommentActivity` flag a post owner sees on their post.
pub struct CommentActivityScenario {
    context: ScenarioContext,
}

impl CommentActivityScenario {
    pub fn new(provisioner: Arc<dyn SessionProvisioner>) -> Self {
        Self {
            context: ScenarioContext::new(provisioner),
        }
    }

    async fn owner_comments_never_set_activity(&mut self) -> Result<(), RealError> {
        self.context.begin_test_group().await;
        BorrowLoginsTestCase::with_names(vec!["owner"])
            .execute(&mut self.context)
            .await?;

        AddPostTestCase::new("owner", "own_post")
            .execute(&mut self.context)
            .await?;
        AddCommentTestCase::new("owner", "own_post", "own_comment")
            .execute(&mut self.context)
            .await?;
        VerifyCommentActivityTestCase::new("owner", "own_post", Some(false))
            .execute(&mut self.context)
            .await?;

        DeleteCommentTestCase::new("owner", "own_comment")
            .execute(&mut self.context)
            .await?;
        VerifyCommentActivityTestCase::new("owner", "own_post", Some(false))
            .execute(&mut self.context)
            .await?;

        Ok(())
    }

    async fn activity_set_and_cleared(&mut self) -> Result<(), RealError> {
        let report = self.context.begin_test_group().await;
        tracing::debug!(
            "Logins returned to the cache: {} restored, {} discarded",
            report.restored,
            report.discarded
        );
        BorrowLoginsTestCase::with_names(vec!["owner", "commenter"])
            .execute(&mut self.context)
            .await?;

        AddPostTestCase::new("owner", "post")
            .execute(&mut self.context)
            .await?;
        // Only the owner may see the flag
        VerifyCommentActivityTestCase::new("commenter", "post", None)
            .execute(&mut self.context)
            .await?;

        AddCommentTestCase::new("commenter", "post", "first")
            .execute(&mut self.context)
            .await?;
        AddCommentTestCase::new("commenter", "post", "second")
            .execute(&mut self.context)
            .await?;
        VerifyCommentActivityTestCase::new("owner", "post", Some(true))
            .execute(&mut self.context)
            .await?;

        ReportCommentViewsTestCase::new("owner", vec!["first"])
            .execute(&mut self.context)
            .await?;
        VerifyCommentActivityTestCase::new("owner", "post", Some(false))
            .execute(&mut self.context)
            .await?;

        DeleteCommentTestCase::new("commenter", "second")
            .execute(&mut self.context)
            .await?;
        VerifyCommentActivityTestCase::new("owner", "post", Some(true))
            .execute(&mut self.context)
            .await?;

        ReportCommentViewsTestCase::new("owner", vec!["first"])
            .execute(&mut self.context)
            .await?;
        VerifyCommentActivityTestCase::new("owner", "post", Some(false))
            .execute(&mut self.context)
            .await?;

        DeleteCommentTestCase::new("owner", "first")
            .execute(&mut self.context)
            .await?;
        VerifyCommentActivityTestCase::new("owner", "post", Some(false))
            .execute(&mut self.context)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Scenario for CommentActivityScenario {
    fn context(&self) -> &ScenarioContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ScenarioContext {
        &mut self.context
    }

    async fn run_scenario(&mut self) -> Result<(), RealError> {
        ProvisionLoginsTestCase::new(2)
            .execute(&mut self.context)
            .await?;

        self.owner_comments_never_set_activity().await?;
        self.activity_set_and_cleared().await?;

        Ok(())
    }
}
