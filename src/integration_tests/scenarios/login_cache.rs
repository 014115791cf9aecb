use crate::integration_tests::{
    core::*,
    test_cases::{posts::*, shared::*, users::*},
};
use crate::{RealError, SessionProvisioner};
use async_trait::async_trait;
use std::sync::Arc;

/// Checks against the live backend that a cleaned login comes back empty.
pub struct LoginCacheScenario {
    context: ScenarioContext,
}

impl LoginCacheScenario {
    pub fn new(provisioner: Arc<dyn SessionProvisioner>) -> Self {
        Self {
            context: ScenarioContext::new(provisioner),
        }
    }
}

#[async_trait]
impl Scenario for LoginCacheScenario {
    fn context(&self) -> &ScenarioContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ScenarioContext {
        &mut self.context
    }

    async fn run_scenario(&mut self) -> Result<(), RealError> {
        ProvisionLoginsTestCase::new(1)
            .execute(&mut self.context)
            .await?;

        BorrowLoginsTestCase::with_names(vec!["poster"])
            .execute(&mut self.context)
            .await?;
        let user_id = self.context.get_login("poster")?.user_id().to_string();
        ensure_eq(self.context.login_cache.dirty_count(), 1, "dirty logins")?;

        AddPostTestCase::new("poster", "post")
            .execute(&mut self.context)
            .await?;
        VerifyPostCountTestCase::new("poster", 1)
            .execute(&mut self.context)
            .await?;

        let report = self.context.begin_test_group().await;
        ensure_eq(report.restored, 1, "logins restored by clean")?;
        ensure_eq(report.discarded, 0, "logins discarded by clean")?;
        ensure_eq(self.context.login_cache.dirty_count(), 0, "dirty logins")?;

        BorrowLoginsTestCase::with_names(vec!["poster"])
            .execute(&mut self.context)
            .await?;
        ensure_eq(
            self.context.get_login("poster")?.user_id(),
            user_id.as_str(),
            "identity handed out after clean",
        )?;
        VerifyPostCountTestCase::new("poster", 0)
            .execute(&mut self.context)
            .await?;

        Ok(())
    }
}
