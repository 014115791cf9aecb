use crate::RealError;
use crate::integration_tests::core::*;
use async_trait::async_trait;

/// Fills the login cache ahead of time so later steps only borrow.
pub struct ProvisionLoginsTestCase {
    count: usize,
}

impl ProvisionLoginsTestCase {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

#[async_trait]
impl TestCase for ProvisionLoginsTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        tracing::info!("Provisioning {} test logins", self.count);

        context.login_cache.warm_up(self.count).await?;

        ensure(
            context.login_cache.clean_count() >= self.count,
            "login cache holds the requested number of clean logins",
        )?;

        tracing::info!(
            "✓ Login cache holds {} clean logins",
            context.login_cache.clean_count()
        );
        Ok(())
    }
}
