use crate::RealError;
use crate::integration_tests::core::*;
use crate::users;
use async_trait::async_trait;

pub struct VerifyPostCountTestCase {
    login_name: String,
    expected: u64,
}

impl VerifyPostCountTestCase {
    pub fn new(login_name: &str, expected: u64) -> Self {
        Self {
            login_name: login_name.to_string(),
            expected,
        }
    }
}

#[async_trait]
impl TestCase for VerifyPostCountTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        let login = context.get_login(&self.login_name)?;
        let user = users::fetch_self(&login.client).await?;

        ensure_eq(user.user_id.as_str(), login.user_id(), "self userId")?;
        ensure_eq(
            user.post_count.unwrap_or(0),
            self.expected,
            &format!("postCount of {}", self.login_name),
        )?;

        tracing::info!(
            "✓ {} has {} posts",
            self.login_name,
            self.expected
        );
        Ok(())
    }
}
