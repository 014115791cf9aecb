use crate::RealError;
use crate::integration_tests::core::*;
use async_trait::async_trait;
use std::collections::HashSet;

pub struct BorrowLoginsTestCase {
    names: Vec<String>,
}

impl BorrowLoginsTestCase {
    pub fn with_names(names: Vec<&str>) -> Self {
        Self {
            names: names.into_iter().map(String::from).collect(),
        }
    }
}

#[async_trait]
impl TestCase for BorrowLoginsTestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        tracing::info!("Borrowing {} clean logins", self.names.len());

        for name in &self.names {
            let login = context.login_cache.get_clean_login().await?;
            tracing::info!("✓ Borrowed login {} as '{}'", login.username(), name);
            context.add_login(name, login);
        }

        let distinct: HashSet<&str> = self
            .names
            .iter()
            .map(|name| context.get_login(name).map(|login| login.user_id()))
            .collect::<Result<_, _>>()?;
        ensure_eq(
            distinct.len(),
            self.names.len(),
            "distinct identities among borrowed logins",
        )?;

        Ok(())
    }
}
