use crate::RealError;
use crate::integration_tests::core::{ScenarioContext, ScenarioResult};
use async_trait::async_trait;
use std::time::Instant;

#[async_trait]
pub trait TestCase {
    async fn run(&self, context: &mut ScenarioContext) -> Result<(), RealError>;

    async fn execute(&self, context: &mut ScenarioContext) -> Result<(), RealError> {
        let result = self.run(context).await;
        context.record_test(result.is_ok());
        result
    }
}

#[async_trait]
pub trait Scenario {
    /// Get the name of this scenario for logging and reporting
    fn scenario_name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or(std::any::type_name::<Self>())
    }

    fn context(&self) -> &ScenarioContext;

    fn context_mut(&mut self) -> &mut ScenarioContext;

    /// Run the actual scenario logic - implement this in each scenario
    async fn run_scenario(&mut self) -> Result<(), RealError>;

    /// Execute the scenario with consistent timing, logging and error handling.
    /// Cleanup runs whether or not the scenario passed.
    async fn execute(mut self) -> (ScenarioResult, Option<RealError>)
    where
        Self: Sized + Send,
    {
        let start_time = Instant::now();
        let scenario_name = self.scenario_name();

        tracing::info!("=== Running Scenario: {} ===", scenario_name);

        let run_result = self.run_scenario().await;
        let duration = start_time.elapsed();

        if let Err(e) = self.cleanup().await {
            tracing::error!("✗ {} Scenario cleanup failed: {}", scenario_name, e);
        }

        let context = self.context();
        let tests_run = context.tests_count;
        let tests_passed = context.tests_passed;

        match run_result {
            Ok(()) => {
                tracing::info!(
                    "✓ {} Scenario completed ({}/{}) in {:?}",
                    scenario_name,
                    tests_passed,
                    tests_run,
                    duration
                );
                (
                    ScenarioResult::new(scenario_name, tests_run, tests_passed, duration),
                    None,
                )
            }
            Err(e) => {
                tracing::error!(
                    "✗ {} Scenario failed after {} completed tests in {:?}: {}",
                    scenario_name,
                    tests_passed,
                    duration,
                    e
                );
                (
                    ScenarioResult::failed(scenario_name, tests_run, tests_passed, duration),
                    Some(e),
                )
            }
        }
    }

    /// Deletes every test user the scenario provisioned.
    async fn cleanup(&mut self) -> Result<(), RealError> {
        let context = self.context_mut();
        context.logins.clear();
        context.login_cache.reset().await
    }
}
