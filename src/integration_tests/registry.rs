use crate::integration_tests::core::*;
use crate::integration_tests::scenarios::*;
use crate::{RealError, SessionProvisioner};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Registers every live scenario in one place.
/// Add a scenario with one line: "cli-name" => ScenarioType
macro_rules! scenario_registry {
    ($($name:literal => $scenario_type:ty),* $(,)?) => {
        /// All registered scenario names (kebab-case)
        fn get_all_scenario_names() -> Vec<&'static str> {
            vec![$($name),*]
        }

        fn unknown_scenario(name: &str) -> String {
            let available = get_all_scenario_names().join("\n  - ");
            format!(
                "Unknown scenario '{}'. Available scenarios:\n  - {}",
                name, available
            )
        }

        fn parse_scenario_name(name: &str) -> Result<&'static str, String> {
            match name.to_lowercase().as_str() {
                $(
                    $name => Ok($name),
                )*
                _ => Err(unknown_scenario(name)),
            }
        }

        async fn run_single_scenario(
            name: &str,
            provisioner: &Arc<dyn SessionProvisioner>,
        ) -> Result<(ScenarioResult, Option<RealError>), String> {
            match name.to_lowercase().as_str() {
                $(
                    $name => Ok(<$scenario_type>::new(provisioner.clone())
                        .execute()
                        .await),
                )*
                _ => Err(unknown_scenario(name)),
            }
        }

        async fn run_all_registered(
            provisioner: &Arc<dyn SessionProvisioner>,
            results: &mut Vec<ScenarioResult>,
            first_error: &mut Option<RealError>,
        ) {
            $(
                let (result, error) = <$scenario_type>::new(provisioner.clone())
                    .execute()
                    .await;
                results.push(result);
                if error.is_some() && first_error.is_none() {
                    *first_error = error;
                }
            )*
        }
    };
}

// ============================================================================
// SCENARIO REGISTRY - Add new scenarios here (one line each)
// ============================================================================
scenario_registry! {
    "login-cache" => LoginCacheScenario,
    "comment-activity" => CommentActivityScenario,
}
// ============================================================================

pub struct ScenarioRegistry;

impl ScenarioRegistry {
    pub fn scenario_names() -> Vec<&'static str> {
        get_all_scenario_names()
    }

    pub async fn run_scenario(
        scenario_name: &str,
        provisioner: Arc<dyn SessionProvisioner>,
    ) -> Result<(), RealError> {
        let overall_start = Instant::now();

        parse_scenario_name(scenario_name).map_err(RealError::InvalidInput)?;

        let (result, error) = run_single_scenario(scenario_name, &provisioner)
            .await
            .map_err(RealError::InvalidInput)?;

        Self::print_summary(&[result], overall_start.elapsed());

        match error {
            Some(e) => {
                tracing::error!("=== Scenario Failed ===");
                Err(e)
            }
            None => {
                tracing::info!("=== Scenario Completed Successfully ===");
                Ok(())
            }
        }
    }

    /// Runs every registered scenario, returning the first error encountered.
    pub async fn run_all_scenarios(
        provisioner: Arc<dyn SessionProvisioner>,
    ) -> Result<(), RealError> {
        let overall_start = Instant::now();
        let mut results = Vec::new();
        let mut first_error = None;

        run_all_registered(&provisioner, &mut results, &mut first_error).await;

        Self::print_summary(&results, overall_start.elapsed());

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn print_summary(results: &[ScenarioResult], overall_duration: Duration) {
        tracing::info!("=== Integration Test Summary ===");

        tracing::info!("Detailed Results:");
        for result in results {
            tracing::info!(
                "  {} {} - {}/{} tests passed in {:?}",
                result.status_symbol(),
                result.scenario_name,
                result.tests_passed,
                result.tests_run,
                result.duration
            );
        }

        tracing::info!("Total duration: {:?}", overall_duration);

        let total_passed = results.iter().map(|r| r.tests_passed).sum::<u32>();
        let total_failed = results.iter().map(|r| r.tests_failed).sum::<u32>();
        let scenarios_passed = results.iter().filter(|r| r.success).count();
        let scenarios_failed = results.len() - scenarios_passed;

        tracing::info!(
            "Scenarios: {} passed, {} failed",
            scenarios_passed,
            scenarios_failed
        );
        tracing::info!(
            "Test Cases: {} passed, {} failed",
            total_passed,
            total_failed
        );
    }
}
