pub use crate::config::{CognitoConfig, RealConfig};
pub use crate::credentials::{AwsCredentials, TokensFile, UserPoolTokens};
pub use crate::error::{RealError, Result};
pub use crate::graphql::{GraphqlClient, GraphqlClientFactory, GraphqlError, GraphqlResponse};
pub use crate::login_cache::{CleanReport, LoginCache};
pub use crate::provisioner::{CognitoProvisioner, Identity, Login, SessionProvisioner};

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt::Layer, prelude::*, registry::Registry};

use std::path::Path;
use std::sync::Mutex;

pub mod cognito;
pub mod config;
pub mod credentials;
mod error;
pub mod graphql;
pub mod login_cache;
pub mod provisioner;
pub mod sigv4;
pub mod users;

#[cfg(feature = "integration-tests")]
pub mod integration_tests;

static TRACING_GUARDS: OnceCell<Mutex<Vec<WorkerGuard>>> = OnceCell::new();
static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global subscriber once per process. Logs always go to stdout;
/// with `logs_dir` they are also written to a daily rolling file.
pub fn init_tracing(logs_dir: Option<&Path>) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let mut guards = Vec::new();

        let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(stdout_guard);
        let stdout_layer = Layer::new()
            .with_writer(non_blocking_stdout)
            .with_ansi(true)
            .with_target(true);

        let file_layer = match logs_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
                    .rotation(tracing_appender::rolling::Rotation::DAILY)
                    .filename_prefix("real-integration")
                    .filename_suffix("log")
                    .build(dir)
                    .map_err(|e| RealError::LoggingSetup(e.to_string()))?;
                let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
                guards.push(file_guard);
                Some(
                    Layer::new()
                        .with_writer(non_blocking_file)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            None => None,
        };

        TRACING_GUARDS.set(Mutex::new(guards)).ok();

        Registry::default()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(stdout_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| RealError::LoggingSetup(e.to_string()))
    })?;
    Ok(())
}

/// Drops the non-blocking writer guards, which flushes every buffered log line.
/// Call once right before the process exits; later log lines are discarded.
pub fn flush_tracing() {
    if let Some(guards) = TRACING_GUARDS.get() {
        match guards.lock() {
            Ok(mut guards) => guards.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}
