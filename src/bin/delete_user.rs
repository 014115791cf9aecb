use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use real_integration::{
    GraphqlClientFactory, RealConfig, TokensFile, flush_tracing, init_tracing, users,
};

/// Deletes the backend user authenticated by a tokens file
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// JSON file holding the user's AWS credentials
    #[clap(value_name = "TOKENS_FILE")]
    tokens_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(None)?;

    let result = run(&args.tokens_file).await;
    flush_tracing();
    result
}

async fn run(tokens_file: &Path) -> Result<()> {
    let config = RealConfig::from_env().context("Failed to load configuration")?;
    let tokens = TokensFile::load(tokens_file)
        .with_context(|| format!("Failed to read tokens file {:?}", tokens_file))?;

    let factory = GraphqlClientFactory::new(config.graphql_url.clone(), &config.region);
    let client = factory.client(tokens.credentials);

    let user = users::delete_user(&client)
        .await
        .context("Failed to delete user")?;

    println!("Successfully deleted user '{}'", user.username);
    Ok(())
}
