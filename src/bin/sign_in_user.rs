use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use real_integration::{CognitoProvisioner, RealConfig, flush_tracing, init_tracing};

/// Signs in an existing user and writes a tokens file for `delete-user`
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(long)]
    username: String,

    #[clap(long)]
    password: String,

    /// Where to write the tokens file
    #[clap(long, value_name = "PATH", default_value = "tokens.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(None)?;

    let result = run(&args).await;
    flush_tracing();
    result
}

async fn run(args: &Args) -> Result<()> {
    let config = RealConfig::from_env().context("Failed to load configuration")?;
    let provisioner = CognitoProvisioner::new(&config)?;

    let tokens = provisioner
        .sign_in(&args.username, &args.password)
        .await
        .context("Failed to sign in")?;
    tokens.save(&args.output)?;

    println!("Wrote tokens for '{}' to {:?}", args.username, args.output);
    Ok(())
}
