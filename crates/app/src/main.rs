//! Rolegate binary.

use std::process::ExitCode;

use rolegate::{Invocation, USAGE};
use rolegate_infrastructure::ClientConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match Invocation::parse(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return Ok(ExitCode::from(2));
        }
    };

    let config = ClientConfig::load(invocation.config.as_deref())?;

    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(base_url = %config.base_url, "starting rolegate v{}", env!("CARGO_PKG_VERSION"));

    let client = config.build_client()?;
    let mut stdout = std::io::stdout().lock();
    match rolegate::run(&client, invocation.command, &mut stdout).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            if e.requires_login() {
                eprintln!("Sign in again with `rolegate login <email> <password>`.");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
