use crate::{api, auth::AuthConfig, cli::telemetry};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub auth_config: AuthConfig,
    pub cors_origin: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store can't be reached or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!(
        port = args.port,
        database = args.dsn.is_some(),
        cors = args.cors_origin.is_some(),
        "starting server"
    );

    let result = api::new(args.port, args.dsn, args.auth_config, args.cors_origin).await;

    telemetry::shutdown_tracer();

    result
}
