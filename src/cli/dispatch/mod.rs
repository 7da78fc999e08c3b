//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{
    ARG_BCRYPT_COST, ARG_CORS_ORIGIN, ARG_DSN, ARG_JWT_SECRET, ARG_PORT, ARG_TOKEN_TTL_SECONDS,
};
use crate::auth::{password::DEFAULT_COST, AuthConfig, DEFAULT_TOKEN_TTL_SECONDS};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if the signing secret is missing or blank.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);
    let dsn = matches.get_one::<String>(ARG_DSN).cloned();

    let jwt_secret = matches
        .get_one::<String>(ARG_JWT_SECRET)
        .cloned()
        .context("missing required argument: --jwt-secret")?;
    if jwt_secret.trim().is_empty() {
        return Err(anyhow!("--jwt-secret must not be empty"));
    }

    let token_ttl_seconds = matches
        .get_one::<u64>(ARG_TOKEN_TTL_SECONDS)
        .copied()
        .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);
    let bcrypt_cost = matches
        .get_one::<u32>(ARG_BCRYPT_COST)
        .copied()
        .unwrap_or(DEFAULT_COST);

    let auth_config = AuthConfig::new(SecretString::from(jwt_secret))
        .with_token_ttl_seconds(token_ttl_seconds)
        .with_bcrypt_cost(bcrypt_cost);

    Ok(Action::Server(Args {
        port,
        dsn,
        auth_config,
        cors_origin: matches.get_one::<String>(ARG_CORS_ORIGIN).cloned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::time::Duration;

    #[test]
    fn builds_server_action() -> Result<()> {
        let matches = crate::cli::commands::new().try_get_matches_from(vec![
            "devconnector",
            "--port",
            "8080",
            "--jwt-secret",
            "s3cret",
            "--token-ttl-seconds",
            "120",
            "--bcrypt-cost",
            "4",
        ])?;

        let Action::Server(args) = handler(&matches)?;
        assert_eq!(args.port, 8080);
        assert_eq!(args.auth_config.jwt_secret().expose_secret(), "s3cret");
        assert_eq!(args.auth_config.token_ttl(), Duration::from_secs(120));
        assert_eq!(args.auth_config.bcrypt_cost(), 4);
        Ok(())
    }

    #[test]
    fn blank_secret_is_rejected() -> Result<()> {
        let matches = crate::cli::commands::new()
            .try_get_matches_from(vec!["devconnector", "--jwt-secret", "   "])?;

        let result = handler(&matches);
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("--jwt-secret"));
        }
        Ok(())
    }
}
