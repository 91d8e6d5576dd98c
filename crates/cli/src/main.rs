//! Bakery CLI - storefront and admin console in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse and buy
//! bakery products
//! bakery products show 3
//! BAKERY_PASSWORD='...' bakery login alice
//! pass show bakery | bakery login alice --password-stdin
//! bakery cart add 3
//! bakery cart update 7 2
//!
//! # Admin console (staff roles only)
//! bakery admin warehouses
//! bakery admin wms check 3:10 4:2
//! bakery admin shipments update TRK-0001 --status in_transit --courier 12
//! ```
//!
//! Each run restores the saved session, shows one page and exits. If the
//! server rejects the session during the action, the login page is shown
//! instead.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::process::ExitCode;

use bakery_client::{ApiError, ClientConfig, Route, SessionStatus, Storefront};
use clap::Parser;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod views;

use commands::Command;
use error::CliError;

#[derive(Parser)]
#[command(name = "bakery")]
#[command(author, version, about = "Bakery storefront and admin console")]
struct Cli {
    /// API gateway base URL (overrides `BAKERY_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn load_config(api_url: Option<&str>) -> Result<ClientConfig, CliError> {
    let config = ClientConfig::from_env()?;
    match api_url {
        Some(url) => Ok(config.with_api_url(url)?),
        None => Ok(config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.api_url.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "{e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr; stdout carries the page.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bakery_client=info,bakery_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let app = Storefront::new(config);
    match run(&app, cli.command, &mut std::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

/// Bootstrap the session, run the command and write its page to `out`.
async fn run(app: &Storefront, command: Command, out: &mut impl Write) -> Result<(), CliError> {
    let status = app.session().bootstrap().await;
    if status == SessionStatus::Resolved
        && let Some(user) = app.session().user()
    {
        tracing::debug!(user = %user.username, "Session restored");
    }
    // The server turned down the saved session while bootstrapping.
    let expired = app.navigator().current() == Route::Login;

    let route = command.route();
    app.navigator().navigate(route);

    let outcome = commands::run(app, command).await;
    let redirected = route != Route::Login && app.navigator().current() == Route::Login;

    let (page, result) = match outcome {
        Ok(page) if !redirected => (page, Ok(())),
        Ok(_) => (views::login_page(None), Ok(())),
        Err(e) => {
            if e.is_transport() {
                sentry::capture_error(&e);
            }
            let page = if redirected {
                views::login_page(Some(&notice(&e, expired)))
            } else {
                views::error(&e)
            };
            (page, Err(e))
        }
    };

    out.write_all(page.as_bytes())?;
    result
}

fn notice(error: &CliError, expired: bool) -> String {
    match error {
        CliError::Api(ApiError::NotAuthenticated) if expired => {
            ApiError::Unauthorized.user_message()
        }
        CliError::Api(api) => api.user_message(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bakery_client::AdminPage;
    use bakery_client::session::{MemorySessionCache, SessionCache};
    use bakery_core::ProductId;
    use bakery_integration_tests::MockBackend;
    use clap::CommandFactory;
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_commands_map_to_routes() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).map(|cli| cli.command.route());
        assert_eq!(parse(&["bakery", "products"]).ok(), Some(Route::Catalog));
        assert_eq!(
            parse(&["bakery", "products", "show", "42"]).ok(),
            Some(Route::Product(ProductId::new(42)))
        );
        assert_eq!(parse(&["bakery", "cart", "remove", "7"]).ok(), Some(Route::Cart));
        assert_eq!(
            parse(&["bakery", "admin", "rules"]).ok(),
            Some(Route::Admin(AdminPage::StorageRules))
        );
        assert_eq!(parse(&["bakery", "admin"]).ok(), Some(Route::Admin(AdminPage::Home)));
    }

    #[test]
    fn test_negative_quantity_parses() {
        let cli = Cli::try_parse_from(["bakery", "cart", "update", "7", "-1"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_password_is_not_an_argument() {
        assert!(Cli::try_parse_from(["bakery", "login", "alice", "--password", "pw"]).is_err());
        assert!(Cli::try_parse_from(["bakery", "login", "alice", "--password-stdin"]).is_ok());
    }

    fn cart_show() -> Command {
        Command::Cart { action: None }
    }

    /// Run `command` in a fresh process sharing `cache`; returns the page.
    async fn page_of(
        backend: &MockBackend,
        cache: &Arc<MemorySessionCache>,
        command: Command,
    ) -> (String, Result<(), CliError>) {
        let app = backend.storefront_with_cache(cache.clone());
        let mut out = Vec::new();
        let result = run(&app, command, &mut out).await;
        (String::from_utf8_lossy(&out).into_owned(), result)
    }

    async fn logged_in_cache(backend: &MockBackend) -> Arc<MemorySessionCache> {
        let cache = Arc::new(MemorySessionCache::new());
        backend
            .storefront_with_cache(cache.clone())
            .session()
            .login("alice", &SecretString::from("pw"))
            .await
            .expect("login");
        cache
    }

    #[tokio::test]
    async fn test_cart_page_with_live_session() {
        let backend = MockBackend::start().await;
        backend.seed_cart_item(7, "alice", 1, 2);
        let cache = logged_in_cache(&backend).await;

        let (page, result) = page_of(&backend, &cache, cart_show()).await;

        assert!(result.is_ok());
        assert!(page.starts_with("Your cart\n"));
        assert!(page.contains("Croissant"));
    }

    #[tokio::test]
    async fn test_session_expired_before_run_shows_login() {
        let backend = MockBackend::start().await;
        let cache = logged_in_cache(&backend).await;
        backend.expire_sessions();

        let (page, result) = page_of(&backend, &cache, cart_show()).await;

        assert!(result.is_err());
        assert!(page.starts_with("Log in\n"));
        assert!(page.contains("Your session has expired, please log in again"));
        assert!(cache.load().expect("cache readable").is_none());
    }

    #[tokio::test]
    async fn test_session_expired_during_action_shows_login() {
        let backend = MockBackend::start().await;
        let cache = logged_in_cache(&backend).await;
        // Bootstrap is confirmed, the cart request that follows is not.
        backend.expire_sessions_after(1);
        backend.reset_requests();

        let (page, result) = page_of(&backend, &cache, cart_show()).await;

        assert!(matches!(result, Err(CliError::Api(ApiError::Unauthorized))));
        assert_eq!(backend.requests(), ["GET /auth/info", "GET /cart"]);
        assert!(page.starts_with("Log in\n"));
        assert!(page.contains("Your session has expired, please log in again"));
        assert!(!page.contains("Your cart"));
    }

    #[tokio::test]
    async fn test_anonymous_cart_shows_login() {
        let backend = MockBackend::start().await;
        let cache = Arc::new(MemorySessionCache::new());

        let (page, result) = page_of(&backend, &cache, cart_show()).await;

        assert!(matches!(result, Err(CliError::Api(ApiError::NotAuthenticated))));
        assert!(page.starts_with("Log in\n"));
        assert!(page.contains("Please log in to continue"));
        assert_eq!(backend.request_count(), 0);
    }
}
