//! QKart CLI - shop the QKart storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (prompts for the password on stdin when -p is omitted)
//! qkart login -u crio.do
//!
//! # Browse and search the catalog
//! qkart products
//! qkart search ball
//!
//! # Manage the cart
//! qkart cart add BW0jAAeDJmlZCF8i
//! qkart cart set BW0jAAeDJmlZCF8i 3
//! qkart cart show
//! ```
//!
//! # Environment Variables
//!
//! - `QKART_API_ENDPOINT` - backend base URL
//! - `QKART_SESSION_PATH` - where the session is saved
//! - `SENTRY_DSN` - report unexpected failures to Sentry
//! - `RUST_LOG` - log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use qkart_core::ProductId;
use qkart_storefront::config::StorefrontConfig;
use qkart_storefront::{Notice, Storefront};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront CLI")]
struct Cli {
    /// Log as JSON lines instead of text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and save the session
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password; read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Log out and forget the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List all products
    Products,
    /// Search products by name or category
    Search {
        /// Text to search for; with --interactive, read queries from stdin
        text: Option<String>,

        /// Treat each stdin line as a keystroke-by-keystroke query, debounced
        #[arg(short, long)]
        interactive: bool,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with its total
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: String,
    },
    /// Set the quantity of a product (0 removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        qty: u32,
    },
}

/// Initialize Sentry error tracking and return the guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Send warnings and errors to Sentry as events, info and debug as breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_storefront=warn,qkart=warn".into());

    let (text, json) = if log_json {
        let layer = tracing_subscriber::fmt::layer().json().with_writer(io::stderr);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
        (Some(layer), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text)
        .with(json)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.log_json);
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.log_json);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let CliError::Storefront(err) = &e {
                err.report();
                show(&err.notice());
            } else {
                tracing::error!("Command failed: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let storefront = Storefront::new(config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&storefront, &username, password).await?;
        }
        Commands::Logout => commands::auth::logout(&storefront)?,
        Commands::Whoami => commands::auth::whoami(&storefront)?,
        Commands::Products => commands::catalog::products(&storefront).await?,
        Commands::Search { text, interactive } => {
            if interactive {
                commands::catalog::search_interactive(&storefront).await?;
            } else {
                let text = text.ok_or(CliError::MissingQuery)?;
                commands::catalog::search(&storefront, &text).await?;
            }
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show_cart(&storefront).await?,
            CartAction::Add { product_id } => {
                commands::cart::add(&storefront, &ProductId::new(product_id)).await?;
            }
            CartAction::Set { product_id, qty } => {
                commands::cart::set(&storefront, &ProductId::new(product_id), qty).await?;
            }
        },
    }
    Ok(())
}

/// Print a notice to stderr.
pub(crate) fn show(notice: &Notice) {
    let mut stderr = io::stderr().lock();
    // Nothing left to report to if stderr is gone.
    let _ = writeln!(stderr, "{notice}");
}
