//! Headless Cart CLI - drive a Shopify cart and customer session from the shell.
//!
//! # Usage
//!
//! ```bash
//! # Add a product (first available variant) or a specific variant
//! hc cart add 8123456789
//! hc cart add gid://shopify/ProductVariant/44001234567890 -q 2
//!
//! # Inspect and edit the cart
//! hc cart show
//! hc cart update gid://shopify/CartLine/abc 3
//! hc cart remove gid://shopify/CartLine/abc
//! hc cart checkout
//!
//! # Customer account
//! HEADLESS_CART_PASSWORD=... hc account login jane@example.com
//! hc account orders --first 5
//! hc account logout
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPIFY_STORE` - Store domain, e.g. `my-store.myshopify.com`
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//! - `HEADLESS_CART_STATE_PATH` - Where the cart and session are kept
//! - `SENTRY_DSN` - Optional error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use headless_cart::config::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{App, CommandError};

#[derive(Parser)]
#[command(name = "hc")]
#[command(author, version, about = "Headless Shopify cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the customer session
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents
    Show,
    /// Add a product or variant
    Add {
        /// Product or variant ID (numeric or `gid://shopify/...`)
        id: String,

        /// Explicit variant selection
        #[arg(long)]
        variant: Option<String>,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Change a line's quantity
    Update {
        /// Cart line ID
        line_id: String,

        /// New quantity
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        line_id: String,
    },
    /// Forget the cart and start over
    Clear,
    /// Print the checkout URL
    Checkout,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Sign in
    Login {
        /// Account email address
        email: String,

        /// Account password
        #[arg(long, env = "HEADLESS_CART_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        /// Account email address
        email: String,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Account password
        #[arg(long, env = "HEADLESS_CART_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in customer
    Show,
    /// List recent orders
    Orders {
        /// Page size (1-250)
        #[arg(long, default_value_t = 10)]
        first: i64,

        /// Cursor from a previous page
        #[arg(long)]
        after: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "headless_cart=info,headless_cart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CommandError> {
    let app = App::connect(config).await?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app),
            CartAction::Add {
                id,
                variant,
                quantity,
            } => commands::cart::add(&app, id, variant, quantity).await?,
            CartAction::Update { line_id, quantity } => {
                commands::cart::update(&app, &line_id, quantity).await?;
            }
            CartAction::Remove { line_id } => commands::cart::remove(&app, &line_id).await?,
            CartAction::Clear => commands::cart::clear(&app).await?,
            CartAction::Checkout => commands::cart::checkout(&app)?,
        },
        Commands::Account { action } => match action {
            AccountAction::Login { email, password } => {
                commands::account::login(&app, &email, password).await?;
            }
            AccountAction::Register {
                email,
                first_name,
                last_name,
                password,
            } => {
                commands::account::register(&app, &first_name, &last_name, &email, password)
                    .await?;
            }
            AccountAction::Logout => commands::account::logout(&app).await?,
            AccountAction::Show => commands::account::show(&app),
            AccountAction::Orders { first, after } => {
                commands::account::orders(&app, first, after).await?;
            }
        },
    }
    Ok(())
}
