//! Emporium CLI - a storefront session from the terminal.
//!
//! Every invocation opens a session first: with `EMPORIUM_EMAIL` and
//! `EMPORIUM_PASSWORD` set it logs in (the admin gate with `--admin`) and the
//! local cart starts as a copy of the server cart. The session cookie is not
//! persisted between invocations, so without credentials the CLI stays
//! anonymous: the catalog can be browsed but the cart, checkout and orders
//! need a login.
//!
//! # Usage
//!
//! ```bash
//! # Create the account named by EMPORIUM_EMAIL / EMPORIUM_PASSWORD
//! emporium register --name "Asha"
//!
//! # Browse the catalog
//! emporium products --category shoes --search runner
//!
//! # Work with the cart
//! emporium cart add 665f1c2e9b1d --size 9
//! emporium cart qty 665f1c2e9b1d --size 9 2
//! emporium cart remove 665f1c2e9b1d --size 9
//! emporium cart show
//!
//! # Place an order from the server cart
//! emporium checkout
//!
//! # Order history
//! emporium orders list
//! emporium orders cancel 6660a0c4
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emporium_storefront::StorefrontConfig;

mod commands;
mod output;
mod session;

use commands::CommandError;
use session::Session;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium storefront CLI")]
struct Cli {
    /// Log in through the admin gate
    #[arg(long, global = true)]
    admin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account from EMPORIUM_EMAIL and EMPORIUM_PASSWORD
    Register {
        /// Display name for the new account
        #[arg(short, long)]
        name: String,
    },
    /// List products
    Products {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only products whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Place an order for the current cart
    Checkout,
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersCommand,
    },
}

#[derive(Subcommand)]
enum CartCommand {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        product_id: String,
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Set the quantity of a line (0 removes it)
    Qty {
        product_id: String,
        qty: i64,
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Remove a line
    Remove {
        product_id: String,
        #[arg(short, long)]
        size: Option<String>,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersCommand {
    /// List your orders
    List,
    /// Show one order
    Show { order_id: String },
    /// Cancel an order that has not shipped
    Cancel { order_id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.sentry_environment.clone().into()),
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

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emporium_storefront=info,emporium_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Sentry first so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            output::failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CommandError> {
    // The account does not exist yet, so there is nothing to log in to
    if let Commands::Register { name } = &cli.command {
        return commands::account::register(config, name).await;
    }

    let mut session = Session::open(config, cli.admin).await?;

    match cli.command {
        Commands::Register { .. } => {}
        Commands::Products { category, search } => {
            commands::products::list(&session, category, search).await?;
        }
        Commands::Cart { action } => match action {
            CartCommand::Show => commands::cart::show(&session),
            CartCommand::Add { product_id, size } => {
                commands::cart::add(&mut session, &product_id, size.as_deref()).await?;
            }
            CartCommand::Qty {
                product_id,
                qty,
                size,
            } => {
                commands::cart::set_qty(&mut session, &product_id, size.as_deref(), qty).await?;
            }
            CartCommand::Remove { product_id, size } => {
                commands::cart::remove(&mut session, &product_id, size.as_deref()).await?;
            }
            CartCommand::Clear => commands::cart::clear(&mut session).await?,
        },
        Commands::Checkout => commands::checkout::place(&mut session).await?,
        Commands::Orders { action } => match action {
            OrdersCommand::List => commands::orders::list(&session).await?,
            OrdersCommand::Show { order_id } => commands::orders::show(&session, &order_id).await?,
            OrdersCommand::Cancel { order_id } => {
                commands::orders::cancel(&session, &order_id).await?;
            }
        },
    }
    Ok(())
}
