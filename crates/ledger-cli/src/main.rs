mod config;
mod ledger_cmds;
mod serve_cmd;
mod tool_cmds;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use ledger_core::LedgerService;
use ledger_db::config::DbConfig;
use ledger_db::models::TransactionType;
use ledger_db::pool;

use config::LedgerConfig;

#[derive(Parser)]
#[command(name = "ledger", about = "Personal budget ledger")]
struct Cli {
    /// Database URL (overrides LEDGER_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a ledger config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Address for `ledger serve` to bind
        #[arg(long, default_value = config::ServerSection::DEFAULT_BIND)]
        bind: String,
        /// Port for `ledger serve`
        #[arg(long, default_value_t = config::ServerSection::DEFAULT_PORT)]
        port: u16,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the ledger database if needed and apply migrations
    DbInit,
    /// Category budget management
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Transaction management
    Transaction {
        #[command(subcommand)]
        command: TransactionCommands,
    },
    /// List or invoke ledger tools
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },
    /// Serve the JSON API over HTTP
    Serve {
        /// Bind address (overrides LEDGER_BIND and the config file)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides LEDGER_PORT and the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a category budget
    Add {
        /// Category name (matched exactly against transaction categories)
        category: String,
        /// Budget amount in INR
        #[arg(long)]
        budget: Decimal,
        /// Amount already spent in INR
        #[arg(long, default_value = "0")]
        spent: Decimal,
    },
    /// Show one category budget (or list all)
    Show {
        /// Category budget ID (omit to list all)
        id: Option<i64>,
    },
    /// Partially update a category budget
    Update {
        id: i64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        budget: Option<Decimal>,
        #[arg(long)]
        spent: Option<Decimal>,
    },
    /// Delete a category budget
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a transaction
    Add {
        /// Category the transaction belongs to
        category: String,
        /// Amount in INR (non-negative)
        #[arg(long)]
        amount: Decimal,
        /// Transaction date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// expense or income
        #[arg(long = "type", default_value = "expense")]
        transaction_type: TransactionType,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Show one transaction (or list all)
    Show {
        /// Transaction ID (omit to list all)
        id: Option<i64>,
    },
    /// Partially update a transaction
    Update {
        id: i64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "type")]
        transaction_type: Option<TransactionType>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_location")]
        location: Option<String>,
        /// Remove the stored description
        #[arg(long)]
        clear_description: bool,
        /// Remove the stored location
        #[arg(long)]
        clear_location: bool,
    },
    /// Delete a transaction
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ToolCommands {
    /// List available tools with their descriptions
    List {
        /// Print full JSON specs including parameter schemas
        #[arg(long)]
        json: bool,
    },
    /// Invoke a tool by name
    Call {
        /// Tool name (see `ledger tool list`)
        name: String,
        /// JSON argument object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

/// Execute the `ledger init` command: write config file.
fn cmd_init(db_url: &str, bind: &str, port: u16, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_owned(),
        },
        server: config::ServerSection {
            bind: bind.to_owned(),
            port,
        },
    };

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server       = {bind}:{port}");
    println!();
    println!("Next: run `ledger db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `ledger db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = LedgerConfig::resolve(cli_db_url)?;

    println!("Initializing ledger database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database.");
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("ledger db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            bind,
            port,
            force,
        } => {
            cmd_init(&db_url, &bind, port, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Category { command } => {
            let resolved = LedgerConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let service = LedgerService::new(db_pool.clone());
            let result = ledger_cmds::run_category_command(command, &service).await;
            db_pool.close().await;
            result?;
        }
        Commands::Transaction { command } => {
            let resolved = LedgerConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let service = LedgerService::new(db_pool.clone());
            let result = ledger_cmds::run_transaction_command(command, &service).await;
            db_pool.close().await;
            result?;
        }
        Commands::Tool { command } => {
            let resolved = LedgerConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let service = LedgerService::new(db_pool.clone());
            let result = tool_cmds::run_tool_command(command, &service).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved =
                LedgerConfig::resolve(cli.database_url.as_deref())?.with_server_overrides(bind, port);
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let service = LedgerService::new(db_pool.clone());
            let result =
                serve_cmd::run_serve(service, &resolved.server.bind, resolved.server.port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
