use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod run;
mod sink;

#[derive(Debug, Parser)]
#[command(name = "regcat")]
#[command(about = "Sync catalog products into the gift registry")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    Db,
    Csv,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the catalog for every taxonomy term and write the results
    Scrape {
        #[arg(long, value_enum, default_value_t = SinkKind::Db)]
        sink: SinkKind,

        /// CSV output path (only with `--sink csv`)
        #[arg(long, default_value = "products.csv")]
        output: PathBuf,

        /// Override the taxonomy file from config
        #[arg(long)]
        taxonomy: Option<PathBuf>,

        /// Maximum results taken per search term
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict the run to one category (case-insensitive)
        #[arg(long)]
        category: Option<String>,

        /// Abort on the first record that fails to write
        #[arg(long)]
        fail_fast: bool,

        /// Print records as JSON lines instead of writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Relocate images for a seed file and write its products
    Seed {
        #[arg(long)]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = SinkKind::Db)]
        sink: SinkKind,

        #[arg(long, default_value = "products.csv")]
        output: PathBuf,
    },
    /// Scrape one product page and print it as JSON
    Inspect { url: String },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = regcat_core::load_app_config_from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr; stdout carries command output such as `--dry-run` JSON lines.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Scrape {
            sink,
            output,
            taxonomy,
            limit,
            category,
            fail_fast,
            dry_run,
        }) => {
            let options = run::ScrapeOptions {
                sink,
                output,
                taxonomy,
                limit,
                category,
                fail_fast,
                dry_run,
            };
            run::run_scrape(&config, options).await?;
        }
        Some(Commands::Seed { file, sink, output }) => {
            run::run_seed(&config, &file, sink, &output).await?;
        }
        Some(Commands::Inspect { url }) => run::run_inspect(&config, &url).await?,
        Some(Commands::Db { command }) => run_db(&config, command).await?,
        None => println!("regcat ready; see --help for commands"),
    }

    Ok(())
}

async fn run_db(config: &regcat_core::AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = regcat_db::connect_pool_from_config(config).await?;
    match command {
        DbCommands::Ping => {
            regcat_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = regcat_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    pool.close().await;
    Ok(())
}
