//! Binary entrypoint for the wardbot CLI.
//!
//! Commands:
//! - `start` - run the bot against the console transport (stdin/stdout)
//! - `init` - create a starter `config.toml` and empty data files
//! - `status` - print store counts and a brief config summary
//!
//! See the library crate docs for module-level details: `wardbot::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use wardbot::bot::CommandHandler;
use wardbot::config::Config;
use wardbot::store::listings::ListingBook;
use wardbot::store::todos::TodoList;
use wardbot::store::{JsonSnapshot, SnapshotStore};

#[derive(Parser)]
#[command(name = "wardbot")]
#[command(about = "A housing-plot and to-do tracking chat bot for a FFXIV free company")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console transport
    Start {
        /// Sender name attributed to console input
        #[arg(short, long, default_value = "console")]
        sender: String,
    },
    /// Initialize a new configuration and empty data files
    Init,
    /// Show store counts and configuration summary
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { sender } => {
            let config = Config::load(&cli.config).await?;
            let mut handler = CommandHandler::open(&config)?;
            info!(
                "{} started with prefix '{}', data in {}",
                config.bot.name,
                config.bot.prefix(),
                config.storage.data_dir
            );

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(reply) = handler.handle(&sender, &line).await {
                    println!("{reply}");
                }
            }
            info!("input closed, shutting down");
        }
        Commands::Init => {
            if tokio::fs::metadata(&cli.config).await.is_ok() {
                anyhow::bail!("{} already exists, refusing to overwrite", cli.config);
            }
            Config::create_default(&cli.config).await?;
            let config = Config::load(&cli.config).await?;
            tokio::fs::create_dir_all(&config.storage.data_dir).await?;
            JsonSnapshot::new(config.storage.houses_path()).save(&ListingBook::default())?;
            JsonSnapshot::new(config.storage.todos_path()).save(&TodoList::default())?;
            println!("Wrote {} and empty data files in {}", cli.config, config.storage.data_dir);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            let handler = CommandHandler::open(&config)?;
            println!("bot: {} (prefix '{}')", config.bot.name, config.bot.prefix());
            println!("data dir: {}", config.storage.data_dir);
            println!("active listings: {}", handler.listings().active_count());
            println!(
                "to-dos: {} active / {} total",
                handler.todos().active_count(),
                handler.todos().total_count()
            );
            println!(
                "item lookup: {}",
                if config.lookup.enabled { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();

    // CLI verbosity overrides the configured level
    let level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.as_str())
            .unwrap_or("info")
            .parse()
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new().create(true).append(true).open(&file) {
            let mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // If stdout is a terminal, echo log lines to the console as well;
            // under a service manager the file alone gets them.
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = mutex.lock() {
                    let _ = writeln!(guard, "{line}");
                }
                if is_tty {
                    writeln!(fmt, "{line}")
                } else {
                    Ok(())
                }
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }

    let _ = builder.try_init();
}
