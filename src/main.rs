//! Binary entrypoint for the Punktune CLI.
//!
//! Commands:
//! - `start` - run the bot on the console (stdin lines in, replies out)
//! - `init` - write a starter `config.toml` and create the data directory
//! - `status` - print user store totals
//!
//! See the library crate docs for module-level details: `punktune::`.
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use punktune::bot::console::{run_stdin, ConsoleDefaults, ConsoleNotices};
use punktune::bot::Router;
use punktune::config::Config;
use punktune::music::{DrainVoiceBackend, PlaybackManager, YtDlpSource};
use punktune::storage::{get_statistics, JsonUserStore, UserRepository};

#[derive(Parser)]
#[command(name = "punktune")]
#[command(about = "RPG economy and music bot")]
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
    /// Start the bot with the console front end
    Start,
    /// Write a default configuration file
    Init,
    /// Show user store statistics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting Punktune v{}", env!("CARGO_PKG_VERSION"));

            let store = Arc::new(JsonUserStore::new(config.storage.users_path()));
            let (music, events) = PlaybackManager::new(
                Arc::new(YtDlpSource::new(&config.music)),
                Arc::new(DrainVoiceBackend),
                Arc::new(ConsoleNotices),
                config.music.allowed_hosts.clone(),
            );
            tokio::spawn(music.clone().run_events(events));

            let mut router = Router::new(&config, store, music);
            let defaults = ConsoleDefaults {
                guild: Some(config.bot.default_guild.clone()),
                voice_channel: config.bot.default_voice_channel.clone(),
            };
            println!(
                "{} ready. Type `user[@guild[#voice]] message`, e.g. `kuro {}rpg hunt`.",
                config.bot.name,
                router.prefix()
            );
            run_stdin(&mut router, &defaults).await?;
            info!("Punktune stopped");
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            info!("Initializing new Punktune configuration");
            if tokio::fs::metadata(&cli.config).await.is_ok() {
                warn!("{} already exists; leaving it untouched", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                info!("Configuration file created at {}", cli.config);
            }
            let config = Config::load(&cli.config).await?;
            tokio::fs::create_dir_all(&config.storage.data_dir).await?;
            info!("Data directory ready at {}", config.storage.data_dir);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let store = JsonUserStore::new(config.storage.users_path());
            let stats = get_statistics(&store.load());
            println!("=== {} Status ===", config.bot.name);
            println!("User store: {}", store.path().display());
            println!("Total Users: {} ({} with a class)", stats.total_users, stats.with_class);
            println!("Baddie Bucks in circulation: {}", stats.total_baddie_bucks);
            println!("Black Musical Notes held: {}", stats.total_black_notes);
            println!("Chat messages counted: {}", stats.total_messages);
            println!("Monsters hunted: {}", stats.monsters_hunted);
            println!("Fish caught: {}", stats.fish_caught);
            println!("Quests completed: {}", stats.quests_completed);
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Console output competes with the prompt only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
