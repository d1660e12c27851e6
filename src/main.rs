use anyhow::Result;
use clap::{Parser, Subcommand};
use magpie_plugins::config::{Settings, SourceBinding};
use magpie_plugins::{Catalog, LogRecord, PluginResolver};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Resolve and exercise magpie plugin implementations
///
/// Each capability is looked up in the environment, then the config file,
/// then discovery, then its built-in default.
#[derive(Parser, Debug)]
#[command(name = "magpie")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: $MAGPIE_CONFIG, ./magpie.toml, ~/.config/magpie/magpie.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Once the environment misses for one capability, skip it for all others
    #[arg(long, global = true)]
    sticky: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Log to file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which Export implementations are active and where they came from
    Resolve {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send one log record through every active Export implementation
    Emit {
        /// Message text
        message: String,

        /// Record level
        #[arg(long, default_value = "info")]
        level: String,

        /// Record target
        #[arg(long, default_value = "magpie")]
        target: String,
    },
    /// Print the configuration key for a capability name
    Key {
        /// Capability name, e.g. Export
        capability: String,
    },
}

/// What `magpie resolve` prints
#[derive(Serialize)]
struct ResolutionReport<'a> {
    /// Capability name
    capability: &'static str,
    /// Where the active set came from (system, file, discovery, default, registered)
    origin: String,
    /// Identifiers in resolution order
    implementations: Vec<&'a str>,
}

fn setup_logging(log_level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.log_file)?;

    info!("Starting magpie v{}", env!("CARGO_PKG_VERSION"));

    // Build settings from CLI flags
    let settings = Settings {
        config_file: args.config,
        binding: if args.sticky {
            SourceBinding::Sticky
        } else {
            SourceBinding::PerCapability
        },
        ..Settings::default()
    };

    match args.command {
        Command::Key { capability } => {
            println!("{}", settings.implementation_key(&capability));
        }
        Command::Resolve { json } => {
            // Resolve the Export capability through the full chain
            let resolver = PluginResolver::builder(Catalog::builtin())
                .settings(settings)
                .build();
            let exports = resolver.log_exports()?;

            let report = ResolutionReport {
                capability: "Export",
                origin: exports.origin().to_string(),
                implementations: exports.identifiers(),
            };

            // Print report
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} ({})", report.capability, report.origin);
                for identifier in &report.implementations {
                    println!("  {}", identifier);
                }
            }
        }
        Command::Emit {
            message,
            level,
            target,
        } => {
            let resolver = PluginResolver::builder(Catalog::builtin())
                .settings(settings)
                .build();
            let exports = resolver.log_exports()?;

            // Fan the record out to every active implementation
            info!("Exporting through {} implementation(s)", exports.len());
            exports.export(&LogRecord::new(level, target, message))?;
        }
    }

    Ok(())
}
