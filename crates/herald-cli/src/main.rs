//! herald - context-scoped command routing, driven from a console.
//!
//! Every stdin line is delivered as a chat message. Replies are printed
//! as `[conversation] text`; logs go to stderr.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`HERALD_*`)
//! 3. Project config (`.herald/config.toml` in the project root)
//! 4. Global config (`~/.herald/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `HERALD_DEBUG`: Enable debug mode (`true`/`false`)
//! - `HERALD_PREFIX`: Comma-separated command prefixes
//! - `HERALD_DEFAULT_AUTHORITY`: Authority of users seen for the first time
//! - `HERALD_SHOW_WARNING`: Reply with hints when a command is rejected

mod console;

use anyhow::Result;
use clap::Parser;
use console::{ConsoleTransport, Origin};
use herald_runtime::config::{AppConfig, ConfigError, ConfigLoader, ConfigResolver};
use herald_runtime::{App, Dispatch};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// herald - context-scoped command routing for chat bots
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// Ignore the global config file
    #[arg(long)]
    isolated: bool,

    /// Command prefix; repeat for several (also: HERALD_PREFIX)
    #[arg(short, long = "prefix", value_name = "PREFIX")]
    prefixes: Vec<String>,

    /// Authority of users seen for the first time (also: HERALD_DEFAULT_AUTHORITY)
    #[arg(long, value_name = "LEVEL")]
    authority: Option<u32>,

    /// Do not register the built-in help command
    #[arg(long)]
    no_help: bool,

    /// Sender of lines without a header
    #[arg(short, long, default_value_t = 1)]
    user: u64,

    /// Group that lines without a header are sent to (private chat if omitted)
    #[arg(short, long)]
    group: Option<u64>,

    /// Message to deliver once instead of reading stdin
    #[arg(trailing_var_arg = true)]
    message: Vec<String>,
}

/// CLI-based configuration resolver.
///
/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
struct CliConfigResolver {
    project_root: PathBuf,
    isolated: bool,
    debug: bool,
    prefixes: Vec<String>,
    authority: Option<u32>,
    no_help: bool,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        Self {
            project_root,
            isolated: args.isolated,
            debug: args.debug,
            prefixes: args.prefixes.clone(),
            authority: args.authority,
            no_help: args.no_help,
        }
    }

    fn resolve(&self) -> Result<AppConfig, ConfigError> {
        let mut loader = ConfigLoader::new().with_project_root(&self.project_root);
        if self.isolated {
            loader = loader.skip_global_config();
        }

        let mut config = loader.load()?;
        self.apply(&mut config);
        Ok(config)
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut AppConfig) {
        if self.debug {
            config.debug = true;
        }
        if !self.prefixes.is_empty() {
            config.command.prefixes.clone_from(&self.prefixes);
        }
        if let Some(authority) = self.authority {
            config.command.default_authority = authority;
        }
        if self.no_help {
            config.command.help = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let resolver = CliConfigResolver::from_args(&args);
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    // Filter: --debug (or config debug) > --verbose > RUST_LOG env > default "warn"
    let filter = if config.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();

    info!(
        path = %resolver.project_root.display(),
        "Project root"
    );

    let app = App::builder(Arc::new(ConsoleTransport))
        .with_config(config)
        .build()?;
    console::register_builtins(&app)?;

    info!(
        prefixes = ?app.config().command.prefixes,
        "Application initialized (debug={})",
        app.config().debug
    );

    let origin = Origin::new(args.user, args.group);

    if !args.message.is_empty() {
        let line = args.message.join(" ");
        info!("Command mode: {}", line);
        let Some(meta) = console::parse_line(&line, origin) else {
            return Ok(());
        };
        if let Dispatch::Unhandled = app.dispatch(meta).await? {
            eprintln!("Nothing handled: {line}");
            std::process::exit(1);
        }
        return Ok(());
    }

    let (tx, rx) = mpsc::channel(64);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            if matches!(line.trim(), "q" | "quit") {
                info!("Quit requested");
                break;
            }
            let Some(meta) = console::parse_line(&line, origin) else {
                continue;
            };
            if tx.send(meta).await.is_err() {
                break;
            }
        }
    });

    app.run(rx).await;
    reader.await?;
    Ok(())
}
