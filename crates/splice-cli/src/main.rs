//! splice: run a Lua edit script over a text and emit the result with an
//! inline source map.
//!
//! ```text
//! splice transform.lua input.txt              # print to stdout
//! splice transform.lua input.txt -o out.txt --map out.map
//! splice transform.lua input.txt --watch      # re-run on every save
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SPLICE_*`)
//! 3. Project config (`.splice/config.toml` in the project root)
//! 4. Global config (`~/.splice/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `SPLICE_DEBUG`: Enable debug mode (`true`/`false`)
//! - `SPLICE_HIRES`: Character-level mappings
//! - `SPLICE_SOURCE_NAME`: Name recorded in the map's `sources`
//! - `SPLICE_TIMEOUT_MS`: Wall-clock limit per evaluation (0 = none)
//! - `SPLICE_INSTRUCTION_LIMIT`: VM instruction limit (0 = none)
//! - `SPLICE_CANCEL_SUPERSEDED`: Cancel running evaluations on newer edits
//!
//! # Exit Status
//!
//! `0` on success, `1` when the script fails or a file cannot be read.

mod presenter;
mod tracing_writer;
mod watch;

use anyhow::{Context, Result};
use clap::Parser;
use presenter::{Presented, Presenter, Targets};
use splice_lua::LuaExecutor;
use splice_runtime::config::{ConfigError, ConfigLoader, ConfigResolver, SpliceConfig};
use splice_runtime::{Orchestrator, Session, SourceText};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Run a Lua edit script over a text and emit it with a source map.
#[derive(Parser, Debug)]
#[command(name = "splice")]
#[command(version, about, long_about = None)]
struct Args {
    /// Lua script; receives `buffer` and `original`
    script: PathBuf,

    /// Text the script edits
    input: PathBuf,

    /// Write the output here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Also write the source map JSON to this file
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,

    /// Re-run whenever the script or input changes
    #[arg(short, long)]
    watch: bool,

    /// Name recorded in the map's `sources` (also: SPLICE_SOURCE_NAME)
    #[arg(long, value_name = "NAME")]
    source_name: Option<String>,

    /// Map every character, not just chunk and line starts (also: SPLICE_HIRES)
    #[arg(long)]
    hires: bool,

    /// Leave `sourcesContent` out of the map
    #[arg(long)]
    no_content: bool,

    /// Abort an evaluation after this many milliseconds (0 = no limit)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Abort an evaluation after this many VM instructions (0 = no limit)
    #[arg(long, value_name = "N")]
    instruction_limit: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// Write logs to `<PATH>/splice.log` as well
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// File log level (default: debug)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// CLI-based configuration resolver.
///
/// Loads file/env config through its [`ConfigLoader`] and applies CLI
/// arguments as the highest-priority layer.
struct CliConfigResolver {
    loader: ConfigLoader,
    project_root: PathBuf,
    debug: bool,
    hires: bool,
    no_content: bool,
    source_name: Option<String>,
    output: Option<PathBuf>,
    timeout_ms: Option<u64>,
    instruction_limit: Option<u64>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        Self {
            loader: ConfigLoader::new().with_project_root(&project_root),
            project_root,
            debug: args.debug,
            hires: args.hires,
            no_content: args.no_content,
            source_name: args.source_name.clone(),
            output: args.output.clone(),
            timeout_ms: args.timeout_ms,
            instruction_limit: args.instruction_limit,
            log_file: args.log_file.clone(),
            log_level: args.log_level.clone(),
        }
    }

    fn resolve(&self) -> Result<SpliceConfig, ConfigError> {
        let mut config = self.loader.load()?;
        self.apply(&mut config);
        Ok(config)
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut SpliceConfig) {
        if self.debug {
            config.debug = true;
        }
        if self.hires {
            config.sourcemap.hires = true;
        }
        if self.no_content {
            config.sourcemap.include_content = false;
        }
        if let Some(ref name) = self.source_name {
            config.sourcemap.source.clone_from(name);
        }
        if config.sourcemap.file.is_empty() {
            if let Some(name) = self.output.as_deref().and_then(Path::file_name) {
                config.sourcemap.file = name.to_string_lossy().into_owned();
            }
        }
        if let Some(ms) = self.timeout_ms {
            config.executor.timeout_ms = ms;
        }
        if let Some(n) = self.instruction_limit {
            config.executor.instruction_limit = n;
        }
        if let Some(ref p) = self.log_file {
            config.logging.file = true;
            config.logging.file_path = p.to_string_lossy().into_owned();
        }
        if let Some(ref level) = self.log_level {
            config.logging.file_level.clone_from(level);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let resolver = CliConfigResolver::from_args(&args);

    // Resolved before tracing so the file layer can honor logging settings.
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    init_tracing(&args, &config);

    debug!(path = %resolver.project_root.display(), "Project root");

    let script = read_source(&args.script)?;
    let input = read_source(&args.input)?;

    let executor = Arc::new(LuaExecutor::from_config(&config));
    let handle = Orchestrator::spawn(executor, config.orchestrator.clone());
    let session = Session::new(
        SourceText::new(script),
        SourceText::new(input),
        handle.clone(),
    );

    let mut presenter = Presenter::stdio(Targets {
        output: args.output.clone(),
        map: args.map.clone(),
    });

    if args.watch {
        let paths = watch::WatchPaths::resolve(&args.script, &args.input)?;
        return watch::run(session, &mut presenter, paths, config.watch.debounce()).await;
    }

    let sequence = session.refresh();
    let view = handle
        .wait_for(sequence)
        .await
        .context("evaluation stopped before producing a result")?;
    handle.shutdown();

    if presenter.present(&view)? == Presented::Failure {
        std::process::exit(1);
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Terminal and file layers with independent filters.
///
/// Terminal: `--debug` > `--verbose` > `RUST_LOG` > `warn`, always on
/// stderr since stdout carries the output. Script `print` lines are shown by
/// the presenter, so their log target is kept quiet on the terminal.
fn init_tracing(args: &Args, config: &SpliceConfig) {
    let terminal_filter = if args.debug || config.debug {
        EnvFilter::new("debug,splice::script=warn")
    } else if args.verbose {
        EnvFilter::new("info,splice::script=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let log_file = if config.logging.file {
        let dir = config.logging.log_dir();
        match tracing_writer::LogFile::open(&dir) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Warning: cannot open log file in {}: {e}", dir.display());
                None
            }
        }
    } else {
        None
    };

    if let Some(file) = log_file {
        let file_filter = EnvFilter::new(&config.logging.file_level);
        let path = file.path().to_path_buf();
        let file_layer = fmt::layer().with_ansi(false).with_writer(file);

        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .with(file_layer.with_filter(file_filter))
            .init();

        info!(
            path = %path.display(),
            level = %config.logging.file_level,
            "File logging enabled"
        );
    } else {
        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .init();
    }
}
