// cjedb CLI - builds the event choice database from upstream data and the
// game's reference database

mod exit_codes;
mod fetch;
mod generate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_GENERATE_EXCEPTIONS, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cjedb")]
#[command(about = "Resolve scraped training events to story ids and export their choices")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch upstream events, match them against master.mdb and write the database
    #[command(after_help = "\
Examples:
  cjedb generate --db-path ~/umamusume/master/master.mdb
  cjedb generate --input uma_event_datas.js --output out/cjedb.json
  cjedb generate --exceptions my_exceptions.toml --summary-json
  RUST_LOG=debug cjedb generate --quiet")]
    Generate {
        /// Game reference database (SQLite)
        #[arg(long, env = "CJEDB_DB_PATH", default_value = "master.mdb")]
        db_path: PathBuf,

        /// Output JSON file
        #[arg(long, short = 'o', default_value = "cjedb.json")]
        output: PathBuf,

        /// URL of the upstream event payload
        #[arg(long, env = "CJEDB_UPSTREAM_URL", default_value = cjedb_io::upstream::UPSTREAM_DATA_URL)]
        upstream_url: String,

        /// Read the upstream payload from a local file instead of fetching it
        #[arg(long)]
        input: Option<PathBuf>,

        /// Exception tables (TOML) replacing the built-in ones
        #[arg(long)]
        exceptions: Option<PathBuf>,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        summary_json: bool,

        /// Suppress the summary line and informational logs
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate an exception table file and print its entry counts
    #[command(after_help = "\
Examples:
  cjedb check-exceptions my_exceptions.toml")]
    CheckExceptions {
        /// Exception table file (TOML)
        path: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  cjedb-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            db_path,
            output,
            upstream_url,
            input,
            exceptions,
            summary_json,
            quiet,
        } => {
            init_logging(quiet);
            generate::cmd_generate(generate::GenerateArgs {
                db_path,
                output,
                upstream_url,
                input,
                exceptions,
                summary_json,
                quiet,
            })
        }
        Commands::CheckExceptions { path } => {
            init_logging(false);
            cmd_check_exceptions(path)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn recon(err: cjedb_recon::ReconError) -> Self {
        Self::new(exit_codes::recon_exit_code(&err), err.to_string())
    }

    pub fn io(err: cjedb_io::IoError) -> Self {
        Self::new(exit_codes::io_exit_code(&err), err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// check-exceptions
// ============================================================================

fn cmd_check_exceptions(path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&path)
        .map_err(|e| CliError::args(format!("{}: {}", path.display(), e)))?;
    let tables = cjedb_recon::ExceptionTables::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_GENERATE_EXCEPTIONS, format!("{}: {}", path.display(), e))
    })?;

    let counts = tables.counts();
    println!("{}: ok", path.display());
    println!("  excluded_names:       {}", counts.excluded_names);
    println!("  ignored_chara_names:  {}", counts.ignored_chara_names);
    println!("  removable_suffixes:   {}", counts.removable_suffixes);
    println!("  chara_exclusions:     {}", counts.chara_exclusions);
    println!("  overrides:            {}", counts.overrides);
    println!("  permitted_duplicates: {}", counts.permitted_duplicates);
    Ok(())
}
