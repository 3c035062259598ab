// generate: upstream payload + master.mdb -> cjedb.json

use std::fs;
use std::path::PathBuf;

use cjedb_io::output::{write_json, Database};
use cjedb_io::upstream::parse_payload;
use cjedb_io::SqliteStore;
use cjedb_recon::{Diagnostic, ExceptionTables, RunSummary};

use crate::exit_codes::{EXIT_GENERATE_EXCEPTIONS, EXIT_GENERATE_PAYLOAD};
use crate::fetch::FetchClient;
use crate::CliError;

pub(crate) struct GenerateArgs {
    pub db_path: PathBuf,
    pub output: PathBuf,
    pub upstream_url: String,
    pub input: Option<PathBuf>,
    pub exceptions: Option<PathBuf>,
    pub summary_json: bool,
    pub quiet: bool,
}

pub(crate) fn cmd_generate(args: GenerateArgs) -> Result<(), CliError> {
    let tables = load_tables(args.exceptions.as_ref())?;
    let counts = tables.counts();
    tracing::info!(
        excluded = counts.excluded_names,
        overrides = counts.overrides,
        permitted_duplicates = counts.permitted_duplicates,
        "exception tables loaded"
    );

    let store = SqliteStore::open(&args.db_path).map_err(|e| {
        CliError::io(e).with_hint(format!(
            "check --db-path (currently {})",
            args.db_path.display()
        ))
    })?;

    let payload = match &args.input {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CliError::new(EXIT_GENERATE_PAYLOAD, format!("{}: {}", path.display(), e))
        })?,
        None => {
            tracing::info!(url = %args.upstream_url, "fetching upstream events");
            FetchClient::new()?.get_text(&args.upstream_url)?
        }
    };

    let events = parse_payload(&payload).map_err(CliError::io)?;
    tracing::info!(records = events.len(), "upstream payload parsed");

    let result = cjedb_recon::run(&tables, &store, &events).map_err(CliError::recon)?;
    for diagnostic in &result.diagnostics {
        log_diagnostic(diagnostic);
    }

    let db = Database::from_table(&result.table);
    write_json(&db, &args.output).map_err(|e| {
        CliError::io(e).with_hint(format!("could not write {}", args.output.display()))
    })?;
    tracing::info!(path = %args.output.display(), events = db.events.len(), "database written");

    report(&result.summary, args.summary_json, args.quiet)
}

fn load_tables(path: Option<&PathBuf>) -> Result<ExceptionTables, CliError> {
    let Some(path) = path else {
        return ExceptionTables::builtin().map_err(CliError::recon);
    };
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_GENERATE_EXCEPTIONS, format!("{}: {}", path.display(), e))
    })?;
    ExceptionTables::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_GENERATE_EXCEPTIONS, format!("{}: {}", path.display(), e))
            .with_hint(format!("run `cjedb check-exceptions {}`", path.display()))
    })
}

fn log_diagnostic(diagnostic: &Diagnostic) {
    match diagnostic {
        Diagnostic::UnknownEventKind { .. } => {
            tracing::error!(kind = %diagnostic.kind(), "{diagnostic}")
        }
        _ => tracing::warn!(kind = %diagnostic.kind(), "{diagnostic}"),
    }
}

fn report(summary: &RunSummary, as_json: bool, quiet: bool) -> Result<(), CliError> {
    if as_json {
        let json = serde_json::to_string_pretty(summary)
            .map_err(|e| CliError::new(crate::exit_codes::EXIT_ERROR, e.to_string()))?;
        println!("{json}");
    } else if !quiet {
        println!("{summary}");
    }
    Ok(())
}
