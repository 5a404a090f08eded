//! tfsource CLI - Command-line interface for the validated source store

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tfsource::config::{self, TfsourceConfig};
use tfsource::import::ImportReport;
use tfsource::server::{self, AppState};
use tfsource::timeout;
use tfsource::ui::{self, Icons};
use tfsource::{Source, SourceExporter, SourceImporter, SourceStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tfsource")]
#[command(version)]
#[command(about = "Validated storage for infrastructure-definition sources")]
#[command(long_about = r#"
tfsource keeps Terraform sources in a SQLite store and only ever stores
content the external validator accepted.

Example usage:
  tfsource init
  tfsource import --base ./infra
  tfsource import --base ./infra modules/net/main.tf
  tfsource export modules/net/main.tf --into ./out
  tfsource serve --port 3000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to tfsource.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database directory
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Import files into the store
    Import {
        /// Base directory; stripped from the stored filenames
        #[arg(short, long)]
        base: PathBuf,

        /// Files to import (absolute or relative to the base); all sources under the base when empty
        paths: Vec<PathBuf>,
    },

    /// Write stored sources back to disk
    Export {
        /// Logical filename of the source to export
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        filename: Option<String>,

        /// Export every source
        #[arg(long)]
        all: bool,

        /// Target directory (defaults to the configured export directory)
        #[arg(short, long)]
        into: Option<PathBuf>,
    },

    /// Print a stored source
    Show {
        filename: String,
    },

    /// List stored sources
    List,

    /// Replace a source's content from a file
    Update {
        filename: String,

        /// File holding the new content
        #[arg(short, long)]
        from: PathBuf,
    },

    /// Delete a source
    Delete {
        filename: String,
    },

    /// Run the configured validator on a file without storing it
    Validate {
        file: PathBuf,
    },

    /// Show statistics about the store
    Stats,

    /// Serve the store over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// A failure whose JSON envelope has already been printed
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Reported(String);

/// One `--json` document; `failure` is `(kind, message)`
fn envelope(
    command: Option<&str>,
    data: Option<serde_json::Value>,
    failure: Option<(&str, &str)>,
) -> serde_json::Value {
    let mut envelope = serde_json::json!({ "ok": failure.is_none() });
    if let Some(command) = command {
        envelope["command"] = command.into();
    }
    if let Some(data) = data {
        envelope["data"] = data;
    }
    if let Some((kind, error)) = failure {
        envelope["kind"] = kind.into();
        envelope["error"] = error.into();
    }
    envelope
}

fn emit_success(mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&envelope(Some(command), Some(data), None))?);
    }
    Ok(())
}

/// Report a command whose data matters even when it failed.
///
/// In JSON mode the single envelope carries both the data and the failure.
fn emit_outcome(
    mode: OutputMode,
    command: &str,
    data: serde_json::Value,
    failure: Option<(&str, String)>,
) -> anyhow::Result<()> {
    let Some((kind, message)) = failure else {
        return emit_success(mode, command, data);
    };
    if mode == OutputMode::Json {
        let doc = envelope(Some(command), Some(data), Some((kind, &message)));
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Err(Reported(message).into());
    }
    Err(anyhow::anyhow!(message))
}

fn emit_error(mode: OutputMode, err: &anyhow::Error) {
    if err.is::<Reported>() {
        return;
    }
    match mode {
        OutputMode::Json => {
            let kind = err
                .downcast_ref::<tfsource::Error>()
                .map(|e| e.kind())
                .unwrap_or("error");
            println!("{}", envelope(None, None, Some((kind, &format!("{:#}", err)))));
        }
        OutputMode::Human => ui::error(&format!("{:#}", err)),
    }
}

/// Resolved settings for one invocation
struct Context {
    config: TfsourceConfig,
    config_path: PathBuf,
    database: PathBuf,
    mode: OutputMode,
}

impl Context {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
        let config = config::load_config(Some(&config_path))?.unwrap_or_default();
        let database = cli.database.clone().unwrap_or_else(|| config.database.clone());
        let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
        Ok(Self {
            config,
            config_path,
            database,
            mode,
        })
    }

    fn open_store(&self) -> anyhow::Result<SourceStore> {
        config::ensure_db_dir(&self.database)?;
        let validator = self.config.validator.build()?;
        let store = SourceStore::open(&self.database, validator)?
            .with_validation_timeout(self.config.validator.timeout());
        Ok(store)
    }

    fn exporter(&self) -> SourceExporter {
        SourceExporter::new(&self.config.default_export_dir)
            .with_io_timeout(self.config.import.io_timeout())
    }

    fn importer<'a>(&self, store: &'a SourceStore) -> SourceImporter<'a> {
        SourceImporter::new(store)
            .with_io_timeout(self.config.import.io_timeout())
            .with_patterns(self.config.import.patterns.clone())
            .with_excludes(self.config.import.exclude.clone())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; stderr keeps stdout clean for --json
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            emit_error(mode, &err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(&cli)?;

    match cli.command {
        Commands::Init { force } => run_init(&ctx, force),
        Commands::Import { base, paths } => run_import(&ctx, &base, &paths),
        Commands::Export { filename, all, into } => run_export(&ctx, filename.as_deref(), all, into.as_deref()),
        Commands::Show { filename } => {
            let store = ctx.open_store()?;
            let source = store.find(&filename)?;
            if ctx.mode.is_human() {
                ui::header(&source.filename);
                ui::info("Id", &source.id.to_string());
                ui::info("Updated", &source.updated_at.to_rfc3339());
                ui::info("Fingerprint", &source.fingerprint());
                println!();
                println!("{}", source.content);
            }
            emit_success(ctx.mode, "show", serde_json::to_value(&source)?)
        }
        Commands::List => {
            let store = ctx.open_store()?;
            let sources = store.list()?;
            if ctx.mode.is_human() {
                if sources.is_empty() {
                    println!("∅ No sources stored.");
                } else {
                    println!("{}", ui::sources_table(&sources));
                }
            }
            emit_success(ctx.mode, "list", serde_json::to_value(&sources)?)
        }
        Commands::Update { filename, from } => {
            let store = ctx.open_store()?;
            let existing = store.find(&filename)?;
            let content = timeout::read_to_string(&from, ctx.config.import.io_timeout())?;
            let updated = store.update(existing.id, &content)?;
            if ctx.mode.is_human() {
                ui::success(&format!("Updated {} ({} bytes)", updated.filename, updated.size()));
            }
            emit_success(ctx.mode, "update", serde_json::to_value(&updated)?)
        }
        Commands::Delete { filename } => {
            let store = ctx.open_store()?;
            let existing = store.find(&filename)?;
            store.delete(existing.id)?;
            if ctx.mode.is_human() {
                println!("{} Deleted {}", Icons::DEL, existing.filename);
            }
            emit_success(ctx.mode, "delete", serde_json::json!({ "filename": existing.filename }))
        }
        Commands::Validate { file } => run_validate(&ctx, &file),
        Commands::Stats => {
            let store = ctx.open_store()?;
            let stats = store.stats()?;
            if ctx.mode.is_human() {
                println!("{} tfsource Statistics ({})", Icons::STATS, ctx.database.display());
                println!("{}", ui::stats_table(&stats));
            }
            emit_success(ctx.mode, "stats", serde_json::to_value(&stats)?)
        }
        Commands::Serve { port } => {
            config::ensure_db_dir(&ctx.database)?;
            let state = AppState {
                database_path: ctx.database.clone(),
                validator: ctx.config.validator.build()?,
                validation_timeout: ctx.config.validator.timeout(),
                exporter: ctx.exporter(),
            };
            // Create the schema up front so a bad database path fails before binding
            state.open_store()?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start_server(port, state))
        }
    }
}

fn run_init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let mut config = ctx.config.clone();
    config.database = ctx.database.clone();
    config::write_config(&ctx.config_path, &config, force)?;
    config::ensure_db_dir(&config.database)?;

    if ctx.mode.is_human() {
        ui::success(&format!("Wrote {}", ctx.config_path.display()));
        ui::summary_row("Database:", &config.database.display().to_string());
        ui::summary_row("Export dir:", &config.default_export_dir.display().to_string());
        ui::summary_row("Validator:", &format!("{} {}", config.validator.program, config.validator.args.join(" ")));
    }
    emit_success(
        ctx.mode,
        "init",
        serde_json::json!({ "config": ctx.config_path, "database": config.database }),
    )
}

fn run_import(ctx: &Context, base: &Path, paths: &[PathBuf]) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let importer = ctx.importer(&store);

    let files = if paths.is_empty() {
        importer.candidates(base)?
    } else {
        paths.to_vec()
    };

    if ctx.mode.is_human() {
        ui::header(&format!("Importing {} file(s) from {}", files.len(), base.display()));
    }

    let progress = ui::ImportProgress::new(files.len(), ctx.mode.is_human());
    let report = importer.import_all(base, &files, |input, result| {
        let label = match result {
            Ok(source) => source.filename.clone(),
            Err(_) => input.display().to_string(),
        };
        progress.file_done(&label);
    });
    progress.finish(report.imported.len(), report.duplicates.len(), report.failed.len());

    if ctx.mode.is_human() {
        print_import_report(&report);
    }
    let failure = (!report.is_clean())
        .then(|| ("import", format!("{} file(s) failed to import", report.failed.len())));
    emit_outcome(ctx.mode, "import", serde_json::to_value(&report)?, failure)
}

fn print_import_report(report: &ImportReport) {
    if !report.imported.is_empty() {
        ui::section("Imported");
        for filename in &report.imported {
            ui::file_new(filename);
        }
    }
    if !report.duplicates.is_empty() {
        ui::section("Already stored");
        for filename in &report.duplicates {
            ui::file_skipped(filename, "(duplicate filename)");
        }
    }
    if !report.failed.is_empty() {
        ui::section("Failed");
        for failure in &report.failed {
            ui::file_failed(&failure.path.display().to_string(), &failure.error);
        }
    }
}

fn run_export(ctx: &Context, filename: Option<&str>, all: bool, into: Option<&Path>) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let exporter = ctx.exporter();
    let target = into.unwrap_or(exporter.default_dir()).to_path_buf();

    let sources: Vec<Source> = match filename {
        Some(filename) if !all => vec![store.find(filename)?],
        _ => store.list()?,
    };

    if sources.is_empty() && ctx.mode.is_human() {
        ui::warn("Nothing to export.");
    }

    let written = exporter.export_all(&sources, &target)?;
    if ctx.mode.is_human() {
        for path in &written {
            println!("{} {}", Icons::EXPORT, path.display());
        }
        ui::success(&format!("Exported {} source(s) to {}", written.len(), target.display()));
    }
    emit_success(ctx.mode, "export", serde_json::json!({ "written": written }))
}

fn run_validate(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let validator = ctx.config.validator.build()?;
    let content = timeout::read_to_string(file, ctx.config.import.io_timeout())?;

    if ctx.mode.is_human() {
        println!("{} Validating {} with {}", Icons::SHIELD, file.display(), ctx.config.validator.program);
    }
    let verdict = validator.validate(&content, ctx.config.validator.timeout())?;

    if ctx.mode.is_human() {
        ui::verdict(&file.display().to_string(), &verdict);
    }
    let failure = (!verdict.is_valid())
        .then(|| ("validation", format!("{} failed validation", file.display())));
    emit_outcome(ctx.mode, "validate", serde_json::to_value(&verdict)?, failure)
}
