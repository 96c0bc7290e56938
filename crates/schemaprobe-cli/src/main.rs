use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemaprobe_core::{Column, Config, DialectConfig, ReadReport, Severity, Table};
use schemaprobe_catalog::{AutoIncrementProbe, CommentStore, MetadataSource, MockSource, MssqlSource};
use schemaprobe_reader::reader_for;

/// Environment variable overriding the configured connection password
const PASSWORD_ENV: &str = "MSSQL_PASSWORD";

/// SchemaProbe - Read normalized schema models from live databases
#[derive(Parser)]
#[command(name = "schemaprobe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemaprobe.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the schema model and print or save it
    Read {
        /// Read from a JSON catalog snapshot instead of a live connection
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Output file for the JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format on stdout
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Name given to the model (default: model_name, then the database name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Test the configured database connection
    CheckConnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    if cli.verbose {
        eprintln!("{} dialect: {:?}", "Using".cyan(), config.dialect);
    }

    match cli.command {
        Commands::Read { snapshot, output, format, name } => {
            read_command(&config, snapshot.as_deref(), output.as_deref(), format, name, cli.verbose).await
        }
        Commands::CheckConnection => check_connection_command(&config, cli.verbose).await,
    }
}

/// Log to stderr, honoring `RUST_LOG`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let mut config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new("schemaprobe.toml").exists() {
        Config::from_file(Path::new("schemaprobe.toml"))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if let (Some(connection), Ok(password)) = (config.connection.as_mut(), std::env::var(PASSWORD_ENV)) {
        tracing::debug!("Using connection password from {}", PASSWORD_ENV);
        connection.password = password;
    }

    Ok(config)
}

/// Model name: explicit flag, then `model_name`, then the connected database, then the snapshot file stem
fn resolve_model_name(config: &Config, explicit: Option<String>, snapshot: Option<&Path>) -> String {
    explicit
        .or_else(|| config.model_name.clone())
        .or_else(|| config.connection.as_ref().map(|c| c.database.clone()))
        .or_else(|| {
            snapshot
                .and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "database".to_string())
}

/// Read command - read and normalize the schema model
async fn read_command(
    config: &Config,
    snapshot: Option<&Path>,
    output: Option<&Path>,
    format: OutputFormat,
    name: Option<String>,
    verbose: bool,
) -> Result<()> {
    let model_name = resolve_model_name(config, name, snapshot);

    let report = if let Some(snapshot_path) = snapshot {
        if verbose {
            eprintln!("{} {}", "Loading snapshot from:".cyan(), snapshot_path.display());
        }
        let source = MockSource::from_snapshot_file(snapshot_path)?;
        if verbose {
            eprintln!("{} {} tables", "Loaded".cyan(), source.table_count().await);
        }
        run_read(config, Arc::new(source), &model_name).await?
    } else {
        let connection = config.connection.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No connection configured. Add a [connection] section to schemaprobe.toml \
                 or pass --snapshot <FILE>."
            )
        })?;

        if verbose {
            eprintln!(
                "{} {}:{}/{}...",
                "Connecting to".cyan(),
                connection.host,
                connection.port,
                connection.database
            );
        }

        let source = MssqlSource::connect(connection)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
        run_read(&live_config(config), Arc::new(source), &model_name).await?
    };

    if let Some(path) = output {
        report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_model_summary(&report),
    }

    Ok(())
}

/// Config for a read over the live SQL Server connection
///
/// The connection only speaks SQL Server, so any other dialect is replaced by `mssql`.
fn live_config(config: &Config) -> Config {
    let mut live = config.clone();
    if live.dialect != DialectConfig::Mssql {
        tracing::warn!(
            "Dialect {:?} does not match the SQL Server connection, using Mssql",
            live.dialect
        );
        live.dialect = DialectConfig::Mssql;
    }
    live
}

async fn run_read<S>(config: &Config, source: Arc<S>, model_name: &str) -> Result<ReadReport>
where
    S: MetadataSource + CommentStore + AutoIncrementProbe + 'static,
{
    let reader = reader_for(config, source)?;
    let outcome = reader.read_model(model_name).await?;
    Ok(outcome.into_report())
}

/// Check connection command - verify the configured database is reachable
async fn check_connection_command(config: &Config, verbose: bool) -> Result<()> {
    let connection = config
        .connection
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No [connection] section found in schemaprobe.toml"))?;

    if verbose {
        eprintln!("{}", "Testing database connection...".cyan());
    }

    let source = MssqlSource::connect(connection)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    source
        .test_connection()
        .await
        .map_err(|e| anyhow::anyhow!("Connection test failed: {}", e))?;

    println!(
        "{} {}:{}/{}",
        "✓ Connected to".green(),
        source.host(),
        source.port(),
        source.database()
    );
    Ok(())
}

/// One-line rendering of a column
fn format_column(column: &Column) -> String {
    let mut line = match column.size {
        _ if column.type_code.is_temporal() => format!("{} {}", column.name, column.type_code),
        Some(size) if column.type_code.is_numeric() && column.scale > 0 => format!("{} {}({},{})", column.name, column.type_code, size, column.scale),
        Some(size) => format!("{} {}({})", column.name, column.type_code, size),
        None => format!("{} {}", column.name, column.type_code),
    };

    if column.primary_key {
        line.push_str(" PRIMARY KEY");
    }
    if column.auto_increment {
        line.push_str(" AUTO_INCREMENT");
    }
    if column.required {
        line.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default_value {
        line.push_str(&format!(" DEFAULT {}", default));
    }
    line
}

fn print_table(table: &Table) {
    match &table.description {
        Some(description) => println!("{} - {}", table.name.bold(), description),
        None => println!("{}", table.name.bold()),
    }

    for column in &table.columns {
        match &column.description {
            Some(description) => println!("  {}  {}", format_column(column), format!("-- {}", description).dimmed()),
            None => println!("  {}", format_column(column)),
        }
    }

    for index in &table.indexes {
        let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
        println!("  {} {} ({})", kind.cyan(), index.name, index.columns.join(", "));
    }
    println!();
}

/// Print the model and its diagnostics
fn print_model_summary(report: &ReadReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", format!("Schema Model: {}", report.database.name).bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    for table in &report.database.tables {
        print_table(table);
    }

    println!("{}", "Summary:".bold());
    println!("  Tables:   {}", report.summary.tables);
    println!("  Columns:  {}", report.summary.columns);
    println!("  Indexes:  {}", report.summary.indexes);

    if report.has_warnings() {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }
    println!();

    if !report.diagnostics.is_empty() {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);
        }
        println!();
    }

    println!("{}", "=".repeat(60).bright_blue());
}
