use clap::{Parser, Subcommand};
use rowbridge::cli::{self as prog_cli, OutputFormat};
use rowbridge::config::AdapterConfig;
use rowbridge::query::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rowbridge", version, about = "Run MongoDB-style filters against tabular JSON data", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). Env vars and ./rowbridge.toml are also read.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Log level: error|warn|info|debug|trace (overrides config)")]
    log_level: Option<String>,
    #[arg(long, help = "Append one JSON line per query to this file")]
    query_log: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Find rows in a table of a JSON data file")]
    Find {
        #[arg(long, help = "JSON file holding { \"table\": [ {...}, ... ] }")]
        data: PathBuf,
        #[arg(long, help = "Table name")]
        table: String,
        #[arg(long, help = "Filter as JSON, e.g. '{\"status\":{\"$ne\":\"cancelled\"}}'")]
        filter: Option<String>,
        #[arg(long, help = "Sort as JSON, e.g. '{\"created_at\":-1}'")]
        sort: Option<String>,
        #[arg(long, help = "Maximum rows to return (0 = unlimited)")]
        limit: Option<usize>,
        #[arg(long, default_value = "json", help = "Output format: json|ndjson|csv")]
        format: String,
    },
    #[command(about = "Show whether a filter runs natively or through the fallback scan")]
    Explain {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "Count rows matching a filter")]
    Count {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long)]
        filter: Option<String>,
    },
    #[command(about = "Print query counters")]
    Metrics,
}

fn to_command(cmd: Commands) -> Result<prog_cli::Command, Box<dyn std::error::Error>> {
    Ok(match cmd {
        Commands::Find { data, table, filter, sort, limit, format } => prog_cli::Command::Find {
            data,
            table,
            filter_json: filter,
            sort_json: sort,
            limit,
            format: format.parse::<OutputFormat>()?,
        },
        Commands::Explain { filter, sort, limit } => {
            prog_cli::Command::Explain { filter_json: filter, sort_json: sort, limit }
        }
        Commands::Count { data, table, filter } => {
            prog_cli::Command::Count { data, table, filter_json: filter }
        }
        Commands::Metrics => prog_cli::Command::Metrics,
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let cfg = AdapterConfig::load(cli.config.as_deref());
    let level = cli.log_level.clone().or_else(|| cfg.log_level.clone());
    if let Err(e) = rowbridge::logger::configure_logging(cfg.log_dir.as_deref(), level.as_deref(), None) {
        eprintln!("warning: logging not configured: {e}");
    }
    if let Some(ms) = cfg.slow_query_ms {
        telemetry::set_slow_query_ms(ms);
    }
    if let Some(path) = cli.query_log.clone() {
        telemetry::set_query_log(path, cfg.slow_query_ms);
    }
    log::debug!("database_type={} id_field={}", cfg.database_type(), cfg.id_field());
    if let Err(e) = cfg.validate_if_configured() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let r = match to_command(cli.command) {
        Ok(cmd) => {
            let mut stdout = std::io::stdout().lock();
            prog_cli::run(cmd, &mut stdout).await.map_err(Into::into)
        }
        Err(e) => Err(e),
    };
    if let Err(e) = r {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
