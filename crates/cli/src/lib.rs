pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flywheel_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

use commands::analyze::AnalyzeArgs;

#[derive(Debug, Parser)]
#[command(
    name = "flywheel",
    about = "Flywheel operator CLI",
    long_about = "Import advertising and organic report rows, run flywheel analysis per audit, and inspect stored results.",
    after_help = "Examples:\n  flywheel migrate\n  flywheel import --audit-id a-1 --file rows.json\n  flywheel analyze --audit-id a-1 --top 5\n  flywheel show --audit-id a-1"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load a JSON array of report rows for an audit")]
    Import {
        #[arg(long)]
        audit_id: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, help = "Drop rows already stored for the audit before loading")]
        replace: bool,
    },
    #[command(about = "Run flywheel analysis for an audit and store the result")]
    Analyze {
        #[arg(long)]
        audit_id: String,
        #[arg(long)]
        min_data_points: Option<u32>,
        #[arg(long)]
        trend_window_days: Option<u32>,
        #[arg(long = "top")]
        top_opportunities: Option<u32>,
    },
    #[command(about = "Print the stored analysis result for an audit")]
    Show {
        #[arg(long)]
        audit_id: String,
    },
    #[command(about = "Roll advertising rows of an audit up per campaign")]
    Campaigns {
        #[arg(long)]
        audit_id: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

/// Logs go to stderr so stdout stays a single JSON outcome.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // An invalid config is reported by the command itself.
    init_logging(&AppConfig::load(LoadOptions::default()).unwrap_or_default());

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Import { audit_id, file, replace } => {
            commands::import::run(&audit_id, &file, replace)
        }
        Command::Analyze { audit_id, min_data_points, trend_window_days, top_opportunities } => {
            commands::analyze::run(AnalyzeArgs {
                audit_id,
                min_data_points,
                trend_window_days,
                top_opportunities,
            })
        }
        Command::Show { audit_id } => commands::show::run(&audit_id),
        Command::Campaigns { audit_id } => commands::campaigns::run(&audit_id),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
