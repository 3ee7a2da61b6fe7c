//! studyview CLI: serve the dashboard API and inspect studies from a terminal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use studyview_core::{date_util, edf_for_studies, storage, Study, Target};
use studyview_server::{serve, ServerConfig};

#[derive(Parser)]
#[command(
    name = "studyview",
    about = "studyview: browse hyperparameter-optimization studies",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard API server
    Serve {
        /// Path to the studies directory
        #[arg(default_value = "./studies")]
        dir: PathBuf,
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(long, short, default_value_t = 8080)]
        port: u16,
        /// Register this artifact directory at startup
        #[arg(long)]
        artifact_dir: Option<PathBuf>,
        /// Also write logs to daily-rotated files in this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// List studies
    List {
        /// Path to the studies directory
        #[arg(default_value = "./studies")]
        dir: PathBuf,
    },
    /// Show the trials of a study
    Show {
        /// Path to the studies directory
        dir: PathBuf,
        /// Study name
        study: String,
    },
    /// Print the EDF curve of one or more studies
    Edf {
        /// Path to the studies directory
        dir: PathBuf,
        /// Study names, in plotting order
        #[arg(required = true)]
        studies: Vec<String>,
        /// Target to plot, e.g. objective:0 or params:lr
        #[arg(long, short, default_value = "objective:0")]
        target: Target,
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Import a study from a JSON dump
    Import {
        /// Path to the studies directory
        dir: PathBuf,
        /// JSON file holding the study and its trials
        file: PathBuf,
        /// Overwrite an existing study of the same name
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "studyview.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = match &cli.command {
        Commands::Serve { log_dir, .. } => log_dir.clone(),
        _ => None,
    };
    // Dropping the guard flushes pending file logs, so keep it for the whole run.
    let _guard = init_tracing(log_dir.as_deref());

    match cli.command {
        Commands::Serve {
            dir,
            host,
            port,
            artifact_dir,
            ..
        } => {
            cmd_serve(dir, host, port, artifact_dir).await?;
        }
        Commands::List { dir } => {
            cmd_list(&dir)?;
        }
        Commands::Show { dir, study } => {
            cmd_show(&dir, &study)?;
        }
        Commands::Edf {
            dir,
            studies,
            target,
            format,
        } => {
            cmd_edf(&dir, &studies, &target, format)?;
        }
        Commands::Import { dir, file, force } => {
            cmd_import(&dir, &file, force)?;
        }
    }

    Ok(())
}

// ─── Command implementations ──────────────────────────────────────────────────

async fn cmd_serve(dir: PathBuf, host: String, port: u16, artifact_dir: Option<PathBuf>) -> Result<()> {
    println!("studyview dashboard");
    println!("   Studies: {}", dir.display());
    println!("   URL:     http://{}:{}", host, port);
    println!();

    let config = ServerConfig {
        base_dir: dir,
        host,
        port,
        artifact_dir,
    };
    serve(config).await
}

fn cmd_list(dir: &Path) -> Result<()> {
    let names = storage::list_studies(dir)?;
    if names.is_empty() {
        println!("No studies found in '{}'", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Study", "Directions", "Trials", "Created"]);
    for name in &names {
        let summary = storage::summarize_study(dir, name)?;
        let directions: Vec<String> = summary.directions.iter().map(|d| d.to_string()).collect();
        table.add_row([
            summary.name.as_str(),
            &directions.join(", "),
            &summary.n_trials.to_string(),
            &summary.created_at,
        ]);
    }

    println!("Studies in: {}", dir.display());
    println!("{}", table);
    Ok(())
}

fn cmd_show(dir: &Path, name: &str) -> Result<()> {
    let study = storage::load_study(dir, name)?;
    println!("Study: {}", study.name());
    println!("Created: {}", date_util::format_date_local(&study.meta.created_at));
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Trial", "State", "Values", "Params", "Started", "Completed"]);
    for trial in &study.trials {
        let values = trial
            .values
            .as_ref()
            .map(|v| v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", "))
            .unwrap_or_else(|| "-".to_string());
        let params = trial
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row([
            trial.number.to_string(),
            trial.state.to_string(),
            values,
            params,
            date_util::format_optional(trial.datetime_start.as_ref()),
            date_util::format_optional(trial.datetime_complete.as_ref()),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn cmd_edf(dir: &Path, names: &[String], target: &Target, format: OutputFormat) -> Result<()> {
    let studies = names
        .iter()
        .map(|name| storage::load_study(dir, name))
        .collect::<studyview_core::Result<Vec<Study>>>()?;

    if let Some(first) = studies.first() {
        if !target.is_valid_for(first) {
            anyhow::bail!("Target {} is not available in study '{}'", target, first.name());
        }
    }

    let curves = edf_for_studies(&studies, target);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&curves)?);
        }
        OutputFormat::Table => {
            let label = studies
                .first()
                .map(|s| target.to_label(&s.meta.objective_names))
                .unwrap_or_else(|| target.to_string());
            for named in &curves {
                println!("── {} ({}) ──", named.label, label);
                if named.curve.is_empty() {
                    println!("No completed trials with a value for {}", target);
                    println!();
                    continue;
                }
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(["Step", "Value", "Cumulative Probability"]);
                for (i, p) in named.curve.points().iter().enumerate() {
                    table.add_row([i.to_string(), format!("{:.6}", p.x), format!("{:.4}", p.y)]);
                }
                println!("{}", table);
                println!();
            }
        }
    }
    Ok(())
}

fn cmd_import(dir: &Path, file: &Path, force: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let study: Study = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid study dump", file.display()))?;

    if !force && storage::load_study_meta(dir, study.name()).is_ok() {
        anyhow::bail!(
            "Study '{}' already exists in {} (use --force to overwrite)",
            study.name(),
            dir.display()
        );
    }

    storage::ensure_dir(dir)?;
    storage::save_study(dir, &study)?;
    info!(study = %study.name(), trials = study.trials.len(), "Imported study");
    println!("Imported '{}' with {} trials", study.name(), study.trials.len());
    Ok(())
}
