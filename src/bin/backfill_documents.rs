//! Document Backfill CLI Tool
//!
//! Generates missing appointment documents for one appointment or for every
//! appointment in the store.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use board_governance::appointments::{DocumentPipeline, TemplateDocumentGenerator};
use board_governance::config::loader::TemplateCatalog;
use board_governance::config::AppConfig;
use board_governance::database::Database;
use board_governance::services::Services;

#[derive(Parser)]
#[command(name = "backfill-documents")]
#[command(about = "Generate missing appointment documents")]
#[command(version = "0.1.0")]
struct Cli {
    /// Only backfill this appointment
    #[arg(short, long)]
    appointment_id: Option<String>,

    /// Regenerate every required document, even ones that already exist
    #[arg(short, long)]
    force: bool,

    /// Database URL (defaults to the configured one)
    #[arg(long)]
    database_url: Option<String>,

    /// Template catalog to seed before generating
    #[arg(long)]
    templates: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("loading configuration")?;
    let database_url = cli.database_url.as_deref().unwrap_or(&config.database_url);

    let database = Database::new(database_url).await?;
    database.run_migrations().await?;

    let templates = cli
        .templates
        .clone()
        .or_else(|| config.templates_path.as_ref().map(PathBuf::from));
    if let Some(path) = templates {
        TemplateCatalog::load_from_file(&path)?.seed(&database).await?;
    }

    let services = Services::from_config(&config)?;
    let generator = Arc::new(TemplateDocumentGenerator::new(database.clone(), services.storage));
    let pipeline = DocumentPipeline::new(database, generator, config.external_call_timeout());

    info!(
        "Backfilling {} (force={})",
        cli.appointment_id.as_deref().unwrap_or("all appointments"),
        cli.force
    );
    let report = pipeline.backfill(cli.appointment_id.as_deref(), cli.force).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "Processed {} appointments, generated {} documents, {} errors",
        report.processed, report.documents_generated, report.errors_count
    );

    if report.errors_count > 0 {
        std::process::exit(2);
    }
    Ok(())
}
