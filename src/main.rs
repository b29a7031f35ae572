use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use board_governance::api::{self, AppState, StateOptions};
use board_governance::appointments::TemplateDocumentGenerator;
use board_governance::audit::AuditLogger;
use board_governance::config::loader::TemplateCatalog;
use board_governance::config::AppConfig;
use board_governance::database::Database;
use board_governance::services::Services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "board_governance=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting board governance service");

    let config = AppConfig::load()?;
    info!("Configuration loaded (quorum rule: {:?})", config.quorum_rule);

    let database = Database::new(&config.database_url).await?;
    info!("Database connected");

    database.run_migrations().await?;
    info!("Database migrations completed");

    match config.templates_path.as_deref() {
        Some(path) => {
            let catalog = TemplateCatalog::load_from_file(Path::new(path))?;
            catalog.seed(&database).await?;
        }
        None => warn!("No templates_path configured; using templates already stored"),
    }

    let audit_logger = if config.audit.enabled {
        Some(AuditLogger::new(config.audit.log_path.clone(), config.audit.server_id.clone()).await?)
    } else {
        None
    };
    info!("Audit logger initialized");

    let services = Services::from_config(&config)?;
    let generator = Arc::new(TemplateDocumentGenerator::new(
        database.clone(),
        services.storage.clone(),
    ));

    let state = AppState::new(
        database,
        services,
        generator,
        StateOptions::from_config(&config),
        audit_logger,
    );
    let app = api::router(state);

    let addr = config.bind_address();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
