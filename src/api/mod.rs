//! HTTP surface. Every route answers with the `{success, data?, error?,
//! details?}` envelope.

pub mod auth;
pub mod handlers;
pub mod response;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::appointments::{
    AppointmentService, BankingPacketAssembler, DocumentGenerator, DocumentPipeline,
    ExecutionOrchestrator,
};
use crate::audit::AuditLogger;
use crate::config::{AppConfig, QuorumRuleKind};
use crate::database::Database;
use crate::governance::{rule_for, ResolutionManager};
use crate::services::Services;

pub use auth::AuthActor;
pub use response::{ApiError, ApiResponse, ApiResult, Envelope};

/// Settings the HTTP layer needs from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct StateOptions {
    pub jwt_secret: String,
    pub portal_url: String,
    pub call_timeout: Duration,
    pub quorum_rule: QuorumRuleKind,
}

impl StateOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.auth.jwt_secret.clone(),
            portal_url: config.portal_url.clone(),
            call_timeout: config.external_call_timeout(),
            quorum_rule: config.quorum_rule,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub resolutions: ResolutionManager,
    pub appointments: AppointmentService,
    pub pipeline: DocumentPipeline,
    pub orchestrator: Arc<ExecutionOrchestrator>,
    pub banking: Arc<BankingPacketAssembler>,
}

impl AppState {
    pub fn new(
        database: Database,
        services: Services,
        generator: Arc<dyn DocumentGenerator>,
        options: StateOptions,
        audit: Option<AuditLogger>,
    ) -> Self {
        let resolutions = ResolutionManager::new(
            database.clone(),
            rule_for(options.quorum_rule),
            audit.clone(),
        );
        let appointments =
            AppointmentService::new(database.clone(), resolutions.clone(), audit.clone());
        let pipeline = DocumentPipeline::new(database.clone(), generator, options.call_timeout);
        let orchestrator = ExecutionOrchestrator::new(
            database.clone(),
            pipeline.clone(),
            services.identity.clone(),
            services.notifier.clone(),
            options.portal_url.clone(),
            options.call_timeout,
        );
        let banking = BankingPacketAssembler::new(database, services.storage.clone(), audit);

        Self {
            jwt_secret: Arc::from(options.jwt_secret),
            resolutions,
            appointments,
            pipeline,
            orchestrator: Arc::new(orchestrator),
            banking: Arc::new(banking),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/appointments", post(handlers::propose_appointment))
        .route("/api/appointments/:id", get(handlers::get_appointment))
        .route("/api/appointments/:id/documents", post(handlers::generate_document))
        .route("/api/appointments/:id/signatures", post(handlers::record_signature))
        .route("/api/appointments/:id/banking-packet", post(handlers::generate_banking_packet))
        .route("/api/documents/backfill", post(handlers::backfill_documents))
        .route("/api/resolutions/:id", get(handlers::get_resolution))
        .route("/api/resolutions/:id/votes", post(handlers::cast_vote))
        .route("/api/resolutions/:id/tally", get(handlers::tally))
        .route("/api/resolutions/:id/adopt", post(handlers::manual_adopt))
        .route("/api/resolutions/:id/reject", post(handlers::manual_reject))
        .route("/api/resolutions/:id/execute", post(handlers::execute_resolution))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(state)
}
