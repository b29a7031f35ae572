//! Renders one legal document for an appointment and stores it.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::appointments::templates::{self, format_currency, insert, Context};
use crate::database::models::{Appointment, DocumentType, Resolution};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;
use crate::services::ObjectStorage;

pub const DEFAULT_COMPANY_NAME: &str = "Company, Inc.";
pub const DEFAULT_STATE: &str = "Delaware";

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Renders `document_type` for the appointment and returns its URL.
    async fn generate(
        &self,
        appointment: &Appointment,
        document_type: DocumentType,
    ) -> Result<String, GovernanceError>;
}

/// Generator backed by the `document_templates` table and object storage.
pub struct TemplateDocumentGenerator {
    database: Database,
    storage: Arc<dyn ObjectStorage>,
}

impl TemplateDocumentGenerator {
    pub fn new(database: Database, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { database, storage }
    }
}

#[async_trait]
impl DocumentGenerator for TemplateDocumentGenerator {
    async fn generate(
        &self,
        appointment: &Appointment,
        document_type: DocumentType,
    ) -> Result<String, GovernanceError> {
        let pool = self.database.pool();

        let template = Queries::get_active_template(pool, document_type.template_key())
            .await?
            .ok_or_else(|| {
                GovernanceError::NotFound(format!(
                    "No active template '{}'",
                    document_type.template_key()
                ))
            })?;

        let resolution = match appointment.board_resolution_id.as_deref() {
            Some(id) => Queries::get_resolution(pool, id).await?,
            None => None,
        };
        let settings = Queries::company_settings(pool).await?;

        let context = build_context(appointment, resolution.as_ref(), &settings);
        let html = templates::render(&template.html_content, &context);

        let path = format!(
            "{}/{}_{}.html",
            appointment.id,
            document_type.as_str(),
            Utc::now().timestamp_millis()
        );
        debug!("Rendered {} ({} bytes)", path, html.len());

        let url = self
            .storage
            .upload(document_type.bucket(), &path, "text/html", html.into_bytes())
            .await?;

        info!("Generated {} for appointment {}", document_type, appointment.id);
        Ok(url)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn setting<'a>(settings: &'a HashMap<String, String>, key: &str, default: &'a str) -> &'a str {
    settings
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

/// Adds every scalar of a JSON object (compensation, equity) to the context
/// without overriding keys already present. Free text lands under
/// `<fallback_key>`.
fn merge_details(context: &mut Context, raw: Option<&str>, fallback_key: &str) {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return;
    };

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => {
            for (key, value) in map {
                let key = key.to_lowercase();
                if context.contains_key(&key) {
                    continue;
                }
                let rendered = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n)
                        if key.contains("salary") || key.contains("bonus") =>
                    {
                        n.as_f64().map(format_currency).unwrap_or_else(|| n.to_string())
                    }
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => (if b { "Yes" } else { "No" }).to_string(),
                    _ => continue,
                };
                context.insert(key, rendered);
            }
        }
        _ => insert(context, fallback_key, raw),
    }
}

/// Placeholder values for one appointment.
pub fn build_context(
    appointment: &Appointment,
    resolution: Option<&Resolution>,
    settings: &HashMap<String, String>,
) -> Context {
    let mut ctx = Context::new();
    let name = appointment.proposed_officer_name.as_str();
    let title = appointment.proposed_title.as_str();
    let email = appointment.proposed_officer_email.as_deref().unwrap_or("");
    let effective = format_date(appointment.effective_date);

    for key in ["full_name", "officer_name", "executive_name", "employee_name"] {
        insert(&mut ctx, key, name);
    }
    for key in ["title", "officer_title", "position"] {
        insert(&mut ctx, key, title);
    }
    insert(&mut ctx, "email", email);
    insert(&mut ctx, "officer_email", email);
    insert(&mut ctx, "effective_date", effective.clone());
    insert(&mut ctx, "start_date", effective);
    insert(&mut ctx, "effective_date_iso", appointment.effective_date.to_string());
    insert(&mut ctx, "appointment_id", appointment.id.as_str());
    insert(&mut ctx, "appointment_type", appointment.appointment_type.as_str());
    insert(&mut ctx, "today", format_date(Utc::now().date_naive()));
    insert(
        &mut ctx,
        "certificate_number",
        format!(
            "CERT-{}",
            appointment.id.chars().take(8).collect::<String>().to_uppercase()
        ),
    );

    if let Some(date) = appointment.board_meeting_date {
        insert(&mut ctx, "board_meeting_date", format_date(date));
    }
    if let Some(months) = appointment.term_length_months {
        insert(&mut ctx, "term_length_months", months.to_string());
    }
    if let Some(authority) = &appointment.authority_granted {
        insert(&mut ctx, "authority_granted", authority.as_str());
    }
    if let Some(mode) = &appointment.formation_mode {
        insert(&mut ctx, "formation_mode", mode.as_str());
    }
    insert(
        &mut ctx,
        "equity_included",
        if appointment.equity_included { "Yes" } else { "No" },
    );

    insert(&mut ctx, "company_name", setting(settings, "company_name", DEFAULT_COMPANY_NAME));
    insert(&mut ctx, "state", setting(settings, "state", DEFAULT_STATE));
    insert(&mut ctx, "state_of_incorporation", setting(settings, "state", DEFAULT_STATE));
    for key in [
        "registered_office",
        "registered_agent_name",
        "registered_agent_address",
        "ein",
        "company_address",
    ] {
        insert(&mut ctx, key, setting(settings, key, ""));
    }

    if let Some(resolution) = resolution {
        insert(&mut ctx, "resolution_number", resolution.resolution_number.as_str());
        insert(&mut ctx, "resolution_title", resolution.title.as_str());
        if let Some(date) = resolution.meeting_date.or(resolution.effective_date) {
            insert(&mut ctx, "resolution_date", format_date(date));
        }
    }

    merge_details(
        &mut ctx,
        appointment.compensation_structure.as_deref(),
        "compensation_description",
    );
    merge_details(&mut ctx, appointment.equity_details.as_deref(), "equity_description");

    ctx
}
