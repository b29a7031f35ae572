//! Banking authorization packet: one composite artifact built from an
//! appointment, its resolution, company registry settings and the documents
//! already signed. Never triggers document generation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::appointments::generator::{format_date, DEFAULT_COMPANY_NAME, DEFAULT_STATE};
use crate::appointments::templates::escape_html;
use crate::audit::{record_best_effort, AuditLogger};
use crate::authorization::{Actor, Capability};
use crate::database::models::{
    Appointment, BankingAuthority, CorporateOfficer, DocumentRecord, DocumentType, Resolution,
    SignatureStatus,
};
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;
use crate::services::ObjectStorage;

pub const PACKET_BUCKET: &str = "governance-documents";

/// Signing and portal permissions derived from an officer title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorityFlags {
    pub can_sign_wires: bool,
    pub can_sign_checks: bool,
    pub treasury_portal_access: bool,
}

impl AuthorityFlags {
    pub fn for_title(title: &str) -> Self {
        let title = title.trim().to_uppercase();
        let is = |titles: &[&str]| titles.iter().any(|t| *t == title);
        Self {
            can_sign_wires: is(&["CEO", "CFO"]),
            can_sign_checks: is(&["CEO", "CFO", "COO"]),
            treasury_portal_access: is(&["CEO", "CFO"]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BankingPacket {
    pub appointment_id: String,
    pub packet_url: String,
    pub packet_version: i64,
    pub flags: AuthorityFlags,
    pub signed_documents: Vec<DocumentType>,
    pub authority: BankingAuthority,
}

pub struct BankingPacketAssembler {
    database: Database,
    storage: Arc<dyn ObjectStorage>,
    audit: Option<AuditLogger>,
}

impl BankingPacketAssembler {
    pub fn new(
        database: Database,
        storage: Arc<dyn ObjectStorage>,
        audit: Option<AuditLogger>,
    ) -> Self {
        Self {
            database,
            storage,
            audit,
        }
    }

    pub async fn generate_banking_packet(
        &self,
        actor: &Actor,
        appointment_id: &str,
    ) -> Result<BankingPacket, GovernanceError> {
        actor.require(Capability::GenerateDocuments)?;
        let pool = self.database.pool();

        let appointment = Queries::get_appointment(pool, appointment_id)
            .await?
            .ok_or_else(|| GovernanceError::appointment_not_found(appointment_id))?;
        let resolution = match appointment.board_resolution_id.as_deref() {
            Some(id) => Queries::get_resolution(pool, id).await?,
            None => None,
        };
        let settings = Queries::company_settings(pool).await?;
        let officers = Queries::list_active_officers(pool).await?;
        // A signature only counts for the file the appointment currently points at.
        let signed: Vec<DocumentRecord> = Queries::list_document_records(pool, appointment_id)
            .await?
            .into_iter()
            .filter(|r| r.signature_status == SignatureStatus::Signed)
            .filter(|r| {
                appointment
                    .document_urls
                    .get(r.document_type)
                    .map_or(true, |current| current == r.file_url)
            })
            .collect();

        let flags = AuthorityFlags::for_title(&appointment.proposed_title);
        let now = Utc::now();
        let html = render_packet(
            &appointment,
            resolution.as_ref(),
            &settings,
            &officers,
            &signed,
            flags,
            now,
        );

        let path = format!(
            "banking-authorization/{}_bank_auth_packet_{}.html",
            appointment.id,
            now.timestamp_millis()
        );
        let packet_url = self
            .storage
            .upload(PACKET_BUCKET, &path, "text/html", html.into_bytes())
            .await?;

        let authority = Queries::record_banking_packet(
            pool,
            &appointment.id,
            &packet_url,
            flags.can_sign_wires,
            flags.can_sign_checks,
            flags.treasury_portal_access,
        )
        .await?;

        info!(
            "Banking packet v{} for appointment {} uploaded to {}",
            authority.packet_version, appointment.id, packet_url
        );
        record_best_effort(
            self.audit.as_ref(),
            "banking_packet_generated",
            &appointment.id,
            Some(&actor.user_id),
            serde_json::json!({
                "packet_url": packet_url,
                "packet_version": authority.packet_version,
                "signed_documents": signed.len(),
            }),
        )
        .await;

        Ok(BankingPacket {
            appointment_id: appointment.id,
            packet_url,
            packet_version: authority.packet_version,
            flags,
            signed_documents: signed.iter().map(|r| r.document_type).collect(),
            authority,
        })
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "&#10003; Yes"
    } else {
        "&#10007; No"
    }
}

fn row(label: &str, value: &str) -> String {
    format!("<tr><td>{}</td><td>{}</td></tr>", label, escape_html(value))
}

fn render_packet(
    appointment: &Appointment,
    resolution: Option<&Resolution>,
    settings: &HashMap<String, String>,
    officers: &[CorporateOfficer],
    signed: &[DocumentRecord],
    flags: AuthorityFlags,
    now: DateTime<Utc>,
) -> String {
    let setting = |key: &str| {
        settings
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };
    let company = setting("company_name").unwrap_or(DEFAULT_COMPANY_NAME);
    let state = setting("state").unwrap_or(DEFAULT_STATE);
    let name = appointment.proposed_officer_name.as_str();
    let title = appointment.proposed_title.as_str();
    let email = appointment.proposed_officer_email.as_deref().unwrap_or("N/A");
    let effective = format_date(appointment.effective_date);
    let today = format_date(now.date_naive());

    let certificate = appointment
        .document_urls
        .get(DocumentType::Certificate)
        .map(|url| format!("<p><strong>Certificate URL:</strong> {}</p>", escape_html(url)))
        .unwrap_or_default();

    let (resolution_number, resolution_date) = match resolution {
        Some(r) => (
            r.resolution_number.clone(),
            r.meeting_date
                .or(r.effective_date)
                .map(format_date)
                .unwrap_or_default(),
        ),
        None => ("N/A".to_string(), String::new()),
    };

    let verified_on = format_date(appointment.approved_at.unwrap_or(now).date_naive());

    let mut registry = vec![
        row("Company Name:", company),
        row("State of Incorporation:", state),
        row("Registered Office:", setting("registered_office").unwrap_or("")),
        row("Registered Agent:", setting("registered_agent_name").unwrap_or("")),
        row("Registered Agent Address:", setting("registered_agent_address").unwrap_or("")),
    ];
    if let Some(ein) = setting("ein") {
        registry.push(row("EIN:", ein));
    }

    let officer_rows = if officers.is_empty() {
        format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(name),
            escape_html(title),
            effective
        )
    } else {
        officers
            .iter()
            .map(|o| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&o.full_name),
                    escape_html(&o.title),
                    format_date(o.effective_date)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let documents = if signed.is_empty() {
        "<li>No additional documents</li>".to_string()
    } else {
        signed
            .iter()
            .map(|r| {
                let link = r.signed_url.as_deref().unwrap_or(&r.file_url);
                format!(
                    r#"<li><a href="{}">{}</a> - Signed</li>"#,
                    escape_html(link),
                    escape_html(r.document_type.display_name())
                )
            })
            .collect()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Bank Authorization Packet - {name}</title>
<style>
body {{ font-family: Arial, sans-serif; padding: 40px; }}
.page-break {{ page-break-after: always; }}
.info-table {{ width: 100%; border-collapse: collapse; }}
.info-table td {{ padding: 8px; border: 1px solid #ddd; }}
</style>
</head>
<body>
<div class="header">
<h1>BANK AUTHORIZATION PACKET</h1>
<p><strong>{company}</strong></p>
<p>{state} Corporation</p>
<p>Generated: {today}</p>
</div>

<div class="section">
<h2>1. Officer Certificate</h2>
<p>This certifies that <strong>{name}</strong> has been duly appointed as <strong>{title}</strong> of {company}, effective {effective}.</p>
{certificate}
</div>
<div class="page-break"></div>

<div class="section">
<h2>2. Appointment Letter</h2>
<table class="info-table">
{appt_name}{appt_title}{appt_email}{appt_effective}
</table>
</div>
<div class="page-break"></div>

<div class="section">
<h2>3. Board Resolution</h2>
<table class="info-table">
{res_number}{res_date}
</table>
</div>
<div class="page-break"></div>

<div class="section">
<h2>4. Identity Verification Summary</h2>
<table class="info-table">
{id_name}{id_email}
<tr><td>Identity Verified:</td><td>&#10003; Yes</td></tr>
<tr><td>Background Check:</td><td>&#10003; Complete</td></tr>
{id_date}
</table>
</div>
<div class="page-break"></div>

<div class="section">
<h2>5. Corporate Officer Listing</h2>
<table class="info-table">
{registry}
</table>
<h3>Current Officers:</h3>
<table class="info-table">
{officer_rows}
</table>
</div>
<div class="page-break"></div>

<div class="section">
<h2>6. Banking Authority</h2>
<table class="info-table">
{auth_name}{auth_title}
<tr><td>Can Sign Wires:</td><td>{wires}</td></tr>
<tr><td>Can Sign Checks:</td><td>{checks}</td></tr>
<tr><td>Treasury Portal Access:</td><td>{treasury}</td></tr>
</table>
</div>
<div class="page-break"></div>

<div class="section">
<h2>7. Supporting Documents</h2>
<ul class="document-list">
{documents}
</ul>
</div>

<div class="signature-section">
<p><strong>Corporate Secretary</strong></p>
<p>{company}</p>
<p>Date: {today}</p>
</div>
</body>
</html>
"#,
        name = escape_html(name),
        title = escape_html(title),
        company = escape_html(company),
        state = escape_html(state),
        today = today,
        effective = effective,
        certificate = certificate,
        appt_name = row("Name:", name),
        appt_title = row("Title:", title),
        appt_email = row("Email:", email),
        appt_effective = row("Effective Date:", &effective),
        res_number = row("Resolution Number:", &resolution_number),
        res_date = row("Resolution Date:", &resolution_date),
        id_name = row("Officer Name:", name),
        id_email = row("Email Address:", email),
        id_date = row("Verification Date:", &verified_on),
        registry = registry.join("\n"),
        officer_rows = officer_rows,
        auth_name = row("Officer:", name),
        auth_title = row("Title:", title),
        wires = yes_no(flags.can_sign_wires),
        checks = yes_no(flags.can_sign_checks),
        treasury = yes_no(flags.treasury_portal_access),
        documents = documents,
    )
}
