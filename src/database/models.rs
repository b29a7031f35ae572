use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Board resolution status. Transitions only move forward:
/// DRAFT -> PENDING_VOTE -> {ADOPTED | REJECTED}, ADOPTED -> EXECUTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    Draft,
    PendingVote,
    Adopted,
    Rejected,
    Executed,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Draft => "DRAFT",
            ResolutionStatus::PendingVote => "PENDING_VOTE",
            ResolutionStatus::Adopted => "ADOPTED",
            ResolutionStatus::Rejected => "REJECTED",
            ResolutionStatus::Executed => "EXECUTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(ResolutionStatus::Draft),
            "PENDING_VOTE" => Some(ResolutionStatus::PendingVote),
            "ADOPTED" => Some(ResolutionStatus::Adopted),
            "REJECTED" => Some(ResolutionStatus::Rejected),
            "EXECUTED" => Some(ResolutionStatus::Executed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: ResolutionStatus) -> bool {
        matches!(
            (self, next),
            (ResolutionStatus::Draft, ResolutionStatus::PendingVote)
                | (ResolutionStatus::PendingVote, ResolutionStatus::Adopted)
                | (ResolutionStatus::PendingVote, ResolutionStatus::Rejected)
                | (ResolutionStatus::Adopted, ResolutionStatus::Executed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionStatus::Rejected | ResolutionStatus::Executed)
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionType {
    ExecutiveAppointment,
    EquityGrant,
    OfficerRemoval,
    BankingAuthority,
    General,
}

impl ResolutionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionType::ExecutiveAppointment => "EXECUTIVE_APPOINTMENT",
            ResolutionType::EquityGrant => "EQUITY_GRANT",
            ResolutionType::OfficerRemoval => "OFFICER_REMOVAL",
            ResolutionType::BankingAuthority => "BANKING_AUTHORITY",
            ResolutionType::General => "GENERAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "EXECUTIVE_APPOINTMENT" => Some(ResolutionType::ExecutiveAppointment),
            "EQUITY_GRANT" => Some(ResolutionType::EquityGrant),
            "OFFICER_REMOVAL" => Some(ResolutionType::OfficerRemoval),
            "BANKING_AUTHORITY" => Some(ResolutionType::BankingAuthority),
            "GENERAL" => Some(ResolutionType::General),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub id: String,
    pub sequence_number: i64,
    pub resolution_number: String,
    pub title: String,
    pub description: String,
    pub resolution_type: ResolutionType,
    pub status: ResolutionStatus,
    pub meeting_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub metadata: serde_json::Value,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resolution {
    /// Structured appointment referenced by the resolution metadata, if any.
    pub fn appointment_id(&self) -> Option<&str> {
        self.metadata_str("appointment_id")
    }

    /// Legacy onboarding record referenced by the resolution metadata, if any.
    pub fn legacy_appointment_id(&self) -> Option<&str> {
        self.metadata_str("legacy_appointment_id")
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub resolution_id: String,
    pub from_status: Option<ResolutionStatus>,
    pub to_status: ResolutionStatus,
    pub actor: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Yes => "YES",
            VoteChoice::No => "NO",
            VoteChoice::Abstain => "ABSTAIN",
        }
    }

    /// Parses `yes`, `No`, `ABSTAIN`, ...
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Some(VoteChoice::Yes),
            "NO" => Some(VoteChoice::No),
            "ABSTAIN" => Some(VoteChoice::Abstain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub resolution_id: String,
    pub board_member_id: String,
    pub vote: VoteChoice,
    pub comment: Option<String>,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardMember {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Draft,
    SentToBoard,
    Approved,
    Rejected,
    Executed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Draft => "DRAFT",
            AppointmentStatus::SentToBoard => "SENT_TO_BOARD",
            AppointmentStatus::Approved => "APPROVED",
            AppointmentStatus::Rejected => "REJECTED",
            AppointmentStatus::Executed => "EXECUTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(AppointmentStatus::Draft),
            "SENT_TO_BOARD" => Some(AppointmentStatus::SentToBoard),
            "APPROVED" => Some(AppointmentStatus::Approved),
            "REJECTED" => Some(AppointmentStatus::Rejected),
            "EXECUTED" => Some(AppointmentStatus::Executed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Draft, AppointmentStatus::SentToBoard)
                | (AppointmentStatus::SentToBoard, AppointmentStatus::Approved)
                | (AppointmentStatus::SentToBoard, AppointmentStatus::Rejected)
                | (AppointmentStatus::Approved, AppointmentStatus::Executed)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal document produced for an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    AppointmentLetter,
    BoardResolution,
    Certificate,
    EmploymentAgreement,
    ConfidentialityIp,
    StockSubscription,
    DeferredCompensation,
    PreIncorporationConsent,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        DocumentType::AppointmentLetter,
        DocumentType::BoardResolution,
        DocumentType::Certificate,
        DocumentType::EmploymentAgreement,
        DocumentType::ConfidentialityIp,
        DocumentType::StockSubscription,
        DocumentType::DeferredCompensation,
        DocumentType::PreIncorporationConsent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::AppointmentLetter => "appointment_letter",
            DocumentType::BoardResolution => "board_resolution",
            DocumentType::Certificate => "certificate",
            DocumentType::EmploymentAgreement => "employment_agreement",
            DocumentType::ConfidentialityIp => "confidentiality_ip",
            DocumentType::StockSubscription => "stock_subscription",
            DocumentType::DeferredCompensation => "deferred_compensation",
            DocumentType::PreIncorporationConsent => "pre_incorporation_consent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Column on `appointments` holding the generated URL.
    pub fn url_column(&self) -> &'static str {
        match self {
            DocumentType::AppointmentLetter => "appointment_letter_url",
            DocumentType::BoardResolution => "board_resolution_url",
            DocumentType::Certificate => "certificate_url",
            DocumentType::EmploymentAgreement => "employment_agreement_url",
            DocumentType::ConfidentialityIp => "confidentiality_ip_url",
            DocumentType::StockSubscription => "stock_subscription_url",
            DocumentType::DeferredCompensation => "deferred_compensation_url",
            DocumentType::PreIncorporationConsent => "pre_incorporation_consent_url",
        }
    }

    pub fn template_key(&self) -> &'static str {
        match self {
            DocumentType::AppointmentLetter => "offer_letter",
            DocumentType::BoardResolution => "board_resolution",
            DocumentType::Certificate => "stock_certificate",
            DocumentType::EmploymentAgreement => "employment_agreement",
            DocumentType::ConfidentialityIp => "confidentiality_ip",
            DocumentType::StockSubscription => "stock_issuance",
            DocumentType::DeferredCompensation => "deferred_comp_addendum",
            DocumentType::PreIncorporationConsent => "pre_incorporation_consent",
        }
    }

    pub fn bucket(&self) -> &'static str {
        match self {
            DocumentType::BoardResolution | DocumentType::PreIncorporationConsent => {
                "governance-resolutions"
            }
            DocumentType::Certificate => "governance-certificates",
            _ => "contracts-executives",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::AppointmentLetter => "Appointment Letter",
            DocumentType::BoardResolution => "Board Resolution",
            DocumentType::Certificate => "Stock Certificate",
            DocumentType::EmploymentAgreement => "Employment Agreement",
            DocumentType::ConfidentialityIp => "Confidentiality & IP Agreement",
            DocumentType::StockSubscription => "Stock Subscription Agreement",
            DocumentType::DeferredCompensation => "Deferred Compensation Addendum",
            DocumentType::PreIncorporationConsent => "Pre-Incorporation Consent",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated document URLs of an appointment. Blank URLs are never stored,
/// so `get` returning `Some` means the document exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentUrls(BTreeMap<DocumentType, String>);

impl DocumentUrls {
    pub fn get(&self, document_type: DocumentType) -> Option<&str> {
        self.0.get(&document_type).map(String::as_str)
    }

    pub fn has(&self, document_type: DocumentType) -> bool {
        self.0.contains_key(&document_type)
    }

    pub fn set(&mut self, document_type: DocumentType, url: Option<String>) {
        match url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            Some(url) => {
                self.0.insert(document_type, url);
            }
            None => {
                self.0.remove(&document_type);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocumentType, &str)> {
        self.0.iter().map(|(t, u)| (*t, u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub proposed_officer_name: String,
    pub proposed_officer_email: Option<String>,
    pub proposed_title: String,
    pub appointment_type: String,
    pub board_meeting_date: Option<NaiveDate>,
    pub effective_date: NaiveDate,
    pub term_length_months: Option<i64>,
    pub authority_granted: Option<String>,
    pub compensation_structure: Option<String>,
    pub equity_included: bool,
    pub equity_details: Option<String>,
    pub formation_mode: Option<String>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub board_resolution_id: Option<String>,
    pub document_urls: DocumentUrls,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Pending,
    Signed,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::Pending => "pending",
            SignatureStatus::Signed => "signed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SignatureStatus::Pending),
            "signed" => Some(SignatureStatus::Signed),
            _ => None,
        }
    }
}

/// Canonical record of one document of one appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub appointment_id: String,
    pub document_type: DocumentType,
    pub file_url: String,
    pub signed_url: Option<String>,
    pub signature_status: SignatureStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankingStatus {
    Pending,
    Uploaded,
}

impl BankingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankingStatus::Pending => "PENDING",
            BankingStatus::Uploaded => "UPLOADED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BankingStatus::Pending),
            "UPLOADED" => Some(BankingStatus::Uploaded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankingAuthority {
    pub id: String,
    pub appointment_id: String,
    pub status: BankingStatus,
    pub packet_url: Option<String>,
    pub packet_version: i64,
    pub can_sign_wires: bool,
    pub can_sign_checks: bool,
    pub treasury_portal_access: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    Pending,
    DocumentsSent,
    SigningInProgress,
    PartiallySigned,
    Completed,
}

impl OnboardingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStatus::Pending => "pending",
            OnboardingStatus::DocumentsSent => "documents_sent",
            OnboardingStatus::SigningInProgress => "signing_in_progress",
            OnboardingStatus::PartiallySigned => "partially_signed",
            OnboardingStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OnboardingStatus::Pending),
            "documents_sent" => Some(OnboardingStatus::DocumentsSent),
            "signing_in_progress" => Some(OnboardingStatus::SigningInProgress),
            "partially_signed" => Some(OnboardingStatus::PartiallySigned),
            "completed" => Some(OnboardingStatus::Completed),
            _ => None,
        }
    }
}

/// Onboarding record predating structured appointments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAppointment {
    pub id: String,
    pub officer_name: String,
    pub officer_email: String,
    pub onboarding_status: OnboardingStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyDocument {
    pub id: String,
    pub legacy_appointment_id: String,
    pub title: String,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTemplate {
    pub template_key: String,
    pub name: String,
    pub html_content: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfficerStatus {
    Active,
    Inactive,
}

impl OfficerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfficerStatus::Active => "ACTIVE",
            OfficerStatus::Inactive => "INACTIVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(OfficerStatus::Active),
            "INACTIVE" => Some(OfficerStatus::Inactive),
            _ => None,
        }
    }
}

/// Officer registry entry, created when an appointment is adopted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporateOfficer {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub title: String,
    /// Resolution that appointed the officer.
    pub appointed_by: Option<String>,
    pub appointment_id: Option<String>,
    pub effective_date: NaiveDate,
    pub term_end: Option<NaiveDate>,
    pub status: OfficerStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_transitions_are_forward_only() {
        use ResolutionStatus::*;
        let all = [Draft, PendingVote, Adopted, Rejected, Executed];
        let allowed: Vec<(ResolutionStatus, ResolutionStatus)> = all
            .iter()
            .flat_map(|from| all.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            allowed,
            vec![
                (Draft, PendingVote),
                (PendingVote, Adopted),
                (PendingVote, Rejected),
                (Adopted, Executed),
            ]
        );
        assert!(Executed.is_terminal());
        assert!(!Adopted.is_terminal());
    }

    #[test]
    fn test_vote_choice_parsing() {
        assert_eq!(VoteChoice::from_str("yes"), Some(VoteChoice::Yes));
        assert_eq!(VoteChoice::from_str(" Abstain "), Some(VoteChoice::Abstain));
        assert_eq!(VoteChoice::from_str("maybe"), None);
    }

    #[test]
    fn test_document_urls_ignore_blank_values() {
        let mut urls = DocumentUrls::default();
        urls.set(DocumentType::Certificate, Some("   ".to_string()));
        assert!(!urls.has(DocumentType::Certificate));

        urls.set(DocumentType::Certificate, Some("https://x/cert.html".to_string()));
        assert_eq!(urls.get(DocumentType::Certificate), Some("https://x/cert.html"));

        urls.set(DocumentType::Certificate, None);
        assert!(urls.is_empty());
    }

    #[test]
    fn test_document_type_round_trip_names() {
        for t in DocumentType::ALL {
            assert_eq!(DocumentType::from_str(t.as_str()), Some(t));
            assert!(t.url_column().starts_with(t.as_str()));
        }
    }

    #[test]
    fn test_resolution_metadata_lookup() {
        let now = Utc::now();
        let resolution = Resolution {
            id: "r1".to_string(),
            sequence_number: 1,
            resolution_number: "RES-2026-001".to_string(),
            title: "Appoint".to_string(),
            description: String::new(),
            resolution_type: ResolutionType::ExecutiveAppointment,
            status: ResolutionStatus::Draft,
            meeting_date: None,
            effective_date: None,
            metadata: serde_json::json!({"appointment_id": "a1", "legacy_appointment_id": ""}),
            decided_by: None,
            decided_at: None,
            executed_at: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(resolution.appointment_id(), Some("a1"));
        assert_eq!(resolution.legacy_appointment_id(), None);
    }
}
