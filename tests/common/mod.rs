#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use board_governance::api::{AppState, StateOptions};
use board_governance::appointments::{DocumentGenerator, NewAppointment};
use board_governance::authorization::{issue_token, Actor, Role};
use board_governance::config::QuorumRuleKind;
use board_governance::database::models::{Appointment, BoardMember, DocumentType};
use board_governance::database::queries::Queries;
use board_governance::database::Database;
use board_governance::services::{
    EmailMessage, IdentityService, Notifier, ObjectStorage, Services, UserAccount,
};
use board_governance::GovernanceError;

pub const JWT_SECRET: &str = "test-secret";
pub const CALL_TIMEOUT: Duration = Duration::from_millis(300);

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    Database::new_in_memory().await.expect("Failed to create test database")
}

/// Document generator that records calls and can be told to fail or hang
/// for specific types.
#[derive(Default)]
pub struct MockGenerator {
    calls: Mutex<Vec<(String, DocumentType)>>,
    failing: Mutex<HashSet<DocumentType>>,
    hanging: Mutex<HashSet<DocumentType>>,
    counter: AtomicUsize,
}

impl MockGenerator {
    pub fn fail_on(&self, document_type: DocumentType) {
        self.failing.lock().unwrap().insert(document_type);
    }

    pub fn hang_on(&self, document_type: DocumentType) {
        self.hanging.lock().unwrap().insert(document_type);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
        self.hanging.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<(String, DocumentType)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentGenerator for MockGenerator {
    async fn generate(
        &self,
        appointment: &Appointment,
        document_type: DocumentType,
    ) -> Result<String, GovernanceError> {
        self.calls
            .lock()
            .unwrap()
            .push((appointment.id.clone(), document_type));

        let hang = self.hanging.lock().unwrap().contains(&document_type);
        if hang {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        let fail = self.failing.lock().unwrap().contains(&document_type);
        if fail {
            return Err(GovernanceError::ExternalServiceError(
                "storage unavailable".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://storage.test/{}/{}_{}.html",
            appointment.id,
            document_type.as_str(),
            n
        ))
    }
}

#[derive(Default)]
pub struct MockStorage {
    uploads: Mutex<Vec<(String, String, String)>>,
}

impl MockStorage {
    /// `(bucket, path, body)` of every upload, oldest first.
    pub fn uploads(&self) -> Vec<(String, String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, GovernanceError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((
            bucket.to_string(),
            path.to_string(),
            String::from_utf8_lossy(&body).into_owned(),
        ));
        Ok(format!("https://storage.test/{}/{}?v={}", bucket, path, uploads.len()))
    }
}

#[derive(Default)]
pub struct MockIdentity {
    accounts: Mutex<HashMap<String, UserAccount>>,
    created: AtomicUsize,
    unavailable: Mutex<bool>,
}

impl MockIdentity {
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check(&self) -> Result<(), GovernanceError> {
        if *self.unavailable.lock().unwrap() {
            return Err(GovernanceError::ExternalServiceError(
                "identity service unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityService for MockIdentity {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, GovernanceError> {
        self.check()?;
        Ok(self.accounts.lock().unwrap().get(&email.to_lowercase()).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        _password: &str,
        _full_name: &str,
    ) -> Result<UserAccount, GovernanceError> {
        self.check()?;
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        let account = UserAccount {
            id: format!("user-{}", n + 1),
            email: email.to_string(),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_lowercase(), account.clone());
        Ok(account)
    }
}

#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<bool>,
}

impl MockNotifier {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<String, GovernanceError> {
        if *self.failing.lock().unwrap() {
            return Err(GovernanceError::ExternalServiceError("mail relay rejected".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

/// Wired application state over an in-memory database and mock collaborators.
pub struct Harness {
    pub database: Database,
    pub generator: Arc<MockGenerator>,
    pub storage: Arc<MockStorage>,
    pub identity: Arc<MockIdentity>,
    pub notifier: Arc<MockNotifier>,
    pub state: AppState,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_quorum(QuorumRuleKind::Manual).await
    }

    pub async fn with_quorum(quorum_rule: QuorumRuleKind) -> Self {
        let database = setup_test_db().await;
        let generator = Arc::new(MockGenerator::default());
        let storage = Arc::new(MockStorage::default());
        let identity = Arc::new(MockIdentity::default());
        let notifier = Arc::new(MockNotifier::default());

        let services = Services {
            storage: storage.clone(),
            identity: identity.clone(),
            notifier: notifier.clone(),
        };
        let state = AppState::new(
            database.clone(),
            services,
            generator.clone(),
            StateOptions {
                jwt_secret: JWT_SECRET.to_string(),
                portal_url: "https://portal.test".to_string(),
                call_timeout: CALL_TIMEOUT,
                quorum_rule,
            },
            None,
        );

        Self {
            database,
            generator,
            storage,
            identity,
            notifier,
            state,
        }
    }

    pub async fn appointment(&self, id: &str) -> Appointment {
        Queries::get_appointment(self.database.pool(), id)
            .await
            .unwrap()
            .expect("appointment exists")
    }

    /// Proposes an appointment and adopts its resolution. Returns
    /// `(appointment_id, resolution_id)`.
    pub async fn approved_appointment(&self, input: NewAppointment) -> (String, String) {
        let proposal = self
            .state
            .appointments
            .propose_appointment(&secretary(), input)
            .await
            .unwrap();
        self.state
            .resolutions
            .manual_adopt(&secretary(), &proposal.resolution.id)
            .await
            .unwrap();
        (proposal.appointment.id, proposal.resolution.id)
    }
}

pub fn secretary() -> Actor {
    let mut actor = Actor::new("secretary-1", [Role::CorporateSecretary]);
    actor.email = Some("secretary@example.com".to_string());
    actor
}

pub fn executive() -> Actor {
    Actor::new("exec-9", [Role::Executive])
}

/// Registers an active board member and returns the matching actor.
pub async fn board_member(database: &Database, user_id: &str) -> Actor {
    Queries::insert_board_member(
        database.pool(),
        &BoardMember {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            full_name: format!("Director {}", user_id),
            email: format!("{}@example.com", user_id),
            active: true,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    Actor::new(user_id, [Role::BoardMember])
}

pub fn token_for(actor: &Actor) -> String {
    issue_token(actor, JWT_SECRET, 3600).unwrap()
}

pub fn new_appointment(name: &str, email: &str, title: &str) -> NewAppointment {
    NewAppointment {
        proposed_officer_name: name.to_string(),
        proposed_officer_email: Some(email.to_string()),
        proposed_title: title.to_string(),
        appointment_type: None,
        board_meeting_date: NaiveDate::from_ymd_opt(2026, 1, 15),
        effective_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        term_length_months: Some(24),
        authority_granted: None,
        compensation_structure: None,
        equity_included: false,
        equity_details: None,
        formation_mode: None,
        notes: None,
    }
}
