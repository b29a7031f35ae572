use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::collections::HashMap;

use crate::database::models::*;
use crate::error::GovernanceError;

pub struct Queries;

const RESOLUTION_COLUMNS: &str = "id, sequence_number, resolution_number, title, description, \
     resolution_type, status, meeting_date, effective_date, metadata, decided_by, decided_at, \
     executed_at, created_at, updated_at";

const APPOINTMENT_COLUMNS: &str = "id, proposed_officer_name, proposed_officer_email, \
     proposed_title, appointment_type, board_meeting_date, effective_date, term_length_months, \
     authority_granted, compensation_structure, equity_included, equity_details, formation_mode, \
     notes, status, board_resolution_id, appointment_letter_url, board_resolution_url, \
     certificate_url, employment_agreement_url, confidentiality_ip_url, stock_subscription_url, \
     deferred_compensation_url, pre_incorporation_consent_url, approved_at, created_by, \
     created_at, updated_at";

fn corrupt(what: &str, value: &str) -> GovernanceError {
    GovernanceError::DatabaseError(format!("Unrecognised {} in store: {}", what, value))
}

fn resolution_from_row(row: &SqliteRow) -> Result<Resolution, GovernanceError> {
    let status: String = row.try_get("status")?;
    let resolution_type: String = row.try_get("resolution_type")?;
    let metadata: String = row.try_get("metadata")?;

    Ok(Resolution {
        id: row.try_get("id")?,
        sequence_number: row.try_get("sequence_number")?,
        resolution_number: row.try_get("resolution_number")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        resolution_type: ResolutionType::from_str(&resolution_type)
            .ok_or_else(|| corrupt("resolution type", &resolution_type))?,
        status: ResolutionStatus::from_str(&status)
            .ok_or_else(|| corrupt("resolution status", &status))?,
        meeting_date: row.try_get("meeting_date")?,
        effective_date: row.try_get("effective_date")?,
        metadata: serde_json::from_str(&metadata).unwrap_or_else(|_| serde_json::json!({})),
        decided_by: row.try_get("decided_by")?,
        decided_at: row.try_get("decided_at")?,
        executed_at: row.try_get("executed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn appointment_from_row(row: &SqliteRow) -> Result<Appointment, GovernanceError> {
    let status: String = row.try_get("status")?;

    let mut document_urls = DocumentUrls::default();
    for document_type in DocumentType::ALL {
        let url: Option<String> = row.try_get(document_type.url_column())?;
        document_urls.set(document_type, url);
    }

    Ok(Appointment {
        id: row.try_get("id")?,
        proposed_officer_name: row.try_get("proposed_officer_name")?,
        proposed_officer_email: row.try_get("proposed_officer_email")?,
        proposed_title: row.try_get("proposed_title")?,
        appointment_type: row.try_get("appointment_type")?,
        board_meeting_date: row.try_get("board_meeting_date")?,
        effective_date: row.try_get("effective_date")?,
        term_length_months: row.try_get("term_length_months")?,
        authority_granted: row.try_get("authority_granted")?,
        compensation_structure: row.try_get("compensation_structure")?,
        equity_included: row.try_get("equity_included")?,
        equity_details: row.try_get("equity_details")?,
        formation_mode: row.try_get("formation_mode")?,
        notes: row.try_get("notes")?,
        status: AppointmentStatus::from_str(&status)
            .ok_or_else(|| corrupt("appointment status", &status))?,
        board_resolution_id: row.try_get("board_resolution_id")?,
        document_urls,
        approved_at: row.try_get("approved_at")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn vote_from_row(row: &SqliteRow) -> Result<Vote, GovernanceError> {
    let vote: String = row.try_get("vote")?;
    Ok(Vote {
        id: row.try_get("id")?,
        resolution_id: row.try_get("resolution_id")?,
        board_member_id: row.try_get("board_member_id")?,
        vote: VoteChoice::from_str(&vote).ok_or_else(|| corrupt("vote", &vote))?,
        comment: row.try_get("comment")?,
        cast_at: row.try_get("cast_at")?,
    })
}

fn board_member_from_row(row: &SqliteRow) -> Result<BoardMember, GovernanceError> {
    Ok(BoardMember {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn document_record_from_row(row: &SqliteRow) -> Result<DocumentRecord, GovernanceError> {
    let document_type: String = row.try_get("document_type")?;
    let signature_status: String = row.try_get("signature_status")?;
    Ok(DocumentRecord {
        id: row.try_get("id")?,
        appointment_id: row.try_get("appointment_id")?,
        document_type: DocumentType::from_str(&document_type)
            .ok_or_else(|| corrupt("document type", &document_type))?,
        file_url: row.try_get("file_url")?,
        signed_url: row.try_get("signed_url")?,
        signature_status: SignatureStatus::from_str(&signature_status)
            .ok_or_else(|| corrupt("signature status", &signature_status))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn officer_from_row(row: &SqliteRow) -> Result<CorporateOfficer, GovernanceError> {
    let status: String = row.try_get("status")?;
    Ok(CorporateOfficer {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        title: row.try_get("title")?,
        appointed_by: row.try_get("appointed_by")?,
        appointment_id: row.try_get("appointment_id")?,
        effective_date: row.try_get("effective_date")?,
        term_end: row.try_get("term_end")?,
        status: OfficerStatus::from_str(&status).ok_or_else(|| corrupt("officer status", &status))?,
        created_at: row.try_get("created_at")?,
    })
}

fn banking_authority_from_row(row: &SqliteRow) -> Result<BankingAuthority, GovernanceError> {
    let status: String = row.try_get("status")?;
    Ok(BankingAuthority {
        id: row.try_get("id")?,
        appointment_id: row.try_get("appointment_id")?,
        status: BankingStatus::from_str(&status).ok_or_else(|| corrupt("banking status", &status))?,
        packet_url: row.try_get("packet_url")?,
        packet_version: row.try_get("packet_version")?,
        can_sign_wires: row.try_get("can_sign_wires")?,
        can_sign_checks: row.try_get("can_sign_checks")?,
        treasury_portal_access: row.try_get("treasury_portal_access")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Queries {
    // Resolutions

    pub async fn next_resolution_sequence(pool: &SqlitePool) -> Result<i64, GovernanceError> {
        let row =
            sqlx::query("SELECT COALESCE(MAX(sequence_number), 0) + 1 AS next FROM resolutions")
                .fetch_one(pool)
                .await?;
        Ok(row.try_get("next")?)
    }

    pub async fn insert_resolution(
        pool: &SqlitePool,
        resolution: &Resolution,
    ) -> Result<(), GovernanceError> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO resolutions (id, sequence_number, resolution_number, title, description,
                resolution_type, status, meeting_date, effective_date, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&resolution.id)
        .bind(resolution.sequence_number)
        .bind(&resolution.resolution_number)
        .bind(&resolution.title)
        .bind(&resolution.description)
        .bind(resolution.resolution_type.as_str())
        .bind(resolution.status.as_str())
        .bind(resolution.meeting_date)
        .bind(resolution.effective_date)
        .bind(resolution.metadata.to_string())
        .bind(resolution.created_at)
        .bind(resolution.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO resolution_status_history (resolution_id, from_status, to_status, actor, changed_at)
             VALUES (?, NULL, ?, NULL, ?)",
        )
        .bind(&resolution.id)
        .bind(resolution.status.as_str())
        .bind(resolution.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_resolution(
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Option<Resolution>, GovernanceError> {
        let sql = format!("SELECT {} FROM resolutions WHERE id = ?", RESOLUTION_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;

        row.as_ref().map(resolution_from_row).transpose()
    }

    /// Moves a resolution from `from` to `to` only if it is still in `from`.
    /// Returns false when another writer got there first.
    pub async fn transition_resolution(
        pool: &SqlitePool,
        id: &str,
        from: ResolutionStatus,
        to: ResolutionStatus,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<bool, GovernanceError> {
        let mut tx = pool.begin().await?;

        let stamp = match to {
            ResolutionStatus::Adopted | ResolutionStatus::Rejected => {
                ", decided_by = ?, decided_at = ?"
            }
            ResolutionStatus::Executed => ", executed_at = ?",
            _ => "",
        };
        let sql = format!(
            "UPDATE resolutions SET status = ?, updated_at = ?{} WHERE id = ? AND status = ?",
            stamp
        );

        let mut query = sqlx::query(&sql).bind(to.as_str()).bind(at);
        query = match to {
            ResolutionStatus::Adopted | ResolutionStatus::Rejected => query.bind(actor).bind(at),
            ResolutionStatus::Executed => query.bind(at),
            _ => query,
        };
        let result = query.bind(id).bind(from.as_str()).execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO resolution_status_history (resolution_id, from_status, to_status, actor, changed_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(actor)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Claims an ADOPTED resolution for execution. Returns false when it is
    /// not ADOPTED or another execution holds the claim.
    pub async fn claim_execution(
        pool: &SqlitePool,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, GovernanceError> {
        let result = sqlx::query(
            "UPDATE resolutions SET execution_claimed_at = ?
             WHERE id = ? AND status = 'ADOPTED' AND execution_claimed_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn release_execution(pool: &SqlitePool, id: &str) -> Result<(), GovernanceError> {
        sqlx::query("UPDATE resolutions SET execution_claimed_at = NULL WHERE id = ?")
            .bind(id)
            .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn resolution_history(
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Vec<StatusChange>, GovernanceError> {
        let rows = sqlx::query(
            "SELECT resolution_id, from_status, to_status, actor, changed_at
             FROM resolution_status_history WHERE resolution_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<StatusChange, GovernanceError> {
                let from: Option<String> = row.try_get("from_status")?;
                let to: String = row.try_get("to_status")?;
                Ok(StatusChange {
                    resolution_id: row.try_get("resolution_id")?,
                    from_status: match from {
                        Some(s) => Some(
                            ResolutionStatus::from_str(&s)
                                .ok_or_else(|| corrupt("resolution status", &s))?,
                        ),
                        None => None,
                    },
                    to_status: ResolutionStatus::from_str(&to)
                        .ok_or_else(|| corrupt("resolution status", &to))?,
                    actor: row.try_get("actor")?,
                    changed_at: row.try_get("changed_at")?,
                })
            })
            .collect()
    }

    // Board members and votes

    pub async fn insert_board_member(
        pool: &SqlitePool,
        member: &BoardMember,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            "INSERT INTO board_members (id, user_id, full_name, email, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&member.id)
        .bind(&member.user_id)
        .bind(&member.full_name)
        .bind(&member.email)
        .bind(member.active)
        .bind(member.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_board_member_by_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Option<BoardMember>, GovernanceError> {
        let row = sqlx::query(
            "SELECT id, user_id, full_name, email, active, created_at FROM board_members WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(board_member_from_row).transpose()
    }

    pub async fn count_active_board_members(pool: &SqlitePool) -> Result<i64, GovernanceError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM board_members WHERE active = 1")
            .fetch_one(pool)
            .await?;
        Ok(row.try_get("total")?)
    }

    /// One row per (resolution, member); a repeat cast replaces the previous vote.
    pub async fn upsert_vote(
        pool: &SqlitePool,
        resolution_id: &str,
        board_member_id: &str,
        vote: VoteChoice,
        comment: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Vote, GovernanceError> {
        let row = sqlx::query(
            r#"
            INSERT INTO resolution_votes (id, resolution_id, board_member_id, vote, comment, cast_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (resolution_id, board_member_id) DO UPDATE SET
                vote = excluded.vote,
                comment = excluded.comment,
                cast_at = excluded.cast_at
            RETURNING id, resolution_id, board_member_id, vote, comment, cast_at
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(resolution_id)
        .bind(board_member_id)
        .bind(vote.as_str())
        .bind(comment)
        .bind(at)
        .fetch_one(pool)
        .await?;

        vote_from_row(&row)
    }

    pub async fn list_votes(
        pool: &SqlitePool,
        resolution_id: &str,
    ) -> Result<Vec<Vote>, GovernanceError> {
        let rows = sqlx::query(
            "SELECT id, resolution_id, board_member_id, vote, comment, cast_at
             FROM resolution_votes WHERE resolution_id = ? ORDER BY cast_at",
        )
        .bind(resolution_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(vote_from_row).collect()
    }

    // Appointments

    pub async fn insert_appointment(
        pool: &SqlitePool,
        appointment: &Appointment,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            r#"
            INSERT INTO appointments (id, proposed_officer_name, proposed_officer_email, proposed_title,
                appointment_type, board_meeting_date, effective_date, term_length_months,
                authority_granted, compensation_structure, equity_included, equity_details,
                formation_mode, notes, status, board_resolution_id, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.proposed_officer_name)
        .bind(&appointment.proposed_officer_email)
        .bind(&appointment.proposed_title)
        .bind(&appointment.appointment_type)
        .bind(appointment.board_meeting_date)
        .bind(appointment.effective_date)
        .bind(appointment.term_length_months)
        .bind(&appointment.authority_granted)
        .bind(&appointment.compensation_structure)
        .bind(appointment.equity_included)
        .bind(&appointment.equity_details)
        .bind(&appointment.formation_mode)
        .bind(&appointment.notes)
        .bind(appointment.status.as_str())
        .bind(&appointment.board_resolution_id)
        .bind(&appointment.created_by)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(pool)
        .await?;

        for (document_type, url) in appointment.document_urls.iter() {
            Self::set_document_url(pool, &appointment.id, document_type, Some(url)).await?;
        }
        Ok(())
    }

    pub async fn get_appointment(
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Option<Appointment>, GovernanceError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE id = ?",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(appointment_from_row).transpose()
    }

    pub async fn get_appointment_by_resolution(
        pool: &SqlitePool,
        resolution_id: &str,
    ) -> Result<Option<Appointment>, GovernanceError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE board_resolution_id = ? ORDER BY created_at LIMIT 1",
            APPOINTMENT_COLUMNS
        ))
        .bind(resolution_id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(appointment_from_row).transpose()
    }

    pub async fn list_appointment_ids(pool: &SqlitePool) -> Result<Vec<String>, GovernanceError> {
        let rows = sqlx::query("SELECT id FROM appointments ORDER BY created_at, id")
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("id").map_err(GovernanceError::from))
            .collect()
    }

    /// Conditional status update; false when the appointment was not in `from`.
    pub async fn transition_appointment(
        pool: &SqlitePool,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, GovernanceError> {
        let approved_at = if to == AppointmentStatus::Approved { Some(at) } else { None };

        let result = sqlx::query(
            "UPDATE appointments SET status = ?, updated_at = ?, approved_at = COALESCE(?, approved_at)
             WHERE id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(at)
        .bind(approved_at)
        .bind(id)
        .bind(from.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn link_resolution(
        pool: &SqlitePool,
        appointment_id: &str,
        resolution_id: &str,
    ) -> Result<(), GovernanceError> {
        sqlx::query("UPDATE appointments SET board_resolution_id = ?, updated_at = ? WHERE id = ?")
            .bind(resolution_id)
            .bind(Utc::now())
            .bind(appointment_id)
            .execute(pool)
        .await?;
        Ok(())
    }

    /// Overwrites the flag columns consulted by the document rule table.
    pub async fn update_appointment_terms(
        pool: &SqlitePool,
        appointment_id: &str,
        equity_included: bool,
        compensation_structure: Option<&str>,
        formation_mode: Option<&str>,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            "UPDATE appointments SET equity_included = ?, compensation_structure = ?, formation_mode = ?,
             updated_at = ? WHERE id = ?",
        )
        .bind(equity_included)
        .bind(compensation_structure)
        .bind(formation_mode)
        .bind(Utc::now())
        .bind(appointment_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_document_url(
        pool: &SqlitePool,
        appointment_id: &str,
        document_type: DocumentType,
        url: Option<&str>,
    ) -> Result<(), GovernanceError> {
        // Column names come from a closed enum, never from input.
        let sql = format!(
            "UPDATE appointments SET {} = ?, updated_at = ? WHERE id = ?",
            document_type.url_column()
        );
        sqlx::query(&sql)
            .bind(url)
            .bind(Utc::now())
            .bind(appointment_id)
            .execute(pool)
        .await?;
        Ok(())
    }

    // Document records

    /// Points the record at `file_url`. A new file invalidates any signature
    /// collected for the previous one.
    pub async fn upsert_document_record(
        pool: &SqlitePool,
        appointment_id: &str,
        document_type: DocumentType,
        file_url: &str,
    ) -> Result<DocumentRecord, GovernanceError> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO document_records (id, appointment_id, document_type, file_url, signature_status,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, 'pending', ?, ?)
            ON CONFLICT (appointment_id, document_type) DO UPDATE SET
                file_url = excluded.file_url,
                signed_url = CASE WHEN document_records.file_url = excluded.file_url
                    THEN document_records.signed_url ELSE NULL END,
                signature_status = CASE WHEN document_records.file_url = excluded.file_url
                    THEN document_records.signature_status ELSE 'pending' END,
                updated_at = excluded.updated_at
            RETURNING id, appointment_id, document_type, file_url, signed_url, signature_status,
                created_at, updated_at
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(appointment_id)
        .bind(document_type.as_str())
        .bind(file_url)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        document_record_from_row(&row)
    }

    pub async fn mark_document_signed(
        pool: &SqlitePool,
        appointment_id: &str,
        document_type: DocumentType,
        file_url: &str,
        signed_url: &str,
    ) -> Result<DocumentRecord, GovernanceError> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO document_records (id, appointment_id, document_type, file_url, signed_url,
                signature_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'signed', ?, ?)
            ON CONFLICT (appointment_id, document_type) DO UPDATE SET
                file_url = excluded.file_url,
                signed_url = excluded.signed_url,
                signature_status = 'signed',
                updated_at = excluded.updated_at
            RETURNING id, appointment_id, document_type, file_url, signed_url, signature_status,
                created_at, updated_at
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(appointment_id)
        .bind(document_type.as_str())
        .bind(file_url)
        .bind(signed_url)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        document_record_from_row(&row)
    }

    pub async fn list_document_records(
        pool: &SqlitePool,
        appointment_id: &str,
    ) -> Result<Vec<DocumentRecord>, GovernanceError> {
        let rows = sqlx::query(
            "SELECT id, appointment_id, document_type, file_url, signed_url, signature_status,
                    created_at, updated_at
             FROM document_records WHERE appointment_id = ? ORDER BY document_type",
        )
        .bind(appointment_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(document_record_from_row).collect()
    }

    // Banking authority

    pub async fn get_banking_authority(
        pool: &SqlitePool,
        appointment_id: &str,
    ) -> Result<Option<BankingAuthority>, GovernanceError> {
        let row = sqlx::query(
            "SELECT id, appointment_id, status, packet_url, packet_version, can_sign_wires,
                    can_sign_checks, treasury_portal_access, updated_at
             FROM banking_authorities WHERE appointment_id = ?",
        )
        .bind(appointment_id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(banking_authority_from_row).transpose()
    }

    /// Records a freshly uploaded packet, bumping the packet version.
    pub async fn record_banking_packet(
        pool: &SqlitePool,
        appointment_id: &str,
        packet_url: &str,
        can_sign_wires: bool,
        can_sign_checks: bool,
        treasury_portal_access: bool,
    ) -> Result<BankingAuthority, GovernanceError> {
        let row = sqlx::query(
            r#"
            INSERT INTO banking_authorities (id, appointment_id, status, packet_url, packet_version,
                can_sign_wires, can_sign_checks, treasury_portal_access, updated_at)
            VALUES (?, ?, 'UPLOADED', ?, 1, ?, ?, ?, ?)
            ON CONFLICT (appointment_id) DO UPDATE SET
                status = 'UPLOADED',
                packet_url = excluded.packet_url,
                packet_version = banking_authorities.packet_version + 1,
                can_sign_wires = excluded.can_sign_wires,
                can_sign_checks = excluded.can_sign_checks,
                treasury_portal_access = excluded.treasury_portal_access,
                updated_at = excluded.updated_at
            RETURNING id, appointment_id, status, packet_url, packet_version, can_sign_wires,
                can_sign_checks, treasury_portal_access, updated_at
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(appointment_id)
        .bind(packet_url)
        .bind(can_sign_wires)
        .bind(can_sign_checks)
        .bind(treasury_portal_access)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        banking_authority_from_row(&row)
    }

    // Company settings and templates

    pub async fn company_settings(
        pool: &SqlitePool,
    ) -> Result<HashMap<String, String>, GovernanceError> {
        let rows = sqlx::query("SELECT setting_key, setting_value FROM company_settings")
            .fetch_all(pool)
            .await?;

        let mut settings = HashMap::new();
        for row in rows {
            settings.insert(row.try_get("setting_key")?, row.try_get("setting_value")?);
        }
        Ok(settings)
    }

    pub async fn set_company_setting(
        pool: &SqlitePool,
        key: &str,
        value: &str,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            "INSERT INTO company_settings (setting_key, setting_value) VALUES (?, ?)
             ON CONFLICT (setting_key) DO UPDATE SET setting_value = excluded.setting_value",
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_active_template(
        pool: &SqlitePool,
        template_key: &str,
    ) -> Result<Option<DocumentTemplate>, GovernanceError> {
        let row = sqlx::query(
            "SELECT template_key, name, html_content, is_active FROM document_templates
             WHERE template_key = ? AND is_active = 1",
        )
        .bind(template_key)
        .fetch_optional(pool)
        .await?;

        row.map(|row| -> Result<DocumentTemplate, GovernanceError> {
            Ok(DocumentTemplate {
                template_key: row.try_get("template_key")?,
                name: row.try_get("name")?,
                html_content: row.try_get("html_content")?,
                is_active: row.try_get("is_active")?,
            })
        })
        .transpose()
    }

    pub async fn upsert_template(
        pool: &SqlitePool,
        template: &DocumentTemplate,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            r#"
            INSERT INTO document_templates (template_key, name, html_content, is_active, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (template_key) DO UPDATE SET
                name = excluded.name,
                html_content = excluded.html_content,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&template.template_key)
        .bind(&template.name)
        .bind(&template.html_content)
        .bind(template.is_active)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    // Legacy onboarding records

    pub async fn insert_legacy_appointment(
        pool: &SqlitePool,
        legacy: &LegacyAppointment,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            "INSERT INTO legacy_appointments (id, officer_name, officer_email, onboarding_status, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&legacy.id)
        .bind(&legacy.officer_name)
        .bind(&legacy.officer_email)
        .bind(legacy.onboarding_status.as_str())
        .bind(legacy.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_legacy_appointment(
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Option<LegacyAppointment>, GovernanceError> {
        let row = sqlx::query(
            "SELECT id, officer_name, officer_email, onboarding_status, updated_at
             FROM legacy_appointments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(|row| -> Result<LegacyAppointment, GovernanceError> {
            let status: String = row.try_get("onboarding_status")?;
            Ok(LegacyAppointment {
                id: row.try_get("id")?,
                officer_name: row.try_get("officer_name")?,
                officer_email: row.try_get("officer_email")?,
                onboarding_status: OnboardingStatus::from_str(&status)
                    .ok_or_else(|| corrupt("onboarding status", &status))?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    pub async fn set_onboarding_status(
        pool: &SqlitePool,
        id: &str,
        status: OnboardingStatus,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            "UPDATE legacy_appointments SET onboarding_status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn insert_legacy_document(
        pool: &SqlitePool,
        document: &LegacyDocument,
    ) -> Result<(), GovernanceError> {
        sqlx::query(
            "INSERT INTO legacy_documents (id, legacy_appointment_id, title, file_url, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&document.id)
        .bind(&document.legacy_appointment_id)
        .bind(&document.title)
        .bind(&document.file_url)
        .bind(document.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_legacy_documents(
        pool: &SqlitePool,
        legacy_appointment_id: &str,
    ) -> Result<Vec<LegacyDocument>, GovernanceError> {
        let rows = sqlx::query(
            "SELECT id, legacy_appointment_id, title, file_url, created_at
             FROM legacy_documents WHERE legacy_appointment_id = ? ORDER BY created_at",
        )
        .bind(legacy_appointment_id)
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<LegacyDocument, GovernanceError> {
                Ok(LegacyDocument {
                    id: row.try_get("id")?,
                    legacy_appointment_id: row.try_get("legacy_appointment_id")?,
                    title: row.try_get("title")?,
                    file_url: row.try_get("file_url")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    // Corporate officers

    /// Inserts an ACTIVE officer unless one with the same email already
    /// exists. Returns whether a row was written.
    pub async fn insert_officer_if_absent(
        pool: &SqlitePool,
        officer: &CorporateOfficer,
    ) -> Result<bool, GovernanceError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO corporate_officers (id, full_name, email, title, appointed_by,
                appointment_id, effective_date, term_end, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&officer.id)
        .bind(&officer.full_name)
        .bind(&officer.email)
        .bind(&officer.title)
        .bind(&officer.appointed_by)
        .bind(&officer.appointment_id)
        .bind(officer.effective_date)
        .bind(officer.term_end)
        .bind(officer.status.as_str())
        .bind(officer.created_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn list_active_officers(
        pool: &SqlitePool,
    ) -> Result<Vec<CorporateOfficer>, GovernanceError> {
        let rows = sqlx::query(
            "SELECT id, full_name, email, title, appointed_by, appointment_id, effective_date,
                    term_end, status, created_at
             FROM corporate_officers WHERE status = 'ACTIVE' ORDER BY effective_date, full_name",
        )
        .fetch_all(pool)
        .await?;

        rows.iter().map(officer_from_row).collect()
    }
}
