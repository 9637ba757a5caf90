//! Test helper factories and state builders
//!
//! Provides convenience functions for creating test records with sensible defaults.
#![allow(dead_code)]

use crate::api::handlers::{ServerState, SwaproState};
use crate::recruitment::*;
use crate::store::SyncStore;
use crate::Config;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// State builders
// ============================================================================

/// Handler state over an empty store with a short sync delay
pub fn test_server_state() -> SwaproState {
    test_server_state_with(SyncStore::new())
}

pub fn test_server_state_with(store: SyncStore) -> SwaproState {
    Arc::new(ServerState {
        store: Arc::new(store.with_sync_delay(Duration::from_millis(1))),
        config: Arc::new(Config::default()),
    })
}

// ============================================================================
// Entity factories
// ============================================================================

/// Fixed interview date used across tests
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
}

pub fn test_job(id: &str) -> Job {
    Job {
        id: id.to_string(),
        title: "Sales Promotion Girl".to_string(),
        company: "SWAPRO".to_string(),
        location: "Jakarta".to_string(),
        salary: Some("Rp 4.500.000".to_string()),
        status: JobStatus::Active,
        applicants: 0,
        description: None,
        requirements: vec!["SMA/SMK".to_string()],
        deadline: None,
        posted_at: Utc::now(),
    }
}

pub fn test_candidate(id: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        full_name: "Siti Rahma".to_string(),
        email: format!("{}@example.com", id.to_lowercase()),
        phone: None,
        location: Some("Jakarta".to_string()),
        profile_completion: 80,
        skill_score: None,
        created_at: Utc::now(),
    }
}

pub fn test_application(id: &str, job_id: &str, candidate_id: &str) -> Application {
    Application {
        id: id.to_string(),
        job_id: job_id.to_string(),
        candidate_id: candidate_id.to_string(),
        status: ApplicationStatus::Submitted,
        applied_date: Utc::now(),
        last_update: Utc::now(),
        cover_letter: None,
        notes: None,
        interview_date: None,
        interview_type: None,
    }
}

pub fn test_interview(id: &str, application_id: &str, candidate_id: &str) -> Interview {
    Interview {
        id: id.to_string(),
        application_id: application_id.to_string(),
        candidate_id: candidate_id.to_string(),
        date: test_date(),
        time: Some("10:00".to_string()),
        interview_type: InterviewType::Video,
        status: InterviewStatus::Scheduled,
        location: None,
        meeting_link: Some("https://meet.example.com/abc".to_string()),
        notes: None,
    }
}

pub fn test_message(
    id: &str,
    application_id: &str,
    sender_id: &str,
    sender_role: Role,
    recipient_id: &str,
) -> Message {
    Message {
        id: id.to_string(),
        application_id: application_id.to_string(),
        sender_id: sender_id.to_string(),
        sender_role,
        recipient_id: recipient_id.to_string(),
        content: "Halo, kapan jadwal interview saya?".to_string(),
        status: MessageStatus::Sent,
        sent_at: Utc::now(),
    }
}

pub fn test_document(id: &str, candidate_id: &str) -> Document {
    Document {
        id: id.to_string(),
        candidate_id: candidate_id.to_string(),
        name: "resume.pdf".to_string(),
        document_type: DocumentType::Resume,
        status: DocumentStatus::Pending,
        uploaded_at: Utc::now(),
        reviewed_at: None,
        review_note: None,
    }
}
