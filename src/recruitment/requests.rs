//! Request DTOs for creating and partially updating recruitment records

use super::models::*;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn id_or_new(id: Option<String>) -> String {
    id.filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// ============================================================================
// Jobs
// ============================================================================

/// Request to create a job posting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub status: Option<JobStatus>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub deadline: Option<NaiveDate>,
}

impl CreateJobRequest {
    pub fn into_job(self) -> Job {
        Job {
            id: id_or_new(self.id),
            title: self.title,
            company: self.company,
            location: self.location,
            salary: self.salary,
            status: self.status.unwrap_or_default(),
            applicants: 0,
            description: self.description,
            requirements: self.requirements.unwrap_or_default(),
            deadline: self.deadline,
            posted_at: Utc::now(),
        }
    }
}

/// Partial update of a job posting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateJobRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub applicants: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<Vec<String>>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl UpdateJobRequest {
    pub fn apply_to(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(company) = self.company {
            job.company = company;
        }
        if let Some(location) = self.location {
            job.location = location;
        }
        if let Some(salary) = self.salary {
            job.salary = Some(salary);
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(applicants) = self.applicants {
            job.applicants = applicants;
        }
        if let Some(description) = self.description {
            job.description = Some(description);
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements;
        }
        if let Some(deadline) = self.deadline {
            job.deadline = Some(deadline);
        }
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// Request to register a candidate profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCandidateRequest {
    pub id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub profile_completion: Option<u8>,
    pub skill_score: Option<u32>,
}

impl CreateCandidateRequest {
    pub fn into_candidate(self) -> Candidate {
        Candidate {
            id: id_or_new(self.id),
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            location: self.location,
            profile_completion: self.profile_completion.unwrap_or(0),
            skill_score: self.skill_score,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of a candidate profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCandidateRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_completion: Option<u8>,
    #[serde(default)]
    pub skill_score: Option<u32>,
}

impl UpdateCandidateRequest {
    pub fn apply_to(self, candidate: &mut Candidate) {
        if let Some(full_name) = self.full_name {
            candidate.full_name = full_name;
        }
        if let Some(email) = self.email {
            candidate.email = email;
        }
        if let Some(phone) = self.phone {
            candidate.phone = Some(phone);
        }
        if let Some(location) = self.location {
            candidate.location = Some(location);
        }
        if let Some(completion) = self.profile_completion {
            candidate.profile_completion = completion;
        }
        if let Some(score) = self.skill_score {
            candidate.skill_score = Some(score);
        }
    }
}

// ============================================================================
// Applications
// ============================================================================

/// Request to submit an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    pub id: Option<String>,
    pub job_id: String,
    pub candidate_id: String,
    pub cover_letter: Option<String>,
}

impl CreateApplicationRequest {
    pub fn into_application(self) -> Application {
        let now = Utc::now();
        Application {
            id: id_or_new(self.id),
            job_id: self.job_id,
            candidate_id: self.candidate_id,
            status: ApplicationStatus::Submitted,
            applied_date: now,
            last_update: now,
            cover_letter: self.cover_letter,
            notes: None,
            interview_date: None,
            interview_type: None,
        }
    }
}

/// Partial update of an application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateApplicationRequest {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub interview_date: Option<NaiveDate>,
    #[serde(default)]
    pub interview_type: Option<InterviewType>,
}

impl UpdateApplicationRequest {
    /// Status-only update
    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply_to(self, application: &mut Application) {
        if let Some(status) = self.status {
            application.status = status;
        }
        if let Some(notes) = self.notes {
            application.notes = Some(notes);
        }
        if let Some(date) = self.interview_date {
            application.interview_date = Some(date);
        }
        if let Some(kind) = self.interview_type {
            application.interview_type = Some(kind);
        }
        application.last_update = Utc::now();
    }
}

// ============================================================================
// Interviews
// ============================================================================

/// Request to schedule an interview.
///
/// The candidate is taken from the referenced application when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInterviewRequest {
    pub id: Option<String>,
    pub application_id: String,
    pub candidate_id: Option<String>,
    pub date: NaiveDate,
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
}

impl CreateInterviewRequest {
    pub fn into_interview(self, candidate_id: String) -> Interview {
        Interview {
            id: id_or_new(self.id),
            application_id: self.application_id,
            candidate_id: self.candidate_id.unwrap_or(candidate_id),
            date: self.date,
            time: self.time,
            interview_type: self.interview_type,
            status: InterviewStatus::Scheduled,
            location: self.location,
            meeting_link: self.meeting_link,
            notes: self.notes,
        }
    }
}

/// Partial update of an interview
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInterviewRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, rename = "type")]
    pub interview_type: Option<InterviewType>,
    #[serde(default)]
    pub status: Option<InterviewStatus>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateInterviewRequest {
    pub fn apply_to(self, interview: &mut Interview) {
        if let Some(date) = self.date {
            interview.date = date;
        }
        if let Some(time) = self.time {
            interview.time = Some(time);
        }
        if let Some(kind) = self.interview_type {
            interview.interview_type = kind;
        }
        if let Some(status) = self.status {
            interview.status = status;
        }
        if let Some(location) = self.location {
            interview.location = Some(location);
        }
        if let Some(link) = self.meeting_link {
            interview.meeting_link = Some(link);
        }
        if let Some(notes) = self.notes {
            interview.notes = Some(notes);
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Request to post a message to an application thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub id: Option<String>,
    pub sender_id: String,
    pub sender_role: Role,
    pub recipient_id: String,
    pub content: String,
}

impl CreateMessageRequest {
    pub fn into_message(self, application_id: String) -> Message {
        Message {
            id: id_or_new(self.id),
            application_id,
            sender_id: self.sender_id,
            sender_role: self.sender_role,
            recipient_id: self.recipient_id,
            content: self.content,
            status: MessageStatus::Sent,
            sent_at: Utc::now(),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Request to upload a candidate document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
}

impl CreateDocumentRequest {
    pub fn into_document(self, candidate_id: String) -> Document {
        Document {
            id: id_or_new(self.id),
            candidate_id,
            name: self.name,
            document_type: self.document_type,
            status: DocumentStatus::Pending,
            uploaded_at: Utc::now(),
            reviewed_at: None,
            review_note: None,
        }
    }
}

/// Partial update of a document (usually an admin review)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub review_note: Option<String>,
}

impl UpdateDocumentRequest {
    pub fn apply_to(self, document: &mut Document) {
        if let Some(name) = self.name {
            document.name = name;
        }
        if let Some(status) = self.status {
            document.status = status;
            document.reviewed_at = Some(Utc::now());
        }
        if let Some(note) = self.review_note {
            document.review_note = Some(note);
        }
    }
}
