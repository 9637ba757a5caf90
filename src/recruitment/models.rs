//! Recruitment domain records shared by the admin and applicant views

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record held in a keyed collection
pub trait Entity: Clone {
    /// Human-readable entity kind, used in errors and logs
    const KIND: &'static str;

    /// The collection key
    fn key(&self) -> &str;
}

// ============================================================================
// Roles
// ============================================================================

/// The two user-facing roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Applicant,
}

impl Role {
    /// The other party of a two-party conversation
    pub fn counterpart(self) -> Self {
        match self {
            Role::Admin => Role::Applicant,
            Role::Applicant => Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Applicant => write!(f, "applicant"),
        }
    }
}

// ============================================================================
// Job
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Draft,
    Urgent,
}

impl JobStatus {
    /// Whether the job is currently open for applications
    pub fn is_open(self) -> bool {
        matches!(self, JobStatus::Active | JobStatus::Urgent)
    }
}

/// A job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    /// Number of applications received
    #[serde(default)]
    pub applicants: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    pub posted_at: DateTime<Utc>,
}

impl Entity for Job {
    const KIND: &'static str = "Job";

    fn key(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Application
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Submitted,
    Viewed,
    Interview,
    Accepted,
    Rejected,
    Withdrawn,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Viewed => "viewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        };
        write!(f, "{}", s)
    }
}

/// A candidate's application to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub candidate_id: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub applied_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Copied from the latest interview attached to this application
    #[serde(default)]
    pub interview_date: Option<NaiveDate>,
    #[serde(default)]
    pub interview_type: Option<InterviewType>,
}

impl Entity for Application {
    const KIND: &'static str = "Application";

    fn key(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Candidate
// ============================================================================

/// An applicant profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Percentage in 0..=100
    #[serde(default)]
    pub profile_completion: u8,
    #[serde(default)]
    pub skill_score: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Candidate {
    const KIND: &'static str = "Candidate";

    fn key(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Interview
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Video,
    Phone,
    Onsite,
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewType::Video => write!(f, "video"),
            InterviewType::Phone => write!(f, "phone"),
            InterviewType::Onsite => write!(f, "onsite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
            InterviewStatus::Rescheduled => "rescheduled",
        };
        write!(f, "{}", s)
    }
}

/// A scheduled interview for an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: String,
    pub application_id: String,
    pub candidate_id: String,
    pub date: NaiveDate,
    /// Free-form local time, e.g. "14:30"
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    #[serde(default)]
    pub status: InterviewStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Entity for Interview {
    const KIND: &'static str = "Interview";

    fn key(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Message
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

/// A chat message within an application thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub application_id: String,
    pub sender_id: String,
    pub sender_role: Role,
    pub recipient_id: String,
    pub content: String,
    #[serde(default)]
    pub status: MessageStatus,
    pub sent_at: DateTime<Utc>,
}

impl Entity for Message {
    const KIND: &'static str = "Message";

    fn key(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Resume,
    CoverLetter,
    Identity,
    Certificate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Verified,
    #[default]
    Pending,
    Rejected,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Verified => write!(f, "verified"),
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A file uploaded by a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub candidate_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    #[serde(default)]
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_note: Option<String>,
}

impl Entity for Document {
    const KIND: &'static str = "Document";

    fn key(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Notification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Application,
    Interview,
    Message,
    Document,
    Job,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// A notification addressed to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    /// Role of the addressee, when known
    #[serde(default)]
    pub user_role: Option<Role>,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[serde(default)]
    pub read: bool,
    /// Id of the entity the notification is about
    #[serde(default)]
    pub related_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification with a fresh id
    pub fn new(
        user_id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            user_role: None,
            title: title.into(),
            message: message.into(),
            notification_type,
            priority: NotificationPriority::Medium,
            read: false,
            related_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.user_role = Some(role);
        self
    }

    pub fn with_related(mut self, related_id: impl Into<String>) -> Self {
        self.related_id = Some(related_id.into());
        self
    }
}

impl Entity for Notification {
    const KIND: &'static str = "Notification";

    fn key(&self) -> &str {
        &self.id
    }
}
