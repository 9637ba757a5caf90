//! Sync event types and topic names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named event channel.
///
/// Plural `*_updated` topics carry a full collection snapshot; singular
/// topics carry the single entity that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    JobsUpdated,
    JobAdded,
    JobUpdated,
    JobDeleted,
    ApplicationsUpdated,
    ApplicationAdded,
    ApplicationUpdated,
    CandidatesUpdated,
    CandidateAdded,
    CandidateUpdated,
    InterviewsUpdated,
    InterviewAdded,
    InterviewUpdated,
    MessagesUpdated,
    MessageAdded,
    DocumentsUpdated,
    DocumentAdded,
    DocumentUpdated,
    NotificationsUpdated,
    NotificationAdded,
    SyncStarted,
    SyncCompleted,
    SyncFailed,
}

impl Topic {
    pub const ALL: [Topic; 23] = [
        Topic::JobsUpdated,
        Topic::JobAdded,
        Topic::JobUpdated,
        Topic::JobDeleted,
        Topic::ApplicationsUpdated,
        Topic::ApplicationAdded,
        Topic::ApplicationUpdated,
        Topic::CandidatesUpdated,
        Topic::CandidateAdded,
        Topic::CandidateUpdated,
        Topic::InterviewsUpdated,
        Topic::InterviewAdded,
        Topic::InterviewUpdated,
        Topic::MessagesUpdated,
        Topic::MessageAdded,
        Topic::DocumentsUpdated,
        Topic::DocumentAdded,
        Topic::DocumentUpdated,
        Topic::NotificationsUpdated,
        Topic::NotificationAdded,
        Topic::SyncStarted,
        Topic::SyncCompleted,
        Topic::SyncFailed,
    ];

    /// Wire name of the topic
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::JobsUpdated => "jobs_updated",
            Topic::JobAdded => "job_added",
            Topic::JobUpdated => "job_updated",
            Topic::JobDeleted => "job_deleted",
            Topic::ApplicationsUpdated => "applications_updated",
            Topic::ApplicationAdded => "application_added",
            Topic::ApplicationUpdated => "application_updated",
            Topic::CandidatesUpdated => "candidates_updated",
            Topic::CandidateAdded => "candidate_added",
            Topic::CandidateUpdated => "candidate_updated",
            Topic::InterviewsUpdated => "interviews_updated",
            Topic::InterviewAdded => "interview_added",
            Topic::InterviewUpdated => "interview_updated",
            Topic::MessagesUpdated => "messages_updated",
            Topic::MessageAdded => "message_added",
            Topic::DocumentsUpdated => "documents_updated",
            Topic::DocumentAdded => "document_added",
            Topic::DocumentUpdated => "document_updated",
            Topic::NotificationsUpdated => "notifications_updated",
            Topic::NotificationAdded => "notification_added",
            Topic::SyncStarted => "sync_started",
            Topic::SyncCompleted => "sync_completed",
            Topic::SyncFailed => "sync_failed",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown topic name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Topic::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| UnknownTopic(name.to_string()))
    }
}

/// An event emitted after a store mutation
///
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    pub topic: Topic,
    /// Collection snapshot or single entity
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Owning key for keyed collections (application id for messages,
    /// candidate id for documents, user id for notifications)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl SyncEvent {
    /// Create an event with a null payload and the current timestamp
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            payload: serde_json::Value::Null,
            scope: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an event carrying any serializable payload.
    ///
    /// A payload that fails to serialize is sent as null.
    pub fn with_data<T: Serialize + ?Sized>(topic: Topic, data: &T) -> Self {
        let payload = serde_json::to_value(data).unwrap_or_else(|e| {
            tracing::warn!(topic = %topic, "Failed to serialize event payload: {}", e);
            serde_json::Value::Null
        });
        Self::new(topic).with_payload(payload)
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}
