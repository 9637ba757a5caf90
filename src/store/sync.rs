//! The sync facade: one entry point over every collection
//!
//! Each mutation runs its primary change and all cascades under a single
//! write lock, queues the resulting events, releases the lock, and then
//! dispatches the events before returning. Listeners therefore observe a
//! consistent store and may read from it (or mutate it) without
//! deadlocking. A failed mutation writes nothing and emits nothing.
//!
//! Commit and dispatch are serialized by a reentrant dispatch guard, so
//! concurrent callers deliver their snapshots in commit order. A listener
//! calling back into the store re-enters the guard on its own thread.

use super::collection::{Collection, KeyedLists};
use super::error::{StoreError, StoreResult};
use super::seed::SeedData;
use super::stats::{AdminStats, ApplicantStats, Stats};
use crate::events::{EventBus, Subscription, SyncEvent, Topic};
use crate::recruitment::transitions::{
    accepts_interview, can_transition_application, can_transition_interview,
};
use crate::recruitment::*;
use chrono::Utc;
use parking_lot::{ReentrantMutex, RwLock};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default simulated backend round-trip for [`SyncStore::sync_with_backend`]
const DEFAULT_SYNC_DELAY: Duration = Duration::from_millis(1000);

/// Longest message excerpt copied into a notification
const MESSAGE_PREVIEW_CHARS: usize = 80;

#[derive(Default)]
struct StoreState {
    jobs: Collection<Job>,
    applications: Collection<Application>,
    candidates: Collection<Candidate>,
    interviews: Collection<Interview>,
    messages: KeyedLists<Message>,
    documents: KeyedLists<Document>,
    notifications: KeyedLists<Notification>,
}

/// Events queued by a mutation while the lock is held
type Outbox = Vec<SyncEvent>;

impl StoreState {
    // ------------------------------------------------------------------------
    // Change events: plural snapshot first, then the singular entity
    // ------------------------------------------------------------------------

    fn jobs_changed(&self, out: &mut Outbox, topic: Topic, job: &Job) {
        out.push(SyncEvent::with_data(Topic::JobsUpdated, &self.jobs.get_all()));
        out.push(SyncEvent::with_data(topic, job));
    }

    fn applications_changed(&self, out: &mut Outbox, topic: Topic, application: &Application) {
        out.push(SyncEvent::with_data(
            Topic::ApplicationsUpdated,
            &self.applications.get_all(),
        ));
        out.push(SyncEvent::with_data(topic, application));
    }

    fn candidates_changed(&self, out: &mut Outbox, topic: Topic, candidate: &Candidate) {
        out.push(SyncEvent::with_data(
            Topic::CandidatesUpdated,
            &self.candidates.get_all(),
        ));
        out.push(SyncEvent::with_data(topic, candidate));
    }

    fn interviews_changed(&self, out: &mut Outbox, topic: Topic, interview: &Interview) {
        out.push(SyncEvent::with_data(
            Topic::InterviewsUpdated,
            &self.interviews.get_all(),
        ));
        out.push(SyncEvent::with_data(topic, interview));
    }

    fn messages_changed(&self, out: &mut Outbox, application_id: &str) {
        out.push(
            SyncEvent::with_data(Topic::MessagesUpdated, self.messages.list(application_id))
                .with_scope(application_id),
        );
    }

    fn documents_changed(&self, out: &mut Outbox, topic: Topic, document: &Document) {
        let owner = document.candidate_id.as_str();
        out.push(
            SyncEvent::with_data(Topic::DocumentsUpdated, self.documents.list(owner))
                .with_scope(owner),
        );
        out.push(SyncEvent::with_data(topic, document).with_scope(owner));
    }

    fn notifications_changed(&self, out: &mut Outbox, user_id: &str) {
        out.push(
            SyncEvent::with_data(Topic::NotificationsUpdated, self.notifications.list(user_id))
                .with_scope(user_id),
        );
    }

    // ------------------------------------------------------------------------
    // Shared write paths used by cascades
    // ------------------------------------------------------------------------

    fn update_job(&mut self, out: &mut Outbox, id: &str, req: UpdateJobRequest) -> Option<Job> {
        let job = self.jobs.update(id, |job| req.apply_to(job))?;
        self.jobs_changed(out, Topic::JobUpdated, &job);
        Some(job)
    }

    fn update_application(
        &mut self,
        out: &mut Outbox,
        id: &str,
        req: UpdateApplicationRequest,
    ) -> Option<Application> {
        let application = self.applications.update(id, |app| req.apply_to(app))?;
        self.applications_changed(out, Topic::ApplicationUpdated, &application);
        Some(application)
    }

    fn notify(&mut self, out: &mut Outbox, notification: Notification) {
        let user_id = notification.user_id.clone();
        debug!(
            user_id = %user_id,
            kind = ?notification.notification_type,
            "Enqueue notification"
        );
        self.notifications.push(&user_id, notification.clone());
        self.notifications_changed(out, &user_id);
        out.push(SyncEvent::with_data(Topic::NotificationAdded, &notification).with_scope(user_id));
    }

    /// Move one applicant between jobs after an application was stored.
    /// Unknown jobs are skipped.
    fn recount_applicants(&mut self, out: &mut Outbox, from: Option<&str>, to: &str) {
        if from == Some(to) {
            return;
        }
        if let Some(old_job) = from {
            self.adjust_applicants(out, old_job, |n| n.saturating_sub(1));
        }
        if !self.adjust_applicants(out, to, |n| n.saturating_add(1)) {
            warn!(
                job_id = %to,
                "Application references unknown job; applicant count not updated"
            );
        }
    }

    fn adjust_applicants(
        &mut self,
        out: &mut Outbox,
        job_id: &str,
        f: impl Fn(u32) -> u32,
    ) -> bool {
        let Some(count) = self.jobs.get(job_id).map(|j| j.applicants) else {
            return false;
        };
        let req = UpdateJobRequest {
            applicants: Some(f(count)),
            ..Default::default()
        };
        self.update_job(out, job_id, req).is_some()
    }

    fn job_title(&self, job_id: &str) -> String {
        self.jobs
            .get(job_id)
            .map(|j| j.title.clone())
            .unwrap_or_else(|| "a position".to_string())
    }
}

/// Summary emitted with `sync_completed`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub jobs: usize,
    pub applications: usize,
    pub candidates: usize,
    pub interviews: usize,
    pub messages: usize,
    pub documents: usize,
    pub notifications: usize,
}

/// In-process synchronized store shared by the admin and applicant views.
///
/// Construct one per application and share it by reference (`Arc`).
pub struct SyncStore {
    state: RwLock<StoreState>,
    /// Held from commit until every queued event is delivered
    dispatch: ReentrantMutex<()>,
    bus: EventBus,
    sync_delay: Duration,
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStore {
    /// Create an empty store with its own event bus
    pub fn new() -> Self {
        Self::with_bus(EventBus::default())
    }

    /// Create an empty store publishing on the given bus
    pub fn with_bus(bus: EventBus) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            dispatch: ReentrantMutex::new(()),
            bus,
            sync_delay: DEFAULT_SYNC_DELAY,
        }
    }

    /// Set the simulated backend round-trip used by `sync_with_backend`
    pub fn with_sync_delay(mut self, delay: Duration) -> Self {
        self.sync_delay = delay;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Register a listener for a topic
    pub fn subscribe<F>(&self, topic: Topic, listener: F) -> Subscription
    where
        F: Fn(&SyncEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, listener)
    }

    /// Run a mutation under the write lock, then dispatch its events
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut StoreState, &mut Outbox) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let _dispatch = self.dispatch.lock();
        let mut outbox = Outbox::new();
        let result = {
            let mut state = self.state.write();
            f(&mut state, &mut outbox)
        };
        match &result {
            Ok(_) => self.bus.emit_all(outbox),
            Err(e) => debug!("Mutation rejected: {}", e),
        }
        result
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Bulk-load every collection, merging by key. Emits each snapshot once.
    pub fn seed(&self, data: SeedData) {
        let _dispatch = self.dispatch.lock();
        let mut outbox = Outbox::new();
        {
            let mut state = self.state.write();
            state.jobs.set(data.jobs);
            state.candidates.set(data.candidates);
            state.applications.set(data.applications);
            state.interviews.set(data.interviews);

            let mut threads = Vec::new();
            for message in data.messages {
                let owner = message.application_id.clone();
                state.messages.set(&owner, [message]);
                if !threads.contains(&owner) {
                    threads.push(owner);
                }
            }
            let mut folders = Vec::new();
            for document in data.documents {
                let owner = document.candidate_id.clone();
                state.documents.set(&owner, [document]);
                if !folders.contains(&owner) {
                    folders.push(owner);
                }
            }
            let mut inboxes = Vec::new();
            for notification in data.notifications {
                let owner = notification.user_id.clone();
                state.notifications.set(&owner, [notification]);
                if !inboxes.contains(&owner) {
                    inboxes.push(owner);
                }
            }

            outbox.push(SyncEvent::with_data(Topic::JobsUpdated, &state.jobs.get_all()));
            outbox.push(SyncEvent::with_data(
                Topic::CandidatesUpdated,
                &state.candidates.get_all(),
            ));
            outbox.push(SyncEvent::with_data(
                Topic::ApplicationsUpdated,
                &state.applications.get_all(),
            ));
            outbox.push(SyncEvent::with_data(
                Topic::InterviewsUpdated,
                &state.interviews.get_all(),
            ));
            for owner in &threads {
                state.messages_changed(&mut outbox, owner);
            }
            for owner in &folders {
                outbox.push(
                    SyncEvent::with_data(Topic::DocumentsUpdated, state.documents.list(owner))
                        .with_scope(owner.as_str()),
                );
            }
            for owner in &inboxes {
                state.notifications_changed(&mut outbox, owner);
            }

            info!(
                jobs = state.jobs.len(),
                candidates = state.candidates.len(),
                applications = state.applications.len(),
                interviews = state.interviews.len(),
                "Store seeded"
            );
        }
        self.bus.emit_all(outbox);
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    pub fn get_jobs(&self) -> Vec<Job> {
        self.state.read().jobs.get_all()
    }

    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.state.read().jobs.get(id).cloned()
    }

    /// Add a job, replacing any job with the same id
    pub fn add_job(&self, job: Job) -> StoreResult<Job> {
        self.mutate(|state, out| {
            if state.jobs.insert(job.clone()).is_some() {
                debug!(job_id = %job.id, "Replaced existing job");
            }
            state.jobs_changed(out, Topic::JobAdded, &job);
            Ok(job)
        })
    }

    pub fn update_job(&self, id: &str, req: UpdateJobRequest) -> StoreResult<Job> {
        self.mutate(|state, out| {
            state
                .update_job(out, id, req)
                .ok_or_else(|| StoreError::not_found::<Job>(id))
        })
    }

    /// Remove a job. Applications that reference it are kept.
    pub fn delete_job(&self, id: &str) -> StoreResult<Job> {
        self.mutate(|state, out| {
            let job = state
                .jobs
                .remove(id)
                .ok_or_else(|| StoreError::not_found::<Job>(id))?;
            state.jobs_changed(out, Topic::JobDeleted, &job);
            Ok(job)
        })
    }

    // ========================================================================
    // Candidates
    // ========================================================================

    pub fn get_candidates(&self) -> Vec<Candidate> {
        self.state.read().candidates.get_all()
    }

    pub fn get_candidate(&self, id: &str) -> Option<Candidate> {
        self.state.read().candidates.get(id).cloned()
    }

    pub fn add_candidate(&self, candidate: Candidate) -> StoreResult<Candidate> {
        validate_completion(candidate.profile_completion)?;
        self.mutate(|state, out| {
            state.candidates.insert(candidate.clone());
            state.candidates_changed(out, Topic::CandidateAdded, &candidate);
            Ok(candidate)
        })
    }

    pub fn update_candidate(
        &self,
        id: &str,
        req: UpdateCandidateRequest,
    ) -> StoreResult<Candidate> {
        if let Some(completion) = req.profile_completion {
            validate_completion(completion)?;
        }
        self.mutate(|state, out| {
            let candidate = state
                .candidates
                .update(id, |c| req.apply_to(c))
                .ok_or_else(|| StoreError::not_found::<Candidate>(id))?;
            state.candidates_changed(out, Topic::CandidateUpdated, &candidate);
            Ok(candidate)
        })
    }

    // ========================================================================
    // Applications
    // ========================================================================

    pub fn get_applications(&self) -> Vec<Application> {
        self.state.read().applications.get_all()
    }

    pub fn get_application(&self, id: &str) -> Option<Application> {
        self.state.read().applications.get(id).cloned()
    }

    pub fn get_applications_by_candidate(&self, candidate_id: &str) -> Vec<Application> {
        self.state
            .read()
            .applications
            .filter(|a| a.candidate_id == candidate_id)
    }

    pub fn get_applications_by_job(&self, job_id: &str) -> Vec<Application> {
        self.state.read().applications.filter(|a| a.job_id == job_id)
    }

    /// Insert an application and bump the referenced job's applicant count.
    ///
    /// Re-adding an existing id replaces it: the count stays put for the
    /// same job and moves across when the job changed. An unknown job is not
    /// an error: the application is stored and no counter changes.
    pub fn add_application(&self, application: Application) -> StoreResult<Application> {
        self.mutate(|state, out| {
            let previous = state.applications.insert(application.clone());
            state.applications_changed(out, Topic::ApplicationAdded, &application);

            let previous_job = previous.map(|p| p.job_id);
            state.recount_applicants(out, previous_job.as_deref(), &application.job_id);
            Ok(application)
        })
    }

    /// Merge a partial update into an application.
    ///
    /// A status change must follow the transition table and notifies the
    /// candidate; updates that leave the status unchanged notify nobody.
    pub fn update_application(
        &self,
        id: &str,
        req: UpdateApplicationRequest,
    ) -> StoreResult<Application> {
        self.mutate(|state, out| {
            let current = state
                .applications
                .get(id)
                .ok_or_else(|| StoreError::not_found::<Application>(id))?;
            let from = current.status;
            if let Some(to) = req.status {
                if !can_transition_application(from, to) {
                    return Err(StoreError::invalid_transition::<Application>(from, to));
                }
            }

            let application = state
                .update_application(out, id, req)
                .ok_or_else(|| StoreError::not_found::<Application>(id))?;

            if application.status != from {
                let title = state.job_title(&application.job_id);
                let priority = match application.status {
                    ApplicationStatus::Accepted | ApplicationStatus::Interview => {
                        NotificationPriority::High
                    }
                    _ => NotificationPriority::Medium,
                };
                let notification = Notification::new(
                    application.candidate_id.clone(),
                    NotificationType::Application,
                    "Application status updated",
                    format!(
                        "Your application for {} is now {}",
                        title, application.status
                    ),
                )
                .with_priority(priority)
                .with_role(Role::Applicant)
                .with_related(application.id.clone());
                state.notify(out, notification);
            }
            Ok(application)
        })
    }

    // ========================================================================
    // Interviews
    // ========================================================================

    pub fn get_interviews(&self) -> Vec<Interview> {
        self.state.read().interviews.get_all()
    }

    pub fn get_interview(&self, id: &str) -> Option<Interview> {
        self.state.read().interviews.get(id).cloned()
    }

    pub fn get_interviews_by_candidate(&self, candidate_id: &str) -> Vec<Interview> {
        self.state
            .read()
            .interviews
            .filter(|i| i.candidate_id == candidate_id)
    }

    /// Schedule an interview for an existing, open application.
    ///
    /// The application moves to `interview` and takes the interview's date
    /// and type; the candidate receives one interview notification.
    pub fn add_interview(&self, interview: Interview) -> StoreResult<Interview> {
        self.mutate(|state, out| {
            let application = state
                .applications
                .get(&interview.application_id)
                .ok_or_else(|| StoreError::not_found::<Application>(&interview.application_id))?;
            if !accepts_interview(application.status) {
                return Err(StoreError::invalid_transition::<Application>(
                    application.status,
                    ApplicationStatus::Interview,
                ));
            }
            if application.candidate_id != interview.candidate_id {
                return Err(StoreError::validation(format!(
                    "interview candidate {} does not match application candidate {}",
                    interview.candidate_id, application.candidate_id
                )));
            }

            state.interviews.insert(interview.clone());
            state.interviews_changed(out, Topic::InterviewAdded, &interview);

            let req = UpdateApplicationRequest {
                status: Some(ApplicationStatus::Interview),
                interview_date: Some(interview.date),
                interview_type: Some(interview.interview_type),
                ..Default::default()
            };
            state.update_application(out, &interview.application_id, req);

            let when = match &interview.time {
                Some(time) => format!("{} at {}", interview.date, time),
                None => interview.date.to_string(),
            };
            let notification = Notification::new(
                interview.candidate_id.clone(),
                NotificationType::Interview,
                "Interview scheduled",
                format!(
                    "Your {} interview is scheduled for {}",
                    interview.interview_type, when
                ),
            )
            .with_priority(NotificationPriority::High)
            .with_role(Role::Applicant)
            .with_related(interview.id.clone());
            state.notify(out, notification);

            Ok(interview)
        })
    }

    /// Merge a partial update into an interview.
    ///
    /// Date/type changes are mirrored onto the application; a status change
    /// notifies the candidate.
    pub fn update_interview(
        &self,
        id: &str,
        req: UpdateInterviewRequest,
    ) -> StoreResult<Interview> {
        self.mutate(|state, out| {
            let current = state
                .interviews
                .get(id)
                .ok_or_else(|| StoreError::not_found::<Interview>(id))?
                .clone();
            if let Some(to) = req.status {
                if !can_transition_interview(current.status, to) {
                    return Err(StoreError::invalid_transition::<Interview>(
                        current.status,
                        to,
                    ));
                }
            }

            let interview = state
                .interviews
                .update(id, |i| req.apply_to(i))
                .ok_or_else(|| StoreError::not_found::<Interview>(id))?;
            state.interviews_changed(out, Topic::InterviewUpdated, &interview);

            let rescheduled = interview.date != current.date
                || interview.interview_type != current.interview_type;
            if rescheduled && state.applications.contains(&interview.application_id) {
                let mirror = UpdateApplicationRequest {
                    interview_date: Some(interview.date),
                    interview_type: Some(interview.interview_type),
                    ..Default::default()
                };
                state.update_application(out, &interview.application_id, mirror);
            }

            if interview.status != current.status {
                let priority = match interview.status {
                    InterviewStatus::Completed => NotificationPriority::Low,
                    _ => NotificationPriority::High,
                };
                let notification = Notification::new(
                    interview.candidate_id.clone(),
                    NotificationType::Interview,
                    "Interview updated",
                    format!(
                        "Your interview on {} is now {}",
                        interview.date, interview.status
                    ),
                )
                .with_priority(priority)
                .with_role(Role::Applicant)
                .with_related(interview.id.clone());
                state.notify(out, notification);
            }
            Ok(interview)
        })
    }

    // ========================================================================
    // Messages
    // ========================================================================

    pub fn get_messages(&self, application_id: &str) -> Vec<Message> {
        self.state.read().messages.list(application_id).to_vec()
    }

    /// Append a message to its application thread and notify the recipient.
    ///
    /// Conversations have two parties: the recipient's role is the inverse
    /// of the sender's.
    pub fn add_message(&self, message: Message) -> StoreResult<Message> {
        self.mutate(|state, out| {
            let application_id = message.application_id.clone();
            if !state.applications.contains(&application_id) {
                return Err(StoreError::not_found::<Application>(application_id));
            }

            state.messages.push(&application_id, message.clone());
            state.messages_changed(out, &application_id);
            out.push(SyncEvent::with_data(Topic::MessageAdded, &message).with_scope(&application_id));

            let recipient_role = message.sender_role.counterpart();
            let preview: String = message.content.chars().take(MESSAGE_PREVIEW_CHARS).collect();
            let notification = Notification::new(
                message.recipient_id.clone(),
                NotificationType::Message,
                format!("New message from {}", message.sender_role),
                preview,
            )
            .with_role(recipient_role)
            .with_related(application_id);
            state.notify(out, notification);

            Ok(message)
        })
    }

    /// Mark every message addressed to `reader_id` in the thread as read.
    /// Returns the number of messages that changed.
    pub fn mark_messages_as_read(&self, application_id: &str, reader_id: &str) -> StoreResult<usize> {
        self.mutate(|state, out| {
            if !state.applications.contains(application_id) {
                return Err(StoreError::not_found::<Application>(application_id));
            }
            let changed = state.messages.update_all(application_id, |m| {
                if m.recipient_id == reader_id && m.status != MessageStatus::Read {
                    m.status = MessageStatus::Read;
                    true
                } else {
                    false
                }
            });
            if changed > 0 {
                state.messages_changed(out, application_id);
            }
            Ok(changed)
        })
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub fn get_documents(&self, candidate_id: &str) -> Vec<Document> {
        self.state.read().documents.list(candidate_id).to_vec()
    }

    pub fn add_document(&self, document: Document) -> StoreResult<Document> {
        self.mutate(|state, out| {
            if !state.candidates.contains(&document.candidate_id) {
                return Err(StoreError::not_found::<Candidate>(&document.candidate_id));
            }
            state.documents.push(&document.candidate_id, document.clone());
            state.documents_changed(out, Topic::DocumentAdded, &document);
            Ok(document)
        })
    }

    /// Update a candidate's document. A review (status change) notifies the
    /// candidate.
    pub fn update_document(
        &self,
        candidate_id: &str,
        document_id: &str,
        req: UpdateDocumentRequest,
    ) -> StoreResult<Document> {
        self.mutate(|state, out| {
            let from = state
                .documents
                .get(candidate_id, document_id)
                .ok_or_else(|| StoreError::not_found::<Document>(document_id))?
                .status;

            let document = state
                .documents
                .update(candidate_id, document_id, |d| req.apply_to(d))
                .ok_or_else(|| StoreError::not_found::<Document>(document_id))?;
            state.documents_changed(out, Topic::DocumentUpdated, &document);

            if document.status != from {
                let priority = match document.status {
                    DocumentStatus::Rejected => NotificationPriority::High,
                    _ => NotificationPriority::Medium,
                };
                let mut text = format!("Your document {} is {}", document.name, document.status);
                if let Some(note) = &document.review_note {
                    text.push_str(&format!(": {}", note));
                }
                let notification = Notification::new(
                    candidate_id,
                    NotificationType::Document,
                    "Document reviewed",
                    text,
                )
                .with_priority(priority)
                .with_role(Role::Applicant)
                .with_related(document.id.clone());
                state.notify(out, notification);
            }
            Ok(document)
        })
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub fn get_notifications(&self, user_id: &str) -> Vec<Notification> {
        self.state.read().notifications.list(user_id).to_vec()
    }

    pub fn get_unread_notification_count(&self, user_id: &str) -> usize {
        self.state
            .read()
            .notifications
            .list(user_id)
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    /// Deliver a notification directly (system announcements and the like)
    pub fn add_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.mutate(|state, out| {
            state.notify(out, notification.clone());
            Ok(notification)
        })
    }

    /// Mark one notification as read. Idempotent; emits only when the flag
    /// actually flips.
    pub fn mark_notification_as_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> StoreResult<Notification> {
        self.mutate(|state, out| {
            let was_read = state
                .notifications
                .get(user_id, notification_id)
                .ok_or_else(|| StoreError::not_found::<Notification>(notification_id))?
                .read;
            let notification = state
                .notifications
                .update(user_id, notification_id, |n| n.read = true)
                .ok_or_else(|| StoreError::not_found::<Notification>(notification_id))?;
            if !was_read {
                state.notifications_changed(out, user_id);
            }
            Ok(notification)
        })
    }

    /// Mark every notification of a user as read; returns how many changed
    pub fn mark_all_notifications_as_read(&self, user_id: &str) -> usize {
        let result = self.mutate(|state, out| {
            let changed = state
                .notifications
                .update_all(user_id, |n| !std::mem::replace(&mut n.read, true));
            if changed > 0 {
                state.notifications_changed(out, user_id);
            }
            Ok(changed)
        });
        result.unwrap_or(0)
    }

    // ========================================================================
    // Stats
    // ========================================================================

    /// Aggregate counts for a role. The applicant role needs a user id.
    pub fn get_stats(&self, role: Role, user_id: Option<&str>) -> StoreResult<Stats> {
        let state = self.state.read();
        match role {
            Role::Admin => Ok(Stats::Admin(AdminStats::compute(
                &state.jobs,
                &state.applications,
                &state.interviews,
                &state.candidates,
            ))),
            Role::Applicant => {
                let user_id = user_id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| StoreError::validation("applicant stats require a user id"))?;
                Ok(Stats::Applicant(ApplicantStats::compute(
                    user_id,
                    &state.applications,
                    &state.interviews,
                    state.notifications.list(user_id),
                )))
            }
        }
    }

    // ========================================================================
    // Backend sync
    // ========================================================================

    /// Emit one event outside a mutation, ordered after any in-flight dispatch
    fn emit(&self, event: SyncEvent) {
        let _dispatch = self.dispatch.lock();
        self.bus.emit(event);
    }

    fn summary(&self) -> SyncSummary {
        let state = self.state.read();
        SyncSummary {
            jobs: state.jobs.len(),
            applications: state.applications.len(),
            candidates: state.candidates.len(),
            interviews: state.interviews.len(),
            messages: state.messages.total(),
            documents: state.documents.total(),
            notifications: state.notifications.total(),
        }
    }

    /// Simulated round-trip to a backend: emits `sync_started`, waits the
    /// configured delay, then emits `sync_completed` with collection sizes.
    pub async fn sync_with_backend(&self) -> anyhow::Result<SyncSummary> {
        info!(delay_ms = self.sync_delay.as_millis() as u64, "Sync started");
        self.emit(SyncEvent::new(Topic::SyncStarted));

        tokio::time::sleep(self.sync_delay).await;

        let summary = self.summary();
        match serde_json::to_value(&summary) {
            Ok(payload) => {
                self.emit(SyncEvent::new(Topic::SyncCompleted).with_payload(payload));
                info!(
                    jobs = summary.jobs,
                    applications = summary.applications,
                    "Sync completed at {}",
                    Utc::now().to_rfc3339()
                );
                Ok(summary)
            }
            // Unreachable while SyncSummary holds only counters
            Err(e) => {
                warn!("Sync failed: {}", e);
                self.emit(
                    SyncEvent::new(Topic::SyncFailed)
                        .with_payload(serde_json::json!({ "error": e.to_string() })),
                );
                Err(e.into())
            }
        }
    }
}

fn validate_completion(completion: u8) -> StoreResult<()> {
    if completion > 100 {
        return Err(StoreError::validation(format!(
            "profile completion must be between 0 and 100, got {}",
            completion
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::{Arc, Mutex};

    /// Record every event for the given topics
    fn record(store: &SyncStore, topics: &[Topic]) -> Arc<Mutex<Vec<SyncEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for &topic in topics {
            let seen = seen.clone();
            store.subscribe(topic, move |e| {
                seen.lock().unwrap().push(e.clone());
                Ok(())
            });
        }
        seen
    }

    fn topics(events: &Arc<Mutex<Vec<SyncEvent>>>) -> Vec<Topic> {
        events.lock().unwrap().iter().map(|e| e.topic).collect()
    }

    #[test]
    fn test_add_job_emits_snapshot_then_entity() {
        let store = SyncStore::new();
        let seen = record(&store, &[Topic::JobsUpdated, Topic::JobAdded]);

        store.add_job(test_job("J1")).unwrap();

        assert_eq!(topics(&seen), vec![Topic::JobsUpdated, Topic::JobAdded]);
        let events = seen.lock().unwrap();
        assert_eq!(events[0].payload.as_array().unwrap().len(), 1);
        assert_eq!(events[1].payload["id"], "J1");
    }

    #[test]
    fn test_update_missing_job_is_not_found() {
        let store = SyncStore::new();
        let seen = record(&store, &[Topic::JobsUpdated]);

        let err = store
            .update_job("nope", UpdateJobRequest::default())
            .unwrap_err();

        assert_eq!(err, StoreError::not_found::<Job>("nope"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delete_job() {
        let store = SyncStore::new();
        store.add_job(test_job("J1")).unwrap();
        let seen = record(&store, &[Topic::JobDeleted]);

        let deleted = store.delete_job("J1").unwrap();

        assert_eq!(deleted.id, "J1");
        assert!(store.get_job("J1").is_none());
        assert_eq!(topics(&seen), vec![Topic::JobDeleted]);
        assert!(matches!(
            store.delete_job("J1"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_application_increments_job() {
        let store = SyncStore::new();
        store.add_job(test_job("J1")).unwrap();
        let seen = record(&store, &[Topic::JobsUpdated, Topic::ApplicationsUpdated]);

        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        assert_eq!(store.get_job("J1").unwrap().applicants, 1);
        assert_eq!(
            topics(&seen),
            vec![Topic::ApplicationsUpdated, Topic::JobsUpdated]
        );
    }

    #[test]
    fn test_add_application_unknown_job_is_silent() {
        let store = SyncStore::new();
        store.add_job(test_job("J1")).unwrap();

        store
            .add_application(test_application("A1", "ghost", "C1"))
            .unwrap();

        assert_eq!(store.get_job("J1").unwrap().applicants, 0);
        assert_eq!(store.get_applications().len(), 1);
    }

    #[test]
    fn test_readd_application_keeps_count() {
        let store = SyncStore::new();
        store.add_job(test_job("J1")).unwrap();

        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        assert_eq!(store.get_job("J1").unwrap().applicants, 1);
        assert_eq!(store.get_applications().len(), 1);
    }

    #[test]
    fn test_readd_application_moves_count_between_jobs() {
        let store = SyncStore::new();
        store.add_job(test_job("J1")).unwrap();
        store.add_job(test_job("J2")).unwrap();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        store.add_application(test_application("A1", "J2", "C1")).unwrap();

        assert_eq!(store.get_job("J1").unwrap().applicants, 0);
        assert_eq!(store.get_job("J2").unwrap().applicants, 1);
        assert!(store.get_applications_by_job("J1").is_empty());
    }

    #[test]
    fn test_applicant_count_saturates() {
        let store = SyncStore::new();
        let mut job = test_job("J1");
        job.applicants = u32::MAX;
        store.add_job(job).unwrap();

        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        assert_eq!(store.get_job("J1").unwrap().applicants, u32::MAX);
    }

    #[test]
    fn test_get_applications_by_job() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store.add_application(test_application("A2", "J2", "C1")).unwrap();
        store.add_application(test_application("A3", "J1", "C2")).unwrap();

        let ids: Vec<String> = store
            .get_applications_by_job("J1")
            .into_iter()
            .map(|a| a.id)
            .collect();

        assert_eq!(ids, vec!["A1", "A3"]);
        assert!(store.get_applications_by_job("J9").is_empty());
    }

    #[test]
    fn test_update_application_notifies_on_status_change() {
        let store = SyncStore::new();
        store.add_job(test_job("J1")).unwrap();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        let app = store
            .update_application("A1", UpdateApplicationRequest::status(ApplicationStatus::Viewed))
            .unwrap();

        assert_eq!(app.status, ApplicationStatus::Viewed);
        let notes = store.get_notifications("C1");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationType::Application);
        assert!(notes[0].message.contains("viewed"));
        assert!(notes[0].message.contains("Sales Promotion"));
    }

    #[test]
    fn test_update_application_without_status_change_is_quiet() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        store
            .update_application(
                "A1",
                UpdateApplicationRequest {
                    notes: Some("Strong profile".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .update_application(
                "A1",
                UpdateApplicationRequest::status(ApplicationStatus::Submitted),
            )
            .unwrap();

        assert!(store.get_notifications("C1").is_empty());
        assert_eq!(
            store.get_application("A1").unwrap().notes.as_deref(),
            Some("Strong profile")
        );
    }

    #[test]
    fn test_update_application_rejects_backward_move() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store
            .update_application("A1", UpdateApplicationRequest::status(ApplicationStatus::Rejected))
            .unwrap();

        let err = store
            .update_application("A1", UpdateApplicationRequest::status(ApplicationStatus::Viewed))
            .unwrap_err();

        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(
            store.get_application("A1").unwrap().status,
            ApplicationStatus::Rejected
        );
        assert_eq!(store.get_notifications("C1").len(), 1);
    }

    #[test]
    fn test_update_missing_application() {
        let store = SyncStore::new();
        let err = store
            .update_application("A9", UpdateApplicationRequest::status(ApplicationStatus::Viewed))
            .unwrap_err();
        assert_eq!(err, StoreError::not_found::<Application>("A9"));
    }

    #[test]
    fn test_add_interview_cascades() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        store.add_interview(test_interview("I1", "A1", "C1")).unwrap();

        let app = store.get_application("A1").unwrap();
        assert_eq!(app.status, ApplicationStatus::Interview);
        assert_eq!(app.interview_date, Some(test_date()));
        assert_eq!(app.interview_type, Some(InterviewType::Video));

        let notes = store.get_notifications("C1");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationType::Interview);
        assert_eq!(notes[0].priority, NotificationPriority::High);
    }

    #[test]
    fn test_add_interview_unknown_application_writes_nothing() {
        let store = SyncStore::new();
        let seen = record(&store, &[Topic::InterviewsUpdated, Topic::NotificationAdded]);

        let err = store
            .add_interview(test_interview("I1", "ghost", "C1"))
            .unwrap_err();

        assert_eq!(err, StoreError::not_found::<Application>("ghost"));
        assert!(store.get_interviews().is_empty());
        assert!(store.get_notifications("C1").is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_add_interview_to_closed_application() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store
            .update_application("A1", UpdateApplicationRequest::status(ApplicationStatus::Rejected))
            .unwrap();

        let err = store
            .add_interview(test_interview("I1", "A1", "C1"))
            .unwrap_err();

        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert!(store.get_interview("I1").is_none());
        assert_eq!(
            store.get_application("A1").unwrap().status,
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn test_update_interview_mirrors_date_and_notifies() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store.add_interview(test_interview("I1", "A1", "C1")).unwrap();

        let new_date = chrono::NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
        let interview = store
            .update_interview(
                "I1",
                UpdateInterviewRequest {
                    date: Some(new_date),
                    status: Some(InterviewStatus::Rescheduled),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(interview.status, InterviewStatus::Rescheduled);
        assert_eq!(
            store.get_application("A1").unwrap().interview_date,
            Some(new_date)
        );
        // One for scheduling, one for rescheduling
        assert_eq!(store.get_notifications("C1").len(), 2);
    }

    #[test]
    fn test_update_interview_invalid_transition() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store.add_interview(test_interview("I1", "A1", "C1")).unwrap();
        store
            .update_interview(
                "I1",
                UpdateInterviewRequest {
                    status: Some(InterviewStatus::Cancelled),
                    ..Default::default()
                },
            )
            .unwrap();

        let err = store
            .update_interview(
                "I1",
                UpdateInterviewRequest {
                    status: Some(InterviewStatus::Scheduled),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_add_message_notifies_counterpart() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        let seen = record(&store, &[Topic::MessagesUpdated]);

        store
            .add_message(test_message("M1", "A1", "admin-1", Role::Admin, "C1"))
            .unwrap();

        assert_eq!(store.get_messages("A1").len(), 1);
        let notes = store.get_notifications("C1");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationType::Message);
        assert_eq!(notes[0].user_role, Some(Role::Applicant));

        let events = seen.lock().unwrap();
        assert_eq!(events[0].scope.as_deref(), Some("A1"));
    }

    #[test]
    fn test_message_preview_truncated() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        let mut message = test_message("M1", "A1", "C1", Role::Applicant, "admin-1");
        message.content = "x".repeat(500);

        store.add_message(message).unwrap();

        let notes = store.get_notifications("admin-1");
        assert_eq!(notes[0].message.chars().count(), MESSAGE_PREVIEW_CHARS);
        assert_eq!(notes[0].user_role, Some(Role::Admin));
    }

    #[test]
    fn test_add_message_unknown_application() {
        let store = SyncStore::new();
        let err = store
            .add_message(test_message("M1", "ghost", "C1", Role::Applicant, "admin-1"))
            .unwrap_err();
        assert_eq!(err, StoreError::not_found::<Application>("ghost"));
        assert!(store.get_notifications("admin-1").is_empty());
    }

    #[test]
    fn test_mark_messages_as_read() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store
            .add_message(test_message("M1", "A1", "admin-1", Role::Admin, "C1"))
            .unwrap();
        store
            .add_message(test_message("M2", "A1", "admin-1", Role::Admin, "C1"))
            .unwrap();
        store
            .add_message(test_message("M3", "A1", "C1", Role::Applicant, "admin-1"))
            .unwrap();

        assert_eq!(store.mark_messages_as_read("A1", "C1").unwrap(), 2);
        assert_eq!(store.mark_messages_as_read("A1", "C1").unwrap(), 0);

        let messages = store.get_messages("A1");
        assert_eq!(messages[2].status, MessageStatus::Sent);
    }

    #[test]
    fn test_update_document_review_notifies() {
        let store = SyncStore::new();
        store.add_candidate(test_candidate("C1")).unwrap();
        store.add_document(test_document("D1", "C1")).unwrap();

        let doc = store
            .update_document(
                "C1",
                "D1",
                UpdateDocumentRequest {
                    status: Some(DocumentStatus::Rejected),
                    review_note: Some("Blurry scan".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(doc.status, DocumentStatus::Rejected);
        let notes = store.get_notifications("C1");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationType::Document);
        assert!(notes[0].message.contains("Blurry scan"));
    }

    #[test]
    fn test_update_document_rename_is_quiet() {
        let store = SyncStore::new();
        store.add_candidate(test_candidate("C1")).unwrap();
        store.add_document(test_document("D1", "C1")).unwrap();

        store
            .update_document(
                "C1",
                "D1",
                UpdateDocumentRequest {
                    name: Some("resume-v2.pdf".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(store.get_notifications("C1").is_empty());
        assert_eq!(store.get_documents("C1")[0].name, "resume-v2.pdf");
    }

    #[test]
    fn test_document_requires_candidate() {
        let store = SyncStore::new();
        assert_eq!(
            store.add_document(test_document("D1", "C1")).unwrap_err(),
            StoreError::not_found::<Candidate>("C1")
        );
        assert_eq!(
            store
                .update_document("C1", "D1", UpdateDocumentRequest::default())
                .unwrap_err(),
            StoreError::not_found::<Document>("D1")
        );
    }

    #[test]
    fn test_candidate_completion_validated() {
        let store = SyncStore::new();
        let mut candidate = test_candidate("C1");
        candidate.profile_completion = 101;
        assert!(matches!(
            store.add_candidate(candidate),
            Err(StoreError::Validation(_))
        ));

        store.add_candidate(test_candidate("C1")).unwrap();
        let err = store
            .update_candidate(
                "C1",
                UpdateCandidateRequest {
                    profile_completion: Some(150),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_mark_notification_as_read_is_idempotent() {
        let store = SyncStore::new();
        let n = store
            .add_notification(Notification::new(
                "U1",
                NotificationType::System,
                "Welcome",
                "Hello",
            ))
            .unwrap();
        let seen = record(&store, &[Topic::NotificationsUpdated]);

        assert_eq!(store.get_unread_notification_count("U1"), 1);
        assert!(store.mark_notification_as_read("U1", &n.id).unwrap().read);
        assert!(store.mark_notification_as_read("U1", &n.id).unwrap().read);
        assert_eq!(store.get_unread_notification_count("U1"), 0);
        // Only the first call flipped the flag
        assert_eq!(seen.lock().unwrap().len(), 1);

        assert!(matches!(
            store.mark_notification_as_read("U1", "missing"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_mark_all_notifications_as_read() {
        let store = SyncStore::new();
        for i in 0..3 {
            store
                .add_notification(Notification::new(
                    "U1",
                    NotificationType::System,
                    format!("n{}", i),
                    "body",
                ))
                .unwrap();
        }
        let first = store.get_notifications("U1")[0].id.clone();
        store.mark_notification_as_read("U1", &first).unwrap();

        assert_eq!(store.mark_all_notifications_as_read("U1"), 2);
        assert_eq!(store.mark_all_notifications_as_read("U1"), 0);
        assert_eq!(store.get_unread_notification_count("U1"), 0);
        assert_eq!(store.mark_all_notifications_as_read("nobody"), 0);
    }

    #[test]
    fn test_add_interview_for_other_candidate_rejected() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();

        let err = store
            .add_interview(test_interview("I1", "A1", "C2"))
            .unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.get_interviews_by_candidate("C2").is_empty());
        assert!(store.get_notifications("C2").is_empty());
        assert_eq!(
            store.get_application("A1").unwrap().status,
            ApplicationStatus::Submitted
        );
    }

    #[test]
    fn test_admin_stats() {
        let store = SyncStore::new();
        store.add_job(test_job("J1")).unwrap();
        let mut closed = test_job("J2");
        closed.status = JobStatus::Closed;
        store.add_job(closed).unwrap();
        store.add_candidate(test_candidate("C1")).unwrap();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store.add_application(test_application("A2", "J1", "C2")).unwrap();
        store.add_interview(test_interview("I1", "A2", "C2")).unwrap();

        let stats = store.get_stats(Role::Admin, None).unwrap();

        assert_eq!(
            stats,
            Stats::Admin(AdminStats {
                total_jobs: 2,
                active_jobs: 1,
                total_applications: 2,
                pending_reviews: 1,
                scheduled_interviews: 1,
                total_candidates: 1,
            })
        );
    }

    #[test]
    fn test_applicant_stats_scoped_to_user() {
        let store = SyncStore::new();
        store.add_application(test_application("A1", "J1", "C1")).unwrap();
        store.add_application(test_application("A2", "J2", "C1")).unwrap();
        store.add_application(test_application("A3", "J1", "C2")).unwrap();
        store.add_interview(test_interview("I1", "A1", "C1")).unwrap();
        store
            .update_application("A2", UpdateApplicationRequest::status(ApplicationStatus::Accepted))
            .unwrap();

        let stats = store.get_stats(Role::Applicant, Some("C1")).unwrap();

        assert_eq!(
            stats,
            Stats::Applicant(ApplicantStats {
                total_applications: 2,
                active_applications: 1,
                interviews_scheduled: 1,
                offers_received: 1,
                unread_notifications: 2,
            })
        );
    }

    #[test]
    fn test_applicant_stats_require_user() {
        let store = SyncStore::new();
        assert!(matches!(
            store.get_stats(Role::Applicant, None),
            Err(StoreError::Validation(_))
        ));
        assert!(store.get_stats(Role::Applicant, Some("")).is_err());
    }

    #[test]
    fn test_listener_can_read_store() {
        let store = Arc::new(SyncStore::new());
        let observed = Arc::new(Mutex::new(Vec::new()));
        {
            let reader = Arc::downgrade(&store);
            let observed = observed.clone();
            store.subscribe(Topic::JobAdded, move |_| {
                if let Some(store) = reader.upgrade() {
                    observed.lock().unwrap().push(store.get_jobs().len());
                }
                Ok(())
            });
        }

        store.add_job(test_job("J1")).unwrap();
        store.add_job(test_job("J2")).unwrap();

        assert_eq!(*observed.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_seed_emits_each_snapshot_once() {
        let store = SyncStore::new();
        let seen = record(
            &store,
            &[
                Topic::JobsUpdated,
                Topic::ApplicationsUpdated,
                Topic::MessagesUpdated,
                Topic::NotificationsUpdated,
            ],
        );

        store.seed(SeedData {
            jobs: vec![test_job("J1"), test_job("J2")],
            applications: vec![test_application("A1", "J1", "C1")],
            messages: vec![
                test_message("M1", "A1", "C1", Role::Applicant, "admin-1"),
                test_message("M2", "A1", "admin-1", Role::Admin, "C1"),
            ],
            ..Default::default()
        });

        assert_eq!(
            topics(&seen),
            vec![
                Topic::JobsUpdated,
                Topic::ApplicationsUpdated,
                Topic::MessagesUpdated
            ]
        );
        assert_eq!(store.get_jobs().len(), 2);
        assert_eq!(store.get_messages("A1").len(), 2);
        // Seeding does not run cascades
        assert_eq!(store.get_job("J1").unwrap().applicants, 0);
    }

    #[tokio::test]
    async fn test_sync_with_backend_events() {
        let store = SyncStore::new().with_sync_delay(Duration::from_millis(5));
        store.add_job(test_job("J1")).unwrap();
        let seen = record(
            &store,
            &[Topic::SyncStarted, Topic::SyncCompleted, Topic::SyncFailed],
        );

        let summary = store.sync_with_backend().await.unwrap();

        assert_eq!(summary.jobs, 1);
        assert_eq!(topics(&seen), vec![Topic::SyncStarted, Topic::SyncCompleted]);
        assert_eq!(seen.lock().unwrap()[1].payload["jobs"], 1);
    }
}
