//! Role-scoped aggregate statistics, computed fresh on every call

use super::collection::Collection;
use crate::recruitment::transitions::is_terminal_application;
use crate::recruitment::{
    Application, ApplicationStatus, Candidate, Interview, InterviewStatus, Job, Notification,
};
use serde::{Deserialize, Serialize};

/// Global counts shown on the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_jobs: usize,
    /// Jobs that are `active` or `urgent`
    pub active_jobs: usize,
    pub total_applications: usize,
    /// Applications still in `submitted`
    pub pending_reviews: usize,
    pub scheduled_interviews: usize,
    pub total_candidates: usize,
}

/// Counts scoped to one applicant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantStats {
    pub total_applications: usize,
    /// Applications not yet accepted, rejected or withdrawn
    pub active_applications: usize,
    pub interviews_scheduled: usize,
    pub offers_received: usize,
    pub unread_notifications: usize,
}

/// Stats for the caller's role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Stats {
    Admin(AdminStats),
    Applicant(ApplicantStats),
}

fn is_upcoming(interview: &Interview) -> bool {
    matches!(
        interview.status,
        InterviewStatus::Scheduled | InterviewStatus::Rescheduled
    )
}

impl AdminStats {
    pub fn compute(
        jobs: &Collection<Job>,
        applications: &Collection<Application>,
        interviews: &Collection<Interview>,
        candidates: &Collection<Candidate>,
    ) -> Self {
        Self {
            total_jobs: jobs.len(),
            active_jobs: jobs.values().filter(|j| j.status.is_open()).count(),
            total_applications: applications.len(),
            pending_reviews: applications
                .values()
                .filter(|a| a.status == ApplicationStatus::Submitted)
                .count(),
            scheduled_interviews: interviews
                .values()
                .filter(|i| i.status == InterviewStatus::Scheduled)
                .count(),
            total_candidates: candidates.len(),
        }
    }
}

impl ApplicantStats {
    pub fn compute(
        user_id: &str,
        applications: &Collection<Application>,
        interviews: &Collection<Interview>,
        notifications: &[Notification],
    ) -> Self {
        let mine: Vec<&Application> = applications
            .values()
            .filter(|a| a.candidate_id == user_id)
            .collect();

        Self {
            total_applications: mine.len(),
            active_applications: mine
                .iter()
                .filter(|a| !is_terminal_application(a.status))
                .count(),
            interviews_scheduled: interviews
                .values()
                .filter(|i| i.candidate_id == user_id && is_upcoming(i))
                .count(),
            offers_received: mine
                .iter()
                .filter(|a| a.status == ApplicationStatus::Accepted)
                .count(),
            unread_notifications: notifications.iter().filter(|n| !n.read).count(),
        }
    }
}
