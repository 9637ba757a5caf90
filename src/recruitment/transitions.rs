//! Allowed status transitions for applications and interviews

use super::models::{ApplicationStatus, InterviewStatus};

// ============================================================================
// Applications
// ============================================================================

/// Position in the forward pipeline. `None` for `Withdrawn`, which sits
/// outside the pipeline.
fn pipeline_rank(status: ApplicationStatus) -> Option<u8> {
    match status {
        ApplicationStatus::Submitted => Some(0),
        ApplicationStatus::Viewed => Some(1),
        ApplicationStatus::Interview => Some(2),
        ApplicationStatus::Accepted | ApplicationStatus::Rejected => Some(3),
        ApplicationStatus::Withdrawn => None,
    }
}

/// Whether no further transition may leave this status
pub fn is_terminal_application(status: ApplicationStatus) -> bool {
    matches!(
        status,
        ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
    )
}

/// Whether an application may move from `from` to `to`.
///
/// The pipeline only moves forward (skipping stages is fine); any
/// non-terminal application may be withdrawn. Re-setting the current
/// status is always allowed.
pub fn can_transition_application(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    if from == to {
        return true;
    }
    if is_terminal_application(from) {
        return false;
    }
    match (pipeline_rank(from), pipeline_rank(to)) {
        (_, None) => true,
        (Some(a), Some(b)) => b > a,
        (None, Some(_)) => false,
    }
}

/// Whether an interview can be attached to an application in this status
pub fn accepts_interview(status: ApplicationStatus) -> bool {
    matches!(
        status,
        ApplicationStatus::Submitted | ApplicationStatus::Viewed | ApplicationStatus::Interview
    )
}

// ============================================================================
// Interviews
// ============================================================================

/// Whether an interview may move from `from` to `to`
pub fn can_transition_interview(from: InterviewStatus, to: InterviewStatus) -> bool {
    use InterviewStatus::*;

    if from == to {
        return true;
    }
    match from {
        Scheduled => matches!(to, Completed | Cancelled | Rescheduled),
        Rescheduled => matches!(to, Scheduled | Completed | Cancelled),
        Completed | Cancelled => false,
    }
}
