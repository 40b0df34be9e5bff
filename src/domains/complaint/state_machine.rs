use crate::domains::complaint::types::{ComplaintStatus, ProcessedComplaint};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::types::UserRole;

/// A requested status change, evaluated against the current processed
/// state before anything is persisted.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub to: ComplaintStatus,
    pub actor_role: UserRole,
    /// Required when transitioning to `Rejected`.
    pub reason: Option<String>,
}

/// Statuses legally reachable from `from`, regardless of actor or
/// payload requirements. `Analyzing` is the pre-triage display state and
/// is never re-entered.
pub fn legal_transitions(from: ComplaintStatus) -> &'static [ComplaintStatus] {
    match from {
        ComplaintStatus::Submitted => &[
            ComplaintStatus::Verified,
            ComplaintStatus::Resolved,
            ComplaintStatus::Rejected,
        ],
        ComplaintStatus::Analyzing => &[ComplaintStatus::Rejected],
        ComplaintStatus::Verified => &[ComplaintStatus::Resolved, ComplaintStatus::Rejected],
        ComplaintStatus::Resolved | ComplaintStatus::Rejected => &[],
    }
}

/// Validate a transition against the current processed state and return
/// the status to persist. Pure: the caller writes the outcome. Errors
/// carry the allowed set so callers can surface actionable messages.
pub fn transition(
    current: &ProcessedComplaint,
    request: &TransitionRequest,
) -> DomainResult<ComplaintStatus> {
    if !request.actor_role.is_admin() {
        return Err(DomainError::Validation(ValidationError::custom(
            "only admins may change complaint status",
        )));
    }

    let allowed = legal_transitions(current.status);
    if !allowed.contains(&request.to) {
        return Err(DomainError::IllegalTransition {
            from: current.status,
            requested: request.to,
            allowed: allowed.to_vec(),
        });
    }

    match request.to {
        ComplaintStatus::Resolved => {
            if current.assigned_staff_id.is_none() {
                return Err(DomainError::Validation(ValidationError::custom(
                    "cannot resolve a complaint with no assigned staff",
                )));
            }
        }
        ComplaintStatus::Rejected => {
            let has_reason = request
                .reason
                .as_deref()
                .map_or(false, |r| !r.trim().is_empty());
            if !has_reason {
                return Err(DomainError::Validation(ValidationError::required(
                    "rejection_reason",
                )));
            }
        }
        _ => {}
    }

    Ok(request.to)
}
