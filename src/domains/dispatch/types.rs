use crate::domains::staff::types::{StaffRole, StaffStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an assignment took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentMode {
    /// Staff was available and is now busy on this complaint.
    Active,
    /// Staff was busy or off duty; the complaint records the assignee but
    /// their current work is untouched.
    Queued,
    /// The complaint already carried this assignee; nothing changed.
    AlreadyAssigned,
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    pub complaint_id: Uuid,
    pub staff_id: Uuid,
    pub mode: AssignmentMode,
}

/// Role constraint for candidate selection. Defaults to the triage
/// recommendation; admins can broaden to the whole roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    Recommended,
    Specific(StaffRole),
    Any,
}

/// Candidate-pool query built by the dispatch UI.
#[derive(Debug, Clone, Default)]
pub struct CandidateQuery {
    pub role: RoleFilter,
    pub status: Option<StaffStatus>,
    pub zone: Option<String>,
}
