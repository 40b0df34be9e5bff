pub mod matcher;
pub mod service;
pub mod types;

pub use matcher::{filter_candidates, rank_candidates};
pub use service::{DispatchService, DispatchServiceImpl};
pub use types::{AssignmentMode, AssignmentOutcome, CandidateQuery, RoleFilter};
