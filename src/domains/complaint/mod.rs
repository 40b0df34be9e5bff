pub mod repository;
pub mod service;
pub mod state_machine;
pub mod stats;
pub mod triage;
pub mod types;

pub use repository::{ComplaintRepository, SqliteComplaintRepository};
pub use service::{ComplaintService, ComplaintServiceImpl};
pub use types::{Category, Complaint, ComplaintFilter, ComplaintStatus, NewComplaint};
