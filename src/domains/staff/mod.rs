pub mod repository;
pub mod types;

pub use repository::{SqliteStaffRepository, StaffRepository};
pub use types::{NewStaff, Staff, StaffFilter, StaffRole, StaffStatus};
