use std::sync::Arc;

// Public modules
pub mod auth;
pub mod db;
pub mod domains;
pub mod errors;
pub mod reference;
pub mod types;
pub mod validation;

use domains::complaint::repository::SqliteComplaintRepository;
use domains::complaint::service::{ComplaintService, ComplaintServiceImpl};
use domains::dispatch::service::{DispatchService, DispatchServiceImpl};
use domains::staff::repository::{SqliteStaffRepository, StaffRepository};
use errors::ServiceResult;
use sqlx::SqlitePool;

/// Wired-up service handles over a shared connection pool.
pub struct CivicCore {
    pub pool: SqlitePool,
    pub complaints: Arc<dyn ComplaintService>,
    pub dispatch: Arc<dyn DispatchService>,
    pub staff: Arc<dyn StaffRepository>,
}

/// Initialize the library with the given database URL: open the pool, run
/// migrations, and construct the services. Call once at startup.
pub async fn initialize(database_url: &str) -> ServiceResult<CivicCore> {
    let pool = db::init_pool(database_url).await.map_err(errors::DomainError::from)?;
    db::run_migrations(&pool).await.map_err(errors::DomainError::from)?;

    let staff_repo = Arc::new(SqliteStaffRepository::new(pool.clone()));
    let complaint_repo = Arc::new(SqliteComplaintRepository::new(pool.clone()));

    let complaints = Arc::new(ComplaintServiceImpl::new(
        pool.clone(),
        complaint_repo.clone(),
        staff_repo.clone(),
    ));
    let dispatch = Arc::new(DispatchServiceImpl::new(
        pool.clone(),
        complaint_repo,
        staff_repo.clone(),
    ));

    log::info!("civic core initialized");
    Ok(CivicCore {
        pool,
        complaints,
        dispatch,
        staff: staff_repo,
    })
}
