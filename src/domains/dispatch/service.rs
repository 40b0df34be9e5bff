use crate::auth::AuthContext;
use crate::domains::complaint::repository::ComplaintRepository;
use crate::domains::complaint::types::ProcessedComplaint;
use crate::domains::dispatch::matcher;
use crate::domains::dispatch::types::{AssignmentMode, AssignmentOutcome, CandidateQuery};
use crate::domains::staff::repository::StaffRepository;
use crate::domains::staff::types::{Staff, StaffFilter, StaffStatus};
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::reference::ReferenceData;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining dispatch service operations
#[async_trait]
pub trait DispatchService: Send + Sync {
    /// Candidate staff for a complaint, filtered and deterministically
    /// ranked for the dispatch view.
    async fn candidates(
        &self,
        complaint_id: Uuid,
        query: CandidateQuery,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<Staff>>;

    /// Assign a staff member to a complaint. Available staff are claimed
    /// (mode Active); busy or off-duty staff only get the complaint
    /// recorded against them (mode Queued). Reassigning the current
    /// assignee is a no-op.
    async fn assign(
        &self,
        complaint_id: Uuid,
        staff_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<AssignmentOutcome>;
}

/// Implementation of the dispatch service
pub struct DispatchServiceImpl {
    pool: Pool<Sqlite>,
    complaint_repo: Arc<dyn ComplaintRepository>,
    staff_repo: Arc<dyn StaffRepository>,
}

impl DispatchServiceImpl {
    pub fn new(
        pool: Pool<Sqlite>,
        complaint_repo: Arc<dyn ComplaintRepository>,
        staff_repo: Arc<dyn StaffRepository>,
    ) -> Self {
        Self {
            pool,
            complaint_repo,
            staff_repo,
        }
    }

    async fn load_assignable(&self, complaint_id: Uuid) -> ServiceResult<ProcessedComplaint> {
        let processed = self
            .complaint_repo
            .find_processed_by_id(complaint_id)
            .await?
            .ok_or_else(|| {
                DomainError::InvalidAssignmentTarget(format!(
                    "complaint {} has not been triaged yet",
                    complaint_id
                ))
            })?;
        if !processed.status.is_assignable() {
            return Err(DomainError::InvalidAssignmentTarget(format!(
                "complaint {} is '{}' and cannot be assigned",
                complaint_id, processed.status
            ))
            .into());
        }
        Ok(processed)
    }

    async fn find_staff(&self, staff_id: Uuid) -> ServiceResult<Staff> {
        self.staff_repo.find_by_id(staff_id).await.map_err(|e| match e {
            DomainError::EntityNotFound(_, id) => DomainError::InvalidAssignmentTarget(format!(
                "staff {} does not exist",
                id
            ))
            .into(),
            other => other.into(),
        })
    }

    /// One assignment attempt against a staff snapshot. A stale snapshot
    /// surfaces as `DbError::Conflict` from the conditional claim.
    async fn attempt_assign(
        &self,
        complaint_id: Uuid,
        staff: &Staff,
        previous_assignee: Option<Uuid>,
    ) -> ServiceResult<AssignmentOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Domain(DbError::from(e).into()))?;

        // Reassignment frees the previous assignee if this complaint was
        // their active work; a merely queued predecessor is left alone.
        if let Some(previous) = previous_assignee {
            let released = self
                .staff_repo
                .release(previous, complaint_id, false, &mut tx)
                .await?;
            if released {
                log::info!(
                    "staff {} released by reassignment of complaint {}",
                    previous,
                    complaint_id
                );
            }
        }

        let mode = if staff.status == StaffStatus::Available {
            self.staff_repo
                .try_claim(staff.id, complaint_id, &mut tx)
                .await?;
            AssignmentMode::Active
        } else {
            // Queued: the staff member's current work is untouched
            AssignmentMode::Queued
        };
        self.complaint_repo
            .set_assigned_staff(complaint_id, staff.id, &mut tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| ServiceError::Domain(DbError::from(e).into()))?;

        Ok(AssignmentOutcome {
            complaint_id,
            staff_id: staff.id,
            mode,
        })
    }
}

#[async_trait]
impl DispatchService for DispatchServiceImpl {
    async fn candidates(
        &self,
        complaint_id: Uuid,
        query: CandidateQuery,
        auth: &AuthContext,
    ) -> ServiceResult<Vec<Staff>> {
        auth.authorize_admin()?;
        let complaint = self.complaint_repo.find_merged_by_id(complaint_id).await?;
        let recommended = ReferenceData::get().recommended_role(complaint.category);

        let pool = self.staff_repo.find_pool(&StaffFilter::default()).await?;
        let mut candidates = matcher::filter_candidates(&pool, &query, recommended);
        matcher::rank_candidates(&mut candidates, &complaint.address.locality);
        Ok(candidates)
    }

    async fn assign(
        &self,
        complaint_id: Uuid,
        staff_id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<AssignmentOutcome> {
        auth.authorize_admin()?;
        let processed = self.load_assignable(complaint_id).await?;

        if processed.assigned_staff_id == Some(staff_id) {
            return Ok(AssignmentOutcome {
                complaint_id,
                staff_id,
                mode: AssignmentMode::AlreadyAssigned,
            });
        }

        let mut staff = self.find_staff(staff_id).await?;
        for attempt in 0..2 {
            match self
                .attempt_assign(complaint_id, &staff, processed.assigned_staff_id)
                .await
            {
                Ok(outcome) => {
                    log::info!(
                        "complaint {} assigned to staff {} ({:?})",
                        complaint_id,
                        staff_id,
                        outcome.mode
                    );
                    return Ok(outcome);
                }
                Err(ServiceError::Domain(ref e)) if e.is_conflict() => {
                    if attempt > 0 {
                        return Err(ServiceError::AssignmentContention);
                    }
                    log::warn!(
                        "claim on staff {} lost a race, retrying with fresh state",
                        staff_id
                    );
                    staff = self.find_staff(staff_id).await?;
                }
                Err(other) => return Err(other),
            }
        }
        Err(ServiceError::AssignmentContention)
    }
}
