use crate::auth::AuthContext;
use crate::domains::complaint::repository::ComplaintRepository;
use crate::domains::complaint::state_machine::{self, TransitionRequest};
use crate::domains::complaint::stats::ComplaintEvent;
use crate::domains::complaint::triage;
use crate::domains::complaint::types::{
    Complaint, ComplaintFilter, ComplaintStatus, NewComplaint, ProcessedComplaint,
};
use crate::domains::staff::repository::StaffRepository;
use crate::errors::{DbError, DomainError, ServiceError, ServiceResult};
use crate::types::{PaginatedResult, PaginationParams};
use crate::validation::Validate;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining complaint service operations
#[async_trait]
pub trait ComplaintService: Send + Sync {
    /// File a complaint: validate, store the raw layer, run triage. Returns
    /// the merged complaint and the event dashboards fold into their counts.
    async fn submit(
        &self,
        new: NewComplaint,
        auth: &AuthContext,
    ) -> ServiceResult<(Complaint, ComplaintEvent)>;

    /// Run (or re-run) the triage engine for a raw complaint and persist
    /// the derived attributes. Idempotent. Restricted to admins and the
    /// internal pipeline.
    async fn triage_complaint(&self, id: Uuid, auth: &AuthContext)
        -> ServiceResult<ProcessedComplaint>;

    async fn get_complaint(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<Complaint>;

    async fn list_complaints(
        &self,
        filter: ComplaintFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<Complaint>>;

    /// Apply a lifecycle transition. Entering a terminal state releases the
    /// assigned staff member in the same transaction.
    async fn transition_status(
        &self,
        id: Uuid,
        request: TransitionRequest,
        auth: &AuthContext,
    ) -> ServiceResult<(Complaint, ComplaintEvent)>;
}

/// Implementation of the complaint service
pub struct ComplaintServiceImpl {
    pool: Pool<Sqlite>,
    repo: Arc<dyn ComplaintRepository>,
    staff_repo: Arc<dyn StaffRepository>,
}

impl ComplaintServiceImpl {
    pub fn new(
        pool: Pool<Sqlite>,
        repo: Arc<dyn ComplaintRepository>,
        staff_repo: Arc<dyn StaffRepository>,
    ) -> Self {
        Self {
            pool,
            repo,
            staff_repo,
        }
    }

    fn placeholder_description(title: &str) -> String {
        format!("{} (photo evidence)", title)
    }
}

#[async_trait]
impl ComplaintService for ComplaintServiceImpl {
    async fn submit(
        &self,
        new: NewComplaint,
        auth: &AuthContext,
    ) -> ServiceResult<(Complaint, ComplaintEvent)> {
        auth.authorize_self_or_admin(&new.submitter_id)?;
        new.validate()?;

        let description = match new.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d.to_string(),
            _ => Self::placeholder_description(&new.title),
        };

        let raw = self.repo.create_raw(&new, &description).await?;
        log::info!(
            "complaint {} filed in {} ({})",
            raw.id,
            raw.address.locality,
            raw.category
        );

        self.triage_complaint(raw.id, &AuthContext::internal_system_context())
            .await?;
        let complaint = self.repo.find_merged_by_id(raw.id).await?;
        let event = ComplaintEvent::Submitted {
            locality: complaint.address.locality.clone(),
        };
        Ok((complaint, event))
    }

    async fn triage_complaint(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<ProcessedComplaint> {
        auth.authorize_admin()?;
        let raw = self.repo.find_raw_by_id(id).await?;
        let result = triage::triage(&raw);
        let processed = self.repo.persist_triage_result(id, &result).await?;
        log::debug!(
            "complaint {} triaged: score {:.2}, visible {}",
            id,
            processed.priority_score,
            processed.admin_visible
        );
        Ok(processed)
    }

    async fn get_complaint(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<Complaint> {
        let complaint = self.repo.find_merged_by_id(id).await?;
        auth.authorize_self_or_admin(&complaint.submitter_id)?;
        Ok(complaint)
    }

    async fn list_complaints(
        &self,
        mut filter: ComplaintFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<Complaint>> {
        // Non-admins only ever see their own complaints
        if !auth.role.is_admin() {
            filter.submitter_id = Some(auth.user_id);
            filter.admin_visible_only = false;
        }
        Ok(self.repo.list_merged(&filter, params).await?)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        request: TransitionRequest,
        auth: &AuthContext,
    ) -> ServiceResult<(Complaint, ComplaintEvent)> {
        auth.authorize_admin()?;

        let processed = self
            .repo
            .find_processed_by_id(id)
            .await?
            .ok_or_else(|| DomainError::EntityNotFound("Complaint".to_string(), id))?;

        let to = state_machine::transition(&processed, &request)?;
        let reason = request.reason.as_deref().map(str::trim);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Domain(DbError::from(e).into()))?;
        self.repo
            .persist_status_transition(id, processed.status, to, reason, &mut tx)
            .await?;

        // Terminal states free the assigned staff member when this complaint
        // is their active work; a queued assignment releases nothing.
        // Resolution also credits them with the completion.
        if to.is_terminal() {
            if let Some(staff_id) = processed.assigned_staff_id {
                let released = self
                    .staff_repo
                    .release(staff_id, id, to == ComplaintStatus::Resolved, &mut tx)
                    .await?;
                if released {
                    log::info!("staff {} released by terminal complaint {}", staff_id, id);
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::Domain(DbError::from(e).into()))?;

        let complaint = self.repo.find_merged_by_id(id).await?;
        let event = ComplaintEvent::StatusChanged {
            to,
            locality: complaint.address.locality.clone(),
            on: Utc::now().date_naive(),
        };
        Ok((complaint, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::complaint::repository::SqliteComplaintRepository;
    use crate::domains::complaint::types::{Address, Category};
    use crate::domains::staff::repository::SqliteStaffRepository;
    use crate::domains::staff::types::{NewStaff, StaffRole, StaffStatus};
    use crate::types::UserRole;

    async fn service() -> (ComplaintServiceImpl, Arc<SqliteStaffRepository>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let pool = db::init_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let staff_repo = Arc::new(SqliteStaffRepository::new(pool.clone()));
        let repo = Arc::new(SqliteComplaintRepository::new(pool.clone()));
        (
            ComplaintServiceImpl::new(pool, repo, staff_repo.clone()),
            staff_repo,
        )
    }

    fn citizen() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), UserRole::Citizen)
    }

    fn admin() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), UserRole::Admin)
    }

    fn new_complaint(submitter: Uuid) -> NewComplaint {
        NewComplaint {
            submitter_id: submitter,
            title: "Transformer sparking".to_string(),
            category: Category::Electricity,
            description: Some("Sparks visible from the pole transformer near the market".to_string()),
            address: Address {
                line1: "45 Market Road".to_string(),
                line2: None,
                locality: "Pune".to_string(),
                region: "Maharashtra".to_string(),
                pincode: "411002".to_string(),
            },
            images: vec!["spark.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn test_submit_runs_triage_and_merges() {
        let (service, _) = service().await;
        let auth = citizen();
        let (complaint, event) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();

        assert_eq!(complaint.status, ComplaintStatus::Submitted);
        // 5.5 base + 1.5 photo + length bonus pushes well past the threshold
        assert!(complaint.admin_visible);
        assert_eq!(complaint.recommended_role, Some(StaffRole::Electrician));
        assert_eq!(
            event,
            ComplaintEvent::Submitted {
                locality: "Pune".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_submit_synthesizes_placeholder_for_photo_only() {
        let (service, _) = service().await;
        let auth = citizen();
        let mut new = new_complaint(auth.user_id);
        new.description = None;
        let (complaint, _) = service.submit(new, &auth).await.unwrap();
        assert_eq!(complaint.description, "Transformer sparking (photo evidence)");
    }

    #[tokio::test]
    async fn test_submit_for_another_citizen_is_denied() {
        let (service, _) = service().await;
        let result = service
            .submit(new_complaint(Uuid::new_v4()), &citizen())
            .await;
        assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_triage_is_idempotent() {
        let (service, _) = service().await;
        let auth = citizen();
        let (complaint, _) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();

        let system = AuthContext::internal_system_context();
        let first = service.triage_complaint(complaint.id, &system).await.unwrap();
        let second = service.triage_complaint(complaint.id, &system).await.unwrap();
        assert_eq!(first.priority_score, second.priority_score);
        assert_eq!(second.status, ComplaintStatus::Submitted);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_transition() {
        let (service, _) = service().await;
        let auth = citizen();
        let (complaint, _) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();

        let result = service
            .transition_status(
                complaint.id,
                TransitionRequest {
                    to: ComplaintStatus::Verified,
                    actor_role: UserRole::Citizen,
                    reason: None,
                },
                &auth,
            )
            .await;
        assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_reject_requires_reason_and_records_it() {
        let (service, _) = service().await;
        let auth = citizen();
        let (complaint, _) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();
        let admin = admin();

        let missing = service
            .transition_status(
                complaint.id,
                TransitionRequest {
                    to: ComplaintStatus::Rejected,
                    actor_role: admin.role,
                    reason: None,
                },
                &admin,
            )
            .await;
        assert!(missing.is_err());

        let (rejected, event) = service
            .transition_status(
                complaint.id,
                TransitionRequest {
                    to: ComplaintStatus::Rejected,
                    actor_role: admin.role,
                    reason: Some("duplicate report".to_string()),
                },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, ComplaintStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("duplicate report"));
        assert!(matches!(
            event,
            ComplaintEvent::StatusChanged {
                to: ComplaintStatus::Rejected,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_terminal_transition_releases_staff() {
        let (service, staff_repo) = service().await;
        let auth = citizen();
        let (complaint, _) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();
        let admin = admin();

        let staff = staff_repo
            .create(&NewStaff {
                full_name: "Meera Joshi".to_string(),
                role: StaffRole::Electrician,
                assigned_zone: "Pune".to_string(),
                performance_rating: 4.0,
                contact_number: None,
            })
            .await
            .unwrap();

        // Wire up an active assignment directly through the repositories
        let mut tx = service.pool.begin().await.unwrap();
        staff_repo.try_claim(staff.id, complaint.id, &mut tx).await.unwrap();
        service
            .repo
            .set_assigned_staff(complaint.id, staff.id, &mut tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let (resolved, _) = service
            .transition_status(
                complaint.id,
                TransitionRequest {
                    to: ComplaintStatus::Resolved,
                    actor_role: admin.role,
                    reason: None,
                },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, ComplaintStatus::Resolved);

        let released = staff_repo.find_by_id(staff.id).await.unwrap();
        assert_eq!(released.status, StaffStatus::Available);
        assert_eq!(released.current_assignment_id, None);
        assert_eq!(released.complaints_handled, 1);
    }

    #[tokio::test]
    async fn test_resolving_queued_work_spares_the_active_assignment() {
        let (service, staff_repo) = service().await;
        let auth = citizen();
        let (active, _) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();
        let (queued, _) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();
        let admin = admin();

        let staff = staff_repo
            .create(&NewStaff {
                full_name: "Kavita Rao".to_string(),
                role: StaffRole::Electrician,
                assigned_zone: "Pune".to_string(),
                performance_rating: 4.4,
                contact_number: None,
            })
            .await
            .unwrap();

        // Actively claimed for `active`, merely queued for `queued`
        let mut tx = service.pool.begin().await.unwrap();
        staff_repo.try_claim(staff.id, active.id, &mut tx).await.unwrap();
        service
            .repo
            .set_assigned_staff(active.id, staff.id, &mut tx)
            .await
            .unwrap();
        service
            .repo
            .set_assigned_staff(queued.id, staff.id, &mut tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let (resolved, _) = service
            .transition_status(
                queued.id,
                TransitionRequest {
                    to: ComplaintStatus::Resolved,
                    actor_role: admin.role,
                    reason: None,
                },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, ComplaintStatus::Resolved);

        // Closing queued work neither frees the staff member nor credits them
        let staff = staff_repo.find_by_id(staff.id).await.unwrap();
        assert_eq!(staff.status, StaffStatus::Busy);
        assert_eq!(staff.current_assignment_id, Some(active.id));
        assert_eq!(staff.complaints_handled, 0);
    }

    #[tokio::test]
    async fn test_resolved_is_terminal() {
        let (service, staff_repo) = service().await;
        let auth = citizen();
        let (complaint, _) = service
            .submit(new_complaint(auth.user_id), &auth)
            .await
            .unwrap();
        let admin = admin();

        let staff = staff_repo
            .create(&NewStaff {
                full_name: "Arun Nair".to_string(),
                role: StaffRole::Electrician,
                assigned_zone: "Pune".to_string(),
                performance_rating: 3.5,
                contact_number: None,
            })
            .await
            .unwrap();
        let mut tx = service.pool.begin().await.unwrap();
        staff_repo.try_claim(staff.id, complaint.id, &mut tx).await.unwrap();
        service
            .repo
            .set_assigned_staff(complaint.id, staff.id, &mut tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        service
            .transition_status(
                complaint.id,
                TransitionRequest {
                    to: ComplaintStatus::Resolved,
                    actor_role: admin.role,
                    reason: None,
                },
                &admin,
            )
            .await
            .unwrap();

        let again = service
            .transition_status(
                complaint.id,
                TransitionRequest {
                    to: ComplaintStatus::Verified,
                    actor_role: admin.role,
                    reason: None,
                },
                &admin,
            )
            .await;
        assert!(matches!(
            again,
            Err(ServiceError::Domain(DomainError::IllegalTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_citizen_listing_is_scoped_to_own_complaints() {
        let (service, _) = service().await;
        let first = citizen();
        let second = citizen();
        service.submit(new_complaint(first.user_id), &first).await.unwrap();
        service.submit(new_complaint(second.user_id), &second).await.unwrap();

        let mine = service
            .list_complaints(ComplaintFilter::default(), PaginationParams::default(), &first)
            .await
            .unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.items[0].submitter_id, first.user_id);

        let all = service
            .list_complaints(ComplaintFilter::default(), PaginationParams::default(), &admin())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
    }
}
