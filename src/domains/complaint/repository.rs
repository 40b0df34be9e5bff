use crate::domains::complaint::triage::TriageResult;
use crate::domains::complaint::types::{
    Complaint, ComplaintFilter, ComplaintStatus, NewComplaint, ProcessedComplaint,
    ProcessedComplaintRow, RawComplaint, RawComplaintRow,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, Pool, Sqlite, Transaction};
use uuid::Uuid;

const RAW_COLUMNS: &str = "id, submitter_id, title, category, description, address_line_1, \
     address_line_2, city, state, pincode, images, status, created_at";

const PROCESSED_COLUMNS: &str = "id, priority_score, admin_visible, recommended_role, \
     complaint_status, assigned_staff_id, rejection_reason, updated_at";

/// Trait defining complaint repository operations
#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// Insert a raw complaint. `description` is the final text, placeholder
    /// synthesis included; the DTO's optional field is already resolved.
    async fn create_raw(&self, new: &NewComplaint, description: &str) -> DomainResult<RawComplaint>;

    async fn find_raw_by_id(&self, id: Uuid) -> DomainResult<RawComplaint>;

    async fn find_processed_by_id(&self, id: Uuid) -> DomainResult<Option<ProcessedComplaint>>;

    /// Merged raw + processed view; pre-triage complaints read as analyzing.
    async fn find_merged_by_id(&self, id: Uuid) -> DomainResult<Complaint>;

    async fn list_merged(
        &self,
        filter: &ComplaintFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Complaint>>;

    /// Write the triage outcome: insert (or refresh) the processed row and
    /// mark the raw layer processed. Re-running triage refreshes the derived
    /// attributes without touching lifecycle state.
    async fn persist_triage_result(
        &self,
        id: Uuid,
        result: &TriageResult,
    ) -> DomainResult<ProcessedComplaint>;

    /// Apply a status change guarded on the expected prior status. A
    /// concurrent transition surfaces as `DbError::Conflict`.
    async fn persist_status_transition<'t>(
        &self,
        id: Uuid,
        from: ComplaintStatus,
        to: ComplaintStatus,
        rejection_reason: Option<&str>,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()>;

    /// Record the assigned staff member on the processed row.
    async fn set_assigned_staff<'t>(
        &self,
        id: Uuid,
        staff_id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()>;
}

/// SQLite implementation for ComplaintRepository
#[derive(Clone)]
pub struct SqliteComplaintRepository {
    pool: Pool<Sqlite>,
}

impl SqliteComplaintRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn find_raw_row(&self, id: Uuid) -> DomainResult<RawComplaintRow> {
        query_as::<_, RawComplaintRow>(&format!(
            "SELECT {} FROM raw_complaints WHERE id = ?",
            RAW_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("Complaint".to_string(), id))
    }
}

#[async_trait]
impl ComplaintRepository for SqliteComplaintRepository {
    async fn create_raw(&self, new: &NewComplaint, description: &str) -> DomainResult<RawComplaint> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let images = serde_json::to_string(&new.images)
            .map_err(|e| DomainError::Internal(format!("Failed to serialize images: {}", e)))?;

        query(
            "INSERT INTO raw_complaints (id, submitter_id, title, category, description, \
             address_line_1, address_line_2, city, state, pincode, images, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending_analysis', ?)",
        )
        .bind(id.to_string())
        .bind(new.submitter_id.to_string())
        .bind(&new.title)
        .bind(new.category.as_str())
        .bind(description)
        .bind(&new.address.line1)
        .bind(&new.address.line2)
        .bind(&new.address.locality)
        .bind(&new.address.region)
        .bind(&new.address.pincode)
        .bind(&images)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_raw_by_id(id).await
    }

    async fn find_raw_by_id(&self, id: Uuid) -> DomainResult<RawComplaint> {
        self.find_raw_row(id).await?.into_entity()
    }

    async fn find_processed_by_id(&self, id: Uuid) -> DomainResult<Option<ProcessedComplaint>> {
        let row = query_as::<_, ProcessedComplaintRow>(&format!(
            "SELECT {} FROM processed_complaints WHERE id = ?",
            PROCESSED_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        match row {
            Some(row) => Ok(Some(row.into_entity()?)),
            None => Ok(None),
        }
    }

    async fn find_merged_by_id(&self, id: Uuid) -> DomainResult<Complaint> {
        let raw = self.find_raw_by_id(id).await?;
        let processed = self.find_processed_by_id(id).await?;
        Ok(Complaint::merge(raw, processed))
    }

    async fn list_merged(
        &self,
        filter: &ComplaintFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Complaint>> {
        let mut conditions = String::new();
        match filter.status {
            // Pre-triage complaints have no processed row yet
            Some(ComplaintStatus::Analyzing) => {
                conditions.push_str(" AND p.id IS NULL");
            }
            Some(_) => conditions.push_str(" AND p.complaint_status = ?"),
            None => {}
        }
        if filter.category.is_some() {
            conditions.push_str(" AND r.category = ?");
        }
        if filter.admin_visible_only {
            conditions.push_str(" AND p.admin_visible = 1");
        }
        if filter.submitter_id.is_some() {
            conditions.push_str(" AND r.submitter_id = ?");
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM raw_complaints r \
             LEFT JOIN processed_complaints p ON p.id = r.id WHERE 1=1{}",
            conditions
        );
        let list_sql = format!(
            "SELECT r.id FROM raw_complaints r \
             LEFT JOIN processed_complaints p ON p.id = r.id WHERE 1=1{} \
             ORDER BY COALESCE(p.priority_score, 0.0) DESC, r.created_at DESC \
             LIMIT ? OFFSET ?",
            conditions
        );

        let mut count_q = query_scalar::<_, i64>(&count_sql);
        let mut list_q = query_scalar::<_, String>(&list_sql);
        if let Some(status) = filter.status {
            if status != ComplaintStatus::Analyzing {
                count_q = count_q.bind(status.as_str());
                list_q = list_q.bind(status.as_str());
            }
        }
        if let Some(category) = filter.category {
            count_q = count_q.bind(category.as_str());
            list_q = list_q.bind(category.as_str());
        }
        if let Some(submitter_id) = filter.submitter_id {
            count_q = count_q.bind(submitter_id.to_string());
            list_q = list_q.bind(submitter_id.to_string());
        }

        let total = count_q.fetch_one(&self.pool).await.map_err(DbError::from)? as u64;
        let ids = list_q
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let id = Uuid::parse_str(&id).map_err(|_| DomainError::InvalidUuid(id.clone()))?;
            items.push(self.find_merged_by_id(id).await?);
        }

        Ok(PaginatedResult::new(items, total, params))
    }

    async fn persist_triage_result(
        &self,
        id: Uuid,
        result: &TriageResult,
    ) -> DomainResult<ProcessedComplaint> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Verify the raw layer exists before deriving from it
        let exists = query_scalar::<_, i64>("SELECT COUNT(*) FROM raw_complaints WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        if exists == 0 {
            return Err(DomainError::EntityNotFound("Complaint".to_string(), id));
        }

        query(
            "INSERT INTO processed_complaints \
             (id, priority_score, admin_visible, recommended_role, complaint_status, updated_at) \
             VALUES (?, ?, ?, ?, 'submitted', ?) \
             ON CONFLICT(id) DO UPDATE SET \
             priority_score = excluded.priority_score, \
             admin_visible = excluded.admin_visible, \
             recommended_role = excluded.recommended_role, \
             updated_at = excluded.updated_at",
        )
        .bind(id.to_string())
        .bind(result.priority_score)
        .bind(result.admin_visible as i64)
        .bind(result.recommended_role.map(|r| r.as_str()))
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        query("UPDATE raw_complaints SET status = 'processed' WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        self.find_processed_by_id(id)
            .await?
            .ok_or_else(|| DomainError::EntityNotFound("Complaint".to_string(), id))
    }

    async fn persist_status_transition<'t>(
        &self,
        id: Uuid,
        from: ComplaintStatus,
        to: ComplaintStatus,
        rejection_reason: Option<&str>,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let result = query(
            "UPDATE processed_complaints SET complaint_status = ?, rejection_reason = ?, \
             updated_at = ? WHERE id = ? AND complaint_status = ?",
        )
        .bind(to.as_str())
        .bind(rejection_reason)
        .bind(&now)
        .bind(id.to_string())
        .bind(from.as_str())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Database(DbError::Conflict(format!(
                "complaint {} is no longer in status '{}'",
                id, from
            ))));
        }
        Ok(())
    }

    async fn set_assigned_staff<'t>(
        &self,
        id: Uuid,
        staff_id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        // Guarded on an assignable status: a transition committed after the
        // caller's read must not attach staff to a closed complaint.
        let result = query(
            "UPDATE processed_complaints SET assigned_staff_id = ?, updated_at = ? \
             WHERE id = ? AND complaint_status IN ('submitted', 'verified')",
        )
        .bind(staff_id.to_string())
        .bind(&now)
        .bind(id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Database(DbError::Conflict(format!(
                "complaint {} can no longer accept an assignment",
                id
            ))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::complaint::types::{Address, Category};

    async fn repo() -> SqliteComplaintRepository {
        let pool = db::init_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        SqliteComplaintRepository::new(pool)
    }

    async fn triaged_complaint(repo: &SqliteComplaintRepository) -> Uuid {
        let new = NewComplaint {
            submitter_id: Uuid::new_v4(),
            title: "Overflowing drain".to_string(),
            category: Category::Drainage,
            description: Some("Backs up onto the footpath".to_string()),
            address: Address {
                line1: "12 Canal Street".to_string(),
                line2: None,
                locality: "Pune".to_string(),
                region: "Maharashtra".to_string(),
                pincode: "411001".to_string(),
            },
            images: vec![],
        };
        let raw = repo
            .create_raw(&new, "Backs up onto the footpath")
            .await
            .unwrap();
        let result = crate::domains::complaint::triage::triage(&raw);
        repo.persist_triage_result(raw.id, &result).await.unwrap();
        raw.id
    }

    #[tokio::test]
    async fn test_closed_complaints_refuse_new_assignments() {
        let repo = repo().await;
        let id = triaged_complaint(&repo).await;

        let mut tx = repo.pool().begin().await.unwrap();
        repo.persist_status_transition(
            id,
            ComplaintStatus::Submitted,
            ComplaintStatus::Rejected,
            Some("duplicate report"),
            &mut tx,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let mut tx = repo.pool().begin().await.unwrap();
        let result = repo.set_assigned_staff(id, Uuid::new_v4(), &mut tx).await;
        assert!(matches!(
            result,
            Err(DomainError::Database(DbError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn test_assignable_statuses_accept_an_assignment() {
        let repo = repo().await;
        let id = triaged_complaint(&repo).await;
        let staff_id = Uuid::new_v4();

        let mut tx = repo.pool().begin().await.unwrap();
        repo.set_assigned_staff(id, staff_id, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let processed = repo.find_processed_by_id(id).await.unwrap().unwrap();
        assert_eq!(processed.assigned_staff_id, Some(staff_id));
    }
}
