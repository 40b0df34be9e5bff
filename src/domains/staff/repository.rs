use crate::domains::staff::types::{NewStaff, Staff, StaffFilter, StaffRow, StaffStatus};
use crate::errors::{DbError, DomainError, DomainResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, Pool, Sqlite, Transaction};
use uuid::Uuid;

const STAFF_COLUMNS: &str = "id, full_name, role, assigned_zone, status, performance_rating, \
     contact_number, current_assignment_id, complaints_handled, created_at, updated_at";

/// Trait defining staff repository operations
#[async_trait]
pub trait StaffRepository: Send + Sync {
    async fn create(&self, new_staff: &NewStaff) -> DomainResult<Staff>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Staff>;

    /// All staff matching the filter, in database order. Ranking is the
    /// matcher's concern, not the store's.
    async fn find_pool(&self, filter: &StaffFilter) -> DomainResult<Vec<Staff>>;

    /// Conditionally claim an available staff member for a complaint.
    /// Guarded on `status = 'available'`; a concurrent claim surfaces as
    /// `DbError::Conflict` and never as a double assignment.
    async fn try_claim<'t>(
        &self,
        staff_id: Uuid,
        complaint_id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()>;

    /// Return a staff member to the available pool if the given complaint
    /// is their active assignment. A queued assignee (current work pointing
    /// at another complaint) is left untouched. `completed` credits the
    /// resolution when a release actually happens. Returns whether the
    /// staff member was released.
    async fn release<'t>(
        &self,
        staff_id: Uuid,
        complaint_id: Uuid,
        completed: bool,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<bool>;

    async fn set_status(&self, staff_id: Uuid, status: StaffStatus) -> DomainResult<Staff>;
}

/// SQLite implementation for StaffRepository
#[derive(Clone)]
pub struct SqliteStaffRepository {
    pool: Pool<Sqlite>,
}

impl SqliteStaffRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for SqliteStaffRepository {
    async fn create(&self, new_staff: &NewStaff) -> DomainResult<Staff> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        query(
            "INSERT INTO staff (id, full_name, role, assigned_zone, status, performance_rating, \
             contact_number, complaints_handled, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 'available', ?, ?, 0, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&new_staff.full_name)
        .bind(new_staff.role.as_str())
        .bind(&new_staff.assigned_zone)
        .bind(new_staff.performance_rating)
        .bind(&new_staff.contact_number)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Staff> {
        let row = query_as::<_, StaffRow>(&format!(
            "SELECT {} FROM staff WHERE id = ?",
            STAFF_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("Staff".to_string(), id))?;

        row.into_entity()
    }

    async fn find_pool(&self, filter: &StaffFilter) -> DomainResult<Vec<Staff>> {
        let mut sql = format!("SELECT {} FROM staff WHERE 1=1", STAFF_COLUMNS);
        if filter.role.is_some() {
            sql.push_str(" AND role = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.zone.is_some() {
            sql.push_str(" AND assigned_zone = ?");
        }
        sql.push_str(" ORDER BY id");

        let mut q = query_as::<_, StaffRow>(&sql);
        if let Some(role) = filter.role {
            q = q.bind(role.as_str());
        }
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(zone) = &filter.zone {
            q = q.bind(zone.clone());
        }

        let rows = q.fetch_all(&self.pool).await.map_err(DbError::from)?;
        rows.into_iter().map(StaffRow::into_entity).collect()
    }

    async fn try_claim<'t>(
        &self,
        staff_id: Uuid,
        complaint_id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let result = query(
            "UPDATE staff SET status = 'busy', current_assignment_id = ?, updated_at = ? \
             WHERE id = ? AND status = 'available'",
        )
        .bind(complaint_id.to_string())
        .bind(&now)
        .bind(staff_id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Database(DbError::Conflict(format!(
                "staff {} is no longer available",
                staff_id
            ))));
        }
        Ok(())
    }

    async fn release<'t>(
        &self,
        staff_id: Uuid,
        complaint_id: Uuid,
        completed: bool,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<bool> {
        let now = Utc::now().to_rfc3339();
        // Guarded on the active assignment: zero rows means this complaint
        // was only queued against the staff member, and there is nothing
        // to release.
        let sql = if completed {
            "UPDATE staff SET status = 'available', current_assignment_id = NULL, \
             complaints_handled = complaints_handled + 1, updated_at = ? \
             WHERE id = ? AND current_assignment_id = ?"
        } else {
            "UPDATE staff SET status = 'available', current_assignment_id = NULL, \
             updated_at = ? WHERE id = ? AND current_assignment_id = ?"
        };
        let result = query(sql)
            .bind(&now)
            .bind(staff_id.to_string())
            .bind(complaint_id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, staff_id: Uuid, status: StaffStatus) -> DomainResult<Staff> {
        let now = Utc::now().to_rfc3339();
        let result = query("UPDATE staff SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&now)
            .bind(staff_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Staff".to_string(), staff_id));
        }
        self.find_by_id(staff_id).await
    }
}
