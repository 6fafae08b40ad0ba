use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use crate::leave::range::DateRange;
use crate::model::approval::{ApprovalRecord, NewApprovalRecord};
use crate::model::approval_level::ApprovalLevel;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::leave_type::LeaveType;
use crate::model::status::StatusCode;
use crate::repository::{LeaveStore, LeaveUnitOfWork, RepositoryError, RequestFilter};

const REQUEST_COLUMNS: &str = r#"
    id, employee_id, leave_type_id, start_date, end_date, status_id,
    seen_at, cancellation_requested, created_at
"#;

const APPROVAL_COLUMNS: &str = r#"
    id, leave_request_id, level, approver_id, approved, automatic, note, created_at
"#;

#[derive(FromRow)]
struct LeaveTypeRow {
    id: u64,
    name: String,
    max_duration_ms: Option<i64>,
    resets_yearly: bool,
}

impl From<LeaveTypeRow> for LeaveType {
    fn from(row: LeaveTypeRow) -> Self {
        LeaveType {
            id: row.id,
            name: row.name,
            max_duration_ms: row.max_duration_ms,
            resets_yearly: row.resets_yearly,
        }
    }
}

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    leave_type_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status_id: u8,
    seen_at: Option<DateTime<Utc>>,
    cancellation_requested: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = RepositoryError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let status = StatusCode::from_id(row.status_id).ok_or_else(|| {
            RepositoryError::Decode(format!(
                "leave request {} has unknown status id {}",
                row.id, row.status_id
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type_id: row.leave_type_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            seen_at: row.seen_at,
            cancellation_requested: row.cancellation_requested,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ApprovalRow {
    id: u64,
    leave_request_id: u64,
    level: u8,
    approver_id: u64,
    approved: bool,
    automatic: bool,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApprovalRow> for ApprovalRecord {
    type Error = RepositoryError;

    fn try_from(row: ApprovalRow) -> Result<Self, Self::Error> {
        let level = ApprovalLevel::from_order(row.level).ok_or_else(|| {
            RepositoryError::Decode(format!(
                "approval {} has unknown level {}",
                row.id, row.level
            ))
        })?;

        Ok(ApprovalRecord {
            id: row.id,
            leave_request_id: row.leave_request_id,
            level,
            approver_id: row.approver_id,
            approved: row.approved,
            automatic: row.automatic,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

fn decode_requests(rows: Vec<LeaveRequestRow>) -> Result<Vec<LeaveRequest>, RepositoryError> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

fn decode_approvals(rows: Vec<ApprovalRow>) -> Result<Vec<ApprovalRecord>, RepositoryError> {
    rows.into_iter().map(ApprovalRecord::try_from).collect()
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    U8(u8),
}

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn find_leave_type(&self, id: u64) -> Result<Option<LeaveType>, RepositoryError> {
        let row = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT id, name, max_duration_ms, resets_yearly
            FROM leave_types
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LeaveType::from))
    }

    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, RepositoryError> {
        let rows = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT id, name, max_duration_ms, resets_yearly
            FROM leave_types
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LeaveType::from).collect())
    }

    async fn find_request(&self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ? AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LeaveRequest::try_from).transpose()
    }

    async fn approved_requests(
        &self,
        employee_id: u64,
        leave_type_id: Option<u64>,
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let mut sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND status_id = ? AND deleted_at IS NULL"
        );
        if leave_type_id.is_some() {
            sql.push_str(" AND leave_type_id = ?");
        }

        let mut query = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(employee_id)
            .bind(StatusCode::Approved.id());
        if let Some(leave_type_id) = leave_type_id {
            query = query.bind(leave_type_id);
        }

        decode_requests(query.fetch_all(&self.pool).await?)
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64), RepositoryError> {
        let mut where_sql = String::from(" WHERE deleted_at IS NULL");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        if let Some(status) = filter.status {
            where_sql.push_str(" AND status_id = ?");
            args.push(FilterValue::U8(status.id()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::U8(v) => count_q.bind(*v),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, LeaveRequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::U8(v) => data_q.bind(v),
            };
        }
        let rows = data_q
            .bind(filter.per_page)
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((decode_requests(rows)?, total))
    }

    async fn approvals_for(&self, request_id: u64) -> Result<Vec<ApprovalRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {APPROVAL_COLUMNS} FROM leave_approvals WHERE leave_request_id = ? ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ApprovalRow>(&sql)
            .bind(request_id)
            .fetch_all(&self.pool)
            .await?;

        decode_approvals(rows)
    }

    async fn insert_request(&self, request: &NewLeaveRequest) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type_id, start_date, end_date, status_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(StatusCode::Requested.id())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn update_request_dates(&self, id: u64, range: &DateRange) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?
            WHERE id = ?
            AND deleted_at IS NULL
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_seen(&self, id: u64, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET seen_at = ?
            WHERE id = ?
            AND seen_at IS NULL
            AND deleted_at IS NULL
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: u64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET deleted_at = NOW()
            WHERE id = ?
            AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn begin(&self) -> Result<Box<dyn LeaveUnitOfWork>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlUnitOfWork { tx }))
    }
}

/// Wraps a database transaction; sqlx rolls it back when dropped uncommitted.
pub struct MySqlUnitOfWork {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl LeaveUnitOfWork for MySqlUnitOfWork {
    async fn lock_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE id = ? AND deleted_at IS NULL FOR UPDATE"
        );
        let row = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(LeaveRequest::try_from).transpose()
    }

    async fn approvals_for(
        &mut self,
        request_id: u64,
    ) -> Result<Vec<ApprovalRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {APPROVAL_COLUMNS} FROM leave_approvals WHERE leave_request_id = ? ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ApprovalRow>(&sql)
            .bind(request_id)
            .fetch_all(&mut *self.tx)
            .await?;

        decode_approvals(rows)
    }

    async fn approved_requests(
        &mut self,
        employee_id: u64,
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND status_id = ? AND deleted_at IS NULL \
             ORDER BY id FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(employee_id)
            .bind(StatusCode::Approved.id())
            .fetch_all(&mut *self.tx)
            .await?;

        decode_requests(rows)
    }

    async fn insert_approval(&mut self, record: &NewApprovalRecord) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_approvals
                (leave_request_id, level, approver_id, approved, automatic, note)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.leave_request_id)
        .bind(record.level.order())
        .bind(record.approver_id)
        .bind(record.approved)
        .bind(record.automatic)
        .bind(record.note.as_deref())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn set_cancellation_requested(&mut self, id: u64) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE leave_requests SET cancellation_requested = TRUE WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn update_status(&mut self, id: u64, status: StatusCode) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE leave_requests SET status_id = ? WHERE id = ?")
            .bind(status.id())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
