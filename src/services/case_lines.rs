//! Case-line status propagation.
//!
//! The repair-case domain is an external collaborator; the parts workflow only
//! pushes status transitions (WAITING_FOR_PARTS, PARTS_AVAILABLE,
//! REJECTED_BY_OEM) onto originating case lines. The trait keeps the workflow
//! testable with a fake.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};
use tracing::debug;
use uuid::Uuid;

use crate::entities::case_line::{self, CaseLineStatus, Entity as CaseLineEntity};
use crate::errors::ServiceError;

#[async_trait]
pub trait CaseLineSync: Send + Sync {
    /// Sets `status` on every listed case line, inside the caller's
    /// transaction. An empty id list is a no-op.
    async fn bulk_update_status(
        &self,
        txn: &DatabaseTransaction,
        case_line_ids: &[Uuid],
        status: CaseLineStatus,
    ) -> Result<(), ServiceError>;
}

/// Default implementation over the `case_lines` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmCaseLineSync;

#[async_trait]
impl CaseLineSync for SeaOrmCaseLineSync {
    async fn bulk_update_status(
        &self,
        txn: &DatabaseTransaction,
        case_line_ids: &[Uuid],
        status: CaseLineStatus,
    ) -> Result<(), ServiceError> {
        if case_line_ids.is_empty() {
            return Ok(());
        }
        debug!(count = case_line_ids.len(), status = status.as_str(), "Syncing case line statuses");
        CaseLineEntity::update_many()
            .col_expr(case_line::Column::Status, Expr::value(status.as_str()))
            .col_expr(case_line::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(case_line::Column::Id.is_in(case_line_ids.iter().copied()))
            .exec(txn)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }
}
