//! Reservation bookkeeping.
//!
//! Owns the `stock_reservations` rows tied to transfer request items. The
//! workflow is the only caller and always pairs these operations with the
//! matching stock-ledger counter-operation inside one transaction: a
//! reservation row is never created without `StockLedger::reserve`, never
//! cancelled without `unreserve`, never shipped without `ship`.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QuerySelect, RelationTrait, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::stock_reservation::{
    self, Entity as StockReservationEntity, ReservationStatus,
};
use crate::entities::stock_transfer_request_item;
use crate::errors::ServiceError;
use crate::services::allocation::Allocation;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReservationLedger;

impl ReservationLedger {
    pub fn new() -> Self {
        Self
    }

    /// Creates one RESERVED reservation row per allocation entry, all claiming
    /// stock for `transfer_item_id`.
    #[instrument(skip(self, txn, allocations))]
    pub async fn create_many(
        &self,
        txn: &DatabaseTransaction,
        allocations: &[Allocation],
        transfer_item_id: Uuid,
    ) -> Result<Vec<stock_reservation::Model>, ServiceError> {
        let mut created = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let active = stock_reservation::ActiveModel {
                stock_record_id: Set(allocation.stock_id),
                transfer_item_id: Set(transfer_item_id),
                quantity_reserved: Set(allocation.quantity),
                status: Set(ReservationStatus::Reserved.as_str().to_string()),
                ..Default::default()
            };
            created.push(active.insert(txn).await.map_err(ServiceError::db_error)?);
        }
        Ok(created)
    }

    /// Loads a reservation under `FOR UPDATE`; ship-side validation reads its
    /// quantity and status afterwards.
    pub async fn find_locked(
        &self,
        txn: &DatabaseTransaction,
        reservation_id: Uuid,
    ) -> Result<stock_reservation::Model, ServiceError> {
        StockReservationEntity::find_by_id(reservation_id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Reservation {} not found", reservation_id))
            })
    }

    /// Sets the given reservations to SHIPPED. The caller owns the matching
    /// `StockLedger::ship` calls.
    #[instrument(skip(self, txn))]
    pub async fn mark_shipped(
        &self,
        txn: &DatabaseTransaction,
        reservation_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        self.set_status(txn, reservation_ids, ReservationStatus::Shipped)
            .await
    }

    /// Sets the given reservations to CANCELLED. The caller owns the matching
    /// `StockLedger::unreserve` calls.
    #[instrument(skip(self, txn))]
    pub async fn cancel(
        &self,
        txn: &DatabaseTransaction,
        reservation_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        self.set_status(txn, reservation_ids, ReservationStatus::Cancelled)
            .await
    }

    async fn set_status(
        &self,
        txn: &DatabaseTransaction,
        reservation_ids: &[Uuid],
        status: ReservationStatus,
    ) -> Result<(), ServiceError> {
        if reservation_ids.is_empty() {
            return Ok(());
        }
        StockReservationEntity::update_many()
            .col_expr(
                stock_reservation::Column::Status,
                Expr::value(status.as_str()),
            )
            .col_expr(
                stock_reservation::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(stock_reservation::Column::Id.is_in(reservation_ids.iter().copied()))
            .exec(txn)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    /// Reservations belonging to a transfer request, filtered by status.
    /// The default view is RESERVED-only: what still awaits shipment.
    pub async fn find_by_request(
        &self,
        txn: &DatabaseTransaction,
        request_id: Uuid,
        statuses: Option<&[ReservationStatus]>,
    ) -> Result<Vec<stock_reservation::Model>, ServiceError> {
        let statuses = statuses.unwrap_or(&[ReservationStatus::Reserved]);
        StockReservationEntity::find()
            .join(
                JoinType::InnerJoin,
                stock_reservation::Relation::TransferItem.def(),
            )
            .filter(stock_transfer_request_item::Column::RequestId.eq(request_id))
            .filter(
                stock_reservation::Column::Status
                    .is_in(statuses.iter().map(|s| s.as_str())),
            )
            .all(txn)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Number of reservations on a request still awaiting shipment; zero means
    /// the last reservation just shipped and the request itself can move on.
    pub async fn count_reserved_by_request(
        &self,
        txn: &DatabaseTransaction,
        request_id: Uuid,
    ) -> Result<u64, ServiceError> {
        StockReservationEntity::find()
            .join(
                JoinType::InnerJoin,
                stock_reservation::Relation::TransferItem.def(),
            )
            .filter(stock_transfer_request_item::Column::RequestId.eq(request_id))
            .filter(stock_reservation::Column::Status.eq(ReservationStatus::Reserved.as_str()))
            .count(txn)
            .await
            .map_err(ServiceError::db_error)
    }
}
