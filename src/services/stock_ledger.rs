//! Stock quantity bookkeeping.
//!
//! Every operation takes the caller's open `DatabaseTransaction` — the ledger
//! is never used outside one, because a crash between a reservation row write
//! and the matching counter update must roll both back together. Each
//! operation re-reads its stock record under a row lock before acting on the
//! quantities.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::stock_record::{self, Entity as StockRecordEntity};
use crate::errors::ServiceError;

/// Atomic adjustment operations over `stock_records` rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockLedger;

impl StockLedger {
    pub fn new() -> Self {
        Self
    }

    /// Loads a stock record under `FOR UPDATE` so concurrent adjustments
    /// serialize on the row.
    async fn find_locked(
        &self,
        txn: &DatabaseTransaction,
        stock_id: Uuid,
    ) -> Result<stock_record::Model, ServiceError> {
        StockRecordEntity::find_by_id(stock_id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock record {} not found", stock_id)))
    }

    fn check_positive(delta: i32, operation: &str) -> Result<(), ServiceError> {
        if delta <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "{} quantity must be positive, got {}",
                operation, delta
            )));
        }
        Ok(())
    }

    /// `quantity_reserved += delta`. Fails with Conflict if the result would
    /// exceed `quantity_in_stock` (over-reservation).
    #[instrument(skip(self, txn))]
    pub async fn reserve(
        &self,
        txn: &DatabaseTransaction,
        stock_id: Uuid,
        delta: i32,
    ) -> Result<stock_record::Model, ServiceError> {
        Self::check_positive(delta, "Reserve")?;
        let stock = self.find_locked(txn, stock_id).await?;

        let new_reserved = stock.quantity_reserved + delta;
        if new_reserved > stock.quantity_in_stock {
            return Err(ServiceError::Conflict(format!(
                "Reserving {} units on stock {} would exceed quantity in stock ({} reserved, {} in stock)",
                delta, stock_id, stock.quantity_reserved, stock.quantity_in_stock
            )));
        }

        let mut active: stock_record::ActiveModel = stock.into();
        active.quantity_reserved = Set(new_reserved);
        active.update(txn).await.map_err(ServiceError::db_error)
    }

    /// `quantity_reserved -= delta`. A negative result indicates a bookkeeping
    /// bug upstream and fails with Conflict rather than clamping.
    #[instrument(skip(self, txn))]
    pub async fn unreserve(
        &self,
        txn: &DatabaseTransaction,
        stock_id: Uuid,
        delta: i32,
    ) -> Result<stock_record::Model, ServiceError> {
        Self::check_positive(delta, "Unreserve")?;
        let stock = self.find_locked(txn, stock_id).await?;

        let new_reserved = stock.quantity_reserved - delta;
        if new_reserved < 0 {
            return Err(ServiceError::Conflict(format!(
                "Unreserving {} units on stock {} would drive quantity_reserved negative ({} reserved)",
                delta, stock_id, stock.quantity_reserved
            )));
        }

        let mut active: stock_record::ActiveModel = stock.into();
        active.quantity_reserved = Set(new_reserved);
        active.update(txn).await.map_err(ServiceError::db_error)
    }

    /// Shipment consumes on-hand and reserved quantity together: the units
    /// leave the source warehouse entirely.
    #[instrument(skip(self, txn))]
    pub async fn ship(
        &self,
        txn: &DatabaseTransaction,
        stock_id: Uuid,
        delta: i32,
    ) -> Result<stock_record::Model, ServiceError> {
        Self::check_positive(delta, "Ship")?;
        let stock = self.find_locked(txn, stock_id).await?;

        let new_in_stock = stock.quantity_in_stock - delta;
        let new_reserved = stock.quantity_reserved - delta;
        if new_in_stock < 0 || new_reserved < 0 {
            return Err(ServiceError::Conflict(format!(
                "Shipping {} units from stock {} is inconsistent with its quantities ({} in stock, {} reserved)",
                delta, stock_id, stock.quantity_in_stock, stock.quantity_reserved
            )));
        }

        let mut active: stock_record::ActiveModel = stock.into();
        active.quantity_in_stock = Set(new_in_stock);
        active.quantity_reserved = Set(new_reserved);
        active.update(txn).await.map_err(ServiceError::db_error)
    }

    /// Adds received quantity at the destination warehouse, creating the
    /// (warehouse, component type) stock record on first receipt.
    #[instrument(skip(self, txn))]
    pub async fn receive(
        &self,
        txn: &DatabaseTransaction,
        warehouse_id: Uuid,
        type_component_id: Uuid,
        delta: i32,
    ) -> Result<stock_record::Model, ServiceError> {
        Self::check_positive(delta, "Receive")?;

        let existing = StockRecordEntity::find()
            .filter(stock_record::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_record::Column::TypeComponentId.eq(type_component_id))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?;

        match existing {
            Some(stock) => {
                let new_in_stock = stock.quantity_in_stock + delta;
                let mut active: stock_record::ActiveModel = stock.into();
                active.quantity_in_stock = Set(new_in_stock);
                active.update(txn).await.map_err(ServiceError::db_error)
            }
            None => {
                let active = stock_record::ActiveModel {
                    warehouse_id: Set(warehouse_id),
                    type_component_id: Set(type_component_id),
                    quantity_in_stock: Set(delta),
                    quantity_reserved: Set(0),
                    ..Default::default()
                };
                active.insert(txn).await.map_err(ServiceError::db_error)
            }
        }
    }
}
