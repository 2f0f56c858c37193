//! Read-side stock queries.
//!
//! Plain paginated reads over `stock_records`; nothing here mutates
//! quantities, so no locking is involved.

use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::stock_record::{self, Entity as StockRecordEntity};
use crate::entities::warehouse;
use crate::errors::ServiceError;

/// One stock row as presented to the API, with the derived availability.
#[derive(Debug, Clone, Serialize)]
pub struct StockView {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_in_stock: i32,
    pub quantity_reserved: i32,
    pub quantity_available: i32,
}

impl From<stock_record::Model> for StockView {
    fn from(model: stock_record::Model) -> Self {
        let quantity_available = model.quantity_available();
        Self {
            id: model.id,
            warehouse_id: model.warehouse_id,
            type_component_id: model.type_component_id,
            quantity_in_stock: model.quantity_in_stock,
            quantity_reserved: model.quantity_reserved,
            quantity_available,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub warehouse_id: Option<Uuid>,
    pub type_component_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct StockQueryService {
    db: Arc<DatabaseConnection>,
}

impl StockQueryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists a company's stock records, highest-priority warehouses first.
    pub async fn list_stock(
        &self,
        company_id: Uuid,
        filter: StockFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<StockView>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".into(),
            ));
        }
        if limit == 0 || limit > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".into(),
            ));
        }

        let mut query = StockRecordEntity::find()
            .join(JoinType::InnerJoin, stock_record::Relation::Warehouse.def())
            .filter(warehouse::Column::CompanyId.eq(company_id));
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(stock_record::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(type_component_id) = filter.type_component_id {
            query = query.filter(stock_record::Column::TypeComponentId.eq(type_component_id));
        }

        let paginator = query
            .order_by_asc(warehouse::Column::Priority)
            .order_by_asc(stock_record::Column::TypeComponentId)
            .paginate(self.db.as_ref(), limit);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let records = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((records.into_iter().map(StockView::from).collect(), total))
    }
}
