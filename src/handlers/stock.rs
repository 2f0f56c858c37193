use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::services::stock_query::{StockFilter, StockView};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub warehouse_id: Option<Uuid>,
    pub type_component_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockRecordView {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_in_stock: i32,
    pub quantity_reserved: i32,
    /// `quantity_in_stock - quantity_reserved`, floored at zero
    pub quantity_available: i32,
}

impl From<StockView> for StockRecordView {
    fn from(view: StockView) -> Self {
        Self {
            id: view.id,
            warehouse_id: view.warehouse_id,
            type_component_id: view.type_component_id,
            quantity_in_stock: view.quantity_in_stock,
            quantity_reserved: view.quantity_reserved,
            quantity_available: view.quantity_available,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockListQuery),
    responses(
        (status = 200, description = "Stock records listed", body = ApiResponse<PaginatedResponse<StockRecordView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<StockListQuery>,
) -> ApiResult<PaginatedResponse<StockRecordView>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .services
        .stock
        .list_stock(
            auth.company_id,
            StockFilter {
                warehouse_id: query.warehouse_id,
                type_component_id: query.type_component_id,
            },
            page,
            limit,
        )
        .await?;

    let items: Vec<StockRecordView> = records.into_iter().map(StockRecordView::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}
