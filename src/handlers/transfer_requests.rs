use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthContext;
use crate::entities::stock_transfer_request::{self, TransferRequestStatus};
use crate::entities::{stock_reservation, stock_transfer_request_item};
use crate::errors::ServiceError;
use crate::services::transfer_requests::{NewTransferItem, NewTransferRequest};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransferRequestListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by lifecycle status (PENDING_APPROVAL, APPROVED, SHIPPED,
    /// RECEIVED, REJECTED, CANCELLED)
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "requesting_warehouse_id": "550e8400-e29b-41d4-a716-446655440000",
    "items": [
        {
            "type_component_id": "123e4567-e89b-12d3-a456-426614174000",
            "quantity_requested": 2,
            "case_line_id": "aa0e8400-e29b-41d4-a716-446655440000"
        }
    ]
}))]
pub struct CreateTransferRequestPayload {
    /// Destination warehouse that needs the parts
    pub requesting_warehouse_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<CreateTransferItemPayload>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTransferItemPayload {
    pub type_component_id: Uuid,
    /// Number of units requested, must be positive
    #[validate(range(min = 1))]
    pub quantity_requested: i32,
    /// Case line this demand originates from, if any
    pub case_line_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "component_ids": ["bb0e8400-e29b-41d4-a716-446655440000"],
    "estimated_delivery_date": "2026-09-03T00:00:00Z"
}))]
pub struct ShipReservationPayload {
    /// Serial-tracked component units fulfilling the reservation; the count
    /// must equal the reserved quantity
    #[validate(length(min = 1))]
    pub component_ids: Vec<Uuid>,
    /// Required on the call that ships the last open reservation
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "reason": "Part superseded by revision B" }))]
pub struct RejectTransferRequestPayload {
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "reason": "Vehicle owner withdrew the repair order" }))]
pub struct CancelTransferRequestPayload {
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferRequestSummary {
    pub id: Uuid,
    pub requesting_warehouse_id: Uuid,
    pub status: String,
    pub requested_by: Uuid,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<stock_transfer_request::Model> for TransferRequestSummary {
    fn from(model: stock_transfer_request::Model) -> Self {
        Self {
            id: model.id,
            requesting_warehouse_id: model.requesting_warehouse_id,
            status: model.status,
            requested_by: model.requested_by,
            estimated_delivery_date: model.estimated_delivery_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferItemView {
    pub id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_requested: i32,
    pub case_line_id: Option<Uuid>,
}

impl From<stock_transfer_request_item::Model> for TransferItemView {
    fn from(model: stock_transfer_request_item::Model) -> Self {
        Self {
            id: model.id,
            type_component_id: model.type_component_id,
            quantity_requested: model.quantity_requested,
            case_line_id: model.case_line_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationView {
    pub id: Uuid,
    pub stock_record_id: Uuid,
    pub transfer_item_id: Uuid,
    pub quantity_reserved: i32,
    pub status: String,
}

impl From<stock_reservation::Model> for ReservationView {
    fn from(model: stock_reservation::Model) -> Self {
        Self {
            id: model.id,
            stock_record_id: model.stock_record_id,
            transfer_item_id: model.transfer_item_id,
            quantity_reserved: model.quantity_reserved,
            status: model.status,
        }
    }
}

/// Full request view returned by mutation and detail endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferRequestDetailView {
    #[serde(flatten)]
    pub request: TransferRequestSummary,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub items: Vec<TransferItemView>,
    pub reservations: Vec<ReservationView>,
}

impl From<crate::services::transfer_requests::TransferRequestDetail> for TransferRequestDetailView {
    fn from(detail: crate::services::transfer_requests::TransferRequestDetail) -> Self {
        let rejection_reason = detail.request.rejection_reason.clone();
        let cancellation_reason = detail.request.cancellation_reason.clone();
        Self {
            request: TransferRequestSummary::from(detail.request),
            rejection_reason,
            cancellation_reason,
            items: detail.items.into_iter().map(TransferItemView::from).collect(),
            reservations: detail
                .reservations
                .into_iter()
                .map(ReservationView::from)
                .collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-requests",
    request_body = CreateTransferRequestPayload,
    responses(
        (status = 201, description = "Transfer request created", body = ApiResponse<TransferRequestDetailView>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn create_transfer_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<CreateTransferRequestPayload>,
) -> Result<(StatusCode, Json<ApiResponse<TransferRequestDetailView>>), ServiceError> {
    payload.validate()?;
    for item in &payload.items {
        item.validate()?;
    }

    let detail = state
        .services
        .transfer_requests
        .create_request(NewTransferRequest {
            requesting_warehouse_id: payload.requesting_warehouse_id,
            items: payload
                .items
                .into_iter()
                .map(|item| NewTransferItem {
                    type_component_id: item.type_component_id,
                    quantity_requested: item.quantity_requested,
                    case_line_id: item.case_line_id,
                })
                .collect(),
            requested_by: auth.user_id,
            company_id: auth.company_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TransferRequestDetailView::from(detail))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/transfer-requests",
    params(TransferRequestListQuery),
    responses(
        (status = 200, description = "Transfer requests listed", body = ApiResponse<PaginatedResponse<TransferRequestSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn list_transfer_requests(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<TransferRequestListQuery>,
) -> ApiResult<PaginatedResponse<TransferRequestSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(TransferRequestStatus::from_str(raw).ok_or_else(|| {
            ServiceError::ValidationError(format!("Unknown status filter: {}", raw))
        })?),
    };

    let (records, total) = state
        .services
        .transfer_requests
        .list_requests(auth.company_id, status, page, limit)
        .await?;

    let items: Vec<TransferRequestSummary> = records
        .into_iter()
        .map(TransferRequestSummary::from)
        .collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/transfer-requests/:id",
    params(("id" = Uuid, Path, description = "Transfer request ID")),
    responses(
        (status = 200, description = "Transfer request fetched", body = ApiResponse<TransferRequestDetailView>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn get_transfer_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferRequestDetailView> {
    let detail = state.services.transfer_requests.get_request(id).await?;
    if detail.request.company_id != auth.company_id {
        return Err(ServiceError::NotFound(format!(
            "Transfer request {} not found",
            id
        )));
    }
    Ok(Json(ApiResponse::success(TransferRequestDetailView::from(
        detail,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-requests/:id/approve",
    params(("id" = Uuid, Path, description = "Transfer request ID")),
    responses(
        (status = 200, description = "Transfer request approved, stock reserved", body = ApiResponse<TransferRequestDetailView>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Wrong state or insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn approve_transfer_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferRequestDetailView> {
    let detail = state
        .services
        .transfer_requests
        .approve_request(id, auth.role, auth.company_id, auth.user_id)
        .await?;
    Ok(Json(ApiResponse::success(TransferRequestDetailView::from(
        detail,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-requests/:id/reservations/:reservation_id/ship",
    params(
        ("id" = Uuid, Path, description = "Transfer request ID"),
        ("reservation_id" = Uuid, Path, description = "Reservation ID")
    ),
    request_body = ShipReservationPayload,
    responses(
        (status = 200, description = "Reservation shipped", body = ApiResponse<TransferRequestDetailView>),
        (status = 400, description = "Invalid component list", body = crate::errors::ErrorResponse),
        (status = 409, description = "Reservation not shippable", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn ship_reservation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, reservation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ShipReservationPayload>,
) -> ApiResult<TransferRequestDetailView> {
    payload.validate()?;
    let detail = state
        .services
        .transfer_requests
        .ship_reservation(
            id,
            reservation_id,
            payload.component_ids,
            auth.role,
            auth.company_id,
            payload.estimated_delivery_date,
        )
        .await?;
    Ok(Json(ApiResponse::success(TransferRequestDetailView::from(
        detail,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-requests/:id/receive",
    params(("id" = Uuid, Path, description = "Transfer request ID")),
    responses(
        (status = 200, description = "Transfer request received into stock", body = ApiResponse<TransferRequestDetailView>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Wrong state", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn receive_transfer_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<TransferRequestDetailView> {
    let detail = state
        .services
        .transfer_requests
        .receive_request(id, auth.user_id, auth.role, auth.service_center_id)
        .await?;
    Ok(Json(ApiResponse::success(TransferRequestDetailView::from(
        detail,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-requests/:id/reject",
    params(("id" = Uuid, Path, description = "Transfer request ID")),
    request_body = RejectTransferRequestPayload,
    responses(
        (status = 200, description = "Transfer request rejected", body = ApiResponse<TransferRequestDetailView>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Wrong state", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn reject_transfer_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectTransferRequestPayload>,
) -> ApiResult<TransferRequestDetailView> {
    payload.validate()?;
    if auth.role != crate::auth::Role::EmvStaff {
        return Err(ServiceError::Forbidden(
            "Only emv_staff may reject transfer requests".into(),
        ));
    }
    let detail = state
        .services
        .transfer_requests
        .reject_request(id, auth.user_id, payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(TransferRequestDetailView::from(
        detail,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-requests/:id/cancel",
    params(("id" = Uuid, Path, description = "Transfer request ID")),
    request_body = CancelTransferRequestPayload,
    responses(
        (status = 200, description = "Transfer request cancelled, reservations released", body = ApiResponse<TransferRequestDetailView>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Wrong state for this role", body = crate::errors::ErrorResponse)
    ),
    tag = "transfer-requests"
)]
pub async fn cancel_transfer_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelTransferRequestPayload>,
) -> ApiResult<TransferRequestDetailView> {
    payload.validate()?;
    let detail = state
        .services
        .transfer_requests
        .cancel_request(id, auth.user_id, payload.reason, auth.role, auth.company_id)
        .await?;
    Ok(Json(ApiResponse::success(TransferRequestDetailView::from(
        detail,
    ))))
}
