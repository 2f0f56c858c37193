use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EV Parts API",
        version = "0.1.0",
        description = r#"
Warranty-parts logistics API for EV service networks.

Service centers raise transfer requests for warranty components; central
staff approve them (reserving stock across the warehouse network by
priority), ship reservations as serial-tracked units, and the destination
receives them into stock.

## Identity

Requests arrive pre-authenticated from the gateway and carry identity
headers: `x-user-id`, `x-company-id`, `x-role`, and optionally
`x-service-center-id`.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        handlers::transfer_requests::create_transfer_request,
        handlers::transfer_requests::list_transfer_requests,
        handlers::transfer_requests::get_transfer_request,
        handlers::transfer_requests::approve_transfer_request,
        handlers::transfer_requests::ship_reservation,
        handlers::transfer_requests::receive_transfer_request,
        handlers::transfer_requests::reject_transfer_request,
        handlers::transfer_requests::cancel_transfer_request,
        handlers::stock::list_stock,
    ),
    components(
        schemas(
            handlers::transfer_requests::CreateTransferRequestPayload,
            handlers::transfer_requests::CreateTransferItemPayload,
            handlers::transfer_requests::ShipReservationPayload,
            handlers::transfer_requests::RejectTransferRequestPayload,
            handlers::transfer_requests::CancelTransferRequestPayload,
            handlers::transfer_requests::TransferRequestSummary,
            handlers::transfer_requests::TransferRequestDetailView,
            handlers::transfer_requests::TransferItemView,
            handlers::transfer_requests::ReservationView,
            handlers::stock::StockRecordView,
            crate::errors::ErrorResponse,
        )
    ),
    tags(
        (name = "transfer-requests", description = "Cross-warehouse transfer request workflow"),
        (name = "stock", description = "Warehouse stock levels")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
