mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use uuid::Uuid;

use evparts_api::auth::Role;
use evparts_api::entities::case_line::CaseLineStatus;
use evparts_api::entities::component_unit::ComponentStatus;
use evparts_api::entities::stock_reservation::ReservationStatus;
use evparts_api::entities::stock_transfer_request::TransferRequestStatus;
use evparts_api::errors::ServiceError;
use evparts_api::services::transfer_requests::{NewTransferItem, NewTransferRequest};

fn new_request(
    app: &TestApp,
    warehouse_id: Uuid,
    type_component_id: Uuid,
    quantity: i32,
    case_line_id: Option<Uuid>,
) -> NewTransferRequest {
    NewTransferRequest {
        requesting_warehouse_id: warehouse_id,
        items: vec![NewTransferItem {
            type_component_id,
            quantity_requested: quantity,
            case_line_id,
        }],
        requested_by: Uuid::new_v4(),
        company_id: app.company_id,
    }
}

#[tokio::test]
async fn full_lifecycle_create_approve_ship_receive() {
    let app = TestApp::new().await;
    let service_center = Uuid::new_v4();
    let destination = app.create_warehouse(Some(service_center), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let regional = app.create_warehouse(None, 2).await;

    let battery_module = Uuid::new_v4();
    let hub_stock = app.create_stock(hub, battery_module, 5).await;
    let regional_stock = app.create_stock(regional, battery_module, 10).await;
    let case_line = app.create_case_line().await;

    let svc = &app.services.transfer_requests;

    // Create: demand for 8 units, more than the hub alone holds.
    let detail = svc
        .create_request(new_request(&app, destination, battery_module, 8, Some(case_line)))
        .await
        .expect("create");
    let request_id = detail.request.id;
    assert_eq!(detail.request.status, TransferRequestStatus::PendingApproval.as_str());
    assert_eq!(detail.items.len(), 1);
    assert!(detail.reservations.is_empty());
    assert_eq!(
        app.case_line(case_line).await.status,
        CaseLineStatus::WaitingForParts.as_str()
    );

    // Approve: splits 5 from the hub (priority 1) + 3 from regional.
    let detail = svc
        .approve_request(request_id, Role::EmvStaff, app.company_id, Uuid::new_v4())
        .await
        .expect("approve");
    assert_eq!(detail.request.status, TransferRequestStatus::Approved.as_str());
    assert_eq!(detail.reservations.len(), 2);

    let hub_res = detail
        .reservations
        .iter()
        .find(|r| r.stock_record_id == hub_stock)
        .expect("hub reservation");
    let regional_res = detail
        .reservations
        .iter()
        .find(|r| r.stock_record_id == regional_stock)
        .expect("regional reservation");
    assert_eq!(hub_res.quantity_reserved, 5);
    assert_eq!(regional_res.quantity_reserved, 3);
    assert_eq!(app.stock(hub_stock).await.quantity_reserved, 5);
    assert_eq!(app.stock(regional_stock).await.quantity_reserved, 3);

    // Ship the hub reservation first; request stays APPROVED.
    let hub_units = app.create_units(hub, battery_module, 5).await;
    let detail = svc
        .ship_reservation(
            request_id,
            hub_res.id,
            hub_units.clone(),
            Role::EmvStaff,
            app.company_id,
            None,
        )
        .await
        .expect("ship hub reservation");
    assert_eq!(detail.request.status, TransferRequestStatus::Approved.as_str());

    let hub_after = app.stock(hub_stock).await;
    assert_eq!(hub_after.quantity_in_stock, 0);
    assert_eq!(hub_after.quantity_reserved, 0);
    for unit_id in &hub_units {
        let unit = app.unit(*unit_id).await;
        assert_eq!(unit.status, ComponentStatus::InTransit.as_str());
        assert_eq!(unit.warehouse_id, None);
    }

    // Final reservation: delivery date required, request moves to SHIPPED.
    let regional_units = app.create_units(regional, battery_module, 3).await;
    let eta = Utc::now() + Duration::days(3);
    let detail = svc
        .ship_reservation(
            request_id,
            regional_res.id,
            regional_units.clone(),
            Role::EmvStaff,
            app.company_id,
            Some(eta),
        )
        .await
        .expect("ship regional reservation");
    assert_eq!(detail.request.status, TransferRequestStatus::Shipped.as_str());
    assert!(detail.request.estimated_delivery_date.is_some());

    // Receive at the service center warehouse.
    let detail = svc
        .receive_request(
            request_id,
            Uuid::new_v4(),
            Role::ServiceCenterManager,
            Some(service_center),
        )
        .await
        .expect("receive");
    assert_eq!(detail.request.status, TransferRequestStatus::Received.as_str());

    let dest_stock = app
        .stock_at(destination, battery_module)
        .await
        .expect("destination stock created");
    assert_eq!(dest_stock.quantity_in_stock, 8);
    assert_eq!(dest_stock.quantity_reserved, 0);

    for unit_id in hub_units.iter().chain(&regional_units) {
        let unit = app.unit(*unit_id).await;
        assert_eq!(unit.status, ComponentStatus::InWarehouse.as_str());
        assert_eq!(unit.warehouse_id, Some(destination));
        assert_eq!(unit.transfer_item_id, None);
    }
    assert_eq!(
        app.case_line(case_line).await.status,
        CaseLineStatus::PartsAvailable.as_str()
    );
}

#[tokio::test]
async fn approve_fails_atomically_on_shortfall() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let hub = app.create_warehouse(None, 1).await;

    let inverter = Uuid::new_v4();
    let coolant_pump = Uuid::new_v4();
    let inverter_stock = app.create_stock(hub, inverter, 4).await;
    app.create_stock(hub, coolant_pump, 1).await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(NewTransferRequest {
            requesting_warehouse_id: destination,
            items: vec![
                NewTransferItem {
                    type_component_id: inverter,
                    quantity_requested: 3,
                    case_line_id: None,
                },
                NewTransferItem {
                    type_component_id: coolant_pump,
                    quantity_requested: 2,
                    case_line_id: None,
                },
            ],
            requested_by: Uuid::new_v4(),
            company_id: app.company_id,
        })
        .await
        .expect("create");

    // The second item is short by one; the whole approval must fail without
    // reserving anything for the first item.
    let err = svc
        .approve_request(detail.request.id, Role::EmvStaff, app.company_id, Uuid::new_v4())
        .await
        .expect_err("shortfall");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let request = app.request(detail.request.id).await;
    assert_eq!(request.status, TransferRequestStatus::PendingApproval.as_str());
    assert_eq!(app.stock(inverter_stock).await.quantity_reserved, 0);
    let reloaded = svc.get_request(detail.request.id).await.expect("reload");
    assert!(reloaded.reservations.is_empty());
}

#[tokio::test]
async fn approve_ignores_other_companies_stock() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let foreign_hub = app
        .create_warehouse_for_company(Uuid::new_v4(), 1)
        .await;

    let onboard_charger = Uuid::new_v4();
    app.create_stock(foreign_hub, onboard_charger, 50).await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(new_request(&app, destination, onboard_charger, 1, None))
        .await
        .expect("create");

    let err = svc
        .approve_request(detail.request.id, Role::EmvStaff, app.company_id, Uuid::new_v4())
        .await
        .expect_err("foreign stock must be invisible");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
}

#[tokio::test]
async fn approve_requires_emv_staff() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let part = Uuid::new_v4();
    app.create_stock(hub, part, 5).await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(new_request(&app, destination, part, 1, None))
        .await
        .expect("create");

    let err = svc
        .approve_request(
            detail.request.id,
            Role::ServiceCenterManager,
            app.company_id,
            Uuid::new_v4(),
        )
        .await
        .expect_err("manager cannot approve");
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn reject_only_from_pending_approval() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let part = Uuid::new_v4();
    app.create_stock(hub, part, 5).await;
    let case_line = app.create_case_line().await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(new_request(&app, destination, part, 2, Some(case_line)))
        .await
        .expect("create");

    let detail = svc
        .reject_request(detail.request.id, Uuid::new_v4(), "Not covered".into())
        .await
        .expect("reject");
    assert_eq!(detail.request.status, TransferRequestStatus::Rejected.as_str());
    assert_eq!(detail.request.rejection_reason.as_deref(), Some("Not covered"));
    assert_eq!(
        app.case_line(case_line).await.status,
        CaseLineStatus::RejectedByOem.as_str()
    );

    // Rejecting again is a state conflict.
    let err = svc
        .reject_request(detail.request.id, Uuid::new_v4(), "again".into())
        .await
        .expect_err("terminal");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn cancel_pending_needs_no_reversal() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let part = Uuid::new_v4();
    let stock = app.create_stock(hub, part, 5).await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(new_request(&app, destination, part, 2, None))
        .await
        .expect("create");

    let detail = svc
        .cancel_request(
            detail.request.id,
            Uuid::new_v4(),
            "No longer needed".into(),
            Role::ServiceCenterManager,
            app.company_id,
        )
        .await
        .expect("cancel pending");
    assert_eq!(detail.request.status, TransferRequestStatus::Cancelled.as_str());
    assert_eq!(app.stock(stock).await.quantity_reserved, 0);
}

#[tokio::test]
async fn cancel_approved_reverses_reservations_and_is_staff_only() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let part = Uuid::new_v4();
    let stock = app.create_stock(hub, part, 5).await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(new_request(&app, destination, part, 3, None))
        .await
        .expect("create");
    let request_id = detail.request.id;

    let detail = svc
        .approve_request(request_id, Role::EmvStaff, app.company_id, Uuid::new_v4())
        .await
        .expect("approve");
    assert_eq!(app.stock(stock).await.quantity_reserved, 3);
    let reservation_id = detail.reservations[0].id;

    // A service center manager may not cancel once stock is committed.
    let err = svc
        .cancel_request(
            request_id,
            Uuid::new_v4(),
            "changed my mind".into(),
            Role::ServiceCenterManager,
            app.company_id,
        )
        .await
        .expect_err("manager cannot cancel approved");
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(app.stock(stock).await.quantity_reserved, 3);

    let detail = svc
        .cancel_request(
            request_id,
            Uuid::new_v4(),
            "Superseded by recall campaign".into(),
            Role::EmvStaff,
            app.company_id,
        )
        .await
        .expect("staff cancel");
    assert_eq!(detail.request.status, TransferRequestStatus::Cancelled.as_str());
    assert_eq!(app.stock(stock).await.quantity_reserved, 0);
    assert_eq!(app.stock(stock).await.quantity_in_stock, 5);
    assert_eq!(
        app.reservation(reservation_id).await.status,
        ReservationStatus::Cancelled.as_str()
    );
}

#[tokio::test]
async fn ship_validates_components_and_is_idempotent_per_reservation() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let part = Uuid::new_v4();
    app.create_stock(hub, part, 5).await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(new_request(&app, destination, part, 2, None))
        .await
        .expect("create");
    let request_id = detail.request.id;
    let detail = svc
        .approve_request(request_id, Role::EmvStaff, app.company_id, Uuid::new_v4())
        .await
        .expect("approve");
    let reservation_id = detail.reservations[0].id;

    let units = app.create_units(hub, part, 2).await;

    // Wrong count.
    let err = svc
        .ship_reservation(
            request_id,
            reservation_id,
            vec![units[0]],
            Role::EmvStaff,
            app.company_id,
            None,
        )
        .await
        .expect_err("count mismatch");
    assert!(matches!(err, ServiceError::BadRequest(_)));

    // Wrong component type.
    let stranger = app.create_units(hub, Uuid::new_v4(), 1).await;
    let err = svc
        .ship_reservation(
            request_id,
            reservation_id,
            vec![units[0], stranger[0]],
            Role::EmvStaff,
            app.company_id,
            None,
        )
        .await
        .expect_err("wrong type");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Final reservation requires a delivery date.
    let err = svc
        .ship_reservation(
            request_id,
            reservation_id,
            units.clone(),
            Role::EmvStaff,
            app.company_id,
            None,
        )
        .await
        .expect_err("missing delivery date");
    assert!(matches!(err, ServiceError::BadRequest(_)));

    // A failed final ship rolls back entirely; the same call with a date works.
    let eta = Utc::now() + Duration::days(5);
    let detail = svc
        .ship_reservation(
            request_id,
            reservation_id,
            units.clone(),
            Role::EmvStaff,
            app.company_id,
            Some(eta),
        )
        .await
        .expect("ship");
    assert_eq!(detail.request.status, TransferRequestStatus::Shipped.as_str());

    // Shipping the same reservation twice is a conflict.
    let err = svc
        .ship_reservation(
            request_id,
            reservation_id,
            units,
            Role::EmvStaff,
            app.company_id,
            Some(eta),
        )
        .await
        .expect_err("double ship");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn receive_gated_by_destination_service_center() {
    let app = TestApp::new().await;
    let service_center = Uuid::new_v4();
    let destination = app.create_warehouse(Some(service_center), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let part = Uuid::new_v4();
    app.create_stock(hub, part, 5).await;

    let svc = &app.services.transfer_requests;
    let detail = svc
        .create_request(new_request(&app, destination, part, 1, None))
        .await
        .expect("create");
    let request_id = detail.request.id;
    let detail = svc
        .approve_request(request_id, Role::EmvStaff, app.company_id, Uuid::new_v4())
        .await
        .expect("approve");

    let units = app.create_units(hub, part, 1).await;
    svc.ship_reservation(
        request_id,
        detail.reservations[0].id,
        units,
        Role::EmvStaff,
        app.company_id,
        Some(Utc::now() + Duration::days(1)),
    )
    .await
    .expect("ship");

    // Receiving before arrival at the wrong service center is forbidden.
    let err = svc
        .receive_request(
            request_id,
            Uuid::new_v4(),
            Role::ServiceCenterTechnician,
            Some(Uuid::new_v4()),
        )
        .await
        .expect_err("wrong service center");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Central staff cannot receive on a service center's behalf.
    let err = svc
        .receive_request(request_id, Uuid::new_v4(), Role::EmvStaff, None)
        .await
        .expect_err("staff cannot receive for a service center");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let detail = svc
        .receive_request(
            request_id,
            Uuid::new_v4(),
            Role::ServiceCenterTechnician,
            Some(service_center),
        )
        .await
        .expect("receive");
    assert_eq!(detail.request.status, TransferRequestStatus::Received.as_str());
}

#[tokio::test]
async fn create_rejects_empty_and_non_positive_items() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let svc = &app.services.transfer_requests;

    let err = svc
        .create_request(NewTransferRequest {
            requesting_warehouse_id: destination,
            items: vec![],
            requested_by: Uuid::new_v4(),
            company_id: app.company_id,
        })
        .await
        .expect_err("empty items");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = svc
        .create_request(new_request(&app, destination, Uuid::new_v4(), 0, None))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn list_requests_filters_by_status() {
    let app = TestApp::new().await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 10).await;
    let hub = app.create_warehouse(None, 1).await;
    let part = Uuid::new_v4();
    app.create_stock(hub, part, 10).await;

    let svc = &app.services.transfer_requests;
    let first = svc
        .create_request(new_request(&app, destination, part, 1, None))
        .await
        .expect("create");
    svc.create_request(new_request(&app, destination, part, 1, None))
        .await
        .expect("create");
    svc.approve_request(first.request.id, Role::EmvStaff, app.company_id, Uuid::new_v4())
        .await
        .expect("approve");

    let (all, total) = svc
        .list_requests(app.company_id, None, 1, 20)
        .await
        .expect("list all");
    assert_eq!(total, 2);
    assert_eq!(all.len(), 2);

    let (approved, total) = svc
        .list_requests(
            app.company_id,
            Some(TransferRequestStatus::Approved),
            1,
            20,
        )
        .await
        .expect("list approved");
    assert_eq!(total, 1);
    assert_eq!(approved[0].id, first.request.id);
}
