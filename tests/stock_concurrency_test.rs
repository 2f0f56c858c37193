mod common;

use sea_orm::TransactionTrait;
use uuid::Uuid;

use common::TestApp;
use evparts_api::auth::Role;
use evparts_api::errors::ServiceError;
use evparts_api::services::stock_ledger::StockLedger;
use evparts_api::services::transfer_requests::{NewTransferItem, NewTransferRequest};

// These tests run on a single-connection pool: tasks race at the tokio level
// while SQLite sees one writer at a time, the same serialization a Postgres
// row lock provides.

#[tokio::test]
async fn concurrent_reservations_never_overcommit() {
    let app = TestApp::with_single_connection().await;
    let warehouse_id = app.create_warehouse(None, 1).await;
    let type_id = Uuid::new_v4();
    let stock_id = app.create_stock(warehouse_id, type_id, 10).await;

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let db = app.db.clone();
        tasks.push(tokio::spawn(async move {
            let txn = db.begin().await?;
            StockLedger::new().reserve(&txn, stock_id, 1).await?;
            txn.commit().await?;
            Ok::<_, ServiceError>(())
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => successes += 1,
            Err(ServiceError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 10, "exactly the available stock may be reserved");
    let stock = app.stock(stock_id).await;
    assert_eq!(stock.quantity_reserved, 10);
    assert!(stock.quantity_reserved <= stock.quantity_in_stock);
}

#[tokio::test]
async fn racing_approvals_only_reserve_what_exists() {
    let app = TestApp::with_single_connection().await;
    let source = app.create_warehouse(None, 1).await;
    let destination = app.create_warehouse(Some(Uuid::new_v4()), 2).await;
    let type_id = Uuid::new_v4();
    let stock_id = app.create_stock(source, type_id, 10).await;

    // Two requests that each want 6 of the 10 units; only one can win.
    let mut request_ids = Vec::new();
    for _ in 0..2 {
        let detail = app
            .services
            .transfer_requests
            .create_request(NewTransferRequest {
                requesting_warehouse_id: destination,
                items: vec![NewTransferItem {
                    type_component_id: type_id,
                    quantity_requested: 6,
                    case_line_id: None,
                }],
                requested_by: Uuid::new_v4(),
                company_id: app.company_id,
            })
            .await
            .unwrap();
        request_ids.push(detail.request.id);
    }

    let mut tasks = Vec::new();
    for request_id in request_ids.clone() {
        let service = app.services.transfer_requests.clone();
        let company_id = app.company_id;
        tasks.push(tokio::spawn(async move {
            service
                .approve_request(request_id, Role::EmvStaff, company_id, Uuid::new_v4())
                .await
        }));
    }

    let mut approved = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => approved += 1,
            Err(ServiceError::InsufficientStock(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(approved, 1, "only one of the competing approvals may win");
    let stock = app.stock(stock_id).await;
    assert_eq!(stock.quantity_reserved, 6);
    assert!(stock.quantity_reserved <= stock.quantity_in_stock);

    let statuses: Vec<String> = {
        let mut out = Vec::new();
        for id in request_ids {
            out.push(app.request(id).await.status);
        }
        out
    };
    assert!(statuses.contains(&"APPROVED".to_string()));
    assert!(statuses.contains(&"PENDING_APPROVAL".to_string()));
}
