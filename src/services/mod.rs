//! Domain services.
//!
//! `allocation` is pure; the ledgers operate only inside a caller-owned
//! transaction; `TransferRequestService` is the sole orchestrator that opens
//! transactions and emits events.

pub mod allocation;
pub mod case_lines;
pub mod reservation_ledger;
pub mod stock_ledger;
pub mod stock_query;
pub mod transfer_requests;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;
use crate::services::case_lines::SeaOrmCaseLineSync;
use crate::services::reservation_ledger::ReservationLedger;
use crate::services::stock_ledger::StockLedger;
use crate::services::stock_query::StockQueryService;
use crate::services::transfer_requests::TransferRequestService;

/// All services wired together, shared through application state.
#[derive(Clone)]
pub struct AppServices {
    pub transfer_requests: TransferRequestService,
    pub stock: StockQueryService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        let transfer_requests = TransferRequestService::new(
            db.clone(),
            StockLedger::new(),
            ReservationLedger::new(),
            Arc::new(SeaOrmCaseLineSync),
            event_sender,
        );
        let stock = StockQueryService::new(db);
        Self {
            transfer_requests,
            stock,
        }
    }
}
