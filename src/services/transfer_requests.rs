//! The stock transfer request workflow.
//!
//! Orchestrates the allocation planner, stock ledger and reservation ledger
//! across the request lifecycle:
//!
//! ```text
//! create -> approve -> ship (per reservation) -> receive
//!             |  \
//!             |   reject (before approval only)
//!             cancel (PENDING_APPROVAL or APPROVED, role-gated)
//! ```
//!
//! Every transition runs in one database transaction. The transaction is
//! dropped (and therefore rolled back) on any validation failure, so a
//! transition either fully completes or leaves no trace. Events are sent only
//! after commit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Role;
use crate::entities::case_line::CaseLineStatus;
use crate::entities::component_unit::{self, ComponentStatus, Entity as ComponentUnitEntity};
use crate::entities::stock_record::{self, Entity as StockRecordEntity};
use crate::entities::stock_reservation::{self, ReservationStatus};
use crate::entities::stock_transfer_request::{
    self, Entity as TransferRequestEntity, TransferRequestStatus,
};
use crate::entities::stock_transfer_request_item::{self, Entity as TransferRequestItemEntity};
use crate::entities::warehouse::{self, Entity as WarehouseEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::allocation::{self, AllocationPlan, CandidateStock};
use crate::services::case_lines::CaseLineSync;
use crate::services::reservation_ledger::ReservationLedger;
use crate::services::stock_ledger::StockLedger;

/// Demand for one component type on a new request.
#[derive(Debug, Clone)]
pub struct NewTransferItem {
    pub type_component_id: Uuid,
    pub quantity_requested: i32,
    pub case_line_id: Option<Uuid>,
}

/// Input to `create_request`.
#[derive(Debug, Clone)]
pub struct NewTransferRequest {
    pub requesting_warehouse_id: Uuid,
    pub items: Vec<NewTransferItem>,
    pub requested_by: Uuid,
    pub company_id: Uuid,
}

/// A request together with its items; `get_request` also loads reservations.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransferRequestDetail {
    pub request: stock_transfer_request::Model,
    pub items: Vec<stock_transfer_request_item::Model>,
    pub reservations: Vec<stock_reservation::Model>,
}

#[derive(Clone)]
pub struct TransferRequestService {
    db: Arc<DatabaseConnection>,
    stock_ledger: StockLedger,
    reservations: ReservationLedger,
    case_lines: Arc<dyn CaseLineSync>,
    event_sender: EventSender,
}

impl TransferRequestService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        stock_ledger: StockLedger,
        reservations: ReservationLedger,
        case_lines: Arc<dyn CaseLineSync>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            stock_ledger,
            reservations,
            case_lines,
            event_sender,
        }
    }

    async fn send_event(&self, event: Event) {
        // Event delivery is best-effort; the transition already committed.
        if let Err(e) = self.event_sender.send(event).await {
            tracing::warn!(error = %e, "Failed to enqueue event");
        }
    }

    /// Loads the request row under `FOR UPDATE`; all transitions start here so
    /// concurrent calls on the same request serialize.
    async fn find_request_locked(
        &self,
        txn: &DatabaseTransaction,
        request_id: Uuid,
    ) -> Result<stock_transfer_request::Model, ServiceError> {
        TransferRequestEntity::find_by_id(request_id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Transfer request {} not found", request_id))
            })
    }

    fn parse_status(request: &stock_transfer_request::Model) -> TransferRequestStatus {
        // An unknown stored status can only come from manual data edits; treat
        // it as terminal so no transition can act on it.
        TransferRequestStatus::from_str(&request.status)
            .unwrap_or(TransferRequestStatus::Cancelled)
    }

    fn require_status(
        request: &stock_transfer_request::Model,
        expected: TransferRequestStatus,
        transition: &str,
    ) -> Result<(), ServiceError> {
        let current = Self::parse_status(request);
        if current != expected {
            return Err(ServiceError::Conflict(format!(
                "Cannot {} transfer request {} in status {} (requires {})",
                transition,
                request.id,
                request.status,
                expected.as_str()
            )));
        }
        Ok(())
    }

    fn require_company(
        request: &stock_transfer_request::Model,
        company_id: Uuid,
    ) -> Result<(), ServiceError> {
        if request.company_id != company_id {
            return Err(ServiceError::Forbidden(
                "Transfer request belongs to a different company".into(),
            ));
        }
        Ok(())
    }

    async fn load_items(
        &self,
        txn: &DatabaseTransaction,
        request_id: Uuid,
    ) -> Result<Vec<stock_transfer_request_item::Model>, ServiceError> {
        TransferRequestItemEntity::find()
            .filter(stock_transfer_request_item::Column::RequestId.eq(request_id))
            .order_by_asc(stock_transfer_request_item::Column::CreatedAt)
            .all(txn)
            .await
            .map_err(ServiceError::db_error)
    }

    async fn load_warehouse(
        &self,
        txn: &DatabaseTransaction,
        warehouse_id: Uuid,
    ) -> Result<warehouse::Model, ServiceError> {
        WarehouseEntity::find_by_id(warehouse_id)
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", warehouse_id)))
    }

    fn case_line_ids(items: &[stock_transfer_request_item::Model]) -> Vec<Uuid> {
        items.iter().filter_map(|item| item.case_line_id).collect()
    }

    /// Records demand: creates the request (PENDING_APPROVAL) and its items,
    /// and marks originating case lines WAITING_FOR_PARTS. No stock is touched.
    #[instrument(skip(self, input), fields(warehouse = %input.requesting_warehouse_id))]
    pub async fn create_request(
        &self,
        input: NewTransferRequest,
    ) -> Result<TransferRequestDetail, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Transfer request must contain at least one item".into(),
            ));
        }
        for item in &input.items {
            if item.quantity_requested <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Requested quantity must be positive, got {}",
                    item.quantity_requested
                )));
            }
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let req_warehouse = self
            .load_warehouse(&txn, input.requesting_warehouse_id)
            .await?;
        if req_warehouse.company_id != input.company_id {
            return Err(ServiceError::Forbidden(
                "Requesting warehouse belongs to a different company".into(),
            ));
        }

        let request = stock_transfer_request::ActiveModel {
            requesting_warehouse_id: Set(input.requesting_warehouse_id),
            company_id: Set(input.company_id),
            requested_by: Set(input.requested_by),
            status: Set(TransferRequestStatus::PendingApproval.as_str().to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let model = stock_transfer_request_item::ActiveModel {
                request_id: Set(request.id),
                type_component_id: Set(item.type_component_id),
                quantity_requested: Set(item.quantity_requested),
                case_line_id: Set(item.case_line_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(model);
        }

        self.case_lines
            .bulk_update_status(&txn, &Self::case_line_ids(&items), CaseLineStatus::WaitingForParts)
            .await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(request_id = %request.id, items = items.len(), "Created transfer request");
        self.send_event(Event::TransferRequestCreated {
            request_id: request.id,
            requesting_warehouse_id: request.requesting_warehouse_id,
        })
        .await;

        Ok(TransferRequestDetail {
            request,
            items,
            reservations: Vec::new(),
        })
    }

    /// Candidate stock for one component type across the company's
    /// warehouses, ordered by warehouse priority ascending. Rows are locked
    /// before availability is read so two concurrent approvals against
    /// overlapping stock cannot both see stale quantities.
    async fn candidate_stock(
        &self,
        txn: &DatabaseTransaction,
        company_id: Uuid,
        type_component_id: Uuid,
    ) -> Result<Vec<stock_record::Model>, ServiceError> {
        StockRecordEntity::find()
            .join(JoinType::InnerJoin, stock_record::Relation::Warehouse.def())
            .filter(warehouse::Column::CompanyId.eq(company_id))
            .filter(stock_record::Column::TypeComponentId.eq(type_component_id))
            .order_by_asc(warehouse::Column::Priority)
            .lock_exclusive()
            .all(txn)
            .await
            .map_err(ServiceError::db_error)
    }

    /// PENDING_APPROVAL -> APPROVED.
    ///
    /// Plans the full allocation for every item first (read-only, with a
    /// shared claimed overlay so items see each other's claims), and only
    /// writes reservations and ledger adjustments once the whole request is
    /// known to be satisfiable. Any shortfall fails the entire approval.
    #[instrument(skip(self))]
    pub async fn approve_request(
        &self,
        request_id: Uuid,
        role: Role,
        company_id: Uuid,
        approved_by: Uuid,
    ) -> Result<TransferRequestDetail, ServiceError> {
        if role != Role::EmvStaff {
            return Err(ServiceError::Forbidden(
                "Only emv_staff may approve transfer requests".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let request = self.find_request_locked(&txn, request_id).await?;
        Self::require_company(&request, company_id)?;
        Self::require_status(&request, TransferRequestStatus::PendingApproval, "approve")?;

        let items = self.load_items(&txn, request_id).await?;

        // Phase 1: plan everything. No writes happen until every item is
        // known to be fully satisfiable.
        let mut claimed: HashMap<Uuid, i32> = HashMap::new();
        let mut plans: Vec<(Uuid, AllocationPlan)> = Vec::with_capacity(items.len());
        for item in &items {
            let candidates = self
                .candidate_stock(&txn, company_id, item.type_component_id)
                .await?;
            let snapshots: Vec<CandidateStock> =
                candidates.iter().map(CandidateStock::from).collect();

            let plan = allocation::plan(item.quantity_requested, &snapshots, &mut claimed)?;
            if !plan.is_satisfied() {
                return Err(ServiceError::InsufficientStock(format!(
                    "Component type {} is short {} of {} requested units",
                    item.type_component_id, plan.shortfall, item.quantity_requested
                )));
            }
            plans.push((item.id, plan));
        }

        // Phase 2: persist reservations and ledger adjustments as one unit.
        let mut reservation_count = 0usize;
        for (item_id, plan) in &plans {
            let created = self
                .reservations
                .create_many(&txn, &plan.allocations, *item_id)
                .await?;
            reservation_count += created.len();
            for alloc in &plan.allocations {
                self.stock_ledger
                    .reserve(&txn, alloc.stock_id, alloc.quantity)
                    .await?;
            }
        }

        let req_warehouse = self
            .load_warehouse(&txn, request.requesting_warehouse_id)
            .await?;

        let mut active: stock_transfer_request::ActiveModel = request.into();
        active.status = Set(TransferRequestStatus::Approved.as_str().to_string());
        active.approved_by = Set(Some(approved_by));
        active.approved_at = Set(Some(Utc::now()));
        let request = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            request_id = %request.id,
            reservations = reservation_count,
            "Approved transfer request"
        );
        self.send_event(Event::TransferRequestApproved {
            request_id: request.id,
            requesting_warehouse_id: request.requesting_warehouse_id,
            service_center_id: req_warehouse.service_center_id,
            reservation_count,
        })
        .await;

        self.get_request(request.id).await
    }

    /// Ships one reservation: the supplied component serials leave the source
    /// warehouse and go IN_TRANSIT under the reservation's transfer item.
    /// When the last RESERVED reservation ships, the request itself moves to
    /// SHIPPED — that final call must carry `estimated_delivery_date`.
    #[instrument(skip(self, component_ids))]
    pub async fn ship_reservation(
        &self,
        request_id: Uuid,
        reservation_id: Uuid,
        component_ids: Vec<Uuid>,
        role: Role,
        company_id: Uuid,
        estimated_delivery_date: Option<DateTime<Utc>>,
    ) -> Result<TransferRequestDetail, ServiceError> {
        if role != Role::EmvStaff {
            return Err(ServiceError::Forbidden(
                "Only emv_staff may ship reservations".into(),
            ));
        }
        if component_ids.is_empty() {
            return Err(ServiceError::BadRequest(
                "At least one component must be supplied".into(),
            ));
        }
        {
            let mut seen = std::collections::HashSet::new();
            for id in &component_ids {
                if !seen.insert(*id) {
                    return Err(ServiceError::BadRequest(format!(
                        "Duplicate component id {}",
                        id
                    )));
                }
            }
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let request = self.find_request_locked(&txn, request_id).await?;
        Self::require_company(&request, company_id)?;
        Self::require_status(&request, TransferRequestStatus::Approved, "ship against")?;

        let reservation = self.reservations.find_locked(&txn, reservation_id).await?;
        let item = TransferRequestItemEntity::find_by_id(reservation.transfer_item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Transfer item {} not found",
                    reservation.transfer_item_id
                ))
            })?;
        if item.request_id != request_id {
            return Err(ServiceError::Conflict(format!(
                "Reservation {} does not belong to transfer request {}",
                reservation_id, request_id
            )));
        }
        if ReservationStatus::from_str(&reservation.status) != Some(ReservationStatus::Reserved) {
            return Err(ServiceError::Conflict(format!(
                "Reservation {} is {} and cannot be shipped",
                reservation_id, reservation.status
            )));
        }
        if component_ids.len() as i32 != reservation.quantity_reserved {
            return Err(ServiceError::BadRequest(format!(
                "Reservation {} requires exactly {} components, got {}",
                reservation_id,
                reservation.quantity_reserved,
                component_ids.len()
            )));
        }

        let stock = StockRecordEntity::find_by_id(reservation.stock_record_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Stock record {} not found",
                    reservation.stock_record_id
                ))
            })?;

        let units = ComponentUnitEntity::find()
            .filter(component_unit::Column::Id.is_in(component_ids.iter().copied()))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if units.len() != component_ids.len() {
            return Err(ServiceError::NotFound(
                "One or more supplied components do not exist".into(),
            ));
        }

        for unit in &units {
            if ComponentStatus::from_str(&unit.status) != Some(ComponentStatus::InWarehouse) {
                return Err(ServiceError::Conflict(format!(
                    "Component {} is not in IN_WAREHOUSE state",
                    unit.serial_number
                )));
            }
            if unit.warehouse_id != Some(stock.warehouse_id) {
                return Err(ServiceError::Conflict(format!(
                    "Component {} is not stocked at the reservation's warehouse",
                    unit.serial_number
                )));
            }
            if unit.type_component_id != item.type_component_id {
                return Err(ServiceError::Conflict(format!(
                    "Component {} is not of the requested component type",
                    unit.serial_number
                )));
            }
            if let Some(claimed_by) = unit.transfer_item_id {
                if claimed_by != item.id {
                    return Err(ServiceError::Conflict(format!(
                        "Component {} is already claimed by another transfer item",
                        unit.serial_number
                    )));
                }
            }
        }

        for unit in units {
            let mut active: component_unit::ActiveModel = unit.into();
            active.status = Set(ComponentStatus::InTransit.as_str().to_string());
            active.warehouse_id = Set(None);
            active.transfer_item_id = Set(Some(item.id));
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        self.stock_ledger
            .ship(&txn, reservation.stock_record_id, reservation.quantity_reserved)
            .await?;
        self.reservations
            .mark_shipped(&txn, &[reservation_id])
            .await?;

        let remaining = self
            .reservations
            .count_reserved_by_request(&txn, request_id)
            .await?;

        let mut fully_shipped = false;
        let requesting_warehouse_id = request.requesting_warehouse_id;
        if remaining == 0 {
            let delivery = estimated_delivery_date.ok_or_else(|| {
                ServiceError::BadRequest(
                    "estimated_delivery_date is required when shipping the final reservation"
                        .into(),
                )
            })?;
            let mut active: stock_transfer_request::ActiveModel = request.into();
            active.status = Set(TransferRequestStatus::Shipped.as_str().to_string());
            active.shipped_at = Set(Some(Utc::now()));
            active.estimated_delivery_date = Set(Some(delivery));
            active.update(&txn).await.map_err(ServiceError::db_error)?;
            fully_shipped = true;
        }

        let req_warehouse = self.load_warehouse(&txn, requesting_warehouse_id).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            request_id = %request_id,
            reservation_id = %reservation_id,
            quantity = reservation.quantity_reserved,
            fully_shipped,
            "Shipped reservation"
        );
        self.send_event(Event::ReservationShipped {
            request_id,
            reservation_id,
            quantity: reservation.quantity_reserved,
        })
        .await;
        if fully_shipped {
            self.send_event(Event::TransferRequestShipped {
                request_id,
                requesting_warehouse_id,
                service_center_id: req_warehouse.service_center_id,
            })
            .await;
        }

        self.get_request(request_id).await
    }

    /// SHIPPED -> RECEIVED at the requesting warehouse: in-transit units come
    /// into stock (creating destination stock records as needed) and the
    /// originating case lines become PARTS_AVAILABLE.
    #[instrument(skip(self))]
    pub async fn receive_request(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        role: Role,
        service_center_id: Option<Uuid>,
    ) -> Result<TransferRequestDetail, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let request = self.find_request_locked(&txn, request_id).await?;
        Self::require_status(&request, TransferRequestStatus::Shipped, "receive")?;

        let req_warehouse = self
            .load_warehouse(&txn, request.requesting_warehouse_id)
            .await?;
        // Service-center-scoped warehouses may only be received by actors of
        // that service center; hub warehouses are received by company staff.
        match req_warehouse.service_center_id {
            Some(sc) => {
                if role == Role::EmvStaff || service_center_id != Some(sc) {
                    return Err(ServiceError::Forbidden(
                        "Receiving requires an actor of the destination service center".into(),
                    ));
                }
            }
            None => {
                if role != Role::EmvStaff {
                    return Err(ServiceError::Forbidden(
                        "Receiving at a hub warehouse requires emv_staff".into(),
                    ));
                }
            }
        }

        let items = self.load_items(&txn, request_id).await?;
        let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();

        let units = ComponentUnitEntity::find()
            .filter(component_unit::Column::TransferItemId.is_in(item_ids.iter().copied()))
            .filter(component_unit::Column::Status.eq(ComponentStatus::InTransit.as_str()))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if units.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "Transfer request {} has no in-transit components to receive",
                request_id
            )));
        }

        let mut by_type: HashMap<Uuid, i32> = HashMap::new();
        for unit in &units {
            *by_type.entry(unit.type_component_id).or_insert(0) += 1;
        }
        for (type_component_id, quantity) in &by_type {
            self.stock_ledger
                .receive(&txn, req_warehouse.id, *type_component_id, *quantity)
                .await?;
        }

        for unit in units {
            let mut active: component_unit::ActiveModel = unit.into();
            active.status = Set(ComponentStatus::InWarehouse.as_str().to_string());
            active.warehouse_id = Set(Some(req_warehouse.id));
            active.transfer_item_id = Set(None);
            active.update(&txn).await.map_err(ServiceError::db_error)?;
        }

        self.case_lines
            .bulk_update_status(&txn, &Self::case_line_ids(&items), CaseLineStatus::PartsAvailable)
            .await?;

        let mut active: stock_transfer_request::ActiveModel = request.into();
        active.status = Set(TransferRequestStatus::Received.as_str().to_string());
        active.received_by = Set(Some(user_id));
        active.received_at = Set(Some(Utc::now()));
        let request = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(request_id = %request.id, types = by_type.len(), "Received transfer request");
        self.send_event(Event::TransferRequestReceived {
            request_id: request.id,
            requesting_warehouse_id: request.requesting_warehouse_id,
            service_center_id: req_warehouse.service_center_id,
        })
        .await;

        self.get_request(request_id).await
    }

    /// PENDING_APPROVAL -> REJECTED. Legal only before any reservation
    /// exists, so no ledger reversal is needed.
    #[instrument(skip(self, reason))]
    pub async fn reject_request(
        &self,
        request_id: Uuid,
        rejected_by: Uuid,
        reason: String,
    ) -> Result<TransferRequestDetail, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Rejection reason must not be empty".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let request = self.find_request_locked(&txn, request_id).await?;
        Self::require_status(&request, TransferRequestStatus::PendingApproval, "reject")?;

        let items = self.load_items(&txn, request_id).await?;
        self.case_lines
            .bulk_update_status(&txn, &Self::case_line_ids(&items), CaseLineStatus::RejectedByOem)
            .await?;

        let req_warehouse = self
            .load_warehouse(&txn, request.requesting_warehouse_id)
            .await?;

        let mut active: stock_transfer_request::ActiveModel = request.into();
        active.status = Set(TransferRequestStatus::Rejected.as_str().to_string());
        active.rejected_by = Set(Some(rejected_by));
        active.rejected_at = Set(Some(Utc::now()));
        active.rejection_reason = Set(Some(reason.clone()));
        let request = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(request_id = %request.id, "Rejected transfer request");
        self.send_event(Event::TransferRequestRejected {
            request_id: request.id,
            requesting_warehouse_id: request.requesting_warehouse_id,
            service_center_id: req_warehouse.service_center_id,
            reason,
        })
        .await;

        self.get_request(request_id).await
    }

    /// Cancels a request. From PENDING_APPROVAL nothing was reserved and any
    /// managing role may cancel; from APPROVED only emv_staff may cancel, and
    /// every RESERVED reservation is reversed (unreserve + cancel) first.
    #[instrument(skip(self, reason))]
    pub async fn cancel_request(
        &self,
        request_id: Uuid,
        cancelled_by: Uuid,
        reason: String,
        role: Role,
        company_id: Uuid,
    ) -> Result<TransferRequestDetail, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Cancellation reason must not be empty".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let request = self.find_request_locked(&txn, request_id).await?;
        Self::require_company(&request, company_id)?;

        match Self::parse_status(&request) {
            TransferRequestStatus::PendingApproval => {
                if !matches!(role, Role::EmvStaff | Role::ServiceCenterManager) {
                    return Err(ServiceError::Forbidden(
                        "Only emv_staff or a service center manager may cancel a pending request"
                            .into(),
                    ));
                }
                // Nothing reserved yet; no ledger reversal needed.
            }
            TransferRequestStatus::Approved => {
                if role != Role::EmvStaff {
                    return Err(ServiceError::Conflict(
                        "An approved transfer request can only be cancelled by emv_staff".into(),
                    ));
                }
                let reserved = self
                    .reservations
                    .find_by_request(&txn, request_id, Some(&[ReservationStatus::Reserved]))
                    .await?;
                for reservation in &reserved {
                    self.stock_ledger
                        .unreserve(&txn, reservation.stock_record_id, reservation.quantity_reserved)
                        .await?;
                }
                let ids: Vec<Uuid> = reserved.iter().map(|r| r.id).collect();
                self.reservations.cancel(&txn, &ids).await?;
            }
            other => {
                return Err(ServiceError::Conflict(format!(
                    "Cannot cancel transfer request {} in status {}",
                    request_id,
                    other.as_str()
                )));
            }
        }

        let mut active: stock_transfer_request::ActiveModel = request.into();
        active.status = Set(TransferRequestStatus::Cancelled.as_str().to_string());
        active.cancelled_by = Set(Some(cancelled_by));
        active.cancelled_at = Set(Some(Utc::now()));
        active.cancellation_reason = Set(Some(reason.clone()));
        let request = active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(request_id = %request.id, "Cancelled transfer request");
        self.send_event(Event::TransferRequestCancelled {
            request_id: request.id,
            requesting_warehouse_id: request.requesting_warehouse_id,
            reason,
        })
        .await;

        self.get_request(request_id).await
    }

    /// Loads a request with its items and all its reservations.
    pub async fn get_request(
        &self,
        request_id: Uuid,
    ) -> Result<TransferRequestDetail, ServiceError> {
        let db = self.db.as_ref();

        let request = TransferRequestEntity::find_by_id(request_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Transfer request {} not found", request_id))
            })?;

        let items = TransferRequestItemEntity::find()
            .filter(stock_transfer_request_item::Column::RequestId.eq(request_id))
            .order_by_asc(stock_transfer_request_item::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let reservations = if item_ids.is_empty() {
            Vec::new()
        } else {
            stock_reservation::Entity::find()
                .filter(stock_reservation::Column::TransferItemId.is_in(item_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
        };

        Ok(TransferRequestDetail {
            request,
            items,
            reservations,
        })
    }

    /// Lists a company's requests, newest first, optionally filtered by
    /// status.
    pub async fn list_requests(
        &self,
        company_id: Uuid,
        status: Option<TransferRequestStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_transfer_request::Model>, u64), ServiceError> {
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

        let db = self.db.as_ref();
        let mut query = TransferRequestEntity::find()
            .filter(stock_transfer_request::Column::CompanyId.eq(company_id));
        if let Some(status) = status {
            query = query.filter(stock_transfer_request::Column::Status.eq(status.as_str()));
        }
        let paginator = query
            .order_by_desc(stock_transfer_request::Column::CreatedAt)
            .paginate(db, limit);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let requests = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((requests, total))
    }
}
