use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use async_trait::async_trait;

/// Lifecycle of a cross-warehouse transfer request.
///
/// ```text
/// PENDING_APPROVAL -> APPROVED -> SHIPPED -> RECEIVED
///        |               |
///        v               v
///     REJECTED       CANCELLED   (also reachable from PENDING_APPROVAL)
/// ```
/// RECEIVED, REJECTED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferRequestStatus {
    PendingApproval,
    Approved,
    Shipped,
    Received,
    Rejected,
    Cancelled,
}

impl TransferRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferRequestStatus::PendingApproval => "PENDING_APPROVAL",
            TransferRequestStatus::Approved => "APPROVED",
            TransferRequestStatus::Shipped => "SHIPPED",
            TransferRequestStatus::Received => "RECEIVED",
            TransferRequestStatus::Rejected => "REJECTED",
            TransferRequestStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING_APPROVAL" => Some(TransferRequestStatus::PendingApproval),
            "APPROVED" => Some(TransferRequestStatus::Approved),
            "SHIPPED" => Some(TransferRequestStatus::Shipped),
            "RECEIVED" => Some(TransferRequestStatus::Received),
            "REJECTED" => Some(TransferRequestStatus::Rejected),
            "CANCELLED" => Some(TransferRequestStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferRequestStatus::Received
                | TransferRequestStatus::Rejected
                | TransferRequestStatus::Cancelled
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transfer_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub requesting_warehouse_id: Uuid,
    pub company_id: Uuid,
    pub requested_by: Uuid,
    pub status: String, // Stored as string; converted via TransferRequestStatus
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub received_by: Option<Uuid>,
    pub rejected_by: Option<Uuid>,
    pub cancelled_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_transfer_request_item::Entity")]
    Items,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::RequestingWarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    RequestingWarehouse,
}

impl Related<super::stock_transfer_request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestingWarehouse.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
        }
        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}
