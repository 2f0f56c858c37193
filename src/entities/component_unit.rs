use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use async_trait::async_trait;

/// Custody status of a physical component unit.
///
/// `warehouse_id`, `vehicle_vin` and `transfer_item_id` must stay consistent
/// with the status: a unit in a warehouse has `warehouse_id` set and no VIN;
/// an in-transit unit has the claiming transfer item set and no warehouse; an
/// installed unit has a VIN and neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentStatus {
    InWarehouse,
    Reserved,
    InTransit,
    WithTechnician,
    Installed,
    Returned,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::InWarehouse => "IN_WAREHOUSE",
            ComponentStatus::Reserved => "RESERVED",
            ComponentStatus::InTransit => "IN_TRANSIT",
            ComponentStatus::WithTechnician => "WITH_TECHNICIAN",
            ComponentStatus::Installed => "INSTALLED",
            ComponentStatus::Returned => "RETURNED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN_WAREHOUSE" => Some(ComponentStatus::InWarehouse),
            "RESERVED" => Some(ComponentStatus::Reserved),
            "IN_TRANSIT" => Some(ComponentStatus::InTransit),
            "WITH_TECHNICIAN" => Some(ComponentStatus::WithTechnician),
            "INSTALLED" => Some(ComponentStatus::Installed),
            "RETURNED" => Some(ComponentStatus::Returned),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "component_units")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub serial_number: String,
    pub type_component_id: Uuid,
    pub status: String, // Stored as string; converted via ComponentStatus
    pub warehouse_id: Option<Uuid>,
    pub vehicle_vin: Option<String>,
    pub transfer_item_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_transfer_request_item::Entity",
        from = "Column::TransferItemId",
        to = "super::stock_transfer_request_item::Column::Id"
    )]
    TransferItem,
}

impl Related<super::stock_transfer_request_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransferItem.def()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            ComponentStatus::InWarehouse,
            ComponentStatus::Reserved,
            ComponentStatus::InTransit,
            ComponentStatus::WithTechnician,
            ComponentStatus::Installed,
            ComponentStatus::Returned,
        ] {
            assert_eq!(ComponentStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ComponentStatus::from_str("LOST"), None);
    }
}
