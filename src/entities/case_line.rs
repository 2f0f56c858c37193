use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use async_trait::async_trait;

/// Repair-case-line status values the parts workflow propagates. The repair
/// case domain itself lives elsewhere; this entity only backs the status-sync
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseLineStatus {
    Diagnosed,
    WaitingForParts,
    PartsAvailable,
    RejectedByOem,
    Completed,
}

impl CaseLineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseLineStatus::Diagnosed => "DIAGNOSED",
            CaseLineStatus::WaitingForParts => "WAITING_FOR_PARTS",
            CaseLineStatus::PartsAvailable => "PARTS_AVAILABLE",
            CaseLineStatus::RejectedByOem => "REJECTED_BY_OEM",
            CaseLineStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DIAGNOSED" => Some(CaseLineStatus::Diagnosed),
            "WAITING_FOR_PARTS" => Some(CaseLineStatus::WaitingForParts),
            "PARTS_AVAILABLE" => Some(CaseLineStatus::PartsAvailable),
            "REJECTED_BY_OEM" => Some(CaseLineStatus::RejectedByOem),
            "COMPLETED" => Some(CaseLineStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "case_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: String, // Stored as string; converted via CaseLineStatus
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

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
