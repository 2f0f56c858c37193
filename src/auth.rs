//! Authorization context.
//!
//! Authentication happens upstream (gateway); requests arrive with validated
//! identity headers. This module only extracts them into a typed context and
//! names the roles the workflow gates on.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Actor roles relevant to the parts workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Central (OEM/company) staff: approves, ships, and may cancel approved
    /// requests.
    EmvStaff,
    /// Service-center manager: creates requests, receives shipments, may
    /// cancel only before approval.
    ServiceCenterManager,
    /// Service-center technician: receives shipments.
    ServiceCenterTechnician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::EmvStaff => "emv_staff",
            Role::ServiceCenterManager => "service_center_manager",
            Role::ServiceCenterTechnician => "service_center_technician",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "emv_staff" => Some(Role::EmvStaff),
            "service_center_manager" => Some(Role::ServiceCenterManager),
            "service_center_technician" => Some(Role::ServiceCenterTechnician),
            _ => None,
        }
    }
}

/// Validated identity of the calling actor.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub company_id: Uuid,
    pub service_center_id: Option<Uuid>,
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Option<Uuid>, ServiceError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let raw = value.to_str().map_err(|_| {
                ServiceError::Unauthorized(format!("Header {} is not valid UTF-8", name))
            })?;
            let id = Uuid::parse_str(raw).map_err(|_| {
                ServiceError::Unauthorized(format!("Header {} is not a valid UUID", name))
            })?;
            Ok(Some(id))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_uuid(parts, "x-user-id")?
            .ok_or_else(|| ServiceError::Unauthorized("Missing x-user-id header".into()))?;
        let company_id = header_uuid(parts, "x-company-id")?
            .ok_or_else(|| ServiceError::Unauthorized("Missing x-company-id header".into()))?;
        let service_center_id = header_uuid(parts, "x-service-center-id")?;

        let role_raw = parts
            .headers
            .get("x-role")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing x-role header".into()))?;
        let role = Role::from_str(role_raw)
            .ok_or_else(|| ServiceError::Unauthorized(format!("Unknown role: {}", role_raw)))?;

        Ok(AuthContext {
            user_id,
            role,
            company_id,
            service_center_id,
        })
    }
}
