//! HTTP handlers: thin translation between the wire DTOs and the services.

pub mod stock;
pub mod transfer_requests;
