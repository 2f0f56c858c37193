//! SeaORM entities for the warranty-parts domain.

pub mod case_line;
pub mod component_unit;
pub mod stock_record;
pub mod stock_reservation;
pub mod stock_transfer_request;
pub mod stock_transfer_request_item;
pub mod warehouse;
