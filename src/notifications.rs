//! Room-addressed notification fan-out.
//!
//! The workflow publishes to named rooms (a requesting warehouse, a service
//! center) without waiting for delivery acknowledgement. Delivery failures are
//! logged and swallowed: notifications run after the transaction committed and
//! must never undo a state transition.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

/// Fire-and-forget notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_to_room(&self, room: &str, event: &str, payload: Value);

    async fn send_to_rooms(&self, rooms: &[String], event: &str, payload: Value) {
        for room in rooms {
            self.send_to_room(room, event, payload.clone()).await;
        }
    }
}

/// Default sink that records notifications in the log stream. A websocket or
/// push transport slots in behind the same trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_to_room(&self, room: &str, event: &str, payload: Value) {
        info!(room = %room, event = %event, payload = %payload, "notification");
    }
}

/// Room naming shared by producers and any future consumer transport.
pub fn warehouse_room(warehouse_id: uuid::Uuid) -> String {
    format!("warehouse:{}", warehouse_id)
}

pub fn service_center_room(service_center_id: uuid::Uuid) -> String {
    format!("service_center:{}", service_center_id)
}
