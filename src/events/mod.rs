//! Domain events for the transfer lifecycle.
//!
//! Services send events through an mpsc channel after their transaction
//! commits; a spawned processor loop forwards them to interested notification
//! rooms. The channel decouples delivery from the request path, so a slow or
//! failing notifier can never roll back a committed transition.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::notifications::{service_center_room, warehouse_room, Notifier};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Events emitted by the transfer-request workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    TransferRequestCreated {
        request_id: Uuid,
        requesting_warehouse_id: Uuid,
    },
    TransferRequestApproved {
        request_id: Uuid,
        requesting_warehouse_id: Uuid,
        service_center_id: Option<Uuid>,
        reservation_count: usize,
    },
    ReservationShipped {
        request_id: Uuid,
        reservation_id: Uuid,
        quantity: i32,
    },
    TransferRequestShipped {
        request_id: Uuid,
        requesting_warehouse_id: Uuid,
        service_center_id: Option<Uuid>,
    },
    TransferRequestReceived {
        request_id: Uuid,
        requesting_warehouse_id: Uuid,
        service_center_id: Option<Uuid>,
    },
    TransferRequestRejected {
        request_id: Uuid,
        requesting_warehouse_id: Uuid,
        service_center_id: Option<Uuid>,
        reason: String,
    },
    TransferRequestCancelled {
        request_id: Uuid,
        requesting_warehouse_id: Uuid,
        reason: String,
    },
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::TransferRequestCreated { .. } => "transfer_request.created",
            Event::TransferRequestApproved { .. } => "transfer_request.approved",
            Event::ReservationShipped { .. } => "transfer_request.reservation_shipped",
            Event::TransferRequestShipped { .. } => "transfer_request.shipped",
            Event::TransferRequestReceived { .. } => "transfer_request.received",
            Event::TransferRequestRejected { .. } => "transfer_request.rejected",
            Event::TransferRequestCancelled { .. } => "transfer_request.cancelled",
        }
    }

    /// Notification rooms that should hear about this event.
    fn rooms(&self) -> Vec<String> {
        match self {
            Event::TransferRequestCreated {
                requesting_warehouse_id,
                ..
            }
            | Event::TransferRequestCancelled {
                requesting_warehouse_id,
                ..
            } => vec![warehouse_room(*requesting_warehouse_id)],
            Event::TransferRequestApproved {
                requesting_warehouse_id,
                service_center_id,
                ..
            }
            | Event::TransferRequestShipped {
                requesting_warehouse_id,
                service_center_id,
                ..
            }
            | Event::TransferRequestReceived {
                requesting_warehouse_id,
                service_center_id,
                ..
            }
            | Event::TransferRequestRejected {
                requesting_warehouse_id,
                service_center_id,
                ..
            } => {
                let mut rooms = vec![warehouse_room(*requesting_warehouse_id)];
                if let Some(sc) = service_center_id {
                    rooms.push(service_center_room(*sc));
                }
                rooms
            }
            Event::ReservationShipped { .. } => Vec::new(),
        }
    }
}

/// Consumes events off the channel and fans them out to notification rooms.
/// Runs until every `EventSender` is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>, notifier: Arc<dyn Notifier>) {
    while let Some(event) = receiver.recv().await {
        let name = event.name();
        let rooms = event.rooms();
        let payload = match serde_json::to_value(&event) {
            Ok(value) => value,
            Err(e) => {
                warn!(event = name, error = %e, "Failed to serialize event payload");
                json!({})
            }
        };
        info!(event = name, rooms = rooms.len(), "Processing event");
        notifier.send_to_rooms(&rooms, name, payload).await;
    }
    info!("Event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_event_targets_warehouse_and_service_center() {
        let wh = Uuid::new_v4();
        let sc = Uuid::new_v4();
        let event = Event::TransferRequestApproved {
            request_id: Uuid::new_v4(),
            requesting_warehouse_id: wh,
            service_center_id: Some(sc),
            reservation_count: 2,
        };
        let rooms = event.rooms();
        assert_eq!(rooms.len(), 2);
        assert!(rooms.contains(&warehouse_room(wh)));
        assert!(rooms.contains(&service_center_room(sc)));
    }

    #[test]
    fn created_event_targets_requesting_warehouse_only() {
        let wh = Uuid::new_v4();
        let event = Event::TransferRequestCreated {
            request_id: Uuid::new_v4(),
            requesting_warehouse_id: wh,
        };
        assert_eq!(event.rooms(), vec![warehouse_room(wh)]);
    }
}
