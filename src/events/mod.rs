//! Domain events published after a successful commit.
//!
//! Consumers (cache invalidation, page refresh, notifications) subscribe on
//! the receiving end of the channel; the core only guarantees that an event
//! is sent after its transaction committed, never as part of it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Events emitted by the stock-movement operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockAdjusted {
        inventory_id: Uuid,
        site_id: Uuid,
        product_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
        reason: String,
        movement_id: Uuid,
    },
    StockTransferred {
        product_id: Uuid,
        from_site_id: Uuid,
        to_site_id: Uuid,
        quantity: i32,
        out_movement_id: Uuid,
        in_movement_id: Uuid,
    },
    ShelfStocked {
        bin_id: Uuid,
        shelf_id: Uuid,
        site_id: Uuid,
        product_id: Uuid,
        added_quantity: i32,
        bin_quantity: i32,
    },
    ShelfPicked {
        bin_id: Uuid,
        shelf_id: Uuid,
        site_id: Uuid,
        product_id: Uuid,
        removed_quantity: i32,
        remaining_quantity: i32,
    },
    ShelfCleared {
        bin_id: Uuid,
        shelf_id: Uuid,
        site_id: Uuid,
        product_id: Uuid,
        released_quantity: i32,
    },
}

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

#[cfg(test)]
mod tests {
    use super::*;

    // Webhook and cache-invalidation consumers deserialize these payloads;
    // the variant tag and field names are part of the contract.
    #[test]
    fn events_serialize_with_stable_field_names() {
        let event = Event::StockAdjusted {
            inventory_id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            old_quantity: 100,
            new_quantity: 80,
            reason: "CYCLE_COUNT".to_string(),
            movement_id: Uuid::new_v4(),
        };

        let json = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(json["StockAdjusted"]["old_quantity"], 100);
        assert_eq!(json["StockAdjusted"]["new_quantity"], 80);
        assert_eq!(json["StockAdjusted"]["reason"], "CYCLE_COUNT");
    }
}
