//! Post-commit fan-out of booking events to downstream collaborators
//! (receipts, email). Delivery is best-effort: each handler drains its own
//! queue on a long-lived task, so it sees events in publish order, and its
//! failures never reach the booking caller.

use std::sync::Arc;

use agenda_core::events::BookingEvent;
use async_trait::async_trait;
use eyre::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &BookingEvent) -> Result<()>;
}

#[derive(Clone)]
struct Subscriber {
    name: &'static str,
    queue: mpsc::UnboundedSender<Arc<BookingEvent>>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the delivery task for `handler`. Must be called from within a
    /// Tokio runtime. The task ends once every clone of the bus is dropped.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        let (queue, mut rx) = mpsc::unbounded_channel::<Arc<BookingEvent>>();
        let name = handler.name();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(err) = handler.handle(&event).await {
                    error!(
                        handler = handler.name(),
                        kind = event.kind(),
                        person_id = %event.person_id(),
                        "Booking event delivery failed: {:#}",
                        err
                    );
                }
            }
        });

        self.subscribers.push(Subscriber { name, queue });
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Queues `event` for every handler and returns at once.
    pub fn publish(&self, event: BookingEvent) {
        let event = Arc::new(event);
        for subscriber in &self.subscribers {
            if subscriber.queue.send(event.clone()).is_err() {
                warn!(
                    handler = subscriber.name,
                    kind = event.kind(),
                    "Event handler stopped, dropping event"
                );
            }
        }
    }
}

/// Writes every event to the log. Registered by the server so bookings leave
/// a trail even when no notifier is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

#[async_trait]
impl EventHandler for LoggingHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(&self, event: &BookingEvent) -> Result<()> {
        match event {
            BookingEvent::Confirmed {
                person_id,
                calendar_id,
                slot_template_label,
                date,
                ..
            } => info!(
                %person_id, %calendar_id, %date,
                "Booking confirmed at {}", slot_template_label
            ),
            BookingEvent::Cancelled {
                person_id,
                calendar_id,
                slot_template_label,
                date,
                ..
            } => info!(
                %person_id, %calendar_id, %date,
                "Booking at {} cancelled", slot_template_label
            ),
            BookingEvent::Rescheduled {
                person_id,
                calendar_id,
                from_label,
                to_label,
                date,
                ..
            } => info!(
                %person_id, %calendar_id, %date,
                "Booking moved from {} to {}", from_label, to_label
            ),
        }
        Ok(())
    }
}
