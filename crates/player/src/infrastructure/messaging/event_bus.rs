//! Fan-out of decoded real-time events.
//!
//! Each subscriber gets its own unbounded receiver, so a slow reader never
//! stalls the bridge. Senders whose receiver is gone are dropped on the next
//! dispatch.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::ports::outbound::RealtimeEvent;

#[derive(Clone, Default)]
pub struct EventBus {
    sinks: Arc<Mutex<Vec<mpsc::UnboundedSender<RealtimeEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event dispatched from now on, in dispatch order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RealtimeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    pub fn dispatch(&self, event: RealtimeEvent) {
        self.lock().retain(|sink| sink.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().iter().filter(|sink| !sink.is_closed()).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<RealtimeEvent>>> {
        self.sinks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
