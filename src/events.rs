use tokio::sync::broadcast;

/// Store-level events other subsystems can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// A housekeeping pass finished and committed. Carries no payload;
    /// observers re-query whatever state they care about.
    HousekeepingCompleted,
}

/// Fire-and-forget broadcast bus. Publishing never fails and never blocks;
/// an event with no subscribers is simply dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
