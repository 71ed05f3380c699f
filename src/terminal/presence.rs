use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::presence::PresenceEntry;

/// How long a roster entry survives without a fresh update. Publishers do not
/// unpublish explicitly; going quiet (session end, tab close, device sleep)
/// is how membership ends.
const LIVENESS_WINDOW_SECS: i64 = 90;

#[derive(Debug, Clone)]
pub enum PresenceEvent {
    Update(PresenceEntry),
    Left(String),
}

/// Shared live-only channel: active terminal sessions publish positions, the
/// manager map consumes them. No history, no persistence.
#[derive(Clone)]
pub struct PresenceChannel {
    tx: broadcast::Sender<PresenceEvent>,
}

impl PresenceChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn publish(&self, event: PresenceEvent) {
        // No subscribers is fine; the signal is best-effort.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.tx.subscribe()
    }
}

impl Default for PresenceChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Manager-facing consumer: a live roster keyed by employee name.
pub struct PresenceRoster {
    entries: Mutex<HashMap<String, PresenceEntry>>,
}

impl PresenceRoster {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribes to the channel and keeps applying events until the channel
    /// closes.
    pub fn spawn(channel: &PresenceChannel) -> Arc<Self> {
        let roster = Arc::new(Self::new());
        let consumer = roster.clone();
        let mut rx = channel.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => consumer.apply(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "Presence consumer lagged, entries will refresh");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        roster
    }

    pub fn apply(&self, event: PresenceEvent) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            PresenceEvent::Update(entry) => {
                entries.insert(entry.employee_name.clone(), entry);
            }
            PresenceEvent::Left(name) => {
                entries.remove(&name);
            }
        }
    }

    /// Current roster, dropping entries that went quiet.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<PresenceEntry> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, e| now - e.at < Duration::seconds(LIVENESS_WINDOW_SECS));
        let mut live: Vec<_> = entries.values().cloned().collect();
        live.sort_by(|a, b| a.employee_name.cmp(&b.employee_name));
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, at: DateTime<Utc>) -> PresenceEntry {
        PresenceEntry {
            employee_name: name.into(),
            lat: -1.2825,
            lng: 36.8967,
            at,
        }
    }

    #[test]
    fn updates_key_by_name_and_leave_removes() {
        let roster = PresenceRoster::new();
        let now = Utc::now();

        roster.apply(PresenceEvent::Update(entry("Jane Wanjiru", now)));
        roster.apply(PresenceEvent::Update(entry("Brian Otieno", now)));
        roster.apply(PresenceEvent::Update(entry("Jane Wanjiru", now)));
        assert_eq!(roster.snapshot(now).len(), 2);

        roster.apply(PresenceEvent::Left("Jane Wanjiru".into()));
        let live = roster.snapshot(now);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].employee_name, "Brian Otieno");
    }

    #[test]
    fn quiet_entries_expire_from_snapshot() {
        let roster = PresenceRoster::new();
        let now = Utc::now();

        roster.apply(PresenceEvent::Update(entry(
            "Jane Wanjiru",
            now - Duration::seconds(LIVENESS_WINDOW_SECS + 5),
        )));
        roster.apply(PresenceEvent::Update(entry("Brian Otieno", now)));

        let live = roster.snapshot(now);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].employee_name, "Brian Otieno");
    }

    #[tokio::test]
    async fn channel_delivers_to_spawned_roster() {
        let channel = PresenceChannel::new();
        let roster = PresenceRoster::spawn(&channel);

        let now = Utc::now();
        channel.publish(PresenceEvent::Update(entry("Jane Wanjiru", now)));

        for _ in 0..50 {
            if !roster.snapshot(now).is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(roster.snapshot(now).len(), 1);
    }
}
