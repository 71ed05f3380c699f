use tokio::sync::watch;
use tracing::info;

/// Online/offline flag fed by the device's connectivity events. Watchers see
/// every transition; the sync reconciler drains the queue on each
/// offline→online edge.
pub struct Connectivity {
    tx: watch::Sender<bool>,
}

impl Connectivity {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "Connectivity changed");
        }
    }

    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watcher_sees_offline_online_transition() {
        let conn = Connectivity::new(true);
        let mut rx = conn.watch();

        conn.set_online(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());

        conn.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[test]
    fn redundant_events_do_not_signal() {
        let conn = Connectivity::new(true);
        let rx = conn.watch();
        conn.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
