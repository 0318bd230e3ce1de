use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::events::RealtimeEvent;

const BROADCAST_CAPACITY: usize = 1024;

type UserConnections = HashMap<Uuid, mpsc::UnboundedSender<RealtimeEvent>>;

/// Routes realtime events to connected clients.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Public events, delivered to every connection
    broadcast_tx: broadcast::Sender<RealtimeEvent>,

    /// user_id -> (connection_id -> sender); a user may be connected from several devices
    connections: RwLock<HashMap<Uuid, UserConnections>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                connections: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Send to every connection. Dropped silently when nobody is listening.
    pub fn broadcast(&self, event: RealtimeEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Route an event by its visibility.
    pub async fn publish(&self, recipients: &[Uuid], event: RealtimeEvent) {
        if event.is_public() {
            self.broadcast(event);
            return;
        }

        for user_id in recipients {
            self.send_to_user(*user_id, event.clone()).await;
        }
    }

    pub async fn register(&self, user_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<RealtimeEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .connections
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(conn_id, tx);
        (conn_id, rx)
    }

    pub async fn unregister(&self, user_id: Uuid, conn_id: Uuid) {
        let mut connections = self.inner.connections.write().await;
        if let Some(user_connections) = connections.get_mut(&user_id) {
            user_connections.remove(&conn_id);
            if user_connections.is_empty() {
                connections.remove(&user_id);
            }
        }
    }

    /// Deliver to all of a user's connections; returns how many accepted it.
    pub async fn send_to_user(&self, user_id: Uuid, event: RealtimeEvent) -> usize {
        let connections = self.inner.connections.read().await;
        let Some(user_connections) = connections.get(&user_id) else {
            return 0;
        };

        user_connections
            .values()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.inner.connections.read().await.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rsvp::RsvpStatus;

    fn ready(user_id: Uuid) -> RealtimeEvent {
        RealtimeEvent::Ready { user_id }
    }

    #[tokio::test]
    async fn test_send_to_user_reaches_every_connection() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();
        let (_, mut phone) = dispatcher.register(user).await;
        let (_, mut laptop) = dispatcher.register(user).await;

        assert_eq!(dispatcher.send_to_user(user, ready(user)).await, 2);
        assert!(matches!(phone.recv().await, Some(RealtimeEvent::Ready { .. })));
        assert!(matches!(laptop.recv().await, Some(RealtimeEvent::Ready { .. })));
    }

    #[tokio::test]
    async fn test_offline_user_receives_nothing() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();
        assert_eq!(dispatcher.send_to_user(user, ready(user)).await, 0);
        assert!(!dispatcher.is_online(user).await);
    }

    #[tokio::test]
    async fn test_unregister_only_drops_that_connection() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();
        let (first, _rx1) = dispatcher.register(user).await;
        let (second, _rx2) = dispatcher.register(user).await;

        dispatcher.unregister(user, first).await;
        assert!(dispatcher.is_online(user).await);
        assert_eq!(dispatcher.send_to_user(user, ready(user)).await, 1);

        dispatcher.unregister(user, second).await;
        assert!(!dispatcher.is_online(user).await);
    }

    #[tokio::test]
    async fn test_publish_routes_by_visibility() {
        let dispatcher = Dispatcher::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let (_, mut alice_rx) = dispatcher.register(alice).await;
        let (_, mut bob_rx) = dispatcher.register(bob).await;
        let mut public_rx = dispatcher.subscribe();

        dispatcher.publish(&[alice], ready(alice)).await;
        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_err());
        assert!(public_rx.try_recv().is_err());

        dispatcher
            .publish(
                &[],
                RealtimeEvent::RsvpUpdated {
                    event_id: Uuid::new_v4(),
                    user_id: bob,
                    status: Some(RsvpStatus::Maybe),
                },
            )
            .await;
        assert!(matches!(
            public_rx.recv().await,
            Ok(RealtimeEvent::RsvpUpdated { .. })
        ));
    }
}
