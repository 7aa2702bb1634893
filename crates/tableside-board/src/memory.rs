//! In-process broker stand-in.
//!
//! [`MemoryBroker`] implements [`Connect`] without any network: it records
//! every subscribe, publish, and disconnect request its transports receive
//! and lets the caller inject [`TransportEvent`]s into the most recent
//! connection. Useful for running the board offline and for tests.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tableside_types::DeliveryQos;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::transport::{Connect, EVENT_CHANNEL_CAPACITY, Transport, TransportEvent};

/// A publish request captured by the memory broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Topic the payload was published on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
    /// Requested delivery level.
    pub qos: DeliveryQos,
}

#[derive(Debug, Default)]
struct Log {
    client_ids: Vec<String>,
    subscriptions: Vec<(String, DeliveryQos)>,
    published: Vec<Published>,
    disconnects: usize,
    current: Option<mpsc::Sender<TransportEvent>>,
}

/// Recording broker shared by all transports it creates.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    log: Arc<Mutex<Log>>,
}

impl MemoryBroker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections opened so far.
    pub fn connect_count(&self) -> usize {
        self.lock().client_ids.len()
    }

    /// Client identifiers of every connection, oldest first.
    pub fn client_ids(&self) -> Vec<String> {
        self.lock().client_ids.clone()
    }

    /// Every subscribed topic in request order, duplicates included.
    pub fn subscriptions(&self) -> Vec<String> {
        self.lock()
            .subscriptions
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    /// Every subscription together with its delivery level.
    pub fn subscription_requests(&self) -> Vec<(String, DeliveryQos)> {
        self.lock().subscriptions.clone()
    }

    /// Every publish request in order.
    pub fn published(&self) -> Vec<Published> {
        self.lock().published.clone()
    }

    /// Number of disconnect requests received.
    pub fn disconnect_count(&self) -> usize {
        self.lock().disconnects
    }

    /// Deliver `event` to the most recent connection.
    ///
    /// Returns `false` if there is no connection or its receiver is gone.
    pub async fn emit(&self, event: TransportEvent) -> bool {
        let sender = self.lock().current.clone();
        match sender {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connect for MemoryBroker {
    type Transport = MemoryTransport;

    fn connect(
        &self,
        _config: &BoardConfig,
        client_id: &str,
    ) -> Result<(MemoryTransport, mpsc::Receiver<TransportEvent>), BoardError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        {
            let mut log = self.lock();
            log.client_ids.push(client_id.to_owned());
            log.current = Some(tx);
        }
        Ok((
            MemoryTransport {
                broker: self.clone(),
            },
            rx,
        ))
    }
}

/// Transport handle produced by [`MemoryBroker`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    broker: MemoryBroker,
}

impl Transport for MemoryTransport {
    fn subscribe(
        &self,
        topic: &str,
        qos: DeliveryQos,
    ) -> impl Future<Output = Result<(), BoardError>> + Send {
        self.broker
            .lock()
            .subscriptions
            .push((topic.to_owned(), qos));
        std::future::ready(Ok(()))
    }

    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: DeliveryQos,
    ) -> impl Future<Output = Result<(), BoardError>> + Send {
        self.broker.lock().published.push(Published {
            topic: topic.to_owned(),
            payload,
            qos,
        });
        std::future::ready(Ok(()))
    }

    async fn disconnect(&self) -> Result<(), BoardError> {
        let sender = {
            let mut log = self.broker.lock();
            log.disconnects = log.disconnects.saturating_add(1);
            log.current.take()
        };
        if let Some(sender) = sender {
            if sender.send(TransportEvent::Closed).await.is_err() {
                debug!("memory connection receiver already gone");
            }
        }
        Ok(())
    }
}
