// Native BLE capability the screen is handed at construction

use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::error::Result;
use crate::peripheral::{DiscoveredPeripheral, PeripheralId};

const DISCOVERY_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Ask the platform to prompt the user when Bluetooth is off.
    pub show_alert: bool,
}

pub trait BleBinding {
    /// Initialise the adapter.
    fn start(&self, options: &StartOptions) -> impl Future<Output = Result<()>> + Send;

    /// Start a time-bounded scan. Resolves once the scan is running;
    /// results arrive through [`BleBinding::subscribe`].
    fn scan(
        &self,
        service_uuids: &[Uuid],
        timeout: Duration,
        allow_duplicates: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    fn connect(&self, id: &PeripheralId) -> impl Future<Output = Result<()>> + Send;

    fn disconnect(&self, id: &PeripheralId) -> impl Future<Output = Result<()>> + Send;

    /// Register a "peripheral discovered" listener.
    fn subscribe(&self) -> Subscription;
}

/// Fan-out of discovery events to every registered listener.
#[derive(Debug, Clone)]
pub struct DiscoveryEvents {
    sender: broadcast::Sender<DiscoveredPeripheral>,
}

impl Default for DiscoveryEvents {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(DISCOVERY_CHANNEL_CAPACITY);
        DiscoveryEvents { sender }
    }
}

impl DiscoveryEvents {
    pub fn emit(&self, peripheral: DiscoveredPeripheral) {
        if self.sender.send(peripheral).is_err() {
            debug!("Discovery event dropped, no listener registered");
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A registered discovery listener. Dropping it removes the listener.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<DiscoveredPeripheral>,
}

impl Subscription {
    /// Next discovery event, or `None` once the binding is gone.
    pub async fn recv(&mut self) -> Option<DiscoveredPeripheral> {
        loop {
            match self.receiver.recv().await {
                Ok(peripheral) => return Some(peripheral),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Discovery listener lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
