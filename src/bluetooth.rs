// Bluetooth Low Energy binding over BlueZ using the bluer crate

use bluer::{Adapter, AdapterEvent, Address, Device, DiscoveryFilter, DiscoveryTransport};
use futures::StreamExt;
use log::{debug, info};
use std::time::Duration;
use uuid::Uuid;

use crate::binding::{BleBinding, DiscoveryEvents, StartOptions, Subscription};
use crate::error::{BleError, Result};
use crate::peripheral::{DiscoveredPeripheral, PeripheralId};

pub struct BluerBinding {
    // Keeps the D-Bus connection alive for the adapter.
    _session: bluer::Session,
    adapter: Adapter,
    events: DiscoveryEvents,
}

impl BluerBinding {
    /// Open a BlueZ session on `adapter_name`, or the default adapter.
    pub async fn new(adapter_name: Option<&str>) -> Result<Self> {
        let session = bluer::Session::new().await?;
        let adapter = match adapter_name {
            Some(name) => session.adapter(name),
            None => session.default_adapter().await,
        }
        .map_err(|e| {
            let name = adapter_name.unwrap_or("default adapter");
            BleError::AdapterUnavailable(format!("{}: {}", name, e))
        })?;

        info!("Using Bluetooth adapter: {}", adapter.name());

        Ok(BluerBinding {
            _session: session,
            adapter,
            events: DiscoveryEvents::default(),
        })
    }

    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    fn device(&self, id: &PeripheralId) -> Result<Device> {
        let address: Address = id
            .as_str()
            .parse()
            .map_err(|_| BleError::InvalidId(id.to_string()))?;
        Ok(self.adapter.device(address)?)
    }
}

impl BleBinding for BluerBinding {
    async fn start(&self, options: &StartOptions) -> Result<()> {
        // BlueZ has no "enable Bluetooth?" prompt; power the adapter instead.
        if options.show_alert {
            debug!("show_alert has no effect on BlueZ");
        }
        self.adapter.set_powered(true).await?;
        debug!("Adapter {} powered on", self.adapter.name());
        Ok(())
    }

    async fn scan(
        &self,
        service_uuids: &[Uuid],
        timeout: Duration,
        allow_duplicates: bool,
    ) -> Result<()> {
        let filter = DiscoveryFilter {
            uuids: service_uuids.iter().copied().collect(),
            duplicate_data: allow_duplicates,
            transport: DiscoveryTransport::Le,
            ..Default::default()
        };
        self.adapter.set_discovery_filter(filter).await?;

        let discover = self.adapter.discover_devices().await?;
        info!("BLE scan started ({} s window)", timeout.as_secs());

        let adapter = self.adapter.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            // Discovery stays active while the stream is alive.
            let discover = discover.take_until(tokio::time::sleep(timeout));
            tokio::pin!(discover);

            while let Some(event) = discover.next().await {
                if let AdapterEvent::DeviceAdded(address) = event {
                    match describe(&adapter, address).await {
                        Ok(peripheral) => {
                            debug!("Discovered {} ({:?})", peripheral.id, peripheral.name);
                            events.emit(peripheral);
                        }
                        Err(e) => debug!("Skipping {}: {}", address, e),
                    }
                }
            }
            info!("BLE scan finished");
        });

        Ok(())
    }

    async fn connect(&self, id: &PeripheralId) -> Result<()> {
        let device = self.device(id)?;
        device.connect().await?;
        Ok(())
    }

    async fn disconnect(&self, id: &PeripheralId) -> Result<()> {
        let device = self.device(id)?;
        device.disconnect().await?;
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }
}

async fn describe(adapter: &Adapter, address: Address) -> Result<DiscoveredPeripheral> {
    let device = adapter.device(address)?;
    let name = device.name().await?;
    let connected = device.is_connected().await?;
    Ok(DiscoveredPeripheral {
        id: PeripheralId::new(address.to_string()),
        name,
        connected,
    })
}
