// Scanner screen: device list, connected peripheral, user intents
//
// Every binding failure is logged and leaves the state untouched. Nothing
// here retries, and nothing reacts to disconnects the user did not ask for.

use log::{debug, error, info, warn};
use std::time::Duration;
use uuid::Uuid;

use crate::binding::{BleBinding, StartOptions, Subscription};
use crate::error::{BleError, Result};
use crate::peripheral::{self, DiscoveredPeripheral, Peripheral, PeripheralId};
use crate::permissions::{
    required_permissions, Permission, PermissionRequester, PermissionStatus, Platform, Rationale,
};
use crate::view::{Labels, Panel, Row, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub service_uuids: Vec<Uuid>,
    pub timeout: Duration,
    pub allow_duplicates: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            service_uuids: Vec::new(),
            timeout: Duration::from_secs(5),
            allow_duplicates: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenOptions {
    pub start: StartOptions,
    pub scan: ScanOptions,
    pub platform: Platform,
    pub scan_rationale: Rationale,
    pub placeholder_name: String,
    pub labels: Labels,
}

impl ScreenOptions {
    fn placeholder(&self) -> &str {
        if self.placeholder_name.is_empty() {
            peripheral::DEFAULT_PLACEHOLDER_NAME
        } else {
            &self.placeholder_name
        }
    }
}

pub struct Screen<B> {
    binding: B,
    options: ScreenOptions,
    devices: Vec<Peripheral>,
    connected: Option<PeripheralId>,
}

impl<B: BleBinding> Screen<B> {
    pub fn new(binding: B, options: ScreenOptions) -> Self {
        Screen {
            binding,
            options,
            devices: Vec::new(),
            connected: None,
        }
    }

    /// Start the binding, request the platform's runtime permissions and
    /// register the discovery listener.
    ///
    /// The listener lives as long as the returned [`Subscription`]; pass it
    /// to [`Screen::unmount`] or drop it to unregister.
    pub async fn mount<P: PermissionRequester>(&self, permissions: &P) -> Subscription {
        match self.binding.start(&self.options.start).await {
            Ok(()) => info!("BLE binding started"),
            Err(e) => error!("Failed to start BLE binding: {}", e),
        }

        for permission in required_permissions(&self.options.platform) {
            let rationale = match permission {
                Permission::BluetoothScan => Some(&self.options.scan_rationale),
                Permission::AccessFineLocation => None,
            };
            match permissions.request(permission, rationale).await {
                PermissionStatus::Granted => info!("Permission {} granted", permission),
                status => warn!("Permission {} not granted: {:?}", permission, status),
            }
        }

        let subscription = self.binding.subscribe();
        debug!("Discovery listener registered");
        subscription
    }

    pub fn unmount(&self, subscription: Subscription) {
        drop(subscription);
        debug!("Discovery listener removed");
    }

    /// Scan with the configured service filter, window and duplicate policy.
    pub async fn scan(&self) {
        self.scan_with(&self.options.scan).await;
    }

    /// Failures are swallowed; the user simply sees no new rows.
    pub async fn scan_with(&self, scan: &ScanOptions) {
        if let Err(e) = self
            .binding
            .scan(&scan.service_uuids, scan.timeout, scan.allow_duplicates)
            .await
        {
            debug!("Scan failed: {}", e);
        }
    }

    /// Returns whether the record added a row.
    pub fn handle_discovery(&mut self, record: DiscoveredPeripheral) -> bool {
        match peripheral::admit(&self.devices, &record, self.options.placeholder()) {
            Some(entry) => {
                debug!("Listing {} ({})", entry.id, entry.name);
                self.devices.push(entry);
                true
            }
            None => false,
        }
    }

    pub async fn connect(&mut self, id: &PeripheralId) {
        if let Err(e) = self.ensure_listed(id) {
            warn!("Not connecting: {}", e);
            return;
        }
        match self.binding.connect(id).await {
            Ok(()) => {
                info!("Connected to {}", id);
                self.connected = Some(id.clone());
            }
            Err(e) => error!("Failed to connect to {}: {}", id, e),
        }
    }

    /// No-op unless a peripheral is connected.
    pub async fn disconnect(&mut self) {
        let Some(id) = self.connected.clone() else {
            debug!("Disconnect requested with nothing connected");
            return;
        };
        match self.binding.disconnect(&id).await {
            Ok(()) => {
                info!("Disconnected from {}", id);
                self.connected = None;
            }
            Err(e) => error!("Failed to disconnect from {}: {}", id, e),
        }
    }

    fn ensure_listed(&self, id: &PeripheralId) -> Result<()> {
        if self.devices.iter().any(|device| &device.id == id) {
            Ok(())
        } else {
            Err(BleError::UnknownPeripheral(id.to_string()))
        }
    }

    pub fn devices(&self) -> &[Peripheral] {
        &self.devices
    }

    /// Row `index`, counting from 1 as displayed.
    pub fn peripheral_at(&self, index: usize) -> Option<&Peripheral> {
        index.checked_sub(1).and_then(|i| self.devices.get(i))
    }

    pub fn connected(&self) -> Option<&Peripheral> {
        let id = self.connected.as_ref()?;
        self.devices.iter().find(|device| &device.id == id)
    }

    pub fn is_connected(&self, id: &PeripheralId) -> bool {
        self.connected.as_ref() == Some(id)
    }

    pub fn render(&self) -> View {
        let labels = &self.options.labels;
        let rows = self
            .devices
            .iter()
            .enumerate()
            .map(|(i, device)| Row {
                index: i + 1,
                name: device.name.clone(),
                id: device.id.clone(),
                connected: self.is_connected(&device.id),
            })
            .collect();
        let panel = self.connected().map(|device| Panel {
            title: labels.panel_title.clone(),
            name: device.name.clone(),
            id: device.id.clone(),
            disconnect_label: labels.disconnect.clone(),
        });
        View::new(labels, rows, panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::DiscoveryEvents;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Start(StartOptions),
        Scan(Vec<Uuid>, Duration, bool),
        Connect(String),
        Disconnect(String),
    }

    #[derive(Default)]
    struct FakeBinding {
        events: DiscoveryEvents,
        calls: Mutex<Vec<Call>>,
        failing: Mutex<Vec<&'static str>>,
    }

    impl FakeBinding {
        fn fail(&self, operation: &'static str) {
            self.failing.lock().unwrap().push(operation);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, operation: &'static str, call: Call) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.failing.lock().unwrap().contains(&operation) {
                return Err(BleError::Native(format!("{} refused", operation)));
            }
            Ok(())
        }
    }

    impl BleBinding for FakeBinding {
        async fn start(&self, options: &StartOptions) -> Result<()> {
            self.record("start", Call::Start(options.clone()))
        }

        async fn scan(
            &self,
            service_uuids: &[Uuid],
            timeout: Duration,
            allow_duplicates: bool,
        ) -> Result<()> {
            self.record(
                "scan",
                Call::Scan(service_uuids.to_vec(), timeout, allow_duplicates),
            )
        }

        async fn connect(&self, id: &PeripheralId) -> Result<()> {
            self.record("connect", Call::Connect(id.to_string()))
        }

        async fn disconnect(&self, id: &PeripheralId) -> Result<()> {
            self.record("disconnect", Call::Disconnect(id.to_string()))
        }

        fn subscribe(&self) -> Subscription {
            self.events.subscribe()
        }
    }

    #[derive(Default)]
    struct FakePermissions {
        requests: Mutex<Vec<(Permission, Option<String>)>>,
        deny: bool,
    }

    impl PermissionRequester for FakePermissions {
        async fn request(
            &self,
            permission: Permission,
            rationale: Option<&Rationale>,
        ) -> PermissionStatus {
            self.requests
                .lock()
                .unwrap()
                .push((permission, rationale.map(|r| r.title.clone())));
            if self.deny {
                PermissionStatus::Denied
            } else {
                PermissionStatus::Granted
            }
        }
    }

    fn screen() -> Screen<FakeBinding> {
        Screen::new(FakeBinding::default(), ScreenOptions::default())
    }

    fn listed(screen: &mut Screen<FakeBinding>, ids: &[(&str, Option<&str>)]) {
        for (id, name) in ids {
            screen.handle_discovery(DiscoveredPeripheral::new(*id, *name));
        }
    }

    #[tokio::test]
    async fn mount_starts_binding_and_registers_listener() {
        let screen = screen();
        let permissions = FakePermissions::default();

        let subscription = screen.mount(&permissions).await;

        assert_eq!(
            screen.binding.calls(),
            vec![Call::Start(StartOptions { show_alert: false })]
        );
        assert_eq!(screen.binding.events.listener_count(), 1);

        screen.unmount(subscription);
        assert_eq!(screen.binding.events.listener_count(), 0);
    }

    #[tokio::test]
    async fn mount_requests_android_permissions_in_order() {
        let options = ScreenOptions {
            platform: Platform::android(33),
            ..Default::default()
        };
        let screen = Screen::new(FakeBinding::default(), options);
        let permissions = FakePermissions::default();

        let _subscription = screen.mount(&permissions).await;

        assert_eq!(
            *permissions.requests.lock().unwrap(),
            vec![
                (Permission::AccessFineLocation, None),
                (
                    Permission::BluetoothScan,
                    Some("Quyền Quét Bluetooth".to_string())
                ),
            ]
        );
    }

    #[tokio::test]
    async fn mount_survives_start_failure_and_denied_permissions() {
        let binding = FakeBinding::default();
        binding.fail("start");
        let options = ScreenOptions {
            platform: Platform::android(31),
            ..Default::default()
        };
        let screen = Screen::new(binding, options);
        let permissions = FakePermissions {
            deny: true,
            ..Default::default()
        };

        let _subscription = screen.mount(&permissions).await;

        assert_eq!(screen.binding.events.listener_count(), 1);
        screen.scan().await;
        assert!(matches!(screen.binding.calls().last(), Some(Call::Scan(..))));
    }

    #[tokio::test]
    async fn discoveries_flow_through_the_subscription() {
        let mut screen = screen();
        let mut subscription = screen.mount(&FakePermissions::default()).await;

        screen
            .binding
            .events
            .emit(DiscoveredPeripheral::new("A", Some("Foo")));
        let record = subscription.recv().await.expect("discovery");

        assert!(screen.handle_discovery(record));
        assert_eq!(screen.devices()[0].name, "Foo");
    }

    #[tokio::test]
    async fn scan_uses_configured_defaults() {
        let screen = screen();
        screen.scan().await;

        assert_eq!(
            screen.binding.calls(),
            vec![Call::Scan(Vec::new(), Duration::from_secs(5), true)]
        );
    }

    #[tokio::test]
    async fn scan_failure_is_swallowed() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo"))]);
        screen.binding.fail("scan");

        screen.scan().await;

        assert_eq!(screen.devices().len(), 1);
    }

    #[test]
    fn discovery_dedups_and_substitutes_placeholder() {
        let mut screen = screen();
        listed(&mut screen, &[("A", None), ("A", Some("Foo")), ("B", Some("Bar"))]);

        let view = screen.render();
        let rows: Vec<(&str, &str, bool)> = view
            .rows
            .iter()
            .map(|row| (row.id.as_str(), row.name.as_str(), row.connected))
            .collect();
        assert_eq!(rows, vec![("A", "Không tên", false), ("B", "Bar", false)]);
    }

    #[test]
    fn configured_placeholder_is_used() {
        let options = ScreenOptions {
            placeholder_name: "Unnamed".to_string(),
            ..Default::default()
        };
        let mut screen = Screen::new(FakeBinding::default(), options);
        screen.handle_discovery(DiscoveredPeripheral::new("A", Some("")));

        assert_eq!(screen.devices()[0].name, "Unnamed");
    }

    #[tokio::test]
    async fn connect_marks_exactly_one_row() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo")), ("B", Some("Bar"))]);

        screen.connect(&"B".into()).await;

        let view = screen.render();
        let connected: Vec<&str> = view.connected_rows().map(|row| row.id.as_str()).collect();
        assert_eq!(connected, vec!["B"]);
        assert_eq!(screen.connected().map(|p| p.id.as_str()), Some("B"));

        let panel = view.panel.expect("panel while connected");
        assert_eq!(panel.name, "Bar");
        assert_eq!(panel.id.as_str(), "B");
    }

    #[tokio::test]
    async fn connecting_elsewhere_moves_the_mark() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo")), ("B", Some("Bar"))]);

        screen.connect(&"A".into()).await;
        screen.connect(&"B".into()).await;

        assert_eq!(screen.render().connected_rows().count(), 1);
        assert!(screen.is_connected(&"B".into()));
    }

    #[tokio::test]
    async fn failed_connect_leaves_state_unchanged() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo"))]);
        screen.binding.fail("connect");

        screen.connect(&"A".into()).await;

        assert!(screen.connected().is_none());
        assert_eq!(screen.render().connected_rows().count(), 0);
        assert_eq!(screen.binding.calls(), vec![Call::Connect("A".to_string())]);
    }

    #[tokio::test]
    async fn unlisted_peripheral_is_not_connected() {
        let mut screen = screen();
        assert!(matches!(
            screen.ensure_listed(&"Z".into()),
            Err(BleError::UnknownPeripheral(id)) if id == "Z"
        ));

        screen.connect(&"Z".into()).await;

        assert!(screen.binding.calls().is_empty());
        assert!(screen.connected().is_none());
    }

    #[tokio::test]
    async fn disconnect_clears_connection() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo")), ("B", Some("Bar"))]);
        screen.connect(&"A".into()).await;

        screen.disconnect().await;

        assert!(screen.connected().is_none());
        let view = screen.render();
        assert_eq!(view.connected_rows().count(), 0);
        assert!(view.panel.is_none());
        assert_eq!(
            screen.binding.calls(),
            vec![
                Call::Connect("A".to_string()),
                Call::Disconnect("A".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_noop() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo"))]);
        let before = screen.render();

        screen.disconnect().await;

        assert_eq!(screen.render(), before);
        assert!(screen.binding.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_disconnect_keeps_connection() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo"))]);
        screen.connect(&"A".into()).await;
        screen.binding.fail("disconnect");

        screen.disconnect().await;

        assert!(screen.is_connected(&"A".into()));
        assert!(screen.render().panel.is_some());
    }

    #[test]
    fn rows_are_numbered_from_one() {
        let mut screen = screen();
        listed(&mut screen, &[("A", Some("Foo")), ("B", Some("Bar"))]);

        assert!(screen.peripheral_at(0).is_none());
        assert_eq!(screen.peripheral_at(2).map(|p| p.id.as_str()), Some("B"));
        assert!(screen.peripheral_at(3).is_none());
    }
}
