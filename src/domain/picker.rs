//! Device Picker
//!
//! Drives one scan session, keeps the insertion-ordered list of discovered
//! devices and hands the user's selection to a [`ConnectionManager`].
//!
//! The scan provider may call back on any thread. The callback only builds a
//! [`DeviceRecord`] and pushes it onto a single-consumer queue; the UI thread
//! drains that queue with [`DevicePicker::process_pending`], so the list is
//! only ever touched from one thread.

use crate::domain::models::{Advertisement, DedupKey, DeviceRecord, PickerState};
use crate::error::{PickerError, Result, ScanError};
use crate::infrastructure::bluetooth::provider::{DiscoveryCallback, ScanProvider};
use eframe::egui;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Receives the selected device. Fire-and-forget from the picker's side.
pub trait ConnectionManager: Send + Sync {
    fn connect(&self, device: &DeviceRecord, context: &egui::Context);
}

/// Told to redraw whenever the visible list changes.
pub trait RenderNotifier: Send + Sync {
    fn request_render(&self);
}

impl RenderNotifier for egui::Context {
    fn request_render(&self) {
        self.request_repaint();
    }
}

pub struct DevicePicker {
    state: PickerState,
    devices: Vec<DeviceRecord>,
    dedup_key: DedupKey,
    scan_provider: Box<dyn ScanProvider>,
    connections: Arc<dyn ConnectionManager>,
    renderer: Arc<dyn RenderNotifier>,
    discovered_tx: mpsc::UnboundedSender<DeviceRecord>,
    discovered_rx: mpsc::UnboundedReceiver<DeviceRecord>,
}

impl DevicePicker {
    pub fn new(
        scan_provider: Box<dyn ScanProvider>,
        connections: Arc<dyn ConnectionManager>,
        renderer: Arc<dyn RenderNotifier>,
    ) -> Self {
        let (discovered_tx, discovered_rx) = mpsc::unbounded_channel();
        Self {
            state: PickerState::Idle,
            devices: Vec::new(),
            dedup_key: DedupKey::default(),
            scan_provider,
            connections,
            renderer,
            discovered_tx,
            discovered_rx,
        }
    }

    pub fn with_dedup_key(mut self, dedup_key: DedupKey) -> Self {
        self.dedup_key = dedup_key;
        self
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == PickerState::Scanning
    }

    /// Devices in order of first discovery.
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// Start the scan session.
    ///
    /// A provider that cannot be initialised or started leaves the picker
    /// open but [`Stalled`](PickerState::Stalled) with an empty list.
    pub fn open(&mut self) -> Result<()> {
        if self.state != PickerState::Idle {
            return Err(PickerError::InvalidState(self.state));
        }

        self.devices.clear();
        match self.start_scan_session() {
            Ok(()) => {
                info!("Device scan started");
                self.state = PickerState::Scanning;
            }
            Err(e) => {
                warn!("Device scan could not start, picker stays empty: {}", e);
                self.state = PickerState::Stalled;
            }
        }

        self.renderer.request_render();
        Ok(())
    }

    fn start_scan_session(&mut self) -> std::result::Result<(), ScanError> {
        self.scan_provider.init()?;

        let tx = self.discovered_tx.clone();
        let callback: DiscoveryCallback = Arc::new(move |adv: Advertisement| {
            trace!(
                address = %adv.address,
                rssi = adv.signal_strength,
                raw_len = adv.raw_data.len(),
                "Advertisement received"
            );
            // Receiver outlives every session of this picker; a failed send means it was dropped.
            let _ = tx.send(adv.to_record());
        });

        self.scan_provider.start_scan(callback)
    }

    /// No-op unless a session is active, so repeated calls never reach the provider twice.
    fn stop_scan_session(&mut self) {
        if self.state != PickerState::Scanning {
            return;
        }
        if let Err(e) = self.scan_provider.stop_scan() {
            warn!("Failed to stop device scan: {}", e);
        }
        info!("Device scan stopped");
    }

    /// Apply every discovery queued since the last call. UI thread only.
    ///
    /// Returns the number of devices appended.
    pub fn process_pending(&mut self) -> usize {
        let mut added = 0;
        while let Ok(record) = self.discovered_rx.try_recv() {
            if self.on_device_discovered(record) {
                added += 1;
            }
        }
        added
    }

    /// Append `record` unless it is already listed. UI thread only.
    ///
    /// Returns `true` if the list changed. Discoveries arriving after the
    /// session stopped are dropped.
    pub fn on_device_discovered(&mut self, record: DeviceRecord) -> bool {
        if self.state != PickerState::Scanning {
            trace!("Ignoring late discovery of {}", record);
            return false;
        }

        if self
            .devices
            .iter()
            .any(|existing| existing.same_device(&record, self.dedup_key))
        {
            return false;
        }

        debug!("Found device {}", record);
        self.devices.push(record);
        self.renderer.request_render();
        true
    }

    /// Hand the device at `index` to the connection manager and close.
    ///
    /// The scan is stopped before `connect` is called. An index outside the
    /// current list fails with [`PickerError::OutOfRange`] and leaves the
    /// picker as it was.
    pub fn on_select(&mut self, index: usize, context: &egui::Context) -> Result<DeviceRecord> {
        match self.state {
            PickerState::Scanning | PickerState::Stalled => {}
            PickerState::Closed => return Err(PickerError::Closed),
            other => return Err(PickerError::InvalidState(other)),
        }

        let record = self
            .devices
            .get(index)
            .cloned()
            .ok_or(PickerError::OutOfRange {
                index,
                len: self.devices.len(),
            })?;

        self.stop_scan_session();
        self.state = PickerState::Selecting;

        info!("Selected device {}", record);
        self.connections.connect(&record, context);

        self.close();
        Ok(record)
    }

    /// Stop the scan if active and discard the list. Idempotent.
    pub fn close(&mut self) {
        if self.state == PickerState::Closed {
            return;
        }

        self.stop_scan_session();
        self.state = PickerState::Closed;
        self.devices.clear();
        self.renderer.request_render();
    }
}

impl Drop for DevicePicker {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::provider::UnavailableScanProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init,
        StartScan,
        StopScan,
        Connect(DeviceRecord),
    }

    type CallLog = Arc<Mutex<Vec<Call>>>;

    struct FakeProvider {
        log: CallLog,
        callback: Arc<Mutex<Option<DiscoveryCallback>>>,
    }

    impl ScanProvider for FakeProvider {
        fn init(&mut self) -> std::result::Result<(), ScanError> {
            self.log.lock().unwrap().push(Call::Init);
            Ok(())
        }

        fn start_scan(&mut self, callback: DiscoveryCallback) -> std::result::Result<(), ScanError> {
            self.log.lock().unwrap().push(Call::StartScan);
            *self.callback.lock().unwrap() = Some(callback);
            Ok(())
        }

        fn stop_scan(&mut self) -> std::result::Result<(), ScanError> {
            self.log.lock().unwrap().push(Call::StopScan);
            Ok(())
        }
    }

    struct FakeConnections {
        log: CallLog,
    }

    impl ConnectionManager for FakeConnections {
        fn connect(&self, device: &DeviceRecord, _context: &egui::Context) {
            self.log.lock().unwrap().push(Call::Connect(device.clone()));
        }
    }

    #[derive(Default)]
    struct RenderCounter(AtomicUsize);

    impl RenderNotifier for RenderCounter {
        fn request_render(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RenderCounter {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        picker: DevicePicker,
        log: CallLog,
        callback: Arc<Mutex<Option<DiscoveryCallback>>>,
        renders: Arc<RenderCounter>,
    }

    impl Harness {
        fn new(dedup_key: DedupKey) -> Self {
            let log: CallLog = Arc::new(Mutex::new(Vec::new()));
            let callback = Arc::new(Mutex::new(None));
            let renders = Arc::new(RenderCounter::default());
            let picker = DevicePicker::new(
                Box::new(FakeProvider {
                    log: log.clone(),
                    callback: callback.clone(),
                }),
                Arc::new(FakeConnections { log: log.clone() }),
                renders.clone(),
            )
            .with_dedup_key(dedup_key);

            Self {
                picker,
                log,
                callback,
                renders,
            }
        }

        fn opened() -> Self {
            let mut harness = Self::new(DedupKey::NameAndAddress);
            harness.picker.open().unwrap();
            harness
        }

        fn advertise(&self, name: &str, address: &str) {
            let callback = self.callback.lock().unwrap().clone().unwrap();
            callback(Advertisement {
                name: Some(name.to_string()),
                address: address.to_string(),
                signal_strength: -70,
                raw_data: Vec::new(),
            });
        }

        fn calls(&self) -> Vec<Call> {
            self.log.lock().unwrap().clone()
        }

        fn count(&self, call: &Call) -> usize {
            self.calls().iter().filter(|c| *c == call).count()
        }
    }

    fn broom_a() -> DeviceRecord {
        DeviceRecord::new("Broom-A", "11:22")
    }

    fn broom_b() -> DeviceRecord {
        DeviceRecord::new("Broom-B", "33:44")
    }

    #[test]
    fn test_open_starts_scan() {
        let h = Harness::opened();
        assert_eq!(h.picker.state(), PickerState::Scanning);
        assert!(h.picker.devices().is_empty());
        assert_eq!(h.calls(), vec![Call::Init, Call::StartScan]);
    }

    #[test]
    fn test_open_twice_is_rejected() {
        let mut h = Harness::opened();
        assert!(matches!(
            h.picker.open(),
            Err(PickerError::InvalidState(PickerState::Scanning))
        ));
        assert_eq!(h.count(&Call::StartScan), 1);
    }

    #[test]
    fn test_duplicates_are_dropped_in_discovery_order() {
        let mut h = Harness::opened();
        h.advertise("Broom-A", "11:22");
        h.advertise("Broom-B", "33:44");
        h.advertise("Broom-A", "11:22");

        assert_eq!(h.picker.process_pending(), 2);
        assert_eq!(h.picker.devices(), &[broom_a(), broom_b()]);
    }

    #[test]
    fn test_render_only_on_list_change() {
        let mut h = Harness::opened();
        let after_open = h.renders.count();

        assert!(h.picker.on_device_discovered(broom_a()));
        assert!(!h.picker.on_device_discovered(broom_a()));
        assert_eq!(h.renders.count(), after_open + 1);
    }

    #[test]
    fn test_same_name_different_address_is_distinct() {
        let mut h = Harness::opened();
        h.picker.on_device_discovered(DeviceRecord::new("Broom", "11:22"));
        h.picker.on_device_discovered(DeviceRecord::new("Broom", "33:44"));
        assert_eq!(h.picker.devices().len(), 2);
    }

    #[test]
    fn test_address_only_identity() {
        let mut h = Harness::new(DedupKey::Address);
        h.picker.open().unwrap();
        h.picker.on_device_discovered(DeviceRecord::new("", "11:22"));
        h.picker.on_device_discovered(DeviceRecord::new("Broom-A", "11:22"));
        assert_eq!(h.picker.devices(), &[DeviceRecord::new("", "11:22")]);
    }

    #[test]
    fn test_discoveries_from_background_thread() {
        let mut h = Harness::opened();
        let callback = h.callback.lock().unwrap().clone().unwrap();

        let producer = std::thread::spawn(move || {
            for i in 0..20 {
                callback(Advertisement {
                    name: Some(format!("Broom-{}", i % 5)),
                    address: format!("00:{:02X}", i % 5),
                    ..Default::default()
                });
            }
        });
        producer.join().unwrap();

        assert_eq!(h.picker.process_pending(), 5);
        let names: Vec<_> = h.picker.devices().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["Broom-0", "Broom-1", "Broom-2", "Broom-3", "Broom-4"]);
    }

    #[test]
    fn test_select_stops_scan_before_connect() {
        let mut h = Harness::opened();
        h.picker.on_device_discovered(broom_a());
        h.picker.on_device_discovered(broom_b());

        let ctx = egui::Context::default();
        let selected = h.picker.on_select(1, &ctx).unwrap();

        assert_eq!(selected, broom_b());
        assert_eq!(
            h.calls(),
            vec![
                Call::Init,
                Call::StartScan,
                Call::StopScan,
                Call::Connect(broom_b()),
            ]
        );
        assert_eq!(h.picker.state(), PickerState::Closed);
    }

    #[test]
    fn test_select_out_of_range_does_not_connect() {
        let mut h = Harness::opened();
        h.picker.on_device_discovered(broom_a());

        let ctx = egui::Context::default();
        let err = h.picker.on_select(5, &ctx).unwrap_err();

        assert!(matches!(err, PickerError::OutOfRange { index: 5, len: 1 }));
        assert_eq!(h.picker.state(), PickerState::Scanning);
        assert_eq!(h.count(&Call::StopScan), 0);
        assert!(!h.calls().iter().any(|c| matches!(c, Call::Connect(_))));
    }

    #[test]
    fn test_select_after_close_fails() {
        let mut h = Harness::opened();
        h.picker.on_device_discovered(broom_a());
        h.picker.close();

        let ctx = egui::Context::default();
        assert!(matches!(h.picker.on_select(0, &ctx), Err(PickerError::Closed)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut h = Harness::opened();
        h.picker.close();
        h.picker.close();
        assert_eq!(h.count(&Call::StopScan), 1);
        assert_eq!(h.picker.state(), PickerState::Closed);
    }

    #[test]
    fn test_late_discovery_after_close_is_ignored() {
        let mut h = Harness::opened();
        h.picker.on_device_discovered(broom_a());
        h.picker.close();
        let renders = h.renders.count();

        h.advertise("Broom-B", "33:44");
        assert_eq!(h.picker.process_pending(), 0);
        assert!(!h.picker.on_device_discovered(broom_b()));
        assert!(h.picker.devices().is_empty());
        assert_eq!(h.renders.count(), renders);
    }

    #[test]
    fn test_select_then_close_stops_once() {
        let mut h = Harness::opened();
        h.picker.on_device_discovered(broom_a());
        h.picker.on_select(0, &egui::Context::default()).unwrap();
        h.picker.close();
        assert_eq!(h.count(&Call::StopScan), 1);
    }

    #[test]
    fn test_drop_stops_scan() {
        let h = Harness::opened();
        let log = h.log.clone();
        drop(h.picker);
        assert_eq!(
            log.lock().unwrap().iter().filter(|c| **c == Call::StopScan).count(),
            1
        );
    }

    #[test]
    fn test_unavailable_provider_stalls() {
        let renders = Arc::new(RenderCounter::default());
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let mut picker = DevicePicker::new(
            Box::new(UnavailableScanProvider::new("no radio")),
            Arc::new(FakeConnections { log: log.clone() }),
            renders.clone(),
        );

        picker.open().unwrap();
        assert_eq!(picker.state(), PickerState::Stalled);
        assert!(picker.state().is_open());
        assert!(!picker.on_device_discovered(broom_a()));
        assert!(matches!(
            picker.on_select(0, &egui::Context::default()),
            Err(PickerError::OutOfRange { index: 0, len: 0 })
        ));

        picker.close();
        assert_eq!(picker.state(), PickerState::Closed);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_before_open() {
        let mut h = Harness::new(DedupKey::NameAndAddress);
        h.picker.close();
        assert_eq!(h.picker.state(), PickerState::Closed);
        assert!(h.calls().is_empty());
        assert!(matches!(
            h.picker.open(),
            Err(PickerError::InvalidState(PickerState::Closed))
        ));
    }
}
