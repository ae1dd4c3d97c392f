//! Bluetooth Service Module
//!
//! Runs connection work on a dedicated thread with its own tokio runtime and
//! exposes it to the picker as a [`ConnectionManager`].

use crate::domain::models::{
    AppEvent, BluetoothCommand, ConnectionStatus, DeviceRecord, MessageSeverity, StatusMessage,
};
use crate::domain::picker::ConnectionManager;
use crate::infrastructure::bluetooth::connection::BleConnection;
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Owns the live connection on the worker thread.
pub struct BluetoothService {
    connection: BleConnection,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl BluetoothService {
    pub fn new(event_sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            connection: BleConnection::new(event_sender.clone()),
            event_sender,
        }
    }

    pub async fn handle(&mut self, command: BluetoothCommand) {
        match command {
            BluetoothCommand::Connect(record) => {
                let _ = self
                    .event_sender
                    .send(AppEvent::ConnectionStatus(ConnectionStatus::Connecting));

                if let Err(e) = self.connection.connect(&record).await {
                    error!("Connection to {} failed: {}", record, e);
                    let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage::new(
                        format!("Connection failed: {}", e),
                        MessageSeverity::Error,
                    )));
                    let _ = self
                        .event_sender
                        .send(AppEvent::ConnectionStatus(ConnectionStatus::Disconnected));
                }
            }
            BluetoothCommand::Disconnect => {
                self.connection.disconnect();
                let _ = self
                    .event_sender
                    .send(AppEvent::ConnectionStatus(ConnectionStatus::Disconnected));
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}

/// Spawn the worker thread. Commands go in through the returned sender;
/// events come back on `event_sender`.
pub fn spawn_worker(
    event_sender: mpsc::UnboundedSender<AppEvent>,
) -> anyhow::Result<mpsc::UnboundedSender<BluetoothCommand>> {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<BluetoothCommand>();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("bluetooth-worker".into())
        .spawn(move || {
            rt.block_on(async move {
                let mut service = BluetoothService::new(event_sender);
                while let Some(cmd) = cmd_rx.recv().await {
                    service.handle(cmd).await;
                }
                info!("Bluetooth worker stopped");
            });
        })?;

    Ok(cmd_tx)
}

/// Forwards picker selections to the worker thread.
pub struct WorkerConnectionManager {
    commands: mpsc::UnboundedSender<BluetoothCommand>,
}

impl WorkerConnectionManager {
    pub fn new(commands: mpsc::UnboundedSender<BluetoothCommand>) -> Self {
        Self { commands }
    }

    pub fn disconnect(&self) {
        let _ = self.commands.send(BluetoothCommand::Disconnect);
    }
}

impl ConnectionManager for WorkerConnectionManager {
    fn connect(&self, device: &DeviceRecord, context: &egui::Context) {
        if self
            .commands
            .send(BluetoothCommand::Connect(device.clone()))
            .is_err()
        {
            error!("Bluetooth worker is gone, dropping connect to {}", device);
        }
        context.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_forwards_command() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let manager = WorkerConnectionManager::new(tx);
        let record = DeviceRecord::new("Broom-B", "33:44");

        manager.connect(&record, &egui::Context::default());

        match rx.try_recv() {
            Ok(BluetoothCommand::Connect(sent)) => assert_eq!(sent, record),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_connect_after_worker_exit_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let manager = WorkerConnectionManager::new(tx);
        manager.connect(&DeviceRecord::new("", "33:44"), &egui::Context::default());
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn test_failed_connect_reports_disconnected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut service = BluetoothService::new(tx);

        service
            .handle(BluetoothCommand::Connect(DeviceRecord::new("Broom-A", "11:22")))
            .await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(
            events.first(),
            Some(AppEvent::ConnectionStatus(ConnectionStatus::Connecting))
        ));
        assert!(matches!(
            events.last(),
            Some(AppEvent::ConnectionStatus(ConnectionStatus::Disconnected))
        ));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::LogMessage(StatusMessage { severity: MessageSeverity::Error, .. })
        )));
        assert!(!service.is_connected());
    }
}
