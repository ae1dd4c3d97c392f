use crate::domain::models::{AppEvent, ConnectionStatus, MessageSeverity, StatusMessage};
use crate::domain::picker::DevicePicker;
use crate::domain::settings::SettingsService;
use crate::infrastructure::bluetooth::{platform_provider, spawn_worker, WorkerConnectionManager};
use crate::presentation::components::Components;
use crate::presentation::picker_dialog::{self, DialogOutcome};
use eframe::egui;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub struct PickerApp {
    settings: SettingsService,

    // Bluetooth
    connections: Option<Arc<WorkerConnectionManager>>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,

    // State
    picker: Option<DevicePicker>,
    connection_status: ConnectionStatus,
    status_message: Option<StatusMessage>,
    is_dark_mode: bool,

    // Logging guard
    _logging_guard: Option<crate::infrastructure::logging::LoggingGuard>,
}

impl PickerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        crate::presentation::theme::configure_theme(&cc.egui_ctx, false);

        let settings = SettingsService::new().unwrap_or_else(|e| {
            eprintln!("Failed to load settings, using defaults: {}", e);
            SettingsService::in_memory()
        });

        let logging_guard = crate::infrastructure::logging::init_logger(&settings.get().log_settings)
            .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
            .ok();

        info!("Starting BLE Device Picker");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connections = match spawn_worker(events_tx) {
            Ok(commands) => Some(Arc::new(WorkerConnectionManager::new(commands))),
            Err(e) => {
                error!("Failed to start Bluetooth worker: {}", e);
                None
            }
        };

        Self {
            settings,
            connections,
            events_rx,
            picker: None,
            connection_status: ConnectionStatus::Disconnected,
            status_message: None,
            is_dark_mode: false,
            _logging_guard: logging_guard,
        }
    }

    fn open_picker(&mut self, ctx: &egui::Context) {
        let Some(connections) = self.connections.clone() else {
            self.status_message = Some(StatusMessage::new(
                "Bluetooth worker is not running",
                MessageSeverity::Error,
            ));
            return;
        };

        let mut picker = DevicePicker::new(platform_provider(), connections, Arc::new(ctx.clone()))
            .with_dedup_key(self.settings.get().picker.dedup_key);

        match picker.open() {
            Ok(()) => self.picker = Some(picker),
            Err(e) => error!("Failed to open device picker: {}", e),
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::ConnectionStatus(status) => {
                    self.connection_status = status;
                }
                AppEvent::LogMessage(msg) => {
                    self.status_message = Some(msg);
                }
            }
        }
    }

    fn show_picker(&mut self, ctx: &egui::Context) {
        let Some(picker) = self.picker.as_mut() else {
            return;
        };

        match picker_dialog::show(ctx, picker, &self.settings.get().picker) {
            DialogOutcome::Open => {}
            DialogOutcome::Selected(record) => {
                self.picker = None;
                self.connection_status = ConnectionStatus::Connecting;
                if let Err(e) = self.settings.set_last_selected_address(record.address()) {
                    warn!("Failed to save settings: {}", e);
                }
            }
            DialogOutcome::Cancelled => {
                self.picker = None;
            }
            DialogOutcome::Failed(e) => {
                error!("Device selection failed: {}", e);
                self.status_message =
                    Some(StatusMessage::new(e.to_string(), MessageSeverity::Error));
            }
        }
    }

    fn ui_connection_panel(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        Components::card(ui, "Connection", |ui| {
            Components::connection_banner(ui, self.connection_status);
            ui.add_space(8.0);

            if let Some(address) = &self.settings.get().last_selected_address {
                ui.label(format!("Last device: {}", address));
            }

            ui.horizontal(|ui| {
                let picker_open = self.picker.is_some();
                if ui
                    .add_enabled(!picker_open, egui::Button::new("Find device..."))
                    .clicked()
                {
                    self.open_picker(ctx);
                }

                if self.connection_status == ConnectionStatus::Connected
                    && ui.button("Disconnect").clicked()
                {
                    if let Some(connections) = &self.connections {
                        connections.disconnect();
                    }
                }
            });
        });
    }

    fn ui_status_panel(&self, ui: &mut egui::Ui) {
        if let Some(msg) = &self.status_message {
            Components::card(ui, "Status", |ui| {
                ui.label(
                    egui::RichText::new(&msg.message)
                        .color(Components::severity_color(msg.severity))
                        .strong(),
                );
            });
        }
    }
}

impl eframe::App for PickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        // Worker events arrive without waking the UI
        ctx.request_repaint_after(Duration::from_millis(250));

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                Components::heading(ui, "BLE Device Picker");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if self.is_dark_mode { "Light" } else { "Dark" };
                    if ui.button(label).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        crate::presentation::theme::configure_theme(ctx, self.is_dark_mode);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(600.0);
                ui.add_space(16.0);
                self.ui_connection_panel(ctx, ui);
                ui.add_space(12.0);
                self.ui_status_panel(ui);
            });
        });

        self.show_picker(ctx);
    }
}
