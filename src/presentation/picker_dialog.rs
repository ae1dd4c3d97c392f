//! Modal window showing the picker's device list.

use crate::domain::models::{DeviceRecord, PickerState};
use crate::domain::picker::DevicePicker;
use crate::domain::settings::PickerSettings;
use crate::error::PickerError;
use eframe::egui;
use std::time::Duration;

/// What happened to the dialog during one frame.
#[derive(Debug)]
pub enum DialogOutcome {
    Open,
    Selected(DeviceRecord),
    Cancelled,
    Failed(PickerError),
}

enum Action {
    Select(usize),
    Cancel,
}

/// Drain pending discoveries, draw the dialog and apply the user's action.
pub fn show(
    ctx: &egui::Context,
    picker: &mut DevicePicker,
    settings: &PickerSettings,
) -> DialogOutcome {
    picker.process_pending();

    if !picker.state().is_open() {
        return DialogOutcome::Cancelled;
    }

    // Discoveries arrive off-thread; keep polling the queue while scanning
    if picker.is_scanning() {
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    let mut action = None;
    let mut window_open = true;

    egui::Window::new(settings.window_title.as_str())
        .open(&mut window_open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_min_width(320.0);

            match picker.state() {
                PickerState::Scanning => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Scanning... {} found", picker.devices().len()));
                    });
                }
                PickerState::Stalled => {
                    ui.label(
                        egui::RichText::new("Bluetooth unavailable, no devices can be found.")
                            .color(egui::Color32::from_rgb(200, 150, 0)),
                    );
                }
                _ => {}
            }

            ui.separator();

            egui::ScrollArea::vertical()
                .id_salt("picker_devices")
                .max_height(260.0)
                .show(ui, |ui| {
                    for (index, device) in picker.devices().iter().enumerate() {
                        let label = device.display_label(&settings.unnamed_label);
                        if ui
                            .add_sized(
                                [ui.available_width(), 28.0],
                                egui::SelectableLabel::new(false, label),
                            )
                            .clicked()
                        {
                            action = Some(Action::Select(index));
                        }
                    }
                });

            ui.separator();

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Cancel").clicked() {
                    action = Some(Action::Cancel);
                }
            });
        });

    if !window_open {
        action = Some(Action::Cancel);
    }

    match action {
        Some(Action::Select(index)) => match picker.on_select(index, ctx) {
            Ok(record) => DialogOutcome::Selected(record),
            Err(e) => DialogOutcome::Failed(e),
        },
        Some(Action::Cancel) => {
            picker.close();
            DialogOutcome::Cancelled
        }
        None => DialogOutcome::Open,
    }
}
