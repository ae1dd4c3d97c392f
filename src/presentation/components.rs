use crate::domain::models::{ConnectionStatus, MessageSeverity};
use eframe::egui;

pub struct Components;

impl Components {
    pub fn heading(ui: &mut egui::Ui, text: &str) {
        ui.label(egui::RichText::new(text).heading().strong());
    }

    pub fn card<R>(
        ui: &mut egui::Ui,
        title: &str,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> R {
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        let bg = ui.style().visuals.widgets.noninteractive.bg_fill;

        egui::Frame::none()
            .inner_margin(egui::Margin::same(12.0))
            .stroke(stroke)
            .fill(bg)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(title).strong().size(17.0));
                    ui.add_space(6.0);
                    add_contents(ui)
                })
                .inner
            })
            .inner
    }

    pub fn connection_banner(ui: &mut egui::Ui, status: ConnectionStatus) {
        let (text, bg, fg) = match status {
            ConnectionStatus::Connected => (
                "CONNECTED",
                egui::Color32::from_rgb(0, 200, 0),
                egui::Color32::BLACK,
            ),
            ConnectionStatus::Connecting => (
                "CONNECTING...",
                egui::Color32::from_rgb(255, 200, 0),
                egui::Color32::BLACK,
            ),
            ConnectionStatus::Disconnected => (
                "DISCONNECTED",
                egui::Color32::from_gray(100),
                egui::Color32::WHITE,
            ),
            ConnectionStatus::Error => (
                "ERROR",
                egui::Color32::from_rgb(255, 50, 50),
                egui::Color32::WHITE,
            ),
        };

        ui.add_sized(
            [ui.available_width(), 32.0],
            egui::Label::new(
                egui::RichText::new(text)
                    .color(fg)
                    .background_color(bg)
                    .size(16.0)
                    .strong(),
            )
            .wrap_mode(egui::TextWrapMode::Extend),
        );
    }

    pub fn severity_color(severity: MessageSeverity) -> egui::Color32 {
        match severity {
            MessageSeverity::Info => egui::Color32::from_rgb(40, 90, 220),
            MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
            MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
            MessageSeverity::Error => egui::Color32::RED,
        }
    }
}
