use ble_device_picker::presentation::app::PickerApp;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 480.0])
            .with_title("BLE Device Picker"),
        ..Default::default()
    };

    eframe::run_native(
        "BLE Device Picker",
        options,
        Box::new(|cc| Ok(Box::new(PickerApp::new(cc)))),
    )
}
