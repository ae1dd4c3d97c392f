use crate::domain::models::{DedupKey, DEFAULT_UNNAMED_LABEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "ble_device_picker".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// How the picker dialog identifies and labels devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerSettings {
    #[serde(default)]
    pub dedup_key: DedupKey,
    #[serde(default = "default_unnamed_label")]
    pub unnamed_label: String,
    #[serde(default = "default_window_title")]
    pub window_title: String,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            dedup_key: DedupKey::default(),
            unnamed_label: default_unnamed_label(),
            window_title: default_window_title(),
        }
    }
}

fn default_unnamed_label() -> String {
    DEFAULT_UNNAMED_LABEL.to_string()
}
fn default_window_title() -> String {
    "Select a device".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_settings: LogSettings,
    #[serde(default)]
    pub picker: PickerSettings,
    #[serde(default)]
    pub last_selected_address: Option<String>,
}

pub struct SettingsService {
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl SettingsService {
    /// Load from the per-user config directory, falling back to defaults.
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::from_path(settings_path))
    }

    /// Defaults that are never written to disk.
    pub fn in_memory() -> Self {
        Self {
            settings: Settings::default(),
            settings_path: None,
        }
    }

    pub fn from_path(settings_path: PathBuf) -> Self {
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();
        Self {
            settings,
            settings_path: Some(settings_path),
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("BleDevicePicker");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.settings_path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn set_last_selected_address(&mut self, address: &str) -> anyhow::Result<()> {
        if self.settings.last_selected_address.as_deref() != Some(address) {
            self.settings.last_selected_address = Some(address.to_string());
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("ble_device_picker_{}_{}.json", name, std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.picker.dedup_key, DedupKey::NameAndAddress);
        assert_eq!(settings.picker.unnamed_label, "Unknown");
        assert_eq!(settings.log_settings.level, "info");
        assert!(settings.last_selected_address.is_none());
    }

    #[test]
    fn test_partial_picker_settings() {
        let settings: Settings =
            serde_json::from_str(r#"{"picker": {"dedup_key": "address"}}"#).unwrap();
        assert_eq!(settings.picker.dedup_key, DedupKey::Address);
        assert_eq!(settings.picker.window_title, "Select a device");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let service = SettingsService::from_path(temp_settings_path("missing"));
        assert_eq!(service.get().picker.unnamed_label, "Unknown");
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let path = temp_settings_path("invalid");
        fs::write(&path, "not json").unwrap();
        let service = SettingsService::from_path(path.clone());
        assert!(service.get().last_selected_address.is_none());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_last_selected_address_persists() {
        let path = temp_settings_path("persist");
        let mut service = SettingsService::from_path(path.clone());
        service.set_last_selected_address("33:44").unwrap();

        let reloaded = SettingsService::from_path(path.clone());
        assert_eq!(reloaded.get().last_selected_address.as_deref(), Some("33:44"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let mut service = SettingsService::in_memory();
        service.set_last_selected_address("11:22").unwrap();
        assert_eq!(service.get().last_selected_address.as_deref(), Some("11:22"));
    }
}
