use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// What to do with a drop that lands outside every known page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropFallback {
    /// Bind the drop to page 0, clamped into its box
    #[default]
    FirstPage,
    /// Bind the drop to the closest page, clamped to its edge
    Nearest,
    /// Refuse the drop; the snippet stays in the list
    Reject,
}

impl DropFallback {
    pub fn all() -> &'static [DropFallback] {
        &[DropFallback::FirstPage, DropFallback::Nearest, DropFallback::Reject]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DropFallback::FirstPage => "First page",
            DropFallback::Nearest => "Nearest page",
            DropFallback::Reject => "Reject drop",
        }
    }
}

/// Font size and color used when burning snippets into the PDF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampStyle {
    /// Font size in PDF points
    pub font_size: f32,
    /// Fill color as RGB in 0..=1
    pub color: [f32; 3],
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            color: [0.0, 0.0, 0.0],
        }
    }
}

fn default_zoom() -> f32 {
    1.0
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Directory the last PDF was opened from
    #[serde(default)]
    pub last_open_dir: Option<PathBuf>,

    /// Style applied to every exported snippet
    #[serde(default)]
    pub export: StampStyle,

    /// Policy for drops outside every page
    #[serde(default)]
    pub drop_fallback: DropFallback,

    /// Zoom the viewer starts with when a document is opened
    #[serde(default = "default_zoom")]
    pub default_zoom: f32,
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            last_open_dir: None,
            export: StampStyle::default(),
            drop_fallback: DropFallback::default(),
            default_zoom: default_zoom(),
        }
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to remember the directory a document was opened from
#[derive(Message)]
pub struct RememberOpenDirRequest {
    pub path: PathBuf,
}

/// Parse config JSON, falling back to defaults with a reason on failure
fn parse_config(json: &str) -> (AppConfigData, Option<String>) {
    match serde_json::from_str(json) {
        Ok(data) => (data, None),
        Err(e) => {
            warn!("Failed to parse config file: {}", e);
            (
                AppConfigData::default(),
                Some(format!("Configuration file was corrupted: {}", e)),
            )
        }
    }
}

/// Load configuration from disk
fn load_config(config_path: PathBuf) -> (AppConfig, Option<String>) {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(json) => {
                let parsed = parse_config(&json);
                if parsed.1.is_none() {
                    info!("Loaded config from {:?}", config_path);
                }
                parsed
            }
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    (
        AppConfig {
            data,
            config_path,
            dirty: false,
        },
        reset_reason,
    )
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let (loaded, reset_reason) = load_config(crate::paths::config_file());
    *config = loaded;

    if let Some(reason) = reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// System to update the remembered open directory
fn remember_open_dir_system(
    mut events: MessageReader<RememberOpenDirRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.last_open_dir.as_ref() == Some(&event.path) {
            continue;
        }
        config.data.last_open_dir = Some(event.path.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<RememberOpenDirRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    remember_open_dir_system.run_if(on_message::<RememberOpenDirRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}
