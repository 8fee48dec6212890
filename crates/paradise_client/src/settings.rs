use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use paradise_core::renderer::DEFAULT_CLEAR_COLOR;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MIN_MOUSE_SENSITIVITY: f32 = 0.1;
const MAX_MOUSE_SENSITIVITY: f32 = 10.0;
const MIN_FOV: f32 = 30.0;
const MAX_FOV: f32 = 120.0;
const MIN_MOVE_SPEED: f32 = 0.1;
const MAX_MOVE_SPEED: f32 = 100.0;
const MAX_PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Vertical field of view in degrees; the scene camera's own value when absent.
    #[serde(default)]
    pub fov: Option<f32>,
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_pitch_limit")]
    pub pitch_limit: f32,
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
    #[serde(default)]
    pub scene: Option<PathBuf>,
    #[serde(default = "default_vsync")]
    pub vsync: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            fov: None,
            mouse_sensitivity: default_mouse_sensitivity(),
            move_speed: default_move_speed(),
            pitch_limit: default_pitch_limit(),
            clear_color: default_clear_color(),
            scene: None,
            vsync: default_vsync(),
        }
    }
}

impl ClientSettings {
    pub fn sanitize(mut self) -> Self {
        self.fov = self
            .fov
            .filter(|fov| fov.is_finite())
            .map(|fov| fov.clamp(MIN_FOV, MAX_FOV));
        self.mouse_sensitivity = finite_or(self.mouse_sensitivity, default_mouse_sensitivity())
            .clamp(MIN_MOUSE_SENSITIVITY, MAX_MOUSE_SENSITIVITY);
        self.move_speed =
            finite_or(self.move_speed, default_move_speed()).clamp(MIN_MOVE_SPEED, MAX_MOVE_SPEED);
        self.pitch_limit =
            finite_or(self.pitch_limit, default_pitch_limit()).clamp(0.0, MAX_PITCH_LIMIT);
        for channel in &mut self.clear_color {
            *channel = finite_or(*channel, 0.0).clamp(0.0, 1.0);
        }
        self
    }

    /// Radians of turn per pixel of mouse travel.
    pub fn turn_speed(&self) -> f32 {
        self.mouse_sensitivity * 0.001
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let parsed = toml::from_str::<Self>(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize settings: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let settings = self.clone().sanitize();
        let serialized = toml::to_string_pretty(&settings).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize settings: {e}"),
            )
        })?;
        fs::write(path, serialized)
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn default_mouse_sensitivity() -> f32 {
    2.5
}

fn default_move_speed() -> f32 {
    3.0
}

fn default_pitch_limit() -> f32 {
    30.0
}

fn default_clear_color() -> [f32; 4] {
    DEFAULT_CLEAR_COLOR
}

fn default_vsync() -> bool {
    true
}

pub fn load_or_create_settings(path: &Path) -> ClientSettings {
    match ClientSettings::load(path) {
        Ok(settings) => settings,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let settings = ClientSettings::default();
            if let Err(save_err) = settings.save(path) {
                warn!(
                    "Failed to create default settings at {}: {save_err}",
                    path.display()
                );
            }
            settings
        }
        Err(err) => {
            warn!("Failed to load settings from {}: {err}", path.display());
            let settings = ClientSettings::default();
            if let Err(save_err) = settings.save(path) {
                warn!(
                    "Failed to overwrite settings at {}: {save_err}",
                    path.display()
                );
            }
            settings
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{load_or_create_settings, ClientSettings};

    fn scratch_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "paradise-settings-{}-{name}",
            std::process::id()
        ));
        let _ = fs::create_dir_all(&dir);
        dir.join("settings.toml")
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed: ClientSettings = toml::from_str("move_speed = 5.0").unwrap();
        assert_eq!(parsed.move_speed, 5.0);
        assert_eq!(parsed.pitch_limit, 30.0);
        assert_eq!(parsed.fov, None);
        assert!(parsed.vsync);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let settings = ClientSettings {
            fov: Some(500.0),
            mouse_sensitivity: f32::NAN,
            move_speed: -1.0,
            pitch_limit: 120.0,
            clear_color: [2.0, -1.0, 0.5, 1.0],
            ..ClientSettings::default()
        }
        .sanitize();

        assert_eq!(settings.fov, Some(120.0));
        assert_eq!(settings.mouse_sensitivity, 2.5);
        assert_eq!(settings.move_speed, 0.1);
        assert_eq!(settings.pitch_limit, 89.0);
        assert_eq!(settings.clear_color, [1.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = scratch_path("missing");
        let _ = fs::remove_file(&path);

        let settings = load_or_create_settings(&path);
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(ClientSettings::load(&path).unwrap(), ClientSettings::default());
    }

    #[test]
    fn corrupt_file_is_replaced() {
        let path = scratch_path("corrupt");
        fs::write(&path, "move_speed = \"fast\"").unwrap();

        let settings = load_or_create_settings(&path);
        assert_eq!(settings, ClientSettings::default());
        assert!(ClientSettings::load(&path).is_ok());
    }

    #[test]
    fn saved_scene_path_survives_reload() {
        let path = scratch_path("scene");
        let settings = ClientSettings {
            scene: Some(PathBuf::from("assets/scenes/museum.toml")),
            fov: Some(75.0),
            ..ClientSettings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(ClientSettings::load(&path).unwrap(), settings);
    }
}
