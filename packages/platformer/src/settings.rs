
use std::{
    path::Path,
    fs::File,
    io::{
        BufReader,
        BufWriter,
    },
};
use serde::{Serialize, Deserialize};
use anyhow::*;


pub const SETTINGS_FILE_NAME: &'static str = "settings.json";


/// Program settings. Missing fields take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsSettings,
    /// Target frames per second.
    pub frame_rate: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            physics: PhysicsSettings::default(),
            frame_rate: 60,
        }
    }
}

impl Settings {
    pub fn read(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::try_read(path)
            .map_err(|e| debug!("using default settings, cannot read {}: {:#}", path.display(), e))
            .unwrap_or_default()
    }

    pub fn try_read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }
}

/// Physics engine tuning. Units are world units and seconds, y up.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Vertical acceleration applied to non-kinematic bodies.
    pub gravity: f32,
    /// Maximum vertical speed gravity can build up to, as a magnitude.
    pub terminal_velocity: f32,
    /// Collision resolution sub-steps per step.
    pub iterations: u32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        PhysicsSettings {
            gravity: -1200.0,
            terminal_velocity: 7000.0,
            iterations: 4,
        }
    }
}


#[test]
fn test_partial_settings_use_defaults() {
    let settings: Settings = serde_json::from_str(r#"{
        "physics": { "gravity": -500.0 }
    }"#).unwrap();
    assert_eq!(settings.physics.gravity, -500.0);
    assert_eq!(settings.physics.iterations, 4);
    assert_eq!(settings.frame_rate, 60);
}

#[test]
fn test_settings_file() {
    let path = std::env::temp_dir()
        .join(format!("platformer-settings-{}.json", std::process::id()));
    let mut settings = Settings::default();
    settings.frame_rate = 30;
    settings.physics.iterations = 8;
    settings.write(&path).unwrap();
    assert_eq!(Settings::try_read(&path).unwrap(), settings);
    std::fs::remove_file(&path).unwrap();

    assert!(Settings::try_read(&path).is_err());
    assert_eq!(Settings::read(&path), Settings::default());
}
