//! Scenario files.
//!
//! A scenario bundles everything one headless run needs: controller tuning,
//! the level, where to spawn, the clock rates, how long to run and the input
//! timeline. Scenarios are stored as RON with implicit `Some`, so optional
//! fields can be written bare.

use std::fs;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use nubi_controller::{
    CameraBasis, CharacterController, ColliderDimensions, ColliderSettings, ConfigError,
    ControllerConfig, JumpConfig, JumpMechanic, Layer, Transform, WallSettings,
};
use ron::ser::PrettyConfig;
use ron::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::KinematicBody;
use crate::input::{InputKey, InputScript};
use crate::level::{LevelDesc, SpawnPoint};
use crate::simulation::{Simulation, Timing};

/// Errors from loading or building a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to write scenario: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid controller config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid timing: rates and max_fixed_steps must be positive")]
    InvalidTiming,
}

/// One headless run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub controller: ControllerConfig,
    /// Jump tuning; `None` runs without the jump mechanic.
    pub jump: Option<JumpConfig>,
    pub collider: ColliderSettings,
    pub walls: WallSettings,
    pub level: LevelDesc,
    /// Overrides the level's own spawn point.
    pub spawn: Option<SpawnPoint>,
    pub layer: Layer,
    pub timing: Timing,
    /// Seconds to run.
    pub duration: f32,
    pub input: InputScript,
    /// Camera looking direction. Without one, input is relative to the
    /// character's own axes.
    pub camera: Option<Vec3>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            controller: ControllerConfig::default(),
            jump: Some(JumpConfig::default()),
            collider: ColliderSettings::default(),
            walls: WallSettings::default(),
            level: LevelDesc::default(),
            spawn: None,
            layer: Layer::DEFAULT,
            timing: Timing::default(),
            duration: 5.0,
            input: InputScript::default(),
            camera: None,
        }
    }
}

fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

impl Scenario {
    /// Built-in demo: land, walk forward, jump, stop.
    pub fn demo() -> Self {
        Self {
            name: "demo".to_string(),
            duration: 4.0,
            input: InputScript::new(vec![
                InputKey::new(0.5, Vec2::Y, false),
                InputKey::new(1.5, Vec2::Y, true),
                InputKey::new(1.7, Vec2::Y, false),
                InputKey::new(2.5, Vec2::ZERO, false),
            ]),
            ..Default::default()
        }
    }

    /// Load a scenario from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_ron_str(&text)?;
        log::debug!("loaded scenario '{}' from {}", scenario.name, path.display());
        Ok(scenario)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(ron_options().from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, ScenarioError> {
        let pretty = PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Validate and set up the simulation.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        if !self.timing.is_valid() {
            return Err(ScenarioError::InvalidTiming);
        }

        let level = self.level.build();
        let spawn = self.spawn.unwrap_or(level.spawn);
        let transform = Transform::from_position(spawn.position).with_rotation(spawn.rotation());

        let mut builder = CharacterController::builder(self.controller.clone())
            .collider(self.collider.clone())
            .walls(self.walls.clone())
            .transform(transform)
            .layer(self.layer);
        if let Some(forward) = self.camera {
            builder = builder.camera(CameraBasis::looking(forward, transform.up()));
        }
        if let Some(jump) = &self.jump {
            builder = builder.mechanic(JumpMechanic::new(jump.clone()));
        }
        let controller = builder.try_build()?;

        let dimensions = ColliderDimensions::from_settings(&self.collider);
        let body = KinematicBody::new(&transform, dimensions, self.layer);

        log::info!(
            "scenario '{}': level '{}', {} brushes, spawn {:?}",
            self.name,
            level.name,
            level.collision.brush_count(),
            spawn.position
        );

        Ok(Simulation::new(
            controller,
            body,
            level,
            self.timing,
            self.input.clone(),
        ))
    }
}
