//! Scenario files: the map, named archetypes and the units that spawn into the arena.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use skirmish_agent::ArchetypeConfig;
use skirmish_core::{Faction, TileKind, Vec2};

use crate::{Arena, Body, CombatConfig, Simulation, TileMap, UnitSpec};

/// Scenario file looked up under a project root.
pub const PROJECT_SCENARIO: &str = ".skirmish/scenario.yaml";

/// Rectangle in world units, `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectConfig {
    pub min: Vec2,
    pub max: Vec2,
}

impl RectConfig {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Ignored when `rows` is set.
    pub width: u32,
    pub height: u32,
    pub tile_size: f32,
    /// ASCII layout (`.` floor, `#` wall, `~` water, `^` hazard); first row is `y = 0`.
    pub rows: Vec<String>,
    /// Wall rectangles stamped over the layout.
    pub walls: Vec<RectConfig>,
    pub hazard_tile_dps: f32,
    /// Navigation grid resolution shared by every agent.
    pub nav_cell_size: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 24,
            height: 24,
            tile_size: 1.0,
            rows: Vec::new(),
            walls: Vec::new(),
            hazard_tile_dps: crate::arena::DEFAULT_HAZARD_TILE_DPS,
            nav_cell_size: 0.5,
        }
    }
}

impl MapConfig {
    pub fn build(&self) -> Result<TileMap> {
        let mut map = if self.rows.is_empty() {
            TileMap::open(self.width, self.height, self.tile_size)?
        } else {
            TileMap::from_rows(&self.rows, self.tile_size)?
        };
        for wall in &self.walls {
            map.fill_rect(wall.min, wall.max, TileKind::Wall);
        }
        Ok(map)
    }
}

fn default_health() -> f32 {
    100.0
}
fn default_radius() -> f32 {
    0.4
}
fn default_cooldowns() -> Vec<f32> {
    vec![4.0, 5.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Key into [`SkirmishConfig::archetypes`].
    pub archetype: String,
    pub faction: u8,
    pub position: Vec2,
    #[serde(default)]
    pub heading: f32,
    #[serde(default = "default_health")]
    pub health: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_cooldowns")]
    pub cooldowns: Vec<f32>,
}

impl UnitSpawn {
    pub fn new(archetype: impl Into<String>, faction: u8, position: Vec2) -> Self {
        Self {
            archetype: archetype.into(),
            faction,
            position,
            heading: 0.0,
            health: default_health(),
            radius: default_radius(),
            cooldowns: default_cooldowns(),
        }
    }

    pub fn spec(&self) -> UnitSpec {
        UnitSpec::new(Faction(self.faction), self.position)
            .with_heading(self.heading)
            .with_health(self.health)
            .with_radius(self.radius)
            .with_cooldowns(self.cooldowns.clone())
    }
}

/// Non-unit entities placed at start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PropSpawn {
    Obstacle {
        position: Vec2,
        radius: f32,
    },
    Hazard {
        position: Vec2,
        radius: f32,
        damage_per_second: f32,
    },
    Resource {
        position: Vec2,
    },
    Objective {
        position: Vec2,
        radius: f32,
        #[serde(default)]
        faction: Option<u8>,
    },
}

impl PropSpawn {
    pub fn position(&self) -> Vec2 {
        match self {
            PropSpawn::Obstacle { position, .. }
            | PropSpawn::Hazard { position, .. }
            | PropSpawn::Resource { position }
            | PropSpawn::Objective { position, .. } => *position,
        }
    }

    pub fn body(&self) -> Body {
        match *self {
            PropSpawn::Obstacle { position, radius } => Body::obstacle(position, radius),
            PropSpawn::Hazard {
                position,
                radius,
                damage_per_second,
            } => Body::hazard(position, radius, damage_per_second),
            PropSpawn::Resource { position } => Body::resource(position),
            PropSpawn::Objective {
                position,
                radius,
                faction,
            } => Body::objective(position, radius, faction.map(Faction)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    pub enabled: bool,
    /// Ticks between a unit's death and its return.
    pub delay_ticks: u64,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ticks: 40,
        }
    }
}

/// A complete headless scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkirmishConfig {
    pub seed: u64,
    /// Seconds per frame.
    pub dt: f32,
    pub frames: u64,
    pub map: MapConfig,
    pub combat: CombatConfig,
    pub respawn: RespawnConfig,
    pub archetypes: BTreeMap<String, ArchetypeConfig>,
    pub units: Vec<UnitSpawn>,
    pub props: Vec<PropSpawn>,
}

impl Default for SkirmishConfig {
    /// Two squads of three on an open field split by a wall with gaps at both ends.
    fn default() -> Self {
        let mut archetypes = BTreeMap::new();
        archetypes.insert("skirmisher".to_string(), ArchetypeConfig::default());
        archetypes.insert("medic".to_string(), ArchetypeConfig::support());
        archetypes.insert("exploder".to_string(), ArchetypeConfig::exploder());

        Self {
            seed: 7,
            dt: 0.1,
            frames: 600,
            map: MapConfig {
                walls: vec![RectConfig::new(Vec2::new(11.0, 5.0), Vec2::new(13.0, 19.0))],
                ..MapConfig::default()
            },
            combat: CombatConfig::default(),
            respawn: RespawnConfig::default(),
            archetypes,
            units: vec![
                UnitSpawn::new("skirmisher", 0, Vec2::new(3.0, 8.0)),
                UnitSpawn::new("skirmisher", 0, Vec2::new(3.0, 16.0)),
                UnitSpawn::new("medic", 0, Vec2::new(2.0, 12.0)),
                UnitSpawn::new("skirmisher", 1, Vec2::new(21.0, 8.0)),
                UnitSpawn::new("skirmisher", 1, Vec2::new(21.0, 16.0)),
                UnitSpawn::new("exploder", 1, Vec2::new(20.0, 12.0)),
            ],
            props: vec![
                PropSpawn::Resource {
                    position: Vec2::new(12.0, 2.5),
                },
                PropSpawn::Hazard {
                    position: Vec2::new(12.0, 21.5),
                    radius: 1.0,
                    damage_per_second: 4.0,
                },
            ],
        }
    }
}

impl SkirmishConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("Failed to parse scenario")?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize scenario")
    }

    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))?;
        Ok(config)
    }

    /// Load from project root (looks for .skirmish/scenario.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        Self::load_or_default(&project_root.join(PROJECT_SCENARIO))
    }

    /// Load `path` if it exists, otherwise the built-in scenario.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "scenario not found, using built-in default");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.dt.is_finite() && self.dt > 0.0,
            "dt must be > 0, got {}",
            self.dt
        );
        ensure!(
            self.map.tile_size > 0.0,
            "map.tile_size must be > 0, got {}",
            self.map.tile_size
        );
        ensure!(
            self.map.nav_cell_size > 0.0,
            "map.nav_cell_size must be > 0, got {}",
            self.map.nav_cell_size
        );
        ensure!(
            self.map.hazard_tile_dps >= 0.0,
            "map.hazard_tile_dps must be >= 0"
        );
        let map = self.map.build().context("Invalid map")?;
        let bounds = map.bounds();

        for (name, archetype) in &self.archetypes {
            archetype
                .validate()
                .with_context(|| format!("Invalid archetype '{name}'"))?;
        }

        ensure!(!self.units.is_empty(), "scenario spawns no units");
        for (i, unit) in self.units.iter().enumerate() {
            if !self.archetypes.contains_key(&unit.archetype) {
                bail!("units[{i}]: unknown archetype '{}'", unit.archetype);
            }
            ensure!(unit.health > 0.0, "units[{i}]: health must be > 0");
            ensure!(unit.radius > 0.0, "units[{i}]: radius must be > 0");
            ensure!(
                unit.cooldowns.iter().all(|c| c.is_finite() && *c >= 0.0),
                "units[{i}]: cooldowns must be finite and >= 0"
            );
            ensure!(
                bounds.contains(unit.position),
                "units[{i}]: position ({}, {}) is outside the map",
                unit.position.x,
                unit.position.y
            );
            ensure!(
                map.tile_at(unit.position).is_walkable(),
                "units[{i}]: position ({}, {}) is not walkable",
                unit.position.x,
                unit.position.y
            );
        }
        for (i, prop) in self.props.iter().enumerate() {
            let p = prop.position();
            ensure!(
                bounds.contains(p),
                "props[{i}]: position ({}, {}) is outside the map",
                p.x,
                p.y
            );
        }

        let c = &self.combat;
        ensure!(
            c.attack_range >= 0.0 && c.heal_range >= 0.0 && c.debuff_range >= 0.0,
            "combat ranges must be >= 0"
        );
        Ok(())
    }

    /// Fresh arena with terrain and props, no units yet.
    pub fn build_arena(&self) -> Result<Arena> {
        let map = self.map.build().context("Invalid map")?;
        let mut arena = Arena::new(map).with_hazard_tile_dps(self.map.hazard_tile_dps);
        for (i, prop) in self.props.iter().enumerate() {
            arena
                .spawn(prop.body())
                .with_context(|| format!("Failed to place props[{i}]"))?;
        }
        Ok(arena)
    }

    /// Validate, then build the arena and one agent per spawned unit.
    pub fn build(&self) -> Result<Simulation> {
        self.validate()?;
        Simulation::from_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scenario_is_valid() {
        SkirmishConfig::default().validate().unwrap();
    }

    #[test]
    fn unknown_archetype_is_rejected() {
        let mut config = SkirmishConfig::default();
        config.units.push(UnitSpawn::new("sniper", 0, Vec2::new(4.0, 4.0)));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sniper"));
    }

    #[test]
    fn units_inside_walls_are_rejected() {
        let mut config = SkirmishConfig::default();
        config.units[0].position = Vec2::new(12.0, 10.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn prop_yaml_uses_kind_tag() {
        let prop: PropSpawn =
            serde_yaml::from_str("kind: objective\nposition: {x: 4.0, y: 5.0}\nradius: 1.5\n")
                .unwrap();
        assert_eq!(
            prop,
            PropSpawn::Objective {
                position: Vec2::new(4.0, 5.0),
                radius: 1.5,
                faction: None
            }
        );
    }
}
