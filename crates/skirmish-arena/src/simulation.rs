//! Headless frame loop over an [`Arena`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use skirmish_agent::{behavior_for, FrameReport, Squad, TacticalAgent};
use skirmish_core::{AgentHandle, Faction, TickContext};
use skirmish_learn::{ModelMetadata, ModelStore};

use crate::{Arena, ArenaCombat, SkirmishConfig, UnitSpawn};

#[derive(Debug, Clone)]
struct RosterEntry {
    spawn: UnitSpawn,
    handle: AgentHandle,
    respawn_at: Option<u64>,
}

/// Totals over every frame run so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub decisions: u64,
    pub effects_requested: u64,
    pub kills: u64,
    pub deaths: u64,
    pub respawns: u64,
    pub total_reward: f32,
    /// Total reward divided by the number of agents.
    pub mean_reward: f32,
    pub strategy_switches: u32,
    pub alive_by_faction: BTreeMap<u8, usize>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames:            {}", self.frames)?;
        writeln!(f, "decisions:         {}", self.decisions)?;
        writeln!(f, "effects requested: {}", self.effects_requested)?;
        writeln!(f, "kills:             {}", self.kills)?;
        writeln!(f, "deaths:            {}", self.deaths)?;
        writeln!(f, "respawns:          {}", self.respawns)?;
        writeln!(f, "mean reward:       {:.3}", self.mean_reward)?;
        writeln!(f, "strategy switches: {}", self.strategy_switches)?;
        write!(f, "alive by faction: ")?;
        for (faction, alive) in &self.alive_by_faction {
            write!(f, " [{faction}] {alive}")?;
        }
        Ok(())
    }
}

/// An arena, its combat rules and the squad controlling every unit in it.
pub struct Simulation {
    arena: Arena,
    combat: ArenaCombat,
    squad: Squad,
    roster: Vec<RosterEntry>,
    config: SkirmishConfig,
    tick: u64,
    summary: RunSummary,
}

impl Simulation {
    /// Build without validating; prefer [`SkirmishConfig::build`].
    pub fn from_config(config: &SkirmishConfig) -> Result<Self> {
        let mut arena = config.build_arena()?;
        let mut squad = Squad::new(config.map.nav_cell_size);
        let mut roster = Vec::with_capacity(config.units.len());

        for (i, spawn) in config.units.iter().enumerate() {
            let archetype = config
                .archetypes
                .get(&spawn.archetype)
                .with_context(|| format!("units[{i}]: unknown archetype '{}'", spawn.archetype))?;
            let handle = arena
                .spawn_unit(&spawn.spec())
                .with_context(|| format!("Failed to spawn units[{i}]"))?;
            squad.push(TacticalAgent::new(
                handle,
                archetype.clone(),
                behavior_for(&archetype.behavior),
                config.seed,
            ));
            roster.push(RosterEntry {
                spawn: spawn.clone(),
                handle,
                respawn_at: None,
            });
        }

        tracing::info!(
            units = roster.len(),
            archetypes = config.archetypes.len(),
            seed = config.seed,
            "simulation ready"
        );

        let mut sim = Self {
            arena,
            combat: ArenaCombat::with_config(config.combat),
            squad,
            roster,
            config: config.clone(),
            tick: 0,
            summary: RunSummary::default(),
        };
        sim.refresh_summary();
        Ok(sim)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn squad(&self) -> &Squad {
        &self.squad
    }

    pub fn combat(&self) -> &ArenaCombat {
        &self.combat
    }

    pub fn config(&self) -> &SkirmishConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Handle currently controlled for each configured unit, in spawn order.
    pub fn handles(&self) -> Vec<AgentHandle> {
        self.roster.iter().map(|r| r.handle).collect()
    }

    /// Advance world timers, run one squad frame, then bring back units whose delay elapsed.
    pub fn step(&mut self) -> FrameReport {
        let ctx = TickContext::new(self.tick, self.config.dt, self.config.seed);

        for handle in self.arena.advance(ctx.dt()) {
            tracing::debug!(unit = %handle, "unit destroyed by hazard");
        }
        let report = self.squad.step(&ctx, &mut self.arena, &mut self.combat);

        for dead in &report.deaths {
            if let Some(entry) = self.roster.iter_mut().find(|r| r.handle == *dead) {
                if self.config.respawn.enabled {
                    entry.respawn_at = Some(self.tick + self.config.respawn.delay_ticks.max(1));
                }
            }
        }
        self.respawn_due();

        self.summary.frames += 1;
        self.summary.decisions += report.decisions as u64;
        self.summary.effects_requested += report.effects_requested as u64;
        self.summary.kills += u64::from(report.kills);
        self.summary.deaths += report.deaths.len() as u64;
        self.summary.total_reward += report.reward;
        self.refresh_summary();

        self.tick += 1;
        report
    }

    /// Run `frames` frames (the scenario's own frame count when `None`).
    pub fn run(&mut self, frames: Option<u64>) -> &RunSummary {
        let frames = frames.unwrap_or(self.config.frames);
        for _ in 0..frames {
            self.step();
        }
        tracing::info!(
            frames = self.summary.frames,
            kills = self.summary.kills,
            deaths = self.summary.deaths,
            mean_reward = self.summary.mean_reward,
            "run finished"
        );
        &self.summary
    }

    fn respawn_due(&mut self) {
        let tick = self.tick;
        for entry in &mut self.roster {
            if entry.respawn_at.is_none_or(|at| at > tick) {
                continue;
            }
            match self.arena.spawn_unit(&entry.spawn.spec()) {
                Ok(handle) => {
                    if let Some(agent) = self.squad.get_mut(entry.handle) {
                        agent.respawn(handle);
                    }
                    tracing::debug!(old = %entry.handle, new = %handle, "respawned");
                    entry.handle = handle;
                    entry.respawn_at = None;
                    self.summary.respawns += 1;
                }
                Err(e) => {
                    tracing::warn!(unit = %entry.handle, error = %e, "respawn failed, retrying");
                    entry.respawn_at = Some(tick + 1);
                }
            }
        }
    }

    fn refresh_summary(&mut self) {
        let agents = self.squad.len().max(1) as f32;
        self.summary.mean_reward = self.summary.total_reward / agents;
        self.summary.strategy_switches = self
            .squad
            .agents()
            .iter()
            .map(|a| a.strategy().switches())
            .sum();
        let mut alive = BTreeMap::new();
        for entry in &self.roster {
            let faction = entry.spawn.faction;
            alive
                .entry(faction)
                .or_insert_with(|| self.arena.units_of(Faction(faction)));
        }
        self.summary.alive_by_faction = alive;
    }

    /// Save every learned model under `dir` as `<archetype>-<n>.json`. Failures are logged and
    /// skipped; returns the metadata of each model written.
    pub fn save_models<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        dir: &Path,
    ) -> Vec<ModelMetadata> {
        let mut saved = Vec::new();
        for (n, entry) in self.roster.iter().enumerate() {
            let Some(agent) = self.squad.get(entry.handle) else {
                continue;
            };
            let path = dir.join(format!("{}-{n}.json", entry.spawn.archetype));
            match agent.save_model(store, &path) {
                Ok(Some(meta)) => saved.push(meta),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to save model");
                }
            }
        }
        saved
    }

    /// Load models written by [`Simulation::save_models`]; missing or incompatible files are
    /// logged and leave that agent's model untouched. Returns the number loaded.
    pub fn load_models<S: ModelStore + ?Sized>(&mut self, store: &S, dir: &Path) -> usize {
        let mut loaded = 0;
        for (n, entry) in self.roster.iter().enumerate() {
            let Some(agent) = self.squad.get_mut(entry.handle) else {
                continue;
            };
            let path = dir.join(format!("{}-{n}.json", entry.spawn.archetype));
            match agent.load_model(store, &path) {
                Ok(Some(_)) => loaded += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load model");
                }
            }
        }
        loaded
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("units", &self.roster.len())
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}
