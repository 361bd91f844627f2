use skirmish_core::{AgentHandle, CombatResolver, EffectReport, TickContext, WorldMut};
use skirmish_nav::NavGridCache;

use crate::{AgentCommand, ArchetypeBehavior, TacticalAgent};

/// Summary of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub tick: u64,
    /// Agents that produced a non-idle command.
    pub active: usize,
    pub decisions: usize,
    pub effects_requested: usize,
    pub kills: u32,
    /// Agents whose episode ended this frame.
    pub deaths: Vec<AgentHandle>,
    pub reward: f32,
}

/// Every agent of a scenario, plus the navigation grids they share.
pub struct Squad<B = Box<dyn ArchetypeBehavior>> {
    agents: Vec<TacticalAgent<B>>,
    grids: NavGridCache,
}

impl<B: ArchetypeBehavior> Squad<B> {
    pub fn new(cell_size: f32) -> Self {
        Self {
            agents: Vec::new(),
            grids: NavGridCache::new(cell_size),
        }
    }

    pub fn push(&mut self, agent: TacticalAgent<B>) {
        self.agents.push(agent);
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[TacticalAgent<B>] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [TacticalAgent<B>] {
        &mut self.agents
    }

    pub fn get(&self, handle: AgentHandle) -> Option<&TacticalAgent<B>> {
        self.agents.iter().find(|a| a.handle() == handle)
    }

    pub fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut TacticalAgent<B>> {
        self.agents.iter_mut().find(|a| a.handle() == handle)
    }

    pub fn grids(&self) -> &NavGridCache {
        &self.grids
    }

    /// Advance every agent by one frame.
    ///
    /// All agents read the same world state; motions and effects are applied only after every
    /// command is computed, then each agent scores its step.
    pub fn step<W, C>(&mut self, ctx: &TickContext, world: &mut W, combat: &mut C) -> FrameReport
    where
        W: WorldMut,
        C: CombatResolver<W>,
    {
        self.agents.sort_by_key(|a| a.handle().stable_id());

        let mut report = FrameReport {
            tick: ctx.tick,
            ..FrameReport::default()
        };

        let commands: Vec<(usize, AgentCommand)> = {
            let view: &W = world;
            let grids = &mut self.grids;
            self.agents
                .iter_mut()
                .enumerate()
                .filter(|(_, a)| a.is_alive())
                .map(|(i, a)| (i, a.update(ctx, view, grids)))
                .collect()
        };

        let dt = ctx.dt();
        for (_, cmd) in &commands {
            if !cmd.is_idle() {
                report.active += 1;
            }
            if cmd.thought {
                report.decisions += 1;
            }
            if !world.apply_motion(cmd.agent, &cmd.motion, dt) {
                tracing::trace!(agent = %cmd.agent, "motion dropped; unit is gone");
            }
        }

        let mut effects = Vec::with_capacity(commands.len());
        for (i, cmd) in &commands {
            let mut merged = EffectReport::default();
            for request in &cmd.effects {
                report.effects_requested += 1;
                merged.merge(&combat.resolve(world, cmd.agent, request));
            }
            effects.push((*i, merged));
        }

        for (i, merged) in effects {
            let Some(agent) = self.agents.get_mut(i) else {
                continue;
            };
            report.kills = report.kills.saturating_add(merged.kills);
            if let Some(outcome) = agent.after_action(&*world, &merged) {
                report.reward += outcome.reward.total;
                if outcome.terminal {
                    report.deaths.push(agent.handle());
                }
            }
        }
        report
    }
}

impl<B: ArchetypeBehavior> std::fmt::Debug for Squad<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Squad")
            .field("agents", &self.agents)
            .field("grids", &self.grids)
            .finish()
    }
}
