use std::path::Path as FsPath;

use skirmish_core::rng::{derive_seed, streams};
use skirmish_core::{
    ActionId, AgentHandle, DeterministicRng, EffectReport, EffectRequest, MotionCommand,
    PersistenceError, SplitMix64, ThinkSchedule, TickContext, Vec2, WorldQuery,
};
use skirmish_learn::{
    DecisionPolicy, Experience, ModelMetadata, ModelStore, RewardBreakdown, RewardEvents,
    RewardShaper, RewardSnapshot, StrategySelector,
};
use skirmish_nav::{NavGridCache, Navigator, Path};
use skirmish_perception::{extract_state, Observation, Percept, PerceptionVector};
use skirmish_planner::{LookaheadPlanner, PlannerSnapshot};
use skirmish_steer::{StandoffTarget, Steering, SteeringInput, SteeringOutput, WorldProbe};

use crate::behavior::{AgentDecision, Focus};
use crate::{ActionTuning, ArchetypeBehavior, ArchetypeConfig, BrainKind, MovementIntent};

/// What one agent asks of the world for this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentCommand {
    pub agent: AgentHandle,
    pub motion: MotionCommand,
    pub effects: Vec<EffectRequest>,
    /// Action being executed; `None` for the idle fallback.
    pub action: Option<ActionId>,
    /// A fresh decision was made this tick.
    pub thought: bool,
}

impl AgentCommand {
    /// Stand still and request nothing.
    pub fn idle(agent: AgentHandle, heading: f32) -> Self {
        Self {
            agent,
            motion: MotionCommand::stop(heading),
            effects: Vec::new(),
            action: None,
            thought: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.action.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeStats {
    pub episode: u64,
    pub steps: u64,
    pub decisions: u64,
    pub total_reward: f32,
    pub kills: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: RewardBreakdown,
    /// The unit died (or self-destructed) during this step.
    pub terminal: bool,
}

enum Brain {
    Reactive(Box<DecisionPolicy>),
    Planner(LookaheadPlanner),
}

/// State captured in `update` and consumed by `after_action`.
#[derive(Debug, Clone)]
struct Pending {
    state: PerceptionVector,
    action: ActionId,
    snapshot: RewardSnapshot,
    thought: bool,
}

/// The decision being scored: its state, its action and the reward collected since it was made.
#[derive(Debug, Clone)]
struct OpenWindow {
    state: PerceptionVector,
    action: ActionId,
    reward: f32,
}

/// One autonomous unit: perception, decision, pathfinding and steering for a single archetype.
pub struct TacticalAgent<B = Box<dyn ArchetypeBehavior>> {
    handle: AgentHandle,
    config: ArchetypeConfig,
    tuning: ActionTuning,
    behavior: B,
    brain: Brain,
    steering: Steering,
    shaper: RewardShaper,
    strategy: StrategySelector,
    schedule: ThinkSchedule,
    decision: Option<AgentDecision>,
    path: Option<Path>,
    patrol_point: Option<Vec2>,
    explore_rng: SplitMix64,
    steer_rng: SplitMix64,
    pending: Option<Pending>,
    /// Last step the unit was perceived in; scores a unit that vanished between frames.
    last_seen: Option<Pending>,
    decision_reward: f32,
    window: Option<OpenWindow>,
    heading: f32,
    alive: bool,
    stats: EpisodeStats,
    last_episode: Option<EpisodeStats>,
}

impl<B: ArchetypeBehavior> TacticalAgent<B> {
    pub fn new(handle: AgentHandle, config: ArchetypeConfig, behavior: B, seed: u64) -> Self {
        let brain = match config.brain {
            BrainKind::Reactive => Brain::Reactive(Box::new(DecisionPolicy::linear(
                config.policy.clone(),
                config.perception.layout().len(),
            ))),
            BrainKind::Planner => Brain::Planner(LookaheadPlanner::with_config(config.planner)),
        };
        let id = handle.stable_id();
        Self {
            handle,
            tuning: ActionTuning::from_config(&config),
            behavior,
            brain,
            steering: Steering::new(config.steering.clone()),
            shaper: RewardShaper::new(config.rewards),
            strategy: StrategySelector::new(config.strategy.clone()),
            schedule: ThinkSchedule::deterministic(handle, config.think_every_ticks),
            decision: None,
            path: None,
            patrol_point: None,
            explore_rng: SplitMix64::new(derive_seed(seed, id, streams::EXPLORATION)),
            steer_rng: SplitMix64::new(derive_seed(seed, id, streams::STEERING)),
            pending: None,
            last_seen: None,
            decision_reward: 0.0,
            window: None,
            heading: 0.0,
            alive: true,
            stats: EpisodeStats::default(),
            last_episode: None,
            config,
        }
    }

    pub fn handle(&self) -> AgentHandle {
        self.handle
    }

    pub fn config(&self) -> &ArchetypeConfig {
        &self.config
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn stats(&self) -> &EpisodeStats {
        &self.stats
    }

    /// Stats of the most recently finished episode.
    pub fn last_episode(&self) -> Option<&EpisodeStats> {
        self.last_episode.as_ref()
    }

    pub fn strategy(&self) -> &StrategySelector {
        &self.strategy
    }

    /// The learning policy, for reactive agents.
    pub fn policy(&self) -> Option<&DecisionPolicy> {
        match &self.brain {
            Brain::Reactive(policy) => Some(policy),
            Brain::Planner(_) => None,
        }
    }

    pub fn current_action(&self) -> Option<ActionId> {
        self.decision.map(|d| d.action)
    }

    pub fn current_decision(&self) -> Option<&AgentDecision> {
        self.decision.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn steering(&self) -> &Steering {
        &self.steering
    }

    /// Run perception, decision (on the think cadence), pathfinding and steering for one tick.
    ///
    /// Never fails: when the unit cannot be perceived the idle command is returned.
    pub fn update<W: WorldQuery + ?Sized>(
        &mut self,
        ctx: &TickContext,
        world: &W,
        grids: &mut NavGridCache,
    ) -> AgentCommand {
        if !self.alive {
            return AgentCommand::idle(self.handle, self.heading);
        }
        let dt = ctx.dt();

        let percept = match extract_state(
            self.handle,
            world,
            &self.config.perception,
            self.strategy.indicator(),
        ) {
            Ok(p) => p,
            Err(err) => {
                tracing::debug!(agent = %self.handle, error = %err, "agent unavailable; idling");
                self.pending = self.last_seen.take().map(|p| Pending {
                    thought: false,
                    ..p
                });
                return AgentCommand::idle(self.handle, self.heading);
            }
        };
        self.heading = percept.observation.status.heading;

        let thought = self.decision.is_none() || self.schedule.should_think(ctx.tick);
        if thought {
            let decision = self.decide(&percept, world);
            self.stats.decisions += 1;
            self.decision = Some(decision);
        }
        let mut decision = self
            .decision
            .unwrap_or_else(|| AgentDecision::new(ActionId::Idle));
        decision.refresh(&percept.observation);
        self.decision = Some(decision);

        let obs = &percept.observation;
        let plan = self.behavior.interpret(&decision, obs, &self.tuning);
        let mut effects = if thought { plan.effects } else { Vec::new() };
        if let Some(reflex) = self.behavior.reflex(obs) {
            effects.push(reflex);
        }

        let input = self.steering_input(plan.intent, obs, world, grids, dt);
        let probe = WorldProbe::new(world, self.handle, self.config.steering.sensors.sample_radius);
        let out: SteeringOutput = self.steering.steer(&input, &probe, &mut self.steer_rng, dt);
        self.heading = out.heading;

        let pending = Pending {
            snapshot: RewardSnapshot::from_observation(obs, &world.bounds()),
            state: percept.vector,
            action: decision.action,
            thought,
        };
        self.last_seen = Some(pending.clone());
        self.pending = Some(pending);

        AgentCommand {
            agent: self.handle,
            motion: MotionCommand::new(out.heading, out.speed),
            effects,
            action: Some(decision.action),
            thought,
        }
    }

    fn decide<W: WorldQuery + ?Sized>(&mut self, percept: &Percept, world: &W) -> AgentDecision {
        let obs = &percept.observation;
        match &mut self.brain {
            Brain::Reactive(policy) => {
                let d = policy.select_action(&percept.vector, &mut self.explore_rng);
                tracing::debug!(
                    agent = %self.handle,
                    action = %d.action,
                    source = ?d.source,
                    "reactive decision"
                );
                AgentDecision::from_observation(d.action, obs)
            }
            Brain::Planner(planner) => {
                match PlannerSnapshot::capture(self.handle, world, planner.config()) {
                    Ok(snapshot) => {
                        let d = planner.decide(&snapshot);
                        if let Some(bound) = d.bound {
                            tracing::debug!(agent = %self.handle, %bound, "planner search cut short");
                        }
                        let focus = d.action.target().and_then(|h| {
                            snapshot
                                .ally(h)
                                .or_else(|| snapshot.enemy(h))
                                .map(|u| Focus {
                                    handle: u.handle,
                                    position: u.position,
                                    radius: 0.0,
                                    high_value: false,
                                })
                        });
                        AgentDecision {
                            action: d.action_id,
                            focus,
                        }
                    }
                    Err(err) => {
                        tracing::debug!(agent = %self.handle, error = %err, "planner snapshot unavailable");
                        AgentDecision::new(ActionId::Wait)
                    }
                }
            }
        }
    }

    fn steering_input<W: WorldQuery + ?Sized>(
        &mut self,
        intent: MovementIntent,
        obs: &Observation,
        world: &W,
        grids: &mut NavGridCache,
        dt: f32,
    ) -> SteeringInput {
        let pos = obs.position();
        let heading = obs.status.heading;
        let speed = self.config.steering.max_speed * self.strategy.modifiers().speed_scale;

        match intent {
            MovementIntent::Stay => {
                self.path = None;
                SteeringInput::stop(pos, heading)
            }
            MovementIntent::Flee { from } => {
                self.path = None;
                SteeringInput {
                    flee: true,
                    ..SteeringInput::toward(pos, heading, from, speed)
                }
            }
            MovementIntent::Patrol => {
                let goal = self.patrol_goal(pos, world);
                let (target, arrive) = self.follow(goal, obs, world, grids, dt);
                SteeringInput {
                    arrive,
                    ..SteeringInput::toward(pos, heading, target, speed)
                }
            }
            MovementIntent::MoveTo { point, arrive } => {
                let (target, last) = self.follow(point, obs, world, grids, dt);
                SteeringInput {
                    arrive: arrive && last,
                    ..SteeringInput::toward(pos, heading, target, speed)
                }
            }
            MovementIntent::Engage { point, standoff } => {
                let (target, last) = self.follow(point, obs, world, grids, dt);
                let standoff = standoff.then(|| StandoffTarget {
                    position: point,
                    line_of_sight: world.line_of_sight_clear(pos, point),
                });
                SteeringInput {
                    arrive: last,
                    standoff,
                    ..SteeringInput::toward(pos, heading, target, speed)
                }
            }
        }
    }

    /// Keep a path toward `goal`, replanning when a recompute trigger fires. Returns the point
    /// to steer at and whether it is the last one.
    fn follow<W: WorldQuery + ?Sized>(
        &mut self,
        goal: Vec2,
        obs: &Observation,
        world: &W,
        grids: &mut NavGridCache,
        dt: f32,
    ) -> (Vec2, bool) {
        let nav = self.config.navigation;
        let pos = obs.position();

        let replan = match &self.path {
            None => true,
            Some(path) => match nav.recompute_policy().check(path, goal, world, self.handle) {
                Some(reason) => {
                    tracing::debug!(agent = %self.handle, reason = ?reason, "replanning path");
                    true
                }
                None => false,
            },
        };
        if replan {
            let clearance = obs.status.radius.max(0.0) + nav.clearance_margin.max(0.0);
            let result = grids.grid_for(world, clearance).plan(pos, goal, nav.limits());
            if !result.outcome.is_found() {
                tracing::debug!(
                    agent = %self.handle,
                    outcome = ?result.outcome,
                    expansions = result.expansions,
                    "no path; steering straight at the goal"
                );
            }
            self.path = Some(result.path);
        }

        let Some(path) = self.path.as_mut() else {
            return (goal, true);
        };
        path.tick(dt);
        match path.advance(pos, nav.arrival_radius) {
            Some(wp) if path.len() > 1 => (wp, false),
            Some(wp) => (wp, true),
            None => (goal, true),
        }
    }

    fn patrol_goal<W: WorldQuery + ?Sized>(&mut self, pos: Vec2, world: &W) -> Vec2 {
        let reached = self.patrol_point.map_or(true, |p| {
            p.distance(pos) <= self.config.navigation.arrival_radius * 2.0
        });
        if reached {
            let bounds = world.bounds();
            let mut pick = bounds.center();
            for _ in 0..8 {
                let candidate = Vec2::new(
                    self.explore_rng.next_f32_range(bounds.min.x, bounds.max.x),
                    self.explore_rng.next_f32_range(bounds.min.y, bounds.max.y),
                );
                if world.tile_at(candidate).is_walkable() {
                    pick = candidate;
                    break;
                }
            }
            self.patrol_point = Some(pick);
            self.path = None;
        }
        self.patrol_point.unwrap_or(pos)
    }

    /// Score the step that just executed: reward shaping, experience recording, strategy
    /// outcome tracking and the training cadence. Ends the episode when the unit died.
    pub fn after_action<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        report: &EffectReport,
    ) -> Option<StepOutcome> {
        let pending = self.pending.take()?;

        let next = extract_state(
            self.handle,
            world,
            &self.config.perception,
            self.strategy.indicator(),
        )
        .ok();
        let current = match &next {
            Some(p) => RewardSnapshot::from_observation(&p.observation, &world.bounds()),
            None => RewardSnapshot::dead(&pending.snapshot),
        };

        let mut events = RewardEvents::from(report);
        let terminal = events.died || !current.alive;
        events.died = terminal;
        let reward = self.shaper.compute(&pending.snapshot, &current, &events);

        self.stats.steps += 1;
        self.stats.total_reward += reward.total;
        self.stats.kills = self.stats.kills.saturating_add(report.kills);

        // A decision's outcome is the reward collected until the next decision.
        if pending.thought && self.stats.decisions > 1 {
            self.close_decision_window();
        }
        self.decision_reward += reward.total;

        if let Brain::Reactive(policy) = &mut self.brain {
            // One experience per decision: a new decision closes the previous window.
            if pending.thought {
                if let Some(open) = self.window.take() {
                    policy.record_experience(Experience {
                        state: open.state,
                        action: open.action,
                        reward: open.reward,
                        next_state: pending.state.clone(),
                        terminal: false,
                    });
                }
                self.window = Some(OpenWindow {
                    state: pending.state.clone(),
                    action: pending.action,
                    reward: 0.0,
                });
            }
            if let Some(open) = &mut self.window {
                open.reward += reward.total;
            }
            if terminal {
                if let Some(open) = self.window.take() {
                    let next_state = match next {
                        Some(p) => p.vector,
                        None => pending.state,
                    };
                    policy.record_experience(Experience {
                        state: open.state,
                        action: open.action,
                        reward: open.reward,
                        next_state,
                        terminal: true,
                    });
                }
            }
            if pending.thought {
                policy.after_decision();
            }
        }

        if terminal {
            self.end_episode();
        }
        Some(StepOutcome { reward, terminal })
    }

    fn close_decision_window(&mut self) {
        let success = self.decision_reward >= 0.0;
        self.decision_reward = 0.0;
        if self.strategy.record_outcome(success).is_some() {
            if let Brain::Reactive(policy) = &mut self.brain {
                policy.set_modifiers(self.strategy.modifiers());
            }
        }
    }

    fn end_episode(&mut self) {
        self.close_decision_window();
        self.alive = false;
        self.last_seen = None;
        self.path = None;
        self.decision = None;
        if let Brain::Reactive(policy) = &mut self.brain {
            policy.end_episode();
        }
        tracing::info!(
            agent = %self.handle,
            episode = self.stats.episode,
            steps = self.stats.steps,
            reward = self.stats.total_reward,
            kills = self.stats.kills,
            "episode ended"
        );
        self.last_episode = Some(self.stats);
    }

    /// Start a new episode controlling `handle` (the respawned unit).
    pub fn respawn(&mut self, handle: AgentHandle) {
        self.handle = handle;
        self.alive = true;
        self.schedule = ThinkSchedule::deterministic(handle, self.config.think_every_ticks);
        self.steering.reset();
        self.shaper.reset();
        self.behavior.reset();
        self.decision = None;
        self.path = None;
        self.patrol_point = None;
        self.pending = None;
        self.last_seen = None;
        self.decision_reward = 0.0;
        self.window = None;
        self.stats = EpisodeStats {
            episode: self.stats.episode + 1,
            ..EpisodeStats::default()
        };
    }

    /// Persist the learned model. Planner agents have nothing to save.
    pub fn save_model<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        path: &FsPath,
    ) -> Result<Option<ModelMetadata>, PersistenceError> {
        match &self.brain {
            Brain::Reactive(policy) => policy.save_model(store, path).map(Some),
            Brain::Planner(_) => Ok(None),
        }
    }

    pub fn load_model<S: ModelStore + ?Sized>(
        &mut self,
        store: &S,
        path: &FsPath,
    ) -> Result<Option<ModelMetadata>, PersistenceError> {
        match &mut self.brain {
            Brain::Reactive(policy) => policy.load_model(store, path).map(Some),
            Brain::Planner(_) => Ok(None),
        }
    }
}

impl<B: ArchetypeBehavior> std::fmt::Debug for TacticalAgent<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TacticalAgent")
            .field("handle", &self.handle)
            .field("behavior", &self.behavior.name())
            .field("brain", &self.config.brain)
            .field("alive", &self.alive)
            .field("action", &self.current_action())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
