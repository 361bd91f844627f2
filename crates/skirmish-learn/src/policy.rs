//! Decision policy: epsilon-greedy exploration over a learned estimator, with an ordered rule
//! table as the fallback whenever the model is untrained or faulty.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::{ActionId, ActionSet, DeterministicRng, ModelError, PersistenceError};
use skirmish_perception::{features, PerceptionVector};

use crate::{
    BackgroundTrainer, Estimator, Experience, ExperienceBuffer, FitParams, LinearQModel,
    ModelMetadata, ModelStore, StrategyModifiers, TrainingMode,
};

/// Thresholds of the rule table, in normalized perception units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Below this health ratio the unit retreats.
    pub retreat_health: f32,
    /// Normalized enemy distance at or below which the unit attacks.
    pub engage_distance: f32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            retreat_health: 0.3,
            engage_distance: 0.25,
        }
    }
}

impl RuleThresholds {
    pub fn with_modifiers(&self, m: &StrategyModifiers) -> Self {
        Self {
            retreat_health: (self.retreat_health + m.retreat_health_offset).clamp(0.0, 1.0),
            engage_distance: (self.engage_distance * m.engage_range_scale).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub actions: ActionSet,
    pub rules: RuleThresholds,
    pub epsilon: f32,
    /// Multiplied into epsilon at the end of every episode.
    pub epsilon_decay: f32,
    pub epsilon_floor: f32,
    pub buffer_capacity: usize,
    /// Experiences required before the learned model is consulted.
    pub min_buffer: usize,
    pub batch_size: usize,
    /// Decisions between training steps.
    pub train_every: u32,
    pub fit: FitParams,
    pub training: TrainingMode,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            actions: ActionSet::combat(),
            rules: RuleThresholds::default(),
            epsilon: 0.2,
            epsilon_decay: 0.95,
            epsilon_floor: 0.02,
            buffer_capacity: 2048,
            min_buffer: 64,
            batch_size: 32,
            train_every: 16,
            fit: FitParams::default(),
            training: TrainingMode::Inline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    RuleFallback,
    Learned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Explore,
    Learned,
    Rules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: ActionId,
    pub source: DecisionSource,
}

pub struct DecisionPolicy<E: Estimator = LinearQModel> {
    config: PolicyConfig,
    model: E,
    buffer: ExperienceBuffer,
    epsilon: f32,
    modifiers: StrategyModifiers,
    decisions_since_train: u32,
    train_steps: u64,
    episodes: u64,
    fault_latched: bool,
    trainer: Option<BackgroundTrainer<E>>,
}

impl DecisionPolicy<LinearQModel> {
    /// Policy backed by a fresh [`LinearQModel`] sized for `input_len` features.
    pub fn linear(config: PolicyConfig, input_len: usize) -> Self {
        let model = LinearQModel::new(input_len, config.actions.clone());
        Self::new(config, model)
    }
}

impl<E: Estimator> DecisionPolicy<E> {
    pub fn new(config: PolicyConfig, model: E) -> Self {
        let trainer = match config.training {
            TrainingMode::Inline => None,
            TrainingMode::Background => match BackgroundTrainer::spawn("skirmish-trainer") {
                Ok(t) => Some(t),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to start training worker; training inline");
                    None
                }
            },
        };
        Self {
            buffer: ExperienceBuffer::new(config.buffer_capacity),
            epsilon: config.epsilon.clamp(0.0, 1.0),
            config,
            model,
            modifiers: StrategyModifiers::default(),
            decisions_since_train: 0,
            train_steps: 0,
            episodes: 0,
            fault_latched: false,
            trainer,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn actions(&self) -> &ActionSet {
        &self.config.actions
    }

    pub fn model(&self) -> &E {
        &self.model
    }

    pub fn buffer(&self) -> &ExperienceBuffer {
        &self.buffer
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    pub fn fault_latched(&self) -> bool {
        self.fault_latched
    }

    pub fn set_modifiers(&mut self, modifiers: StrategyModifiers) {
        self.modifiers = modifiers;
    }

    pub fn mode(&self) -> PolicyMode {
        if self.buffer.len() >= self.config.min_buffer.max(1) && self.model.is_trained() {
            PolicyMode::Learned
        } else {
            PolicyMode::RuleFallback
        }
    }

    /// Pick an action for `state`. Always returns a member of the configured action set.
    pub fn select_action<R>(&mut self, state: &PerceptionVector, rng: &mut R) -> Decision
    where
        R: DeterministicRng + ?Sized,
    {
        self.poll_trainer();

        if self.epsilon > 0.0 && rng.chance(self.epsilon) {
            let idx = rng.next_index(self.config.actions.len());
            let action = self
                .config
                .actions
                .get(idx)
                .unwrap_or_else(|| self.config.actions.first());
            return Decision {
                action,
                source: DecisionSource::Explore,
            };
        }

        if self.mode() == PolicyMode::Learned {
            match self.best_learned(state) {
                Ok(action) => {
                    return Decision {
                        action,
                        source: DecisionSource::Learned,
                    }
                }
                Err(err) => self.note_fault(&err),
            }
        }

        Decision {
            action: self.rule_action(state),
            source: DecisionSource::Rules,
        }
    }

    fn best_learned(&self, state: &PerceptionVector) -> Result<ActionId, ModelError> {
        let mut best: Option<(ActionId, f32)> = None;
        for action in self.config.actions.iter() {
            let score = self.model.score(state, action)?;
            let score = if score.is_nan() {
                f32::NEG_INFINITY
            } else {
                score
            };
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((action, score));
            }
        }
        match best {
            Some((action, score)) if score.is_finite() => Ok(action),
            _ => Err(ModelError::NonFinite),
        }
    }

    /// The ordered rule table. Each rule lists preferred actions; the first one in the action
    /// set wins, and the set's first action is the final fallback.
    pub fn rule_action(&self, state: &PerceptionVector) -> ActionId {
        let rules = self.config.rules.with_modifiers(&self.modifiers);
        let has_enemy = state.has_enemy();
        let enemy_distance = state.enemy_distance();
        let ability_ready = state
            .get(features::BASE_LEN)
            .is_some_and(|cooldown| cooldown <= 0.0);

        let mut preferred: Vec<ActionId> = Vec::with_capacity(8);
        if has_enemy && state.health() < rules.retreat_health {
            preferred.extend([ActionId::Retreat, ActionId::Flee]);
        }
        if has_enemy && enemy_distance <= rules.engage_distance {
            if ability_ready {
                preferred.push(ActionId::UseAbility);
            }
            preferred.extend([ActionId::Attack, ActionId::Strafe]);
        }
        if has_enemy {
            preferred.push(ActionId::Approach);
        }
        if state.get(features::RESOURCE_NEARBY).unwrap_or(0.0) > 0.5 {
            preferred.push(ActionId::Collect);
        }
        preferred.extend([ActionId::Patrol, ActionId::Idle, ActionId::Wait]);

        preferred
            .into_iter()
            .find(|a| self.config.actions.contains(*a))
            .unwrap_or_else(|| self.config.actions.first())
    }

    fn note_fault(&mut self, err: &ModelError) {
        if !self.fault_latched {
            tracing::warn!(error = %err, "model fault; falling back to rules");
            self.fault_latched = true;
        }
    }

    pub fn record_experience(&mut self, experience: Experience) {
        self.buffer.push(experience);
    }

    /// Count one decision and run the training step when the cadence is due.
    ///
    /// Returns `true` if a step ran (inline) or was queued (background).
    pub fn after_decision(&mut self) -> bool {
        self.decisions_since_train = self.decisions_since_train.saturating_add(1);
        if self.decisions_since_train < self.config.train_every.max(1) {
            return false;
        }
        if self.buffer.len() < self.config.min_buffer.max(1) {
            return false;
        }
        self.decisions_since_train = 0;
        self.train_step()
    }

    /// Fit the most recent batch now (inline) or hand it to the worker (background).
    pub fn train_step(&mut self) -> bool {
        let batch = self.buffer.recent(self.config.batch_size.max(1));
        if batch.is_empty() {
            return false;
        }

        if let Some(trainer) = self.trainer.as_mut() {
            if trainer.in_flight() > 0 {
                return false;
            }
            return trainer.submit(self.model.clone(), batch, self.config.fit);
        }

        let mut next = self.model.clone();
        match next.fit(&batch, &self.config.fit) {
            Ok(report) => {
                self.model = next;
                self.train_steps += 1;
                self.fault_latched = false;
                tracing::debug!(
                    samples = report.samples,
                    mean_abs_error = report.mean_abs_error,
                    "training step"
                );
            }
            Err(err) => self.note_fault(&err),
        }
        true
    }

    /// Swap in a model finished by the background worker, if any. Never blocks.
    pub fn poll_trainer(&mut self) -> bool {
        let Some(outcome) = self.trainer.as_mut().and_then(|t| t.try_collect()) else {
            return false;
        };
        self.apply_outcome(outcome)
    }

    /// Block up to `timeout` for a pending background fit. For shutdown and tests.
    pub fn wait_for_training(&mut self, timeout: std::time::Duration) -> bool {
        let Some(outcome) = self
            .trainer
            .as_mut()
            .filter(|t| t.in_flight() > 0)
            .and_then(|t| t.collect_timeout(timeout))
        else {
            return false;
        };
        self.apply_outcome(outcome)
    }

    fn apply_outcome(&mut self, outcome: crate::trainer::TrainOutcome<E>) -> bool {
        match outcome {
            Ok((model, report)) => {
                self.model = model;
                self.train_steps += 1;
                self.fault_latched = false;
                tracing::debug!(
                    samples = report.samples,
                    mean_abs_error = report.mean_abs_error,
                    "background training step applied"
                );
                true
            }
            Err(err) => {
                self.note_fault(&err);
                false
            }
        }
    }

    /// Close an episode: decay epsilon toward its floor.
    pub fn end_episode(&mut self) {
        self.episodes += 1;
        let floor = self.config.epsilon_floor.clamp(0.0, 1.0);
        self.epsilon = (self.epsilon * self.config.epsilon_decay.clamp(0.0, 1.0)).max(floor);
        tracing::debug!(episode = self.episodes, epsilon = self.epsilon, "episode ended");
    }

    pub fn save_model<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        path: &Path,
    ) -> Result<ModelMetadata, PersistenceError> {
        let blob = self
            .model
            .encode()
            .map_err(|e| PersistenceError::Encode(e.to_string()))?;
        let metadata = ModelMetadata::new(self.model.kind())
            .with_value("input_len", self.model.input_len())
            .with_value("train_steps", self.train_steps)
            .with_value("epsilon", self.epsilon)
            .with_value("episodes", self.episodes);
        store.save_model(path, &blob, &metadata)?;
        tracing::info!(path = %path.display(), model_id = %metadata.model_id, "model saved");
        Ok(metadata)
    }

    /// Replace the model with one loaded from `store`. The current model is kept on any error.
    pub fn load_model<S: ModelStore + ?Sized>(
        &mut self,
        store: &S,
        path: &Path,
    ) -> Result<ModelMetadata, PersistenceError> {
        let (blob, metadata) = store.load_model(path)?;
        metadata.check_version()?;
        if metadata.kind != self.model.kind() {
            return Err(PersistenceError::Decode(format!(
                "model kind {} does not match {}",
                metadata.kind,
                self.model.kind()
            )));
        }
        let model = E::decode(&blob).map_err(|e| PersistenceError::Decode(e.to_string()))?;
        if model.input_len() != self.model.input_len() || model.actions() != self.model.actions() {
            return Err(PersistenceError::Decode(format!(
                "model shape {}x{} does not match {}x{}",
                model.input_len(),
                model.actions().len(),
                self.model.input_len(),
                self.model.actions().len()
            )));
        }
        self.model = model;
        self.fault_latched = false;
        if let Some(epsilon) = metadata.get("epsilon").and_then(|e| e.parse::<f32>().ok()) {
            self.epsilon = epsilon.clamp(self.config.epsilon_floor.clamp(0.0, 1.0), 1.0);
        }
        tracing::info!(path = %path.display(), model_id = %metadata.model_id, "model loaded");
        Ok(metadata)
    }
}

impl<E: Estimator + std::fmt::Debug> std::fmt::Debug for DecisionPolicy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionPolicy")
            .field("mode", &self.mode())
            .field("epsilon", &self.epsilon)
            .field("buffer", &self.buffer.len())
            .field("train_steps", &self.train_steps)
            .field("model", &self.model)
            .finish()
    }
}
