use serde::{Deserialize, Serialize};
use skirmish_core::{ActionId, ActionSet, ModelError};
use skirmish_perception::PerceptionVector;

use crate::Experience;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    pub learning_rate: f32,
    /// Discount applied to the bootstrapped next-state value.
    pub discount: f32,
    /// TD errors are clipped to `[-gradient_clip, gradient_clip]` before the update.
    pub gradient_clip: f32,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            discount: 0.9,
            gradient_clip: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitReport {
    pub samples: usize,
    pub mean_abs_error: f32,
}

/// Scores `(state, action)` pairs. Implementations must be cheap to clone: training fits a copy
/// and the policy swaps it in only when the fit succeeds.
pub trait Estimator: Clone + Send + 'static {
    /// Stable identifier stored in model metadata.
    fn kind(&self) -> &'static str;

    fn input_len(&self) -> usize;

    fn actions(&self) -> &ActionSet;

    /// `true` once at least one fit has completed.
    fn is_trained(&self) -> bool;

    fn score(&self, state: &PerceptionVector, action: ActionId) -> Result<f32, ModelError>;

    fn fit(&mut self, batch: &[Experience], params: &FitParams) -> Result<FitReport, ModelError>;

    fn encode(&self) -> Result<Vec<u8>, ModelError>;

    fn decode(bytes: &[u8]) -> Result<Self, ModelError>
    where
        Self: Sized;
}

/// Per-action linear Q-function: `Q(s, a) = w_a · s + b_a`, fitted by SGD on TD(0) targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearQModel {
    input_len: usize,
    actions: ActionSet,
    /// One row per action in `actions` order; the last column is the bias.
    weights: Vec<Vec<f32>>,
    updates: u64,
}

impl LinearQModel {
    pub const KIND: &'static str = "linear_q";

    pub fn new(input_len: usize, actions: ActionSet) -> Self {
        let weights = vec![vec![0.0; input_len + 1]; actions.len()];
        Self {
            input_len,
            actions,
            weights,
            updates: 0,
        }
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    fn row(&self, action: ActionId) -> Result<&[f32], ModelError> {
        let idx = self
            .actions
            .index_of(action)
            .ok_or(ModelError::UnknownAction(action))?;
        self.weights
            .get(idx)
            .map(Vec::as_slice)
            .ok_or_else(|| ModelError::Corrupt(format!("missing weights for {action}")))
    }

    fn check_shape(&self, state: &PerceptionVector) -> Result<(), ModelError> {
        if state.len() != self.input_len {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_len,
                actual: state.len(),
            });
        }
        Ok(())
    }

    fn dot(row: &[f32], state: &[f32]) -> f32 {
        let bias = row.last().copied().unwrap_or(0.0);
        row.iter().zip(state).map(|(w, x)| w * x).sum::<f32>() + bias
    }

    fn best_value(&self, state: &PerceptionVector) -> Result<f32, ModelError> {
        self.check_shape(state)?;
        let best = self
            .weights
            .iter()
            .map(|row| Self::dot(row, state.as_slice()))
            .fold(f32::NEG_INFINITY, f32::max);
        if best.is_finite() {
            Ok(best)
        } else {
            Err(ModelError::NonFinite)
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.weights.len() != self.actions.len() {
            return Err(ModelError::Corrupt(format!(
                "{} weight rows for {} actions",
                self.weights.len(),
                self.actions.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|r| r.len() != self.input_len + 1) {
            return Err(ModelError::Corrupt(format!(
                "weight row of length {} (expected {})",
                row.len(),
                self.input_len + 1
            )));
        }
        if self.weights.iter().flatten().any(|w| !w.is_finite()) {
            return Err(ModelError::NonFinite);
        }
        Ok(())
    }
}

impl Estimator for LinearQModel {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn actions(&self) -> &ActionSet {
        &self.actions
    }

    fn is_trained(&self) -> bool {
        self.updates > 0
    }

    fn score(&self, state: &PerceptionVector, action: ActionId) -> Result<f32, ModelError> {
        self.check_shape(state)?;
        let q = Self::dot(self.row(action)?, state.as_slice());
        if q.is_finite() {
            Ok(q)
        } else {
            Err(ModelError::NonFinite)
        }
    }

    fn fit(&mut self, batch: &[Experience], params: &FitParams) -> Result<FitReport, ModelError> {
        let clip = params.gradient_clip.abs();
        let mut abs_error = 0.0f32;
        for exp in batch {
            self.check_shape(&exp.state)?;
            let target = if exp.terminal {
                exp.reward
            } else {
                exp.reward + params.discount * self.best_value(&exp.next_state)?
            };
            let idx = self
                .actions
                .index_of(exp.action)
                .ok_or(ModelError::UnknownAction(exp.action))?;
            let q = Self::dot(&self.weights[idx], exp.state.as_slice());
            let error = (target - q).clamp(-clip, clip);
            if !error.is_finite() {
                return Err(ModelError::NonFinite);
            }
            abs_error += error.abs();

            let step = params.learning_rate * error;
            let row = &mut self.weights[idx];
            for (w, x) in row.iter_mut().zip(exp.state.as_slice()) {
                *w += step * x;
            }
            if let Some(bias) = row.last_mut() {
                *bias += step;
            }
        }
        self.validate()?;
        if !batch.is_empty() {
            self.updates += 1;
        }
        Ok(FitReport {
            samples: batch.len(),
            mean_abs_error: if batch.is_empty() {
                0.0
            } else {
                abs_error / batch.len() as f32
            },
        })
    }

    fn encode(&self) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec(self).map_err(|e| ModelError::Corrupt(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: LinearQModel =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Corrupt(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions() -> ActionSet {
        ActionSet::new([ActionId::Attack, ActionId::Retreat]).unwrap()
    }

    fn state(v: f32) -> PerceptionVector {
        PerceptionVector::from_values(vec![v, 1.0 - v])
    }

    #[test]
    fn rejects_wrong_input_length() {
        let model = LinearQModel::new(2, actions());
        let err = model
            .score(&PerceptionVector::from_values(vec![0.0; 3]), ActionId::Attack)
            .unwrap_err();
        assert_eq!(err, ModelError::ShapeMismatch { expected: 2, actual: 3 });
    }

    #[test]
    fn unknown_actions_are_errors() {
        let model = LinearQModel::new(2, actions());
        assert_eq!(
            model.score(&state(0.5), ActionId::Collect),
            Err(ModelError::UnknownAction(ActionId::Collect))
        );
    }

    #[test]
    fn fitting_moves_q_toward_reward() {
        let mut model = LinearQModel::new(2, actions());
        let batch: Vec<Experience> = (0..50)
            .map(|_| Experience {
                state: state(1.0),
                action: ActionId::Attack,
                reward: 1.0,
                next_state: state(1.0),
                terminal: true,
            })
            .collect();
        let params = FitParams {
            learning_rate: 0.1,
            ..FitParams::default()
        };
        model.fit(&batch, &params).unwrap();
        let attack = model.score(&state(1.0), ActionId::Attack).unwrap();
        let retreat = model.score(&state(1.0), ActionId::Retreat).unwrap();
        assert!(attack > 0.8 && attack <= 1.0 + 1e-4, "attack q {attack}");
        assert_eq!(retreat, 0.0);
        assert!(model.is_trained());
    }

    #[test]
    fn decode_rejects_mismatched_rows() {
        let mut model = LinearQModel::new(2, actions());
        model.weights.pop();
        let bytes = serde_json::to_vec(&model).unwrap();
        assert!(matches!(
            LinearQModel::decode(&bytes),
            Err(ModelError::Corrupt(_))
        ));
    }
}
