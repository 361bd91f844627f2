use skirmish_core::SearchBound;

use crate::{generate_actions, simulate, PlanAction, PlannerConfig, PlannerSnapshot};

/// Weighted static score of a snapshot from the planner's point of view.
pub fn evaluate(snapshot: &PlannerSnapshot, config: &PlannerConfig) -> f32 {
    let w = &config.weights;
    let me = snapshot.me.position;
    let mut score = snapshot.me.health * w.self_health;

    for ally in &snapshot.allies {
        score += ally.health * w.ally_health;
        if ally.is_alive() && me.distance(ally.position) <= config.heal_range {
            score += w.ally_proximity;
        }
    }

    for enemy in &snapshot.enemies {
        score -= enemy.health * w.enemy_health;
        if !enemy.is_alive() {
            continue;
        }
        if enemy.is_debuffed() {
            score += w.debuff;
        }
        if me.distance(enemy.position) <= config.danger_range {
            score -= w.enemy_proximity;
        }
    }

    let fraction = |remaining: f32, full: f32| {
        if full > 0.0 {
            (remaining / full).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    score -= (fraction(snapshot.heal_cooldown, config.heal_cooldown)
        + fraction(snapshot.debuff_cooldown, config.debuff_cooldown))
        * w.cooldown;
    score
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub best: PlanAction,
    pub score: f32,
    /// Nodes visited, including leaves.
    pub nodes: usize,
    pub budget_exhausted: bool,
}

impl SearchResult {
    pub fn bound(&self, budget: usize) -> Option<SearchBound> {
        self.budget_exhausted.then_some(SearchBound {
            expanded: self.nodes,
            cap: budget,
        })
    }
}

struct AlphaBeta<'a> {
    config: &'a PlannerConfig,
    nodes: usize,
    exhausted: bool,
}

impl AlphaBeta<'_> {
    fn visit(
        &mut self,
        snapshot: &PlannerSnapshot,
        depth: u32,
        mut alpha: f32,
        mut beta: f32,
        maximizing: bool,
    ) -> (Option<PlanAction>, f32) {
        self.nodes += 1;
        if depth == 0 || snapshot.me.health <= 0.0 {
            return (None, evaluate(snapshot, self.config));
        }

        let mut best: Option<(PlanAction, f32)> = None;
        for action in generate_actions(snapshot, maximizing, self.config) {
            if self.nodes >= self.config.node_budget {
                self.exhausted = true;
                break;
            }
            let child = simulate(snapshot, action, self.config);
            let (_, score) = self.visit(&child, depth - 1, alpha, beta, !maximizing);

            // Strict comparison: on ties the earlier (higher priority) action stays.
            let improves = match best {
                None => true,
                Some((_, b)) if maximizing => score > b,
                Some((_, b)) => score < b,
            };
            if improves {
                best = Some((action, score));
            }

            if maximizing {
                alpha = alpha.max(score);
            } else {
                beta = beta.min(score);
            }
            if alpha >= beta {
                break;
            }
        }

        match best {
            Some((action, score)) => (Some(action), score),
            None => (None, evaluate(snapshot, self.config)),
        }
    }
}

/// Depth-bounded alpha-beta over `snapshot`.
///
/// Stops early once `config.node_budget` nodes have been visited and returns the best action
/// found so far. When not even one child could be searched the result is [`PlanAction::Wait`].
pub fn search(
    snapshot: &PlannerSnapshot,
    depth: u32,
    alpha: f32,
    beta: f32,
    maximizing: bool,
    config: &PlannerConfig,
) -> SearchResult {
    let mut state = AlphaBeta {
        config,
        nodes: 0,
        exhausted: false,
    };
    let (best, score) = state.visit(snapshot, depth, alpha, beta, maximizing);
    if state.exhausted {
        tracing::debug!(
            nodes = state.nodes,
            cap = config.node_budget,
            "planner search hit its node budget"
        );
    }
    SearchResult {
        best: best.unwrap_or(PlanAction::Wait),
        score,
        nodes: state.nodes,
        budget_exhausted: state.exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlannerUnit;
    use skirmish_core::{EntityHandle, Vec2};

    fn h(i: u32) -> EntityHandle {
        EntityHandle::new(i, 0)
    }

    #[test]
    fn healthier_allies_score_higher() {
        let config = PlannerConfig::default();
        let me = PlannerUnit::new(h(0), Vec2::ZERO, 1.0);
        let hurt = PlannerSnapshot::new(me).with_ally(PlannerUnit::new(h(1), Vec2::ZERO, 0.2));
        let fine = PlannerSnapshot::new(me).with_ally(PlannerUnit::new(h(1), Vec2::ZERO, 0.9));
        assert!(evaluate(&fine, &config) > evaluate(&hurt, &config));
    }

    #[test]
    fn debuffed_enemy_is_a_bonus() {
        let config = PlannerConfig::default();
        let me = PlannerUnit::new(h(0), Vec2::ZERO, 1.0);
        let mut enemy = PlannerUnit::new(h(1), Vec2::new(20.0, 0.0), 1.0);
        let plain = PlannerSnapshot::new(me).with_enemy(enemy);
        enemy.debuff_remaining = 2.0;
        let debuffed = PlannerSnapshot::new(me).with_enemy(enemy);
        assert!(evaluate(&debuffed, &config) > evaluate(&plain, &config));
    }

    #[test]
    fn depth_zero_scores_the_root() {
        let config = PlannerConfig::default();
        let snap = PlannerSnapshot::new(PlannerUnit::new(h(0), Vec2::ZERO, 0.5));
        let result = search(&snap, 0, f32::NEG_INFINITY, f32::INFINITY, true, &config);
        assert_eq!(result.best, PlanAction::Wait);
        assert_eq!(result.nodes, 1);
        assert_eq!(result.score, evaluate(&snap, &config));
    }

    #[test]
    fn dead_self_is_terminal() {
        let config = PlannerConfig::default();
        let snap = PlannerSnapshot::new(PlannerUnit::new(h(0), Vec2::ZERO, 0.0))
            .with_ally(PlannerUnit::new(h(1), Vec2::new(1.0, 0.0), 0.3));
        let result = search(&snap, 3, f32::NEG_INFINITY, f32::INFINITY, true, &config);
        assert_eq!(result.nodes, 1);
        assert_eq!(result.best, PlanAction::Wait);
    }
}
