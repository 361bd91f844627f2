use std::path::Path;
use std::time::Duration;

use proptest::prelude::*;
use skirmish_core::{ActionId, ActionSet, PersistenceError, SplitMix64};
use skirmish_learn::{
    DecisionPolicy, DecisionSource, Estimator, Experience, ExperienceBuffer, MemoryModelStore,
    PolicyConfig, PolicyMode, TrainingMode,
};
use skirmish_perception::{features, PerceptionLayout, PerceptionVector};

const LAYOUT: PerceptionLayout = PerceptionLayout::new(2);

fn state(health: f32, enemy_distance: Option<f32>) -> PerceptionVector {
    let mut v = LAYOUT.neutral().as_slice().to_vec();
    v[features::HEALTH] = health;
    if let Some(d) = enemy_distance {
        v[features::ENEMY_COUNT] = 0.2;
        v[features::ENEMY_DISTANCE] = d;
    }
    PerceptionVector::from_values(v)
}

fn greedy_config() -> PolicyConfig {
    PolicyConfig {
        epsilon: 0.0,
        epsilon_floor: 0.0,
        min_buffer: 4,
        batch_size: 8,
        train_every: 1,
        ..PolicyConfig::default()
    }
}

fn attack_experience() -> Experience {
    let s = state(0.9, Some(0.1));
    Experience {
        state: s.clone(),
        action: ActionId::Attack,
        reward: 1.0,
        next_state: s,
        terminal: true,
    }
}

#[test]
fn low_health_with_enemy_in_near_range_retreats() {
    let mut policy = DecisionPolicy::linear(greedy_config(), LAYOUT.len());
    let mut rng = SplitMix64::new(1);
    assert_eq!(policy.mode(), PolicyMode::RuleFallback);

    let decision = policy.select_action(&state(0.2, Some(0.1)), &mut rng);
    assert_eq!(decision.action, ActionId::Retreat);
    assert_eq!(decision.source, DecisionSource::Rules);
}

#[test]
fn retreat_falls_back_to_flee_when_not_declared() {
    let config = PolicyConfig {
        actions: ActionSet::new([ActionId::Approach, ActionId::Attack, ActionId::Flee]).unwrap(),
        ..greedy_config()
    };
    let mut policy = DecisionPolicy::linear(config, LAYOUT.len());
    let mut rng = SplitMix64::new(1);
    let decision = policy.select_action(&state(0.2, Some(0.1)), &mut rng);
    assert_eq!(decision.action, ActionId::Flee);
}

#[test]
fn rule_table_orders_attack_approach_patrol() {
    let policy = DecisionPolicy::linear(greedy_config(), LAYOUT.len());
    let mut near = state(0.9, Some(0.1)).as_slice().to_vec();
    // Slot 0 on cooldown so the attack rule does not prefer the ability.
    near[features::BASE_LEN] = 0.5;
    let near = PerceptionVector::from_values(near);
    assert_eq!(policy.rule_action(&near), ActionId::Attack);
    assert_eq!(policy.rule_action(&state(0.9, Some(0.8))), ActionId::Approach);
    assert_eq!(policy.rule_action(&state(0.9, None)), ActionId::Patrol);
}

#[test]
fn learned_mode_follows_the_fitted_model() {
    let mut policy = DecisionPolicy::linear(greedy_config(), LAYOUT.len());
    let mut rng = SplitMix64::new(9);
    for _ in 0..10 {
        policy.record_experience(attack_experience());
    }
    assert!(policy.after_decision(), "cadence of one decision");
    assert_eq!(policy.train_steps(), 1);
    assert_eq!(policy.mode(), PolicyMode::Learned);

    let decision = policy.select_action(&state(0.9, Some(0.1)), &mut rng);
    assert_eq!(decision.source, DecisionSource::Learned);
    assert_eq!(decision.action, ActionId::Attack);
}

#[test]
fn model_faults_fall_back_to_rules_and_latch() {
    let mut policy = DecisionPolicy::linear(greedy_config(), LAYOUT.len());
    let mut rng = SplitMix64::new(2);
    for _ in 0..10 {
        policy.record_experience(attack_experience());
    }
    policy.train_step();
    assert_eq!(policy.mode(), PolicyMode::Learned);

    let wrong_shape = PerceptionVector::from_values(vec![0.5; 4]);
    for _ in 0..3 {
        let decision = policy.select_action(&wrong_shape, &mut rng);
        assert_eq!(decision.source, DecisionSource::Rules);
        assert!(policy.actions().contains(decision.action));
    }
    assert!(policy.fault_latched());

    policy.train_step();
    assert!(!policy.fault_latched(), "a successful fit clears the latch");
}

#[test]
fn training_waits_for_cadence_and_minimum_buffer() {
    let config = PolicyConfig {
        train_every: 3,
        ..greedy_config()
    };
    let mut policy = DecisionPolicy::linear(config, LAYOUT.len());
    for _ in 0..2 {
        policy.record_experience(attack_experience());
    }
    for _ in 0..6 {
        assert!(!policy.after_decision(), "buffer below minimum");
    }
    for _ in 0..4 {
        policy.record_experience(attack_experience());
    }
    // The cadence elapsed long ago; the first decision with a full buffer trains.
    assert!(policy.after_decision());
    assert!(!policy.after_decision());
    assert!(!policy.after_decision());
    assert!(policy.after_decision());
    assert_eq!(policy.train_steps(), 2);
}

#[test]
fn epsilon_decays_per_episode_to_floor() {
    let config = PolicyConfig {
        epsilon: 0.5,
        epsilon_decay: 0.5,
        epsilon_floor: 0.1,
        ..PolicyConfig::default()
    };
    let mut policy = DecisionPolicy::linear(config, LAYOUT.len());
    policy.end_episode();
    assert!((policy.epsilon() - 0.25).abs() < 1e-6);
    for _ in 0..10 {
        policy.end_episode();
    }
    assert!((policy.epsilon() - 0.1).abs() < 1e-6);
    assert_eq!(policy.episodes(), 11);
}

#[test]
fn exploration_draws_from_the_action_set() {
    let config = PolicyConfig {
        epsilon: 1.0,
        ..PolicyConfig::default()
    };
    let mut policy = DecisionPolicy::linear(config, LAYOUT.len());
    let mut rng = SplitMix64::new(4);
    let mut seen = std::collections::BTreeSet::new();
    for _ in 0..200 {
        let d = policy.select_action(&state(1.0, None), &mut rng);
        assert_eq!(d.source, DecisionSource::Explore);
        seen.insert(d.action);
    }
    assert_eq!(seen.len(), policy.actions().len());
}

#[test]
fn background_training_swaps_the_model_in() {
    let config = PolicyConfig {
        training: TrainingMode::Background,
        ..greedy_config()
    };
    let mut policy = DecisionPolicy::linear(config, LAYOUT.len());
    for _ in 0..10 {
        policy.record_experience(attack_experience());
    }
    assert!(policy.train_step());
    assert!(!policy.model().is_trained(), "inference model untouched until collected");
    assert!(policy.wait_for_training(Duration::from_secs(10)));
    assert!(policy.model().is_trained());
    assert_eq!(policy.train_steps(), 1);
}

#[test]
fn saved_models_load_into_a_fresh_policy() {
    let mut store = MemoryModelStore::new();
    let path = Path::new("models/unit.json");

    let mut trained = DecisionPolicy::linear(greedy_config(), LAYOUT.len());
    for _ in 0..10 {
        trained.record_experience(attack_experience());
    }
    trained.train_step();
    let saved = trained.save_model(&mut store, path).unwrap();
    assert_eq!(saved.kind, "linear_q");

    let mut fresh = DecisionPolicy::linear(greedy_config(), LAYOUT.len());
    let loaded = fresh.load_model(&store, path).unwrap();
    assert_eq!(loaded.model_id, saved.model_id);
    assert_eq!(fresh.model(), trained.model());
}

#[test]
fn corrupt_or_missing_models_leave_the_policy_untouched() {
    let mut store = MemoryModelStore::new();
    let path = Path::new("models/unit.json");
    let mut policy = DecisionPolicy::linear(greedy_config(), LAYOUT.len());

    assert!(matches!(
        policy.load_model(&store, path),
        Err(PersistenceError::Io(_))
    ));

    policy.save_model(&mut store, path).unwrap();
    store.corrupt(path, b"not a model".to_vec());
    let before = policy.model().clone();
    assert!(matches!(
        policy.load_model(&store, path),
        Err(PersistenceError::Decode(_))
    ));
    assert_eq!(policy.model(), &before);

    let other_shape = DecisionPolicy::linear(greedy_config(), LAYOUT.len() + 1);
    other_shape.save_model(&mut store, path).unwrap();
    assert!(policy.load_model(&store, path).is_err());
}

fn arb_state() -> impl Strategy<Value = PerceptionVector> {
    prop_oneof![
        prop::collection::vec(-1.0f32..2.0, LAYOUT.len()),
        prop::collection::vec(-1.0f32..2.0, 0..24),
    ]
    .prop_map(PerceptionVector::from_values)
}

fn arb_actions() -> impl Strategy<Value = ActionSet> {
    prop::collection::vec(prop::sample::select(ActionId::ALL.to_vec()), 1..6)
        .prop_map(|a| ActionSet::new(a).unwrap())
}

proptest! {
    #[test]
    fn selected_action_is_always_declared(
        actions in arb_actions(),
        states in prop::collection::vec(arb_state(), 1..20),
        epsilon in 0.0f32..1.0,
        train in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let config = PolicyConfig {
            actions: actions.clone(),
            epsilon,
            min_buffer: 1,
            train_every: 1,
            ..PolicyConfig::default()
        };
        let mut policy = DecisionPolicy::linear(config, LAYOUT.len());
        let mut rng = SplitMix64::new(seed);
        let mut prev: Option<(PerceptionVector, ActionId)> = None;
        for s in &states {
            let d = policy.select_action(s, &mut rng);
            prop_assert!(actions.contains(d.action));
            if train {
                if let Some((ps, pa)) = prev.take() {
                    policy.record_experience(Experience {
                        state: ps,
                        action: pa,
                        reward: 0.5,
                        next_state: s.clone(),
                        terminal: false,
                    });
                }
                policy.after_decision();
            }
            prev = Some((s.clone(), d.action));
        }
    }

    #[test]
    fn buffer_never_exceeds_capacity(capacity in 1usize..64, inserts in 0usize..200) {
        let mut buf = ExperienceBuffer::new(capacity);
        for i in 0..inserts {
            let s = PerceptionVector::from_values(vec![0.0; 2]);
            buf.push(Experience {
                state: s.clone(),
                action: ActionId::Idle,
                reward: i as f32,
                next_state: s,
                terminal: false,
            });
            prop_assert!(buf.len() <= capacity);
        }
        if inserts > capacity {
            let oldest_kept = (inserts - capacity) as f32;
            prop_assert!(buf.iter().all(|e| e.reward >= oldest_kept));
            prop_assert!(!buf.iter().any(|e| e.reward == 0.0));
        }
    }
}
