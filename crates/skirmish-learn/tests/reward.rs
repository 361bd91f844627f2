use proptest::prelude::*;
use skirmish_core::Vec2;
use skirmish_learn::{RewardEvents, RewardShaper, RewardSnapshot, RewardWeights};

fn arb_snapshot() -> impl Strategy<Value = RewardSnapshot> {
    (
        (-50.0f32..50.0, -50.0f32..50.0),
        0.0f32..=1.0,
        any::<bool>(),
        0usize..6,
        prop::option::of(0.0f32..10.0),
        0.0f32..20.0,
        prop::option::of(0.0f32..100.0),
    )
        .prop_map(
            |((x, y), health_ratio, alive, enemies_nearby, hazard_distance, edge, objective)| {
                RewardSnapshot {
                    position: Vec2::new(x, y),
                    health_ratio,
                    alive,
                    enemies_nearby,
                    hazard_distance,
                    edge_distance: edge,
                    objective_distance: objective,
                }
            },
        )
}

fn arb_events() -> impl Strategy<Value = RewardEvents> {
    (0u32..5, any::<bool>(), 0u32..5, any::<bool>()).prop_map(
        |(kills, ability_used, resources_collected, died)| RewardEvents {
            kills,
            ability_used,
            resources_collected,
            died,
        },
    )
}

proptest! {
    #[test]
    fn reward_is_always_within_bounds(
        steps in prop::collection::vec((arb_snapshot(), arb_snapshot(), arb_events()), 1..30),
        min_reward in -20.0f32..0.0,
        span in 0.0f32..20.0,
        kill in 0.0f32..100.0,
        death in 0.0f32..100.0,
    ) {
        let weights = RewardWeights {
            min_reward,
            max_reward: min_reward + span,
            kill,
            death,
            ..RewardWeights::default()
        };
        let mut shaper = RewardShaper::new(weights);
        for (prev, current, events) in &steps {
            let r = shaper.compute(prev, current, events).total;
            prop_assert!(r >= weights.min_reward && r <= weights.max_reward, "reward {}", r);
        }
    }
}
