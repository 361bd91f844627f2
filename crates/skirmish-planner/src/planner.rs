use skirmish_core::{ActionId, AgentHandle, SearchBound, Unavailable, WorldQuery};

use crate::{search, PlanAction, PlannerConfig, PlannerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerDecision {
    pub action: PlanAction,
    pub action_id: ActionId,
    pub score: f32,
    pub nodes: usize,
    /// Set when the node budget cut the search short.
    pub bound: Option<SearchBound>,
}

#[derive(Debug, Clone, Default)]
pub struct LookaheadPlanner {
    config: PlannerConfig,
}

impl LookaheadPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn decide(&self, snapshot: &PlannerSnapshot) -> PlannerDecision {
        let result = search(
            snapshot,
            self.config.depth,
            f32::NEG_INFINITY,
            f32::INFINITY,
            true,
            &self.config,
        );
        let decision = PlannerDecision {
            action: result.best,
            action_id: result.best.id(),
            score: result.score,
            nodes: result.nodes,
            bound: result.bound(self.config.node_budget),
        };
        tracing::trace!(
            agent = %snapshot.me.handle,
            action = %decision.action,
            score = decision.score,
            nodes = decision.nodes,
            "planner decided"
        );
        decision
    }

    /// Capture `agent`'s surroundings from `world` and plan over them.
    pub fn plan<W: WorldQuery + ?Sized>(
        &self,
        agent: AgentHandle,
        world: &W,
    ) -> Result<PlannerDecision, Unavailable> {
        let snapshot = PlannerSnapshot::capture(agent, world, &self.config)?;
        Ok(self.decide(&snapshot))
    }
}
