use skirmish_core::Vec2;

use crate::StuckConfig;

/// Rolling-window displacement tracker.
///
/// Windows only accumulate while the unit is commanded to move. A run of
/// `windows_required` consecutive short-displacement windows fires once; the detector then stays
/// latched until a window with normal displacement clears the counter.
#[derive(Debug, Clone, Default)]
pub struct StuckDetector {
    anchor: Option<Vec2>,
    elapsed: f32,
    consecutive: u32,
    latched: bool,
    triggers: u64,
}

impl StuckDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one tick. Returns `true` on the tick recovery should start.
    pub fn observe(&mut self, config: &StuckConfig, position: Vec2, moving: bool, dt: f32) -> bool {
        if !moving {
            self.anchor = Some(position);
            self.elapsed = 0.0;
            return false;
        }

        let anchor = *self.anchor.get_or_insert(position);
        self.elapsed += dt.max(0.0);
        if self.elapsed < config.window_seconds {
            return false;
        }

        let displacement = position.distance(anchor);
        self.anchor = Some(position);
        self.elapsed = 0.0;

        if displacement >= config.min_displacement {
            self.consecutive = 0;
            self.latched = false;
            return false;
        }

        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive >= config.windows_required.max(1) && !self.latched {
            self.latched = true;
            self.triggers += 1;
            tracing::debug!(windows = self.consecutive, "stuck detected");
            return true;
        }
        false
    }

    /// Consecutive short-displacement windows seen so far.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Total number of recoveries fired.
    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
