/// Timing of a staggered per-item sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaggerPlan {
    /// Delay added per item index.
    pub step_ms: f64,
    /// Delay before the first item is touched.
    pub kickoff_ms: f64,
    /// Time the slowest item needs to finish, on top of the stagger.
    pub settle_ms: f64,
}

impl StaggerPlan {
    /// Cascading reveal.
    pub const OPENING: StaggerPlan = StaggerPlan {
        step_ms: 70.0,
        kickoff_ms: 10.0,
        settle_ms: 700.0,
    };

    /// Snappier dismissal.
    pub const CLOSING: StaggerPlan = StaggerPlan {
        step_ms: 40.0,
        kickoff_ms: 0.0,
        settle_ms: 700.0,
    };

    /// Stagger contributed by the item at `index`.
    pub fn step_delay(&self, index: usize) -> f64 {
        index as f64 * self.step_ms
    }

    /// Kick-off plus stagger for the item at `index`.
    pub fn delay(&self, index: usize) -> f64 {
        self.kickoff_ms + self.step_delay(index)
    }

    /// Time after which the whole sequence counts as finished.
    pub fn sequence_duration(&self, item_count: usize) -> f64 {
        self.settle_ms + item_count as f64 * self.step_ms
    }
}
