use chrono::Duration;

/// Tuning knobs for the commitment engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lookahead window for the urgency view.
    pub urgency_window: Duration,
    /// Remaining-capacity ceiling for the near-completion view.
    pub near_completion_threshold: u32,
    /// Radius for the proximity view in meters.
    pub proximity_radius_m: f64,
    /// Page size for the proximity view.
    pub proximity_page_size: u32,
    /// How many optimistic-concurrency retries a mutation gets before it
    /// is surfaced as a retryable failure.
    pub cas_retry_budget: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            urgency_window: Duration::hours(24),
            near_completion_threshold: 3,
            proximity_radius_m: 5_000.0,
            proximity_page_size: 3,
            cas_retry_budget: 5,
        }
    }
}
