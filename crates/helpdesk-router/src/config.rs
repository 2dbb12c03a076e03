use std::time::Duration;

/// Tunables for the routing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum classifier confidence before an automated answer is attempted.
    pub confidence_threshold: f64,
    /// Upper bound on any single classification or generation call.
    pub call_timeout: Duration,
    /// Default inactivity window for [`close_idle_tickets`](crate::RoutingEngine::close_idle_tickets).
    pub idle_after: Duration,
    /// Reply suggestions requested per call.
    pub max_suggestions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            call_timeout: Duration::from_secs(15),
            idle_after: Duration::from_secs(60 * 60),
            max_suggestions: 3,
        }
    }
}
