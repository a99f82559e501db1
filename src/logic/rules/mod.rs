pub mod critical_sensor;
pub mod engine;
pub mod irrigation;
pub mod predictive_trend;

pub use engine::RulesEngine;

use crate::models::{AlertDraft, Sensor, Trend};
use std::collections::HashMap;

/// Everything a rule can look at after the sensors have been read.
pub struct RuleContext<'a> {
    pub field_id: &'a str,
    pub sensors: &'a [Sensor],
    /// Endpoint trend per sensor id. Empty until the learning buffer holds
    /// a full trend window.
    pub trends: &'a HashMap<String, Trend>,
    pub irrigation_threshold: f64,
}

/// Trait for alerting rules
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate the rule and return the alerts it wants raised
    fn evaluate(&self, ctx: &RuleContext) -> Vec<AlertDraft>;
}
