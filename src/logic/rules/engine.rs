use super::{
    critical_sensor::CriticalSensorRule, irrigation::IrrigationRule,
    predictive_trend::PredictiveTrendRule, Rule, RuleContext,
};
use crate::models::AlertDraft;

pub struct RulesEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RulesEngine {
    /// Rules run in this order, so their alerts are raised in this order.
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(PredictiveTrendRule),
            Box::new(CriticalSensorRule),
            Box::new(IrrigationRule),
        ];

        Self { rules }
    }

    pub fn evaluate(&self, ctx: &RuleContext) -> Vec<AlertDraft> {
        self.rules
            .iter()
            .flat_map(|rule| rule.evaluate(ctx))
            .collect()
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertCategory, Sensor, SensorConfig, Trend};
    use chrono::Utc;
    use std::collections::HashMap;

    #[test]
    fn lists_rules_in_order() {
        let ids: Vec<_> = RulesEngine::new()
            .list_rules()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["predictive_trend", "critical_sensor", "irrigation"]);
    }

    #[test]
    fn evaluates_all_rules_in_order() {
        let now = Utc::now();
        let sensors: Vec<Sensor> = SensorConfig::defaults()
            .iter()
            .map(|c| {
                let mut s = Sensor::from_config(c);
                let value = match c.id.as_str() {
                    // 17% is a warning (80-90% of min), and below irrigation threshold
                    "soil_moisture" => 17.0,
                    "soil_ph" => 9.5,
                    _ => c.optimal_range.midpoint(),
                };
                s.record(value, now);
                s
            })
            .collect();
        let mut trends = HashMap::new();
        trends.insert("soil_moisture".to_string(), Trend::Decreasing);

        let ctx = RuleContext {
            field_id: "field-1",
            sensors: &sensors,
            trends: &trends,
            irrigation_threshold: 30.0,
        };
        let categories: Vec<_> = RulesEngine::new()
            .evaluate(&ctx)
            .into_iter()
            .map(|d| d.category)
            .collect();
        assert_eq!(
            categories,
            vec![
                AlertCategory::Predictive,
                AlertCategory::CriticalSensor,
                AlertCategory::Irrigation
            ]
        );
    }
}
