use super::{Rule, RuleContext};
use crate::models::{AlertCategory, AlertDraft, AlertType, SensorStatus, Trend};

/// Warns early when a sensor already in the warning band keeps moving.
pub struct PredictiveTrendRule;

impl Rule for PredictiveTrendRule {
    fn id(&self) -> &'static str {
        "predictive_trend"
    }

    fn name(&self) -> &'static str {
        "Predictive Trend"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Vec<AlertDraft> {
        ctx.sensors
            .iter()
            .filter(|s| s.status == SensorStatus::Warning)
            .filter_map(|s| {
                let trend = *ctx.trends.get(&s.id)?;
                if trend == Trend::Stable {
                    return None;
                }
                Some(AlertDraft::new(
                    AlertType::Warning,
                    AlertCategory::Predictive,
                    s.id.clone(),
                    format!(
                        "Predictive: {} showing {} trend - may need attention soon",
                        s.name, trend
                    ),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sensor, SensorConfig};
    use chrono::Utc;
    use std::collections::HashMap;

    fn humidity_at(value: f64) -> Vec<Sensor> {
        let config = &SensorConfig::defaults()[4];
        let mut sensor = Sensor::from_config(config);
        sensor.record(value, Utc::now());
        vec![sensor]
    }

    fn evaluate(sensors: &[Sensor], trend: Option<Trend>) -> Vec<AlertDraft> {
        let mut trends = HashMap::new();
        if let Some(t) = trend {
            trends.insert("humidity".to_string(), t);
        }
        let ctx = RuleContext {
            field_id: "f",
            sensors,
            trends: &trends,
            irrigation_threshold: 30.0,
        };
        PredictiveTrendRule.evaluate(&ctx)
    }

    #[test]
    fn warns_on_moving_warning_sensor() {
        // 92 is 115% of the 80% maximum: warning band
        let drafts = evaluate(&humidity_at(92.0), Some(Trend::Increasing));
        assert_eq!(drafts.len(), 1);
        assert_eq!(
            drafts[0].message,
            "Predictive: Humidity showing increasing trend - may need attention soon"
        );
        assert_eq!(drafts[0].alert_type, AlertType::Warning);
    }

    #[test]
    fn stays_quiet_when_stable_optimal_or_unknown() {
        assert!(evaluate(&humidity_at(92.0), Some(Trend::Stable)).is_empty());
        assert!(evaluate(&humidity_at(65.0), Some(Trend::Increasing)).is_empty());
        assert!(evaluate(&humidity_at(92.0), None).is_empty());
    }
}
