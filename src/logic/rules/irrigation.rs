use super::{Rule, RuleContext};
use crate::models::{AlertCategory, AlertDraft, AlertType};

/// Sensor whose reading drives irrigation.
pub const MOISTURE_SENSOR_ID: &str = "soil_moisture";

/// Requests irrigation when soil moisture drops below the threshold. The
/// draft is the trigger; the system turns irrigation on whenever one is
/// produced, even if the alert itself is deduplicated.
pub struct IrrigationRule;

impl Rule for IrrigationRule {
    fn id(&self) -> &'static str {
        "irrigation"
    }

    fn name(&self) -> &'static str {
        "Automatic Irrigation"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Vec<AlertDraft> {
        ctx.sensors
            .iter()
            .find(|s| s.id == MOISTURE_SENSOR_ID)
            .filter(|s| s.value < ctx.irrigation_threshold)
            .map(|s| {
                AlertDraft::new(
                    AlertType::Info,
                    AlertCategory::Irrigation,
                    ctx.field_id,
                    format!(
                        "Automatic irrigation activated - Soil moisture: {}%",
                        s.value
                    ),
                )
            })
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sensor, SensorConfig};
    use chrono::Utc;
    use std::collections::HashMap;

    fn evaluate(moisture: f64) -> Vec<AlertDraft> {
        let config = &SensorConfig::defaults()[0];
        let mut sensor = Sensor::from_config(config);
        sensor.record(moisture, Utc::now());
        let sensors = vec![sensor];
        let trends = HashMap::new();
        let ctx = RuleContext {
            field_id: "field-1",
            sensors: &sensors,
            trends: &trends,
            irrigation_threshold: 30.0,
        };
        IrrigationRule.evaluate(&ctx)
    }

    #[test]
    fn triggers_below_threshold() {
        let drafts = evaluate(25.0);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].subject, "field-1");
        assert!(drafts[0].message.contains("25"));
    }

    #[test]
    fn threshold_itself_does_not_trigger() {
        assert!(evaluate(30.0).is_empty());
        assert!(evaluate(35.5).is_empty());
    }
}
