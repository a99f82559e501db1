use super::{Rule, RuleContext};
use crate::models::{AlertCategory, AlertDraft, AlertType, SensorStatus};

/// Raises an error for every sensor whose reading is beyond 80% / 120% of
/// its optimal bounds.
pub struct CriticalSensorRule;

impl Rule for CriticalSensorRule {
    fn id(&self) -> &'static str {
        "critical_sensor"
    }

    fn name(&self) -> &'static str {
        "Critical Sensor Level"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Vec<AlertDraft> {
        ctx.sensors
            .iter()
            .filter(|s| s.status == SensorStatus::Critical)
            .map(|s| {
                AlertDraft::new(
                    AlertType::Error,
                    AlertCategory::CriticalSensor,
                    s.id.clone(),
                    format!("{} is at critical level: {}{}", s.name, s.value, s.unit),
                )
            })
            .collect()
    }
}
