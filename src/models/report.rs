use super::{Crop, Sensor, SensorStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse farm status: the worst sensor status wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemStatus {
    #[default]
    Optimal,
    Warning,
    Critical,
}

impl SystemStatus {
    pub fn from_sensors(sensors: &[Sensor]) -> Self {
        if sensors.iter().any(|s| s.status == SensorStatus::Critical) {
            SystemStatus::Critical
        } else if sensors.iter().any(|s| s.status == SensorStatus::Warning) {
            SystemStatus::Warning
        } else {
            SystemStatus::Optimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Optimal => "Optimal",
            SystemStatus::Warning => "Warning",
            SystemStatus::Critical => "Critical",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            SystemStatus::Optimal => Color::Green,
            SystemStatus::Warning => Color::Yellow,
            SystemStatus::Critical => Color::Red,
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a sensor over the trend window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Increasing => "↑",
            Trend::Decreasing => "↓",
            Trend::Stable => "→",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: SensorStatus,
}

impl From<&Sensor> for SensorSnapshot {
    fn from(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id.clone(),
            name: sensor.name.clone(),
            value: sensor.value,
            unit: sensor.unit.clone(),
            status: sensor.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropProjection {
    pub crop_type: String,
    pub predicted_yield: f64,
    pub health_score: f64,
    pub growth_stage: String,
    pub disease_status: String,
    pub days_to_harvest: i64,
}

impl CropProjection {
    pub fn from_crop(crop: &Crop, now: DateTime<Utc>) -> Self {
        Self {
            crop_type: crop.crop_type.to_string(),
            predicted_yield: crop.predicted_yield,
            health_score: crop.health_score,
            growth_stage: crop.growth_stage.to_string(),
            disease_status: crop.disease_status.to_string(),
            days_to_harvest: crop.days_to_harvest(now),
        }
    }
}

/// Structured summary handed to the presentation layer and `report` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemReport {
    pub timestamp: DateTime<Utc>,
    pub farm: String,
    pub system_status: SystemStatus,
    pub cycles: u64,
    pub sensors: usize,
    pub crops: usize,
    pub active_alerts: usize,
    pub irrigation_active: bool,
    pub model_trained: bool,
    pub sensor_data: Vec<SensorSnapshot>,
    pub crop_predictions: Vec<CropProjection>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorConfig;

    fn sensors_with(statuses: &[SensorStatus]) -> Vec<Sensor> {
        SensorConfig::defaults()
            .iter()
            .zip(statuses)
            .map(|(config, status)| {
                let mut sensor = Sensor::from_config(config);
                sensor.status = *status;
                sensor
            })
            .collect()
    }

    #[test]
    fn worst_sensor_status_wins() {
        use SensorStatus::*;

        let all_optimal = sensors_with(&[Optimal, Optimal, Optimal]);
        assert_eq!(SystemStatus::from_sensors(&all_optimal), SystemStatus::Optimal);

        let one_warning = sensors_with(&[Optimal, Warning, Optimal]);
        assert_eq!(SystemStatus::from_sensors(&one_warning), SystemStatus::Warning);

        let mixed = sensors_with(&[Warning, Critical, Optimal]);
        assert_eq!(SystemStatus::from_sensors(&mixed), SystemStatus::Critical);
    }

    #[test]
    fn empty_sensor_list_is_optimal() {
        assert_eq!(SystemStatus::from_sensors(&[]), SystemStatus::Optimal);
    }

    #[test]
    fn trend_labels() {
        assert_eq!(Trend::Increasing.to_string(), "increasing");
        assert_eq!(Trend::Decreasing.to_string(), "decreasing");
        assert_eq!(Trend::Stable.to_string(), "stable");
    }
}
