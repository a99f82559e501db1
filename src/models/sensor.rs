use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]` used for both hard (physical) and optimal ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn contains_range(&self, other: &ValueRange) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl std::fmt::Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Which environmental modifiers the simulator applies to a sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Light,
    SoilMoisture,
    #[default]
    Generic,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "Temperature",
            SensorKind::Humidity => "Humidity",
            SensorKind::Light => "Light",
            SensorKind::SoilMoisture => "Soil Moisture",
            SensorKind::Generic => "Generic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "temperature" | "temp" => Some(SensorKind::Temperature),
            "humidity" => Some(SensorKind::Humidity),
            "light" => Some(SensorKind::Light),
            "soilmoisture" | "soil_moisture" | "soil moisture" | "moisture" => {
                Some(SensorKind::SoilMoisture)
            }
            "generic" => Some(SensorKind::Generic),
            _ => None,
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of a sensor channel. Drives both the simulator and the
/// status thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    pub name: String,
    pub unit: String,
    #[serde(default, deserialize_with = "deserialize_kind")]
    pub kind: SensorKind,
    pub hard_range: ValueRange,
    pub optimal_range: ValueRange,
    pub drift_rate: f64,
}

fn deserialize_kind<'de, D>(deserializer: D) -> std::result::Result<SensorKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = String::deserialize(deserializer)?;
    SensorKind::from_str(&value)
        .ok_or_else(|| D::Error::custom(format!("unknown sensor kind '{}'", value)))
}

impl SensorConfig {
    pub fn new(
        id: &str,
        name: &str,
        unit: &str,
        kind: SensorKind,
        hard_range: ValueRange,
        optimal_range: ValueRange,
        drift_rate: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            kind,
            hard_range,
            optimal_range,
            drift_rate,
        }
    }

    /// The seven agronomic channels monitored by default.
    pub fn defaults() -> Vec<SensorConfig> {
        vec![
            SensorConfig::new(
                "soil_moisture",
                "Soil Moisture",
                "%",
                SensorKind::SoilMoisture,
                ValueRange::new(0.0, 100.0),
                ValueRange::new(20.0, 40.0),
                0.1,
            ),
            SensorConfig::new(
                "soil_ph",
                "Soil pH",
                "pH",
                SensorKind::Generic,
                ValueRange::new(0.0, 14.0),
                ValueRange::new(5.5, 7.5),
                0.02,
            ),
            SensorConfig::new(
                "temperature",
                "Temperature",
                "°C",
                SensorKind::Temperature,
                ValueRange::new(-10.0, 50.0),
                ValueRange::new(15.0, 30.0),
                0.05,
            ),
            SensorConfig::new(
                "rainfall",
                "Rainfall",
                "mm",
                SensorKind::Generic,
                ValueRange::new(0.0, 500.0),
                ValueRange::new(100.0, 200.0),
                0.1,
            ),
            SensorConfig::new(
                "humidity",
                "Humidity",
                "%",
                SensorKind::Humidity,
                ValueRange::new(0.0, 100.0),
                ValueRange::new(50.0, 80.0),
                0.08,
            ),
            SensorConfig::new(
                "sunlight_hours",
                "Sunlight Hours",
                "hours",
                SensorKind::Generic,
                ValueRange::new(0.0, 16.0),
                ValueRange::new(5.0, 8.0),
                0.05,
            ),
            SensorConfig::new(
                "ndvi_index",
                "NDVI Index",
                "",
                SensorKind::Generic,
                ValueRange::new(0.0, 1.0),
                ValueRange::new(0.3, 0.8),
                0.01,
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    #[default]
    Optimal,
    Warning,
    Critical,
}

impl SensorStatus {
    /// Classify a value against an optimal range: beyond 80%/120% of the
    /// bounds is critical, beyond 90%/110% is a warning.
    pub fn classify(value: f64, optimal: &ValueRange) -> Self {
        if value < optimal.min * 0.8 || value > optimal.max * 1.2 {
            SensorStatus::Critical
        } else if value < optimal.min * 0.9 || value > optimal.max * 1.1 {
            SensorStatus::Warning
        } else {
            SensorStatus::Optimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Optimal => "optimal",
            SensorStatus::Warning => "warning",
            SensorStatus::Critical => "critical",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            SensorStatus::Optimal => Color::Green,
            SensorStatus::Warning => Color::Yellow,
            SensorStatus::Critical => Color::Red,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            SensorStatus::Optimal => "✓",
            SensorStatus::Warning => "⚠",
            SensorStatus::Critical => "!",
        }
    }
}

impl std::fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub kind: SensorKind,
    pub hard_range: ValueRange,
    pub optimal_range: ValueRange,
    pub last_updated: DateTime<Utc>,
    pub status: SensorStatus,
}

impl Sensor {
    pub fn from_config(config: &SensorConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            value: 0.0,
            unit: config.unit.clone(),
            kind: config.kind,
            hard_range: config.hard_range,
            optimal_range: config.optimal_range,
            last_updated: Utc::now(),
            status: SensorStatus::Optimal,
        }
    }

    /// Store a new reading and re-derive the status from it.
    pub fn record(&mut self, value: f64, at: DateTime<Utc>) {
        self.value = value;
        self.last_updated = at;
        self.refresh_status();
    }

    pub fn refresh_status(&mut self) {
        self.status = SensorStatus::classify(self.value, &self.optimal_range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_thresholds() {
        let range = ValueRange::new(20.0, 40.0);

        assert_eq!(SensorStatus::classify(30.0, &range), SensorStatus::Optimal);
        // 90%-110% band is still optimal
        assert_eq!(SensorStatus::classify(18.5, &range), SensorStatus::Optimal);
        assert_eq!(SensorStatus::classify(43.0, &range), SensorStatus::Optimal);
        // 80%-90% and 110%-120% are warnings
        assert_eq!(SensorStatus::classify(17.0, &range), SensorStatus::Warning);
        assert_eq!(SensorStatus::classify(46.0, &range), SensorStatus::Warning);
        // Beyond 80% / 120% is critical
        assert_eq!(SensorStatus::classify(15.0, &range), SensorStatus::Critical);
        assert_eq!(SensorStatus::classify(49.0, &range), SensorStatus::Critical);
    }

    #[test]
    fn thirty_percent_over_max_is_critical() {
        for config in SensorConfig::defaults() {
            let value = config.optimal_range.max * 1.3;
            assert_eq!(
                SensorStatus::classify(value, &config.optimal_range),
                SensorStatus::Critical,
                "{} should be critical at {}",
                config.id,
                value
            );
        }
    }

    #[test]
    fn default_optimal_ranges_fit_hard_ranges() {
        for config in SensorConfig::defaults() {
            assert!(
                config.hard_range.contains_range(&config.optimal_range),
                "{} optimal range escapes hard range",
                config.id
            );
        }
    }

    #[test]
    fn record_updates_status() {
        let config = &SensorConfig::defaults()[0];
        let mut sensor = Sensor::from_config(config);

        sensor.record(30.0, Utc::now());
        assert_eq!(sensor.status, SensorStatus::Optimal);

        sensor.record(5.0, Utc::now());
        assert_eq!(sensor.status, SensorStatus::Critical);
    }

    #[test]
    fn default_sensors_can_reach_critical_high() {
        for config in SensorConfig::defaults() {
            let ceiling = config.hard_range.max;
            assert_eq!(
                SensorStatus::classify(ceiling, &config.optimal_range),
                SensorStatus::Critical,
                "{} cannot read above 120% of its optimal max",
                config.id
            );
        }
    }

    #[test]
    fn sensor_kind_from_str() {
        assert_eq!(
            SensorKind::from_str("Temperature"),
            Some(SensorKind::Temperature)
        );
        assert_eq!(
            SensorKind::from_str("soil moisture"),
            Some(SensorKind::SoilMoisture)
        );
        assert_eq!(SensorKind::from_str("sonar"), None);
    }

    #[test]
    fn sensor_kind_labels_in_yaml() {
        let yaml = "id: t\nname: Air\nunit: C\nkind: Temp\nhard_range: { min: 0, max: 10 }\noptimal_range: { min: 1, max: 2 }\ndrift_rate: 0.1\n";
        let config: SensorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.kind, SensorKind::Temperature);

        let missing = yaml.replace("kind: Temp\n", "");
        let config: SensorConfig = serde_yaml::from_str(&missing).unwrap();
        assert_eq!(config.kind, SensorKind::Generic);

        assert!(serde_yaml::from_str::<SensorConfig>(&yaml.replace("Temp", "sonar")).is_err());
    }

    #[test]
    fn range_helpers() {
        let range = ValueRange::new(5.5, 7.5);
        assert!(range.contains(5.5));
        assert!(range.contains(7.5));
        assert!(!range.contains(7.6));
        assert!((range.midpoint() - 6.5).abs() < 1e-9);
        assert_eq!(range.clamp(10.0), 7.5);
        assert_eq!(range.clamp(1.0), 5.5);
    }
}
