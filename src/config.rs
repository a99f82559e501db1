use crate::error::{FieldWatchError, Result};
use crate::models::{Crop, CropType, DiseaseStatus, GrowthStage, SensorConfig};
use crate::prediction::ForestParams;
use chrono::{DateTime, Utc};
use dialoguer::Input;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Longest configurable sensor fault (one week).
const MAX_FAULT_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Largest planting or harvest offset accepted for a crop (ten years).
const MAX_CROP_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub farm: FarmConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default = "SensorConfig::defaults")]
    pub sensors: Vec<SensorConfig>,
    #[serde(default = "CropConfig::defaults")]
    pub crops: Vec<CropConfig>,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub predictor: PredictorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FarmConfig {
    pub name: String,
    pub field_id: String,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            name: "Demo Farm".into(),
            field_id: "field-1".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed RNG seed for reproducible runs. Unseeded runs draw from entropy.
    pub seed: Option<u64>,
    pub cycle_interval_secs: u64,
    pub fault_duration_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            cycle_interval_secs: 5,
            fault_duration_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CropConfig {
    pub crop_type: String,
    pub days_since_planting: i64,
    pub days_to_harvest: i64,
    pub health_score: f64,
    #[serde(deserialize_with = "deserialize_growth_stage")]
    pub growth_stage: GrowthStage,
    #[serde(default, deserialize_with = "deserialize_disease_status")]
    pub disease_status: DiseaseStatus,
}

/// Stage labels are case-insensitive and accept "mature".
fn deserialize_growth_stage<'de, D>(deserializer: D) -> std::result::Result<GrowthStage, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = String::deserialize(deserializer)?;
    GrowthStage::from_str(&value)
        .ok_or_else(|| D::Error::custom(format!("unknown growth stage '{}'", value)))
}

/// Disease labels are case-insensitive; "healthy" and "" mean none.
fn deserialize_disease_status<'de, D>(deserializer: D) -> std::result::Result<DiseaseStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = String::deserialize(deserializer)?;
    DiseaseStatus::from_str(&value)
        .ok_or_else(|| D::Error::custom(format!("unknown disease status '{}'", value)))
}

impl CropConfig {
    pub fn defaults() -> Vec<CropConfig> {
        vec![
            CropConfig {
                crop_type: "Wheat".into(),
                days_since_planting: 30,
                days_to_harvest: 90,
                health_score: 85.0,
                growth_stage: GrowthStage::Flowering,
                disease_status: DiseaseStatus::None,
            },
            CropConfig {
                crop_type: "Soybean".into(),
                days_since_planting: 20,
                days_to_harvest: 25,
                health_score: 92.0,
                growth_stage: GrowthStage::Maturation,
                disease_status: DiseaseStatus::Mild,
            },
            CropConfig {
                crop_type: "Maize".into(),
                days_since_planting: 45,
                days_to_harvest: 60,
                health_score: 78.0,
                growth_stage: GrowthStage::Vegetative,
                disease_status: DiseaseStatus::Moderate,
            },
        ]
    }

    pub fn to_crop(&self, now: DateTime<Utc>) -> Result<Crop> {
        let crop_type = CropType::from_str(&self.crop_type)
            .ok_or_else(|| FieldWatchError::Config("crop_type must not be empty".into()))?;
        let crop = Crop::planted_days_ago(
            crop_type,
            now,
            self.days_since_planting,
            self.days_to_harvest,
            self.health_score,
            self.growth_stage,
        )
        .ok_or_else(|| {
            FieldWatchError::Config(format!(
                "crop '{}': planting or harvest date is out of range",
                self.crop_type
            ))
        })?;
        Ok(crop.with_disease_status(self.disease_status))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Soil moisture (%) below which irrigation switches on.
    pub irrigation_threshold: f64,
    pub learning_buffer_capacity: usize,
    pub trend_window: usize,
    /// Relative endpoint change that counts as a trend.
    pub trend_change_ratio: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            irrigation_threshold: 30.0,
            learning_buffer_capacity: 100,
            trend_window: 10,
            trend_change_ratio: 0.10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PredictorConfig {
    #[serde(default, flatten)]
    pub forest: ForestParams,
    /// Dataset to train on at startup and on demand.
    #[serde(default)]
    pub dataset: Option<PathBuf>,
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(FieldWatchError::Config(format!(
                "Config file not found at {:?}. Run `fieldwatch init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| FieldWatchError::Config(format!("Failed to read config: {}", e)))?;

        let config = Self::from_yaml(&config_str)?;
        tracing::debug!(path = %config_path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from the usual locations, or fall back to the built-in farm when
    /// no file exists anywhere.
    pub fn load_or_default(config_override: Option<PathBuf>) -> Result<Self> {
        if config_override.is_none() && !Self::exists(None) {
            tracing::info!("No config file found, using built-in defaults");
            return Ok(Self::default());
        }
        Self::load(config_override)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content)?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| FieldWatchError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for sensor in &self.sensors {
            if !ids.insert(sensor.id.as_str()) {
                return Err(FieldWatchError::Config(format!(
                    "duplicate sensor id '{}'",
                    sensor.id
                )));
            }
            for (label, range) in [("hard", &sensor.hard_range), ("optimal", &sensor.optimal_range)] {
                if !range.min.is_finite() || !range.max.is_finite() {
                    return Err(FieldWatchError::Config(format!(
                        "sensor '{}': {} range bounds must be finite",
                        sensor.id, label
                    )));
                }
                if range.min >= range.max {
                    return Err(FieldWatchError::Config(format!(
                        "sensor '{}': {} range {} is empty",
                        sensor.id, label, range
                    )));
                }
            }
            if !sensor.hard_range.contains_range(&sensor.optimal_range) {
                return Err(FieldWatchError::Config(format!(
                    "sensor '{}': optimal range {} lies outside hard range {}",
                    sensor.id, sensor.optimal_range, sensor.hard_range
                )));
            }
            if !sensor.drift_rate.is_finite() || sensor.drift_rate < 0.0 {
                return Err(FieldWatchError::Config(format!(
                    "sensor '{}': drift rate must be a finite non-negative number",
                    sensor.id
                )));
            }
        }

        for crop in &self.crops {
            if crop.crop_type.trim().is_empty() {
                return Err(FieldWatchError::Config("crop_type must not be empty".into()));
            }
            if !(0.0..=100.0).contains(&crop.health_score) {
                return Err(FieldWatchError::Config(format!(
                    "crop '{}': health score {} is outside 0-100",
                    crop.crop_type, crop.health_score
                )));
            }
            for (label, days) in [
                ("days_since_planting", crop.days_since_planting),
                ("days_to_harvest", crop.days_to_harvest),
            ] {
                if !(-MAX_CROP_DAYS..=MAX_CROP_DAYS).contains(&days) {
                    return Err(FieldWatchError::Config(format!(
                        "crop '{}': {} must be within {} days",
                        crop.crop_type, label, MAX_CROP_DAYS
                    )));
                }
            }
        }

        if self.simulation.cycle_interval_secs == 0 {
            return Err(FieldWatchError::Config(
                "simulation.cycle_interval_secs must be positive".into(),
            ));
        }
        if self.simulation.fault_duration_secs > MAX_FAULT_DURATION_SECS {
            return Err(FieldWatchError::Config(format!(
                "simulation.fault_duration_secs must be at most {}",
                MAX_FAULT_DURATION_SECS
            )));
        }

        let alerts = &self.alerts;
        if !alerts.irrigation_threshold.is_finite() {
            return Err(FieldWatchError::Config(
                "alerts.irrigation_threshold must be finite".into(),
            ));
        }
        if !alerts.trend_change_ratio.is_finite() || alerts.trend_change_ratio < 0.0 {
            return Err(FieldWatchError::Config(
                "alerts.trend_change_ratio must be a finite non-negative number".into(),
            ));
        }
        if alerts.trend_window < 2 {
            return Err(FieldWatchError::Config(
                "alerts.trend_window must be at least 2".into(),
            ));
        }
        if alerts.learning_buffer_capacity < alerts.trend_window {
            return Err(FieldWatchError::Config(format!(
                "alerts.learning_buffer_capacity ({}) must be at least the trend window ({})",
                alerts.learning_buffer_capacity, alerts.trend_window
            )));
        }

        if self.predictor.forest.n_trees == 0 {
            return Err(FieldWatchError::Config(
                "predictor.n_trees must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let default_path = Self::default_config_path()?;
        Ok(default_path)
    }

    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/fieldwatch/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FieldWatchError::Config("Cannot determine config directory".into()))?
            .join("fieldwatch");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Sensors keep their built-in definitions; edit the file to change them.
    pub fn setup_interactive(target: Option<PathBuf>) -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up FieldWatch!");
        println!();

        println!("Farm");
        let name: String = prompt("  Farm name", "Demo Farm".to_string())?;
        let field_id: String = prompt("  Field id", "field-1".to_string())?;
        println!();

        println!("Simulation");
        let cycle_interval_secs: u64 = prompt("  Seconds between cycles", 5)?;
        let fault_duration_secs: u64 = prompt("  Fault duration (seconds)", 60)?;
        let seed: String = Input::new()
            .with_prompt("  RNG seed (blank for random)")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| FieldWatchError::Config(format!("Input error: {}", e)))?;
        let seed = if seed.trim().is_empty() {
            None
        } else {
            Some(seed.trim().parse::<u64>().map_err(|_| {
                FieldWatchError::Config(format!("invalid seed '{}'", seed.trim()))
            })?)
        };
        println!();

        println!("Alerts");
        let irrigation_threshold: f64 = prompt("  Irrigation threshold (% soil moisture)", 30.0)?;
        println!();

        println!("Yield model (leave blank to use the heuristic only)");
        let dataset: String = Input::new()
            .with_prompt("  Training dataset CSV")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| FieldWatchError::Config(format!("Input error: {}", e)))?;
        println!();

        let config = Config {
            farm: FarmConfig { name, field_id },
            simulation: SimulationConfig {
                seed,
                cycle_interval_secs,
                fault_duration_secs,
            },
            alerts: AlertConfig {
                irrigation_threshold,
                ..AlertConfig::default()
            },
            predictor: PredictorConfig {
                forest: ForestParams::default(),
                dataset: (!dataset.trim().is_empty()).then(|| PathBuf::from(dataset.trim())),
            },
            ..Config::default()
        };
        config.validate()?;

        let config_path = match target {
            Some(p) => p,
            None => Self::default_config_path()?,
        };
        config.write_to(&config_path)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    pub fn write_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| FieldWatchError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# FieldWatch Configuration\n# Generated by `fieldwatch init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| FieldWatchError::Config(format!("Invalid substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("FIELDWATCH_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| FieldWatchError::Config("Cannot determine data directory".into()))?
            .join("fieldwatch");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn log_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("fieldwatch.log"))
    }
}

fn prompt<T>(label: &str, default: T) -> Result<T>
where
    T: Clone + std::fmt::Display + std::str::FromStr,
    T::Err: std::fmt::Display + std::fmt::Debug,
{
    Input::new()
        .with_prompt(label)
        .default(default)
        .interact_text()
        .map_err(|e| FieldWatchError::Config(format!("Input error: {}", e)))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            farm: FarmConfig::default(),
            simulation: SimulationConfig::default(),
            sensors: SensorConfig::defaults(),
            crops: CropConfig::defaults(),
            alerts: AlertConfig::default(),
            predictor: PredictorConfig::default(),
        }
    }
}
