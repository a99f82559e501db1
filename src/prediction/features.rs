use serde::{Deserialize, Serialize};

pub const NUM_CHANNELS: usize = 7;

pub const CROP_TYPE_COLUMN: &str = "crop_type";
pub const DISEASE_STATUS_COLUMN: &str = "crop_disease_status";
pub const TARGET_COLUMN: &str = "yield_kg_per_hectare";

/// The numeric inputs of the yield model, in feature-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureChannel {
    SoilMoisture,
    SoilPh,
    Temperature,
    Rainfall,
    Humidity,
    SunlightHours,
    Ndvi,
}

impl FeatureChannel {
    pub fn all() -> &'static [FeatureChannel; NUM_CHANNELS] {
        &[
            FeatureChannel::SoilMoisture,
            FeatureChannel::SoilPh,
            FeatureChannel::Temperature,
            FeatureChannel::Rainfall,
            FeatureChannel::Humidity,
            FeatureChannel::SunlightHours,
            FeatureChannel::Ndvi,
        ]
    }

    pub fn index(&self) -> usize {
        match self {
            FeatureChannel::SoilMoisture => 0,
            FeatureChannel::SoilPh => 1,
            FeatureChannel::Temperature => 2,
            FeatureChannel::Rainfall => 3,
            FeatureChannel::Humidity => 4,
            FeatureChannel::SunlightHours => 5,
            FeatureChannel::Ndvi => 6,
        }
    }

    /// Id of the sensor that feeds this channel.
    pub fn sensor_id(&self) -> &'static str {
        match self {
            FeatureChannel::SoilMoisture => "soil_moisture",
            FeatureChannel::SoilPh => "soil_ph",
            FeatureChannel::Temperature => "temperature",
            FeatureChannel::Rainfall => "rainfall",
            FeatureChannel::Humidity => "humidity",
            FeatureChannel::SunlightHours => "sunlight_hours",
            FeatureChannel::Ndvi => "ndvi_index",
        }
    }

    /// Column header in training datasets.
    pub fn column(&self) -> &'static str {
        match self {
            FeatureChannel::SoilMoisture => "soil_moisture_%",
            FeatureChannel::SoilPh => "soil_pH",
            FeatureChannel::Temperature => "temperature_C",
            FeatureChannel::Rainfall => "rainfall_mm",
            FeatureChannel::Humidity => "humidity_%",
            FeatureChannel::SunlightHours => "sunlight_hours",
            FeatureChannel::Ndvi => "NDVI_index",
        }
    }

    /// Heuristic weight before any training.
    pub fn default_weight(&self) -> f64 {
        match self {
            FeatureChannel::SoilMoisture => 0.35,
            FeatureChannel::SoilPh => 0.20,
            FeatureChannel::Temperature => 0.25,
            FeatureChannel::Rainfall => 0.10,
            FeatureChannel::Humidity => 0.05,
            FeatureChannel::SunlightHours => 0.03,
            FeatureChannel::Ndvi => 0.02,
        }
    }

    /// Value assumed by the trained model when the sensor is absent.
    pub fn fallback_value(&self) -> f64 {
        match self {
            FeatureChannel::SoilMoisture => 30.0,
            FeatureChannel::SoilPh => 6.5,
            FeatureChannel::Temperature => 25.0,
            FeatureChannel::Rainfall => 150.0,
            FeatureChannel::Humidity => 60.0,
            FeatureChannel::SunlightHours => 6.0,
            FeatureChannel::Ndvi => 0.5,
        }
    }

    /// Whether a model feature name refers to this channel.
    pub fn matches_feature(&self, feature_name: &str) -> bool {
        feature_name
            .to_lowercase()
            .contains(&self.sensor_id().to_lowercase())
    }
}

impl std::fmt::Display for FeatureChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sensor_id())
    }
}

/// One model input: numeric channels plus the two categorical columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub numeric: [f64; NUM_CHANNELS],
    pub crop_type: String,
    pub disease_status: String,
}
