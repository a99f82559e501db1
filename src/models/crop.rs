use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropType {
    Wheat,
    Soybean,
    Maize,
    Cotton,
    Rice,
    Other(String),
}

impl CropType {
    pub fn as_str(&self) -> &str {
        match self {
            CropType::Wheat => "Wheat",
            CropType::Soybean => "Soybean",
            CropType::Maize => "Maize",
            CropType::Cotton => "Cotton",
            CropType::Rice => "Rice",
            CropType::Other(name) => name.as_str(),
        }
    }

    /// Parse a crop name. Unrecognised names become `Other`; only an empty
    /// name is rejected.
    pub fn from_str(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => None,
            "wheat" => Some(CropType::Wheat),
            "soybean" | "soybeans" | "soy" => Some(CropType::Soybean),
            "maize" | "corn" => Some(CropType::Maize),
            "cotton" => Some(CropType::Cotton),
            "rice" => Some(CropType::Rice),
            _ => Some(CropType::Other(trimmed.to_string())),
        }
    }

    pub fn coefficients(&self) -> CropCoefficients {
        match self {
            CropType::Wheat => CropCoefficients::new(4000.0, 1.0, 1.1),
            CropType::Soybean => CropCoefficients::new(4500.0, 1.2, 1.0),
            CropType::Maize => CropCoefficients::new(5000.0, 1.3, 1.2),
            CropType::Cotton => CropCoefficients::new(3500.0, 1.1, 1.3),
            CropType::Rice => CropCoefficients::new(4500.0, 1.2, 1.4),
            CropType::Other(_) => CropCoefficients::default(),
        }
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agronomic constants for a crop: yield in kg/ha under ideal conditions and
/// how strongly temperature and water deviations affect it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropCoefficients {
    pub base_yield: f64,
    pub temp_sensitivity: f64,
    pub water_need: f64,
}

impl CropCoefficients {
    pub const REFERENCE_YIELD: f64 = 4000.0;

    pub const fn new(base_yield: f64, temp_sensitivity: f64, water_need: f64) -> Self {
        Self {
            base_yield,
            temp_sensitivity,
            water_need,
        }
    }
}

impl Default for CropCoefficients {
    fn default() -> Self {
        Self::new(Self::REFERENCE_YIELD, 1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrowthStage {
    Seedling,
    Vegetative,
    Flowering,
    Fruiting,
    Maturation,
    Harvest,
}

impl GrowthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthStage::Seedling => "Seedling",
            GrowthStage::Vegetative => "Vegetative",
            GrowthStage::Flowering => "Flowering",
            GrowthStage::Fruiting => "Fruiting",
            GrowthStage::Maturation => "Maturation",
            GrowthStage::Harvest => "Harvest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "seedling" => Some(GrowthStage::Seedling),
            "vegetative" => Some(GrowthStage::Vegetative),
            "flowering" => Some(GrowthStage::Flowering),
            "fruiting" => Some(GrowthStage::Fruiting),
            "maturation" | "mature" => Some(GrowthStage::Maturation),
            "harvest" => Some(GrowthStage::Harvest),
            _ => None,
        }
    }

    /// Fraction of the final yield the plant can realise at this stage.
    pub fn yield_factor(&self) -> f64 {
        match self {
            GrowthStage::Seedling => 0.3,
            GrowthStage::Vegetative => 0.6,
            GrowthStage::Flowering => 0.9,
            GrowthStage::Fruiting | GrowthStage::Maturation | GrowthStage::Harvest => 1.0,
        }
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiseaseStatus {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl DiseaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseStatus::None => "None",
            DiseaseStatus::Mild => "Mild",
            DiseaseStatus::Moderate => "Moderate",
            DiseaseStatus::Severe => "Severe",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" | "healthy" => Some(DiseaseStatus::None),
            "mild" => Some(DiseaseStatus::Mild),
            "moderate" => Some(DiseaseStatus::Moderate),
            "severe" => Some(DiseaseStatus::Severe),
            _ => None,
        }
    }
}

impl std::fmt::Display for DiseaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crop {
    pub crop_type: CropType,
    pub planted_date: DateTime<Utc>,
    pub expected_harvest: DateTime<Utc>,
    pub predicted_yield: f64,
    /// 0-100. Set at planting and not mutated by any rule.
    pub health_score: f64,
    pub growth_stage: GrowthStage,
    pub disease_status: DiseaseStatus,
}

impl Crop {
    pub fn new(
        crop_type: CropType,
        planted_date: DateTime<Utc>,
        expected_harvest: DateTime<Utc>,
        health_score: f64,
        growth_stage: GrowthStage,
    ) -> Self {
        Self {
            crop_type,
            planted_date,
            expected_harvest,
            predicted_yield: 0.0,
            health_score: health_score.clamp(0.0, 100.0),
            growth_stage,
            disease_status: DiseaseStatus::None,
        }
    }

    pub fn with_disease_status(mut self, status: DiseaseStatus) -> Self {
        self.disease_status = status;
        self
    }

    /// Build a crop relative to `now` from planting/harvest offsets in days.
    /// Returns `None` when either date falls outside chrono's range.
    pub fn planted_days_ago(
        crop_type: CropType,
        now: DateTime<Utc>,
        days_since_planting: i64,
        days_to_harvest: i64,
        health_score: f64,
        growth_stage: GrowthStage,
    ) -> Option<Self> {
        let planted = now.checked_sub_signed(Duration::try_days(days_since_planting)?)?;
        let harvest = now.checked_add_signed(Duration::try_days(days_to_harvest)?)?;
        Some(Self::new(
            crop_type,
            planted,
            harvest,
            health_score,
            growth_stage,
        ))
    }

    pub fn health_factor(&self) -> f64 {
        self.health_score / 100.0
    }

    pub fn days_to_harvest(&self, now: DateTime<Utc>) -> i64 {
        (self.expected_harvest - now).num_days()
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.crop_type, self.growth_stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_type_from_str() {
        assert_eq!(CropType::from_str("wheat"), Some(CropType::Wheat));
        assert_eq!(CropType::from_str("Corn"), Some(CropType::Maize));
        assert_eq!(CropType::from_str("SOYBEAN"), Some(CropType::Soybean));
        assert_eq!(
            CropType::from_str("Barley"),
            Some(CropType::Other("Barley".into()))
        );
        assert_eq!(CropType::from_str("  "), None);
    }

    #[test]
    fn unknown_crop_uses_reference_coefficients() {
        let coeff = CropType::Other("Barley".into()).coefficients();
        assert_eq!(coeff, CropCoefficients::new(4000.0, 1.0, 1.0));
        assert_eq!(CropType::Maize.coefficients().base_yield, 5000.0);
        assert_eq!(CropType::Rice.coefficients().water_need, 1.4);
    }

    #[test]
    fn growth_stage_factors() {
        assert_eq!(GrowthStage::Seedling.yield_factor(), 0.3);
        assert_eq!(GrowthStage::Vegetative.yield_factor(), 0.6);
        assert_eq!(GrowthStage::Flowering.yield_factor(), 0.9);
        assert_eq!(GrowthStage::Fruiting.yield_factor(), 1.0);
        assert_eq!(GrowthStage::Maturation.yield_factor(), 1.0);
        assert_eq!(GrowthStage::Harvest.yield_factor(), 1.0);
    }

    #[test]
    fn growth_stage_round_trip() {
        for stage in [
            GrowthStage::Seedling,
            GrowthStage::Vegetative,
            GrowthStage::Flowering,
            GrowthStage::Fruiting,
            GrowthStage::Maturation,
            GrowthStage::Harvest,
        ] {
            assert_eq!(GrowthStage::from_str(stage.as_str()), Some(stage));
        }
        assert_eq!(GrowthStage::from_str("mature"), Some(GrowthStage::Maturation));
        assert_eq!(GrowthStage::from_str("dormant"), None);
    }

    #[test]
    fn disease_status_defaults_to_none() {
        let crop = Crop::planted_days_ago(
            CropType::Wheat,
            Utc::now(),
            30,
            90,
            85.0,
            GrowthStage::Flowering,
        )
        .unwrap();
        assert_eq!(crop.disease_status, DiseaseStatus::None);
        assert_eq!(DiseaseStatus::from_str("Moderate"), Some(DiseaseStatus::Moderate));
        assert_eq!(DiseaseStatus::from_str("blight"), None);
    }

    #[test]
    fn days_to_harvest_and_health() {
        let now = Utc::now();
        let crop = Crop::planted_days_ago(
            CropType::Soybean,
            now,
            20,
            25,
            92.0,
            GrowthStage::Maturation,
        )
        .unwrap();
        assert_eq!(crop.days_to_harvest(now), 25);
        assert!((crop.health_factor() - 0.92).abs() < 1e-9);
        assert_eq!(crop.label(), "Soybean (Maturation)");
    }

    #[test]
    fn health_score_is_clamped() {
        let crop = Crop::new(
            CropType::Rice,
            Utc::now(),
            Utc::now(),
            140.0,
            GrowthStage::Seedling,
        );
        assert_eq!(crop.health_score, 100.0);
    }

    #[test]
    fn out_of_range_offsets_yield_no_crop() {
        let now = Utc::now();
        let build = |planted: i64, harvest: i64| {
            Crop::planted_days_ago(CropType::Maize, now, planted, harvest, 80.0, GrowthStage::Vegetative)
        };
        assert!(build(1_000_000_000, 90).is_none());
        assert!(build(30, 1_000_000_000).is_none());
        assert!(build(i64::MAX, 90).is_none());
        assert!(build(30, 90).is_some());
    }
}
