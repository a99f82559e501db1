use super::dataset::Dataset;
use super::features::{FeatureChannel, FeatureRow, NUM_CHANNELS};
use super::forest::{r2_score, ForestParams, RandomForest};
use super::preprocess::FeaturePipeline;
use crate::error::{FieldWatchError, Result};
use crate::logic::calculations::{normalize_sensor_value, round2, temperature_factor, water_factor};
use crate::models::{Crop, CropCoefficients, Sensor};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of a successful fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub samples: usize,
    pub dropped_rows: usize,
    /// In-sample coefficient of determination.
    pub r2: f64,
    /// Importance per transformed feature column, in pipeline order.
    pub feature_importances: Vec<(String, f64)>,
    pub trees: usize,
    /// Nodes across every tree in the forest.
    pub nodes: usize,
    /// Crop types the model was fitted on; others share the baseline.
    pub crop_types: Vec<String>,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct TrainedModel {
    pipeline: FeaturePipeline,
    forest: RandomForest,
}

/// Crop yield predictor.
///
/// Until a dataset has been fitted, predictions come from a weighted
/// heuristic over sensor health with ±10% random variation. After a
/// successful fit, predictions come from a random forest and are
/// deterministic.
#[derive(Debug, Clone)]
pub struct YieldPredictor {
    params: ForestParams,
    weights: [f64; NUM_CHANNELS],
    model: Option<TrainedModel>,
    summary: Option<TrainingSummary>,
}

impl Default for YieldPredictor {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl YieldPredictor {
    pub fn new(params: ForestParams) -> Self {
        let mut weights = [0.0; NUM_CHANNELS];
        for channel in FeatureChannel::all() {
            weights[channel.index()] = channel.default_weight();
        }
        Self {
            params,
            weights,
            model: None,
            summary: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn weight(&self, channel: FeatureChannel) -> f64 {
        self.weights[channel.index()]
    }

    pub fn summary(&self) -> Option<&TrainingSummary> {
        self.summary.as_ref()
    }

    /// Load a CSV dataset and fit it. On failure the error is logged and
    /// the predictor is left exactly as it was.
    pub fn train_from_path(&mut self, path: &Path) -> Result<TrainingSummary> {
        let result = Dataset::load(path).and_then(|dataset| self.train(&dataset));
        if let Err(e) = &result {
            tracing::error!(path = %path.display(), "Model training failed: {}", e);
        }
        result
    }

    pub fn train(&mut self, dataset: &Dataset) -> Result<TrainingSummary> {
        if dataset.is_empty() {
            return Err(FieldWatchError::Training(format!(
                "no usable rows ({} dropped)",
                dataset.dropped_rows
            )));
        }

        let rows: Vec<FeatureRow> = dataset
            .records
            .iter()
            .map(|r| r.features.clone())
            .collect();
        let targets = dataset.targets();

        let pipeline = FeaturePipeline::fit(&rows);
        let x = pipeline.transform_all(&rows);
        let forest = RandomForest::fit(&x, &targets, &self.params)?;

        let fitted: Vec<f64> = x.iter().map(|row| forest.predict(row)).collect();
        let r2 = r2_score(&targets, &fitted);

        let feature_importances: Vec<(String, f64)> = pipeline
            .feature_names()
            .into_iter()
            .zip(forest.feature_importances().iter().copied())
            .collect();

        // Later matches overwrite earlier ones.
        for (name, importance) in &feature_importances {
            for channel in FeatureChannel::all() {
                if channel.matches_feature(name) {
                    self.weights[channel.index()] = *importance;
                }
            }
        }

        let summary = TrainingSummary {
            samples: dataset.len(),
            dropped_rows: dataset.dropped_rows,
            r2,
            feature_importances,
            trees: forest.n_trees(),
            nodes: forest.node_count(),
            crop_types: pipeline.crop_types().to_vec(),
            trained_at: Utc::now(),
        };
        self.model = Some(TrainedModel { pipeline, forest });
        self.summary = Some(summary.clone());

        tracing::info!(
            samples = summary.samples,
            dropped = summary.dropped_rows,
            r2 = summary.r2,
            trees = summary.trees,
            "Yield model trained"
        );

        Ok(summary)
    }

    /// Predicted yield in kg/ha, never negative, rounded to 2 decimals.
    pub fn predict<R: Rng>(&self, crop: &Crop, sensors: &[Sensor], rng: &mut R) -> f64 {
        self.predict_trained(crop, sensors)
            .unwrap_or_else(|| self.predict_heuristic(crop, sensors, rng))
    }

    /// Forest prediction, or `None` before training.
    pub fn predict_trained(&self, crop: &Crop, sensors: &[Sensor]) -> Option<f64> {
        self.model
            .as_ref()
            .map(|model| Self::predict_with_model(model, crop, sensors))
    }

    fn predict_with_model(model: &TrainedModel, crop: &Crop, sensors: &[Sensor]) -> f64 {
        let row = feature_row(crop, sensors);
        let base = model.forest.predict(&model.pipeline.transform(&row));
        let coeff = crop.crop_type.coefficients();
        let scaled = base
            * crop.health_factor()
            * crop.growth_stage.yield_factor()
            * (coeff.base_yield / CropCoefficients::REFERENCE_YIELD);
        round2(scaled.max(0.0))
    }

    pub fn predict_heuristic<R: Rng>(&self, crop: &Crop, sensors: &[Sensor], rng: &mut R) -> f64 {
        let coeff = crop.crop_type.coefficients();
        let expected = coeff.base_yield
            * self.environmental_score(crop, sensors)
            * crop.health_factor()
            * crop.growth_stage.yield_factor();
        let variation = rng.gen_range(0.9..=1.1);
        round2((expected * variation).max(0.0))
    }

    /// Weighted sensor health for a crop, before health/stage scaling.
    ///
    /// Channels without a sensor contribute nothing. Temperature and water
    /// factors apply only when their sensors are present.
    pub fn environmental_score(&self, crop: &Crop, sensors: &[Sensor]) -> f64 {
        let coeff = crop.crop_type.coefficients();
        let mut score = 0.0;
        for channel in FeatureChannel::all() {
            if let Some(sensor) = find_sensor(sensors, *channel) {
                score += normalize_sensor_value(sensor.value, &sensor.optimal_range)
                    * self.weights[channel.index()];
            }
        }

        if let Some(temp) = find_sensor(sensors, FeatureChannel::Temperature) {
            score *= temperature_factor(temp.value, &temp.optimal_range, coeff.temp_sensitivity);
        }
        if let Some(moisture) = find_sensor(sensors, FeatureChannel::SoilMoisture) {
            score *= water_factor(moisture.value, &moisture.optimal_range, coeff.water_need);
        }
        score
    }
}

fn find_sensor(sensors: &[Sensor], channel: FeatureChannel) -> Option<&Sensor> {
    sensors.iter().find(|s| s.id == channel.sensor_id())
}

/// Model input for a crop under the current readings. Absent sensors take
/// their channel's fallback value.
fn feature_row(crop: &Crop, sensors: &[Sensor]) -> FeatureRow {
    let mut numeric = [0.0; NUM_CHANNELS];
    for channel in FeatureChannel::all() {
        numeric[channel.index()] = find_sensor(sensors, *channel)
            .map(|s| s.value)
            .unwrap_or_else(|| channel.fallback_value());
    }
    FeatureRow {
        numeric,
        crop_type: crop.crop_type.as_str().to_string(),
        disease_status: crop.disease_status.as_str().to_string(),
    }
}
