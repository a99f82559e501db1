//! Feature preprocessing for the trained model: numeric standardization and
//! one-hot encoding of the categorical columns.

use super::features::{
    FeatureChannel, FeatureRow, CROP_TYPE_COLUMN, DISEASE_STATUS_COLUMN, NUM_CHANNELS,
};

/// Standardizes each numeric column to zero mean and unit population
/// variance. Constant columns keep a scale of 1.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: [f64; NUM_CHANNELS],
    scales: [f64; NUM_CHANNELS],
}

impl StandardScaler {
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let mut means = [0.0; NUM_CHANNELS];
        let mut scales = [1.0; NUM_CHANNELS];
        if rows.is_empty() {
            return Self { means, scales };
        }

        let n = rows.len() as f64;
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row.numeric) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut variances = [0.0; NUM_CHANNELS];
        for row in rows {
            for i in 0..NUM_CHANNELS {
                let delta = row.numeric[i] - means[i];
                variances[i] += delta * delta;
            }
        }
        for (scale, variance) in scales.iter_mut().zip(variances) {
            let std = (variance / n).sqrt();
            *scale = if std > 0.0 { std } else { 1.0 };
        }

        Self { means, scales }
    }

    pub fn transform(&self, numeric: &[f64; NUM_CHANNELS]) -> [f64; NUM_CHANNELS] {
        let mut out = [0.0; NUM_CHANNELS];
        for i in 0..NUM_CHANNELS {
            out[i] = (numeric[i] - self.means[i]) / self.scales[i];
        }
        out
    }
}

/// One-hot encoder for a single categorical column.
///
/// Categories are learned at fit time in sorted order and the first is
/// dropped, so it encodes as all zeros. Values not seen during fit also
/// encode as all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(column: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        Self {
            column: column.to_string(),
            categories,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of output columns (categories minus the dropped one).
    pub fn width(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }

    pub fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        let start = out.len();
        out.resize(start + self.width(), 0.0);
        if let Ok(pos) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            if pos > 0 {
                out[start + pos - 1] = 1.0;
            }
        }
    }

    pub fn feature_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .skip(1)
            .map(move |c| format!("{}_{}", self.column, c))
    }
}

/// Full transform from a [`FeatureRow`] to a model input vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePipeline {
    scaler: StandardScaler,
    crop_type: OneHotEncoder,
    disease_status: OneHotEncoder,
}

impl FeaturePipeline {
    pub fn fit(rows: &[FeatureRow]) -> Self {
        Self {
            scaler: StandardScaler::fit(rows),
            crop_type: OneHotEncoder::fit(
                CROP_TYPE_COLUMN,
                rows.iter().map(|r| r.crop_type.as_str()),
            ),
            disease_status: OneHotEncoder::fit(
                DISEASE_STATUS_COLUMN,
                rows.iter().map(|r| r.disease_status.as_str()),
            ),
        }
    }

    pub fn width(&self) -> usize {
        NUM_CHANNELS + self.crop_type.width() + self.disease_status.width()
    }

    pub fn transform(&self, row: &FeatureRow) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        out.extend_from_slice(&self.scaler.transform(&row.numeric));
        self.crop_type.encode_into(&row.crop_type, &mut out);
        self.disease_status.encode_into(&row.disease_status, &mut out);
        out
    }

    pub fn transform_all(&self, rows: &[FeatureRow]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    /// Crop types seen during fitting, sorted.
    pub fn crop_types(&self) -> &[String] {
        self.crop_type.categories()
    }

    /// Output column names, aligned with [`FeaturePipeline::transform`].
    pub fn feature_names(&self) -> Vec<String> {
        FeatureChannel::all()
            .iter()
            .map(|c| c.column().to_string())
            .chain(self.crop_type.feature_names())
            .chain(self.disease_status.feature_names())
            .collect()
    }
}
