//! Training dataset loading.
//!
//! Datasets are CSV files with a header row. The seven numeric feature
//! columns, the two categorical columns and the yield target are required;
//! other columns are ignored. Rows with a missing or unparseable required
//! field are dropped.

use super::features::{
    FeatureChannel, FeatureRow, CROP_TYPE_COLUMN, DISEASE_STATUS_COLUMN, NUM_CHANNELS,
    TARGET_COLUMN,
};
use crate::error::{FieldWatchError, Result};
use std::io::BufRead;
use std::path::Path;

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub features: FeatureRow,
    pub target: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<TrainingRecord>,
    /// Rows skipped because a required field was missing or malformed.
    pub dropped_rows: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.target).collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            FieldWatchError::Dataset(format!("cannot open {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::debug!(
            path = %path.display(),
            rows = dataset.len(),
            dropped = dataset.dropped_rows,
            "Loaded training dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        let header = loop {
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Err(FieldWatchError::Dataset("dataset is empty".into())),
            }
        };
        let columns = ColumnMap::from_header(&header)?;

        let mut dataset = Dataset::default();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match columns.parse_row(&csv_split(&line)) {
                Some(record) => dataset.records.push(record),
                None => dataset.dropped_rows += 1,
            }
        }

        Ok(dataset)
    }
}

impl std::str::FromStr for Dataset {
    type Err = FieldWatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}

/// Positions of the required columns within a row.
struct ColumnMap {
    numeric: [usize; NUM_CHANNELS],
    crop_type: usize,
    disease_status: usize,
    target: usize,
}

impl ColumnMap {
    fn from_header(header: &str) -> Result<Self> {
        let columns: Vec<String> = csv_split(header)
            .into_iter()
            .map(|c| c.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        let find = |name: &str| -> Result<usize> {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| FieldWatchError::MissingColumn(name.to_string()))
        };

        let mut numeric = [0usize; NUM_CHANNELS];
        for channel in FeatureChannel::all() {
            numeric[channel.index()] = find(channel.column())?;
        }

        Ok(Self {
            numeric,
            crop_type: find(CROP_TYPE_COLUMN)?,
            disease_status: find(DISEASE_STATUS_COLUMN)?,
            target: find(TARGET_COLUMN)?,
        })
    }

    fn parse_row(&self, fields: &[String]) -> Option<TrainingRecord> {
        let text = |idx: usize| -> Option<&str> {
            let value = fields.get(idx)?.trim();
            if value.is_empty() || value.eq_ignore_ascii_case("nan") {
                None
            } else {
                Some(value)
            }
        };
        let number = |idx: usize| -> Option<f64> {
            text(idx)?.parse::<f64>().ok().filter(|v| v.is_finite())
        };

        let mut numeric = [0.0; NUM_CHANNELS];
        for (slot, idx) in numeric.iter_mut().zip(self.numeric) {
            *slot = number(idx)?;
        }

        Some(TrainingRecord {
            features: FeatureRow {
                numeric,
                crop_type: text(self.crop_type)?.to_string(),
                disease_status: text(self.disease_status)?.to_string(),
            },
            target: number(self.target)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "farm_id,soil_moisture_%,soil_pH,temperature_C,rainfall_mm,humidity_%,\
sunlight_hours,NDVI_index,crop_type,crop_disease_status,yield_kg_per_hectare";

    #[test]
    fn csv_split_handles_quotes() {
        assert_eq!(csv_split("a,\"b,c\",d"), vec!["a", "b,c", "d"]);
        assert_eq!(csv_split("\"say \"\"hi\"\"\",x"), vec!["say \"hi\"", "x"]);
        assert_eq!(csv_split("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn parses_complete_rows() {
        let csv = format!(
            "{}\nF1,35.2,6.4,24.1,180.5,65.0,7.2,0.62,Wheat,None,4100.5\n\
             F2,28.0,5.9,27.3,120.0,70.1,6.1,0.55,Maize,Mild,5200\n",
            HEADER
        );
        let dataset: Dataset = csv.parse().unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dropped_rows, 0);
        let first = &dataset.records[0];
        assert_eq!(first.features.numeric[0], 35.2);
        assert_eq!(first.features.numeric[6], 0.62);
        assert_eq!(first.features.crop_type, "Wheat");
        assert_eq!(first.features.disease_status, "None");
        assert_eq!(first.target, 4100.5);
    }

    #[test]
    fn drops_rows_with_missing_fields() {
        let csv = format!(
            "{}\nF1,35.2,6.4,24.1,180.5,65.0,7.2,0.62,Wheat,None,4100.5\n\
             F2,,5.9,27.3,120.0,70.1,6.1,0.55,Maize,Mild,5200\n\
             F3,30.0,5.9,27.3,120.0,70.1,6.1,0.55,Rice,Severe,\n\
             F4,30.0,abc,27.3,120.0,70.1,6.1,0.55,Rice,Severe,3000\n\
             F5,30.0,6.0,27.3,120.0,70.1,6.1,0.55,,None,3000\n",
            HEADER
        );
        let dataset: Dataset = csv.parse().unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.dropped_rows, 4);
    }

    #[test]
    fn missing_target_column_is_an_error() {
        let csv = "soil_moisture_%,soil_pH,temperature_C,rainfall_mm,humidity_%,sunlight_hours,\
NDVI_index,crop_type,crop_disease_status\n30,6.5,25,150,60,6,0.5,Wheat,None\n";
        let err = csv.parse::<Dataset>().unwrap_err();
        assert!(
            matches!(err, FieldWatchError::MissingColumn(ref c) if c == TARGET_COLUMN),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            "".parse::<Dataset>(),
            Err(FieldWatchError::Dataset(_))
        ));
    }

    #[test]
    fn columns_may_appear_in_any_order() {
        let csv = "yield_kg_per_hectare,crop_disease_status,crop_type,NDVI_index,sunlight_hours,\
humidity_%,rainfall_mm,temperature_C,soil_pH,soil_moisture_%\n\
4000,None,Soybean,0.5,6,60,150,25,6.5,30\n";
        let dataset: Dataset = csv.parse().unwrap();
        assert_eq!(dataset.len(), 1);
        let record = &dataset.records[0];
        assert_eq!(record.features.numeric, [30.0, 6.5, 25.0, 150.0, 60.0, 6.0, 0.5]);
        assert_eq!(record.features.crop_type, "Soybean");
    }

    #[test]
    fn load_reports_unreadable_file() {
        let err = Dataset::load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, FieldWatchError::Dataset(_)));
    }
}
