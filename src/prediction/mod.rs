pub mod dataset;
pub mod features;
pub mod forest;
pub mod predictor;
pub mod preprocess;

pub use features::FeatureChannel;
pub use forest::ForestParams;
pub use predictor::{TrainingSummary, YieldPredictor};
