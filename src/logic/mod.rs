pub mod calculations;
pub mod rules;
pub mod system;

pub use system::{AgricultureSystem, CycleSummary};
