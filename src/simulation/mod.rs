pub mod environment;
pub mod simulator;

pub use environment::Weather;
pub use simulator::{Fault, SensorSimulator, SimState};
