pub mod gauge;

pub use gauge::sensor_gauge;
