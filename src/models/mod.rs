pub mod alert;
pub mod crop;
pub mod report;
pub mod sensor;

pub use alert::*;
pub use crop::*;
pub use report::*;
pub use sensor::*;
