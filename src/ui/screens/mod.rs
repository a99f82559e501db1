pub mod alerts;
pub mod crops;
pub mod dashboard;
pub mod history;
pub mod sensors;

pub use alerts::AlertsScreen;
pub use crops::CropsScreen;
pub use dashboard::DashboardScreen;
pub use history::HistoryScreen;
pub use sensors::SensorsScreen;
