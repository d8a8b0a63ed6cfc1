pub mod connection;
pub mod repository;

pub use connection::init_database;
pub use repository::{AnalyticsRepository, AnalyticsTx};
