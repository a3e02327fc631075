mod categories;
mod health;
mod metrics;

pub use categories::categories_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
