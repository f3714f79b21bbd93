pub mod agents;
pub mod error;
pub mod mealplan;
pub mod mood;
pub mod nutrients;
pub mod projections;
pub mod telemetry;
