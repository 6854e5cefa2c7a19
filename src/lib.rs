mod prediction;
mod routes;
mod server;
mod telemetry;

pub mod app;
pub mod config;
pub mod predictor;

pub use app::start_app;
