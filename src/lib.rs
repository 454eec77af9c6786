//! Health Checkup Analyzer
//!
//! Upload a PDF health report, extract its text, have a hosted language
//! model explain it in English or Hindi, and download the rendered result.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
