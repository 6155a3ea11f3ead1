pub mod enhance;
pub mod gallery;
pub mod health;
pub mod metrics;
pub mod stats;
