//! Image Enhancement Gateway
//!
//! This library provides the core functionality for the image-enhancer
//! service: it uploads source images to a remote enhancement API, polls the
//! resulting task to completion, and keeps a local gallery and usage
//! statistics of enhanced images.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
