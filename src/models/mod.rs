pub mod api;
pub mod task;
