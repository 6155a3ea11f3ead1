pub mod enhance;
pub mod history;
pub mod remote;
pub mod stats;
