//! promkit exposer library entry.
//!
//! Serves `promkit-core` collectables over HTTP in the Prometheus text format.
//! The binary (`main.rs`) wires it to a YAML config; integration tests drive
//! it directly.

pub mod app_state;
pub mod config;
pub mod endpoint;
pub mod exposer;
pub mod obs;
pub mod ops;
pub mod router;

pub use exposer::Exposer;
