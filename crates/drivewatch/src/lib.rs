//! drivewatch: a terminal dashboard for driver health and safety alerts.
//!
//! The binary wires these modules together. They are public so that the
//! integration tests can drive the dashboard headlessly.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod logging;
pub mod msg;
pub mod panels;
pub mod screen;
pub mod store;
pub mod theme;

pub use error::{Error, Result};
