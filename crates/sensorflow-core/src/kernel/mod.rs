//! # SensorFlow Kernel
//!
//! The `kernel` module owns the [`Manager`], the component that wires plugins
//! into connection tasks and trigger entries, runs them, and tears them down
//! in a fixed order.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Manager lifecycle**: construction, running and ordered shutdown, see
//!   [`Manager`](manager::Manager) and [`ManagerState`](manager::ManagerState).
//! - **Core Constants**: defaults shared with the binary, in `constants`.
//! - **Error Handling**: the crate-wide [`Error`](error::Error) and `Result` alias.
pub mod constants;
pub mod error;
pub mod manager;

pub use error::{Error, Result};
pub use manager::{Manager, ManagerState};
