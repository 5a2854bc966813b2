//! Core real-time grid cloth simulation library.
//!
//! Main components:
//! - [`grid`] - the square point grid and its rest configuration.
//! - [`store`] - ping-pong storage of the two alternating grids.
//! - [`present`] - the copy stage owning the display grid.
//! - [`camera`] - view/projection, pointer rays and the reference plane.
//! - [`interaction`] - pointer events → simulation-space grab/hover state.
//! - [`kernel`] - the pluggable step function and the default position-based kernel.
//! - [`phases`] - the individual phases of the default kernel.
//! - [`constraints`] - distance constraints of the grid.
//! - [`sim`] - the frame orchestrator with its init/tick/shutdown lifecycle.
//! - [`config`] - simulation and kernel parameters.
//! - [`error`] - setup errors and dropped pointer samples.
//! - [`types`] - shared type aliases and constants.

pub mod camera;
pub mod config;
pub mod constraints;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod kernel;
pub mod phases;
pub mod present;
pub mod sim;
pub mod store;
pub mod types;
