//! Rotating-cube backdrop with a radial pop-out menu, rendered in a terminal.
//!
//! The page is two independent components sharing one cooperative
//! [`scheduler::Scheduler`] and one [`events::EventHub`]:
//!
//! - [`background::BackgroundRenderer`] spins a lit cube and drifts its camera
//!   towards the pointer.
//! - [`menu::RadialMenu`] fans a set of items out on a circle and back, and
//!   pulses the cube through the [`background::ScalePulse`] handle it is given.

pub mod background;
pub mod config;
pub mod error;
pub mod events;
pub mod graphics;
pub mod math;
pub mod menu;
pub mod page;
pub mod scheduler;
pub mod stagger;
pub mod state;
pub mod terminal;
pub mod transform;

pub use error::{Error, Result};
