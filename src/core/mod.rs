//! Core signal model.
//!
//! This module contains the pure signal vocabulary shared by the rest of the
//! crate:
//! - Directions and the lane conflict relation
//! - The three-valued light state and its standard cycle
//! - Individual traffic lights and their immutable change events
//!
//! Nothing in this module locks or logs; concurrency discipline lives with
//! the owning intersection.

mod direction;
mod event;
mod light;
mod state;

pub use direction::{Direction, Lane};
pub use event::StateChangeEvent;
pub use light::{LightSnapshot, TrafficLight};
pub use state::LightState;
