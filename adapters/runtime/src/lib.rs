#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver connecting the authoritative world, the pure systems and the
//! host collaborators (assets, audio, HUD, input, immersive mode, rendering).
//!
//! The host owns the real-time loop and calls [`Simulation::frame`] once per
//! display frame with the elapsed wall-clock time.

pub mod assets;
pub mod collaborators;
mod driver;

pub use driver::{Collaborators, FrameClock, FrameReport, FrameView, Simulation};
