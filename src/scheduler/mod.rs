//! Group photo rotation scheduler module.
//!
//! Pops one queued image per period and applies it as the destination
//! chat's photo.

mod runner;

pub use runner::{NO_IMAGES_MESSAGE, RotationMessage, RotationOutcome, RotationScheduler};
