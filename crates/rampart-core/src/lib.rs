//! Rampart Core - Core types and utilities for the Rampart simulation
//!
//! This crate provides the foundational types used throughout the workspace:
//! - Mathematical primitives (re-exported from glam)
//! - The frame clock read by every per-frame system

pub mod time;

pub use glam::{Mat4, Vec3};
pub use time::{GameTime, TimeConfig};
