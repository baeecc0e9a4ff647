//! Per-mode cost models: rail, road and water.

pub mod rail;
pub mod road;
pub mod water;
