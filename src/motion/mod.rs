// src/motion/mod.rs - Kinematic limits used by the rewriter

pub mod accel_table;

pub use accel_table::{AccelLimits, AccelerationTable, Sample};
