//! autoacc-rs: rewrites G-code feed rates against a velocity-dependent
//! acceleration table measured on the printer.

pub mod config;
pub mod file_manager;
pub mod gcode;
pub mod motion;

pub use config::{ConfigError, Settings};
pub use file_manager::FileManager;
pub use gcode::{RewriteError, RewriteStats, StreamRewriter};
pub use motion::{AccelLimits, AccelerationTable, Sample};
