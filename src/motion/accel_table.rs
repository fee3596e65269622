//! Velocity-dependent acceleration limits.
//!
//! The table is a sparse list of measured samples. Between samples the limit is
//! blended linearly; outside the measured range the nearest sample applies.

use crate::config::table_file::{Row, TableConfig, DEFAULT_FACTOR_PERCENT};
use crate::config::ConfigError;

/// Acceleration limits for both axes, in mm/s².
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelLimits {
    pub x: u32,
    pub y: u32,
}

/// One normalized table row. Velocity is in mm/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub velocity: f64,
    pub accel_x: u32,
    pub accel_y: u32,
}

impl Sample {
    pub fn limits(&self) -> AccelLimits {
        AccelLimits {
            x: self.accel_x,
            y: self.accel_y,
        }
    }
}

/// Immutable velocity -> acceleration lookup.
///
/// Samples are sorted by strictly increasing velocity and there is always at
/// least one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct AccelerationTable {
    samples: Vec<Sample>,
    per_axis_mode: bool,
    factor_percent: u32,
}

impl AccelerationTable {
    /// Normalize tagged rows into a table.
    ///
    /// Joint rows give one sample each. Per-axis rows are paired by equal
    /// velocity, so every X row needs a Y row and vice versa. The two kinds
    /// cannot be mixed in one table.
    pub fn build(rows: &[Row]) -> Result<Self, ConfigError> {
        let mut joint = Vec::new();
        let mut x_rows = Vec::new();
        let mut y_rows = Vec::new();
        for row in rows {
            match *row {
                Row::Joint { velocity, accel } => joint.push(Sample {
                    velocity,
                    accel_x: accel,
                    accel_y: accel,
                }),
                Row::AxisX { velocity, accel } => x_rows.push((velocity, accel)),
                Row::AxisY { velocity, accel } => y_rows.push((velocity, accel)),
            }
        }

        let per_axis_mode = !x_rows.is_empty() || !y_rows.is_empty();
        if per_axis_mode && !joint.is_empty() {
            return Err(ConfigError::MixedModes);
        }

        let mut samples = if per_axis_mode {
            pair_axes(&x_rows, &y_rows)?
        } else {
            joint
        };
        if samples.is_empty() {
            return Err(ConfigError::Empty);
        }

        samples.sort_by(|a, b| a.velocity.total_cmp(&b.velocity));
        // Equal neighbours would make the interpolation bracket zero-width.
        if let Some(pair) = samples.windows(2).find(|w| w[0].velocity == w[1].velocity) {
            return Err(ConfigError::DuplicateVelocity {
                velocity: pair[0].velocity,
            });
        }

        tracing::debug!(
            "Acceleration table: {} samples, {} mode",
            samples.len(),
            if per_axis_mode { "per-axis" } else { "joint" }
        );

        Ok(Self {
            samples,
            per_axis_mode,
            factor_percent: DEFAULT_FACTOR_PERCENT,
        })
    }

    /// Build from a parsed table file, keeping its factor.
    pub fn from_config(config: &TableConfig) -> Result<Self, ConfigError> {
        let mut table = Self::build(&config.rows)?;
        table.factor_percent = config.factor_percent;
        Ok(table)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// True when X and Y limits were given independently.
    pub fn per_axis_mode(&self) -> bool {
        self.per_axis_mode
    }

    pub fn factor_percent(&self) -> u32 {
        self.factor_percent
    }

    /// Acceleration limits at velocity `v` (mm/s).
    pub fn interpolate(&self, v: f64) -> AccelLimits {
        let first = self.samples[0];
        let last = self.samples[self.samples.len() - 1];
        if v.is_nan() || v < first.velocity {
            return first.limits();
        }
        if v > last.velocity {
            return last.limits();
        }

        // Index of the first sample above v; at least 1 since v >= first.velocity.
        let upper = self.samples.partition_point(|s| s.velocity <= v);
        if upper == self.samples.len() {
            return last.limits();
        }
        let lo = self.samples[upper - 1];
        let hi = self.samples[upper];
        AccelLimits {
            x: blend(v, lo.velocity, hi.velocity, lo.accel_x, hi.accel_x),
            y: blend(v, lo.velocity, hi.velocity, lo.accel_y, hi.accel_y),
        }
    }

    /// The highest sample strictly slower than `v`, if any.
    pub fn next_lower_velocity(&self, v: f64) -> Option<Sample> {
        self.samples.iter().rev().find(|s| s.velocity < v).copied()
    }
}

fn blend(v: f64, v1: f64, v2: f64, a1: u32, a2: u32) -> u32 {
    let (a1, a2) = (f64::from(a1), f64::from(a2));
    ((v - v1) * (a2 - a1) / (v2 - v1) + a1).trunc() as u32
}

fn pair_axes(x_rows: &[(f64, u32)], y_rows: &[(f64, u32)]) -> Result<Vec<Sample>, ConfigError> {
    let mut unmatched: Vec<(f64, u32)> = y_rows.to_vec();
    let mut samples = Vec::with_capacity(x_rows.len());
    for &(velocity, accel_x) in x_rows {
        let Some(pos) = unmatched.iter().position(|&(v, _)| v == velocity) else {
            return Err(ConfigError::UnpairedAxis { axis: 'X', velocity });
        };
        let (_, accel_y) = unmatched.remove(pos);
        samples.push(Sample {
            velocity,
            accel_x,
            accel_y,
        });
    }
    if let Some(&(velocity, _)) = unmatched.first() {
        return Err(ConfigError::UnpairedAxis { axis: 'Y', velocity });
    }
    Ok(samples)
}
