//! Rewrites feed-rate moves so their velocity stays within the table's limits.
//!
//! Each `G1 ... F<n>` move is checked against the acceleration it would demand
//! at its commanded velocity (`v² / distance` per axis). While the demand is
//! above the table's limit, the velocity steps down through the table. The move
//! is then emitted with the reduced feed, followed by one limit-setting command.

use std::io::{BufRead, Write};

use serde::Serialize;
use thiserror::Error;

use super::parser::{self, Instruction, Move};
use super::RewriteError;
use crate::motion::{AccelLimits, AccelerationTable};

/// Last values seen in an `M201` instruction. Tracked, never applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccelerationOverride {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl AccelerationOverride {
    /// Absent fields keep their previous value.
    pub fn update(&mut self, x: Option<f64>, y: Option<f64>) {
        if x.is_some() {
            self.x = x;
        }
        if y.is_some() {
            self.y = y;
        }
    }
}

/// Counters for one processed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub lines: usize,
    pub moves: usize,
    pub reduced_moves: usize,
    pub overrides: usize,
}

/// Outcome of the velocity reduction search for one move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    /// Velocity in mm/s.
    pub velocity: f64,
    pub limits: AccelLimits,
    /// Number of table steps taken below the commanded velocity.
    pub steps: usize,
    /// False when the table ran out while the demand was still too high.
    pub satisfied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("zero {axis} distance in move")]
pub struct ZeroDistance {
    pub axis: char,
}

/// Find the velocity at which the move's demand fits the table.
///
/// Starts from the interpolated limits at the commanded velocity and walks down
/// the table's sample velocities. Every step visits a strictly lower sample, so
/// the search ends after at most one step per sample.
pub fn reduce_velocity(table: &AccelerationTable, mv: &Move) -> Result<Reduction, ZeroDistance> {
    for (axis, distance) in [('X', mv.x_distance), ('Y', mv.y_distance)] {
        if distance == Some(0.0) {
            return Err(ZeroDistance { axis });
        }
    }

    let mut velocity = mv.velocity_mm_per_sec();
    let mut limits = table.interpolate(velocity);
    let mut steps = 0;
    loop {
        let over_x = exceeds(velocity, mv.x_distance, limits.x);
        let over_y = exceeds(velocity, mv.y_distance, limits.y);
        if !over_x && !over_y {
            return Ok(Reduction { velocity, limits, steps, satisfied: true });
        }
        match table.next_lower_velocity(velocity) {
            Some(sample) => {
                tracing::debug!(
                    "Reducing {:.1} -> {:.1} mm/s (over limit: x={}, y={})",
                    velocity,
                    sample.velocity,
                    over_x,
                    over_y
                );
                velocity = sample.velocity;
                limits = sample.limits();
                steps += 1;
            }
            None => return Ok(Reduction { velocity, limits, steps, satisfied: false }),
        }
    }
}

// No distance on an axis means no demand on it.
fn exceeds(velocity: f64, distance: Option<f64>, limit: u32) -> bool {
    distance.is_some_and(|d| velocity.powi(2) / d > f64::from(limit))
}

/// The command that applies `limits` on the printer.
pub fn limit_instruction(table: &AccelerationTable, limits: AccelLimits) -> String {
    if table.per_axis_mode() {
        format!("SET_KINEMATICS_LIMIT X_ACCEL={} Y_ACCEL={}", limits.x, limits.y)
    } else {
        format!("SET_VELOCITY_LIMIT ACCEL={}", limits.y)
    }
}

pub struct StreamRewriter<'t> {
    table: &'t AccelerationTable,
    acceleration_override: AccelerationOverride,
    stats: RewriteStats,
}

impl<'t> StreamRewriter<'t> {
    pub fn new(table: &'t AccelerationTable) -> Self {
        Self {
            table,
            acceleration_override: AccelerationOverride::default(),
            stats: RewriteStats::default(),
        }
    }

    pub fn acceleration_override(&self) -> AccelerationOverride {
        self.acceleration_override
    }

    pub fn stats(&self) -> RewriteStats {
        self.stats
    }

    /// Rewrite every line of `input` into `output`, in order.
    ///
    /// Lines that are neither feed-rate moves nor overrides are copied byte for
    /// byte, terminators included. On error the lines already written stay in
    /// `output`.
    pub fn process<R: BufRead, W: Write>(&mut self, mut input: R, output: &mut W) -> Result<RewriteStats, RewriteError> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            self.stats.lines += 1;
            self.rewrite_line(&line, self.stats.lines, output)?;
        }
        output.flush()?;
        Ok(self.stats)
    }

    fn rewrite_line<W: Write>(&mut self, raw: &[u8], line_no: usize, output: &mut W) -> Result<(), RewriteError> {
        let Ok(text) = std::str::from_utf8(raw) else {
            output.write_all(raw)?;
            return Ok(());
        };
        let instruction = parser::classify(text).map_err(|e| RewriteError::LineMalformed {
            line: line_no,
            reason: e.to_string(),
        })?;
        match instruction {
            Instruction::Move(mv) => self.emit_move(text, &mv, line_no, output)?,
            Instruction::AccelOverride { x, y } => {
                self.acceleration_override.update(x, y);
                self.stats.overrides += 1;
                output.write_all(raw)?;
            }
            Instruction::Passthrough => output.write_all(raw)?,
        }
        Ok(())
    }

    fn emit_move<W: Write>(&mut self, text: &str, mv: &Move, line_no: usize, output: &mut W) -> Result<(), RewriteError> {
        let reduction = reduce_velocity(self.table, mv).map_err(|e| RewriteError::ArithmeticFault {
            line: line_no,
            reason: e.to_string(),
        })?;
        if !reduction.satisfied {
            tracing::warn!(
                "Line {}: no table velocity below {:.1} mm/s satisfies the move, keeping it",
                line_no,
                reduction.velocity
            );
        }

        // Only table velocities go back through mm/s; an untouched feed is kept as parsed.
        let feed = if reduction.steps == 0 {
            mv.feed_mm_per_min.floor() as u64
        } else {
            (reduction.velocity * 60.0).floor() as u64
        };
        let (body, terminator) = split_terminator(text);
        let separator = if terminator.is_empty() { "\n" } else { terminator };
        write!(
            output,
            "{}{}{}{}",
            &body[..mv.feed_span.start],
            feed,
            &body[mv.feed_span.end..],
            separator
        )?;
        write!(output, "{}{}", limit_instruction(self.table, reduction.limits), terminator)?;

        self.stats.moves += 1;
        if reduction.steps > 0 {
            self.stats.reduced_moves += 1;
        }
        Ok(())
    }
}

fn split_terminator(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\n', '\r']);
    (body, &line[body.len()..])
}
