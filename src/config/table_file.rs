//! Parser for the acceleration table the firmware saves into its config file.
//!
//! Every relevant line carries the `#*#` prefix. Labeled sections hold one axis
//! each. A bare `velocity, accel` row opens the unlabeled joint section, whose
//! rows apply to both axes. Every section ends at an `End of` line; other saved
//! config content outside a section is skipped.
//!
//! ```text
//! #*# Factor in %: 100
//! #*# Axis: X
//! #*# 100, 5000
//! #*# 200, 3500
//! #*# End of Axis: X
//! #*# Axis: Y
//! #*# 100, 4000
//! #*# 200, 3000
//! #*# End of Axis: Y
//! ```

use std::path::Path;

use super::ConfigError;

pub const DEFAULT_FACTOR_PERCENT: u32 = 100;

const LINE_PREFIX: &str = "#*#";
const FACTOR_KEY: &str = "Factor in %:";
const AXIS_KEY: &str = "Axis:";
const SECTION_END: &str = "End of";

/// One table row, tagged by the section it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Row {
    AxisX { velocity: f64, accel: u32 },
    AxisY { velocity: f64, accel: u32 },
    Joint { velocity: f64, accel: u32 },
}

/// Everything read from the table file in a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub rows: Vec<Row>,
    /// Scaling percentage saved alongside the table. Parsed but never applied.
    pub factor_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    AxisX,
    AxisY,
    Joint,
}

/// Read and parse the table file at `path`.
pub fn load_table_config(path: &Path) -> Result<TableConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            tracing::error!("Failed to read acceleration table '{}': {}", path.display(), e);
            ConfigError::Io(e)
        }
    })?;
    let config = parse_table_config(&contents)?;
    tracing::info!(
        "Loaded {} acceleration rows from {} (factor {}%)",
        config.rows.len(),
        path.display(),
        config.factor_percent
    );
    Ok(config)
}

pub fn parse_table_config(contents: &str) -> Result<TableConfig, ConfigError> {
    let mut rows = Vec::new();
    let mut factor_percent = DEFAULT_FACTOR_PERCENT;
    let mut section = None;

    for (index, raw) in contents.lines().enumerate() {
        let line = index + 1;
        let Some(body) = raw.trim().strip_prefix(LINE_PREFIX) else {
            continue;
        };
        let body = body.trim();
        if body.is_empty() {
            continue;
        }

        if let Some(value) = body.strip_prefix(FACTOR_KEY) {
            let value = value.trim();
            factor_percent = value.parse().map_err(|_| ConfigError::Malformed {
                line,
                reason: format!("invalid factor '{}'", value),
            })?;
        } else if body.starts_with(SECTION_END) {
            section = None;
        } else if let Some(axis) = body.strip_prefix(AXIS_KEY) {
            section = Some(match axis.trim() {
                "X" => Section::AxisX,
                "Y" => Section::AxisY,
                other => {
                    return Err(ConfigError::Malformed {
                        line,
                        reason: format!("unknown axis '{}'", other),
                    })
                }
            });
        } else if let Some(section) = section {
            let (velocity, accel) = parse_row(body, line)?;
            rows.push(match section {
                Section::AxisX => Row::AxisX { velocity, accel },
                Section::AxisY => Row::AxisY { velocity, accel },
                Section::Joint => Row::Joint { velocity, accel },
            });
        } else if let Ok((velocity, accel)) = parse_row(body, line) {
            // A bare row opens the unlabeled joint section.
            section = Some(Section::Joint);
            rows.push(Row::Joint { velocity, accel });
        }
    }

    Ok(TableConfig { rows, factor_percent })
}

fn parse_row(body: &str, line: usize) -> Result<(f64, u32), ConfigError> {
    let malformed = |reason: String| ConfigError::Malformed { line, reason };
    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    let [velocity, accel] = fields[..] else {
        return Err(malformed(format!(
            "expected 'velocity, acceleration', found {} field(s)",
            fields.len()
        )));
    };
    let velocity: f64 = velocity
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| malformed(format!("invalid velocity '{}'", velocity)))?;
    let accel: u32 = accel
        .parse()
        .map_err(|_| malformed(format!("invalid acceleration '{}'", accel)))?;
    Ok((velocity, accel))
}
