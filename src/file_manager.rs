// src/file_manager.rs - Input/output files for one rewrite run
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::gcode::{RewriteError, RewriteStats, StreamRewriter};
use crate::motion::AccelerationTable;

#[derive(Debug, Clone)]
pub struct FileManager {
    suffix: String,
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new("_parsed")
    }
}

impl FileManager {
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
        }
    }

    /// Sibling of `input` with the suffix inserted before the extension.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut name = format!("{}{}", stem, self.suffix);
        if let Some(ext) = input.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        input.with_file_name(name)
    }

    /// Rewrite `input` into `output` against `table`.
    ///
    /// The input is opened before the output is created, so a missing input
    /// leaves nothing behind. Both files are closed when this returns.
    pub fn rewrite_file(
        &self,
        input: &Path,
        output: &Path,
        table: &AccelerationTable,
    ) -> Result<RewriteStats, RewriteError> {
        let source = File::open(input).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RewriteError::InputNotFound {
                    path: input.display().to_string(),
                }
            } else {
                RewriteError::Io(e)
            }
        })?;
        if same_file(input, output) {
            return Err(RewriteError::OutputIsInput {
                path: output.display().to_string(),
            });
        }

        tracing::info!("Reading G-code file: {}", input.display());
        let mut writer = BufWriter::new(File::create(output)?);
        let mut rewriter = StreamRewriter::new(table);
        match rewriter.process(BufReader::new(source), &mut writer) {
            Ok(stats) => {
                tracing::info!(
                    "Wrote {}: {} lines, {} moves, {} reduced",
                    output.display(),
                    stats.lines,
                    stats.moves,
                    stats.reduced_moves
                );
                Ok(stats)
            }
            Err(e) => {
                // Lines before the failing one stay on disk.
                if let Err(flush_err) = writer.flush() {
                    tracing::warn!("Failed to flush partial output {}: {}", output.display(), flush_err);
                }
                tracing::error!("Rewriting {} stopped: {}", input.display(), e);
                Err(e)
            }
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
