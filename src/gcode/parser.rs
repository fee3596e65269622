//! Word-level classification of single G-code lines.
//!
//! Only two shapes matter to the rewriter: a linear move carrying a feed rate
//! (`G1 ... F<n>`) and an acceleration override (`M201`). Everything else is
//! reported as [`Instruction::Passthrough`] and must be copied unchanged.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])([^A-Z\s;]*)").expect("word pattern is valid"));

/// A letter and its raw value, with the byte span of the value in the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Word<'a> {
    pub letter: char,
    pub value: &'a str,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value '{value}' for {letter} word")]
pub struct WordError {
    pub letter: char,
    pub value: String,
}

/// A feed-rate move extracted from one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    pub feed_mm_per_min: f64,
    pub x_distance: Option<f64>,
    pub y_distance: Option<f64>,
    /// Byte range of the feed value, for rewriting it in place.
    pub feed_span: Range<usize>,
}

impl Move {
    pub fn velocity_mm_per_sec(&self) -> f64 {
        self.feed_mm_per_min / 60.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Move(Move),
    AccelOverride { x: Option<f64>, y: Option<f64> },
    Passthrough,
}

/// Split a line into words, ignoring anything after `;`.
pub fn words(line: &str) -> Vec<Word<'_>> {
    let code = line.split_once(';').map_or(line, |(code, _)| code);
    WORD.captures_iter(code)
        .filter_map(|caps| {
            let letter = caps.get(1)?.as_str().chars().next()?;
            let value = caps.get(2)?;
            Some(Word {
                letter,
                value: value.as_str(),
                span: value.range(),
            })
        })
        .collect()
}

pub fn classify(line: &str) -> Result<Instruction, WordError> {
    let words = words(line);
    // A leading line number is not the command.
    let Some(command) = words.iter().position(|w| w.letter != 'N') else {
        return Ok(Instruction::Passthrough);
    };
    let args = &words[command + 1..];
    match (words[command].letter, words[command].value) {
        ('G', "1" | "01") => parse_move(args),
        ('M', "201") => parse_override(args),
        _ => Ok(Instruction::Passthrough),
    }
}

fn parse_move(args: &[Word<'_>]) -> Result<Instruction, WordError> {
    let mut feed = None;
    let mut x_distance = None;
    let mut y_distance = None;
    for word in args {
        match word.letter {
            'F' => {
                let value = number(word)?;
                if value < 0.0 {
                    return Err(word_error(word));
                }
                feed = Some((value, word.span.clone()));
            }
            'X' => x_distance = Some(number(word)?),
            'Y' => y_distance = Some(number(word)?),
            _ => {}
        }
    }
    Ok(match feed {
        Some((feed_mm_per_min, feed_span)) => Instruction::Move(Move {
            feed_mm_per_min,
            x_distance,
            y_distance,
            feed_span,
        }),
        None => Instruction::Passthrough,
    })
}

fn parse_override(args: &[Word<'_>]) -> Result<Instruction, WordError> {
    let mut x = None;
    let mut y = None;
    for word in args {
        match word.letter {
            'X' => x = Some(number(word)?),
            'Y' => y = Some(number(word)?),
            _ => {}
        }
    }
    Ok(Instruction::AccelOverride { x, y })
}

fn number(word: &Word<'_>) -> Result<f64, WordError> {
    word.value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| word_error(word))
}

fn word_error(word: &Word<'_>) -> WordError {
    WordError {
        letter: word.letter,
        value: word.value.to_string(),
    }
}
