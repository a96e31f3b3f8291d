//! Streaming JSON5 parsing for scene scripts
//!
//! Supports both single-line JSONL and multi-line JSON5 formats.
//! JSON5 adds support for comments, trailing commas, and unquoted keys.

use crate::models::{SceneEntry, SceneObject, Warning};
use std::io::Read;
use thiserror::Error;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

/// Result of parsing a scene stream.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub entries: Vec<SceneEntry>,
    pub warnings: Vec<Warning>,
}

impl ParseResult {
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> + '_ {
        self.entries.iter().map(|e| &e.object)
    }
}

/// Parse a single JSON5 string into a scene object.
pub fn parse_line(line: &str, line_number: usize) -> Result<SceneObject, ParseError> {
    json5::from_str(line).map_err(|e| ParseError { message: e.to_string(), line: line_number })
}

/// Parse a stream of JSON5 objects into scene entries.
///
/// Objects may span multiple lines; an object ends when its braces and
/// brackets balance. Parsing stops at the first malformed object since the
/// next object boundary can no longer be found reliably; the failure is
/// reported as a warning.
pub fn parse_stream<R: Read>(reader: R) -> ParseResult {
    use std::io::BufRead;

    let mut result = ParseResult::default();
    let buf_reader = std::io::BufReader::new(reader);

    let mut accumulator = String::new();
    let mut start_line = 1;
    let mut current_line = 1;
    let mut brace_depth = 0i32;
    let mut bracket_depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for line in buf_reader.lines() {
        let Ok(line) = line else {
            result.warnings.push(Warning {
                message: "input is not valid UTF-8".to_string(),
                line: current_line,
            });
            return result;
        };

        if accumulator.is_empty() && line.trim().is_empty() {
            current_line += 1;
            start_line = current_line;
            continue;
        }
        // Whole-line comments between objects
        if accumulator.is_empty() && line.trim_start().starts_with("//") {
            current_line += 1;
            start_line = current_line;
            continue;
        }

        if !accumulator.is_empty() {
            accumulator.push('\n');
        }
        accumulator.push_str(&line);

        for ch in line.chars() {
            if escape_next {
                escape_next = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => brace_depth += 1,
                '}' if !in_string => brace_depth -= 1,
                '[' if !in_string => bracket_depth += 1,
                ']' if !in_string => bracket_depth -= 1,
                _ => {}
            }
        }

        if brace_depth == 0 && bracket_depth == 0 && !accumulator.trim().is_empty() {
            match json5::from_str::<SceneObject>(&accumulator) {
                Ok(object) => result.entries.push(SceneEntry { line: start_line, object }),
                Err(e) => {
                    result.warnings.push(Warning { message: e.to_string(), line: start_line });
                    return result;
                }
            }
            accumulator.clear();
            start_line = current_line + 1;
            in_string = false;
            escape_next = false;
        }

        current_line += 1;
    }

    if !accumulator.trim().is_empty() {
        match json5::from_str::<SceneObject>(&accumulator) {
            Ok(object) => result.entries.push(SceneEntry { line: start_line, object }),
            Err(e) => {
                result.warnings.push(Warning { message: e.to_string(), line: start_line })
            }
        }
    }

    result
}
