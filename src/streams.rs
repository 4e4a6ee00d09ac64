//! File arguments, where `-` stands for standard input or output.

use crate::error::{FlameError, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

/// Name that means stdin or stdout instead of a file.
pub const STANDARD_STREAM: &str = "-";

/// Open `name` for reading.
pub fn open_input(name: &str) -> Result<Box<dyn Read>> {
    if name == STANDARD_STREAM {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    File::open(name)
        .map(|f| Box::new(BufReader::new(f)) as Box<dyn Read>)
        .map_err(|e| FlameError::io("open", name, e))
}

/// Create (or truncate) `name` for writing.
pub fn create_output(name: &str) -> Result<Box<dyn Write>> {
    if name == STANDARD_STREAM {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    File::create(name)
        .map(|f| Box::new(BufWriter::new(f)) as Box<dyn Write>)
        .map_err(|e| FlameError::io("create", name, e))
}
