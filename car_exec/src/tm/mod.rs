//! # Telemetry module
//!
//! Each cycle can be summarised in a [`TmFrame`], serialised as JSON and
//! wrapped in a run of `S` start markers and a run of `E` end markers, so a
//! reader joining a byte stream part way through can find the next complete
//! frame. The JSON body never contains an upper case `E`, so the first end
//! marker after the opening brace ends the frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    hw::{DriveCmd, SensorReading},
    nav_ctrl::{NavState, StatusReport},
    odom::{OdomSnapshot, WheelRates},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const START_MARKER: char = 'S';
const END_MARKER: char = 'E';

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Telemetry for one control cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmFrame {
    pub cycle: u64,

    pub time_s: f64,

    pub sensor: SensorReading,

    pub state: NavState,

    pub turn_count: u32,

    pub odom: OdomSnapshot,

    pub pos: Option<f64>,

    pub curve: bool,

    /// Signed left wheel duty, negative when reversing
    pub left: i32,

    /// Signed right wheel duty, negative when reversing
    pub right: i32,

    pub rates: WheelRates,
}

/// Writes framed telemetry to a file.
pub struct TmWriter {
    writer: BufWriter<File>,
    start_len: usize,
    end_len: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmError {
    #[error("Could not serialise the telemetry frame: {0}")]
    SerialiseError(serde_json::Error),

    #[error("Could not deserialise the telemetry frame: {0}")]
    DeserialiseError(serde_json::Error),

    #[error("Could not write telemetry: {0}")]
    IoError(std::io::Error),

    #[error("Frame markers must be at least one character long")]
    InvalidMarkerLength,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TmFrame {
    /// Build a frame from the data of one cycle.
    pub fn new(
        cycle: u64,
        time_s: f64,
        sensor: SensorReading,
        report: &StatusReport,
        cmd: &DriveCmd,
        rates: WheelRates,
    ) -> Self {
        Self {
            cycle,
            time_s,
            sensor,
            state: report.state,
            turn_count: report.turn_count,
            odom: report.odom,
            pos: report.pos,
            curve: report.drive.map_or(false, |d| d.curve),
            left: cmd.left.signed_duty(),
            right: cmd.right.signed_duty(),
            rates,
        }
    }

    /// Serialise the frame, wrapped in start and end markers.
    pub fn encode(&self, start_len: usize, end_len: usize) -> Result<String, TmError> {
        if start_len == 0 || end_len == 0 {
            return Err(TmError::InvalidMarkerLength);
        }

        let body = serde_json::to_string(self).map_err(TmError::SerialiseError)?;

        let mut out = String::with_capacity(start_len + body.len() + end_len);
        out.extend(std::iter::repeat(START_MARKER).take(start_len));
        out.push_str(&body);
        out.extend(std::iter::repeat(END_MARKER).take(end_len));

        Ok(out)
    }
}

impl TmWriter {
    /// Create a new writer, truncating any existing file at `path`.
    pub fn new<P: AsRef<Path>>(path: P, start_len: usize, end_len: usize) -> Result<Self, TmError> {
        if start_len == 0 || end_len == 0 {
            return Err(TmError::InvalidMarkerLength);
        }

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .map_err(TmError::IoError)?;

        Ok(Self {
            writer: BufWriter::new(file),
            start_len,
            end_len,
        })
    }

    /// Append one framed line.
    pub fn write(&mut self, frame: &TmFrame) -> Result<(), TmError> {
        let encoded = frame.encode(self.start_len, self.end_len)?;
        writeln!(self.writer, "{}", encoded).map_err(TmError::IoError)
    }

    pub fn flush(&mut self) -> Result<(), TmError> {
        self.writer.flush().map_err(TmError::IoError)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Find and decode the first complete frame in `input`.
///
/// Returns the frame and the number of bytes consumed up to the end of its
/// first end marker, or `None` if no complete frame is present yet.
pub fn parse_frame(input: &str) -> Result<Option<(TmFrame, usize)>, TmError> {
    let start = match input.find(START_MARKER) {
        Some(i) => i,
        None => return Ok(None),
    };

    let body_start = match input[start..].find('{') {
        Some(i) => start + i,
        None => return Ok(None),
    };

    let body_end = match input[body_start..].find(END_MARKER) {
        Some(i) => body_start + i,
        None => return Ok(None),
    };

    let frame = serde_json::from_str(&input[body_start..body_end])
        .map_err(TmError::DeserialiseError)?;

    Ok(Some((frame, body_end + 1)))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
