// VCD preamble: metadata, timescale and variable declarations.
//
// Emitted once per capture, ahead of the first value-change block.

use std::fmt;

use chrono::NaiveDateTime;

use super::registry::ProbeRegistry;

// ---------------------------------------------------------------------------
// Frequency constants
// ---------------------------------------------------------------------------

pub const KHZ: u64 = 1_000;
pub const MHZ: u64 = 1_000_000;
pub const GHZ: u64 = 1_000_000_000;

/// `ctime(3)` layout used on the `$date` line.
pub const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

// ---------------------------------------------------------------------------
// Timescale
// ---------------------------------------------------------------------------

/// VCD time unit chosen from the sample rate.
///
/// VCD only accepts 1/10/100 multiples of s..fs, so timestamps are scaled
/// up to the smallest unit that keeps them integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timescale {
    Nanoseconds,
    Microseconds,
    Milliseconds,
}

impl Timescale {
    /// Pick the unit for `sample_rate` (Hz). Thresholds are exclusive: exactly
    /// 1 MHz selects microseconds, exactly 1 kHz selects milliseconds.
    pub fn for_sample_rate(sample_rate: Option<u64>) -> Self {
        match sample_rate.unwrap_or(0) {
            r if r > MHZ => Self::Nanoseconds,
            r if r > KHZ => Self::Microseconds,
            _ => Self::Milliseconds,
        }
    }

    /// Ticks per second.
    pub fn period(self) -> u64 {
        match self {
            Self::Nanoseconds => GHZ,
            Self::Microseconds => MHZ,
            Self::Milliseconds => KHZ,
        }
    }

    /// Text for the `$timescale` line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nanoseconds => "1 ns",
            Self::Microseconds => "1 us",
            Self::Milliseconds => "1 ms",
        }
    }
}

impl fmt::Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable sample rate: the largest unit that divides it exactly.
pub fn samplerate_string(rate: u64) -> String {
    if rate != 0 && rate % GHZ == 0 {
        format!("{} GHz", rate / GHZ)
    } else if rate != 0 && rate % MHZ == 0 {
        format!("{} MHz", rate / MHZ)
    } else if rate != 0 && rate % KHZ == 0 {
        format!("{} kHz", rate / KHZ)
    } else {
        format!("{rate} Hz")
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Everything the preamble depends on. Rendering is pure, so the same
/// inputs always produce the same text.
#[derive(Debug, Clone)]
pub struct Header<'a> {
    pub date: NaiveDateTime,
    pub tool_name: &'a str,
    pub tool_version: &'a str,
    pub sample_rate: Option<u64>,
    pub enabled_channels: usize,
    pub total_channels: usize,
    pub registry: &'a ProbeRegistry,
}

impl Header<'_> {
    pub fn timescale(&self) -> Timescale {
        Timescale::for_sample_rate(self.sample_rate)
    }
}

impl fmt::Display for Header<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "$date {} $end", self.date.format(DATE_FORMAT))?;
        writeln!(f, "$version {} {} $end", self.tool_name, self.tool_version)?;

        if let Some(rate) = self.sample_rate {
            write!(
                f,
                "$comment\n  Acquisition with {}/{} probes at {}\n$end\n",
                self.enabled_channels,
                self.total_channels,
                samplerate_string(rate)
            )?;
        }

        writeln!(f, "$timescale {} $end", self.timescale())?;
        writeln!(f, "$scope module {} $end", self.tool_name)?;

        for probe in self.registry {
            writeln!(
                f,
                "$var wire {} {} {} $end",
                probe.width(),
                probe.symbol(),
                probe.name()
            )?;
        }

        f.write_str("$upscope $end\n$enddefinitions $end\n")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
