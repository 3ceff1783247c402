// Streaming VCD encoder.
//
// VcdEncoder turns packed logic samples into VCD value-change text:
//   - The header is rendered once at construction and handed out as the
//     prefix of the first chunk
//   - The first sample is written in full inside a `$dumpvars` block
//   - Later samples are written only when they differ from the previous
//     one, and then only the probes that changed
//   - Constant memory: one retained sample of `unit_size` bytes

use std::io::Write;

use chrono::{Local, NaiveDateTime};
use log::{debug, trace, warn};

use super::bits::{bytes_for_bits, get_bit, level_char};
use super::header::{Header, Timescale};
use super::registry::{ChannelSpec, Probe, ProbeRegistry, RegistryError};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the VCD encoder.
#[derive(Debug, Clone)]
pub struct VcdOptions {
    /// Tool name for the `$version` and `$scope` lines.
    pub tool_name: String,
    /// Tool version for the `$version` line.
    pub tool_version: String,
    /// Fixed `$date`. `None` uses the local time at construction.
    pub date: Option<NaiveDateTime>,
    /// Bytes per sample. `None` derives it from the channel count.
    pub unit_size: Option<usize>,
}

impl Default for VcdOptions {
    fn default() -> Self {
        Self {
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            date: None,
            unit_size: None,
        }
    }
}

/// What the acquisition source reports before streaming starts.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionInfo {
    /// All physical channels in order; position = bit offset in a sample.
    pub channels: Vec<ChannelSpec>,
    /// Sample rate in Hz, if the source reports one.
    pub sample_rate: Option<u64>,
}

impl AcquisitionInfo {
    pub fn new(channels: Vec<ChannelSpec>, sample_rate: Option<u64>) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn enabled_channels(&self) -> usize {
        self.channels.iter().filter(|c| c.enabled).count()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("unit size {unit_size} is too small, channels need {required} bytes")]
    UnitSizeTooSmall { unit_size: usize, required: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("sample stride must be at least one byte")]
    ZeroStride,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `VcdEncoder::finish()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Samples consumed.
    pub samples_in: u64,
    /// Samples that produced a timestamp block.
    pub samples_emitted: u64,
    /// Bytes of VCD text produced, header included.
    pub bytes_out: u64,
    /// Number of declared VCD variables.
    pub probes: usize,
}

// ---------------------------------------------------------------------------
// VcdEncoder
// ---------------------------------------------------------------------------

/// Where the encoder is in the value-change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No sample seen yet; the next one opens `$dumpvars`.
    AwaitingFirstSample,
    /// Only changes are written.
    Streaming,
}

/// Streaming VCD encoder for one capture session.
///
/// # Example
/// ```no_run
/// use logic2vcd::vcd::{AcquisitionInfo, ChannelSpec, VcdEncoder, VcdOptions};
///
/// let info = AcquisitionInfo::new(
///     vec![ChannelSpec::enabled("clk"), ChannelSpec::enabled("data")],
///     Some(1_000_000),
/// );
/// let mut enc = VcdEncoder::new(&info, VcdOptions::default()).unwrap();
/// let text = enc.process_frame(&[0b01, 0b11, 0b11, 0b10], 1).unwrap();
/// assert!(text.starts_with("$date"));
/// let stats = enc.finish();
/// assert_eq!(stats.samples_in, 4);
/// ```
#[derive(Debug)]
pub struct VcdEncoder {
    registry: ProbeRegistry,
    /// Header text not yet handed out.
    header: Option<String>,
    phase: Phase,
    timescale: Timescale,
    sample_rate: Option<u64>,
    unit_size: usize,
    previous: Vec<u8>,
    /// Holds a sample whose stride differs from `unit_size`.
    scratch: Vec<u8>,
    sample_count: u64,
    samples_emitted: u64,
    bytes_out: u64,
    stride_warned: bool,
}

impl VcdEncoder {
    /// Build the probe registry and header for a new capture.
    pub fn new(info: &AcquisitionInfo, opts: VcdOptions) -> Result<Self, ConfigError> {
        let registry = ProbeRegistry::from_channels(&info.channels)?;

        let required = registry
            .max_bit_position()
            .map_or(0, |pos| bytes_for_bits(pos + 1));
        let unit_size = match opts.unit_size {
            Some(unit_size) if unit_size < required => {
                return Err(ConfigError::UnitSizeTooSmall {
                    unit_size,
                    required,
                });
            }
            Some(unit_size) => unit_size,
            None => bytes_for_bits(info.channels.len()),
        };

        let header = Header {
            date: opts.date.unwrap_or_else(|| Local::now().naive_local()),
            tool_name: &opts.tool_name,
            tool_version: &opts.tool_version,
            sample_rate: info.sample_rate,
            enabled_channels: info.enabled_channels(),
            total_channels: info.channels.len(),
            registry: &registry,
        };
        let timescale = header.timescale();
        let header = header.to_string();

        debug!(
            "vcd encoder: {} probes, unit size {unit_size}, timescale {timescale}",
            registry.len()
        );

        Ok(Self {
            registry,
            header: Some(header),
            phase: Phase::AwaitingFirstSample,
            timescale,
            sample_rate: info.sample_rate,
            unit_size,
            previous: vec![0u8; unit_size],
            scratch: vec![0u8; unit_size],
            sample_count: 0,
            samples_emitted: 0,
            bytes_out: 0,
            stride_warned: false,
        })
    }

    /// Encode every whole sample in `frame` and return the VCD text.
    ///
    /// The first call's output starts with the header. Trailing bytes that
    /// do not fill a whole `stride` are ignored.
    pub fn process_frame(&mut self, frame: &[u8], stride: usize) -> Result<String, EncodeError> {
        if stride == 0 {
            return Err(EncodeError::ZeroStride);
        }
        if stride != self.unit_size && !self.stride_warned {
            warn!(
                "sample stride {stride} differs from unit size {}, samples will be resized",
                self.unit_size
            );
            self.stride_warned = true;
        }

        let mut out = self.header.take().unwrap_or_default();
        for sample in frame.chunks_exact(stride) {
            self.encode_sample(sample, &mut out);
        }

        trace!(
            "frame: {} bytes in, {} bytes out, {} samples total",
            frame.len(),
            out.len(),
            self.sample_count
        );

        self.bytes_out += out.len() as u64;
        Ok(out)
    }

    /// Like `process_frame()`, but writes the text to `writer`.
    ///
    /// Returns the number of bytes written.
    pub fn write_frame<W: Write>(
        &mut self,
        writer: &mut W,
        frame: &[u8],
        stride: usize,
    ) -> Result<usize, EncodeError> {
        let chunk = self.process_frame(frame, stride)?;
        writer.write_all(chunk.as_bytes())?;
        Ok(chunk.len())
    }

    /// End the session and release its buffers.
    pub fn finish(self) -> EncodeStats {
        debug!(
            "vcd encoder finished: {} samples in, {} emitted",
            self.sample_count, self.samples_emitted
        );
        EncodeStats {
            samples_in: self.sample_count,
            samples_emitted: self.samples_emitted,
            bytes_out: self.bytes_out,
            probes: self.registry.len(),
        }
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    pub fn timescale(&self) -> Timescale {
        self.timescale
    }

    pub fn unit_size(&self) -> usize {
        self.unit_size
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the header has not been handed out yet.
    pub fn header_pending(&self) -> bool {
        self.header.is_some()
    }

    /// Samples consumed so far.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Samples that produced a timestamp block so far.
    pub fn samples_emitted(&self) -> u64 {
        self.samples_emitted
    }

    /// Bytes of VCD text returned so far.
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Encode a single sample, appending its block (if any) to `out`.
    fn encode_sample(&mut self, sample: &[u8], out: &mut String) {
        self.sample_count += 1;
        let first = self.phase == Phase::AwaitingFirstSample;

        let current: &[u8] = if sample.len() == self.unit_size {
            sample
        } else {
            let n = sample.len().min(self.unit_size);
            self.scratch[..n].copy_from_slice(&sample[..n]);
            self.scratch[n..].fill(0);
            &self.scratch
        };

        if !first && current == self.previous.as_slice() {
            return;
        }

        out.push('#');
        out.push_str(&timestamp(self.sample_count, self.sample_rate, self.timescale).to_string());
        out.push('\n');

        if first {
            out.push_str("$dumpvars\n");
        }
        for probe in &self.registry {
            if first || probe_changed(probe, current, &self.previous) {
                render_probe(probe, current, out);
            }
        }
        if first {
            out.push_str("$end\n");
            self.phase = Phase::Streaming;
        }

        self.previous.copy_from_slice(current);
        self.samples_emitted += 1;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Timestamp of the 1-based `sample_index` in `timescale` ticks:
/// `floor(sample_index / sample_rate * period)`, computed exactly.
///
/// Without a known sample rate the sample index itself is used.
pub fn timestamp(sample_index: u64, sample_rate: Option<u64>, timescale: Timescale) -> u64 {
    match sample_rate {
        Some(rate) if rate > 0 => {
            let ticks = u128::from(sample_index) * u128::from(timescale.period()) / u128::from(rate);
            u64::try_from(ticks).unwrap_or(u64::MAX)
        }
        _ => sample_index,
    }
}

/// Whether any bit of `probe` differs between two samples.
fn probe_changed(probe: &Probe, current: &[u8], previous: &[u8]) -> bool {
    probe
        .bits()
        .iter()
        .any(|b| get_bit(current, b.sample) != get_bit(previous, b.sample))
}

/// Append one value line: `<level><symbol>` for scalars,
/// `b<bits> <symbol>` for vectors (highest bit first, `x` for gaps).
fn render_probe(probe: &Probe, sample: &[u8], out: &mut String) {
    if probe.is_vector() {
        out.push('b');
        let mut bits = probe.bits().iter().copied().peekable();
        for pos in (0..probe.span()).rev() {
            match bits.peek() {
                Some(b) if b.bit == pos => {
                    let level = get_bit(sample, b.sample);
                    // First declaration of a duplicated bit wins.
                    while bits.next_if(|b| b.bit == pos).is_some() {}
                    out.push(level_char(level));
                }
                _ => out.push('x'),
            }
        }
        out.push(' ');
    } else {
        let level = probe
            .bits()
            .first()
            .is_some_and(|b| get_bit(sample, b.sample));
        out.push(level_char(level));
    }
    out.push(probe.symbol());
    out.push('\n');
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
