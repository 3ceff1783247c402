// File-level I/O helpers for VCD conversion.
//
// Provides `convert_stream()` and `convert_file()` convenience functions that
// feed a raw packed-sample capture through the encoder with proper buffered
// I/O. Optionally computes a streaming SHA-256 of the emitted VCD text
// (feature-gated behind `file-io`) and gzip-compresses the output
// (feature-gated behind `gzip`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, warn};
#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::vcd::{AcquisitionInfo, ConfigError, EncodeError, VcdEncoder, VcdOptions};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `convert_stream()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Raw capture bytes read.
    pub bytes_in: u64,
    /// VCD text bytes written (before any compression).
    pub bytes_out: u64,
    /// Trailing bytes that did not fill a whole sample.
    pub trailing_bytes: u64,
}

/// Statistics returned by `convert_file()`.
#[derive(Debug, Clone)]
pub struct ConvertStats {
    /// Capture file size in bytes.
    pub input_size: u64,
    /// Output file size in bytes (compressed size for gzip output).
    pub output_size: u64,
    /// VCD text bytes produced.
    pub vcd_size: u64,
    /// Samples read from the capture.
    pub samples_in: u64,
    /// Samples that produced a timestamp block.
    pub samples_emitted: u64,
    /// Declared VCD variables.
    pub probes: usize,
    /// SHA-256 of the VCD text (if `file-io` feature is enabled).
    pub vcd_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How the output file is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputCompression {
    #[default]
    None,
    #[cfg(feature = "gzip")]
    Gzip { level: u32 },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Encoder configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Encoding error.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// convert_stream
// ---------------------------------------------------------------------------

/// Stream a raw capture from `reader` through `encoder` into `writer`.
///
/// Input is read in chunks that are whole multiples of the encoder's unit
/// size, so no sample is split across frames. Bytes left over at EOF that
/// do not fill a sample are dropped. The header is written even for an
/// empty capture.
pub fn convert_stream<R: Read, W: Write>(
    mut reader: R,
    writer: &mut W,
    encoder: &mut VcdEncoder,
) -> Result<StreamStats, IoError> {
    let stride = encoder.unit_size().max(1);
    let mut buf = vec![0u8; (BUF_SIZE / stride).max(1) * stride];
    let mut filled = 0usize;
    let mut stats = StreamStats::default();

    loop {
        let n = match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        stats.bytes_in += n as u64;
        filled += n;

        let whole = filled - filled % stride;
        if whole > 0 {
            stats.bytes_out += encoder.write_frame(writer, &buf[..whole], stride)? as u64;
            buf.copy_within(whole..filled, 0);
            filled -= whole;
        }
    }

    if encoder.header_pending() {
        stats.bytes_out += encoder.write_frame(writer, &[], stride)? as u64;
    }
    if filled > 0 {
        warn!("ignoring {filled} trailing bytes (unit size {stride})");
        stats.trailing_bytes = filled as u64;
    }

    Ok(stats)
}

// ---------------------------------------------------------------------------
// convert_file
// ---------------------------------------------------------------------------

/// Convert a raw capture file into a VCD file at `output_path`.
///
/// The capture is streamed through a `BufReader`; the output uses
/// `BufWriter`, optionally wrapped in a gzip encoder.
///
/// When the `file-io` feature is enabled, a SHA-256 of the VCD text is
/// computed incrementally as it is written.
pub fn convert_file(
    input_path: &Path,
    output_path: &Path,
    info: &AcquisitionInfo,
    opts: VcdOptions,
    compression: OutputCompression,
) -> Result<ConvertStats, IoError> {
    let mut encoder = VcdEncoder::new(info, opts)?;

    let input_file = File::open(input_path)?;
    let input_size = input_file.metadata()?.len();
    let reader = BufReader::with_capacity(BUF_SIZE, input_file);

    let output_file = File::create(output_path)?;
    let writer = BufWriter::with_capacity(BUF_SIZE, output_file);

    let (writer, vcd_sha256) = match compression {
        OutputCompression::None => {
            let mut writer = writer;
            let digest = hashed_convert(reader, &mut writer, &mut encoder)?;
            (writer, digest)
        }
        #[cfg(feature = "gzip")]
        OutputCompression::Gzip { level } => {
            let mut gz =
                flate2::write::GzEncoder::new(writer, flate2::Compression::new(level.min(9)));
            let digest = hashed_convert(reader, &mut gz, &mut encoder)?;
            (gz.finish()?, digest)
        }
    };

    let output_size = writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .metadata()?
        .len();

    let stats = encoder.finish();
    debug!(
        "converted {} -> {}: {} samples, {} bytes of VCD",
        input_path.display(),
        output_path.display(),
        stats.samples_in,
        stats.bytes_out
    );

    Ok(ConvertStats {
        input_size,
        output_size,
        vcd_size: stats.bytes_out,
        samples_in: stats.samples_in,
        samples_emitted: stats.samples_emitted,
        probes: stats.probes,
        vcd_sha256,
    })
}

/// Run `convert_stream()`, hashing the VCD text when `file-io` is enabled.
fn hashed_convert<R: Read, W: Write>(
    reader: R,
    writer: &mut W,
    encoder: &mut VcdEncoder,
) -> Result<Option<[u8; 32]>, IoError> {
    #[cfg(feature = "file-io")]
    {
        let mut hasher = sha2::Sha256::new();
        let mut hashing_writer = HashingWriter {
            inner: writer,
            hasher: &mut hasher,
        };
        convert_stream(reader, &mut hashing_writer, encoder)?;
        hashing_writer.flush()?;
        Ok(Some(hasher.finalize().into()))
    }

    #[cfg(not(feature = "file-io"))]
    {
        convert_stream(reader, writer, encoder)?;
        writer.flush()?;
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Hashing writer (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Lowercase hex rendering of a digest.
pub fn hex_digest(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
