// Command-line front end for logic2vcd.
//
// Converts raw packed-sample captures into VCD, lists the probe layout a
// channel list produces, and prints build configuration.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use chrono::NaiveDateTime;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::io::{self as vcd_io, OutputCompression};
use crate::vcd::header::samplerate_string;
use crate::vcd::{AcquisitionInfo, ChannelSpec, MAX_PROBES, ProbeRegistry, VcdEncoder, VcdOptions};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_GZIP_LEVEL: u32 = 6;
const BUF_SIZE: usize = 64 * 1024;

/// Accepted layout for `--date`.
const DATE_ARG_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

/// Parse a sample rate in Hz with optional decimal `k`, `M` or `G` suffix.
fn parse_sample_rate(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let s = s
        .strip_suffix("Hz")
        .or_else(|| s.strip_suffix("hz"))
        .unwrap_or(s)
        .trim_end();
    if s.is_empty() {
        return Err("empty sample rate".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1_000u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1_000_000),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1_000_000_000),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid sample rate '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("sample rate overflow: '{s}'"))
}

fn parse_date(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), DATE_ARG_FORMAT)
        .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD HH:MM:SS): {e}"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Logic capture to Value Change Dump converter.
#[derive(Parser, Debug)]
#[command(
    name = "logic2vcd",
    version,
    about = "Convert packed logic-analyzer captures to VCD",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Convert a raw capture to VCD.
    Convert(ConvertArgs),
    /// Show the VCD variables a channel list produces.
    Probes(ChannelArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct ChannelArgs {
    /// Channel names in bit order; `name<N>` joins bit N of vector `name`.
    #[arg(long = "channels", short = 'C', value_name = "NAMES", value_delimiter = ',', action = ArgAction::Append, required = true)]
    channels: Vec<String>,

    /// Channels present in the capture but left out of the VCD.
    #[arg(long = "disable", value_name = "NAME", value_delimiter = ',', action = ArgAction::Append)]
    disabled: Vec<String>,

    /// Sample rate in Hz (supports k/M/G suffix).
    #[arg(long = "samplerate", short = 'r', value_parser = parse_sample_rate)]
    sample_rate: Option<u64>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    channels: ChannelArgs,

    /// Bytes per sample (default: enough for all channels).
    #[arg(long = "unit-size", value_parser = clap::value_parser!(u64).range(1..=4096))]
    unit_size: Option<u64>,

    /// Fixed `$date` value, `YYYY-MM-DD HH:MM:SS` (default: now).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDateTime>,

    /// Gzip-compress the output.
    #[arg(long, short = 'z')]
    gzip: bool,

    /// Gzip compression level (0-9).
    #[arg(long = "gzip-level", value_parser = clap::value_parser!(u32).range(0..=9), default_value_t = DEFAULT_GZIP_LEVEL)]
    gzip_level: u32,

    /// Input capture file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output VCD file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Convert,
    Probes,
    Config,
}

struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    channels: Vec<String>,
    disabled: Vec<String>,
    sample_rate: Option<u64>,
    unit_size: Option<usize>,
    date: Option<NaiveDateTime>,
    gzip: bool,
    gzip_level: u32,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl Options {
    fn empty(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            use_stdout: false,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            channels: Vec::new(),
            disabled: Vec::new(),
            sample_rate: None,
            unit_size: None,
            date: None,
            gzip: false,
            gzip_level: DEFAULT_GZIP_LEVEL,
            input_file: None,
            output_file: None,
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    match cli.command {
        Cmd::Config => Options::empty(Command::Config, &cli),
        Cmd::Probes(ref args) => Options {
            channels: args.channels.clone(),
            disabled: args.disabled.clone(),
            sample_rate: args.sample_rate,
            ..Options::empty(Command::Probes, &cli)
        },
        Cmd::Convert(ref args) => Options {
            use_stdout: args.stdout,
            channels: args.channels.channels.clone(),
            disabled: args.channels.disabled.clone(),
            sample_rate: args.channels.sample_rate,
            unit_size: args.unit_size.map(|n| n as usize),
            date: args.date,
            gzip: args.gzip,
            gzip_level: args.gzip_level,
            input_file: args.input.clone().or_else(|| args.input_pos.clone()),
            output_file: args.output.clone().or_else(|| args.output_pos.clone()),
            ..Options::empty(Command::Convert, &cli)
        },
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("logic2vcd".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let opts = resolve_options(cli);
        let info = build_acquisition_info(&opts);
        if let Ok(registry) = ProbeRegistry::from_channels(&info.channels) {
            for probe in &registry {
                assert!(probe.width() >= 1);
                assert!(probe.span() <= crate::vcd::MAX_VECTOR_SPAN);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Build encoder inputs from CLI options
// ---------------------------------------------------------------------------

fn build_acquisition_info(opts: &Options) -> AcquisitionInfo {
    let channels = opts
        .channels
        .iter()
        .map(|name| ChannelSpec::new(name.trim(), !opts.disabled.iter().any(|d| d == name.trim())))
        .collect();
    AcquisitionInfo::new(channels, opts.sample_rate)
}

fn build_vcd_options(opts: &Options) -> VcdOptions {
    VcdOptions {
        date: opts.date,
        unit_size: opts.unit_size,
        ..VcdOptions::default()
    }
}

fn build_compression(opts: &Options) -> OutputCompression {
    if !opts.gzip {
        return OutputCompression::None;
    }
    #[cfg(feature = "gzip")]
    {
        OutputCompression::Gzip {
            level: opts.gzip_level,
        }
    }
    #[cfg(not(feature = "gzip"))]
    {
        eprintln!("logic2vcd: warning: gzip support not compiled in, writing plain VCD");
        OutputCompression::None
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("logic2vcd version {version}");

    let gzip = cfg!(feature = "gzip") as u8;
    let file_io = cfg!(feature = "file-io") as u8;

    eprintln!("GZIP={gzip}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("MAX_PROBES={MAX_PROBES}");
    eprintln!("DEFAULT_GZIP_LEVEL={DEFAULT_GZIP_LEVEL}");

    0
}

// ---------------------------------------------------------------------------
// Probes command
// ---------------------------------------------------------------------------

fn cmd_probes(opts: &Options) -> i32 {
    let info = build_acquisition_info(opts);
    let registry = match ProbeRegistry::from_channels(&info.channels) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("logic2vcd: {e}");
            return 1;
        }
    };

    if opts.json_output {
        let probes: Vec<_> = registry
            .iter()
            .map(|p| {
                serde_json::json!({
                    "symbol": p.symbol().to_string(),
                    "name": p.name(),
                    "width": p.width(),
                    "vector": p.is_vector(),
                    "bits": p.bits().iter().map(|b| [b.bit as usize, b.sample]).collect::<Vec<_>>(),
                })
            })
            .collect();
        let json = serde_json::json!({
            "command": "probes",
            "channels": info.channels.len(),
            "enabled": info.enabled_channels(),
            "sample_rate": info.sample_rate,
            "probes": probes,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return 0;
    }

    if let Some(rate) = info.sample_rate {
        println!("# sample rate: {}", samplerate_string(rate));
    }
    for probe in &registry {
        let bits: Vec<String> = probe
            .bits()
            .iter()
            .map(|b| format!("{}@{}", b.bit, b.sample))
            .collect();
        println!(
            "{} {:>3} {} [{}]",
            probe.symbol(),
            probe.width(),
            probe.name(),
            bits.join(" ")
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Convert command
// ---------------------------------------------------------------------------

fn cmd_convert(opts: &Options) -> i32 {
    let info = build_acquisition_info(opts);
    let vcd_opts = build_vcd_options(opts);
    let compression = build_compression(opts);

    let output_path = match (opts.use_stdout, &opts.output_file) {
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                eprintln!(
                    "logic2vcd: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return 1;
            }
            Some(path)
        }
        _ => None,
    };

    // File to file: the io helpers handle buffering, hashing and gzip.
    if let (Some(input), Some(output)) = (&opts.input_file, output_path) {
        let stats = match vcd_io::convert_file(input, output, &info, vcd_opts, compression) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("logic2vcd: {}: {e}", input.display());
                return 1;
            }
        };

        if opts.verbose > 0 && !opts.quiet {
            eprintln!(
                "logic2vcd: input size: {}, samples: {}, changes: {}, output size: {}",
                stats.input_size, stats.samples_in, stats.samples_emitted, stats.output_size
            );
        }
        if opts.json_output {
            let json = serde_json::json!({
                "command": "convert",
                "input_size": stats.input_size,
                "output_size": stats.output_size,
                "vcd_size": stats.vcd_size,
                "samples": stats.samples_in,
                "samples_emitted": stats.samples_emitted,
                "probes": stats.probes,
                "sha256": stats.vcd_sha256.map(|d| vcd_io::hex_digest(&d)),
            });
            eprintln!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        return 0;
    }

    let mut encoder = match VcdEncoder::new(&info, vcd_opts) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("logic2vcd: {e}");
            return 1;
        }
    };

    // Open input: file or stdin.
    let reader: Box<dyn Read> = match &opts.input_file {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::with_capacity(BUF_SIZE, f)),
            Err(e) => {
                eprintln!("logic2vcd: input file: {}: {e}", path.display());
                return 1;
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    // Open output: file or stdout.
    let writer: Box<dyn Write> = match output_path {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::with_capacity(BUF_SIZE, f)),
            Err(e) => {
                eprintln!("logic2vcd: output file: {}: {e}", path.display());
                return 1;
            }
        },
        None => Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock())),
    };

    let result = match compression {
        OutputCompression::None => {
            let mut writer = writer;
            vcd_io::convert_stream(reader, &mut writer, &mut encoder)
                .and_then(|s| writer.flush().map(|_| s).map_err(Into::into))
        }
        #[cfg(feature = "gzip")]
        OutputCompression::Gzip { level } => {
            let mut gz = flate2::write::GzEncoder::new(writer, flate2::Compression::new(level));
            vcd_io::convert_stream(reader, &mut gz, &mut encoder).and_then(|s| {
                gz.finish()
                    .and_then(|mut w| w.flush())
                    .map(|_| s)
                    .map_err(Into::into)
            })
        }
    };

    let stream_stats = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("logic2vcd: convert error: {e}");
            return 1;
        }
    };
    let stats = encoder.finish();

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "logic2vcd: input size: {}, samples: {}, changes: {}, vcd size: {}",
            stream_stats.bytes_in, stats.samples_in, stats.samples_emitted, stats.bytes_out
        );
    }
    if opts.json_output {
        let json = serde_json::json!({
            "command": "convert",
            "input_size": stream_stats.bytes_in,
            "vcd_size": stats.bytes_out,
            "samples": stats.samples_in,
            "samples_emitted": stats.samples_emitted,
            "probes": stats.probes,
            "trailing_bytes": stream_stats.trailing_bytes,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    let default_filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && let Some(path) = opts.output_file.take()
        && !opts.quiet
    {
        eprintln!(
            "logic2vcd: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Convert => cmd_convert(&opts),
        Command::Probes => cmd_probes(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_opts(args: &[&str]) -> Options {
        let argv: Vec<String> = std::iter::once("logic2vcd".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).expect("cli parse failed");
        resolve_options(cli)
    }

    #[test]
    fn parse_sample_rate_suffixes() {
        assert_eq!(parse_sample_rate("1").unwrap(), 1);
        assert_eq!(parse_sample_rate("200k").unwrap(), 200_000);
        assert_eq!(parse_sample_rate("24M").unwrap(), 24_000_000);
        assert_eq!(parse_sample_rate("1G").unwrap(), 1_000_000_000);
        assert_eq!(parse_sample_rate("1 MHz").unwrap(), 1_000_000);
        assert_eq!(parse_sample_rate("500Hz").unwrap(), 500);
        assert!(parse_sample_rate("").is_err());
        assert!(parse_sample_rate("fast").is_err());
        assert!(parse_sample_rate("99999999999999G").is_err());
    }

    #[test]
    fn parse_date_layout() {
        let d = parse_date("2013-03-04 09:05:07").unwrap();
        assert_eq!(d.format("%Y%m%d%H%M%S").to_string(), "20130304090507");
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn convert_subcommand_maps_correctly() {
        let opts = parse_opts(&[
            "convert",
            "--channels",
            "clk,d<0>,d<1>",
            "--disable",
            "d<1>",
            "--samplerate",
            "1M",
            "--unit-size",
            "2",
            "--date",
            "2020-01-01 00:00:00",
            "in.bin",
            "out.vcd",
        ]);
        assert_eq!(opts.command, Command::Convert);
        assert_eq!(opts.channels, vec!["clk", "d<0>", "d<1>"]);
        assert_eq!(opts.disabled, vec!["d<1>"]);
        assert_eq!(opts.sample_rate, Some(1_000_000));
        assert_eq!(opts.unit_size, Some(2));
        assert!(opts.date.is_some());
        assert_eq!(opts.input_file, Some(PathBuf::from("in.bin")));
        assert_eq!(opts.output_file, Some(PathBuf::from("out.vcd")));
    }

    #[test]
    fn repeated_channel_flags_append() {
        let opts = parse_opts(&["probes", "-C", "a,b", "-C", "c"]);
        assert_eq!(opts.command, Command::Probes);
        assert_eq!(opts.channels, vec!["a", "b", "c"]);
    }

    #[test]
    fn acquisition_info_marks_disabled() {
        let opts = parse_opts(&["probes", "-C", "A,B,C", "--disable", "B"]);
        let info = build_acquisition_info(&opts);
        assert_eq!(info.channels.len(), 3);
        assert_eq!(info.enabled_channels(), 2);
        assert!(!info.channels[1].enabled);
    }

    #[test]
    fn global_flags() {
        let opts = parse_opts(&["--force", "--json", "convert", "-C", "A", "--stdout", "in"]);
        assert!(opts.force);
        assert!(opts.json_output);
        assert!(opts.use_stdout);
    }

    #[test]
    fn verbose_is_capped() {
        let opts = parse_opts(&["-v", "-v", "-v", "probes", "-C", "A"]);
        assert_eq!(opts.verbose, 2);
    }

    #[test]
    fn channels_are_required() {
        let argv = ["logic2vcd", "convert", "in.bin"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn vcd_options_mapping() {
        let opts = parse_opts(&["convert", "-C", "A", "--unit-size", "4", "in", "out"]);
        let v = build_vcd_options(&opts);
        assert_eq!(v.unit_size, Some(4));
        assert_eq!(v.tool_name, "logic2vcd");
        assert!(v.date.is_none());
    }

    #[test]
    fn gzip_flags_parse() {
        let opts = parse_opts(&["convert", "-C", "A", "-z", "--gzip-level", "9", "in", "out"]);
        assert!(opts.gzip);
        assert_eq!(opts.gzip_level, 9);
        #[cfg(feature = "gzip")]
        assert_eq!(build_compression(&opts), OutputCompression::Gzip { level: 9 });
    }

    #[test]
    fn fuzz_hook_builds_registry() {
        let args = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        fuzz_try_parse_args(&args(&["probes", "-C", "clk,d<0>,d<65535>"]));
        fuzz_try_parse_args(&args(&["probes", "-C", "n<4294967295>,n<0>"]));
        fuzz_try_parse_args(&args(&["convert", "-C", "a<1>,a<1>,b", "in", "out"]));
    }

    #[test]
    fn config_command_maps() {
        assert_eq!(parse_opts(&["config"]).command, Command::Config);
    }
}
