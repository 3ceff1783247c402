//! logic2vcd: streaming Value Change Dump output for logic-analyzer captures.
//!
//! The crate provides:
//! - A VCD encoder for packed multi-channel samples (`vcd`)
//! - A session handle that consumes acquisition datafeed packets (`stream`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use logic2vcd::vcd::{AcquisitionInfo, ChannelSpec, VcdEncoder, VcdOptions};
//!
//! let info = AcquisitionInfo::new(
//!     vec![ChannelSpec::enabled("clk"), ChannelSpec::enabled("data<0>")],
//!     Some(1_000_000),
//! );
//! let mut encoder = VcdEncoder::new(&info, VcdOptions::default()).unwrap();
//!
//! // One byte per sample: bit 0 is `clk`, bit 1 is `data<0>`.
//! let text = encoder.process_frame(&[0b01, 0b11, 0b10], 1).unwrap();
//! assert!(text.contains("$enddefinitions $end"));
//! ```

pub mod io;
pub mod stream;
pub mod vcd;

#[cfg(feature = "cli")]
pub mod cli;
