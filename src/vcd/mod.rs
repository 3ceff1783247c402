// Value Change Dump (VCD) writer for packed logic captures.
//
// # Modules
//
// - `name`    : `base<N>` vector-bit name parsing
// - `bits`    : bit access into packed samples
// - `registry`: probe grouping and identifier allocation
// - `header`  : timescale selection and preamble rendering
// - `encoder` : streaming value-change encoder

pub mod bits;
pub mod encoder;
pub mod header;
pub mod name;
pub mod registry;

// Re-export key types for convenience.
pub use encoder::{
    AcquisitionInfo, ConfigError, EncodeError, EncodeStats, Phase, VcdEncoder, VcdOptions,
};
pub use header::{Header, Timescale};
pub use name::parse_vector_name;
pub use registry::{
    BitIndex, ChannelSpec, MAX_PROBES, MAX_VECTOR_SPAN, Probe, ProbeRegistry, RegistryError,
};
