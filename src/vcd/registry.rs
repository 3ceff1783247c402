// Probe registry: groups physical channels into logical VCD variables.
//
// Channels named `base<N>` are gathered into one vector probe per base
// name; every other channel becomes a scalar probe. Each probe gets a
// one-character VCD identifier drawn from the printable ASCII range, in
// order of first appearance.

use std::collections::HashMap;

use log::debug;

use super::name::parse_vector_name;

// ---------------------------------------------------------------------------
// Symbol allocation
// ---------------------------------------------------------------------------

/// First VCD identifier character.
pub const FIRST_SYMBOL: char = '!';

/// Last VCD identifier character.
pub const LAST_SYMBOL: char = '~';

/// Maximum number of probes (one printable identifier each).
pub const MAX_PROBES: usize = (LAST_SYMBOL as usize) - (FIRST_SYMBOL as usize) + 1;

/// Exclusive upper bound on a vector bit index. Bounds the length of a
/// rendered `b...` value line.
pub const MAX_VECTOR_SPAN: u32 = 1 << 16;

/// Identifier for the probe created after `count` others.
///
/// Returns `None` once the printable range is exhausted.
#[inline]
pub fn next_symbol(count: usize) -> Option<char> {
    if count >= MAX_PROBES {
        return None;
    }
    char::from_u32(FIRST_SYMBOL as u32 + count as u32)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("VCD only supports {max} probes, got {count}", max = MAX_PROBES)]
    TooManyProbes { count: usize },
    #[error("bit index {bit} of vector '{name}' exceeds the limit of {max}", max = MAX_VECTOR_SPAN - 1)]
    BitIndexTooLarge { name: String, bit: u32 },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One physical channel as reported by the acquisition source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub enabled: bool,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }

    pub fn enabled(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }
}

/// Placement of one probe bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitIndex {
    /// Logical bit within the probe (0 = least significant).
    pub bit: u32,
    /// Absolute bit offset into a packed sample.
    pub sample: usize,
}

/// A logical VCD variable: a scalar channel or a vector of channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    name: String,
    symbol: char,
    /// Sorted by `bit`, highest first.
    bits: Vec<BitIndex>,
    is_vector: bool,
}

impl Probe {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> char {
        self.symbol
    }

    pub fn bits(&self) -> &[BitIndex] {
        &self.bits
    }

    pub fn is_vector(&self) -> bool {
        self.is_vector
    }

    /// Width as declared in `$var`: the number of bits (1 for scalars).
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Positions in a rendered vector value: highest bit + 1. Undeclared
    /// positions render as `x`.
    pub fn span(&self) -> u32 {
        if self.is_vector {
            self.bits.first().map_or(1, |b| b.bit.saturating_add(1))
        } else {
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered set of probes, built once and read-only afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeRegistry {
    probes: Vec<Probe>,
}

impl ProbeRegistry {
    /// Build from `(channel name, physical bit position)` pairs, in order.
    pub fn build<'a, I>(physical_bits: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let mut probes: Vec<Probe> = Vec::new();
        let mut vectors: HashMap<&'a str, usize> = HashMap::new();

        for (name, sample) in physical_bits {
            match parse_vector_name(name) {
                Some((base, bit)) => {
                    if bit >= MAX_VECTOR_SPAN {
                        return Err(RegistryError::BitIndexTooLarge {
                            name: base.to_owned(),
                            bit,
                        });
                    }
                    if let Some(&idx) = vectors.get(base) {
                        probes[idx].bits.push(BitIndex { bit, sample });
                        continue;
                    }
                    vectors.insert(base, probes.len());
                    probes.push(Probe {
                        name: base.to_owned(),
                        symbol: FIRST_SYMBOL,
                        bits: vec![BitIndex { bit, sample }],
                        is_vector: true,
                    });
                }
                None => probes.push(Probe {
                    name: name.to_owned(),
                    symbol: FIRST_SYMBOL,
                    bits: vec![BitIndex { bit: 0, sample }],
                    is_vector: false,
                }),
            }
        }

        if probes.len() > MAX_PROBES {
            return Err(RegistryError::TooManyProbes {
                count: probes.len(),
            });
        }

        for (count, probe) in probes.iter_mut().enumerate() {
            probe.symbol = next_symbol(count).ok_or(RegistryError::TooManyProbes { count })?;
            // Stable: duplicate bits keep first-seen order.
            probe.bits.sort_by(|a, b| b.bit.cmp(&a.bit));
        }

        debug!(
            "probe registry: {} probes ({} vectors)",
            probes.len(),
            probes.iter().filter(|p| p.is_vector).count()
        );

        Ok(Self { probes })
    }

    /// Build from the acquisition channel list.
    ///
    /// A channel's physical bit position is its index in `channels`;
    /// disabled channels keep their slot but are not registered.
    pub fn from_channels(channels: &[ChannelSpec]) -> Result<Self, RegistryError> {
        Self::build(
            channels
                .iter()
                .enumerate()
                .filter(|(_, ch)| ch.enabled)
                .map(|(pos, ch)| (ch.name.as_str(), pos)),
        )
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Probe> {
        self.probes.iter()
    }

    /// Look up a probe by its VCD identifier.
    pub fn get(&self, symbol: char) -> Option<&Probe> {
        let idx = (symbol as usize).checked_sub(FIRST_SYMBOL as usize)?;
        self.probes.get(idx)
    }

    /// Highest physical bit position referenced by any probe.
    pub fn max_bit_position(&self) -> Option<usize> {
        self.probes
            .iter()
            .flat_map(|p| p.bits.iter().map(|b| b.sample))
            .max()
    }
}

impl<'r> IntoIterator for &'r ProbeRegistry {
    type Item = &'r Probe;
    type IntoIter = std::slice::Iter<'r, Probe>;

    fn into_iter(self) -> Self::IntoIter {
        self.probes.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
