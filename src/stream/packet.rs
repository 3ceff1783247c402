// Datafeed packets delivered by an acquisition source.
//
// Only logic payloads carry data for the VCD writer; every other kind is
// accepted and ignored so multiplexed feeds can be passed through as-is.

/// One packet of an acquisition datafeed.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet<'a> {
    /// Start of the stream.
    Header,
    /// Packed logic samples, `unit_size` bytes each.
    Logic { data: &'a [u8], unit_size: usize },
    /// Analog samples for `channels` channels.
    Analog { channels: usize, data: &'a [f32] },
    /// Trigger point marker.
    Trigger,
    /// Out-of-band metadata change.
    Meta,
    /// End of the stream.
    End,
}

impl<'a> Packet<'a> {
    pub fn logic(data: &'a [u8], unit_size: usize) -> Self {
        Self::Logic { data, unit_size }
    }

    pub fn is_logic(&self) -> bool {
        matches!(self, Self::Logic { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Logic { .. } => "logic",
            Self::Analog { .. } => "analog",
            Self::Trigger => "trigger",
            Self::Meta => "meta",
            Self::End => "end",
        }
    }
}
