// Probe name parsing.
//
// A channel named `base<N>` contributes bit N of the vector probe `base`.
// Anything else is a scalar probe carrying the full name.

/// Split a vector-bit name of the form `prefix<digits>` into
/// `(prefix, index)`.
///
/// The suffix must be anchored at the end of the string, the prefix must be
/// non-empty, and there must be at least one decimal digit. Returns `None`
/// for scalar names. An index too large for `u32` also yields `None`.
pub fn parse_vector_name(name: &str) -> Option<(&str, u32)> {
    let body = name.strip_suffix('>')?;
    let digits_start = body
        .bytes()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    let digits = &body[digits_start..];
    if digits.is_empty() {
        return None;
    }

    let prefix = body[..digits_start].strip_suffix('<')?;
    if prefix.is_empty() {
        return None;
    }

    let index = digits.parse::<u32>().ok()?;
    Some((prefix, index))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_suffix_is_split() {
        assert_eq!(parse_vector_name("data<3>"), Some(("data", 3)));
        assert_eq!(parse_vector_name("d<0>"), Some(("d", 0)));
        assert_eq!(parse_vector_name("addr<15>"), Some(("addr", 15)));
    }

    #[test]
    fn only_the_last_suffix_counts() {
        assert_eq!(parse_vector_name("a<1><2>"), Some(("a<1>", 2)));
        assert_eq!(parse_vector_name("bus 7<12>"), Some(("bus 7", 12)));
    }

    #[test]
    fn scalar_names_do_not_match() {
        for name in ["D0", "clk", "", ">", "<>", "x<>", "x<1", "x1>", "x<a>", "x<1>y"] {
            assert_eq!(parse_vector_name(name), None, "{name:?}");
        }
    }

    #[test]
    fn empty_prefix_is_scalar() {
        assert_eq!(parse_vector_name("<3>"), None);
    }

    #[test]
    fn leading_zeros_are_decimal() {
        assert_eq!(parse_vector_name("q<007>"), Some(("q", 7)));
    }

    #[test]
    fn oversized_index_is_scalar() {
        assert_eq!(parse_vector_name("big<99999999999>"), None);
    }
}
