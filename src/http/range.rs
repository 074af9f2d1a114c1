//! Range header resolution module
//!
//! Turns a raw `Range` header value and the resource length into a single
//! response decision. Only the single-range `bytes=<start>-<end>` form is
//! supported; multi-range sets are rejected.

use std::fmt;

/// Outcome of resolving a request's `Range` header against a resource.
///
/// Produced once per request and consumed immediately by the response
/// builder; it carries everything needed to pick a status line and frame
/// the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeDecision {
    /// No `Range` header: transfer the whole resource with status 200.
    Full(u64),
    /// Validated inclusive byte window: transfer with status 206.
    Partial {
        /// First byte offset, inclusive.
        start: u64,
        /// Last byte offset, inclusive. `start == end` is a one-byte window.
        end: u64,
        /// Total resource length for the `Content-Range` header.
        total: u64,
    },
    /// Numerically valid but out of bounds: status 416.
    Unsatisfiable(u64),
    /// Header present but unparseable: status 500.
    ///
    /// A malformed range is a server error here, never a silent fall back
    /// to a full-content response.
    Malformed(RangeError),
}

/// Why a `Range` header failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Header does not start with `bytes=`.
    NotBytesUnit,
    /// Multiple comma-separated ranges; only a single range is supported.
    MultipleRanges,
    /// Value does not split into exactly two dash-separated parts.
    BadShape,
    /// Both bounds empty (`bytes=-`).
    EmptyBounds,
    /// A bound is present but not a non-negative integer.
    BadNumber(String),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBytesUnit => write!(f, "range unit must be 'bytes'"),
            Self::MultipleRanges => write!(f, "multiple ranges are not supported"),
            Self::BadShape => write!(f, "range must have the form 'bytes=start-end'"),
            Self::EmptyBounds => write!(f, "range bounds cannot both be empty"),
            Self::BadNumber(tok) => write!(f, "invalid byte position '{tok}'"),
        }
    }
}

impl RangeDecision {
    /// Number of body bytes this decision will transfer.
    #[cfg(test)]
    pub fn transfer_len(&self) -> u64 {
        match self {
            Self::Full(total) => *total,
            Self::Partial { start, end, .. } => end - start + 1,
            Self::Unsatisfiable(_) | Self::Malformed(_) => 0,
        }
    }
}

/// Resolve an optional `Range` header against the resource length.
///
/// Accepted forms (single range, bytes unit):
/// - `bytes=start-end` - explicit inclusive window
/// - `bytes=start-` - from `start` to the last byte
/// - `bytes=-end` - window starting at offset 0 (see below)
///
/// An empty start bound is treated as offset zero: `bytes=-N` selects the
/// window `0..=N`. This deliberately differs from RFC 7233 suffix
/// semantics, where `bytes=-N` means the last N bytes; clients of this
/// server are calibrated against the offset-zero arithmetic.
///
/// Bounds out of range (`start >= len`, `end >= len`, `start > end`) yield
/// [`RangeDecision::Unsatisfiable`]; anything unparseable yields
/// [`RangeDecision::Malformed`].
///
/// # Examples
/// ```
/// use rangeserve::http::range::{decide, RangeDecision};
///
/// assert_eq!(decide(None, 1000), RangeDecision::Full(1000));
/// assert_eq!(
///     decide(Some("bytes=0-99"), 1000),
///     RangeDecision::Partial { start: 0, end: 99, total: 1000 },
/// );
/// assert_eq!(decide(Some("bytes=1000-"), 1000), RangeDecision::Unsatisfiable(1000));
/// ```
pub fn decide(range_header: Option<&str>, total_len: u64) -> RangeDecision {
    let Some(header) = range_header else {
        return RangeDecision::Full(total_len);
    };

    match parse_window(header, total_len) {
        Ok(Some((start, end))) => RangeDecision::Partial {
            start,
            end,
            total: total_len,
        },
        Ok(None) => RangeDecision::Unsatisfiable(total_len),
        Err(e) => RangeDecision::Malformed(e),
    }
}

/// Parse the header into an inclusive window, `Ok(None)` when the bounds
/// are well-formed but unsatisfiable.
fn parse_window(header: &str, total_len: u64) -> Result<Option<(u64, u64)>, RangeError> {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return Err(RangeError::NotBytesUnit);
    };

    if spec.contains(',') {
        return Err(RangeError::MultipleRanges);
    }

    let Some((start_str, end_str)) = split_bounds(spec) else {
        return Err(RangeError::BadShape);
    };

    if start_str.is_empty() && end_str.is_empty() {
        return Err(RangeError::EmptyBounds);
    }

    // Empty start is offset 0, not an RFC suffix length.
    let start = if start_str.is_empty() {
        0
    } else {
        parse_bound(start_str)?
    };

    if start >= total_len {
        return Ok(None);
    }

    // Past the satisfiability check above, total_len is at least 1.
    let end = if end_str.is_empty() {
        total_len - 1
    } else {
        parse_bound(end_str)?
    };

    if end >= total_len || start > end {
        return Ok(None);
    }

    Ok(Some((start, end)))
}

/// Split the spec into its two dash-separated bounds; any other part count
/// is malformed.
fn split_bounds(spec: &str) -> Option<(&str, &str)> {
    let mut parts = spec.split('-');
    let start = parts.next()?;
    let end = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((start.trim(), end.trim()))
}

fn parse_bound(token: &str) -> Result<u64, RangeError> {
    token
        .parse::<u64>()
        .map_err(|_| RangeError::BadNumber(token.to_string()))
}
