//! Frame-exact timing arithmetic for FCPXML documents
//!
//! All durations, offsets, and start times in a document are rational
//! values over one fixed timebase of 24,000, with a frame tick of 1,001
//! (24000/1001 ≈ 23.976 fps). Values are written as `"<ticks>/24000s"`,
//! with the single exception of zero, which must be spelled `"0s"`.
//!
//! # Why integers
//!
//! Timeline math here is append-and-sum over many clips. Converting
//! through floating-point seconds accumulates rounding error across
//! clips and eventually lands a clip off its frame boundary, which the
//! consuming editor rejects. Every sum and comparison therefore runs on
//! integer tick numerators; floats appear only at the outermost edge,
//! when a probed duration in seconds is rounded to the nearest whole
//! frame.
//!
//! # Conversion flow
//!
//! ```text
//! probed seconds (f64)
//!     ↓
//! seconds_to_frames() → whole frames (i64)
//!     ↓
//! frames_to_duration() → "<frames*1001>/24000s"
//!     ↓
//! ticks() / add() → exact timeline arithmetic
//! ```

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Document timebase: every rational time value is expressed over 24,000.
pub const TIMEBASE: i64 = 24_000;

/// Ticks per frame: one frame lasts 1001/24000 s (≈ 23.976 fps).
pub const FRAME_TICKS: i64 = 1_001;

/// Ticks in 24 whole frames, the nearest frame-aligned second.
///
/// Used for one-second steps that must stay on frame boundaries, such as
/// the stagger between stacked text overlays.
pub const ONE_SECOND_TICKS: i64 = 24 * FRAME_TICKS;

// ============================================================================
// Types
// ============================================================================

/// An exact rational time value: `num`/`den` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    /// The zero value, canonically written `"0s"`.
    pub const ZERO: Rational = Rational {
        num: 0,
        den: TIMEBASE,
    };

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }
}

// ============================================================================
// Parsing and formatting
// ============================================================================

/// Parse a rational time string.
///
/// Accepts exactly two shapes: the literal `"0s"`, and `"<int>/<int>s"`
/// with a positive denominator. Anything else is an error — a malformed
/// time in a loaded document must abort the operation, not silently read
/// as zero.
///
/// # Examples
///
/// ```rust
/// use scenecut_common::timing::{parse, Rational};
///
/// assert_eq!(parse("0s").unwrap(), Rational::ZERO);
/// let t = parse("24024/24000s").unwrap();
/// assert_eq!((t.num, t.den), (24024, 24000));
/// assert!(parse("10s").is_err());
/// ```
pub fn parse(value: &str) -> Result<Rational> {
    if value == "0s" {
        return Ok(Rational::ZERO);
    }
    let body = value
        .strip_suffix('s')
        .ok_or_else(|| Error::InvalidTime(value.to_string()))?;
    let (num, den) = body
        .split_once('/')
        .ok_or_else(|| Error::InvalidTime(value.to_string()))?;
    let num: i64 = num
        .parse()
        .map_err(|_| Error::InvalidTime(value.to_string()))?;
    let den: i64 = den
        .parse()
        .map_err(|_| Error::InvalidTime(value.to_string()))?;
    if den <= 0 {
        return Err(Error::InvalidTime(value.to_string()));
    }
    Ok(Rational { num, den })
}

/// Numerator of a parsed time normalized to the 24,000 timebase.
///
/// Values over a foreign denominator are rescaled exactly; a denominator
/// that cannot be rescaled without remainder is an error.
pub fn ticks(value: &str) -> Result<i64> {
    let r = parse(value)?;
    if r.den == TIMEBASE {
        return Ok(r.num);
    }
    let scaled = r.num as i128 * TIMEBASE as i128;
    if scaled % r.den as i128 != 0 {
        return Err(Error::InvalidTime(value.to_string()));
    }
    Ok((scaled / r.den as i128) as i64)
}

/// Lenient tick extraction for ordering keys only.
///
/// The serializer sorts spine children while emitting and must not fail
/// mid-write; unreadable offsets sort as zero. Timeline arithmetic goes
/// through [`ticks`] and keeps its error.
pub fn ticks_or_zero(value: &str) -> i64 {
    ticks(value).unwrap_or(0)
}

/// Format a tick count over the document timebase.
///
/// Zero formats as the literal `"0s"` — the consumer requires that exact
/// spelling, not `"0/24000s"`.
pub fn format_ticks(ticks: i64) -> String {
    if ticks == 0 {
        "0s".to_string()
    } else {
        format!("{ticks}/{TIMEBASE}s")
    }
}

/// Format a whole-frame count as a duration string.
pub fn frames_to_duration(frames: i64) -> String {
    format_ticks(frames * FRAME_TICKS)
}

// ============================================================================
// Seconds conversion
// ============================================================================

/// Round a duration in seconds to the nearest whole frame count.
///
/// Compares the floor and ceiling candidates against the exact value and
/// keeps the closer one; exact ties keep the floor. Truncation is not
/// acceptable here — it shrinks every clip by up to one frame, and the
/// error is visible after a few dozen clips.
///
/// # Examples
///
/// ```rust
/// use scenecut_common::timing::seconds_to_frames;
///
/// assert_eq!(seconds_to_frames(0.0), 0);
/// assert_eq!(seconds_to_frames(1.0), 24);
/// assert_eq!(seconds_to_frames(10.0), 240);
/// ```
pub fn seconds_to_frames(seconds: f64) -> i64 {
    let fps = TIMEBASE as f64 / FRAME_TICKS as f64;
    let exact = seconds * fps;

    let floor = exact.floor();
    let ceil = exact.ceil();
    let floor_error = (seconds - floor / fps).abs();
    let ceil_error = (seconds - ceil / fps).abs();

    if floor_error <= ceil_error {
        floor as i64
    } else {
        ceil as i64
    }
}

/// Convert seconds to a frame-aligned duration string.
pub fn seconds_to_duration(seconds: f64) -> String {
    frames_to_duration(seconds_to_frames(seconds))
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Sum two duration strings exactly.
pub fn add(a: &str, b: &str) -> Result<String> {
    Ok(format_ticks(ticks(a)? + ticks(b)?))
}

// ============================================================================
// Tests Module
// ============================================================================

#[cfg(test)]
#[path = "timing_tests.rs"]
mod tests;
