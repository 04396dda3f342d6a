//! Plain-text PPM (P3) writer.

use crate::Color;
use std::io::{self, Write};

/// Write the `P3` header for a `width` x `height` image with 8-bit channels.
pub fn write_header<W: Write>(out: &mut W, width: u32, height: u32) -> io::Result<()> {
    write!(out, "P3\n{width} {height}\n255\n")
}

/// Write one pixel whose channels are already in `[0, 1]`.
pub fn write_color<W: Write>(out: &mut W, color: Color) -> io::Result<()> {
    writeln!(
        out,
        "{} {} {}",
        unit_to_byte(color.x),
        unit_to_byte(color.y),
        unit_to_byte(color.z)
    )
}

/// Write one pixel holding the sum of `samples` radiance samples.
///
/// Each channel is averaged, gamma-2 corrected and clamped, so
/// out-of-range and NaN sums still produce a valid byte.
pub fn write_color_weighted<W: Write>(out: &mut W, color: Color, samples: u32) -> io::Result<()> {
    let samples = samples as f64;
    writeln!(
        out,
        "{} {} {}",
        gamma_to_byte(color.x / samples),
        gamma_to_byte(color.y / samples),
        gamma_to_byte(color.z / samples)
    )
}

#[inline]
fn unit_to_byte(c: f64) -> u32 {
    (255.999 * c) as u32
}

#[inline]
fn gamma_to_byte(c: f64) -> u32 {
    // `as` saturates: NaN becomes 0
    (256.0 * c.sqrt().clamp(0.0, 0.999)) as u32
}
