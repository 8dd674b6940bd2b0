//! Native sample conversion into f32 amplitudes.

/// Converts an i16 sample to f32.
///
/// Output will be in the range [-1.0, 1.0).
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Converts an unsigned 16-bit sample (midpoint 32768) to f32.
#[inline]
pub fn u16_to_f32(sample: u16) -> f32 {
    (f32::from(sample) - 32768.0) / 32768.0
}

/// Quantises an amplitude to a signed integer of `bits` width.
///
/// Values outside [-1.0, 1.0] are clamped. Uses the symmetric scale
/// (2^(bits-1) - 1) so -1.0 and 1.0 map to opposite values.
#[inline]
pub(crate) fn f64_to_int(sample: f64, bits: u16) -> i32 {
    let max = f64::from(bits - 1).exp2() - 1.0;
    (sample.clamp(-1.0, 1.0) * max).round() as i32
}
