// Default sample rate (Hz) of the signal source feeding the scope.
// the analyser reports its own rate, this exists as the renderer's
// default and as a fallback for unset configuration.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

// Byte amplitude representing zero signal.
pub const BYTE_MIDPOINT: u8 = 128;

// Scale between a unit amplitude and the byte range around the midpoint.
const BYTE_SCALE: f32 = 128.0;

// Convert a linear sample (-1..1) to a time-domain byte: floor(128 * (1 + x)), clipped.
#[inline(always)]
pub fn sample_to_byte(sample: f32) -> u8 {
    if sample.is_nan() {
        return BYTE_MIDPOINT;
    }
    (BYTE_SCALE * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}

// Convert a time-domain byte back to a centred voltage in -1..1.
#[inline(always)]
pub fn byte_to_voltage(byte: u8) -> f32 {
    (f32::from(byte) - BYTE_SCALE) / BYTE_SCALE
}

// Average one interleaved frame down to mono.
#[inline]
pub fn mixdown_frame(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().sum::<f32>() / frame.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_conversion_matches_analyser_rules() {
        assert_eq!(sample_to_byte(0.0), 128);
        assert_eq!(sample_to_byte(1.0), 255);
        assert_eq!(sample_to_byte(-1.0), 0);
        assert_eq!(sample_to_byte(4.0), 255);
        assert_eq!(sample_to_byte(-0.004), 127);
        assert_eq!(sample_to_byte(f32::NAN), 128);
    }

    #[test]
    fn voltage_is_centred_on_midpoint() {
        assert_eq!(byte_to_voltage(BYTE_MIDPOINT), 0.0);
        assert_eq!(byte_to_voltage(0), -1.0);
        assert!((byte_to_voltage(255) - 0.992_187_5).abs() < 1e-6);
    }

    #[test]
    fn mixdown_averages_channels() {
        assert_eq!(mixdown_frame(&[0.5, -0.5]), 0.0);
        assert_eq!(mixdown_frame(&[0.25, 0.75]), 0.5);
        assert_eq!(mixdown_frame(&[]), 0.0);
    }
}
