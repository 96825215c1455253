//! Shared colors and number formatting for the interactive and static charts.

/// Bar color of the cases ranking.
pub const CASES_COLOR: [u8; 3] = [99, 110, 250];
/// Bar color of the deaths ranking.
pub const DEATHS_COLOR: [u8; 3] = [239, 85, 59];

/// "Reds" sequential scale, light to dark.
const REDS: [[u8; 3]; 9] = [
    [255, 245, 240],
    [254, 224, 210],
    [252, 187, 161],
    [252, 146, 114],
    [251, 106, 74],
    [239, 59, 44],
    [203, 24, 29],
    [165, 15, 21],
    [103, 0, 13],
];

/// Map `value` onto the Reds ramp spanning `[0, ceiling]`. Out-of-range values clamp.
pub fn color_scale(value: f64, ceiling: f64) -> [u8; 3] {
    let t = if ceiling > 0.0 && value.is_finite() {
        (value / ceiling).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let pos = t * (REDS.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(REDS.len() - 1);
    let frac = pos - lower as f64;

    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let a = REDS[lower][i] as f64;
        let b = REDS[upper][i] as f64;
        *channel = (a + (b - a) * frac).round() as u8;
    }
    rgb
}

/// Black or white, whichever reads better on `background`.
pub fn text_color_on(background: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = background.map(f64::from);
    let luma = 0.299 * r + 0.587 * g + 0.114 * b;
    if luma > 140.0 {
        [0, 0, 0]
    } else {
        [255, 255, 255]
    }
}

/// Whole number with thousands separators, e.g. `1,234,567`.
pub fn format_count(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_endpoints() {
        assert_eq!(color_scale(0.0, 16_000_000.0), REDS[0]);
        assert_eq!(color_scale(16_000_000.0, 16_000_000.0), REDS[8]);
    }

    #[test]
    fn scale_clamps_out_of_range() {
        assert_eq!(color_scale(-50.0, 100.0), REDS[0]);
        assert_eq!(color_scale(1e12, 100.0), REDS[8]);
        assert_eq!(color_scale(f64::NAN, 100.0), REDS[0]);
        assert_eq!(color_scale(10.0, 0.0), REDS[0]);
    }

    #[test]
    fn scale_is_darker_for_larger_values() {
        let luma = |c: [u8; 3]| c.iter().map(|&v| v as u32).sum::<u32>();
        let low = color_scale(1_000_000.0, 16_000_000.0);
        let high = color_scale(9_000_000.0, 16_000_000.0);
        assert!(luma(high) < luma(low));
        assert_eq!(color_scale(50.0, 100.0), REDS[4]);
    }

    #[test]
    fn text_contrast() {
        assert_eq!(text_color_on(REDS[0]), [0, 0, 0]);
        assert_eq!(text_color_on(REDS[8]), [255, 255, 255]);
    }

    #[test]
    fn counts_have_separators() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(16_000_000.0), "16,000,000");
        assert_eq!(format_count(1234.6), "1,235");
        assert_eq!(format_count(-4321.0), "-4,321");
    }
}
