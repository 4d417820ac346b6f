use crate::config::HsvTriple;
use image::Rgb;

/// Convert an RGB pixel to 8-bit HSV
///
/// Hue is halved to fit a byte (0-179); saturation and value span 0-255.
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> HsvTriple {
    let [r, g, b] = pixel.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let v = max;
    let s = if max == 0 {
        0.0
    } else {
        delta * 255.0 / max as f32
    };

    let (r, g, b) = (r as f32, g as f32, b as f32);
    let mut h = if delta == 0.0 {
        0.0
    } else if max as f32 == r {
        60.0 * (g - b) / delta
    } else if max as f32 == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    // 359.x degrees rounds to 180, which wraps back to red
    let h = ((h / 2.0).round() as u16 % 180) as u8;
    [h, s.round().clamp(0.0, 255.0) as u8, v]
}

/// Inclusive per-channel range test
pub fn in_range(hsv: &HsvTriple, lower: &HsvTriple, upper: &HsvTriple) -> bool {
    hsv.iter()
        .zip(lower.iter().zip(upper.iter()))
        .all(|(c, (lo, hi))| lo <= c && c <= hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), [120, 255, 255]);
    }

    #[test]
    fn test_greys_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), [0, 0, 0]);
        assert_eq!(rgb_to_hsv(&Rgb([128, 128, 128])), [0, 0, 128]);
    }

    #[test]
    fn test_skin_tone_lands_in_default_range() {
        let hsv = rgb_to_hsv(&Rgb([220, 150, 120]));
        assert_eq!(hsv, [9, 116, 220]);
        assert!(in_range(&hsv, &[0, 20, 70], &[20, 255, 255]));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        assert!(in_range(&[0, 20, 70], &[0, 20, 70], &[20, 255, 255]));
        assert!(in_range(&[20, 255, 255], &[0, 20, 70], &[20, 255, 255]));
        assert!(!in_range(&[21, 100, 100], &[0, 20, 70], &[20, 255, 255]));
    }
}
