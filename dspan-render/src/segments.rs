//! Seven-segment numerals. Stimulus digits and chart values are drawn with
//! plain rectangles so a presentation never depends on a font being found.

use tiny_skia::{Paint, Pixmap, Rect, Transform};

// Segment bits: a=top, b=upper right, c=lower right, d=bottom,
// e=lower left, f=upper left, g=middle.
const DIGIT_SEGMENTS: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];

/// Width of one numeral cell for a given height.
pub fn digit_width(height: f32) -> f32 {
    height * 0.55
}

/// Horizontal advance between numerals of a given height.
pub fn digit_advance(height: f32) -> f32 {
    digit_width(height) * 1.35
}

pub fn digits_width(count: usize, height: f32) -> f32 {
    if count == 0 {
        0.0
    } else {
        digit_advance(height) * (count - 1) as f32 + digit_width(height)
    }
}

/// Draws `digit` (0..=9) with its top-left corner at `(x, y)`.
pub fn draw_digit(canvas: &mut Pixmap, digit: u8, x: f32, y: f32, height: f32, color: [u8; 4]) {
    let Some(&mask) = DIGIT_SEGMENTS.get(digit as usize) else {
        return;
    };
    let w = digit_width(height);
    let t = (w * 0.18).max(1.0);
    let gap = t * 0.2;
    let half = height / 2.0;

    let segments = [
        (x + t, y, w - 2.0 * t, t),
        (x + w - t, y + t + gap, t, half - 1.5 * t - 2.0 * gap),
        (x + w - t, y + half + t / 2.0 + gap, t, half - 1.5 * t - 2.0 * gap),
        (x + t, y + height - t, w - 2.0 * t, t),
        (x, y + half + t / 2.0 + gap, t, half - 1.5 * t - 2.0 * gap),
        (x, y + t + gap, t, half - 1.5 * t - 2.0 * gap),
        (x + t, y + half - t / 2.0, w - 2.0 * t, t),
    ];

    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;

    for (bit, &(sx, sy, sw, sh)) in segments.iter().enumerate() {
        if mask & (1 << bit) == 0 {
            continue;
        }
        if let Some(rect) = Rect::from_xywh(sx, sy, sw, sh) {
            canvas.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}

/// Draws every ASCII digit of `text` centred on `center`. Other characters
/// leave an empty cell.
pub fn draw_number_centered(
    canvas: &mut Pixmap,
    text: &str,
    center: (f32, f32),
    height: f32,
    color: [u8; 4],
) {
    let count = text.chars().count();
    let mut x = center.0 - digits_width(count, height) / 2.0;
    let y = center.1 - height / 2.0;
    for ch in text.chars() {
        if let Some(d) = ch.to_digit(10) {
            draw_digit(canvas, d as u8, x, y, height, color);
        }
        x += digit_advance(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_pixels(pm: &Pixmap) -> usize {
        pm.pixels().iter().filter(|p| p.alpha() > 0).count()
    }

    #[test]
    fn eight_lights_more_than_one() {
        let mut one = Pixmap::new(60, 100).unwrap();
        let mut eight = Pixmap::new(60, 100).unwrap();
        draw_digit(&mut one, 1, 5.0, 5.0, 80.0, [255; 4]);
        draw_digit(&mut eight, 8, 5.0, 5.0, 80.0, [255; 4]);
        assert!(lit_pixels(&one) > 0);
        assert!(lit_pixels(&eight) > 2 * lit_pixels(&one));
    }

    #[test]
    fn out_of_range_digit_draws_nothing() {
        let mut pm = Pixmap::new(60, 100).unwrap();
        draw_digit(&mut pm, 12, 5.0, 5.0, 80.0, [255; 4]);
        assert_eq!(lit_pixels(&pm), 0);
    }

    #[test]
    fn width_grows_with_digit_count() {
        assert_eq!(digits_width(0, 50.0), 0.0);
        assert!(digits_width(3, 50.0) > digits_width(2, 50.0));
    }
}
