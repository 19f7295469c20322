//! Bitmap font label rendering with marquee scrolling.
//!
//! Labels are drawn with an 8×8 bitmap font. Text that fits the field is
//! centered; oversized text becomes a sliding window over the string
//! treated as circular with a spacer gap appended, advanced on a fixed
//! cadence. Each label carries a 1-pixel-offset dark shadow copy.

use std::time::{Duration, Instant};

use super::{Framebuffer, Rgb, TEXT_SHADOW};

const GLYPH_SIZE: usize = 8;
/// Horizontal margin of the label field on each side.
const H_MARGIN: usize = 8;
/// Spacer appended between repetitions of oversized text.
pub const MARQUEE_GAP: usize = 3;
/// Default delay between marquee steps; overridable through config.
pub const MARQUEE_STEP: Duration = Duration::from_millis(200);

#[inline]
fn advance_px(scale: usize) -> usize {
    (GLYPH_SIZE + 1) * scale
}

/// Scroll position of one label.
#[derive(Debug, Default)]
pub struct MarqueeCursor {
    scroll_offset: usize,
    last_advance: Option<Instant>,
}

impl MarqueeCursor {
    pub fn offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn reset(&mut self) {
        self.scroll_offset = 0;
        self.last_advance = None;
    }

    /// Step the window one character, at most once per `step`.
    fn advance(&mut self, now: Instant, loop_len: usize, step: Duration) {
        match self.last_advance {
            None => self.last_advance = Some(now),
            Some(last) if now.duration_since(last) >= step => {
                self.scroll_offset = (self.scroll_offset + 1) % loop_len;
                self.last_advance = Some(now);
            }
            Some(_) => {}
        }
    }
}

/// Draw `text` at `y`: centered when it fits the field, otherwise a
/// scrolling window advanced through `cursor`.
pub fn render_label(
    fb: &mut Framebuffer,
    text: &str,
    y: i32,
    scale: usize,
    color: Rgb,
    cursor: &mut MarqueeCursor,
    now: Instant,
    step: Duration,
) {
    let chars: Vec<char> = text.chars().collect();
    let adv = advance_px(scale);
    let field_chars = (fb.width().saturating_sub(2 * H_MARGIN)) / adv;
    if field_chars == 0 {
        return;
    }

    if chars.len() <= field_chars {
        cursor.reset();
        let x = ((fb.width() - chars.len() * adv) / 2) as i32;
        draw_run(fb, &chars, x + 1, y + 1, scale, TEXT_SHADOW);
        draw_run(fb, &chars, x, y, scale, color);
        return;
    }

    let loop_len = chars.len() + MARQUEE_GAP;
    cursor.advance(now, loop_len, step);

    let window: Vec<char> = (0..field_chars)
        .map(|i| {
            let idx = (cursor.scroll_offset + i) % loop_len;
            if idx < chars.len() {
                chars[idx]
            } else {
                ' '
            }
        })
        .collect();

    let x = H_MARGIN as i32;
    // The shadow stops one character short so it never overhangs the edge
    // of the visible window.
    draw_run(fb, &window[..window.len() - 1], x + 1, y + 1, scale, TEXT_SHADOW);
    draw_run(fb, &window, x, y, scale, color);
}

/// Centered static text with its shadow copy. Used for status lines that
/// are known to fit.
pub fn draw_centered(fb: &mut Framebuffer, text: &str, y: i32, scale: usize, color: Rgb) {
    let chars: Vec<char> = text.chars().collect();
    let adv = advance_px(scale);
    let width = chars.len() * adv;
    let x = (fb.width().saturating_sub(width) / 2) as i32;
    draw_run(fb, &chars, x + 1, y + 1, scale, TEXT_SHADOW);
    draw_run(fb, &chars, x, y, scale, color);
}

fn draw_run(fb: &mut Framebuffer, chars: &[char], x: i32, y: i32, scale: usize, color: Rgb) {
    let adv = advance_px(scale) as i32;
    for (i, &ch) in chars.iter().enumerate() {
        draw_char(fb, x + i as i32 * adv, y, ch, scale, color);
    }
}

fn draw_char(fb: &mut Framebuffer, x: i32, y: i32, ch: char, scale: usize, color: Rgb) {
    let bitmap = match glyph(ch) {
        Some(b) => b,
        None => return,
    };
    for (row_idx, &row) in bitmap.iter().enumerate() {
        for col in 0..8 {
            if (row >> (7 - col)) & 1 == 1 {
                for sy in 0..scale {
                    for sx in 0..scale {
                        fb.put(
                            x + (col * scale + sx) as i32,
                            y + (row_idx * scale + sy) as i32,
                            color,
                        );
                    }
                }
            }
        }
    }
}

/// Simple 8x8 bitmap font. Each character is eight bytes, one per row.
fn glyph(ch: char) -> Option<[u8; 8]> {
    let ch = ch.to_ascii_uppercase();
    Some(match ch {
        'A' => [0x18, 0x24, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x00],
        'B' => [0x7C, 0x42, 0x7C, 0x42, 0x42, 0x42, 0x7C, 0x00],
        'C' => [0x3C, 0x42, 0x40, 0x40, 0x40, 0x42, 0x3C, 0x00],
        'D' => [0x78, 0x44, 0x42, 0x42, 0x42, 0x44, 0x78, 0x00],
        'E' => [0x7E, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x7E, 0x00],
        'F' => [0x7E, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x40, 0x00],
        'G' => [0x3C, 0x42, 0x40, 0x4E, 0x42, 0x42, 0x3C, 0x00],
        'H' => [0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x42, 0x00],
        'I' => [0x3E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00],
        'J' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x44, 0x38, 0x00],
        'K' => [0x42, 0x44, 0x78, 0x48, 0x44, 0x42, 0x42, 0x00],
        'L' => [0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x7E, 0x00],
        'M' => [0x42, 0x66, 0x5A, 0x42, 0x42, 0x42, 0x42, 0x00],
        'N' => [0x42, 0x62, 0x52, 0x4A, 0x46, 0x42, 0x42, 0x00],
        'O' => [0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00],
        'P' => [0x7C, 0x42, 0x42, 0x7C, 0x40, 0x40, 0x40, 0x00],
        'Q' => [0x3C, 0x42, 0x42, 0x42, 0x4A, 0x44, 0x3A, 0x00],
        'R' => [0x7C, 0x42, 0x42, 0x7C, 0x48, 0x44, 0x42, 0x00],
        'S' => [0x3C, 0x42, 0x30, 0x0C, 0x02, 0x42, 0x3C, 0x00],
        'T' => [0x7F, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00],
        'U' => [0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00],
        'V' => [0x42, 0x42, 0x42, 0x42, 0x24, 0x24, 0x18, 0x00],
        'W' => [0x42, 0x42, 0x42, 0x5A, 0x5A, 0x66, 0x42, 0x00],
        'X' => [0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x42, 0x00],
        'Y' => [0x41, 0x22, 0x14, 0x08, 0x08, 0x08, 0x08, 0x00],
        'Z' => [0x7E, 0x04, 0x08, 0x10, 0x20, 0x40, 0x7E, 0x00],
        '0' => [0x3C, 0x42, 0x46, 0x5A, 0x62, 0x42, 0x3C, 0x00],
        '1' => [0x08, 0x18, 0x28, 0x08, 0x08, 0x08, 0x3E, 0x00],
        '2' => [0x3C, 0x42, 0x02, 0x0C, 0x30, 0x40, 0x7E, 0x00],
        '3' => [0x3C, 0x42, 0x02, 0x1C, 0x02, 0x42, 0x3C, 0x00],
        '4' => [0x04, 0x0C, 0x14, 0x24, 0x7E, 0x04, 0x04, 0x00],
        '5' => [0x7E, 0x40, 0x7C, 0x02, 0x02, 0x42, 0x3C, 0x00],
        '6' => [0x1C, 0x20, 0x40, 0x7C, 0x42, 0x42, 0x3C, 0x00],
        '7' => [0x7E, 0x02, 0x04, 0x08, 0x10, 0x10, 0x10, 0x00],
        '8' => [0x3C, 0x42, 0x42, 0x3C, 0x42, 0x42, 0x3C, 0x00],
        '9' => [0x3C, 0x42, 0x42, 0x3E, 0x02, 0x04, 0x38, 0x00],
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x08, 0x10],
        '!' => [0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x08, 0x00],
        '?' => [0x3C, 0x42, 0x02, 0x0C, 0x10, 0x00, 0x10, 0x00],
        ':' => [0x00, 0x18, 0x18, 0x00, 0x18, 0x18, 0x00, 0x00],
        '\'' => [0x08, 0x08, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00],
        '"' => [0x24, 0x24, 0x48, 0x00, 0x00, 0x00, 0x00, 0x00],
        '(' => [0x04, 0x08, 0x10, 0x10, 0x10, 0x08, 0x04, 0x00],
        ')' => [0x20, 0x10, 0x08, 0x08, 0x08, 0x10, 0x20, 0x00],
        '&' => [0x30, 0x48, 0x30, 0x50, 0x4A, 0x44, 0x3A, 0x00],
        '%' => [0x62, 0x64, 0x08, 0x10, 0x26, 0x46, 0x00, 0x00],
        '/' => [0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x00, 0x00],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Framebuffer {
        Framebuffer::bottom_screen()
    }

    #[test]
    fn fitting_text_never_scrolls() {
        let mut fb = screen();
        let mut cursor = MarqueeCursor::default();
        let t0 = Instant::now();
        for i in 0..20u32 {
            let now = t0 + MARQUEE_STEP * i;
            render_label(&mut fb, "SHORT", 40, 2, (255, 255, 255), &mut cursor, now, MARQUEE_STEP);
        }
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn oversized_text_offset_stays_in_loop_range() {
        let mut fb = screen();
        let mut cursor = MarqueeCursor::default();
        let text = "A VERY LONG TRACK TITLE THAT CANNOT POSSIBLY FIT";
        let loop_len = text.chars().count() + MARQUEE_GAP;
        let t0 = Instant::now();
        let mut seen_nonzero = false;
        for i in 0..(loop_len as u32 * 3) {
            let now = t0 + MARQUEE_STEP * (i + 1);
            render_label(&mut fb, text, 40, 2, (255, 255, 255), &mut cursor, now, MARQUEE_STEP);
            assert!(cursor.offset() < loop_len);
            seen_nonzero |= cursor.offset() != 0;
        }
        assert!(seen_nonzero, "marquee never advanced");
    }

    #[test]
    fn offset_resets_when_text_fits_again() {
        let mut fb = screen();
        let mut cursor = MarqueeCursor::default();
        let long = "A VERY LONG TRACK TITLE THAT CANNOT POSSIBLY FIT";
        let t0 = Instant::now();
        for i in 0..10u32 {
            let now = t0 + MARQUEE_STEP * (i + 1);
            render_label(&mut fb, long, 40, 2, (255, 255, 255), &mut cursor, now, MARQUEE_STEP);
        }
        assert!(cursor.offset() > 0);
        render_label(&mut fb, "OK", 40, 2, (255, 255, 255), &mut cursor, t0, MARQUEE_STEP);
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn advance_is_rate_limited() {
        let mut cursor = MarqueeCursor::default();
        let t0 = Instant::now();
        cursor.advance(t0, 10, MARQUEE_STEP);
        cursor.advance(t0 + Duration::from_millis(50), 10, MARQUEE_STEP);
        cursor.advance(t0 + Duration::from_millis(100), 10, MARQUEE_STEP);
        assert_eq!(cursor.offset(), 0);
        cursor.advance(t0 + MARQUEE_STEP, 10, MARQUEE_STEP);
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn step_delay_is_configurable() {
        let mut cursor = MarqueeCursor::default();
        let t0 = Instant::now();
        let step = Duration::from_millis(50);
        cursor.advance(t0, 10, step);
        // Too soon for the default cadence, late enough for this one.
        cursor.advance(t0 + Duration::from_millis(50), 10, step);
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn centered_text_marks_pixels() {
        let mut fb = screen();
        draw_centered(&mut fb, "HI", 100, 2, (200, 10, 10));
        let mut hit = false;
        for y in 100..120 {
            for x in 0..fb.width() as i32 {
                if fb.get(x, y) == (200, 10, 10) {
                    hit = true;
                }
            }
        }
        assert!(hit);
    }
}
