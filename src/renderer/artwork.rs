//! Cover art compositing: scale-to-fit, rounded corners, border, shadow.

use super::{Framebuffer, BORDER_COLOR, SHADOW_COLOR};
use crate::state::CoverArt;

pub const BORDER_WIDTH: i32 = 4;
pub const PADDING: i32 = 10;
pub const CORNER_RADIUS: i32 = 8;
pub const SHADOW_OFFSET: i32 = 4;
pub const SHADOW_BLUR: f32 = 6.0;
pub const SHADOW_MAX_ALPHA: u8 = 110;

/// Placement of the scaled image on the target surface, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtLayout {
    pub x0: i32,
    pub y0: i32,
    pub width: i32,
    pub height: i32,
}

/// Largest scale factor ≤ 1 that fits the image in the available area while
/// preserving aspect ratio.
pub fn fit_scale(img_w: u32, img_h: u32, avail_w: i32, avail_h: i32) -> f32 {
    let sx = avail_w as f32 / img_w as f32;
    let sy = avail_h as f32 / img_h as f32;
    sx.min(sy).min(1.0)
}

/// Rounded-rect membership via squared-distance corner tests, no sqrt.
/// `x1`/`y1` are exclusive. Corner circle centers sit one pixel inside the
/// far edges so the test is symmetric under 90° rotation of a square shape.
pub fn rounded_rect_contains(x: i32, y: i32, x0: i32, y0: i32, x1: i32, y1: i32, r: i32) -> bool {
    if x < x0 || x >= x1 || y < y0 || y >= y1 {
        return false;
    }
    if r <= 0 {
        return true;
    }
    let cx = if x < x0 + r {
        Some(x0 + r)
    } else if x > x1 - 1 - r {
        Some(x1 - 1 - r)
    } else {
        None
    };
    let cy = if y < y0 + r {
        Some(y0 + r)
    } else if y > y1 - 1 - r {
        Some(y1 - 1 - r)
    } else {
        None
    };
    match (cx, cy) {
        (Some(cx), Some(cy)) => {
            let dx = x - cx;
            let dy = y - cy;
            dx * dx + dy * dy <= r * r
        }
        _ => true,
    }
}

/// Signed distance from a point to the boundary of a rounded rectangle:
/// distance to the radius-shrunk inner rectangle, minus the radius.
/// Negative inside the shape. This is the one place that needs a sqrt.
pub fn rounded_rect_distance(x: f32, y: f32, x0: f32, y0: f32, x1: f32, y1: f32, r: f32) -> f32 {
    let cx = (x0 + x1) * 0.5;
    let cy = (y0 + y1) * 0.5;
    let hw = ((x1 - x0) * 0.5 - r).max(0.0);
    let hh = ((y1 - y0) * 0.5 - r).max(0.0);
    let qx = ((x - cx).abs() - hw).max(0.0);
    let qy = ((y - cy).abs() - hh).max(0.0);
    (qx * qx + qy * qy).sqrt() - r
}

/// The fixed radius only makes sense when the shape is clearly larger than
/// it; small images degrade to square corners.
fn corner_radius_for(w: i32, h: i32) -> i32 {
    CORNER_RADIUS.min(w.min(h) / 3)
}

/// Composite the cover art onto the surface: drop shadow, rounded white
/// border, then the scaled image over the border. Returns the image rect,
/// or `None` for degenerate sources.
pub fn draw_cover(fb: &mut Framebuffer, art: &CoverArt) -> Option<ArtLayout> {
    if art.width == 0 || art.height == 0 {
        return None;
    }

    let fw = fb.width() as i32;
    let fh = fb.height() as i32;
    let avail_w = fw - 2 * (BORDER_WIDTH + PADDING);
    let avail_h = fh - 2 * (BORDER_WIDTH + PADDING);

    let scale = fit_scale(art.width, art.height, avail_w, avail_h);
    let scaled_w = ((art.width as f32 * scale) as i32).clamp(1, avail_w);
    let scaled_h = ((art.height as f32 * scale) as i32).clamp(1, avail_h);

    let x0 = (fw - scaled_w) / 2;
    let y0 = (fh - scaled_h) / 2;
    let x1 = x0 + scaled_w;
    let y1 = y0 + scaled_h;

    let ox0 = x0 - BORDER_WIDTH;
    let oy0 = y0 - BORDER_WIDTH;
    let ox1 = x1 + BORDER_WIDTH;
    let oy1 = y1 + BORDER_WIDTH;

    let radius = corner_radius_for(scaled_w, scaled_h);
    let outer_radius = radius + BORDER_WIDTH;

    draw_shadow(fb, ox0, oy0, ox1, oy1, outer_radius);

    for y in oy0..oy1 {
        for x in ox0..ox1 {
            if rounded_rect_contains(x, y, ox0, oy0, ox1, oy1, outer_radius) {
                fb.put(x, y, BORDER_COLOR);
            }
        }
    }

    // Inverse-map each destination pixel to its source pixel, overwriting
    // the border inside the image's rounded rect. Alpha is dropped, the
    // surface is opaque.
    let inv = 1.0 / scale;
    for sy in 0..scaled_h {
        let pos_y = y0 + sy;
        let src_y = ((sy as f32 * inv) as u32).min(art.height - 1);
        for sx in 0..scaled_w {
            let pos_x = x0 + sx;
            if !rounded_rect_contains(pos_x, pos_y, x0, y0, x1, y1, radius) {
                continue;
            }
            let src_x = ((sx as f32 * inv) as u32).min(art.width - 1);
            fb.put(pos_x, pos_y, art.pixel(src_x, src_y));
        }
    }

    Some(ArtLayout {
        x0,
        y0,
        width: scaled_w,
        height: scaled_h,
    })
}

/// Soft rectangular shadow, offset diagonally from the subject. Opacity
/// falls off linearly from the boundary to zero at the blur margin; pixels
/// inside the subject are left untouched.
fn draw_shadow(fb: &mut Framebuffer, ox0: i32, oy0: i32, ox1: i32, oy1: i32, radius: i32) {
    let sx0 = ox0 + SHADOW_OFFSET;
    let sy0 = oy0 + SHADOW_OFFSET;
    let sx1 = ox1 + SHADOW_OFFSET;
    let sy1 = oy1 + SHADOW_OFFSET;
    let blur = SHADOW_BLUR;
    let margin = blur.ceil() as i32;

    for y in (sy0 - margin)..(sy1 + margin) {
        for x in (sx0 - margin)..(sx1 + margin) {
            if rounded_rect_contains(x, y, ox0, oy0, ox1, oy1, radius) {
                continue;
            }
            let d = rounded_rect_distance(
                x as f32,
                y as f32,
                sx0 as f32,
                sy0 as f32,
                sx1 as f32,
                sy1 as f32,
                radius as f32,
            );
            if d >= blur {
                continue;
            }
            // d <= 0 is the sliver of the offset shape the subject does not
            // cover; it gets the full shadow opacity.
            let alpha = if d <= 0.0 {
                SHADOW_MAX_ALPHA
            } else {
                (SHADOW_MAX_ALPHA as f32 * (1.0 - d / blur)) as u8
            };
            fb.blend(x, y, SHADOW_COLOR, alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{BACKGROUND, TOP_HEIGHT, TOP_WIDTH};

    fn flat_art(w: u32, h: u32, rgb: (u8, u8, u8)) -> CoverArt {
        let mut pixels = Vec::with_capacity((w * h * 4) as usize);
        for _ in 0..w * h {
            pixels.extend_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        CoverArt::new(pixels, w, h).unwrap()
    }

    #[test]
    fn fit_scale_never_exceeds_available_area() {
        for (w, h) in [(640, 640), (1024, 300), (3, 2000), (372, 212)] {
            let s = fit_scale(w, h, 372, 212);
            let sw = (w as f32 * s) as i32;
            let sh = (h as f32 * s) as i32;
            assert!(sw <= 372, "{}x{} scaled to width {}", w, h, sw);
            assert!(sh <= 212, "{}x{} scaled to height {}", w, h, sh);
        }
    }

    #[test]
    fn fit_scale_is_capped_at_one() {
        assert_eq!(fit_scale(2, 2, 372, 212), 1.0);
    }

    #[test]
    fn fit_scale_preserves_aspect_ratio_within_a_pixel() {
        let (w, h) = (640u32, 480u32);
        let s = fit_scale(w, h, 372, 212);
        let sw = (w as f32 * s) as i32;
        let sh = (h as f32 * s) as i32;
        let expected_sw = (sh as f32 * w as f32 / h as f32) as i32;
        assert!((sw - expected_sw).abs() <= 1);
    }

    #[test]
    fn membership_symmetric_under_quarter_rotation() {
        let s = 40;
        let r = 8;
        for y in 0..s {
            for x in 0..s {
                let original = rounded_rect_contains(x, y, 0, 0, s, s, r);
                let rotated = rounded_rect_contains(s - 1 - y, x, 0, 0, s, s, r);
                assert_eq!(original, rotated, "asymmetry at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn membership_rejects_outside_and_corner_pixels() {
        assert!(!rounded_rect_contains(-1, 5, 0, 0, 20, 20, 4));
        assert!(!rounded_rect_contains(0, 0, 0, 0, 20, 20, 4));
        assert!(rounded_rect_contains(10, 10, 0, 0, 20, 20, 4));
        assert!(rounded_rect_contains(0, 10, 0, 0, 20, 20, 4));
    }

    #[test]
    fn distance_is_zero_on_edge_and_grows_outside() {
        let d_edge = rounded_rect_distance(25.0, 10.0, 5.0, 5.0, 25.0, 25.0, 0.0);
        assert!(d_edge.abs() < 1e-5);
        let d_out = rounded_rect_distance(30.0, 10.0, 5.0, 5.0, 25.0, 25.0, 0.0);
        assert!((d_out - 5.0).abs() < 1e-5);
        let d_in = rounded_rect_distance(15.0, 15.0, 5.0, 5.0, 25.0, 25.0, 4.0);
        assert!(d_in < 0.0);
    }

    #[test]
    fn degenerate_layout_is_skipped() {
        let mut fb = Framebuffer::top_screen();
        fb.fill(BACKGROUND);
        let art = CoverArt {
            pixels: vec![],
            width: 0,
            height: 0,
        };
        assert!(draw_cover(&mut fb, &art).is_none());
        assert_eq!(fb.get(200, 120), BACKGROUND);
    }

    #[test]
    fn large_cover_is_centered_and_sampled() {
        let mut fb = Framebuffer::top_screen();
        let art = flat_art(640, 640, (120, 40, 200));
        let layout = draw_cover(&mut fb, &art).unwrap();
        assert!(layout.width <= TOP_WIDTH as i32 - 2 * (BORDER_WIDTH + PADDING));
        assert!(layout.height <= TOP_HEIGHT as i32 - 2 * (BORDER_WIDTH + PADDING));
        // Square art in a wide screen: height-bound, roughly centered.
        assert_eq!(layout.height, 212);
        let cx = layout.x0 + layout.width / 2;
        let cy = layout.y0 + layout.height / 2;
        assert_eq!(fb.get(cx, cy), (120, 40, 200));
        // Just outside the image, inside the border ring.
        assert_eq!(fb.get(layout.x0 - 1, cy), BORDER_COLOR);
    }
}
