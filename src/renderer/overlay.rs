//! Fading play/pause glyph drawn over the cover art.

use super::artwork::{rounded_rect_contains, ArtLayout};
use super::Framebuffer;

/// Per-frame alpha delta for the fade.
pub const FADE_STEP: u8 = 18;
/// Panel background opacity at full fade.
const PANEL_ALPHA: u8 = 170;
const PANEL_MIN_SIDE: i32 = 56;
const PANEL_RADIUS: i32 = 10;
const PANEL_COLOR: (u8, u8, u8) = (12, 12, 16);
const GLYPH_COLOR: (u8, u8, u8) = (255, 255, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayKind {
    #[default]
    None,
    /// Shown briefly after the user requests play, then fades out.
    TransientPlay,
    Pause,
}

/// The glyph state machine. `alpha` moves monotonically toward its target
/// each frame and the kind only resets once the fade has fully run out, so
/// a glyph always fades instead of vanishing.
#[derive(Debug, Default)]
pub struct OverlayAnimation {
    pub kind: OverlayKind,
    pub alpha: u8,
}

impl OverlayAnimation {
    /// Advance one frame toward `desired`. A newly desired glyph takes over
    /// immediately when nothing is on screen; otherwise the current glyph
    /// finishes fading out first.
    pub fn step(&mut self, desired: OverlayKind) {
        if desired != OverlayKind::None && (self.kind == OverlayKind::None || self.alpha == 0) {
            self.kind = desired;
        }
        let target: u8 = if desired != OverlayKind::None && desired == self.kind {
            255
        } else {
            0
        };
        if self.alpha < target {
            self.alpha = self.alpha.saturating_add(FADE_STEP).min(target);
        } else if self.alpha > target {
            self.alpha = self.alpha.saturating_sub(FADE_STEP).max(target);
        }
        if self.alpha == 0 && desired == OverlayKind::None {
            self.kind = OverlayKind::None;
        }
    }

    pub fn active(&self) -> bool {
        self.kind != OverlayKind::None && self.alpha > 0
    }
}

/// Draw the overlay centered on the cover art (or the whole surface when no
/// art is loaded): a rounded dark panel, then the glyph blended toward
/// white by the current alpha.
pub fn draw(fb: &mut Framebuffer, layout: Option<ArtLayout>, overlay: &OverlayAnimation) {
    if !overlay.active() {
        return;
    }

    let (cx, cy, extent) = match layout {
        Some(l) => (
            l.x0 + l.width / 2,
            l.y0 + l.height / 2,
            l.width.min(l.height),
        ),
        None => (
            fb.width() as i32 / 2,
            fb.height() as i32 / 2,
            fb.height() as i32,
        ),
    };
    let side = (extent / 3).max(PANEL_MIN_SIDE);
    let px0 = cx - side / 2;
    let py0 = cy - side / 2;
    let px1 = px0 + side;
    let py1 = py0 + side;

    let panel_alpha = (PANEL_ALPHA as u16 * overlay.alpha as u16 / 255) as u8;
    let radius = PANEL_RADIUS.min(side / 3);
    for y in py0..py1 {
        for x in px0..px1 {
            if rounded_rect_contains(x, y, px0, py0, px1, py1, radius) {
                fb.blend(x, y, PANEL_COLOR, panel_alpha);
            }
        }
    }

    match overlay.kind {
        OverlayKind::TransientPlay => draw_play(fb, px0, py0, side, overlay.alpha),
        OverlayKind::Pause => draw_pause(fb, px0, py0, side, overlay.alpha),
        OverlayKind::None => {}
    }
}

/// Right-pointing triangle via a barycentric-style edge test.
fn draw_play(fb: &mut Framebuffer, px0: i32, py0: i32, side: i32, alpha: u8) {
    let s = side as f32;
    let a = (px0 as f32 + s * 0.36, py0 as f32 + s * 0.28);
    let b = (px0 as f32 + s * 0.36, py0 as f32 + s * 0.72);
    let c = (px0 as f32 + s * 0.76, py0 as f32 + s * 0.50);
    for y in py0..py0 + side {
        for x in px0..px0 + side {
            if point_in_triangle(x as f32 + 0.5, y as f32 + 0.5, a, b, c) {
                fb.blend(x, y, GLYPH_COLOR, alpha);
            }
        }
    }
}

/// Two vertical bars.
fn draw_pause(fb: &mut Framebuffer, px0: i32, py0: i32, side: i32, alpha: u8) {
    let bar_w = (side as f32 * 0.14) as i32;
    let bar_h = (side as f32 * 0.46) as i32;
    let top = py0 + (side - bar_h) / 2;
    let left = px0 + (side as f32 * 0.30) as i32;
    let right = px0 + side - (side as f32 * 0.30) as i32 - bar_w;
    for &bx in &[left, right] {
        for y in top..top + bar_h {
            for x in bx..bx + bar_w {
                fb.blend(x, y, GLYPH_COLOR, alpha);
            }
        }
    }
}

fn edge(px: f32, py: f32, a: (f32, f32), b: (f32, f32)) -> f32 {
    (px - b.0) * (a.1 - b.1) - (a.0 - b.0) * (py - b.1)
}

fn point_in_triangle(px: f32, py: f32, a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let d1 = edge(px, py, a, b);
    let d2 = edge(px, py, b, c);
    let d3 = edge(px, py, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
