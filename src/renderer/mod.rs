//! Unified pixel-based renderer.
//!
//! The compositing engine draws into owned [`Framebuffer`]s: a 400×240
//! "top" screen for cover art and a 320×240 "bottom" screen for text. The
//! top screen is stored physically rotated (240 columns × 400 rows, the
//! handheld convention), so all addressing goes through the logical
//! `put`/`get` accessors; output backends convert the buffers to their
//! native format at submission time.

pub mod artwork;
pub mod overlay;
pub mod text;

use std::time::{Duration, Instant};

use crate::state::StateStore;
use overlay::{OverlayAnimation, OverlayKind};
use text::MarqueeCursor;

pub type Rgb = (u8, u8, u8);

pub const TOP_WIDTH: usize = 400;
pub const TOP_HEIGHT: usize = 240;
pub const BOTTOM_WIDTH: usize = 320;
pub const BOTTOM_HEIGHT: usize = 240;

pub const BACKGROUND: Rgb = (30, 215, 96);
pub const PANEL_BACKGROUND: Rgb = (18, 18, 24);
pub const BORDER_COLOR: Rgb = (255, 255, 255);
pub const SHADOW_COLOR: Rgb = (0, 0, 0);
pub const TEXT_PRIMARY: Rgb = (255, 255, 255);
pub const TEXT_SECONDARY: Rgb = (190, 190, 200);
pub const TEXT_ERROR: Rgb = (235, 80, 80);
pub const TEXT_SHADOW: Rgb = (10, 10, 12);

/// Owned pixel buffer, 3 bytes per pixel in BGR order.
///
/// When `rotated` is set the logical surface is width×height but storage is
/// height columns × width rows, matching a display panel mounted sideways.
/// Non-rotated targets simply skip the transform.
pub struct Framebuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    rotated: bool,
}

impl Framebuffer {
    pub fn top_screen() -> Self {
        Self::new(TOP_WIDTH, TOP_HEIGHT, true)
    }

    pub fn bottom_screen() -> Self {
        Self::new(BOTTOM_WIDTH, BOTTOM_HEIGHT, false)
    }

    pub fn new(width: usize, height: usize, rotated: bool) -> Self {
        Self {
            data: vec![0u8; width * height * 3],
            width,
            height,
            rotated,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Byte index for a logical coordinate, `None` when off-surface.
    /// Computed indices near the edges can exceed the buffer, so the bounds
    /// check happens here, once, for every access path.
    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        let idx = if self.rotated {
            ((self.height - 1 - y) + x * self.height) * 3
        } else {
            (y * self.width + x) * 3
        };
        if idx + 2 < self.data.len() {
            Some(idx)
        } else {
            None
        }
    }

    #[inline]
    pub fn put(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(idx) = self.index(x, y) {
            self.data[idx] = color.2;
            self.data[idx + 1] = color.1;
            self.data[idx + 2] = color.0;
        }
    }

    /// Alpha-blend `color` over the existing pixel, `alpha` in 0..=255.
    #[inline]
    pub fn blend(&mut self, x: i32, y: i32, color: Rgb, alpha: u8) {
        if alpha == 0 {
            return;
        }
        if alpha == 255 {
            self.put(x, y, color);
            return;
        }
        if let Some(idx) = self.index(x, y) {
            let a = alpha as u16;
            let inv = 255 - a;
            let mix = |src: u8, dst: u8| ((src as u16 * a + dst as u16 * inv + 127) / 255) as u8;
            self.data[idx] = mix(color.2, self.data[idx]);
            self.data[idx + 1] = mix(color.1, self.data[idx + 1]);
            self.data[idx + 2] = mix(color.0, self.data[idx + 2]);
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Rgb {
        match self.index(x, y) {
            Some(idx) => (self.data[idx + 2], self.data[idx + 1], self.data[idx]),
            None => (0, 0, 0),
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        for px in self.data.chunks_exact_mut(3) {
            px[0] = color.2;
            px[1] = color.1;
            px[2] = color.0;
        }
    }

    /// Raw storage-order bytes, for backends that take the buffer whole.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Render the top screen: background, composited cover art, overlay.
pub fn render_frame(fb: &mut Framebuffer, overlay: &mut OverlayAnimation, store: &mut StateStore) {
    fb.fill(BACKGROUND);

    let layout = store
        .cover
        .as_ref()
        .and_then(|art| artwork::draw_cover(fb, art));

    let desired = if store.play_flash {
        OverlayKind::TransientPlay
    } else if !store.media.is_playing {
        OverlayKind::Pause
    } else {
        OverlayKind::None
    };
    overlay.step(desired);
    if overlay.kind == OverlayKind::TransientPlay && overlay.alpha == 255 {
        // Flash acknowledged; the overlay now fades back out on its own.
        store.play_flash = false;
    }
    overlay::draw(fb, layout, overlay);
}

/// Marquee cursors and change tracking for the bottom screen labels.
pub struct InfoPanel {
    marquee_step: Duration,
    track_cursor: MarqueeCursor,
    artist_cursor: MarqueeCursor,
    last_track: String,
    last_artist: String,
}

impl InfoPanel {
    pub fn new(marquee_step: Duration) -> Self {
        Self {
            marquee_step,
            track_cursor: MarqueeCursor::default(),
            artist_cursor: MarqueeCursor::default(),
            last_track: String::new(),
            last_artist: String::new(),
        }
    }
}

impl Default for InfoPanel {
    fn default() -> Self {
        Self::new(text::MARQUEE_STEP)
    }
}

/// Render the bottom screen: status line, marquee labels, device/volume,
/// and the transient error line.
pub fn render_panel(fb: &mut Framebuffer, panel: &mut InfoPanel, store: &StateStore, now: Instant) {
    fb.fill(PANEL_BACKGROUND);

    let media = &store.media;
    if media.track != panel.last_track {
        panel.track_cursor.reset();
        panel.last_track = media.track.clone();
    }
    if media.artist != panel.last_artist {
        panel.artist_cursor.reset();
        panel.last_artist = media.artist.clone();
    }

    let status = if media.is_playing {
        "NOW PLAYING:"
    } else {
        "PLAYBACK PAUSED:"
    };
    text::draw_centered(fb, status, 28, 1, TEXT_SECONDARY);

    let step = panel.marquee_step;
    text::render_label(fb, &media.track, 84, 2, TEXT_PRIMARY, &mut panel.track_cursor, now, step);
    text::render_label(fb, &media.artist, 124, 2, TEXT_SECONDARY, &mut panel.artist_cursor, now, step);

    let volume = match media.volume_percent {
        Some(v) => format!("VOL {}%", v),
        None => "VOL --".to_string(),
    };
    let device_line = format!("{}  {}", media.device, volume);
    text::draw_centered(fb, &device_line, 180, 1, TEXT_SECONDARY);

    if store.fetch_failed {
        text::draw_centered(fb, "ERROR FETCHING DATA FROM SERVER", 216, 1, TEXT_ERROR);
    }
}
