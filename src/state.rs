//! Now-playing state store.
//!
//! The orchestrator is the only writer; the renderer only reads. Snapshots
//! are replaced wholesale so a frame never observes a half-merged update.

/// Current playback snapshot as reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaState {
    pub track: String,
    pub artist: String,
    pub device: String,
    /// 0..=100, `None` when the server did not report a volume.
    pub volume_percent: Option<u8>,
    pub is_playing: bool,
    pub cover_art_url: String,
}

pub const UNKNOWN: &str = "Unknown";

impl Default for MediaState {
    fn default() -> Self {
        Self {
            track: UNKNOWN.to_string(),
            artist: UNKNOWN.to_string(),
            device: UNKNOWN.to_string(),
            volume_percent: None,
            is_playing: false,
            cover_art_url: String::new(),
        }
    }
}

/// Decoded cover art. `pixels` is tightly packed RGBA.
#[derive(Debug, Clone)]
pub struct CoverArt {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CoverArt {
    /// Returns `None` when dimensions are zero or the buffer length does not
    /// match `width * height * 4`.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = (y * self.width as usize + x) * 4;
        (self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }
}

/// Everything the render loop reads each frame. Mutated only from the main
/// loop, inside the orchestrator's merge step or the input dispatcher.
#[derive(Default)]
pub struct StateStore {
    pub media: MediaState,
    pub cover: Option<CoverArt>,
    /// Raised when the last now-playing fetch failed; drives the error line.
    pub fetch_failed: bool,
    /// Transient "just requested play" flag, consumed by the overlay.
    pub play_flash: bool,
}

impl StateStore {
    /// Replace the whole snapshot. Old values are dropped, never patched.
    pub fn publish(&mut self, media: MediaState) {
        self.media = media;
        self.fetch_failed = false;
    }

    /// Install freshly decoded art, releasing the previous buffer.
    pub fn publish_cover(&mut self, art: CoverArt) {
        self.cover = Some(art);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_uses_sentinels() {
        let m = MediaState::default();
        assert_eq!(m.track, UNKNOWN);
        assert_eq!(m.artist, UNKNOWN);
        assert_eq!(m.volume_percent, None);
        assert!(!m.is_playing);
        assert!(m.cover_art_url.is_empty());
    }

    #[test]
    fn cover_art_rejects_mismatched_buffer() {
        assert!(CoverArt::new(vec![0; 16], 2, 2).is_some());
        assert!(CoverArt::new(vec![0; 15], 2, 2).is_none());
        assert!(CoverArt::new(vec![], 0, 0).is_none());
        assert!(CoverArt::new(vec![0; 4], 1, 0).is_none());
    }

    #[test]
    fn pixel_lookup_clamps_to_edges() {
        let art = CoverArt::new(vec![255; 16], 2, 2).unwrap();
        assert_eq!(art.pixel(9, 9), (255, 255, 255));
    }

    #[test]
    fn publish_clears_failure_flag() {
        let mut store = StateStore {
            fetch_failed: true,
            ..Default::default()
        };
        store.publish(MediaState::default());
        assert!(!store.fetch_failed);
    }
}
