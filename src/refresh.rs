//! Refresh orchestration.
//!
//! One now-playing fetch and one cover-art load may be in flight at a time,
//! each running on a background task and reporting back over a oneshot
//! channel. The render loop calls [`Orchestrator::tick`] once per frame; the
//! tick never blocks, it only polls the channels and merges completed
//! results into the [`StateStore`].

use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::client::{FetchClient, FetchError};
use crate::extract;
use crate::state::{CoverArt, MediaState, StateStore, UNKNOWN};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

type StateResult = Result<String, FetchError>;
type ArtResult = Result<CoverArt, FetchError>;

type StateSpawner = Box<dyn Fn() -> oneshot::Receiver<StateResult> + Send>;
type ArtSpawner = Box<dyn Fn(String) -> oneshot::Receiver<ArtResult> + Send>;

struct ArtJob {
    url: String,
    rx: oneshot::Receiver<ArtResult>,
}

pub struct Orchestrator {
    spawn_state: StateSpawner,
    spawn_art: ArtSpawner,
    interval: Duration,
    pending: bool,
    last_refresh: Option<Instant>,
    job: Option<oneshot::Receiver<StateResult>>,
    art_job: Option<ArtJob>,
    /// Last cover URL we tried to load, successful or not. A failed load is
    /// not retried until the server reports a different URL.
    attempted_art_url: String,
}

impl Orchestrator {
    pub fn new(client: FetchClient, interval: Duration) -> Self {
        let state_client = client.clone();
        let spawn_state: StateSpawner = Box::new(move || {
            let client = state_client.clone();
            let (tx, rx) = oneshot::channel();
            tokio::spawn(async move {
                let _ = tx.send(client.fetch_text("now-playing").await);
            });
            rx
        });

        let spawn_art: ArtSpawner = Box::new(move |url: String| {
            let client = client.clone();
            let (tx, rx) = oneshot::channel();
            tokio::spawn(async move {
                let _ = tx.send(load_cover(&client, &url).await);
            });
            rx
        });

        Self::with_spawners(spawn_state, spawn_art, interval)
    }

    fn with_spawners(spawn_state: StateSpawner, spawn_art: ArtSpawner, interval: Duration) -> Self {
        Self {
            spawn_state,
            spawn_art,
            interval,
            pending: true,
            last_refresh: None,
            job: None,
            art_job: None,
            attempted_art_url: String::new(),
        }
    }

    /// Ask for a refresh at the next tick. Idempotent: any number of calls
    /// before the next poll coalesce into one fetch.
    pub fn request_refresh(&mut self) {
        self.pending = true;
    }

    pub fn job_in_flight(&self) -> bool {
        self.job.is_some()
    }

    /// Drive the orchestrator: harvest completed jobs, then start new ones
    /// when due. All `StateStore` mutation happens here.
    pub fn tick(&mut self, now: Instant, store: &mut StateStore) {
        self.poll_state_job(store);
        self.poll_art_job(store);

        let due = self
            .last_refresh
            .is_none_or(|t| now.duration_since(t) >= self.interval);
        if (self.pending || due) && self.job.is_none() {
            self.pending = false;
            self.last_refresh = Some(now);
            self.job = Some((self.spawn_state)());
        }

        // Cover art is loaded as its own non-blocking step, one at a time.
        let wanted = store.media.cover_art_url.clone();
        if !wanted.is_empty() && wanted != self.attempted_art_url && self.art_job.is_none() {
            self.attempted_art_url = wanted.clone();
            let rx = (self.spawn_art)(wanted.clone());
            self.art_job = Some(ArtJob { url: wanted, rx });
        }
    }

    fn poll_state_job(&mut self, store: &mut StateStore) {
        let Some(rx) = self.job.as_mut() else { return };
        match rx.try_recv() {
            Ok(Ok(json)) => {
                self.job = None;
                let media = parse_media(&json);
                debug!("now playing: {} - {}", media.artist, media.track);
                store.publish(media);
            }
            Ok(Err(e)) => {
                self.job = None;
                warn!("now-playing fetch failed: {}", e);
                store.fetch_failed = true;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.job = None;
                store.fetch_failed = true;
            }
        }
    }

    fn poll_art_job(&mut self, store: &mut StateStore) {
        let Some(job) = self.art_job.as_mut() else { return };
        match job.rx.try_recv() {
            Ok(Ok(art)) => {
                info!("cover art loaded: {}x{} from {}", art.width, art.height, job.url);
                store.publish_cover(art);
                self.art_job = None;
            }
            Ok(Err(e)) => {
                // Previous art stays on screen.
                warn!("cover art load failed: {}", e);
                self.art_job = None;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.art_job = None;
            }
        }
    }
}

/// Build a fresh snapshot from the now-playing payload. Missing or
/// malformed fields fall back to sentinels.
pub fn parse_media(json: &str) -> MediaState {
    MediaState {
        track: extract::get_text("name", json, UNKNOWN),
        artist: extract::get_text("artist", json, UNKNOWN),
        device: extract::get_text("device", json, UNKNOWN),
        volume_percent: extract::get_percent("volume_percent", json),
        is_playing: extract::get_bool("is_playing", json),
        cover_art_url: extract::get_text("cover_url", json, ""),
    }
}

async fn load_cover(client: &FetchClient, url: &str) -> ArtResult {
    let bytes = client.fetch_image(url).await?;
    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    CoverArt::new(decoded.into_raw(), width, height).ok_or(FetchError::EmptyImage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct Harness {
        orch: Orchestrator,
        state_txs: Arc<Mutex<Vec<oneshot::Sender<StateResult>>>>,
        art_urls: Arc<Mutex<Vec<String>>>,
        spawned: Arc<AtomicUsize>,
    }

    fn harness() -> Harness {
        let state_txs = Arc::new(Mutex::new(Vec::new()));
        let art_urls = Arc::new(Mutex::new(Vec::new()));
        let spawned = Arc::new(AtomicUsize::new(0));

        let txs = state_txs.clone();
        let count = spawned.clone();
        let spawn_state: StateSpawner = Box::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = oneshot::channel();
            txs.lock().unwrap().push(tx);
            rx
        });

        let urls = art_urls.clone();
        let spawn_art: ArtSpawner = Box::new(move |url| {
            urls.lock().unwrap().push(url);
            let (_tx, rx) = oneshot::channel();
            rx
        });

        Harness {
            orch: Orchestrator::with_spawners(spawn_state, spawn_art, DEFAULT_INTERVAL),
            state_txs,
            art_urls,
            spawned,
        }
    }

    fn complete(h: &Harness, result: StateResult) {
        let tx = h.state_txs.lock().unwrap().remove(0);
        tx.send(result).unwrap();
    }

    #[test]
    fn repeated_requests_coalesce_into_one_fetch() {
        let mut h = harness();
        let mut store = StateStore::default();
        for _ in 0..5 {
            h.orch.request_refresh();
        }
        let now = Instant::now();
        h.orch.tick(now, &mut store);
        assert_eq!(h.spawned.load(Ordering::SeqCst), 1);

        // Still in flight: further requests must not start a second job.
        h.orch.request_refresh();
        h.orch.tick(now, &mut store);
        assert_eq!(h.spawned.load(Ordering::SeqCst), 1);
        assert!(h.orch.job_in_flight());
    }

    #[test]
    fn merge_round_trip() {
        let mut h = harness();
        let mut store = StateStore::default();
        let now = Instant::now();
        h.orch.tick(now, &mut store);
        complete(
            &h,
            Ok(r#"{"name":"X","artist":"Y","is_playing":true,"volume_percent":"42"}"#.into()),
        );
        h.orch.tick(now, &mut store);
        assert_eq!(store.media.track, "X");
        assert_eq!(store.media.artist, "Y");
        assert!(store.media.is_playing);
        assert_eq!(store.media.volume_percent, Some(42));
        assert!(!store.fetch_failed);
        assert!(!h.orch.job_in_flight());
    }

    #[test]
    fn empty_payload_yields_sentinels() {
        let media = parse_media("{}");
        assert_eq!(media.track, UNKNOWN);
        assert_eq!(media.artist, UNKNOWN);
        assert!(!media.is_playing);
        assert_eq!(media.volume_percent, None);
    }

    #[test]
    fn failed_fetch_leaves_state_and_raises_flag() {
        let mut h = harness();
        let mut store = StateStore::default();
        store.media.track = "Keep Me".into();
        let now = Instant::now();
        h.orch.tick(now, &mut store);
        complete(&h, Err(FetchError::Status(500)));
        h.orch.tick(now, &mut store);
        assert_eq!(store.media.track, "Keep Me");
        assert!(store.fetch_failed);
    }

    #[test]
    fn interval_gates_unrequested_refreshes() {
        let mut h = harness();
        let mut store = StateStore::default();
        let start = Instant::now();
        h.orch.tick(start, &mut store);
        complete(&h, Ok("{}".into()));
        h.orch.tick(start + Duration::from_millis(10), &mut store);
        // Completed, but the interval has not elapsed and nothing is pending.
        assert_eq!(h.spawned.load(Ordering::SeqCst), 1);
        h.orch.tick(start + Duration::from_millis(5001), &mut store);
        assert_eq!(h.spawned.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn changed_cover_url_schedules_one_art_job() {
        let mut h = harness();
        let mut store = StateStore::default();
        let now = Instant::now();
        h.orch.tick(now, &mut store);
        complete(&h, Ok(r#"{"name":"X","cover_url":"http://s/a.png"}"#.into()));
        h.orch.tick(now, &mut store);
        h.orch.tick(now, &mut store);
        assert_eq!(h.art_urls.lock().unwrap().as_slice(), ["http://s/a.png"]);
    }
}
