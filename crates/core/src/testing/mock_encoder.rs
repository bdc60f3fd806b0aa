//! Mock rendition encoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::encoder::{EncodeOutput, EncodeRequest, EncoderError, RenditionEncoder};
use crate::progress::{ProgressEvent, ProgressField, RenditionTracker};

/// Scripted outcome for one rendition height.
#[derive(Debug, Clone)]
enum Outcome {
    Fail(String),
    Panic,
}

/// A point where encodes block until the test releases them.
#[derive(Debug)]
struct GateSlot {
    /// `None` gates every height.
    height: Option<u32>,
    entered: Arc<watch::Sender<bool>>,
    release: watch::Receiver<bool>,
}

/// Test-side handle of a gate created by [`MockEncoder::hold`] or
/// [`MockEncoder::hold_at`].
#[derive(Debug, Clone)]
pub struct MockGate {
    entered: watch::Receiver<bool>,
    release: Arc<watch::Sender<bool>>,
}

impl MockGate {
    /// Resolves once an encode has reached the gate.
    pub async fn entered(&self) {
        let mut entered = self.entered.clone();
        let _ = entered.wait_for(|reached| *reached).await;
    }

    /// Lets blocked and future encodes through.
    pub fn release(&self) {
        self.release.send_replace(true);
    }
}

/// Mock implementation of the RenditionEncoder trait.
///
/// Succeeds by default, writing a small variant playlist and reporting a
/// fixed set of progress events through the tracker. Behavior can be scripted
/// per rendition height:
/// - fail with a diagnostic
/// - panic
/// - block on a gate until released
///
/// # Example
///
/// ```rust,ignore
/// use hlsladder_core::testing::MockEncoder;
///
/// let encoder = Arc::new(MockEncoder::new());
/// encoder.fail_at(480, "Conversion failed!");
/// let gate = encoder.hold_at(240);
///
/// let handle = runner.start(job).await?;
/// gate.entered().await;
/// // 144p is published, 240p is running
/// gate.release();
/// ```
#[derive(Debug)]
pub struct MockEncoder {
    requests: Mutex<Vec<EncodeRequest>>,
    outcomes: Mutex<HashMap<u32, Outcome>>,
    gates: Mutex<Vec<GateSlot>>,
    delay: Mutex<Duration>,
    events: Mutex<Vec<ProgressEvent>>,
    write_playlists: Mutex<bool>,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoder {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcomes: Mutex::new(HashMap::new()),
            gates: Mutex::new(Vec::new()),
            delay: Mutex::new(Duration::ZERO),
            events: Mutex::new(vec![
                ProgressEvent::new(ProgressField::Frame, "250"),
                ProgressEvent::new(ProgressField::Fps, "125.0"),
                ProgressEvent::new(ProgressField::Time, "00:00:10.00"),
                ProgressEvent::new(ProgressField::Speed, "5.0x"),
            ]),
            write_playlists: Mutex::new(true),
        }
    }

    /// Every request seen so far, in call order.
    pub fn recorded_requests(&self) -> Vec<EncodeRequest> {
        lock(&self.requests).clone()
    }

    /// Heights encoded so far, in call order.
    pub fn encoded_heights(&self) -> Vec<u32> {
        lock(&self.requests)
            .iter()
            .map(|r| r.rendition.height)
            .collect()
    }

    /// Makes the encode of `height` fail with `diagnostic`.
    pub fn fail_at(&self, height: u32, diagnostic: impl Into<String>) {
        lock(&self.outcomes).insert(height, Outcome::Fail(diagnostic.into()));
    }

    /// Makes the encode of `height` panic.
    pub fn panic_at(&self, height: u32) {
        lock(&self.outcomes).insert(height, Outcome::Panic);
    }

    /// Drops every scripted failure and panic.
    pub fn clear_outcomes(&self) {
        lock(&self.outcomes).clear();
    }

    /// Blocks every encode until the returned gate is released.
    pub fn hold(&self) -> MockGate {
        self.add_gate(None)
    }

    /// Blocks the encode of `height` until the returned gate is released.
    pub fn hold_at(&self, height: u32) -> MockGate {
        self.add_gate(Some(height))
    }

    /// Simulated work time per rendition.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    /// Progress events reported for every rendition.
    pub fn set_events(&self, events: Vec<ProgressEvent>) {
        *lock(&self.events) = events;
    }

    /// Whether successful encodes write a variant playlist to disk.
    pub fn set_write_playlists(&self, write: bool) {
        *lock(&self.write_playlists) = write;
    }

    fn add_gate(&self, height: Option<u32>) -> MockGate {
        let (entered_tx, entered_rx) = watch::channel(false);
        let (release_tx, release_rx) = watch::channel(false);
        lock(&self.gates).push(GateSlot {
            height,
            entered: Arc::new(entered_tx),
            release: release_rx,
        });
        MockGate {
            entered: entered_rx,
            release: Arc::new(release_tx),
        }
    }

    async fn pass_gates(&self, height: u32) {
        let pending: Vec<(Arc<watch::Sender<bool>>, watch::Receiver<bool>)> = lock(&self.gates)
            .iter()
            .filter(|slot| slot.height.is_none_or(|h| h == height))
            .map(|slot| (Arc::clone(&slot.entered), slot.release.clone()))
            .collect();

        for (entered, mut release) in pending {
            entered.send_replace(true);
            let _ = release.wait_for(|released| *released).await;
        }
    }

    async fn write_playlist(&self, request: &EncodeRequest) -> Result<(), EncoderError> {
        tokio::fs::create_dir_all(request.variant_dir()).await?;
        let body = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n#EXT-X-PLAYLIST-TYPE:VOD\n#EXTINF:2.000000,\nsegment0.ts\n#EXT-X-ENDLIST\n";
        tokio::fs::write(request.playlist_path(), body).await?;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RenditionEncoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encode(
        &self,
        request: EncodeRequest,
        tracker: RenditionTracker,
    ) -> Result<EncodeOutput, EncoderError> {
        let height = request.rendition.height;
        lock(&self.requests).push(request.clone());

        tracker.start().await;
        let events = lock(&self.events).clone();
        for event in &events {
            tracker.record(event).await;
        }

        self.pass_gates(height).await;

        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = lock(&self.outcomes).get(&height).cloned();
        match outcome {
            Some(Outcome::Fail(diagnostic)) => {
                let err = EncoderError::encode_failed(Some(1), diagnostic);
                tracker.fail(err.diagnostic()).await;
                return Err(err);
            }
            Some(Outcome::Panic) => panic!("mock encoder panicked at {}p", height),
            None => {}
        }

        let write_playlists = *lock(&self.write_playlists);
        if write_playlists {
            if let Err(e) = self.write_playlist(&request).await {
                tracker.fail(e.diagnostic()).await;
                return Err(e);
            }
        }

        tracker.complete().await;
        Ok(EncodeOutput {
            playlist_path: request.playlist_path(),
            rendition: request.rendition,
            duration_ms: delay.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        Ok(())
    }
}
