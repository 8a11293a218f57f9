//! Headless media element

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{MediaElement, MediaEvent},
};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

#[derive(Debug)]
struct Transport {
    source: Option<String>,
    current_time: f64,
    duration: f64,
    volume: f64,
    playing: bool,
}

/// A [`MediaElement`] that keeps transport state without producing audio.
///
/// Desktop hosts without an audio backend (CLIs, integration harnesses) use
/// it so the playback session stays fully functional. The host reports the
/// track length through [`set_duration`](Self::set_duration) and may attach
/// an event channel to receive the same notifications a real element emits.
#[derive(Debug)]
pub struct SilentMediaElement {
    transport: Mutex<Transport>,
    events: Option<UnboundedSender<MediaEvent>>,
}

impl SilentMediaElement {
    pub fn new() -> Self {
        Self {
            transport: Mutex::new(Transport {
                source: None,
                current_time: 0.0,
                duration: f64::NAN,
                volume: 1.0,
                playing: false,
            }),
            events: None,
        }
    }

    /// Forward element notifications to `sender`.
    pub fn with_events(mut self, sender: UnboundedSender<MediaEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Report the length of the loaded source and emit `LoadedMetadata`.
    pub fn set_duration(&self, seconds: f64) {
        self.transport.lock().duration = seconds;
        self.emit(MediaEvent::LoadedMetadata);
    }

    /// Simulate the source running to completion.
    pub fn finish(&self) {
        {
            let mut transport = self.transport.lock();
            transport.playing = false;
            if transport.duration.is_finite() {
                transport.current_time = transport.duration;
            }
        }
        self.emit(MediaEvent::Ended);
    }

    pub fn is_playing(&self) -> bool {
        self.transport.lock().playing
    }

    fn emit(&self, event: MediaEvent) {
        if let Some(sender) = &self.events {
            trace!(?event, "Media event");
            let _ = sender.send(event);
        }
    }
}

impl Default for SilentMediaElement {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaElement for SilentMediaElement {
    fn set_source(&self, url: Option<&str>) {
        let mut transport = self.transport.lock();
        transport.source = url.map(str::to_string);
        transport.duration = f64::NAN;
        transport.playing = false;
    }

    fn source(&self) -> Option<String> {
        self.transport.lock().source.clone()
    }

    fn current_time(&self) -> f64 {
        self.transport.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.transport.lock().current_time = seconds.max(0.0);
    }

    fn duration(&self) -> f64 {
        self.transport.lock().duration
    }

    fn volume(&self) -> f64 {
        self.transport.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.transport.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn load(&self) {
        let mut transport = self.transport.lock();
        transport.current_time = 0.0;
        transport.playing = false;
    }

    async fn play(&self) -> Result<()> {
        {
            let mut transport = self.transport.lock();
            if transport.source.is_none() {
                return Err(BridgeError::NotAvailable("No media source loaded".to_string()));
            }
            transport.playing = true;
        }
        self.emit(MediaEvent::Play);
        Ok(())
    }

    fn pause(&self) {
        let was_playing = {
            let mut transport = self.transport.lock();
            std::mem::replace(&mut transport.playing, false)
        };
        if was_playing {
            self.emit(MediaEvent::Pause);
        }
    }
}
