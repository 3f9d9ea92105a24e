//! Background audio that waits for the first pointer press.
//!
//! Browsers refuse to start audio before the user interacted with the page, so
//! playback is armed at startup and fired by the first pointer-down. The gate
//! fires at most once, whether or not playback starts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("playback was rejected: {0}")]
    Rejected(String),
    #[error("audio playback is not supported on this platform")]
    Unsupported,
}

/// Something that can loop a track.
pub trait Playback {
    fn is_paused(&self) -> bool;

    fn play_looped(&mut self, volume: f64) -> Result<(), AudioError>;
}

/// What one pointer press did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    Started,
    AlreadyPlaying,
    NoAudio,
    Failed,
    /// The gate already fired.
    Spent,
}

#[derive(Debug)]
pub struct AudioGate<P> {
    playback: Option<P>,
    volume: f64,
    armed: bool,
}

impl<P: Playback> AudioGate<P> {
    pub fn new(playback: Option<P>, volume: f64) -> Self {
        Self {
            playback,
            volume,
            armed: true,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn playback(&self) -> Option<&P> {
        self.playback.as_ref()
    }

    pub fn on_pointer_down(&mut self) -> GateOutcome {
        if !self.armed {
            return GateOutcome::Spent;
        }
        self.armed = false;

        let Some(playback) = self.playback.as_mut() else {
            return GateOutcome::NoAudio;
        };
        if !playback.is_paused() {
            return GateOutcome::AlreadyPlaying;
        }
        match playback.play_looped(self.volume) {
            Ok(()) => {
                log::info!("background audio started");
                GateOutcome::Started
            }
            Err(e) => {
                log::error!("{e}");
                GateOutcome::Failed
            }
        }
    }
}

/// Native builds have no audio backend; the gate still arms and disarms.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Playback for Silent {
    fn is_paused(&self) -> bool {
        true
    }

    fn play_looped(&mut self, _volume: f64) -> Result<(), AudioError> {
        Err(AudioError::Unsupported)
    }
}

#[cfg(target_arch = "wasm32")]
pub mod web {
    use wasm_bindgen::{JsCast, closure::Closure};
    use wasm_bindgen_futures::JsFuture;

    use super::{AudioError, AudioGate, GateOutcome, Playback};

    /// An `<audio>` element that is never attached to the page.
    #[derive(Debug)]
    pub struct HtmlAudio(web_sys::HtmlAudioElement);

    impl HtmlAudio {
        pub fn new(src: &str) -> Result<Self, AudioError> {
            let element = web_sys::HtmlAudioElement::new_with_src(src)
                .map_err(|e| AudioError::Rejected(format!("{e:?}")))?;
            Ok(Self(element))
        }
    }

    impl Playback for HtmlAudio {
        fn is_paused(&self) -> bool {
            self.0.paused()
        }

        fn play_looped(&mut self, volume: f64) -> Result<(), AudioError> {
            self.0.set_loop(true);
            self.0.set_volume(volume);
            let promise = self
                .0
                .play()
                .map_err(|e| AudioError::Rejected(format!("{e:?}")))?;
            // Autoplay rejections arrive asynchronously
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::error!("{}", AudioError::Rejected(format!("{e:?}")));
                }
            });
            Ok(())
        }
    }

    /// Keeps a one-shot document `pointerdown` listener alive.
    pub struct PointerListener {
        _closure: Closure<dyn FnMut(web_sys::Event)>,
    }

    impl std::fmt::Debug for PointerListener {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("PointerListener")
        }
    }

    /// Fire `gate` on the first pointer press anywhere in the document.
    pub fn install(mut gate: AudioGate<HtmlAudio>) -> Result<PointerListener, AudioError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(AudioError::Unsupported)?;

        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            if gate.on_pointer_down() == GateOutcome::NoAudio {
                log::warn!("no background audio to start");
            }
        });
        let options = web_sys::AddEventListenerOptions::new();
        options.set_once(true);
        document
            .add_event_listener_with_callback_and_add_event_listener_options(
                "pointerdown",
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(|e| AudioError::Rejected(format!("{e:?}")))?;

        Ok(PointerListener { _closure: closure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakePlayback {
        paused: bool,
        fail: bool,
        plays: Vec<f64>,
    }

    impl Playback for FakePlayback {
        fn is_paused(&self) -> bool {
            self.paused
        }

        fn play_looped(&mut self, volume: f64) -> Result<(), AudioError> {
            self.plays.push(volume);
            if self.fail {
                return Err(AudioError::Rejected("NotAllowedError".into()));
            }
            self.paused = false;
            Ok(())
        }
    }

    fn paused() -> FakePlayback {
        FakePlayback {
            paused: true,
            ..Default::default()
        }
    }

    #[test]
    fn first_press_starts_playback_once() {
        let mut gate = AudioGate::new(Some(paused()), 0.3);
        assert!(gate.is_armed());
        assert_eq!(gate.on_pointer_down(), GateOutcome::Started);
        assert_eq!(gate.on_pointer_down(), GateOutcome::Spent);
        assert!(!gate.is_armed());
        assert_eq!(gate.playback().map(|p| p.plays.clone()), Some(vec![0.3]));
    }

    #[test]
    fn failure_disarms_without_retry() {
        let mut gate = AudioGate::new(
            Some(FakePlayback {
                fail: true,
                ..paused()
            }),
            0.3,
        );
        assert_eq!(gate.on_pointer_down(), GateOutcome::Failed);
        assert_eq!(gate.on_pointer_down(), GateOutcome::Spent);
        assert_eq!(gate.playback().map(|p| p.plays.len()), Some(1));
    }

    #[test]
    fn playing_audio_is_left_alone() {
        let mut gate = AudioGate::new(Some(FakePlayback::default()), 0.3);
        assert_eq!(gate.on_pointer_down(), GateOutcome::AlreadyPlaying);
        assert_eq!(gate.playback().map(|p| p.plays.len()), Some(0));
    }

    #[test]
    fn missing_audio_still_disarms() {
        let mut gate: AudioGate<FakePlayback> = AudioGate::new(None, 0.3);
        assert_eq!(gate.on_pointer_down(), GateOutcome::NoAudio);
        assert!(!gate.is_armed());
    }

    #[test]
    fn silent_playback_is_unsupported() {
        let mut gate = AudioGate::new(Some(Silent), 0.3);
        assert_eq!(gate.on_pointer_down(), GateOutcome::Failed);
    }
}
