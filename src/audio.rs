//! Click feedback sounds.
//!
//! `DeviceAudio` plays clips on the default output device through rodio.
//! When no device opens, `open_output` falls back to `LogAudio`, which only
//! reports the cue.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;

/// Audio clip played when a frog is clicked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundCue {
    pub path: &'static str,
    pub volume: f32,
}

pub const KISS_CUE: SoundCue = SoundCue {
    path: "assets/sounds/kiss.mp3",
    volume: 0.5,
};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("failed to start playback: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

/// Sink for click feedback sounds.
pub trait AudioOut {
    fn play(&mut self, cue: &SoundCue);
}

/// Reports cues through the log instead of an audio device.
pub struct LogAudio;

impl AudioOut for LogAudio {
    fn play(&mut self, cue: &SoundCue) {
        log::info!("Sound cue {} (volume {:.1})", cue.path, cue.volume);
    }
}

/// Encoded clip bytes, read from disk once per path.
#[derive(Default)]
struct ClipCache {
    clips: HashMap<String, Arc<[u8]>>,
}

impl ClipCache {
    fn get(&mut self, path: &str) -> Result<Arc<[u8]>, AudioError> {
        if let Some(bytes) = self.clips.get(path) {
            return Ok(bytes.clone());
        }
        let bytes: Arc<[u8]> = std::fs::read(path)
            .map_err(|source| AudioError::Read {
                path: path.to_string(),
                source,
            })?
            .into();
        self.clips.insert(path.to_string(), bytes.clone());
        Ok(bytes)
    }
}

/// Plays cues on the default output device. Every cue gets its own detached
/// sink so repeated clicks overlap instead of queueing.
pub struct DeviceAudio {
    // Dropping the stream silences every sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clips: ClipCache,
}

impl DeviceAudio {
    pub fn open() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            clips: ClipCache::default(),
        })
    }

    fn try_play(&mut self, cue: &SoundCue) -> Result<(), AudioError> {
        let bytes = self.clips.get(cue.path)?;
        let source = Decoder::new(Cursor::new(bytes)).map_err(|source| AudioError::Decode {
            path: cue.path.to_string(),
            source,
        })?;
        let sink = Sink::try_new(&self.handle)?;
        sink.set_volume(cue.volume);
        sink.append(source);
        sink.detach();
        Ok(())
    }
}

impl AudioOut for DeviceAudio {
    fn play(&mut self, cue: &SoundCue) {
        if let Err(e) = self.try_play(cue) {
            log::warn!("Sound cue {} not played: {e}", cue.path);
        }
    }
}

/// Default output device, or the logging fallback when none opens.
pub fn open_output() -> Box<dyn AudioOut> {
    match DeviceAudio::open() {
        Ok(audio) => {
            log::info!("Audio output opened");
            Box::new(audio)
        }
        Err(e) => {
            log::warn!("{e}; sound cues will only be logged");
            Box::new(LogAudio)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_clip_reports_its_path() {
        let mut cache = ClipCache::default();
        let err = cache.get("assets/sounds/does-not-exist.mp3").unwrap_err();
        assert!(matches!(err, AudioError::Read { .. }));
        assert!(err.to_string().contains("does-not-exist.mp3"));
    }

    #[test]
    fn clips_are_read_once() {
        let path = std::env::temp_dir().join(format!("frog-cottage-clip-{}.bin", std::process::id()));
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let key = path.to_string_lossy().into_owned();

        let mut cache = ClipCache::default();
        let first = cache.get(&key).unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = cache.get(&key).unwrap();

        assert_eq!(&*second, &[1u8, 2, 3]);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn kiss_cue_plays_at_half_volume() {
        assert_eq!(KISS_CUE.volume, 0.5);
        assert!(KISS_CUE.path.ends_with("kiss.mp3"));
    }
}
