//! Sound playback interface.
//!
//! [`AudioSystem`] describes what the engine needs from an audio backend.
//! [`SilentAudio`] implements the full playback bookkeeping without an output
//! device, which is enough for headless runs and tests.

use std::collections::HashMap;
use std::path::Path;

pub use crate::error::AudioError;

/// Handle to a sound loaded into an [`AudioSystem`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SoundHandle(u32);

/// An audio backend.
///
/// `play` only starts a sound that is not already playing. `pause` stops it
/// where it is; `stop` also rewinds it to the start.
pub trait AudioSystem {
    /// Open the output device.
    ///
    /// # Errors
    ///
    /// Returns an error if no device can be opened.
    fn init(&mut self) -> Result<(), AudioError>;

    /// Release every sound and the output device.
    fn close(&mut self);

    /// Load a sound file.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Load`] if the file cannot be decoded and
    /// [`AudioError::NotInitialized`] before [`init`](Self::init).
    fn load(&mut self, path: &Path) -> Result<SoundHandle, AudioError>;

    /// Release one sound. Unknown handles are ignored.
    fn delete(&mut self, sound: SoundHandle);

    /// # Errors
    ///
    /// Returns [`AudioError::UnknownSound`] for a deleted handle.
    fn play(&mut self, sound: SoundHandle) -> Result<(), AudioError>;

    /// # Errors
    ///
    /// Returns [`AudioError::UnknownSound`] for a deleted handle.
    fn pause(&mut self, sound: SoundHandle) -> Result<(), AudioError>;

    /// # Errors
    ///
    /// Returns [`AudioError::UnknownSound`] for a deleted handle.
    fn stop(&mut self, sound: SoundHandle) -> Result<(), AudioError>;

    /// Whether the sound is playing. Unknown handles are not.
    fn is_playing(&self, sound: SoundHandle) -> bool;

    /// # Errors
    ///
    /// Returns [`AudioError::UnknownSound`] for a deleted handle.
    fn set_volume(&mut self, sound: SoundHandle, volume: f32) -> Result<(), AudioError>;

    /// Volume of one sound, or `None` for an unknown handle.
    fn volume(&self, sound: SoundHandle) -> Option<f32>;

    /// Set the gain applied on top of every sound's own volume.
    fn set_global_volume(&mut self, volume: f32);

    /// The gain applied on top of every sound's own volume.
    fn global_volume(&self) -> f32;
}

/// Playback state of one sound.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SoundState {
    /// Whether the sound is advancing.
    pub playing: bool,
    /// Playback position in seconds.
    pub cursor: f32,
    /// Linear gain, 1.0 at full volume.
    pub volume: f32,
}

impl Default for SoundState {
    fn default() -> Self {
        Self {
            playing: false,
            cursor: 0.0,
            volume: 1.0,
        }
    }
}

/// An [`AudioSystem`] that tracks state but produces no sound.
///
/// Loading only checks that the file exists. [`advance`](Self::advance)
/// moves the cursor of playing sounds, so pause and stop are observable.
#[derive(Debug)]
pub struct SilentAudio {
    initialized: bool,
    sounds: HashMap<SoundHandle, SoundState>,
    next_id: u32,
    global_volume: f32,
}

impl Default for SilentAudio {
    fn default() -> Self {
        Self {
            initialized: false,
            sounds: HashMap::new(),
            next_id: 0,
            global_volume: 1.0,
        }
    }
}

impl SilentAudio {
    /// An uninitialized system with no sounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `seconds` of playback pass.
    pub fn advance(&mut self, seconds: f32) {
        for state in self.sounds.values_mut().filter(|s| s.playing) {
            state.cursor += seconds;
        }
    }

    /// Full state of one sound.
    #[must_use]
    pub fn state(&self, sound: SoundHandle) -> Option<SoundState> {
        self.sounds.get(&sound).copied()
    }

    fn sound_mut(&mut self, sound: SoundHandle) -> Result<&mut SoundState, AudioError> {
        self.sounds
            .get_mut(&sound)
            .ok_or(AudioError::UnknownSound(sound))
    }
}

impl AudioSystem for SilentAudio {
    fn init(&mut self) -> Result<(), AudioError> {
        self.initialized = true;
        log::debug!("silent audio initialized");
        Ok(())
    }

    fn close(&mut self) {
        self.sounds.clear();
        self.initialized = false;
    }

    fn load(&mut self, path: &Path) -> Result<SoundHandle, AudioError> {
        if !self.initialized {
            return Err(AudioError::NotInitialized);
        }
        if !path.is_file() {
            let err = AudioError::Load {
                path: path.to_path_buf(),
                reason: "file not found".into(),
            };
            log::error!("Failed to load audio\nPath: {}", path.display());
            return Err(err);
        }
        let handle = SoundHandle(self.next_id);
        self.next_id += 1;
        self.sounds.insert(handle, SoundState::default());
        Ok(handle)
    }

    fn delete(&mut self, sound: SoundHandle) {
        self.sounds.remove(&sound);
    }

    fn play(&mut self, sound: SoundHandle) -> Result<(), AudioError> {
        self.sound_mut(sound)?.playing = true;
        Ok(())
    }

    fn pause(&mut self, sound: SoundHandle) -> Result<(), AudioError> {
        self.sound_mut(sound)?.playing = false;
        Ok(())
    }

    fn stop(&mut self, sound: SoundHandle) -> Result<(), AudioError> {
        let state = self.sound_mut(sound)?;
        if state.playing {
            state.playing = false;
            state.cursor = 0.0;
        }
        Ok(())
    }

    fn is_playing(&self, sound: SoundHandle) -> bool {
        self.sounds.get(&sound).is_some_and(|s| s.playing)
    }

    fn set_volume(&mut self, sound: SoundHandle, volume: f32) -> Result<(), AudioError> {
        self.sound_mut(sound)?.volume = volume;
        Ok(())
    }

    fn volume(&self, sound: SoundHandle) -> Option<f32> {
        self.sounds.get(&sound).map(|s| s.volume)
    }

    fn set_global_volume(&mut self, volume: f32) {
        self.global_volume = volume;
    }

    fn global_volume(&self) -> f32 {
        self.global_volume
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn loaded() -> (SilentAudio, SoundHandle, NamedTempFile) {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        std::fs::write(file.path(), b"RIFF").unwrap();
        let mut audio = SilentAudio::new();
        audio.init().unwrap();
        let sound = audio.load(file.path()).unwrap();
        (audio, sound, file)
    }

    #[test]
    fn pause_keeps_position_and_stop_rewinds() {
        let (mut audio, sound, _file) = loaded();
        audio.play(sound).unwrap();
        audio.advance(1.5);
        audio.pause(sound).unwrap();
        audio.advance(1.0);
        assert!(!audio.is_playing(sound));
        assert_eq!(audio.state(sound).unwrap().cursor, 1.5);

        audio.play(sound).unwrap();
        audio.advance(0.5);
        audio.stop(sound).unwrap();
        assert_eq!(audio.state(sound).unwrap().cursor, 0.0);
    }

    #[test]
    fn playing_again_does_not_restart() {
        let (mut audio, sound, _file) = loaded();
        audio.play(sound).unwrap();
        audio.advance(2.0);
        audio.play(sound).unwrap();
        assert_eq!(audio.state(sound).unwrap().cursor, 2.0);
    }

    #[test]
    fn volumes_are_tracked() {
        let (mut audio, sound, _file) = loaded();
        assert_eq!(audio.volume(sound), Some(1.0));
        audio.set_volume(sound, 0.25).unwrap();
        audio.set_global_volume(0.5);
        assert_eq!(audio.volume(sound), Some(0.25));
        assert_eq!(audio.global_volume(), 0.5);
    }

    #[test]
    fn missing_files_and_stale_handles_fail() {
        let (mut audio, sound, file) = loaded();
        assert!(matches!(
            audio.load(Path::new("/nonexistent/anvil.ogg")),
            Err(AudioError::Load { .. })
        ));
        audio.delete(sound);
        assert!(matches!(audio.play(sound), Err(AudioError::UnknownSound(_))));
        assert!(!audio.is_playing(sound));
        assert_eq!(audio.volume(sound), None);

        audio.close();
        assert!(matches!(audio.load(file.path()), Err(AudioError::NotInitialized)));
    }
}
