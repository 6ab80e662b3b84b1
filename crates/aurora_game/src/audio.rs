//! rodio-backed audio: a looping procedural soundtrack plus one-shot
//! effects, all synthesized so the repo ships no binary audio assets.
//!
//! Audio is strictly best-effort. If no output device exists (CI, headless
//! boxes) the mixer logs once and swallows every request; the simulation
//! never notices.

use std::f32::consts::TAU;
use std::time::Duration;

use rodio::source::Source;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::director::MusicDirective;
use crate::world::Sfx;

const SAMPLE_RATE: u32 = 44_100;
const MUSIC_VOLUME: f32 = 0.30;
const SFX_VOLUME: f32 = 0.45;
const MUSIC_AMPLITUDE: f32 = 0.22;

/// (frequency Hz, duration ms); 0 Hz is a rest.
const MELODY: &[(f32, u64)] = &[
    (392.0, 250), // G4
    (440.0, 250), // A4
    (523.0, 250), // C5
    (440.0, 250), // A4
    (659.0, 400), // E5
    (0.0, 100),
    (659.0, 400), // E5
    (587.0, 550), // D5
    (0.0, 250),
    (392.0, 250), // G4
    (440.0, 250), // A4
    (523.0, 250), // C5
    (440.0, 250), // A4
    (587.0, 400), // D5
    (0.0, 100),
    (587.0, 400), // D5
    (523.0, 550), // C5
    (0.0, 400),
];

pub struct AudioMixer {
    output: Option<AudioOutput>,
}

struct AudioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    music: Option<Sink>,
}

impl AudioMixer {
    /// Opens the default output device and starts the soundtrack. On any
    /// failure the mixer comes up silent.
    pub fn new() -> Self {
        match OutputStream::try_default() {
            Ok((stream, handle)) => {
                let mut output = AudioOutput {
                    _stream: stream,
                    handle,
                    music: None,
                };
                output.start_music();
                Self {
                    output: Some(output),
                }
            }
            Err(err) => {
                log::warn!("No audio output available ({err}); running silent");
                Self { output: None }
            }
        }
    }

    pub fn apply_music(&mut self, directive: MusicDirective) {
        let Some(output) = &mut self.output else {
            return;
        };
        match directive {
            MusicDirective::Restart => output.start_music(),
            MusicDirective::Resume => {
                if let Some(sink) = &output.music {
                    sink.play();
                }
            }
            MusicDirective::Pause => {
                if let Some(sink) = &output.music {
                    sink.pause();
                }
            }
            MusicDirective::Stop => {
                if let Some(sink) = output.music.take() {
                    sink.stop();
                }
            }
        }
    }

    pub fn play_effect(&self, sfx: Sfx) {
        let Some(output) = &self.output else {
            return;
        };
        let Ok(sink) = Sink::try_new(&output.handle) else {
            return;
        };
        sink.set_volume(SFX_VOLUME);
        sink.append(match sfx {
            Sfx::EnemyDown => Tone::sweep(880.0, 520.0, 140),
            Sfx::PlayerDown => Tone::sweep(330.0, 90.0, 500),
        });
        sink.detach();
    }
}

impl AudioOutput {
    fn start_music(&mut self) {
        if let Some(old) = self.music.take() {
            old.stop();
        }
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.set_volume(MUSIC_VOLUME);
                sink.append(Soundtrack::new());
                self.music = Some(sink);
            }
            Err(err) => log::warn!("Failed to start music sink: {err}"),
        }
    }
}

/// Endless mono melody: walks `MELODY` note by note with a short fade at
/// each note boundary to avoid clicks.
struct Soundtrack {
    note_index: usize,
    sample_in_note: u32,
    note_samples: u32,
    phase: f32,
    phase_step: f32,
}

impl Soundtrack {
    fn new() -> Self {
        let mut track = Self {
            note_index: 0,
            sample_in_note: 0,
            note_samples: 0,
            phase: 0.0,
            phase_step: 0.0,
        };
        track.load_note(0);
        track
    }

    fn load_note(&mut self, index: usize) {
        let (freq, ms) = MELODY[index % MELODY.len()];
        self.note_index = index % MELODY.len();
        self.sample_in_note = 0;
        self.note_samples = ((ms * SAMPLE_RATE as u64) / 1000).max(1) as u32;
        self.phase = 0.0;
        self.phase_step = if freq > 0.0 {
            TAU * freq / SAMPLE_RATE as f32
        } else {
            0.0
        };
    }

    fn envelope(&self) -> f32 {
        let fade = 300u32.min(self.note_samples / 4).max(1);
        let remaining = self.note_samples - self.sample_in_note;
        if self.sample_in_note < fade {
            self.sample_in_note as f32 / fade as f32
        } else if remaining <= fade {
            remaining as f32 / fade as f32
        } else {
            1.0
        }
    }
}

impl Iterator for Soundtrack {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = if self.phase_step > 0.0 {
            // A touch of second harmonic keeps it from sounding like a test tone.
            let s = self.phase.sin() + (self.phase * 2.0).sin() * 0.25;
            s * MUSIC_AMPLITUDE * self.envelope()
        } else {
            0.0
        };

        self.phase += self.phase_step;
        if self.phase >= TAU {
            self.phase -= TAU;
        }

        self.sample_in_note += 1;
        if self.sample_in_note >= self.note_samples {
            self.load_note(self.note_index + 1);
        }

        Some(sample)
    }
}

impl Source for Soundtrack {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Finite mono tone with a linear frequency sweep and fade-out.
struct Tone {
    samples_left: u32,
    total_samples: u32,
    phase: f32,
    freq: f32,
    freq_step: f32,
}

impl Tone {
    fn sweep(start_hz: f32, end_hz: f32, duration_ms: u64) -> Self {
        let total = ((duration_ms * SAMPLE_RATE as u64) / 1000).max(1) as u32;
        Self {
            samples_left: total,
            total_samples: total,
            phase: 0.0,
            freq: start_hz,
            freq_step: (end_hz - start_hz) / total as f32,
        }
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.samples_left == 0 {
            return None;
        }
        let fade_out = self.samples_left as f32 / self.total_samples as f32;
        let sample = self.phase.sin() * fade_out;

        self.phase += TAU * self.freq / SAMPLE_RATE as f32;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        self.freq += self.freq_step;
        self.samples_left -= 1;

        Some(sample)
    }
}

impl Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.samples_left as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(
            (self.total_samples as u64 * 1000) / SAMPLE_RATE as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soundtrack_is_endless_and_bounded() {
        let mut track = Soundtrack::new();
        for _ in 0..(SAMPLE_RATE as usize * 2) {
            let sample = track.next().expect("soundtrack never ends");
            assert!(sample.abs() <= 1.0);
        }
    }

    #[test]
    fn soundtrack_wraps_past_the_last_note() {
        let total_ms: u64 = MELODY.iter().map(|&(_, ms)| ms).sum();
        let samples_per_loop = (total_ms * SAMPLE_RATE as u64) / 1000;
        let mut track = Soundtrack::new();
        for _ in 0..=samples_per_loop {
            track.next();
        }
        // After one full pass we are back inside the melody, not past it.
        assert!(track.note_index < MELODY.len());
    }

    #[test]
    fn tone_ends_after_its_duration() {
        let mut tone = Tone::sweep(880.0, 440.0, 10);
        let expected = (10 * SAMPLE_RATE as u64 / 1000) as usize;
        let mut count = 0;
        while tone.next().is_some() {
            count += 1;
            assert!(count <= expected, "tone ran past its duration");
        }
        assert_eq!(count, expected);
    }

    #[test]
    fn tone_fades_to_silence() {
        let tone = Tone::sweep(440.0, 440.0, 50);
        let last = tone.last().expect("tone has samples");
        assert!(last.abs() < 0.01);
    }
}
