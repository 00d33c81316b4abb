//! Audio: instrument presets and the note conductor
//!
//! Instruments are plain data (additive partials with exponential decay) so
//! the same preset can be voiced by Web Audio oscillators in the browser or
//! rendered into a sample buffer natively. The conductor never talks to an
//! audio API directly; it plays through whatever `NoteSink` it was given.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::consts::NOTE_DURATION;
use crate::settings::Settings;

/// Oscillator shape of one partial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    /// Value at `phase` (in cycles, any range)
    pub fn sample(&self, phase: f32) -> f32 {
        let p = phase.rem_euclid(1.0);
        match self {
            Waveform::Sine => (p * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
        }
    }
}

/// One oscillator of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Partial {
    /// Multiple of the note frequency
    pub ratio: f32,
    pub gain: f32,
    pub waveform: Waveform,
    /// Time constant of the exponential decay (seconds)
    pub decay: f32,
}

impl Partial {
    const fn new(ratio: f32, gain: f32, waveform: Waveform, decay: f32) -> Self {
        Self {
            ratio,
            gain,
            waveform,
            decay,
        }
    }

    /// Envelope level `t` seconds into the note
    pub fn envelope(&self, t: f32) -> f32 {
        if self.decay <= 0.0 {
            return 0.0;
        }
        (-t / self.decay).exp()
    }
}

/// A preset voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub partials: Vec<Partial>,
}

impl Instrument {
    /// Tubular bell: inharmonic partials, long ring
    pub fn bells() -> Self {
        Self {
            name: "bells".into(),
            partials: vec![
                Partial::new(1.0, 0.5, Waveform::Sine, 0.6),
                Partial::new(2.76, 0.25, Waveform::Sine, 0.35),
                Partial::new(5.4, 0.15, Waveform::Sine, 0.2),
                Partial::new(8.93, 0.1, Waveform::Sine, 0.1),
            ],
        }
    }

    /// Struck metal bar: bright attack, quick metallic overtones
    pub fn metal_bar() -> Self {
        Self {
            name: "metal bar".into(),
            partials: vec![
                Partial::new(1.0, 0.55, Waveform::Triangle, 0.45),
                Partial::new(2.756, 0.25, Waveform::Sine, 0.2),
                Partial::new(5.404, 0.12, Waveform::Sine, 0.08),
                Partial::new(8.933, 0.08, Waveform::Square, 0.03),
            ],
        }
    }

    /// Instantaneous value `t` seconds into a note at `frequency`
    pub fn sample(&self, frequency: f32, t: f32) -> f32 {
        self.partials
            .iter()
            .map(|p| p.gain * p.envelope(t) * p.waveform.sample(frequency * p.ratio * t))
            .sum()
    }
}

/// One note to play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Hz
    pub frequency: f32,
    /// Linear gain, already volume-scaled
    pub amplitude: f32,
    /// Seconds
    pub duration: f32,
}

/// Something that can voice a note
pub trait NoteSink {
    fn play(&mut self, instrument: &Instrument, note: Note);
}

/// Discards every note
#[derive(Debug, Default)]
pub struct NullSink;

impl NoteSink for NullSink {
    fn play(&mut self, _instrument: &Instrument, _note: Note) {}
}

/// Renders notes into a mono sample buffer.
///
/// Notes start at the current cursor; `advance` moves the cursor forward as
/// simulated time passes, so overlapping notes mix.
#[derive(Debug, Clone)]
pub struct OfflineSynth {
    sample_rate: u32,
    buffer: Vec<f32>,
    cursor: usize,
    /// Fraction of a sample `advance` has not consumed yet
    carry: f64,
    notes_played: usize,
}

impl OfflineSynth {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            buffer: Vec::new(),
            cursor: 0,
            carry: 0.0,
            notes_played: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.buffer
    }

    pub fn notes_played(&self) -> usize {
        self.notes_played
    }

    /// Move the start point for subsequent notes
    pub fn advance(&mut self, seconds: f32) {
        let exact = self.carry + f64::from(seconds.max(0.0)) * f64::from(self.sample_rate);
        let whole = exact.floor();
        self.cursor += whole as usize;
        self.carry = exact - whole;
    }

    /// Largest absolute sample
    pub fn peak(&self) -> f32 {
        self.buffer.iter().fold(0.0, |m, s| m.max(s.abs()))
    }
}

impl NoteSink for OfflineSynth {
    fn play(&mut self, instrument: &Instrument, note: Note) {
        let len = (note.duration.max(0.0) * self.sample_rate as f32) as usize;
        let end = self.cursor + len;
        if self.buffer.len() < end {
            self.buffer.resize(end, 0.0);
        }
        let dt = 1.0 / self.sample_rate as f32;
        for (i, out) in self.buffer[self.cursor..end].iter_mut().enumerate() {
            *out += note.amplitude * instrument.sample(note.frequency, i as f32 * dt);
        }
        self.notes_played += 1;
    }
}

/// Voices notes with Web Audio oscillators, one per partial
#[cfg(target_arch = "wasm32")]
pub struct WebAudioSink {
    ctx: Option<web_sys::AudioContext>,
}

#[cfg(target_arch = "wasm32")]
impl Default for WebAudioSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl WebAudioSink {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = web_sys::AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self { ctx }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    fn create_osc(
        ctx: &web_sys::AudioContext,
        freq: f32,
        waveform: Waveform,
    ) -> Option<(web_sys::OscillatorNode, web_sys::GainNode)> {
        use web_sys::OscillatorType;

        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(match waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Triangle => OscillatorType::Triangle,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
        });
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }
}

#[cfg(target_arch = "wasm32")]
impl NoteSink for WebAudioSink {
    fn play(&mut self, instrument: &Instrument, note: Note) {
        let Some(ctx) = &self.ctx else { return };

        // Browsers start the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let t = ctx.current_time();
        let end = t + note.duration as f64;
        for partial in &instrument.partials {
            let Some((osc, gain)) =
                Self::create_osc(ctx, note.frequency * partial.ratio, partial.waveform)
            else {
                continue;
            };
            // Exponential ramps cannot reach zero
            let level = (note.amplitude * partial.gain).max(0.0001);
            let tail = (t + (partial.decay * 5.0) as f64).min(end);
            gain.gain().set_value_at_time(level, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.0001, tail).ok();
            osc.start().ok();
            osc.stop_with_when(end).ok();
        }
    }
}

/// Plays notes on the two preset voices through an injected sink
pub struct Conductor {
    sink: Box<dyn NoteSink>,
    primary: Instrument,
    secondary: Instrument,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Conductor {
    /// Bells as the primary voice, metal bar as the secondary
    pub fn new(sink: Box<dyn NoteSink>) -> Self {
        Self {
            sink,
            primary: Instrument::bells(),
            secondary: Instrument::metal_bar(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    pub fn from_settings(sink: Box<dyn NoteSink>, settings: &Settings) -> Self {
        let mut conductor = Self::new(sink);
        conductor.set_master_volume(settings.master_volume);
        conductor.set_sfx_volume(settings.sfx_volume);
        conductor.set_muted(settings.muted);
        conductor
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play one fixed-length note on the primary or secondary voice
    pub fn play(&mut self, frequency: f32, amplitude: f32, use_secondary_voice: bool) {
        let amplitude = amplitude * self.effective_volume();
        if amplitude <= 0.0 || !(frequency > 0.0) {
            return;
        }
        let instrument = if use_secondary_voice {
            &self.secondary
        } else {
            &self.primary
        };
        self.sink.play(
            instrument,
            Note {
                frequency,
                amplitude,
                duration: NOTE_DURATION,
            },
        );
    }
}
