//! Sound effects
//!
//! Procedurally generated oscillator blips, no audio files. The cue tables are
//! plain data; only playback touches Web Audio.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Correct letter fired at the target
    Shoot,
    /// Word completed
    Explode,
    /// Wrong or unmatched letter
    Wrong,
    /// Enemy got through and cost a life
    Breach,
    /// Run over
    Lose,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One decaying tone of a cue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    pub duration_ms: f64,
    pub wave: Wave,
    /// Peak gain at full volume
    pub gain: f32,
    /// Offset from the start of the cue
    pub delay_ms: f64,
}

const fn tone(freq: f32, duration_ms: f64, wave: Wave, gain: f32, delay_ms: f64) -> Tone {
    Tone {
        freq,
        duration_ms,
        wave,
        gain,
        delay_ms,
    }
}

const SHOOT: [Tone; 1] = [tone(660.0, 80.0, Wave::Square, 0.4, 0.0)];
const EXPLODE: [Tone; 2] = [
    tone(220.0, 60.0, Wave::Sawtooth, 0.5, 0.0),
    tone(160.0, 70.0, Wave::Triangle, 0.35, 60.0),
];
const WRONG: [Tone; 1] = [tone(140.0, 120.0, Wave::Sine, 0.25, 0.0)];
const BREACH: [Tone; 3] = [
    tone(120.0, 260.0, Wave::Sawtooth, 0.8, 0.0),
    tone(90.0, 240.0, Wave::Triangle, 0.7, 80.0),
    tone(70.0, 220.0, Wave::Sine, 0.6, 160.0),
];
const LOSE: [Tone; 2] = [
    tone(220.0, 160.0, Wave::Sawtooth, 0.6, 0.0),
    tone(110.0, 220.0, Wave::Sine, 0.4, 160.0),
];

impl SoundEffect {
    pub fn tones(self) -> &'static [Tone] {
        match self {
            SoundEffect::Shoot => &SHOOT,
            SoundEffect::Explode => &EXPLODE,
            SoundEffect::Wrong => &WRONG,
            SoundEffect::Breach => &BREACH,
            SoundEffect::Lose => &LOSE,
        }
    }

    /// Cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Shot { .. } => Some(SoundEffect::Shoot),
            GameEvent::Killed { .. } => Some(SoundEffect::Explode),
            GameEvent::Miss => Some(SoundEffect::Wrong),
            GameEvent::LifeLost { .. } => Some(SoundEffect::Breach),
            GameEvent::RunEnded => Some(SoundEffect::Lose),
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{SoundEffect, Tone, Wave};
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    /// Web Audio output for sound effects
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.master_volume }
        }

        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let now = ctx.current_time();
            for tone in effect.tones() {
                self.play_tone(ctx, tone, now, vol);
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_tone(&self, ctx: &AudioContext, tone: &Tone, now: f64, vol: f32) {
            let osc_type = match tone.wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Square => OscillatorType::Square,
                Wave::Sawtooth => OscillatorType::Sawtooth,
                Wave::Triangle => OscillatorType::Triangle,
            };
            let Some((osc, gain)) = self.create_osc(ctx, tone.freq, osc_type) else {
                return;
            };
            let t = now + tone.delay_ms / 1000.0;
            let end = t + tone.duration_ms / 1000.0;

            gain.gain().set_value_at_time(vol * tone.gain * 0.3, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.0001, end).ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(end + 0.02).ok();
        }
    }
}
