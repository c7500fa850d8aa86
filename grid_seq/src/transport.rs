use std::convert::TryFrom;

use crate::error::GridSeqError;

pub const DEFAULT_BPM: f64 = 120.0;
pub const MIN_BPM: f64 = 1.0;
pub const MAX_BPM: f64 = 999.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// `frame` is relative to the block start, `step` is the step starting there
    Boundary { frame: usize, step: usize },
    Midpoint { frame: usize },
}

impl ClockEvent {
    pub fn frame(&self) -> usize {
        match *self {
            ClockEvent::Boundary { frame, .. } | ClockEvent::Midpoint { frame } => frame,
        }
    }
}

/// What happened to the timeline during one block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockTick {
    /// the step 0 note-on is due at frame 0
    pub first_run: bool,
    /// transport went from playing to stopped at the start of this block
    pub stopped: bool,
    pub boundary: Option<ClockEvent>,
    pub midpoint: Option<ClockEvent>,
}

impl ClockTick {
    /// boundary and midpoint in the order they happen inside the block
    pub fn events(&self) -> impl Iterator<Item = ClockEvent> {
        let (first, second) = match (self.boundary, self.midpoint) {
            (Some(boundary), Some(midpoint)) if midpoint.frame() < boundary.frame() => (Some(midpoint), Some(boundary)),
            (boundary, midpoint) => (boundary, midpoint),
        };
        first.into_iter().chain(second)
    }
}

/// Converts the host tempo and the stream of audio blocks into steps. One step is one beat.
pub struct TransportClock {
    sample_rate: f64,
    bpm: f64,
    frames_per_step: u64,
    frame_counter: u64,
    playing: bool,
    first_run_armed: bool,
    current_step: usize,
}

fn frames_per_step(sample_rate: f64, bpm: f64) -> u64 {
    ((sample_rate * 60.0 / bpm).round() as u64).max(2)
}

pub fn validate_sample_rate(sample_rate: f64) -> Result<f64, GridSeqError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(GridSeqError::InvalidSampleRate(sample_rate))
    }
}

impl TransportClock {
    pub fn new(sample_rate: f64) -> Result<Self, GridSeqError> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        Ok(TransportClock {
            sample_rate,
            bpm: DEFAULT_BPM,
            frames_per_step: frames_per_step(sample_rate, DEFAULT_BPM),
            frame_counter: 0,
            playing: false,
            first_run_armed: false,
            current_step: 0,
        })
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), GridSeqError> {
        self.sample_rate = validate_sample_rate(sample_rate)?;
        self.frames_per_step = frames_per_step(self.sample_rate, self.bpm);
        self.rewind();
        Ok(())
    }

    fn rewind(&mut self) {
        self.frame_counter = 0;
        self.current_step = 0;
        self.first_run_armed = true;
    }

    pub fn activate(&mut self) {
        self.rewind();
    }

    /// the next block reporting a playing transport is treated as a start
    pub fn deactivate(&mut self) {
        self.playing = false;
    }

    pub fn frames_per_step(&self) -> u64 {
        self.frames_per_step
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Advances the timeline by one block. A tempo received here only applies from the next block.
    pub fn tick(&mut self, n_samples: usize, tempo: Option<f64>, playing: Option<bool>, sequence_length: usize) -> ClockTick {
        let mut tick = ClockTick::default();

        if let Some(playing) = playing {
            if playing && !self.playing {
                self.rewind();
            } else if !playing && self.playing {
                tick.stopped = true;
            }
            self.playing = playing;
        }

        if self.playing {
            if self.first_run_armed {
                self.first_run_armed = false;
                tick.first_run = true;
            }

            if n_samples > 0 {
                self.advance(n_samples, sequence_length, &mut tick);
            }
        }

        if let Some(bpm) = tempo {
            self.set_tempo(bpm);
        }

        tick
    }

    fn advance(&mut self, n_samples: usize, sequence_length: usize, tick: &mut ClockTick) {
        let frames_per_step = self.frames_per_step;
        let half_step = frames_per_step / 2;
        let block = n_samples as u64;
        let last_frame = n_samples - 1;

        let old_step = self.frame_counter / frames_per_step;
        let old_phase = self.frame_counter % frames_per_step;

        self.frame_counter += block;
        let new_step = self.frame_counter / frames_per_step;

        let length = sequence_length.max(1) as u64;

        if new_step != old_step {
            let frame = (frames_per_step - old_phase).min(last_frame as u64) as usize;
            tick.boundary = Some(ClockEvent::Boundary {
                frame,
                step: (new_step % length) as usize,
            });
        }

        // first midpoint strictly after the block start
        let to_midpoint = if old_phase < half_step {
            half_step - old_phase
        } else {
            frames_per_step - old_phase + half_step
        };
        if to_midpoint <= block {
            tick.midpoint = Some(ClockEvent::Midpoint {
                frame: to_midpoint.min(last_frame as u64) as usize,
            });
        }

        self.current_step = (new_step % length) as usize;
    }

    /// keeps the position inside the current step when the step duration changes
    fn set_tempo(&mut self, bpm: f64) {
        if !bpm.is_finite() || bpm <= 0.0 {
            return;
        }
        let bpm = bpm.max(MIN_BPM).min(MAX_BPM);
        if bpm == self.bpm {
            return;
        }
        let new_frames_per_step = frames_per_step(self.sample_rate, bpm);
        let step = (self.frame_counter / self.frames_per_step) as u128;
        let phase = (self.frame_counter % self.frames_per_step) as u128;
        let rescaled = step * new_frames_per_step as u128
            + phase * new_frames_per_step as u128 / self.frames_per_step as u128;
        // only the step modulo the sequence length matters, restart the count rather than wrap
        self.frame_counter = match u64::try_from(rescaled) {
            Ok(frame_counter) => frame_counter,
            Err(_) => (phase * new_frames_per_step as u128 / self.frames_per_step as u128) as u64,
        };
        self.frames_per_step = new_frames_per_step;
        self.bpm = bpm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_clock() -> TransportClock {
        let mut clock = TransportClock::new(48000.0).unwrap();
        clock.activate();
        clock
    }

    #[test]
    fn one_step_is_one_beat() {
        let clock = TransportClock::new(48000.0).unwrap();
        assert_eq!(clock.frames_per_step(), 24000);
    }

    #[test]
    fn invalid_sample_rate_is_rejected() {
        assert!(TransportClock::new(0.0).is_err());
        assert!(TransportClock::new(f64::NAN).is_err());
    }

    #[test]
    fn first_block_after_start_is_first_run() {
        let mut clock = playing_clock();
        let tick = clock.tick(64, None, Some(true), 8);
        assert!(tick.first_run);
        assert_eq!(tick.boundary, None);
        assert_eq!(tick.midpoint, None);
        assert!(!clock.tick(64, None, Some(true), 8).first_run);
    }

    #[test]
    fn first_run_waits_for_transport() {
        let mut clock = playing_clock();
        assert!(!clock.tick(64, None, Some(false), 8).first_run);
        assert!(clock.tick(64, None, Some(true), 8).first_run);
    }

    #[test]
    fn boundary_offset_inside_block() {
        let mut clock = playing_clock();
        let tick = clock.tick(23900, None, Some(true), 8);
        assert_eq!(tick.midpoint, Some(ClockEvent::Midpoint { frame: 12000 }));
        assert_eq!(tick.boundary, None);

        let tick = clock.tick(200, None, Some(true), 8);
        assert_eq!(tick.boundary, Some(ClockEvent::Boundary { frame: 100, step: 1 }));
        assert_eq!(clock.current_step(), 1);
    }

    #[test]
    fn boundary_at_block_end_is_clamped() {
        let mut clock = playing_clock();
        clock.tick(23872, None, Some(true), 8);
        let tick = clock.tick(128, None, Some(true), 8);
        assert_eq!(tick.boundary, Some(ClockEvent::Boundary { frame: 127, step: 1 }));
    }

    #[test]
    fn midpoint_before_boundary_is_ordered_first() {
        let mut clock = TransportClock::new(100.0).unwrap();
        clock.activate();
        // 50 frames per step at 120 bpm
        clock.tick(20, None, Some(true), 8);
        let tick = clock.tick(40, None, Some(true), 8);
        let events: Vec<_> = tick.events().collect();
        assert_eq!(
            events,
            vec![ClockEvent::Midpoint { frame: 5 }, ClockEvent::Boundary { frame: 30, step: 1 }]
        );
    }

    #[test]
    fn step_wraps_on_sequence_length() {
        let mut clock = playing_clock();
        let mut steps = vec![];
        for _ in 0..7 {
            clock.tick(24000, None, Some(true), 3);
            steps.push(clock.current_step());
        }
        assert_eq!(steps, vec![1, 2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn stopping_is_reported_once() {
        let mut clock = playing_clock();
        clock.tick(64, None, Some(true), 8);
        assert!(clock.tick(64, None, Some(false), 8).stopped);
        assert!(!clock.tick(64, None, Some(false), 8).stopped);
    }

    #[test]
    fn clock_does_not_move_while_stopped() {
        let mut clock = playing_clock();
        clock.tick(30000, None, Some(true), 8);
        assert_eq!(clock.current_step(), 1);
        let tick = clock.tick(30000, None, Some(false), 8);
        assert_eq!(tick.boundary, None);
        assert_eq!(clock.current_step(), 1);
    }

    #[test]
    fn restart_rewinds_to_step_zero() {
        let mut clock = playing_clock();
        clock.tick(30000, None, Some(true), 8);
        clock.tick(64, None, Some(false), 8);
        let tick = clock.tick(64, None, Some(true), 8);
        assert!(tick.first_run);
        assert_eq!(clock.current_step(), 0);
    }

    #[test]
    fn tempo_change_keeps_phase_and_applies_next_block() {
        let mut clock = playing_clock();
        let tick = clock.tick(6000, Some(60.0), Some(true), 8);
        assert_eq!(tick.midpoint, None);
        assert_eq!(clock.frames_per_step(), 48000);

        // a quarter of the step is behind us, the midpoint is now 12000 frames away
        let tick = clock.tick(20000, None, Some(true), 8);
        assert_eq!(tick.midpoint, Some(ClockEvent::Midpoint { frame: 12000 }));
        assert_eq!(clock.current_step(), 0);
    }

    #[test]
    fn invalid_tempo_is_ignored() {
        let mut clock = playing_clock();
        clock.tick(64, Some(0.0), Some(true), 8);
        clock.tick(64, Some(-3.0), Some(true), 8);
        clock.tick(64, Some(f64::INFINITY), Some(true), 8);
        assert_eq!(clock.bpm(), DEFAULT_BPM);
    }

    #[test]
    fn extreme_tempos_are_clamped() {
        let mut clock = playing_clock();
        clock.tick(12000, None, Some(true), 8);
        clock.tick(64, Some(1e-9), Some(true), 8);
        assert_eq!(clock.bpm(), MIN_BPM);
        assert_eq!(clock.frames_per_step(), 48000 * 60);

        // still halfway through step 0
        let tick = clock.tick(64, None, Some(true), 8);
        assert_eq!(clock.current_step(), 0);
        assert_eq!(tick.boundary, None);

        clock.tick(64, Some(1e12), Some(true), 8);
        assert_eq!(clock.bpm(), MAX_BPM);
        assert_eq!(clock.current_step(), 0);
        let tick = clock.tick(2000, None, Some(true), 8);
        assert!(tick.boundary.is_some());
        assert_eq!(clock.current_step(), 1);
    }
}
