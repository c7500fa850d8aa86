#[cfg(feature = "trace_events")]
use log::debug;

use util::messages::{NoteOff, NoteOn};
use util::raw_message::RawMessage;

use crate::output::EventBuffer;
use crate::pattern::Pattern;
use crate::transport::{ClockEvent, ClockTick};

pub const NOTE_CHANNEL: u8 = 0;
pub const NOTE_VELOCITY: u8 = 100;

/// Pitches with a note-on sent and no note-off yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoteLedger(u128);

impl NoteLedger {
    pub fn insert(&mut self, pitch: u8) -> bool {
        let bit = 1u128 << (pitch & 0x7F);
        let inserted = self.0 & bit == 0;
        self.0 |= bit;
        inserted
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.0 & (1u128 << (pitch & 0x7F)) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// empties the ledger, yielding pitches in ascending order
    pub fn drain(&mut self) -> impl Iterator<Item = u8> {
        let mut pitches = std::mem::take(&mut self.0);
        std::iter::from_fn(move || {
            if pitches == 0 {
                return None;
            }
            let pitch = pitches.trailing_zeros() as u8;
            pitches &= pitches - 1;
            Some(pitch)
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteOffPolicy {
    /// notes are released at the middle of the step
    Gate,
    /// notes are only released when playback stops or the plugin is deactivated
    NotesOnOnly,
}

impl NoteOffPolicy {
    pub fn from_filter(midi_filter: bool) -> Self {
        if midi_filter {
            NoteOffPolicy::NotesOnOnly
        } else {
            NoteOffPolicy::Gate
        }
    }
}

impl Default for NoteOffPolicy {
    fn default() -> Self {
        NoteOffPolicy::Gate
    }
}

/// Turns clock events into note-on/note-off messages for the active cells of the pattern.
#[derive(Default)]
pub struct SequencerEngine {
    ledger: NoteLedger,
    policy: NoteOffPolicy,
    release_pending: bool,
}

impl SequencerEngine {
    pub fn policy(&self) -> NoteOffPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: NoteOffPolicy) {
        self.policy = policy;
    }

    pub fn ledger(&self) -> &NoteLedger {
        &self.ledger
    }

    /// leftovers of a previous run are released by the first cycle
    pub fn activate(&mut self) {
        self.release_pending = !self.ledger.is_empty();
    }

    pub fn deactivate(&mut self) {
        self.release_pending = true;
    }

    /// sends the pending all-notes-off sweep, if any, at frame 0
    pub fn flush(&mut self, out: &mut EventBuffer) {
        if self.release_pending {
            self.release_pending = false;
            self.release_all(0, out);
        }
    }

    pub fn run(&mut self, tick: &ClockTick, pattern: &Pattern, out: &mut EventBuffer) {
        self.flush(out);

        if tick.stopped {
            self.release_all(0, out);
        }

        if tick.first_run {
            self.trigger_step(0, 0, pattern, out);
        }

        for event in tick.events() {
            match event {
                ClockEvent::Boundary { frame, step } => self.trigger_step(step, frame, pattern, out),
                ClockEvent::Midpoint { frame } => {
                    if self.policy == NoteOffPolicy::Gate {
                        self.release_all(frame, out);
                    }
                }
            }
        }
    }

    fn trigger_step(&mut self, step: usize, frame: usize, pattern: &Pattern, out: &mut EventBuffer) {
        if self.policy == NoteOffPolicy::Gate {
            self.release_all(frame, out);
        }

        for pitch in pattern.active_pitches(step) {
            // a pitch held since an earlier step keeps sounding, one note-on per note-off
            if !self.ledger.insert(pitch) {
                continue;
            }
            let note_on = NoteOn {
                channel: NOTE_CHANNEL,
                pitch,
                velocity: NOTE_VELOCITY,
            };
            // the ledger is updated even if the message does not fit, an orphan note-off is harmless
            let _sent = out.push_midi(frame, RawMessage::from(note_on));
            #[cfg(feature = "trace_events")]
            debug!("step {} note on {} at {} sent={}", step, pitch, frame, _sent);
        }
    }

    fn release_all(&mut self, frame: usize, out: &mut EventBuffer) {
        for pitch in self.ledger.drain() {
            let note_off = NoteOff {
                channel: NOTE_CHANNEL,
                pitch,
                velocity: 0,
            };
            let _sent = out.push_midi(frame, RawMessage::from(note_off));
            #[cfg(feature = "trace_events")]
            debug!("note off {} at {} sent={}", pitch, frame, _sent);
        }
    }
}
