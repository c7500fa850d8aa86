#[cfg(feature = "trace_events")]
use log::debug;

use util::raw_message::RawMessage;

use crate::command_queue::{command_queue, CommandReceiver, COMMAND_QUEUE_CAPACITY};
use crate::control::{Command, ControlPorts, EditorHandle, PortDecoder, PortOutputs};
use crate::error::GridSeqError;
use crate::output::{EventBuffer, HARDWARE_OUT_CAPACITY, MIDI_OUT_CAPACITY};
use crate::pattern::{Pattern, MAX_STEPS, PITCH_COUNT, VISIBLE_ROWS};
use crate::sequencer::{NoteLedger, NoteOffPolicy, SequencerEngine};
use crate::snapshot::{snapshot_cell, Snapshot, SnapshotWriter};
use crate::surface::{SurfaceAction, SurfaceAdapter};
use crate::transport::{validate_sample_rate, TransportClock};

const CHANGE_COUNTER_MODULO: u32 = 1_000_000;

/// Services the host must provide for an instance to work
#[derive(Clone, Copy, Debug)]
pub struct HostServices {
    /// tempo and transport state
    pub time_info: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub frame: usize,
    pub message: RawMessage,
}

pub struct BlockInput<'a> {
    pub n_samples: usize,
    pub inbound: &'a [InboundMessage],
    pub tempo: Option<f64>,
    pub playing: Option<bool>,
    pub ports: ControlPorts,
}

pub struct BlockOutput {
    pub midi_out: EventBuffer,
    pub hardware_out: EventBuffer,
    pub ports: PortOutputs,
}

impl Default for BlockOutput {
    fn default() -> Self {
        BlockOutput {
            midi_out: EventBuffer::with_capacity(MIDI_OUT_CAPACITY),
            hardware_out: EventBuffer::with_capacity(HARDWARE_OUT_CAPACITY),
            ports: PortOutputs::default(),
        }
    }
}

impl BlockOutput {
    pub fn clear(&mut self) {
        self.midi_out.clear();
        self.hardware_out.clear();
    }
}

/// The sequencer and the pad controller adapter, run once per audio block
pub struct GridSeqCore {
    pattern: Pattern,
    clock: TransportClock,
    engine: SequencerEngine,
    surface: SurfaceAdapter,
    decoder: PortDecoder,
    commands: CommandReceiver,
    snapshots: SnapshotWriter<Snapshot>,
    last_published: Option<Snapshot>,
    change_counter: u32,
    midi_filter: bool,
    active: bool,
}

impl GridSeqCore {
    pub fn new(sample_rate: f64, services: &HostServices) -> Result<(Self, EditorHandle), GridSeqError> {
        if !services.time_info {
            return Err(GridSeqError::MissingHostService("time info"));
        }
        let clock = TransportClock::new(sample_rate)?;

        let (sender, receiver) = command_queue(COMMAND_QUEUE_CAPACITY);
        let pattern = Pattern::default();
        let (writer, reader) = snapshot_cell(Snapshot::capture(&pattern, 0, false, 0, false));

        let core = GridSeqCore {
            pattern,
            clock,
            engine: SequencerEngine::default(),
            surface: SurfaceAdapter::default(),
            decoder: PortDecoder::default(),
            commands: receiver,
            snapshots: writer,
            last_published: None,
            change_counter: 0,
            midi_filter: false,
            active: false,
        };
        Ok((core, EditorHandle::new(sender, reader)))
    }

    /// only honored while inactive
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<(), GridSeqError> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        if self.active {
            return Ok(());
        }
        self.clock.set_sample_rate(sample_rate)
    }

    pub fn activate(&mut self) {
        self.clock.activate();
        self.engine.activate();
        self.surface.activate();
        self.active = true;
    }

    /// playback halts, sounding notes are released by the next cycle
    pub fn deactivate(&mut self) {
        self.clock.deactivate();
        self.engine.deactivate();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn current_step(&self) -> usize {
        self.clock.current_step()
    }

    pub fn sounding_notes(&self) -> &NoteLedger {
        self.engine.ledger()
    }

    pub fn surface(&self) -> &SurfaceAdapter {
        &self.surface
    }

    pub fn change_counter(&self) -> u32 {
        self.change_counter
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            &self.pattern,
            self.clock.current_step(),
            self.midi_filter,
            self.change_counter,
            self.clock.is_playing(),
        )
    }

    fn pattern_changed(&mut self) {
        self.change_counter = (self.change_counter + 1) % CHANGE_COUNTER_MODULO;
        self.surface.mark_dirty();
    }

    fn window_changed(&mut self) {
        self.surface.mark_dirty();
    }

    pub fn apply(&mut self, command: Command) {
        #[cfg(feature = "trace_events")]
        debug!("applying {:?}", command);

        match command {
            Command::ToggleVisible { column, row } => {
                let pitch = self.pattern.pitch_offset() as usize + row;
                if column < MAX_STEPS
                    && row < VISIBLE_ROWS
                    && column < self.pattern.sequence_length()
                    && pitch < PITCH_COUNT
                    && self.pattern.toggle(column, pitch)
                {
                    self.pattern_changed();
                }
            }
            Command::ToggleCell { step, pitch } => {
                if self.pattern.toggle(step, pitch) {
                    self.pattern_changed();
                }
            }
            Command::SetLength(length) => {
                if self.pattern.set_length(length) {
                    self.window_changed();
                }
            }
            Command::SetFilter(midi_filter) => {
                self.midi_filter = midi_filter;
                self.engine.set_policy(NoteOffPolicy::from_filter(midi_filter));
            }
            Command::ClearPattern => {
                self.pattern.clear_all();
                self.pattern_changed();
            }
            Command::RecenterPitch => {
                self.pattern.recenter_pitch();
                self.window_changed();
            }
            Command::PitchUp => {
                self.pattern.pitch_up();
                self.window_changed();
            }
            Command::PitchDown => {
                self.pattern.pitch_down();
                self.window_changed();
            }
            Command::PageLeft => {
                self.pattern.page_left();
                self.window_changed();
            }
            Command::PageRight => {
                self.pattern.page_right();
                self.window_changed();
            }
            Command::RequestQuery => self.surface.request_query(),
            Command::RequestReset => self.surface.request_reset(),
            Command::LoadState(state) => {
                state.restore(&mut self.pattern);
                self.midi_filter = state.midi_filter;
                self.engine.set_policy(NoteOffPolicy::from_filter(state.midi_filter));
                self.pattern_changed();
            }
        }
    }

    /// One processing cycle. Events land in the output in this order: mode sysex, notes by
    /// frame, LED refresh.
    pub fn process(&mut self, input: &BlockInput, output: &mut BlockOutput) {
        output.clear();

        while let Some(command) = self.commands.try_recv() {
            self.apply(command);
        }
        let mut decoder = std::mem::take(&mut self.decoder);
        decoder.decode(&input.ports, |command| self.apply(command));
        self.decoder = decoder;

        if self.active {
            for inbound in input.inbound {
                if let SurfaceAction::CellToggled { .. } = self.surface.decode(inbound.message, &mut self.pattern) {
                    self.pattern_changed();
                }
            }

            self.surface.handshake(&mut output.midi_out, &mut output.hardware_out);

            let tick = self.clock.tick(
                input.n_samples,
                input.tempo,
                input.playing,
                self.pattern.sequence_length(),
            );
            self.engine.run(&tick, &self.pattern, &mut output.midi_out);

            self.surface
                .refresh_leds(&self.pattern, self.clock.current_step(), &mut output.hardware_out);
        } else {
            self.engine.flush(&mut output.midi_out);
        }

        self.publish(output);
    }

    fn publish(&mut self, output: &mut BlockOutput) {
        let snapshot = self.snapshot();
        output.ports = PortOutputs::from_snapshot(&snapshot);
        if self.last_published != Some(snapshot) {
            self.snapshots.publish(snapshot);
            self.last_published = Some(snapshot);
        }
    }
}
