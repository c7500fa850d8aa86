#[allow(unused_imports)]
use log::{error, info};

use crate::command_queue::CommandSender;
use crate::error::GridSeqError;
use crate::pattern::{MAX_STEPS, VISIBLE_ROWS};
use crate::persistence::PersistedState;
use crate::snapshot::{Snapshot, SnapshotReader};

/// Editor requests, applied by the audio thread at the top of a cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// column on the whole 16 step pattern, row above the pitch offset
    ToggleVisible { column: usize, row: usize },
    ToggleCell { step: usize, pitch: usize },
    SetLength(usize),
    SetFilter(bool),
    ClearPattern,
    RecenterPitch,
    PitchUp,
    PitchDown,
    PageLeft,
    PageRight,
    RequestQuery,
    RequestReset,
    LoadState(PersistedState),
}

pub const CMD_IDLE: f32 = -1.0;
pub const CMD_RESET: i32 = -100;
pub const CMD_QUERY: i32 = -200;
pub const CMD_CLEAR: i32 = -300;
pub const CMD_RECENTER: i32 = -400;
pub const CMD_PITCH_UP: i32 = -500;
pub const CMD_PITCH_DOWN: i32 = -600;

/// Numeric control port values as written by a port based editor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPorts {
    pub cmd_x: f32,
    pub cmd_y: f32,
    pub sequence_length: f32,
    pub midi_filter: f32,
}

impl Default for ControlPorts {
    fn default() -> Self {
        ControlPorts {
            cmd_x: CMD_IDLE,
            cmd_y: 0.0,
            sequence_length: crate::pattern::DEFAULT_LENGTH as f32,
            midi_filter: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortOutputs {
    pub current_step: f32,
    pub change_counter: f32,
    pub grid_rows: [f32; MAX_STEPS],
}

impl PortOutputs {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut grid_rows = [0.0; MAX_STEPS];
        for (row, column) in grid_rows.iter_mut().zip(snapshot.columns.iter()) {
            *row = *column as f32;
        }
        PortOutputs {
            current_step: snapshot.current_step as f32,
            change_counter: snapshot.change_counter as f32,
            grid_rows,
        }
    }
}

/// Turns port writes into commands. Every port only fires when its value differs from the last
/// one seen, the first cycle applies whatever the ports hold. A toggle fires when either
/// coordinate moves, sentinels only when `cmd_x` does.
#[derive(Default)]
pub struct PortDecoder {
    last_cmd_x: Option<f32>,
    last_cmd_y: Option<f32>,
    last_sequence_length: Option<f32>,
    last_midi_filter: Option<f32>,
}

impl PortDecoder {
    pub fn decode<F: FnMut(Command)>(&mut self, ports: &ControlPorts, mut apply: F) {
        if self.last_sequence_length != Some(ports.sequence_length) {
            self.last_sequence_length = Some(ports.sequence_length);
            if ports.sequence_length.is_finite() && ports.sequence_length >= 0.0 {
                apply(Command::SetLength(ports.sequence_length.round() as usize));
            }
        }

        if self.last_midi_filter != Some(ports.midi_filter) {
            self.last_midi_filter = Some(ports.midi_filter);
            apply(Command::SetFilter(ports.midi_filter > 0.5));
        }

        let x_changed = self.last_cmd_x != Some(ports.cmd_x);
        let y_changed = self.last_cmd_y != Some(ports.cmd_y);
        self.last_cmd_x = Some(ports.cmd_x);
        self.last_cmd_y = Some(ports.cmd_y);

        if x_changed || (y_changed && ports.cmd_x >= 0.0) {
            if let Some(command) = decode_cmd(ports.cmd_x, ports.cmd_y) {
                apply(command);
            }
        }
    }
}

fn decode_cmd(cmd_x: f32, cmd_y: f32) -> Option<Command> {
    if !cmd_x.is_finite() {
        return None;
    }
    if cmd_x >= 0.0 {
        let column = cmd_x as usize;
        if column >= MAX_STEPS || !(cmd_y >= 0.0 && cmd_y < VISIBLE_ROWS as f32) {
            return None;
        }
        return Some(Command::ToggleVisible {
            column,
            row: cmd_y as usize,
        });
    }

    match cmd_x.round() as i32 {
        CMD_RESET => Some(Command::RequestReset),
        CMD_QUERY => Some(Command::RequestQuery),
        CMD_CLEAR => Some(Command::ClearPattern),
        CMD_RECENTER => Some(Command::RecenterPitch),
        CMD_PITCH_UP => Some(Command::PitchUp),
        CMD_PITCH_DOWN => Some(Command::PitchDown),
        _ => None,
    }
}

/// What the editor holds: a way to send commands and to look at the latest published state
pub struct EditorHandle {
    commands: CommandSender,
    snapshots: SnapshotReader<Snapshot>,
}

impl EditorHandle {
    pub(crate) fn new(commands: CommandSender, snapshots: SnapshotReader<Snapshot>) -> Self {
        EditorHandle { commands, snapshots }
    }

    pub fn send(&mut self, command: Command) -> Result<(), GridSeqError> {
        let result = self.commands.send(command);
        if let Err(error) = &result {
            error!("dropping {:?}: {}", command, error);
        }
        result
    }

    pub fn latest(&mut self) -> Snapshot {
        self.snapshots.read()
    }

    pub fn has_update(&self) -> bool {
        self.snapshots.has_fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(cmd_x: f32, cmd_y: f32) -> ControlPorts {
        ControlPorts {
            cmd_x,
            cmd_y,
            ..Default::default()
        }
    }

    fn decode(decoder: &mut PortDecoder, ports: &ControlPorts) -> Vec<Command> {
        let mut commands = vec![];
        decoder.decode(ports, |command| commands.push(command));
        commands
    }

    #[test]
    fn first_cycle_applies_length_and_filter() {
        let mut decoder = PortDecoder::default();
        assert_eq!(
            decode(&mut decoder, &ControlPorts::default()),
            vec![Command::SetLength(8), Command::SetFilter(false)]
        );
        assert!(decode(&mut decoder, &ControlPorts::default()).is_empty());
    }

    #[test]
    fn commands_fire_on_change_only() {
        let mut decoder = PortDecoder::default();
        decode(&mut decoder, &ControlPorts::default());

        assert_eq!(
            decode(&mut decoder, &ports(4.0, 3.0)),
            vec![Command::ToggleVisible { column: 4, row: 3 }]
        );
        assert!(decode(&mut decoder, &ports(4.0, 3.0)).is_empty());
        assert!(decode(&mut decoder, &ports(CMD_IDLE, 0.0)).is_empty());
        assert_eq!(decode(&mut decoder, &ports(4.0, 3.0)).len(), 1);
    }

    #[test]
    fn row_change_alone_toggles_again() {
        let mut decoder = PortDecoder::default();
        decode(&mut decoder, &ControlPorts::default());

        assert_eq!(
            decode(&mut decoder, &ports(4.0, 3.0)),
            vec![Command::ToggleVisible { column: 4, row: 3 }]
        );
        assert_eq!(
            decode(&mut decoder, &ports(4.0, 5.0)),
            vec![Command::ToggleVisible { column: 4, row: 5 }]
        );
        assert!(decode(&mut decoder, &ports(4.0, 5.0)).is_empty());
    }

    #[test]
    fn row_change_does_not_repeat_sentinels() {
        let mut decoder = PortDecoder::default();
        decode(&mut decoder, &ControlPorts::default());

        assert_eq!(decode(&mut decoder, &ports(-300.0, 0.0)), vec![Command::ClearPattern]);
        assert!(decode(&mut decoder, &ports(-300.0, 2.0)).is_empty());
        assert!(decode(&mut decoder, &ports(CMD_IDLE, 4.0)).is_empty());
    }

    #[test]
    fn sentinels() {
        let expected = vec![
            (-100.0, Command::RequestReset),
            (-200.0, Command::RequestQuery),
            (-300.0, Command::ClearPattern),
            (-400.0, Command::RecenterPitch),
            (-500.0, Command::PitchUp),
            (-600.0, Command::PitchDown),
        ];
        let mut decoder = PortDecoder::default();
        decode(&mut decoder, &ControlPorts::default());
        for (cmd_x, command) in expected {
            assert_eq!(decode(&mut decoder, &ports(cmd_x, 0.0)), vec![command]);
        }
        assert!(decode(&mut decoder, &ports(-700.0, 0.0)).is_empty());
    }

    #[test]
    fn out_of_range_toggles_are_ignored() {
        let mut decoder = PortDecoder::default();
        decode(&mut decoder, &ControlPorts::default());
        assert!(decode(&mut decoder, &ports(16.0, 0.0)).is_empty());
        assert!(decode(&mut decoder, &ports(3.0, 8.0)).is_empty());
        assert!(decode(&mut decoder, &ports(f32::NAN, 0.0)).is_empty());
    }
}
