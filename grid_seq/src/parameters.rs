#[allow(unused_imports)]
use log::{error, info};

use std::sync::Mutex;

use vst::plugin::PluginParameters;
use vst::util::ParameterTransfer;

use util::parameter_value_conversion::bool_to_f32;
use util::parameters::ParameterConversion;

use crate::control::{
    Command, ControlPorts, EditorHandle, PortOutputs, CMD_CLEAR, CMD_IDLE, CMD_PITCH_DOWN, CMD_PITCH_UP, CMD_QUERY,
    CMD_RECENTER, CMD_RESET,
};
use crate::pattern::{DEFAULT_LENGTH, MAX_STEPS, MIN_STEPS};
use crate::persistence::PersistedState;

const FIRST_COLUMN: i32 = 6;
pub const PARAMETER_COUNT: usize = FIRST_COLUMN as usize + MAX_STEPS;

const LENGTH_STEPS: usize = MAX_STEPS - MIN_STEPS + 1;
// 16 toggle columns, 6 sentinel commands, idle
const COMMAND_SLOTS: usize = MAX_STEPS + 6 + 1;
const IDLE_SLOT: usize = COMMAND_SLOTS - 1;
const ROW_STEPS: usize = 8;
const CURRENT_STEP_STEPS: usize = MAX_STEPS;
const COLUMN_STEPS: usize = 256;
const CHANGE_COUNTER_SCALE: f32 = 1_000_000.0;

const SENTINELS: [i32; 6] = [CMD_RESET, CMD_QUERY, CMD_CLEAR, CMD_RECENTER, CMD_PITCH_UP, CMD_PITCH_DOWN];

pub enum Parameter {
    SequenceLength,
    MidiFilter,
    Command,
    CommandRow,
    CurrentStep,
    ChangeCounter,
    Column(u8),
}

impl From<i32> for Parameter {
    fn from(i: i32) -> Self {
        match i {
            0 => Parameter::SequenceLength,
            1 => Parameter::MidiFilter,
            2 => Parameter::Command,
            3 => Parameter::CommandRow,
            4 => Parameter::CurrentStep,
            5 => Parameter::ChangeCounter,
            i if i >= FIRST_COLUMN && i < PARAMETER_COUNT as i32 => Parameter::Column((i - FIRST_COLUMN) as u8),
            _ => panic!("no such parameter {}", i),
        }
    }
}

impl Into<i32> for Parameter {
    fn into(self) -> i32 {
        match self {
            Parameter::SequenceLength => 0,
            Parameter::MidiFilter => 1,
            Parameter::Command => 2,
            Parameter::CommandRow => 3,
            Parameter::CurrentStep => 4,
            Parameter::ChangeCounter => 5,
            Parameter::Column(column) => FIRST_COLUMN + column as i32,
        }
    }
}

fn is_output(index: i32) -> bool {
    index >= 4
}

/// Host parameters mirror the control ports. The editor handle is where preset loads are sent.
pub struct GridSeqParameters {
    pub transfer: ParameterTransfer,
    pub editor: Mutex<Option<EditorHandle>>,
}

impl ParameterConversion<Parameter> for GridSeqParameters {
    fn get_parameter_transfer(&self) -> &ParameterTransfer {
        &self.transfer
    }

    fn get_parameter_count() -> usize {
        PARAMETER_COUNT
    }
}

impl Default for GridSeqParameters {
    fn default() -> Self {
        let parameters = GridSeqParameters {
            transfer: ParameterTransfer::new(PARAMETER_COUNT),
            editor: Mutex::new(None),
        };
        parameters.set_length(DEFAULT_LENGTH as usize);
        parameters.set_stepped_parameter(Parameter::Command, IDLE_SLOT, COMMAND_SLOTS);
        parameters
    }
}

impl GridSeqParameters {
    pub fn set_editor(&self, editor: Option<EditorHandle>) {
        if let Ok(mut guard) = self.editor.lock() {
            *guard = editor;
        }
    }

    pub fn get_length(&self) -> usize {
        MIN_STEPS + self.get_stepped_parameter(Parameter::SequenceLength, LENGTH_STEPS)
    }

    pub fn set_length(&self, length: usize) {
        let length = length.max(MIN_STEPS).min(MAX_STEPS);
        self.set_stepped_parameter(Parameter::SequenceLength, length - MIN_STEPS, LENGTH_STEPS)
    }

    pub fn get_cmd_x(&self) -> f32 {
        match self.get_stepped_parameter(Parameter::Command, COMMAND_SLOTS) {
            slot if slot < MAX_STEPS => slot as f32,
            slot if slot < IDLE_SLOT => SENTINELS[slot - MAX_STEPS] as f32,
            _ => CMD_IDLE,
        }
    }

    pub fn control_ports(&self) -> ControlPorts {
        ControlPorts {
            cmd_x: self.get_cmd_x(),
            cmd_y: self.get_stepped_parameter(Parameter::CommandRow, ROW_STEPS) as f32,
            sequence_length: self.get_length() as f32,
            midi_filter: bool_to_f32(self.get_bool_parameter(Parameter::MidiFilter)),
        }
    }

    pub fn publish_outputs(&self, outputs: &PortOutputs) {
        self.set_stepped_parameter(Parameter::CurrentStep, outputs.current_step as usize, CURRENT_STEP_STEPS);
        self.set_raw_parameter(Parameter::ChangeCounter, outputs.change_counter / CHANGE_COUNTER_SCALE);
        for (column, value) in outputs.grid_rows.iter().enumerate() {
            self.set_stepped_parameter(Parameter::Column(column as u8), *value as usize, COLUMN_STEPS);
        }
    }

    fn serialize_state(&self) -> Vec<u8> {
        let state = match self.editor.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(editor) => {
                    let snapshot = editor.latest();
                    PersistedState::from_cells(
                        &snapshot.cells,
                        snapshot.sequence_length,
                        snapshot.midi_filter,
                        snapshot.pitch_offset,
                    )
                }
                None => PersistedState::default(),
            },
            Err(_) => PersistedState::default(),
        };

        match state.to_bytes() {
            Ok(data) => data,
            Err(err) => {
                error!("Cannot save state: {}", err);
                vec![]
            }
        }
    }

    fn deserialize_state(&self, data: &[u8]) {
        let state = match PersistedState::from_bytes(data) {
            Ok(state) => state,
            Err(err) => {
                error!("Ignoring saved state: {}", err);
                return;
            }
        };
        info!("Loading state, length={} filter={}", state.sequence_length, state.midi_filter);

        // ports are edge triggered, they must agree with the loaded state
        self.set_length(state.sequence_length as usize);
        self.set_bool_parameter(Parameter::MidiFilter, state.midi_filter);

        if let Ok(mut guard) = self.editor.lock() {
            match guard.as_mut() {
                Some(editor) => {
                    let _ = editor.send(Command::LoadState(state));
                }
                None => error!("No running sequencer, state not loaded"),
            }
        }
    }
}

impl PluginParameters for GridSeqParameters {
    fn get_parameter_text(&self, index: i32) -> String {
        match index.into() {
            Parameter::SequenceLength => self.get_length().to_string(),
            Parameter::MidiFilter => match self.get_bool_parameter(Parameter::MidiFilter) {
                true => "Notes on only",
                false => "Gate",
            }
            .to_string(),
            Parameter::Command => match self.get_cmd_x() {
                x if x >= 0. => format!("Toggle column {}", x as usize + 1),
                x => match x as i32 {
                    CMD_RESET => "Reset device",
                    CMD_QUERY => "Query device",
                    CMD_CLEAR => "Clear",
                    CMD_RECENTER => "Recenter pitch",
                    CMD_PITCH_UP => "Pitch up",
                    CMD_PITCH_DOWN => "Pitch down",
                    _ => "Idle",
                }
                .to_string(),
            },
            Parameter::CommandRow => (self.get_stepped_parameter(Parameter::CommandRow, ROW_STEPS) + 1).to_string(),
            Parameter::CurrentStep => {
                (self.get_stepped_parameter(Parameter::CurrentStep, CURRENT_STEP_STEPS) + 1).to_string()
            }
            Parameter::ChangeCounter => ((self.get_parameter(index) * CHANGE_COUNTER_SCALE).round() as u32).to_string(),
            parameter @ Parameter::Column(_) => format!("{:08b}", self.get_stepped_parameter(parameter, COLUMN_STEPS)),
        }
    }

    fn get_parameter_name(&self, index: i32) -> String {
        match index.into() {
            Parameter::SequenceLength => "Sequence length".to_string(),
            Parameter::MidiFilter => "MIDI filter".to_string(),
            Parameter::Command => "Command".to_string(),
            Parameter::CommandRow => "Command row".to_string(),
            Parameter::CurrentStep => "Current step".to_string(),
            Parameter::ChangeCounter => "Change counter".to_string(),
            Parameter::Column(column) => format!("Column {}", column + 1),
        }
    }

    fn get_parameter(&self, index: i32) -> f32 {
        self.get_parameter_transfer().get_parameter(index as usize)
    }

    fn set_parameter(&self, index: i32, value: f32) {
        if is_output(index) {
            // written by the audio thread only
            return;
        }
        if value != self.get_parameter(index) {
            self.transfer.set_parameter(index as usize, value)
        }
    }

    fn can_be_automated(&self, index: i32) -> bool {
        !is_output(index)
    }

    fn get_preset_data(&self) -> Vec<u8> {
        self.serialize_state()
    }

    fn get_bank_data(&self) -> Vec<u8> {
        self.serialize_state()
    }

    fn load_preset_data(&self, data: &[u8]) {
        info!("Load preset data");
        self.deserialize_state(data)
    }

    fn load_bank_data(&self, data: &[u8]) {
        info!("Load bank data");
        self.deserialize_state(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_are_idle() {
        let parameters = GridSeqParameters::default();
        assert_eq!(parameters.control_ports(), ControlPorts::default());
    }

    #[test]
    fn command_slots_map_to_port_values() {
        let parameters = GridSeqParameters::default();
        parameters.set_parameter(2, steps(4, COMMAND_SLOTS));
        assert_eq!(parameters.get_cmd_x(), 4.);
        parameters.set_parameter(2, steps(16, COMMAND_SLOTS));
        assert_eq!(parameters.get_cmd_x(), -100.);
        parameters.set_parameter(2, steps(21, COMMAND_SLOTS));
        assert_eq!(parameters.get_cmd_x(), -600.);
        parameters.set_parameter(2, 1.);
        assert_eq!(parameters.get_cmd_x(), CMD_IDLE);
    }

    #[test]
    fn length_covers_two_to_sixteen() {
        let parameters = GridSeqParameters::default();
        parameters.set_parameter(0, 0.);
        assert_eq!(parameters.get_length(), 2);
        parameters.set_parameter(0, 1.);
        assert_eq!(parameters.get_length(), 16);
        assert_eq!(parameters.get_parameter_text(0), "16");
    }

    #[test]
    fn outputs_ignore_host_writes() {
        let parameters = GridSeqParameters::default();
        let mut outputs = PortOutputs::default();
        outputs.current_step = 3.;
        outputs.grid_rows[2] = 0b1000_0001 as f32;
        parameters.publish_outputs(&outputs);
        parameters.set_parameter(4, 0.);

        assert_eq!(parameters.get_parameter_text(4), "4");
        assert_eq!(parameters.get_parameter_text(FIRST_COLUMN + 2), "10000001");
    }

    fn steps(value: usize, count: usize) -> f32 {
        util::parameter_value_conversion::steps_to_f32(value, count)
    }
}
