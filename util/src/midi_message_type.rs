use core::convert::From;

use super::constants::{CC as CONTROL_CHANGE, NOTE_OFF, NOTE_ON, STATUS_MASK};
use super::messages::{NoteOff, NoteOn, CC};
use super::raw_message::RawMessage;


pub enum MidiMessageType {
    NoteOnMessage(NoteOn),
    NoteOffMessage(NoteOff),
    CCMessage(CC),
    Unsupported
}

impl From<RawMessage> for MidiMessageType {
    fn from(data: RawMessage) -> Self {
        match data[0] & STATUS_MASK {
            NOTE_OFF => MidiMessageType::NoteOffMessage(NoteOff::from(data)),
            // note on with velocity 0 is a note off by convention
            NOTE_ON if data[2] == 0 => MidiMessageType::NoteOffMessage(NoteOff::from(data)),
            NOTE_ON => MidiMessageType::NoteOnMessage(NoteOn::from(data)),
            CONTROL_CHANGE => MidiMessageType::CCMessage(CC::from(data)),
            _ => MidiMessageType::Unsupported
        }
    }
}


impl From<&[u8; 3]> for MidiMessageType {
    fn from(data: &[u8; 3]) -> Self {
        Self::from(RawMessage::from(*data))
    }
}
