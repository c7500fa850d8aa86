use vst::event::MidiEvent;

use super::constants::{CC as CONTROL_CHANGE, CHANNEL_MASK, NOTE_OFF, NOTE_ON};
use super::raw_message::RawMessage;

pub fn format_midi_event(e: &MidiEvent) -> String {
    format!(
        "[{:#04X} {:#04X} {:#04X}] delta_frames={}",
        e.data[0], e.data[1], e.data[2], e.delta_frames
    )
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NoteOn {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
}

impl From<NoteOn> for RawMessage {
    fn from(note_on: NoteOn) -> Self {
        RawMessage::from([NOTE_ON + note_on.channel, note_on.pitch, note_on.velocity])
    }
}

impl From<RawMessage> for NoteOn {
    fn from(data: RawMessage) -> Self {
        NoteOn {
            channel: data[0] & CHANNEL_MASK,
            pitch: data[1],
            velocity: data[2],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NoteOff {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
}

impl From<NoteOn> for NoteOff {
    fn from(m: NoteOn) -> Self {
        NoteOff {
            channel: m.channel,
            pitch: m.pitch,
            velocity: 0,
        }
    }
}

impl From<NoteOff> for RawMessage {
    fn from(note_off: NoteOff) -> Self {
        RawMessage::from([NOTE_OFF + note_off.channel, note_off.pitch, note_off.velocity])
    }
}

impl From<RawMessage> for NoteOff {
    fn from(data: RawMessage) -> Self {
        NoteOff {
            channel: data[0] & CHANNEL_MASK,
            pitch: data[1],
            velocity: data[2],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CC {
    pub channel: u8,
    pub cc: u8,
    pub value: u8,
}

impl From<CC> for RawMessage {
    fn from(cc: CC) -> Self {
        RawMessage::from([CONTROL_CHANGE + cc.channel, cc.cc, cc.value])
    }
}

impl From<RawMessage> for CC {
    fn from(data: RawMessage) -> Self {
        CC {
            channel: data[0] & CHANNEL_MASK,
            cc: data[1],
            value: data[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_off_from_note_on_drops_velocity() {
        let note_off = NoteOff::from(NoteOn { channel: 2, pitch: 0x24, velocity: 0x64 });
        assert_eq!(<[u8; 3]>::from(RawMessage::from(note_off)), [0x82, 0x24, 0x00]);
    }

    #[test]
    fn cc_reads_channel_from_status() {
        let cc = CC::from(RawMessage::from([0xB3, 0x5E, 0x7F]));
        assert_eq!((cc.channel, cc.cc, cc.value), (3, 0x5E, 0x7F));
    }
}
