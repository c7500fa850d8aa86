use std::convert::TryFrom;

use vst::event::{Event, SysExEvent};

use util::midi_message_with_delta::MidiMessageWithDelta;
use util::raw_message::RawMessage;

pub const MIDI_OUT_CAPACITY: usize = 4096;
pub const HARDWARE_OUT_CAPACITY: usize = 1024;

const SHORT_MESSAGE_SIZE: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
    Midi(RawMessage),
    SysEx(&'static [u8]),
}

impl OutboundMessage {
    pub fn size(&self) -> usize {
        match self {
            OutboundMessage::Midi(_) => SHORT_MESSAGE_SIZE,
            OutboundMessage::SysEx(payload) => payload.len(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            OutboundMessage::Midi(message) => message.get_bytes(),
            OutboundMessage::SysEx(payload) => payload,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutboundEvent {
    pub frame: usize,
    pub message: OutboundMessage,
}

impl OutboundEvent {
    pub fn to_host_event(&self) -> Event<'static> {
        match self.message {
            OutboundMessage::Midi(data) => Event::Midi(
                MidiMessageWithDelta {
                    delta_frames: u16::try_from(self.frame).unwrap_or(u16::MAX),
                    data,
                }
                .new_midi_event(),
            ),
            OutboundMessage::SysEx(payload) => Event::SysEx(SysExEvent {
                payload,
                delta_frames: i32::try_from(self.frame).unwrap_or(i32::MAX),
            }),
        }
    }
}

/// Fixed capacity output stream for one block. Capacity is counted in MIDI bytes like a host
/// sequence buffer; once an event does not fit, the rest of the block is dropped.
pub struct EventBuffer {
    events: Vec<OutboundEvent>,
    capacity: usize,
    used: usize,
    overflowed: bool,
}

impl EventBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        EventBuffer {
            events: Vec::with_capacity(capacity / SHORT_MESSAGE_SIZE + 1),
            capacity,
            used: 0,
            overflowed: false,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.used = 0;
        self.overflowed = false;
    }

    /// returns false when the event was dropped
    pub fn push(&mut self, frame: usize, message: OutboundMessage) -> bool {
        if self.overflowed || self.used + message.size() > self.capacity {
            self.overflowed = true;
            return false;
        }
        self.used += message.size();
        self.events.push(OutboundEvent { frame, message });
        true
    }

    pub fn push_midi(&mut self, frame: usize, message: RawMessage) -> bool {
        self.push(frame, OutboundMessage::Midi(message))
    }

    pub fn push_sysex(&mut self, frame: usize, payload: &'static [u8]) -> bool {
        self.push(frame, OutboundMessage::SysEx(payload))
    }

    pub fn events(&self) -> &[OutboundEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn midi_messages(&self) -> impl Iterator<Item = (usize, [u8; 3])> + '_ {
        self.events.iter().filter_map(|event| match event.message {
            OutboundMessage::Midi(message) => Some((event.frame, message.into())),
            OutboundMessage::SysEx(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_counted_in_bytes() {
        let mut buffer = EventBuffer::with_capacity(12);
        assert!(buffer.push_sysex(0, &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]));
        assert!(buffer.push_midi(0, RawMessage::from([0x90, 0x24, 0x64])));
        assert!(buffer.push_midi(1, RawMessage::from([0x90, 0x26, 0x64])));
        assert!(!buffer.push_midi(2, RawMessage::from([0x90, 0x28, 0x64])));
        assert_eq!(buffer.events().len(), 3);
    }

    #[test]
    fn nothing_is_accepted_after_an_overflow() {
        let mut buffer = EventBuffer::with_capacity(8);
        assert!(buffer.push_midi(0, RawMessage::from([0x90, 0x24, 0x64])));
        assert!(!buffer.push_sysex(0, &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]));
        assert!(!buffer.push_midi(0, RawMessage::from([0x80, 0x24, 0x00])));

        buffer.clear();
        assert!(buffer.push_midi(0, RawMessage::from([0x80, 0x24, 0x00])));
    }

    #[test]
    fn host_events_keep_frame_and_bytes() {
        let event = OutboundEvent {
            frame: 100,
            message: OutboundMessage::Midi(RawMessage::from([0x90, 0x26, 0x64])),
        };
        match event.to_host_event() {
            Event::Midi(midi_event) => {
                assert_eq!(midi_event.data, [0x90, 0x26, 0x64]);
                assert_eq!(midi_event.delta_frames, 100);
            }
            _ => panic!("expected a midi event"),
        }
    }

    #[test]
    fn late_frames_saturate_instead_of_wrapping() {
        let event = OutboundEvent {
            frame: 70_000,
            message: OutboundMessage::Midi(RawMessage::from([0x90, 0x24, 0x64])),
        };
        match event.to_host_event() {
            Event::Midi(midi_event) => assert_eq!(midi_event.delta_frames, u16::MAX as i32),
            _ => panic!("expected a midi event"),
        }

        let event = OutboundEvent {
            frame: 70_000,
            message: OutboundMessage::SysEx(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]),
        };
        match event.to_host_event() {
            Event::SysEx(sysex_event) => assert_eq!(sysex_event.delta_frames, 70_000),
            _ => panic!("expected a sysex event"),
        }
    }
}
