//! Wire format of the Launchpad X in programmer mode

use util::constants::{CC as CONTROL_CHANGE, NOTE_ON};
use util::raw_message::RawMessage;

pub const PROGRAMMER_MODE_ENTER: &[u8] = &[0xF0, 0x00, 0x20, 0x29, 0x02, 0x0D, 0x0E, 0x01, 0xF7];
pub const PROGRAMMER_MODE_EXIT: &[u8] = &[0xF0, 0x00, 0x20, 0x29, 0x02, 0x0D, 0x0E, 0x00, 0xF7];
pub const DEVICE_INQUIRY: &[u8] = &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];

pub const GRID_SIZE: usize = 8;
const FIRST_PAD: u8 = 11;
const ROW_STRIDE: u8 = 10;

// http://launchpaddr.com/mk2palette/
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Light {
    Off,
    Green,
    GreenDim,
    Yellow,
    White,
}

impl Light {
    pub fn value(&self) -> u8 {
        match self {
            Light::Off => 0,
            Light::Green => 21,
            Light::GreenDim => 23,
            Light::Yellow => 13,
            Light::White => 3,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Light::Off
    }
}

/// The top row buttons used by the sequencer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AuxButton {
    PitchDown,
    PitchUp,
    PageLeft,
    PageRight,
}

pub const AUX_BUTTONS: [AuxButton; 4] = [
    AuxButton::PitchDown,
    AuxButton::PitchUp,
    AuxButton::PageLeft,
    AuxButton::PageRight,
];

impl AuxButton {
    pub fn cc(&self) -> u8 {
        match self {
            AuxButton::PitchDown => 91,
            AuxButton::PitchUp => 92,
            AuxButton::PageLeft => 93,
            AuxButton::PageRight => 94,
        }
    }

    pub fn from_cc(cc: u8) -> Option<Self> {
        AUX_BUTTONS.iter().copied().find(|button| button.cc() == cc)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

pub fn pad_note(column: usize, row: usize) -> u8 {
    FIRST_PAD + column as u8 + ROW_STRIDE * row as u8
}

/// (column, row) of a pad note, row 0 is the bottom row
pub fn pad_position(note: u8) -> Option<(usize, usize)> {
    if note < FIRST_PAD {
        return None;
    }
    let column = ((note - FIRST_PAD) % ROW_STRIDE) as usize;
    let row = ((note - FIRST_PAD) / ROW_STRIDE) as usize;
    if column < GRID_SIZE && row < GRID_SIZE {
        Some((column, row))
    } else {
        None
    }
}

pub fn pad_light(column: usize, row: usize, light: Light) -> RawMessage {
    RawMessage::from([NOTE_ON, pad_note(column, row), light.value()])
}

pub fn aux_light(button: AuxButton, light: Light) -> RawMessage {
    RawMessage::from([CONTROL_CHANGE, button.cc(), light.value()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_mapping_round_trips_over_the_grid() {
        for column in 0..GRID_SIZE {
            for row in 0..GRID_SIZE {
                assert_eq!(pad_position(pad_note(column, row)), Some((column, row)));
            }
        }
    }

    #[test]
    fn side_buttons_are_not_pads() {
        assert_eq!(pad_position(10), None);
        assert_eq!(pad_position(19), None);
        assert_eq!(pad_position(89), None);
        assert_eq!(pad_position(91), None);
        assert_eq!(pad_position(88), Some((7, 7)));
    }

    #[test]
    fn aux_buttons_by_cc() {
        assert_eq!(AuxButton::from_cc(0x5E), Some(AuxButton::PageRight));
        assert_eq!(AuxButton::from_cc(0x5D), Some(AuxButton::PageLeft));
        assert_eq!(AuxButton::from_cc(95), None);
    }
}
