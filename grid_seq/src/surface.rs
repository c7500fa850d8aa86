#[cfg(feature = "trace_events")]
use log::debug;

use util::midi_message_type::MidiMessageType;
use util::raw_message::RawMessage;

use crate::launchpad::{
    aux_light, pad_light, pad_position, AuxButton, Light, AUX_BUTTONS, DEVICE_INQUIRY, GRID_SIZE, PROGRAMMER_MODE_ENTER,
    PROGRAMMER_MODE_EXIT,
};
use crate::output::EventBuffer;
use crate::pattern::{Pattern, PITCH_COUNT};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedImage {
    /// indexed [column][row]
    pub pads: [[Light; GRID_SIZE]; GRID_SIZE],
    pub aux: [Light; 4],
}

impl LedImage {
    pub fn render(pattern: &Pattern, current_step: usize) -> Self {
        let mut image = LedImage::default();
        let length = pattern.sequence_length();
        let page_start = pattern.page_start();
        let pitch_offset = pattern.pitch_offset() as usize;

        for (column, lights) in image.pads.iter_mut().enumerate() {
            let step = page_start + column;
            for (row, light) in lights.iter_mut().enumerate() {
                let active = pattern.is_active(step, pitch_offset + row);
                *light = match (step < length, step == current_step, active) {
                    (false, _, _) => Light::Off,
                    (true, true, true) => Light::Yellow,
                    (true, true, false) => Light::GreenDim,
                    (true, false, true) => Light::Green,
                    (true, false, false) => Light::Off,
                };
            }
        }

        for button in AUX_BUTTONS.iter() {
            let enabled = match button {
                AuxButton::PitchDown => pattern.can_pitch_down(),
                AuxButton::PitchUp => pattern.can_pitch_up(),
                AuxButton::PageLeft => pattern.can_page_left(),
                AuxButton::PageRight => pattern.can_page_right(),
            };
            image.aux[button.index()] = if enabled { Light::White } else { Light::Off };
        }

        image
    }
}

/// What an inbound message did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAction {
    Ignored,
    CellToggled { step: usize, pitch: usize },
    WindowMoved,
}

/// Drives the pad controller: programmer mode handshake, pad presses, LED refresh.
pub struct SurfaceAdapter {
    programmer_mode_entered: bool,
    exit_pending: bool,
    query_pending: bool,
    led_image: LedImage,
    dirty: bool,
    previous_led_step: Option<usize>,
}

impl Default for SurfaceAdapter {
    fn default() -> Self {
        SurfaceAdapter {
            programmer_mode_entered: false,
            exit_pending: false,
            query_pending: false,
            led_image: LedImage::default(),
            dirty: true,
            previous_led_step: None,
        }
    }
}

impl SurfaceAdapter {
    pub fn activate(&mut self) {
        self.programmer_mode_entered = false;
        self.exit_pending = false;
        self.dirty = true;
    }

    pub fn programmer_mode_entered(&self) -> bool {
        self.programmer_mode_entered
    }

    pub fn led_image(&self) -> &LedImage {
        &self.led_image
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// leaves programmer mode during the next cycle, the cycle after enters it again
    pub fn request_reset(&mut self) {
        self.exit_pending = true;
        self.programmer_mode_entered = false;
    }

    pub fn request_query(&mut self) {
        self.query_pending = true;
    }

    /// mode switching sysex, always at the head of both streams
    pub fn handshake(&mut self, midi_out: &mut EventBuffer, hardware_out: &mut EventBuffer) {
        if self.exit_pending {
            self.exit_pending = false;
            midi_out.push_sysex(0, PROGRAMMER_MODE_EXIT);
            hardware_out.push_sysex(0, PROGRAMMER_MODE_EXIT);
        } else if !self.programmer_mode_entered {
            self.programmer_mode_entered = true;
            self.dirty = true;
            midi_out.push_sysex(0, PROGRAMMER_MODE_ENTER);
            hardware_out.push_sysex(0, PROGRAMMER_MODE_ENTER);
        }

        if self.query_pending {
            self.query_pending = false;
            hardware_out.push_sysex(0, DEVICE_INQUIRY);
        }
    }

    pub fn decode(&mut self, message: RawMessage, pattern: &mut Pattern) -> SurfaceAction {
        let action = match MidiMessageType::from(message) {
            MidiMessageType::NoteOnMessage(note_on) => match pad_position(note_on.pitch) {
                Some((column, row)) => {
                    let step = column + pattern.page_start();
                    let pitch = pattern.pitch_offset() as usize + row;
                    if step < pattern.sequence_length() && pitch < PITCH_COUNT && pattern.toggle(step, pitch) {
                        self.dirty = true;
                        SurfaceAction::CellToggled { step, pitch }
                    } else {
                        SurfaceAction::Ignored
                    }
                }
                None => SurfaceAction::Ignored,
            },
            MidiMessageType::CCMessage(cc) if cc.value > 0 => match AuxButton::from_cc(cc.cc) {
                Some(button) => {
                    match button {
                        AuxButton::PageLeft => pattern.page_left(),
                        AuxButton::PageRight => pattern.page_right(),
                        AuxButton::PitchUp => pattern.pitch_up(),
                        AuxButton::PitchDown => pattern.pitch_down(),
                    };
                    self.dirty = true;
                    SurfaceAction::WindowMoved
                }
                None => SurfaceAction::Ignored,
            },
            _ => SurfaceAction::Ignored,
        };

        #[cfg(feature = "trace_events")]
        debug!("surface input {:02X?} -> {:?}", message.get_bytes(), action);

        action
    }

    /// Sends the full LED image when something it shows has changed. Returns true if it was sent.
    pub fn refresh_leds(&mut self, pattern: &Pattern, current_step: usize, hardware_out: &mut EventBuffer) -> bool {
        if !self.programmer_mode_entered {
            return false;
        }
        if !self.dirty && self.previous_led_step == Some(current_step) {
            return false;
        }

        self.led_image = LedImage::render(pattern, current_step);
        self.dirty = false;
        self.previous_led_step = Some(current_step);

        for (column, lights) in self.led_image.pads.iter().enumerate() {
            for (row, light) in lights.iter().enumerate() {
                hardware_out.push_midi(0, pad_light(column, row, *light));
            }
        }
        for button in AUX_BUTTONS.iter() {
            hardware_out.push_midi(0, aux_light(*button, self.led_image.aux[button.index()]));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launchpad::pad_note;

    fn entered_surface() -> (SurfaceAdapter, EventBuffer, EventBuffer) {
        let mut surface = SurfaceAdapter::default();
        let mut midi_out = EventBuffer::with_capacity(1024);
        let mut hardware_out = EventBuffer::with_capacity(1024);
        surface.activate();
        surface.handshake(&mut midi_out, &mut hardware_out);
        (surface, midi_out, hardware_out)
    }

    #[test]
    fn handshake_is_sent_once_per_activation() {
        let (mut surface, mut midi_out, mut hardware_out) = entered_surface();
        assert_eq!(midi_out.events()[0].message.bytes(), PROGRAMMER_MODE_ENTER);
        assert_eq!(hardware_out.events()[0].message.bytes(), PROGRAMMER_MODE_ENTER);

        midi_out.clear();
        hardware_out.clear();
        surface.handshake(&mut midi_out, &mut hardware_out);
        assert!(midi_out.is_empty() && hardware_out.is_empty());

        surface.activate();
        surface.handshake(&mut midi_out, &mut hardware_out);
        assert_eq!(hardware_out.events().len(), 1);
    }

    #[test]
    fn reset_exits_then_enters_on_the_next_cycle() {
        let (mut surface, mut midi_out, mut hardware_out) = entered_surface();
        midi_out.clear();
        hardware_out.clear();

        surface.request_reset();
        surface.handshake(&mut midi_out, &mut hardware_out);
        assert_eq!(midi_out.events()[0].message.bytes(), PROGRAMMER_MODE_EXIT);
        assert_eq!(hardware_out.events()[0].message.bytes(), PROGRAMMER_MODE_EXIT);
        assert!(!surface.programmer_mode_entered());

        midi_out.clear();
        hardware_out.clear();
        surface.handshake(&mut midi_out, &mut hardware_out);
        assert_eq!(midi_out.events()[0].message.bytes(), PROGRAMMER_MODE_ENTER);
    }

    #[test]
    fn query_goes_to_hardware_only() {
        let (mut surface, mut midi_out, mut hardware_out) = entered_surface();
        midi_out.clear();
        hardware_out.clear();
        surface.request_query();
        surface.handshake(&mut midi_out, &mut hardware_out);
        assert!(midi_out.is_empty());
        assert_eq!(hardware_out.events()[0].message.bytes(), DEVICE_INQUIRY);
    }

    #[test]
    fn pad_press_toggles_under_the_window() {
        let (mut surface, _, _) = entered_surface();
        let mut pattern = Pattern::default();
        let action = surface.decode(RawMessage::from([0x90, pad_note(4, 3), 0x7F]), &mut pattern);
        assert_eq!(action, SurfaceAction::CellToggled { step: 4, pitch: 39 });
        assert!(pattern.is_active(4, 39));
    }

    #[test]
    fn pad_release_and_out_of_length_presses_are_ignored() {
        let (mut surface, _, _) = entered_surface();
        let mut pattern = Pattern::default();
        pattern.set_length(4);
        assert_eq!(
            surface.decode(RawMessage::from([0x90, pad_note(1, 1), 0x00]), &mut pattern),
            SurfaceAction::Ignored
        );
        assert_eq!(
            surface.decode(RawMessage::from([0x90, pad_note(5, 1), 0x7F]), &mut pattern),
            SurfaceAction::Ignored
        );
        assert_eq!(pattern, {
            let mut expected = Pattern::default();
            expected.set_length(4);
            expected
        });
    }

    #[test]
    fn arrows_move_the_window() {
        let (mut surface, _, _) = entered_surface();
        let mut pattern = Pattern::default();
        surface.decode(RawMessage::from([0xB0, 92, 0x7F]), &mut pattern);
        assert_eq!(pattern.pitch_offset(), 37);
        surface.decode(RawMessage::from([0xB0, 91, 0x7F]), &mut pattern);
        surface.decode(RawMessage::from([0xB0, 91, 0x7F]), &mut pattern);
        assert_eq!(pattern.pitch_offset(), 35);
        // button release
        assert_eq!(
            surface.decode(RawMessage::from([0xB0, 91, 0x00]), &mut pattern),
            SurfaceAction::Ignored
        );
    }

    #[test]
    fn leds_mark_playhead_and_active_cells() {
        let mut pattern = Pattern::default();
        pattern.toggle(2, 36);
        pattern.toggle(3, 37);
        let image = LedImage::render(&pattern, 2);
        assert_eq!(image.pads[2][0], Light::Yellow);
        assert_eq!(image.pads[2][1], Light::GreenDim);
        assert_eq!(image.pads[3][1], Light::Green);
        assert_eq!(image.pads[3][0], Light::Off);
        assert_eq!(image.aux[AuxButton::PageLeft.index()], Light::Off);
        assert_eq!(image.aux[AuxButton::PageRight.index()], Light::Off);
        assert_eq!(image.aux[AuxButton::PitchUp.index()], Light::White);
    }

    #[test]
    fn leds_are_only_sent_on_change() {
        let (mut surface, _, mut hardware_out) = entered_surface();
        let pattern = Pattern::default();
        hardware_out.clear();

        assert!(surface.refresh_leds(&pattern, 0, &mut hardware_out));
        assert_eq!(hardware_out.events().len(), 68);
        hardware_out.clear();
        assert!(!surface.refresh_leds(&pattern, 0, &mut hardware_out));
        assert!(surface.refresh_leds(&pattern, 1, &mut hardware_out));
    }
}
