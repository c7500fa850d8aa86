pub const MAX_STEPS: usize = 16;
pub const MIN_STEPS: usize = 2;
pub const PITCH_COUNT: usize = 128;
pub const VISIBLE_ROWS: usize = 8;
pub const VISIBLE_COLUMNS: usize = 8;
pub const DEFAULT_PITCH_OFFSET: u8 = 36;
pub const DEFAULT_LENGTH: u8 = 8;
pub const MAX_PITCH_OFFSET: u8 = (PITCH_COUNT - VISIBLE_ROWS) as u8;
const LAST_PAGE: u8 = (MAX_STEPS / VISIBLE_COLUMNS - 1) as u8;

/// The 16 x 128 note grid, plus the window (pitch offset and hardware page) through which it is
/// looked at. One `u128` per step, bit `p` set when pitch `p` is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pattern {
    cells: [u128; MAX_STEPS],
    sequence_length: u8,
    pitch_offset: u8,
    hardware_page: u8,
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern {
            cells: [0; MAX_STEPS],
            sequence_length: DEFAULT_LENGTH,
            pitch_offset: DEFAULT_PITCH_OFFSET,
            hardware_page: 0,
        }
    }
}

pub struct ActivePitches(u128);

impl Iterator for ActivePitches {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let pitch = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(pitch)
    }
}

impl Pattern {
    /// returns false if the cell is outside of the grid
    pub fn toggle(&mut self, step: usize, pitch: usize) -> bool {
        if step >= MAX_STEPS || pitch >= PITCH_COUNT {
            return false;
        }
        self.cells[step] ^= 1u128 << pitch;
        true
    }

    pub fn is_active(&self, step: usize, pitch: usize) -> bool {
        step < MAX_STEPS && pitch < PITCH_COUNT && self.cells[step] & (1u128 << pitch) != 0
    }

    /// pitches of a step in ascending order
    pub fn active_pitches(&self, step: usize) -> ActivePitches {
        ActivePitches(self.cells.get(step).copied().unwrap_or(0))
    }

    pub fn clear_all(&mut self) {
        self.cells = [0; MAX_STEPS];
    }

    /// cells beyond the new length are kept and come back when the length grows again
    pub fn set_length(&mut self, length: usize) -> bool {
        if !(MIN_STEPS..=MAX_STEPS).contains(&length) {
            return false;
        }
        self.sequence_length = length as u8;
        true
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length as usize
    }

    pub fn pitch_offset(&self) -> u8 {
        self.pitch_offset
    }

    pub fn set_pitch_offset(&mut self, pitch_offset: u8) -> bool {
        if pitch_offset > MAX_PITCH_OFFSET {
            return false;
        }
        self.pitch_offset = pitch_offset;
        true
    }

    pub fn recenter_pitch(&mut self) {
        self.pitch_offset = DEFAULT_PITCH_OFFSET;
    }

    pub fn can_pitch_up(&self) -> bool {
        self.pitch_offset < MAX_PITCH_OFFSET
    }

    pub fn can_pitch_down(&self) -> bool {
        self.pitch_offset > 0
    }

    pub fn pitch_up(&mut self) -> bool {
        if !self.can_pitch_up() {
            return false;
        }
        self.pitch_offset += 1;
        true
    }

    pub fn pitch_down(&mut self) -> bool {
        if !self.can_pitch_down() {
            return false;
        }
        self.pitch_offset -= 1;
        true
    }

    pub fn hardware_page(&self) -> u8 {
        self.hardware_page
    }

    pub fn can_page_left(&self) -> bool {
        self.hardware_page > 0
    }

    pub fn can_page_right(&self) -> bool {
        self.sequence_length() > VISIBLE_COLUMNS && self.hardware_page < LAST_PAGE
    }

    pub fn page_left(&mut self) -> bool {
        if !self.can_page_left() {
            return false;
        }
        self.hardware_page -= 1;
        true
    }

    pub fn page_right(&mut self) -> bool {
        if !self.can_page_right() {
            return false;
        }
        self.hardware_page += 1;
        true
    }

    /// first step shown on the hardware
    pub fn page_start(&self) -> usize {
        self.hardware_page as usize * VISIBLE_COLUMNS
    }

    pub fn column(&self, step: usize) -> u128 {
        self.cells.get(step).copied().unwrap_or(0)
    }

    pub fn columns(&self) -> [u128; MAX_STEPS] {
        self.cells
    }

    /// replaces the grid content, the window and the length are left to the caller
    pub fn set_columns(&mut self, columns: [u128; MAX_STEPS]) {
        self.cells = columns;
    }

    /// rows under the pitch window for one step, bit y = visible row y
    pub fn visible_column(&self, step: usize) -> u8 {
        (self.column(step) >> self.pitch_offset) as u8
    }

    pub fn visible_columns(&self) -> [u8; MAX_STEPS] {
        let mut columns = [0; MAX_STEPS];
        for (step, column) in columns.iter_mut().enumerate() {
            *column = self.visible_column(step);
        }
        columns
    }

    /// the 8 x 8 window currently presented on the hardware, one byte per column
    pub fn snapshot(&self) -> [u8; VISIBLE_COLUMNS] {
        let mut window = [0; VISIBLE_COLUMNS];
        let start = self.page_start();
        for (column, bitmap) in window.iter_mut().enumerate() {
            *bitmap = self.visible_column(start + column);
        }
        window
    }
}
