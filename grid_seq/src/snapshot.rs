//! State published by the audio thread for the editor.
//!
//! The cell is a triple buffer: the writer always owns a back slot, the reader always owns a front
//! slot and the third slot is exchanged through one atomic byte. Neither side ever waits.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::pattern::{Pattern, MAX_STEPS, VISIBLE_COLUMNS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// visible rows of every step, bit y = row y above the pitch offset
    pub columns: [u8; MAX_STEPS],
    /// the whole grid, bit p = pitch p
    pub cells: [u128; MAX_STEPS],
    pub current_step: u8,
    pub sequence_length: u8,
    pub pitch_offset: u8,
    pub hardware_page: u8,
    pub midi_filter: bool,
    pub change_counter: u32,
    pub playing: bool,
}

impl Snapshot {
    pub fn capture(pattern: &Pattern, current_step: usize, midi_filter: bool, change_counter: u32, playing: bool) -> Self {
        Snapshot {
            columns: pattern.visible_columns(),
            cells: pattern.columns(),
            current_step: current_step as u8,
            sequence_length: pattern.sequence_length() as u8,
            pitch_offset: pattern.pitch_offset(),
            hardware_page: pattern.hardware_page(),
            midi_filter,
            change_counter,
            playing,
        }
    }

    /// the 8 columns shown on the hardware page
    pub fn hardware_window(&self) -> [u8; VISIBLE_COLUMNS] {
        let mut window = [0; VISIBLE_COLUMNS];
        let start = self.hardware_page as usize * VISIBLE_COLUMNS;
        window.copy_from_slice(&self.columns[start..start + VISIBLE_COLUMNS]);
        window
    }

    pub fn is_active(&self, step: usize, pitch: usize) -> bool {
        step < MAX_STEPS && pitch < 128 && self.cells[step] & (1u128 << pitch) != 0
    }
}

// state byte layout: [fresh:1][unused:1][back:2][middle:2][front:2]
const FRONT_SHIFT: u8 = 0;
const MIDDLE_SHIFT: u8 = 2;
const BACK_SHIFT: u8 = 4;
const SLOT_MASK: u8 = 0b11;
const FRESH: u8 = 0x80;
const INITIAL_STATE: u8 = (2 << BACK_SHIFT) | (1 << MIDDLE_SHIFT) | (0 << FRONT_SHIFT);

struct Shared<T> {
    slots: [UnsafeCell<T>; 3],
    state: AtomicU8,
}

// slots are only reached through the index owned by each side
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

fn slot(state: u8, shift: u8) -> u8 {
    (state >> shift) & SLOT_MASK
}

impl<T> Shared<T> {
    /// exchanges the caller's slot with the middle one, a reader only does it when something was published
    fn swap_middle(&self, own_shift: u8, fresh: bool) -> bool {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            if !fresh && state & FRESH == 0 {
                return false;
            }
            let own = slot(state, own_shift);
            let middle = slot(state, MIDDLE_SHIFT);
            let mut new_state = (state & !FRESH) & !(SLOT_MASK << own_shift) & !(SLOT_MASK << MIDDLE_SHIFT);
            new_state |= (middle << own_shift) | (own << MIDDLE_SHIFT);
            if fresh {
                new_state |= FRESH;
            }
            match self
                .state
                .compare_exchange_weak(state, new_state, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(current) => state = current,
            }
        }
    }
}

pub struct SnapshotWriter<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Copy> SnapshotWriter<T> {
    pub fn publish(&mut self, value: T) {
        let back = slot(self.shared.state.load(Ordering::Acquire), BACK_SHIFT) as usize;
        // the back slot belongs to the single writer until the swap below
        unsafe {
            *self.shared.slots[back].get() = value;
        }
        self.shared.swap_middle(BACK_SHIFT, true);
    }
}

pub struct SnapshotReader<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Copy> SnapshotReader<T> {
    pub fn has_fresh(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) & FRESH != 0
    }

    /// the most recently published value
    pub fn read(&mut self) -> T {
        self.shared.swap_middle(FRONT_SHIFT, false);
        let front = slot(self.shared.state.load(Ordering::Acquire), FRONT_SHIFT) as usize;
        // the front slot belongs to the single reader
        unsafe { *self.shared.slots[front].get() }
    }
}

pub fn snapshot_cell<T: Copy>(initial: T) -> (SnapshotWriter<T>, SnapshotReader<T>) {
    let shared = Arc::new(Shared {
        slots: [UnsafeCell::new(initial), UnsafeCell::new(initial), UnsafeCell::new(initial)],
        state: AtomicU8::new(INITIAL_STATE),
    });
    (
        SnapshotWriter {
            shared: Arc::clone(&shared),
        },
        SnapshotReader { shared },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_gets_latest_value() {
        let (mut writer, mut reader) = snapshot_cell(0u32);
        writer.publish(1);
        writer.publish(2);
        writer.publish(3);
        assert!(reader.has_fresh());
        assert_eq!(reader.read(), 3);
        assert!(!reader.has_fresh());
        assert_eq!(reader.read(), 3);
    }

    #[test]
    fn initial_value_before_any_publish() {
        let (_writer, mut reader) = snapshot_cell(7u8);
        assert_eq!(reader.read(), 7);
    }

    #[test]
    fn values_cross_threads() {
        let (mut writer, mut reader) = snapshot_cell(0u64);
        let handle = std::thread::spawn(move || {
            for i in 1..=10_000u64 {
                writer.publish(i);
            }
        });
        let mut last = 0;
        while last < 10_000 {
            let value = reader.read();
            assert!(value >= last);
            last = value;
        }
        handle.join().unwrap();
    }

    #[test]
    fn hardware_window_follows_page() {
        let mut pattern = Pattern::default();
        pattern.set_length(16);
        pattern.toggle(10, 36);
        pattern.page_right();
        let snapshot = Snapshot::capture(&pattern, 0, false, 1, false);
        assert_eq!(snapshot.hardware_window(), [0, 0, 1, 0, 0, 0, 0, 0]);
        assert!(snapshot.is_active(10, 36));
    }
}
