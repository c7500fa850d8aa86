use serde::{Deserialize, Serialize};

use crate::error::GridSeqError;
use crate::pattern::{Pattern, DEFAULT_PITCH_OFFSET, MAX_STEPS};

pub const STATE_VERSION: u8 = 1;

/// Layout written by earlier versions: the 16 visible column bytes under the default pitch offset,
/// then the length, then the filter flag
pub const LEGACY_STATE_SIZE: usize = MAX_STEPS + 2;

/// Plugin state saved with the host project. Every step keeps all of its 128 rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u8,
    pub columns: [[u8; 16]; MAX_STEPS],
    pub sequence_length: u8,
    pub midi_filter: bool,
    pub pitch_offset: u8,
}

impl Default for PersistedState {
    fn default() -> Self {
        PersistedState::capture(&Pattern::default(), false)
    }
}

impl PersistedState {
    pub fn capture(pattern: &Pattern, midi_filter: bool) -> Self {
        Self::from_cells(
            &pattern.columns(),
            pattern.sequence_length() as u8,
            midi_filter,
            pattern.pitch_offset(),
        )
    }

    pub fn from_cells(cells: &[u128; MAX_STEPS], sequence_length: u8, midi_filter: bool, pitch_offset: u8) -> Self {
        let mut columns = [[0; 16]; MAX_STEPS];
        for (column, cell) in columns.iter_mut().zip(cells.iter()) {
            *column = cell.to_le_bytes();
        }
        PersistedState {
            version: STATE_VERSION,
            columns,
            sequence_length,
            midi_filter,
            pitch_offset,
        }
    }

    pub fn cells(&self) -> [u128; MAX_STEPS] {
        let mut cells = [0; MAX_STEPS];
        for (cell, column) in cells.iter_mut().zip(self.columns.iter()) {
            *cell = u128::from_le_bytes(*column);
        }
        cells
    }

    /// Writes the saved grid, length and window into the pattern. Out of range values keep the
    /// pattern's current ones.
    pub fn restore(&self, pattern: &mut Pattern) {
        pattern.set_columns(self.cells());
        pattern.set_length(self.sequence_length as usize);
        pattern.set_pitch_offset(self.pitch_offset);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GridSeqError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, GridSeqError> {
        if data.len() == LEGACY_STATE_SIZE {
            return Ok(Self::from_legacy(data));
        }

        let state: PersistedState = bincode::deserialize(data)?;
        if state.version != STATE_VERSION {
            return Err(GridSeqError::UnsupportedStateVersion(state.version));
        }
        Ok(state)
    }

    fn from_legacy(data: &[u8]) -> Self {
        let mut cells = [0u128; MAX_STEPS];
        for (cell, visible) in cells.iter_mut().zip(data[..MAX_STEPS].iter()) {
            *cell = (*visible as u128) << DEFAULT_PITCH_OFFSET;
        }
        Self::from_cells(
            &cells,
            data[MAX_STEPS],
            data[MAX_STEPS + 1] != 0,
            DEFAULT_PITCH_OFFSET,
        )
    }
}
