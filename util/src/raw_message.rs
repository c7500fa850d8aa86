use core::ops::Index;
use serde::{Deserialize, Serialize};

use crate::constants::STATUS_MASK;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage([u8; 3]);

impl RawMessage {
    pub fn get_bytes(&self) -> &[u8] {
        // kept 3 bytes long to move around a known-size message, program change and channel pressure are 2
        match self.0[0] & STATUS_MASK {
            0xC0 | 0xD0 => &self.0[..2],
            _ => &self.0,
        }
    }
}

impl From<[u8; 3]> for RawMessage {
    fn from(e: [u8; 3]) -> Self {
        RawMessage(e)
    }
}

impl From<RawMessage> for [u8; 3] {
    fn from(message: RawMessage) -> Self {
        message.0
    }
}

impl Index<usize> for RawMessage {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}
