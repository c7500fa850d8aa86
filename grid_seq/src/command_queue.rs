use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::control::Command;
use crate::error::GridSeqError;

pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Editor side of the single producer / single consumer command queue
pub struct CommandSender {
    producer: HeapProd<Command>,
}

impl CommandSender {
    pub fn send(&mut self, command: Command) -> Result<(), GridSeqError> {
        self.producer
            .try_push(command)
            .map_err(|_| GridSeqError::CommandQueueFull)
    }
}

/// Audio thread side, never blocks
pub struct CommandReceiver {
    consumer: HeapCons<Command>,
}

impl CommandReceiver {
    pub fn try_recv(&mut self) -> Option<Command> {
        self.consumer.try_pop()
    }
}

pub fn command_queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (producer, consumer) = HeapRb::<Command>::new(capacity).split();
    (CommandSender { producer }, CommandReceiver { consumer })
}
