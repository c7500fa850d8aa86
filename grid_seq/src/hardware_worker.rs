#[allow(unused_imports)]
use log::{error, info};

use std::error;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_channel::{unbounded, Sender, TryRecvError};
use midir::os::unix::{VirtualInput, VirtualOutput};
use midir::{MidiInput, MidiOutput};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use util::raw_message::RawMessage;

use crate::output::{OutboundEvent, OutboundMessage};
use crate::processor::InboundMessage;

pub const HARDWARE_PORT_NAME: &str = "Grid Seq Launchpad";
const QUEUE_CAPACITY: usize = 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub(crate) enum HardwareWorkerCommand {
    Stop,
}

/// Audio thread end of the virtual device pair owned by the worker thread
pub(crate) struct HardwarePort {
    outbound: HeapProd<OutboundMessage>,
    inbound: HeapCons<RawMessage>,
    commands: Sender<HardwareWorkerCommand>,
    thread_handle: Option<JoinHandle<()>>,
}

impl HardwarePort {
    /// messages that do not fit in the queue are dropped
    pub fn send(&mut self, events: &[OutboundEvent]) {
        for event in events {
            if self.outbound.try_push(event.message).is_err() {
                break;
            }
        }
    }

    /// pad presses received since the last call, placed at the start of the block
    pub fn receive(&mut self, inbound: &mut Vec<InboundMessage>) {
        while inbound.len() < inbound.capacity() {
            match self.inbound.try_pop() {
                Some(message) => inbound.push(InboundMessage { frame: 0, message }),
                None => break,
            }
        }
    }

    pub fn stop(&mut self) {
        if let Err(err) = self.commands.try_send(HardwareWorkerCommand::Stop) {
            info!("hardware worker already stopped ({})", err);
        }
        if let Some(thread_handle) = self.thread_handle.take() {
            if thread_handle.join().is_err() {
                error!("hardware worker panicked");
            }
        }
    }
}

impl Drop for HardwarePort {
    fn drop(&mut self) {
        self.stop()
    }
}

pub(crate) fn spawn_hardware_worker(name: &str) -> Result<HardwarePort, Box<dyn error::Error + Send + Sync>> {
    let (outbound_producer, mut outbound_consumer) = HeapRb::<OutboundMessage>::new(QUEUE_CAPACITY).split();
    let (inbound_producer, inbound_consumer) = HeapRb::<RawMessage>::new(QUEUE_CAPACITY).split();

    info!("Creating midi device {}", name);
    let midi_out = MidiOutput::new(name)?;
    let mut midi_out_connection = midi_out
        .create_virtual(name)
        .map_err(|e| format!("Cannot create midi out: {}", e))?;

    let midi_in = MidiInput::new(name)?;
    // the connection must stay alive for the device to exist, the worker keeps it
    let midi_in_connection = midi_in
        .create_virtual(
            name,
            |_time, data, producer: &mut HeapProd<RawMessage>| {
                if data.len() == 3 {
                    // the audio thread is late, drop the press
                    let _ = producer.try_push(RawMessage::from([data[0], data[1], data[2]]));
                }
            },
            inbound_producer,
        )
        .map_err(|e| format!("Cannot create midi in: {}", e))?;

    let (sender, receiver) = unbounded::<HardwareWorkerCommand>();
    let name = name.to_string();

    let thread_handle = thread::Builder::new()
        .name("grid_seq hardware".to_string())
        .spawn(move || {
            let _midi_in_connection = midi_in_connection;

            loop {
                while let Some(message) = outbound_consumer.try_pop() {
                    if let Err(err) = midi_out_connection.send(message.bytes()) {
                        error!("Error while sending midi message to {}: {}", name, err);
                    }
                }

                match receiver.try_recv() {
                    Ok(HardwareWorkerCommand::Stop) | Err(TryRecvError::Closed) => {
                        info!("Stopping controller {}", name);
                        return;
                    }
                    Err(TryRecvError::Empty) => thread::sleep(POLL_INTERVAL),
                }
            }
        })?;

    Ok(HardwarePort {
        outbound: outbound_producer,
        inbound: inbound_consumer,
        commands: sender,
        thread_handle: Some(thread_handle),
    })
}
