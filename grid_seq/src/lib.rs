#[macro_use]
extern crate vst;

pub mod command_queue;
pub mod control;
pub mod error;
#[cfg(all(feature = "hardware_port", unix))]
mod hardware_worker;
pub mod launchpad;
pub mod output;
mod parameters;
pub mod pattern;
pub mod persistence;
pub mod processor;
pub mod sequencer;
pub mod snapshot;
pub mod surface;
pub mod transport;

#[allow(unused_imports)]
use log::{debug, error, info};

use std::sync::Arc;

use vst::api;
use vst::api::TimeInfoFlags;
use vst::buffer::{AudioBuffer, SendEventBuffer};
use vst::event::Event;
use vst::host::Host;
use vst::plugin::{CanDo, Category, HostCallback, Info, Plugin, PluginParameters};

use util::logging::logging_setup;
use util::raw_message::RawMessage;

#[cfg(all(feature = "hardware_port", unix))]
use hardware_worker::{spawn_hardware_worker, HardwarePort, HARDWARE_PORT_NAME};
use output::OutboundEvent;
use parameters::{GridSeqParameters, PARAMETER_COUNT};
use processor::{BlockInput, BlockOutput, GridSeqCore, HostServices, InboundMessage};

plugin_main!(GridSeqPlugin);

const INBOUND_CAPACITY: usize = 512;
const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

pub struct GridSeqPlugin {
    host: HostCallback,
    core: Option<GridSeqCore>,
    parameters: Arc<GridSeqParameters>,
    send_buffer: SendEventBuffer,
    inbound: Vec<InboundMessage>,
    output: BlockOutput,
    sample_rate: f32,
    #[cfg(all(feature = "hardware_port", unix))]
    hardware: Option<HardwarePort>,
}

impl Default for GridSeqPlugin {
    fn default() -> Self {
        GridSeqPlugin::with_host(HostCallback::default())
    }
}

impl GridSeqPlugin {
    fn with_host(host: HostCallback) -> Self {
        let parameters = GridSeqParameters::default();
        let services = HostServices {
            time_info: host.raw_callback().is_some(),
        };

        // an instance the host cannot drive stays silent
        let core = match GridSeqCore::new(DEFAULT_SAMPLE_RATE as f64, &services) {
            Ok((core, editor)) => {
                parameters.set_editor(Some(editor));
                Some(core)
            }
            Err(err) => {
                error!("Cannot start sequencer: {}", err);
                None
            }
        };

        GridSeqPlugin {
            host,
            core,
            parameters: Arc::new(parameters),
            send_buffer: Default::default(),
            inbound: Vec::with_capacity(INBOUND_CAPACITY),
            output: BlockOutput::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            #[cfg(all(feature = "hardware_port", unix))]
            hardware: None,
        }
    }

    /// tempo and transport state for this block
    fn transport(&self) -> (Option<f64>, Option<bool>) {
        let mask = (TimeInfoFlags::TEMPO_VALID | TimeInfoFlags::TRANSPORT_PLAYING).bits();
        match self.host.get_time_info(mask) {
            Some(time_info) => {
                let flags = TimeInfoFlags::from_bits_truncate(time_info.flags);
                let tempo = if flags.contains(TimeInfoFlags::TEMPO_VALID) {
                    Some(time_info.tempo)
                } else {
                    None
                };
                (tempo, Some(flags.contains(TimeInfoFlags::TRANSPORT_PLAYING)))
            }
            // without time info the sequencer free runs at the last known tempo
            None => (None, Some(true)),
        }
    }

    #[cfg(all(feature = "hardware_port", unix))]
    fn open_hardware_port(&mut self) {
        if self.hardware.is_some() {
            return;
        }
        match spawn_hardware_worker(HARDWARE_PORT_NAME) {
            Ok(hardware) => self.hardware = Some(hardware),
            Err(err) => error!("Cannot open {}: {}", HARDWARE_PORT_NAME, err),
        }
    }

    #[cfg(all(feature = "hardware_port", unix))]
    fn close_hardware_port(&mut self) {
        if let Some(mut hardware) = self.hardware.take() {
            hardware.stop();
        }
    }
}

impl Plugin for GridSeqPlugin {
    fn get_info(&self) -> Info {
        Info {
            name: "Grid Seq".to_string(),
            vendor: "DJ Crontab".to_string(),
            unique_id: 234213189,
            parameters: PARAMETER_COUNT as i32,
            category: Category::Effect,
            initial_delay: 0,
            version: 1,
            inputs: 0,
            outputs: 0,
            midi_inputs: 1,
            f64_precision: false,
            presets: 1,
            midi_outputs: 1,
            preset_chunks: true,
            silent_when_stopped: false,
        }
    }

    fn new(host: HostCallback) -> Self {
        logging_setup();
        info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        GridSeqPlugin::with_host(host)
    }

    fn set_sample_rate(&mut self, rate: f32) {
        self.sample_rate = rate;
        if let Some(core) = self.core.as_mut() {
            if let Err(err) = core.set_sample_rate(rate as f64) {
                error!("Ignoring sample rate: {}", err);
            }
        }
    }

    fn resume(&mut self) {
        info!("Activating at {} Hz", self.sample_rate);
        if let Some(core) = self.core.as_mut() {
            core.activate();
        }
        #[cfg(all(feature = "hardware_port", unix))]
        self.open_hardware_port();
    }

    fn suspend(&mut self) {
        info!("Deactivating");
        if let Some(core) = self.core.as_mut() {
            core.deactivate();
        }
        #[cfg(all(feature = "hardware_port", unix))]
        self.close_hardware_port();
    }

    fn get_parameter_object(&mut self) -> Arc<dyn PluginParameters> {
        Arc::clone(&self.parameters) as Arc<dyn PluginParameters>
    }

    fn can_do(&self, can_do: CanDo) -> vst::api::Supported {
        use vst::api::Supported::*;
        use vst::plugin::CanDo::*;

        match can_do {
            SendEvents | SendMidiEvent | ReceiveEvents | ReceiveMidiEvent | ReceiveTimeInfo => Yes,
            Other(_) => Maybe,
            _ => No,
        }
    }

    fn process(&mut self, buffer: &mut AudioBuffer<f32>) {
        if self.core.is_none() {
            self.inbound.clear();
            return;
        }

        #[cfg(all(feature = "hardware_port", unix))]
        {
            if let Some(hardware) = self.hardware.as_mut() {
                hardware.receive(&mut self.inbound);
            }
        }

        let (tempo, playing) = self.transport();
        let input = BlockInput {
            n_samples: buffer.samples(),
            inbound: &self.inbound,
            tempo,
            playing,
            ports: self.parameters.control_ports(),
        };
        if let Some(core) = self.core.as_mut() {
            core.process(&input, &mut self.output);
        }
        self.inbound.clear();

        self.parameters.publish_outputs(&self.output.ports);
        self.send_buffer.send_events(
            self.output.midi_out.events().iter().map(OutboundEvent::to_host_event),
            &mut self.host,
        );

        #[cfg(all(feature = "hardware_port", unix))]
        {
            if let Some(hardware) = self.hardware.as_mut() {
                hardware.send(self.output.hardware_out.events());
            }
        }
    }

    fn process_events(&mut self, events: &api::Events) {
        for event in events.events() {
            if let Event::Midi(midi_event) = event {
                #[cfg(feature = "trace_events")]
                debug!("in {}", util::messages::format_midi_event(&midi_event));

                // the buffer never grows on the audio thread
                if self.inbound.len() < self.inbound.capacity() {
                    self.inbound.push(InboundMessage {
                        frame: midi_event.delta_frames.max(0) as usize,
                        message: RawMessage::from(midi_event.data),
                    });
                }
            }
        }
    }
}
