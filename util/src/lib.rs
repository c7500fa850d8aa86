pub mod constants;
pub mod logging;
pub mod messages;
pub mod midi_message_type;
pub mod midi_message_with_delta;
pub mod parameter_value_conversion;
pub mod parameters;
pub mod raw_message;
