use vst::plugin::PluginParameters;
use vst::util::ParameterTransfer;

use super::parameter_value_conversion::{bool_to_f32, f32_to_bool, f32_to_steps, steps_to_f32};

pub trait ParameterConversion<ParameterType>
    where ParameterType: Into<i32> + From<i32>,
          Self: PluginParameters
{
    #[inline]
    fn get_bool_parameter(&self, index: ParameterType) -> bool {
        f32_to_bool(self.get_parameter_transfer().get_parameter(index.into() as usize))
    }

    #[inline]
    fn set_bool_parameter(&self, index: ParameterType, value: bool) {
        self.get_parameter_transfer()
            .set_parameter(index.into() as usize, bool_to_f32(value))
    }

    /// parameter spread over `steps` evenly spaced values, 0 .. steps - 1
    #[inline]
    fn get_stepped_parameter(&self, index: ParameterType, steps: usize) -> usize {
        f32_to_steps(self.get_parameter_transfer().get_parameter(index.into() as usize), steps)
    }

    #[inline]
    fn set_stepped_parameter(&self, index: ParameterType, value: usize, steps: usize) {
        self.get_parameter_transfer()
            .set_parameter(index.into() as usize, steps_to_f32(value, steps))
    }

    #[inline]
    fn set_raw_parameter(&self, index: ParameterType, value: f32) {
        self.get_parameter_transfer().set_parameter(index.into() as usize, value)
    }

    fn get_parameter_transfer(&self) -> &ParameterTransfer;

    fn get_parameter_count() -> usize;
}
