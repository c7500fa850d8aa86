#[inline]
pub fn bool_to_f32(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[inline]
pub fn f32_to_bool(value: f32) -> bool {
    value > 0.5
}

#[inline]
pub fn f32_to_steps(value: f32, steps: usize) -> usize {
    if steps < 2 {
        return 0;
    }
    let max = (steps - 1) as f32;
    (value.max(0.).min(1.) * max).round() as usize
}

#[inline]
pub fn steps_to_f32(value: usize, steps: usize) -> f32 {
    if steps < 2 {
        return 0.;
    }
    value.min(steps - 1) as f32 / (steps - 1) as f32
}
