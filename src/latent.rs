use crate::error::{CppnError, CppnResult};

/// Scale applied when a speed control sits at its slowest setting.
pub const SPEED_SCALE_CEILING: f32 = 103.0;

/// Converts a speed control value into a counter scale. Larger scales drift slower.
pub fn scale_from_speed(speed: f32) -> f32 {
    SPEED_SCALE_CEILING - speed
}

/// Two monotonically advancing phase counters driving the latent inputs.
///
/// The counters are never reset, so a scale change alters only the rate of
/// drift and the animation does not jump.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentClock {
    z1_counter: f64,
    z2_counter: f64,
    z1_scale: f64,
    z2_scale: f64,
}

impl LatentClock {
    pub fn new(z1_scale: f32, z2_scale: f32) -> CppnResult<Self> {
        let mut clock = Self {
            z1_counter: 0.0,
            z2_counter: 0.0,
            z1_scale: 1.0,
            z2_scale: 1.0,
        };
        clock.set_scales(z1_scale, z2_scale)?;
        Ok(clock)
    }

    pub fn set_scales(&mut self, z1_scale: f32, z2_scale: f32) -> CppnResult<()> {
        let z1_scale = checked_scale("z1_scale", z1_scale)?;
        let z2_scale = checked_scale("z2_scale", z2_scale)?;
        self.z1_scale = z1_scale;
        self.z2_scale = z2_scale;
        Ok(())
    }

    pub fn set_z1_scale(&mut self, scale: f32) -> CppnResult<()> {
        self.z1_scale = checked_scale("z1_scale", scale)?;
        Ok(())
    }

    pub fn set_z2_scale(&mut self, scale: f32) -> CppnResult<()> {
        self.z2_scale = checked_scale("z2_scale", scale)?;
        Ok(())
    }

    /// Advances both counters by `1 / scale` and returns `(sin(z1), cos(z2))`.
    pub fn tick(&mut self) -> (f32, f32) {
        self.z1_counter += 1.0 / self.z1_scale;
        self.z2_counter += 1.0 / self.z2_scale;
        self.latents()
    }

    /// Latent values for the current counters without advancing them.
    pub fn latents(&self) -> (f32, f32) {
        (self.z1_counter.sin() as f32, self.z2_counter.cos() as f32)
    }

    pub fn counters(&self) -> (f64, f64) {
        (self.z1_counter, self.z2_counter)
    }

    pub fn scales(&self) -> (f32, f32) {
        (self.z1_scale as f32, self.z2_scale as f32)
    }
}

fn checked_scale(field: &'static str, scale: f32) -> CppnResult<f64> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(CppnError::invalid(
            field,
            format!("must be a positive finite number, got {scale}"),
        ));
    }
    Ok(f64::from(scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_by_inverse_scale() {
        let mut clock = LatentClock::new(102.0, 4.0).expect("clock");
        let mut previous = clock.counters();
        for _ in 0..50 {
            clock.tick();
            let current = clock.counters();
            assert!((current.0 - previous.0 - 1.0 / 102.0).abs() < 1e-12);
            assert!((current.1 - previous.1 - 0.25).abs() < 1e-12);
            previous = current;
        }
    }

    #[test]
    fn tick_returns_sin_and_cos_of_counters() {
        let mut clock = LatentClock::new(2.0, 5.0).expect("clock");
        let (z1, z2) = clock.tick();
        assert!((z1 - 0.5_f32.sin()).abs() < 1e-6);
        assert!((z2 - 0.2_f32.cos()).abs() < 1e-6);
    }

    #[test]
    fn scale_change_keeps_counters() {
        let mut clock = LatentClock::new(10.0, 10.0).expect("clock");
        clock.tick();
        clock.tick();
        let before = clock.counters();
        clock.set_scales(1.0, 100.0).expect("new scales");
        assert_eq!(clock.counters(), before);

        clock.tick();
        let after = clock.counters();
        assert!((after.0 - before.0 - 1.0).abs() < 1e-12);
        assert!((after.1 - before.1 - 0.01).abs() < 1e-12);
    }

    #[test]
    fn non_positive_scales_are_rejected() {
        assert!(LatentClock::new(0.0, 1.0).is_err());
        let mut clock = LatentClock::new(1.0, 1.0).expect("clock");
        assert!(clock.set_z2_scale(-3.0).is_err());
        assert!(clock.set_scales(1.0, f32::INFINITY).is_err());
        assert_eq!(clock.scales(), (1.0, 1.0));
    }

    #[test]
    fn speed_control_maps_to_scale() {
        assert_eq!(scale_from_speed(1.0), 102.0);
        assert_eq!(scale_from_speed(100.0), 3.0);
    }
}
