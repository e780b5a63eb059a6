//! Closed-form response of a damped spring.

use crate::animation::SpringSpec;

/// Displacement and velocity of a unit-mass spring released at `initial_displacement`
/// with `initial_velocity`, measured relative to its rest position.
///
/// Springs built with [`SpringResponse::new`] start one unit short of rest, which
/// maps directly onto a 0 to 1 animation fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringResponse {
    natural_frequency: f64,
    damping_ratio: f64,
    initial_displacement: f64,
    initial_velocity: f64,
}

impl SpringResponse {
    pub fn new(spec: &SpringSpec) -> Self {
        Self::with_initial(spec, -1.0, 0.0)
    }

    pub fn with_initial(spec: &SpringSpec, displacement: f64, velocity: f64) -> Self {
        Self {
            natural_frequency: (spec.stiffness.max(f32::EPSILON) as f64).sqrt(),
            damping_ratio: spec.damping_ratio.max(0.0) as f64,
            initial_displacement: displacement,
            initial_velocity: velocity,
        }
    }

    /// `(displacement, velocity)` after `seconds`.
    pub fn at(&self, seconds: f64) -> (f64, f64) {
        let t = seconds.max(0.0);
        let omega = self.natural_frequency;
        let zeta = self.damping_ratio;
        let x0 = self.initial_displacement;
        let v0 = self.initial_velocity;

        if (zeta - 1.0).abs() < 1e-6 {
            let a = x0;
            let b = v0 + omega * x0;
            let decay = (-omega * t).exp();
            let x = (a + b * t) * decay;
            let v = (b - omega * a - omega * b * t) * decay;
            (x, v)
        } else if zeta < 1.0 {
            let damped = omega * (1.0 - zeta * zeta).sqrt();
            let a = x0;
            let b = (v0 + zeta * omega * x0) / damped;
            let decay = (-zeta * omega * t).exp();
            let (sin, cos) = (damped * t).sin_cos();
            let x = decay * (a * cos + b * sin);
            let v = decay
                * ((damped * b - zeta * omega * a) * cos - (zeta * omega * b + damped * a) * sin);
            (x, v)
        } else {
            let spread = omega * (zeta * zeta - 1.0).sqrt();
            let r1 = -zeta * omega + spread;
            let r2 = -zeta * omega - spread;
            let c1 = (v0 - r2 * x0) / (r1 - r2);
            let c2 = x0 - c1;
            let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
            (c1 * e1 + c2 * e2, r1 * c1 * e1 + r2 * c2 * e2)
        }
    }
}
