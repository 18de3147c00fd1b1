use std::f32::consts::PI;

use crate::constraints::SpringSettings;

/// Converts a spring (frequency, damping) into the softness and bias of a soft constraint.
///
/// Derived from an implicit Euler integration of a damped oscillator, which is
/// unconditionally stable but adds a little damping of its own even when `damping` is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpringPart {
    bias: f32,
    softness: f32,
}

impl SpringPart {
    /// Rigid constraint with an optional velocity bias. Returns the effective mass.
    pub fn calculate_rigid(&mut self, inv_effective_mass: f32, bias: f32) -> f32 {
        self.softness = 0.0;
        self.bias = bias;

        if inv_effective_mass > 0.0 {
            1.0 / inv_effective_mass
        } else {
            0.0
        }
    }

    /// Soft constraint pulling the error `c` to zero. Returns the softened effective mass.
    ///
    /// A zero frequency falls back to a rigid constraint without position feedback.
    pub fn calculate_spring(
        &mut self,
        dt: f32,
        inv_effective_mass: f32,
        c: f32,
        spring: &SpringSettings,
    ) -> f32 {
        if spring.frequency <= 0.0 || inv_effective_mass <= 0.0 || dt <= 0.0 {
            return self.calculate_rigid(inv_effective_mass, 0.0);
        }

        let effective_mass = 1.0 / inv_effective_mass;
        let omega = 2.0 * PI * spring.frequency;

        // Spring constant k and damping constant c
        let k = effective_mass * omega * omega;
        let damping = 2.0 * effective_mass * spring.damping * omega;

        // Softness is divided by dt since the solver works with impulses
        self.softness = 1.0 / (dt * (damping + dt * k));
        self.bias = dt * k * self.softness * c;

        1.0 / (inv_effective_mass + self.softness)
    }

    /// Velocity bias for the current accumulated impulse
    #[inline]
    pub fn get_bias(&self, total_lambda: f32) -> f32 {
        self.bias + self.softness * total_lambda
    }

    /// Returns true if the constraint is soft
    #[inline]
    pub fn is_active(&self) -> bool {
        self.softness != 0.0
    }
}
