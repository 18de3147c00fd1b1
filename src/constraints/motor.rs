use std::io::{Read, Write};

use crate::error::PhysicsError;
use crate::io::{StreamIn, StreamOut};
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Drive mode of a single constraint axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum MotorState {
    /// No drive; only friction (if configured) acts on the axis
    #[default]
    Off,

    /// Drives the relative velocity along the axis towards a target velocity
    Velocity,

    /// Drives the relative position along the axis towards a target position through a spring
    Position,
}

impl MotorState {
    /// Tag used in binary streams
    pub fn to_u32(self) -> u32 {
        match self {
            MotorState::Off => 0,
            MotorState::Velocity => 1,
            MotorState::Position => 2,
        }
    }

    /// Parses a binary stream tag
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(MotorState::Off),
            1 => Ok(MotorState::Velocity),
            2 => Ok(MotorState::Position),
            _ => Err(PhysicsError::UnknownVariant { kind: "MotorState", value }),
        }
    }
}

/// Stiffness of a soft constraint, expressed as an oscillator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SpringSettings {
    /// Oscillation frequency in Hz; 0 makes the constraint rigid
    pub frequency: f32,

    /// Damping ratio, 0 = no damping, 1 = critical damping
    pub damping: f32,
}

impl SpringSettings {
    /// Creates spring settings from a frequency in Hz and a damping ratio
    pub fn new(frequency: f32, damping: f32) -> Self {
        Self { frequency, damping }
    }
}

impl Default for SpringSettings {
    fn default() -> Self {
        Self::new(2.0, 1.0)
    }
}

/// Motor configuration for one axis.
///
/// Position drives use `spring`; both drive modes clamp the applied force (translation)
/// or torque (rotation) to the configured limits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct MotorSettings {
    /// Spring used when the motor is in position mode
    pub spring: SpringSettings,

    /// Force range in N for translation motors
    pub min_force_limit: f32,
    /// Upper force limit
    pub max_force_limit: f32,

    /// Torque range in Nm for rotation motors
    pub min_torque_limit: f32,
    /// Upper torque limit
    pub max_torque_limit: f32,
}

impl Default for MotorSettings {
    fn default() -> Self {
        Self {
            spring: SpringSettings::default(),
            min_force_limit: -f32::MAX,
            max_force_limit: f32::MAX,
            min_torque_limit: -f32::MAX,
            max_torque_limit: f32::MAX,
        }
    }
}

impl MotorSettings {
    /// Creates motor settings with the given spring and unlimited force/torque
    pub fn new(frequency: f32, damping: f32) -> Self {
        Self {
            spring: SpringSettings::new(frequency, damping),
            ..Self::default()
        }
    }

    /// Sets a symmetric force limit `[-limit, limit]`
    pub fn set_force_limit(&mut self, limit: f32) {
        self.set_force_limits(-limit, limit);
    }

    /// Sets the force range
    pub fn set_force_limits(&mut self, min: f32, max: f32) {
        debug_assert!(min <= max, "force limits must satisfy min <= max");
        self.min_force_limit = min;
        self.max_force_limit = max;
    }

    /// Sets a symmetric torque limit `[-limit, limit]`
    pub fn set_torque_limit(&mut self, limit: f32) {
        self.set_torque_limits(-limit, limit);
    }

    /// Sets the torque range
    pub fn set_torque_limits(&mut self, min: f32, max: f32) {
        debug_assert!(min <= max, "torque limits must satisfy min <= max");
        self.min_torque_limit = min;
        self.max_torque_limit = max;
    }

    /// Checks that the spring is non negative and that the ranges are ordered
    pub fn is_valid(&self) -> bool {
        self.spring.frequency >= 0.0
            && self.spring.damping >= 0.0
            && self.min_force_limit <= self.max_force_limit
            && self.min_torque_limit <= self.max_torque_limit
    }

    /// Writes frequency, damping, force range and torque range
    pub fn save_binary_state<W: Write>(&self, stream: &mut StreamOut<W>) -> Result<()> {
        stream.write_f32(self.spring.frequency)?;
        stream.write_f32(self.spring.damping)?;
        stream.write_f32(self.min_force_limit)?;
        stream.write_f32(self.max_force_limit)?;
        stream.write_f32(self.min_torque_limit)?;
        stream.write_f32(self.max_torque_limit)
    }

    /// Reads a record written by `save_binary_state`
    pub fn restore_binary_state<R: Read>(stream: &mut StreamIn<R>) -> Result<Self> {
        let [frequency, damping, min_force_limit, max_force_limit, min_torque_limit, max_torque_limit] =
            stream.read_f32_array::<6>()?;
        Ok(Self {
            spring: SpringSettings::new(frequency, damping),
            min_force_limit,
            max_force_limit,
            min_torque_limit,
            max_torque_limit,
        })
    }
}
