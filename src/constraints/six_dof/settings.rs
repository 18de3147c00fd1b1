use std::f32::consts::PI;
use std::io::{Read, Write};

use approx::relative_eq;
use log::warn;

use crate::bodies::RigidBody;
use crate::constraints::six_dof::{SixDofAxis, SixDofConstraint};
use crate::constraints::MotorSettings;
use crate::core::BodyHandle;
use crate::error::PhysicsError;
use crate::io::{StreamIn, StreamOut};
use crate::math::Vector3;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Tolerance used when checking that the constraint frames are orthonormal
const AXIS_TOLERANCE: f32 = 1.0e-3;

/// Space in which the constraint frames of [`SixDofConstraintSettings`] are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ConstraintSpace {
    /// Frames are in world space and converted to body space on creation
    #[default]
    WorldSpace,

    /// Frames are relative to each body's center of mass, in body space
    LocalToBodyCom,
}

impl ConstraintSpace {
    /// Tag used in binary streams
    pub fn to_u32(self) -> u32 {
        match self {
            ConstraintSpace::WorldSpace => 0,
            ConstraintSpace::LocalToBodyCom => 1,
        }
    }

    /// Parses a binary stream tag
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(ConstraintSpace::WorldSpace),
            1 => Ok(ConstraintSpace::LocalToBodyCom),
            _ => Err(PhysicsError::UnknownVariant { kind: "ConstraintSpace", value }),
        }
    }
}

/// Configuration from which a [`SixDofConstraint`] is created.
///
/// Each body gets a frame: an attachment point and two perpendicular axes (X and Y, Z follows).
/// Per axis the limit range decides the behavior:
/// `[-MAX, MAX]` is free, `min >= max` is fixed, anything else is limited.
/// Translation limits are distances along the body 1 frame axes, rotation limits are the twist
/// range around X and the half cone angles around Y and Z.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SixDofConstraintSettings {
    /// Space in which the frames below are expressed
    pub space: ConstraintSpace,

    /// Body 1 frame
    pub position1: Vector3,
    /// First constraint axis of body 1
    pub axis_x1: Vector3,
    /// Second constraint axis of body 1, perpendicular to `axis_x1`
    pub axis_y1: Vector3,

    /// Body 2 frame
    pub position2: Vector3,
    /// First constraint axis of body 2
    pub axis_x2: Vector3,
    /// Second constraint axis of body 2, perpendicular to `axis_x2`
    pub axis_y2: Vector3,

    /// Friction force (translation, N) or torque (rotation, Nm) per axis, 0 disables friction
    pub max_friction: [f32; 6],

    /// Lower limit per axis (m or rad)
    pub limit_min: [f32; 6],
    /// Upper limit per axis (m or rad)
    pub limit_max: [f32; 6],

    /// Motor configuration per axis
    pub motor_settings: [MotorSettings; 6],
}

impl Default for SixDofConstraintSettings {
    fn default() -> Self {
        Self {
            space: ConstraintSpace::WorldSpace,
            position1: Vector3::zeros(),
            axis_x1: Vector3::x(),
            axis_y1: Vector3::y(),
            position2: Vector3::zeros(),
            axis_x2: Vector3::x(),
            axis_y2: Vector3::y(),
            max_friction: [0.0; 6],
            limit_min: [-f32::MAX; 6],
            limit_max: [f32::MAX; 6],
            motor_settings: [MotorSettings::default(); 6],
        }
    }
}

impl SixDofConstraintSettings {
    /// World space settings with both frames at `position` and aligned with the world axes
    pub fn at_world_position(position: Vector3) -> Self {
        Self {
            position1: position,
            position2: position,
            ..Self::default()
        }
    }

    /// Removes all limits from an axis
    pub fn make_free_axis(&mut self, axis: SixDofAxis) {
        self.limit_min[axis.index()] = -f32::MAX;
        self.limit_max[axis.index()] = f32::MAX;
    }

    /// True when the axis has no limits
    pub fn is_free_axis(&self, axis: SixDofAxis) -> bool {
        self.limit_min[axis.index()] == -f32::MAX && self.limit_max[axis.index()] == f32::MAX
    }

    /// Locks an axis
    pub fn make_fixed_axis(&mut self, axis: SixDofAxis) {
        self.limit_min[axis.index()] = f32::MAX;
        self.limit_max[axis.index()] = -f32::MAX;
    }

    /// True when the axis is locked
    pub fn is_fixed_axis(&self, axis: SixDofAxis) -> bool {
        self.limit_min[axis.index()] >= self.limit_max[axis.index()]
    }

    /// Limits `axis` to `[min, max]`; requires `min < max` and `min <= 0 <= max`
    pub fn set_limited_axis(&mut self, axis: SixDofAxis, min: f32, max: f32) {
        debug_assert!(min < max, "limited axis needs min < max, got [{min}, {max}]");
        debug_assert!(min <= 0.0 && max >= 0.0, "limited axis must contain 0, got [{min}, {max}]");
        self.limit_min[axis.index()] = min;
        self.limit_max[axis.index()] = max;
    }

    /// Checks the frames, limits, friction and motor settings.
    ///
    /// Every defect is logged; the first one is returned as [`PhysicsError::InvalidSettings`].
    pub fn validate(&self) -> Result<()> {
        let mut defects = Vec::new();

        for (name, x, y) in [("1", &self.axis_x1, &self.axis_y1), ("2", &self.axis_x2, &self.axis_y2)] {
            if !relative_eq!(x.norm(), 1.0, epsilon = AXIS_TOLERANCE)
                || !relative_eq!(y.norm(), 1.0, epsilon = AXIS_TOLERANCE)
            {
                defects.push(format!("axes of body {name} must be normalized"));
            }
            if !relative_eq!(x.dot(y), 0.0, epsilon = AXIS_TOLERANCE) {
                defects.push(format!("axes of body {name} must be perpendicular"));
            }
        }

        for axis in SixDofAxis::ALL {
            let i = axis.index();
            let (min, max) = (self.limit_min[i], self.limit_max[i]);

            if self.max_friction[i] < 0.0 {
                defects.push(format!("{axis:?}: negative friction {}", self.max_friction[i]));
            }
            if !self.motor_settings[i].is_valid() {
                defects.push(format!("{axis:?}: invalid motor settings"));
            }

            if self.is_free_axis(axis) || self.is_fixed_axis(axis) {
                continue;
            }

            match axis {
                SixDofAxis::RotationY | SixDofAxis::RotationZ => {
                    if min != -max || !(0.0..=PI).contains(&max) {
                        defects.push(format!("{axis:?}: swing limit must be [-a, a] with a in [0, pi], got [{min}, {max}]"));
                    }
                }
                _ => {
                    if min > 0.0 || max < 0.0 {
                        defects.push(format!("{axis:?}: limit must contain 0, got [{min}, {max}]"));
                    }
                }
            }
        }

        for defect in &defects {
            warn!("Invalid six DOF constraint settings: {}", defect);
        }

        match defects.into_iter().next() {
            Some(defect) => Err(PhysicsError::InvalidSettings(defect)),
            None => Ok(()),
        }
    }

    /// Creates the live constraint between two bodies
    pub fn create(
        &self,
        body1: &RigidBody,
        body2: &RigidBody,
        body1_handle: BodyHandle,
        body2_handle: BodyHandle,
    ) -> SixDofConstraint {
        SixDofConstraint::new(body1_handle, body2_handle, body1, body2, self)
    }

    /// Writes the settings in their binary layout
    pub fn save_binary_state<W: Write>(&self, stream: &mut StreamOut<W>) -> Result<()> {
        stream.write_u32(self.space.to_u32())?;
        stream.write_vec3(&self.position1)?;
        stream.write_vec3(&self.axis_x1)?;
        stream.write_vec3(&self.axis_y1)?;
        stream.write_vec3(&self.position2)?;
        stream.write_vec3(&self.axis_x2)?;
        stream.write_vec3(&self.axis_y2)?;
        stream.write_f32_slice(&self.max_friction)?;
        stream.write_f32_slice(&self.limit_min)?;
        stream.write_f32_slice(&self.limit_max)?;
        for motor in &self.motor_settings {
            motor.save_binary_state(stream)?;
        }
        Ok(())
    }

    /// Reads settings written by [`save_binary_state`](Self::save_binary_state)
    pub fn restore_binary_state<R: Read>(stream: &mut StreamIn<R>) -> Result<Self> {
        let space = ConstraintSpace::from_u32(stream.read_u32()?)?;
        let position1 = stream.read_vec3()?;
        let axis_x1 = stream.read_vec3()?;
        let axis_y1 = stream.read_vec3()?;
        let position2 = stream.read_vec3()?;
        let axis_x2 = stream.read_vec3()?;
        let axis_y2 = stream.read_vec3()?;
        let max_friction = stream.read_f32_array::<6>()?;
        let limit_min = stream.read_f32_array::<6>()?;
        let limit_max = stream.read_f32_array::<6>()?;

        let mut motor_settings = [MotorSettings::default(); 6];
        for motor in &mut motor_settings {
            *motor = MotorSettings::restore_binary_state(stream)?;
        }

        Ok(Self {
            space,
            position1,
            axis_x1,
            axis_y1,
            position2,
            axis_x2,
            axis_y2,
            max_friction,
            limit_min,
            limit_max,
            motor_settings,
        })
    }
}
