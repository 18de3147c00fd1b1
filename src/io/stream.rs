use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::math::Vector3;
use crate::Result;

/// Little endian binary writer used to persist constraint configuration
pub struct StreamOut<W: Write> {
    inner: W,
}

impl<W: Write> StreamOut<W> {
    /// Wraps a writer
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns the wrapped writer
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes a little endian u32
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Writes a little endian f32
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.inner.write_f32::<LittleEndian>(value)?;
        Ok(())
    }

    /// Writes x, y, z in that order
    pub fn write_vec3(&mut self, value: &Vector3) -> Result<()> {
        for component in value.iter() {
            self.write_f32(*component)?;
        }
        Ok(())
    }

    /// Writes every value in order
    pub fn write_f32_slice(&mut self, values: &[f32]) -> Result<()> {
        for value in values {
            self.write_f32(*value)?;
        }
        Ok(())
    }
}

/// Little endian binary reader matching [`StreamOut`].
///
/// A truncated stream surfaces as [`crate::error::PhysicsError::StreamRead`].
pub struct StreamIn<R: Read> {
    inner: R,
}

impl<R: Read> StreamIn<R> {
    /// Wraps a reader
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads a little endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    /// Reads a little endian f32
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    /// Reads x, y and z
    pub fn read_vec3(&mut self) -> Result<Vector3> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vector3::new(x, y, z))
    }

    /// Reads `N` floats in order
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut values = [0.0; N];
        self.inner.read_f32_into::<LittleEndian>(&mut values)?;
        Ok(values)
    }
}
