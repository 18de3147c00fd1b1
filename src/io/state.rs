use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::math::Vector3;
use crate::Result;

/// In-memory recorder for solver state (accumulated impulses).
///
/// Values are appended by `save_state` and read back in the same order by `restore_state`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateRecorder {
    data: Vec<u8>,
    read_pos: usize,
}

impl StateRecorder {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder positioned at the start of previously saved bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, read_pos: 0 }
    }

    /// Returns the recorded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Moves the read cursor back to the start
    pub fn rewind(&mut self) {
        self.read_pos = 0;
    }

    /// Returns true when every recorded byte has been read
    pub fn is_eof(&self) -> bool {
        self.read_pos >= self.data.len()
    }

    /// Appends a float
    pub fn write_f32(&mut self, value: f32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_f32(&mut bytes, value);
        self.data.extend_from_slice(&bytes);
    }

    /// Appends x, y and z
    pub fn write_vec3(&mut self, value: &Vector3) {
        for component in value.iter() {
            self.write_f32(*component);
        }
    }

    /// Reads the next float
    pub fn read_f32(&mut self) -> Result<f32> {
        let mut remaining = self.data.get(self.read_pos..).unwrap_or(&[]);
        let value = remaining.read_f32::<LittleEndian>()?;
        self.read_pos += 4;
        Ok(value)
    }

    /// Reads the next x, y and z
    pub fn read_vec3(&mut self) -> Result<Vector3> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vector3::new(x, y, z))
    }
}
