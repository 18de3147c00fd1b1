//! Binary persistence: configuration streams and simulation state snapshots.

mod stream;
mod state;

pub use self::stream::{StreamIn, StreamOut};
pub use self::state::StateRecorder;
