pub mod buffer;
pub mod edit;
pub mod wav;

pub use buffer::{
    clamp_sample, BufferError, PcmBuffer, SharedBuffer, MAX_CHANNELS, MAX_SAMPLE_RATE,
};
pub use wav::DecodeError;
