mod de;
mod ring_bytes;

pub use de::null_as_default;
pub use ring_bytes::RingBytes;
