//! Fixed-capacity byte tail used to keep the last N bytes of a child stream.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct RingBytes {
    cap: usize,
    buf: Mutex<VecDeque<u8>>,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            cap,
            buf: Mutex::new(VecDeque::with_capacity(cap.min(64 * 1024))),
        })
    }

    pub fn push(&self, data: &[u8]) {
        if self.cap == 0 {
            return;
        }
        let Ok(mut buf) = self.buf.lock() else {
            return;
        };
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = (buf.len() + data.len()).saturating_sub(self.cap);
        buf.drain(..overflow);
        buf.extend(data.iter().copied());
    }

    pub fn to_string_lossy(&self) -> String {
        match self.buf.lock() {
            Ok(buf) => {
                let (a, b) = buf.as_slices();
                let mut bytes = Vec::with_capacity(a.len() + b.len());
                bytes.extend_from_slice(a);
                bytes.extend_from_slice(b);
                String::from_utf8_lossy(&bytes).into_owned()
            }
            Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_tail() {
        let ring = RingBytes::new(5);
        ring.push(b"abc");
        ring.push(b"defg");
        assert_eq!(ring.to_string_lossy(), "cdefg");
    }

    #[test]
    fn oversized_push_keeps_last_bytes() {
        let ring = RingBytes::new(3);
        ring.push(b"0123456789");
        assert_eq!(ring.to_string_lossy(), "789");
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let ring = RingBytes::new(0);
        ring.push(b"data");
        assert_eq!(ring.to_string_lossy(), "");
    }
}
