//! Connection layer
//!
//! This module carries bytes (and file descriptors) between the client engine
//! and the X server. The engine only ever writes through [`Transport`]; reading
//! is driven by the embedding loop, which feeds whatever arrives into
//! [`Client::process_input`](crate::client::Client::process_input).

pub mod display;
#[cfg(unix)]
pub mod unix;

pub use display::{DisplayError, DisplayName};
#[cfg(unix)]
pub use unix::{UnixReader, UnixTransport};

use std::cell::RefCell;
use std::io;
use std::os::fd::OwnedFd;
use std::rc::Rc;

/// Outgoing half of a connection
pub trait Transport {
    /// Queue a complete frame, passing `fds` alongside its first byte
    fn write(&mut self, data: &[u8], fds: Vec<OwnedFd>) -> io::Result<()>;
}

/// One write captured by [`MemoryTransport`]
#[derive(Debug)]
pub struct WrittenFrame {
    pub data: Vec<u8>,
    pub fds: Vec<OwnedFd>,
}

/// In-memory transport that records everything written to it.
///
/// Clones share the same record, so a test can keep one handle while the
/// client owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    written: Rc<RefCell<Vec<WrittenFrame>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        MemoryTransport::default()
    }

    /// Remove and return everything written so far
    pub fn take_written(&self) -> Vec<WrittenFrame> {
        std::mem::take(&mut *self.written.borrow_mut())
    }

    /// Number of frames waiting in the record
    pub fn frame_count(&self) -> usize {
        self.written.borrow().len()
    }
}

impl Transport for MemoryTransport {
    fn write(&mut self, data: &[u8], fds: Vec<OwnedFd>) -> io::Result<()> {
        self.written.borrow_mut().push(WrittenFrame {
            data: data.to_vec(),
            fds,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_shares_record() {
        let observer = MemoryTransport::new();
        let mut transport = observer.clone();
        transport.write(&[1, 2, 3, 4], Vec::new()).unwrap();
        transport.write(&[5, 6, 7, 8], Vec::new()).unwrap();
        assert_eq!(observer.frame_count(), 2);

        let frames = observer.take_written();
        assert_eq!(frames[1].data, vec![5, 6, 7, 8]);
        assert_eq!(observer.frame_count(), 0);
    }
}
