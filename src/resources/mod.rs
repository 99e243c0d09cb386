//! Resource ID allocation
//!
//! The server hands each client a base and a mask at setup time; the client
//! owns every ID of the form `base | n` where `n` fits inside the mask.

use crate::protocol::XID;

/// Hands out resource IDs from the range granted at connection setup
#[derive(Debug, Default)]
pub struct ResourceIdAllocator {
    base: u32,
    mask: u32,
    next: u32,
    exhausted_warned: bool,
}

impl ResourceIdAllocator {
    /// Create an allocator for the range granted by the server
    pub fn new(base: u32, mask: u32) -> Self {
        ResourceIdAllocator {
            base,
            mask,
            next: 0,
            exhausted_warned: false,
        }
    }

    /// Allocate the next ID.
    ///
    /// IDs are never reused within a connection. Running past the mask keeps
    /// counting, and the server will reject the resulting IDs with IDChoice.
    pub fn allocate(&mut self) -> XID {
        if self.next > self.mask && !self.exhausted_warned {
            log::warn!(
                "Resource ID range exhausted (base=0x{:08x}, mask=0x{:08x})",
                self.base,
                self.mask
            );
            self.exhausted_warned = true;
        }
        let id = self.base | self.next;
        self.next = self.next.wrapping_add(1);
        XID::new(id)
    }

    /// Number of IDs handed out so far
    pub fn allocated(&self) -> u32 {
        self.next
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }
}
