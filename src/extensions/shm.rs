//! MIT-SHM: images through shared memory segments
//!
//! Segments are either attached by System V id or handed over as file
//! descriptors. CreateSegment asks the server to allocate one and returns its
//! descriptor out of band.

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;
use std::os::fd::OwnedFd;

pub const EXTENSION_NAME: &str = "MIT-SHM";

pub mod opcode {
    pub const QUERY_VERSION: u8 = 0;
    pub const ATTACH: u8 = 1;
    pub const DETACH: u8 = 2;
    pub const CREATE_PIXMAP: u8 = 5;
    pub const ATTACH_FD: u8 = 6;
    pub const CREATE_SEGMENT: u8 = 7;
}

pub const COMPLETION_EVENT: u8 = 0;
pub const BAD_SEG_ERROR: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShmVersion {
    pub shared_pixmaps: bool,
    pub major: u16,
    pub minor: u16,
    pub uid: u16,
    pub gid: u16,
    pub pixmap_format: u8,
}

impl ShmVersion {
    pub fn version(&self) -> ExtensionVersion {
        ExtensionVersion {
            major: self.major as u32,
            minor: self.minor as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShmExtension {
    info: ExtensionInfo,
}

impl ShmExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        ShmExtension { info }
    }
}

impl Extension for ShmExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }

    fn decode_event(
        &self,
        code: u8,
        _header: &EventHeader,
        data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        if code != COMPLETION_EVENT {
            return Ok(None);
        }
        let mut r = WireReader::new(data);
        let drawable = XID(r.card32()?);
        let minor_event = r.card16()?;
        let major_event = r.card8()?;
        r.padding(1)?;
        Ok(Some(Event::ShmCompletion(ShmCompletionEvent {
            drawable,
            minor_event,
            major_event,
            shmseg: ShmSeg::new(r.card32()?),
            offset: r.card32()?,
        })))
    }

    fn decode_error(&self, code: u8) -> Option<ErrorKind> {
        (code == BAD_SEG_ERROR).then_some(ErrorKind::ShmBadSegment)
    }
}

impl Client {
    pub fn shm_query_version<F>(&mut self, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<ShmVersion>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_VERSION,
            WireWriter::new(),
            |_, reply| {
                let mut r = reply.reader();
                Ok(ShmVersion {
                    shared_pixmaps: reply.data0 != 0,
                    major: r.card16()?,
                    minor: r.card16()?,
                    uid: r.card16()?,
                    gid: r.card16()?,
                    pixmap_format: r.card8()?,
                })
            },
            callback,
        )
    }

    /// Attach the System V segment `shmid` as `segment`
    pub fn shm_attach(&mut self, segment: ShmSeg, shmid: u32, read_only: bool) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(segment.id().get())
            .card32(shmid)
            .bool(read_only)
            .padding(3);
        self.send_request(major_opcode, opcode::ATTACH, w)
    }

    pub fn shm_detach(&mut self, segment: ShmSeg) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(segment.id().get());
        self.send_request(major_opcode, opcode::DETACH, w)
    }

    /// Create a pixmap backed by `segment` starting at `offset`
    #[allow(clippy::too_many_arguments)]
    pub fn shm_create_pixmap(
        &mut self,
        pixmap: Pixmap,
        drawable: Drawable,
        width: u16,
        height: u16,
        depth: u8,
        segment: ShmSeg,
        offset: u32,
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(pixmap.id().get())
            .card32(drawable.id().get())
            .card16(width)
            .card16(height)
            .card8(depth)
            .padding(3)
            .card32(segment.id().get())
            .card32(offset);
        self.send_request(major_opcode, opcode::CREATE_PIXMAP, w)
    }

    /// Attach memory shared through a descriptor
    pub fn shm_attach_fd(&mut self, segment: ShmSeg, fd: OwnedFd, read_only: bool) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(segment.id().get())
            .bool(read_only)
            .padding(3)
            .fd(fd);
        self.send_request(major_opcode, opcode::ATTACH_FD, w)
    }

    /// Have the server allocate `size` bytes as `segment` and hand back its descriptor
    pub fn shm_create_segment<F>(
        &mut self,
        segment: ShmSeg,
        size: u32,
        read_only: bool,
        callback: F,
    ) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<OwnedFd>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(segment.id().get())
            .card32(size)
            .bool(read_only)
            .padding(3);
        self.send_request_with_fd_reply(
            major_opcode,
            opcode::CREATE_SEGMENT,
            w,
            |_, reply| {
                if reply.data0 != 1 {
                    log::warn!("CreateSegment reply announced {} descriptors", reply.data0);
                }
                reply.take_fd()
            },
            callback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_completion() {
        let shm = ShmExtension::new(ExtensionInfo {
            major_opcode: 130,
            first_event: 65,
            first_error: 128,
        });
        let mut w = WireWriter::new();
        w.card32(0x00200004)
            .card16(3)
            .card8(130)
            .padding(1)
            .card32(0x00200005)
            .card32(4096)
            .padding(12);
        let header = EventHeader {
            code: 65,
            from_send_event: false,
            data0: 0,
            sequence: 11,
        };
        match shm.decode_event(0, &header, w.as_bytes()).unwrap() {
            Some(Event::ShmCompletion(e)) => {
                assert_eq!(e.drawable, XID(0x00200004));
                assert_eq!(e.major_event, 130);
                assert_eq!(e.shmseg, ShmSeg::new(0x00200005));
                assert_eq!(e.offset, 4096);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(shm.decode_error(0), Some(ErrorKind::ShmBadSegment));
        assert_eq!(shm.decode_error(1), None);
    }
}
