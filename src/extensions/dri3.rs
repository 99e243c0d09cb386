//! DRI3: direct rendering buffers shared as file descriptors

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;
use std::os::fd::OwnedFd;

pub const EXTENSION_NAME: &str = "DRI3";

pub mod opcode {
    pub const QUERY_VERSION: u8 = 0;
    pub const OPEN: u8 = 1;
    pub const PIXMAP_FROM_BUFFER: u8 = 2;
    pub const BUFFER_FROM_PIXMAP: u8 = 3;
}

/// Layout of a single-plane buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub size: u32,
    pub width: u16,
    pub height: u16,
    pub stride: u16,
    pub depth: u8,
    pub bpp: u8,
}

/// A pixmap's buffer exported by the server
#[derive(Debug)]
pub struct PixmapBuffer {
    pub layout: BufferLayout,
    pub fd: OwnedFd,
}

#[derive(Debug, Clone)]
pub struct Dri3Extension {
    info: ExtensionInfo,
}

impl Dri3Extension {
    pub fn new(info: ExtensionInfo) -> Self {
        Dri3Extension { info }
    }
}

impl Extension for Dri3Extension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }
}

impl Client {
    pub fn dri3_query_version<F>(&mut self, major: u32, minor: u32, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<ExtensionVersion>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(major).card32(minor);
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_VERSION,
            w,
            |_, reply| {
                let mut r = reply.reader();
                Ok(ExtensionVersion {
                    major: r.card32()?,
                    minor: r.card32()?,
                })
            },
            callback,
        )
    }

    /// Open the DRM device behind `drawable`'s screen; the reply carries its fd
    pub fn dri3_open<F>(&mut self, drawable: Drawable, provider: u32, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<OwnedFd>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(drawable.id().get()).card32(provider);
        self.send_request_with_fd_reply(
            major_opcode,
            opcode::OPEN,
            w,
            |_, reply| reply.take_fd(),
            callback,
        )
    }

    /// Wrap a dma-buf as a pixmap
    pub fn dri3_pixmap_from_buffer(
        &mut self,
        pixmap: Pixmap,
        drawable: Drawable,
        layout: BufferLayout,
        fd: OwnedFd,
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(pixmap.id().get())
            .card32(drawable.id().get())
            .card32(layout.size)
            .card16(layout.width)
            .card16(layout.height)
            .card16(layout.stride)
            .card8(layout.depth)
            .card8(layout.bpp)
            .fd(fd);
        self.send_request(major_opcode, opcode::PIXMAP_FROM_BUFFER, w)
    }

    pub fn dri3_buffer_from_pixmap<F>(&mut self, pixmap: Pixmap, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<PixmapBuffer>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(pixmap.id().get());
        self.send_request_with_fd_reply(
            major_opcode,
            opcode::BUFFER_FROM_PIXMAP,
            w,
            |_, reply| {
                let mut r = reply.reader();
                let layout = BufferLayout {
                    size: r.card32()?,
                    width: r.card16()?,
                    height: r.card16()?,
                    stride: r.card16()?,
                    depth: r.card8()?,
                    bpp: r.card8()?,
                };
                let fd = reply.take_fd()?;
                Ok(PixmapBuffer { layout, fd })
            },
            callback,
        )
    }
}
