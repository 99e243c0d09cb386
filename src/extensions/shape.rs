//! SHAPE: non-rectangular windows

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;

pub const EXTENSION_NAME: &str = "SHAPE";

pub mod opcode {
    pub const QUERY_VERSION: u8 = 0;
    pub const RECTANGLES: u8 = 1;
    pub const MASK: u8 = 2;
    pub const SELECT_INPUT: u8 = 6;
}

pub const NOTIFY_EVENT: u8 = 0;

/// How a new shape combines with the existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeOp {
    Set = 0,
    Union = 1,
    Intersect = 2,
    Subtract = 3,
    Invert = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Bounding = 0,
    Clip = 1,
    Input = 2,
}

#[derive(Debug, Clone)]
pub struct ShapeExtension {
    info: ExtensionInfo,
}

impl ShapeExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        ShapeExtension { info }
    }
}

impl Extension for ShapeExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }

    fn decode_event(
        &self,
        code: u8,
        header: &EventHeader,
        data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        if code != NOTIFY_EVENT {
            return Ok(None);
        }
        let mut r = WireReader::new(data);
        Ok(Some(Event::ShapeNotify(ShapeNotifyEvent {
            kind: header.data0,
            window: Window::new(r.card32()?),
            x: r.int16()?,
            y: r.int16()?,
            width: r.card16()?,
            height: r.card16()?,
            time: Timestamp(r.card32()?),
            shaped: r.bool()?,
        })))
    }
}

impl Client {
    pub fn shape_query_version<F>(&mut self, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<ExtensionVersion>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_VERSION,
            WireWriter::new(),
            |_, reply| {
                let mut r = reply.reader();
                Ok(ExtensionVersion {
                    major: r.card16()? as u32,
                    minor: r.card16()? as u32,
                })
            },
            callback,
        )
    }

    /// Combine a list of rectangles, offset by `offset`, into a window shape
    pub fn shape_rectangles(
        &mut self,
        operation: ShapeOp,
        kind: ShapeKind,
        window: Window,
        offset: Point,
        rectangles: &[Rectangle],
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card8(operation as u8)
            .card8(kind as u8)
            .card8(0) // unsorted
            .padding(1)
            .card32(window.id().get())
            .int16(offset.x)
            .int16(offset.y);
        for rectangle in rectangles {
            w.int16(rectangle.x)
                .int16(rectangle.y)
                .card16(rectangle.width)
                .card16(rectangle.height);
        }
        self.send_request(major_opcode, opcode::RECTANGLES, w)
    }

    /// Combine a 1-bit pixmap into a window shape; [`Pixmap::NONE`] clears it
    pub fn shape_mask(
        &mut self,
        operation: ShapeOp,
        kind: ShapeKind,
        window: Window,
        offset: Point,
        source: Pixmap,
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card8(operation as u8)
            .card8(kind as u8)
            .padding(2)
            .card32(window.id().get())
            .int16(offset.x)
            .int16(offset.y)
            .card32(source.id().get());
        self.send_request(major_opcode, opcode::MASK, w)
    }

    pub fn shape_select_input(&mut self, window: Window, enable: bool) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(window.id().get()).bool(enable).padding(3);
        self.send_request(major_opcode, opcode::SELECT_INPUT, w)
    }
}
