//! XFIXES: selection and cursor tracking, server-side regions

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;

pub const EXTENSION_NAME: &str = "XFIXES";

pub mod opcode {
    pub const QUERY_VERSION: u8 = 0;
    pub const SELECT_SELECTION_INPUT: u8 = 2;
    pub const SELECT_CURSOR_INPUT: u8 = 3;
    pub const GET_CURSOR_IMAGE: u8 = 4;
    pub const CREATE_REGION: u8 = 5;
    pub const DESTROY_REGION: u8 = 10;
    pub const SET_REGION: u8 = 11;
    pub const UNION_REGION: u8 = 13;
    pub const INTERSECT_REGION: u8 = 14;
    pub const SUBTRACT_REGION: u8 = 15;
    pub const TRANSLATE_REGION: u8 = 17;
    pub const GET_CURSOR_NAME: u8 = 24;
    pub const GET_CURSOR_IMAGE_AND_NAME: u8 = 25;
}

pub const SELECTION_NOTIFY_EVENT: u8 = 0;
pub const CURSOR_NOTIFY_EVENT: u8 = 1;
pub const BAD_REGION_ERROR: u8 = 0;

pub mod selection_event_mask {
    pub const SET_SELECTION_OWNER: u32 = 1 << 0;
    pub const SELECTION_WINDOW_DESTROY: u32 = 1 << 1;
    pub const SELECTION_CLIENT_CLOSE: u32 = 1 << 2;
}

pub mod cursor_event_mask {
    pub const DISPLAY_CURSOR: u32 = 1 << 0;
}

/// The current cursor as ARGB pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorImage {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub xhot: u16,
    pub yhot: u16,
    pub cursor_serial: u32,
    /// `width * height` premultiplied ARGB values, row by row
    pub pixels: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorName {
    pub atom: Atom,
    pub name: String,
}

fn read_cursor_header(r: &mut WireReader) -> Result<CursorImage, WireError> {
    Ok(CursorImage {
        x: r.int16()?,
        y: r.int16()?,
        width: r.card16()?,
        height: r.card16()?,
        xhot: r.card16()?,
        yhot: r.card16()?,
        cursor_serial: r.card32()?,
        pixels: Vec::new(),
    })
}

#[derive(Debug, Clone)]
pub struct XfixesExtension {
    info: ExtensionInfo,
}

impl XfixesExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        XfixesExtension { info }
    }
}

impl Extension for XfixesExtension {
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
        let mut r = WireReader::new(data);
        let event = match code {
            SELECTION_NOTIFY_EVENT => Event::XfixesSelectionNotify(XfixesSelectionNotifyEvent {
                subtype: header.data0,
                window: Window::new(r.card32()?),
                owner: Window::new(r.card32()?),
                selection: Atom(r.card32()?),
                time: Timestamp(r.card32()?),
                selection_time: Timestamp(r.card32()?),
            }),
            CURSOR_NOTIFY_EVENT => Event::XfixesCursorNotify(XfixesCursorNotifyEvent {
                subtype: header.data0,
                window: Window::new(r.card32()?),
                cursor_serial: r.card32()?,
                time: Timestamp(r.card32()?),
                name: Atom(r.card32()?),
            }),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    fn decode_error(&self, code: u8) -> Option<ErrorKind> {
        (code == BAD_REGION_ERROR).then_some(ErrorKind::XfixesBadRegion)
    }
}

fn write_rectangles(w: &mut WireWriter, rectangles: &[Rectangle]) {
    for rectangle in rectangles {
        w.int16(rectangle.x)
            .int16(rectangle.y)
            .card16(rectangle.width)
            .card16(rectangle.height);
    }
}

impl Client {
    pub fn xfixes_query_version<F>(&mut self, major: u32, minor: u32, callback: F) -> X11Result<Cookie>
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

    /// Ask for SelectionNotify events about `selection`
    pub fn xfixes_select_selection_input(
        &mut self,
        window: Window,
        selection: Atom,
        event_mask: u32,
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(selection.get())
            .card32(event_mask);
        self.send_request(major_opcode, opcode::SELECT_SELECTION_INPUT, w)
    }

    pub fn xfixes_select_cursor_input(&mut self, window: Window, event_mask: u32) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(window.id().get()).card32(event_mask);
        self.send_request(major_opcode, opcode::SELECT_CURSOR_INPUT, w)
    }

    pub fn xfixes_get_cursor_image<F>(&mut self, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<CursorImage>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        self.send_request_with_reply(
            major_opcode,
            opcode::GET_CURSOR_IMAGE,
            WireWriter::new(),
            |_, reply| {
                let mut r = reply.reader();
                let mut image = read_cursor_header(&mut r)?;
                r.padding(8)?;
                image.pixels = r.card32_list(image.width as usize * image.height as usize)?;
                Ok(image)
            },
            callback,
        )
    }

    pub fn xfixes_get_cursor_name<F>(&mut self, cursor: Cursor, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<CursorName>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(cursor.id().get());
        self.send_request_with_reply(
            major_opcode,
            opcode::GET_CURSOR_NAME,
            w,
            |_, reply| {
                let mut r = reply.reader();
                let atom = Atom(r.card32()?);
                let length = r.card16()? as usize;
                r.padding(18)?;
                Ok(CursorName {
                    atom,
                    name: r.string8(length)?,
                })
            },
            callback,
        )
    }

    /// GetCursorImage and GetCursorName in one round trip
    pub fn xfixes_get_cursor_image_and_name<F>(&mut self, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<(CursorImage, CursorName)>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        self.send_request_with_reply(
            major_opcode,
            opcode::GET_CURSOR_IMAGE_AND_NAME,
            WireWriter::new(),
            |_, reply| {
                let mut r = reply.reader();
                let mut image = read_cursor_header(&mut r)?;
                let atom = Atom(r.card32()?);
                let length = r.card16()? as usize;
                r.padding(2)?;
                image.pixels = r.card32_list(image.width as usize * image.height as usize)?;
                let name = r.string8(length)?;
                Ok((image, CursorName { atom, name }))
            },
            callback,
        )
    }

    pub fn xfixes_create_region(&mut self, region: Region, rectangles: &[Rectangle]) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(region.id().get());
        write_rectangles(&mut w, rectangles);
        self.send_request(major_opcode, opcode::CREATE_REGION, w)
    }

    pub fn xfixes_destroy_region(&mut self, region: Region) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(region.id().get());
        self.send_request(major_opcode, opcode::DESTROY_REGION, w)
    }

    /// Replace the contents of `region`
    pub fn xfixes_set_region(&mut self, region: Region, rectangles: &[Rectangle]) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(region.id().get());
        write_rectangles(&mut w, rectangles);
        self.send_request(major_opcode, opcode::SET_REGION, w)
    }

    fn xfixes_combine_regions(
        &mut self,
        minor: u8,
        source1: Region,
        source2: Region,
        destination: Region,
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(source1.id().get())
            .card32(source2.id().get())
            .card32(destination.id().get());
        self.send_request(major_opcode, minor, w)
    }

    pub fn xfixes_union_region(&mut self, source1: Region, source2: Region, destination: Region) -> X11Result<u16> {
        self.xfixes_combine_regions(opcode::UNION_REGION, source1, source2, destination)
    }

    pub fn xfixes_intersect_region(
        &mut self,
        source1: Region,
        source2: Region,
        destination: Region,
    ) -> X11Result<u16> {
        self.xfixes_combine_regions(opcode::INTERSECT_REGION, source1, source2, destination)
    }

    /// `destination` = `source1` minus `source2`
    pub fn xfixes_subtract_region(
        &mut self,
        source1: Region,
        source2: Region,
        destination: Region,
    ) -> X11Result<u16> {
        self.xfixes_combine_regions(opcode::SUBTRACT_REGION, source1, source2, destination)
    }

    pub fn xfixes_translate_region(&mut self, region: Region, dx: i16, dy: i16) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(region.id().get()).int16(dx).int16(dy);
        self.send_request(major_opcode, opcode::TRANSLATE_REGION, w)
    }
}
