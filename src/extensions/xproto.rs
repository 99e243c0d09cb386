//! Core protocol requests
//!
//! The core protocol is modelled as an extension with opcode and code ranges
//! of zero, so its events and errors go through the same registry scan as
//! everything else.

use super::{Extension, ExtensionInfo};
use crate::client::{Client, Cookie, Reply};
use crate::protocol::*;

/// The core X11 protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreExtension;

impl Extension for CoreExtension {
    fn name(&self) -> &'static str {
        "core"
    }

    fn info(&self) -> ExtensionInfo {
        ExtensionInfo::default()
    }

    fn decode_event(
        &self,
        _code: u8,
        header: &EventHeader,
        data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        decode_core_event(header, data)
    }

    fn decode_error(&self, code: u8) -> Option<ErrorKind> {
        ErrorKind::from_core_code(code)
    }
}

/// Window attribute bit selecting the event mask
const CW_EVENT_MASK: u32 = 0x800;

/// GC attribute bits, in wire order
pub mod gc_mask {
    pub const FUNCTION: u32 = 1 << 0;
    pub const PLANE_MASK: u32 = 1 << 1;
    pub const FOREGROUND: u32 = 1 << 2;
    pub const BACKGROUND: u32 = 1 << 3;
    pub const LINE_WIDTH: u32 = 1 << 4;
    pub const LINE_STYLE: u32 = 1 << 5;
    pub const CAP_STYLE: u32 = 1 << 6;
    pub const JOIN_STYLE: u32 = 1 << 7;
    pub const FILL_STYLE: u32 = 1 << 8;
    pub const FILL_RULE: u32 = 1 << 9;
    pub const TILE: u32 = 1 << 10;
    pub const STIPPLE: u32 = 1 << 11;
    pub const TILE_STIPPLE_ORIGIN_X: u32 = 1 << 12;
    pub const TILE_STIPPLE_ORIGIN_Y: u32 = 1 << 13;
    pub const FONT: u32 = 1 << 14;
    pub const SUBWINDOW_MODE: u32 = 1 << 15;
    pub const GRAPHICS_EXPOSURES: u32 = 1 << 16;
    pub const CLIP_ORIGIN_X: u32 = 1 << 17;
    pub const CLIP_ORIGIN_Y: u32 = 1 << 18;
    pub const CLIP_MASK: u32 = 1 << 19;
    pub const DASH_OFFSET: u32 = 1 << 20;
    pub const DASHES: u32 = 1 << 21;
    pub const ARC_MODE: u32 = 1 << 22;
}

/// Write a value-mask/value-list pair. Entries may come in any order; the
/// server expects values sorted by bit, one per bit.
fn write_value_list(w: &mut WireWriter, values: &[(u32, u32)]) {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|&(bit, _)| bit);
    sorted.dedup_by_key(|&mut (bit, _)| bit);
    let mask = sorted.iter().fold(0, |mask, &(bit, _)| mask | bit);
    w.card32(mask);
    for (_, value) in sorted {
        w.card32(value);
    }
}

/// ConfigureWindow bits for x, y, width and height
const CONFIG_WINDOW_GEOMETRY: u16 = 0x000f;

/// Property data in one of the three wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue<'a> {
    Card8(&'a [u8]),
    Card16(&'a [u16]),
    Card32(&'a [u32]),
}

impl PropertyValue<'_> {
    pub fn format(&self) -> u8 {
        match self {
            PropertyValue::Card8(_) => 8,
            PropertyValue::Card16(_) => 16,
            PropertyValue::Card32(_) => 32,
        }
    }

    /// Number of elements, as sent in the length field
    pub fn len(&self) -> usize {
        match self {
            PropertyValue::Card8(v) => v.len(),
            PropertyValue::Card16(v) => v.len(),
            PropertyValue::Card32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn encode(&self, w: &mut WireWriter) {
        match self {
            PropertyValue::Card8(values) => {
                w.bytes(values);
            }
            PropertyValue::Card16(values) => {
                for &value in values.iter() {
                    w.card16(value);
                }
            }
            PropertyValue::Card32(values) => {
                for &value in values.iter() {
                    w.card32(value);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowAttributes {
    pub backing_store: u8,
    pub visual: VisualID,
    pub class: Option<WindowClass>,
    pub bit_gravity: u8,
    pub win_gravity: u8,
    pub backing_planes: u32,
    pub backing_pixel: u32,
    pub save_under: bool,
    pub map_is_installed: bool,
    pub map_state: Option<MapState>,
    pub override_redirect: bool,
    pub colormap: Colormap,
    pub all_event_masks: u32,
    pub your_event_mask: u32,
    pub do_not_propagate_mask: u16,
}

impl WindowAttributes {
    fn decode(reply: &Reply) -> Result<Self, WireError> {
        let mut r = reply.reader();
        Ok(WindowAttributes {
            backing_store: reply.data0,
            visual: VisualID(r.card32()?),
            class: WindowClass::from_u16(r.card16()?),
            bit_gravity: r.card8()?,
            win_gravity: r.card8()?,
            backing_planes: r.card32()?,
            backing_pixel: r.card32()?,
            save_under: r.bool()?,
            map_is_installed: r.bool()?,
            map_state: MapState::from_u8(r.card8()?),
            override_redirect: r.bool()?,
            colormap: Colormap::new(r.card32()?),
            all_event_masks: r.card32()?,
            your_event_mask: r.card32()?,
            do_not_propagate_mask: r.card16()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReply {
    /// 0 when the property does not exist
    pub format: u8,
    pub type_: Atom,
    pub bytes_after: u32,
    /// Raw value bytes, `format / 8` bytes per element
    pub value: Vec<u8>,
}

impl PropertyReply {
    fn decode(reply: &Reply) -> Result<Self, WireError> {
        let mut r = reply.reader();
        let format = reply.data0;
        let type_ = Atom(r.card32()?);
        let bytes_after = r.card32()?;
        let length = r.card32()? as usize;
        r.padding(12)?;
        let value = r.bytes(length * (format as usize / 8))?.to_vec();
        Ok(PropertyReply {
            format,
            type_,
            bytes_after,
            value,
        })
    }

    /// Value as 32-bit items, when the format says so
    pub fn card32_values(&self) -> Option<Vec<u32>> {
        if self.format != 32 {
            return None;
        }
        let mut r = WireReader::new(&self.value);
        r.card32_list(self.value.len() / 4).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReply {
    pub depth: u8,
    pub visual: VisualID,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryExtensionReply {
    pub present: bool,
    pub major_opcode: u8,
    pub first_event: u8,
    pub first_error: u8,
}

impl QueryExtensionReply {
    pub fn info(&self) -> ExtensionInfo {
        ExtensionInfo {
            major_opcode: self.major_opcode,
            first_event: self.first_event,
            first_error: self.first_error,
        }
    }
}

fn single_id(id: XID) -> WireWriter {
    let mut w = WireWriter::new();
    w.card32(id.get());
    w
}

impl Client {
    pub fn create_window(
        &mut self,
        window: Window,
        parent: Window,
        depth: u8,
        geometry: Rectangle,
        visual: VisualID,
        event_mask: u32,
    ) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(parent.id().get())
            .int16(geometry.x)
            .int16(geometry.y)
            .card16(geometry.width)
            .card16(geometry.height)
            .card16(0) // border width
            .card16(WindowClass::InputOutput as u16)
            .card32(visual.get())
            .card32(CW_EVENT_MASK)
            .card32(event_mask);
        self.send_request(RequestOpcode::CreateWindow as u8, depth, w)
    }

    /// Replace the event mask selected on `window`
    pub fn change_window_attributes(&mut self, window: Window, event_mask: u32) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(CW_EVENT_MASK)
            .card32(event_mask);
        self.send_request(RequestOpcode::ChangeWindowAttributes as u8, 0, w)
    }

    pub fn get_window_attributes<F>(&mut self, window: Window, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<WindowAttributes>) + 'static,
    {
        self.send_request_with_reply(
            RequestOpcode::GetWindowAttributes as u8,
            0,
            single_id(window.id()),
            |_, reply| Ok(WindowAttributes::decode(reply)?),
            callback,
        )
    }

    pub fn destroy_window(&mut self, window: Window) -> X11Result<u16> {
        self.send_request(RequestOpcode::DestroyWindow as u8, 0, single_id(window.id()))
    }

    pub fn destroy_subwindows(&mut self, window: Window) -> X11Result<u16> {
        self.send_request(RequestOpcode::DestroySubwindows as u8, 0, single_id(window.id()))
    }

    /// Move `window` under `parent` at (`x`, `y`)
    pub fn reparent_window(&mut self, window: Window, parent: Window, x: i16, y: i16) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(parent.id().get())
            .int16(x)
            .int16(y);
        self.send_request(RequestOpcode::ReparentWindow as u8, 0, w)
    }

    pub fn map_window(&mut self, window: Window) -> X11Result<u16> {
        self.send_request(RequestOpcode::MapWindow as u8, 0, single_id(window.id()))
    }

    pub fn map_subwindows(&mut self, window: Window) -> X11Result<u16> {
        self.send_request(RequestOpcode::MapSubwindows as u8, 0, single_id(window.id()))
    }

    pub fn unmap_window(&mut self, window: Window) -> X11Result<u16> {
        self.send_request(RequestOpcode::UnmapWindow as u8, 0, single_id(window.id()))
    }

    pub fn unmap_subwindows(&mut self, window: Window) -> X11Result<u16> {
        self.send_request(RequestOpcode::UnmapSubwindows as u8, 0, single_id(window.id()))
    }

    /// Move and resize a window in one request
    pub fn configure_window(&mut self, window: Window, geometry: Rectangle) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card16(CONFIG_WINDOW_GEOMETRY)
            .padding(2)
            .int32(geometry.x as i32)
            .int32(geometry.y as i32)
            .card32(geometry.width as u32)
            .card32(geometry.height as u32);
        self.send_request(RequestOpcode::ConfigureWindow as u8, 0, w)
    }

    pub fn intern_atom<F>(&mut self, name: &str, only_if_exists: bool, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<Atom>) + 'static,
    {
        let length: u16 = wire_length("atom name", name.len())?;
        let mut w = WireWriter::new();
        w.card16(length).padding(2).string8(name).align();
        self.send_request_with_reply(
            RequestOpcode::InternAtom as u8,
            only_if_exists as u8,
            w,
            |_, reply| Ok(Atom(reply.reader().card32()?)),
            callback,
        )
    }

    pub fn get_atom_name<F>(&mut self, atom: Atom, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<String>) + 'static,
    {
        let mut w = WireWriter::new();
        w.card32(atom.get());
        self.send_request_with_reply(
            RequestOpcode::GetAtomName as u8,
            0,
            w,
            |_, reply| {
                let mut r = reply.reader();
                let length = r.card16()? as usize;
                r.padding(22)?;
                Ok(r.string8(length)?)
            },
            callback,
        )
    }

    pub fn change_property(
        &mut self,
        mode: PropertyMode,
        window: Window,
        property: Atom,
        type_: Atom,
        value: PropertyValue<'_>,
    ) -> X11Result<u16> {
        let length: u32 = wire_length("property value", value.len())?;
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(property.get())
            .card32(type_.get())
            .card8(value.format())
            .padding(3)
            .card32(length);
        value.encode(&mut w);
        w.align();
        self.send_request(RequestOpcode::ChangeProperty as u8, mode as u8, w)
    }

    pub fn delete_property(&mut self, window: Window, property: Atom) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(window.id().get()).card32(property.get());
        self.send_request(RequestOpcode::DeleteProperty as u8, 0, w)
    }

    /// Read up to `long_length` 32-bit units of a property. `type_` of
    /// [`Atom::NONE`] matches any type.
    #[allow(clippy::too_many_arguments)]
    pub fn get_property<F>(
        &mut self,
        delete: bool,
        window: Window,
        property: Atom,
        type_: Atom,
        long_offset: u32,
        long_length: u32,
        callback: F,
    ) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<PropertyReply>) + 'static,
    {
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(property.get())
            .card32(type_.get())
            .card32(long_offset)
            .card32(long_length);
        self.send_request_with_reply(
            RequestOpcode::GetProperty as u8,
            delete as u8,
            w,
            |_, reply| Ok(PropertyReply::decode(reply)?),
            callback,
        )
    }

    pub fn list_properties<F>(&mut self, window: Window, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<Vec<Atom>>) + 'static,
    {
        self.send_request_with_reply(
            RequestOpcode::ListProperties as u8,
            0,
            single_id(window.id()),
            |_, reply| {
                let mut r = reply.reader();
                let count = r.card16()? as usize;
                r.padding(22)?;
                Ok(r.card32_list(count)?.into_iter().map(Atom).collect())
            },
            callback,
        )
    }

    pub fn grab_server(&mut self) -> X11Result<u16> {
        self.send_request(RequestOpcode::GrabServer as u8, 0, WireWriter::new())
    }

    pub fn ungrab_server(&mut self) -> X11Result<u16> {
        self.send_request(RequestOpcode::UngrabServer as u8, 0, WireWriter::new())
    }

    pub fn create_pixmap(
        &mut self,
        depth: u8,
        pixmap: Pixmap,
        drawable: Drawable,
        width: u16,
        height: u16,
    ) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(pixmap.id().get())
            .card32(drawable.id().get())
            .card16(width)
            .card16(height);
        self.send_request(RequestOpcode::CreatePixmap as u8, depth, w)
    }

    pub fn free_pixmap(&mut self, pixmap: Pixmap) -> X11Result<u16> {
        self.send_request(RequestOpcode::FreePixmap as u8, 0, single_id(pixmap.id()))
    }

    /// Create a graphics context with every attribute at its default
    pub fn create_gc(&mut self, gc: GContext, drawable: Drawable) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(gc.id().get()).card32(drawable.id().get()).card32(0);
        self.send_request(RequestOpcode::CreateGC as u8, 0, w)
    }

    /// Set GC attributes; `values` pairs a [`gc_mask`] bit with its value
    pub fn change_gc(&mut self, gc: GContext, values: &[(u32, u32)]) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(gc.id().get());
        write_value_list(&mut w, values);
        self.send_request(RequestOpcode::ChangeGC as u8, 0, w)
    }

    /// Copy the attributes selected by `value_mask` from `src` to `dst`
    pub fn copy_gc(&mut self, src: GContext, dst: GContext, value_mask: u32) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(src.id().get())
            .card32(dst.id().get())
            .card32(value_mask);
        self.send_request(RequestOpcode::CopyGC as u8, 0, w)
    }

    pub fn free_gc(&mut self, gc: GContext) -> X11Result<u16> {
        self.send_request(RequestOpcode::FreeGC as u8, 0, single_id(gc.id()))
    }

    pub fn clear_area(&mut self, window: Window, area: Rectangle, exposures: bool) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .int16(area.x)
            .int16(area.y)
            .card16(area.width)
            .card16(area.height);
        self.send_request(RequestOpcode::ClearArea as u8, exposures as u8, w)
    }

    /// Copy `dst.width` x `dst.height` pixels from `src_origin` in `src` to
    /// the origin of `dst` in `dst_drawable`
    pub fn copy_area(
        &mut self,
        src: Drawable,
        dst_drawable: Drawable,
        gc: GContext,
        src_origin: Point,
        dst: Rectangle,
    ) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(src.id().get())
            .card32(dst_drawable.id().get())
            .card32(gc.id().get())
            .int16(src_origin.x)
            .int16(src_origin.y)
            .int16(dst.x)
            .int16(dst.y)
            .card16(dst.width)
            .card16(dst.height);
        self.send_request(RequestOpcode::CopyArea as u8, 0, w)
    }

    /// Upload pixel data into `area` of `drawable`
    pub fn put_image(
        &mut self,
        format: ImageFormat,
        drawable: Drawable,
        gc: GContext,
        area: Rectangle,
        depth: u8,
        data: &[u8],
    ) -> X11Result<u16> {
        let mut w = WireWriter::new();
        w.card32(drawable.id().get())
            .card32(gc.id().get())
            .card16(area.width)
            .card16(area.height)
            .int16(area.x)
            .int16(area.y)
            .card8(0) // left pad
            .card8(depth)
            .padding(2)
            .bytes(data)
            .align();
        self.send_request(RequestOpcode::PutImage as u8, format as u8, w)
    }

    pub fn get_image<F>(
        &mut self,
        format: ImageFormat,
        drawable: Drawable,
        area: Rectangle,
        plane_mask: u32,
        callback: F,
    ) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<ImageReply>) + 'static,
    {
        let mut w = WireWriter::new();
        w.card32(drawable.id().get())
            .int16(area.x)
            .int16(area.y)
            .card16(area.width)
            .card16(area.height)
            .card32(plane_mask);
        self.send_request_with_reply(
            RequestOpcode::GetImage as u8,
            format as u8,
            w,
            |_, reply| {
                let mut r = reply.reader();
                let visual = VisualID(r.card32()?);
                r.padding(20)?;
                let data = r.bytes(r.remaining())?.to_vec();
                Ok(ImageReply {
                    depth: reply.data0,
                    visual,
                    data,
                })
            },
            callback,
        )
    }

    pub fn query_extension<F>(&mut self, name: &str, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<QueryExtensionReply>) + 'static,
    {
        let length: u16 = wire_length("extension name", name.len())?;
        let mut w = WireWriter::new();
        w.card16(length).padding(2).string8(name).align();
        self.send_request_with_reply(
            RequestOpcode::QueryExtension as u8,
            0,
            w,
            |_, reply| {
                let mut r = reply.reader();
                Ok(QueryExtensionReply {
                    present: r.bool()?,
                    major_opcode: r.card8()?,
                    first_event: r.card8()?,
                    first_error: r.card8()?,
                })
            },
            callback,
        )
    }

    pub fn list_extensions<F>(&mut self, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<Vec<String>>) + 'static,
    {
        self.send_request_with_reply(
            RequestOpcode::ListExtensions as u8,
            0,
            WireWriter::new(),
            |_, reply| {
                let mut r = reply.reader();
                r.padding(24)?;
                let mut names = Vec::with_capacity(reply.data0 as usize);
                for _ in 0..reply.data0 {
                    let length = r.card8()? as usize;
                    names.push(r.string8(length)?);
                }
                Ok(names)
            },
            callback,
        )
    }

    /// Ring the bell at `percent` (-100..=100) of the base volume
    pub fn bell(&mut self, percent: i8) -> X11Result<u16> {
        self.send_request(RequestOpcode::Bell as u8, percent as u8, WireWriter::new())
    }

    /// Disconnect the client owning `resource`
    pub fn kill_client(&mut self, resource: u32) -> X11Result<u16> {
        self.send_request(RequestOpcode::KillClient as u8, 0, single_id(XID(resource)))
    }

    /// Rotate the values of `properties` on `window` by `delta` positions
    pub fn rotate_properties(&mut self, window: Window, delta: i16, properties: &[Atom]) -> X11Result<u16> {
        let count: u16 = wire_length("property list", properties.len())?;
        let mut w = WireWriter::new();
        w.card32(window.id().get()).card16(count).int16(delta);
        for property in properties {
            w.card32(property.get());
        }
        self.send_request(RequestOpcode::RotateProperties as u8, 0, w)
    }

    pub fn no_operation(&mut self) -> X11Result<u16> {
        self.send_request(RequestOpcode::NoOperation as u8, 0, WireWriter::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_format() {
        let value = PropertyValue::Card32(&[1, 2, 3]);
        assert_eq!(value.format(), 32);
        assert_eq!(value.len(), 3);
        let mut w = WireWriter::new();
        PropertyValue::Card16(&[0x0102, 0x0304]).encode(&mut w);
        assert_eq!(w.as_bytes(), &[0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn test_decode_property_reply() {
        let mut w = WireWriter::new();
        w.card32(Atom::CARDINAL.get())
            .card32(0)
            .card32(2)
            .padding(12)
            .card32(640)
            .card32(480);
        let (payload, _) = w.into_parts();
        let reply = Reply::new(32, 4, payload);
        let property = PropertyReply::decode(&reply).unwrap();
        assert_eq!(property.type_, Atom::CARDINAL);
        assert_eq!(property.card32_values(), Some(vec![640, 480]));
    }

    #[test]
    fn test_value_list_sorted_by_bit() {
        let mut w = WireWriter::new();
        write_value_list(
            &mut w,
            &[
                (gc_mask::GRAPHICS_EXPOSURES, 0),
                (gc_mask::FOREGROUND, 0xff0000),
                (gc_mask::FUNCTION, 3),
            ],
        );
        let mut r = WireReader::new(w.as_bytes());
        assert_eq!(r.card32().unwrap(), 0x1_0005);
        assert_eq!(r.card32_list(3).unwrap(), vec![3, 0xff0000, 0]);
    }

    #[test]
    fn test_core_extension_owns_core_codes() {
        let core = CoreExtension;
        assert_eq!(core.decode_error(14), Some(ErrorKind::IDChoice));
        assert_eq!(core.decode_error(128), None);
        assert_eq!(core.first_event(), 0);
    }
}
