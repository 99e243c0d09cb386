//! Present: synchronised pixmap presentation
//!
//! All Present events are generic events; their data starts right after the
//! 16-bit event type.

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;

pub const EXTENSION_NAME: &str = "Present";

pub mod opcode {
    pub const QUERY_VERSION: u8 = 0;
    pub const PIXMAP: u8 = 1;
    pub const NOTIFY_MSC: u8 = 2;
    pub const SELECT_INPUT: u8 = 3;
    pub const QUERY_CAPABILITIES: u8 = 4;
}

pub const CONFIGURE_NOTIFY_EVENT: u16 = 0;
pub const COMPLETE_NOTIFY_EVENT: u16 = 1;
pub const IDLE_NOTIFY_EVENT: u16 = 2;

pub mod event_mask {
    pub const CONFIGURE_NOTIFY: u32 = 1 << 0;
    pub const COMPLETE_NOTIFY: u32 = 1 << 1;
    pub const IDLE_NOTIFY: u32 = 1 << 2;
}

pub mod capability {
    pub const ASYNC: u32 = 1 << 0;
    pub const FENCE: u32 = 1 << 1;
    pub const UST: u32 = 1 << 2;
}

pub mod option {
    pub const ASYNC: u32 = 1 << 0;
    pub const COPY: u32 = 1 << 1;
    pub const UST: u32 = 1 << 2;
    pub const SUBOPTIMAL: u32 = 1 << 3;
}

/// Arguments of a PresentPixmap request
#[derive(Debug, Clone, Default)]
pub struct PresentPixmap {
    pub window: Window,
    pub pixmap: Pixmap,
    pub serial: u32,
    pub valid: Region,
    pub update: Region,
    pub x_off: i16,
    pub y_off: i16,
    pub target_crtc: u32,
    pub wait_fence: Fence,
    pub idle_fence: Fence,
    pub options: u32,
    pub target_msc: u64,
    pub divisor: u64,
    pub remainder: u64,
}

#[derive(Debug, Clone)]
pub struct PresentExtension {
    info: ExtensionInfo,
}

impl PresentExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        PresentExtension { info }
    }
}

impl Extension for PresentExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }

    fn decode_generic_event(
        &self,
        event_type: u16,
        data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        let mut r = WireReader::new(data);
        let event = match event_type {
            CONFIGURE_NOTIFY_EVENT => {
                r.padding(2)?;
                Event::PresentConfigureNotify(PresentConfigureNotifyEvent {
                    event_id: r.card32()?,
                    window: Window::new(r.card32()?),
                    x: r.int16()?,
                    y: r.int16()?,
                    width: r.card16()?,
                    height: r.card16()?,
                    off_x: r.int16()?,
                    off_y: r.int16()?,
                    pixmap_width: r.card16()?,
                    pixmap_height: r.card16()?,
                    pixmap_flags: r.card32()?,
                })
            }
            COMPLETE_NOTIFY_EVENT => Event::PresentCompleteNotify(PresentCompleteNotifyEvent {
                kind: r.card8()?,
                mode: r.card8()?,
                event_id: r.card32()?,
                window: Window::new(r.card32()?),
                serial: r.card32()?,
                ust: r.card64()?,
                msc: r.card64()?,
            }),
            IDLE_NOTIFY_EVENT => {
                r.padding(2)?;
                Event::PresentIdleNotify(PresentIdleNotifyEvent {
                    event_id: r.card32()?,
                    window: Window::new(r.card32()?),
                    serial: r.card32()?,
                    pixmap: Pixmap::new(r.card32()?),
                    idle_fence: Fence::new(r.card32()?),
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

impl Client {
    pub fn present_query_version<F>(&mut self, major: u32, minor: u32, callback: F) -> X11Result<Cookie>
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

    pub fn present_pixmap(&mut self, request: &PresentPixmap) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(request.window.id().get())
            .card32(request.pixmap.id().get())
            .card32(request.serial)
            .card32(request.valid.id().get())
            .card32(request.update.id().get())
            .int16(request.x_off)
            .int16(request.y_off)
            .card32(request.target_crtc)
            .card32(request.wait_fence.id().get())
            .card32(request.idle_fence.id().get())
            .card32(request.options)
            .padding(4)
            .card64(request.target_msc)
            .card64(request.divisor)
            .card64(request.remainder);
        self.send_request(major_opcode, opcode::PIXMAP, w)
    }

    /// Ask for a CompleteNotify once the target MSC is reached
    pub fn present_notify_msc(
        &mut self,
        window: Window,
        serial: u32,
        target_msc: u64,
        divisor: u64,
        remainder: u64,
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(serial)
            .padding(4)
            .card64(target_msc)
            .card64(divisor)
            .card64(remainder);
        self.send_request(major_opcode, opcode::NOTIFY_MSC, w)
    }

    /// Select Present events on `window`, returning the new event context id
    pub fn present_select_input(&mut self, window: Window, event_mask: u32) -> X11Result<XID> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let event_id = self.generate_id();
        let mut w = WireWriter::new();
        w.card32(event_id.get())
            .card32(window.id().get())
            .card32(event_mask);
        self.send_request(major_opcode, opcode::SELECT_INPUT, w)?;
        Ok(event_id)
    }

    /// Capability bits for presenting to a CRTC or window
    pub fn present_query_capabilities<F>(&mut self, target: XID, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<u32>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(target.get());
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_CAPABILITIES,
            w,
            |_, reply| Ok(reply.reader().card32()?),
            callback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present() -> PresentExtension {
        PresentExtension::new(ExtensionInfo {
            major_opcode: 148,
            first_event: 0,
            first_error: 0,
        })
    }

    #[test]
    fn test_decode_complete_notify() {
        let mut w = WireWriter::new();
        w.card8(0)
            .card8(1)
            .card32(0x00200010)
            .card32(0x00200001)
            .card32(42)
            .card64(1_000_000)
            .card64(77);
        match present().decode_generic_event(1, w.as_bytes()).unwrap() {
            Some(Event::PresentCompleteNotify(e)) => {
                assert_eq!(e.mode, 1);
                assert_eq!(e.serial, 42);
                assert_eq!(e.ust, 1_000_000);
                assert_eq!(e.msc, 77);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_idle_notify() {
        let mut w = WireWriter::new();
        w.padding(2).card32(1).card32(2);
        assert!(present().decode_generic_event(2, w.as_bytes()).is_err());
        assert_eq!(present().decode_generic_event(9, w.as_bytes()).unwrap(), None);
    }
}
