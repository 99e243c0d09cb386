//! RANDR: screen configuration and monitors

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;

pub const EXTENSION_NAME: &str = "RANDR";

pub mod opcode {
    pub const QUERY_VERSION: u8 = 0;
    pub const SELECT_INPUT: u8 = 4;
    pub const GET_MONITORS: u8 = 42;
}

pub mod notify_mask {
    pub const SCREEN_CHANGE: u16 = 1 << 0;
    pub const CRTC_CHANGE: u16 = 1 << 1;
    pub const OUTPUT_CHANGE: u16 = 1 << 2;
    pub const OUTPUT_PROPERTY: u16 = 1 << 3;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    pub name: Atom,
    pub primary: bool,
    pub automatic: bool,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub width_in_millimeters: u32,
    pub height_in_millimeters: u32,
    pub outputs: Vec<u32>,
}

impl MonitorInfo {
    fn decode(r: &mut WireReader) -> Result<Self, WireError> {
        let name = Atom(r.card32()?);
        let primary = r.bool()?;
        let automatic = r.bool()?;
        let output_count = r.card16()? as usize;
        Ok(MonitorInfo {
            name,
            primary,
            automatic,
            x: r.int16()?,
            y: r.int16()?,
            width: r.card16()?,
            height: r.card16()?,
            width_in_millimeters: r.card32()?,
            height_in_millimeters: r.card32()?,
            outputs: r.card32_list(output_count)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorsReply {
    pub timestamp: Timestamp,
    pub monitors: Vec<MonitorInfo>,
}

#[derive(Debug, Clone)]
pub struct RandrExtension {
    info: ExtensionInfo,
}

impl RandrExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        RandrExtension { info }
    }
}

impl Extension for RandrExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }

    fn decode_error(&self, code: u8) -> Option<ErrorKind> {
        match code {
            0 => Some(ErrorKind::RandrBadOutput),
            1 => Some(ErrorKind::RandrBadCrtc),
            2 => Some(ErrorKind::RandrBadMode),
            3 => Some(ErrorKind::RandrBadProvider),
            _ => None,
        }
    }
}

impl Client {
    pub fn randr_query_version<F>(&mut self, major: u32, minor: u32, callback: F) -> X11Result<Cookie>
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

    pub fn randr_select_input(&mut self, window: Window, enable: u16) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(window.id().get()).card16(enable).padding(2);
        self.send_request(major_opcode, opcode::SELECT_INPUT, w)
    }

    /// List the monitors on the screen of `window`
    pub fn randr_get_monitors<F>(&mut self, window: Window, get_active: bool, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<MonitorsReply>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(window.id().get()).bool(get_active).padding(3);
        self.send_request_with_reply(
            major_opcode,
            opcode::GET_MONITORS,
            w,
            |_, reply| {
                let mut r = reply.reader();
                let timestamp = Timestamp(r.card32()?);
                let monitor_count = r.card32()? as usize;
                let _output_count = r.card32()?;
                r.padding(12)?;
                let monitors = (0..monitor_count)
                    .map(|_| MonitorInfo::decode(&mut r))
                    .collect::<Result<_, _>>()?;
                Ok(MonitorsReply {
                    timestamp,
                    monitors,
                })
            },
            callback,
        )
    }
}
