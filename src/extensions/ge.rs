//! Generic Event Extension
//!
//! Owns no events itself; negotiating it lets other extensions send
//! variable-length events with code 35.

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::{WireWriter, X11Result};

pub const EXTENSION_NAME: &str = "Generic Event Extension";

pub mod opcode {
    pub const QUERY_VERSION: u8 = 0;
}

#[derive(Debug, Clone)]
pub struct GenericEventExtension {
    info: ExtensionInfo,
}

impl GenericEventExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        GenericEventExtension { info }
    }
}

impl Extension for GenericEventExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }
}

impl Client {
    pub fn ge_query_version<F>(&mut self, major: u16, minor: u16, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<ExtensionVersion>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card16(major).card16(minor);
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_VERSION,
            w,
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
}
