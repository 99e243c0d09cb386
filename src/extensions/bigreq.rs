//! BIG-REQUESTS
//!
//! Once enabled, requests longer than 0xffff units are sent with a zero
//! 16-bit length followed by a 32-bit one.

use super::{Extension, ExtensionInfo};
use crate::client::{Client, Cookie};
use crate::protocol::{WireWriter, X11Result};

pub const EXTENSION_NAME: &str = "BIG-REQUESTS";

pub mod opcode {
    pub const ENABLE: u8 = 0;
}

#[derive(Debug, Clone)]
pub struct BigRequestsExtension {
    info: ExtensionInfo,
}

impl BigRequestsExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        BigRequestsExtension { info }
    }
}

impl Extension for BigRequestsExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }
}

impl Client {
    /// Switch the connection to extended lengths. The new maximum request
    /// length (in 4-byte units) takes effect before `callback` runs.
    pub fn big_requests_enable<F>(&mut self, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<u32>) + 'static,
    {
        let major = self.extension_opcode(EXTENSION_NAME)?;
        self.send_request_with_reply(
            major,
            opcode::ENABLE,
            WireWriter::new(),
            |client, reply| {
                let maximum = reply.reader().card32()?;
                log::debug!("BIG-REQUESTS enabled, maximum request length {}", maximum);
                client.set_maximum_request_length(maximum);
                Ok(maximum)
            },
            callback,
        )
    }
}
