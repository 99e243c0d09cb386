//! Protocol extensions
//!
//! Every extension the server advertises is represented by an [`Extension`]
//! object carrying the opcode and code ranges assigned at discovery time. The
//! core protocol is registered first, as extension zero. Request methods for
//! each extension live alongside it as `impl Client` blocks.

pub mod bigreq;
pub mod dri3;
pub mod ge;
pub mod present;
pub mod randr;
pub mod shape;
pub mod shm;
pub mod sync;
pub mod xfixes;
pub mod xinput;
pub mod xproto;

pub use xproto::{
    CoreExtension, ImageReply, PropertyReply, PropertyValue, QueryExtensionReply, WindowAttributes,
};

use crate::protocol::{ErrorKind, Event, EventHeader, WireError};
use std::collections::HashMap;
use std::fmt;

/// Opcode and code ranges returned by QueryExtension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtensionInfo {
    pub major_opcode: u8,
    pub first_event: u8,
    pub first_error: u8,
}

/// Version negotiated with the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionVersion {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for ExtensionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A registered protocol extension.
///
/// Decoders receive codes relative to the extension's own range. Fixed-size
/// event decoders get the 28 bytes after the event header; generic event
/// decoders get everything from byte 10 of the message.
pub trait Extension {
    fn name(&self) -> &'static str;

    fn info(&self) -> ExtensionInfo;

    fn major_opcode(&self) -> u8 {
        self.info().major_opcode
    }

    fn first_event(&self) -> u8 {
        self.info().first_event
    }

    fn first_error(&self) -> u8 {
        self.info().first_error
    }

    fn decode_event(
        &self,
        _code: u8,
        _header: &EventHeader,
        _data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        Ok(None)
    }

    fn decode_generic_event(
        &self,
        _event_type: u16,
        _data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        Ok(None)
    }

    fn decode_error(&self, _code: u8) -> Option<ErrorKind> {
        None
    }

    /// Release anything held on behalf of the connection
    fn close(&mut self) {}
}

/// The extensions this client knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    GenericEvent,
    Shape,
    Shm,
    BigRequests,
    Sync,
    Xfixes,
    Randr,
    Present,
    Xinput,
    Dri3,
}

impl ExtensionKind {
    /// Order in which extensions are queried and registered
    pub const DISCOVERY_ORDER: [ExtensionKind; 10] = [
        ExtensionKind::GenericEvent,
        ExtensionKind::Shape,
        ExtensionKind::Shm,
        ExtensionKind::BigRequests,
        ExtensionKind::Sync,
        ExtensionKind::Xfixes,
        ExtensionKind::Randr,
        ExtensionKind::Present,
        ExtensionKind::Xinput,
        ExtensionKind::Dri3,
    ];

    /// Name passed to QueryExtension
    pub fn name(self) -> &'static str {
        match self {
            ExtensionKind::GenericEvent => ge::EXTENSION_NAME,
            ExtensionKind::Shape => shape::EXTENSION_NAME,
            ExtensionKind::Shm => shm::EXTENSION_NAME,
            ExtensionKind::BigRequests => bigreq::EXTENSION_NAME,
            ExtensionKind::Sync => sync::EXTENSION_NAME,
            ExtensionKind::Xfixes => xfixes::EXTENSION_NAME,
            ExtensionKind::Randr => randr::EXTENSION_NAME,
            ExtensionKind::Present => present::EXTENSION_NAME,
            ExtensionKind::Xinput => xinput::EXTENSION_NAME,
            ExtensionKind::Dri3 => dri3::EXTENSION_NAME,
        }
    }

    pub fn create(self, info: ExtensionInfo) -> Box<dyn Extension> {
        match self {
            ExtensionKind::GenericEvent => Box::new(ge::GenericEventExtension::new(info)),
            ExtensionKind::Shape => Box::new(shape::ShapeExtension::new(info)),
            ExtensionKind::Shm => Box::new(shm::ShmExtension::new(info)),
            ExtensionKind::BigRequests => Box::new(bigreq::BigRequestsExtension::new(info)),
            ExtensionKind::Sync => Box::new(sync::SyncExtension::new(info)),
            ExtensionKind::Xfixes => Box::new(xfixes::XfixesExtension::new(info)),
            ExtensionKind::Randr => Box::new(randr::RandrExtension::new(info)),
            ExtensionKind::Present => Box::new(present::PresentExtension::new(info)),
            ExtensionKind::Xinput => Box::new(xinput::XinputExtension::new(info)),
            ExtensionKind::Dri3 => Box::new(dri3::Dri3Extension::new(info)),
        }
    }
}

/// Registered extensions, scanned in registration order
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn Extension>>,
    versions: HashMap<&'static str, ExtensionVersion>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        ExtensionRegistry::default()
    }

    pub fn register(&mut self, extension: Box<dyn Extension>) {
        let info = extension.info();
        log::debug!(
            "Registered extension {} (opcode {}, first event {}, first error {})",
            extension.name(),
            info.major_opcode,
            info.first_event,
            info.first_error
        );
        self.extensions.push(extension);
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.extensions.iter().map(|e| e.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Extension> {
        self.extensions.iter().map(|e| e.as_ref())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&dyn Extension> {
        self.iter().find(|e| e.name() == name)
    }

    pub fn find_by_opcode(&self, major_opcode: u8) -> Option<&dyn Extension> {
        self.iter().find(|e| e.major_opcode() == major_opcode)
    }

    pub fn set_version(&mut self, name: &'static str, version: ExtensionVersion) {
        log::debug!("Extension {} version {}", name, version);
        self.versions.insert(name, version);
    }

    /// Version agreed with the server, if negotiation succeeded
    pub fn version(&self, name: &str) -> Option<ExtensionVersion> {
        self.versions.get(name).copied()
    }

    /// Map a raw error code onto the first extension that recognises it
    pub fn resolve_error(&self, code: u8) -> ErrorKind {
        self.iter()
            .filter(|e| code >= e.first_error())
            .find_map(|e| e.decode_error(code - e.first_error()))
            .unwrap_or(ErrorKind::Unknown)
    }

    /// Offer a fixed-size event to each extension whose range covers its code
    pub fn decode_event(
        &self,
        header: &EventHeader,
        data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        for extension in self.iter() {
            let first = extension.first_event();
            if header.code < first {
                continue;
            }
            if let Some(event) = extension.decode_event(header.code - first, header, data)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    pub fn decode_generic_event(
        &self,
        major_opcode: u8,
        event_type: u16,
        data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        for extension in self.iter().filter(|e| e.major_opcode() == major_opcode) {
            if let Some(event) = extension.decode_generic_event(event_type, data)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    /// Close every extension and forget them
    pub fn close(&mut self) {
        for extension in &mut self.extensions {
            extension.close();
        }
        self.extensions.clear();
        self.versions.clear();
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
