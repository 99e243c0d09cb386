//! X11 protocol error codes and error handling

use super::wire::WireError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Semantic error kinds, core codes first then those contributed by extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Request,
    Value,
    Window,
    Pixmap,
    Atom,
    Cursor,
    Font,
    Match,
    Drawable,
    Access,
    Alloc,
    Colormap,
    GContext,
    IDChoice,
    Name,
    Length,
    Implementation,
    ShmBadSegment,
    XfixesBadRegion,
    RandrBadOutput,
    RandrBadCrtc,
    RandrBadMode,
    RandrBadProvider,
    SyncCounter,
    SyncAlarm,
    InputDevice,
    InputEvent,
    InputMode,
    InputDeviceBusy,
    InputClass,
    /// Raw code claimed by neither the core protocol nor a registered extension
    Unknown,
}

impl ErrorKind {
    /// Map a core protocol error code
    pub fn from_core_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ErrorKind::Request),
            2 => Some(ErrorKind::Value),
            3 => Some(ErrorKind::Window),
            4 => Some(ErrorKind::Pixmap),
            5 => Some(ErrorKind::Atom),
            6 => Some(ErrorKind::Cursor),
            7 => Some(ErrorKind::Font),
            8 => Some(ErrorKind::Match),
            9 => Some(ErrorKind::Drawable),
            10 => Some(ErrorKind::Access),
            11 => Some(ErrorKind::Alloc),
            12 => Some(ErrorKind::Colormap),
            13 => Some(ErrorKind::GContext),
            14 => Some(ErrorKind::IDChoice),
            15 => Some(ErrorKind::Name),
            16 => Some(ErrorKind::Length),
            17 => Some(ErrorKind::Implementation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Request => "Request: bad request code",
            ErrorKind::Value => "Value: integer parameter out of range",
            ErrorKind::Window => "Window: invalid Window parameter",
            ErrorKind::Pixmap => "Pixmap: invalid Pixmap parameter",
            ErrorKind::Atom => "Atom: invalid Atom parameter",
            ErrorKind::Cursor => "Cursor: invalid Cursor parameter",
            ErrorKind::Font => "Font: invalid Font parameter",
            ErrorKind::Match => "Match: parameter mismatch",
            ErrorKind::Drawable => "Drawable: invalid Drawable parameter",
            ErrorKind::Access => "Access: attempt to access private resource",
            ErrorKind::Alloc => "Alloc: insufficient resources",
            ErrorKind::Colormap => "Colormap: invalid Colormap parameter",
            ErrorKind::GContext => "GContext: invalid GC parameter",
            ErrorKind::IDChoice => "IDChoice: invalid resource ID for this connection",
            ErrorKind::Name => "Name: font or color name doesn't exist",
            ErrorKind::Length => "Length: request length incorrect",
            ErrorKind::Implementation => "Implementation: server implementation error",
            ErrorKind::ShmBadSegment => "BadShmSeg: invalid shared memory segment",
            ErrorKind::XfixesBadRegion => "BadRegion: invalid region",
            ErrorKind::RandrBadOutput => "BadOutput: invalid output",
            ErrorKind::RandrBadCrtc => "BadCrtc: invalid CRTC",
            ErrorKind::RandrBadMode => "BadMode: invalid mode",
            ErrorKind::RandrBadProvider => "BadProvider: invalid provider",
            ErrorKind::SyncCounter => "Counter: invalid counter",
            ErrorKind::SyncAlarm => "Alarm: invalid alarm",
            ErrorKind::InputDevice => "Device: invalid input device",
            ErrorKind::InputEvent => "Event: invalid input event",
            ErrorKind::InputMode => "Mode: invalid input mode",
            ErrorKind::InputDeviceBusy => "DeviceBusy: input device is busy",
            ErrorKind::InputClass => "Class: invalid input class",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded 32-byte error message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X11Error {
    pub kind: ErrorKind,
    /// Code as received, before extension offsets were removed
    pub code: u8,
    pub sequence: u16,
    pub bad_value: u32,
    pub minor_opcode: u16,
    pub major_opcode: u8,
}

impl X11Error {
    /// Error messages always occupy this many bytes
    pub const LENGTH: usize = 32;

    pub fn new(
        kind: ErrorKind,
        code: u8,
        sequence: u16,
        bad_value: u32,
        minor_opcode: u16,
        major_opcode: u8,
    ) -> Self {
        X11Error {
            kind,
            code,
            sequence,
            bad_value,
            minor_opcode,
            major_opcode,
        }
    }
}

impl fmt::Display for X11Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X11 Error: {} (code: {}, sequence: {}, value: 0x{:08x}, major: {}, minor: {})",
            self.kind, self.code, self.sequence, self.bad_value, self.major_opcode, self.minor_opcode
        )
    }
}

impl std::error::Error for X11Error {}

/// Everything a client operation or reply callback can fail with
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to X server: {0}")]
    Connection(String),
    #[error(transparent)]
    Protocol(#[from] X11Error),
    #[error("truncated message: {0}")]
    Truncated(#[from] WireError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("request of {length} units exceeds the maximum of {maximum}")]
    RequestTooLarge { length: usize, maximum: u32 },
    #[error("request payload of {0} bytes is not 4-byte aligned")]
    UnalignedRequest(usize),
    #[error("extension {0} is not available on this server")]
    ExtensionMissing(&'static str),
    #[error("connection is closed")]
    Closed,
    #[error("connection setup has not completed")]
    NotReady,
    #[error("reply did not carry the expected file descriptor")]
    MissingFd,
    #[error("{field} of length {length} exceeds the protocol limit of {maximum}")]
    TooLong {
        field: &'static str,
        length: usize,
        maximum: usize,
    },
}

impl ClientError {
    /// The protocol error, when this failure came from the server
    pub fn protocol_error(&self) -> Option<&X11Error> {
        match self {
            ClientError::Protocol(error) => Some(error),
            _ => None,
        }
    }
}

/// Check that a count fits the wire field that carries it
pub fn wire_length<T: LengthField>(field: &'static str, length: usize) -> Result<T, ClientError> {
    T::try_from(length).map_err(|_| ClientError::TooLong {
        field,
        length,
        maximum: T::MAX_LENGTH,
    })
}

/// Unsigned wire field types a length can be carried in
pub trait LengthField: TryFrom<usize> {
    const MAX_LENGTH: usize;
}

impl LengthField for u8 {
    const MAX_LENGTH: usize = u8::MAX as usize;
}

impl LengthField for u16 {
    const MAX_LENGTH: usize = u16::MAX as usize;
}

impl LengthField for u32 {
    const MAX_LENGTH: usize = u32::MAX as usize;
}

/// Result type for client operations
pub type X11Result<T> = Result<T, ClientError>;
