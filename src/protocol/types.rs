//! Core X11 protocol types
//!
//! These types represent the fundamental data types used in the X11 protocol.
//! Resource handles are thin newtypes over the 32-bit wire value.

use std::fmt;

/// X11 resource ID - used for windows, pixmaps, graphics contexts, etc.
/// Clients allocate these from the base/mask range handed out at setup.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct XID(pub u32);

impl XID {
    pub const NONE: XID = XID(0);

    pub fn new(id: u32) -> Self {
        XID(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for XID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

// Every resource kind shares the same shape
macro_rules! define_resource {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub XID);

        impl $name {
            pub const NONE: $name = $name(XID::NONE);

            pub fn new(id: u32) -> Self {
                $name(XID::new(id))
            }

            pub fn id(&self) -> XID {
                self.0
            }
        }

        impl From<XID> for $name {
            fn from(id: XID) -> Self {
                $name(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_resource!(
    /// Window ID
    Window
);
define_resource!(
    /// Pixmap ID
    Pixmap
);
define_resource!(
    /// Graphics Context ID
    GContext
);
define_resource!(
    /// Colormap ID
    Colormap
);
define_resource!(
    /// Cursor ID
    Cursor
);
define_resource!(
    /// XFIXES region
    Region
);
define_resource!(
    /// MIT-SHM segment attached to the server
    ShmSeg
);
define_resource!(
    /// SYNC counter
    Counter
);
define_resource!(
    /// SYNC fence
    Fence
);
define_resource!(
    /// SYNC alarm
    Alarm
);

/// Drawable - can be either a Window or Pixmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drawable {
    Window(Window),
    Pixmap(Pixmap),
}

impl Drawable {
    pub fn id(&self) -> XID {
        match self {
            Drawable::Window(w) => w.id(),
            Drawable::Pixmap(p) => p.id(),
        }
    }
}

impl From<Window> for Drawable {
    fn from(window: Window) -> Self {
        Drawable::Window(window)
    }
}

impl From<Pixmap> for Drawable {
    fn from(pixmap: Pixmap) -> Self {
        Drawable::Pixmap(pixmap)
    }
}

/// Atom - interned string identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Atom(pub u32);

impl Atom {
    pub const NONE: Atom = Atom(0);
    pub const PRIMARY: Atom = Atom(1);
    pub const SECONDARY: Atom = Atom(2);
    pub const ATOM: Atom = Atom(4);
    pub const CARDINAL: Atom = Atom(6);
    pub const INTEGER: Atom = Atom(19);
    pub const STRING: Atom = Atom(31);
    pub const WINDOW: Atom = Atom(33);
    pub const WM_COMMAND: Atom = Atom(34);
    pub const WM_HINTS: Atom = Atom(35);
    pub const WM_CLIENT_MACHINE: Atom = Atom(36);
    pub const WM_ICON_NAME: Atom = Atom(37);
    pub const WM_NAME: Atom = Atom(39);
    pub const WM_NORMAL_HINTS: Atom = Atom(40);
    pub const WM_CLASS: Atom = Atom(67);
    pub const WM_TRANSIENT_FOR: Atom = Atom(68);

    pub fn new(id: u32) -> Self {
        Atom(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Visual ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VisualID(pub u32);

impl VisualID {
    /// Inherit the parent's visual
    pub const COPY_FROM_PARENT: VisualID = VisualID(0);

    pub fn new(id: u32) -> Self {
        VisualID(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Timestamp (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(pub u32);

impl Timestamp {
    pub const CURRENT_TIME: Timestamp = Timestamp(0);

    pub fn new(ms: u32) -> Self {
        Timestamp(ms)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Point (x, y coordinate)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn new(x: i16, y: i16) -> Self {
        Point { x, y }
    }
}

/// Rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rectangle {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }
}

/// Window class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    CopyFromParent = 0,
    InputOutput = 1,
    InputOnly = 2,
}

impl WindowClass {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(WindowClass::CopyFromParent),
            1 => Some(WindowClass::InputOutput),
            2 => Some(WindowClass::InputOnly),
            _ => None,
        }
    }
}

/// Map state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Unmapped = 0,
    Unviewable = 1,
    Viewable = 2,
}

impl MapState {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MapState::Unmapped),
            1 => Some(MapState::Unviewable),
            2 => Some(MapState::Viewable),
            _ => None,
        }
    }
}

/// ChangeProperty mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyMode {
    Replace = 0,
    Prepend = 1,
    Append = 2,
}

/// Image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Bitmap = 0,
    XYPixmap = 1,
    ZPixmap = 2,
}

/// Byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LSBFirst = 0,
    MSBFirst = 1,
}

impl ByteOrder {
    pub fn from_u8(value: u8) -> Self {
        if value == 0 {
            ByteOrder::LSBFirst
        } else {
            ByteOrder::MSBFirst
        }
    }
}

/// Event masks
pub mod event_mask {
    pub const NO_EVENT: u32 = 0;
    pub const KEY_PRESS: u32 = 1 << 0;
    pub const KEY_RELEASE: u32 = 1 << 1;
    pub const BUTTON_PRESS: u32 = 1 << 2;
    pub const BUTTON_RELEASE: u32 = 1 << 3;
    pub const ENTER_WINDOW: u32 = 1 << 4;
    pub const LEAVE_WINDOW: u32 = 1 << 5;
    pub const POINTER_MOTION: u32 = 1 << 6;
    pub const BUTTON_MOTION: u32 = 1 << 13;
    pub const EXPOSURE: u32 = 1 << 15;
    pub const VISIBILITY_CHANGE: u32 = 1 << 16;
    pub const STRUCTURE_NOTIFY: u32 = 1 << 17;
    pub const SUBSTRUCTURE_NOTIFY: u32 = 1 << 19;
    pub const FOCUS_CHANGE: u32 = 1 << 21;
    pub const PROPERTY_CHANGE: u32 = 1 << 22;
}

/// Keyboard/pointer modifier masks
pub mod modifier_mask {
    pub const SHIFT: u16 = 1 << 0;
    pub const LOCK: u16 = 1 << 1;
    pub const CONTROL: u16 = 1 << 2;
    pub const MOD1: u16 = 1 << 3;
    pub const MOD4: u16 = 1 << 6;
    pub const BUTTON1: u16 = 1 << 8;
    pub const BUTTON2: u16 = 1 << 9;
    pub const BUTTON3: u16 = 1 << 10;
}
