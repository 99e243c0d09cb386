//! X11 protocol events
//!
//! Events are sent from the server to clients to notify them of state changes,
//! user input, and other interesting occurrences. Core events are decoded here;
//! extension events are decoded by their extension and land in the same enum.

use super::types::*;
use super::wire::{WireError, WireReader};

/// Core event type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventType {
    KeyPress = 2,
    KeyRelease = 3,
    ButtonPress = 4,
    ButtonRelease = 5,
    MotionNotify = 6,
    EnterNotify = 7,
    LeaveNotify = 8,
    FocusIn = 9,
    FocusOut = 10,
    Expose = 12,
    NoExposure = 14,
    MapNotify = 19,
    ReparentNotify = 21,
    ConfigureNotify = 22,
    PropertyNotify = 28,
    ClientMessage = 33,
    /// Variable length extension event
    GenericEvent = 35,
}

impl EventType {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            2 => Some(EventType::KeyPress),
            3 => Some(EventType::KeyRelease),
            4 => Some(EventType::ButtonPress),
            5 => Some(EventType::ButtonRelease),
            6 => Some(EventType::MotionNotify),
            7 => Some(EventType::EnterNotify),
            8 => Some(EventType::LeaveNotify),
            9 => Some(EventType::FocusIn),
            10 => Some(EventType::FocusOut),
            12 => Some(EventType::Expose),
            14 => Some(EventType::NoExposure),
            19 => Some(EventType::MapNotify),
            21 => Some(EventType::ReparentNotify),
            22 => Some(EventType::ConfigureNotify),
            28 => Some(EventType::PropertyNotify),
            33 => Some(EventType::ClientMessage),
            35 => Some(EventType::GenericEvent),
            _ => None,
        }
    }
}

/// The first four bytes of a fixed-size event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHeader {
    /// Event code with the send-event bit stripped
    pub code: u8,
    pub from_send_event: bool,
    pub data0: u8,
    pub sequence: u16,
}

impl EventHeader {
    pub fn parse(event: &[u8; 32]) -> Self {
        EventHeader {
            code: event[0] & 0x7f,
            from_send_event: event[0] & 0x80 != 0,
            data0: event[1],
            sequence: u16::from_le_bytes([event[2], event[3]]),
        }
    }
}

/// A decoded event, from the core protocol or any registered extension
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    KeyPress(KeyPressEvent),
    KeyRelease(KeyReleaseEvent),
    ButtonPress(ButtonPressEvent),
    ButtonRelease(ButtonReleaseEvent),
    MotionNotify(MotionNotifyEvent),
    EnterNotify(CrossingEvent),
    LeaveNotify(CrossingEvent),
    FocusIn(FocusEvent),
    FocusOut(FocusEvent),
    Expose(ExposeEvent),
    NoExposure(NoExposureEvent),
    MapNotify(MapNotifyEvent),
    ReparentNotify(ReparentNotifyEvent),
    ConfigureNotify(ConfigureNotifyEvent),
    PropertyNotify(PropertyNotifyEvent),
    ClientMessage(ClientMessageEvent),
    ShapeNotify(ShapeNotifyEvent),
    ShmCompletion(ShmCompletionEvent),
    SyncCounterNotify(SyncCounterNotifyEvent),
    SyncAlarmNotify(SyncAlarmNotifyEvent),
    XfixesSelectionNotify(XfixesSelectionNotifyEvent),
    XfixesCursorNotify(XfixesCursorNotifyEvent),
    PresentConfigureNotify(PresentConfigureNotifyEvent),
    PresentCompleteNotify(PresentCompleteNotifyEvent),
    PresentIdleNotify(PresentIdleNotifyEvent),
    InputKeyPress(InputDeviceEvent),
    InputKeyRelease(InputDeviceEvent),
    InputButtonPress(InputDeviceEvent),
    InputButtonRelease(InputDeviceEvent),
    InputMotion(InputDeviceEvent),
    InputEnter(InputCrossingEvent),
    InputLeave(InputCrossingEvent),
    InputFocusIn(InputCrossingEvent),
    InputFocusOut(InputCrossingEvent),
}

// Key, button and motion events share a common structure
macro_rules! define_key_button_event {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub detail: u8, // Keycode, button or motion hint
            pub sequence: u16,
            pub time: Timestamp,
            pub root: Window,
            pub event: Window,
            pub child: Window,
            pub root_x: i16,
            pub root_y: i16,
            pub event_x: i16,
            pub event_y: i16,
            pub state: u16, // Modifier mask
            pub same_screen: bool,
        }

        impl $name {
            pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
                Ok($name {
                    detail: header.data0,
                    sequence: header.sequence,
                    time: Timestamp(r.card32()?),
                    root: Window::new(r.card32()?),
                    event: Window::new(r.card32()?),
                    child: Window::new(r.card32()?),
                    root_x: r.int16()?,
                    root_y: r.int16()?,
                    event_x: r.int16()?,
                    event_y: r.int16()?,
                    state: r.card16()?,
                    same_screen: r.bool()?,
                })
            }
        }
    };
}

define_key_button_event!(KeyPressEvent);
define_key_button_event!(KeyReleaseEvent);
define_key_button_event!(ButtonPressEvent);
define_key_button_event!(ButtonReleaseEvent);
define_key_button_event!(MotionNotifyEvent);

/// EnterNotify / LeaveNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingEvent {
    pub detail: u8,
    pub sequence: u16,
    pub time: Timestamp,
    pub root: Window,
    pub event: Window,
    pub child: Window,
    pub root_x: i16,
    pub root_y: i16,
    pub event_x: i16,
    pub event_y: i16,
    pub state: u16,
    pub mode: u8,
    pub same_screen_focus: u8,
}

impl CrossingEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(CrossingEvent {
            detail: header.data0,
            sequence: header.sequence,
            time: Timestamp(r.card32()?),
            root: Window::new(r.card32()?),
            event: Window::new(r.card32()?),
            child: Window::new(r.card32()?),
            root_x: r.int16()?,
            root_y: r.int16()?,
            event_x: r.int16()?,
            event_y: r.int16()?,
            state: r.card16()?,
            mode: r.card8()?,
            same_screen_focus: r.card8()?,
        })
    }
}

/// FocusIn / FocusOut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEvent {
    pub detail: u8,
    pub sequence: u16,
    pub event: Window,
    pub mode: u8,
}

impl FocusEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(FocusEvent {
            detail: header.data0,
            sequence: header.sequence,
            event: Window::new(r.card32()?),
            mode: r.card8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeEvent {
    pub sequence: u16,
    pub window: Window,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub count: u16,
}

impl ExposeEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(ExposeEvent {
            sequence: header.sequence,
            window: Window::new(r.card32()?),
            x: r.card16()?,
            y: r.card16()?,
            width: r.card16()?,
            height: r.card16()?,
            count: r.card16()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoExposureEvent {
    pub sequence: u16,
    pub drawable: XID,
    pub minor_opcode: u16,
    pub major_opcode: u8,
}

impl NoExposureEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(NoExposureEvent {
            sequence: header.sequence,
            drawable: XID(r.card32()?),
            minor_opcode: r.card16()?,
            major_opcode: r.card8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapNotifyEvent {
    pub sequence: u16,
    pub event: Window,
    pub window: Window,
    pub override_redirect: bool,
}

impl MapNotifyEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(MapNotifyEvent {
            sequence: header.sequence,
            event: Window::new(r.card32()?),
            window: Window::new(r.card32()?),
            override_redirect: r.bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparentNotifyEvent {
    pub sequence: u16,
    pub event: Window,
    pub window: Window,
    pub parent: Window,
    pub x: i16,
    pub y: i16,
    pub override_redirect: bool,
}

impl ReparentNotifyEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(ReparentNotifyEvent {
            sequence: header.sequence,
            event: Window::new(r.card32()?),
            window: Window::new(r.card32()?),
            parent: Window::new(r.card32()?),
            x: r.int16()?,
            y: r.int16()?,
            override_redirect: r.bool()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureNotifyEvent {
    pub sequence: u16,
    pub event: Window,
    pub window: Window,
    pub above_sibling: Window,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub override_redirect: bool,
}

impl ConfigureNotifyEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(ConfigureNotifyEvent {
            sequence: header.sequence,
            event: Window::new(r.card32()?),
            window: Window::new(r.card32()?),
            above_sibling: Window::new(r.card32()?),
            x: r.int16()?,
            y: r.int16()?,
            width: r.card16()?,
            height: r.card16()?,
            border_width: r.card16()?,
            override_redirect: r.bool()?,
        })
    }
}

/// PropertyNotify state values
pub const PROPERTY_NEW_VALUE: u8 = 0;
pub const PROPERTY_DELETE: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNotifyEvent {
    pub sequence: u16,
    pub window: Window,
    pub atom: Atom,
    pub time: Timestamp,
    pub state: u8,
}

impl PropertyNotifyEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        Ok(PropertyNotifyEvent {
            sequence: header.sequence,
            window: Window::new(r.card32()?),
            atom: Atom(r.card32()?),
            time: Timestamp(r.card32()?),
            state: r.card8()?,
        })
    }
}

/// ClientMessage payload, shaped by the format byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessageData {
    Data8([u8; 20]),
    Data16([u16; 10]),
    Data32([u32; 5]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessageEvent {
    pub sequence: u16,
    pub window: Window,
    pub message_type: Atom,
    pub data: ClientMessageData,
}

impl ClientMessageEvent {
    pub fn decode(header: &EventHeader, r: &mut WireReader) -> Result<Self, WireError> {
        let window = Window::new(r.card32()?);
        let message_type = Atom(r.card32()?);
        let data = match header.data0 {
            16 => {
                let mut values = [0u16; 10];
                for value in values.iter_mut() {
                    *value = r.card16()?;
                }
                ClientMessageData::Data16(values)
            }
            32 => {
                let mut values = [0u32; 5];
                for value in values.iter_mut() {
                    *value = r.card32()?;
                }
                ClientMessageData::Data32(values)
            }
            _ => {
                let mut values = [0u8; 20];
                values.copy_from_slice(r.bytes(20)?);
                ClientMessageData::Data8(values)
            }
        };
        Ok(ClientMessageEvent {
            sequence: header.sequence,
            window,
            message_type,
            data,
        })
    }
}

/// Decode a core event; `None` for codes the core decoder does not own
pub fn decode_core_event(header: &EventHeader, data: &[u8]) -> Result<Option<Event>, WireError> {
    let mut r = WireReader::new(data);
    let r = &mut r;
    let event = match EventType::from_u8(header.code) {
        Some(EventType::KeyPress) => Event::KeyPress(KeyPressEvent::decode(header, r)?),
        Some(EventType::KeyRelease) => Event::KeyRelease(KeyReleaseEvent::decode(header, r)?),
        Some(EventType::ButtonPress) => Event::ButtonPress(ButtonPressEvent::decode(header, r)?),
        Some(EventType::ButtonRelease) => {
            Event::ButtonRelease(ButtonReleaseEvent::decode(header, r)?)
        }
        Some(EventType::MotionNotify) => Event::MotionNotify(MotionNotifyEvent::decode(header, r)?),
        Some(EventType::EnterNotify) => Event::EnterNotify(CrossingEvent::decode(header, r)?),
        Some(EventType::LeaveNotify) => Event::LeaveNotify(CrossingEvent::decode(header, r)?),
        Some(EventType::FocusIn) => Event::FocusIn(FocusEvent::decode(header, r)?),
        Some(EventType::FocusOut) => Event::FocusOut(FocusEvent::decode(header, r)?),
        Some(EventType::Expose) => Event::Expose(ExposeEvent::decode(header, r)?),
        Some(EventType::NoExposure) => Event::NoExposure(NoExposureEvent::decode(header, r)?),
        Some(EventType::MapNotify) => Event::MapNotify(MapNotifyEvent::decode(header, r)?),
        Some(EventType::ReparentNotify) => {
            Event::ReparentNotify(ReparentNotifyEvent::decode(header, r)?)
        }
        Some(EventType::ConfigureNotify) => {
            Event::ConfigureNotify(ConfigureNotifyEvent::decode(header, r)?)
        }
        Some(EventType::PropertyNotify) => {
            Event::PropertyNotify(PropertyNotifyEvent::decode(header, r)?)
        }
        Some(EventType::ClientMessage) => {
            Event::ClientMessage(ClientMessageEvent::decode(header, r)?)
        }
        Some(EventType::GenericEvent) | None => return Ok(None),
    };
    Ok(Some(event))
}

/// SHAPE ShapeNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeNotifyEvent {
    pub kind: u8,
    pub window: Window,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub time: Timestamp,
    pub shaped: bool,
}

/// MIT-SHM Completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShmCompletionEvent {
    pub drawable: XID,
    pub minor_event: u16,
    pub major_event: u8,
    pub shmseg: ShmSeg,
    pub offset: u32,
}

/// SYNC CounterNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCounterNotifyEvent {
    pub kind: u8,
    pub counter: Counter,
    pub wait_value: i64,
    pub counter_value: i64,
    pub time: Timestamp,
    pub count: u16,
    pub destroyed: bool,
}

/// SYNC AlarmNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAlarmNotifyEvent {
    pub kind: u8,
    pub alarm: Alarm,
    pub counter_value: i64,
    pub alarm_value: i64,
    pub time: Timestamp,
    pub state: u8,
}

/// XFIXES SelectionNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XfixesSelectionNotifyEvent {
    pub subtype: u8,
    pub window: Window,
    pub owner: Window,
    pub selection: Atom,
    pub time: Timestamp,
    pub selection_time: Timestamp,
}

/// XFIXES CursorNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XfixesCursorNotifyEvent {
    pub subtype: u8,
    pub window: Window,
    pub cursor_serial: u32,
    pub time: Timestamp,
    pub name: Atom,
}

/// Present ConfigureNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentConfigureNotifyEvent {
    pub event_id: u32,
    pub window: Window,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub off_x: i16,
    pub off_y: i16,
    pub pixmap_width: u16,
    pub pixmap_height: u16,
    pub pixmap_flags: u32,
}

/// Present CompleteNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentCompleteNotifyEvent {
    pub kind: u8,
    pub mode: u8,
    pub event_id: u32,
    pub window: Window,
    pub serial: u32,
    pub ust: u64,
    pub msc: u64,
}

/// Present IdleNotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentIdleNotifyEvent {
    pub event_id: u32,
    pub window: Window,
    pub serial: u32,
    pub pixmap: Pixmap,
    pub idle_fence: Fence,
}

/// XInput2 modifier or group state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputModifierState {
    pub base: u32,
    pub latched: u32,
    pub locked: u32,
    pub effective: u32,
}

/// XInput2 key, button and motion events
#[derive(Debug, Clone, PartialEq)]
pub struct InputDeviceEvent {
    pub device_id: u16,
    pub time: Timestamp,
    pub detail: u32,
    pub root: Window,
    pub event: Window,
    pub child: Window,
    pub root_x: f64,
    pub root_y: f64,
    pub event_x: f64,
    pub event_y: f64,
    pub source_id: u16,
    pub flags: u32,
    pub mods: InputModifierState,
    pub group: InputModifierState,
    pub button_mask: Vec<u32>,
    pub valuator_mask: Vec<u32>,
}

/// XInput2 enter, leave and focus events
#[derive(Debug, Clone, PartialEq)]
pub struct InputCrossingEvent {
    pub device_id: u16,
    pub time: Timestamp,
    pub source_id: u16,
    pub mode: u8,
    pub detail: u8,
    pub root: Window,
    pub event: Window,
    pub child: Window,
    pub root_x: f64,
    pub root_y: f64,
    pub event_x: f64,
    pub event_y: f64,
    pub same_screen: bool,
    pub focus: bool,
    pub mods: InputModifierState,
    pub group: InputModifierState,
    pub buttons: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_event(code: u8, data0: u8, body: &[u8]) -> [u8; 32] {
        let mut event = [0u8; 32];
        event[0] = code;
        event[1] = data0;
        event[2..4].copy_from_slice(&7u16.to_le_bytes());
        event[4..4 + body.len()].copy_from_slice(body);
        event
    }

    #[test]
    fn test_header_send_event_bit() {
        let event = raw_event(0x80 | 12, 0, &[]);
        let header = EventHeader::parse(&event);
        assert_eq!(header.code, 12);
        assert!(header.from_send_event);
        assert_eq!(header.sequence, 7);
    }

    #[test]
    fn test_decode_expose() {
        let mut body = Vec::new();
        body.extend_from_slice(&0x00400001u32.to_le_bytes());
        for v in [10u16, 20, 300, 200, 2] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        let event = raw_event(12, 0, &body);
        let header = EventHeader::parse(&event);
        match decode_core_event(&header, &event[4..]).unwrap() {
            Some(Event::Expose(e)) => {
                assert_eq!(e.window, Window::new(0x00400001));
                assert_eq!((e.x, e.y, e.width, e.height, e.count), (10, 20, 300, 200, 2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_client_message_format32() {
        let mut body = Vec::new();
        body.extend_from_slice(&5u32.to_le_bytes());
        body.extend_from_slice(&300u32.to_le_bytes());
        for v in [1u32, 2, 3, 4, 5] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        let event = raw_event(33, 32, &body);
        let header = EventHeader::parse(&event);
        match decode_core_event(&header, &event[4..]).unwrap() {
            Some(Event::ClientMessage(e)) => {
                assert_eq!(e.message_type, Atom(300));
                assert_eq!(e.data, ClientMessageData::Data32([1, 2, 3, 4, 5]));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unowned_code() {
        let event = raw_event(64, 0, &[]);
        let header = EventHeader::parse(&event);
        assert_eq!(decode_core_event(&header, &event[4..]).unwrap(), None);
    }
}
