//! XInput2: per-device input events
//!
//! XI2 events arrive as generic events. Coordinates are 16.16 fixed point and
//! button and valuator state follow the fixed part as variable-length masks.

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;

pub const EXTENSION_NAME: &str = "XInputExtension";

pub mod opcode {
    pub const XI_SELECT_EVENTS: u8 = 46;
    pub const XI_QUERY_VERSION: u8 = 47;
    pub const XI_QUERY_DEVICE: u8 = 48;
    pub const XI_SET_FOCUS: u8 = 49;
    pub const XI_GET_FOCUS: u8 = 50;
    pub const XI_GRAB_DEVICE: u8 = 51;
    pub const XI_UNGRAB_DEVICE: u8 = 52;
}

pub const KEY_PRESS_EVENT: u16 = 2;
pub const KEY_RELEASE_EVENT: u16 = 3;
pub const BUTTON_PRESS_EVENT: u16 = 4;
pub const BUTTON_RELEASE_EVENT: u16 = 5;
pub const MOTION_EVENT: u16 = 6;
pub const ENTER_EVENT: u16 = 7;
pub const LEAVE_EVENT: u16 = 8;
pub const FOCUS_IN_EVENT: u16 = 9;
pub const FOCUS_OUT_EVENT: u16 = 10;

/// Pseudo device ids for XISelectEvents
pub const ALL_DEVICES: u16 = 0;
pub const ALL_MASTER_DEVICES: u16 = 1;

/// Device use, as reported by XIQueryDevice
pub mod device_type {
    pub const MASTER_POINTER: u16 = 1;
    pub const MASTER_KEYBOARD: u16 = 2;
    pub const SLAVE_POINTER: u16 = 3;
    pub const SLAVE_KEYBOARD: u16 = 4;
    pub const FLOATING_SLAVE: u16 = 5;
}

pub mod grab_mode {
    pub const SYNC: u8 = 0;
    pub const ASYNC: u8 = 1;
}

/// Events to select for one device.
///
/// The mask is a little-endian bit array; it grows by whole words as event
/// types past 31 are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMask {
    pub device_id: u16,
    pub mask: Vec<u32>,
}

impl EventMask {
    pub fn new(device_id: u16) -> Self {
        EventMask {
            device_id,
            mask: Vec::new(),
        }
    }

    pub fn select(mut self, event_type: u16) -> Self {
        let word = event_type as usize / 32;
        if self.mask.len() <= word {
            self.mask.resize(word + 1, 0);
        }
        self.mask[word] |= 1 << (event_type % 32);
        self
    }

    pub fn is_selected(&self, event_type: u16) -> bool {
        self.mask
            .get(event_type as usize / 32)
            .is_some_and(|word| word & (1 << (event_type % 32)) != 0)
    }
}

/// A valuator axis of an input device
#[derive(Debug, Clone, PartialEq)]
pub struct ValuatorClass {
    pub source_id: u16,
    pub number: u16,
    pub label: Atom,
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub resolution: u32,
    pub mode: u8,
}

/// One input class of a device. Only valuators are decoded; the others keep
/// their raw body.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceClass {
    Valuator(ValuatorClass),
    Other {
        class_type: u16,
        source_id: u16,
        data: Vec<u8>,
    },
}

pub const VALUATOR_CLASS: u16 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub device_id: u16,
    pub device_type: u16,
    pub attachment: u16,
    pub enabled: bool,
    pub name: String,
    pub classes: Vec<DeviceClass>,
}

fn decode_device_class(r: &mut WireReader) -> Result<DeviceClass, WireError> {
    let class_type = r.card16()?;
    // Length in 4-byte units, header included
    let length = r.card16()? as usize;
    let source_id = r.card16()?;
    let body = r.bytes((length * 4).saturating_sub(6))?;
    if class_type != VALUATOR_CLASS {
        return Ok(DeviceClass::Other {
            class_type,
            source_id,
            data: body.to_vec(),
        });
    }
    let mut r = WireReader::new(body);
    Ok(DeviceClass::Valuator(ValuatorClass {
        source_id,
        number: r.card16()?,
        label: Atom(r.card32()?),
        min: r.fp3232()?,
        max: r.fp3232()?,
        value: r.fp3232()?,
        resolution: r.card32()?,
        mode: r.card8()?,
    }))
}

fn decode_device_info(r: &mut WireReader) -> Result<DeviceInfo, WireError> {
    let device_id = r.card16()?;
    let device_type = r.card16()?;
    let attachment = r.card16()?;
    let class_count = r.card16()?;
    let name_len = r.card16()? as usize;
    let enabled = r.bool()?;
    r.padding(1)?;
    let name = r.string8(name_len)?;
    r.padding((4 - name_len % 4) % 4)?;
    let classes = (0..class_count)
        .map(|_| decode_device_class(r))
        .collect::<Result<_, _>>()?;
    Ok(DeviceInfo {
        device_id,
        device_type,
        attachment,
        enabled,
        name,
        classes,
    })
}

#[derive(Debug, Clone)]
pub struct XinputExtension {
    info: ExtensionInfo,
}

impl XinputExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        XinputExtension { info }
    }
}

fn modifier_state(r: &mut WireReader) -> Result<InputModifierState, WireError> {
    Ok(InputModifierState {
        base: r.card32()?,
        latched: r.card32()?,
        locked: r.card32()?,
        effective: r.card32()?,
    })
}

fn group_state(r: &mut WireReader) -> Result<InputModifierState, WireError> {
    Ok(InputModifierState {
        base: r.card8()? as u32,
        latched: r.card8()? as u32,
        locked: r.card8()? as u32,
        effective: r.card8()? as u32,
    })
}

fn decode_device_event(r: &mut WireReader) -> Result<InputDeviceEvent, WireError> {
    let device_id = r.card16()?;
    let time = Timestamp(r.card32()?);
    let detail = r.card32()?;
    let root = Window::new(r.card32()?);
    let event = Window::new(r.card32()?);
    let child = Window::new(r.card32()?);
    let root_x = r.fp1616()?;
    let root_y = r.fp1616()?;
    let event_x = r.fp1616()?;
    let event_y = r.fp1616()?;
    let buttons_len = r.card16()? as usize;
    let valuators_len = r.card16()? as usize;
    let source_id = r.card16()?;
    r.padding(2)?;
    let flags = r.card32()?;
    let mods = modifier_state(r)?;
    let group = group_state(r)?;
    Ok(InputDeviceEvent {
        device_id,
        time,
        detail,
        root,
        event,
        child,
        root_x,
        root_y,
        event_x,
        event_y,
        source_id,
        flags,
        mods,
        group,
        button_mask: r.card32_list(buttons_len)?,
        valuator_mask: r.card32_list(valuators_len)?,
    })
}

fn decode_crossing_event(r: &mut WireReader) -> Result<InputCrossingEvent, WireError> {
    let device_id = r.card16()?;
    let time = Timestamp(r.card32()?);
    let source_id = r.card16()?;
    let mode = r.card8()?;
    let detail = r.card8()?;
    let root = Window::new(r.card32()?);
    let event = Window::new(r.card32()?);
    let child = Window::new(r.card32()?);
    let root_x = r.fp1616()?;
    let root_y = r.fp1616()?;
    let event_x = r.fp1616()?;
    let event_y = r.fp1616()?;
    let same_screen = r.bool()?;
    let focus = r.bool()?;
    let buttons_len = r.card16()? as usize;
    let mods = modifier_state(r)?;
    let group = group_state(r)?;
    Ok(InputCrossingEvent {
        device_id,
        time,
        source_id,
        mode,
        detail,
        root,
        event,
        child,
        root_x,
        root_y,
        event_x,
        event_y,
        same_screen,
        focus,
        mods,
        group,
        buttons: r.card32_list(buttons_len)?,
    })
}

impl Extension for XinputExtension {
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
        let r = &mut r;
        let event = match event_type {
            KEY_PRESS_EVENT => Event::InputKeyPress(decode_device_event(r)?),
            KEY_RELEASE_EVENT => Event::InputKeyRelease(decode_device_event(r)?),
            BUTTON_PRESS_EVENT => Event::InputButtonPress(decode_device_event(r)?),
            BUTTON_RELEASE_EVENT => Event::InputButtonRelease(decode_device_event(r)?),
            MOTION_EVENT => Event::InputMotion(decode_device_event(r)?),
            ENTER_EVENT => Event::InputEnter(decode_crossing_event(r)?),
            LEAVE_EVENT => Event::InputLeave(decode_crossing_event(r)?),
            FOCUS_IN_EVENT => Event::InputFocusIn(decode_crossing_event(r)?),
            FOCUS_OUT_EVENT => Event::InputFocusOut(decode_crossing_event(r)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    fn decode_error(&self, code: u8) -> Option<ErrorKind> {
        match code {
            0 => Some(ErrorKind::InputDevice),
            1 => Some(ErrorKind::InputEvent),
            2 => Some(ErrorKind::InputMode),
            3 => Some(ErrorKind::InputDeviceBusy),
            4 => Some(ErrorKind::InputClass),
            _ => None,
        }
    }
}

impl Client {
    /// Announce the XI2 version this client speaks. The server will not send
    /// XI2 events before this.
    pub fn xi_query_version<F>(&mut self, major: u16, minor: u16, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<ExtensionVersion>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card16(major).card16(minor);
        self.send_request_with_reply(
            major_opcode,
            opcode::XI_QUERY_VERSION,
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

    pub fn xi_select_events(&mut self, window: Window, masks: &[EventMask]) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let count: u16 = wire_length("event mask list", masks.len())?;
        let mut w = WireWriter::new();
        w.card32(window.id().get()).card16(count).padding(2);
        for mask in masks {
            let words: u16 = wire_length("event mask", mask.mask.len())?;
            w.card16(mask.device_id).card16(words);
            for &word in &mask.mask {
                w.card32(word);
            }
        }
        self.send_request(major_opcode, opcode::XI_SELECT_EVENTS, w)
    }

    /// Describe `device_id`, or every device for [`ALL_DEVICES`] and
    /// [`ALL_MASTER_DEVICES`]
    pub fn xi_query_device<F>(&mut self, device_id: u16, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<Vec<DeviceInfo>>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card16(device_id).padding(2);
        self.send_request_with_reply(
            major_opcode,
            opcode::XI_QUERY_DEVICE,
            w,
            |_, reply| {
                let mut r = reply.reader();
                let count = r.card16()?;
                r.padding(22)?;
                let devices = (0..count)
                    .map(|_| decode_device_info(&mut r))
                    .collect::<Result<_, _>>()?;
                Ok(devices)
            },
            callback,
        )
    }

    pub fn xi_set_focus(&mut self, device_id: u16, window: Window, time: Timestamp) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(time.0)
            .card16(device_id)
            .padding(2);
        self.send_request(major_opcode, opcode::XI_SET_FOCUS, w)
    }

    pub fn xi_get_focus<F>(&mut self, device_id: u16, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<Window>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card16(device_id).padding(2);
        self.send_request_with_reply(
            major_opcode,
            opcode::XI_GET_FOCUS,
            w,
            |_, reply| Ok(Window::new(reply.reader().card32()?)),
            callback,
        )
    }

    /// Actively grab a device. The reply carries the grab status, 0 on
    /// success.
    pub fn xi_grab_device<F>(
        &mut self,
        window: Window,
        time: Timestamp,
        cursor: Cursor,
        mask: &EventMask,
        owner_events: bool,
        callback: F,
    ) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<u8>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let words: u16 = wire_length("event mask", mask.mask.len())?;
        let mut w = WireWriter::new();
        w.card32(window.id().get())
            .card32(time.0)
            .card32(cursor.id().get())
            .card16(mask.device_id)
            .card8(grab_mode::ASYNC)
            .card8(grab_mode::ASYNC)
            .bool(owner_events)
            .padding(1)
            .card16(words);
        for &word in &mask.mask {
            w.card32(word);
        }
        self.send_request_with_reply(
            major_opcode,
            opcode::XI_GRAB_DEVICE,
            w,
            |_, reply| Ok(reply.reader().card8()?),
            callback,
        )
    }

    pub fn xi_ungrab_device(&mut self, device_id: u16, time: Timestamp) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(time.0).card16(device_id).padding(2);
        self.send_request(major_opcode, opcode::XI_UNGRAB_DEVICE, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xinput() -> XinputExtension {
        XinputExtension::new(ExtensionInfo {
            major_opcode: 131,
            first_event: 66,
            first_error: 129,
        })
    }

    #[test]
    fn test_decode_button_press() {
        let mut w = WireWriter::new();
        w.card16(2) // device
            .card32(1000)
            .card32(1) // button
            .card32(0x3c7)
            .card32(0x00200001)
            .card32(0)
            .int32(0x0010_8000) // 16.5
            .int32(0x0020_0000)
            .int32(-0x0000_8000) // -0.5
            .int32(0x0001_0000)
            .card16(1)
            .card16(0)
            .card16(11)
            .padding(2)
            .card32(0)
            .card32(1)
            .card32(0)
            .card32(0)
            .card32(1)
            .card8(0)
            .card8(0)
            .card8(0)
            .card8(0)
            .card32(0b10);
        match xinput().decode_generic_event(BUTTON_PRESS_EVENT, w.as_bytes()).unwrap() {
            Some(Event::InputButtonPress(e)) => {
                assert_eq!(e.detail, 1);
                assert_eq!(e.root_x, 16.5);
                assert_eq!(e.event_x, -0.5);
                assert_eq!(e.source_id, 11);
                assert_eq!(e.mods.base, 1);
                assert_eq!(e.button_mask, vec![0b10]);
                assert!(e.valuator_mask.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_errors_and_event_bits() {
        assert_eq!(xinput().decode_error(3), Some(ErrorKind::InputDeviceBusy));
        assert_eq!(xinput().decode_error(5), None);
        let mask = EventMask::new(ALL_MASTER_DEVICES)
            .select(KEY_PRESS_EVENT)
            .select(MOTION_EVENT);
        assert_eq!(mask.mask, vec![0b100_0100]);
    }

    #[test]
    fn test_event_mask_grows_past_first_word() {
        // Gesture events in XI 2.4 are numbered 27 to 32
        let mask = EventMask::new(ALL_DEVICES).select(32).select(27);
        assert_eq!(mask.mask, vec![1 << 27, 1]);
        assert!(mask.is_selected(32));
        assert!(!mask.is_selected(33));
        assert!(!mask.is_selected(70));
    }

    #[test]
    fn test_decode_device_info_with_valuator() {
        let mut w = WireWriter::new();
        w.card16(6)
            .card16(device_type::SLAVE_POINTER)
            .card16(2)
            .card16(2)
            .card16(5)
            .bool(true)
            .padding(1)
            .string8("Mouse")
            .padding(3);
        // Valuator: 44 bytes
        w.card16(VALUATOR_CLASS)
            .card16(11)
            .card16(6)
            .card16(0)
            .card32(301)
            .int32(-1)
            .card32(0x8000_0000)
            .int32(1920)
            .card32(0)
            .int32(10)
            .card32(0x4000_0000)
            .card32(1)
            .card8(1)
            .padding(3);
        // Button class with three buttons, kept raw
        w.card16(1).card16(3).card16(6).card16(3).card32(0b1110);

        let info = decode_device_info(&mut WireReader::new(w.as_bytes())).unwrap();
        assert_eq!(info.device_id, 6);
        assert_eq!(info.name, "Mouse");
        assert!(info.enabled);
        assert_eq!(info.classes.len(), 2);
        match &info.classes[0] {
            DeviceClass::Valuator(v) => {
                assert_eq!(v.label, Atom(301));
                assert_eq!(v.min, -0.5);
                assert_eq!(v.max, 1920.0);
                assert_eq!(v.value, 10.25);
                assert_eq!(v.mode, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &info.classes[1] {
            DeviceClass::Other {
                class_type, data, ..
            } => {
                assert_eq!(*class_type, 1);
                assert_eq!(data.len(), 6);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
