//! SYNC: counters, alarms and fences
//!
//! 64-bit values travel as a signed high word followed by an unsigned low
//! word, not as a little-endian i64.

use super::{Extension, ExtensionInfo, ExtensionVersion};
use crate::client::{Client, Cookie};
use crate::protocol::*;

pub const EXTENSION_NAME: &str = "SYNC";

pub mod opcode {
    pub const INITIALIZE: u8 = 0;
    pub const LIST_SYSTEM_COUNTERS: u8 = 1;
    pub const CREATE_COUNTER: u8 = 2;
    pub const SET_COUNTER: u8 = 3;
    pub const CHANGE_COUNTER: u8 = 4;
    pub const QUERY_COUNTER: u8 = 5;
    pub const DESTROY_COUNTER: u8 = 6;
    pub const AWAIT: u8 = 7;
    pub const CREATE_ALARM: u8 = 8;
    pub const CHANGE_ALARM: u8 = 9;
    pub const QUERY_ALARM: u8 = 10;
    pub const DESTROY_ALARM: u8 = 11;
    pub const SET_PRIORITY: u8 = 12;
    pub const GET_PRIORITY: u8 = 13;
    pub const CREATE_FENCE: u8 = 14;
    pub const TRIGGER_FENCE: u8 = 15;
    pub const RESET_FENCE: u8 = 16;
    pub const DESTROY_FENCE: u8 = 17;
    pub const QUERY_FENCE: u8 = 18;
    pub const AWAIT_FENCE: u8 = 19;
}

pub const COUNTER_NOTIFY_EVENT: u8 = 0;
pub const ALARM_NOTIFY_EVENT: u8 = 1;

pub const COUNTER_ERROR: u8 = 0;
pub const ALARM_ERROR: u8 = 1;

/// How a trigger's wait value is interpreted
pub mod value_type {
    pub const ABSOLUTE: u32 = 0;
    pub const RELATIVE: u32 = 1;
}

/// When a trigger fires relative to its wait value
pub mod test_type {
    pub const POSITIVE_TRANSITION: u32 = 0;
    pub const NEGATIVE_TRANSITION: u32 = 1;
    pub const POSITIVE_COMPARISON: u32 = 2;
    pub const NEGATIVE_COMPARISON: u32 = 3;
}

/// Alarm states reported by QueryAlarm and AlarmNotify
pub mod alarm_state {
    pub const ACTIVE: u8 = 0;
    pub const INACTIVE: u8 = 1;
    pub const DESTROYED: u8 = 2;
}

/// A condition on a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub counter: Counter,
    pub wait_type: u32,
    pub wait_value: i64,
    pub test_type: u32,
}

impl Trigger {
    fn write(&self, w: &mut WireWriter) {
        w.card32(self.counter.id().get()).card32(self.wait_type);
        write_int64(w, self.wait_value);
        w.card32(self.test_type);
    }

    fn read(r: &mut WireReader) -> Result<Self, WireError> {
        Ok(Trigger {
            counter: Counter::new(r.card32()?),
            wait_type: r.card32()?,
            wait_value: read_int64(r)?,
            test_type: r.card32()?,
        })
    }
}

/// One entry of an Await request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitCondition {
    pub trigger: Trigger,
    /// CounterNotify is sent when the counter passes the wait value by this much
    pub event_threshold: i64,
}

/// Alarm attributes for CreateAlarm and ChangeAlarm; unset fields keep the
/// server default or the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmAttributes {
    pub counter: Option<Counter>,
    pub value_type: Option<u32>,
    pub value: Option<i64>,
    pub test_type: Option<u32>,
    pub delta: Option<i64>,
    pub events: Option<bool>,
}

impl AlarmAttributes {
    fn write(&self, w: &mut WireWriter) {
        let mut mask = 0u32;
        let mut values = WireWriter::new();
        if let Some(counter) = self.counter {
            mask |= 1 << 0;
            values.card32(counter.id().get());
        }
        if let Some(value_type) = self.value_type {
            mask |= 1 << 1;
            values.card32(value_type);
        }
        if let Some(value) = self.value {
            mask |= 1 << 2;
            write_int64(&mut values, value);
        }
        if let Some(test_type) = self.test_type {
            mask |= 1 << 3;
            values.card32(test_type);
        }
        if let Some(delta) = self.delta {
            mask |= 1 << 4;
            write_int64(&mut values, delta);
        }
        if let Some(events) = self.events {
            mask |= 1 << 5;
            values.card32(events as u32);
        }
        w.card32(mask).bytes(values.as_bytes());
    }
}

/// QueryAlarm reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmInfo {
    pub trigger: Trigger,
    pub delta: i64,
    pub events: bool,
    pub state: u8,
}

/// A counter the server maintains itself, such as SERVERTIME
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCounter {
    pub counter: Counter,
    pub resolution: i64,
    pub name: String,
}

fn write_int64(w: &mut WireWriter, value: i64) {
    w.int32((value >> 32) as i32).card32(value as u32);
}

fn read_int64(r: &mut WireReader) -> Result<i64, WireError> {
    let hi = r.int32()? as i64;
    let lo = r.card32()? as i64;
    Ok((hi << 32) | lo)
}

#[derive(Debug, Clone)]
pub struct SyncExtension {
    info: ExtensionInfo,
}

impl SyncExtension {
    pub fn new(info: ExtensionInfo) -> Self {
        SyncExtension { info }
    }
}

impl Extension for SyncExtension {
    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }

    fn info(&self) -> ExtensionInfo {
        self.info
    }

    fn decode_event(
        &self,
        code: u8,
        header: &EventHeader,
        data: &[u8],
    ) -> Result<Option<Event>, WireError> {
        let mut r = WireReader::new(data);
        let event = match code {
            COUNTER_NOTIFY_EVENT => Event::SyncCounterNotify(SyncCounterNotifyEvent {
                kind: header.data0,
                counter: Counter::new(r.card32()?),
                wait_value: read_int64(&mut r)?,
                counter_value: read_int64(&mut r)?,
                time: Timestamp(r.card32()?),
                count: r.card16()?,
                destroyed: r.bool()?,
            }),
            ALARM_NOTIFY_EVENT => Event::SyncAlarmNotify(SyncAlarmNotifyEvent {
                kind: header.data0,
                alarm: Alarm::new(r.card32()?),
                counter_value: read_int64(&mut r)?,
                alarm_value: read_int64(&mut r)?,
                time: Timestamp(r.card32()?),
                state: r.card8()?,
            }),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    fn decode_error(&self, code: u8) -> Option<ErrorKind> {
        match code {
            COUNTER_ERROR => Some(ErrorKind::SyncCounter),
            ALARM_ERROR => Some(ErrorKind::SyncAlarm),
            _ => None,
        }
    }
}

impl Client {
    pub fn sync_initialize<F>(&mut self, major: u8, minor: u8, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<ExtensionVersion>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card8(major).card8(minor).padding(2);
        self.send_request_with_reply(
            major_opcode,
            opcode::INITIALIZE,
            w,
            |_, reply| {
                let mut r = reply.reader();
                Ok(ExtensionVersion {
                    major: r.card8()? as u32,
                    minor: r.card8()? as u32,
                })
            },
            callback,
        )
    }

    fn sync_counter_request(&mut self, minor: u8, counter: Counter, value: Option<i64>) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(counter.id().get());
        if let Some(value) = value {
            write_int64(&mut w, value);
        }
        self.send_request(major_opcode, minor, w)
    }

    pub fn sync_create_counter(&mut self, counter: Counter, initial_value: i64) -> X11Result<u16> {
        self.sync_counter_request(opcode::CREATE_COUNTER, counter, Some(initial_value))
    }

    pub fn sync_set_counter(&mut self, counter: Counter, value: i64) -> X11Result<u16> {
        self.sync_counter_request(opcode::SET_COUNTER, counter, Some(value))
    }

    /// Add `amount` to the counter's value
    pub fn sync_change_counter(&mut self, counter: Counter, amount: i64) -> X11Result<u16> {
        self.sync_counter_request(opcode::CHANGE_COUNTER, counter, Some(amount))
    }

    pub fn sync_destroy_counter(&mut self, counter: Counter) -> X11Result<u16> {
        self.sync_counter_request(opcode::DESTROY_COUNTER, counter, None)
    }

    pub fn sync_query_counter<F>(&mut self, counter: Counter, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<i64>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(counter.id().get());
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_COUNTER,
            w,
            |_, reply| Ok(read_int64(&mut reply.reader())?),
            callback,
        )
    }

    /// Counters the server maintains, with their names
    pub fn sync_list_system_counters<F>(&mut self, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<Vec<SystemCounter>>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        self.send_request_with_reply(
            major_opcode,
            opcode::LIST_SYSTEM_COUNTERS,
            WireWriter::new(),
            |_, reply| {
                let mut r = reply.reader();
                let count = r.card32()?;
                r.padding(20)?;
                let mut counters = Vec::new();
                for _ in 0..count {
                    let counter = Counter::new(r.card32()?);
                    let resolution = read_int64(&mut r)?;
                    let name_len = r.card16()? as usize;
                    let name = r.string8(name_len)?;
                    // Each entry is padded as a whole
                    r.padding((4 - (14 + name_len) % 4) % 4)?;
                    counters.push(SystemCounter {
                        counter,
                        resolution,
                        name,
                    });
                }
                Ok(counters)
            },
            callback,
        )
    }

    /// Block this client's request stream until one of `conditions` holds
    pub fn sync_await(&mut self, conditions: &[WaitCondition]) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        for condition in conditions {
            condition.trigger.write(&mut w);
            write_int64(&mut w, condition.event_threshold);
        }
        self.send_request(major_opcode, opcode::AWAIT, w)
    }

    pub fn sync_create_alarm(&mut self, alarm: Alarm, attributes: &AlarmAttributes) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(alarm.id().get());
        attributes.write(&mut w);
        self.send_request(major_opcode, opcode::CREATE_ALARM, w)
    }

    pub fn sync_change_alarm(&mut self, alarm: Alarm, attributes: &AlarmAttributes) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(alarm.id().get());
        attributes.write(&mut w);
        self.send_request(major_opcode, opcode::CHANGE_ALARM, w)
    }

    pub fn sync_query_alarm<F>(&mut self, alarm: Alarm, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<AlarmInfo>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(alarm.id().get());
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_ALARM,
            w,
            |_, reply| {
                let mut r = reply.reader();
                Ok(AlarmInfo {
                    trigger: Trigger::read(&mut r)?,
                    delta: read_int64(&mut r)?,
                    events: r.bool()?,
                    state: r.card8()?,
                })
            },
            callback,
        )
    }

    pub fn sync_destroy_alarm(&mut self, alarm: Alarm) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(alarm.id().get());
        self.send_request(major_opcode, opcode::DESTROY_ALARM, w)
    }

    /// Set the scheduling priority of the client owning `resource`, or of
    /// this client when `resource` is none
    pub fn sync_set_priority(&mut self, resource: XID, priority: i32) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(resource.get()).int32(priority);
        self.send_request(major_opcode, opcode::SET_PRIORITY, w)
    }

    pub fn sync_get_priority<F>(&mut self, resource: XID, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<i32>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(resource.get());
        self.send_request_with_reply(
            major_opcode,
            opcode::GET_PRIORITY,
            w,
            |_, reply| Ok(reply.reader().int32()?),
            callback,
        )
    }

    pub fn sync_create_fence(
        &mut self,
        drawable: Drawable,
        fence: Fence,
        initially_triggered: bool,
    ) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(drawable.id().get())
            .card32(fence.id().get())
            .bool(initially_triggered)
            .padding(3);
        self.send_request(major_opcode, opcode::CREATE_FENCE, w)
    }

    fn sync_fence_request(&mut self, minor: u8, fence: Fence) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(fence.id().get());
        self.send_request(major_opcode, minor, w)
    }

    pub fn sync_trigger_fence(&mut self, fence: Fence) -> X11Result<u16> {
        self.sync_fence_request(opcode::TRIGGER_FENCE, fence)
    }

    pub fn sync_reset_fence(&mut self, fence: Fence) -> X11Result<u16> {
        self.sync_fence_request(opcode::RESET_FENCE, fence)
    }

    pub fn sync_destroy_fence(&mut self, fence: Fence) -> X11Result<u16> {
        self.sync_fence_request(opcode::DESTROY_FENCE, fence)
    }

    /// Whether the fence is currently triggered
    pub fn sync_query_fence<F>(&mut self, fence: Fence, callback: F) -> X11Result<Cookie>
    where
        F: FnOnce(&mut Client, X11Result<bool>) + 'static,
    {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        w.card32(fence.id().get());
        self.send_request_with_reply(
            major_opcode,
            opcode::QUERY_FENCE,
            w,
            |_, reply| Ok(reply.reader().bool()?),
            callback,
        )
    }

    /// Block this client's request stream until any of `fences` triggers
    pub fn sync_await_fence(&mut self, fences: &[Fence]) -> X11Result<u16> {
        let major_opcode = self.extension_opcode(EXTENSION_NAME)?;
        let mut w = WireWriter::new();
        for fence in fences {
            w.card32(fence.id().get());
        }
        self.send_request(major_opcode, opcode::AWAIT_FENCE, w)
    }
}
