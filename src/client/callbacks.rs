//! Event callback slots
//!
//! The caller fills in the slots it cares about; events for empty slots are
//! dropped. Every slot receives the client so handlers can issue requests.

use super::Client;
use crate::protocol::*;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared flag that silences callbacks once set
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

pub type EventHandler<E> = Option<Box<dyn FnMut(&mut Client, &E)>>;

/// Optional handlers for every event the client decodes
#[derive(Default)]
pub struct EventCallbacks {
    pub key_press: EventHandler<KeyPressEvent>,
    pub key_release: EventHandler<KeyReleaseEvent>,
    pub button_press: EventHandler<ButtonPressEvent>,
    pub button_release: EventHandler<ButtonReleaseEvent>,
    pub motion_notify: EventHandler<MotionNotifyEvent>,
    pub enter_notify: EventHandler<CrossingEvent>,
    pub leave_notify: EventHandler<CrossingEvent>,
    pub focus_in: EventHandler<FocusEvent>,
    pub focus_out: EventHandler<FocusEvent>,
    pub expose: EventHandler<ExposeEvent>,
    pub no_expose: EventHandler<NoExposureEvent>,
    pub map_notify: EventHandler<MapNotifyEvent>,
    pub reparent_notify: EventHandler<ReparentNotifyEvent>,
    pub configure_notify: EventHandler<ConfigureNotifyEvent>,
    pub property_notify: EventHandler<PropertyNotifyEvent>,
    pub client_message: EventHandler<ClientMessageEvent>,

    pub shape_notify: EventHandler<ShapeNotifyEvent>,
    pub shm_completion: EventHandler<ShmCompletionEvent>,
    pub sync_counter_notify: EventHandler<SyncCounterNotifyEvent>,
    pub sync_alarm_notify: EventHandler<SyncAlarmNotifyEvent>,
    pub selection_notify: EventHandler<XfixesSelectionNotifyEvent>,
    pub cursor_notify: EventHandler<XfixesCursorNotifyEvent>,
    pub present_configure_notify: EventHandler<PresentConfigureNotifyEvent>,
    pub present_complete_notify: EventHandler<PresentCompleteNotifyEvent>,
    pub present_idle_notify: EventHandler<PresentIdleNotifyEvent>,
    pub input_key_press: EventHandler<InputDeviceEvent>,
    pub input_key_release: EventHandler<InputDeviceEvent>,
    pub input_button_press: EventHandler<InputDeviceEvent>,
    pub input_button_release: EventHandler<InputDeviceEvent>,
    pub input_motion: EventHandler<InputDeviceEvent>,
    pub input_enter: EventHandler<InputCrossingEvent>,
    pub input_leave: EventHandler<InputCrossingEvent>,
    pub input_focus_in: EventHandler<InputCrossingEvent>,
    pub input_focus_out: EventHandler<InputCrossingEvent>,

    /// Fixed-size event no registered extension claimed, by code
    pub unknown_event: Option<Box<dyn FnMut(&mut Client, u8)>>,
    /// Generic event nobody claimed, by major opcode and event type
    pub unknown_generic_event: Option<Box<dyn FnMut(&mut Client, u8, u16)>>,
    /// Errors for requests that had no reply handler
    pub error: EventHandler<X11Error>,

    /// When set and cancelled, nothing above is invoked
    pub cancel: Option<CancelToken>,
}

fn call<E>(slot: &mut EventHandler<E>, client: &mut Client, event: &E) {
    if let Some(handler) = slot {
        handler(client, event);
    }
}

impl EventCallbacks {
    pub fn new() -> Self {
        EventCallbacks::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    pub(crate) fn dispatch(&mut self, client: &mut Client, event: &Event) {
        match event {
            Event::KeyPress(e) => call(&mut self.key_press, client, e),
            Event::KeyRelease(e) => call(&mut self.key_release, client, e),
            Event::ButtonPress(e) => call(&mut self.button_press, client, e),
            Event::ButtonRelease(e) => call(&mut self.button_release, client, e),
            Event::MotionNotify(e) => call(&mut self.motion_notify, client, e),
            Event::EnterNotify(e) => call(&mut self.enter_notify, client, e),
            Event::LeaveNotify(e) => call(&mut self.leave_notify, client, e),
            Event::FocusIn(e) => call(&mut self.focus_in, client, e),
            Event::FocusOut(e) => call(&mut self.focus_out, client, e),
            Event::Expose(e) => call(&mut self.expose, client, e),
            Event::NoExposure(e) => call(&mut self.no_expose, client, e),
            Event::MapNotify(e) => call(&mut self.map_notify, client, e),
            Event::ReparentNotify(e) => call(&mut self.reparent_notify, client, e),
            Event::ConfigureNotify(e) => call(&mut self.configure_notify, client, e),
            Event::PropertyNotify(e) => call(&mut self.property_notify, client, e),
            Event::ClientMessage(e) => call(&mut self.client_message, client, e),
            Event::ShapeNotify(e) => call(&mut self.shape_notify, client, e),
            Event::ShmCompletion(e) => call(&mut self.shm_completion, client, e),
            Event::SyncCounterNotify(e) => call(&mut self.sync_counter_notify, client, e),
            Event::SyncAlarmNotify(e) => call(&mut self.sync_alarm_notify, client, e),
            Event::XfixesSelectionNotify(e) => call(&mut self.selection_notify, client, e),
            Event::XfixesCursorNotify(e) => call(&mut self.cursor_notify, client, e),
            Event::PresentConfigureNotify(e) => call(&mut self.present_configure_notify, client, e),
            Event::PresentCompleteNotify(e) => call(&mut self.present_complete_notify, client, e),
            Event::PresentIdleNotify(e) => call(&mut self.present_idle_notify, client, e),
            Event::InputKeyPress(e) => call(&mut self.input_key_press, client, e),
            Event::InputKeyRelease(e) => call(&mut self.input_key_release, client, e),
            Event::InputButtonPress(e) => call(&mut self.input_button_press, client, e),
            Event::InputButtonRelease(e) => call(&mut self.input_button_release, client, e),
            Event::InputMotion(e) => call(&mut self.input_motion, client, e),
            Event::InputEnter(e) => call(&mut self.input_enter, client, e),
            Event::InputLeave(e) => call(&mut self.input_leave, client, e),
            Event::InputFocusIn(e) => call(&mut self.input_focus_in, client, e),
            Event::InputFocusOut(e) => call(&mut self.input_focus_out, client, e),
        }
    }

    pub(crate) fn dispatch_unknown_event(&mut self, client: &mut Client, code: u8) {
        if let Some(handler) = &mut self.unknown_event {
            handler(client, code);
        }
    }

    pub(crate) fn dispatch_unknown_generic_event(
        &mut self,
        client: &mut Client,
        major_opcode: u8,
        event_type: u16,
    ) {
        if let Some(handler) = &mut self.unknown_generic_event {
            handler(client, major_opcode, event_type);
        }
    }

    pub(crate) fn dispatch_error(&mut self, client: &mut Client, error: &X11Error) {
        call(&mut self.error, client, error);
    }
}

impl fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let callbacks = EventCallbacks {
            cancel: Some(token.clone()),
            ..Default::default()
        };
        assert!(!callbacks.is_cancelled());
        token.cancel();
        assert!(callbacks.is_cancelled());
    }
}
