//! Client connection engine
//!
//! A [`Client`] owns one server connection: the setup record, the extension
//! registry, the pending request table and the event callbacks. Requests go
//! out through the [`Transport`] immediately; replies, errors and events come
//! back in whatever chunks the embedding loop hands to [`Client::process_input`].

pub mod callbacks;
mod discovery;
pub mod pending;

pub use callbacks::{CancelToken, EventCallbacks, EventHandler};
pub use pending::{Cookie, Reply, RequestState};

use crate::connection::Transport;
use crate::extensions::{CoreExtension, ExtensionRegistry};
use crate::protocol::*;
use crate::resources::ResourceIdAllocator;
use byteorder::{ByteOrder as _, LittleEndian};
use pending::{PendingTable, ReplyHandler};
use std::collections::VecDeque;
use std::fmt;
use std::os::fd::OwnedFd;

/// Where the connection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    SendingSetup,
    AwaitingSetupReply,
    Failed,
    Discovering,
    Ready,
    Closed,
}

/// Reported once the handshake and extension discovery have finished
pub type ConnectCallback = Box<dyn FnOnce(&mut Client, X11Result<()>)>;

/// Message code of a generic event
const GENERIC_EVENT_CODE: u8 = 35;

/// One X11 client connection
pub struct Client {
    transport: Box<dyn Transport>,
    state: ConnectionState,
    setup: Option<SetupInfo>,
    sequence: u16,
    pending: PendingTable,
    registry: ExtensionRegistry,
    resource_ids: ResourceIdAllocator,
    big_requests: bool,
    received_fds: VecDeque<OwnedFd>,
    callbacks: Option<EventCallbacks>,
    connect_callback: Option<ConnectCallback>,
    discovery_outstanding: usize,
}

impl Client {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Client::with_transport(Box::new(transport))
    }

    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Client {
            transport,
            state: ConnectionState::Connecting,
            setup: None,
            sequence: 0,
            pending: PendingTable::default(),
            registry: ExtensionRegistry::new(),
            resource_ids: ResourceIdAllocator::new(0, 0),
            big_requests: false,
            received_fds: VecDeque::new(),
            callbacks: None,
            connect_callback: None,
            discovery_outstanding: 0,
        }
    }

    /// Open the local display, returning the client and the socket reader
    /// that feeds it.
    #[cfg(unix)]
    pub fn open(
        display: &crate::connection::DisplayName,
    ) -> X11Result<(Client, crate::connection::UnixReader)> {
        let (transport, reader) = crate::connection::UnixTransport::connect(display)?;
        Ok((Client::new(transport), reader))
    }

    /// Send the setup packet. `callback` fires once setup has failed, or once
    /// it succeeded and every extension discovery step has completed.
    pub fn connect<F>(&mut self, callback: F) -> X11Result<()>
    where
        F: FnOnce(&mut Client, X11Result<()>) + 'static,
    {
        match self.state {
            ConnectionState::Connecting => {}
            ConnectionState::Closed => return Err(ClientError::Closed),
            _ => {
                return Err(ClientError::Connection(
                    "connect() called twice".to_string(),
                ))
            }
        }

        self.state = ConnectionState::SendingSetup;
        let packet = SetupRequest::default().encode();
        log::debug!("Sending setup request ({} bytes)", packet.len());
        if let Err(e) = self.transport.write(&packet, Vec::new()) {
            self.state = ConnectionState::Failed;
            return Err(e.into());
        }
        self.connect_callback = Some(Box::new(callback));
        self.state = ConnectionState::AwaitingSetupReply;
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// The server's setup record, once the handshake has succeeded
    pub fn setup(&self) -> Option<&SetupInfo> {
        self.setup.as_ref()
    }

    /// Sequence number of the most recently sent request
    pub fn sequence_number(&self) -> u16 {
        self.sequence
    }

    /// Number of requests still waiting for a reply or error
    pub fn pending_request_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, sequence: u16) -> bool {
        self.pending.contains(sequence)
    }

    /// Largest request the server accepts, in 4-byte units
    pub fn maximum_request_length(&self) -> u32 {
        self.setup
            .as_ref()
            .map_or(MAX_STANDARD_LENGTH as u32, |s| s.maximum_request_length)
    }

    pub fn big_requests_enabled(&self) -> bool {
        self.big_requests
    }

    /// Allocate a fresh resource ID from the connection's range
    pub fn generate_id(&mut self) -> XID {
        self.resource_ids.allocate()
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.registry.find_by_name(name).is_some()
    }

    /// Major opcode of a registered extension
    pub fn extension_opcode(&self, name: &'static str) -> X11Result<u8> {
        self.registry
            .find_by_name(name)
            .map(|extension| extension.major_opcode())
            .ok_or(ClientError::ExtensionMissing(name))
    }

    pub fn set_event_callbacks(&mut self, callbacks: EventCallbacks) {
        self.callbacks = Some(callbacks);
    }

    /// Mutable access to the installed callbacks, installing empty ones if needed
    pub fn event_callbacks_mut(&mut self) -> &mut EventCallbacks {
        self.callbacks.get_or_insert_with(EventCallbacks::default)
    }

    pub fn set_error_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Client, &X11Error) + 'static,
    {
        self.event_callbacks_mut().error = Some(Box::new(callback));
    }

    /// Queue descriptors that arrived alongside incoming bytes
    pub fn push_received_fds(&mut self, fds: Vec<OwnedFd>) {
        self.received_fds.extend(fds);
    }

    /// Descriptors received but not yet claimed by a reply
    pub fn received_fd_count(&self) -> usize {
        self.received_fds.len()
    }

    /// Tear the connection down. Pending requests never complete and every
    /// later request fails with [`ClientError::Closed`].
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        log::info!("Closing X11 connection");
        self.state = ConnectionState::Closed;
        self.registry.close();
        self.pending.clear();
        self.received_fds.clear();
        self.connect_callback = None;
    }

    /// Send a request that expects no reply, returning its sequence number
    pub fn send_request(&mut self, opcode: u8, data0: u8, request: WireWriter) -> X11Result<u16> {
        self.write_request(opcode, data0, request)
    }

    /// Send a request and register `callback` for its reply.
    ///
    /// `decode` turns the raw reply into the caller's type; a decode failure
    /// reaches the callback as an error like any other.
    pub fn send_request_with_reply<T, D, F>(
        &mut self,
        opcode: u8,
        data0: u8,
        request: WireWriter,
        decode: D,
        callback: F,
    ) -> X11Result<Cookie>
    where
        T: 'static,
        D: FnOnce(&mut Client, &mut Reply) -> X11Result<T> + 'static,
        F: FnOnce(&mut Client, X11Result<T>) + 'static,
    {
        self.send_pending(opcode, data0, request, false, decode, callback)
    }

    /// Like [`Client::send_request_with_reply`], for requests whose reply
    /// announces in its data0 byte how many descriptors the server sent with
    /// it. Those descriptors are claimed when the reply arrives and reach
    /// `decode` through [`Reply::take_fd`].
    pub fn send_request_with_fd_reply<T, D, F>(
        &mut self,
        opcode: u8,
        data0: u8,
        request: WireWriter,
        decode: D,
        callback: F,
    ) -> X11Result<Cookie>
    where
        T: 'static,
        D: FnOnce(&mut Client, &mut Reply) -> X11Result<T> + 'static,
        F: FnOnce(&mut Client, X11Result<T>) + 'static,
    {
        self.send_pending(opcode, data0, request, true, decode, callback)
    }

    fn send_pending<T, D, F>(
        &mut self,
        opcode: u8,
        data0: u8,
        request: WireWriter,
        carries_fds: bool,
        decode: D,
        callback: F,
    ) -> X11Result<Cookie>
    where
        T: 'static,
        D: FnOnce(&mut Client, &mut Reply) -> X11Result<T> + 'static,
        F: FnOnce(&mut Client, X11Result<T>) + 'static,
    {
        let handler: ReplyHandler = Box::new(move |client, result| {
            let result = match result {
                Ok(mut reply) => decode(client, &mut reply),
                Err(error) => Err(ClientError::Protocol(error)),
            };
            callback(client, result);
        });
        let sequence = self.write_request(opcode, data0, request)?;
        Ok(self.pending.insert(sequence, carries_fds, handler))
    }

    fn write_request(&mut self, opcode: u8, data0: u8, request: WireWriter) -> X11Result<u16> {
        match self.state {
            ConnectionState::Discovering | ConnectionState::Ready => {}
            ConnectionState::Closed => return Err(ClientError::Closed),
            _ => return Err(ClientError::NotReady),
        }

        let (payload, fds) = request.into_parts();
        if payload.len() % 4 != 0 {
            return Err(ClientError::UnalignedRequest(payload.len()));
        }

        let maximum = self.maximum_request_length();
        let units = 1 + payload.len() / 4;
        let extended = units > MAX_STANDARD_LENGTH;
        let too_large = if extended {
            !self.big_requests || units + 1 > maximum as usize
        } else {
            units > maximum as usize
        };
        if too_large {
            return Err(ClientError::RequestTooLarge {
                length: units,
                maximum,
            });
        }

        let frame = encode_request_frame(opcode, data0, &payload, extended);
        let sequence = self.sequence.wrapping_add(1);
        log::trace!(
            "Sending request opcode={} data0={} seq={} len={} fds={}",
            opcode,
            data0,
            sequence,
            frame.len(),
            fds.len()
        );
        self.transport.write(&frame, fds)?;
        self.sequence = sequence;
        Ok(sequence)
    }

    /// Consume as many complete messages from the front of `data` as possible.
    ///
    /// Returns the number of bytes used; the caller keeps the rest and offers
    /// it again together with the next chunk.
    pub fn process_input(&mut self, data: &[u8]) -> usize {
        let mut offset = 0;
        match self.state {
            ConnectionState::AwaitingSetupReply => match SetupResponse::parse(data) {
                Ok(None) => return 0,
                Ok(Some((response, used))) => {
                    offset = used;
                    self.handle_setup_response(response);
                }
                Err(e) => {
                    self.fail_connection(e);
                    return data.len();
                }
            },
            ConnectionState::Discovering | ConnectionState::Ready => {}
            _ => return data.len(),
        }

        while offset < data.len() {
            if !matches!(
                self.state,
                ConnectionState::Discovering | ConnectionState::Ready
            ) {
                return data.len();
            }
            let used = self.decode_message(&data[offset..]);
            if used == 0 {
                break;
            }
            offset += used;
        }
        offset
    }

    /// Decode and dispatch the message at the front of `data`.
    ///
    /// Returns its length, or 0 when it is not completely buffered yet.
    pub fn decode_message(&mut self, data: &[u8]) -> usize {
        match data.first() {
            None => 0,
            Some(0) => self.decode_error(data),
            Some(1) => self.decode_reply(data),
            Some(_) => self.decode_event(data),
        }
    }

    fn decode_error(&mut self, data: &[u8]) -> usize {
        if data.len() < X11Error::LENGTH {
            return 0;
        }
        let code = data[1];
        let sequence = LittleEndian::read_u16(&data[2..4]);
        let kind = self.registry.resolve_error(code);
        let error = X11Error::new(
            kind,
            code,
            sequence,
            LittleEndian::read_u32(&data[4..8]),
            LittleEndian::read_u16(&data[8..10]),
            data[10],
        );
        log::trace!("Received error: {}", error);

        match self.pending.take(sequence) {
            Some(request) => request.complete(self, Err(error)),
            None => {
                log::debug!("Unhandled {}", error);
                self.with_callbacks(|callbacks, client| callbacks.dispatch_error(client, &error));
            }
        }
        X11Error::LENGTH
    }

    fn decode_reply(&mut self, data: &[u8]) -> usize {
        if data.len() < 8 {
            return 0;
        }
        let data0 = data[1];
        let sequence = LittleEndian::read_u16(&data[2..4]);
        let length = LittleEndian::read_u32(&data[4..8]) as usize;
        let total = length.saturating_mul(4).saturating_add(32);
        if data.len() < total {
            return 0;
        }
        log::trace!("Received reply seq={} len={}", sequence, total);

        match self.pending.take(sequence) {
            Some(request) => {
                let mut reply = Reply::new(data0, sequence, data[8..total].to_vec());
                if request.carries_fds() {
                    reply = reply.with_fds(self.claim_received_fds(data0 as usize));
                }
                request.complete(self, Ok(reply));
            }
            None => log::warn!("Dropping reply for unknown sequence number {}", sequence),
        }
        total
    }

    /// Remove up to `count` descriptors from the front of the receive queue
    fn claim_received_fds(&mut self, count: usize) -> Vec<OwnedFd> {
        if self.received_fds.len() < count {
            log::warn!(
                "Reply announces {} descriptor(s), {} received",
                count,
                self.received_fds.len()
            );
        }
        let count = count.min(self.received_fds.len());
        self.received_fds.drain(..count).collect()
    }

    fn decode_event(&mut self, data: &[u8]) -> usize {
        if data.len() < 32 {
            return 0;
        }
        if data[0] & 0x7f == GENERIC_EVENT_CODE {
            return self.decode_generic_event(data);
        }

        let mut raw = [0u8; 32];
        raw.copy_from_slice(&data[..32]);
        let header = EventHeader::parse(&raw);
        log::trace!(
            "Received event code={} seq={} send_event={}",
            header.code,
            header.sequence,
            header.from_send_event
        );

        match self.registry.decode_event(&header, &raw[4..]) {
            Ok(Some(event)) => self.dispatch_event(&event),
            Ok(None) => {
                let code = header.code;
                self.with_callbacks(|callbacks, client| {
                    callbacks.dispatch_unknown_event(client, code)
                });
            }
            Err(e) => log::warn!("Malformed event with code {}: {}", header.code, e),
        }
        32
    }

    fn decode_generic_event(&mut self, data: &[u8]) -> usize {
        let major_opcode = data[1];
        let extra_length = LittleEndian::read_u32(&data[4..8]) as usize;
        let event_type = LittleEndian::read_u16(&data[8..10]);
        let total = extra_length.saturating_mul(4).saturating_add(32);
        if data.len() < total {
            return 0;
        }
        log::trace!(
            "Received generic event major={} type={} len={}",
            major_opcode,
            event_type,
            total
        );

        match self
            .registry
            .decode_generic_event(major_opcode, event_type, &data[10..total])
        {
            Ok(Some(event)) => self.dispatch_event(&event),
            Ok(None) => self.with_callbacks(|callbacks, client| {
                callbacks.dispatch_unknown_generic_event(client, major_opcode, event_type)
            }),
            Err(e) => log::warn!(
                "Malformed generic event {} from extension {}: {}",
                event_type,
                major_opcode,
                e
            ),
        }
        total
    }

    fn dispatch_event(&mut self, event: &Event) {
        self.with_callbacks(|callbacks, client| callbacks.dispatch(client, event));
    }

    /// Run `f` with the callbacks temporarily moved out of the client, so
    /// handlers can borrow the client mutably.
    fn with_callbacks<F>(&mut self, f: F)
    where
        F: FnOnce(&mut EventCallbacks, &mut Client),
    {
        let Some(mut callbacks) = self.callbacks.take() else {
            return;
        };
        if !callbacks.is_cancelled() {
            f(&mut callbacks, self);
        }
        // A handler may have installed a replacement
        if self.callbacks.is_none() {
            self.callbacks = Some(callbacks);
        }
    }

    fn handle_setup_response(&mut self, response: SetupResponse) {
        match response {
            SetupResponse::Success(info) => {
                log::info!(
                    "Connected to {} (release {}), {} screen(s), max request length {}",
                    info.vendor,
                    info.release_number,
                    info.screens.len(),
                    info.maximum_request_length
                );
                self.resource_ids =
                    ResourceIdAllocator::new(info.resource_id_base, info.resource_id_mask);
                self.setup = Some(info);
                self.registry.register(Box::new(CoreExtension));
                self.start_discovery();
            }
            SetupResponse::Failed(failed) => {
                self.fail_connection(ClientError::Connection(failed.reason));
            }
            SetupResponse::Authenticate(reason) => {
                self.fail_connection(ClientError::Connection(format!(
                    "server requires authentication: {}",
                    reason
                )));
            }
        }
    }

    fn fail_connection(&mut self, error: ClientError) {
        log::warn!("Connection setup failed: {}", error);
        self.state = ConnectionState::Failed;
        if let Some(callback) = self.connect_callback.take() {
            callback(self, Err(error));
        }
    }

    fn finish_connect(&mut self) {
        if self.state != ConnectionState::Discovering {
            return;
        }
        self.state = ConnectionState::Ready;
        log::info!(
            "X11 connection ready, extensions: {}",
            self.registry.names().collect::<Vec<_>>().join(", ")
        );
        if let Some(callback) = self.connect_callback.take() {
            callback(self, Ok(()));
        }
    }

    pub(crate) fn set_maximum_request_length(&mut self, maximum: u32) {
        if let Some(setup) = &mut self.setup {
            setup.maximum_request_length = maximum;
        }
        self.big_requests = true;
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.registry
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("sequence", &self.sequence)
            .field("pending", &self.pending.len())
            .field("extensions", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MemoryTransport;
    use crate::protocol::setup::sample_setup;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Client past setup with discovery answered by "not present" everywhere
    fn ready_client() -> (Client, MemoryTransport) {
        let transport = MemoryTransport::new();
        let mut client = Client::new(transport.clone());
        client.connect(|_, result| assert!(result.is_ok())).unwrap();
        let setup = sample_setup().encode();
        assert_eq!(client.process_input(&setup), setup.len());

        let queries = client.sequence_number();
        for sequence in 1..=queries {
            let mut reply = [0u8; 32];
            reply[0] = 1;
            reply[2..4].copy_from_slice(&sequence.to_le_bytes());
            assert_eq!(client.process_input(&reply), 32);
        }
        assert!(client.is_ready());
        transport.take_written();
        (client, transport)
    }

    #[test]
    fn test_requests_need_setup() {
        let mut client = Client::new(MemoryTransport::new());
        let result = client.send_request(RequestOpcode::NoOperation as u8, 0, WireWriter::new());
        assert!(matches!(result, Err(ClientError::NotReady)));
    }

    #[test]
    fn test_unaligned_payload_rejected() {
        let (mut client, transport) = ready_client();
        let mut request = WireWriter::new();
        request.card8(1);
        let before = client.sequence_number();
        let result = client.send_request(RequestOpcode::NoOperation as u8, 0, request);
        assert!(matches!(result, Err(ClientError::UnalignedRequest(1))));
        assert_eq!(client.sequence_number(), before);
        assert_eq!(transport.frame_count(), 0);
    }

    #[test]
    fn test_reply_needs_full_length() {
        let (mut client, _) = ready_client();
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = Rc::clone(&seen);
        let cookie = client
            .send_request_with_reply(
                RequestOpcode::GetAtomName as u8,
                0,
                {
                    let mut w = WireWriter::new();
                    w.card32(1);
                    w
                },
                |_, reply| Ok(reply.payload.len()),
                move |_, result| *seen_clone.borrow_mut() = Some(result.unwrap()),
            )
            .unwrap();

        let mut reply = vec![0u8; 36];
        reply[0] = 1;
        reply[2..4].copy_from_slice(&cookie.sequence_number().to_le_bytes());
        reply[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert_eq!(client.decode_message(&reply[..35]), 0);
        assert_eq!(client.decode_message(&reply), 36);
        assert_eq!(*seen.borrow(), Some(28));
        assert_eq!(cookie.state(), RequestState::Completed);
    }

    #[test]
    fn test_closed_client_refuses_requests() {
        let (mut client, _) = ready_client();
        client.close();
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(client.extensions().is_empty());
        let result = client.send_request(RequestOpcode::NoOperation as u8, 0, WireWriter::new());
        assert!(matches!(result, Err(ClientError::Closed)));
    }
}
