//! Scripted X server for driving a client through MemoryTransport
//!
//! The server answers the connection handshake and every request the client
//! sends during extension discovery. Tests then build replies, errors and
//! events by hand and feed them through `Client::process_input`.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use x11client::protocol::*;
use x11client::{Client, MemoryTransport};

pub const ROOT_WINDOW: u32 = 0x3c7;

/// Largest request length granted by the BIG-REQUESTS enable reply
pub const BIG_REQUEST_MAXIMUM: u32 = 0x3f_ffff;

/// An extension the fake server advertises
#[derive(Debug, Clone, Copy)]
pub struct Advertised {
    pub name: &'static str,
    pub major_opcode: u8,
    pub first_event: u8,
    pub first_error: u8,
}

pub const SHM: Advertised = Advertised {
    name: "MIT-SHM",
    major_opcode: 130,
    first_event: 65,
    first_error: 128,
};
pub const BIG_REQUESTS: Advertised = Advertised {
    name: "BIG-REQUESTS",
    major_opcode: 133,
    first_event: 0,
    first_error: 0,
};
pub const SYNC: Advertised = Advertised {
    name: "SYNC",
    major_opcode: 134,
    first_event: 83,
    first_error: 134,
};
pub const XFIXES: Advertised = Advertised {
    name: "XFIXES",
    major_opcode: 138,
    first_event: 87,
    first_error: 140,
};
pub const PRESENT: Advertised = Advertised {
    name: "Present",
    major_opcode: 148,
    first_event: 0,
    first_error: 0,
};
pub const XINPUT: Advertised = Advertised {
    name: "XInputExtension",
    major_opcode: 131,
    first_event: 66,
    first_error: 129,
};
pub const DRI3: Advertised = Advertised {
    name: "DRI3",
    major_opcode: 149,
    first_event: 0,
    first_error: 0,
};

/// Successful setup reply from a stock X.Org server: one 1920x1080 screen
/// with a single TrueColor visual
pub fn setup_success() -> Vec<u8> {
    let vendor = "The X.Org Foundation";
    let mut body = WireWriter::new();
    body.card32(12101004) // release
        .card32(0x00200000) // resource id base
        .card32(0x001fffff) // resource id mask
        .card32(256)
        .card16(vendor.len() as u16)
        .card16(0xffff) // maximum request length
        .card8(1) // screens
        .card8(1) // pixmap formats
        .card8(0)
        .card8(0)
        .card8(32)
        .card8(32)
        .card8(8)
        .card8(255)
        .padding(4)
        .string8(vendor)
        .align();
    body.card8(24).card8(32).card8(32).padding(5);
    body.card32(ROOT_WINDOW)
        .card32(0x20) // colormap
        .card32(0xffffff)
        .card32(0)
        .card32(0)
        .card16(1920)
        .card16(1080)
        .card16(508)
        .card16(285)
        .card16(1)
        .card16(1)
        .card32(0x21) // root visual
        .card8(0)
        .bool(false)
        .card8(24)
        .card8(1); // depths
    body.card8(24).padding(1).card16(1).padding(4);
    body.card32(0x21)
        .card8(4) // TrueColor
        .card8(8)
        .card16(256)
        .card32(0xff0000)
        .card32(0xff00)
        .card32(0xff)
        .padding(4);

    let mut message = vec![1, 0, 11, 0, 0, 0];
    message.extend_from_slice(&((body.len() / 4) as u16).to_le_bytes());
    message.extend_from_slice(body.as_bytes());
    message
}

/// Setup refusal carrying `reason`
pub fn setup_failed(reason: &str) -> Vec<u8> {
    let mut body = WireWriter::new();
    body.string8(reason).align();
    let mut message = vec![0, reason.len() as u8, 11, 0, 0, 0];
    message.extend_from_slice(&((body.len() / 4) as u16).to_le_bytes());
    message.extend_from_slice(body.as_bytes());
    message
}

/// Build a reply message. `payload` starts at byte 8 and is padded out to
/// the 32-byte minimum.
pub fn reply(sequence: u16, data0: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = payload.to_vec();
    if body.len() < 24 {
        body.resize(24, 0);
    }
    body.resize(body.len() + (4 - body.len() % 4) % 4, 0);
    let extra_units = ((body.len() - 24) / 4) as u32;

    let mut message = vec![1, data0];
    message.extend_from_slice(&sequence.to_le_bytes());
    message.extend_from_slice(&extra_units.to_le_bytes());
    message.extend_from_slice(&body);
    message
}

pub fn error(code: u8, sequence: u16, bad_value: u32, major_opcode: u8) -> Vec<u8> {
    let mut message = vec![0u8; 32];
    message[1] = code;
    message[2..4].copy_from_slice(&sequence.to_le_bytes());
    message[4..8].copy_from_slice(&bad_value.to_le_bytes());
    message[10] = major_opcode;
    message
}

/// Build a generic event carrying `data` from byte 10 on
pub fn generic_event(major_opcode: u8, event_type: u16, data: &[u8]) -> Vec<u8> {
    let total = (10 + data.len()).max(32);
    let total = total + (4 - total % 4) % 4;
    let mut message = vec![0u8; total];
    message[0] = 35;
    message[1] = major_opcode;
    message[4..8].copy_from_slice(&(((total - 32) / 4) as u32).to_le_bytes());
    message[8..10].copy_from_slice(&event_type.to_le_bytes());
    message[10..10 + data.len()].copy_from_slice(data);
    message
}

/// Server side of a MemoryTransport connection
pub struct FakeServer {
    pub transport: MemoryTransport,
    advertised: Vec<Advertised>,
    sequence: u16,
}

impl FakeServer {
    pub fn new(advertised: &[Advertised]) -> Self {
        FakeServer {
            transport: MemoryTransport::new(),
            advertised: advertised.to_vec(),
            sequence: 0,
        }
    }

    pub fn client(&self) -> Client {
        Client::new(self.transport.clone())
    }

    /// Run the handshake and discovery to completion
    pub fn connect(&mut self, client: &mut Client) -> Rc<Cell<Option<bool>>> {
        let outcome = Rc::new(Cell::new(None));
        let seen = Rc::clone(&outcome);
        client
            .connect(move |_, result| seen.set(Some(result.is_ok())))
            .unwrap();
        let handshake = self.transport.take_written();
        assert_eq!(handshake.len(), 1);
        assert_eq!(handshake[0].data[0], 0x6c);

        let setup = setup_success();
        assert_eq!(client.process_input(&setup), setup.len());
        self.serve(client);
        outcome
    }

    /// Answer every frame the client has written, until it stops writing
    pub fn serve(&mut self, client: &mut Client) {
        loop {
            let frames = self.transport.take_written();
            if frames.is_empty() {
                return;
            }
            for frame in frames {
                self.sequence = self.sequence.wrapping_add(1);
                if let Some(message) = self.answer(&frame.data) {
                    assert_eq!(client.process_input(&message), message.len());
                }
            }
        }
    }

    /// Account for frames the test inspects itself
    pub fn skip_written(&mut self) -> Vec<Vec<u8>> {
        let frames: Vec<_> = self
            .transport
            .take_written()
            .into_iter()
            .map(|f| f.data)
            .collect();
        self.sequence = self.sequence.wrapping_add(frames.len() as u16);
        frames
    }

    fn answer(&self, frame: &[u8]) -> Option<Vec<u8>> {
        let opcode = frame[0];
        if opcode == RequestOpcode::QueryExtension as u8 {
            let length = u16::from_le_bytes([frame[4], frame[5]]) as usize;
            let name = std::str::from_utf8(&frame[8..8 + length]).unwrap();
            let payload = match self.advertised.iter().find(|a| a.name == name) {
                Some(a) => vec![1, a.major_opcode, a.first_event, a.first_error],
                None => vec![0; 4],
            };
            return Some(reply(self.sequence, 0, &payload));
        }

        let extension = self.advertised.iter().find(|a| a.major_opcode == opcode)?;
        let payload = match extension.name {
            "BIG-REQUESTS" => BIG_REQUEST_MAXIMUM.to_le_bytes().to_vec(),
            "XFIXES" => [5u32.to_le_bytes(), 0u32.to_le_bytes()].concat(),
            "SYNC" => vec![3, 1],
            "XInputExtension" => vec![2, 0, 4, 0],
            _ => Vec::new(),
        };
        Some(reply(self.sequence, 0, &payload))
    }
}

/// A client that finished discovery against a server advertising `advertised`
pub fn ready_client(advertised: &[Advertised]) -> (Client, FakeServer) {
    let mut server = FakeServer::new(advertised);
    let mut client = server.client();
    let outcome = server.connect(&mut client);
    assert_eq!(outcome.get(), Some(true));
    assert!(client.is_ready());
    (client, server)
}
