//! X11 protocol requests
//!
//! Core request opcodes and the request frame layout shared by the core
//! protocol and every extension.

use byteorder::{ByteOrder as _, LittleEndian};

/// Core request opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestOpcode {
    CreateWindow = 1,
    ChangeWindowAttributes = 2,
    GetWindowAttributes = 3,
    DestroyWindow = 4,
    DestroySubwindows = 5,
    ReparentWindow = 7,
    MapWindow = 8,
    MapSubwindows = 9,
    UnmapWindow = 10,
    UnmapSubwindows = 11,
    ConfigureWindow = 12,
    InternAtom = 16,
    GetAtomName = 17,
    ChangeProperty = 18,
    DeleteProperty = 19,
    GetProperty = 20,
    ListProperties = 21,
    GrabServer = 36,
    UngrabServer = 37,
    CreatePixmap = 53,
    FreePixmap = 54,
    CreateGC = 55,
    ChangeGC = 56,
    CopyGC = 57,
    FreeGC = 60,
    ClearArea = 61,
    CopyArea = 62,
    PutImage = 72,
    GetImage = 73,
    QueryExtension = 98,
    ListExtensions = 99,
    Bell = 104,
    KillClient = 113,
    RotateProperties = 114,
    NoOperation = 127,
}

/// Largest length expressible in the 16-bit header field, in 4-byte units
pub const MAX_STANDARD_LENGTH: usize = 0xffff;

/// Encode a request frame around an already padded payload.
///
/// `extended` selects the BIG-REQUESTS layout, where the 16-bit length is zero
/// and a 32-bit length (counting the extra word) follows the header.
pub fn encode_request_frame(opcode: u8, data0: u8, payload: &[u8], extended: bool) -> Vec<u8> {
    let units = 1 + payload.len() / 4;
    let mut frame = Vec::with_capacity(8 + payload.len());
    frame.push(opcode);
    frame.push(data0);
    if extended {
        let mut length = [0u8; 4];
        LittleEndian::write_u32(&mut length, (units + 1) as u32);
        frame.extend_from_slice(&[0, 0]);
        frame.extend_from_slice(&length);
    } else {
        let mut length = [0u8; 2];
        LittleEndian::write_u16(&mut length, units as u16);
        frame.extend_from_slice(&length);
    }
    frame.extend_from_slice(payload);
    frame
}

/// A request frame read back off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame<'a> {
    pub opcode: u8,
    pub data0: u8,
    pub extended: bool,
    pub payload: &'a [u8],
}

impl<'a> RequestFrame<'a> {
    /// Parse one frame from the start of `data`, returning it and its size
    pub fn parse(data: &'a [u8]) -> Option<(Self, usize)> {
        if data.len() < 4 {
            return None;
        }
        let opcode = data[0];
        let data0 = data[1];
        let short_length = LittleEndian::read_u16(&data[2..4]) as usize;
        let (extended, header_len, units) = if short_length == 0 {
            if data.len() < 8 {
                return None;
            }
            (true, 8, LittleEndian::read_u32(&data[4..8]) as usize)
        } else {
            (false, 4, short_length)
        };
        let total = units * 4;
        if total < header_len || data.len() < total {
            return None;
        }
        Some((
            RequestFrame {
                opcode,
                data0,
                extended,
                payload: &data[header_len..total],
            },
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_frame() {
        let frame = encode_request_frame(RequestOpcode::MapWindow as u8, 0, &0x00200001u32.to_le_bytes(), false);
        assert_eq!(frame, vec![8, 0, 2, 0, 0x01, 0x00, 0x20, 0x00]);

        let (parsed, used) = RequestFrame::parse(&frame).unwrap();
        assert_eq!(used, 8);
        assert_eq!(parsed.opcode, 8);
        assert!(!parsed.extended);
        assert_eq!(parsed.payload, &0x00200001u32.to_le_bytes());
    }

    #[test]
    fn test_extended_frame() {
        let payload = vec![0xaau8; 16];
        let frame = encode_request_frame(130, 3, &payload, true);
        assert_eq!(&frame[..4], &[130, 3, 0, 0]);
        // One header word, one length word, four payload words
        assert_eq!(&frame[4..8], &6u32.to_le_bytes());

        let (parsed, used) = RequestFrame::parse(&frame).unwrap();
        assert_eq!(used, 24);
        assert!(parsed.extended);
        assert_eq!(parsed.data0, 3);
        assert_eq!(parsed.payload, payload.as_slice());
    }

    #[test]
    fn test_partial_frame() {
        let frame = encode_request_frame(16, 1, &[0u8; 8], false);
        assert!(RequestFrame::parse(&frame[..6]).is_none());
    }
}
