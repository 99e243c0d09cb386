//! Wire codec
//!
//! Little-endian cursor encoding and decoding of the primitive X11 wire types.
//! Messages are sliced to their declared length before a reader is created,
//! so a read past the end of a slice means the peer sent a short record.

use byteorder::{ByteOrder as _, LittleEndian};
use std::fmt;
use std::os::fd::OwnedFd;

use super::pad;

/// Error returned when a read would run past the end of the message slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    UnexpectedEnd { offset: usize, needed: usize, available: usize },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::UnexpectedEnd {
                offset,
                needed,
                available,
            } => write!(
                f,
                "read of {} bytes at offset {} exceeds message length {}",
                needed, offset, available
            ),
        }
    }
}

impl std::error::Error for WireError {}

/// Cursor over a received message
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        WireReader { data, offset: 0 }
    }

    /// Current cursor position
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEnd {
                offset: self.offset,
                needed: n,
                available: self.data.len(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    pub fn card8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn bool(&mut self) -> Result<bool, WireError> {
        Ok(self.card8()? != 0)
    }

    pub fn card16(&mut self) -> Result<u16, WireError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn card32(&mut self) -> Result<u32, WireError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn card64(&mut self) -> Result<u64, WireError> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn int16(&mut self) -> Result<i16, WireError> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn int32(&mut self) -> Result<i32, WireError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn int64(&mut self) -> Result<i64, WireError> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    /// Signed 16.16 fixed point, as used by XInput2 coordinates
    pub fn fp1616(&mut self) -> Result<f64, WireError> {
        Ok(self.int32()? as f64 / 65536.0)
    }

    /// 32.32 fixed point: a signed integral word, then the fraction
    pub fn fp3232(&mut self) -> Result<f64, WireError> {
        let integral = self.int32()? as f64;
        let fraction = self.card32()? as f64 / 4_294_967_296.0;
        Ok(integral + fraction)
    }

    /// Skip a fixed number of unused bytes
    pub fn padding(&mut self, n: usize) -> Result<(), WireError> {
        self.take(n).map(|_| ())
    }

    /// Advance to the next 4-byte boundary
    pub fn align(&mut self) -> Result<(), WireError> {
        self.padding(pad(self.offset))
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        self.take(n)
    }

    /// Latin-1 string of a known length, not NUL terminated
    pub fn string8(&mut self, n: usize) -> Result<String, WireError> {
        Ok(self.take(n)?.iter().map(|&b| b as char).collect())
    }

    pub fn card32_list(&mut self, n: usize) -> Result<Vec<u32>, WireError> {
        (0..n).map(|_| self.card32()).collect()
    }
}

/// Growable request buffer with optional file descriptors riding alongside
#[derive(Debug, Default)]
pub struct WireWriter {
    data: Vec<u8>,
    fds: Vec<OwnedFd>,
}

impl WireWriter {
    pub fn new() -> Self {
        WireWriter::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn card8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.card8(value as u8)
    }

    pub fn card16(&mut self, value: u16) -> &mut Self {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.data.extend_from_slice(&buf);
        self
    }

    pub fn card32(&mut self, value: u32) -> &mut Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.data.extend_from_slice(&buf);
        self
    }

    pub fn card64(&mut self, value: u64) -> &mut Self {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        self.data.extend_from_slice(&buf);
        self
    }

    pub fn int16(&mut self, value: i16) -> &mut Self {
        self.card16(value as u16)
    }

    pub fn int32(&mut self, value: i32) -> &mut Self {
        self.card32(value as u32)
    }

    pub fn int64(&mut self, value: i64) -> &mut Self {
        self.card64(value as u64)
    }

    pub fn padding(&mut self, n: usize) -> &mut Self {
        self.data.resize(self.data.len() + n, 0);
        self
    }

    /// Zero-fill up to the next 4-byte boundary
    pub fn align(&mut self) -> &mut Self {
        self.padding(pad(self.data.len()))
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.data.extend_from_slice(value);
        self
    }

    pub fn string8(&mut self, value: &str) -> &mut Self {
        self.bytes(value.as_bytes())
    }

    /// Attach a descriptor to be passed with the request
    pub fn fd(&mut self, fd: OwnedFd) -> &mut Self {
        self.fds.push(fd);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<OwnedFd>) {
        (self.data, self.fds)
    }
}
