//! UNIX domain socket transport
//!
//! Descriptors travel as `SCM_RIGHTS` ancillary data, which MIT-SHM and DRI3
//! use to share memory and buffers with the server.

use super::{DisplayName, Transport};
use crate::client::Client;
use crate::protocol::ClientError;
use nix::sys::socket::{recvmsg, sendmsg, ControlMessage, ControlMessageOwned, MsgFlags};
use std::io::{self, IoSlice, IoSliceMut, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;

/// Size of each read from the socket
const READ_CHUNK_SIZE: usize = 65536;

/// Most descriptors accepted alongside one read
const MAX_FDS_PER_READ: usize = 16;

/// Writing half of a local X server connection
#[derive(Debug)]
pub struct UnixTransport {
    stream: UnixStream,
}

impl UnixTransport {
    /// Connect to the socket for `display`, returning the writing and reading halves
    pub fn connect(display: &DisplayName) -> io::Result<(UnixTransport, UnixReader)> {
        let path = display.socket_path();
        log::info!("Connecting to X server at {}", path.display());
        let stream = UnixStream::connect(&path)?;
        let reader = UnixReader {
            stream: stream.try_clone()?,
            buffer: Vec::new(),
        };
        Ok((UnixTransport { stream }, reader))
    }
}

impl Transport for UnixTransport {
    fn write(&mut self, data: &[u8], fds: Vec<OwnedFd>) -> io::Result<()> {
        if fds.is_empty() {
            return self.stream.write_all(data);
        }

        let raw_fds: Vec<RawFd> = fds.iter().map(|fd| fd.as_raw_fd()).collect();
        let iov = [IoSlice::new(data)];
        let cmsgs = [ControlMessage::ScmRights(&raw_fds)];
        let sent = sendmsg::<()>(self.stream.as_raw_fd(), &iov, &cmsgs, MsgFlags::empty(), None)
            .map_err(io::Error::from)?;
        // The descriptors went out with the first byte; our copies close on drop
        self.stream.write_all(&data[sent..])
    }
}

/// Reading half of a local X server connection.
///
/// Holds bytes the client has not consumed yet and re-presents them together
/// with the next chunk.
#[derive(Debug)]
pub struct UnixReader {
    stream: UnixStream,
    buffer: Vec<u8>,
}

impl UnixReader {
    /// Block for the next chunk and feed it to `client`.
    ///
    /// Returns `Ok(false)` once the server has closed the connection.
    pub fn read_into(&mut self, client: &mut Client) -> Result<bool, ClientError> {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        let mut cmsg_buffer = nix::cmsg_space!([RawFd; MAX_FDS_PER_READ]);
        let (length, fds) = {
            let mut iov = [IoSliceMut::new(&mut chunk)];
            let msg = recvmsg::<()>(
                self.stream.as_raw_fd(),
                &mut iov,
                Some(&mut cmsg_buffer),
                MsgFlags::empty(),
            )
            .map_err(io::Error::from)?;

            let mut fds = Vec::new();
            for cmsg in msg.cmsgs().map_err(io::Error::from)? {
                if let ControlMessageOwned::ScmRights(received) = cmsg {
                    // SAFETY: the kernel just installed these descriptors for us
                    fds.extend(received.into_iter().map(|fd| unsafe { OwnedFd::from_raw_fd(fd) }));
                }
            }
            (msg.bytes, fds)
        };

        if length == 0 {
            log::info!("X server closed the connection");
            return Ok(false);
        }
        log::trace!("Read {} bytes and {} fds from X server", length, fds.len());

        client.push_received_fds(fds);
        self.buffer.extend_from_slice(&chunk[..length]);
        let used = client.process_input(&self.buffer);
        self.buffer.drain(..used);
        Ok(true)
    }

    /// Bytes received but not yet consumed by the client
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}
