//! Pending request table
//!
//! Requests that expect a reply are remembered by sequence number until the
//! matching reply or error arrives. Each entry completes at most once; there
//! is no retry and no timeout.

use super::Client;
use crate::protocol::{ClientError, WireReader, X11Error, X11Result};
use std::cell::Cell;
use std::collections::VecDeque;
use std::os::fd::OwnedFd;
use std::rc::Rc;

/// Lifecycle of a request that expects a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Sent, nothing received yet
    Pending,
    /// The caller lost interest; the reply will be discarded
    Cancelled,
    /// The reply or error has been delivered
    Completed,
}

/// Handle to an in-flight request
#[derive(Debug, Clone)]
pub struct Cookie {
    sequence: u16,
    state: Rc<Cell<RequestState>>,
}

impl Cookie {
    pub fn sequence_number(&self) -> u16 {
        self.sequence
    }

    pub fn state(&self) -> RequestState {
        self.state.get()
    }

    /// Drop the completion locally. The server still processes the request.
    pub fn cancel(&self) {
        if self.state.get() == RequestState::Pending {
            self.state.set(RequestState::Cancelled);
        }
    }
}

/// A reply message, minus its 8-byte header
#[derive(Debug)]
pub struct Reply {
    pub data0: u8,
    pub sequence: u16,
    /// Bytes 8.. of the message
    pub payload: Vec<u8>,
    /// Descriptors the server sent with this reply, in order
    fds: VecDeque<OwnedFd>,
}

impl Reply {
    pub fn new(data0: u8, sequence: u16, payload: Vec<u8>) -> Self {
        Reply {
            data0,
            sequence,
            payload,
            fds: VecDeque::new(),
        }
    }

    pub(crate) fn with_fds(mut self, fds: Vec<OwnedFd>) -> Self {
        self.fds.extend(fds);
        self
    }

    pub fn reader(&self) -> WireReader<'_> {
        WireReader::new(&self.payload)
    }

    pub fn fd_count(&self) -> usize {
        self.fds.len()
    }

    /// Take the next descriptor carried by this reply
    pub fn take_fd(&mut self) -> X11Result<OwnedFd> {
        self.fds.pop_front().ok_or(ClientError::MissingFd)
    }
}

pub(crate) type ReplyHandler = Box<dyn FnOnce(&mut Client, Result<Reply, X11Error>)>;

pub(crate) struct PendingRequest {
    sequence: u16,
    state: Rc<Cell<RequestState>>,
    carries_fds: bool,
    handler: ReplyHandler,
}

impl PendingRequest {
    /// Whether the reply's data0 byte counts descriptors sent along with it
    pub(crate) fn carries_fds(&self) -> bool {
        self.carries_fds
    }

    /// Deliver the outcome unless the caller cancelled in the meantime.
    /// A discarded reply closes any descriptors it carried.
    pub(crate) fn complete(self, client: &mut Client, result: Result<Reply, X11Error>) {
        if self.state.get() == RequestState::Cancelled {
            log::debug!("Discarding completion of cancelled request {}", self.sequence);
            return;
        }
        self.state.set(RequestState::Completed);
        (self.handler)(client, result);
    }
}

/// In-flight requests in send order
#[derive(Default)]
pub(crate) struct PendingTable {
    requests: VecDeque<PendingRequest>,
}

impl PendingTable {
    pub(crate) fn insert(
        &mut self,
        sequence: u16,
        carries_fds: bool,
        handler: ReplyHandler,
    ) -> Cookie {
        let state = Rc::new(Cell::new(RequestState::Pending));
        self.requests.push_back(PendingRequest {
            sequence,
            state: Rc::clone(&state),
            carries_fds,
            handler,
        });
        Cookie { sequence, state }
    }

    /// Remove the oldest entry waiting on `sequence`
    pub(crate) fn take(&mut self, sequence: u16) -> Option<PendingRequest> {
        let index = self.requests.iter().position(|r| r.sequence == sequence)?;
        self.requests.remove(index)
    }

    pub(crate) fn contains(&self, sequence: u16) -> bool {
        self.requests.iter().any(|r| r.sequence == sequence)
    }

    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }

    /// Forget every entry; none of them will ever complete
    pub(crate) fn clear(&mut self) {
        for request in self.requests.drain(..) {
            if request.state.get() == RequestState::Pending {
                request.state.set(RequestState::Cancelled);
            }
        }
    }
}
