// SPDX-License-Identifier: LGPL-3.0-only

//! Owned synchronization fences.
//!
//! A [Fence] is a file descriptor that signals when an asynchronous GPU or
//! cross-process operation completes. Holding a `Fence` means owning the
//! descriptor: it is closed when the value is dropped, unless it has been
//! handed to the window (queue/cancel) or to the GPU backend first. This keeps
//! a fence owned by exactly one side at any time.

use std::fmt;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};

/// An owned fence descriptor.
pub struct Fence {
    fd: OwnedFd,
}

impl Fence {
    /// Raw descriptor number, for logging or passing to FFI that only borrows it.
    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Give up ownership of the descriptor, e.g. to import it as a GPU semaphore.
    pub fn into_owned_fd(self) -> OwnedFd {
        self.fd
    }

    /// Duplicate the descriptor so both copies can be waited on independently.
    pub fn try_clone(&self) -> std::io::Result<Self> {
        Ok(Self {
            fd: self.fd.try_clone()?,
        })
    }
}

impl From<OwnedFd> for Fence {
    fn from(fd: OwnedFd) -> Self {
        Self { fd }
    }
}

impl AsFd for Fence {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl fmt::Debug for Fence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fence").field(&self.raw_fd()).finish()
    }
}
