//! Non-blocking command channel reader.
//!
//! The channel is a named FIFO (or any ordered byte stream) written by a
//! single external producer, one JSON request per newline-terminated line.
//! [`ChannelReader::poll`] never blocks: if the path does not exist yet, or
//! no complete line has arrived, it reports nothing available. A malformed
//! line is the producer's problem — it is consumed and dropped, not
//! surfaced as a bridge fault.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;

use tracing::debug;

use crate::models::Request;
use crate::{AppError, Result};

/// Single-consumer reader over the request channel.
pub struct ChannelReader {
    path: PathBuf,
    pipe: Option<File>,
    buf: Vec<u8>,
}

impl ChannelReader {
    /// Create a reader for the channel at `path`.
    ///
    /// The path does not need to exist yet; [`poll`](Self::poll) opens it
    /// lazily once the producer has created it.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            pipe: None,
            buf: Vec::new(),
        }
    }

    /// Poll for the next request without blocking.
    ///
    /// Returns `Ok(None)` when the channel does not exist, no complete line
    /// is available, or the next line is not a valid request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] on a hard open or read failure. The
    /// reader drops its handle on failure and reopens on a later poll.
    pub fn poll(&mut self) -> Result<Option<Request>> {
        self.fill_buf()?;
        Ok(self.take_line().and_then(|line| parse_line(&line)))
    }

    /// Drain all currently-available bytes from the channel into the buffer.
    fn fill_buf(&mut self) -> Result<()> {
        if self.pipe.is_none() {
            match open_channel(&self.path) {
                Ok(Some(file)) => self.pipe = Some(file),
                Ok(None) => return Ok(()),
                Err(err) => {
                    return Err(AppError::Channel(format!(
                        "cannot open {}: {err}",
                        self.path.display()
                    )))
                }
            }
        }

        let Some(pipe) = self.pipe.as_mut() else {
            return Ok(());
        };

        let mut chunk = [0_u8; 4096];
        loop {
            match pipe.read(&mut chunk) {
                // No writer connected right now; whatever was written is
                // already in the buffer.
                Ok(0) => return Ok(()),
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.pipe = None;
                    return Err(AppError::Channel(format!(
                        "read from {} failed: {err}",
                        self.path.display()
                    )));
                }
            }
        }
    }

    /// Remove and return the first complete line from the buffer, if any.
    fn take_line(&mut self) -> Option<String> {
        let newline = self.buf.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&line).trim_end().to_owned())
    }
}

/// Parse one channel line; malformed input is discarded.
fn parse_line(line: &str) -> Option<Request> {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => Some(request),
        Err(err) => {
            debug!(%err, "discarding malformed channel line");
            None
        }
    }
}

/// Open the channel read end, returning `Ok(None)` when it does not exist.
#[cfg(unix)]
fn open_channel(path: &std::path::Path) -> std::io::Result<Option<File>> {
    use std::os::unix::fs::OpenOptionsExt;

    // O_NONBLOCK lets the read end open without a connected writer and
    // keeps subsequent reads from suspending the loop.
    match std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(nix::fcntl::OFlag::O_NONBLOCK.bits())
        .open(path)
    {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(not(unix))]
fn open_channel(path: &std::path::Path) -> std::io::Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}
