//! Connection Handler
//!
//! Serves one client: read a command, run it against the engine, reply.

use std::io::{self, BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{Result, SegError};
use crate::protocol::{read_command, write_response, Command, Response};

/// One client session
///
/// Requests are answered strictly in order; the engine is shared with
/// every other session.
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    engine: Arc<Engine>,
    peer_addr: String,
    /// Requests answered so far
    served: u64,
}

/// Errors that just mean the client went away
fn is_disconnect(e: &SegError) -> bool {
    matches!(
        e,
        SegError::Io(io_err) if matches!(
            io_err.kind(),
            io::ErrorKind::UnexpectedEof
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::WouldBlock
                | io::ErrorKind::TimedOut
        )
    )
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            engine,
            peer_addr,
            served: 0,
        })
    }

    /// Configure connection timeouts (0 = no timeout)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let to_timeout = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));
        self.reader.get_ref().set_read_timeout(to_timeout(read_ms))?;
        self.writer.get_ref().set_write_timeout(to_timeout(write_ms))?;
        Ok(())
    }

    /// Serve requests until the client disconnects or sends a malformed frame
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(peer = %self.peer_addr, "connection established");

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!(peer = %self.peer_addr, served = self.served, reason = %e, "client disconnected");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "bad request");
                    let _ = self.send_response(Response::error(&e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!(
                peer = %self.peer_addr,
                kind = ?command.command_type(),
                key_len = command.key().map_or(0, <[u8]>::len),
                "received command"
            );

            let response = self.execute_command(command);
            self.served += 1;

            if let Err(e) = self.send_response(response) {
                if is_disconnect(&e) {
                    tracing::debug!(peer = %self.peer_addr, "client left before the response was sent");
                    return Ok(());
                }
                tracing::warn!(peer = %self.peer_addr, error = %e, "write failed");
                return Err(e);
            }
        }
    }

    /// Run a command against the engine and build the reply
    fn execute_command(&self, command: Command) -> Response {
        let expects_value = command.expects_value();

        match self.engine.execute(command) {
            Ok(value) => Response::for_value(value, expects_value),
            Err(e) => {
                tracing::error!(peer = %self.peer_addr, error = %e, "command failed");
                Response::error(&e.to_string())
            }
        }
    }

    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    pub fn served(&self) -> u64 {
        self.served
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
