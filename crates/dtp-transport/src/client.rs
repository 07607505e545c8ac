use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use dtp_core::StatusCode;

use crate::codec;

/// Blocking one-shot DTP client.
///
/// Sends `packet` as a single write, half-closes, and reads the 4-byte status.
/// Whatever an endpoint wrote ahead of the status is returned as the preamble.
pub struct Transmission {
    pub preamble: Vec<u8>,
    pub status: StatusCode,
}

pub fn transmit(addr: SocketAddr, packet: &[u8]) -> io::Result<StatusCode> {
    transmit_with_timeout(addr, packet, None).map(|t| t.status)
}

pub fn transmit_with_timeout(
    addr: SocketAddr,
    packet: &[u8],
    timeout: Option<Duration>,
) -> io::Result<Transmission> {
    let mut stream = match timeout {
        Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
        None => TcpStream::connect(addr)?,
    };
    stream.set_read_timeout(timeout)?;
    stream.write_all(packet)?;
    stream.shutdown(Shutdown::Write)?;

    let mut response = Vec::new();
    io::Read::read_to_end(&mut stream, &mut response)?;
    split_response(response)
}

/// Splits everything read from a connection into preamble and status trailer.
pub fn split_response(mut response: Vec<u8>) -> io::Result<Transmission> {
    if response.len() < codec::RESPONSE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("connection closed after {} of {} status bytes", response.len(), codec::RESPONSE_LEN),
        ));
    }
    let trailer = response.split_off(response.len() - codec::RESPONSE_LEN);
    let mut frame = [0u8; codec::RESPONSE_LEN];
    frame.copy_from_slice(&trailer);
    Ok(Transmission {
        preamble: response,
        status: codec::decode_status(frame),
    })
}
