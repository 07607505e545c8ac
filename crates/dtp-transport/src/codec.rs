//! # dtp-transport: Response Codec
//!
//! The only bytes the core protocol writes back: a 4-byte status in network byte
//! order, followed by closing the connection.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::{Buf, BufMut};
use dtp_core::StatusCode;

pub const RESPONSE_LEN: usize = 4;

pub fn encode_status(status: StatusCode) -> [u8; RESPONSE_LEN] {
    let mut frame = [0u8; RESPONSE_LEN];
    (&mut frame[..]).put_u32(status.as_u32());
    frame
}

pub fn decode_status(frame: [u8; RESPONSE_LEN]) -> StatusCode {
    StatusCode::new((&frame[..]).get_u32())
}

/// Writes `status` and closes the connection.
///
/// Expects the peer to still be connected; a failed write is returned but the
/// connection is closed either way.
pub fn send_response_and_close(status: StatusCode, mut connection: TcpStream) -> io::Result<()> {
    let written = connection
        .write_all(&encode_status(status))
        .and_then(|_| connection.flush());
    let _ = connection.shutdown(Shutdown::Both);
    written
}

/// Reads the status trailer a DTP server sends back.
pub fn read_response<R: Read>(reader: &mut R) -> io::Result<StatusCode> {
    let mut frame = [0u8; RESPONSE_LEN];
    reader.read_exact(&mut frame)?;
    Ok(decode_status(frame))
}
