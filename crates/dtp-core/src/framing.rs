use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;

use crate::registry::PacketTag;

/// Length of the tag prefix under [`TagFraming::Prefixed`].
pub const TAG_PREFIX_LEN: usize = 4;

/// How the packet tag is carried on the wire.
///
/// The base protocol has no length prefix or delimiter, so client and server must
/// agree on this out of band.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TagFraming {
    /// Every packet carries the configured fixed tag; the whole packet is the payload.
    #[default]
    Fixed,
    /// The first 4 bytes are the tag in network byte order, the rest is the payload.
    Prefixed,
}

impl TagFraming {
    /// Splits a raw packet into its tag and payload.
    ///
    /// Returns `None` for a prefixed packet too short to hold its tag.
    pub fn split(self, fixed_tag: PacketTag, packet: Bytes) -> Option<(PacketTag, Bytes)> {
        match self {
            TagFraming::Fixed => Some((fixed_tag, packet)),
            TagFraming::Prefixed => {
                if packet.len() < TAG_PREFIX_LEN {
                    return None;
                }
                let mut prefix = [0u8; TAG_PREFIX_LEN];
                prefix.copy_from_slice(&packet[..TAG_PREFIX_LEN]);
                Some((PacketTag::from_be_bytes(prefix), packet.slice(TAG_PREFIX_LEN..)))
            }
        }
    }
}

/// Builds a packet for a server using [`TagFraming::Prefixed`].
pub fn frame_tagged(tag: PacketTag, payload: &[u8]) -> Bytes {
    let mut packet = BytesMut::with_capacity(TAG_PREFIX_LEN + payload.len());
    packet.put_u32(tag);
    packet.put_slice(payload);
    packet.freeze()
}
