//! Handshake message header framing: 1-byte type + 3-byte big-endian
//! length. Grounded in `Handshake::parse`'s envelope handling in
//! `tls/handshake.rs`, simplified to header-only framing since per-message
//! body parsing is out of scope here.

pub const HANDSHAKE_HEADER_LEN: usize = 4;

/// A fixed implementation cap on message length, independent of (and
/// tighter than) the 2^24-1 the 3-byte length field could in principle
/// encode.
pub const MAX_HANDSHAKE_MESSAGE_LEN: usize = 64 * 1024;

pub fn write_header(msg_type: u8, body_len: u32, out: &mut Vec<u8>) {
    out.push(msg_type);
    let len_bytes = body_len.to_be_bytes();
    out.extend_from_slice(&len_bytes[1..]); // drop the top byte of a u32 for a u24
}

/// Parses a 4-byte handshake header. Returns `(msg_type, body_len)`.
pub fn parse_header(header: &[u8; HANDSHAKE_HEADER_LEN]) -> (u8, u32) {
    let msg_type = header[0];
    let body_len = u32::from_be_bytes([0, header[1], header[2], header[3]]);
    (msg_type, body_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips() {
        let mut buf = vec![];
        write_header(2, 0x01_0203, &mut buf);
        assert_eq!(buf, vec![2, 0x01, 0x02, 0x03]);
        let header: [u8; 4] = buf.try_into().unwrap();
        assert_eq!(parse_header(&header), (2, 0x01_0203));
    }
}
