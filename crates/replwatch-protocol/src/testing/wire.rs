//! Server side of the RESP2 framing, just enough for [`super::FakeServer`]
//!
//! Requests are arrays of bulk strings; replies are one of the five scalar
//! reply types.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// A reply the fake server can send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Nil,
}

/// Decodes client commands, encodes replies
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerCodec;

impl Decoder for ServerCodec {
    type Item = Vec<Bytes>;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Vec<Bytes>>> {
        match parse_command(src)? {
            Some((args, consumed)) => {
                src.advance(consumed);
                Ok(Some(args))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<Reply> for ServerCodec {
    type Error = io::Error;

    fn encode(&mut self, reply: Reply, dst: &mut BytesMut) -> io::Result<()> {
        match reply {
            Reply::Status(status) => {
                dst.put_u8(b'+');
                dst.put_slice(status.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Reply::Error(message) => {
                dst.put_u8(b'-');
                dst.put_slice(message.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Reply::Integer(n) => dst.put_slice(format!(":{n}\r\n").as_bytes()),
            Reply::Bulk(data) => {
                dst.put_slice(format!("${}\r\n", data.len()).as_bytes());
                dst.put_slice(&data);
                dst.put_slice(b"\r\n");
            }
            Reply::Nil => dst.put_slice(b"$-1\r\n"),
        }
        Ok(())
    }
}

// `Ok(None)` until a whole command is buffered; nothing is consumed before that
fn parse_command(buf: &[u8]) -> io::Result<Option<(Vec<Bytes>, usize)>> {
    let Some((count, mut pos)) = read_length(buf, 0, b'*')? else {
        return Ok(None);
    };

    let mut args = Vec::with_capacity(count.min(16));
    for _ in 0..count {
        let Some((len, start)) = read_length(buf, pos, b'$')? else {
            return Ok(None);
        };
        let end = start + len;
        if buf.len() < end + 2 {
            return Ok(None);
        }
        if &buf[end..end + 2] != b"\r\n" {
            return Err(invalid("missing CRLF after bulk string".to_string()));
        }
        args.push(Bytes::copy_from_slice(&buf[start..end]));
        pos = end + 2;
    }

    Ok(Some((args, pos)))
}

/// Parse a `<prefix><len>\r\n` header at `pos`, returning the length and the
/// offset just past the header
fn read_length(buf: &[u8], pos: usize, prefix: u8) -> io::Result<Option<(usize, usize)>> {
    let Some(&first) = buf.get(pos) else {
        return Ok(None);
    };
    if first != prefix {
        return Err(invalid(format!(
            "expected '{}', got 0x{first:02x}",
            prefix as char
        )));
    }

    let Some(line_len) = buf[pos + 1..].windows(2).position(|w| w == b"\r\n") else {
        return Ok(None);
    };
    let line = &buf[pos + 1..pos + 1 + line_len];
    let len = std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| invalid(format!("invalid length {:?}", String::from_utf8_lossy(line))))?;

    Ok(Some((len, pos + 1 + line_len + 2)))
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
