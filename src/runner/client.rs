//! Database client capability and a blocking RESP2 implementation.
//!
//! The runner only ever needs "send a command, get a reply" plus the address the vendor runner should dial.
//! [`CommandClient`] and [`LiveInstance`] capture exactly that; [`RespClient`] is the networked implementation
//! and tests substitute in-process fakes.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;

/// Maximum nesting of RESP arrays accepted from a server.
const MAX_REPLY_DEPTH: usize = 32;

/// Largest bulk string accepted, matching the server's default `proto-max-bulk-len`.
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Errors from talking to a database instance.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("server closed the connection")]
    Closed,
}

/// Host and port of a live instance, as seen from the machine running conformkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A decoded RESP2 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Option<Vec<u8>>),
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// Whether this is the `PONG` status (or bulk) reply to `PING`.
    pub fn is_pong(&self) -> bool {
        match self {
            Reply::Status(s) => s == "PONG",
            Reply::Bulk(Some(b)) => b == b"PONG",
            _ => false,
        }
    }
}

/// Something that can issue a command and receive a reply.
pub trait CommandClient {
    fn execute(&mut self, args: &[&str]) -> Result<Reply, ClientError>;
}

/// A live database instance the vendor runner can be pointed at.
pub trait LiveInstance: CommandClient {
    fn endpoint(&self) -> Endpoint;
}

/// Blocking RESP2 client over TCP.
pub struct RespClient {
    endpoint: Endpoint,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl RespClient {
    /// Connect with a timeout applied to connect, reads and writes.
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self, ClientError> {
        let connect_err = |source: io::Error| ClientError::Connect {
            endpoint: endpoint.clone(),
            source,
        };

        let addrs: Vec<_> = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(connect_err)?
            .collect();

        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no addresses resolved");
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    let writer = stream.try_clone()?;
                    tracing::debug!(%endpoint, %addr, "connected");
                    return Ok(Self {
                        endpoint: endpoint.clone(),
                        reader: BufReader::new(stream),
                        writer,
                    });
                }
                Err(e) => last_err = e,
            }
        }

        Err(connect_err(last_err))
    }
}

impl CommandClient for RespClient {
    fn execute(&mut self, args: &[&str]) -> Result<Reply, ClientError> {
        self.writer.write_all(&encode_command(args))?;
        self.writer.flush()?;
        read_reply(&mut self.reader)
    }
}

impl LiveInstance for RespClient {
    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }
}

/// Encode a command as a RESP array of bulk strings.
pub fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Read one reply from a buffered stream.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply, ClientError> {
    read_reply_at(reader, 0)
}

fn read_reply_at<R: BufRead>(reader: &mut R, depth: usize) -> Result<Reply, ClientError> {
    if depth > MAX_REPLY_DEPTH {
        return Err(ClientError::Protocol("reply nested too deeply".into()));
    }

    let line = read_line(reader)?;
    let mut chars = line.chars();
    let kind = chars.next().unwrap_or('\0');
    let rest = chars.as_str();
    match kind {
        '+' => Ok(Reply::Status(rest.to_string())),
        '-' => Ok(Reply::Error(rest.to_string())),
        ':' => Ok(Reply::Integer(parse_int(rest)?)),
        '$' => {
            let len = parse_int(rest)?;
            if len < 0 {
                return Ok(Reply::Bulk(None));
            }
            let len = usize::try_from(len)
                .ok()
                .filter(|&n| n <= MAX_BULK_LEN)
                .ok_or_else(|| ClientError::Protocol(format!("bad bulk length {len}")))?;
            let mut buf = vec![0u8; len + 2];
            reader.read_exact(&mut buf)?;
            if &buf[len..] != b"\r\n" {
                return Err(ClientError::Protocol("bulk string not terminated by CRLF".into()));
            }
            buf.truncate(len);
            Ok(Reply::Bulk(Some(buf)))
        }
        '*' => {
            let count = parse_int(rest)?;
            if count < 0 {
                return Ok(Reply::Array(None));
            }
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(read_reply_at(reader, depth + 1)?);
            }
            Ok(Reply::Array(Some(items)))
        }
        other => Err(ClientError::Protocol(format!("unknown reply type {other:?}"))),
    }
}

/// Read a CRLF-terminated header line (without the terminator).
fn read_line<R: BufRead>(reader: &mut R) -> Result<String, ClientError> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Err(ClientError::Closed);
    }
    if !buf.ends_with(b"\r\n") || buf.len() < 3 {
        return Err(ClientError::Protocol("malformed reply header".into()));
    }
    buf.truncate(buf.len() - 2);
    String::from_utf8(buf).map_err(|_| ClientError::Protocol("reply header is not UTF-8".into()))
}

fn parse_int(s: &str) -> Result<i64, ClientError> {
    s.parse()
        .map_err(|_| ClientError::Protocol(format!("invalid integer {s:?}")))
}
