//! Body decoding: quoted-printable HTML, or plain text wrapped in `<pre>`.

use std::io::{self, BufRead, Read};

use crate::capture::error::CaptureError;
use crate::capture::message::ParsedMessage;

/// Turn a parsed message into one renderable HTML document.
///
/// A non-empty HTML body is decoded as quoted-printable; a malformed body
/// fails the whole decode. Otherwise the text body is wrapped verbatim.
pub fn decode_body(msg: &ParsedMessage) -> Result<Vec<u8>, CaptureError> {
    if msg.html_body.is_empty() {
        return Ok(plain_text_document(&msg.text_body).into_bytes());
    }

    let mut decoded = Vec::with_capacity(msg.html_body.len());
    QuotedPrintableReader::new(msg.html_body.as_bytes())
        .read_to_end(&mut decoded)
        .map_err(CaptureError::Decode)?;
    Ok(decoded)
}

/// Wrap text in a minimal UTF-8 HTML document. The text is not escaped.
pub fn plain_text_document(text: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"></head><body><pre>{text}</pre></body></html>"
    )
}

/// Streaming quoted-printable decoder (RFC 2045 section 6.7).
///
/// Input is decoded one line at a time, so lines may be of any length.
/// Hard line breaks are kept as they appear in the input. An `=` that does
/// not start a valid escape is passed through unchanged, unless nothing or a
/// bare CR follows it.
pub struct QuotedPrintableReader<R> {
    inner: R,
    line: Vec<u8>,
    decoded: Vec<u8>,
    pos: usize,
}

impl<R: BufRead> QuotedPrintableReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: Vec::new(),
            decoded: Vec::new(),
            pos: 0,
        }
    }
}

impl<R: BufRead> Read for QuotedPrintableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.decoded.len() {
            self.decoded.clear();
            self.pos = 0;
            self.line.clear();
            if self.inner.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(0);
            }
            decode_line(&self.line, &mut self.decoded)?;
        }

        let pending = &self.decoded[self.pos..];
        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.pos += n;
        Ok(n)
    }
}

fn decode_line(line: &[u8], out: &mut Vec<u8>) -> io::Result<()> {
    let (body, ending): (&[u8], &[u8]) = if let Some(body) = line.strip_suffix(b"\r\n") {
        (body, &b"\r\n"[..])
    } else if let Some(body) = line.strip_suffix(b"\n") {
        (body, &b"\n"[..])
    } else {
        (line, &b""[..])
    };

    // Trailing whitespace was added in transport
    let end = body
        .iter()
        .rposition(|b| *b != b' ' && *b != b'\t')
        .map_or(0, |i| i + 1);
    let body = &body[..end];

    let (body, ending) = match body.strip_suffix(b"=") {
        Some(body) => (body, &b""[..]), // soft line break
        None => (body, ending),
    };

    let mut i = 0;
    while i < body.len() {
        let byte = body[i];
        match byte {
            b'=' => match (body.get(i + 1), body.get(i + 2)) {
                (None, _) => return Err(invalid_data("dangling '=' in line")),
                (Some(b'\r'), _) => return Err(invalid_data("'=' before a bare CR")),
                (Some(hi), lo) => match (hex_value(*hi), lo.and_then(|lo| hex_value(*lo))) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'=');
                        i += 1;
                    }
                },
            },
            b'\t' | b'\r' => {
                out.push(byte);
                i += 1;
            }
            0x00..=0x1f | 0x7f => {
                return Err(invalid_data(&format!(
                    "unescaped control byte 0x{byte:02x}"
                )));
            }
            _ => {
                out.push(byte);
                i += 1;
            }
        }
    }

    out.extend_from_slice(ending);
    Ok(())
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("quoted-printable: {msg}"))
}
