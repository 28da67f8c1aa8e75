//! Length-prefixed archive format for fetched resources.
//!
//! An archive entry packs one HTTP fetch result into a byte stream the
//! extraction engine reads from its stdin:
//!
//! ```text
//! <url>\n
//! <status code>\n
//! <header length>\n<header bytes>
//! <body length>\n<body bytes>
//! ```
//!
//! Lengths are decimal byte counts of the block that follows. Blocks carry no
//! trailing separator, so an entry may be followed directly by the next one.
//!
//! # Example
//!
//! ```rust
//! use tagratio_core::archive::{FetchRecord, decode, encode};
//!
//! let record = FetchRecord::new("http://example.com", 200, "Content-Type: text/html\n", "<p>Hi</p>");
//! let bytes = encode(&record);
//! assert!(bytes.starts_with(b"http://example.com\n200\n24\n"));
//! assert_eq!(decode(&bytes).unwrap(), record);
//! ```

use std::io::{self, Write};

use thiserror::Error;

/// Result of fetching one resource.
///
/// The header block and body are opaque bytes; their lengths are measured in
/// bytes when encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    /// Final URL of the resource, after redirects. Must be a single line;
    /// [`FetchRecord::new`] strips line breaks the way URL parsing does.
    pub url: String,
    /// Response status code.
    pub status_code: u16,
    /// Raw header block, one `Name: value` line per header.
    pub header_block: Vec<u8>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl FetchRecord {
    pub fn new(
        url: impl Into<String>, status_code: u16, header_block: impl Into<Vec<u8>>, body: impl Into<Vec<u8>>,
    ) -> Self {
        let mut url = url.into();
        url.retain(|c| c != '\n' && c != '\r');
        Self { url, status_code, header_block: header_block.into(), body: body.into() }
    }

    /// Size of the encoded entry in bytes.
    pub fn encoded_len(&self) -> usize {
        let digits = |n: usize| n.to_string().len();
        self.url.len()
            + 1
            + digits(self.status_code as usize)
            + 1
            + digits(self.header_block.len())
            + 1
            + self.header_block.len()
            + digits(self.body.len())
            + 1
            + self.body.len()
    }
}

/// Errors raised while reading an archive stream.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArchiveError {
    /// The stream ended inside an entry.
    #[error("archive truncated while reading {field}")]
    Truncated { field: &'static str },

    /// A numeric line was not a plain decimal number.
    #[error("invalid {field} line: {line:?}")]
    InvalidNumber { field: &'static str, line: String },

    /// Bytes left over after a single entry.
    #[error("{len} unexpected bytes after archive entry")]
    TrailingBytes { len: usize },

    /// The URL line was not valid UTF-8.
    #[error("URL line is not valid UTF-8")]
    InvalidUrl,
}

/// Encodes a fetch record into a single archive entry.
pub fn encode(record: &FetchRecord) -> Vec<u8> {
    let mut out = Vec::with_capacity(record.encoded_len());
    out.extend_from_slice(record.url.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(format!("{}\n{}\n", record.status_code, record.header_block.len()).as_bytes());
    out.extend_from_slice(&record.header_block);
    out.extend_from_slice(format!("{}\n", record.body.len()).as_bytes());
    out.extend_from_slice(&record.body);
    out
}

/// Writes a fetch record as an archive entry to `writer`.
pub fn write_entry<W: Write>(record: &FetchRecord, writer: &mut W) -> io::Result<()> {
    writer.write_all(record.url.as_bytes())?;
    writer.write_all(b"\n")?;
    writeln!(writer, "{}", record.status_code)?;
    writeln!(writer, "{}", record.header_block.len())?;
    writer.write_all(&record.header_block)?;
    writeln!(writer, "{}", record.body.len())?;
    writer.write_all(&record.body)?;
    Ok(())
}

/// Decodes a byte stream holding exactly one archive entry.
///
/// Trailing bytes after the entry are an error.
pub fn decode(bytes: &[u8]) -> Result<FetchRecord, ArchiveError> {
    let mut reader = ArchiveReader::new(bytes);
    let record = reader.next().ok_or(ArchiveError::Truncated { field: "url" })??;
    if !reader.remaining().is_empty() {
        return Err(ArchiveError::TrailingBytes { len: reader.remaining().len() });
    }
    Ok(record)
}

/// Iterator over the entries of a concatenated archive stream.
pub struct ArchiveReader<'a> {
    rest: &'a [u8],
    failed: bool,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes, failed: false }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.rest
    }

    fn read_line(&mut self, field: &'static str) -> Result<&'a [u8], ArchiveError> {
        let end = self
            .rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(ArchiveError::Truncated { field })?;
        let line = &self.rest[..end];
        self.rest = &self.rest[end + 1..];
        Ok(line)
    }

    fn read_number(&mut self, field: &'static str) -> Result<usize, ArchiveError> {
        let line = self.read_line(field)?;
        let invalid = || ArchiveError::InvalidNumber { field, line: String::from_utf8_lossy(line).into_owned() };
        if line.is_empty() || !line.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        std::str::from_utf8(line)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)
    }

    fn read_block(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ArchiveError> {
        if self.rest.len() < len {
            return Err(ArchiveError::Truncated { field });
        }
        let (block, rest) = self.rest.split_at(len);
        self.rest = rest;
        Ok(block)
    }

    fn read_entry(&mut self) -> Result<FetchRecord, ArchiveError> {
        let url = std::str::from_utf8(self.read_line("url")?)
            .map_err(|_| ArchiveError::InvalidUrl)?
            .to_string();

        let status = self.read_number("status code")?;
        let status_code = u16::try_from(status)
            .map_err(|_| ArchiveError::InvalidNumber { field: "status code", line: status.to_string() })?;

        let header_len = self.read_number("header length")?;
        let header_block = self.read_block(header_len, "header block")?.to_vec();

        let body_len = self.read_number("body length")?;
        let body = self.read_block(body_len, "body")?.to_vec();

        Ok(FetchRecord { url, status_code, header_block, body })
    }
}

impl Iterator for ArchiveReader<'_> {
    type Item = Result<FetchRecord, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rest.is_empty() {
            return None;
        }
        let entry = self.read_entry();
        self.failed = entry.is_err();
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FetchRecord {
        FetchRecord::new("http://example.com", 200, "Content-Type: text/html\n", "<p>Hi</p>")
    }

    #[test]
    fn test_encode_layout() {
        let bytes = encode(&sample());
        assert_eq!(bytes, b"http://example.com\n200\n24\nContent-Type: text/html\n9\n<p>Hi</p>".to_vec());
        assert_eq!(bytes.len(), sample().encoded_len());
    }

    #[test]
    fn test_lengths_are_bytes_not_chars() {
        let record = FetchRecord::new("http://example.jp/", 200, "", "日本語");
        let bytes = encode(&record);
        assert!(bytes.ends_with("9\n日本語".as_bytes()));
        assert_eq!(decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_round_trip_binary_body() {
        let body: Vec<u8> = (0..=255u8).chain([b'\n', b'\n', 0]).collect();
        let record = FetchRecord::new("https://example.com/a?b=c", 404, b"X-A: 1\r\nX-B: 2\r\n".to_vec(), body);
        assert_eq!(decode(&encode(&record)).unwrap(), record);
    }

    #[test]
    fn test_empty_blocks() {
        let record = FetchRecord::new("ftp://example.com/", 226, "", "");
        let bytes = encode(&record);
        assert_eq!(bytes, b"ftp://example.com/\n226\n0\n0\n".to_vec());
        assert_eq!(decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_reader_multiple_entries() {
        let first = sample();
        let second = FetchRecord::new("http://example.org", 301, "Location: /\n", "");
        let mut stream = encode(&first);
        stream.extend(encode(&second));

        let entries: Vec<_> = ArchiveReader::new(&stream).collect::<Result<_, _>>().unwrap();
        assert_eq!(entries, vec![first, second]);
    }

    #[test]
    fn test_url_line_breaks_stripped() {
        let record = FetchRecord::new("http://example.com/a\r\n/b\n", 200, "", "x");
        assert_eq!(record.url, "http://example.com/a/b");
        let bytes = encode(&record);
        assert!(bytes.starts_with(b"http://example.com/a/b\n200\n0\n"));
        assert_eq!(decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_decode_truncated_body() {
        let mut bytes = encode(&sample());
        bytes.pop();
        assert_eq!(decode(&bytes), Err(ArchiveError::Truncated { field: "body" }));
    }

    #[test]
    fn test_decode_rejects_signed_length() {
        let bytes = b"http://example.com\n200\n-1\n0\n";
        assert!(matches!(
            decode(bytes),
            Err(ArchiveError::InvalidNumber { field: "header length", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode(&sample());
        bytes.extend_from_slice(b"junk");
        assert_eq!(decode(&bytes), Err(ArchiveError::TrailingBytes { len: 4 }));
    }
}
