//! Bytes-to-typed-value decoding shared by the success and error paths.

use encoding_rs::Encoding;
use serde::de::DeserializeOwned;

use crate::error::DecodeError;
use crate::headers::parse_charset;
use crate::http::NetworkResponse;

/// Charset used for request bodies.
pub const PROTOCOL_CHARSET: &str = "utf-8";

/// Content type reported for every JSON request.
pub const PROTOCOL_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// How a charset label is decoded.
enum Charset {
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    /// US-ASCII: bytes above 0x7F are malformed.
    Ascii,
    /// Bare `UTF-16`: a byte-order mark picks the byte order, otherwise big-endian.
    Utf16,
    /// `UTF-32`; `None` sniffs a byte-order mark and defaults to big-endian.
    Utf32 { big_endian: Option<bool> },
    Other(&'static Encoding),
}

impl Charset {
    fn resolve(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        let charset = match normalized.as_str() {
            "iso-8859-1" | "iso8859-1" | "iso-8859-1:1987" | "8859-1" | "latin1" | "l1"
            | "cp819" | "ibm819" | "iso-ir-100" | "csisolatin1" => Self::Latin1,
            "us-ascii" | "ascii" | "iso646-us" | "csascii" => Self::Ascii,
            "utf-16" | "utf16" => Self::Utf16,
            "utf-32" | "utf32" => Self::Utf32 { big_endian: None },
            "utf-32be" | "x-utf-32be" => Self::Utf32 { big_endian: Some(true) },
            "utf-32le" | "x-utf-32le" => Self::Utf32 { big_endian: Some(false) },
            _ => Self::Other(Encoding::for_label(label.trim().as_bytes())?),
        };
        Some(charset)
    }
}

/// Decode `data` as text in the charset named by `label`.
///
/// The label is authoritative: a leading byte-order mark never switches the
/// charset. Only the byte-order-neutral `UTF-16` and `UTF-32` labels read a
/// mark, to choose the byte order, and default to big-endian without one.
/// ISO-8859-1 maps each byte to the code point of the same value.
/// Malformed sequences are replaced with U+FFFD rather than rejected; only an
/// unknown label fails.
pub fn decode_text(data: &[u8], label: &str) -> Result<String, DecodeError> {
    let charset = Charset::resolve(label).ok_or_else(|| DecodeError::UnsupportedCharset {
        charset: label.to_string(),
    })?;

    let (text, had_errors) = match charset {
        Charset::Latin1 => (data.iter().map(|&b| char::from(b)).collect::<String>(), false),
        Charset::Ascii => decode_ascii(data),
        Charset::Utf16 => match data {
            [0xFF, 0xFE, rest @ ..] => decode_with(encoding_rs::UTF_16LE, rest),
            [0xFE, 0xFF, rest @ ..] => decode_with(encoding_rs::UTF_16BE, rest),
            _ => decode_with(encoding_rs::UTF_16BE, data),
        },
        Charset::Utf32 { big_endian: Some(big_endian) } => decode_utf32(data, big_endian),
        Charset::Utf32 { big_endian: None } => match data {
            [0xFF, 0xFE, 0x00, 0x00, rest @ ..] => decode_utf32(rest, false),
            [0x00, 0x00, 0xFE, 0xFF, rest @ ..] => decode_utf32(rest, true),
            _ => decode_utf32(data, true),
        },
        Charset::Other(encoding) => decode_with(encoding, data),
    };
    if had_errors {
        tracing::debug!(charset = label, "replaced malformed byte sequences while decoding");
    }
    Ok(text)
}

fn decode_with(encoding: &'static Encoding, data: &[u8]) -> (String, bool) {
    let (text, had_errors) = encoding.decode_without_bom_handling(data);
    (text.into_owned(), had_errors)
}

fn decode_ascii(data: &[u8]) -> (String, bool) {
    let text: String = data
        .iter()
        .map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })
        .collect();
    (text, !data.is_ascii())
}

fn decode_utf32(data: &[u8], big_endian: bool) -> (String, bool) {
    let units = data.chunks_exact(4);
    let truncated = !units.remainder().is_empty();
    let mut had_errors = truncated;
    let mut text = String::with_capacity(data.len() / 4);
    for unit in units {
        let bytes = [unit[0], unit[1], unit[2], unit[3]];
        let code = if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        };
        text.push(char::from_u32(code).unwrap_or_else(|| {
            had_errors = true;
            char::REPLACEMENT_CHARACTER
        }));
    }
    if truncated {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    (text, had_errors)
}

/// Decode a response body into `T`, picking the charset from its
/// `Content-Type` header and falling back to `default_charset`.
pub fn decode_json<T: DeserializeOwned>(
    response: &NetworkResponse,
    default_charset: &str,
) -> Result<T, DecodeError> {
    let charset = parse_charset(&response.headers, default_charset);
    let text = decode_text(&response.data, &charset)?;
    Ok(serde_json::from_str(&text)?)
}
