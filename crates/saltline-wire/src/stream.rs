//! Version-negotiated byte streams.
//!
//! A [`WireWriter`] and [`WireReader`] wrap an [`io::Write`] / [`io::Read`]
//! and carry the protocol version the two peers negotiated for this stream.
//! Field presence on the wire is decided by comparing that version against
//! the release that introduced the field, so the version travels with the
//! stream rather than with every value.

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{WireError, WireResult};
use crate::version::Version;

/// A value that can travel on a version-negotiated stream.
///
/// Implementations must write exactly the fields the stream's protocol
/// version says exist, and read them back in the same order, so that two
/// builds that negotiated the same version agree byte for byte.
pub trait WireCodec: Sized {
    fn write_to<W: Write>(&self, writer: &mut WireWriter<W>) -> WireResult<()>;
    fn read_from<R: Read>(reader: &mut WireReader<R>) -> WireResult<Self>;
}

/// Writes wire primitives for a peer that speaks `protocol`.
pub struct WireWriter<W: Write> {
    inner: W,
    protocol: Version,
}

impl<W: Write> WireWriter<W> {
    pub fn new(inner: W, protocol: Version) -> WireWriter<W> {
        WireWriter { inner, protocol }
    }

    /// Version negotiated with the peer this stream writes to.
    pub fn protocol(&self) -> Version {
        self.protocol
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes a u32 as LEB128 groups of seven bits, low group first.
    pub fn write_vint(&mut self, mut value: u32) -> WireResult<()> {
        while value & !0x7F != 0 {
            self.inner.write_u8((value & 0x7F) as u8 | 0x80)?;
            value >>= 7;
        }
        self.inner.write_u8(value as u8)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> WireResult<()> {
        self.inner.write_u8(u8::from(value))?;
        Ok(())
    }

    /// Writes a vint byte length followed by the UTF-8 bytes.
    pub fn write_string(&mut self, value: &str) -> WireResult<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| WireError::LengthOverflow { len: value.len() })?;
        self.write_vint(len)?;
        self.inner.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Writes a vint count followed by each string, order preserved.
    pub fn write_string_seq(&mut self, values: &[String]) -> WireResult<()> {
        let count = u32::try_from(values.len())
            .map_err(|_| WireError::LengthOverflow { len: values.len() })?;
        self.write_vint(count)?;
        for value in values {
            self.write_string(value)?;
        }
        Ok(())
    }
}

/// Reads wire primitives from a peer that speaks `protocol`.
pub struct WireReader<R: Read> {
    inner: R,
    protocol: Version,
}

impl<R: Read> WireReader<R> {
    pub fn new(inner: R, protocol: Version) -> WireReader<R> {
        WireReader { inner, protocol }
    }

    /// Version negotiated with the peer this stream reads from.
    pub fn protocol(&self) -> Version {
        self.protocol
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_byte(&mut self) -> WireResult<u8> {
        self.inner.read_u8().map_err(eof_to_wire)
    }

    /// Reads a LEB128 u32. At most five bytes; the fifth byte carries only
    /// the top four bits, so any higher bit set there means the encoding
    /// cannot have come from [`WireWriter::write_vint`].
    pub fn read_vint(&mut self) -> WireResult<u32> {
        let mut value = 0u32;
        for shift in [0u32, 7, 14, 21] {
            let byte = self.read_byte()?;
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        let byte = self.read_byte()?;
        if byte & 0xF0 != 0 {
            return Err(WireError::InvalidVInt);
        }
        Ok(value | (u32::from(byte) << 28))
    }

    pub fn read_bool(&mut self) -> WireResult<bool> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(WireError::InvalidBoolean(byte)),
        }
    }

    /// Reads a length-prefixed UTF-8 string. Allocation is bounded by the
    /// bytes actually present, so a corrupt length prefix on a short stream
    /// fails with [`WireError::UnexpectedEof`] instead of reserving memory.
    pub fn read_string(&mut self) -> WireResult<String> {
        let len = self.read_vint()? as usize;
        let mut bytes = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut bytes)
            .map_err(WireError::Io)?;
        if bytes.len() != len {
            return Err(WireError::UnexpectedEof);
        }
        Ok(String::from_utf8(bytes)?)
    }

    pub fn read_string_seq(&mut self) -> WireResult<Vec<String>> {
        let count = self.read_vint()?;
        let mut values = Vec::new();
        for _ in 0..count {
            values.push(self.read_string()?);
        }
        Ok(values)
    }
}

fn eof_to_wire(err: io::Error) -> WireError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        WireError::UnexpectedEof
    } else {
        WireError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn writer() -> WireWriter<Vec<u8>> {
        WireWriter::new(Vec::new(), Version::CURRENT)
    }

    fn reader(bytes: &[u8]) -> WireReader<&[u8]> {
        WireReader::new(bytes, Version::CURRENT)
    }

    #[test]
    fn vint_round_trips() {
        for value in [0u32, 1, 127, 128, 300, 16_383, 16_384, 0x0FFF_FFFF, u32::MAX] {
            let mut w = writer();
            w.write_vint(value).unwrap();
            let bytes = w.into_inner();
            assert_eq!(reader(&bytes).read_vint().unwrap(), value, "value {value}");
        }
    }

    #[test]
    fn vint_byte_layout() {
        let mut w = writer();
        w.write_vint(127).unwrap();
        assert_eq!(w.into_inner(), vec![0x7F]);

        let mut w = writer();
        w.write_vint(128).unwrap();
        assert_eq!(w.into_inner(), vec![0x80, 0x01]);

        let mut w = writer();
        w.write_vint(u32::MAX).unwrap();
        assert_eq!(w.into_inner(), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn vint_rejects_overlong_encoding() {
        let mut r = reader(&[0x80, 0x80, 0x80, 0x80, 0x10]);
        assert!(matches!(r.read_vint(), Err(WireError::InvalidVInt)));
    }

    #[test]
    fn vint_truncation_is_eof() {
        let mut r = reader(&[0x80]);
        assert!(matches!(r.read_vint(), Err(WireError::UnexpectedEof)));
    }

    #[test]
    fn bool_round_trips_and_rejects_other_bytes() {
        let mut w = writer();
        w.write_bool(true).unwrap();
        w.write_bool(false).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes, vec![0x01, 0x00]);

        let mut r = reader(&bytes);
        assert!(r.read_bool().unwrap());
        assert!(!r.read_bool().unwrap());

        let mut r = reader(&[0x02]);
        assert!(matches!(r.read_bool(), Err(WireError::InvalidBoolean(0x02))));
    }

    #[test]
    fn string_round_trips() {
        for value in ["", "a", "analysis-icu", "naïve-plugins-\u{20AC}"] {
            let mut w = writer();
            w.write_string(value).unwrap();
            let bytes = w.into_inner();
            assert_eq!(reader(&bytes).read_string().unwrap(), value);
        }
    }

    #[test]
    fn string_with_short_payload_is_eof() {
        let mut w = writer();
        w.write_string("plugin").unwrap();
        let mut bytes = w.into_inner();
        bytes.truncate(bytes.len() - 2);
        let mut r = reader(&bytes);
        assert!(matches!(r.read_string(), Err(WireError::UnexpectedEof)));
    }

    #[test]
    fn string_with_invalid_utf8_is_rejected() {
        let mut r = reader(&[0x02, 0xC3, 0x28]);
        assert!(matches!(r.read_string(), Err(WireError::InvalidUtf8(_))));
    }

    #[test]
    fn string_seq_preserves_order_and_empty_entries() {
        let values = vec!["first".to_string(), String::new(), "third".to_string()];
        let mut w = writer();
        w.write_string_seq(&values).unwrap();
        let bytes = w.into_inner();
        assert_eq!(reader(&bytes).read_string_seq().unwrap(), values);
    }

    #[test]
    fn version_travels_as_vint_id() {
        let mut w = writer();
        Version::V_2_0_0_BETA2.write_to(&mut w).unwrap();
        let bytes = w.into_inner();
        let mut r = reader(&bytes);
        assert_eq!(Version::read_from(&mut r).unwrap(), Version::V_2_0_0_BETA2);
    }

    #[test]
    fn streams_expose_negotiated_protocol() {
        let w = WireWriter::new(Vec::<u8>::new(), Version::V_2_1_0);
        assert_eq!(w.protocol(), Version::V_2_1_0);
        let r = WireReader::new(io::empty(), Version::V_2_1_0);
        assert_eq!(r.protocol(), Version::V_2_1_0);
    }
}
