//! JPEG/JFIF marker segment reader.

#[cfg(test)]
mod tests;

use std::{
    fmt,
    io::{self, BufRead, Read},
};

use crate::error::{Error, Repr, Result};

/// Reads marker segments from a buffered byte stream, one at a time.
///
/// Unlike a full JPEG parser, this does not interpret segment contents, and it does not require the
/// stream to begin with an SOI marker. Entropy-coded scan data following an SOS segment is *not*
/// skipped, so callers are expected to stop reading once they reach the first scan.
pub struct SegmentReader<R> {
    reader: R,
    position: u64,
}

impl<R: BufRead> SegmentReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
        }
    }

    /// Returns the number of bytes consumed from the underlying reader so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next [`Segment`] from the stream.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before the next marker. A stream ending in
    /// the middle of a segment is reported as an error instead.
    pub fn next_segment(&mut self) -> Result<Option<Segment>> {
        let mut skipped = 0u64;
        loop {
            match self.try_read_u8()? {
                Some(0xff) => break,
                Some(_) => skipped += 1,
                None => {
                    if skipped != 0 {
                        log::warn!("ignoring {} trailing bytes at end of stream", skipped);
                    }
                    return Ok(None);
                }
            }
        }

        // Any number of 0xFF fill bytes may precede the marker type.
        let mut marker = self.read_marker_type()?;
        while marker == 0xff {
            marker = self.read_marker_type()?;
        }
        let offset = self.position - 2;

        if skipped != 0 {
            log::warn!(
                "skipped {} bytes of garbage before ff {:02x} marker at offset {}",
                skipped,
                marker,
                offset,
            );
        }

        if marker == 0x00 {
            return Err(Error::from(format!("invalid ff 00 marker at offset {offset}")));
        }

        let marker = Marker(marker);
        if marker.is_standalone() {
            return Ok(Some(Segment {
                marker,
                data: Vec::new(),
                offset,
            }));
        }

        let length = usize::from(self.read_length()?);
        let data = self.read_vec(length)?;

        log::trace!("{:?} segment at offset {}, {} bytes", marker, offset, length);

        Ok(Some(Segment {
            marker,
            data,
            offset,
        }))
    }

    fn try_read_u8(&mut self) -> Result<Option<u8>> {
        let byte = loop {
            match self.reader.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        let Some(byte) = byte else {
            return Ok(None);
        };
        self.reader.consume(1);
        self.position += 1;
        Ok(Some(byte))
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.try_read_u8()?.ok_or_else(unexpected_end)
    }

    /// Reads the byte following `0xFF`. End of stream here ends the image early.
    fn read_marker_type(&mut self) -> Result<u8> {
        self.try_read_u8()?.ok_or_else(|| Error::from(Repr::UnexpectedEof))
    }

    fn read_u16(&mut self) -> Result<u16> {
        let b = [self.read_u8()?, self.read_u8()?];
        Ok(u16::from_be_bytes(b))
    }

    fn read_vec(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(count);
        let read = (&mut self.reader)
            .take(count as u64)
            .read_to_end(&mut data)?;
        self.position += read as u64;
        if read < count {
            return Err(Error::from(format!(
                "segment truncated: expected {count} bytes of segment data, got {read}"
            )));
        }
        Ok(data)
    }

    fn read_length(&mut self) -> Result<u16> {
        // Length parameter is the length of the segment parameters, including the length parameter,
        // but excluding the FF xx marker.

        let len = self.read_u16()?;
        if len < 2 {
            return Err(Error::from(format!("invalid segment length {len}")));
        }
        Ok(len - 2)
    }
}

fn unexpected_end() -> Error {
    Error::from("reached end of data while decoding JPEG stream")
}

/// A segment of a JPEG file, introduced by a `0xFF 0xXX` marker.
#[derive(Debug)]
pub struct Segment {
    marker: Marker,
    data: Vec<u8>,
    offset: u64,
}

impl Segment {
    /// Returns the offset of the segment's `0xFF 0xXX` marker in the input stream.
    ///
    /// If the marker was preceded by fill bytes, this is the offset of the last `0xFF`.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// The segment payload, excluding the `0xFF 0xXX` marker and the segment length indication.
    ///
    /// This is always empty for standalone markers like SOI and EOI. For an SOS segment it contains
    /// only the scan header, none of the entropy-coded data following it.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// The marker type byte following `0xFF`, identifying the type of a segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker(pub u8);

impl Marker {
    /// Baseline DCT.
    pub const SOF0: Self = Self(0xC0);
    /// Extended Sequential DCT.
    pub const SOF1: Self = Self(0xC1);
    /// Progressive DCT.
    pub const SOF2: Self = Self(0xC2);
    /// Lossless sequential.
    pub const SOF3: Self = Self(0xC3);
    /// Define Huffman Tables.
    pub const DHT: Self = Self(0xC4);
    pub const SOF5: Self = Self(0xC5);
    pub const SOF6: Self = Self(0xC6);
    pub const SOF7: Self = Self(0xC7);
    // SOF9-SOF15 use arithmetic coding.
    pub const SOF9: Self = Self(0xC9);
    pub const SOF10: Self = Self(0xCA);
    pub const SOF11: Self = Self(0xCB);
    pub const SOF13: Self = Self(0xCD);
    pub const SOF14: Self = Self(0xCE);
    pub const SOF15: Self = Self(0xCF);
    /// Start Of Image.
    pub const SOI: Self = Self(0xD8);
    /// End Of Image.
    pub const EOI: Self = Self(0xD9);
    /// Start Of Scan.
    pub const SOS: Self = Self(0xDA);
    /// Define Quantization Tables.
    pub const DQT: Self = Self(0xDB);
    /// Define Restart Interval.
    pub const DRI: Self = Self(0xDD);
    /// JFIF header.
    pub const APP0: Self = Self(0xE0);
    /// Exif and XMP.
    pub const APP1: Self = Self(0xE1);
    /// ICC profile chunks (among other things).
    pub const APP2: Self = Self(0xE2);
    pub const APP3: Self = Self(0xE3);
    pub const APP4: Self = Self(0xE4);
    pub const APP5: Self = Self(0xE5);
    pub const APP6: Self = Self(0xE6);
    pub const APP7: Self = Self(0xE7);
    pub const APP8: Self = Self(0xE8);
    pub const APP9: Self = Self(0xE9);
    pub const APP10: Self = Self(0xEA);
    pub const APP11: Self = Self(0xEB);
    pub const APP12: Self = Self(0xEC);
    pub const APP13: Self = Self(0xED);
    /// Adobe.
    pub const APP14: Self = Self(0xEE);
    pub const APP15: Self = Self(0xEF);
    /// Comment.
    pub const COM: Self = Self(0xFE);
    /// Temporary private use in arithmetic coding.
    pub const TEM: Self = Self(0x01);

    /// Returns whether this marker stands on its own, without a length field or payload.
    ///
    /// The standalone markers are SOI, EOI, TEM, and RSTn.
    #[inline]
    pub fn is_standalone(self) -> bool {
        matches!(self.0, 0x01 | 0xD0..=0xD9)
    }

    /// Returns whether this is any of the SOFn markers that start a frame.
    #[inline]
    pub fn is_sof(self) -> bool {
        matches!(self.0, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
    }

    /// If this is an `APPn` marker, returns `n`.
    #[inline]
    pub fn app_n(self) -> Option<u8> {
        match self.0 {
            0xE0..=0xEF => Some(self.0 - 0xE0),
            _ => None,
        }
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0xC0..=0xCF if self.is_sof() => write!(f, "SOF{}", self.0 - 0xC0),
            0xD0..=0xD7 => write!(f, "RST{}", self.0 - 0xD0),
            0xE0..=0xEF => write!(f, "APP{}", self.0 - 0xE0),
            _ => match *self {
                Self::DHT => f.write_str("DHT"),
                Self::SOI => f.write_str("SOI"),
                Self::EOI => f.write_str("EOI"),
                Self::SOS => f.write_str("SOS"),
                Self::DQT => f.write_str("DQT"),
                Self::DRI => f.write_str("DRI"),
                Self::COM => f.write_str("COM"),
                Self::TEM => f.write_str("TEM"),
                _ => f
                    .debug_tuple("Marker")
                    .field(&format_args!("{:02x}", self.0))
                    .finish(),
            },
        }
    }
}
