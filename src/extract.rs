//! Metadata extraction from a stream of marker segments.

#![allow(non_snake_case)]

use std::io::BufRead;

use bytemuck::AnyBitPattern;

use crate::{
    error::{Error, Repr, Result},
    file::{Marker, SegmentReader},
    icc::IccProfile,
    metadata::Metadata,
};

/// Identifier at the start of APP2 segments that carry ICC profile chunks.
pub const ICC_PROFILE_IDENTIFIER: &[u8; 12] = b"ICC_PROFILE\0";

/// Length of the chunk header (chunk number and chunk total) following the identifier.
const CHUNK_HEADER_LEN: usize = 2;

/// The start of an SOF segment, up to (not including) the component specifications.
#[derive(Clone, Copy, AnyBitPattern)]
#[repr(C)]
struct FrameHeader {
    /// Sample precision in bits.
    P: u8,
    /// Number of lines.
    Y: [u8; 2],
    /// Number of samples per line.
    X: [u8; 2],
}

impl FrameHeader {
    fn read(data: &[u8]) -> Result<Self> {
        let len = std::mem::size_of::<Self>();
        if data.len() < len {
            return Err(Error::from(format!(
                "SOF segment too short: expected at least {len} bytes, got {}",
                data.len()
            )));
        }
        Ok(*bytemuck::from_bytes::<Self>(&data[..len]))
    }

    fn height(&self) -> u16 {
        u16::from_be_bytes(self.Y)
    }

    fn width(&self) -> u16 {
        u16::from_be_bytes(self.X)
    }
}

/// Reads segments until the first scan (or the end of the image) and collects the metadata found
/// on the way.
///
/// Only a clean stop at an SOS or EOI marker, with an SOF segment seen before it, produces
/// [`Metadata`]. Everything else is an error.
pub(crate) fn extract_metadata<R: BufRead>(reader: R) -> Result<Metadata> {
    let mut segments = SegmentReader::new(reader);
    let mut frame: Option<FrameHeader> = None;
    let mut icc_chunks: Option<IccChunks> = None;

    loop {
        let Some(segment) = segments.next_segment()? else {
            return Err(Error::from(Repr::UnexpectedEof));
        };

        match segment.marker() {
            Marker::SOF0 | Marker::SOF2 => {
                let header = FrameHeader::read(segment.data())?;
                log::debug!(
                    "{:?} frame: {}x{}, {} bits per component",
                    segment.marker(),
                    header.width(),
                    header.height(),
                    header.P,
                );
                frame = Some(header);
            }
            Marker::SOS | Marker::EOI => {
                log::debug!(
                    "reached {:?} at offset {}, stopping",
                    segment.marker(),
                    segment.offset()
                );
                break;
            }
            Marker::APP2 => {
                let data = segment.data();
                if data.len() < ICC_PROFILE_IDENTIFIER.len() + CHUNK_HEADER_LEN
                    || !data.starts_with(ICC_PROFILE_IDENTIFIER)
                {
                    log::warn!("ignoring non-ICC APP2 segment at offset {}", segment.offset());
                    continue;
                }

                let number = data[ICC_PROFILE_IDENTIFIER.len()];
                let total = data[ICC_PROFILE_IDENTIFIER.len() + 1];
                let chunks = icc_chunks.get_or_insert_with(|| IccChunks::new(total));

                let mut chunk = segment.into_data();
                chunk.drain(..ICC_PROFILE_IDENTIFIER.len() + CHUNK_HEADER_LEN);
                log::debug!(
                    "ICC profile chunk {}/{}: {} bytes",
                    number,
                    total,
                    chunk.len()
                );
                chunks.insert(number, total, chunk)?;
            }
            _ => {}
        }
    }

    let Some(frame) = frame else {
        return Err(Error::from(Repr::NoMetadata));
    };

    let color_profile = icc_chunks.map(|chunks| {
        let profile = IccProfile::from_vec(chunks.assemble());
        if let Err(e) = &profile {
            log::warn!("failed to parse embedded ICC profile: {e}");
        }
        profile
    });

    Ok(Metadata {
        pixel_width: frame.width().into(),
        pixel_height: frame.height().into(),
        bits_per_component: frame.P.into(),
        color_profile,
    })
}

/// The chunks of an ICC profile that is split across several APP2 segments.
///
/// The number of chunks is fixed by the first chunk seen. Chunks may arrive in any order.
#[derive(Debug)]
pub(crate) struct IccChunks {
    slots: Vec<Option<Vec<u8>>>,
}

impl IccChunks {
    pub(crate) fn new(total: u8) -> Self {
        Self {
            slots: vec![None; usize::from(total)],
        }
    }

    /// Stores chunk `number` (1-based) of a profile declared to consist of `total` chunks.
    pub(crate) fn insert(&mut self, number: u8, total: u8, chunk: Vec<u8>) -> Result<()> {
        if usize::from(total) != self.slots.len() {
            return Err(Error::from(Repr::InconsistentChunkCount {
                expected: self.slots.len(),
                found: total,
            }));
        }
        if number == 0 || usize::from(number) > self.slots.len() {
            return Err(Error::from(Repr::InvalidChunkNumber {
                number,
                total: self.slots.len(),
            }));
        }

        let slot = &mut self.slots[usize::from(number) - 1];
        if slot.is_some() {
            log::warn!("duplicate ICC profile chunk {number}, replacing previous one");
        }
        *slot = Some(chunk);
        Ok(())
    }

    /// Concatenates all chunks in chunk number order. Missing chunks contribute no bytes.
    pub(crate) fn assemble(self) -> Vec<u8> {
        let len = self.slots.iter().flatten().map(Vec::len).sum();
        let mut profile = Vec::with_capacity(len);
        for (i, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Some(chunk) => profile.extend_from_slice(&chunk),
                None => log::warn!("ICC profile chunk {} is missing", i + 1),
            }
        }
        profile
    }
}
