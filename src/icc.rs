//! Structural ICC profile parser.
//!
//! This reads the 128-byte profile header and the tag table, and bounds-checks every tag. Tag data
//! is kept as-is; only a handful of commonly needed tags are decoded on request.


use std::fmt;

use bytemuck::AnyBitPattern;

use crate::color::Xyz;

/// Size of the fixed profile header.
pub const HEADER_SIZE: usize = 128;
/// Profile file signature, must be `acsp`.
pub const PROFILE_SIGNATURE: Signature = Signature(*b"acsp");

/// Size of one tag table entry (signature, offset, size).
const TAG_ENTRY_SIZE: usize = 12;

/// Errors that can occur when parsing an ICC profile.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IccError {
    /// The profile data is too small to contain the header or tag table.
    TooSmall { expected: usize, actual: usize },
    /// The profile signature is not `acsp`.
    InvalidSignature(Signature),
    /// The size stored in the header exceeds the amount of profile data.
    SizeMismatch { header_size: u32, actual_size: usize },
    /// The tag count is too large to be addressable.
    TooManyTags(u32),
    /// A tag table entry points outside of the profile data.
    TagOutOfBounds {
        tag: Signature,
        offset: u32,
        size: u32,
        profile_size: usize,
    },
}

impl fmt::Display for IccError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { expected, actual } => write!(
                f,
                "ICC profile too small: expected at least {expected} bytes, got {actual}"
            ),
            Self::InvalidSignature(sig) => {
                write!(f, "invalid ICC profile signature {sig:?} (expected 'acsp')")
            }
            Self::SizeMismatch {
                header_size,
                actual_size,
            } => write!(
                f,
                "ICC profile header specifies {header_size} bytes, but only {actual_size} are present"
            ),
            Self::TooManyTags(count) => write!(f, "ICC profile tag count {count} is too large"),
            Self::TagOutOfBounds {
                tag,
                offset,
                size,
                profile_size,
            } => write!(
                f,
                "ICC tag {tag:?} out of bounds: offset {offset} + size {size} > profile size {profile_size}"
            ),
        }
    }
}

impl std::error::Error for IccError {}

/// A four-character code, as used for tag signatures, type signatures, and colour spaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 4]);

impl Signature {
    pub const DISPLAY: Self = Self(*b"mntr");
    pub const INPUT: Self = Self(*b"scnr");
    pub const OUTPUT: Self = Self(*b"prtr");
    pub const RGB: Self = Self(*b"RGB ");
    pub const GRAY: Self = Self(*b"GRAY");
    pub const CMYK: Self = Self(*b"CMYK");
    pub const XYZ: Self = Self(*b"XYZ ");
    pub const LAB: Self = Self(*b"Lab ");
    /// `desc` – profile description tag.
    pub const DESCRIPTION: Self = Self(*b"desc");
    /// `cprt` – copyright tag.
    pub const COPYRIGHT: Self = Self(*b"cprt");
    /// `wtpt` – media white point tag.
    pub const MEDIA_WHITE_POINT: Self = Self(*b"wtpt");
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            write!(f, "'{}'", self.0.escape_ascii())
        } else {
            write!(f, "0x{:08X}", u32::from_be_bytes(self.0))
        }
    }
}

/// Profile version, `major.minor.bugfix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
    pub bugfix: u8,
}

/// Raw on-disk layout of the profile header. All fields are big-endian.
#[derive(Clone, Copy, AnyBitPattern)]
#[repr(C)]
#[allow(dead_code)]
struct RawHeader {
    size: [u8; 4],
    cmm_type: [u8; 4],
    version: [u8; 4],
    device_class: [u8; 4],
    color_space: [u8; 4],
    pcs: [u8; 4],
    creation_date: [u8; 12],
    signature: [u8; 4],
    platform: [u8; 4],
    flags: [u8; 4],
    manufacturer: [u8; 4],
    model: [u8; 4],
    attributes: [u8; 8],
    rendering_intent: [u8; 4],
    illuminant: [u8; 12],
    creator: [u8; 4],
    profile_id: [u8; 16],
    reserved: [u8; 28],
}

#[derive(Clone, Copy, AnyBitPattern)]
#[repr(C)]
struct RawTagEntry {
    signature: [u8; 4],
    offset: [u8; 4],
    size: [u8; 4],
}

/// The fixed-size header at the start of every ICC profile.
#[derive(Debug, Clone, PartialEq)]
pub struct IccHeader {
    /// Profile size in bytes, as declared by the header.
    pub size: u32,
    pub cmm_type: Signature,
    pub version: ProfileVersion,
    /// Device class (`mntr`, `scnr`, `prtr`, ...).
    pub device_class: Signature,
    /// Colour space of the image data (`RGB `, `GRAY`, `CMYK`, ...).
    pub color_space: Signature,
    /// Profile connection space (`XYZ ` or `Lab `).
    pub pcs: Signature,
    /// Primary platform (`APPL`, `MSFT`, ...), or zero.
    pub platform: Signature,
    pub flags: u32,
    pub manufacturer: Signature,
    pub model: Signature,
    pub attributes: u64,
    pub rendering_intent: u32,
    /// The PCS illuminant, nominally D50.
    pub illuminant: Xyz,
    pub creator: Signature,
    pub profile_id: [u8; 16],
}

/// An entry in the profile's tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub signature: Signature,
    pub offset: u32,
    pub size: u32,
}

/// A structurally valid ICC profile.
#[derive(Debug, Clone)]
pub struct IccProfile {
    header: IccHeader,
    tags: Vec<Tag>,
    data: Vec<u8>,
}

impl IccProfile {
    /// Parses an ICC profile from its serialized form.
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        Self::from_vec(data.to_vec())
    }

    /// Parses an ICC profile, taking ownership of the data.
    pub fn from_vec(data: Vec<u8>) -> Result<Self, IccError> {
        if data.len() < HEADER_SIZE + 4 {
            return Err(IccError::TooSmall {
                expected: HEADER_SIZE + 4,
                actual: data.len(),
            });
        }

        let raw: &RawHeader = bytemuck::from_bytes(&data[..HEADER_SIZE]);
        let signature = Signature(raw.signature);
        if signature != PROFILE_SIGNATURE {
            return Err(IccError::InvalidSignature(signature));
        }

        let size = u32::from_be_bytes(raw.size);
        if size as usize > data.len() {
            return Err(IccError::SizeMismatch {
                header_size: size,
                actual_size: data.len(),
            });
        }

        let header = IccHeader {
            size,
            cmm_type: Signature(raw.cmm_type),
            version: ProfileVersion {
                major: raw.version[0],
                minor: raw.version[1] >> 4,
                bugfix: raw.version[1] & 0xf,
            },
            device_class: Signature(raw.device_class),
            color_space: Signature(raw.color_space),
            pcs: Signature(raw.pcs),
            platform: Signature(raw.platform),
            flags: u32::from_be_bytes(raw.flags),
            manufacturer: Signature(raw.manufacturer),
            model: Signature(raw.model),
            attributes: u64::from_be_bytes(raw.attributes),
            rendering_intent: u32::from_be_bytes(raw.rendering_intent),
            illuminant: read_xyz_number(&raw.illuminant),
            creator: Signature(raw.creator),
            profile_id: raw.profile_id,
        };

        let tags = read_tag_table(&data)?;

        log::trace!(
            "ICC profile: {} bytes, version {}.{}, {:?} {:?} -> {:?}, {} tags",
            data.len(),
            header.version.major,
            header.version.minor,
            header.device_class,
            header.color_space,
            header.pcs,
            tags.len(),
        );

        Ok(Self { header, tags, data })
    }

    #[inline]
    pub fn header(&self) -> &IccHeader {
        &self.header
    }

    #[inline]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the serialized profile.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the raw data of the tag with the given signature, including its type signature.
    pub fn tag_data(&self, signature: Signature) -> Option<&[u8]> {
        let tag = self.tags.iter().find(|t| t.signature == signature)?;
        // Bounds were checked when parsing the tag table.
        let start = tag.offset as usize;
        Some(&self.data[start..start + tag.size as usize])
    }

    /// Returns the profile description (`desc` tag), if present and in a supported encoding.
    pub fn description(&self) -> Option<String> {
        decode_text(self.tag_data(Signature::DESCRIPTION)?)
    }

    pub fn copyright(&self) -> Option<String> {
        decode_text(self.tag_data(Signature::COPYRIGHT)?)
    }

    /// Returns the media white point (`wtpt` tag).
    pub fn media_white_point(&self) -> Option<Xyz> {
        let data = self.tag_data(Signature::MEDIA_WHITE_POINT)?;
        if data.len() < 20 || data[..4] != *b"XYZ " {
            return None;
        }
        Some(read_xyz_number(&data[8..20]))
    }
}

fn read_tag_table(data: &[u8]) -> Result<Vec<Tag>, IccError> {
    let count = u32::from_be_bytes([
        data[HEADER_SIZE],
        data[HEADER_SIZE + 1],
        data[HEADER_SIZE + 2],
        data[HEADER_SIZE + 3],
    ]);
    let table_start = HEADER_SIZE + 4;
    let table_end = usize::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(TAG_ENTRY_SIZE))
        .and_then(|len| len.checked_add(table_start))
        .ok_or(IccError::TooManyTags(count))?;
    if data.len() < table_end {
        return Err(IccError::TooSmall {
            expected: table_end,
            actual: data.len(),
        });
    }

    let entries: &[RawTagEntry] = bytemuck::cast_slice(&data[table_start..table_end]);
    entries
        .iter()
        .map(|raw| {
            let tag = Tag {
                signature: Signature(raw.signature),
                offset: u32::from_be_bytes(raw.offset),
                size: u32::from_be_bytes(raw.size),
            };
            let end = u64::from(tag.offset) + u64::from(tag.size);
            if end > data.len() as u64 {
                return Err(IccError::TagOutOfBounds {
                    tag: tag.signature,
                    offset: tag.offset,
                    size: tag.size,
                    profile_size: data.len(),
                });
            }
            Ok(tag)
        })
        .collect()
}

/// Reads three `s15Fixed16Number`s.
fn read_xyz_number(bytes: &[u8]) -> Xyz {
    let s15f16 = |b: &[u8]| i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f32 / 65536.0;
    Xyz::new(s15f16(&bytes[0..4]), s15f16(&bytes[4..8]), s15f16(&bytes[8..12]))
}

fn decode_text(data: &[u8]) -> Option<String> {
    if data.len() < 8 {
        return None;
    }
    let count = || {
        let b = data.get(8..12)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize)
    };

    match &data[..4] {
        // textDescriptionType (v2): ASCII count incl. NUL, then ASCII.
        b"desc" => {
            let count = count()?;
            let ascii = data.get(12..12usize.checked_add(count)?)?;
            let ascii = ascii.split(|b| *b == 0).next().unwrap_or(ascii);
            Some(String::from_utf8_lossy(ascii).into_owned())
        }
        // textType (v2 copyright): NUL-terminated ASCII after the reserved bytes.
        b"text" => {
            let ascii = &data[8..];
            let ascii = ascii.split(|b| *b == 0).next().unwrap_or(ascii);
            Some(String::from_utf8_lossy(ascii).into_owned())
        }
        // multiLocalizedUnicodeType (v4): records of UTF-16BE strings; use the first one.
        b"mluc" => {
            if count()? == 0 {
                return None;
            }
            let record = data.get(16..28)?;
            let len = u32::from_be_bytes([record[4], record[5], record[6], record[7]]) as usize;
            let offset = u32::from_be_bytes([record[8], record[9], record[10], record[11]]) as usize;
            let utf16 = data.get(offset..offset.checked_add(len)?)?;
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            Some(String::from_utf16_lossy(&units))
        }
        _ => None,
    }
}
