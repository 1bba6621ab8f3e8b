//! Reads JPEG metadata (frame size, sample precision, and the embedded ICC profile) without
//! decoding the image, and without losing access to the image data.
//!
//! Only as much of the input stream is consumed as is needed to reach the first scan. Everything
//! that was consumed is kept in memory, so the [`Replay`] stream returned by [`load`] yields the
//! complete original stream and can be handed to a regular JPEG decoder afterwards.
//!
//! ```no_run
//! use std::{fs::File, io::Read};
//!
//! let (metadata, mut image) = jpegmeta::load(File::open("image.jpg")?);
//! match metadata {
//!     Ok(metadata) => println!("{}x{}", metadata.pixel_width(), metadata.pixel_height()),
//!     Err(e) => eprintln!("no metadata: {e}"),
//! }
//!
//! let mut jpeg = Vec::new();
//! image.read_to_end(&mut jpeg)?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod color;
mod error;
mod extract;
pub mod file;
pub mod icc;
mod metadata;
mod rewind;


use std::io::{BufRead, BufReader, Read};

pub use error::{Error, ErrorKind};
pub use extract::ICC_PROFILE_IDENTIFIER;
pub use metadata::Metadata;
pub use rewind::Replay;

use rewind::TeeReader;

/// Loads the metadata of a JPEG image stream.
///
/// Returns the extracted [`Metadata`] (or the reason it could not be extracted), together with a
/// [`Replay`] stream that yields the entire input, exactly as if `reader` had never been touched.
/// The replay stream is usable even if metadata extraction failed, so that the image can still be
/// decoded by other means.
///
/// A malformed embedded ICC profile is not an error here; it is reported through
/// [`Metadata::color_profile_error`] instead.
pub fn load<R: Read>(reader: R) -> (Result<Metadata, Error>, Replay<R>) {
    let mut tee = TeeReader::new(reader);
    let metadata = extract::extract_metadata(BufReader::new(&mut tee));
    if let Err(e) = &metadata {
        log::debug!("failed to extract JPEG metadata: {e}");
    }
    (metadata, tee.into_replay())
}

/// Reads the metadata of a JPEG image stream, without keeping a copy of the consumed data.
///
/// The reader is left positioned somewhere after the first SOS segment (if there is one).
pub fn read_metadata<R: BufRead>(reader: R) -> Result<Metadata, Error> {
    extract::extract_metadata(reader)
}
