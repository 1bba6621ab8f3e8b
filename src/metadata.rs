use crate::icc::{IccError, IccProfile};

/// Metadata extracted from a JPEG image.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
    pub(crate) bits_per_component: u32,
    /// `None` if the image has no embedded ICC profile.
    pub(crate) color_profile: Option<Result<IccProfile, IccError>>,
}

impl Metadata {
    /// Returns the number of samples per line (the width of the frame).
    #[inline]
    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    /// Returns the number of lines in the image (the height of the frame).
    #[inline]
    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// Returns the sample precision in bits.
    #[inline]
    pub fn bits_per_component(&self) -> u32 {
        self.bits_per_component
    }

    /// Returns the embedded ICC profile, if there is one and it could be parsed.
    #[inline]
    pub fn color_profile(&self) -> Option<&IccProfile> {
        self.color_profile.as_ref()?.as_ref().ok()
    }

    /// Returns the error encountered while parsing the embedded ICC profile.
    ///
    /// A profile that fails to parse does not prevent the rest of the metadata from being returned.
    #[inline]
    pub fn color_profile_error(&self) -> Option<&IccError> {
        self.color_profile.as_ref()?.as_ref().err()
    }

    /// Returns the result of parsing the embedded ICC profile, or `None` if there is none.
    #[inline]
    pub fn color_profile_result(&self) -> Option<&Result<IccProfile, IccError>> {
        self.color_profile.as_ref()
    }
}
