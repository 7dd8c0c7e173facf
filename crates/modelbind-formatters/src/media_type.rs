//! Supported media type matching.

use mime::Mime;

/// The media types a formatter accepts.
///
/// Matching ignores case and parameters other than `charset`. A supported
/// type may use `*` for its type or subtype, and a subtype such as
/// `*+json` matches any structured syntax suffix (`application/problem+json`).
/// When a supported type declares a charset, the request must declare the
/// same one.
///
/// # Example
///
/// ```rust
/// use modelbind_formatters::MediaTypeCollection;
///
/// let mut types = MediaTypeCollection::new();
/// types.add("application/json").unwrap();
/// types.add("application/*+json").unwrap();
///
/// assert!(types.is_supported("application/json; charset=utf-8"));
/// assert!(types.is_supported("application/problem+json"));
/// assert!(!types.is_supported("text/xml"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MediaTypeCollection {
    types: Vec<Mime>,
}

impl MediaTypeCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and adds a supported media type.
    ///
    /// # Errors
    ///
    /// Returns an error if `media_type` is not a valid media type.
    pub fn add(&mut self, media_type: &str) -> Result<(), mime::FromStrError> {
        self.types.push(media_type.parse()?);
        Ok(())
    }

    /// Adds an already parsed media type.
    pub fn push(&mut self, media_type: Mime) {
        self.types.push(media_type);
    }

    /// Returns the supported types in registration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Mime] {
        &self.types
    }

    /// Returns the number of supported types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are supported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns `true` if a raw `Content-Type` value is supported.
    #[must_use]
    pub fn is_supported(&self, content_type: &str) -> bool {
        content_type
            .parse::<Mime>()
            .is_ok_and(|requested| self.matches(&requested))
    }

    /// Returns `true` if any supported type accepts `requested`.
    #[must_use]
    pub fn matches(&self, requested: &Mime) -> bool {
        self.types
            .iter()
            .any(|supported| media_type_accepts(supported, requested))
    }
}

impl FromIterator<Mime> for MediaTypeCollection {
    fn from_iter<I: IntoIterator<Item = Mime>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

fn media_type_accepts(supported: &Mime, requested: &Mime) -> bool {
    let type_matches = supported.type_() == mime::STAR || supported.type_() == requested.type_();
    if !type_matches {
        return false;
    }

    let subtype_matches = if supported.subtype() == mime::STAR {
        match supported.suffix() {
            Some(suffix) => requested.suffix() == Some(suffix),
            None => true,
        }
    } else {
        supported.subtype() == requested.subtype() && supported.suffix() == requested.suffix()
    };
    if !subtype_matches {
        return false;
    }

    match supported.get_param(mime::CHARSET) {
        Some(charset) => requested
            .get_param(mime::CHARSET)
            .is_some_and(|requested| requested.as_str().eq_ignore_ascii_case(charset.as_str())),
        None => true,
    }
}
