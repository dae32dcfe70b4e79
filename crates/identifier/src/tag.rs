//! The canonical patient tag type and the scan-input resolver.

use crate::{IdentifierError, IdentifierResult};
use std::{fmt, str::FromStr};
use url::Url;
use uuid::Uuid;

/// Byte offsets of the four hyphens in the canonical form.
const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Length of the canonical form.
const CANONICAL_LEN: usize = 36;

/// ERA's canonical patient identifier (36-character lowercase hyphenated
/// UUID).
///
/// Once constructed, the contained identifier is guaranteed canonical, so it
/// can be embedded in record-store queries and scan URLs without further
/// checking.
///
/// # Construction
/// - [`PatientTag::new`] mints a fresh identifier (for printing new cards or
///   encoding new tags).
/// - [`PatientTag::parse`] validates a string that is already a hyphenated
///   UUID (hex case is forgiven and normalised).
/// - [`PatientTag::resolve`] is the scan-input entry point: it additionally
///   accepts absolute URLs carrying the `/patient/<uuid>` path.
///
/// # Display format
/// Always the canonical 36-character lowercase hyphenated form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatientTag(Uuid);

impl PatientTag {
    /// Mints a new random patient tag.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a string that must already be a hyphenated UUID.
    ///
    /// Uppercase hex digits are accepted and normalised to lowercase; every
    /// other deviation (wrong length, misplaced hyphens, non-hex bytes, the
    /// 32-character unhyphenated form) is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Invalid`] if `input` is not a hyphenated
    /// UUID.
    pub fn parse(input: &str) -> IdentifierResult<Self> {
        if Self::is_hyphenated(input) {
            // SAFETY: is_hyphenated guarantees the 8-4-4-4-12 hex shape, so
            // parse_str cannot fail.
            let uuid = Uuid::parse_str(input).expect("is_hyphenated guarantees a valid UUID");
            return Ok(Self(uuid));
        }
        Err(IdentifierError::Invalid)
    }

    /// Resolves raw scan/paste input into a canonical tag.
    ///
    /// The input is trimmed, then tried as a bare hyphenated UUID (the
    /// common case for manual entry and tags encoding a bare identifier),
    /// then as an absolute URL whose path is exactly `/patient/<uuid>`.
    /// Anything else is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Invalid`] for every rejection cause.
    pub fn resolve(raw: &str) -> IdentifierResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Invalid);
        }

        if Self::is_hyphenated(trimmed) {
            return Self::parse(trimmed);
        }

        Self::from_scan_url(trimmed)
    }

    /// Resolves the URL form of a scanned identifier.
    ///
    /// Relative inputs fail `Url::parse` and are rejected; so are URLs with
    /// any path other than exactly two segments, `patient` followed by a
    /// hyphenated UUID. Query strings and fragments are ignored.
    fn from_scan_url(trimmed: &str) -> IdentifierResult<Self> {
        let parsed = Url::parse(trimmed).map_err(|_| IdentifierError::Invalid)?;
        let mut segments = parsed.path_segments().ok_or(IdentifierError::Invalid)?;
        match (segments.next(), segments.next(), segments.next()) {
            (Some("patient"), Some(id), None) => Self::parse(id),
            _ => Err(IdentifierError::Invalid),
        }
    }

    /// Returns true if `input` has the canonical hyphenated shape, ignoring
    /// hex case.
    ///
    /// Purely syntactic: length 36, hyphens at offsets 8/13/18/23, hex
    /// digits everywhere else. The UUID version nibble is not inspected.
    pub fn is_hyphenated(input: &str) -> bool {
        if input.len() != CANONICAL_LEN {
            return false;
        }
        input.bytes().enumerate().all(|(i, b)| {
            if HYPHENS.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_hexdigit()
            }
        })
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PatientTag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatientTag {
    /// Formats the tag in canonical form (lowercase hyphenated).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for PatientTag {
    type Err = IdentifierError;

    /// Strict form: equivalent to [`PatientTag::parse`]. Use
    /// [`PatientTag::resolve`] for raw scan input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientTag::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PatientTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PatientTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientTag::parse(&s).map_err(serde::de::Error::custom)
    }
}
