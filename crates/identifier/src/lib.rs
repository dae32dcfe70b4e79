//! Patient identifier resolution.
//!
//! Responders reach ERA with whatever a scan produced: the text payload of an
//! NFC tag, a decoded QR code, a pasted link, or a UUID typed from a printed
//! card. This crate turns that heterogeneous input into one *canonical*
//! patient identifier, or rejects it outright. It never produces a partial or
//! best-effort guess.
//!
//! ## Canonical tag form
//! - Length: 36
//! - Shape: lowercase hyphenated UUID (`8-4-4-4-12`), hyphens at offsets
//!   8, 13, 18 and 23, hexadecimal everywhere else
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Notes:
//! - Hex digits are accepted case-insensitively on input and normalised to
//!   lowercase. This is the only normalisation performed.
//! - URL inputs must be absolute and carry the fixed path
//!   `/patient/<canonical tag>`; any other path shape is rejected.
//! - Every rejection surfaces the same opaque [`IdentifierError::Invalid`].
//!   Callers get no hint of *why* an input failed, only that no identifier
//!   was produced.

mod tag;

pub use tag::PatientTag;

/// Errors produced while resolving a patient identifier.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The input could not be resolved to a canonical patient tag.
    ///
    /// Deliberately carries no detail: an empty string, a malformed UUID and
    /// a URL with the wrong path shape are all indistinguishable to the
    /// caller.
    #[error("invalid patient identifier")]
    Invalid,
}

pub type IdentifierResult<T> = std::result::Result<T, IdentifierError>;
