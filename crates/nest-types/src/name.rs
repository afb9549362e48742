//! Resource name rules and random name generation.
//!
//! A valid name is any non-empty string. The empty string is reserved: it is
//! the lower bound every ordered child list is built with, so it can never be
//! stored as a key.

use rand::Rng;

use crate::error::TypeError;

/// Alphabet used for generated names: ASCII letters, digits, and `_`.
pub const NAME_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

/// Validate a user-supplied resource name.
///
/// # Examples
///
/// ```
/// use nest_types::validate_name;
///
/// assert!(validate_name("users").is_ok());
/// assert!(validate_name("").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".into(),
        });
    }
    Ok(())
}

/// Generate a random name of `len` characters drawn from [`NAME_ALPHABET`].
///
/// Collisions with existing names are not checked; callers treat them as an
/// acceptable low-probability event.
pub fn random_name(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| NAME_ALPHABET[rng.gen_range(0..NAME_ALPHABET.len())] as char)
        .collect()
}
