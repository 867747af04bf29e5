//! UUID utilities

use rand::RngCore;
use uuid::Uuid;

/// Generate a new UUIDv4 as a hyphenated string
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a UUIDv4 string from the supplied random source
///
/// Seeded sources produce reproducible identifiers.
pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}
