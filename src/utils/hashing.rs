//! Password hashing for the admin HTTP surface, and the Blowfish-ECB
//! transform applied to client-submitted registration hashes (§6).

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use blowfish::Blowfish;
use cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use rand::rngs::OsRng;

use crate::errors::ServerError;

/// Hashes `password` for storage in the admin config.
pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| ServerError::Configuration(err.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies `password` against a previously-hashed admin password.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(value) => value,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Encrypts a registration hash with the configured Blowfish key, ECB mode,
/// one 8-byte block at a time (the client hash is always 32 hex chars, i.e.
/// four whole blocks; no padding is required).
///
/// Grounded in §6/§10.5: "the posted hash is Blowfish-ECB-encrypted with a
/// server-held key before storage".
pub fn encrypt_registration_hash(key: &[u8], hash: &str) -> String {
    let cipher = Blowfish::new_from_slice(key).expect("blowfish key must be 4-56 bytes");
    let mut bytes = hash.as_bytes().to_vec();
    // Pad to a whole number of 8-byte blocks with zero bytes.
    let remainder = bytes.len() % 8;
    if remainder != 0 {
        bytes.resize(bytes.len() + (8 - remainder), 0);
    }

    for block in bytes.chunks_mut(8) {
        let mut array = GenericArray::clone_from_slice(block);
        cipher.encrypt_block(&mut array);
        block.copy_from_slice(&array);
    }

    hex::encode(bytes)
}
