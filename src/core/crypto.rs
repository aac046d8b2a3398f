use aes_gcm::{
    Aes256Gcm, KeyInit,
    aead::{Aead, Nonce}
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE as BASE64};
use pbkdf2::pbkdf2_hmac;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::core::error::{Result, ServiceError};

// Constants for crypto operations
const NONCE_SIZE: usize = 12; // 96 bits for AES-GCM
pub const KEY_SIZE: usize = 32;   // 256 bits for AES-256
pub const SALT_SIZE: usize = 16;  // 128 bits for salt
const PBKDF2_ITERATIONS: u32 = 100_000; // Number of iterations for PBKDF2

// Fallback passphrase for key derivation when AMETHYST_KDF_SECRET is unset.
const DEFAULT_KDF_SECRET: &str = "UGFwcHVDYW50RGFuY2VTYWFsYUAyMDIwMzEjJCUK";

const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789\
      !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// A ciphertext/salt pair produced by [`encrypt_text`], base64-encoded for
/// transport through the API layer.
#[derive(Debug, Clone)]
pub struct EncryptedText {
    pub ciphertext: String,
    pub salt: String,
}

fn kdf_secret() -> Vec<u8> {
    std::env::var("AMETHYST_KDF_SECRET")
        .unwrap_or_else(|_| DEFAULT_KDF_SECRET.to_string())
        .into_bytes()
}

/// Generate a new random 256-bit symmetric key
pub fn generate_key() -> Result<Vec<u8>> {
    let mut key = vec![0u8; KEY_SIZE];
    SystemRandom::new().fill(&mut key).map_err(|e| {
        ServiceError::EncryptionError(format!("Failed to generate key: {}", e))
    })?;

    Ok(key)
}

/// Generate a random 16-byte salt for key derivation
pub fn generate_salt() -> Result<Vec<u8>> {
    let mut salt = vec![0u8; SALT_SIZE];
    SystemRandom::new().fill(&mut salt).map_err(|e| {
        ServiceError::EncryptionError(format!("Failed to generate salt: {}", e))
    })?;

    Ok(salt)
}

/// Derive a 256-bit key from the service passphrase and the given salt.
///
/// The derivation is deterministic: two calls with the same salt yield the
/// same key, which is what makes ciphertexts recoverable from the salt alone.
pub fn derive_key(salt: &[u8]) -> Result<Vec<u8>> {
    let mut passphrase = kdf_secret();
    if passphrase.is_empty() {
        passphrase.zeroize();
        return Err(ServiceError::EncryptionError("Passphrase not found".to_string()));
    }

    let mut output = vec![0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(&passphrase, salt, PBKDF2_ITERATIONS, &mut output);
    passphrase.zeroize();

    Ok(output)
}

/// Encrypt a plaintext under the key derived from `salt`.
///
/// A fresh nonce is generated on every call, so encrypting the same
/// plaintext twice yields different ciphertexts. The output layout is
/// `nonce || ciphertext`.
pub fn encrypt(plaintext: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    let mut key = derive_key(salt)?;

    // Generate a random nonce
    let mut nonce = vec![0u8; NONCE_SIZE];
    SystemRandom::new().fill(&mut nonce).map_err(|e| {
        ServiceError::EncryptionError(format!("Failed to generate nonce: {}", e))
    })?;

    // Initialize AES-GCM cipher
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| ServiceError::EncryptionError(format!("Failed to initialize cipher: {}", e)))?;
    key.zeroize();

    let nonce_value = Nonce::<Aes256Gcm>::from_slice(&nonce);
    let ciphertext = cipher.encrypt(nonce_value, plaintext)
        .map_err(|e| ServiceError::EncryptionError(format!("Encryption failed: {}", e)))?;

    // Combine nonce + ciphertext into the final output
    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);

    Ok(output)
}

/// Decrypt a ciphertext produced by [`encrypt`] with the same salt.
///
/// A wrong salt or any tampering with the ciphertext fails authentication
/// and returns a `DecryptionError`, never corrupted plaintext.
pub fn decrypt(encrypted: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    if encrypted.len() < NONCE_SIZE {
        return Err(ServiceError::DecryptionError("Invalid ciphertext length".to_string()));
    }

    let mut key = derive_key(salt)?;

    let (nonce, ciphertext) = encrypted.split_at(NONCE_SIZE);

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| ServiceError::DecryptionError(format!("Failed to initialize cipher: {}", e)))?;
    key.zeroize();

    let nonce_value = Nonce::<Aes256Gcm>::from_slice(nonce);
    let plaintext = cipher.decrypt(nonce_value, ciphertext)
        .map_err(|e| ServiceError::DecryptionError(format!("Decryption failed: {}", e)))?;

    Ok(plaintext)
}

/// Encrypt an arbitrary string with a freshly generated salt.
///
/// Used by the standalone string-encryption endpoint; the caller gets both
/// the ciphertext and the salt back, base64-encoded.
pub fn encrypt_text(text: &str) -> Result<EncryptedText> {
    let salt = generate_salt()?;
    let ciphertext = encrypt(text.as_bytes(), &salt)?;

    Ok(EncryptedText {
        ciphertext: BASE64.encode(ciphertext),
        salt: BASE64.encode(salt),
    })
}

/// Decrypt a base64 ciphertext with the base64 salt it was produced with
pub fn decrypt_text(ciphertext_b64: &str, salt_b64: &str) -> Result<String> {
    let salt = BASE64.decode(salt_b64).map_err(|e| {
        ServiceError::DecryptionError(format!("Invalid salt encoding: {}", e))
    })?;
    let ciphertext = BASE64.decode(ciphertext_b64).map_err(|e| {
        ServiceError::DecryptionError(format!("Invalid ciphertext encoding: {}", e))
    })?;

    let plaintext = decrypt(&ciphertext, &salt)?;
    String::from_utf8(plaintext).map_err(|e| {
        ServiceError::DecryptionError(format!("Decrypted data is not valid UTF-8: {}", e))
    })
}

/// Generate a cryptographically secure random password of the given length
pub fn generate_password(length: usize) -> Result<String> {
    let rng = SystemRandom::new();
    let mut password = String::with_capacity(length);

    let mut byte = [0u8; 1];
    while password.len() < length {
        rng.fill(&mut byte).map_err(|e| {
            ServiceError::EncryptionError(format!("Failed to generate password: {}", e))
        })?;
        // Rejection sampling keeps the character distribution uniform
        if (byte[0] as usize) < PASSWORD_CHARSET.len() * (256 / PASSWORD_CHARSET.len()) {
            password.push(PASSWORD_CHARSET[byte[0] as usize % PASSWORD_CHARSET.len()] as char);
        }
    }

    Ok(password)
}
