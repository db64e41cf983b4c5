//! Credential protection: AES-256-CBC with a PBKDF2-derived key, packed as
//! `salt:iv:ciphertext` with hex-encoded parts.
//!
//! The correlation store never calls into this module; captured tokens stay
//! plaintext in memory. This utility exists for credentials at rest in test
//! fixtures and environment files.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const SALT_LEN: usize = 16;
const IV_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 10_000;

/// Errors from unpacking or deciphering a protected credential.
#[derive(thiserror::Error, Debug)]
pub enum SecretError {
    #[error("packed secret must be salt:iv:ciphertext with hex parts")]
    MalformedPack,

    #[error("invalid hex in packed secret: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Wrong key or corrupted ciphertext.
    #[error("unable to decipher secret")]
    Crypto,

    #[error("deciphered secret is not valid UTF-8")]
    Utf8,
}

/// Encrypt a credential under a passphrase.
///
/// A fresh random salt and IV are drawn per call, so encrypting the same
/// plaintext twice yields different packs.
pub fn encrypt(plaintext: &str, key: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let derived = derive_key(key, &salt);
    let ciphertext = Aes256CbcEnc::new(&derived.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    format!(
        "{}:{}:{}",
        hex::encode(salt),
        hex::encode(iv),
        hex::encode(ciphertext)
    )
}

/// Decrypt a packed credential, failing on a malformed pack or a wrong key.
pub fn decrypt(packed: &str, key: &str) -> Result<String, SecretError> {
    let parts: Vec<&str> = packed.split(':').collect();
    let [salt_hex, iv_hex, ciphertext_hex] = parts.as_slice() else {
        return Err(SecretError::MalformedPack);
    };

    let salt = hex::decode(salt_hex)?;
    let iv = hex::decode(iv_hex)?;
    let ciphertext = hex::decode(ciphertext_hex)?;
    if salt.len() != SALT_LEN || iv.len() != IV_LEN {
        return Err(SecretError::MalformedPack);
    }

    let derived = derive_key(key, &salt);
    let plaintext = Aes256CbcDec::new_from_slices(&derived, &iv)
        .map_err(|_| SecretError::Crypto)?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| SecretError::Crypto)?;

    String::from_utf8(plaintext).map_err(|_| SecretError::Utf8)
}

fn derive_key(key: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(key.as_bytes(), salt, PBKDF2_ROUNDS, &mut derived);
    derived
}
