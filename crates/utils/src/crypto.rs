use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Error, Debug, PartialEq)]
pub enum CryptoError {
    #[error("The key must be a hex encoded 32 byte key")]
    InvalidKey,
    #[error("The token is not valid hex")]
    MalformedToken,
    #[error("The token could not be decrypted with the given key")]
    Decryption,
    #[error("The message could not be encrypted")]
    Encryption,
}

fn cipher(key_hex: &str) -> Result<Aes256Gcm, CryptoError> {
    let key = hex::decode(key_hex).map_err(|_| CryptoError::InvalidKey)?;
    Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::InvalidKey)
}

/// Encrypts the message with AES-256-GCM. The returned token is the hex
/// encoding of `nonce || ciphertext`.
pub fn encrypt_message(key_hex: &str, message: &str) -> Result<String, CryptoError> {
    let cipher = cipher(key_hex)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, message.as_bytes())
        .map_err(|_| CryptoError::Encryption)?;

    let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    token.extend_from_slice(&nonce);
    token.extend_from_slice(&ciphertext);
    Ok(hex::encode(token))
}

/// Reverses `encrypt_message`
pub fn decrypt_message(key_hex: &str, token: &str) -> Result<String, CryptoError> {
    let cipher = cipher(key_hex)?;
    let token = hex::decode(token.trim()).map_err(|_| CryptoError::MalformedToken)?;
    if token.len() <= NONCE_LEN {
        return Err(CryptoError::MalformedToken);
    }
    let (nonce, ciphertext) = token.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
}
