mod crypto;

pub use crypto::{decrypt_message, encrypt_message, CryptoError};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Creates an alphanumeric secret of the given length
pub fn create_random_secret(secret_len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(secret_len)
        .map(char::from)
        .collect()
}

/// Creates a random key for AES-256 and returns it hex encoded
pub fn create_random_key_hex() -> String {
    let mut key = [0u8; 32];
    thread_rng().fill(&mut key);
    hex::encode(key)
}
