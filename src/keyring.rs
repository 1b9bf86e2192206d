use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::rand::{SecureRandom, SystemRandom};

// Keyring blob layout: 2-byte type tag, 8-byte nonce, 2-byte little-endian
// key length, then the 16-byte key itself.
const TYPE_TAG: [u8; 2] = [0x01, 0x00];
const NONCE_LEN: usize = 8;
const KEY_LEN: usize = 16;
const KEY_LEN_TAG: [u8; 2] = [KEY_LEN as u8, 0x00];

/// Generate a fresh storage keyring secret, base64-encoded on one line.
pub fn generate_keyring_secret() -> anyhow::Result<String> {
    let rng = SystemRandom::new();

    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut nonce)
        .map_err(|_| anyhow::anyhow!("System randomness unavailable"))?;

    let mut key = [0u8; KEY_LEN];
    rng.fill(&mut key)
        .map_err(|_| anyhow::anyhow!("System randomness unavailable"))?;

    let mut blob = Vec::with_capacity(TYPE_TAG.len() + NONCE_LEN + KEY_LEN_TAG.len() + KEY_LEN);
    blob.extend_from_slice(&TYPE_TAG);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&KEY_LEN_TAG);
    blob.extend_from_slice(&key);

    Ok(STANDARD.encode(&blob))
}
