use argon2::Argon2;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use tracing::debug;

use super::{KeyValueStore, StoreError, StoreResult};

/// Inner-store key holding the hex-encoded key derivation salt
const SALT_KEY: &str = "__salt";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Wraps another store and seals every value with ChaCha20-Poly1305.
///
/// The cipher key is derived from a passphrase with Argon2id. The salt is
/// generated once and kept (unencrypted) in the inner store. Each value is
/// written as hex `nonce || ciphertext`, with the entry key bound as
/// associated data so sealed values cannot be swapped between keys.
pub struct EncryptedStore<S> {
    inner: S,
    cipher: ChaCha20Poly1305,
}

impl<S: KeyValueStore> EncryptedStore<S> {
    pub fn new(inner: S, passphrase: &str) -> StoreResult<Self> {
        let salt = match inner.get(SALT_KEY)? {
            Some(hex) => decode_hex(&hex)?,
            None => {
                let mut salt = [0u8; SALT_LEN];
                rand::rngs::OsRng.fill_bytes(&mut salt);
                inner.set(SALT_KEY, &encode_hex(&salt))?;
                debug!("Generated new key derivation salt");
                salt.to_vec()
            }
        };

        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|e| StoreError::Crypto(format!("Key derivation failed: {}", e)))?;

        Ok(Self {
            inner,
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    fn seal(&self, key: &str, value: &str) -> StoreResult<String> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: value.as_bytes(),
                    aad: key.as_bytes(),
                },
            )
            .map_err(|_| StoreError::Crypto("Failed to encrypt value".to_string()))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(encode_hex(&sealed))
    }

    fn open(&self, key: &str, sealed: &str) -> StoreResult<String> {
        let bytes = decode_hex(sealed)?;
        if bytes.len() <= NONCE_LEN {
            return Err(StoreError::Crypto("Sealed value too short".to_string()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: key.as_bytes(),
                },
            )
            .map_err(|_| {
                StoreError::Crypto("Failed to decrypt value (wrong passphrase?)".to_string())
            })?;
        String::from_utf8(plaintext)
            .map_err(|_| StoreError::Crypto("Decrypted value is not UTF-8".to_string()))
    }
}

impl<S: KeyValueStore> KeyValueStore for EncryptedStore<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.inner.get(key)? {
            Some(sealed) => self.open(key, &sealed).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let sealed = self.seal(key, value)?;
        self.inner.set(key, &sealed)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key)
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn decode_hex(s: &str) -> StoreResult<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return Err(StoreError::Crypto("Malformed hex value".to_string()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| StoreError::Crypto("Malformed hex value".to_string()))
        })
        .collect()
}
