//! # Payload Sealing
//!
//! Turns a [`Message`] into the opaque byte payload that gets embedded, and
//! back. Text is LZ4-compressed when that actually saves space, then the
//! result is encrypted with AES-256-GCM under a key generated fresh for every
//! call to [`seal`].
//!
//! ## Sealed layout
//!
//! ```text
//! [12-byte nonce][AES-GCM ciphertext of ([kind tag][body]) + 16-byte tag]
//! ```
//!
//! | Kind tag | Body                          |
//! |----------|-------------------------------|
//! | 0        | raw bytes                     |
//! | 1        | LZ4 block of UTF-8 text       |
//! | 2        | UTF-8 text, stored raw        |
//!
//! Text is stored raw when LZ4 would not make it smaller.
//!
//! The kind tag lives inside the authenticated plaintext so a decoder learns
//! whether to decompress, and whether to hand back text or bytes, only after
//! the key has been verified.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

use crate::common::error::{Result, StegoError};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

const KIND_BINARY: u8 = 0;
const KIND_TEXT_COMPRESSED: u8 = 1;
const KIND_TEXT_RAW: u8 = 2;

/// A message to hide, or one that was recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

impl Message {
    pub fn len(&self) -> usize {
        match self {
            Message::Text(text) => text.len(),
            Message::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Binary(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(bytes) => bytes,
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_owned())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<Vec<u8>> for Message {
    fn from(bytes: Vec<u8>) -> Self {
        Message::Binary(bytes)
    }
}

impl From<&[u8]> for Message {
    fn from(bytes: &[u8]) -> Self {
        Message::Binary(bytes.to_vec())
    }
}

/// One-time symmetric key. Shared with the receiver as a URL-safe token.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Draws a new key from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Parses a token produced by [`SecretKey::to_token`]. Surrounding
    /// whitespace is ignored.
    pub fn from_token(token: &str) -> Result<Self> {
        let bytes = general_purpose::URL_SAFE
            .decode(token.trim())
            .map_err(|_| StegoError::InvalidKey)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| StegoError::InvalidKey)?;
        Ok(Self(key))
    }

    pub fn to_token(&self) -> String {
        general_purpose::URL_SAFE.encode(self.0)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(GenericArray::from_slice(&self.0))
    }
}

// Keep key material out of debug output and logs.
impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Result of sealing: the bytes to embed plus the key that opens them.
#[derive(Debug)]
pub struct Sealed {
    pub payload: Vec<u8>,
    pub key: SecretKey,
    /// Whether the text body went through LZ4
    pub compressed: bool,
}

/// Compresses (for text), then encrypts under a freshly generated key.
pub fn seal(message: &Message) -> Result<Sealed> {
    let (plaintext, compressed) = frame_plaintext(message);

    let key = SecretKey::generate();
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let ciphertext = key
        .cipher()
        .encrypt(GenericArray::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| StegoError::Internal("AES-GCM encryption failed".to_string()))?;

    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);

    Ok(Sealed {
        payload,
        key,
        compressed,
    })
}

/// Verifies and decrypts a sealed payload, then restores the message.
pub fn open(payload: &[u8], key: &SecretKey) -> Result<Message> {
    if payload.len() < NONCE_LEN {
        return Err(StegoError::DecryptionFailed);
    }
    let (nonce, ciphertext) = payload.split_at(NONCE_LEN);

    let plaintext = key
        .cipher()
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| StegoError::DecryptionFailed)?;

    let (&kind, body) = plaintext
        .split_first()
        .ok_or_else(|| StegoError::CorruptPayload("missing message kind".to_string()))?;

    match kind {
        KIND_BINARY => Ok(Message::Binary(body.to_vec())),
        KIND_TEXT_RAW => utf8(body.to_vec()),
        KIND_TEXT_COMPRESSED => {
            let inflated = lz4_flex::decompress_size_prepended(body)
                .map_err(|e| StegoError::CorruptPayload(format!("decompression failed: {}", e)))?;
            utf8(inflated)
        }
        other => Err(StegoError::CorruptPayload(format!(
            "unknown message kind {}",
            other
        ))),
    }
}

/// Builds `[kind][body]`, compressing text only when it gets smaller.
fn frame_plaintext(message: &Message) -> (Vec<u8>, bool) {
    match message {
        Message::Binary(bytes) => (tagged(KIND_BINARY, bytes), false),
        Message::Text(text) => {
            let packed = lz4_flex::compress_prepend_size(text.as_bytes());
            if packed.len() < text.len() {
                (tagged(KIND_TEXT_COMPRESSED, &packed), true)
            } else {
                (tagged(KIND_TEXT_RAW, text.as_bytes()), false)
            }
        }
    }
}

fn tagged(kind: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(kind);
    out.extend_from_slice(body);
    out
}

fn utf8(bytes: Vec<u8>) -> Result<Message> {
    String::from_utf8(bytes)
        .map(Message::Text)
        .map_err(|_| StegoError::CorruptPayload("text is not valid UTF-8".to_string()))
}
