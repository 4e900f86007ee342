// SPDX-License-Identifier: Apache-2.0

use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};

use crate::errors::{Error, Result};

pub const FINGERPRINT_HEX_LEN: usize = 128;

/// SHA-512 content digest of a file or byte buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 64]);

impl Fingerprint {
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(bytes);
        Self::from_digest(&hasher.finalize())
    }

    /// Streams `reader` to its end through the digest.
    pub fn of_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = Sha512::new();
        let mut buf = [0_u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self::from_digest(&hasher.finalize()))
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut out = [0_u8; 64];
        out.copy_from_slice(digest);
        Self(out)
    }

    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        if s.len() != FINGERPRINT_HEX_LEN {
            return Err(Error::InvalidFingerprint {
                value: input.to_string(),
                reason: "expected 128 hex characters",
            });
        }
        if !s.is_ascii() {
            return Err(Error::InvalidFingerprint {
                value: input.to_string(),
                reason: "contains non-hex digits",
            });
        }
        let mut out = [0_u8; 64];
        for (i, slot) in out.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *slot = u8::from_str_radix(pair, 16).map_err(|_| Error::InvalidFingerprint {
                value: input.to_string(),
                reason: "contains non-hex digits",
            })?;
        }
        Ok(Self(out))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        let mut out = String::with_capacity(FINGERPRINT_HEX_LEN);
        for b in self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{b:02x}");
        }
        out
    }
}

#[must_use]
pub fn sha512_hex(bytes: &[u8]) -> String {
    Fingerprint::of_bytes(bytes).to_hex()
}

impl core::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl core::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::parse(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{sha512_hex, Fingerprint};

    const EMPTY_SHA512: &str = "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e";

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(sha512_hex(b""), EMPTY_SHA512);
    }

    #[test]
    fn reader_and_bytes_agree() {
        let payload = vec![7_u8; 200_000];
        let streamed = Fingerprint::of_reader(payload.as_slice()).expect("stream");
        assert_eq!(streamed, Fingerprint::of_bytes(&payload));
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!(Fingerprint::parse("abc").is_err());
        let bad = "z".repeat(128);
        let err = Fingerprint::parse(&bad).expect_err("non-hex");
        assert!(err.to_string().contains("non-hex"));
        let ok = Fingerprint::parse(EMPTY_SHA512).expect("valid");
        assert_eq!(ok.to_hex(), EMPTY_SHA512);
    }
}
