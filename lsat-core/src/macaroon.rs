//! Minimal macaroons: the signed envelope an LSAT identifier travels in.
//!
//! Envelopes use the libmacaroons v2 binary format and the HMAC-SHA256 key
//! derivation of `gopkg.in/macaroon.v2`, so tokens can be inspected with the
//! usual macaroon tooling. Caveats are neither minted nor accepted.

use base64::{Engine, prelude::BASE64_STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    errors::{Error, Result},
    root_key::RootKey,
};

type HmacSha256 = Hmac<Sha256>;

const KEY_GENERATOR: &[u8] = b"macaroons-key-generator";

const FORMAT_V2: u8 = 2;
const FIELD_EOS: u8 = 0;
const FIELD_LOCATION: u8 = 1;
const FIELD_IDENTIFIER: u8 = 2;
const FIELD_SIGNATURE: u8 = 6;

const SIGNATURE_LEN: usize = 32;

/// A macaroon without caveats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macaroon {
    location: String,
    identifier: Vec<u8>,
    signature: [u8; SIGNATURE_LEN],
}

impl Macaroon {
    /// Mint a macaroon over `identifier` under `root_key`.
    pub fn new(root_key: &RootKey, identifier: Vec<u8>, location: impl Into<String>) -> Result<Self> {
        let signature = sign(root_key, &identifier)?;
        Ok(Macaroon {
            location: location.into(),
            identifier,
            signature,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// The signed payload. Only trust it after [`Macaroon::verify`].
    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    /// Check the signature and location, returning the authenticated identifier.
    pub fn verify(&self, root_key: &RootKey, location: &str) -> Result<&[u8]> {
        let expected = sign(root_key, &self.identifier)?;
        let signature_ok: bool = expected[..].ct_eq(&self.signature[..]).into();
        if !signature_ok || self.location != location {
            return Err(Error::InvalidSignature);
        }
        Ok(&self.identifier)
    }

    pub fn to_binary(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            1 + self.location.len() + self.identifier.len() + SIGNATURE_LEN + 16,
        );
        out.push(FORMAT_V2);
        if !self.location.is_empty() {
            append_field(&mut out, FIELD_LOCATION, self.location.as_bytes());
        }
        append_field(&mut out, FIELD_IDENTIFIER, &self.identifier);
        out.push(FIELD_EOS);
        // End of the (empty) caveat list.
        out.push(FIELD_EOS);
        append_field(&mut out, FIELD_SIGNATURE, &self.signature);
        out
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        let mut reader = FieldReader { bytes };

        if reader.take_byte()? != FORMAT_V2 {
            return Err(malformed("unsupported macaroon format"));
        }

        let mut location = String::new();
        let (mut field, mut data) = reader.field()?;
        if field == FIELD_LOCATION {
            location = String::from_utf8(data.to_vec())
                .map_err(|_| malformed("location is not utf-8"))?;
            (field, data) = reader.field()?;
        }
        if field != FIELD_IDENTIFIER {
            return Err(malformed("missing identifier"));
        }
        let identifier = data.to_vec();

        if reader.take_byte()? != FIELD_EOS {
            return Err(malformed("unexpected field in macaroon header"));
        }
        if reader.take_byte()? != FIELD_EOS {
            return Err(malformed("caveats are not supported"));
        }

        let (field, data) = reader.field()?;
        if field != FIELD_SIGNATURE {
            return Err(malformed("missing signature"));
        }
        let signature = <[u8; SIGNATURE_LEN]>::try_from(data)
            .map_err(|_| malformed("signature must be 32 bytes"))?;

        if !reader.bytes.is_empty() {
            return Err(malformed("trailing bytes after signature"));
        }

        Ok(Macaroon {
            location,
            identifier,
            signature,
        })
    }

    /// Standard padded base64 of the binary encoding.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.to_binary())
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        Self::from_binary(&decode_base64(text)?)
    }

    /// Decode a macaroon from its transport form and authenticate it.
    ///
    /// Text that is not base64 is [`Error::MalformedToken`]. Any byte string
    /// that is not a macaroon minted under `root_key` for `location`,
    /// including one too damaged to parse, is [`Error::InvalidSignature`].
    pub fn open(text: &str, root_key: &RootKey, location: &str) -> Result<Vec<u8>> {
        let bytes = decode_base64(text)?;
        let macaroon = Self::from_binary(&bytes).map_err(|_| Error::InvalidSignature)?;
        macaroon.verify(root_key, location).map(<[u8]>::to_vec)
    }
}

fn decode_base64(text: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(text)
        .map_err(|err| Error::MalformedToken(format!("invalid base64: {err}")))
}

fn sign(root_key: &RootKey, identifier: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
    let derived = keyed_hash(KEY_GENERATOR, root_key.as_bytes())?;
    keyed_hash(&derived, identifier)
}

fn keyed_hash(key: &[u8], data: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|err| Error::SigningError(format!("invalid HMAC key: {err}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

fn malformed(reason: &str) -> Error {
    Error::MalformedToken(reason.to_string())
}

fn append_field(out: &mut Vec<u8>, field: u8, data: &[u8]) {
    out.push(field);
    append_uvarint(out, data.len() as u64);
    out.extend_from_slice(data);
}

fn append_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

struct FieldReader<'a> {
    bytes: &'a [u8],
}

impl<'a> FieldReader<'a> {
    fn take_byte(&mut self) -> Result<u8> {
        let (first, rest) = self
            .bytes
            .split_first()
            .ok_or_else(|| malformed("unexpected end of macaroon"))?;
        self.bytes = rest;
        Ok(*first)
    }

    fn uvarint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.take_byte()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(malformed("varint overflow"))
    }

    /// Reads one `type | uvarint length | data` field.
    fn field(&mut self) -> Result<(u8, &'a [u8])> {
        let field = self.take_byte()?;
        if field == FIELD_EOS {
            return Err(malformed("unexpected end of section"));
        }
        let len = usize::try_from(self.uvarint()?)
            .map_err(|_| malformed("field length overflow"))?;
        if len > self.bytes.len() {
            return Err(malformed("field length exceeds macaroon"));
        }
        let (data, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok((field, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> RootKey {
        RootKey::from_bytes([0x5a; 32])
    }

    #[test]
    fn test_binary_layout() {
        let mac = Macaroon::new(&key(), b"id".to_vec(), "LSAT").unwrap();
        let bin = mac.to_binary();
        assert_eq!(&bin[..11], &[2, 1, 4, b'L', b'S', b'A', b'T', 2, 2, b'i', b'd']);
        assert_eq!(&bin[11..15], &[0, 0, 6, 32]);
        assert_eq!(bin.len(), 15 + 32);
    }

    #[test]
    fn test_binary_decode_inverts_encode() {
        let mac = Macaroon::new(&key(), vec![9u8; 200], "LSAT").unwrap();
        assert_eq!(Macaroon::from_binary(&mac.to_binary()), Ok(mac.clone()));
        assert_eq!(Macaroon::from_base64(&mac.to_base64()), Ok(mac));
    }

    #[test]
    fn test_empty_location_is_omitted() {
        let mac = Macaroon::new(&key(), b"id".to_vec(), "").unwrap();
        assert_eq!(&mac.to_binary()[..3], &[2, 2, 2]);
        assert_eq!(Macaroon::from_binary(&mac.to_binary()), Ok(mac));
    }

    #[test]
    fn test_verify_with_matching_key() {
        let mac = Macaroon::new(&key(), b"payload".to_vec(), "LSAT").unwrap();
        assert_eq!(mac.verify(&key(), "LSAT"), Ok(&b"payload"[..]));
    }

    #[test]
    fn test_verify_rejects_other_key_or_location() {
        let mac = Macaroon::new(&key(), b"payload".to_vec(), "LSAT").unwrap();
        assert_eq!(
            mac.verify(&RootKey::from_bytes([0x5b; 32]), "LSAT"),
            Err(Error::InvalidSignature)
        );
        assert_eq!(mac.verify(&key(), "elsewhere"), Err(Error::InvalidSignature));
    }

    #[test]
    fn test_decode_rejects_caveats_and_trailing_bytes() {
        let mac = Macaroon::new(&key(), b"id".to_vec(), "LSAT").unwrap();
        let mut bin = mac.to_binary();
        bin.push(0);
        assert!(matches!(
            Macaroon::from_binary(&bin),
            Err(Error::MalformedToken(_))
        ));

        // first party caveat "a" inserted before the closing EOS
        let mut with_caveat = mac.to_binary();
        with_caveat.splice(12..12, [2, 1, b'a', 0]);
        assert_eq!(
            Macaroon::from_binary(&with_caveat),
            Err(Error::MalformedToken("caveats are not supported".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let bin = Macaroon::new(&key(), b"id".to_vec(), "LSAT")
            .unwrap()
            .to_binary();
        for len in 0..bin.len() {
            assert!(
                Macaroon::from_binary(&bin[..len]).is_err(),
                "truncation to {len} bytes must not decode"
            );
        }
    }

    #[test]
    fn test_open_classifies_failures() {
        let mac = Macaroon::new(&key(), b"payload".to_vec(), "LSAT").unwrap();
        let text = mac.to_base64();
        assert_eq!(Macaroon::open(&text, &key(), "LSAT"), Ok(b"payload".to_vec()));

        assert!(matches!(
            Macaroon::open(&text[..text.len() - 1], &key(), "LSAT"),
            Err(Error::MalformedToken(_))
        ));
        assert!(matches!(
            Macaroon::open("not base64!", &key(), "LSAT"),
            Err(Error::MalformedToken(_))
        ));

        let mut bin = mac.to_binary();
        bin[0] = 3;
        assert_eq!(
            Macaroon::open(&BASE64_STANDARD.encode(&bin), &key(), "LSAT"),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn test_uvarint_multi_byte() {
        let mut out = Vec::new();
        append_uvarint(&mut out, 300);
        assert_eq!(out, vec![0xac, 0x02]);
        let mut reader = FieldReader { bytes: &out };
        assert_eq!(reader.uvarint(), Ok(300));
    }
}
