//! Shared helpers: clock, address parsing, key handling.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};
use web3::types::{Address, H256};

use crate::error::{Result, ServiceError};

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Parse a 20-byte address, with or without the `0x` prefix.
pub fn parse_address(s: &str) -> Result<Address> {
    let trimmed = s.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    Address::from_str(hex_part)
        .map_err(|_| ServiceError::InvalidRequest(format!("invalid address: {}", s)))
}

/// Parse a secp256k1 secret key from hex, with or without the `0x` prefix.
pub fn parse_secret_key(s: &str) -> Result<SecretKey> {
    let trimmed = s.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(hex_part)
        .map_err(|_| ServiceError::InvalidRequest("invalid secret key".into()))?;
    SecretKey::from_slice(&bytes)
        .map_err(|_| ServiceError::InvalidRequest("invalid secret key".into()))
}

/// Derive the EVM address controlled by a secret key (Keccak of the
/// uncompressed public key, last 20 bytes).
pub fn address_of(key: &SecretKey) -> Address {
    let secp = Secp256k1::signing_only();
    let public = PublicKey::from_secret_key(&secp, key);
    let mut raw = [0u8; 64];
    raw.copy_from_slice(&public.serialize_uncompressed()[1..65]);
    Address::from(H256::from_slice(Keccak256::digest(raw).as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SK_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn address_parsing_accepts_both_prefixes() {
        let plain = parse_address("7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        let prefixed = parse_address("0x7e5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap();
        assert_eq!(plain, prefixed);
    }

    #[test]
    fn address_parsing_rejects_garbage() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn key_derivation_matches_known_vector() {
        // The address of private key 0x...01 is a well-known fixture.
        let key = parse_secret_key(SK_ONE).unwrap();
        let addr = address_of(&key);
        assert_eq!(
            addr,
            parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap()
        );
    }
}
