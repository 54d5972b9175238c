//! Just enough of the Solidity ABI for the identity contracts.
//!
//! Supports static `address`, `bool` and `uint256` (values up to `u64`) and
//! dynamic `string`, which covers every call the factory and user contracts
//! expose.

use sha3::{Digest, Keccak256};
use yid_core::address::Address;
use yid_core::contract::UserInfo;
use yid_core::error::{Result, YidError};

const WORD: usize = 32;

/// An argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Address(Address),
    Bool(bool),
    Uint(u64),
    String(&'a str),
}

/// First four bytes of the Keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, tokens: &[Token<'_>]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode_tokens(tokens));
    out
}

/// Head/tail encoding of an argument tuple.
pub fn encode_tokens(tokens: &[Token<'_>]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::String(value) => {
                head.extend(uint_word((head_len + tail.len()) as u64));
                tail.extend(uint_word(value.len() as u64));
                tail.extend(padded(value.as_bytes()));
            }
            Token::Address(address) => head.extend(address_word(address)),
            Token::Bool(value) => head.extend(uint_word(u64::from(*value))),
            Token::Uint(value) => head.extend(uint_word(*value)),
        }
    }

    head.extend(tail);
    head
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    let rem = out.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + WORD - rem, 0);
    }
    out
}

fn word(data: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * WORD;
    data.get(start..start + WORD)
        .ok_or_else(|| YidError::abi(format!("return data too short for word {}", index)))
}

fn word_to_u64(word: &[u8]) -> Result<u64> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(YidError::abi("integer does not fit in 64 bits"));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

fn word_to_usize(word: &[u8]) -> Result<usize> {
    usize::try_from(word_to_u64(word)?).map_err(|_| YidError::abi("offset out of range"))
}

fn decode_string_at(data: &[u8], offset: usize) -> Result<String> {
    let start = offset
        .checked_add(WORD)
        .ok_or_else(|| YidError::abi("string offset out of range"))?;
    let len_word = data
        .get(offset..start)
        .ok_or_else(|| YidError::abi("string length out of bounds"))?;
    let len = word_to_usize(len_word)?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| YidError::abi("string length out of range"))?;
    let bytes = data
        .get(start..end)
        .ok_or_else(|| YidError::abi("string data out of bounds"))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| YidError::abi(format!("invalid UTF-8: {}", e)))
}

/// Decodes a single `address` return value.
pub fn decode_address(data: &[u8]) -> Result<Address> {
    let word = word(data, 0)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(YidError::abi("address word has non-zero padding"));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(bytes))
}

/// Decodes `getUserInfo()`'s `(string, string, bool, uint256)` return tuple.
pub fn decode_user_info(data: &[u8]) -> Result<UserInfo> {
    let name_offset = word_to_usize(word(data, 0)?)?;
    let email_offset = word_to_usize(word(data, 1)?)?;
    let is_active = word_to_u64(word(data, 2)?)? != 0;
    let created_at = word_to_u64(word(data, 3)?)?;

    Ok(UserInfo {
        name: decode_string_at(data, name_offset)?,
        email: decode_string_at(data, email_offset)?,
        is_active,
        created_at,
    })
}

/// `0x`-prefixed hex for RPC payloads.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex(raw: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(raw.trim_start_matches("0x"))?)
}
