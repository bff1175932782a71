//! ARC-4 method selectors and argument encoding for the escrow contract.
//!
//! Only the two methods the escrow calls are modeled. The `pay` argument
//! of `deposit` is not an application argument: it is the payment that
//! precedes the call in the same group.

use taskbank_core::{sha512_256, Address, MicroAlgos};

/// `deposit(string,pay)void`
pub const DEPOSIT_SIGNATURE: &str = "deposit(string,pay)void";

/// `withdraw(uint64,address)void`
pub const WITHDRAW_SIGNATURE: &str = "withdraw(uint64,address)void";

/// First four bytes of `SHA-512/256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = sha512_256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Longest `string` argument the u16 length prefix can describe.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// A `string` argument too long for its length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("string argument is {len} bytes, the limit is {max}", max = MAX_STRING_LEN)]
pub struct StringTooLong {
    pub len: usize,
}

/// `string`: u16 big-endian length prefix followed by the UTF-8 bytes.
pub fn encode_string(value: &str) -> Result<Vec<u8>, StringTooLong> {
    let len = u16::try_from(value.len()).map_err(|_| StringTooLong { len: value.len() })?;
    let mut out = Vec::with_capacity(2 + value.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value.as_bytes());
    Ok(out)
}

/// `uint64`: eight big-endian bytes.
pub fn encode_uint64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// `address`: the raw 32-byte public key.
pub fn encode_address(value: &Address) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Application arguments for `deposit(memo, pay)`.
pub fn deposit_args(memo: &str) -> Result<Vec<Vec<u8>>, StringTooLong> {
    Ok(vec![selector(DEPOSIT_SIGNATURE).to_vec(), encode_string(memo)?])
}

/// Application arguments for `withdraw(amount, receiver)`.
pub fn withdraw_args(amount: MicroAlgos, receiver: &Address) -> Vec<Vec<u8>> {
    vec![
        selector(WITHDRAW_SIGNATURE).to_vec(),
        encode_uint64(amount.get()),
        encode_address(receiver),
    ]
}
