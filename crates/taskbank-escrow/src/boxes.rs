//! Depositor box scan.
//!
//! The contract keeps one box per depositor: the name is the depositor's
//! 32-byte public key, the value a big-endian `u64` of locked microAlgos.
//! Boxes with any other name length belong to something else and are
//! skipped.

use serde::Serialize;
use taskbank_core::{Address, MicroAlgos, PoolId, PUBLIC_KEY_LEN};

use crate::contract::EscrowContract;
use crate::error::{BoxDecodeError, EscrowError};

/// Locked balance of one depositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositorBalance {
    pub depositor: Address,
    pub locked: MicroAlgos,
}

/// Decode one box. `Ok(None)` means the box is not a depositor balance.
///
/// Values longer than eight bytes use their first eight.
pub fn decode_box(name: &[u8], value: &[u8]) -> Result<Option<DepositorBalance>, BoxDecodeError> {
    if name.len() != PUBLIC_KEY_LEN {
        return Ok(None);
    }
    let Ok(depositor) = Address::from_slice(name) else {
        return Ok(None);
    };
    let Some(head) = value.get(..8) else {
        return Err(BoxDecodeError::ValueTooShort {
            depositor,
            len: value.len(),
        });
    };
    let mut be = [0u8; 8];
    be.copy_from_slice(head);
    Ok(Some(DepositorBalance {
        depositor,
        locked: MicroAlgos(u64::from_be_bytes(be)),
    }))
}

/// Read every depositor balance in `pool`. No ordering guarantee.
pub async fn scan_depositors<C: EscrowContract>(
    contract: &C,
    pool: PoolId,
) -> Result<Vec<DepositorBalance>, EscrowError> {
    let names = contract.box_names(pool).await.map_err(EscrowError::Read)?;
    let mut balances = Vec::new();

    for name in names.iter().filter(|n| n.len() == PUBLIC_KEY_LEN) {
        let Some(value) = contract
            .box_value(pool, name)
            .await
            .map_err(EscrowError::Read)?
        else {
            tracing::debug!(%pool, "box vanished between listing and read");
            continue;
        };
        if let Some(balance) = decode_box(name, &value)? {
            balances.push(balance);
        }
    }

    tracing::debug!(%pool, boxes = names.len(), depositors = balances.len(), "box scan");
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_big_endian_balance() {
        let name = [5u8; 32];
        let balance = decode_box(&name, &150_000_000u64.to_be_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(balance.depositor, Address::from_public_key(name));
        assert_eq!(balance.locked, MicroAlgos(150_000_000));
    }

    #[test]
    fn wrong_name_lengths_are_skipped() {
        let value = 1u64.to_be_bytes();
        assert_eq!(decode_box(&[1u8; 31], &value).unwrap(), None);
        assert_eq!(decode_box(&[1u8; 33], &value).unwrap(), None);
        assert_eq!(decode_box(b"config", &value).unwrap(), None);
    }

    #[test]
    fn short_value_is_an_error() {
        let err = decode_box(&[1u8; 32], &[0, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            BoxDecodeError::ValueTooShort {
                depositor: Address::from_public_key([1u8; 32]),
                len: 3
            }
        );
    }

    #[test]
    fn long_value_reads_first_eight_bytes() {
        let mut value = 42u64.to_be_bytes().to_vec();
        value.extend_from_slice(&[0xff; 8]);
        let balance = decode_box(&[2u8; 32], &value).unwrap().unwrap();
        assert_eq!(balance.locked, MicroAlgos(42));
    }
}
