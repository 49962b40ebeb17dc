//! Minimal ABI codec for the contract surface this SDK drives.
//!
//! Covers function selectors (Keccak-256), static word encoding (address,
//! uint, bytes32), single dynamic `bytes` arguments, and single-word return
//! decoding. Not a general ABI implementation.

use sha3::{Digest, Keccak256};

use oraq_types::{bytes_to_hex, hex_to_bytes, hex_to_u128, Address, Hex, OraqError, Result};

const WORD: usize = 32;

/// An ABI-encodable argument value.
#[derive(Debug, Clone)]
pub enum AbiValue {
    Address(Address),
    /// Unsigned integer as a 0x-hex quantity, up to 256 bits.
    Uint(Hex),
    Bytes32([u8; 32]),
    /// Dynamic byte string (head/tail encoded).
    Bytes(Vec<u8>),
}

impl AbiValue {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiValue::Bytes(_))
    }
}

/// Keccak-256 based 4-byte function selector for a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// Keccak-256 event topic hash for a canonical event signature.
pub fn event_topic(signature: &str) -> Hex {
    bytes_to_hex(&Keccak256::digest(signature.as_bytes()))
}

fn left_pad_word(bytes: &[u8]) -> Result<[u8; WORD]> {
    if bytes.len() > WORD {
        return Err(OraqError::AbiDecode(format!(
            "value too wide for one word: {} bytes",
            bytes.len()
        )));
    }
    let mut word = [0u8; WORD];
    word[WORD - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

/// Decode a hex quantity to bytes. Quantities are allowed an odd digit count
/// ("0x3", "0x100"), unlike fixed-width hex data.
fn quantity_bytes(h: &str) -> Result<Vec<u8>> {
    let body = h.strip_prefix("0x").unwrap_or(h);
    if body.len() % 2 == 1 {
        hex_to_bytes(&format!("0{}", body))
    } else {
        hex_to_bytes(body)
    }
}

fn encode_static_word(value: &AbiValue) -> Result<[u8; WORD]> {
    match value {
        AbiValue::Address(a) => left_pad_word(&a.to_bytes()),
        AbiValue::Uint(h) => left_pad_word(&quantity_bytes(h)?),
        AbiValue::Bytes32(b) => Ok(*b),
        AbiValue::Bytes(_) => Err(OraqError::AbiDecode(
            "dynamic value encoded as static word".into(),
        )),
    }
}

fn encode_dynamic_tail(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut len_word = [0u8; WORD];
    len_word[WORD - 16..].copy_from_slice(&(bytes.len() as u128).to_be_bytes());
    out.extend_from_slice(&len_word);
    out.extend_from_slice(bytes);
    let rem = bytes.len() % WORD;
    if rem != 0 {
        out.extend(std::iter::repeat(0u8).take(WORD - rem));
    }
    out
}

/// Encode a full calldata payload: selector followed by head/tail argument
/// encoding.
pub fn encode_call(signature: &str, args: &[AbiValue]) -> Result<Hex> {
    let mut head = Vec::with_capacity(args.len() * WORD);
    let mut tail = Vec::new();
    let head_len = args.len() * WORD;

    for arg in args {
        if arg.is_dynamic() {
            let offset = (head_len + tail.len()) as u128;
            let mut word = [0u8; WORD];
            word[WORD - 16..].copy_from_slice(&offset.to_be_bytes());
            head.extend_from_slice(&word);
            if let AbiValue::Bytes(b) = arg {
                tail.extend_from_slice(&encode_dynamic_tail(b));
            }
        } else {
            head.extend_from_slice(&encode_static_word(arg)?);
        }
    }

    let mut out = Vec::with_capacity(4 + head.len() + tail.len());
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    Ok(bytes_to_hex(&out))
}

/// Decode a single uint return word to a normalized 0x-hex quantity.
pub fn decode_uint_word(return_data: &str) -> Result<Hex> {
    let bytes = hex_to_bytes(return_data)?;
    if bytes.len() < WORD {
        return Err(OraqError::AbiDecode(format!(
            "return data too short: {} bytes",
            bytes.len()
        )));
    }
    Ok(oraq_types::normalize_uint_hex(&bytes_to_hex(&bytes[..WORD])))
}

/// Decode a single uint return word into a u128.
///
/// Errors if the value does not fit, rather than truncating.
pub fn decode_uint_word_u128(return_data: &str) -> Result<u128> {
    hex_to_u128(&decode_uint_word(return_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn erc20_selectors() {
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("allowance(address,address)")), "dd62ed3e");
    }

    #[test]
    fn transfer_event_topic() {
        assert_eq!(
            event_topic("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn encode_balance_of() {
        let a = addr("0x1111111111111111111111111111111111111111");
        let data = encode_call("balanceOf(address)", &[AbiValue::Address(a)]).unwrap();
        assert_eq!(
            data,
            format!("0x70a08231{}{}", "0".repeat(24), "1".repeat(40))
        );
    }

    #[test]
    fn encode_transfer_pads_amount() {
        let a = addr("0x2222222222222222222222222222222222222222");
        let data = encode_call(
            "transfer(address,uint256)",
            &[AbiValue::Address(a), AbiValue::Uint("0x3b9aca00".into())],
        )
        .unwrap();
        assert_eq!(
            data,
            format!(
                "0xa9059cbb{}{}{}3b9aca00",
                "0".repeat(24),
                "2".repeat(40),
                "0".repeat(56)
            )
        );
    }

    #[test]
    fn encode_dynamic_bytes_head_tail() {
        let payload = b"BONE.WETH.AD.10".to_vec();
        let data = encode_call("requestData(bytes)", &[AbiValue::Bytes(payload)]).unwrap();
        let body = &data[10..]; // strip 0x + selector
        // head: offset 0x20
        assert_eq!(&body[..64], &format!("{}20", "0".repeat(62)));
        // tail word 1: length 15
        assert_eq!(&body[64..128], &format!("{}f", "0".repeat(63)));
        // tail word 2: ascii payload, right-padded
        assert_eq!(
            &body[128..192],
            &format!("{}{}", hex::encode(b"BONE.WETH.AD.10"), "0".repeat(34))
        );
    }

    #[test]
    fn encode_mixed_static_and_dynamic() {
        let provider = addr("0x3333333333333333333333333333333333333333");
        let data = encode_call(
            "requestData(address,bytes,uint256)",
            &[
                AbiValue::Address(provider),
                AbiValue::Bytes(b"BTC.GBP.PR.AVC.24H".to_vec()),
                AbiValue::Uint("0x50".into()),
            ],
        )
        .unwrap();
        let body = &data[10..];
        // dynamic offset points past the 3-word head
        assert_eq!(&body[64..128], &format!("{}60", "0".repeat(62)));
        // third head word is the gas value
        assert_eq!(&body[128..192], &format!("{}50", "0".repeat(62)));
        // tail length word: 18 bytes
        assert_eq!(&body[192..256], &format!("{}12", "0".repeat(62)));
    }

    #[test]
    fn encode_odd_width_quantities() {
        // Normalized quantities drop leading zeros, so odd digit counts are
        // the common case, not a malformed input.
        let data = encode_call(
            "setRequestVar(uint8,uint256)",
            &[AbiValue::Uint("0x3".into()), AbiValue::Uint("0x1".into())],
        )
        .unwrap();
        let body = &data[10..];
        assert_eq!(&body[..64], &format!("{}3", "0".repeat(63)));
        assert_eq!(&body[64..128], &format!("{}1", "0".repeat(63)));

        let data = encode_call("setFee(uint256)", &[AbiValue::Uint("0x100".into())]).unwrap();
        assert!(data.ends_with(&format!("{}100", "0".repeat(61))));
    }

    #[test]
    fn encode_zero_quantity() {
        let data = encode_call("setFee(uint256)", &[AbiValue::Uint("0x0".into())]).unwrap();
        assert_eq!(&data[10..], "0".repeat(64));
    }

    #[test]
    fn decode_uint_word_normalizes() {
        let word = format!("0x{}2a", "0".repeat(62));
        assert_eq!(decode_uint_word(&word).unwrap(), "0x2a");
        assert_eq!(decode_uint_word_u128(&word).unwrap(), 42);
    }

    #[test]
    fn decode_uint_word_rejects_short_data() {
        assert!(decode_uint_word("0x2a").is_err());
    }

    #[test]
    fn uint_too_wide_for_word_rejected() {
        let too_wide = format!("0x{}", "ff".repeat(33));
        assert!(encode_call("f(uint256)", &[AbiValue::Uint(too_wide)]).is_err());
    }
}
