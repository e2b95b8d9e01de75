// chain/abi.rs
// Minimal ABI helpers for the vault contract's view calls

use rust_decimal::Decimal;

use super::errors::ChainError;
use crate::wallet::signer::keccak256;

pub const WORD: usize = 32;
/// Native token decimals
pub const TOKEN_DECIMALS: u32 = 18;

/// Validate an account address and normalise it to lowercase `0x...`
pub fn validate_address(address: &str) -> Result<String, ChainError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ChainError::InvalidAddress(
            "Address cannot be empty".to_string(),
        ));
    }

    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ChainError::InvalidAddress(format!("'{}' lacks 0x prefix", address)))?;

    if hex_part.len() != 40 {
        return Err(ChainError::InvalidAddress(format!(
            "'{}' has invalid length",
            address
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ChainError::InvalidAddress(format!(
            "'{}' contains invalid characters",
            address
        )));
    }

    Ok(format!("0x{}", hex_part.to_lowercase()))
}

/// First four bytes of keccak256 of the function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for a function taking a single address argument
pub fn encode_address_call(signature: &str, address: &str) -> Result<String, ChainError> {
    let address = validate_address(address)?;
    let address_bytes = hex::decode(&address[2..])?;

    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(&address_bytes);

    Ok(format!("0x{}", hex::encode(data)))
}

/// Splits return data into 32-byte words
pub fn decode_words(data: &str) -> Result<Vec<[u8; WORD]>, ChainError> {
    let bytes = hex::decode(data.trim_start_matches("0x"))?;
    if bytes.len() % WORD != 0 {
        return Err(ChainError::ParseError(format!(
            "return data of {} bytes is not word aligned",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(WORD)
        .map(|chunk| {
            let mut word = [0u8; WORD];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

pub fn word_to_u128(word: &[u8; WORD]) -> Result<u128, ChainError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::Overflow(format!("0x{}", hex::encode(word))));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

pub fn word_to_bool(word: &[u8; WORD]) -> Result<bool, ChainError> {
    match word_to_u128(word)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ChainError::ParseError(format!("{} is not a bool", other))),
    }
}

/// Parse a JSON-RPC hex quantity such as `0x1bc16d674ec80000`
pub fn parse_quantity(quantity: &str) -> Result<u128, ChainError> {
    let digits = quantity.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ChainError::ParseError(format!("Invalid quantity '{}': {}", quantity, e)))
}

/// Smallest-unit amount to whole tokens
pub fn wei_to_tokens(wei: u128) -> Result<Decimal, ChainError> {
    let wei = i128::try_from(wei).map_err(|_| ChainError::Overflow(wei.to_string()))?;
    Decimal::try_from_i128_with_scale(wei, TOKEN_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| ChainError::Overflow(wei.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_address_validation() {
        assert_eq!(
            validate_address("0x742D35CC6634C0532925A3B844BC454E4438F44E").unwrap(),
            "0x742d35cc6634c0532925a3b844bc454e4438f44e"
        );
        assert!(validate_address("").is_err());
        assert!(validate_address("742d35cc6634c0532925a3b844bc454e4438f44e").is_err());
        assert!(validate_address("0x742d35").is_err());
        assert!(validate_address("0x742d35cc6634c0532925a3b844bc454e4438f4zz").is_err());
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
    }

    #[test]
    fn test_address_call_layout() {
        let data = encode_address_call(
            "balanceOf(address)",
            "0x742d35cc6634c0532925a3b844bc454e4438f44e",
        )
        .unwrap();
        assert_eq!(
            data,
            "0x70a08231000000000000000000000000742d35cc6634c0532925a3b844bc454e4438f44e"
        );
    }

    #[test]
    fn test_word_decoding() {
        let data = format!("0x{}{}", "00".repeat(31) + "01", "00".repeat(31) + "2a");
        let words = decode_words(&data).unwrap();
        assert_eq!(words.len(), 2);
        assert!(word_to_bool(&words[0]).unwrap());
        assert_eq!(word_to_u128(&words[1]).unwrap(), 42);
        assert!(word_to_bool(&words[1]).is_err());

        assert!(decode_words("0x00ff").is_err());
        assert!(decode_words("0x").unwrap().is_empty());

        let high = [0xffu8; WORD];
        assert!(matches!(word_to_u128(&high), Err(ChainError::Overflow(_))));
    }

    #[test]
    fn test_quantities_and_units() {
        assert_eq!(parse_quantity("0x14d1120d7b160000").unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x").unwrap(), 0);
        assert!(parse_quantity("0xzz").is_err());

        assert_eq!(wei_to_tokens(1_500_000_000_000_000_000).unwrap(), dec!(1.5));
        assert_eq!(wei_to_tokens(0).unwrap(), Decimal::ZERO);
        assert!(wei_to_tokens(u128::MAX).is_err());
    }
}
