use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid address length")]
    InvalidLength,

    #[error("Invalid address prefix")]
    InvalidPrefix,

    #[error("Unknown address version {0}")]
    InvalidVersion(u8),

    #[error("Invalid address checksum")]
    InvalidChecksum,

    #[error("Invalid address payload")]
    InvalidPayload,

    #[error("Invalid c32 character '{0}'")]
    InvalidC32(char),

    #[error("Invalid contract name: {0}")]
    InvalidContractName(String),
}

/// Stacks network an address or client belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StacksNetwork {
    Mainnet,
    Testnet,
}

impl StacksNetwork {
    /// Public Stacks API base URL
    pub fn default_api_url(&self) -> &'static str {
        match self {
            StacksNetwork::Mainnet => "https://api.mainnet.hiro.so",
            StacksNetwork::Testnet => "https://api.testnet.hiro.so",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StacksNetwork::Mainnet => "mainnet",
            StacksNetwork::Testnet => "testnet",
        }
    }
}

impl FromStr for StacksNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(StacksNetwork::Mainnet),
            "testnet" => Ok(StacksNetwork::Testnet),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

impl fmt::Display for StacksNetwork {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-sig mainnet (`SP`)
pub const VERSION_MAINNET_SINGLESIG: u8 = 22;
/// Multi-sig mainnet (`SM`)
pub const VERSION_MAINNET_MULTISIG: u8 = 20;
/// Single-sig testnet (`ST`)
pub const VERSION_TESTNET_SINGLESIG: u8 = 26;
/// Multi-sig testnet (`SN`)
pub const VERSION_TESTNET_MULTISIG: u8 = 21;

const C32_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Stacks address
/// Format: 'S' + c32(version) + c32(hash160[20] + checksum[4]),
/// checksum = first 4 bytes of SHA256(SHA256(version || hash160)).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StacksAddress {
    version: u8,
    hash160: [u8; 20],
}

impl StacksAddress {
    pub fn new(version: u8, hash160: [u8; 20]) -> Result<Self, AddressError> {
        match version {
            VERSION_MAINNET_SINGLESIG
            | VERSION_MAINNET_MULTISIG
            | VERSION_TESTNET_SINGLESIG
            | VERSION_TESTNET_MULTISIG => Ok(Self { version, hash160 }),
            other => Err(AddressError::InvalidVersion(other)),
        }
    }

    /// Parse an address string (SP..., ST..., SM..., SN...)
    pub fn from_string(s: &str) -> Result<Self, AddressError> {
        let s = s.trim().to_ascii_uppercase();
        if s.len() < 5 || s.len() > 52 {
            return Err(AddressError::InvalidLength);
        }
        if !s.starts_with('S') {
            return Err(AddressError::InvalidPrefix);
        }

        let normalized = normalize_c32(&s[1..]);
        let mut chars = normalized.chars();
        let version_char = chars.next().ok_or(AddressError::InvalidLength)?;
        let version = c32_index(version_char)?;

        let decoded = Self::decode_c32(chars.as_str())?;
        if decoded.len() != 24 {
            return Err(AddressError::InvalidPayload);
        }

        let payload = &decoded[..20];
        let checksum = &decoded[20..24];
        if checksum != Self::compute_checksum(version, payload) {
            return Err(AddressError::InvalidChecksum);
        }

        let mut hash160 = [0u8; 20];
        hash160.copy_from_slice(payload);
        Self::new(version, hash160)
    }

    fn format_address(&self) -> String {
        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&self.hash160);
        data.extend_from_slice(&Self::compute_checksum(self.version, &self.hash160));

        format!(
            "S{}{}",
            C32_ALPHABET[self.version as usize] as char,
            Self::encode_c32(&data)
        )
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash160(&self) -> &[u8; 20] {
        &self.hash160
    }

    pub fn network(&self) -> StacksNetwork {
        match self.version {
            VERSION_MAINNET_SINGLESIG | VERSION_MAINNET_MULTISIG => StacksNetwork::Mainnet,
            _ => StacksNetwork::Testnet,
        }
    }

    pub fn is_mainnet(&self) -> bool {
        self.network() == StacksNetwork::Mainnet
    }

    fn compute_checksum(version: u8, payload: &[u8]) -> [u8; 4] {
        let mut hasher = Sha256::new();
        hasher.update([version]);
        hasher.update(payload);
        let hash2 = Sha256::digest(hasher.finalize());
        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&hash2[..4]);
        checksum
    }

    fn encode_c32(data: &[u8]) -> String {
        let mut num = num_bigint::BigUint::from_bytes_be(data);
        let base = num_bigint::BigUint::from(32u32);
        let zero = num_bigint::BigUint::from(0u32);
        let mut result = String::new();

        while num > zero {
            let remainder = &num % &base;
            num /= &base;
            let digits = remainder.to_u32_digits();
            let idx = if digits.is_empty() { 0 } else { digits[0] } as usize;
            result.insert(0, C32_ALPHABET[idx] as char);
        }

        // One '0' per leading zero byte
        for &byte in data {
            if byte == 0 {
                result.insert(0, '0');
            } else {
                break;
            }
        }

        result
    }

    fn decode_c32(s: &str) -> Result<Vec<u8>, AddressError> {
        let mut num = num_bigint::BigUint::from(0u32);
        let base = num_bigint::BigUint::from(32u32);

        for ch in s.chars() {
            num = num * &base + c32_index(ch)?;
        }

        let mut bytes = if s.chars().all(|c| c == '0') {
            Vec::new()
        } else {
            num.to_bytes_be()
        };

        let leading_zeros = s.chars().take_while(|&c| c == '0').count();
        let mut result = vec![0u8; leading_zeros];
        result.append(&mut bytes);

        Ok(result)
    }
}

/// Crockford-style normalisation used by c32check
fn normalize_c32(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_ascii_uppercase() {
            'O' => '0',
            'L' | 'I' => '1',
            other => other,
        })
        .collect()
}

fn c32_index(c: char) -> Result<u8, AddressError> {
    C32_ALPHABET
        .iter()
        .position(|&a| a as char == c)
        .map(|i| i as u8)
        .ok_or(AddressError::InvalidC32(c))
}

impl FromStr for StacksAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl fmt::Display for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format_address())
    }
}

impl fmt::Debug for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StacksAddress({})", self.format_address())
    }
}

impl Serialize for StacksAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format_address())
    }
}

impl<'de> Deserialize<'de> for StacksAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BURN_MAINNET: &str = "SP000000000000000000002Q6VF78";
    const BURN_TESTNET: &str = "ST000000000000000000002AMW42H";
    const SAMPLE_MAINNET: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
    const SAMPLE_TESTNET: &str = "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQYAC0RQ";
    const SAMPLE_HASH: &str = "a46ff88886c2ef9762d970b4d2c63678835bd39d";

    fn sample_hash() -> [u8; 20] {
        let mut h = [0u8; 20];
        h.copy_from_slice(&hex::decode(SAMPLE_HASH).unwrap());
        h
    }

    #[test]
    fn test_burn_addresses() {
        let mainnet = StacksAddress::new(VERSION_MAINNET_SINGLESIG, [0u8; 20]).unwrap();
        assert_eq!(mainnet.to_string(), BURN_MAINNET);

        let testnet = StacksAddress::new(VERSION_TESTNET_SINGLESIG, [0u8; 20]).unwrap();
        assert_eq!(testnet.to_string(), BURN_TESTNET);

        assert_eq!(StacksAddress::from_string(BURN_MAINNET).unwrap(), mainnet);
    }

    #[test]
    fn test_parse_known_address() {
        let address = StacksAddress::from_string(SAMPLE_MAINNET).unwrap();
        assert_eq!(address.version(), VERSION_MAINNET_SINGLESIG);
        assert_eq!(address.hash160(), &sample_hash());
        assert!(address.is_mainnet());
        assert_eq!(address.to_string(), SAMPLE_MAINNET);
    }

    #[test]
    fn test_same_hash_on_each_network() {
        let testnet = StacksAddress::new(VERSION_TESTNET_SINGLESIG, sample_hash()).unwrap();
        assert_eq!(testnet.to_string(), SAMPLE_TESTNET);
        assert_eq!(testnet.network(), StacksNetwork::Testnet);

        let multisig = StacksAddress::new(VERSION_MAINNET_MULTISIG, sample_hash()).unwrap();
        assert_eq!(
            multisig.to_string(),
            "SM2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQVX8X0G"
        );
    }

    #[test]
    fn test_lowercase_is_accepted() {
        let lower = SAMPLE_MAINNET.to_lowercase();
        let address = StacksAddress::from_string(&lower).unwrap();
        assert_eq!(address.to_string(), SAMPLE_MAINNET);

        let testnet: StacksAddress = format!("  {}\n", SAMPLE_TESTNET.to_lowercase())
            .parse()
            .unwrap();
        assert_eq!(testnet.network(), StacksNetwork::Testnet);
    }

    #[test]
    fn test_ambiguous_characters_normalised() {
        // "0" written as "o" in the payload
        let typed = BURN_MAINNET.replacen("000", "0o0", 1);
        assert_eq!(
            StacksAddress::from_string(&typed).unwrap().to_string(),
            BURN_MAINNET
        );
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Last character changed
        let tampered = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ8";
        assert_eq!(
            StacksAddress::from_string(tampered),
            Err(AddressError::InvalidChecksum)
        );
    }

    #[test]
    fn test_invalid_addresses() {
        assert_eq!(
            StacksAddress::from_string("SP"),
            Err(AddressError::InvalidLength)
        );
        assert_eq!(
            StacksAddress::from_string("XP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"),
            Err(AddressError::InvalidPrefix)
        );
        assert!(matches!(
            StacksAddress::from_string("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJU"),
            Err(AddressError::InvalidC32('U'))
        ));
        assert!(StacksAddress::new(7, [0u8; 20]).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let address = StacksAddress::from_string(SAMPLE_MAINNET).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", SAMPLE_MAINNET));
        let back: StacksAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
