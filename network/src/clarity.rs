//! Clarity value codec
//!
//! Read-only contract calls take their arguments, and return their result, as
//! hex strings of consensus-serialized Clarity values. Each value starts with
//! a one-byte type prefix; lengths and counts are big-endian `u32`, contract
//! and tuple field names carry a one-byte length.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::address::StacksAddress;

/// Nesting limit when decoding untrusted input
pub const MAX_DEPTH: usize = 32;

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_BOOL_TRUE: u8 = 0x03;
const TYPE_BOOL_FALSE: u8 = 0x04;
const TYPE_PRINCIPAL_STANDARD: u8 = 0x05;
const TYPE_PRINCIPAL_CONTRACT: u8 = 0x06;
const TYPE_RESPONSE_OK: u8 = 0x07;
const TYPE_RESPONSE_ERR: u8 = 0x08;
const TYPE_OPTIONAL_NONE: u8 = 0x09;
const TYPE_OPTIONAL_SOME: u8 = 0x0a;
const TYPE_LIST: u8 = 0x0b;
const TYPE_TUPLE: u8 = 0x0c;
const TYPE_STRING_ASCII: u8 = 0x0d;
const TYPE_STRING_UTF8: u8 = 0x0e;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClarityError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),

    #[error("Unknown type prefix 0x{0:02x}")]
    UnknownType(u8),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("Value nested deeper than {}", MAX_DEPTH)]
    TooDeep,

    #[error("Invalid UTF-8 in string-utf8")]
    InvalidUtf8,

    #[error("Invalid character in string-ascii")]
    InvalidAscii,

    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("Name longer than 128 bytes: {0}")]
    NameTooLong(String),

    #[error("Length {0} does not fit in u32")]
    TooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalData {
    Standard(StacksAddress),
    Contract(StacksAddress, String),
}

impl fmt::Display for PrincipalData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrincipalData::Standard(addr) => write!(f, "{}", addr),
            PrincipalData::Contract(addr, name) => write!(f, "{}.{}", addr, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Buffer(Vec<u8>),
    Bool(bool),
    Principal(PrincipalData),
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
    List(Vec<ClarityValue>),
    Tuple(BTreeMap<String, ClarityValue>),
    StringAscii(String),
    StringUtf8(String),
}

impl ClarityValue {
    pub fn principal(address: StacksAddress) -> Self {
        ClarityValue::Principal(PrincipalData::Standard(address))
    }

    /// Build a `string-ascii`, rejecting non-printable or non-ASCII text
    pub fn string_ascii(s: &str) -> Result<Self, ClarityError> {
        if !s.bytes().all(is_clarity_ascii) {
            return Err(ClarityError::InvalidAscii);
        }
        Ok(ClarityValue::StringAscii(s.to_string()))
    }

    pub fn string_utf8(s: &str) -> Self {
        ClarityValue::StringUtf8(s.to_string())
    }

    /// Short type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ClarityValue::Int(_) => "int",
            ClarityValue::UInt(_) => "uint",
            ClarityValue::Buffer(_) => "buff",
            ClarityValue::Bool(_) => "bool",
            ClarityValue::Principal(_) => "principal",
            ClarityValue::ResponseOk(_) | ClarityValue::ResponseErr(_) => "response",
            ClarityValue::OptionalNone | ClarityValue::OptionalSome(_) => "optional",
            ClarityValue::List(_) => "list",
            ClarityValue::Tuple(_) => "tuple",
            ClarityValue::StringAscii(_) => "string-ascii",
            ClarityValue::StringUtf8(_) => "string-utf8",
        }
    }

    /// Unsigned integer, looking through `(ok ..)` and `(some ..)` wrappers.
    ///
    /// Non-negative `int`s are accepted too, since read-only getters are not
    /// consistent about which integer type they return.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            ClarityValue::UInt(v) => Some(*v),
            ClarityValue::Int(v) => u128::try_from(*v).ok(),
            ClarityValue::ResponseOk(inner) | ClarityValue::OptionalSome(inner) => inner.as_u128(),
            _ => None,
        }
    }

    pub fn is_response_err(&self) -> bool {
        matches!(self, ClarityValue::ResponseErr(_))
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    pub fn serialize(&self) -> Result<Vec<u8>, ClarityError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// `0x`-prefixed hex, as the Stacks API expects for arguments
    pub fn to_hex(&self) -> Result<String, ClarityError> {
        Ok(format!("0x{}", hex::encode(self.serialize()?)))
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<(), ClarityError> {
        match self {
            ClarityValue::Int(v) => {
                out.push(TYPE_INT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::UInt(v) => {
                out.push(TYPE_UINT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::Buffer(bytes) => {
                out.push(TYPE_BUFFER);
                write_len(out, bytes.len())?;
                out.extend_from_slice(bytes);
            }
            ClarityValue::Bool(true) => out.push(TYPE_BOOL_TRUE),
            ClarityValue::Bool(false) => out.push(TYPE_BOOL_FALSE),
            ClarityValue::Principal(PrincipalData::Standard(addr)) => {
                out.push(TYPE_PRINCIPAL_STANDARD);
                write_address(out, addr);
            }
            ClarityValue::Principal(PrincipalData::Contract(addr, name)) => {
                out.push(TYPE_PRINCIPAL_CONTRACT);
                write_address(out, addr);
                write_name(out, name)?;
            }
            ClarityValue::ResponseOk(inner) => {
                out.push(TYPE_RESPONSE_OK);
                inner.write_to(out)?;
            }
            ClarityValue::ResponseErr(inner) => {
                out.push(TYPE_RESPONSE_ERR);
                inner.write_to(out)?;
            }
            ClarityValue::OptionalNone => out.push(TYPE_OPTIONAL_NONE),
            ClarityValue::OptionalSome(inner) => {
                out.push(TYPE_OPTIONAL_SOME);
                inner.write_to(out)?;
            }
            ClarityValue::List(items) => {
                out.push(TYPE_LIST);
                write_len(out, items.len())?;
                for item in items {
                    item.write_to(out)?;
                }
            }
            ClarityValue::Tuple(fields) => {
                out.push(TYPE_TUPLE);
                write_len(out, fields.len())?;
                // BTreeMap iterates in name order, which is the canonical order
                for (name, value) in fields {
                    write_name(out, name)?;
                    value.write_to(out)?;
                }
            }
            ClarityValue::StringAscii(s) => {
                out.push(TYPE_STRING_ASCII);
                write_len(out, s.len())?;
                out.extend_from_slice(s.as_bytes());
            }
            ClarityValue::StringUtf8(s) => {
                out.push(TYPE_STRING_UTF8);
                write_len(out, s.len())?;
                out.extend_from_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Decode exactly one value; trailing bytes are an error
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ClarityError> {
        let mut reader = Reader { bytes, pos: 0 };
        let value = reader.read_value(0)?;
        let rest = bytes.len() - reader.pos;
        if rest > 0 {
            return Err(ClarityError::TrailingBytes(rest));
        }
        Ok(value)
    }

    /// Decode a hex string, with or without the `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, ClarityError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| ClarityError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }
}

fn is_clarity_ascii(b: u8) -> bool {
    (0x20..=0x7e).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r'
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<(), ClarityError> {
    let len = u32::try_from(len).map_err(|_| ClarityError::TooLong(len))?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

fn write_address(out: &mut Vec<u8>, addr: &StacksAddress) {
    out.push(addr.version());
    out.extend_from_slice(addr.hash160());
}

fn write_name(out: &mut Vec<u8>, name: &str) -> Result<(), ClarityError> {
    if name.len() > 128 {
        return Err(ClarityError::NameTooLong(name.to_string()));
    }
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ClarityError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(ClarityError::UnexpectedEnd(self.bytes.len()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClarityError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, ClarityError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn bytes16(&mut self) -> Result<[u8; 16], ClarityError> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    fn address(&mut self) -> Result<StacksAddress, ClarityError> {
        let version = self.u8()?;
        let mut hash160 = [0u8; 20];
        hash160.copy_from_slice(self.take(20)?);
        StacksAddress::new(version, hash160)
            .map_err(|e| ClarityError::InvalidPrincipal(e.to_string()))
    }

    fn name(&mut self) -> Result<String, ClarityError> {
        let len = self.u8()? as usize;
        if len > 128 {
            return Err(ClarityError::NameTooLong(format!("{} bytes", len)));
        }
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| ClarityError::InvalidUtf8)
    }

    /// Length-prefixed payload; the length is checked against what remains
    /// before anything is allocated
    fn sized(&mut self) -> Result<&'a [u8], ClarityError> {
        let len = self.u32()? as usize;
        self.take(len)
    }

    fn read_value(&mut self, depth: usize) -> Result<ClarityValue, ClarityError> {
        if depth > MAX_DEPTH {
            return Err(ClarityError::TooDeep);
        }

        let prefix = self.u8()?;
        let value = match prefix {
            TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.bytes16()?)),
            TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.bytes16()?)),
            TYPE_BUFFER => ClarityValue::Buffer(self.sized()?.to_vec()),
            TYPE_BOOL_TRUE => ClarityValue::Bool(true),
            TYPE_BOOL_FALSE => ClarityValue::Bool(false),
            TYPE_PRINCIPAL_STANDARD => {
                ClarityValue::Principal(PrincipalData::Standard(self.address()?))
            }
            TYPE_PRINCIPAL_CONTRACT => {
                let addr = self.address()?;
                let name = self.name()?;
                ClarityValue::Principal(PrincipalData::Contract(addr, name))
            }
            TYPE_RESPONSE_OK => ClarityValue::ResponseOk(Box::new(self.read_value(depth + 1)?)),
            TYPE_RESPONSE_ERR => ClarityValue::ResponseErr(Box::new(self.read_value(depth + 1)?)),
            TYPE_OPTIONAL_NONE => ClarityValue::OptionalNone,
            TYPE_OPTIONAL_SOME => {
                ClarityValue::OptionalSome(Box::new(self.read_value(depth + 1)?))
            }
            TYPE_LIST => {
                let count = self.u32()? as usize;
                // Every element takes at least one byte
                let mut items = Vec::with_capacity(count.min(self.bytes.len() - self.pos));
                for _ in 0..count {
                    items.push(self.read_value(depth + 1)?);
                }
                ClarityValue::List(items)
            }
            TYPE_TUPLE => {
                let count = self.u32()? as usize;
                let mut fields = BTreeMap::new();
                for _ in 0..count {
                    let name = self.name()?;
                    let value = self.read_value(depth + 1)?;
                    fields.insert(name, value);
                }
                ClarityValue::Tuple(fields)
            }
            TYPE_STRING_ASCII => {
                let raw = self.sized()?;
                if !raw.iter().copied().all(is_clarity_ascii) {
                    return Err(ClarityError::InvalidAscii);
                }
                ClarityValue::StringAscii(String::from_utf8_lossy(raw).into_owned())
            }
            TYPE_STRING_UTF8 => {
                let raw = self.sized()?;
                ClarityValue::StringUtf8(
                    String::from_utf8(raw.to_vec()).map_err(|_| ClarityError::InvalidUtf8)?,
                )
            }
            other => return Err(ClarityError::UnknownType(other)),
        };
        Ok(value)
    }
}

impl fmt::Display for ClarityValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClarityValue::Int(v) => write!(f, "{}", v),
            ClarityValue::UInt(v) => write!(f, "u{}", v),
            ClarityValue::Buffer(b) => write!(f, "0x{}", hex::encode(b)),
            ClarityValue::Bool(b) => write!(f, "{}", b),
            ClarityValue::Principal(p) => write!(f, "'{}", p),
            ClarityValue::ResponseOk(v) => write!(f, "(ok {})", v),
            ClarityValue::ResponseErr(v) => write!(f, "(err {})", v),
            ClarityValue::OptionalNone => write!(f, "none"),
            ClarityValue::OptionalSome(v) => write!(f, "(some {})", v),
            ClarityValue::List(items) => {
                write!(f, "(list")?;
                for item in items {
                    write!(f, " {}", item)?;
                }
                write!(f, ")")
            }
            ClarityValue::Tuple(fields) => {
                write!(f, "(tuple")?;
                for (name, value) in fields {
                    write!(f, " ({} {})", name, value)?;
                }
                write!(f, ")")
            }
            ClarityValue::StringAscii(s) => write!(f, "{:?}", s),
            ClarityValue::StringUtf8(s) => write!(f, "u{:?}", s),
        }
    }
}
