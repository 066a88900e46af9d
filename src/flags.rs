//! Bitwise accessors over packed flag words
//!
//! Some fields (for ex. `epb_flags`) pack several values into a single integer. A [`FlagWord`]
//! wraps such an integer and gives access to each sub-field by name, using a schema of
//! [`FlagField`] items laid out from the least significant bit.

use std::fmt;

use thiserror::Error;

/// Value returned by an enumerated field when the stored index has no symbol
pub const INVALID_ENUM_VALUE: &str = "[invalid value]";

/// Type of a sub-field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagKind {
    /// Single bit
    Bool,
    /// Unsigned integer of the given width, in bits
    UInt(u8),
    /// Index in a list of symbols, stored using the given width (at least 2 bits)
    Enum(u8, &'static [&'static str]),
}

/// Description of a named sub-field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagField {
    pub name: &'static str,
    pub kind: FlagKind,
}

impl FlagField {
    pub const fn bool(name: &'static str) -> FlagField {
        FlagField {
            name,
            kind: FlagKind::Bool,
        }
    }

    pub const fn uint(name: &'static str, nbits: u8) -> FlagField {
        FlagField {
            name,
            kind: FlagKind::UInt(nbits),
        }
    }

    pub const fn enumerated(
        name: &'static str,
        nbits: u8,
        symbols: &'static [&'static str],
    ) -> FlagField {
        FlagField {
            name,
            kind: FlagKind::Enum(nbits, symbols),
        }
    }

    /// Width of the field, in bits
    pub fn nbits(&self) -> u32 {
        match self.kind {
            FlagKind::Bool => 1,
            FlagKind::UInt(n) | FlagKind::Enum(n, _) => u32::from(n),
        }
    }
}

/// Value of a sub-field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    UInt(u64),
    Symbol(&'static str),
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        FlagValue::Bool(b)
    }
}

impl From<u64> for FlagValue {
    fn from(v: u64) -> Self {
        FlagValue::UInt(v)
    }
}

impl From<u32> for FlagValue {
    fn from(v: u32) -> Self {
        FlagValue::UInt(u64::from(v))
    }
}

impl From<&'static str> for FlagValue {
    fn from(s: &'static str) -> Self {
        FlagValue::Symbol(s)
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::UInt(v) => write!(f, "{}", v),
            FlagValue::Symbol(s) => f.write_str(s),
        }
    }
}

/// Errors raised when building or accessing a flag word
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("word width {0} is not in range 1..=64")]
    InvalidWidth(u32),
    #[error("schema requires {required} bits, word has only {nbits}")]
    SchemaTooWide { required: u32, nbits: u32 },
    #[error("field {0} must be at least 1 bit wide")]
    FieldTooNarrow(&'static str),
    #[error("enumerated field {0} must be at least 2 bits wide")]
    EnumTooNarrow(&'static str),
    #[error("no field named {0}")]
    UnknownField(String),
    #[error("invalid value for field {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct FieldLayout {
    field: FlagField,
    offset: u32,
    // mask, before shifting
    mask: u64,
}

#[inline]
fn width_mask(nbits: u32) -> u64 {
    if nbits >= 64 {
        u64::MAX
    } else {
        (1u64 << nbits) - 1
    }
}

/// An integer, accessed through named sub-fields
///
/// ```rust
/// use pcapng_codec::flags::{FlagValue, FlagWord, EPB_FLAGS_SCHEMA};
///
/// let mut flags = FlagWord::new(EPB_FLAGS_SCHEMA, 32).expect("valid schema");
/// flags.set("inout", "outbound").unwrap();
/// flags.set("fcslen", 4u64).unwrap();
/// assert_eq!(flags.get("inout"), Ok(FlagValue::Symbol("outbound")));
/// assert_eq!(flags.value(), 0b1000_0010);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagWord {
    layout: Vec<FieldLayout>,
    nbits: u32,
    value: u64,
}

impl FlagWord {
    /// Create a word of `nbits` bits, all set to zero
    pub fn new(schema: &[FlagField], nbits: u32) -> Result<FlagWord, FlagError> {
        Self::with_value(schema, nbits, 0)
    }

    /// Create a word of `nbits` bits, using `value` as initial content
    ///
    /// Bits above `nbits` are cleared.
    pub fn with_value(schema: &[FlagField], nbits: u32, value: u64) -> Result<FlagWord, FlagError> {
        if nbits == 0 || nbits > 64 {
            return Err(FlagError::InvalidWidth(nbits));
        }
        let mut layout = Vec::with_capacity(schema.len());
        let mut offset = 0;
        for field in schema {
            let width = field.nbits();
            if width < 1 {
                return Err(FlagError::FieldTooNarrow(field.name));
            }
            if let FlagKind::Enum(n, _) = field.kind {
                if n < 2 {
                    return Err(FlagError::EnumTooNarrow(field.name));
                }
            }
            if offset + width > nbits {
                let required = schema.iter().map(FlagField::nbits).sum();
                return Err(FlagError::SchemaTooWide { required, nbits });
            }
            layout.push(FieldLayout {
                field: *field,
                offset,
                mask: width_mask(width),
            });
            offset += width;
        }
        Ok(FlagWord {
            layout,
            nbits,
            value: value & width_mask(nbits),
        })
    }

    /// Raw integer value
    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn nbits(&self) -> u32 {
        self.nbits
    }

    fn field(&self, name: &str) -> Result<&FieldLayout, FlagError> {
        self.layout
            .iter()
            .find(|l| l.field.name == name)
            .ok_or_else(|| FlagError::UnknownField(name.to_string()))
    }

    fn read_bits(&self, l: &FieldLayout) -> u64 {
        (self.value >> l.offset) & l.mask
    }

    fn write_bits(&mut self, offset: u32, mask: u64, bits: u64) {
        self.value &= !(mask << offset);
        self.value |= (bits & mask) << offset;
    }

    /// Get the value of a sub-field
    pub fn get(&self, name: &str) -> Result<FlagValue, FlagError> {
        let l = self.field(name)?;
        let bits = self.read_bits(l);
        let v = match l.field.kind {
            FlagKind::Bool => FlagValue::Bool(bits != 0),
            FlagKind::UInt(_) => FlagValue::UInt(bits),
            FlagKind::Enum(_, symbols) => {
                let sym = symbols
                    .get(bits as usize)
                    .copied()
                    .unwrap_or(INVALID_ENUM_VALUE);
                FlagValue::Symbol(sym)
            }
        };
        Ok(v)
    }

    /// Set the value of a sub-field
    ///
    /// Integer values are truncated to the field width. Boolean fields accept integers (any
    /// non-zero value is `true`), and enumerated fields accept either a symbol or a raw index.
    pub fn set<V: Into<FlagValue>>(&mut self, name: &str, value: V) -> Result<(), FlagError> {
        let l = self.field(name)?;
        let (offset, mask, field) = (l.offset, l.mask, l.field);
        let bits = match (field.kind, value.into()) {
            (FlagKind::Bool, FlagValue::Bool(b)) => u64::from(b),
            (FlagKind::Bool, FlagValue::UInt(v)) => u64::from(v != 0),
            (FlagKind::UInt(_), FlagValue::UInt(v)) => v,
            (FlagKind::Enum(_, _), FlagValue::UInt(v)) => v,
            (FlagKind::Enum(_, symbols), FlagValue::Symbol(s)) => {
                symbols.iter().position(|&x| x == s).ok_or_else(|| {
                    FlagError::InvalidValue {
                        field: field.name,
                        reason: format!("unknown symbol '{}'", s),
                    }
                })? as u64
            }
            (_, v) => {
                return Err(FlagError::InvalidValue {
                    field: field.name,
                    reason: format!("value {:?} does not match field type", v),
                })
            }
        };
        self.write_bits(offset, mask, bits);
        Ok(())
    }

    /// Iterate over all sub-fields and their current values
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FlagValue)> + '_ {
        self.layout.iter().filter_map(move |l| {
            let name = l.field.name;
            self.get(name).ok().map(|v| (name, v))
        })
    }
}

impl From<&FlagWord> for u64 {
    fn from(w: &FlagWord) -> u64 {
        w.value
    }
}

impl From<FlagWord> for u64 {
    fn from(w: FlagWord) -> u64 {
        w.value
    }
}

impl fmt::Display for FlagWord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FlagWord(value={:#x}", self.value)?;
        for (name, v) in self.iter() {
            write!(f, " {}={}", name, v)?;
        }
        f.write_str(")")
    }
}

/// Layout of the `epb_flags` (and `pack_flags`) option
pub const EPB_FLAGS_SCHEMA: &[FlagField] = &[
    FlagField::enumerated("inout", 2, &["NA", "inbound", "outbound"]),
    FlagField::enumerated(
        "casttype",
        3,
        &["NA", "unicast", "multicast", "broadcast", "promiscuous"],
    ),
    FlagField::uint("fcslen", 4),
    FlagField::uint("reserved", 7),
    FlagField::bool("err_16"),
    FlagField::bool("err_17"),
    FlagField::bool("err_18"),
    FlagField::bool("err_19"),
    FlagField::bool("err_20"),
    FlagField::bool("err_21"),
    FlagField::bool("err_22"),
    FlagField::bool("err_23"),
    FlagField::bool("err_crc"),
    FlagField::bool("err_long"),
    FlagField::bool("err_short"),
    FlagField::bool("err_frame_gap"),
    FlagField::bool("err_frame_align"),
    FlagField::bool("err_frame_delim"),
    FlagField::bool("err_preamble"),
    FlagField::bool("err_symbol"),
];
