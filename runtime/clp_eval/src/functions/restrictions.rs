//! Argument restriction strings.
//!
//! Grammar: `<min><max>[<default type>][<type for arg 1>][<type for arg 2>]...`
//! where `min`/`max` are a digit or `*` (unbounded) and each type is one
//! character naming a set of accepted kinds. Positions without their own
//! character use the default type; no default means any kind.
//!
//! `"22n"` takes exactly two numbers. `"1*nk"` takes a symbol or string
//! followed by any number of numbers.

use bitflags::bitflags;
use clp_ir::TypeCode;

use crate::errors::RestrictionError;

bitflags! {
    /// Set of value kinds an argument position accepts.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeSet: u16 {
        const FLOAT = 1 << 0;
        const INTEGER = 1 << 1;
        const SYMBOL = 1 << 2;
        const STRING = 1 << 3;
        const LIST = 1 << 4;
        const EXTERNAL_ADDRESS = 1 << 5;
        const FACT_ADDRESS = 1 << 6;
        const INSTANCE_ADDRESS = 1 << 7;
        const INSTANCE_NAME = 1 << 8;
        /// Codes outside the primitive kinds (extension types).
        const OTHER = 1 << 9;

        const NUMBER = Self::FLOAT.bits() | Self::INTEGER.bits();
        const LEXEME = Self::SYMBOL.bits() | Self::STRING.bits();
        const ANY = (1 << 10) - 1;
    }
}

impl TypeSet {
    /// Parse one type character.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'a' => TypeSet::EXTERNAL_ADDRESS,
            'd' | 'f' => TypeSet::FLOAT,
            'e' => TypeSet::INSTANCE_ADDRESS | TypeSet::INSTANCE_NAME | TypeSet::SYMBOL,
            'g' => TypeSet::NUMBER | TypeSet::SYMBOL,
            'h' => TypeSet::FACT_ADDRESS | TypeSet::INTEGER | TypeSet::SYMBOL,
            'i' | 'l' => TypeSet::INTEGER,
            'j' => TypeSet::LEXEME | TypeSet::INSTANCE_NAME,
            'k' => TypeSet::LEXEME,
            'm' => TypeSet::LIST,
            'n' => TypeSet::NUMBER,
            'o' => TypeSet::INSTANCE_NAME,
            'p' => TypeSet::INSTANCE_NAME | TypeSet::SYMBOL,
            'q' => TypeSet::LIST | TypeSet::LEXEME,
            's' => TypeSet::STRING,
            'u' => TypeSet::ANY,
            'w' => TypeSet::SYMBOL,
            'x' => TypeSet::INSTANCE_ADDRESS,
            'y' => TypeSet::FACT_ADDRESS,
            _ => return None,
        })
    }

    /// Member for a single type code.
    pub fn of_code(code: TypeCode) -> Self {
        match code {
            TypeCode::FLOAT => TypeSet::FLOAT,
            TypeCode::INTEGER => TypeSet::INTEGER,
            TypeCode::SYMBOL => TypeSet::SYMBOL,
            TypeCode::STRING => TypeSet::STRING,
            TypeCode::LIST => TypeSet::LIST,
            TypeCode::EXTERNAL_ADDRESS => TypeSet::EXTERNAL_ADDRESS,
            TypeCode::FACT_ADDRESS => TypeSet::FACT_ADDRESS,
            TypeCode::INSTANCE_ADDRESS => TypeSet::INSTANCE_ADDRESS,
            TypeCode::INSTANCE_NAME => TypeSet::INSTANCE_NAME,
            _ => TypeSet::OTHER,
        }
    }

    pub fn accepts(self, code: TypeCode) -> bool {
        self.contains(Self::of_code(code))
    }

    /// Human-readable list of accepted kinds.
    pub fn describe(self) -> String {
        if self == TypeSet::ANY {
            return "any value".to_string();
        }
        const NAMES: [(TypeSet, &str); 10] = [
            (TypeSet::INTEGER, "integer"),
            (TypeSet::FLOAT, "float"),
            (TypeSet::SYMBOL, "symbol"),
            (TypeSet::STRING, "string"),
            (TypeSet::LIST, "multifield"),
            (TypeSet::EXTERNAL_ADDRESS, "external address"),
            (TypeSet::FACT_ADDRESS, "fact address"),
            (TypeSet::INSTANCE_ADDRESS, "instance address"),
            (TypeSet::INSTANCE_NAME, "instance name"),
            (TypeSet::OTHER, "extension type"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(set, _)| self.contains(*set))
            .map(|(_, name)| *name)
            .collect();
        match names.as_slice() {
            [] => "nothing".to_string(),
            [one] => (*one).to_string(),
            [rest @ .., last] => format!("{} or {last}", rest.join(", ")),
        }
    }
}

/// Parsed restriction string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Restriction {
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub default: TypeSet,
    pub positions: Vec<TypeSet>,
}

impl Restriction {
    pub fn parse(text: &str) -> Result<Self, RestrictionError> {
        let mut chars = text.chars();
        let (Some(min), Some(max)) = (chars.next(), chars.next()) else {
            return Err(RestrictionError::MissingCounts(text.to_string()));
        };
        let min = parse_count(text, min)?;
        let max = parse_count(text, max)?;
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(RestrictionError::MinExceedsMax(text.to_string()));
            }
        }
        let type_of = |c: char| {
            TypeSet::from_char(c).ok_or_else(|| RestrictionError::UnknownType {
                text: text.to_string(),
                found: c,
            })
        };
        let default = match chars.next() {
            Some(c) => type_of(c)?,
            None => TypeSet::ANY,
        };
        let positions = chars.map(type_of).collect::<Result<Vec<_>, _>>()?;
        Ok(Restriction {
            min,
            max,
            default,
            positions,
        })
    }

    /// Accepted kinds for the 1-based `position`.
    pub fn types_for(&self, position: usize) -> TypeSet {
        position
            .checked_sub(1)
            .and_then(|index| self.positions.get(index))
            .copied()
            .unwrap_or(self.default)
    }
}

fn parse_count(text: &str, c: char) -> Result<Option<usize>, RestrictionError> {
    match c {
        '*' => Ok(None),
        _ => c
            .to_digit(10)
            .map(|d| Some(d as usize))
            .ok_or_else(|| RestrictionError::InvalidCount {
                text: text.to_string(),
                found: c,
            }),
    }
}
