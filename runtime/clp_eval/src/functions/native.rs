//! Native function shapes and return type tags.

use std::fmt;
use std::sync::Arc;

use clp_ir::{DataValue, ExternalAddressId, SymbolId, TypeCode};

use crate::errors::DefineError;
use crate::Environment;

/// A native entry point, with or without access to the environment.
pub enum Native<T> {
    /// Does not receive the environment.
    Plain(Arc<dyn Fn() -> T + Send + Sync>),
    /// Receives the environment (and through it, its arguments).
    Contextual(Arc<dyn Fn(&mut Environment) -> T + Send + Sync>),
}

impl<T> Native<T> {
    pub fn plain(f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Native::Plain(Arc::new(f))
    }

    pub fn contextual(f: impl Fn(&mut Environment) -> T + Send + Sync + 'static) -> Self {
        Native::Contextual(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, env: &mut Environment) -> T {
        match self {
            Native::Plain(f) => f(),
            Native::Contextual(f) => f(env),
        }
    }

    pub fn is_contextual(&self) -> bool {
        matches!(self, Native::Contextual(_))
    }
}

impl<T> Clone for Native<T> {
    fn clone(&self) -> Self {
        match self {
            Native::Plain(f) => Native::Plain(Arc::clone(f)),
            Native::Contextual(f) => Native::Contextual(Arc::clone(f)),
        }
    }
}

/// Closed set of native calling conventions.
#[derive(Clone)]
pub enum NativeFn {
    Void(Native<()>),
    Boolean(Native<bool>),
    Integer(Native<i64>),
    Float(Native<f64>),
    Symbol(Native<SymbolId>),
    String(Native<SymbolId>),
    InstanceName(Native<SymbolId>),
    ExternalAddress(Native<ExternalAddressId>),
    /// Builds the tagged result itself.
    Generic(Native<DataValue>),
}

impl NativeFn {
    /// Shape name used in definition errors.
    pub fn shape(&self) -> &'static str {
        match self {
            NativeFn::Void(_) => "void",
            NativeFn::Boolean(_) => "boolean",
            NativeFn::Integer(_) => "integer",
            NativeFn::Float(_) => "float",
            NativeFn::Symbol(_) => "symbol",
            NativeFn::String(_) => "string",
            NativeFn::InstanceName(_) => "instance name",
            NativeFn::ExternalAddress(_) => "external address",
            NativeFn::Generic(_) => "generic",
        }
    }

    /// Whether the entry point receives the environment.
    pub fn is_contextual(&self) -> bool {
        match self {
            NativeFn::Void(n) => n.is_contextual(),
            NativeFn::Boolean(n) => n.is_contextual(),
            NativeFn::Integer(n) => n.is_contextual(),
            NativeFn::Float(n) => n.is_contextual(),
            NativeFn::Symbol(n) | NativeFn::String(n) | NativeFn::InstanceName(n) => {
                n.is_contextual()
            }
            NativeFn::ExternalAddress(n) => n.is_contextual(),
            NativeFn::Generic(n) => n.is_contextual(),
        }
    }

    /// Tag implied by the shape when none is given.
    pub fn default_tag(&self) -> ReturnTag {
        match self {
            NativeFn::Void(_) => ReturnTag::Void,
            NativeFn::Boolean(_) => ReturnTag::Boolean,
            NativeFn::Integer(_) => ReturnTag::Long,
            NativeFn::Float(_) => ReturnTag::Double,
            NativeFn::Symbol(_) => ReturnTag::Symbol,
            NativeFn::String(_) => ReturnTag::String,
            NativeFn::InstanceName(_) => ReturnTag::InstanceName,
            NativeFn::ExternalAddress(_) => ReturnTag::ExternalAddress,
            NativeFn::Generic(_) => ReturnTag::Unknown,
        }
    }

    fn accepts(&self, tag: ReturnTag) -> bool {
        match tag {
            ReturnTag::Void => matches!(self, NativeFn::Void(_)),
            ReturnTag::Boolean => matches!(self, NativeFn::Boolean(_)),
            ReturnTag::Character | ReturnTag::Integer32 | ReturnTag::Long => {
                matches!(self, NativeFn::Integer(_))
            }
            ReturnTag::Float32 | ReturnTag::Double => matches!(self, NativeFn::Float(_)),
            ReturnTag::String => matches!(self, NativeFn::String(_)),
            ReturnTag::Symbol => matches!(self, NativeFn::Symbol(_)),
            ReturnTag::InstanceName => matches!(self, NativeFn::InstanceName(_)),
            ReturnTag::ExternalAddress => matches!(self, NativeFn::ExternalAddress(_)),
            ReturnTag::InstanceAddress
            | ReturnTag::Multifield
            | ReturnTag::Number
            | ReturnTag::SymbolOrString
            | ReturnTag::Lexeme
            | ReturnTag::Unknown => matches!(self, NativeFn::Generic(_)),
        }
    }

    /// Check that `tag` can be produced by this shape.
    pub(crate) fn check_tag(&self, name: &str, tag: ReturnTag) -> Result<(), DefineError> {
        if self.accepts(tag) {
            Ok(())
        } else {
            Err(DefineError::TagShapeMismatch {
                name: name.to_string(),
                tag: tag.as_char(),
                shape: self.shape(),
            })
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NativeFn::{}({})",
            self.shape(),
            if self.is_contextual() { "contextual" } else { "plain" }
        )
    }
}

/// Declared return type of a function, as a single character code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReturnTag {
    /// `v`
    Void,
    /// `b`: `TRUE` or `FALSE`
    Boolean,
    /// `c`: one-character symbol from the low byte of an integer
    Character,
    /// `i`: integer narrowed through 32 bits
    Integer32,
    /// `l`
    Long,
    /// `f`: float narrowed through single precision
    Float32,
    /// `d`
    Double,
    /// `s`
    String,
    /// `w`
    Symbol,
    /// `o`
    InstanceName,
    /// `a`
    ExternalAddress,
    /// `x`
    InstanceAddress,
    /// `m`
    Multifield,
    /// `n`: integer or float
    Number,
    /// `k`: symbol or string
    SymbolOrString,
    /// `j`: symbol, string, or instance name
    Lexeme,
    /// `u`: anything
    Unknown,
}

impl ReturnTag {
    pub fn from_char(c: char) -> Result<Self, DefineError> {
        Ok(match c {
            'v' => ReturnTag::Void,
            'b' => ReturnTag::Boolean,
            'c' => ReturnTag::Character,
            'i' => ReturnTag::Integer32,
            'l' => ReturnTag::Long,
            'f' => ReturnTag::Float32,
            'd' => ReturnTag::Double,
            's' => ReturnTag::String,
            'w' => ReturnTag::Symbol,
            'o' => ReturnTag::InstanceName,
            'a' => ReturnTag::ExternalAddress,
            'x' => ReturnTag::InstanceAddress,
            'm' => ReturnTag::Multifield,
            'n' => ReturnTag::Number,
            'k' => ReturnTag::SymbolOrString,
            'j' => ReturnTag::Lexeme,
            'u' => ReturnTag::Unknown,
            other => return Err(DefineError::UnknownReturnTag(other)),
        })
    }

    pub fn as_char(self) -> char {
        match self {
            ReturnTag::Void => 'v',
            ReturnTag::Boolean => 'b',
            ReturnTag::Character => 'c',
            ReturnTag::Integer32 => 'i',
            ReturnTag::Long => 'l',
            ReturnTag::Float32 => 'f',
            ReturnTag::Double => 'd',
            ReturnTag::String => 's',
            ReturnTag::Symbol => 'w',
            ReturnTag::InstanceName => 'o',
            ReturnTag::ExternalAddress => 'a',
            ReturnTag::InstanceAddress => 'x',
            ReturnTag::Multifield => 'm',
            ReturnTag::Number => 'n',
            ReturnTag::SymbolOrString => 'k',
            ReturnTag::Lexeme => 'j',
            ReturnTag::Unknown => 'u',
        }
    }

    /// Whether a generic body's result code satisfies this tag.
    pub fn admits(self, code: TypeCode) -> bool {
        match self {
            ReturnTag::InstanceAddress => code == TypeCode::INSTANCE_ADDRESS,
            ReturnTag::Multifield => code == TypeCode::LIST,
            ReturnTag::Number => code.is_number(),
            ReturnTag::SymbolOrString => matches!(code, TypeCode::SYMBOL | TypeCode::STRING),
            ReturnTag::Lexeme => code.is_lexeme(),
            _ => true,
        }
    }

    /// Description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            ReturnTag::InstanceAddress => "an instance address",
            ReturnTag::Multifield => "a multifield",
            ReturnTag::Number => "a number",
            ReturnTag::SymbolOrString => "a symbol or string",
            ReturnTag::Lexeme => "a symbol, string, or instance name",
            _ => "any value",
        }
    }
}
