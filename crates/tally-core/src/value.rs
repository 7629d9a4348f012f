//! Literal argument values for parameterized test methods
//!
//! A parameterized method declares one or more argument sets. Each value keeps
//! its runtime type so generic methods can bind their type parameters from
//! the arguments they are invoked with.

use crate::failure::Failure;
use std::fmt;

/// Runtime type of a literal [`Value`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    Str,
    /// A type name passed as an argument
    Type,
    /// Variant of the named enum
    Enum(String),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Bool => "bool",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Char => "char",
            TypeTag::Str => "str",
            TypeTag::Type => "type",
            TypeTag::Enum(name) => name,
        };
        f.write_str(name)
    }
}

/// A literal argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    Type(String),
    Enum { ty: String, variant: String },
}

impl Value {
    /// A type name argument, e.g. `Value::type_of::<String>()`
    pub fn type_of<T: ?Sized>() -> Self {
        Value::Type(std::any::type_name::<T>().to_string())
    }

    /// An enum variant argument
    pub fn variant(ty: impl Into<String>, variant: impl Into<String>) -> Self {
        Value::Enum {
            ty: ty.into(),
            variant: variant.into(),
        }
    }

    /// The runtime type of this value
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::I8(_) => TypeTag::I8,
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::U8(_) => TypeTag::U8,
            Value::U16(_) => TypeTag::U16,
            Value::U32(_) => TypeTag::U32,
            Value::U64(_) => TypeTag::U64,
            Value::F32(_) => TypeTag::F32,
            Value::F64(_) => TypeTag::F64,
            Value::Char(_) => TypeTag::Char,
            Value::Str(_) => TypeTag::Str,
            Value::Type(_) => TypeTag::Type,
            Value::Enum { ty, .. } => TypeTag::Enum(ty.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Type(name) => f.write_str(name),
            Value::Enum { variant, .. } => f.write_str(variant),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

/// Extraction of a typed argument from a [`Value`]
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! literal_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

literal_conversions! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => Str,
}

/// Fetch argument `index` as `T`
///
/// A missing or mistyped argument is reported as an `argument` failure of the
/// invocation.
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, Failure> {
    let value = args.get(index).ok_or_else(|| {
        Failure::new(
            "argument",
            format!("expected an argument at position {}, got {}", index, args.len()),
        )
    })?;
    T::from_value(value).ok_or_else(|| {
        Failure::new(
            "argument",
            format!(
                "argument {} is a {} ('{}'), expected {}",
                index,
                value.type_tag(),
                value,
                std::any::type_name::<T>()
            ),
        )
    })
}

/// Build an argument set from literals: `args![1i32, "two", 3.0]`
#[macro_export]
macro_rules! args {
    ($($value:expr),* $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),*]
    };
}
