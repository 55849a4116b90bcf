//! The tagged value tree every assertion argument is lowered into.
//!
//! Rust has no runtime reflection, so values opt in through [`Expectable`].
//! Scalars, strings, options, smart pointers, sequences and maps are covered
//! here; user types use [`expectable_struct!`](crate::expectable_struct),
//! [`expectable_newtype!`](crate::expectable_newtype) or
//! [`expectable_display!`](crate::expectable_display).

#![allow(missing_docs)]

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::Arc;

/// Underlying representation of a named scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    String,
    Integer,
    Float,
    Bool,
    Other,
}

impl BaseKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Integer(_) => Self::Integer,
            Value::Float(_) => Self::Float,
            Value::Bool(_) => Self::Bool,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Other => "composite",
        }
    }
}

/// A distinct type wrapping a scalar, e.g. `struct UserId(u64)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedScalar {
    pub base: BaseKind,
    pub type_name: String,
    /// Module path the type is defined in (`my_crate::ids`).
    pub module_path: String,
    pub inner: Box<Value>,
}

/// A struct with named fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
    /// Human-readable text when the type implements `Display`.
    pub display: Option<String>,
}

impl StructValue {
    #[must_use]
    pub fn with_display(mut self, text: impl Into<String>) -> Self {
        self.display = Some(text.into());
        self
    }
}

/// Canonical form of a runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Named(NamedScalar),
    /// `None` is an absent target.
    Pointer(Option<Box<Value>>),
    Struct(StructValue),
    /// Insertion order is kept for display only.
    Map(Vec<(Value, Value)>),
    Seq(Vec<Value>),
    /// Text from a value's `Display` implementation.
    Custom(String),
}

impl Value {
    /// Build a named scalar for `T`, taking name and module from `type_name`.
    #[must_use]
    pub fn named<T: ?Sized>(inner: Value) -> Self {
        let (module_path, type_name) = split_type_path(std::any::type_name::<T>());
        Self::Named(NamedScalar {
            base: BaseKind::of(&inner),
            type_name: type_name.to_string(),
            module_path: module_path.to_string(),
            inner: Box::new(inner),
        })
    }

    /// Build a struct value for `T`.
    #[must_use]
    pub fn structure<T: ?Sized>(fields: Vec<(String, Value)>) -> StructValue {
        let (_, type_name) = split_type_path(std::any::type_name::<T>());
        StructValue {
            type_name: type_name.to_string(),
            fields,
            display: None,
        }
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Named(_) => "named scalar",
            Self::Pointer(_) => "pointer",
            Self::Struct(_) => "struct",
            Self::Map(_) => "map",
            Self::Seq(_) => "sequence",
            Self::Custom(_) => "custom",
        }
    }

    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Verbose, inexact text dump used where no literal form exists.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out);
        out
    }

    fn dump_into(&self, out: &mut String) {
        match self {
            Self::Nil | Self::Pointer(None) => out.push_str("None"),
            Self::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Self::Integer(i) => {
                let _ = write!(out, "{i}");
            }
            Self::Float(f) => {
                let _ = write!(out, "{f:?}");
            }
            Self::String(s) => {
                let _ = write!(out, "{s:?}");
            }
            Self::Custom(s) => out.push_str(s),
            Self::Named(named) => {
                out.push_str(&named.type_name);
                out.push('(');
                named.inner.dump_into(out);
                out.push(')');
            }
            Self::Pointer(Some(target)) => target.dump_into(out),
            Self::Struct(st) => {
                out.push_str(&st.type_name);
                if st.fields.is_empty() {
                    return;
                }
                out.push_str(" { ");
                for (idx, (name, value)) in st.fields.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                    out.push_str(": ");
                    value.dump_into(out);
                }
                out.push_str(" }");
            }
            Self::Map(entries) => {
                out.push('{');
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    key.dump_into(out);
                    out.push_str(": ");
                    value.dump_into(out);
                }
                out.push('}');
            }
            Self::Seq(items) => {
                out.push('[');
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    item.dump_into(out);
                }
                out.push(']');
            }
        }
    }
}

/// Deep structural equality.
///
/// Maps compare as key/value sets, everything else positionally. Integer and
/// float never compare equal to each other here; the canonical-text fallback
/// in the oracle reconciles those.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) | (Self::Custom(a), Self::Custom(b)) => a == b,
            (Self::Named(a), Self::Named(b)) => a == b,
            (Self::Pointer(a), Self::Pointer(b)) => a == b,
            (Self::Struct(a), Self::Struct(b)) => {
                a.type_name == b.type_name && a.fields == b.fields
            }
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            key == other_key && value == other_value
                        })
                    })
            }
            _ => false,
        }
    }
}

/// Split `my_crate::ids::UserId<T>` into (`my_crate::ids`, `UserId<T>`).
#[must_use]
pub fn split_type_path(full: &str) -> (&str, &str) {
    let generic_start = full.find('<').unwrap_or(full.len());
    match full[..generic_start].rfind("::") {
        Some(idx) => (&full[..idx], &full[idx + 2..]),
        None => ("", full),
    }
}

/// Lowering of a runtime value into a [`Value`].
pub trait Expectable {
    fn to_value(&self) -> Value;
}

impl Expectable for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: Expectable + ?Sized> Expectable for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Expectable + ?Sized> Expectable for &mut T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl Expectable for () {
    fn to_value(&self) -> Value {
        Value::Nil
    }
}

impl Expectable for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! integer_expectable {
    ($($ty:ty),*) => {
        $(
            impl Expectable for $ty {
                fn to_value(&self) -> Value {
                    Value::Integer(i128::from(*self))
                }
            }
        )*
    };
}

integer_expectable!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl Expectable for isize {
    fn to_value(&self) -> Value {
        // isize is at most 64 bits on every supported target.
        Value::Integer(*self as i128)
    }
}

impl Expectable for usize {
    fn to_value(&self) -> Value {
        Value::Integer(*self as i128)
    }
}

impl Expectable for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Expectable for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Expectable for char {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Expectable for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Expectable for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl<T: Expectable> Expectable for Option<T> {
    fn to_value(&self) -> Value {
        Value::Pointer(self.as_ref().map(|inner| Box::new(inner.to_value())))
    }
}

impl<T: Expectable + ?Sized> Expectable for Box<T> {
    fn to_value(&self) -> Value {
        Value::Pointer(Some(Box::new((**self).to_value())))
    }
}

impl<T: Expectable + ?Sized> Expectable for Rc<T> {
    fn to_value(&self) -> Value {
        Value::Pointer(Some(Box::new((**self).to_value())))
    }
}

impl<T: Expectable + ?Sized> Expectable for Arc<T> {
    fn to_value(&self) -> Value {
        Value::Pointer(Some(Box::new((**self).to_value())))
    }
}

impl<T: Expectable> Expectable for [T] {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Expectable::to_value).collect())
    }
}

impl<T: Expectable, const N: usize> Expectable for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: Expectable> Expectable for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<K: Expectable, V: Expectable, S> Expectable for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.to_value(), value.to_value()))
                .collect(),
        )
    }
}

impl<K: Expectable, V: Expectable> Expectable for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.to_value(), value.to_value()))
                .collect(),
        )
    }
}

/// Implement [`Expectable`] for a struct by listing the fields to expose.
///
/// Append `; display` to also carry the type's `Display` text, which then
/// becomes its literal form.
///
/// ```rust
/// use expect_patch::expectable_struct;
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// expectable_struct!(Person { name, age });
/// ```
#[macro_export]
macro_rules! expectable_struct {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Expectable for $ty {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::Struct($crate::Value::structure::<$ty>(::std::vec![
                    $((
                        ::std::string::String::from(::std::stringify!($field)),
                        $crate::Expectable::to_value(&self.$field),
                    )),*
                ]))
            }
        }
    };
    ($ty:ty { $($field:ident),* $(,)? }; display) => {
        impl $crate::Expectable for $ty {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::Struct(
                    $crate::Value::structure::<$ty>(::std::vec![
                        $((
                            ::std::string::String::from(::std::stringify!($field)),
                            $crate::Expectable::to_value(&self.$field),
                        )),*
                    ])
                    .with_display(::std::string::ToString::to_string(self)),
                )
            }
        }
    };
}

/// Implement [`Expectable`] for a single-field tuple struct as a named scalar.
#[macro_export]
macro_rules! expectable_newtype {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Expectable for $ty {
                fn to_value(&self) -> $crate::Value {
                    $crate::Value::named::<$ty>($crate::Expectable::to_value(&self.0))
                }
            }
        )+
    };
}

/// Implement [`Expectable`] through the type's `Display` text.
#[macro_export]
macro_rules! expectable_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Expectable for $ty {
                fn to_value(&self) -> $crate::Value {
                    $crate::Value::Custom(::std::string::ToString::to_string(self))
                }
            }
        )+
    };
}
