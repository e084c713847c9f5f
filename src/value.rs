// This file is part of the tf-provider project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! [`Value`] module

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{Debug, Display},
    marker::PhantomData,
    ops::Deref,
};

use serde::{
    de::{IntoDeserializer, Visitor},
    Deserialize, Serialize,
};

use crate::utils::serde_unknown;

/// Encode either a known value, a null value, or an unknown value as specified by the Terraform protocol.
///
/// [`Value`] is closely modeled after [`Option`] where:
/// - [`Value::Value`] is equivalent to [`Option::Some`],
/// - [`Value::Null`] is equivalent to [`Option::None`],
/// - [`Value::Unknown`] has no option counterpart and represent a value that is currently unknown, but will be known later on.
///
/// In JSON, [`Value::Unknown`] is encoded with the Terraform unknown sentinel string,
/// whatever the type of the value.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub enum Value<T> {
    /// Value is present
    Value(T),
    /// No value is present
    #[default]
    Null,
    /// Value is unknown
    Unknown,
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Value(value) => value.serialize(serializer),
            Value::Null => serializer.serialize_none(),
            Value::Unknown => serde_unknown::serialize(serializer),
        }
    }
}

macro_rules! forward_visit {
    ($($visit:ident($value:ty)),*$(,)?) => {
        $(
            fn $visit<E>(self, v: $value) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                T::deserialize(v.into_deserializer()).map(Value::Value)
            }
        )*
    };
}

macro_rules! forward_visit_trait {
    ([ ($v:ident) ]) => {
        $v
    };
    ([ $de:ident($v:ident)]) => {
        serde::de::value::$de::new($v)
    };
    ($($visit:ident($($trait:tt)*)$(-> $de:ident)?),*$(,)?) => {
        $(
            fn $visit<E>(self, v: E) -> Result<Self::Value, E::Error>
            where
                E: $($trait)*,
            {
                T::deserialize(forward_visit_trait!([$($de)?(v)])).map(Value::Value)
            }
        )*
    };
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueVisitor<T>(PhantomData<T>);
        impl<'de, T: Deserialize<'de>> Visitor<'de> for ValueVisitor<T> {
            type Value = Value<T>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "any value")
            }

            forward_visit!(
                visit_bool(bool),
                visit_char(char),
                visit_f32(f32),
                visit_f64(f64),
                visit_i8(i8),
                visit_i16(i16),
                visit_i32(i32),
                visit_i64(i64),
                visit_u8(u8),
                visit_u16(u16),
                visit_u32(u32),
                visit_u64(u64),
                visit_byte_buf(Vec<u8>),
            );
            forward_visit_trait!(
                visit_enum(serde::de::EnumAccess<'de>) -> EnumAccessDeserializer,
                visit_map(serde::de::MapAccess<'de>) -> MapAccessDeserializer,
                visit_seq(serde::de::SeqAccess<'de>) -> SeqAccessDeserializer,
                visit_some(serde::Deserializer<'de>),
            );

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                T::deserialize(serde::de::value::BytesDeserializer::new(v)).map(Value::Value)
            }
            fn visit_borrowed_str<E>(self, v: &'de str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if serde_unknown::is_unknown(v) {
                    return Ok(Value::Unknown);
                }
                T::deserialize(serde::de::value::BorrowedStrDeserializer::new(v)).map(Value::Value)
            }
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if serde_unknown::is_unknown(v) {
                    return Ok(Value::Unknown);
                }
                T::deserialize(v.into_deserializer()).map(Value::Value)
            }
            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if serde_unknown::is_unknown(&v) {
                    return Ok(Value::Unknown);
                }
                T::deserialize(v.into_deserializer()).map(Value::Value)
            }
            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Null)
            }
            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Null)
            }
        }
        deserializer.deserialize_any(ValueVisitor(PhantomData))
    }
}

/// Struct without any field
#[derive(
    Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Debug, Hash, Default, Serialize, Deserialize,
)]
pub struct StructEmpty {}

pub type ValueEmpty = Value<StructEmpty>;
pub type ValueString<'a> = Value<Cow<'a, str>>;
pub type ValueNumber = Value<i64>;
pub type ValueFloat = Value<f64>;
pub type ValueBool = Value<bool>;
pub type ValueList<T> = Value<Vec<T>>;
pub type ValueMap<'a, T> = Value<BTreeMap<Cow<'a, str>, T>>;

/// Serde codec to encode a nullable as a vec that has either zero or one element
///
/// Terraform encodes single nested blocks as lists, this codec unwraps them.
pub mod serde_as_vec {
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Serialize};

    use super::Value;

    /// Serialize a nullable Value into a Vec of Values with 0 or 1 element
    pub fn serialize<T, S>(value: &Value<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: Serialize,
    {
        let mut seq = serializer.serialize_seq(Some(value.is_value() as usize))?;
        if let Value::Value(value) = value {
            seq.serialize_element(value)?;
        }
        seq.end()
    }

    /// Deserialize a Vec of values into a single, nullable, Value
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Value<T>, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let vec: Value<Vec<Value<T>>> = Deserialize::deserialize(deserializer)?;
        match vec {
            Value::Value(vec) => {
                let mut iter = vec.into_iter();
                match (iter.next(), iter.next()) {
                    (Some(value), None) => Ok(value),
                    (None, _) => Ok(Value::Null),
                    (Some(_), Some(_)) => Err(D::Error::custom(
                        "Try to store multiple elements in a single Value",
                    )),
                }
            }
            Value::Null => Ok(Value::Null),
            Value::Unknown => Ok(Value::Unknown),
        }
    }
}

impl<T> Value<T> {
    /////////////////////////////////////////////////////////////////////////
    // Querying the contained values
    /////////////////////////////////////////////////////////////////////////

    /// Check if the value is known and present
    #[inline]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Check if the value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if the value is unknown
    #[inline]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /////////////////////////////////////////////////////////////////////////
    // Adapter for working with references
    /////////////////////////////////////////////////////////////////////////

    /// Converts from `&Value<T>` to `Value<&T>`
    ///
    /// # Examples
    ///
    /// ```
    /// # use tf_provider_cloud::value::Value;
    /// let text: Value<String> = Value::Value("Hello, world!".to_string());
    /// let text_length: Value<usize> = text.as_ref().map(|s| s.len());
    /// assert_eq!(text_length, Value::Value(13));
    /// ```
    #[inline]
    pub const fn as_ref(&self) -> Value<&T> {
        match *self {
            Self::Value(ref x) => Value::Value(x),
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
        }
    }

    /// Converts from `&Value<T>` to `Value<&T::Target>`
    ///
    /// # Examples
    ///
    /// ```
    /// # use tf_provider_cloud::value::{Value, ValueString};
    /// let name: ValueString = Value::Value("web".into());
    /// assert_eq!(name.as_deref(), Value::Value("web"));
    /// ```
    #[inline]
    pub fn as_deref(&self) -> Value<&T::Target>
    where
        T: Deref,
    {
        match self.as_ref() {
            Value::Value(t) => Value::Value(t.deref()),
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
        }
    }

    /////////////////////////////////////////////////////////////////////////
    // Getting to contained values
    /////////////////////////////////////////////////////////////////////////

    /// Returns the contained [`Value::Value`] value or a provided default.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tf_provider_cloud::value::Value;
    /// assert_eq!(Value::Value("car").unwrap_or("bike"), "car");
    /// assert_eq!(Value::Null.unwrap_or("bike"), "bike");
    /// assert_eq!(Value::Unknown.unwrap_or("bike"), "bike");
    /// ```
    #[inline]
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Value(x) => x,
            _ => default,
        }
    }

    /// Returns the contained [`Value::Value`] value or computes it from a closure.
    #[inline]
    pub fn unwrap_or_else<F>(self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self {
            Self::Value(x) => x,
            _ => f(),
        }
    }

    /// Returns the contained [`Value::Value`] value or a default.
    #[inline]
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            Self::Value(x) => x,
            _ => Default::default(),
        }
    }

    /////////////////////////////////////////////////////////////////////////
    // Transforming contained values
    /////////////////////////////////////////////////////////////////////////

    /// Maps a `Value<T>` to `Value<U>` by applying a function to a contained value (if `Value::Value`)
    /// or returns `Value::Null` (if `Value::Null`) and `Value::Unknown` (if `Value::Unknown`).
    ///
    /// # Examples
    ///
    /// ```
    /// # use tf_provider_cloud::value::Value;
    /// let x: Value<&str> = Value::Value("Hello");
    /// assert_eq!(x.map(|s| s.len()), Value::Value(5));
    ///
    /// let y: Value<&str> = Value::Unknown;
    /// assert_eq!(y.map(|s| s.len()), Value::Unknown);
    /// ```
    #[inline]
    pub fn map<U, F>(self, f: F) -> Value<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Value(x) => Value::Value(f(x)),
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
        }
    }

    /// Returns the provided default result (if null or unknown),
    /// or applies a function to the contained value (if any).
    #[inline]
    pub fn map_or<U, F>(self, default: U, f: F) -> U
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Value(t) => f(t),
            _ => default,
        }
    }

    /// Returns `self` if it contains a value, otherwise returns `rhs`.
    ///
    /// An unknown `self` stays unknown: it may become a value later on.
    #[inline]
    pub fn or(self, rhs: Self) -> Self {
        match self {
            Self::Null => rhs,
            x => x,
        }
    }

    /// Transforms the `Value<T>` into a [`Result<T, E>`], mapping [`Value::Value(v)`] to
    /// [`Ok(v)`] and [`Value::Null`] or [`Value::Unknown`] to [`Err(err())`].
    ///
    /// [`Ok(v)`]: Ok
    /// [`Err(err())`]: Err
    /// [`Value::Value(v)`]: Value::Value
    #[inline]
    pub fn ok_or_else<E, F>(self, err: F) -> Result<T, E>
    where
        F: FnOnce() -> E,
    {
        match self {
            Self::Value(v) => Ok(v),
            _ => Err(err()),
        }
    }

    /// Convert the value into an [`Option`], both null and unknown become [`None`]
    #[inline]
    pub fn as_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Convert a reference to the value into an [`Option`] of a reference
    #[inline]
    pub fn as_ref_option(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns an iterator over the possibly contained value.
    #[inline]
    pub fn iter(&self) -> std::option::IntoIter<&T> {
        self.as_ref_option().into_iter()
    }
}

impl<T> Value<&T> {
    /// Maps a `Value<&T>` to a `Value<T>` by cloning the contents of the value.
    #[inline]
    pub fn cloned(self) -> Value<T>
    where
        T: Clone,
    {
        self.map(T::clone)
    }
}

impl<'a> Value<Cow<'a, str>> {
    /// Get the string slice, empty if null or unknown
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            Value::Value(s) => s.as_ref(),
            _ => "",
        }
    }

    /// Detach the string from its borrowed lifetime
    #[inline]
    pub fn extend<'b>(self) -> Value<Cow<'b, str>> {
        self.map(|s| Cow::Owned(s.into_owned()))
    }

    /// Owned string for optional request fields: `None` unless present and not empty
    #[inline]
    pub fn to_option(&self) -> Option<String> {
        match self {
            Value::Value(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        }
    }
}

/////////////////////////////////////////////////////////////////////////
// Change detection
/////////////////////////////////////////////////////////////////////////

/// Values that may be blank
///
/// A blank value is considered equivalent to a null value when comparing plan and state.
pub trait Blank {
    /// Check if the value is blank
    fn is_blank(&self) -> bool {
        false
    }
}

impl Blank for str {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for Cow<'_, str> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Blank + ?Sized> Blank for &T {
    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

macro_rules! impl_never_blank {
    ($($t:ty)*) => {
        $(impl Blank for $t {})*
    };
}

impl_never_blank!(bool i32 i64 u16 u32 u64 f64);

impl<T: Blank> Value<T> {
    /// Converts from `&Value<T>` to `Value<&T>`, replacing blank values by [`Value::Null`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use tf_provider_cloud::value::{Value, ValueString};
    /// let empty: ValueString = Value::Value("".into());
    /// assert!(empty.normalized().is_null());
    /// ```
    #[inline]
    pub fn normalized(&self) -> Value<&T> {
        match self {
            Value::Value(v) if v.is_blank() => Value::Null,
            v => v.as_ref(),
        }
    }

    /// Check if the value is known to be present and not blank
    #[inline]
    pub fn is_present(&self) -> bool {
        self.normalized().is_value()
    }
}

/// Check if a planned value differs from the value in the state
///
/// Returns `false` whenever either side is unknown: the difference cannot be judged yet.
/// Null and blank values are equivalent.
///
/// # Examples
///
/// ```
/// # use tf_provider_cloud::value::{changed, Value, ValueString};
/// let null: ValueString = Value::Null;
/// let empty: ValueString = Value::Value("".into());
/// let unknown: ValueString = Value::Unknown;
/// let name: ValueString = Value::Value("web".into());
/// assert!(!changed(&null, &empty));
/// assert!(!changed(&unknown, &name));
/// assert!(changed(&name, &null));
/// ```
pub fn changed<T>(plan: &Value<T>, state: &Value<T>) -> bool
where
    T: Blank + PartialEq,
{
    match (plan.normalized(), state.normalized()) {
        (Value::Unknown, _) | (_, Value::Unknown) => false,
        (plan, state) => plan != state,
    }
}

impl<T: Debug> Debug for Value<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => value.fmt(f),
            Self::Null => f.write_str("Null"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

impl<T> From<T> for Value<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T> From<Option<T>> for Value<T> {
    #[inline]
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        }
    }
}

impl<'a> From<&'a str> for Value<Cow<'a, str>> {
    fn from(value: &'a str) -> Self {
        Value::Value(Cow::Borrowed(value))
    }
}

impl From<String> for Value<Cow<'_, str>> {
    fn from(value: String) -> Self {
        Value::Value(Cow::Owned(value))
    }
}

impl From<Option<String>> for Value<Cow<'_, str>> {
    fn from(value: Option<String>) -> Self {
        value.map(Cow::Owned).into()
    }
}

impl Display for Value<Cow<'_, str>> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Value(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Unknown => f.write_str("(known after apply)"),
        }
    }
}
