use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

/// An untyped bencode value.
///
/// Bencode has four data types: integers, byte strings, lists, and
/// dictionaries. `Value` holds any of them when no statically known target
/// shape is available, e.g. when inspecting a foreign metainfo file.
///
/// # Examples
///
/// ```
/// use serde_bencode::{decode_to_value, Value};
///
/// let value = decode_to_value(b"d3:fooi42ee").unwrap();
/// assert_eq!(value.get(b"foo").and_then(Value::as_integer), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string, not necessarily valid UTF-8.
    Bytes(Vec<u8>),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary with raw byte string keys.
    Dict(BTreeMap<Vec<u8>, Value>),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the value as a UTF-8 string, if it is a valid UTF-8 byte
    /// string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, Value>> {
        match self {
            Value::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a dictionary entry by key. Returns `None` for non-dictionary
    /// values as well as missing keys.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        match self {
            Value::Dict(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Converts to a JSON value for human-readable output. Byte strings
    /// render as text when valid UTF-8 and as lowercase hex otherwise;
    /// dictionary keys get the same treatment.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Integer(value) => serde_json::Value::from(*value),
            Value::Bytes(bytes) => serde_json::Value::String(render_bytes(bytes)),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Dict(entries) => {
                let mapped = entries
                    .iter()
                    .map(|(key, value)| (render_bytes(key), value.to_json()))
                    .collect();
                serde_json::Value::Object(mapped)
            }
        }
    }
}

fn render_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|byte| format!("{byte:02x}")).collect(),
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Bytes(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// Dictionary key wrapper so keys decode through `deserialize_byte_buf`
/// instead of a byte-wise sequence.
struct DictKey(Vec<u8>);

impl<'de> Deserialize<'de> for DictKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = DictKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte string key")
            }

            fn visit_bytes<E: de::Error>(self, payload: &[u8]) -> Result<Self::Value, E> {
                Ok(DictKey(payload.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, payload: Vec<u8>) -> Result<Self::Value, E> {
                Ok(DictKey(payload))
            }

            fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
                Ok(DictKey(text.as_bytes().to_vec()))
            }
        }

        deserializer.deserialize_byte_buf(KeyVisitor)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any bencode value")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::Integer(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                i64::try_from(value)
                    .map(Value::Integer)
                    .map_err(|_| E::custom("integer does not fit i64"))
            }

            fn visit_bytes<E: de::Error>(self, payload: &[u8]) -> Result<Self::Value, E> {
                Ok(Value::Bytes(payload.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, payload: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Value::Bytes(payload))
            }

            fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
                Ok(Value::Bytes(text.as_bytes().to_vec()))
            }

            fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(item) = access.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = BTreeMap::new();
                while let Some((DictKey(key), value)) = access.next_entry()? {
                    entries.insert(key, value);
                }
                Ok(Value::Dict(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
