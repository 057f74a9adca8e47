pub mod scanner;

use std::io::Read;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::Deserialize;

use crate::constants::END;
use crate::error::{Error, ErrorKind};
use crate::options::DecodeOptions;
use crate::Result;
use self::scanner::{Scanner, Token};

pub fn from_slice<'de, T: Deserialize<'de>>(input: &'de [u8], options: &DecodeOptions) -> Result<T> {
    let mut deserializer = Deserializer::new(input, options);
    let value = T::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

pub fn from_reader<T: DeserializeOwned, R: Read>(mut reader: R, options: &DecodeOptions) -> Result<T> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    from_slice(&buf, options)
}

/// Checks that the input is one well-formed value, without materializing it.
pub fn validate_slice(input: &[u8], options: &DecodeOptions) -> Result<()> {
    let mut deserializer = Deserializer::new(input, options);
    deserializer.scanner.skip_value()?;
    deserializer.end()
}

/// Token-pulling `serde::Deserializer` over a byte buffer. Borrowed targets
/// (`&[u8]`, `&str`) alias the input directly and share its lifetime.
pub struct Deserializer<'de> {
    scanner: Scanner<'de>,
}

impl<'de> Deserializer<'de> {
    pub fn new(input: &'de [u8], options: &DecodeOptions) -> Self {
        Self {
            scanner: Scanner::new(input, options),
        }
    }

    /// Fails with `TrailingData` if any input remains after the root value.
    pub fn end(&mut self) -> Result<()> {
        match self.scanner.peek() {
            Some(_) => Err(Error::at(ErrorKind::TrailingData, self.scanner.position())),
            None => Ok(()),
        }
    }

    fn next_token(&mut self) -> Result<Token<'de>> {
        self.scanner
            .next_token()?
            .ok_or_else(|| Error::at(ErrorKind::UnexpectedEnd, self.scanner.position()))
    }

    fn parse_integer_text(&mut self) -> Result<&'de str> {
        match self.next_token()? {
            // The scanner validated the span as sign + ASCII digits.
            Token::Integer(span) => {
                std::str::from_utf8(span).map_err(|_| Error::new(ErrorKind::InvalidInteger))
            }
            other => Err(Error::unexpected_token("integer", other.describe())),
        }
    }

    fn parse_bytes(&mut self) -> Result<&'de [u8]> {
        match self.next_token()? {
            Token::Bytes(payload) => Ok(payload),
            other => Err(Error::unexpected_token("byte string", other.describe())),
        }
    }

    fn parse_str(&mut self) -> Result<&'de str> {
        let payload = self.parse_bytes()?;
        std::str::from_utf8(payload)
            .map_err(|err| Error::new(ErrorKind::Message(format!("invalid utf-8: {err}"))))
    }

    fn parse_i64(&mut self) -> Result<i64> {
        let text = self.parse_integer_text()?;
        text.parse()
            .map_err(|_| Error::new(ErrorKind::IntegerOutOfRange))
    }

    fn parse_u64(&mut self) -> Result<u64> {
        let text = self.parse_integer_text()?;
        text.parse()
            .map_err(|_| Error::new(ErrorKind::IntegerOutOfRange))
    }

    fn parse_i128(&mut self) -> Result<i128> {
        let text = self.parse_integer_text()?;
        text.parse()
            .map_err(|_| Error::new(ErrorKind::IntegerOutOfRange))
    }

    fn parse_u128(&mut self) -> Result<u128> {
        let text = self.parse_integer_text()?;
        text.parse()
            .map_err(|_| Error::new(ErrorKind::IntegerOutOfRange))
    }

    fn parse_i64_checked<T: TryFrom<i64>>(&mut self) -> Result<T> {
        let value = self.parse_i64()?;
        T::try_from(value).map_err(|_| Error::new(ErrorKind::IntegerOutOfRange))
    }

    fn parse_u64_checked<T: TryFrom<u64>>(&mut self) -> Result<T> {
        let value = self.parse_u64()?;
        T::try_from(value).map_err(|_| Error::new(ErrorKind::IntegerOutOfRange))
    }
}

impl<'de, 'a> de::Deserializer<'de> for &'a mut Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.next_token()? {
            Token::Integer(span) => {
                let text = std::str::from_utf8(span)
                    .map_err(|_| Error::new(ErrorKind::InvalidInteger))?;
                if let Ok(value) = text.parse::<i64>() {
                    return visitor.visit_i64(value);
                }
                let value = text
                    .parse::<u64>()
                    .map_err(|_| Error::new(ErrorKind::IntegerOutOfRange))?;
                visitor.visit_u64(value)
            }
            Token::Bytes(payload) => visitor.visit_borrowed_bytes(payload),
            Token::ListBegin => visitor.visit_seq(ListAccess { de: self }),
            Token::DictBegin => visitor.visit_map(DictAccess { de: self }),
            Token::End => Err(Error::unexpected_token("value", "end of container")),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.parse_i64()? {
            0 => visitor.visit_bool(false),
            1 => visitor.visit_bool(true),
            _ => Err(de::Error::custom("expected integer 0 or 1 for bool")),
        }
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i8(self.parse_i64_checked()?)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i16(self.parse_i64_checked()?)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i32(self.parse_i64_checked()?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(self.parse_i64()?)
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i128(self.parse_i128()?)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u8(self.parse_u64_checked()?)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u16(self.parse_u64_checked()?)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u32(self.parse_u64_checked()?)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u64(self.parse_u64()?)
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u128(self.parse_u128()?)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(de::Error::custom(
            "floating point is not representable in bencode",
        ))
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let text = self.parse_str()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => visitor.visit_char(ch),
            _ => Err(de::Error::custom("expected a single character")),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.parse_str()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_string(self.parse_str()?.to_string())
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.parse_bytes()?)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_byte_buf(self.parse_bytes()?.to_vec())
    }

    /// Presence or absence of an optional field is decided by the record
    /// logic in `DictAccess`; a value that made it here is always present.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(de::Error::custom("bencode has no unit value"))
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.next_token()? {
            Token::ListBegin => visitor.visit_seq(ListAccess { de: self }),
            // A byte string also decodes as a sequence of its bytes, so
            // `Vec<u8>` works without a wrapper type.
            Token::Bytes(payload) => visitor.visit_seq(ByteSeqAccess::new(payload)),
            other => Err(Error::unexpected_token(
                "list or byte string",
                other.describe(),
            )),
        }
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.next_token()? {
            Token::ListBegin => {
                let value = visitor.visit_seq(TupleAccess {
                    de: &mut *self,
                    remaining: len,
                })?;
                match self.next_token()? {
                    Token::End => Ok(value),
                    other => Err(Error::unexpected_token("end of list", other.describe())),
                }
            }
            Token::Bytes(payload) => {
                if payload.len() != len {
                    return Err(Error::unexpected_token(
                        "byte string of the fixed target length",
                        "byte string of mismatched length",
                    ));
                }
                visitor.visit_seq(ByteSeqAccess::new(payload))
            }
            other => Err(Error::unexpected_token(
                "list or byte string",
                other.describe(),
            )),
        }
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.next_token()? {
            Token::DictBegin => visitor.visit_map(DictAccess { de: self }),
            other => Err(Error::unexpected_token("dictionary", other.describe())),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.next_token()? {
            // A bare byte string names a unit variant.
            Token::Bytes(payload) => {
                let variant = std::str::from_utf8(payload)
                    .map_err(|err| Error::new(ErrorKind::Message(format!("invalid utf-8: {err}"))))?;
                visitor.visit_enum(variant.into_deserializer())
            }
            // A single-entry dictionary carries the variant payload.
            Token::DictBegin => visitor.visit_enum(EnumDictAccess { de: self }),
            other => Err(Error::unexpected_token(
                "byte string or dictionary",
                other.describe(),
            )),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // Dictionary keys are raw byte strings; derived field identifier
        // visitors match them byte-for-byte.
        visitor.visit_borrowed_bytes(self.parse_bytes()?)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.scanner.skip_value()?;
        visitor.visit_unit()
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

struct ListAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
}

impl<'de> SeqAccess<'de> for ListAccess<'_, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.de.scanner.peek() {
            None => Err(Error::at(
                ErrorKind::UnexpectedEnd,
                self.de.scanner.position(),
            )),
            Some(END) => {
                self.de.next_token()?;
                Ok(None)
            }
            Some(_) => seed.deserialize(&mut *self.de).map(Some),
        }
    }
}

/// Fixed-length list access: exactly `remaining` elements must be present
/// before the closing `e`, which the caller consumes afterwards.
struct TupleAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
    remaining: usize,
}

impl<'de> SeqAccess<'de> for TupleAccess<'_, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        match self.de.scanner.peek() {
            None | Some(END) => Err(Error::at(
                ErrorKind::UnexpectedEnd,
                self.de.scanner.position(),
            )),
            Some(_) => {
                self.remaining -= 1;
                seed.deserialize(&mut *self.de).map(Some)
            }
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Presents a byte-string payload as a sequence of `u8`, which is how
/// `Vec<u8>` and `[u8; N]` reach the decoder through serde.
struct ByteSeqAccess<'de> {
    bytes: std::slice::Iter<'de, u8>,
}

impl<'de> ByteSeqAccess<'de> {
    fn new(payload: &'de [u8]) -> Self {
        Self {
            bytes: payload.iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for ByteSeqAccess<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.bytes.next() {
            Some(&byte) => seed.deserialize(byte.into_deserializer()).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.bytes.len())
    }
}

struct DictAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
}

impl<'de> MapAccess<'de> for DictAccess<'_, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.de.scanner.peek() {
            None => Err(Error::at(
                ErrorKind::UnexpectedEnd,
                self.de.scanner.position(),
            )),
            Some(END) => {
                self.de.next_token()?;
                Ok(None)
            }
            Some(b'0'..=b'9') => seed.deserialize(&mut *self.de).map(Some),
            Some(_) => {
                let token = self.de.next_token()?;
                Err(Error::unexpected_token(
                    "byte string key",
                    token.describe(),
                ))
            }
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.de)
    }
}

struct EnumDictAccess<'a, 'de> {
    de: &'a mut Deserializer<'de>,
}

impl<'a, 'de> EnumDictAccess<'a, 'de> {
    fn end(&mut self) -> Result<()> {
        match self.de.next_token()? {
            Token::End => Ok(()),
            other => Err(Error::unexpected_token(
                "end of dictionary",
                other.describe(),
            )),
        }
    }
}

impl<'de> EnumAccess<'de> for EnumDictAccess<'_, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(&mut *self.de)?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for EnumDictAccess<'_, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Err(Error::unexpected_token("byte string", "dictionary"))
    }

    fn newtype_variant_seed<T>(mut self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        let value = seed.deserialize(&mut *self.de)?;
        self.end()?;
        Ok(value)
    }

    fn tuple_variant<V>(mut self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let value = de::Deserializer::deserialize_tuple(&mut *self.de, len, visitor)?;
        self.end()?;
        Ok(value)
    }

    fn struct_variant<V>(
        mut self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let value = de::Deserializer::deserialize_struct(&mut *self.de, "", fields, visitor)?;
        self.end()?;
        Ok(value)
    }
}
