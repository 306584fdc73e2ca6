//! Response body deserializers.
//!
//! # Responsibilities
//! - Turn a validated response into the caller's value type
//! - Signal malformed input as an error; the dispatch engine wraps it as
//!   `FuelError::Deserialization`

use std::marker::PhantomData;
use std::str;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::BoxError;
use crate::http::Response;

/// Converts a response into a typed value.
pub trait Deserializer: Send + Sync + 'static {
    type Output: Send + 'static;

    fn deserialize(&self, response: &Response) -> Result<Self::Output, BoxError>;
}

/// Raw body bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesDeserializer;

impl Deserializer for BytesDeserializer {
    type Output = Bytes;

    fn deserialize(&self, response: &Response) -> Result<Bytes, BoxError> {
        Ok(response.body().clone())
    }
}

/// Text encodings understood by the string deserializers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charset {
    /// Strict: invalid sequences are an error.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to one code point.
    Latin1,
}

impl Charset {
    pub fn decode(&self, bytes: &[u8]) -> Result<String, BoxError> {
        match self {
            Charset::Utf8 => Ok(str::from_utf8(bytes)?.to_string()),
            Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Body decoded as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringDeserializer {
    pub charset: Charset,
}

impl StringDeserializer {
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }
}

impl Deserializer for StringDeserializer {
    type Output = String;

    fn deserialize(&self, response: &Response) -> Result<String, BoxError> {
        self.charset.decode(response.body())
    }
}

/// Body parsed as JSON into `T`.
pub struct JsonDeserializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDeserializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDeserializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deserializer for JsonDeserializer<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn deserialize(&self, response: &Response) -> Result<T, BoxError> {
        Ok(serde_json::from_slice(response.body())?)
    }
}

/// Body decoded with `charset`, then handed to a closure.
pub struct TextDeserializer<F> {
    charset: Charset,
    parse: F,
}

impl<F> TextDeserializer<F> {
    pub fn new(parse: F) -> Self {
        Self {
            charset: Charset::Utf8,
            parse,
        }
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }
}

impl<F, T> Deserializer for TextDeserializer<F>
where
    F: Fn(&str) -> Result<T, BoxError> + Send + Sync + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn deserialize(&self, response: &Response) -> Result<T, BoxError> {
        let text = self.charset.decode(response.body())?;
        (self.parse)(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use url::Url;

    fn response(body: &'static [u8]) -> Response {
        Response::new(Url::parse("http://example.test/").unwrap(), 200).with_body(body)
    }

    #[test]
    fn test_strict_utf8_rejects_invalid_input() {
        let deserializer = StringDeserializer::default();
        assert_eq!(deserializer.deserialize(&response(b"hello")).unwrap(), "hello");
        assert!(deserializer.deserialize(&response(b"\xff\xfe")).is_err());
    }

    #[test]
    fn test_latin1_maps_every_byte() {
        let deserializer = StringDeserializer::new(Charset::Latin1);
        assert_eq!(deserializer.deserialize(&response(b"caf\xe9")).unwrap(), "café");
    }

    #[test]
    fn test_json_into_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Origin {
            origin: String,
        }

        let deserializer = JsonDeserializer::<Origin>::new();
        let parsed = deserializer
            .deserialize(&response(br#"{"origin":"127.0.0.1"}"#))
            .unwrap();
        assert_eq!(parsed.origin, "127.0.0.1");
        assert!(deserializer.deserialize(&response(b"not json")).is_err());
    }

    #[test]
    fn test_text_closure() {
        let deserializer = TextDeserializer::new(|text: &str| -> Result<usize, BoxError> {
            Ok(text.lines().count())
        });
        assert_eq!(deserializer.deserialize(&response(b"a\nb\nc")).unwrap(), 3);
    }
}
