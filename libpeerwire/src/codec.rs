use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Turns application objects into payload bytes and back.
pub trait ObjectCodec: Clone + Send + Sync {
    fn encode_object<T: Serialize + ?Sized>(&self, obj: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode `length` bytes of `bytes`, starting at `offset`.
    fn decode_object<T: DeserializeOwned>(&self, bytes: &[u8], offset: usize, length: usize) -> Result<T, CodecError>;

    fn decode_all<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        self.decode_object(bytes, 0, bytes.len())
    }
}

/// Object codec using the RON text format.
///
/// Objects whose type is not known to the receiver decode as [`ron::Value`], which can be converted into a concrete
/// type later with [`ron::Value::into_rust`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RonCodec;

impl ObjectCodec for RonCodec {
    fn encode_object<T: Serialize + ?Sized>(&self, obj: &T) -> Result<Vec<u8>, CodecError> {
        let text = ron::to_string(obj)?;
        Ok(text.into_bytes())
    }

    fn decode_object<T: DeserializeOwned>(&self, bytes: &[u8], offset: usize, length: usize) -> Result<T, CodecError> {
        let end = offset.checked_add(length).filter(|end| *end <= bytes.len());
        let slice = match end {
            Some(end) => &bytes[offset..end],
            None => return Err(CodecError::OutOfBounds { offset, length, available: bytes.len() }),
        };
        let obj = ron::de::from_bytes(slice)?;
        Ok(obj)
    }
}
