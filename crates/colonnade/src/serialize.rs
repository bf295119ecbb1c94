use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error as ThisError;

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub(crate) enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),
    #[error("deserialize error: {0}")]
    Deserialize(String),
}

/// Serialize a value into CBOR bytes.
pub(crate) fn serialize<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize CBOR bytes produced by [`serialize`].
///
/// Safety guarantees:
/// - Input size is bounded before decode.
/// - Any panic during decode is caught and reported as a deserialize error.
/// - No panic escapes this function.
pub(crate) fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > max_bytes {
        return Err(SerializeError::Deserialize(
            "payload exceeds maximum allowed size".into(),
        ));
    }

    let result = catch_unwind(AssertUnwindSafe(|| from_slice(bytes)));

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_decode_rejects_oversized_payloads() {
        let bytes = serialize(&vec![0u8; 64]).unwrap();
        let err = deserialize_bounded::<Vec<u8>>(&bytes, 8).unwrap_err();
        assert!(err.to_string().contains("maximum allowed size"));
    }

    #[test]
    fn round_trip() {
        let bytes = serialize(&("abc".to_string(), 7u32)).unwrap();
        let back: (String, u32) = deserialize_bounded(&bytes, 1024).unwrap();
        assert_eq!(back, ("abc".to_string(), 7));
    }
}
