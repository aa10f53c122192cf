use std::collections::BTreeMap;

use rmp_serde::{decode::Error as DecodeError, encode::Error as EncodeError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::envelope::UploaderCommand;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize payload to JSON value: {0}")]
    JsonSerialize(#[source] serde_json::Error),
    #[error("failed to encode canonical messagepack: {0}")]
    MessagePackEncode(#[source] EncodeError),
    #[error("failed to decode messagepack payload: {0}")]
    MessagePackDecode(#[source] DecodeError),
    #[error("failed to deserialize decoded payload to target type: {0}")]
    JsonDeserialize(#[source] serde_json::Error),
}

/// Encodes `value` as MessagePack with map keys in lexical order, so equal
/// commands always produce equal bytes.
pub fn encode_canonical<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_value(value).map_err(CodecError::JsonSerialize)?;
    rmp_serde::to_vec_named(&Canonical(&json)).map_err(CodecError::MessagePackEncode)
}

pub fn decode_canonical<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let decoded: Value = rmp_serde::from_slice(bytes).map_err(CodecError::MessagePackDecode)?;
    serde_json::from_value(decoded).map_err(CodecError::JsonDeserialize)
}

pub fn encode_command(command: &UploaderCommand) -> Result<Vec<u8>, CodecError> {
    encode_canonical(command)
}

pub fn decode_command(bytes: &[u8]) -> Result<UploaderCommand, CodecError> {
    decode_canonical(bytes)
}

struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(obj) => {
                let sorted: BTreeMap<&str, Canonical<'_>> = obj
                    .iter()
                    .map(|(key, item)| (key.as_str(), Canonical(item)))
                    .collect();
                sorted.serialize(serializer)
            }
            Value::Array(items) => serializer.collect_seq(items.iter().map(Canonical)),
            primitive => primitive.serialize(serializer),
        }
    }
}
