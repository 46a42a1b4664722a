//! Keyed archive codec.
//! Layout: 4-byte magic "FSKA", 1-byte format version, then a keyed JSON envelope
//! whose "$top" entry holds the archived object graph.

use serde::{Deserialize, Serialize};

use super::{Codec, CodecError, Value};

const NAME: &str = "keyed-archive";
const MAGIC: &[u8; 4] = b"FSKA";
const FORMAT_VERSION: u8 = 1;
const ARCHIVER: &str = "fs_handles";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "$archiver")]
    archiver: String,
    #[serde(rename = "$top")]
    top: Value,
}

/// Codec writing `Value`s as framed keyed archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedArchiveCodec;

impl Codec for KeyedArchiveCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let envelope = Envelope {
            archiver: ARCHIVER.to_string(),
            top: value.clone(),
        };
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        serde_json::to_writer(&mut out, &envelope).map_err(|e| CodecError::new(NAME, e.to_string()))?;
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let Some(rest) = bytes.strip_prefix(MAGIC.as_slice()) else {
            return Err(CodecError::new(NAME, "missing archive header"));
        };
        let Some((&version, payload)) = rest.split_first() else {
            return Err(CodecError::new(NAME, "truncated archive header"));
        };
        if version != FORMAT_VERSION {
            return Err(CodecError::new(NAME, format!("unsupported archive version {version}")));
        }
        let envelope: Envelope =
            serde_json::from_slice(payload).map_err(|e| CodecError::new(NAME, e.to_string()))?;
        Ok(envelope.top)
    }
}
