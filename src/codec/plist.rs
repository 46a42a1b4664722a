//! XML property list codec (quick_xml serde).
//!
//! Document shape:
//!   <?xml ...?><!DOCTYPE plist ...><plist version="1.0"> ROOT </plist>
//! where ROOT is one of <true/>, <false/>, <integer>, <real>, <string>, <array>, <dict>.
//! Dictionaries alternate <key> elements with value elements.

use quick_xml::de::from_str as from_xml_str;
use quick_xml::se::to_string as to_xml_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Codec, CodecError, Value};

const NAME: &str = "xml-plist";
const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
    "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n"
);

/// Struct mirroring the XML document for (de)serialization.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "plist")]
struct PlistDocument {
    #[serde(rename = "@version")]
    version: String,
    #[serde(rename = "$value")]
    root: Node,
}

#[derive(Debug, Serialize, Deserialize)]
enum Node {
    #[serde(rename = "key")]
    Key(String),
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
    #[serde(rename = "integer")]
    Integer(i64),
    #[serde(rename = "real")]
    Real(f64),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "array")]
    Array(Children),
    #[serde(rename = "dict")]
    Dict(Children),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Children {
    #[serde(rename = "$value", default)]
    items: Vec<Node>,
}

/// Codec writing `Value`s as XML property lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlPlistCodec;

impl Codec for XmlPlistCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let doc = PlistDocument {
            version: "1.0".to_string(),
            root: to_node(value),
        };
        let body = to_xml_string(&doc).map_err(|e| CodecError::new(NAME, e.to_string()))?;
        let mut out = String::with_capacity(HEADER.len() + body.len() + 1);
        out.push_str(HEADER);
        out.push_str(&body);
        out.push('\n');
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::new(NAME, format!("not UTF-8: {e}")))?;
        let doc: PlistDocument =
            from_xml_str(text).map_err(|e| CodecError::new(NAME, e.to_string()))?;
        from_node(doc.root)
    }
}

fn to_node(value: &Value) -> Node {
    match value {
        Value::Boolean(true) => Node::True,
        Value::Boolean(false) => Node::False,
        Value::Integer(i) => Node::Integer(*i),
        Value::Real(f) => Node::Real(*f),
        Value::String(s) => Node::String(s.clone()),
        Value::Array(items) => Node::Array(Children {
            items: items.iter().map(to_node).collect(),
        }),
        Value::Dictionary(map) => {
            let mut items = Vec::with_capacity(map.len() * 2);
            for (k, v) in map {
                items.push(Node::Key(k.clone()));
                items.push(to_node(v));
            }
            Node::Dict(Children { items })
        }
    }
}

fn from_node(node: Node) -> Result<Value, CodecError> {
    Ok(match node {
        Node::True => Value::Boolean(true),
        Node::False => Value::Boolean(false),
        Node::Integer(i) => Value::Integer(i),
        Node::Real(f) => Value::Real(f),
        Node::String(s) => Value::String(s),
        Node::Array(children) => Value::Array(
            children
                .items
                .into_iter()
                .map(from_node)
                .collect::<Result<_, _>>()?,
        ),
        Node::Dict(children) => {
            let mut map = BTreeMap::new();
            let mut iter = children.items.into_iter();
            while let Some(entry) = iter.next() {
                let Node::Key(key) = entry else {
                    return Err(CodecError::new(NAME, "dict entry without a preceding <key>"));
                };
                let value = iter
                    .next()
                    .ok_or_else(|| CodecError::new(NAME, format!("<key>{key}</key> has no value")))?;
                map.insert(key, from_node(value)?);
            }
            Value::Dictionary(map)
        }
        Node::Key(key) => {
            return Err(CodecError::new(NAME, format!("<key>{key}</key> outside of a dict")));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::sample_composite;

    #[test]
    fn array_round_trip_keeps_order() {
        let codec = XmlPlistCodec;
        let v = Value::from(vec![1, 2, 3]);
        let bytes = codec.encode(&v).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<plist version=\"1.0\">"));
        assert!(text.contains("<integer>1</integer><integer>2</integer><integer>3</integer>"));
        assert_eq!(codec.decode(&bytes).unwrap(), v);
    }

    #[test]
    fn composite_round_trip() {
        let codec = XmlPlistCodec;
        let v = sample_composite();
        let decoded = codec.decode(&codec.encode(&v).unwrap()).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn dict_keys_precede_values() {
        let v: Value = [("answer", 42)].into_iter().collect();
        let text = String::from_utf8(XmlPlistCodec.encode(&v).unwrap()).unwrap();
        assert!(text.contains("<dict><key>answer</key><integer>42</integer></dict>"), "{text}");
    }

    #[test]
    fn reads_handwritten_document() {
        let doc = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<plist version=\"1.0\"><dict><key>name</key><string>files</string>",
            "<key>ok</key><true/></dict></plist>"
        );
        let v = XmlPlistCodec.decode(doc.as_bytes()).unwrap();
        let d = v.as_dictionary().unwrap();
        assert_eq!(d.get("name").and_then(Value::as_str), Some("files"));
        assert_eq!(d.get("ok").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(XmlPlistCodec.decode(b"\xff\xfe not xml").is_err());
        assert!(XmlPlistCodec.decode(b"<plist version=\"1.0\"><bogus/></plist>").is_err());
    }
}
