//! Type Tagger - scalar kinds at the tree boundary
//!
//! Every scalar is written as a node whose first child is its kind and whose
//! optional second child is the payload text:
//!
//! ```text
//! Null        → (null)
//! Missing     → (undefined)
//! Bool(true)  → (bool true)
//! Int(-3)     → (int -3)
//! Float(NaN)  → (float NaN)
//! Str("a b")  → (str YSBi)        base64 of the UTF-8 bytes
//! ```
//!
//! The kind is decided by the `Value` variant, never by numeric content:
//! `Float(2.0)` stays `float` and `Int(2)` stays `int`.

use base64::{engine::general_purpose::STANDARD, Engine};
use lino_tree::Link;
use tracing::warn;

use crate::config::{CodecConfig, MalformedPolicy};
use crate::error::{CodecError, Result};
use crate::value::Value;

// =============================================================================
// KIND VOCABULARY
// =============================================================================

/// Reserved kind labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Undefined,
    Bool,
    Int,
    Float,
    Str,
    Array,
    Object,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::Null,
        Kind::Undefined,
        Kind::Bool,
        Kind::Int,
        Kind::Float,
        Kind::Str,
        Kind::Array,
        Kind::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Undefined => "undefined",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Str => "str",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }

    /// Parse a kind label. With `legacy` set, the older aliases
    /// `None`, `list` and `dict` are accepted too.
    pub fn parse(label: &str, legacy: bool) -> Option<Kind> {
        let kind = match label {
            "null" => Kind::Null,
            "undefined" => Kind::Undefined,
            "bool" => Kind::Bool,
            "int" => Kind::Int,
            "float" => Kind::Float,
            "str" => Kind::Str,
            "array" => Kind::Array,
            "object" => Kind::Object,
            "None" if legacy => Kind::Null,
            "list" if legacy => Kind::Array,
            "dict" if legacy => Kind::Object,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Kind::Array | Kind::Object)
    }

    pub fn tag(&self) -> Link {
        Link::leaf(self.as_str())
    }
}

// =============================================================================
// ENCODE
// =============================================================================

/// Tree node for a scalar, or `None` for composites
pub fn encode_scalar(value: &Value) -> Option<Link> {
    let link = match value {
        Value::Null => Link::node(vec![Kind::Null.tag()]),
        Value::Missing => Link::node(vec![Kind::Undefined.tag()]),
        Value::Bool(b) => Link::node(vec![Kind::Bool.tag(), Link::leaf(b.to_string())]),
        Value::Int(n) => Link::node(vec![Kind::Int.tag(), Link::leaf(n.to_string())]),
        Value::Float(x) => Link::node(vec![Kind::Float.tag(), Link::leaf(float_text(*x))]),
        Value::Str(s) => Link::node(vec![Kind::Str.tag(), Link::leaf(STANDARD.encode(s.as_bytes()))]),
        Value::Sequence(_) | Value::Mapping(_) => return None,
    };
    Some(link)
}

/// Shortest text that parses back to the same `f64`
pub fn float_text(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x == f64::INFINITY {
        "Infinity".to_string()
    } else if x == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{:?}", x)
    }
}

// =============================================================================
// DECODE
// =============================================================================

/// Inverse of `encode_scalar`: `payload` is the child after the kind tag
pub fn decode_scalar(kind: Kind, payload: Option<&Link>, config: &CodecConfig) -> Result<Value> {
    let text = match kind {
        Kind::Null => return Ok(Value::Null),
        Kind::Undefined => return Ok(Value::Missing),
        Kind::Array | Kind::Object => {
            return Err(CodecError::UnsupportedTypeTag {
                tag: kind.as_str().to_string(),
            })
        }
        _ => match payload {
            Some(Link::Leaf(text)) => text.as_str(),
            Some(node) => {
                return Err(CodecError::InvalidScalar {
                    kind: kind.as_str().to_string(),
                    text: node.to_notation(),
                })
            }
            None => return malformed(kind, config),
        },
    };

    let invalid = || CodecError::InvalidScalar {
        kind: kind.as_str().to_string(),
        text: text.to_string(),
    };

    match kind {
        Kind::Bool => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "True" if config.legacy_forms => Ok(Value::Bool(true)),
            "False" if config.legacy_forms => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        Kind::Int => text.parse::<i64>().map(Value::Int).map_err(|_| invalid()),
        Kind::Float => match text {
            "NaN" => Ok(Value::Float(f64::NAN)),
            "Infinity" => Ok(Value::Float(f64::INFINITY)),
            "-Infinity" => Ok(Value::Float(f64::NEG_INFINITY)),
            _ => text.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
        },
        Kind::Str => decode_str(text, config).ok_or_else(invalid),
        Kind::Null | Kind::Undefined | Kind::Array | Kind::Object => Err(invalid()),
    }
}

fn decode_str(text: &str, config: &CodecConfig) -> Option<Value> {
    let decoded = STANDARD
        .decode(text)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    match decoded {
        Some(s) => Some(Value::Str(s)),
        None if config.legacy_forms => {
            warn!(payload = text, "str payload is not base64 UTF-8, keeping raw text");
            Some(Value::Str(text.to_string()))
        }
        None => None,
    }
}

/// Missing payload: default value or error depending on policy
fn malformed(kind: Kind, config: &CodecConfig) -> Result<Value> {
    match config.malformed_nodes {
        MalformedPolicy::Strict => Err(CodecError::MalformedNode {
            kind: kind.as_str().to_string(),
            expected: "a payload child".to_string(),
        }),
        MalformedPolicy::Lenient => {
            warn!(kind = kind.as_str(), "scalar node without payload, using default");
            Ok(match kind {
                Kind::Bool => Value::Bool(false),
                Kind::Int => Value::Int(0),
                Kind::Float => Value::Float(0.0),
                _ => Value::Str(String::new()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn notation(value: &Value) -> String {
        encode_scalar(value).unwrap().to_notation()
    }

    fn decode(kind: Kind, payload: &str) -> Result<Value> {
        decode_scalar(kind, Some(&Link::leaf(payload)), &CodecConfig::default())
    }

    #[test]
    fn test_scalar_notation() {
        assert_eq!(notation(&Value::Null), "(null)");
        assert_eq!(notation(&Value::Missing), "(undefined)");
        assert_eq!(notation(&Value::Bool(true)), "(bool true)");
        assert_eq!(notation(&Value::Int(-42)), "(int -42)");
        assert_eq!(notation(&Value::Float(3.5)), "(float 3.5)");
        assert_eq!(notation(&Value::Float(2.0)), "(float 2.0)");
        assert_eq!(notation(&Value::from("hello")), "(str aGVsbG8=)");
        assert_eq!(notation(&Value::from("")), r#"(str "")"#);
    }

    #[test]
    fn test_special_floats() {
        assert_eq!(float_text(f64::NAN), "NaN");
        assert_eq!(float_text(f64::INFINITY), "Infinity");
        assert_eq!(float_text(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(float_text(-0.0), "-0.0");
        assert!(decode(Kind::Float, "NaN").unwrap().as_float().unwrap().is_nan());
        assert_eq!(decode(Kind::Float, "-Infinity").unwrap(), Value::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn test_float_text_parses_back() {
        for x in [0.1, 1e100, -2.5e-300, f64::MAX, f64::MIN_POSITIVE, 123456789.0] {
            assert_eq!(float_text(x).parse::<f64>().unwrap(), x);
        }
    }

    #[test]
    fn test_kind_is_declared_not_inferred() {
        assert_eq!(decode(Kind::Float, "2.0").unwrap(), Value::Float(2.0));
        assert_eq!(decode(Kind::Int, "2").unwrap(), Value::Int(2));
        assert!(decode(Kind::Int, "2.0").is_err());
    }

    #[test]
    fn test_kind_parse() {
        for kind in Kind::ALL {
            assert_eq!(Kind::parse(kind.as_str(), false), Some(kind));
        }
        assert_eq!(Kind::parse("dict", true), Some(Kind::Object));
        assert_eq!(Kind::parse("dict", false), None);
        assert_eq!(Kind::parse("None", true), Some(Kind::Null));
        assert_eq!(Kind::parse("tuple", true), None);
    }

    #[test]
    fn test_legacy_bool_text() {
        assert_eq!(decode(Kind::Bool, "True").unwrap(), Value::Bool(true));
        let strict = CodecConfig {
            legacy_forms: false,
            ..CodecConfig::default()
        };
        assert!(decode_scalar(Kind::Bool, Some(&Link::leaf("True")), &strict).is_err());
    }

    #[test]
    fn test_invalid_payloads() {
        assert_eq!(
            decode(Kind::Int, "99999999999999999999"),
            Err(CodecError::InvalidScalar {
                kind: "int".to_string(),
                text: "99999999999999999999".to_string()
            })
        );
        assert!(decode(Kind::Bool, "yes").is_err());
        assert!(decode(Kind::Float, "one").is_err());
        let nested = Link::node(vec![Link::leaf("x")]);
        assert!(decode_scalar(Kind::Int, Some(&nested), &CodecConfig::default()).is_err());
    }

    #[test]
    fn test_non_base64_str_payload() {
        assert_eq!(decode(Kind::Str, "not base64!").unwrap(), Value::from("not base64!"));
        let strict = CodecConfig {
            legacy_forms: false,
            ..CodecConfig::default()
        };
        assert!(decode_scalar(Kind::Str, Some(&Link::leaf("not base64!")), &strict).is_err());
    }

    #[test]
    fn test_missing_payload_policy() {
        let lenient = CodecConfig::default();
        assert_eq!(decode_scalar(Kind::Bool, None, &lenient).unwrap(), Value::Bool(false));
        assert_eq!(decode_scalar(Kind::Int, None, &lenient).unwrap(), Value::Int(0));
        assert_eq!(decode_scalar(Kind::Float, None, &lenient).unwrap(), Value::Float(0.0));
        assert_eq!(decode_scalar(Kind::Str, None, &lenient).unwrap(), Value::from(""));
        assert_eq!(decode_scalar(Kind::Null, None, &lenient).unwrap(), Value::Null);

        let strict = CodecConfig {
            malformed_nodes: MalformedPolicy::Strict,
            ..CodecConfig::default()
        };
        assert_eq!(
            decode_scalar(Kind::Bool, None, &strict),
            Err(CodecError::MalformedNode {
                kind: "bool".to_string(),
                expected: "a payload child".to_string()
            })
        );
    }
}
