//! Codec facade: value graph ⇄ links notation text
//!
//! `ObjectCodec` holds configuration only. Each call builds its own encoder
//! or decoder state, so one codec can be shared freely, including across
//! threads.

use lino_tree::{parse_link_with, Link};

use crate::config::CodecConfig;
use crate::decoder;
use crate::encoder;
use crate::error::Result;
use crate::value::{Document, Heap, Value};

#[derive(Debug, Clone, Default)]
pub struct ObjectCodec {
    config: CodecConfig,
}

impl ObjectCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode to the generic tree without rendering text
    pub fn encode_tree(&self, heap: &Heap, root: &Value) -> Result<Link> {
        encoder::encode_tree(heap, root, &self.config)
    }

    /// Decode from an already parsed tree
    pub fn decode_tree(&self, link: &Link) -> Result<Document> {
        decoder::decode_tree(link, &self.config)
    }

    pub fn encode(&self, heap: &Heap, root: &Value) -> Result<String> {
        Ok(self.encode_tree(heap, root)?.to_notation())
    }

    pub fn decode(&self, text: &str) -> Result<Document> {
        let link = parse_link_with(text, self.config.parse_options())?;
        self.decode_tree(&link)
    }

    /// Decode and encode again, normalising legacy forms and label numbering
    pub fn reformat(&self, text: &str) -> Result<String> {
        let doc = self.decode(text)?;
        self.encode(&doc.heap, &doc.root)
    }
}

/// Encode with the default configuration
pub fn encode(heap: &Heap, root: &Value) -> Result<String> {
    ObjectCodec::default().encode(heap, root)
}

/// Decode with the default configuration
pub fn decode(text: &str) -> Result<Document> {
    ObjectCodec::default().decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use lino_tree::TreeError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_round_trip() {
        let mut heap = Heap::new();
        let shared = heap.sequence([Value::from("x y"), Value::Float(0.5)]);
        let root = heap.mapping([("a".into(), shared.clone()), ("b".into(), shared)]);

        let text = encode(&heap, &root).unwrap();
        let doc = decode(&text).unwrap();
        assert!(heap.isomorphic(&root, &doc.heap, &doc.root));
    }

    #[test]
    fn test_reformat_normalises_legacy() {
        let codec = ObjectCodec::default();
        assert_eq!(
            codec.reformat("(list obj_5 (int 1) obj_5)").unwrap(),
            "(obj_0: array (int 1) obj_0)"
        );
    }

    #[test]
    fn test_syntax_errors_surface() {
        assert!(matches!(
            decode("(array (int 1)"),
            Err(CodecError::Tree(TreeError::Syntax { .. }))
        ));
        assert!(matches!(decode(""), Err(CodecError::Tree(TreeError::Empty))));
    }

    #[test]
    fn test_parser_depth_follows_config() {
        let codec = ObjectCodec::new(CodecConfig {
            max_depth: 3,
            ..CodecConfig::default()
        });
        let nested = "(array (array (array (array))))";
        assert_eq!(
            codec.decode(nested).unwrap_err(),
            CodecError::DepthLimitExceeded { limit: 3 }
        );

        let parens = format!("{}{}", "(".repeat(9), ")".repeat(9));
        assert_eq!(
            codec.decode(&parens).unwrap_err(),
            CodecError::Tree(TreeError::TooDeep { limit: 8 })
        );
    }
}
