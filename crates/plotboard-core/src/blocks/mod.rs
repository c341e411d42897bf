//! Content blocks of structured card elements.
//!
//! A card holds a [`CardTemplate`]: a display subject plus an ordered list of
//! [`Block`]s. The ordering functions keep block `order` values contiguous and
//! zero-based after every mutation; the template functions repair legacy or
//! malformed input and resolve the card's protected body block.

mod ordering;
mod template;

pub use ordering::{insert_block, move_by_id, move_by_index, normalize_order, remove_block};
pub use template::{
    DEFAULT_SUBJECT, create_block, ensure_template, required_body_block_id,
    try_required_body_block_id,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a block within a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random block id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kind of content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Body,
    Image,
}

impl BlockKind {
    pub fn is_heading(self) -> bool {
        matches!(self, BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3)
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Sizing of a block. Zero height or font size means "unset" and is replaced
/// by the kind default when the template is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockMetrics {
    pub height: f64,
    pub font_size: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub padding_x: f64,
    pub margin_bottom: f64,
}

impl BlockMetrics {
    /// Default sizing for a freshly created block of `kind`.
    pub fn for_kind(kind: BlockKind) -> Self {
        let (height, font_size) = match kind {
            BlockKind::Heading1 => (56.0, 32.0),
            BlockKind::Heading2 => (46.0, 24.0),
            BlockKind::Heading3 => (38.0, 20.0),
            BlockKind::Body => (120.0, 16.0),
            BlockKind::Image => (180.0, 16.0),
        };
        Self {
            height,
            font_size,
            padding_top: 8.0,
            padding_bottom: 8.0,
            padding_x: 16.0,
            margin_bottom: if kind.is_heading() { 4.0 } else { 12.0 },
        }
    }

    /// Replace unusable values with the defaults for `kind`.
    /// Height and font size must be positive; spacing must be non-negative.
    pub fn sanitized(self, kind: BlockKind) -> Self {
        let defaults = Self::for_kind(kind);
        let positive = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        let spacing = |v: f64, d: f64| if v.is_finite() && v >= 0.0 { v } else { d };
        Self {
            height: positive(self.height, defaults.height),
            font_size: positive(self.font_size, defaults.font_size),
            padding_top: spacing(self.padding_top, defaults.padding_top),
            padding_bottom: spacing(self.padding_bottom, defaults.padding_bottom),
            padding_x: spacing(self.padding_x, defaults.padding_x),
            margin_bottom: spacing(self.margin_bottom, defaults.margin_bottom),
        }
    }

    /// Vertical space the block occupies in the card.
    pub fn outer_height(&self) -> f64 {
        self.height + self.margin_bottom
    }
}

/// One ordered content unit inside a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    /// Position in the card. Missing or unusable orders read as 0.
    #[serde(default, deserialize_with = "lenient_order")]
    pub order: u32,
    pub kind: BlockKind,
    #[serde(default)]
    pub align: BlockAlign,
    #[serde(default)]
    pub text: String,
    /// Inline image content as a base64 `data:` URL. `None` is the empty placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub metrics: BlockMetrics,
}

impl Block {
    /// Decode the inline image payload.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        self.image.as_deref().and_then(decode_data_url)
    }

    /// Bytes this block adds to an inline save payload.
    pub fn inline_payload_bytes(&self) -> usize {
        self.text.len() + self.image.as_ref().map_or(0, String::len)
    }
}

/// Accept any JSON value for `order`. Finite non-negative numbers are
/// truncated to a rank; anything else becomes 0 and is renumbered later.
fn lenient_order<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let order = match value.as_f64() {
        Some(n) if n.is_finite() && n >= 0.0 => n.min(f64::from(u32::MAX)) as u32,
        _ => {
            log::debug!("Unusable block order {value}, reading as 0");
            0
        }
    };
    Ok(order)
}

/// Decode a `data:<mime>;base64,<payload>` URL.
pub(crate) fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}

/// Display subject and ordered blocks of a card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTemplate {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl CardTemplate {
    /// Template for a newly placed card: a title heading and one body block.
    pub fn starter(mut next_id: impl FnMut() -> BlockId) -> Self {
        let mut heading = create_block(BlockKind::Heading1, &mut next_id, 0);
        heading.text = "New card".to_string();
        let body = create_block(BlockKind::Body, &mut next_id, 1);
        ensure_template(Self {
            subject: String::new(),
            blocks: vec![heading, body],
        })
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn block_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| &b.id == id)
    }

    /// Total height of the block stack.
    pub fn content_height(&self) -> f64 {
        self.blocks.iter().map(|b| b.metrics.outer_height()).sum()
    }

    pub fn inline_payload_bytes(&self) -> usize {
        self.subject.len() + self.blocks.iter().map(Block::inline_payload_bytes).sum::<usize>()
    }
}
