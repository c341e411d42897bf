//! Card template normalization and block factory.

use super::{Block, BlockAlign, BlockId, BlockKind, BlockMetrics, CardTemplate, decode_data_url};
use crate::blocks::ordering::normalize_order;
use crate::error::{OrderingError, OrderingResult};

/// Subject used when neither the template nor any block provides one.
pub const DEFAULT_SUBJECT: &str = "Untitled card";

/// Create a block with the default sizing for its kind.
/// Image blocks start as an empty placeholder.
pub fn create_block(kind: BlockKind, next_id: impl FnOnce() -> BlockId, order: u32) -> Block {
    Block {
        id: next_id(),
        order,
        kind,
        align: BlockAlign::default(),
        text: String::new(),
        image: None,
        metrics: BlockMetrics::for_kind(kind),
    }
}

/// Repair a template read from storage or produced by an older client.
///
/// Blocks are stably sorted by order (missing or unusable orders read as 0) and
/// renumbered, broken metrics and undecodable images are reset, and an empty
/// subject is derived from the first non-empty block text.
pub fn ensure_template(raw: CardTemplate) -> CardTemplate {
    let CardTemplate { subject, mut blocks } = raw;

    normalize_order(&mut blocks);
    for block in &mut blocks {
        block.metrics = block.metrics.sanitized(block.kind);
        if let Some(image) = &block.image {
            if decode_data_url(image).is_none() {
                log::warn!("Dropping undecodable image payload in block {}", block.id);
                block.image = None;
            }
        }
    }

    let subject = subject.trim();
    let subject = if subject.is_empty() {
        blocks
            .iter()
            .find_map(|b| b.text.lines().map(str::trim).find(|line| !line.is_empty()))
            .unwrap_or(DEFAULT_SUBJECT)
            .to_string()
    } else {
        subject.to_string()
    };

    CardTemplate { subject, blocks }
}

pub(crate) fn required_body_block_id_in(blocks: &[Block]) -> Option<&BlockId> {
    let mut bodies = blocks.iter().filter(|b| b.kind == BlockKind::Body);
    match (bodies.next(), bodies.next()) {
        (Some(only), None) => Some(&only.id),
        _ => None,
    }
}

/// The id of the card's protected body block: present only when the card has
/// exactly one body block. Zero or several bodies are ambiguous.
pub fn required_body_block_id(template: &CardTemplate) -> Option<&BlockId> {
    required_body_block_id_in(&template.blocks)
}

/// Like [`required_body_block_id`], reporting ambiguity as an error.
pub fn try_required_body_block_id(template: &CardTemplate) -> OrderingResult<&BlockId> {
    required_body_block_id(template).ok_or_else(|| OrderingError::AmbiguousRequiredBody {
        count: template
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Body)
            .count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_from_json(json: &str) -> CardTemplate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_orders_sort_by_position() {
        let raw = template_from_json(
            r#"{
                "subject": "",
                "blocks": [
                    { "id": "late", "order": 2, "kind": "body", "text": "Body" },
                    { "id": "first", "kind": "heading1", "text": "" },
                    { "id": "second", "kind": "image" }
                ]
            }"#,
        );
        let template = ensure_template(raw);
        let ids: Vec<&str> = template.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "late"]);
        let orders: Vec<u32> = template.blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(template.subject, "Body");
        let heading = &template.blocks[0].metrics;
        assert_eq!(heading.height, BlockMetrics::for_kind(BlockKind::Heading1).height);
        assert_eq!(heading.padding_top, 0.0);
    }

    #[test]
    fn test_subject_falls_back_to_default() {
        let template = ensure_template(CardTemplate::default());
        assert_eq!(template.subject, DEFAULT_SUBJECT);

        let template = ensure_template(template_from_json(
            r#"{ "subject": "  ", "blocks": [ { "id": "a", "kind": "body", "text": "\n  Launch plan \nmore" } ] }"#,
        ));
        assert_eq!(template.subject, "Launch plan");
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let raw = template_from_json(
            r#"{
                "blocks": [
                    { "id": "a", "order": 5, "kind": "body", "metrics": { "height": -1 } },
                    { "id": "b", "order": 5, "kind": "heading2", "text": "Title" },
                    { "id": "c", "kind": "image", "image": "data:image/png;base64,???" },
                    { "id": "d", "order": 1, "kind": "image", "image": "data:image/png;base64,AAEC" }
                ]
            }"#,
        );
        let once = ensure_template(raw);
        let twice = ensure_template(once.clone());
        assert_eq!(once, twice);
        assert!(once.block(&BlockId::new("c")).unwrap().image.is_none());
        assert!(once.block(&BlockId::new("d")).unwrap().image.is_some());
        assert_eq!(once.subject, "Title");
    }

    #[test]
    fn test_required_body_block() {
        let mut template = CardTemplate::default();
        assert_eq!(required_body_block_id(&template), None);
        assert!(matches!(
            try_required_body_block_id(&template),
            Err(OrderingError::AmbiguousRequiredBody { count: 0 })
        ));

        template.blocks.push(create_block(BlockKind::Heading1, || BlockId::new("h"), 0));
        template.blocks.push(create_block(BlockKind::Body, || BlockId::new("b1"), 1));
        assert_eq!(required_body_block_id(&template), Some(&BlockId::new("b1")));
        assert!(try_required_body_block_id(&template).is_ok());

        template.blocks.push(create_block(BlockKind::Body, || BlockId::new("b2"), 2));
        assert_eq!(required_body_block_id(&template), None);
        assert!(matches!(
            try_required_body_block_id(&template),
            Err(OrderingError::AmbiguousRequiredBody { count: 2 })
        ));
    }

    #[test]
    fn test_create_block_sizing() {
        let heading = create_block(BlockKind::Heading1, || BlockId::new("h"), 0);
        let body = create_block(BlockKind::Body, || BlockId::new("b"), 1);
        let image = create_block(BlockKind::Image, || BlockId::new("i"), 2);
        assert!(heading.metrics.height < body.metrics.height);
        assert!(image.image.is_none());
        assert_eq!(image.order, 2);
        assert_eq!(body.id.as_str(), "b");
    }
}
