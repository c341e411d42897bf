//! Load-time reference checks.

use super::{Element, ElementId, RelationKind, Scene};
use crate::error::{SceneError, SceneResult};
use std::collections::{HashMap, HashSet};

impl Scene {
    /// Check the scene's structural invariants.
    ///
    /// Containers parented into containers are accepted here; the mapper
    /// flattens them when building the runtime graph.
    pub fn validate(&self) -> SceneResult<()> {
        if !self.viewport.is_valid() {
            return Err(SceneError::InvalidViewport);
        }

        let mut elements: HashMap<&ElementId, &Element> = HashMap::with_capacity(self.elements.len());
        for element in &self.elements {
            if elements.insert(&element.id, element).is_some() {
                return Err(SceneError::DuplicateElement(element.id.clone()));
            }
        }

        let dangling = |relation: &str, element: &str| SceneError::DanglingRelation {
            relation: relation.to_string(),
            element: element.to_string(),
        };

        let mut parented: HashSet<&ElementId> = HashSet::new();
        for relation in &self.relations {
            if !elements.contains_key(&relation.from_id) {
                return Err(dangling(&relation.id, relation.from_id.as_str()));
            }
            let Some(target_id) = relation.target_element() else {
                continue;
            };
            let Some(target) = elements.get(&target_id) else {
                return Err(dangling(&relation.id, &relation.to_id));
            };
            if relation.kind == RelationKind::Parent {
                if !target.is_container() {
                    return Err(SceneError::InvalidParent {
                        relation: relation.id.clone(),
                        target: target_id,
                    });
                }
                if !parented.insert(&relation.from_id) {
                    return Err(SceneError::DuplicateParent(relation.from_id.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ElementKind, Relation};
    use kurbo::Rect;

    fn element(id: &str, kind: ElementKind) -> Element {
        Element::with_id(ElementId::new(id), kind, Rect::new(0.0, 0.0, 50.0, 50.0))
    }

    fn scene(elements: Vec<Element>, relations: Vec<Relation>) -> Scene {
        Scene {
            elements,
            relations,
            ..Scene::default()
        }
    }

    #[test]
    fn test_duplicate_element() {
        let s = scene(
            vec![element("a", ElementKind::Rectangle), element("a", ElementKind::Text)],
            vec![],
        );
        assert!(matches!(s.validate(), Err(SceneError::DuplicateElement(_))));
    }

    #[test]
    fn test_dangling_relations() {
        let s = scene(
            vec![element("a", ElementKind::Rectangle)],
            vec![Relation::connector(ElementId::new("a"), ElementId::new("ghost"))],
        );
        assert!(matches!(s.validate(), Err(SceneError::DanglingRelation { .. })));

        let s = scene(
            vec![element("a", ElementKind::Rectangle)],
            vec![Relation::external_link(ElementId::new("ghost"), "T-1")],
        );
        assert!(matches!(s.validate(), Err(SceneError::DanglingRelation { .. })));
    }

    #[test]
    fn test_external_link_target_not_checked() {
        let s = scene(
            vec![element("a", ElementKind::Card)],
            vec![Relation::external_link(ElementId::new("a"), "TICKET-that-does-not-exist")],
        );
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_parent_rules() {
        let elements = vec![
            element("box", ElementKind::Container),
            element("other", ElementKind::Container),
            element("r", ElementKind::Rectangle),
            element("t", ElementKind::Text),
        ];

        let s = scene(
            elements.clone(),
            vec![Relation::parent(ElementId::new("t"), ElementId::new("r"))],
        );
        assert!(matches!(s.validate(), Err(SceneError::InvalidParent { .. })));

        let s = scene(
            elements.clone(),
            vec![
                Relation::parent(ElementId::new("r"), ElementId::new("box")),
                Relation::parent(ElementId::new("r"), ElementId::new("other")),
            ],
        );
        assert!(matches!(s.validate(), Err(SceneError::DuplicateParent(_))));

        // Nested containers pass validation and are flattened later.
        let s = scene(
            elements,
            vec![Relation::parent(ElementId::new("other"), ElementId::new("box"))],
        );
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_invalid_viewport() {
        let mut s = Scene::default();
        s.viewport.zoom = 0.0;
        assert!(matches!(s.validate(), Err(SceneError::InvalidViewport)));
        s.viewport.zoom = 1.0;
        s.viewport.x = f64::NAN;
        assert!(matches!(s.validate(), Err(SceneError::InvalidViewport)));
    }
}
