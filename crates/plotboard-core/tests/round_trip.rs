//! Scene persistence round-trips through the mapper, controller and stores.

use kurbo::{Point, Rect};
use plotboard_core::geometry::to_absolute_position;
use plotboard_core::{
    CommitWriter, Element, ElementId, ElementKind, FileStore, InteractionController, MappedScene,
    Modifiers, MouseButton, NodeTree, Relation, RelationKind, Scene, SceneStore, ToolKind,
};
use std::rc::Rc;
use std::sync::Arc;

fn id(s: &str) -> ElementId {
    ElementId::new(s)
}

fn container_with_child() -> Scene {
    Scene {
        elements: vec![
            Element::with_id(id("box"), ElementKind::Container, Rect::new(10.0, 20.0, 410.0, 320.0)),
            Element::with_id(id("note"), ElementKind::Text, Rect::new(50.0, 40.0, 130.0, 100.0))
                .with_z_index(1)
                .with_text("hello"),
        ],
        relations: vec![Relation::parent(id("note"), id("box"))],
        ..Scene::default()
    }
}

#[test]
fn child_position_survives_round_trip() {
    let mapped = MappedScene::from_scene(&container_with_child());
    assert_eq!(
        to_absolute_position(&mapped.graph, &id("note")).unwrap(),
        Point::new(60.0, 60.0)
    );

    let rebuilt = mapped.to_scene();
    let parents: Vec<&Relation> = rebuilt.relations_of_kind(RelationKind::Parent).collect();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].from_id, id("note"));
    assert_eq!(parents[0].to_id, "box");

    let json = rebuilt.to_json().unwrap();
    let reloaded = MappedScene::from_scene(&Scene::from_json(&json).unwrap());
    assert_eq!(
        to_absolute_position(&reloaded.graph, &id("note")).unwrap(),
        Point::new(60.0, 60.0)
    );
    assert_eq!(reloaded, mapped);
}

#[test]
fn deleting_leaves_no_relation_mentioning_the_element() {
    let mut scene = container_with_child();
    scene.elements.push(Element::with_id(
        id("other"),
        ElementKind::Rectangle,
        Rect::new(600.0, 0.0, 700.0, 100.0),
    ));
    scene.relations.extend([
        Relation::connector(id("note"), id("other")),
        Relation::connector(id("other"), id("note")),
        Relation::external_link(id("note"), "TICKET-1"),
        Relation::external_link(id("other"), "TICKET-2"),
    ]);
    scene.validate().unwrap();

    for doomed in ["note", "box"] {
        let mut controller = InteractionController::default();
        controller.load(&scene);
        controller.delete_elements(&[id(doomed)]);

        let after = controller.scene();
        after.validate().unwrap();
        assert!(after.element(&id(doomed)).is_none());
        assert!(
            after.relations.iter().all(|r| !r.mentions(&id(doomed))),
            "relations still mention {doomed}"
        );
    }
}

#[test]
fn commits_persist_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().to_path_buf()).unwrap());
    let writer = Rc::new(CommitWriter::new(store.clone(), "board-1"));

    let mut controller = InteractionController::default();
    controller.load(&container_with_child());
    controller.set_commit_sink(Some(writer.clone()));

    controller.set_tool(ToolKind::Card);
    controller.pointer_down(Point::new(150.0, 150.0), MouseButton::Left, Modifiers::NONE);
    controller.pointer_up(Point::new(150.0, 150.0), MouseButton::Left);
    let card = controller.selection()[0].clone();
    controller.link_external(&card, "TICKET-9").unwrap();

    assert_eq!(pollster::block_on(writer.flush()).unwrap(), Some(2));
    let saved = pollster::block_on(store.load("board-1")).unwrap();
    let live = controller.scene();
    assert_eq!(saved.elements, live.elements);
    assert_eq!(saved.relations.len(), live.relations.len());

    let mut reopened = InteractionController::default();
    reopened.load(&saved);
    assert_eq!(reopened.graph(), controller.graph());
    assert_eq!(reopened.linked_ticket_ids(), vec!["TICKET-9".to_string()]);
    assert_eq!(reopened.graph().parent_of(&card), Some(&id("box")));
}

#[test]
fn unsupported_version_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("legacy.json"),
        r#"{ "version": 1, "elements": [{ "id": "a" }], "relations": [] }"#,
    )
    .unwrap();
    let store = FileStore::new(dir.path().to_path_buf()).unwrap();

    let scene = pollster::block_on(store.load("legacy")).unwrap();
    assert!(scene.is_empty());
    assert_eq!(scene, Scene::default());
}
