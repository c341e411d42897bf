//! Tool selection.

use crate::scene::{ElementKind, ElementStyle};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Diamond,
    Text,
    Card,
    Container,
    Connector,
    Freehand,
    Eraser,
}

impl ToolKind {
    /// Element kind created by a click with this tool, for placement tools.
    pub fn placement_kind(self) -> Option<ElementKind> {
        match self {
            ToolKind::Rectangle => Some(ElementKind::Rectangle),
            ToolKind::Ellipse => Some(ElementKind::Ellipse),
            ToolKind::Diamond => Some(ElementKind::Diamond),
            ToolKind::Text => Some(ElementKind::Text),
            ToolKind::Card => Some(ElementKind::Card),
            ToolKind::Container => Some(ElementKind::Container),
            ToolKind::Select
            | ToolKind::Pan
            | ToolKind::Connector
            | ToolKind::Freehand
            | ToolKind::Eraser => None,
        }
    }

    pub fn is_placement(self) -> bool {
        self.placement_kind().is_some()
    }
}

/// Current tool and the style applied to new elements.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub current_tool: ToolKind,
    pub current_style: ElementStyle,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
    }

    /// Go back to the selection tool after a one-shot placement.
    pub fn revert_to_select(&mut self) {
        self.current_tool = ToolKind::Select;
    }

    /// Style for a new element, or `None` when nothing was customized.
    pub fn style_for_new_element(&self) -> Option<ElementStyle> {
        (self.current_style != ElementStyle::default()).then(|| self.current_style.clone())
    }
}
