//! # Question Toolbox
//!
//! The palette of element templates the view layer renders for drag/drop or
//! click-to-add. Besides the built-in question types it keeps a small rolling
//! cache of "copied" items so an author can stamp out near-duplicates of a
//! question they configured once.

use formcraft_model::Element;
use serde_json::{json, Value};

use crate::errors::DesignerError;

const COPIED_ITEM_MAX_COUNT: usize = 3;

/// One palette entry: a display title plus the JSON template an instance is
/// built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolboxItem {
    pub name: String,
    pub title: String,
    pub json: Value,
    pub is_copied: bool,
}

impl ToolboxItem {
    pub fn new(name: impl Into<String>, title: impl Into<String>, template: Value) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            json: template,
            is_copied: false,
        }
    }
}

#[derive(Debug)]
pub struct QuestionToolbox {
    items: Vec<ToolboxItem>,
    copied_item_max_count: usize,
}

impl QuestionToolbox {
    /// Toolbox pre-populated with the standard question types.
    pub fn new() -> Self {
        let items = vec![
            ToolboxItem::new("text", "Single Input", json!({ "type": "text" })),
            ToolboxItem::new("checkbox", "Checkbox", json!({ "type": "checkbox" })),
            ToolboxItem::new("radiogroup", "Radiogroup", json!({ "type": "radiogroup" })),
            ToolboxItem::new("dropdown", "Dropdown", json!({ "type": "dropdown" })),
            ToolboxItem::new("comment", "Comment", json!({ "type": "comment" })),
            ToolboxItem::new("boolean", "Yes/No", json!({ "type": "boolean" })),
            ToolboxItem::new(
                "matrix",
                "Matrix (single choice)",
                json!({ "type": "matrix" }),
            ),
            ToolboxItem::new(
                "matrixdropdown",
                "Matrix (multiple choice)",
                json!({ "type": "matrixdropdown" }),
            ),
            ToolboxItem::new("panel", "Panel", json!({ "type": "panel" })),
        ];
        Self {
            items,
            copied_item_max_count: COPIED_ITEM_MAX_COUNT,
        }
    }

    pub fn items(&self) -> &[ToolboxItem] {
        &self.items
    }

    pub fn item_by_name(&self, name: &str) -> Option<&ToolboxItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn add_item(&mut self, item: ToolboxItem) {
        self.items.push(item);
    }

    pub fn remove_item(&mut self, name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.name != name);
        before != self.items.len()
    }

    /// Cache a configured element as a copied toolbox item.
    ///
    /// An item with the same name is replaced in place; otherwise the new
    /// item is appended and the oldest copied item is evicted once the cache
    /// exceeds its limit.
    pub fn add_copied_element(&mut self, element: &Element) -> Result<(), DesignerError> {
        let json = element.to_json()?;
        let item = ToolboxItem {
            name: element.name.clone(),
            title: element.title.clone().unwrap_or_else(|| element.name.clone()),
            json,
            is_copied: true,
        };
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.is_copied && i.name == item.name)
        {
            *existing = item;
            return Ok(());
        }
        self.items.push(item);
        while self.copied_count() > self.copied_item_max_count {
            if let Some(oldest) = self.items.iter().position(|i| i.is_copied) {
                self.items.remove(oldest);
            }
        }
        Ok(())
    }

    pub fn copied_items(&self) -> impl Iterator<Item = &ToolboxItem> {
        self.items.iter().filter(|item| item.is_copied)
    }

    pub fn clear_copied_items(&mut self) {
        self.items.retain(|item| !item.is_copied);
    }

    fn copied_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_copied).count()
    }

    /// Instantiate an element from a toolbox item's template.
    pub fn make_element(&self, name: &str) -> Result<Element, DesignerError> {
        let item = self
            .item_by_name(name)
            .ok_or_else(|| DesignerError::UnknownElement(name.to_string()))?;
        let element = Element::from_json(item.json.clone())?;
        Ok(element)
    }
}

impl Default for QuestionToolbox {
    fn default() -> Self {
        Self::new()
    }
}
