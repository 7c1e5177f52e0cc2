//! Survey document tree.
//!
//! The tree mirrors the external form-library schema. Pages own elements;
//! elements are questions, panels (which nest further elements) or matrix
//! questions (which own column/row item lists). Fields the editor core does
//! not interpret are carried in flattened `extra` maps so that a load/save
//! round-trip is lossless.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{ModelError, ModelResult};
use crate::naming::new_name;
use crate::node_id::NodeId;

/// Root survey node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SurveyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub pages: Vec<Page>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A survey page: a named, ordered container of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Page {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "visibleIf", default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Element>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A question, panel or matrix question.
///
/// One tagged entity instead of a type hierarchy: the `type` string is the
/// discriminator and `kind()` exposes the capabilities the mutation service
/// pattern-matches on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Element {
    #[serde(rename = "type", default)]
    pub type_name: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "visibleIf", default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<String>,

    #[serde(rename = "enableIf", default, skip_serializing_if = "Option::is_none")]
    pub enable_if: Option<String>,

    /// Child elements (panels only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Element>,

    /// Matrix columns (matrix questions only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ItemRef>,

    /// Matrix rows (matrix questions only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<ItemRef>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named item inside a matrix column/row list.
///
/// The schema allows both bare strings and `{ name, ... }` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    Name(String),
    Object {
        name: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl ItemRef {
    pub fn name(&self) -> &str {
        match self {
            ItemRef::Name(name) => name,
            ItemRef::Object { name, .. } => name,
        }
    }

    pub fn set_name(&mut self, new_name: impl Into<String>) {
        match self {
            ItemRef::Name(name) => *name = new_name.into(),
            ItemRef::Object { name, .. } => *name = new_name.into(),
        }
    }

    /// Set an extra property, promoting a bare-string item to object form.
    pub fn set_extra(&mut self, key: impl Into<String>, value: Value) {
        if let ItemRef::Name(name) = self {
            *self = ItemRef::Object {
                name: std::mem::take(name),
                extra: Map::new(),
            };
        }
        if let ItemRef::Object { extra, .. } = self {
            extra.insert(key.into(), value);
        }
    }
}

/// Capability discriminator derived from an element's `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Question,
    Panel,
    Matrix,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self.type_name.as_str() {
            "panel" => ElementKind::Panel,
            "matrix" | "matrixdropdown" | "matrixdynamic" => ElementKind::Matrix,
            _ => ElementKind::Question,
        }
    }

    /// Panels contain child elements.
    pub fn is_container(&self) -> bool {
        self.kind() == ElementKind::Panel
    }

    /// Matrix questions carry column/row item lists.
    pub fn has_columns(&self) -> bool {
        self.kind() == ElementKind::Matrix
    }

    /// Whether this element carries expression-valued properties the repair
    /// pass must scan.
    pub fn has_expression_props(&self) -> bool {
        self.visible_if.is_some() || self.enable_if.is_some()
    }

    /// Deserialize an element from a toolbox/drag payload.
    pub fn from_json(value: Value) -> ModelResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> ModelResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Visit this element and every descendant, depth-first.
    pub fn for_each<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        f(self);
        for child in &self.elements {
            child.for_each(f);
        }
    }

    /// Collect this element's name and the names of all descendants.
    pub fn collect_names(&self, out: &mut Vec<String>) {
        self.for_each(&mut |el| out.push(el.name.clone()));
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.elements.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        if self.name == name {
            return Some(self);
        }
        self.elements
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    fn remove_descendant(&mut self, name: &str) -> Option<Element> {
        if let Some(pos) = self.elements.iter().position(|el| el.name == name) {
            return Some(self.elements.remove(pos));
        }
        self.elements
            .iter_mut()
            .find_map(|child| child.remove_descendant(name))
    }
}

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Page {
            name: name.into(),
            ..Page::default()
        }
    }

    /// Index of a top-level element on this page.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|el| el.name == name)
    }

    pub fn insert_element(&mut self, index: usize, element: Element) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
    }

    /// Names of every element on this page, at any nesting depth.
    pub fn element_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        for el in &self.elements {
            el.collect_names(&mut out);
        }
        out
    }
}

impl SurveyDocument {
    /// Parse a survey from its JSON form.
    ///
    /// Accepts the `{ elements: [...] }` shorthand for a single-page survey
    /// and auto-names any unnamed pages and elements.
    pub fn from_json(mut value: Value) -> ModelResult<Self> {
        let obj = value.as_object_mut().ok_or(ModelError::NotAnObject)?;
        if !obj.contains_key("pages") {
            let elements = obj.remove("elements").unwrap_or(Value::Array(Vec::new()));
            obj.insert(
                "pages".to_string(),
                Value::Array(vec![serde_json::json!({ "elements": elements })]),
            );
        }
        let mut doc: SurveyDocument = serde_json::from_value(value)?;
        doc.ensure_names();
        Ok(doc)
    }

    pub fn from_json_text(text: &str) -> ModelResult<Self> {
        Self::from_json(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> ModelResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_text(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Assign fresh names to unnamed pages and elements.
    pub fn ensure_names(&mut self) {
        let mut used = self.used_names();
        for i in 0..self.pages.len() {
            if self.pages[i].name.is_empty() {
                let name = new_name("page", &used);
                used.insert(name.clone());
                self.pages[i].name = name;
            }
        }
        for page in &mut self.pages {
            for element in &mut page.elements {
                ensure_element_names(element, &mut used);
            }
        }
    }

    pub fn page_by_name(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn page_by_name_mut(&mut self, name: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.name == name)
    }

    /// Find a question or panel anywhere in the survey.
    pub fn element_by_name(&self, name: &str) -> Option<&Element> {
        self.pages
            .iter()
            .find_map(|page| page.elements.iter().find_map(|el| el.find(name)))
    }

    pub fn element_by_name_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.pages.iter_mut().find_map(|page| {
            page.elements
                .iter_mut()
                .find_map(|el| el.find_mut(name))
        })
    }

    /// Visit every element in the survey, depth-first, page order.
    pub fn for_each_element<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        for page in &self.pages {
            for el in &page.elements {
                el.for_each(f);
            }
        }
    }

    /// All page and element names currently in use.
    pub fn used_names(&self) -> HashSet<String> {
        let mut names: HashSet<String> = self
            .pages
            .iter()
            .filter(|p| !p.name.is_empty())
            .map(|p| p.name.clone())
            .collect();
        self.for_each_element(&mut |el| {
            if !el.name.is_empty() {
                names.insert(el.name.clone());
            }
        });
        names
    }

    /// Whether the node a `NodeId` points at still exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        match id {
            NodeId::Survey => true,
            NodeId::Page(name) => self.page_by_name(name).is_some(),
            NodeId::Element(name) => self.element_by_name(name).is_some(),
            NodeId::Column { matrix, column } => self
                .element_by_name(matrix)
                .map(|el| el.columns.iter().any(|c| c.name() == column))
                .unwrap_or(false),
            NodeId::Row { matrix, row } => self
                .element_by_name(matrix)
                .map(|el| el.rows.iter().any(|r| r.name() == row))
                .unwrap_or(false),
        }
    }

    /// The immediate container of an element: its panel, else its page.
    pub fn parent_of(&self, name: &str) -> Option<NodeId> {
        for page in &self.pages {
            if page.elements.iter().any(|el| el.name == name) {
                return Some(NodeId::Page(page.name.clone()));
            }
            let mut parent = None;
            for el in &page.elements {
                el.for_each(&mut |candidate| {
                    if candidate.elements.iter().any(|c| c.name == name) {
                        parent = Some(NodeId::Element(candidate.name.clone()));
                    }
                });
            }
            if parent.is_some() {
                return parent;
            }
        }
        None
    }

    /// The page that (transitively) contains an element.
    pub fn page_of(&self, name: &str) -> Option<&str> {
        self.pages
            .iter()
            .find(|page| page.elements.iter().any(|el| el.find(name).is_some()))
            .map(|page| page.name.as_str())
    }

    /// Remove an element (question or panel) from wherever it lives.
    pub fn remove_element(&mut self, name: &str) -> Option<Element> {
        for page in &mut self.pages {
            if let Some(pos) = page.elements.iter().position(|el| el.name == name) {
                return Some(page.elements.remove(pos));
            }
            for el in &mut page.elements {
                if let Some(removed) = el.remove_descendant(name) {
                    return Some(removed);
                }
            }
        }
        None
    }

    pub fn remove_page(&mut self, name: &str) -> Option<Page> {
        let pos = self.pages.iter().position(|p| p.name == name)?;
        Some(self.pages.remove(pos))
    }

    pub fn insert_page(&mut self, index: usize, page: Page) {
        let index = index.min(self.pages.len());
        self.pages.insert(index, page);
    }

    pub fn move_page(&mut self, from: usize, to: usize) {
        if from == to || from >= self.pages.len() || to >= self.pages.len() {
            return;
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
    }
}

fn ensure_element_names(element: &mut Element, used: &mut HashSet<String>) {
    if element.name.is_empty() {
        let prefix = if element.is_container() {
            "panel"
        } else {
            "question"
        };
        let name = new_name(prefix, used);
        used.insert(name.clone());
        element.name = name;
    }
    for child in &mut element.elements {
        ensure_element_names(child, used);
    }
}
