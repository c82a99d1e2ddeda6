//! In-memory display surface
//!
//! Backs the terminal panel and lets tests inspect exactly what the widget
//! rendered without a real page.
//!
//! # Usage
//!
//! ```
//! use batmon_widget::{Element, MemorySurface, Surface};
//!
//! let mut surface = MemorySurface::with_targets(["battery-text"]);
//! if let Some(el) = surface.element("battery-text") {
//!     el.set_text("42%");
//! }
//! assert_eq!(surface.text("battery-text"), Some("42%"));
//! assert!(surface.element("battery-led").is_none());
//! ```

use crate::surface::{Element, Surface};
use std::collections::HashMap;

/// Recorded state of one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryElement {
    pub text: String,
    pub class: String,
    pub visible: bool,
    /// Number of writes of any kind
    pub writes: usize,
}

impl Element for MemoryElement {
    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.writes += 1;
    }

    fn set_class(&mut self, class: &str) {
        self.class = class.to_string();
        self.writes += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.writes += 1;
    }
}

/// Surface holding a fixed set of targets in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    elements: HashMap<String, MemoryElement>,
}

impl MemorySurface {
    /// Empty surface with no targets
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface with the given targets present and hidden
    pub fn with_targets<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements = ids
            .into_iter()
            .map(|id| (id.into(), MemoryElement::default()))
            .collect();
        Self { elements }
    }

    /// Add a target
    pub fn insert(&mut self, id: impl Into<String>) {
        self.elements.entry(id.into()).or_default();
    }

    /// Remove a target, as if it left the page
    pub fn remove(&mut self, id: &str) -> Option<MemoryElement> {
        self.elements.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&MemoryElement> {
        self.elements.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|el| el.text.as_str())
    }

    pub fn class(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|el| el.class.as_str())
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|el| el.visible)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Surface for MemorySurface {
    type Element = MemoryElement;

    fn element(&mut self, id: &str) -> Option<&mut MemoryElement> {
        self.elements.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_creation() {
        let surface = MemorySurface::with_targets(["a", "b"]);
        assert_eq!(surface.len(), 2);
        assert!(!surface.is_visible("a"));
        assert_eq!(surface.text("a"), Some(""));
        assert_eq!(surface.text("missing"), None);
    }

    #[test]
    fn test_element_writes() {
        let mut surface = MemorySurface::new();
        surface.insert("led");

        let el = surface.element("led").unwrap();
        el.set_class("led-battery led-gray");
        el.set_visible(true);

        assert_eq!(surface.class("led"), Some("led-battery led-gray"));
        assert!(surface.is_visible("led"));
        assert_eq!(surface.get("led").unwrap().writes, 2);
    }

    #[test]
    fn test_remove_target() {
        let mut surface = MemorySurface::with_targets(["text"]);
        assert!(surface.remove("text").is_some());
        assert!(surface.element("text").is_none());
        assert!(surface.is_empty());
    }
}
