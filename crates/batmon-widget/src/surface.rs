//! Display surface abstraction
//!
//! A surface resolves target identifiers to elements. Targets may be absent
//! (partially mounted page, trimmed-down panel) and the renderer skips them.

/// A single display target
pub trait Element {
    /// Replace the element's text content
    fn set_text(&mut self, text: &str);

    /// Replace the element's whole class list
    fn set_class(&mut self, class: &str);

    /// Show or hide the element
    fn set_visible(&mut self, visible: bool);
}

/// Lookup of display targets by identifier
pub trait Surface: Send + 'static {
    type Element: Element;

    /// `None` when the target does not exist on this surface
    fn element(&mut self, id: &str) -> Option<&mut Self::Element>;
}
