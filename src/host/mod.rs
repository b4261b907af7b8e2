//! Capability surface of the page being overlaid.
//!
//! The engine never holds on to host elements between cycles. Everything it
//! knows about the page is read through [`HostDom`] at the moment it is
//! needed, and every mutation goes through the same trait.

use crate::error::ComposerError;

mod mock;

pub use mock::{Consume, HostEvent, MockElement, MockHost};

/// Opaque handle to a host element. Only meaningful for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Auto,
    Scroll,
}

impl Overflow {
    pub fn scrolls(self) -> bool {
        matches!(self, Overflow::Auto | Overflow::Scroll)
    }
}

/// The subset of computed style the engine looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub opacity: f64,
    pub overflow_y: Overflow,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display_none: false,
            visibility_hidden: false,
            opacity: 1.0,
            overflow_y: Overflow::Visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMatch {
    Exact,
    Contains,
}

/// Element query understood by every host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Id {
        tag: Option<String>,
        id: String,
    },
    Attribute {
        tag: Option<String>,
        name: String,
        value: String,
        mode: AttrMatch,
    },
    Class {
        tag: Option<String>,
        class: String,
    },
}

impl Selector {
    pub fn id(tag: Option<&str>, id: &str) -> Self {
        Selector::Id {
            tag: tag.map(Into::into),
            id: id.into(),
        }
    }

    pub fn attr(tag: Option<&str>, name: &str, value: &str) -> Self {
        Selector::Attribute {
            tag: tag.map(Into::into),
            name: name.into(),
            value: value.into(),
            mode: AttrMatch::Exact,
        }
    }

    pub fn attr_contains(tag: Option<&str>, name: &str, value: &str) -> Self {
        Selector::Attribute {
            tag: tag.map(Into::into),
            name: name.into(),
            value: value.into(),
            mode: AttrMatch::Contains,
        }
    }

    pub fn class(tag: Option<&str>, class: &str) -> Self {
        Selector::Class {
            tag: tag.map(Into::into),
            class: class.into(),
        }
    }
}

/// Modifier state of a synthetic Enter press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnterPress {
    pub ctrl: bool,
    pub meta: bool,
}

/// Notifications the engine fires at host elements so the host's own UI
/// framework observes them as if the user had produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    Input,
    Change,
    EnterDown(EnterPress),
    EnterUp(EnterPress),
}

pub trait HostDom {
    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &Selector) -> Vec<ElementId>;
    fn document_root(&self) -> ElementId;
    fn bounding_rect(&self, el: ElementId) -> Option<Rect>;
    fn computed_style(&self, el: ElementId) -> Option<ComputedStyle>;
    fn class_name(&self, el: ElementId) -> String;
    fn is_disabled(&self, el: ElementId) -> bool;
    fn value(&self, el: ElementId) -> Option<String>;
    /// Write through the element's native value setter, bypassing any
    /// wrapper the host framework installed on the property.
    fn write_value_native(&mut self, el: ElementId, value: &str) -> Result<(), ComposerError>;
    fn dispatch(&mut self, el: ElementId, event: SyntheticEvent);
    fn click(&mut self, el: ElementId);
    fn focus(&mut self, el: ElementId);
    /// Whether the overlay has hidden this element.
    fn is_suppressed(&self, el: ElementId) -> bool;
    fn set_suppressed(&mut self, el: ElementId, suppressed: bool);
    fn viewport(&self) -> Viewport;
    /// Current page address (`location.href`).
    fn location(&self) -> String;
}

/// Not hidden by display, visibility or opacity, and with a non-empty box.
pub fn is_visible<H: HostDom + ?Sized>(host: &H, el: ElementId) -> bool {
    let Some(style) = host.computed_style(el) else {
        return false;
    };
    if style.display_none || style.visibility_hidden || style.opacity == 0.0 {
        return false;
    }
    host.bounding_rect(el).map(|r| r.has_area()).unwrap_or(false)
}
