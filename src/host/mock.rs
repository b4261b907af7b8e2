use std::collections::{BTreeMap, HashMap};

use super::{
    AttrMatch, ComputedStyle, ElementId, EnterPress, HostDom, Overflow, Rect, Selector,
    SyntheticEvent, Viewport,
};
use crate::error::ComposerError;

/// Host reaction that makes it take the message and empty its control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consume {
    Enter(EnterPress),
    Click,
}

/// Everything the engine did to the mock, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Wrote(ElementId, String),
    Dispatched(ElementId, SyntheticEvent),
    Clicked(ElementId),
    Focused(ElementId),
    Suppressed(ElementId, bool),
}

#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub tag: String,
    pub id_attr: Option<String>,
    pub classes: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub rect: Rect,
    pub style: ComputedStyle,
    pub disabled: bool,
    pub value: Option<String>,
    pub suppressed: bool,
}

impl MockElement {
    pub fn new(tag: &str, rect: Rect) -> Self {
        Self {
            tag: tag.into(),
            rect,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id_attr = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.style.overflow_y = overflow;
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        let tag_ok = |tag: &Option<String>| tag.as_deref().map_or(true, |t| t == self.tag);
        match selector {
            Selector::Tag(tag) => &self.tag == tag,
            Selector::Id { tag, id } => tag_ok(tag) && self.id_attr.as_deref() == Some(id.as_str()),
            Selector::Attribute {
                tag,
                name,
                value,
                mode,
            } => {
                tag_ok(tag)
                    && self.attrs.get(name).map_or(false, |v| match mode {
                        AttrMatch::Exact => v == value,
                        AttrMatch::Contains => v.contains(value.as_str()),
                    })
            }
            Selector::Class { tag, class } => tag_ok(tag) && self.classes.iter().any(|c| c == class),
        }
    }
}

/// Scriptable in-memory page used by tests and headless embedding.
#[derive(Debug, Clone)]
pub struct MockHost {
    elements: BTreeMap<ElementId, MockElement>,
    next_id: u64,
    root: ElementId,
    named: HashMap<&'static str, ElementId>,
    viewport: Viewport,
    location: String,
    consume_on: Vec<Consume>,
    reject_native_writes: bool,
    ignore_input_while_suppressed: bool,
    focused: Option<ElementId>,
    events: Vec<HostEvent>,
}

impl MockHost {
    /// A page with nothing but the document root.
    pub fn blank() -> Self {
        let mut host = Self {
            elements: BTreeMap::new(),
            next_id: 0,
            root: ElementId(0),
            named: HashMap::new(),
            viewport: Viewport {
                width: 1280.0,
                height: 900.0,
            },
            location: "https://www.typingmind.com/".into(),
            consume_on: Vec::new(),
            reject_native_writes: false,
            ignore_input_while_suppressed: false,
            focused: None,
            events: Vec::new(),
        };
        host.root = host.add(MockElement::new("html", Rect::new(0.0, 0.0, 1280.0, 900.0)));
        host
    }

    /// A settled chat page laid out the way TypingMind renders it.
    pub fn typingmind() -> Self {
        let mut host = Self::blank();
        host.location = "https://www.typingmind.com/#chat=alpha".into();
        let main = host.add(
            MockElement::new("main", Rect::new(260.0, 0.0, 1020.0, 900.0))
                .with_class("flex-1")
                .with_class("overflow-y-auto")
                .with_overflow(Overflow::Auto),
        );
        let container = host.add(
            MockElement::new("div", Rect::new(390.0, 780.0, 760.0, 100.0))
                .with_attr("data-element-id", "chat-input-textbox-container"),
        );
        let input = host.add(
            MockElement::new("textarea", Rect::new(400.0, 790.0, 700.0, 40.0))
                .with_id("chat-input-textbox")
                .with_attr("data-element-id", "chat-input-textbox")
                .with_class("main-chat-input")
                .with_value(""),
        );
        let submit = host.add(
            MockElement::new("button", Rect::new(1110.0, 800.0, 32.0, 32.0))
                .with_attr("data-element-id", "send-button")
                .with_attr("aria-label", "Send message"),
        );
        host.named.insert("main", main);
        host.named.insert("container", container);
        host.named.insert("input", input);
        host.named.insert("submit", submit);
        host
    }

    pub fn add(&mut self, element: MockElement) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, element);
        id
    }

    pub fn remove(&mut self, id: ElementId) -> Option<MockElement> {
        self.elements.remove(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&MockElement> {
        self.elements.get(&id)
    }

    /// Panics when `id` was removed; test scripting only.
    pub fn element_mut(&mut self, id: ElementId) -> &mut MockElement {
        self.elements
            .get_mut(&id)
            .unwrap_or_else(|| panic!("no mock element {id:?}"))
    }

    fn named(&self, name: &str) -> ElementId {
        self.named.get(name).copied().unwrap_or(self.root)
    }

    pub fn input_id(&self) -> ElementId {
        self.named("input")
    }

    pub fn container_id(&self) -> ElementId {
        self.named("container")
    }

    pub fn main_id(&self) -> ElementId {
        self.named("main")
    }

    pub fn submit_id(&self) -> ElementId {
        self.named("submit")
    }

    pub fn input_value(&self) -> Option<String> {
        self.element(self.input_id()).and_then(|e| e.value.clone())
    }

    pub fn set_location(&mut self, href: &str) {
        self.location = href.into();
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
    }

    /// Host empties its input control when one of these reaches it.
    pub fn consume_on(&mut self, triggers: Vec<Consume>) {
        self.consume_on = triggers;
    }

    pub fn set_reject_native_writes(&mut self, reject: bool) {
        self.reject_native_writes = reject;
    }

    /// Host drops writes and key events aimed at a hidden control.
    pub fn set_ignore_input_while_suppressed(&mut self, ignore: bool) {
        self.ignore_input_while_suppressed = ignore;
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn ignores(&self, el: ElementId) -> bool {
        self.ignore_input_while_suppressed && self.element(el).map_or(false, |e| e.suppressed)
    }

    fn consume(&mut self) {
        let input = self.input_id();
        if let Some(control) = self.elements.get_mut(&input) {
            control.value = Some(String::new());
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::typingmind()
    }
}

impl HostDom for MockHost {
    fn query_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, e)| e.matches(selector))
            .map(|(id, _)| *id)
            .collect()
    }

    fn document_root(&self) -> ElementId {
        self.root
    }

    fn bounding_rect(&self, el: ElementId) -> Option<Rect> {
        let element = self.element(el)?;
        if element.suppressed {
            return Some(Rect::new(element.rect.left, element.rect.top, 0.0, 0.0));
        }
        Some(element.rect)
    }

    fn computed_style(&self, el: ElementId) -> Option<ComputedStyle> {
        let element = self.element(el)?;
        let mut style = element.style;
        style.display_none |= element.suppressed;
        Some(style)
    }

    fn class_name(&self, el: ElementId) -> String {
        self.element(el)
            .map(|e| e.classes.join(" "))
            .unwrap_or_default()
    }

    fn is_disabled(&self, el: ElementId) -> bool {
        self.element(el).map_or(false, |e| e.disabled)
    }

    fn value(&self, el: ElementId) -> Option<String> {
        self.element(el).and_then(|e| e.value.clone())
    }

    fn write_value_native(&mut self, el: ElementId, value: &str) -> Result<(), ComposerError> {
        self.events.push(HostEvent::Wrote(el, value.to_string()));
        if self.reject_native_writes {
            return Err(ComposerError::WriteSuppressed(format!(
                "value setter of {el:?} rejected the write"
            )));
        }
        if self.ignores(el) {
            return Ok(());
        }
        match self.elements.get_mut(&el) {
            Some(element) => {
                element.value = Some(value.to_string());
                Ok(())
            }
            None => Err(ComposerError::WriteSuppressed(format!("{el:?} is detached"))),
        }
    }

    fn dispatch(&mut self, el: ElementId, event: SyntheticEvent) {
        self.events.push(HostEvent::Dispatched(el, event));
        if self.ignores(el) || el != self.input_id() {
            return;
        }
        if let SyntheticEvent::EnterDown(press) = event {
            if self.consume_on.contains(&Consume::Enter(press)) {
                self.consume();
            }
        }
    }

    fn click(&mut self, el: ElementId) {
        self.events.push(HostEvent::Clicked(el));
        if self.is_disabled(el) || self.ignores(self.input_id()) {
            return;
        }
        if el == self.submit_id() && self.consume_on.contains(&Consume::Click) {
            self.consume();
        }
    }

    fn focus(&mut self, el: ElementId) {
        self.events.push(HostEvent::Focused(el));
        self.focused = Some(el);
    }

    fn is_suppressed(&self, el: ElementId) -> bool {
        self.element(el).map_or(false, |e| e.suppressed)
    }

    fn set_suppressed(&mut self, el: ElementId, suppressed: bool) {
        if let Some(element) = self.elements.get_mut(&el) {
            if element.suppressed != suppressed {
                element.suppressed = suppressed;
                self.events.push(HostEvent::Suppressed(el, suppressed));
            }
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}
