use crate::host::{is_visible, ElementId, HostDom, Selector};

/// One way of finding a host element. Probes are pure: they only read.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// Elements matching the selector.
    Select(Selector),
    /// Matching elements that are not disabled.
    Enabled(Selector),
    /// Landmark elements whose vertical overflow scrolls, either by computed
    /// style or by one of the utility classes in `class_hints`.
    Scrollable {
        tag: String,
        class_hints: Vec<String>,
    },
    /// The document root. Always accepted.
    DocumentRoot,
}

impl Probe {
    fn candidates<H: HostDom + ?Sized>(&self, host: &H) -> Vec<ElementId> {
        match self {
            Probe::Select(selector) => host.query_all(selector),
            Probe::Enabled(selector) => host
                .query_all(selector)
                .into_iter()
                .filter(|el| !host.is_disabled(*el))
                .collect(),
            Probe::Scrollable { tag, class_hints } => host
                .query_all(&Selector::Tag(tag.clone()))
                .into_iter()
                .filter(|el| {
                    let class_name = host.class_name(*el);
                    let by_class = class_hints.iter().any(|c| class_name.contains(c.as_str()));
                    let by_style = host
                        .computed_style(*el)
                        .map_or(false, |s| s.overflow_y.scrolls());
                    by_class || by_style
                })
                .collect(),
            Probe::DocumentRoot => vec![host.document_root()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Acceptance {
    Visible,
    /// Also accept an element the overlay itself hid.
    VisibleOrSuppressed,
}

/// Current references into the host page. Valid for one cycle only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostAnchor {
    pub input_control: Option<ElementId>,
    pub input_container: Option<ElementId>,
    pub scroll_region: Option<ElementId>,
    pub submit_control: Option<ElementId>,
}

/// Ranked probe lists for each element the engine needs.
#[derive(Debug, Clone, PartialEq)]
pub struct HostLocator {
    pub input_control: Vec<Probe>,
    pub input_container: Vec<Probe>,
    pub scroll_region: Vec<Probe>,
    pub submit_control: Vec<Probe>,
}

impl Default for HostLocator {
    fn default() -> Self {
        Self::typingmind()
    }
}

impl HostLocator {
    /// Probes for the TypingMind chat page. Expect these to need updating
    /// whenever the host changes its markup.
    pub fn typingmind() -> Self {
        let data_id = |value: &str| Probe::Select(Selector::attr(None, "data-element-id", value));
        Self {
            input_control: vec![
                Probe::Select(Selector::id(Some("textarea"), "chat-input-textbox")),
                Probe::Select(Selector::attr(
                    Some("textarea"),
                    "data-element-id",
                    "chat-input-textbox",
                )),
                Probe::Select(Selector::class(Some("textarea"), "main-chat-input")),
            ],
            input_container: vec![
                data_id("message-input"),
                data_id("chat-space-end-part"),
                data_id("input-row"),
                data_id("chat-input-textbox-container"),
            ],
            scroll_region: vec![
                Probe::Scrollable {
                    tag: "main".into(),
                    class_hints: vec!["overflow-y-auto".into(), "overflow-y-scroll".into()],
                },
                data_id("main-content-area"),
                data_id("chat-space-background"),
                Probe::DocumentRoot,
            ],
            submit_control: vec![
                Probe::Enabled(Selector::attr_contains(
                    Some("button"),
                    "data-element-id",
                    "send",
                )),
                Probe::Enabled(Selector::attr_contains(Some("button"), "aria-label", "Send")),
                Probe::Enabled(Selector::attr_contains(Some("button"), "title", "Send")),
            ],
        }
    }

    pub fn resolve<H: HostDom + ?Sized>(&self, host: &H) -> HostAnchor {
        HostAnchor {
            input_control: self.resolve_input(host),
            input_container: first_match(host, &self.input_container, Acceptance::Visible),
            scroll_region: first_match(host, &self.scroll_region, Acceptance::Visible),
            submit_control: self.resolve_submit(host),
        }
    }

    pub fn resolve_input<H: HostDom + ?Sized>(&self, host: &H) -> Option<ElementId> {
        first_match(host, &self.input_control, Acceptance::VisibleOrSuppressed)
    }

    pub fn resolve_submit<H: HostDom + ?Sized>(&self, host: &H) -> Option<ElementId> {
        first_match(host, &self.submit_control, Acceptance::Visible)
    }
}

fn first_match<H: HostDom + ?Sized>(
    host: &H,
    probes: &[Probe],
    acceptance: Acceptance,
) -> Option<ElementId> {
    probes.iter().find_map(|probe| {
        probe.candidates(host).into_iter().find(|el| {
            matches!(probe, Probe::DocumentRoot)
                || is_visible(host, *el)
                || (acceptance == Acceptance::VisibleOrSuppressed && host.is_suppressed(*el))
        })
    })
}
