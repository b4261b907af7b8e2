/// Keys the composer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Backquote,
    Space,
    Tab,
    Char(char),
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Hotkey {
    /// Required modifiers must be held; Meta and Alt must not be held unless
    /// the hotkey asks for them.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.key == self.key
            && (!self.ctrl || event.ctrl)
            && (!self.shift || event.shift)
            && self.alt == event.alt
            && self.meta == event.meta
    }
}

/// Parse a hotkey string like "Ctrl+Shift+Space" into a [`Hotkey`].
pub fn parse_hotkey(s: &str) -> Option<Hotkey> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut meta = false;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" | "OPTION" => alt = true,
            "META" | "CMD" | "COMMAND" | "WIN" => meta = true,
            "" => {}
            _ => {
                if let Some(k) = parse_key(&upper) {
                    key = Some(k);
                } else {
                    return None;
                }
            }
        }
    }

    key.map(|k| Hotkey {
        key: k,
        ctrl,
        shift,
        alt,
        meta,
    })
}

fn parse_key(upper: &str) -> Option<Key> {
    match upper {
        "ENTER" | "RETURN" => Some(Key::Enter),
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "`" | "BACKQUOTE" | "BACKTICK" | "GRAVE" => Some(Key::Backquote),
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        _ if upper.len() > 1 && upper.starts_with('F') => match upper[1..].parse::<u8>() {
            Ok(n) if (1..=12).contains(&n) => Some(Key::F(n)),
            _ => None,
        },
        _ => {
            let mut chars = upper.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Char(c)),
                _ => None,
            }
        }
    }
}

/// A key press as reported by the embedding page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

/// Where keyboard focus was when a key event arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Overlay,
    /// The host's own input control.
    HostControl,
    /// Any other text field, editable region or text-like input.
    OtherEditable,
    NonEditable,
}

impl FocusTarget {
    /// Global hotkeys stay out of the way while the user types elsewhere.
    pub fn is_typing_elsewhere(self) -> bool {
        matches!(self, FocusTarget::HostControl | FocusTarget::OtherEditable)
    }
}
