use crate::error::ComposerError;
use crate::hotkey::{parse_hotkey, Hotkey, Key};
use serde::{Deserialize, Serialize};

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Width of the chat column used until the host's input row is measured.
    #[serde(default = "default_fallback_thread_max_width")]
    pub fallback_thread_max_width_px: f64,
    #[serde(default = "default_min_height")]
    pub min_height_px: f64,
    /// Upper bound of the overlay height as a percentage of viewport height.
    #[serde(default = "default_max_height_vh")]
    pub max_height_vh: f64,
    #[serde(default = "default_font_size")]
    pub font_size_px: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// Hide the host's own input control while the overlay is in use.
    #[serde(default = "default_true")]
    pub hide_original_composer: bool,
    #[serde(default = "default_true")]
    pub persist_drafts: bool,
    #[serde(default = "default_true")]
    pub clear_draft_on_send: bool,
    #[serde(default = "default_draft_save_debounce")]
    pub draft_save_debounce_ms: u64,
    #[serde(default = "default_draft_ttl_days")]
    pub draft_ttl_days: u64,
    #[serde(default = "default_max_draft_entries")]
    pub max_draft_entries: usize,
    /// When false a bare Enter (without Shift) also sends.
    #[serde(default = "default_true")]
    pub send_hotkey_requires_ctrl_or_cmd: bool,
    /// Minimum spacing of re-syncs triggered by host DOM mutations.
    #[serde(default = "default_post_lock_sync_interval")]
    pub mutation_throttle_ms: u64,
    #[serde(default = "default_true")]
    pub hide_plain_composer_when_original_shown: bool,
    #[serde(default = "default_true")]
    pub show_return_button_when_original_shown: bool,
    #[serde(default = "default_true")]
    pub try_send_via_ctrl_enter: bool,
    #[serde(default = "default_true")]
    pub try_send_via_meta_enter: bool,
    #[serde(default = "default_true")]
    pub try_send_via_plain_enter: bool,
    #[serde(default = "default_true")]
    pub try_send_via_send_button: bool,
    /// Consecutive in-tolerance samples needed before the overlay is shown.
    #[serde(default = "default_stable_required_count")]
    pub stable_required_count: u32,
    #[serde(default = "default_stable_check_interval")]
    pub stable_check_interval_ms: u64,
    #[serde(default = "default_stable_tolerance")]
    pub stable_tolerance_px: f64,
    #[serde(default = "default_post_lock_sync_interval")]
    pub post_lock_sync_interval_ms: u64,
    #[serde(default = "default_true")]
    pub global_focus_hotkey: bool,
    /// Hotkey string like "Ctrl+`". Invalid strings fall back to the default.
    #[serde(default = "default_focus_hotkey")]
    pub focus_hotkey: Option<String>,
    #[serde(default = "default_true")]
    pub global_esc_toggle: bool,
    /// When enabled the logger is initialised at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives log output instead of stdout.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Optional file that receives one line per user-facing warning.
    #[serde(default)]
    pub toast_log_file: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_fallback_thread_max_width() -> f64 {
    760.0
}

fn default_min_height() -> f64 {
    30.0
}

fn default_max_height_vh() -> f64 {
    35.0
}

fn default_font_size() -> f64 {
    15.0
}

fn default_line_height() -> f64 {
    1.4
}

fn default_draft_save_debounce() -> u64 {
    250
}

fn default_draft_ttl_days() -> u64 {
    30
}

fn default_max_draft_entries() -> usize {
    200
}

fn default_stable_required_count() -> u32 {
    5
}

fn default_stable_check_interval() -> u64 {
    80
}

fn default_stable_tolerance() -> f64 {
    2.0
}

fn default_post_lock_sync_interval() -> u64 {
    350
}

fn default_focus_hotkey() -> Option<String> {
    Some("Ctrl+`".into())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fallback_thread_max_width_px: default_fallback_thread_max_width(),
            min_height_px: default_min_height(),
            max_height_vh: default_max_height_vh(),
            font_size_px: default_font_size(),
            line_height: default_line_height(),
            hide_original_composer: true,
            persist_drafts: true,
            clear_draft_on_send: true,
            draft_save_debounce_ms: default_draft_save_debounce(),
            draft_ttl_days: default_draft_ttl_days(),
            max_draft_entries: default_max_draft_entries(),
            send_hotkey_requires_ctrl_or_cmd: true,
            mutation_throttle_ms: default_post_lock_sync_interval(),
            hide_plain_composer_when_original_shown: true,
            show_return_button_when_original_shown: true,
            try_send_via_ctrl_enter: true,
            try_send_via_meta_enter: true,
            try_send_via_plain_enter: true,
            try_send_via_send_button: true,
            stable_required_count: default_stable_required_count(),
            stable_check_interval_ms: default_stable_check_interval(),
            stable_tolerance_px: default_stable_tolerance(),
            post_lock_sync_interval_ms: default_post_lock_sync_interval(),
            global_focus_hotkey: true,
            focus_hotkey: default_focus_hotkey(),
            global_esc_toggle: true,
            debug_logging: false,
            log_file: None,
            toast_log_file: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values that would stall the sync loop.
    pub fn validate(&self) -> Result<(), ComposerError> {
        if self.stable_check_interval_ms == 0 || self.post_lock_sync_interval_ms == 0 {
            return Err(ComposerError::InvalidSettings(
                "sync intervals must be greater than zero".into(),
            ));
        }
        if self.stable_tolerance_px < 0.0 {
            return Err(ComposerError::InvalidSettings(
                "stable_tolerance_px must not be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn draft_ttl_ms(&self) -> u64 {
        self.draft_ttl_days.saturating_mul(DAY_MS)
    }

    /// Parse the global focus hotkey if enabled.
    pub fn focus_hotkey(&self) -> Option<Hotkey> {
        if !self.global_focus_hotkey {
            return None;
        }
        if let Some(hotkey) = &self.focus_hotkey {
            match parse_hotkey(hotkey) {
                Some(k) => return Some(k),
                None => {
                    tracing::warn!(
                        "provided focus_hotkey string '{}' is invalid; using default Ctrl+`",
                        hotkey
                    );
                }
            }
        } else {
            return None;
        }
        Some(Hotkey {
            key: Key::Backquote,
            ctrl: true,
            shift: false,
            alt: false,
            meta: false,
        })
    }
}
