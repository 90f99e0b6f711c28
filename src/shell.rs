//! Application shell: UI state machine and widget lifecycle.
//!
//! Per submission: idle → loading → {ready, failed}. The shell owns the
//! single live widget handle and is the only place state mutates; the
//! server wraps it in an `Arc<Mutex<_>>` and spawned fetch tasks re-lock
//! it to deliver their result.
//!
//! Stale results are discarded by identity check, not cancellation: a
//! completion only lands if its character still equals the active one.

use serde::Serialize;
use tracing::info;

use crate::gemini::CharacterDetail;
use crate::widget::{WidgetFactory, WidgetHandle};

/// Serializable view of the shell for the UI poll endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSnapshot {
    pub active_character: Option<char>,
    pub detail: Option<CharacterDetail>,
    pub loading: bool,
    pub widget_size: u32,
}

pub struct AppShell {
    factory: Box<dyn WidgetFactory>,
    widget_size: u32,
    active: Option<char>,
    detail: Option<CharacterDetail>,
    loading: bool,
    widget: Option<Box<dyn WidgetHandle>>,
}

impl AppShell {
    pub fn new(factory: Box<dyn WidgetFactory>, widget_size: u32) -> Self {
        Self {
            factory,
            widget_size,
            active: None,
            detail: None,
            loading: false,
            widget: None,
        }
    }

    /// Submit user input: the first character of the trimmed text becomes
    /// the new active character. Returns that character so the caller can
    /// spawn the detail fetch, or `None` for empty input (no transition).
    ///
    /// The previous widget is torn down before the replacement is created,
    /// so there is never more than one live instance. Repeated submissions
    /// of the same character are not de-duplicated.
    pub fn submit(&mut self, text: &str) -> Option<char> {
        let character = text.trim().chars().next()?;

        info!("Submit '{character}': loading");
        self.active = Some(character);
        self.loading = true;

        // Destroy first, then create — no overlap between instances.
        self.widget = None;
        self.widget = Some(self.factory.create(character, self.widget_size));

        Some(character)
    }

    /// Deliver a completed fetch. Applied only when the fetch's character
    /// still matches the active one; a late result for an abandoned
    /// character is discarded wholesale.
    pub fn complete(&mut self, character: char, result: Option<CharacterDetail>) {
        if self.active != Some(character) {
            info!("Discarding stale fetch result for '{character}'");
            return;
        }

        match &result {
            Some(_) => info!("Submit '{character}': ready"),
            None => info!("Submit '{character}': failed"),
        }
        self.detail = result;
        self.loading = false;
    }

    /// Start the stroke demonstration. No-op before the first submission.
    pub fn animate(&self) {
        if let Some(widget) = &self.widget {
            widget.animate();
        }
    }

    /// Enter interactive tracing mode. No-op before the first submission.
    pub fn quiz(&self) {
        if let Some(widget) = &self.widget {
            widget.quiz();
        }
    }

    pub fn active_character(&self) -> Option<char> {
        self.active
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        ShellSnapshot {
            active_character: self.active,
            detail: self.detail.clone(),
            loading: self.loading,
            widget_size: self.widget_size,
        }
    }
}
