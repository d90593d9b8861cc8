//! Revisioned script and input texts, and the session that pairs them.

use crate::orchestrator::OrchestratorHandle;
use splice_types::{Revision, Sequence};
use std::sync::Arc;
use tracing::debug;

/// A text that is replaced wholesale on every edit.
///
/// Cloning is cheap: the text is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: Arc<str>,
    revision: Revision,
}

impl SourceText {
    /// Wraps freshly loaded text at [`Revision::INITIAL`].
    #[must_use]
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            revision: Revision::INITIAL,
        }
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shared handle to the current text.
    #[must_use]
    pub fn shared(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Current revision.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Replaces the text and bumps the revision.
    ///
    /// The revision advances even when the new text equals the old one:
    /// every edit counts.
    pub fn replace(&mut self, text: impl Into<Arc<str>>) -> Revision {
        self.text = text.into();
        self.revision = self.revision.next();
        self.revision
    }
}

/// The live-update trigger: owns the script and input texts and submits a
/// new evaluation whenever either changes.
///
/// Debouncing is left to the caller. Every edit is a request.
pub struct Session {
    script: SourceText,
    input: SourceText,
    handle: OrchestratorHandle,
}

impl Session {
    /// Creates a session. Nothing is submitted until [`Session::refresh`] or
    /// an edit.
    #[must_use]
    pub fn new(script: SourceText, input: SourceText, handle: OrchestratorHandle) -> Self {
        Self {
            script,
            input,
            handle,
        }
    }

    /// The current script.
    #[must_use]
    pub fn script(&self) -> &SourceText {
        &self.script
    }

    /// The current input text.
    #[must_use]
    pub fn input(&self) -> &SourceText {
        &self.input
    }

    /// The handle requests are submitted through.
    #[must_use]
    pub fn handle(&self) -> &OrchestratorHandle {
        &self.handle
    }

    /// Submits the current pair without editing either side.
    pub fn refresh(&self) -> Sequence {
        self.handle.submit(self.script.shared(), self.input.shared())
    }

    /// Replaces the script and submits the new pair.
    pub fn edit_script(&mut self, text: impl Into<Arc<str>>) -> Sequence {
        let revision = self.script.replace(text);
        debug!(%revision, "script edited");
        self.refresh()
    }

    /// Replaces the input text and submits the new pair.
    pub fn edit_input(&mut self, text: impl Into<Arc<str>>) -> Sequence {
        let revision = self.input.replace(text);
        debug!(%revision, "input edited");
        self.refresh()
    }
}
