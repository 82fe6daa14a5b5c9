//! Caption session state.
//!
//! Raw and simplified transcript histories plus the listening flag, owned
//! by the controller.

use uuid::Uuid;

/// What the simplified caption area is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionStatus {
    #[default]
    Ready,
    /// Interim speech is coming in.
    Listening,
    /// A final transcript is being simplified.
    Processing,
}

#[derive(Debug, Clone)]
pub struct CaptionSession {
    id: Uuid,
    is_listening: bool,
    language: String,
    raw_history: String,
    simple_history: String,
    interim: String,
    status: CaptionStatus,
}

impl CaptionSession {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_listening: false,
            language: language.into(),
            raw_history: String::new(),
            simple_history: String::new(),
            interim: String::new(),
            status: CaptionStatus::Ready,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_listening(&self) -> bool {
        self.is_listening
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn status(&self) -> CaptionStatus {
        self.status
    }

    pub fn raw_history(&self) -> &str {
        &self.raw_history
    }

    pub fn simple_history(&self) -> &str {
        &self.simple_history
    }

    /// Start listening with empty histories.
    pub fn begin(&mut self) {
        self.clear();
        self.is_listening = true;
    }

    pub fn end(&mut self) {
        self.is_listening = false;
        self.interim.clear();
        if self.status == CaptionStatus::Listening {
            self.status = CaptionStatus::Ready;
        }
    }

    pub fn clear(&mut self) {
        self.raw_history.clear();
        self.simple_history.clear();
        self.interim.clear();
        self.status = CaptionStatus::Ready;
    }

    pub fn set_interim(&mut self, text: &str) {
        self.interim = text.to_string();
        if !text.is_empty() && self.status != CaptionStatus::Processing {
            self.status = CaptionStatus::Listening;
        }
    }

    /// Commit a final transcript segment.  Returns the trimmed segment, or
    /// `None` if it was blank.
    pub fn push_raw_final(&mut self, text: &str) -> Option<String> {
        self.interim.clear();
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.raw_history.push_str(text);
        self.raw_history.push(' ');
        self.status = CaptionStatus::Processing;
        Some(text.to_string())
    }

    pub fn append_simple(&mut self, text: &str) {
        self.simple_history.push_str(text.trim());
        self.simple_history.push(' ');
        self.status = CaptionStatus::Ready;
    }

    pub fn replace_simple(&mut self, text: &str) {
        self.simple_history = text.trim().to_string();
        self.status = CaptionStatus::Ready;
    }

    pub fn mark_processing(&mut self) {
        self.status = CaptionStatus::Processing;
    }

    /// Raw transcript box: history followed by the live interim text.
    pub fn raw_display(&self) -> String {
        format!("{}{}", self.raw_history, self.interim)
    }

    /// Simplified caption box, with a trailing progress marker.
    pub fn simple_display(&self) -> String {
        match self.status {
            CaptionStatus::Ready => self.simple_history.clone(),
            CaptionStatus::Listening => format!("{}Listening...", self.simple_history),
            CaptionStatus::Processing => format!("{}Processing...", self.simple_history),
        }
    }
}

impl Default for CaptionSession {
    fn default() -> Self {
        Self::new("English")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_clears_histories() {
        let mut session = CaptionSession::default();
        session.push_raw_final("old words");
        session.append_simple("Old words.");
        session.begin();
        assert!(session.is_listening());
        assert_eq!(session.raw_history(), "");
        assert_eq!(session.simple_history(), "");
    }

    #[test]
    fn final_segments_accumulate() {
        let mut session = CaptionSession::default();
        assert_eq!(session.push_raw_final("  hello there "), Some("hello there".to_string()));
        assert_eq!(session.status(), CaptionStatus::Processing);
        session.append_simple("Hello.");
        session.push_raw_final("how are you");
        session.append_simple("How are you?");
        assert_eq!(session.raw_history(), "hello there how are you ");
        assert_eq!(session.simple_history(), "Hello. How are you? ");
        assert_eq!(session.status(), CaptionStatus::Ready);
    }

    #[test]
    fn blank_final_is_dropped() {
        let mut session = CaptionSession::default();
        assert_eq!(session.push_raw_final("   "), None);
        assert_eq!(session.raw_history(), "");
        assert_eq!(session.status(), CaptionStatus::Ready);
    }

    #[test]
    fn interim_shows_in_raw_display_only() {
        let mut session = CaptionSession::default();
        session.push_raw_final("hello");
        session.append_simple("Hello.");
        session.set_interim("how a");
        assert_eq!(session.raw_display(), "hello how a");
        assert_eq!(session.simple_display(), "Hello. Listening...");

        session.push_raw_final("how are you");
        assert_eq!(session.raw_display(), "hello how are you ");
        assert_eq!(session.simple_display(), "Hello. Processing...");
    }

    #[test]
    fn interim_does_not_hide_processing() {
        let mut session = CaptionSession::default();
        session.push_raw_final("hello");
        session.set_interim("wor");
        assert_eq!(session.status(), CaptionStatus::Processing);
    }

    #[test]
    fn replace_simple_overwrites_history() {
        let mut session = CaptionSession::default();
        session.append_simple("One.");
        session.append_simple("Two.");
        session.replace_simple("  Edited.  ");
        assert_eq!(session.simple_history(), "Edited.");
    }

    #[test]
    fn end_keeps_histories() {
        let mut session = CaptionSession::default();
        session.begin();
        session.push_raw_final("hi");
        session.set_interim("the");
        session.end();
        assert!(!session.is_listening());
        assert_eq!(session.raw_display(), "hi ");
    }

    #[test]
    fn sessions_have_distinct_ids() {
        assert_ne!(CaptionSession::default().id(), CaptionSession::default().id());
    }
}
