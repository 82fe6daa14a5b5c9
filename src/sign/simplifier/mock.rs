//! Scripted simplifier for testing.
//!
//! Answers from a fixed table, falls back to a configurable behaviour for
//! unknown input, and records every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::time::sleep;

use super::Simplifier;

// ── Configuration ────────────────────────────────────────────────

/// What to do with text that has no scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unscripted {
    /// Return the input unchanged.
    Echo,
    /// Return the input upper-cased, so tests can tell it was simplified.
    Upper,
    /// Fail like an unreachable backend.
    Fail,
}

// ── Provider ─────────────────────────────────────────────────────

pub struct ScriptedSimplifier {
    answers: HashMap<String, String>,
    unscripted: Unscripted,
    latency: Duration,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedSimplifier {
    pub fn new(unscripted: Unscripted) -> Self {
        Self {
            answers: HashMap::new(),
            unscripted,
            latency: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self::new(Unscripted::Fail)
    }

    pub fn with_answer(mut self, input: &str, output: &str) -> Self {
        self.answers.insert(input.to_string(), output.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// `(text, language)` of every call so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Shared view on the call log, usable after the simplifier is boxed.
    pub fn call_log(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Simplifier for ScriptedSimplifier {
    async fn simplify(&self, text: &str, language: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((text.to_string(), language.to_string()));

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        if let Some(answer) = self.answers.get(text) {
            return Ok(answer.clone());
        }
        match self.unscripted {
            Unscripted::Echo => Ok(text.to_string()),
            Unscripted::Upper => Ok(text.to_uppercase()),
            Unscripted::Fail => bail!("simplifier unavailable"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_answers_win() {
        let simplifier = ScriptedSimplifier::new(Unscripted::Echo).with_answer("um hi", "Hi.");
        assert_eq!(simplifier.simplify("um hi", "English").await.unwrap(), "Hi.");
        assert_eq!(simplifier.simplify("other", "English").await.unwrap(), "other");
    }

    #[tokio::test]
    async fn failing_always_errors() {
        let simplifier = ScriptedSimplifier::failing();
        assert!(simplifier.simplify("hello", "English").await.is_err());
        assert_eq!(
            simplifier.calls(),
            vec![("hello".to_string(), "English".to_string())]
        );
    }

    #[tokio::test]
    async fn upper_marks_output() {
        let simplifier = ScriptedSimplifier::new(Unscripted::Upper);
        assert_eq!(simplifier.simplify("abc", "Hindi").await.unwrap(), "ABC");
    }
}
