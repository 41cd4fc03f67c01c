//! Fallback chains around the optional model capabilities.

use super::{ModelSession, Summarizer};
use crate::config::Prompts;
use crate::moments::Emotion;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const MAX_TITLE_CHARS: usize = 80;
const HEURISTIC_TITLE_WORDS: usize = 8;
const FALLBACK_TITLE: &str = "Moment";
const LEXICAL_REASON: &str = "Top lexical match";

/// Emotion label with the model's confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub emotion: Emotion,
    pub confidence: f64,
}

impl Classification {
    /// Result used whenever no usable model answer exists.
    pub const FALLBACK: Classification = Classification {
        emotion: Emotion::Insightful,
        confidence: 0.0,
    };
}

/// A transcript window offered to [`Assistant::pick_best_window`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowCandidate {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// The time range a comment most likely refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPick {
    pub start: f64,
    pub end: f64,
    pub reason: String,
}

/// Parse JSON from model output, tolerating text around a single object.
pub fn safe_json_from_text(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Request-scoped access to the model capabilities with heuristic fallbacks.
#[derive(Clone, Default)]
pub struct Assistant {
    session: Option<Arc<dyn ModelSession>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    prompts: Prompts,
}

impl Assistant {
    pub fn new(session: Option<Arc<dyn ModelSession>>, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        Self {
            session,
            summarizer,
            prompts: Prompts::default(),
        }
    }

    /// Heuristics only.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn has_model(&self) -> bool {
        self.session.is_some()
    }

    async fn prompt(&self, template: &str, vars: &[(&str, String)], schema: Value) -> Option<Value> {
        let session = self.session.as_ref()?;
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        let prompt = Prompts::render(template, &vars);
        match session.prompt_json(&prompt, &schema).await {
            Ok(text) => safe_json_from_text(&text),
            Err(e) => {
                debug!("Model prompt failed: {}", e);
                None
            }
        }
    }

    /// Label a comment with one of the fixed emotions.
    ///
    /// Falls back to `insightful` with zero confidence when there is no model,
    /// the call fails, or the answer is not a known label.
    pub async fn classify_emotion(&self, text: &str) -> Classification {
        let labels: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
        let schema = json!({
            "type": "object",
            "properties": {
                "emotion": { "type": "string", "enum": labels },
                "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
            },
            "required": ["emotion", "confidence"],
            "additionalProperties": false
        });

        let vars = [("comment", text.to_string()), ("labels", labels.join(", "))];
        let Some(out) = self.prompt(&self.prompts.classify.user, &vars, schema).await else {
            return Classification::FALLBACK;
        };

        let emotion = out
            .get("emotion")
            .and_then(Value::as_str)
            .and_then(|e| e.parse::<Emotion>().ok());
        match emotion {
            Some(emotion) => Classification {
                emotion,
                confidence: out
                    .get("confidence")
                    .and_then(Value::as_f64)
                    .filter(|c| c.is_finite())
                    .map(|c| c.clamp(0.0, 1.0))
                    .unwrap_or(0.0),
            },
            None => Classification::FALLBACK,
        }
    }

    /// Choose the window a comment refers to.
    ///
    /// Without a usable model answer the first (best lexical) candidate wins.
    /// No candidates means no pick.
    pub async fn pick_best_window(&self, comment: &str, candidates: &[WindowCandidate]) -> Option<WindowPick> {
        let top = candidates.first()?;
        let lexical = WindowPick {
            start: top.start,
            end: top.end,
            reason: LEXICAL_REASON.to_string(),
        };
        if !self.has_model() {
            return Some(lexical);
        }

        let windows = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{}] {}-{}: {}", i, c.start.round(), c.end.round(), c.text))
            .collect::<Vec<_>>()
            .join("\n");
        let schema = json!({
            "type": "object",
            "properties": {
                "start": { "type": "number" },
                "end": { "type": "number" },
                "reason": { "type": "string" }
            },
            "required": ["start", "end", "reason"],
            "additionalProperties": false
        });

        let vars = [("comment", comment.to_string()), ("windows", windows)];
        let picked = self
            .prompt(&self.prompts.window.user, &vars, schema)
            .await
            .and_then(|out| {
                let start = out.get("start").and_then(Value::as_f64)?;
                let end = out.get("end").and_then(Value::as_f64)?;
                let reason = out.get("reason").and_then(Value::as_str).unwrap_or("").to_string();
                (start.is_finite() && end.is_finite()).then_some(WindowPick { start, end, reason })
            });

        Some(picked.unwrap_or(lexical))
    }

    /// A title of at most 80 characters for a transcript passage.
    ///
    /// Tries the summarizer, then a title prompt, then the first eight words
    /// of `text`, then the literal "Moment". The model is never called when
    /// no session exists.
    pub async fn generate_title(&self, text: &str, hint: &str) -> String {
        if let Some(summarizer) = &self.summarizer {
            match summarizer.summarize(text).await {
                Ok(summary) => {
                    if let Some(line) = summary.lines().map(str::trim).find(|l| !l.is_empty()) {
                        return truncate_chars(line, MAX_TITLE_CHARS);
                    }
                }
                Err(e) => debug!("Summarizer failed: {}", e),
            }
        }

        let schema = json!({
            "type": "object",
            "properties": { "title": { "type": "string" } },
            "required": ["title"],
            "additionalProperties": false
        });
        let vars = [("text", text.to_string()), ("hint", hint.to_string())];
        if let Some(out) = self.prompt(&self.prompts.title.user, &vars, schema).await {
            if let Some(title) = out.get("title").and_then(Value::as_str) {
                let title = title.trim();
                if !title.is_empty() {
                    return truncate_chars(title, MAX_TITLE_CHARS);
                }
            }
        }

        let words = text
            .split_whitespace()
            .take(HEURISTIC_TITLE_WORDS)
            .collect::<Vec<_>>()
            .join(" ");
        if words.is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            truncate_chars(&words, MAX_TITLE_CHARS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MomentsError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with a fixed answer and counts calls.
    struct Scripted {
        reply: Result<String>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(reply.to_string()), calls: AtomicUsize::new(0) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(MomentsError::Model("boom".to_string())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ModelSession for Scripted {
        async fn prompt_json(&self, _prompt: &str, _schema: &Value) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(MomentsError::Model(e.to_string())),
            }
        }
    }

    struct FixedSummary(&'static str);

    #[async_trait]
    impl Summarizer for FixedSummary {
        async fn summarize(&self, _text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn candidates() -> Vec<WindowCandidate> {
        vec![
            WindowCandidate { start: 14.0, end: 21.0, text: "the big reveal".to_string() },
            WindowCandidate { start: 70.0, end: 77.0, text: "credits".to_string() },
        ]
    }

    #[test]
    fn test_safe_json_from_text() {
        assert_eq!(safe_json_from_text(r#"{"a":1}"#).unwrap()["a"], 1);
        assert_eq!(safe_json_from_text("Sure! {\"a\": 2} hope that helps").unwrap()["a"], 2);
        assert!(safe_json_from_text("no json").is_none());
        assert!(safe_json_from_text("").is_none());
        assert!(safe_json_from_text("} {").is_none());
    }

    #[tokio::test]
    async fn test_offline_fallbacks() {
        let assistant = Assistant::offline();

        assert_eq!(assistant.classify_emotion("lol").await, Classification::FALLBACK);
        assert_eq!(
            assistant.generate_title("one two three four five six seven eight nine", "").await,
            "one two three four five six seven eight"
        );
        assert_eq!(assistant.generate_title("   ", "").await, "Moment");

        let pick = assistant.pick_best_window("reveal", &candidates()).await.unwrap();
        assert_eq!((pick.start, pick.end), (14.0, 21.0));
        assert_eq!(pick.reason, "Top lexical match");
        assert!(assistant.pick_best_window("reveal", &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_classification_from_model() {
        let session = Scripted::ok(r#"{"emotion":"funny","confidence":1.7}"#);
        let assistant = Assistant::new(Some(session.clone()), None);

        let result = assistant.classify_emotion("lmao").await;
        assert_eq!(result.emotion, Emotion::Funny);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(session.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_out_of_vocabulary_and_errors_fall_back() {
        let assistant = Assistant::new(Some(Scripted::ok(r#"{"emotion":"bored","confidence":0.9}"#)), None);
        assert_eq!(assistant.classify_emotion("meh").await, Classification::FALLBACK);

        let assistant = Assistant::new(Some(Scripted::failing()), None);
        assert_eq!(assistant.classify_emotion("meh").await, Classification::FALLBACK);
        assert_eq!(assistant.generate_title("alpha beta", "").await, "alpha beta");

        let pick = assistant.pick_best_window("x", &candidates()).await.unwrap();
        assert_eq!(pick.reason, "Top lexical match");
    }

    #[tokio::test]
    async fn test_model_window_pick() {
        let assistant = Assistant::new(
            Some(Scripted::ok(r#"{"start":70,"end":77,"reason":"mentions credits"}"#)),
            None,
        );
        let pick = assistant.pick_best_window("credits song", &candidates()).await.unwrap();
        assert_eq!((pick.start, pick.end), (70.0, 77.0));
        assert_eq!(pick.reason, "mentions credits");
    }

    #[tokio::test]
    async fn test_title_prefers_summarizer() {
        let session = Scripted::ok(r#"{"title":"From the prompt"}"#);
        let summarizer = Arc::new(FixedSummary("\n  - The key point here  \nsecond"));
        let assistant = Assistant::new(Some(session.clone()), Some(summarizer));

        assert_eq!(assistant.generate_title("text", "").await, "- The key point here");
        assert_eq!(session.calls.load(Ordering::SeqCst), 0);

        let assistant = Assistant::new(Some(session.clone()), None);
        assert_eq!(assistant.generate_title("text", "").await, "From the prompt");
    }

    #[tokio::test]
    async fn test_title_is_truncated() {
        let long = "x".repeat(200);
        let reply = format!(r#"{{"title":"{}"}}"#, long);
        let assistant = Assistant::new(Some(Scripted::ok(&reply)), None);
        assert_eq!(assistant.generate_title("text", "").await.chars().count(), 80);
    }
}
