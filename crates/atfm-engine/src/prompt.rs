//! User prompts.

use std::collections::VecDeque;

use atfm_ops::{Conflict, ConflictPrompt, ConflictResolution};

/// A modal question with labelled buttons.
pub trait UserPrompt {
    /// Ask `message` and return the chosen label.
    ///
    /// `None` means the prompt was dismissed; callers treat that like the
    /// cancel choice.
    fn choose(&mut self, message: &str, choices: &[&str], default: &str) -> Option<String>;
}

/// Adapts a [`UserPrompt`] to transfer conflicts.
///
/// The chosen label is parsed back into a [`ConflictResolution`]; unknown
/// labels count as dismissed.
pub struct ConflictDialog<'a, P: ?Sized> {
    prompt: &'a mut P,
}

impl<'a, P: UserPrompt + ?Sized> ConflictDialog<'a, P> {
    /// Wrap a prompt.
    pub fn new(prompt: &'a mut P) -> Self {
        Self { prompt }
    }
}

impl<P: UserPrompt + ?Sized> ConflictPrompt for ConflictDialog<'_, P> {
    fn resolve(&mut self, conflict: &Conflict) -> Option<ConflictResolution> {
        let labels: Vec<String> = conflict.choices().iter().map(|c| c.to_string()).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        let default = conflict.default_choice().to_string();

        self.prompt
            .choose(&conflict.message(), &labels, &default)
            .and_then(|label| label.parse().ok())
    }
}

/// Answers every prompt with the same label, or its default.
#[derive(Debug, Clone, Default)]
pub struct FixedPrompt {
    answer: Option<String>,
}

impl FixedPrompt {
    /// Always answer `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            answer: Some(label.into()),
        }
    }

    /// Always accept the default.
    pub fn defaults() -> Self {
        Self::default()
    }
}

impl UserPrompt for FixedPrompt {
    fn choose(&mut self, _message: &str, _choices: &[&str], default: &str) -> Option<String> {
        Some(self.answer.clone().unwrap_or_else(|| default.to_string()))
    }
}

/// Answers prompts from a queue and records what was asked.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Option<String>>,
    asked: Vec<(String, Vec<String>, String)>,
}

impl ScriptedPrompt {
    /// Answer with `answers` in order; `None` dismisses.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(|a| a.map(Into::into)).collect(),
            asked: Vec::new(),
        }
    }

    /// Every prompt shown so far, as `(message, choices, default)`.
    pub fn asked(&self) -> &[(String, Vec<String>, String)] {
        &self.asked
    }
}

impl UserPrompt for ScriptedPrompt {
    fn choose(&mut self, message: &str, choices: &[&str], default: &str) -> Option<String> {
        self.asked.push((
            message.to_string(),
            choices.iter().map(|c| c.to_string()).collect(),
            default.to_string(),
        ));
        self.answers.pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atfm_ops::FileStats;
    use std::time::SystemTime;

    fn identical() -> Conflict {
        let stats = FileStats {
            size: 4,
            modified: SystemTime::UNIX_EPOCH,
        };
        Conflict::new("/a/x.png".into(), "/b/x.png".into(), stats, stats)
    }

    #[test]
    fn test_conflict_dialog_parses_label() {
        let mut prompt = ScriptedPrompt::new([Some("Skip")]);
        let choice = ConflictDialog::new(&mut prompt).resolve(&identical());

        assert_eq!(choice, Some(ConflictResolution::Skip));
        let (message, choices, default) = &prompt.asked()[0];
        assert!(message.contains("x.png"));
        assert_eq!(choices, &["Overwrite", "Skip"]);
        assert_eq!(default, "Overwrite");
    }

    #[test]
    fn test_conflict_dialog_unknown_label() {
        let mut prompt = FixedPrompt::new("Burn it");
        assert_eq!(ConflictDialog::new(&mut prompt).resolve(&identical()), None);
    }

    #[test]
    fn test_fixed_prompt_default() {
        let mut prompt = FixedPrompt::defaults();
        assert_eq!(
            prompt.choose("?", &["Yes!", "Nevermind"], "Nevermind").as_deref(),
            Some("Nevermind")
        );
    }
}
