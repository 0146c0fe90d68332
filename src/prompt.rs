//! Interactive choices.
//!
//! Every prompt returns `Ok(None)` when the user cancels (Esc or `q`), so
//! callers can abort without treating it as an error.

use crate::error::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, MultiSelect, Select};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub hint: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        if !hint.is_empty() {
            self.hint = Some(hint);
        }
        self
    }

    fn render(&self) -> String {
        match &self.hint {
            Some(hint) => format!("{} ({})", self.label, hint),
            None => self.label.clone(),
        }
    }
}

pub trait Prompter {
    /// Pick any number of choices. `defaults` marks preselected entries.
    fn multi_select(
        &self,
        message: &str,
        choices: &[Choice],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>>;

    fn select(&self, message: &str, choices: &[Choice]) -> Result<Option<usize>>;

    fn confirm(&self, message: &str, default: bool) -> Result<Option<bool>>;
}

/// [`Prompter`] drawing on the terminal.
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TerminalPrompter {
    fn multi_select(
        &self,
        message: &str,
        choices: &[Choice],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        let items: Vec<String> = choices.iter().map(Choice::render).collect();
        let selection = MultiSelect::with_theme(&self.theme)
            .with_prompt(format!("{} (space to toggle, enter to confirm)", message))
            .items(&items)
            .defaults(defaults)
            .interact_opt()?;
        Ok(selection)
    }

    fn select(&self, message: &str, choices: &[Choice]) -> Result<Option<usize>> {
        let items: Vec<String> = choices.iter().map(Choice::render).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(&items)
            .default(0)
            .interact_opt()?;
        Ok(selection)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<Option<bool>> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact_opt()?;
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_render() {
        assert_eq!(Choice::new("pdf").render(), "pdf");
        assert_eq!(
            Choice::new("pdf").with_hint("Work with PDFs").render(),
            "pdf (Work with PDFs)"
        );
        assert_eq!(Choice::new("pdf").with_hint("").hint, None);
    }
}
