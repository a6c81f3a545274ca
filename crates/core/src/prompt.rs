//! Interactive questions asked during a run.
//! Decision logic talks to the [`Prompt`] trait so tests can answer
//! without a terminal.

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};

/// Asks the user yes/no questions and lets them pick from a list.
pub trait Prompt {
    /// Ask a yes/no question, pre-selecting `default`.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Let the user pick one of `options`. `None` means nothing was chosen.
    fn choose_one(&self, message: &str, options: &[String]) -> Result<Option<usize>>;
}

impl<P: Prompt + ?Sized> Prompt for &P {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        (**self).confirm(message, default)
    }

    fn choose_one(&self, message: &str, options: &[String]) -> Result<Option<usize>> {
        (**self).choose_one(message, options)
    }
}

/// Prompt rendered on the terminal with dialoguer.
#[derive(Default)]
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()?)
    }

    fn choose_one(&self, message: &str, options: &[String]) -> Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }
        Ok(Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(options)
            .default(0)
            .interact_opt()?)
    }
}
