//! Interactive prompts.
//!
//! Every question returns `io::Result<Option<T>>`: `None` means the
//! operator gave no answer (Esc, Ctrl-C, or a closed input stream), which
//! callers treat as declining. An empty string is still an answer and
//! stays distinct from `None`.

use std::io;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};

/// Questions the session can ask the operator.
pub trait Prompter {
    /// Free-text input; empty input is allowed.
    fn input(&self, prompt: &str) -> io::Result<Option<String>>;

    /// Free-text input with a default that empty input accepts.
    fn input_with_default(&self, prompt: &str, default: &str) -> io::Result<Option<String>>;

    /// Yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> io::Result<Option<bool>>;

    /// Pick one item by index.
    fn select(&self, prompt: &str, items: &[String]) -> io::Result<Option<usize>>;

    /// Pick any number of items by index.
    fn multi_select(&self, prompt: &str, items: &[String]) -> io::Result<Option<Vec<usize>>>;
}

fn flatten<T>(result: Result<T, dialoguer::Error>) -> io::Result<Option<T>> {
    flatten_opt(result.map(Some))
}

/// Ctrl-C surfaces as an interrupted read; fold it into "no answer" so
/// the caller's decline path runs and cleanup still happens.
fn flatten_opt<T>(result: Result<Option<T>, dialoguer::Error>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(dialoguer::Error::IO(err)) => Err(err),
    }
}

/// Terminal prompter used by the binary.
#[derive(Default)]
pub struct TermPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TermPrompter {
    fn input(&self, prompt: &str) -> io::Result<Option<String>> {
        flatten(
            Input::<String>::with_theme(&self.theme)
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text(),
        )
    }

    fn input_with_default(&self, prompt: &str, default: &str) -> io::Result<Option<String>> {
        flatten(
            Input::<String>::with_theme(&self.theme)
                .with_prompt(prompt)
                .default(default.to_string())
                .interact_text(),
        )
    }

    fn confirm(&self, prompt: &str, default: bool) -> io::Result<Option<bool>> {
        flatten_opt(
            Confirm::with_theme(&self.theme)
                .with_prompt(prompt)
                .default(default)
                .interact_opt(),
        )
    }

    fn select(&self, prompt: &str, items: &[String]) -> io::Result<Option<usize>> {
        flatten_opt(
            Select::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(items)
                .default(0)
                .interact_opt(),
        )
    }

    fn multi_select(&self, prompt: &str, items: &[String]) -> io::Result<Option<Vec<usize>>> {
        flatten_opt(
            MultiSelect::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(items)
                .interact_opt(),
        )
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> String {
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home.display().to_string();
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest).display().to_string();
    }
    path.to_string()
}

#[cfg(test)]
pub(crate) mod scripted {
    //! Prompter that replays canned answers, for driving session tests.

    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    use super::Prompter;

    enum Answer {
        Text(Option<String>),
        Bool(Option<bool>),
        Index(Option<usize>),
        Indexes(Option<Vec<usize>>),
    }

    #[derive(Default)]
    pub struct ScriptedPrompter {
        answers: Mutex<VecDeque<Answer>>,
    }

    impl ScriptedPrompter {
        pub fn new() -> Self {
            Self::default()
        }

        fn push(self, answer: Answer) -> Self {
            self.answers.lock().unwrap().push_back(answer);
            self
        }

        pub fn text(self, value: &str) -> Self {
            self.push(Answer::Text(Some(value.to_string())))
        }

        pub fn no_text(self) -> Self {
            self.push(Answer::Text(None))
        }

        pub fn yes(self) -> Self {
            self.push(Answer::Bool(Some(true)))
        }

        pub fn no(self) -> Self {
            self.push(Answer::Bool(Some(false)))
        }

        pub fn no_confirm(self) -> Self {
            self.push(Answer::Bool(None))
        }

        pub fn pick(self, index: usize) -> Self {
            self.push(Answer::Index(Some(index)))
        }

        pub fn picks(self, indexes: &[usize]) -> Self {
            self.push(Answer::Indexes(Some(indexes.to_vec())))
        }

        pub fn no_picks(self) -> Self {
            self.push(Answer::Indexes(None))
        }

        fn pop(&self, prompt: &str) -> Answer {
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted answer left for prompt: {prompt}"))
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&self, prompt: &str) -> io::Result<Option<String>> {
            match self.pop(prompt) {
                Answer::Text(value) => Ok(value),
                _ => panic!("scripted answer type mismatch for prompt: {prompt}"),
            }
        }

        fn input_with_default(&self, prompt: &str, default: &str) -> io::Result<Option<String>> {
            match self.pop(prompt) {
                Answer::Text(Some(value)) if value.is_empty() => Ok(Some(default.to_string())),
                Answer::Text(value) => Ok(value),
                _ => panic!("scripted answer type mismatch for prompt: {prompt}"),
            }
        }

        fn confirm(&self, prompt: &str, _default: bool) -> io::Result<Option<bool>> {
            match self.pop(prompt) {
                Answer::Bool(value) => Ok(value),
                _ => panic!("scripted answer type mismatch for prompt: {prompt}"),
            }
        }

        fn select(&self, prompt: &str, _items: &[String]) -> io::Result<Option<usize>> {
            match self.pop(prompt) {
                Answer::Index(value) => Ok(value),
                _ => panic!("scripted answer type mismatch for prompt: {prompt}"),
            }
        }

        fn multi_select(&self, prompt: &str, _items: &[String]) -> io::Result<Option<Vec<usize>>> {
            match self.pop(prompt) {
                Answer::Indexes(value) => Ok(value),
                _ => panic!("scripted answer type mismatch for prompt: {prompt}"),
            }
        }
    }
}
