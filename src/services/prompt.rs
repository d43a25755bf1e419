use crate::domain::errors::InstallError;
use std::io::{BufRead, Write};

pub trait Prompter {
    /// Shows `question` and returns the trimmed answer.
    fn ask(&self, question: &str) -> anyhow::Result<String>;

    /// Like `ask`, for values that must not be logged.
    fn ask_secret(&self, question: &str) -> anyhow::Result<String> {
        self.ask(question)
    }

    /// Prints an informational line to the operator.
    fn say(&self, line: &str);
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, question: &str) -> anyhow::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{} ", question)?;
        stdout.flush()?;
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            anyhow::bail!("input closed while waiting for: {}", question);
        }
        Ok(line.trim().to_string())
    }

    fn say(&self, line: &str) {
        println!("{}", line);
    }
}

pub fn ask_or_default(p: &dyn Prompter, question: &str, default: &str) -> anyhow::Result<String> {
    let answer = p.ask(&format!("{} [{}]:", question, default))?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}

pub fn ask_required(p: &dyn Prompter, question: &str) -> anyhow::Result<String> {
    let answer = p.ask(&format!("{}:", question))?;
    if answer.is_empty() {
        anyhow::bail!("a value is required for: {}", question);
    }
    Ok(answer)
}

pub fn ask_secret_required(p: &dyn Prompter, question: &str) -> anyhow::Result<String> {
    let answer = p.ask_secret(&format!("{}:", question))?;
    if answer.is_empty() {
        anyhow::bail!("a value is required for: {}", question);
    }
    Ok(answer)
}

/// Yes/no question; anything but `y`/`yes` counts as no.
pub fn confirm(p: &dyn Prompter, question: &str) -> anyhow::Result<bool> {
    let answer = p.ask(&format!("{} [y/N]:", question))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Numbered menu. Returns the zero-based index, or `None` when the answer is
/// not a listed number.
pub fn choose(p: &dyn Prompter, title: &str, options: &[&str]) -> anyhow::Result<Option<usize>> {
    p.say(title);
    for (i, o) in options.iter().enumerate() {
        p.say(&format!("  {}) {}", i + 1, o));
    }
    let answer = p.ask("Enter choice:")?;
    Ok(parse_choice(&answer, options.len()))
}

/// Menu that falls back to the first option on an unmatched answer.
pub fn choose_or_first(p: &dyn Prompter, title: &str, options: &[&str]) -> anyhow::Result<usize> {
    match choose(p, title, options)? {
        Some(i) => Ok(i),
        None => {
            tracing::warn!(
                default = options.first().copied().unwrap_or_default(),
                "unrecognized choice, using default"
            );
            Ok(0)
        }
    }
}

/// Menu where an unmatched answer is an error.
pub fn choose_strict(p: &dyn Prompter, title: &str, options: &[&str]) -> anyhow::Result<usize> {
    choose(p, title, options)?
        .ok_or_else(|| InstallError::SelectionOutOfRange(format!("1..={}", options.len())).into())
}

fn parse_choice(answer: &str, len: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}
