//! Bounded expansion of retrieve command templates.
//!
//! | Placeholder | Substituted value |
//! |---|---|
//! | `%p` | canonical local path, native separators |
//! | `%f` | segment filename, unmodified |
//! | `%a` | archive directory, native separators |
//! | `%%` | a single `%` |
//! | any other `%x` | `%x` unchanged |
//!
//! # Truncation
//!
//! The output holds at most `capacity - 1` bytes. Once a write would cross that
//! bound, it and every later write are dropped and the result is flagged as
//! truncated; scanning of the template still runs to the end. A multi-byte
//! character is never split. Substituted text is never re-scanned.
//!
//! # Escaping
//!
//! [`EscapeMode::Shell`] quotes values for a POSIX shell (`'...'`, with `'`
//! written as `'\''`). It offers no protection under `cmd /C`.

use std::fmt::{self, Display, Formatter};

use walfetch_config::EscapeMode;

use crate::path::native_separators;

/// A command string produced by [`Expander::expand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedCommand {
    text: String,
    capacity: usize,
    truncated: bool,
}

impl ExpandedCommand {
    /// The command text as it will be handed to the interpreter.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the command in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the command is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Capacity the command was expanded into, terminator included.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether output was dropped because the capacity was reached.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Display for ExpandedCommand {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.text)
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    /// Substituted for `%p`.
    pub path: &'a str,
    /// Substituted for `%f`.
    pub filename: &'a str,
    /// Substituted for `%a`.
    pub archive_dir: &'a str,
}

/// Template expander with a fixed output capacity.
#[derive(Debug, Clone)]
pub struct Expander {
    capacity: usize,
    escape: EscapeMode,
}

impl Expander {
    /// Expander writing at most `capacity - 1` bytes, inserting values verbatim.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            escape: EscapeMode::Verbatim,
        }
    }

    /// Replace the quoting applied to substituted values.
    #[must_use]
    pub const fn with_escape(mut self, escape: EscapeMode) -> Self {
        self.escape = escape;
        self
    }

    /// Expand `template` in one left-to-right pass.
    #[must_use]
    pub fn expand(&self, template: &str, values: &Placeholders<'_>) -> ExpandedCommand {
        let mut out = BoundedBuffer::new(self.capacity);
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }
            match chars.peek().copied() {
                Some('p') => {
                    chars.next();
                    self.substitute(&mut out, &native_separators(values.path));
                }
                Some('f') => {
                    chars.next();
                    self.substitute(&mut out, values.filename);
                }
                Some('a') => {
                    chars.next();
                    self.substitute(&mut out, &native_separators(values.archive_dir));
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push('%'),
            }
        }

        out.finish(self.capacity)
    }

    fn substitute(&self, out: &mut BoundedBuffer, value: &str) {
        match self.escape {
            EscapeMode::Verbatim => out.push_str(value),
            EscapeMode::Shell => out.push_str(&shell_quote(value)),
        }
    }
}

/// Expand with verbatim substitution; see [`Expander::expand`].
#[must_use]
pub fn expand(
    template: &str,
    path: &str,
    filename: &str,
    archive_dir: &str,
    capacity: usize,
) -> ExpandedCommand {
    Expander::new(capacity).expand(
        template,
        &Placeholders {
            path,
            filename,
            archive_dir,
        },
    )
}

/// Characters following `%` that the expander passes through literally.
#[must_use]
pub fn unknown_placeholders(template: &str) -> Vec<char> {
    let mut unknown = Vec::new();
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            continue;
        }
        match chars.next() {
            Some('p' | 'f' | 'a' | '%') | None => {}
            Some(other) => unknown.push(other),
        }
    }
    unknown
}

fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

struct BoundedBuffer {
    text: String,
    limit: usize,
    truncated: bool,
}

impl BoundedBuffer {
    fn new(capacity: usize) -> Self {
        let limit = capacity.saturating_sub(1);
        Self {
            text: String::with_capacity(limit),
            limit,
            truncated: false,
        }
    }

    fn push(&mut self, ch: char) {
        if self.truncated {
            return;
        }
        if self.text.len() + ch.len_utf8() > self.limit {
            self.truncated = true;
            return;
        }
        self.text.push(ch);
    }

    fn push_str(&mut self, value: &str) {
        for ch in value.chars() {
            self.push(ch);
        }
    }

    fn finish(self, capacity: usize) -> ExpandedCommand {
        ExpandedCommand {
            text: self.text,
            capacity,
            truncated: self.truncated,
        }
    }
}
