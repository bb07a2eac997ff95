//! Line-preserving model of a flat `KEY=value` configuration file.
//!
//! The file is held as an ordered list of lines, each remembering its original line
//! terminator. Keyed operations rewrite only the lines they target; every other line
//! renders back exactly as it was read. There is no quoting, escaping or variable
//! expansion: a line is an assignment if it starts with `KEY=`, and a commented
//! assignment if it starts with an optional `#` followed by optional whitespace and
//! then `KEY=`.

use regex::Regex;
use tracing::debug;

use crate::errors::{ConfigurationError, ConfigurationResult};

#[cfg(test)]
#[path = "env_file_tests.rs"]
mod tests;

/// The terminator that followed a line in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    /// The last line of a file that does not end with a newline.
    None,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::None => "",
        }
    }
}

/// A single line of an [`EnvFile`], without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLine {
    content: String,
    ending: LineEnding,
}

impl EnvLine {
    fn from_raw(raw: &str) -> Self {
        if let Some(content) = raw.strip_suffix("\r\n") {
            Self {
                content: content.to_string(),
                ending: LineEnding::CrLf,
            }
        } else if let Some(content) = raw.strip_suffix('\n') {
            Self {
                content: content.to_string(),
                ending: LineEnding::Lf,
            }
        } else {
            Self {
                content: raw.to_string(),
                ending: LineEnding::None,
            }
        }
    }

    /// The text of the line without its terminator.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Returns the value if this line is an active assignment of `key`.
    fn active_value(&self, key: &str) -> Option<&str> {
        self.content
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
    }
}

/// What [`EnvFile::upsert`] did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// One or more active assignments were rewritten.
    Replaced,
    /// A commented-out assignment was turned into an active one.
    Activated,
    /// No assignment existed, a new line was added at the end.
    Appended,
}

/// An ordered, line-addressable `KEY=value` file.
///
/// # Examples
///
/// ```
/// use config_manager::{EnvFile, UpsertOutcome};
///
/// let mut env = EnvFile::parse("# settings\n#APP_ID=\nRUNNER_SCOPE=repo\n");
///
/// assert_eq!(env.upsert("APP_ID", "42").unwrap(), UpsertOutcome::Activated);
/// assert_eq!(env.upsert("RUNNER_SCOPE", "org").unwrap(), UpsertOutcome::Replaced);
/// assert_eq!(env.upsert("ORG_NAME", "acme").unwrap(), UpsertOutcome::Appended);
///
/// assert_eq!(
///     env.render(),
///     "# settings\nAPP_ID=42\nRUNNER_SCOPE=org\nORG_NAME=acme\n"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<EnvLine>,
}

impl EnvFile {
    /// Splits `content` into lines, keeping each line's terminator.
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(EnvLine::from_raw).collect(),
        }
    }

    /// Joins the lines back into file content.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.content);
            out.push_str(line.ending.as_str());
        }
        out
    }

    pub fn lines(&self) -> &[EnvLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the value of the first active assignment of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|l| l.active_value(key))
    }

    /// Sets `key` to `value`.
    ///
    /// Every active assignment of `key` is rewritten. If there is none, the first
    /// commented-out assignment is activated instead. Failing both, `KEY=value` is
    /// appended as a new last line.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidKey` if `key` is not a valid variable name.
    pub fn upsert(&mut self, key: &str, value: &str) -> ConfigurationResult<UpsertOutcome> {
        validate_key(key)?;
        let assignment = format!("{}={}", key, value);

        let mut replaced = 0;
        for line in self.lines.iter_mut() {
            if line.active_value(key).is_some() {
                line.content = assignment.clone();
                replaced += 1;
            }
        }
        if replaced > 0 {
            debug!(key = key, count = replaced, "Replaced active assignment");
            return Ok(UpsertOutcome::Replaced);
        }

        let commented = commented_assignment_pattern(key)?;
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| commented.is_match(&l.content))
        {
            line.content = assignment;
            debug!(key = key, "Activated commented assignment");
            return Ok(UpsertOutcome::Activated);
        }

        let ending = self.preferred_ending();
        if let Some(last) = self.lines.last_mut() {
            if last.ending == LineEnding::None {
                last.ending = ending;
            }
        }
        self.lines.push(EnvLine {
            content: assignment,
            ending,
        });
        debug!(key = key, "Appended assignment");
        Ok(UpsertOutcome::Appended)
    }

    /// Prefixes every active assignment of `key` with `# `.
    ///
    /// Returns the number of lines that were commented out.
    pub fn comment_out(&mut self, key: &str) -> ConfigurationResult<usize> {
        validate_key(key)?;

        let mut count = 0;
        for line in self.lines.iter_mut() {
            if line.active_value(key).is_some() {
                line.content = format!("# {}", line.content);
                count += 1;
            }
        }
        Ok(count)
    }

    // New lines follow the file's convention; CRLF wins if any line uses it.
    fn preferred_ending(&self) -> LineEnding {
        if self.lines.iter().any(|l| l.ending == LineEnding::CrLf) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

fn commented_assignment_pattern(key: &str) -> ConfigurationResult<Regex> {
    Regex::new(&format!(r"^#?\s*{}=", regex::escape(key))).map_err(|_| {
        ConfigurationError::InvalidKey {
            key: key.to_string(),
        }
    })
}

/// Checks that `key` is a conventional environment variable name.
pub fn validate_key(key: &str) -> ConfigurationResult<()> {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidKey {
            key: key.to_string(),
        })
    }
}
