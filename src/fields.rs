//! Label-delimited field extraction from tool stdout
//!
//! The external tools print fixed layouts such as `Key: A min` or
//! `duration=183.4`. A field is read by checking the label and separator
//! and taking the trimmed remainder, so a tool that changes its wording
//! fails loudly instead of yielding a silently truncated value.

/// Parse failure on a tool's text output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{tool} printed {found} line(s), expected {expected}")]
    LineCount {
        tool: &'static str,
        expected: String,
        found: usize,
    },

    #[error("{tool} line {index}: expected `{expected}` prefix, got {line:?}")]
    Label {
        tool: &'static str,
        index: usize,
        expected: String,
        line: String,
    },

    #[error("{tool} line {index}: `{label}` has no value")]
    EmptyValue {
        tool: &'static str,
        index: usize,
        label: &'static str,
    },

    #[error("{tool}: `{label}` value {value:?} is not a positive number")]
    Number {
        tool: &'static str,
        label: &'static str,
        value: String,
    },
}

/// A `<label><separator><value>` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledField {
    pub label: &'static str,
    pub separator: char,
}

impl LabeledField {
    pub const fn new(label: &'static str, separator: char) -> Self {
        Self { label, separator }
    }

    /// Width of `<label><separator>`
    pub fn prefix_len(&self) -> usize {
        self.label.len() + self.separator.len_utf8()
    }

    /// The trimmed value after the prefix, or None if the line does not
    /// start with this label immediately followed by the separator
    ///
    /// The label is matched ASCII case-insensitively.
    pub fn value<'a>(&self, line: &'a str) -> Option<&'a str> {
        let head = line.get(..self.label.len())?;
        if !head.eq_ignore_ascii_case(self.label) {
            return None;
        }
        line[self.label.len()..]
            .strip_prefix(self.separator)
            .map(str::trim)
    }

    fn expected(&self) -> String {
        format!("{}{}", self.label, self.separator)
    }
}

/// Stdout of one tool split into lines
///
/// CRLF endings are normalised and trailing blank lines dropped; blank
/// lines in the middle keep their position.
#[derive(Debug, Clone)]
pub struct OutputLines<'a> {
    tool: &'static str,
    lines: Vec<&'a str>,
}

impl<'a> OutputLines<'a> {
    pub fn new(tool: &'static str, stdout: &'a str) -> Self {
        let mut lines: Vec<&str> = stdout.lines().collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        Self { tool, lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn expect_exactly(&self, count: usize) -> Result<(), ParseError> {
        if self.lines.len() == count {
            Ok(())
        } else {
            Err(self.line_count_error(format!("exactly {}", count)))
        }
    }

    pub fn expect_at_least(&self, count: usize) -> Result<(), ParseError> {
        if self.lines.len() >= count {
            Ok(())
        } else {
            Err(self.line_count_error(format!("at least {}", count)))
        }
    }

    /// Value of `field` on line `index`
    pub fn field(&self, index: usize, field: &LabeledField) -> Result<&'a str, ParseError> {
        let line = *self
            .lines
            .get(index)
            .ok_or_else(|| self.line_count_error(format!("at least {}", index + 1)))?;

        let value = field.value(line).ok_or_else(|| ParseError::Label {
            tool: self.tool,
            index,
            expected: field.expected(),
            line: line.to_string(),
        })?;

        if value.is_empty() {
            return Err(ParseError::EmptyValue {
                tool: self.tool,
                index,
                label: field.label,
            });
        }

        Ok(value)
    }

    fn line_count_error(&self, expected: String) -> ParseError {
        ParseError::LineCount {
            tool: self.tool,
            expected,
            found: self.lines.len(),
        }
    }
}

/// Parse a finite, strictly positive number
pub fn positive_number(
    tool: &'static str,
    label: &'static str,
    value: &str,
) -> Result<f64, ParseError> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(ParseError::Number {
            tool,
            label,
            value: value.to_string(),
        }),
    }
}
