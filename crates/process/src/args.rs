//! Argument lists with a shell-like display form.
//!
//! Arguments go to the child as plain argv entries. The display form
//! quotes values the way the tools document their command lines, e.g.
//! `-C -al="en=English" "en.app"`.

use std::fmt;

/// One command-line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Passed and shown as is (`-C`, `-v=v257`).
    Plain(String),
    /// Shown in double quotes.
    Quoted(String),
    /// `key=value`, shown with the value quoted.
    Assign { key: String, value: String },
}

impl Arg {
    /// The argv entry handed to the child process.
    pub fn to_argv(&self) -> String {
        match self {
            Arg::Plain(s) | Arg::Quoted(s) => s.clone(),
            Arg::Assign { key, value } => format!("{key}={value}"),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Plain(s) => f.write_str(s),
            Arg::Quoted(s) => write!(f, "\"{s}\""),
            Arg::Assign { key, value } => write!(f, "{key}=\"{value}\""),
        }
    }
}

/// Ordered argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<Arg>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(&mut self, s: impl Into<String>) -> &mut Self {
        self.0.push(Arg::Plain(s.into()));
        self
    }

    pub fn quoted(&mut self, s: impl Into<String>) -> &mut Self {
        self.0.push(Arg::Quoted(s.into()));
        self
    }

    pub fn assign(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push(Arg::Assign {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.0.iter()
    }

    pub fn to_argv(&self) -> Vec<String> {
        self.0.iter().map(Arg::to_argv).collect()
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
