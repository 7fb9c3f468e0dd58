//! Option declarations.
//!
//! An option is declared with a flag expression:
//!
//! ```text
//! -s, --silent                 boolean flag
//! --times <count:integer>      required integer value
//! -t, --to [target]            optional text value
//! --no-color                   negated boolean, sets `color` to false
//! ```
//!
//! Anything after the flags and the value spec is the description. The
//! canonical name is the longest flag with its dashes stripped.

use crate::{CommandError, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of value an option takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Any text.
    Text,
    /// Signed integer.
    Integer,
    /// Floating-point number.
    Number,
}

impl ValueKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "text" | "string" => Some(Self::Text),
            "integer" | "int" => Some(Self::Integer),
            "number" => Some(Self::Number),
            _ => None,
        }
    }

    /// Name used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Number => "number",
        }
    }

    /// Converts raw text for `option`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidValue`] when `raw` does not fit the kind.
    pub fn convert(self, option: &str, raw: &str) -> Result<OptionValue, ParseError> {
        let invalid = || ParseError::InvalidValue {
            option: option.to_string(),
            expected: self.as_str(),
            value: raw.to_string(),
        };
        match self {
            Self::Text => Ok(OptionValue::Text(raw.to_string())),
            Self::Integer => raw.parse().map(OptionValue::Integer).map_err(|_| invalid()),
            Self::Number => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(OptionValue::Number)
                .ok_or_else(invalid),
        }
    }
}

/// A resolved option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Flag presence.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl OptionValue {
    /// Returns the boolean, if this is a flag.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number; integers widen.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Value check run at parse time; `Err` carries the user-facing reason.
pub type Validator = Arc<dyn Fn(&OptionValue) -> Result<(), String> + Send + Sync>;

/// Per-option behaviour.
#[derive(Clone, Default)]
pub struct OptionConfig {
    /// Minimum authority to pass this option.
    pub authority: u32,
    /// Invocations carrying this option are not counted against usage.
    pub not_usage: bool,
    /// Must be present when the command checks required options.
    pub required: bool,
    /// Omitted from help output.
    pub hidden: bool,
    /// Value used when the option is absent.
    pub default: Option<OptionValue>,
    /// Parse-time validator.
    pub validator: Option<Validator>,
}

impl OptionConfig {
    /// Sets the authority threshold.
    #[must_use]
    pub fn authority(mut self, authority: u32) -> Self {
        self.authority = authority;
        self
    }

    /// Exempts invocations using this option from usage accounting.
    #[must_use]
    pub fn not_usage(mut self) -> Self {
        self.not_usage = true;
        self
    }

    /// Marks the option as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Hides the option from help.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: OptionValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the validator.
    #[must_use]
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&OptionValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for OptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionConfig")
            .field("authority", &self.authority)
            .field("not_usage", &self.not_usage)
            .field("required", &self.required)
            .field("hidden", &self.hidden)
            .field("default", &self.default)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// One spelling of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    /// Name without dashes (and without `no-` for negated flags).
    pub name: String,
    /// Single-dash form.
    pub short: bool,
    /// `--no-` form, sets the option to `false`.
    pub negated: bool,
}

impl Flag {
    fn parse(token: &str) -> Option<Self> {
        if let Some(long) = token.strip_prefix("--") {
            if long.is_empty() || long.starts_with('-') {
                return None;
            }
            return Some(match long.strip_prefix("no-") {
                Some(name) if !name.is_empty() => Self {
                    name: name.to_string(),
                    short: false,
                    negated: true,
                },
                _ => Self {
                    name: long.to_string(),
                    short: false,
                    negated: false,
                },
            });
        }

        let short = token.strip_prefix('-')?;
        let mut chars = short.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_alphanumeric() => Some(Self {
                name: short.to_string(),
                short: true,
                negated: false,
            }),
            _ => None,
        }
    }

    /// The flag as typed, e.g. `-s`, `--silent` or `--no-color`.
    #[must_use]
    pub fn dashed(&self) -> String {
        match (self.short, self.negated) {
            (true, _) => format!("-{}", self.name),
            (false, true) => format!("--no-{}", self.name),
            (false, false) => format!("--{}", self.name),
        }
    }
}

/// Declared value of a value-taking option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpec {
    /// Placeholder name shown in help.
    pub name: String,
    /// Conversion applied at parse time.
    pub kind: ValueKind,
    /// `<value>` rather than `[value]`.
    pub required: bool,
}

/// A declared option.
#[derive(Debug, Clone)]
pub struct OptionDecl {
    /// Canonical name: key in the parsed option map.
    pub name: String,
    /// Every spelling, in declaration order.
    pub flags: Vec<Flag>,
    /// `None` for boolean flags.
    pub value: Option<ValueSpec>,
    /// Free text after the flags.
    pub description: String,
    /// Behaviour.
    pub config: OptionConfig,
}

impl OptionDecl {
    /// Parses a flag expression.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidOption`] when no flag is present, a
    /// flag is malformed, the value spec is malformed, or a negated flag is
    /// given a value.
    pub fn parse(expr: &str, config: OptionConfig) -> Result<Self, CommandError> {
        let invalid = |why: &str| CommandError::InvalidOption(format!("{expr}: {why}"));

        let mut tokens = expr
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .peekable();

        let mut flags = Vec::new();
        while let Some(token) = tokens.next_if(|t| t.starts_with('-')) {
            flags.push(Flag::parse(token).ok_or_else(|| invalid("malformed flag"))?);
        }
        if flags.is_empty() {
            return Err(invalid("no flags"));
        }

        let value = match tokens.next_if(|t| t.starts_with('<') || t.starts_with('[')) {
            Some(token) => Some(parse_value_spec(token).ok_or_else(|| invalid("malformed value"))?),
            None => None,
        };
        if value.is_some() && flags.iter().any(|f| f.negated) {
            return Err(invalid("negated flags take no value"));
        }

        let name = flags
            .iter()
            .filter(|f| !f.negated)
            .chain(flags.iter().filter(|f| f.negated))
            .fold(None::<&Flag>, |best, f| match best {
                Some(b) if b.name.len() >= f.name.len() => Some(b),
                _ => Some(f),
            })
            .map(|f| f.name.clone())
            .ok_or_else(|| invalid("no flags"))?;

        let description = tokens.collect::<Vec<_>>().join(" ");

        Ok(Self {
            name,
            flags,
            value,
            description,
            config,
        })
    }

    /// Returns `true` if the option takes no value.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.value.is_none()
    }

    /// Flags joined for display, e.g. `-t, --to`.
    #[must_use]
    pub fn flag_list(&self) -> String {
        self.flags
            .iter()
            .map(Flag::dashed)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Value for `flag` when it appears without an explicit value.
    #[must_use]
    pub fn implicit_value(&self, flag: &Flag) -> OptionValue {
        OptionValue::Bool(!flag.negated)
    }

    /// Runs the validator, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Rejected`] with the validator's message.
    pub fn check(&self, value: &OptionValue) -> Result<(), ParseError> {
        match &self.config.validator {
            Some(validator) => validator(value).map_err(|message| ParseError::Rejected {
                option: self.name.clone(),
                message,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for OptionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flag_list())?;
        if let Some(value) = &self.value {
            let (open, close) = if value.required { ('<', '>') } else { ('[', ']') };
            write!(f, " {open}{}", value.name)?;
            if value.kind != ValueKind::Text {
                write!(f, ":{}", value.kind.as_str())?;
            }
            write!(f, "{close}")?;
        }
        if !self.description.is_empty() {
            write!(f, "  {}", self.description)?;
        }
        Ok(())
    }
}

fn parse_value_spec(token: &str) -> Option<ValueSpec> {
    let (required, inner) = if let Some(inner) = token.strip_prefix('<') {
        (true, inner.strip_suffix('>')?)
    } else {
        (false, token.strip_prefix('[')?.strip_suffix(']')?)
    };
    let (name, kind) = match inner.split_once(':') {
        Some((name, kind)) => (name, ValueKind::parse(kind)?),
        None => (inner, ValueKind::Text),
    };
    if name.is_empty() {
        return None;
    }
    Some(ValueSpec {
        name: name.to_string(),
        kind,
        required,
    })
}
