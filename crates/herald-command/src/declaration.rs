//! Positional argument declarations.
//!
//! A command definition is a path followed by argument declarations:
//!
//! | form | meaning |
//! |------|---------|
//! | `<name>` | required |
//! | `[name]` | optional |
//! | `<name...>` | variadic, collects every remaining token |
//! | `<name:text>` | raw rest of the line, unsegmented |

use crate::CommandError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One declared positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDecl {
    /// Display name.
    pub name: String,
    /// Must be supplied when argument counts are checked.
    pub required: bool,
    /// Swallows every remaining token.
    pub variadic: bool,
    /// Receives the remainder of the line verbatim.
    pub text: bool,
}

impl ArgDecl {
    /// Returns `true` if this argument absorbs any number of extra values.
    #[must_use]
    pub fn absorbs_rest(&self) -> bool {
        self.variadic || self.text
    }
}

impl fmt::Display for ArgDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if self.required { ('<', '>') } else { ('[', ']') };
        write!(f, "{open}{}", self.name)?;
        if self.variadic {
            f.write_str("...")?;
        }
        if self.text {
            f.write_str(":text")?;
        }
        write!(f, "{close}")
    }
}

/// Splits `"path decl..."` into the path and the declaration text.
#[must_use]
pub fn split_definition(def: &str) -> (&str, &str) {
    let def = def.trim();
    match def.find(char::is_whitespace) {
        Some(pos) => (&def[..pos], def[pos..].trim_start()),
        None => (def, ""),
    }
}

/// Parses a declaration string such as `<target> [count] <message:text>`.
///
/// # Errors
///
/// Returns [`CommandError::InvalidDeclaration`] for unbalanced brackets,
/// unknown kinds, empty names, or an argument following a variadic/text one.
pub fn parse_declarations(source: &str) -> Result<Vec<ArgDecl>, CommandError> {
    let mut decls: Vec<ArgDecl> = Vec::new();

    for token in source.split_whitespace() {
        let invalid = || CommandError::InvalidDeclaration(token.to_string());

        let (required, inner) = if let Some(inner) = token.strip_prefix('<') {
            (true, inner.strip_suffix('>').ok_or_else(invalid)?)
        } else if let Some(inner) = token.strip_prefix('[') {
            (false, inner.strip_suffix(']').ok_or_else(invalid)?)
        } else {
            return Err(invalid());
        };

        if decls.last().is_some_and(ArgDecl::absorbs_rest) {
            return Err(CommandError::InvalidDeclaration(format!(
                "{token} follows an argument that takes the rest of the line"
            )));
        }

        let (inner, kind) = match inner.split_once(':') {
            Some((name, kind)) => (name, Some(kind)),
            None => (inner, None),
        };
        let text = match kind {
            None | Some("string") => false,
            Some("text") => true,
            Some(_) => return Err(invalid()),
        };
        let (name, variadic) = match inner.strip_suffix("...") {
            Some(name) => (name, true),
            None => (inner, false),
        };
        if name.is_empty() || name.contains(['<', '>', '[', ']']) {
            return Err(invalid());
        }

        decls.push(ArgDecl {
            name: name.to_string(),
            required,
            variadic,
            text,
        });
    }

    Ok(decls)
}
