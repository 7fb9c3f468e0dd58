//! Command line parser.
//!
//! The router treats parsing as a black box behind [`LineParser`].
//! [`DefaultParser`] is a shell-like tokenizer:
//!
//! | Input | Effect |
//! |-------|--------|
//! | `"two words"`, `'two words'` | one positional value |
//! | `--times 3`, `--times=3` | value option |
//! | `-st 3` | clustered short flags; the last one may take the next token |
//! | `--no-color` | negated boolean |
//! | `--` | stop; the remaining raw text becomes `rest` |
//! | `--unknown` | recorded in `unknown` |
//!
//! A positional slot declared `:text` receives the raw remainder of the
//! line, quotes included, and parsing stops there.
//!
//! # Example
//!
//! ```
//! use herald_command::{parse_declarations, DefaultParser, LineParser, OptionConfig, OptionDecl};
//!
//! let args = parse_declarations("<dice> [label:text]").unwrap();
//! let options = vec![OptionDecl::parse("-t, --times <n:integer>", OptionConfig::default()).unwrap()];
//!
//! let parsed = DefaultParser.parse("-t 3 2d6 to hit", &args, &options).unwrap();
//! assert_eq!(parsed.args, ["2d6", "to hit"]);
//! assert_eq!(parsed.options["times"].as_i64(), Some(3));
//! ```

use crate::{ArgDecl, Flag, OptionDecl, OptionValue, ParseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of binding a line against a command's declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Positional values in order.
    pub args: Vec<String>,
    /// Canonical option name to value, defaults included.
    pub options: BTreeMap<String, OptionValue>,
    /// Undeclared option names, without dashes.
    pub unknown: Vec<String>,
    /// Raw text after a standalone `--`.
    pub rest: String,
}

/// Splits a command line into args, options and unknown flags.
pub trait LineParser: Send + Sync {
    /// Parses `line` (the text after the command name).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed quoting or option values that
    /// fail conversion or validation.
    fn parse(
        &self,
        line: &str,
        args: &[ArgDecl],
        options: &[OptionDecl],
    ) -> Result<ParsedLine, ParseError>;
}

/// Shell-like parser used unless the app is given another one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

#[derive(Debug)]
struct Token<'a> {
    text: &'a str,
    quoted: bool,
    start: usize,
    end: usize,
}

impl Token<'_> {
    fn is_flag(&self) -> bool {
        !self.quoted
            && self.text.len() > 1
            && self.text.starts_with('-')
            && !self.is_negative_number()
    }

    /// `-5`, `-2.5`, `-.5`; not `-inf` or `-nan`.
    fn is_negative_number(&self) -> bool {
        self.text[1..].starts_with(|c: char| c.is_ascii_digit() || c == '.')
            && self.text.parse::<f64>().is_ok()
    }
}

fn tokenize(line: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c == b'"' || c == b'\'' {
            let close = line[i + 1..]
                .find(char::from(c))
                .ok_or(ParseError::UnterminatedQuote(i))?;
            let end = i + 1 + close;
            tokens.push(Token {
                text: &line[i + 1..end],
                quoted: true,
                start: i,
                end: end + 1,
            });
            i = end + 1;
            continue;
        }

        let end = line[i..]
            .find(|ch: char| ch.is_ascii_whitespace())
            .map_or(line.len(), |n| i + n);
        tokens.push(Token {
            text: &line[i..end],
            quoted: false,
            start: i,
            end,
        });
        i = end;
    }

    Ok(tokens)
}

fn find_flag<'d>(options: &'d [OptionDecl], dashed: &str) -> Option<(&'d OptionDecl, &'d Flag)> {
    options.iter().find_map(|decl| {
        decl.flags
            .iter()
            .find(|flag| flag.dashed() == dashed)
            .map(|flag| (decl, flag))
    })
}

/// Resolves a long flag by name. `no-x` negates a boolean `--x` even when
/// only `--x` is declared.
fn find_long<'d>(options: &'d [OptionDecl], name: &str) -> Option<(&'d OptionDecl, Flag)> {
    if let Some((decl, flag)) = find_flag(options, &format!("--{name}")) {
        return Some((decl, flag.clone()));
    }
    let positive = name.strip_prefix("no-")?;
    let (decl, flag) = find_flag(options, &format!("--{positive}"))?;
    decl.is_boolean().then(|| {
        let negated = Flag {
            negated: true,
            ..flag.clone()
        };
        (decl, negated)
    })
}

/// Cursor over the token list shared by the option handlers.
struct Binder<'a, 't> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl Binder<'_, '_> {
    /// Consumes the next token as a value if it is not itself a flag.
    fn take_value(&mut self) -> Option<String> {
        let next = self.tokens.get(self.pos + 1)?;
        if next.is_flag() || (!next.quoted && next.text == "--") {
            return None;
        }
        self.pos += 1;
        Some(next.text.to_string())
    }
}

fn bind_value(
    decl: &OptionDecl,
    flag: &Flag,
    inline: Option<&str>,
    binder: &mut Binder<'_, '_>,
) -> Result<OptionValue, ParseError> {
    let Some(spec) = &decl.value else {
        return match inline {
            None => Ok(decl.implicit_value(flag)),
            Some("true") => Ok(OptionValue::Bool(!flag.negated)),
            Some("false") => Ok(OptionValue::Bool(flag.negated)),
            Some(other) => Err(ParseError::InvalidValue {
                option: decl.name.clone(),
                expected: "boolean",
                value: other.to_string(),
            }),
        };
    };

    let raw = match inline {
        Some(raw) => Some(raw.to_string()),
        None => binder.take_value(),
    };
    match raw {
        Some(raw) => spec.kind.convert(&decl.name, &raw),
        None if spec.required => Err(ParseError::MissingValue(decl.name.clone())),
        None => Ok(OptionValue::Bool(true)),
    }
}

impl LineParser for DefaultParser {
    fn parse(
        &self,
        line: &str,
        args: &[ArgDecl],
        options: &[OptionDecl],
    ) -> Result<ParsedLine, ParseError> {
        let tokens = tokenize(line)?;
        let mut binder = Binder {
            tokens: &tokens,
            pos: 0,
        };
        let mut out = ParsedLine::default();
        let mut seen: Vec<(&OptionDecl, OptionValue)> = Vec::new();

        while let Some(token) = tokens.get(binder.pos) {
            if !token.quoted && token.text == "--" {
                out.rest = line[token.end..].trim().to_string();
                break;
            }

            if token.is_flag() {
                if let Some(long) = token.text.strip_prefix("--") {
                    let (name, inline) = match long.split_once('=') {
                        Some((name, value)) => (name, Some(value)),
                        None => (long, None),
                    };
                    match find_long(options, name) {
                        Some((decl, flag)) => {
                            let value = bind_value(decl, &flag, inline, &mut binder)?;
                            seen.push((decl, value));
                        }
                        None => out.unknown.push(name.to_string()),
                    }
                } else {
                    let cluster = &token.text[1..];
                    for (offset, ch) in cluster.char_indices() {
                        let Some((decl, flag)) = find_flag(options, &format!("-{ch}")) else {
                            out.unknown.push(ch.to_string());
                            continue;
                        };
                        let tail = &cluster[offset + ch.len_utf8()..];
                        if decl.is_boolean() || tail.is_empty() {
                            let value = bind_value(decl, flag, None, &mut binder)?;
                            seen.push((decl, value));
                        } else {
                            // `-n5`: the rest of the cluster is the value.
                            let value = bind_value(decl, flag, Some(tail), &mut binder)?;
                            seen.push((decl, value));
                            break;
                        }
                    }
                }
                binder.pos += 1;
                continue;
            }

            let slot = args.get(out.args.len()).or_else(|| args.last().filter(|d| d.variadic));
            if slot.is_some_and(|decl| decl.text) {
                out.args.push(line[token.start..].trim_end().to_string());
                break;
            }
            out.args.push(token.text.to_string());
            binder.pos += 1;
        }

        for (decl, value) in seen {
            decl.check(&value)?;
            out.options.insert(decl.name.clone(), value);
        }
        for decl in options {
            if let Some(default) = &decl.config.default {
                out.options
                    .entry(decl.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_declarations, OptionConfig};

    fn opts(exprs: &[&str]) -> Vec<OptionDecl> {
        exprs
            .iter()
            .map(|e| OptionDecl::parse(e, OptionConfig::default()).unwrap())
            .collect()
    }

    fn parse(line: &str, decl: &str, options: &[OptionDecl]) -> ParsedLine {
        DefaultParser
            .parse(line, &parse_declarations(decl).unwrap(), options)
            .unwrap()
    }

    #[test]
    fn positional_and_quotes() {
        let parsed = parse(r#"alpha "beta gamma" 'delta'"#, "<a> <b> <c>", &[]);
        assert_eq!(parsed.args, ["alpha", "beta gamma", "delta"]);
        assert!(parsed.options.is_empty());
    }

    #[test]
    fn unterminated_quote_fails() {
        let err = DefaultParser.parse(r#"say "oops"#, &[], &[]).unwrap_err();
        assert_eq!(err, ParseError::UnterminatedQuote(4));
    }

    #[test]
    fn long_options_with_and_without_equals() {
        let options = opts(&["--times <n:integer>", "--to [target]"]);
        let parsed = parse("--times=3 --to bob hello", "<msg>", &options);
        assert_eq!(parsed.options["times"], OptionValue::Integer(3));
        assert_eq!(parsed.options["to"], OptionValue::Text("bob".into()));
        assert_eq!(parsed.args, ["hello"]);
    }

    #[test]
    fn optional_value_without_value_is_true() {
        let options = opts(&["--to [target]", "-s, --silent"]);
        let parsed = parse("--to -s", "", &options);
        assert_eq!(parsed.options["to"], OptionValue::Bool(true));
        assert_eq!(parsed.options["silent"], OptionValue::Bool(true));
    }

    #[test]
    fn required_value_missing() {
        let options = opts(&["--times <n:integer>"]);
        let err = DefaultParser.parse("--times", &[], &options).unwrap_err();
        assert_eq!(err, ParseError::MissingValue("times".into()));
    }

    #[test]
    fn clustered_short_flags() {
        let options = opts(&["-s, --silent", "-v, --verbose", "-n, --count <n:integer>"]);
        let parsed = parse("-svn 4 go", "<what>", &options);
        assert_eq!(parsed.options["silent"], OptionValue::Bool(true));
        assert_eq!(parsed.options["verbose"], OptionValue::Bool(true));
        assert_eq!(parsed.options["count"], OptionValue::Integer(4));
        assert_eq!(parsed.args, ["go"]);

        let parsed = parse("-n5", "", &options);
        assert_eq!(parsed.options["count"], OptionValue::Integer(5));
    }

    #[test]
    fn negated_flags() {
        let options = opts(&["-c, --color, --no-color"]);
        assert_eq!(
            parse("--no-color", "", &options).options["color"],
            OptionValue::Bool(false)
        );
        assert_eq!(
            parse("--color=false", "", &options).options["color"],
            OptionValue::Bool(false)
        );
    }

    #[test]
    fn no_prefix_negates_declared_boolean() {
        let options = opts(&["-c, --color", "--to <who>"]);
        let parsed = parse("--no-color", "", &options);
        assert_eq!(parsed.options["color"], OptionValue::Bool(false));
        assert!(parsed.unknown.is_empty());

        assert_eq!(
            parse("--no-color=true", "", &options).options["color"],
            OptionValue::Bool(false)
        );

        // value options cannot be negated
        let parsed = parse("--no-to", "", &options);
        assert!(parsed.options.is_empty());
        assert_eq!(parsed.unknown, ["no-to"]);
    }

    #[test]
    fn unknown_flags_are_collected() {
        let parsed = parse("--loud -x hi", "<a>", &[]);
        assert_eq!(parsed.unknown, ["loud", "x"]);
        assert_eq!(parsed.args, ["hi"]);
    }

    #[test]
    fn negative_numbers_are_positional() {
        let parsed = parse("-5 -2.5 -.5", "<a> <b> <c>", &[]);
        assert_eq!(parsed.args, ["-5", "-2.5", "-.5"]);
        assert!(parsed.unknown.is_empty());
    }

    #[test]
    fn float_words_are_flag_clusters() {
        let options = opts(&["-i, --ignore", "-n, --dry", "-f, --force"]);
        let parsed = parse("-inf", "[a]", &options);
        assert!(parsed.args.is_empty());
        assert_eq!(parsed.options["ignore"], OptionValue::Bool(true));
        assert_eq!(parsed.options["dry"], OptionValue::Bool(true));
        assert_eq!(parsed.options["force"], OptionValue::Bool(true));

        let parsed = parse("-nan", "[a]", &[]);
        assert_eq!(parsed.unknown, ["n", "a", "n"]);
    }

    #[test]
    fn double_dash_stops_parsing() {
        let options = opts(&["-s, --silent"]);
        let parsed = parse("a -- -s raw  text", "<a>", &options);
        assert_eq!(parsed.args, ["a"]);
        assert_eq!(parsed.rest, "-s raw  text");
        assert!(!parsed.options.contains_key("silent"));
    }

    #[test]
    fn text_argument_takes_rest_of_line() {
        let options = opts(&["-s, --silent"]);
        let parsed = parse("-s bob hello  --world", "<to> <message:text>", &options);
        assert_eq!(parsed.args, ["bob", "hello  --world"]);
        assert_eq!(parsed.options["silent"], OptionValue::Bool(true));
    }

    #[test]
    fn variadic_collects_everything() {
        let parsed = parse("a b c d", "<first> [more...]", &[]);
        assert_eq!(parsed.args, ["a", "b", "c", "d"]);
    }

    #[test]
    fn defaults_fill_absent_options() {
        let options = vec![OptionDecl::parse(
            "--times <n:integer>",
            OptionConfig::default().default_value(OptionValue::Integer(1)),
        )
        .unwrap()];
        assert_eq!(
            parse("", "", &options).options["times"],
            OptionValue::Integer(1)
        );
        assert_eq!(
            parse("--times 7", "", &options).options["times"],
            OptionValue::Integer(7)
        );
    }

    #[test]
    fn invalid_and_rejected_values() {
        let options = vec![OptionDecl::parse(
            "--times <n:integer>",
            OptionConfig::default().validate(|v| {
                if v.as_i64().is_some_and(|n| n > 0) {
                    Ok(())
                } else {
                    Err("must be positive".into())
                }
            }),
        )
        .unwrap()];

        assert!(matches!(
            DefaultParser.parse("--times many", &[], &options),
            Err(ParseError::InvalidValue { .. })
        ));
        assert!(matches!(
            DefaultParser.parse("--times 0", &[], &options),
            Err(ParseError::Rejected { .. })
        ));
    }
}
