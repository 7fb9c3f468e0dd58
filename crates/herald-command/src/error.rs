//! Error types for command registration and line parsing.

use herald_types::ErrorCode;
use thiserror::Error;

/// Configuration errors raised while building the command tree.
///
/// All of these are programming mistakes in plugin setup code; none are
/// recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// A path segment resolved to an empty name.
    #[error("expect a command name")]
    EmptyName,

    /// A path names the same command twice in a row.
    #[error("cannot set a command ({0}) as its own subcommand")]
    SelfParent(String),

    /// The command already belongs to another parent.
    #[error("cannot set {child} as a subcommand of {parent}")]
    InvalidSubcommand {
        /// Command that would be re-parented.
        child: String,
        /// Requested parent.
        parent: String,
    },

    /// The child reaches conversations the parent does not.
    #[error("context of {child} is not contained in the context of {parent}")]
    ContextMismatch {
        /// Command being adopted.
        child: String,
        /// Parent whose context is too narrow.
        parent: String,
    },

    /// The effective context of a new command matches nothing.
    #[error("command {0} would not be reachable from any conversation")]
    NoopContext(String),

    /// Alias already bound to another command.
    #[error("duplicate command names: {0}")]
    DuplicateAlias(String),

    /// Option flag already claimed by another option of the same command.
    #[error("duplicate option name \"{flag}\" for command \"{command}\"")]
    DuplicateOption {
        /// Offending flag.
        flag: String,
        /// Command owning both options.
        command: String,
    },

    /// Malformed argument declaration.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// Malformed option flag expression.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// A command id or name that is not registered.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl ErrorCode for CommandError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyName => "COMMAND_EMPTY_NAME",
            Self::SelfParent(_) => "COMMAND_SELF_PARENT",
            Self::InvalidSubcommand { .. } => "COMMAND_INVALID_SUBCOMMAND",
            Self::ContextMismatch { .. } => "COMMAND_CONTEXT_MISMATCH",
            Self::NoopContext(_) => "COMMAND_NOOP_CONTEXT",
            Self::DuplicateAlias(_) => "COMMAND_DUPLICATE_ALIAS",
            Self::DuplicateOption { .. } => "COMMAND_DUPLICATE_OPTION",
            Self::InvalidDeclaration(_) => "COMMAND_INVALID_DECLARATION",
            Self::InvalidOption(_) => "COMMAND_INVALID_OPTION",
            Self::UnknownCommand(_) => "COMMAND_UNKNOWN",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Errors produced while tokenizing or binding a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A quote was opened and never closed.
    #[error("unterminated quote starting at byte {0}")]
    UnterminatedQuote(usize),

    /// An option value does not fit the declared kind.
    #[error("option {option} expects {expected}, got \"{value}\"")]
    InvalidValue {
        /// Canonical option name.
        option: String,
        /// Declared value kind.
        expected: &'static str,
        /// Raw text supplied.
        value: String,
    },

    /// An option that requires a value was given none.
    #[error("option {0} requires a value")]
    MissingValue(String),

    /// A validator rejected the value.
    #[error("invalid value for option {option}: {message}")]
    Rejected {
        /// Canonical option name.
        option: String,
        /// Validator message.
        message: String,
    },
}

impl ErrorCode for ParseError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnterminatedQuote(_) => "PARSE_UNTERMINATED_QUOTE",
            Self::InvalidValue { .. } => "PARSE_INVALID_VALUE",
            Self::MissingValue(_) => "PARSE_MISSING_VALUE",
            Self::Rejected { .. } => "PARSE_REJECTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // The user can retype the line.
        true
    }
}
