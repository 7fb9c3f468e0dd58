//! Command tree nodes.

use crate::{ArgDecl, CommandAction, CommandConfig, CommandError, OptionConfig, OptionDecl};
use herald_types::{Context, FieldSet, GroupField, UserField};
use std::fmt;
use std::sync::Arc;

/// Index of a node inside its [`CommandRegistry`](crate::CommandRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub(crate) usize);

/// A registered command.
///
/// Nodes are owned by the registry and linked by [`CommandId`]. Cloning a
/// node is cheap enough to snapshot it before awaiting on its action.
#[derive(Clone)]
pub struct CommandNode {
    pub(crate) id: CommandId,
    pub(crate) name: String,
    pub(crate) args: Vec<ArgDecl>,
    pub(crate) aliases: Vec<String>,
    pub(crate) options: Vec<OptionDecl>,
    pub(crate) context: Context,
    pub(crate) parent: Option<CommandId>,
    pub(crate) children: Vec<CommandId>,
    pub(crate) config: CommandConfig,
    pub(crate) action: Option<Arc<dyn CommandAction>>,
    pub(crate) user_fields: FieldSet<UserField>,
    pub(crate) group_fields: FieldSet<GroupField>,
    pub(crate) description: String,
}

impl CommandNode {
    pub(crate) fn new(id: CommandId, name: String, context: Context) -> Self {
        Self {
            id,
            name,
            args: Vec::new(),
            aliases: Vec::new(),
            options: Vec::new(),
            context,
            parent: None,
            children: Vec::new(),
            config: CommandConfig::default(),
            action: None,
            user_fields: FieldSet::new(),
            group_fields: FieldSet::new(),
            description: String::new(),
        }
    }

    /// Registry index.
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Lowercase full name, e.g. `foo.bar`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared positional arguments.
    #[must_use]
    pub fn args(&self) -> &[ArgDecl] {
        &self.args
    }

    /// Aliases, in registration order.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Declared options.
    #[must_use]
    pub fn options(&self) -> &[OptionDecl] {
        &self.options
    }

    /// Option by canonical name.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Conversations this command is reachable from.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Parent command, if any.
    #[must_use]
    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    /// Subcommands, in adoption order.
    #[must_use]
    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Bound action.
    #[must_use]
    pub fn action(&self) -> Option<&Arc<dyn CommandAction>> {
        self.action.as_ref()
    }

    /// Help text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Usage bucket; the command name unless configured.
    #[must_use]
    pub fn usage_name(&self) -> &str {
        self.config.usage_name.as_deref().unwrap_or(&self.name)
    }

    /// `name <arg> [arg]` line for help output.
    #[must_use]
    pub fn usage_line(&self) -> String {
        std::iter::once(self.name.clone())
            .chain(self.args.iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// User fields the dispatcher must load before running this command.
    ///
    /// Declared fields, plus `authority` when any threshold on the command or
    /// its options is positive, plus `usage`/`timers` when a finite usage
    /// limit or a positive interval is reachable.
    #[must_use]
    pub fn user_fields_needed(&self) -> FieldSet<UserField> {
        let mut fields = self.user_fields.clone();
        fields.insert(UserField::Id);

        let per_user = self.config.max_usage.fixed().is_none()
            || self.config.min_interval.fixed().is_none();
        if self.config.authority > 0
            || self.options.iter().any(|o| o.config.authority > 0)
            || per_user
        {
            fields.insert(UserField::Authority);
        }
        if self.config.tracks_usage() {
            fields.insert(UserField::Usage);
            fields.insert(UserField::Timers);
        }
        fields
    }

    /// Group fields the dispatcher must load before running this command.
    #[must_use]
    pub fn group_fields_needed(&self) -> FieldSet<GroupField> {
        let mut fields = self.group_fields.clone();
        fields.insert(GroupField::Id);
        fields
    }

    pub(crate) fn add_option(&mut self, expr: &str, config: OptionConfig) -> Result<(), CommandError> {
        let decl = OptionDecl::parse(expr, config)?;
        for flag in &decl.flags {
            let dashed = flag.dashed();
            let taken = self
                .options
                .iter()
                .flat_map(|o| o.flags.iter())
                .any(|f| f.dashed() == dashed);
            if taken {
                return Err(CommandError::DuplicateOption {
                    flag: dashed,
                    command: self.name.clone(),
                });
            }
        }
        if self.option(&decl.name).is_some() {
            return Err(CommandError::DuplicateOption {
                flag: decl.name,
                command: self.name.clone(),
            });
        }
        self.options.push(decl);
        Ok(())
    }

    pub(crate) fn remove_option(&mut self, name: &str) -> bool {
        let before = self.options.len();
        self.options.retain(|o| o.name != name);
        self.options.len() < before
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("context", &self.context.identifier())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("config", &self.config)
            .field("has_action", &self.action.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_declarations, CommandConfigPatch};

    fn node() -> CommandNode {
        CommandNode::new(CommandId(0), "roll".into(), Context::all())
    }

    #[test]
    fn usage_line_lists_arguments() {
        let mut n = node();
        n.args = parse_declarations("<dice> [label:text]").unwrap();
        assert_eq!(n.usage_line(), "roll <dice> [label:text]");
    }

    #[test]
    fn duplicate_flags_rejected() {
        let mut n = node();
        n.add_option("-t, --times <n:integer>", OptionConfig::default())
            .unwrap();
        let err = n
            .add_option("-t, --target <who>", OptionConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::DuplicateOption {
                flag: "-t".into(),
                command: "roll".into(),
            }
        );
        assert_eq!(n.options().len(), 1);
    }

    #[test]
    fn remove_option_drops_every_flag() {
        let mut n = node();
        n.add_option("-t, --times <n:integer>", OptionConfig::default())
            .unwrap();
        assert!(n.remove_option("times"));
        assert!(!n.remove_option("times"));
        n.add_option("-t, --target <who>", OptionConfig::default())
            .unwrap();
    }

    #[test]
    fn field_requirements() {
        let mut n = node();
        CommandConfigPatch::new().authority(0).apply(&mut n.config);
        assert_eq!(n.user_fields_needed(), FieldSet::from([UserField::Id]));

        n.add_option("--force", OptionConfig::default().authority(4))
            .unwrap();
        assert!(n.user_fields_needed().contains(&UserField::Authority));
        assert!(!n.user_fields_needed().contains(&UserField::Usage));

        CommandConfigPatch::new().max_usage(3).apply(&mut n.config);
        let fields = n.user_fields_needed();
        assert!(fields.contains(&UserField::Usage));
        assert!(fields.contains(&UserField::Timers));
    }

    #[test]
    fn usage_name_defaults_to_command_name() {
        let mut n = node();
        assert_eq!(n.usage_name(), "roll");
        CommandConfigPatch::new().usage_name("dice").apply(&mut n.config);
        assert_eq!(n.usage_name(), "dice");
    }
}
