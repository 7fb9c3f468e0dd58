//! Command registry: owns the command tree.
//!
//! # Paths
//!
//! A registration path is walked left to right. `.` derives a child named
//! after the preceding command (`foo.bar` is a child of `foo`), `/` starts
//! a fresh name that still becomes a child of the preceding command
//! (`foo/baz` registers `baz` under `foo`).
//!
//! # Registration invariants
//!
//! - a new command's context is the calling context intersected with its
//!   parent's; a result that reaches no conversation is rejected
//! - adopting an existing parentless command requires the parent's context
//!   to contain the child's
//! - a command never changes parent once it has one
//!
//! The walk is planned before anything is written, so a rejected
//! registration leaves the tree untouched.

use crate::declaration::{parse_declarations, split_definition};
use crate::{
    CommandAction, CommandConfigPatch, CommandError, CommandId, CommandNode, OptionConfig,
    OptionValue,
};
use herald_event::Meta;
use herald_types::{Context, GroupField, UserField};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Called once for every command the registry creates.
pub type CommandObserver = Arc<dyn Fn(&CommandNode) + Send + Sync>;

/// A trigger phrase bound to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    /// Phrase that triggers the command.
    pub trigger: String,
    /// Target command.
    pub command: CommandId,
    /// Positional values prepended to any parsed ones.
    pub args: Vec<String>,
    /// Options applied before parsed ones.
    pub options: BTreeMap<String, OptionValue>,
    /// Trailing text after the trigger is parsed as arguments.
    pub fuzzy: bool,
    /// Only fires when the message carries a command prefix.
    pub prefix: bool,
}

/// Settings for [`CommandBuilder::shortcut`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutConfig {
    args: Vec<String>,
    options: BTreeMap<String, OptionValue>,
    fuzzy: bool,
    prefix: bool,
}

impl ShortcutConfig {
    /// Empty config: exact trigger, no presets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset positional values.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Preset option value.
    #[must_use]
    pub fn option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Accept trailing text.
    #[must_use]
    pub fn fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }

    /// Require a command prefix.
    #[must_use]
    pub fn prefix(mut self) -> Self {
        self.prefix = true;
        self
    }
}

/// A shortcut that matched a message.
#[derive(Debug, Clone, Copy)]
pub struct ShortcutMatch<'a> {
    /// The matching shortcut.
    pub shortcut: &'a Shortcut,
    /// Text after the trigger, empty unless the shortcut is fuzzy.
    pub rest: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Existing(CommandId),
    Planned(usize),
}

struct PlannedNode {
    name: String,
    parent: Option<Slot>,
    context: Context,
}

/// Splits `foo.bar/baz` into `[(None, "foo"), (Some('.'), "bar"), (Some('/'), "baz")]`.
fn path_segments(path: &str) -> Vec<(Option<char>, &str)> {
    let mut raw = Vec::new();
    let mut start = 0;
    for (i, c) in path.char_indices() {
        if (c == '.' || c == '/') && i > start {
            raw.push(&path[start..i]);
            start = i;
        }
    }
    if start < path.len() {
        raw.push(&path[start..]);
    }

    raw.into_iter()
        .map(|seg| match seg.chars().next() {
            Some(sep @ ('.' | '/')) => (Some(sep), &seg[1..]),
            _ => (None, seg),
        })
        .collect()
}

/// Process-wide command table.
#[derive(Default)]
pub struct CommandRegistry {
    nodes: Vec<CommandNode>,
    /// Lowercase names and aliases.
    names: HashMap<String, CommandId>,
    shortcuts: Vec<Shortcut>,
    observers: Vec<CommandObserver>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to command creation.
    pub fn on_new_command<F>(&mut self, f: F)
    where
        F: Fn(&CommandNode) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(f));
    }

    /// Registers `def` (`path decl...`) under `ctx` and returns a builder.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::register`].
    pub fn command(&mut self, ctx: &Context, def: &str) -> Result<CommandBuilder<'_>, CommandError> {
        self.command_with(ctx, def, CommandConfigPatch::default())
    }

    /// Like [`CommandRegistry::command`], merging `patch` into the config.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::register`].
    pub fn command_with(
        &mut self,
        ctx: &Context,
        def: &str,
        patch: CommandConfigPatch,
    ) -> Result<CommandBuilder<'_>, CommandError> {
        let id = self.register(ctx, def, patch)?;
        Ok(CommandBuilder { registry: self, id })
    }

    /// Walks the path of `def`, creating and linking commands, then merges
    /// `patch` into the terminal command's config.
    ///
    /// A non-empty declaration replaces the terminal command's arguments.
    ///
    /// # Errors
    ///
    /// - [`CommandError::EmptyName`] for an empty path or segment
    /// - [`CommandError::SelfParent`] when a segment repeats its parent
    /// - [`CommandError::InvalidSubcommand`] when a command would change parent
    /// - [`CommandError::ContextMismatch`] when adoption would widen a parent
    /// - [`CommandError::NoopContext`] when a new command reaches nobody
    /// - [`CommandError::InvalidDeclaration`] for a malformed declaration
    pub fn register(
        &mut self,
        ctx: &Context,
        def: &str,
        patch: CommandConfigPatch,
    ) -> Result<CommandId, CommandError> {
        let (path, decl_source) = split_definition(def);
        let args = parse_declarations(decl_source)?;

        let mut planned: Vec<PlannedNode> = Vec::new();
        let mut adoptions: Vec<(CommandId, Slot)> = Vec::new();
        let mut parent: Option<Slot> = None;

        for (sep, segment) in path_segments(path) {
            if segment.is_empty() {
                return Err(CommandError::EmptyName);
            }
            let name = match (sep, parent) {
                (Some('.'), Some(p)) => format!("{}.{segment}", self.slot_name(&planned, p)),
                _ => segment.to_string(),
            }
            .to_lowercase();

            let slot = if let Some(&id) = self.names.get(&name) {
                Slot::Existing(id)
            } else if let Some(pos) = planned.iter().position(|p| p.name == name) {
                Slot::Planned(pos)
            } else {
                let context = match parent {
                    Some(p) => ctx.intersect(self.slot_context(&planned, p)),
                    None => ctx.clone(),
                };
                if context.is_noop() {
                    return Err(CommandError::NoopContext(name));
                }
                planned.push(PlannedNode {
                    name,
                    parent,
                    context,
                });
                parent = Some(Slot::Planned(planned.len() - 1));
                continue;
            };

            if let Some(p) = parent {
                if p == slot {
                    return Err(CommandError::SelfParent(name));
                }
                let invalid = || CommandError::InvalidSubcommand {
                    child: name.clone(),
                    parent: self.slot_name(&planned, p).to_string(),
                };
                match slot {
                    // Already visited on this walk, so it cannot move now.
                    Slot::Planned(_) => return Err(invalid()),
                    Slot::Existing(id) => match self.slot_parent(&planned, &adoptions, slot) {
                        Some(current) if current == p => {}
                        Some(_) => return Err(invalid()),
                        None => {
                            if self.is_ancestor(&planned, &adoptions, id, p) {
                                return Err(invalid());
                            }
                            if !self.slot_context(&planned, p).contains(&self.nodes[id.0].context) {
                                return Err(CommandError::ContextMismatch {
                                    child: name,
                                    parent: self.slot_name(&planned, p).to_string(),
                                });
                            }
                            adoptions.push((id, p));
                        }
                    },
                }
            }
            parent = Some(slot);
        }

        let terminal = parent.ok_or(CommandError::EmptyName)?;

        // Nothing below can fail.
        let created: Vec<CommandId> = planned
            .iter()
            .map(|p| {
                let id = CommandId(self.nodes.len());
                self.nodes.push(CommandNode::new(id, p.name.clone(), p.context.clone()));
                self.names.insert(p.name.clone(), id);
                id
            })
            .collect();
        let resolve = |slot: Slot| match slot {
            Slot::Existing(id) => id,
            Slot::Planned(i) => created[i],
        };
        let links: Vec<(CommandId, CommandId)> = planned
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.parent.map(|ps| (created[i], resolve(ps))))
            .chain(adoptions.iter().map(|&(child, ps)| (child, resolve(ps))))
            .collect();
        for (child, parent) in links {
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.push(child);
        }

        let terminal = resolve(terminal);
        let node = &mut self.nodes[terminal.0];
        if !args.is_empty() {
            node.args = args;
        }
        patch.apply(&mut node.config);

        for id in created {
            let node = &self.nodes[id.0];
            tracing::debug!(
                command = %node.name,
                context = %node.context.identifier(),
                parent = ?node.parent.map(|p| self.nodes[p.0].name.as_str()),
                "command registered"
            );
            for observer in &self.observers {
                observer(node);
            }
        }

        Ok(terminal)
    }

    fn slot_name<'a>(&'a self, planned: &'a [PlannedNode], slot: Slot) -> &'a str {
        match slot {
            Slot::Existing(id) => &self.nodes[id.0].name,
            Slot::Planned(i) => &planned[i].name,
        }
    }

    fn slot_context<'a>(&'a self, planned: &'a [PlannedNode], slot: Slot) -> &'a Context {
        match slot {
            Slot::Existing(id) => &self.nodes[id.0].context,
            Slot::Planned(i) => &planned[i].context,
        }
    }

    fn slot_parent(
        &self,
        planned: &[PlannedNode],
        adoptions: &[(CommandId, Slot)],
        slot: Slot,
    ) -> Option<Slot> {
        match slot {
            Slot::Planned(i) => planned[i].parent,
            Slot::Existing(id) => adoptions
                .iter()
                .find(|(child, _)| *child == id)
                .map(|&(_, p)| p)
                .or_else(|| self.nodes[id.0].parent.map(Slot::Existing)),
        }
    }

    /// Returns `true` if `candidate` is `from` or one of its ancestors.
    fn is_ancestor(
        &self,
        planned: &[PlannedNode],
        adoptions: &[(CommandId, Slot)],
        candidate: CommandId,
        from: Slot,
    ) -> bool {
        let mut cursor = Some(from);
        while let Some(slot) = cursor {
            if slot == Slot::Existing(candidate) {
                return true;
            }
            cursor = self.slot_parent(planned, adoptions, slot);
        }
        false
    }

    /// Command by id.
    #[must_use]
    pub fn get(&self, id: CommandId) -> Option<&CommandNode> {
        self.nodes.get(id.0)
    }

    fn get_mut(&mut self, id: CommandId) -> Result<&mut CommandNode, CommandError> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| CommandError::UnknownCommand(format!("#{}", id.0)))
    }

    /// Command by exact name or alias, case-insensitive.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CommandNode> {
        let id = self.names.get(&name.to_lowercase())?;
        self.get(*id)
    }

    /// Command by invocation path.
    ///
    /// Exact names and aliases win. Otherwise the path is walked segment by
    /// segment, each step accepting either the dotted or the plain name of a
    /// child of the previous command, so `foo/bar` reaches `foo.bar`.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&CommandNode> {
        if let Some(node) = self.find(path) {
            return Some(node);
        }

        let path = path.to_lowercase();
        let mut current: Option<&CommandNode> = None;
        for (sep, segment) in path_segments(&path) {
            if segment.is_empty() {
                return None;
            }
            let next = match current {
                None => self.find(segment)?,
                Some(parent) => {
                    let dotted = format!("{}.{segment}", parent.name);
                    let candidates = match sep {
                        Some('/') => [segment.to_string(), dotted],
                        _ => [dotted, segment.to_string()],
                    };
                    candidates
                        .iter()
                        .filter_map(|name| self.names.get(name))
                        .filter_map(|id| self.get(*id))
                        .find(|node| node.parent == Some(parent.id))?
                }
            };
            current = Some(next);
        }
        current
    }

    /// Command by invocation path, if reachable from `meta` and not disabled.
    #[must_use]
    pub fn resolve(&self, path: &str, meta: &Meta) -> Option<&CommandNode> {
        self.lookup(path).filter(|node| Self::reachable(node, meta))
    }

    /// Command by id, if reachable from `meta` and not disabled.
    #[must_use]
    pub fn resolve_id(&self, id: CommandId, meta: &Meta) -> Option<&CommandNode> {
        self.get(id).filter(|node| Self::reachable(node, meta))
    }

    fn reachable(node: &CommandNode, meta: &Meta) -> bool {
        node.context.matches(meta.conversation) && !node.config.is_disabled(meta)
    }

    /// Binds an alias.
    ///
    /// # Errors
    ///
    /// [`CommandError::DuplicateAlias`] when the name belongs to another
    /// command, [`CommandError::EmptyName`] for an empty alias.
    pub fn add_alias(&mut self, id: CommandId, alias: &str) -> Result<(), CommandError> {
        let alias = alias.trim().to_lowercase();
        if alias.is_empty() {
            return Err(CommandError::EmptyName);
        }
        match self.names.get(&alias) {
            Some(&owner) if owner == id => Ok(()),
            Some(_) => Err(CommandError::DuplicateAlias(alias)),
            None => {
                self.get_mut(id)?.aliases.push(alias.clone());
                self.names.insert(alias, id);
                Ok(())
            }
        }
    }

    /// Unbinds an alias. The command's own name cannot be removed.
    pub fn remove_alias(&mut self, id: CommandId, alias: &str) -> bool {
        let alias = alias.to_lowercase();
        let Ok(node) = self.get_mut(id) else {
            return false;
        };
        let before = node.aliases.len();
        node.aliases.retain(|a| *a != alias);
        if node.aliases.len() == before {
            return false;
        }
        self.names.remove(&alias);
        true
    }

    /// Declares an option from a flag expression.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidOption`] or [`CommandError::DuplicateOption`].
    pub fn add_option(
        &mut self,
        id: CommandId,
        expr: &str,
        config: OptionConfig,
    ) -> Result<(), CommandError> {
        self.get_mut(id)?.add_option(expr, config)
    }

    /// Removes an option and every flag bound to it.
    pub fn remove_option(&mut self, id: CommandId, name: &str) -> bool {
        self.get_mut(id).is_ok_and(|node| node.remove_option(name))
    }

    /// Binds the action.
    ///
    /// # Errors
    ///
    /// [`CommandError::UnknownCommand`] for a foreign id.
    pub fn set_action(&mut self, id: CommandId, action: Arc<dyn CommandAction>) -> Result<(), CommandError> {
        self.get_mut(id)?.action = Some(action);
        Ok(())
    }

    /// Adds a shortcut.
    ///
    /// # Errors
    ///
    /// [`CommandError::UnknownCommand`] for a foreign id,
    /// [`CommandError::EmptyName`] for an empty trigger.
    pub fn add_shortcut(
        &mut self,
        id: CommandId,
        trigger: &str,
        config: ShortcutConfig,
    ) -> Result<(), CommandError> {
        self.get_mut(id)?;
        let trigger = trigger.trim();
        if trigger.is_empty() {
            return Err(CommandError::EmptyName);
        }
        self.shortcuts.push(Shortcut {
            trigger: trigger.to_string(),
            command: id,
            args: config.args,
            options: config.options,
            fuzzy: config.fuzzy,
            prefix: config.prefix,
        });
        Ok(())
    }

    /// First shortcut matching `text`, in registration order.
    ///
    /// `prefixed` tells whether the message carried a command prefix (already
    /// stripped from `text`).
    #[must_use]
    pub fn match_shortcut<'a>(&'a self, text: &'a str, prefixed: bool) -> Option<ShortcutMatch<'a>> {
        let text = text.trim();
        self.shortcuts
            .iter()
            .filter(|s| prefixed || !s.prefix)
            .find_map(|shortcut| {
                if text == shortcut.trigger {
                    return Some(ShortcutMatch { shortcut, rest: "" });
                }
                if !shortcut.fuzzy {
                    return None;
                }
                let rest = text.strip_prefix(shortcut.trigger.as_str())?;
                let boundary = rest.starts_with(char::is_whitespace)
                    || !shortcut.trigger.ends_with(char::is_alphanumeric);
                boundary.then(|| ShortcutMatch {
                    shortcut,
                    rest: rest.trim_start(),
                })
            })
    }

    /// Every command, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandNode> {
        self.nodes.iter()
    }

    /// Commands reachable from `meta`, in creation order.
    pub fn visible_to<'a>(&'a self, meta: &'a Meta) -> impl Iterator<Item = &'a CommandNode> + 'a {
        self.nodes.iter().filter(move |node| Self::reachable(node, meta))
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Fluent access to one registered command.
pub struct CommandBuilder<'r> {
    registry: &'r mut CommandRegistry,
    id: CommandId,
}

impl<'r> CommandBuilder<'r> {
    /// The command being configured.
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Current state of the command.
    #[must_use]
    pub fn node(&self) -> &CommandNode {
        &self.registry.nodes[self.id.0]
    }

    fn node_mut(&mut self) -> &mut CommandNode {
        &mut self.registry.nodes[self.id.0]
    }

    /// Adds an alias.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::add_alias`].
    pub fn alias(self, alias: &str) -> Result<Self, CommandError> {
        self.registry.add_alias(self.id, alias)?;
        Ok(self)
    }

    /// Removes an alias.
    pub fn remove_alias(self, alias: &str) -> Self {
        self.registry.remove_alias(self.id, alias);
        self
    }

    /// Declares an option.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::add_option`].
    pub fn option(mut self, expr: &str, config: OptionConfig) -> Result<Self, CommandError> {
        self.node_mut().add_option(expr, config)?;
        Ok(self)
    }

    /// Removes an option by canonical name.
    pub fn remove_option(mut self, name: &str) -> Self {
        self.node_mut().remove_option(name);
        self
    }

    /// Binds the action.
    pub fn action<A>(mut self, action: A) -> Self
    where
        A: CommandAction + 'static,
    {
        self.node_mut().action = Some(Arc::new(action));
        self
    }

    /// Requests extra user fields.
    pub fn user_fields(mut self, fields: impl IntoIterator<Item = UserField>) -> Self {
        self.node_mut().user_fields.extend(fields);
        self
    }

    /// Requests extra group fields.
    pub fn group_fields(mut self, fields: impl IntoIterator<Item = GroupField>) -> Self {
        self.node_mut().group_fields.extend(fields);
        self
    }

    /// Sets the help text.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.node_mut().description = text.into();
        self
    }

    /// Merges a config patch.
    pub fn config(mut self, patch: CommandConfigPatch) -> Self {
        patch.apply(&mut self.node_mut().config);
        self
    }

    /// Adds a shortcut.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::add_shortcut`].
    pub fn shortcut(self, trigger: &str, config: ShortcutConfig) -> Result<Self, CommandError> {
        self.registry.add_shortcut(self.id, trigger, config)?;
        Ok(self)
    }

    /// Registers a subcommand under this command's context.
    ///
    /// `.name` derives `parent.name`; anything else becomes `parent/name`.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::register`].
    pub fn subcommand(self, def: &str) -> Result<CommandBuilder<'r>, CommandError> {
        self.subcommand_with(def, CommandConfigPatch::default())
    }

    /// Like [`CommandBuilder::subcommand`], merging `patch`.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::register`].
    pub fn subcommand_with(
        self,
        def: &str,
        patch: CommandConfigPatch,
    ) -> Result<CommandBuilder<'r>, CommandError> {
        let node = self.node();
        let (path, decls) = split_definition(def);
        let full = if path.starts_with('.') {
            format!("{}{path} {decls}", node.name)
        } else {
            format!("{}/{path} {decls}", node.name)
        };
        let context = node.context.clone();
        let registry = self.registry;
        registry.command_with(&context, &full, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Flow, Invocation};
    use herald_types::{Identity, IdentityKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn group(ids: &[u64]) -> Context {
        Context::only(IdentityKind::Group, ids.iter().copied())
    }

    #[test]
    fn segments_split_on_separators() {
        assert_eq!(
            path_segments("foo.bar/baz"),
            [(None, "foo"), (Some('.'), "bar"), (Some('/'), "baz")]
        );
        assert_eq!(path_segments("/foo"), [(Some('/'), "foo")]);
        assert_eq!(path_segments("a..b"), [(None, "a"), (Some('.'), ""), (Some('.'), "b")]);
        assert!(path_segments("").is_empty());
    }

    #[test]
    fn dotted_path_creates_parent_and_child() {
        let mut reg = CommandRegistry::new();
        let id = reg.register(&Context::all(), "Foo.Bar", CommandConfigPatch::new()).unwrap();

        let child = reg.get(id).unwrap();
        assert_eq!(child.name(), "foo.bar");
        let parent = reg.get(child.parent().unwrap()).unwrap();
        assert_eq!(parent.name(), "foo");
        assert_eq!(parent.children(), [id]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn slash_path_uses_plain_name() {
        let mut reg = CommandRegistry::new();
        let id = reg.register(&Context::all(), "tools/dice", CommandConfigPatch::new()).unwrap();
        let node = reg.get(id).unwrap();
        assert_eq!(node.name(), "dice");
        assert_eq!(reg.get(node.parent().unwrap()).unwrap().name(), "tools");
    }

    #[test]
    fn child_context_is_intersected() {
        let mut reg = CommandRegistry::new();
        reg.register(&group(&[100, 200]), "foo", CommandConfigPatch::new()).unwrap();
        let id = reg
            .register(&group(&[200, 300]), "foo.bar", CommandConfigPatch::new())
            .unwrap();
        assert_eq!(reg.get(id).unwrap().context(), &group(&[200]));
    }

    #[test]
    fn noop_context_rejected() {
        let mut reg = CommandRegistry::new();
        reg.register(&group(&[100]), "foo", CommandConfigPatch::new()).unwrap();
        let err = reg
            .register(&group(&[200]), "foo.bar", CommandConfigPatch::new())
            .unwrap_err();
        assert_eq!(err, CommandError::NoopContext("foo.bar".into()));
        assert!(reg.find("foo.bar").is_none());

        assert_eq!(
            reg.register(&Context::noop(), "lonely", CommandConfigPatch::new()),
            Err(CommandError::NoopContext("lonely".into()))
        );
    }

    #[test]
    fn context_violation_leaves_tree_untouched() {
        let mut reg = CommandRegistry::new();
        reg.register(&group(&[100]), "narrow", CommandConfigPatch::new()).unwrap();
        reg.register(&Context::all(), "wide", CommandConfigPatch::new()).unwrap();

        // `fresh` would be created under `narrow` before `wide` is adopted.
        let err = reg
            .register(&group(&[100]), "narrow/fresh/wide", CommandConfigPatch::new())
            .unwrap_err();
        assert!(matches!(err, CommandError::ContextMismatch { .. }));
        assert_eq!(reg.len(), 2);
        assert!(reg.find("fresh").is_none());
        assert!(reg.find("narrow").unwrap().children().is_empty());
    }

    #[test]
    fn adoption_of_parentless_command() {
        let mut reg = CommandRegistry::new();
        let bar = reg.register(&group(&[100]), "bar", CommandConfigPatch::new()).unwrap();
        reg.register(&Context::all(), "foo", CommandConfigPatch::new()).unwrap();
        reg.register(&Context::all(), "foo/bar", CommandConfigPatch::new()).unwrap();

        let foo = reg.find("foo").unwrap();
        assert_eq!(foo.children(), [bar]);
        assert_eq!(reg.get(bar).unwrap().parent(), Some(foo.id()));

        // Same path again is a no-op.
        reg.register(&Context::all(), "foo/bar", CommandConfigPatch::new()).unwrap();
        assert_eq!(reg.find("foo").unwrap().children().len(), 1);
    }

    #[test]
    fn reparenting_and_cycles_rejected() {
        let mut reg = CommandRegistry::new();
        reg.register(&Context::all(), "a/b", CommandConfigPatch::new()).unwrap();
        reg.register(&Context::all(), "c", CommandConfigPatch::new()).unwrap();

        assert!(matches!(
            reg.register(&Context::all(), "c/b", CommandConfigPatch::new()),
            Err(CommandError::InvalidSubcommand { .. })
        ));
        assert!(matches!(
            reg.register(&Context::all(), "b/a", CommandConfigPatch::new()),
            Err(CommandError::InvalidSubcommand { .. })
        ));
        assert_eq!(
            reg.register(&Context::all(), "c/c", CommandConfigPatch::new()),
            Err(CommandError::SelfParent("c".into()))
        );
        assert!(reg.find("c").unwrap().children().is_empty());
    }

    #[test]
    fn empty_names_rejected() {
        let mut reg = CommandRegistry::new();
        for def in ["", "   ", "foo..bar", "foo/"] {
            assert!(
                matches!(
                    reg.register(&Context::all(), def, CommandConfigPatch::new()),
                    Err(CommandError::EmptyName)
                ),
                "{def:?}"
            );
        }
        assert!(reg.is_empty());
    }

    #[test]
    fn declaration_and_config_merge() {
        let mut reg = CommandRegistry::new();
        let id = reg
            .register(
                &Context::all(),
                "roll <dice> [times]",
                CommandConfigPatch::new().authority(2).max_usage(5),
            )
            .unwrap();
        reg.register(&Context::all(), "roll", CommandConfigPatch::new().max_usage(9))
            .unwrap();

        let node = reg.get(id).unwrap();
        assert_eq!(node.args().len(), 2);
        assert_eq!(node.config().authority, 2);
        assert_eq!(node.config().max_usage.fixed(), Some(&Some(9)));
    }

    #[test]
    fn aliases() {
        let mut reg = CommandRegistry::new();
        let echo = reg
            .command(&Context::all(), "echo")
            .unwrap()
            .alias("Say")
            .unwrap()
            .id();
        let other = reg.register(&Context::all(), "other", CommandConfigPatch::new()).unwrap();

        assert_eq!(reg.find("say").unwrap().id(), echo);
        assert_eq!(reg.add_alias(echo, "say"), Ok(()));
        assert_eq!(
            reg.add_alias(other, "SAY"),
            Err(CommandError::DuplicateAlias("say".into()))
        );
        assert_eq!(
            reg.add_alias(other, "echo"),
            Err(CommandError::DuplicateAlias("echo".into()))
        );

        assert!(reg.remove_alias(echo, "say"));
        assert!(!reg.remove_alias(echo, "echo"));
        assert!(reg.find("say").is_none());
        reg.add_alias(other, "say").unwrap();
    }

    #[test]
    fn lookup_accepts_either_separator() {
        let mut reg = CommandRegistry::new();
        reg.register(&Context::all(), "foo.bar", CommandConfigPatch::new()).unwrap();
        reg.register(&Context::all(), "foo/baz", CommandConfigPatch::new()).unwrap();

        assert_eq!(reg.lookup("foo.bar").unwrap().name(), "foo.bar");
        assert_eq!(reg.lookup("foo/bar").unwrap().name(), "foo.bar");
        assert_eq!(reg.lookup("FOO.baz").unwrap().name(), "baz");
        assert!(reg.lookup("bar").is_none());
        assert!(reg.lookup("baz/foo").is_none());
    }

    #[test]
    fn resolve_checks_context_and_disable() {
        let mut reg = CommandRegistry::new();
        reg.register(&group(&[100]), "foo", CommandConfigPatch::new()).unwrap();
        reg.register(
            &Context::all(),
            "foo.bar",
            CommandConfigPatch::new().disable(|meta| meta.user_id == Some(13)),
        )
        .unwrap();

        let from_100 = Meta::group_message(100, 1, "foo/bar");
        assert_eq!(reg.resolve("foo/bar", &from_100).unwrap().name(), "foo.bar");
        assert!(reg.resolve("foo/bar", &Meta::group_message(200, 1, "")).is_none());
        assert!(reg.resolve("foo/bar", &Meta::group_message(100, 13, "")).is_none());
        assert!(reg.resolve("foo", &Meta::private_message(100, "")).is_none());
    }

    #[test]
    fn builder_chain() {
        let mut reg = CommandRegistry::new();
        let builder = reg
            .command(&group(&[1]), "dice <expr>")
            .unwrap()
            .description("roll dice")
            .option("-t, --times <n:integer>", OptionConfig::default())
            .unwrap()
            .user_fields([UserField::Name])
            .action(|_inv: Invocation| async { anyhow::Ok(Flow::Handled) });
        let node = builder.node();
        assert_eq!(node.description(), "roll dice");
        assert!(node.option("times").is_some());
        assert!(node.action().is_some());
        assert!(node.user_fields_needed().contains(&UserField::Name));

        let sub = builder.subcommand(".stats").unwrap();
        assert_eq!(sub.node().name(), "dice.stats");
        assert_eq!(sub.node().context(), &group(&[1]));
        let sub_id = sub.id();

        let plain = reg
            .command(&group(&[1]), "dice")
            .unwrap()
            .subcommand("history [n]")
            .unwrap();
        assert_eq!(plain.node().name(), "history");
        assert_eq!(plain.node().args().len(), 1);

        let dice = reg.find("dice").unwrap();
        assert_eq!(dice.children().len(), 2);
        assert_eq!(dice.children()[0], sub_id);
    }

    #[test]
    fn observers_see_each_created_command() {
        let mut reg = CommandRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        reg.on_new_command(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        reg.register(&Context::all(), "a.b.c", CommandConfigPatch::new()).unwrap();
        reg.register(&Context::all(), "a.b", CommandConfigPatch::new()).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn shortcuts() {
        let mut reg = CommandRegistry::new();
        let id = reg.register(&Context::all(), "weather <city>", CommandConfigPatch::new()).unwrap();
        reg.add_shortcut(id, "weather in", ShortcutConfig::new().fuzzy()).unwrap();
        reg.add_shortcut(id, "rain?", ShortcutConfig::new().args(["here"]).prefix())
            .unwrap();

        let hit = reg.match_shortcut("weather in Paris", false).unwrap();
        assert_eq!(hit.shortcut.command, id);
        assert_eq!(hit.rest, "Paris");
        assert!(reg.match_shortcut("weather inParis", false).is_none());

        assert!(reg.match_shortcut("rain?", false).is_none());
        let hit = reg.match_shortcut("rain?", true).unwrap();
        assert_eq!(hit.shortcut.args, ["here"]);
        assert_eq!(hit.rest, "");

        assert_eq!(
            reg.add_shortcut(id, "  ", ShortcutConfig::new()),
            Err(CommandError::EmptyName)
        );
    }

    #[test]
    fn visible_commands() {
        let mut reg = CommandRegistry::new();
        reg.register(&group(&[1]), "a", CommandConfigPatch::new()).unwrap();
        reg.register(&Context::all(), "b", CommandConfigPatch::new()).unwrap();

        let meta = Meta::message(Identity::group(2), 5, "");
        let names: Vec<_> = reg.visible_to(&meta).map(CommandNode::name).collect();
        assert_eq!(names, ["b"]);
    }
}
