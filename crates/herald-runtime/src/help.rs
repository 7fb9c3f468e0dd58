//! Built-in `help` command.

use herald_command::{CommandConfigPatch, CommandError, CommandNode, CommandRegistry, Flow, Invocation};
use herald_event::Meta;
use herald_types::Context;
use parking_lot::RwLock;
use std::fmt::Write as _;
use std::sync::{Arc, Weak};

/// Registers `help [command]` on `registry`.
///
/// The action holds a weak handle so the registry does not keep itself alive.
pub(crate) fn register(registry: &Arc<RwLock<CommandRegistry>>) -> Result<(), CommandError> {
    let handle: Weak<RwLock<CommandRegistry>> = Arc::downgrade(registry);
    registry
        .write()
        .command_with(
            &Context::all(),
            "help [command]",
            CommandConfigPatch::new().authority(0),
        )?
        .description("show available commands or one command's usage")
        .action(move |inv: Invocation| {
            let handle = Weak::clone(&handle);
            async move {
                let Some(registry) = handle.upgrade() else {
                    return anyhow::Ok(Flow::Next);
                };
                let text = render(&registry, inv.arg(0), &inv.meta);
                inv.reply(text).await?;
                Ok(Flow::Handled)
            }
        });
    Ok(())
}

fn render(registry: &RwLock<CommandRegistry>, topic: Option<&str>, meta: &Meta) -> String {
    let commands = registry.read();
    match topic {
        Some(name) => match commands.resolve(name, meta) {
            Some(node) => describe(&commands, node, meta),
            None => format!("no such command: {name}"),
        },
        None => overview(&commands, meta),
    }
}

fn overview(commands: &CommandRegistry, meta: &Meta) -> String {
    let mut out = String::from("Available commands:");
    for node in commands.visible_to(meta).filter(|n| n.parent().is_none()) {
        push_entry(&mut out, node);
    }
    out.push_str("\nSend \"help <command>\" for details.");
    out
}

fn describe(commands: &CommandRegistry, node: &CommandNode, meta: &Meta) -> String {
    let mut out = node.usage_line();
    if !node.description().is_empty() {
        let _ = write!(out, "\n{}", node.description());
    }
    if !node.aliases().is_empty() {
        let _ = write!(out, "\nAliases: {}", node.aliases().join(", "));
    }

    let options: Vec<_> = node.options().iter().filter(|o| !o.config.hidden).collect();
    if !options.is_empty() {
        out.push_str("\nOptions:");
        for option in options {
            let _ = write!(out, "\n  {option}");
        }
    }

    let children: Vec<_> = node
        .children()
        .iter()
        .filter_map(|id| commands.resolve_id(*id, meta))
        .collect();
    if !children.is_empty() {
        out.push_str("\nSubcommands:");
        for child in children {
            push_entry(&mut out, child);
        }
    }
    out
}

fn push_entry(out: &mut String, node: &CommandNode) {
    if node.description().is_empty() {
        let _ = write!(out, "\n  {}", node.name());
    } else {
        let _ = write!(out, "\n  {}  {}", node.name(), node.description());
    }
}
