//! Named commands typed as `/name args`.
//!
//! Handlers are plain function pointers over a context type `C`, so the
//! registry can live inside the context it operates on: callers copy the
//! handler out, drop the borrow and then call it with `&mut C`.

use crate::model::error::CommandError;
use std::collections::BTreeMap;
use tracing::debug;

/// Runs a command with the raw argument string.
pub type CommandHandler<C> = fn(&mut C, &str) -> Result<(), CommandError>;

/// Proposes completions for the argument being typed.
pub type CompletionFn<C> = fn(&C, &str) -> Vec<String>;

/// A registered command.
pub struct Command<C> {
    name: String,
    handler: CommandHandler<C>,
    usage: String,
    short_help: String,
    help: String,
    completion: Option<CompletionFn<C>>,
}

impl<C> Clone for Command<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: self.handler,
            usage: self.usage.clone(),
            short_help: self.short_help.clone(),
            help: self.help.clone(),
            completion: self.completion,
        }
    }
}

impl<C> std::fmt::Debug for Command<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("short_help", &self.short_help)
            .finish_non_exhaustive()
    }
}

impl<C> Command<C> {
    /// Command `name` running `handler`.
    pub fn new(name: impl Into<String>, handler: CommandHandler<C>) -> Self {
        Self {
            name: name.into(),
            handler,
            usage: String::new(),
            short_help: String::new(),
            help: String::new(),
            completion: None,
        }
    }

    /// Set the argument synopsis.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Set the one-line help.
    pub fn short_help(mut self, short_help: impl Into<String>) -> Self {
        self.short_help = short_help.into();
        self
    }

    /// Set the detailed help.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set the argument completion.
    pub fn completion(mut self, completion: CompletionFn<C>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Name the command is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function run by the command.
    pub fn handler(&self) -> CommandHandler<C> {
        self.handler
    }

    /// Argument synopsis.
    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    /// One-line help.
    pub fn short_help_text(&self) -> &str {
        &self.short_help
    }

    /// Full help, falling back to the short help when none was given.
    pub fn help_text(&self) -> &str {
        if self.help.is_empty() {
            &self.short_help
        } else {
            &self.help
        }
    }

    /// Usage error for this command.
    pub fn usage_error(&self) -> CommandError {
        CommandError::Usage {
            name: self.name.clone(),
            usage: self.usage.clone(),
        }
    }
}

/// Split `/name args` into its name and argument string.
///
/// Returns `None` for text that is not a command, including `//text`
/// which stands for a literal message starting with `/`.
pub fn parse_command_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('/')?;
    if rest.starts_with('/') {
        return None;
    }
    match rest.split_once(' ') {
        Some((name, args)) => Some((name, args.trim_start())),
        None => Some((rest, "")),
    }
}

/// Map of command names (and their aliases) to commands.
pub struct CommandRegistry<C> {
    commands: BTreeMap<String, Command<C>>,
    aliases: BTreeMap<String, String>,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            commands: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }
}

impl<C> std::fmt::Debug for CommandRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl<C> CommandRegistry<C> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. A name already taken is left untouched and
    /// `false` is returned.
    pub fn register(&mut self, command: Command<C>) -> bool {
        if self.commands.contains_key(command.name()) || self.aliases.contains_key(command.name()) {
            debug!(name = command.name(), "Command already registered, ignoring");
            return false;
        }
        self.commands.insert(command.name().to_string(), command);
        true
    }

    /// Remove a command and its alias.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.aliases.retain(|_, target| target != name);
        self.commands.remove(name).is_some()
    }

    /// Give `target` a second name. A command carries at most one alias.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<(), CommandError> {
        if !self.commands.contains_key(target) {
            return Err(CommandError::Unknown(target.to_string()));
        }
        if self.alias_of(target).is_some() {
            return Err(CommandError::AliasTaken {
                alias: alias.to_string(),
                target: target.to_string(),
            });
        }
        if self.commands.contains_key(alias) || self.aliases.contains_key(alias) {
            return Err(CommandError::Failed(format!(
                "/{alias} is already a command"
            )));
        }
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    /// Alias of `target`, if it has one.
    pub fn alias_of(&self, target: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, t)| t.as_str() == target)
            .map(|(alias, _)| alias.as_str())
    }

    /// Look up a command by name or alias.
    pub fn resolve(&self, name: &str) -> Option<&Command<C>> {
        let name = self.aliases.get(name).map_or(name, String::as_str);
        self.commands.get(name)
    }

    /// Handler for `name`, copied out so the caller can release the registry.
    pub fn handler_for(&self, name: &str) -> Result<CommandHandler<C>, CommandError> {
        self.resolve(name)
            .map(Command::handler)
            .ok_or_else(|| CommandError::Unknown(name.to_string()))
    }

    /// Whether `name` is a command or an alias.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Command names, sorted, without aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Names and aliases starting with `prefix`, sorted.
    pub fn complete_name(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .keys()
            .chain(self.aliases.keys())
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Completions for a partially typed `/command args` line.
    pub fn complete(&self, ctx: &C, line: &str) -> Vec<String> {
        let Some(rest) = line.strip_prefix('/') else {
            return Vec::new();
        };
        match rest.split_once(' ') {
            None => self
                .complete_name(rest)
                .into_iter()
                .map(|n| format!("/{n}"))
                .collect(),
            Some((name, args)) => match self.resolve(name).and_then(|c| c.completion) {
                Some(completion) => completion(ctx, args),
                None => Vec::new(),
            },
        }
    }

    /// `"Usage: /name usage\n"` followed by the full help.
    pub fn help_for(&self, name: &str) -> Result<String, CommandError> {
        let command = self
            .resolve(name)
            .ok_or_else(|| CommandError::Unknown(name.to_string()))?;
        Ok(format!(
            "Usage: /{} {}\n{}",
            command.name(),
            command.usage_text(),
            command.help_text()
        ))
    }

    /// One line per command with its short help.
    pub fn help_summary(&self) -> String {
        let mut out = String::from("Available commands:");
        for command in self.commands.values() {
            out.push_str(&format!("\n/{}: {}", command.name(), command.short_help_text()));
        }
        out.push_str("\nType /help <command_name> to know what each command does");
        out
    }
}
