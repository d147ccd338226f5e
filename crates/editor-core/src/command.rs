use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::ColorPlugin;
use crate::document::TreeError;
use crate::link::LinkPlugin;
use crate::node::{Node, NodeKey};
use crate::plugin::CorePlugin;
use crate::state::EditorState;

pub const SELECTION_CHANGE_COMMAND: &str = "selection.change";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("invalid payload for {command}: {source}")]
    InvalidPayload {
        command: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("node transforms did not settle after {0} iterations")]
    TransformsDidNotConverge(usize),
}

impl CommandError {
    pub fn invalid_payload(command: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidPayload {
            command: command.into(),
            source,
        }
    }
}

/// Decodes a command payload, treating a missing payload as JSON `null`.
pub fn decode_payload<T: DeserializeOwned>(
    command: &str,
    args: Option<&Value>,
) -> Result<T, CommandError> {
    serde_json::from_value(args.cloned().unwrap_or(Value::Null))
        .map_err(|err| CommandError::invalid_payload(command, err))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Editor = 0,
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

pub type CommandHandler =
    Arc<dyn Fn(&mut EditorState, Option<&Value>) -> Result<bool, CommandError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub priority: Priority,
    pub handler: CommandHandler,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut EditorState, Option<&Value>) -> Result<bool, CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            priority: Priority::Editor,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

pub trait NodeTransform: Send + Sync {
    fn id(&self) -> &'static str;
    fn applies_to(&self, node: &Node) -> bool;
    fn run(&self, state: &mut EditorState, key: NodeKey) -> Result<(), TreeError>;
}

pub trait EditorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn node_transforms(&self) -> Vec<Box<dyn NodeTransform>> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugin_ids: HashSet<&'static str>,
    commands: Vec<CommandSpec>,
    node_transforms: Vec<Box<dyn NodeTransform>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugin_ids)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl PluginRegistry {
    pub fn new(plugins: impl IntoIterator<Item = Box<dyn EditorPlugin>>) -> Result<Self, String> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    pub fn core() -> Self {
        let mut registry = Self::default();
        registry.register_unique(Box::new(CorePlugin));
        registry
    }

    pub fn richtext() -> Self {
        let mut registry = Self::core();
        registry.register_unique(Box::new(ColorPlugin));
        registry.register_unique(Box::new(LinkPlugin));
        registry
    }

    fn register_unique(&mut self, plugin: Box<dyn EditorPlugin>) {
        if let Err(err) = self.register_plugin(plugin) {
            log::error!("built-in plugin rejected: {err}");
        }
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<(), String> {
        if !self.plugin_ids.insert(plugin.id()) {
            return Err(format!("Duplicate plugin id: {}", plugin.id()));
        }
        for command in plugin.commands() {
            self.register_command(command);
        }
        self.node_transforms.extend(plugin.node_transforms());
        Ok(())
    }

    /// Adds a handler. Several handlers may share one id; they run highest priority first.
    pub fn register_command(&mut self, command: CommandSpec) {
        let at = self
            .commands
            .iter()
            .position(|existing| existing.priority < command.priority)
            .unwrap_or(self.commands.len());
        self.commands.insert(at, command);
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn has_command(&self, id: &str) -> bool {
        self.commands.iter().any(|c| c.id == id)
    }

    pub fn node_transforms(&self) -> &[Box<dyn NodeTransform>] {
        &self.node_transforms
    }

    /// Runs the handlers registered for `id` until one claims the command.
    pub fn dispatch(
        &self,
        state: &mut EditorState,
        id: &str,
        args: Option<&Value>,
    ) -> Result<bool, CommandError> {
        let mut found = false;
        for command in self.commands.iter().filter(|c| c.id == id) {
            found = true;
            if (command.handler)(state, args)? {
                log::trace!("command {id} claimed at {:?}", command.priority);
                return Ok(true);
            }
        }
        if !found {
            return Err(CommandError::UnknownCommand(id.to_string()));
        }
        Ok(false)
    }
}
