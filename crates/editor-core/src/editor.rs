use serde::Deserialize;
use serde_json::Value;

use crate::color::{APPLY_COLOR_COMMAND, ColorPalette, color_args};
use crate::command::{CommandError, PluginRegistry, SELECTION_CHANGE_COMMAND};
use crate::document::{Document, TreeError};
use crate::link::{APPLY_LINK_COMMAND, LinkOptions, REMOVE_LINK_COMMAND, link_args};
use crate::node::ColorType;
use crate::selection::RangeSelection;
use crate::state::{EditorState, SelectionFacts};
use crate::value::EditorValue;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_transform_iterations: usize,
    pub palette: ColorPalette,
}

impl EditorConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_transform_iterations == 0 {
            self.max_transform_iterations = 100;
        }
        self
    }
}

pub struct Editor {
    state: EditorState,
    registry: PluginRegistry,
    config: EditorConfig,
    undo_stack: Vec<EditorState>,
    redo_stack: Vec<EditorState>,
}

impl Editor {
    pub fn new(state: EditorState, registry: PluginRegistry) -> Self {
        Self::with_config(state, registry, EditorConfig::default())
    }

    pub fn with_config(state: EditorState, registry: PluginRegistry, config: EditorConfig) -> Self {
        let mut editor = Self {
            state,
            registry,
            config: config.with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        editor.normalize_in_place();
        editor
    }

    pub fn with_core_plugins() -> Self {
        Self::new(EditorState::default(), PluginRegistry::core())
    }

    pub fn with_richtext_plugins() -> Self {
        Self::new(EditorState::default(), PluginRegistry::richtext())
    }

    pub fn from_value(value: &EditorValue, registry: PluginRegistry) -> Result<Self, TreeError> {
        let doc = Document::from_value(&value.root)?;
        Ok(Self::new(EditorState::new(doc), registry))
    }

    pub fn to_value(&self) -> EditorValue {
        EditorValue::from_document(&self.state.doc)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn doc(&self) -> &Document {
        &self.state.doc
    }

    pub fn selection(&self) -> Option<&RangeSelection> {
        self.state.selection.as_ref()
    }

    pub fn facts(&self) -> SelectionFacts {
        self.state.facts
    }

    pub fn version(&self) -> u64 {
        self.state.version
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.config.palette
    }

    pub fn current_color(&self) -> Option<(String, ColorType)> {
        crate::color::current_color(&self.state)
    }

    /// Moves the selection without recording history.
    pub fn set_selection(&mut self, selection: RangeSelection) -> Result<(), TreeError> {
        let before = self.state.selection.clone();
        self.state.set_selection(selection)?;
        if self.state.selection != before {
            self.track_selection();
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.state.selection.take().is_some() {
            self.track_selection();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let version = self.state.version + 1;
        let current = std::mem::replace(&mut self.state, previous);
        self.redo_stack.push(current);
        self.state.version = version;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let version = self.state.version + 1;
        let current = std::mem::replace(&mut self.state, next);
        self.undo_stack.push(current);
        self.state.version = version;
        true
    }

    /// Runs `f` as one transaction. An `Err` restores the state `f` started from.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut EditorState) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let snapshot = self.state.clone();
        match f(&mut self.state) {
            Ok(value) => {
                self.commit(snapshot)?;
                Ok(value)
            }
            Err(err) => {
                self.state = snapshot;
                Err(err)
            }
        }
    }

    /// Dispatches `id` in its own transaction. Unclaimed commands leave no trace.
    pub fn dispatch_command(
        &mut self,
        id: &str,
        args: Option<Value>,
    ) -> Result<bool, CommandError> {
        let snapshot = self.state.clone();
        match self.registry.dispatch(&mut self.state, id, args.as_ref()) {
            Ok(true) => {
                self.commit(snapshot)?;
                Ok(true)
            }
            Ok(false) => {
                log::debug!("command {id} was not claimed");
                self.state = snapshot;
                Ok(false)
            }
            Err(err) => {
                self.state = snapshot;
                Err(err)
            }
        }
    }

    pub fn apply_color(&mut self, color_id: &str, color_type: ColorType) -> bool {
        let args = color_args(color_id, color_type);
        self.run_bool_command(APPLY_COLOR_COMMAND, Some(args))
    }

    pub fn apply_link(&mut self, url: &str, options: LinkOptions) -> bool {
        let args = link_args(url, &options);
        self.run_bool_command(APPLY_LINK_COMMAND, Some(args))
    }

    pub fn remove_link(&mut self) -> bool {
        self.run_bool_command(REMOVE_LINK_COMMAND, None)
    }

    fn run_bool_command(&mut self, id: &str, args: Option<Value>) -> bool {
        match self.dispatch_command(id, args) {
            Ok(claimed) => claimed,
            Err(err) => {
                log::warn!("command {id} failed: {err}");
                false
            }
        }
    }

    fn commit(&mut self, snapshot: EditorState) -> Result<(), CommandError> {
        if let Err(err) = self.run_transforms() {
            self.state = snapshot;
            return Err(err);
        }
        self.repair_selection();
        let dropped = self.state.doc.collect_garbage();
        if dropped > 0 {
            log::trace!("collected {dropped} detached nodes");
        }

        self.state.version = snapshot.version + 1;
        let selection_changed = self.state.selection != snapshot.selection;
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();

        if selection_changed {
            self.track_selection();
        }
        Ok(())
    }

    fn run_transforms(&mut self) -> Result<(), CommandError> {
        let limit = self.config.max_transform_iterations;
        for _ in 0..limit {
            let dirty = self.state.doc.take_dirty();
            if dirty.is_empty() {
                return Ok(());
            }
            for key in dirty {
                for transform in self.registry.node_transforms() {
                    let applies = self.state.doc.is_attached(key)
                        && self
                            .state
                            .doc
                            .get(key)
                            .is_some_and(|node| transform.applies_to(node));
                    if applies {
                        transform.run(&mut self.state, key)?;
                    }
                }
            }
        }
        if self.state.doc.take_dirty().is_empty() {
            Ok(())
        } else {
            Err(CommandError::TransformsDidNotConverge(limit))
        }
    }

    fn repair_selection(&mut self) {
        let Some(sel) = self.state.selection.as_ref() else {
            return;
        };
        if !self.state.point_is_valid(&sel.anchor) || !self.state.point_is_valid(&sel.focus) {
            log::warn!(
                "dropping selection {}:{} .. {}:{}",
                sel.anchor.key,
                sel.anchor.offset,
                sel.focus.key,
                sel.focus.offset
            );
            self.state.selection = None;
        }
    }

    fn track_selection(&mut self) {
        if !self.registry.has_command(SELECTION_CHANGE_COMMAND) {
            return;
        }
        if let Err(err) = self
            .registry
            .dispatch(&mut self.state, SELECTION_CHANGE_COMMAND, None)
        {
            log::warn!("selection tracking failed: {err}");
        }
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.run_transforms() {
            log::warn!("initial normalization failed: {err}");
        }
        self.repair_selection();
        self.state.doc.collect_garbage();
        if self.state.selection.is_some() {
            self.track_selection();
        }
    }
}
