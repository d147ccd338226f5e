mod color;
mod command;
mod document;
mod editor;
mod link;
mod node;
mod plugin;
mod selection;
mod split;
mod state;
mod value;

pub use crate::color::*;
pub use crate::command::*;
pub use crate::document::*;
pub use crate::editor::*;
pub use crate::link::*;
pub use crate::node::*;
pub use crate::plugin::*;
pub use crate::selection::*;
pub use crate::split::*;
pub use crate::state::*;
pub use crate::value::*;
