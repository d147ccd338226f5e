use std::env;
use std::fs;

use anyhow::{Context as _, Result, anyhow};
use inferno_editor_core::{
    Editor, EditorConfig, EditorState, EditorValue, Point, PluginRegistry, RangeSelection,
};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_SCRIPT: &str = r#"{
  "document": {
    "root": {
      "type": "root",
      "children": [
        { "type": "element", "kind": "paragraph", "children": [
          { "type": "text", "text": "hello world, read the docs" }
        ]}
      ]
    }
  },
  "steps": [
    { "select": { "anchor": ["hello world, read the docs", 0], "focus": ["hello world, read the docs", 5] } },
    { "command": { "id": "color.apply", "args": { "colorId": "cl-brand", "type": "text" } } },
    { "select": { "anchor": [" world, read the docs", 17], "focus": [" world, read the docs", 21] } },
    { "command": { "id": "link.apply", "args": { "url": "https://docs.rs", "target": "_blank" } } }
  ]
}"#;

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    config: EditorConfig,
    document: EditorValue,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Select {
        anchor: (String, usize),
        focus: (String, usize),
    },
    Command {
        id: String,
        #[serde(default)]
        args: Option<Value>,
    },
    Undo,
    Redo,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let script = match env::args().nth(1) {
        Some(path) => {
            log::info!("loading script from {path}");
            fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?
        }
        None => DEFAULT_SCRIPT.to_string(),
    };
    let script: Script = serde_json::from_str(&script).context("failed to parse script")?;

    let doc = script
        .document
        .to_document()
        .context("document is not a valid tree")?;
    let mut editor = Editor::with_config(
        EditorState::new(doc),
        PluginRegistry::richtext(),
        script.config,
    );

    for (ix, step) in script.steps.into_iter().enumerate() {
        run_step(&mut editor, step).with_context(|| format!("step {ix} failed"))?;
    }

    println!("{}", editor.to_value().to_json_pretty()?);
    Ok(())
}

fn run_step(editor: &mut Editor, step: Step) -> Result<()> {
    match step {
        Step::Select { anchor, focus } => {
            let anchor = resolve(editor, &anchor)?;
            let focus = resolve(editor, &focus)?;
            editor.set_selection(RangeSelection::new(anchor, focus))?;
        }
        Step::Command { id, args } => {
            let claimed = editor.dispatch_command(&id, args)?;
            log::info!("{id}: {}", if claimed { "applied" } else { "nothing to do" });
        }
        Step::Undo => {
            if !editor.undo() {
                log::info!("nothing to undo");
            }
        }
        Step::Redo => {
            if !editor.redo() {
                log::info!("nothing to redo");
            }
        }
    }
    Ok(())
}

fn resolve(editor: &Editor, (text, offset): &(String, usize)) -> Result<Point> {
    let key = editor
        .doc()
        .find_text(text)
        .ok_or_else(|| anyhow!("no text node reads {text:?}"))?;
    Ok(Point::new(key, *offset))
}
