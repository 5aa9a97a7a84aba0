//! Edit scripts: a list of tool uses and history actions, replayed onto a [`Document`].
//!
//! ```toml
//! [[step]]
//! tool = "line"
//! from = { x = 0, y = 0 }
//! to = { x = 10, y = 10 }
//! width = 2
//! color = "#FF0000"
//!
//! [[step]]
//! action = "undo"
//! ```

use zimage_core::{draw::Tool, Document};

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Undo,
    Redo,
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum Step {
    Tool(Tool),
    Action { action: Action },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub struct Script {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}
impl Script {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
    /// Apply every step in order. Stops at the first step that fails.
    pub fn run(&self, document: &mut Document) -> anyhow::Result<()> {
        use anyhow::Context;
        for (idx, step) in self.steps.iter().enumerate() {
            match step {
                Step::Tool(tool) => {
                    let changed = document
                        .apply_tool(tool)
                        .with_context(|| format!("step {idx}: {}", tool.label()))?;
                    if !changed {
                        log::warn!("step {idx}: {} changed nothing", tool.label());
                    }
                }
                Step::Action { action } => match action {
                    Action::Undo => document
                        .undo()
                        .with_context(|| format!("step {idx}: undo"))?,
                    Action::Redo => document
                        .redo()
                        .with_context(|| format!("step {idx}: redo"))?,
                    Action::Reset => document.reset(),
                },
            }
        }
        log::debug!(
            "script left {} edit(s): {:?}",
            document.history().undo_len(),
            document.history().labels().collect::<Vec<_>>()
        );
        Ok(())
    }
}
