//! Linear undo/redo over [`Command`]s.
//!
//! Unlike a branching history, committing after an undo discards everything that was undone.

use super::{Command, CommandConsumer, CommandError, DoUndo};
use crate::buffer::PixelBuffer;

#[derive(Clone, Debug, Default)]
pub struct CommandHistory {
    /// Applied commands, oldest first.
    done: Vec<Command>,
    /// Undone commands, most recently undone last.
    undone: Vec<Command>,
}
impl CommandHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Apply `command` to `buffer` and record it. Clears the redo stack.
    ///
    /// A command that fails to apply is not recorded, and the redo stack is kept.
    pub fn commit(&mut self, buffer: &mut PixelBuffer, command: Command) -> Result<(), CommandError> {
        buffer.apply(DoUndo::Do(&command))?;
        log::debug!("committed {:?}", command.label());
        self.done.push(command);
        self.undone.clear();
        Ok(())
    }
    pub fn undo(&mut self, buffer: &mut PixelBuffer) -> Result<(), CommandError> {
        let command = self.done.last().ok_or(CommandError::NothingToUndo)?;
        buffer.apply(DoUndo::Undo(command))?;
        // Checked above.
        if let Some(command) = self.done.pop() {
            log::debug!("undid {:?}", command.label());
            self.undone.push(command);
        }
        Ok(())
    }
    pub fn redo(&mut self, buffer: &mut PixelBuffer) -> Result<(), CommandError> {
        let command = self.undone.last().ok_or(CommandError::NothingToRedo)?;
        buffer.apply(DoUndo::Do(command))?;
        if let Some(command) = self.undone.pop() {
            log::debug!("redid {:?}", command.label());
            self.done.push(command);
        }
        Ok(())
    }
    /// Replace `buffer` with a copy of `original` and forget all history.
    pub fn reset(&mut self, buffer: &mut PixelBuffer, original: &PixelBuffer) {
        *buffer = original.clone_full();
        self.done.clear();
        self.undone.clear();
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.done.len()
    }
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.undone.len()
    }
    /// Labels of the applied commands, oldest first.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.done.iter().map(Command::label)
    }
    /// Applied commands, oldest first.
    #[must_use]
    pub fn done(&self) -> &[Command] {
        &self.done
    }
}
