//! # Commands
//!
//! Commands are the only way the pixels of a [`Document`](crate::state::document::Document) are modified.
//! Each one records the pixels of a region both before and after the edit, so it can be applied and
//! reverted any number of times without re-running the tool that produced it.

pub mod history;

use crate::{
    buffer::PixelBuffer,
    util::{Point, Rect},
};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    #[error("command constructed for a state that does not match the current state")]
    MismatchedState,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

pub trait CommandConsumer<C> {
    /// Apply a single command. If this generates an error,
    /// the state of `self` should *not* be observably changed.
    fn apply(&mut self, command: DoUndo<'_, C>) -> Result<(), CommandError>;
}

/// A reversible edit: the contents of `region` before and after.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    label: String,
    region: Rect,
    before: PixelBuffer,
    after: PixelBuffer,
}
impl Command {
    /// Pair two snapshots of the same region.
    ///
    /// Returns `None` if the snapshots disagree in size or format with each other or the region,
    /// or if they are identical and the command would make no change.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        region: Rect,
        before: PixelBuffer,
        after: PixelBuffer,
    ) -> Option<Self> {
        let fits = |b: &PixelBuffer| b.width() == region.width && b.height() == region.height;
        if !fits(&before) || !fits(&after) || before.format() != after.format() || before == after {
            return None;
        }
        Some(Self {
            label: label.into(),
            region,
            before,
            after,
        })
    }
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
    #[must_use]
    pub fn region(&self) -> Rect {
        self.region
    }
    #[must_use]
    pub fn before(&self) -> &PixelBuffer {
        &self.before
    }
    #[must_use]
    pub fn after(&self) -> &PixelBuffer {
        &self.after
    }
}

#[derive(PartialEq, Eq)]
pub enum DoUndo<'c, T> {
    Do(&'c T),
    Undo(&'c T),
}
impl<'c, T> DoUndo<'c, T> {
    #[must_use]
    pub fn inner(&self) -> &'c T {
        match self {
            Self::Do(t) | Self::Undo(t) => t,
        }
    }
}

impl CommandConsumer<Command> for PixelBuffer {
    fn apply(&mut self, action: DoUndo<'_, Command>) -> Result<(), CommandError> {
        let command = action.inner();
        let forward = matches!(action, DoUndo::Do(_));
        let (expected, replacement) = match action {
            DoUndo::Do(c) => (&c.before, &c.after),
            DoUndo::Undo(c) => (&c.after, &c.before),
        };
        // The region must be fully in bounds and hold exactly the opposite snapshot.
        let current = self
            .extract(command.region)
            .filter(|(area, _)| *area == command.region)
            .map(|(_, pixels)| pixels);
        if current.as_ref() != Some(expected) {
            return Err(CommandError::MismatchedState);
        }
        log::trace!(
            "{} {:?} at {:?}",
            if forward { "applying" } else { "reverting" },
            command.label,
            command.region
        );
        self.copy_region(replacement, replacement.rect(), command.region.origin());
        Ok(())
    }
}

/// Snapshot `region` of `buffer`, let `edit` draw on it, and package the difference as a command.
///
/// `buffer` is left unchanged. Returns `None` if the region is entirely off-canvas or the
/// edit changed nothing.
pub(crate) fn capture(
    buffer: &PixelBuffer,
    region: Rect,
    label: impl Into<String>,
    edit: impl FnOnce(&mut PixelBuffer, Point),
) -> Option<Command> {
    let (region, before) = buffer.extract(region)?;
    let mut after = before.clone();
    // The edit works in buffer space, the scratch copy starts at `region.origin()`.
    edit(&mut after, region.origin());
    Command::new(label, region, before, after)
}

#[cfg(test)]
mod test {
    use super::{Command, CommandConsumer, CommandError, DoUndo};
    use crate::{
        buffer::{ChannelFormat, PixelBuffer},
        color::Color,
        util::Rect,
    };
    fn paint_command(buffer: &PixelBuffer, region: Rect, color: Color) -> Command {
        super::capture(buffer, region, "paint", |scratch, _| scratch.fill(color)).unwrap()
    }
    #[test]
    fn apply_then_revert_restores() {
        let mut buffer = PixelBuffer::create(6, 6, ChannelFormat::Rgba, Color::WHITE).unwrap();
        let original = buffer.clone();
        let command = paint_command(&buffer, Rect::new(1, 2, 3, 3), Color::BLACK);
        buffer.apply(DoUndo::Do(&command)).unwrap();
        assert_eq!(buffer.get(1, 2), Ok(Color::BLACK));
        assert_eq!(buffer.get(0, 0), Ok(Color::WHITE));
        buffer.apply(DoUndo::Undo(&command)).unwrap();
        assert_eq!(buffer, original);
    }
    #[test]
    fn mismatched_state_leaves_buffer() {
        let mut buffer = PixelBuffer::create(4, 4, ChannelFormat::Rgb, Color::WHITE).unwrap();
        let command = paint_command(&buffer, Rect::new(0, 0, 2, 2), Color::BLACK);
        // Reverting something never applied.
        let before = buffer.clone();
        assert_eq!(
            buffer.apply(DoUndo::Undo(&command)),
            Err(CommandError::MismatchedState)
        );
        assert_eq!(buffer, before);
        // Applying twice.
        buffer.apply(DoUndo::Do(&command)).unwrap();
        assert_eq!(
            buffer.apply(DoUndo::Do(&command)),
            Err(CommandError::MismatchedState)
        );
    }
    #[test]
    fn no_change_is_no_command() {
        let buffer = PixelBuffer::create(4, 4, ChannelFormat::Rgb, Color::WHITE).unwrap();
        assert!(super::capture(&buffer, buffer.rect(), "nothing", |_, _| ()).is_none());
        assert!(super::capture(&buffer, Rect::new(10, 10, 2, 2), "offscreen", |s, _| {
            s.fill(Color::BLACK);
        })
        .is_none());
    }
    #[test]
    fn region_is_clipped_on_capture() {
        let buffer = PixelBuffer::create(4, 4, ChannelFormat::Rgb, Color::WHITE).unwrap();
        let command = paint_command(&buffer, Rect::new(-2, 2, 4, 4), Color::BLACK);
        assert_eq!(command.region(), Rect::new(0, 2, 2, 2));
    }
}
