use crate::{
    buffer::PixelBuffer,
    commands::{history::CommandHistory, CommandError},
    draw::{DrawingEngine, Tool},
    io::CodecError,
};

/// An image being edited: the working buffer, the image as it was loaded, and the edits in between.
///
/// The working buffer always equals the original with every applied command replayed on top.
#[derive(Clone, Debug)]
pub struct Document {
    /// The path from which the image was loaded, or None if opened from memory.
    pub path: Option<std::path::PathBuf>,
    /// Name of the document, inferred from its path or generated.
    pub name: String,
    original: PixelBuffer,
    buffer: PixelBuffer,
    history: CommandHistory,
}
impl Document {
    /// Start editing a buffer. The buffer becomes the pristine original.
    #[must_use]
    pub fn open(buffer: PixelBuffer) -> Self {
        Self {
            path: None,
            name: "Untitled".into(),
            original: buffer.clone_full(),
            buffer,
            history: CommandHistory::new(),
        }
    }
    /// Decode an image file and start editing it.
    pub fn open_path(path: impl AsRef<std::path::Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let buffer = crate::io::decode_path(path)?;
        let name = path
            .file_name()
            .map_or_else(|| "Untitled".into(), |name| name.to_string_lossy().into_owned());
        log::debug!(
            "opened {} ({}x{})",
            path.display(),
            buffer.width(),
            buffer.height()
        );
        Ok(Self {
            path: Some(path.to_owned()),
            name,
            ..Self::open(buffer)
        })
    }
    #[must_use]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }
    #[must_use]
    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }
    #[must_use]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }
    /// Run a tool and commit the result.
    ///
    /// Returns `Ok(false)` if the tool touched nothing on the canvas, in which case no history
    /// entry is made.
    pub fn apply_tool(&mut self, tool: &Tool) -> Result<bool, CommandError> {
        match DrawingEngine::command(&self.buffer, tool) {
            Some(command) => {
                self.history.commit(&mut self.buffer, command)?;
                Ok(true)
            }
            None => {
                log::debug!("{} left the canvas unchanged", tool.label());
                Ok(false)
            }
        }
    }
    pub fn undo(&mut self) -> Result<(), CommandError> {
        self.history.undo(&mut self.buffer)
    }
    pub fn redo(&mut self) -> Result<(), CommandError> {
        self.history.redo(&mut self.buffer)
    }
    /// Discard every edit, returning to the loaded image.
    pub fn reset(&mut self) {
        self.history.reset(&mut self.buffer, &self.original);
    }
    /// Whether the working buffer differs from the original.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.buffer != self.original
    }
}
