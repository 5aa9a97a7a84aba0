pub mod batch;
pub mod blend;
pub mod buffer;
pub mod collage;
pub mod color;
pub mod commands;
pub mod draw;
pub mod io;
pub mod meme;
pub mod raster;
pub mod repositories;
pub mod resample;
pub mod settings;
pub mod state;
pub mod text;
pub mod util;

pub use batch::run_batch;
pub use buffer::{ChannelFormat, PixelBuffer};
pub use collage::compose as make_collage;
pub use color::Color;
pub use meme::compose as make_meme;
pub use resample::resize as resize_one;
pub use state::document::Document;

/// Start editing `buffer`. See [`Document::open`].
#[must_use]
pub fn open_document(buffer: PixelBuffer) -> Document {
    Document::open(buffer)
}
