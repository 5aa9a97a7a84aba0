//! Command line surface.

use std::path::PathBuf;

use zimage_core::{collage::Orientation, io::OutputFormat, resample::ResampleFilter, Color};

#[derive(clap::Parser, Debug)]
#[command(name = "zimage", version, about = "Edit, resize, and compose images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Resize options shared by `resize` and `batch`. Unset options come from the settings file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ResizeArgs {
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    /// Keep missing dimensions as they are, rather than following the aspect ratio.
    #[arg(long)]
    pub no_aspect_lock: bool,
    /// nearest, bilinear, or area.
    #[arg(long)]
    pub filter: Option<ResampleFilter>,
    /// png, jpeg, bmp, or tiff. Defaults to each source's own format.
    #[arg(long)]
    pub format: Option<OutputFormat>,
    /// JPEG quality, 1 to 100.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Resize a single image.
    Resize {
        input: PathBuf,
        /// Defaults to `<stem><suffix>.<ext>` next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        resize: ResizeArgs,
    },
    /// Resize many images in parallel. Directories are scanned for images, not recursively.
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        destination: PathBuf,
        #[command(flatten)]
        resize: ResizeArgs,
        /// Appended to every output stem.
        #[arg(long)]
        suffix: Option<String>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Place images side by side or stacked.
    Collage {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// horizontal or vertical.
        #[arg(long)]
        orientation: Option<Orientation>,
        #[arg(long)]
        spacing: Option<u32>,
        /// Hex color, such as "#FFFFFF".
        #[arg(long)]
        background: Option<Color>,
    },
    /// Caption an image.
    Meme {
        /// The image to caption. Optional with `--template`, which names its own image.
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        top: Option<String>,
        #[arg(long)]
        bottom: Option<String>,
        /// Load text blocks, and the image if none is given, from a JSON template.
        #[arg(long)]
        template: Option<PathBuf>,
        /// Save the blocks used as a JSON template.
        #[arg(long)]
        save_template: Option<PathBuf>,
    },
    /// Apply a TOML edit script to an image.
    Edit {
        input: PathBuf,
        script: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the active settings.
    Settings {
        /// Write the active settings, with documentation, to the settings file.
        #[arg(long)]
        write: bool,
    },
}

#[cfg(test)]
mod test {
    use super::{Cli, Command};
    use clap::Parser;
    use zimage_core::{io::OutputFormat, resample::ResampleFilter, Color};
    #[test]
    fn verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
    #[test]
    fn resize_args() {
        let cli = Cli::try_parse_from([
            "zimage", "resize", "in.png", "--width", "100", "--filter", "AREA", "--format", "jpg",
        ])
        .unwrap();
        let Command::Resize { input, output, resize } = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(input.to_str(), Some("in.png"));
        assert!(output.is_none());
        assert_eq!(resize.width, Some(100));
        assert_eq!(resize.filter, Some(ResampleFilter::Area));
        assert_eq!(resize.format, Some(OutputFormat::Jpeg));
    }
    #[test]
    fn bad_values_rejected() {
        assert!(Cli::try_parse_from(["zimage", "resize", "a.png", "--quality", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["zimage", "collage", "a.png", "-o", "b.png", "--background", "red"])
                .is_err()
        );
        let cli = Cli::try_parse_from([
            "zimage", "collage", "a.png", "b.png", "-o", "c.png", "--background", "#102030",
        ])
        .unwrap();
        let Command::Collage { background, inputs, .. } = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(background, Some(Color::rgb(0x10, 0x20, 0x30)));
        assert_eq!(inputs.len(), 2);
    }
}
