use image::DynamicImage;
use log::debug;

use std::cell::Cell;
use std::fs::{ self, File };
use std::io::{ self, Write };
use std::path::{ Path, PathBuf };

use crate::error::LprError;

/// Shows the intermediate images of a run.
///
/// Built with `display-window`, every `show` opens a window and blocks until
/// it is closed. Otherwise the image is written as a numbered png into the
/// snapshot directory, when there is one.
pub struct Viewer {
    snapshots: Option<PathBuf>,
    shown: Cell<usize>,
}

impl Viewer {

    pub fn new(snapshots: Option<PathBuf>) -> Self {
        Self { snapshots, shown: Cell::new(0) }
    }

    /// A viewer that only logs.
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn shown(&self) -> usize {
        self.shown.get()
    }

    pub fn show(&self, title: &str, img: &DynamicImage) -> Result<(), LprError> {
        let index = self.shown.get() + 1;
        self.shown.set(index);
        debug!("stage {} \"{}\" {}x{}", index, title, img.width(), img.height());
        self.display(title, img)?;
        if let Some(dir) = &self.snapshots {
            fs::create_dir_all(dir)?;
            img.save(dir.join(snapshot_name(index, title)))?;
        }
        Ok(())
    }

    #[cfg(feature = "display-window")]
    fn display(&self, title: &str, img: &DynamicImage) -> Result<(), LprError> {
        imageproc::window::display_image(title, &img.to_rgba8(), img.width(), img.height());
        Ok(())
    }

    #[cfg(not(feature = "display-window"))]
    fn display(&self, _title: &str, _img: &DynamicImage) -> Result<(), LprError> {
        Ok(())
    }
}

/// `"Final Plate Candidate"` at stage 6 becomes `06-final-plate-candidate.png`.
pub fn snapshot_name(index: usize, title: &str) -> String {
    let slug: Vec<String> = title.split_whitespace().map(|w| w.to_lowercase()).collect();
    format!("{:02}-{}.png", index, slug.join("-"))
}

/// Log sink writing to stderr and a debug log file at once.
pub struct LogTee {
    file: File,
}

impl LogTee {

    /// Truncates `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }
}

impl Write for LogTee {

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        io::stderr().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        io::stderr().flush()
    }
}
