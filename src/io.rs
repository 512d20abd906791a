use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use rfd::FileDialog;

// ============================================================================
// SAVE FORMATS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
}

impl SaveFormat {
    /// Pick the format from a path's extension; unknown extensions fall back
    /// to PNG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => SaveFormat::Jpeg,
            Some("bmp") => SaveFormat::Bmp,
            _ => SaveFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum FileError {
    Io(std::io::Error),
    Codec(image::ImageError),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "I/O error: {}", e),
            FileError::Codec(e) => write!(f, "image codec error: {}", e),
        }
    }
}

impl std::error::Error for FileError {}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        FileError::Io(e)
    }
}

impl From<image::ImageError> for FileError {
    fn from(e: image::ImageError) -> Self {
        FileError::Codec(e)
    }
}

// ============================================================================
// FILE HANDLER — native dialogs + codec plumbing
// ============================================================================

pub struct FileHandler {
    /// Current file path (None for a new/unsaved document).
    pub current_path: Option<PathBuf>,
    /// Format used by the last save, re-used by quick saves.
    pub last_format: SaveFormat,
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            current_path: None,
            last_format: SaveFormat::Png,
        }
    }

    /// True once the document has a path on disk (i.e. has been saved or
    /// opened before).
    pub fn has_current_path(&self) -> bool {
        self.current_path.is_some()
    }

    /// Show the native open dialog. `None` means the user cancelled —
    /// callers must treat that as a silent no-op.
    pub fn pick_open_path(&self) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp"])
            .add_filter("All Files", &["*"])
            .pick_file()
    }

    /// Show the native save dialog. `None` means the user cancelled.
    pub fn pick_save_path(&self) -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .add_filter("BMP", &["bmp"])
            .set_file_name(&format!("untitled.{}", self.last_format.extension()))
            .save_file()
    }

    /// Decode the image at `path` into RGBA and remember the path for quick
    /// saves.
    pub fn load_image(&mut self, path: &Path) -> Result<RgbaImage, FileError> {
        let rgba = image::open(path)?.to_rgba8();
        self.current_path = Some(path.to_path_buf());
        self.last_format = SaveFormat::from_path(path);
        Ok(rgba)
    }

    /// Encode `image` to `path` in the format implied by its extension.
    pub fn save_image(&mut self, image: &RgbaImage, path: &Path) -> Result<(), FileError> {
        let format = SaveFormat::from_path(path);
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        match format {
            SaveFormat::Png => {
                let encoder = PngEncoder::new(&mut writer);
                #[allow(deprecated)]
                encoder.encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )?;
            }
            SaveFormat::Jpeg => {
                // JPEG doesn't support alpha, convert to RGB
                let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                let mut encoder = JpegEncoder::new_with_quality(&mut writer, 90);
                encoder.encode(
                    rgb_image.as_raw(),
                    rgb_image.width(),
                    rgb_image.height(),
                    image::ColorType::Rgb8,
                )?;
            }
            SaveFormat::Bmp => {
                let mut encoder = BmpEncoder::new(&mut writer);
                encoder.encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )?;
            }
        }

        self.current_path = Some(path.to_path_buf());
        self.last_format = format;
        Ok(())
    }

    /// Save to the current path with the last used format. Errors when the
    /// document has never been saved.
    pub fn quick_save(&mut self, image: &RgbaImage) -> Result<(), FileError> {
        match self.current_path.clone() {
            Some(path) => self.save_image(image, &path),
            None => Err(FileError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no current file path",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("easel_test_{}_{}", std::process::id(), name))
    }

    #[test]
    fn format_follows_extension_with_png_fallback() {
        assert_eq!(SaveFormat::from_path(Path::new("a.png")), SaveFormat::Png);
        assert_eq!(SaveFormat::from_path(Path::new("a.JPG")), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_path(Path::new("a.bmp")), SaveFormat::Bmp);
        assert_eq!(SaveFormat::from_path(Path::new("a.webp")), SaveFormat::Png);
        assert_eq!(SaveFormat::from_path(Path::new("a")), SaveFormat::Png);
    }

    #[test]
    fn png_save_then_load_round_trips_pixels() {
        let path = temp_path("roundtrip.png");
        let mut handler = FileHandler::new();

        let mut img = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        img.put_pixel(3, 4, Rgba([10, 20, 30, 255]));

        handler.save_image(&img, &path).unwrap();
        assert_eq!(handler.current_path.as_deref(), Some(path.as_path()));
        assert_eq!(handler.last_format, SaveFormat::Png);

        let loaded = handler.load_image(&path).unwrap();
        assert_eq!(loaded.as_raw(), img.as_raw());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn quick_save_requires_a_current_path() {
        let mut handler = FileHandler::new();
        let img = RgbaImage::new(2, 2);
        assert!(matches!(
            handler.quick_save(&img),
            Err(FileError::Io(_))
        ));
    }

    #[test]
    fn load_missing_file_reports_error_and_keeps_state() {
        let mut handler = FileHandler::new();
        let err = handler
            .load_image(Path::new("/nonexistent/easel.png"))
            .unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(handler.current_path.is_none());
    }
}
