use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{TextureError, TextureResult};
use crate::framebuffer::Image;

/// Resolves logical image names to decoded images.
pub trait ImageLoader: Send + Sync {
    fn load(&self, name: &str) -> TextureResult<Image>;
}

impl<F> ImageLoader for F
where
    F: Fn(&str) -> TextureResult<Image> + Send + Sync,
{
    fn load(&self, name: &str) -> TextureResult<Image> {
        self(name)
    }
}

/// Loads images from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    base: PathBuf,
    sandboxed: bool,
}

impl FileImageLoader {
    /// Relative names resolve against `base`; absolute names are used as-is.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            sandboxed: false,
        }
    }

    /// Every name resolves inside `base`. `..` cannot climb out, but
    /// symbolic links inside the directory are still followed.
    pub fn sandboxed(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            sandboxed: true,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Filesystem path for a logical name.
    pub fn resolve(&self, name: &str) -> TextureResult<PathBuf> {
        if name.is_empty() {
            return Err(TextureError::EmptyName);
        }
        if self.sandboxed {
            let mut path = self.base.clone();
            path.extend(clean_rooted(name));
            Ok(path)
        } else if name.starts_with('/') {
            Ok(PathBuf::from(name))
        } else {
            Ok(self.base.join(name))
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, name: &str) -> TextureResult<Image> {
        let path = self.resolve(name)?;
        let reader = image::io::Reader::new(BufReader::new(File::open(&path)?)).with_guessed_format()?;
        let decoded = reader.decode()?;
        let img = Image::from_dynamic(&decoded);
        if img.width() == 0 || img.height() == 0 {
            return Err(TextureError::LoadError(format!("{} has no pixels", path.display())));
        }
        log::debug!("Loaded image: {} ({}x{})", path.display(), img.width(), img.height());
        Ok(img)
    }
}

/// Lexically clean `"/" + name` and return its components below the root.
fn clean_rooted(name: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdray_math::Rgba;

    #[test]
    fn test_clean_rooted() {
        assert_eq!(clean_rooted("a/b/../c"), vec!["a", "c"]);
        assert_eq!(clean_rooted("../../etc/passwd"), vec!["etc", "passwd"]);
        assert_eq!(clean_rooted("/./x//y/"), vec!["x", "y"]);
        assert!(clean_rooted("..").is_empty());
    }

    #[test]
    fn test_resolve() {
        let full = FileImageLoader::new("/data");
        assert_eq!(full.resolve("tex/a.png").unwrap(), PathBuf::from("/data/tex/a.png"));
        assert_eq!(full.resolve("/abs/b.png").unwrap(), PathBuf::from("/abs/b.png"));

        let boxed = FileImageLoader::sandboxed("/data");
        assert_eq!(boxed.resolve("/abs/b.png").unwrap(), PathBuf::from("/data/abs/b.png"));
        assert_eq!(boxed.resolve("../../b.png").unwrap(), PathBuf::from("/data/b.png"));

        assert!(matches!(boxed.resolve(""), Err(TextureError::EmptyName)));
        assert!(matches!(full.load(""), Err(TextureError::EmptyName)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let loader = FileImageLoader::sandboxed(std::env::temp_dir());
        assert!(matches!(loader.load("kdray-no-such-image.png"), Err(TextureError::Io(_))));
    }

    #[test]
    fn test_load_png() {
        let dir = std::env::temp_dir().join(format!("kdray-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut png = image::RgbaImage::new(3, 2);
        png.put_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
        png.save(dir.join("red.png")).unwrap();

        let loader = FileImageLoader::sandboxed(&dir);
        let img = loader.load("../red.png").unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.pixel(2, 1), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(img.pixel(0, 0), Some(Rgba::new(0.0, 0.0, 0.0, 0.0)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_closure_loader() {
        let loader = |name: &str| -> TextureResult<Image> {
            if name == "one" {
                Ok(Image::new(1, 1))
            } else {
                Err(TextureError::LoadError(name.to_string()))
            }
        };
        assert!(loader.load("one").is_ok());
        assert!(loader.load("two").is_err());
    }
}
