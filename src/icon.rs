//! Icon resolution for menu nodes and entries.
//!
//! An icon identifier is either a name in the active icon theme or an
//! absolute file path. Theme lookup takes precedence; anything that resolves
//! to neither degrades to "no icon" with an advisory diagnostic, never a
//! failure.

use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use tracing::warn;

/// Pixel size requested for themed icons (menu-item icon size).
pub const THEMED_ICON_SIZE: u16 = 16;

/// Square size image files are scaled to.
pub const FILE_ICON_SIZE: u32 = 24;

/// Raw RGBA pixels at a known size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A resolved menu icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuIcon {
    /// An icon known to the active icon theme, referenced by name. The host
    /// loads it at menu-item size.
    Named(String),
    /// An image loaded from an absolute path, scaled to [`FILE_ICON_SIZE`].
    Image(IconImage),
}

/// Resolve an optional icon identifier to a displayable icon.
///
/// Lookups are not cached; every node resolves independently. Identifiers
/// that resolve to nothing emit one diagnostic naming the identifier and
/// rendering continues without an icon.
pub fn resolve(identifier: Option<&str>) -> Option<MenuIcon> {
    let identifier = identifier?;

    if freedesktop_icons::lookup(identifier)
        .with_size(THEMED_ICON_SIZE)
        .find()
        .is_some()
    {
        return Some(MenuIcon::Named(identifier.to_owned()));
    }

    let path = Path::new(identifier);
    if path.is_absolute() {
        if !path.exists() {
            warn!(icon = %identifier, "icon file does not exist");
            return None;
        }
        return match load_scaled(path) {
            Ok(image) => Some(MenuIcon::Image(image)),
            Err(err) => {
                warn!(icon = %identifier, %err, "failed to load icon file");
                None
            }
        };
    }

    warn!(icon = %identifier, "icon not found in theme");
    None
}

fn load_scaled(path: &Path) -> Result<IconImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?
        .resize_exact(FILE_ICON_SIZE, FILE_ICON_SIZE, FilterType::Triangle)
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(IconImage {
        width,
        height,
        rgba: image.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_identifier_resolves_to_no_icon() {
        assert_eq!(resolve(None), None);
    }

    #[test]
    fn missing_absolute_path_resolves_to_no_icon() {
        assert_eq!(resolve(Some("/nonexistent/launcher-menu-icon.png")), None);
    }

    #[test]
    fn relative_non_theme_name_resolves_to_no_icon() {
        assert_eq!(resolve(Some("launcher-menu-no-such-icon")), None);
    }

    #[test]
    fn existing_file_is_loaded_and_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        match resolve(path.to_str()) {
            Some(MenuIcon::Image(image)) => {
                assert_eq!(image.width, FILE_ICON_SIZE);
                assert_eq!(image.height, FILE_ICON_SIZE);
                assert_eq!(image.rgba.len(), (FILE_ICON_SIZE * FILE_ICON_SIZE * 4) as usize);
            }
            other => panic!("expected scaled image, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_image_file_resolves_to_no_icon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert_eq!(resolve(path.to_str()), None);
    }
}
