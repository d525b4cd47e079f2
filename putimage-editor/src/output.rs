//! What a node hands to the generation run: the edited image, its mask,
//! and the filename.

use std::path::Path;

use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

use putimage_core::{ImageRecord, StoreError};

use crate::fs_store::FsLayerStore;

/// Side of the empty mask emitted for images without alpha.
pub const EMPTY_MASK_SIZE: u32 = 64;

#[derive(Debug, Clone)]
pub struct NodeOutput {
    pub image: RgbImage,
    /// 255 where the image is masked.
    pub mask: GrayImage,
    pub filename: String,
}

/// Load the composite result saved for `record` if there is one, otherwise
/// its original.
///
/// The mask is the inverse of the source's alpha, or a small all-zero mask
/// when the source has no alpha channel.
pub fn resolve_output(record: &ImageRecord) -> crate::Result<NodeOutput> {
    let original = Path::new(&record.original_path);
    if !original.is_file() {
        return Err(StoreError::NotFound(record.original_path.clone()).into());
    }
    let source = FsLayerStore::result_path(&record.original_path)
        .filter(|p| p.is_file())
        .unwrap_or_else(|| original.to_path_buf());
    debug!("generation output from {}", source.display());

    let decoded = image::open(&source)?;
    let mask = if decoded.color().has_alpha() {
        let rgba = decoded.to_rgba8();
        GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            Luma([255 - rgba.get_pixel(x, y)[3]])
        })
    } else {
        GrayImage::new(EMPTY_MASK_SIZE, EMPTY_MASK_SIZE)
    };

    Ok(NodeOutput {
        image: decoded.to_rgb8(),
        mask,
        filename: record.original_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};
    use putimage_core::LayerStore;
    use std::fs;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("putimage_output_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn rgb_original_gets_empty_mask() {
        let dir = scratch("rgb");
        RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])).save(dir.join("a.png")).unwrap();
        let record = ImageRecord::new(dir.join("a.png").to_str().unwrap(), "a");
        let out = resolve_output(&record).unwrap();
        assert_eq!(out.image.dimensions(), (5, 3));
        assert_eq!(out.mask.dimensions(), (64, 64));
        assert!(out.mask.pixels().all(|p| p[0] == 0));
        assert_eq!(out.filename, "a");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn composite_result_wins_and_inverts_alpha() {
        let dir = scratch("result");
        let original = dir.join("b.png");
        RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])).save(&original).unwrap();

        let mut mask = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        mask.put_pixel(3, 0, Rgba([0, 0, 0, 0]));
        let encode = |img: &RgbaImage| {
            let mut c = std::io::Cursor::new(Vec::new());
            img.write_to(&mut c, image::ImageFormat::Png).unwrap();
            c.into_inner()
        };
        FsLayerStore::new(&dir)
            .save_edited_layers(
                original.to_str().unwrap(),
                &encode(&RgbaImage::new(4, 4)),
                &encode(&mask),
            )
            .unwrap();

        let out = resolve_output(&ImageRecord::new(original.to_str().unwrap(), "b")).unwrap();
        assert_eq!(out.mask.get_pixel(3, 0)[0], 255);
        assert_eq!(out.mask.get_pixel(0, 0)[0], 0);
        assert_eq!(out.image.get_pixel(0, 0), &Rgb([9, 9, 9]));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_image_is_an_error() {
        let record = ImageRecord::new("/no/such/putimage/dir/x.png", "x");
        assert!(resolve_output(&record).is_err());
    }

    #[test]
    fn uppercase_extension_resolves_from_listing() {
        let dir = scratch("upper");
        RgbImage::from_pixel(3, 2, Rgb([7, 7, 7]))
            .save_with_format(dir.join("shot.PNG"), image::ImageFormat::Png)
            .unwrap();

        let listing = FsLayerStore::new(&dir)
            .list_images(dir.to_str().unwrap())
            .unwrap();
        assert_eq!(listing.len(), 1);
        let out = resolve_output(&listing[0]).unwrap();
        assert_eq!(out.filename, "shot");
        assert_eq!(out.image.dimensions(), (3, 2));
        let _ = fs::remove_dir_all(&dir);
    }
}
