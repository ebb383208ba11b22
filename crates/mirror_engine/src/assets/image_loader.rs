//! Image loading for 2D textures and cubemaps

use std::path::Path;

use crate::assets::{AssetError, AssetResult};
use crate::render::device::TextureImage;

/// Cubemap face file names in upload order (+X, -X, +Y, -Y, +Z, -Z)
pub const CUBEMAP_FACE_FILES: [&str; 6] = [
    "right.png",
    "left.png",
    "top.png",
    "bottom.png",
    "front.png",
    "back.png",
];

/// Load a 2D texture, flipped so the first row is the bottom of the image
pub fn load_texture_image<P: AsRef<Path>>(path: P) -> AssetResult<TextureImage> {
    let image = open_rgba(path.as_ref())?;
    Ok(to_texture_image(image::imageops::flip_vertical(&image)))
}

/// Load the six faces of a cubemap from `directory`
pub fn load_cubemap_faces<P: AsRef<Path>>(directory: P) -> AssetResult<[TextureImage; 6]> {
    let directory = directory.as_ref();
    let mut faces = Vec::with_capacity(6);
    for file in CUBEMAP_FACE_FILES {
        faces.push(to_texture_image(open_rgba(&directory.join(file))?));
    }

    let size = (faces[0].width, faces[0].height);
    if faces.iter().any(|face| (face.width, face.height) != size) {
        return Err(AssetError::InvalidData(format!(
            "cubemap faces in {} differ in size",
            directory.display()
        )));
    }

    faces
        .try_into()
        .map_err(|_| AssetError::InvalidData("cubemap needs six faces".into()))
}

fn open_rgba(path: &Path) -> AssetResult<image::RgbaImage> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    log::debug!("Loading image from: {:?}", path);
    let image = image::open(path)?.to_rgba8();
    log::info!("Loaded image {}x{} from {:?}", image.width(), image.height(), path);
    Ok(image)
}

fn to_texture_image(image: image::RgbaImage) -> TextureImage {
    let (width, height) = image.dimensions();
    TextureImage { width, height, pixels: image.into_raw() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_moves_top_row_to_bottom() {
        let mut image = image::RgbaImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));

        let flipped = to_texture_image(image::imageops::flip_vertical(&image));
        assert_eq!(&flipped.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&flipped.pixels[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_missing_texture() {
        let error = load_texture_image("no/such/texture.png").unwrap_err();
        assert!(matches!(error, AssetError::NotFound(_)));
    }

    #[test]
    fn test_solid_image_size() {
        let image = TextureImage::solid(4, 4, [255, 0, 0, 255]);
        assert_eq!(image.pixels.len(), 4 * 4 * 4);
        assert_eq!(&image.pixels[0..4], &[255, 0, 0, 255]);
    }
}
