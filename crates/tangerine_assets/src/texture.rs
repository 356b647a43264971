use crate::AssetError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8Unorm, // Standard 32-bit color (0-255)
}

/// Decoded, CPU-side image ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub name: String,
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureData {
    /// Decodes any format the `image` crate recognises into tightly packed RGBA8.
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
            name: name.to_owned(),
            message: e.to_string(),
        })?;

        let img = img.to_rgba8();
        let (width, height) = img.dimensions();

        Ok(Self {
            name: name.to_owned(),
            pixels: img.into_raw(),
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
        })
    }

    /// A 1x1 texture of a single color.
    pub fn solid(name: &str, rgba: [u8; 4]) -> Self {
        Self {
            name: name.to_owned(),
            pixels: rgba.to_vec(),
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ORANGE_TEXTURE;

    #[test]
    fn embedded_texture_decodes_to_rgba() {
        let data = TextureData::decode("orange.png", ORANGE_TEXTURE).unwrap();
        assert_eq!((data.width, data.height), (64, 64));
        assert_eq!(data.pixels.len(), (64 * 64 * 4) as usize);
        assert_eq!(data.bytes_per_row(), 256);
        assert_eq!(data.format, TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = TextureData::decode("junk", b"definitely not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode { ref name, .. } if name == "junk"));
    }

    #[test]
    fn solid_texture_is_one_pixel() {
        let data = TextureData::solid("white", [255; 4]);
        assert_eq!(data.pixels, vec![255, 255, 255, 255]);
        assert_eq!((data.width, data.height), (1, 1));
    }
}
