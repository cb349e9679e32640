pub mod image_helper {
    use image::ImageEncoder;

    /// Encodes a packed RGBA buffer as a PNG file.
    pub fn save(
        name: String,
        width: u32,
        height: u32,
        buffer: &[u8],
    ) -> Result<(), image::error::ImageError> {
        let output = std::fs::File::create(name)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, image::ExtendedColorType::Rgba8)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;

    #[test]
    fn save_white_file() {
        let height = 50u32;
        let width = 50u32;
        let buffer_size = (width * height * 4) as usize;
        let buffer = vec![255u8; buffer_size];
        let name = std::env::temp_dir().join("pca_engine_white.png");

        save(name.to_string_lossy().into_owned(), width, height, &buffer)
            .expect("Error Saving File.");
    }

    #[test]
    fn save_gradient_file() {
        let height = 50u32;
        let width = 50u32;
        let buffer_size = (width * height * 4) as usize;
        let mut buffer = vec![255u8; buffer_size];
        let name = std::env::temp_dir().join("pca_engine_gradient.png");
        let mut intensity = 0;

        for i in buffer.chunks_mut(4) {
            i[0] = intensity;
            i[1] = intensity;
            i[2] = intensity;
            intensity += 1;
            intensity %= 255;
        }

        save(name.to_string_lossy().into_owned(), width, height, &buffer)
            .expect("Error Saving File.");
    }
}
