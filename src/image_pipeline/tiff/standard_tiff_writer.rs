use std::io::Write;
use tracing::debug;
use crate::image_pipeline::common::error::{Result, ConversionError};
use crate::image_pipeline::config::RemovalConfig;
use crate::image_pipeline::raw::types::RawImageData;
use crate::image_pipeline::tiff::types::TiffCompression;
use crate::image_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

impl StandardTiffWriter {
    fn compression(compression: TiffCompression) -> tiff::encoder::Compression {
        use tiff::encoder::compression::DeflateLevel;

        match compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(DeflateLevel::Best),
        }
    }
}

impl TiffWriter for StandardTiffWriter {
    fn write_tiff(&self, image: &RawImageData, output: &mut dyn Write, config: &RemovalConfig) -> Result<()> {
        debug!("Encoding CFA frame as TIFF: {}x{}", image.width, image.height);

        let mut buffer = Vec::new();

        let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?
            .with_compression(Self::compression(config.compression));

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        encoder.write_image::<tiff::encoder::colortype::Gray16>(
            image.width as u32,
            image.height as u32,
            &image.data,
        ).map_err(|e| ConversionError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}
