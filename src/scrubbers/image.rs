//! Limpieza de imágenes reconstruyendo el archivo solo a partir de los píxeles.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, ScrubError};

use super::StrategyReport;
use super::utils::{commit, display_name, staging_file};

/// Calidad usada al recodificar JPEG; el formato no admite una copia sin pérdida.
const JPEG_QUALITY: u8 = 95;

/// Etiquetas TIFF que describen la estructura de los píxeles y que el propio
/// codificador escribe en IFD0. Cualquier otra etiqueta cuenta como metadata.
const TIFF_STRUCTURAL_TAGS: [u16; 21] = [
    254, // NewSubfileType
    256, // ImageWidth
    257, // ImageLength
    258, // BitsPerSample
    259, // Compression
    262, // PhotometricInterpretation
    273, // StripOffsets
    277, // SamplesPerPixel
    278, // RowsPerStrip
    279, // StripByteCounts
    282, // XResolution
    283, // YResolution
    284, // PlanarConfiguration
    296, // ResolutionUnit
    317, // Predictor
    322, // TileWidth
    323, // TileLength
    324, // TileOffsets
    325, // TileByteCounts
    338, // ExtraSamples
    339, // SampleFormat
];

/// Decodifica los píxeles de `input` y los escribe en un contenedor nuevo en `target`.
///
/// Los segmentos de metadata nunca se leen, así que el archivo resultante no
/// puede heredarlos. Antes de reemplazar el destino se verifica que no quede
/// EXIF ni bloques de texto PNG.
pub fn scrub_image(input: &Path, target: &Path) -> Result<StrategyReport> {
    let img = ImageReader::open(input)
        .map_err(|e| ScrubError::io("abrir", input, e))?
        .with_guessed_format()
        .map_err(|e| ScrubError::io("leer", input, e))?
        .decode()
        .map_err(|source| ScrubError::ImageDecode {
            path: input.to_path_buf(),
            source,
        })?;

    let format = ImageFormat::from_path(target)
        .or_else(|_| ImageFormat::from_path(input))
        .map_err(|_| ScrubError::unsupported(target, "no se reconoce el formato de imagen de salida"))?;

    let mut staged = staging_file(target)?;
    debug!(temp = %staged.path().display(), ?format, "recodificando imagen");
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        encode(&img, format, &mut writer).map_err(|source| ScrubError::ImageEncode {
            path: target.to_path_buf(),
            source,
        })?;
        writer
            .flush()
            .map_err(|e| ScrubError::io("escribir", target, e))?;
    }

    if !verify_encoded(staged.path(), format)? {
        return Err(ScrubError::verification(
            target,
            "la imagen limpia aún contiene metadata",
        ));
    }

    commit(staged, input, target)?;
    info!(input = %input.display(), output = %target.display(), "imagen limpia");
    Ok(StrategyReport::new(format!("Limpio: {}", display_name(target))))
}

fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    writer: &mut BufWriter<&mut File>,
) -> image::ImageResult<()> {
    match format {
        ImageFormat::Jpeg => {
            // JPEG no admite alfa ni 16 bits por canal.
            let rgb = match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img.clone(),
                _ => DynamicImage::ImageRgb8(img.to_rgb8()),
            };
            rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, JPEG_QUALITY))
        }
        other => img.write_to(writer, other),
    }
}

/// Comprueba que una imagen carece de campos EXIF y de bloques auxiliares PNG.
///
/// El formato se deduce del contenido, no de la extensión.
pub fn verify_image_metadata_clean(path: &Path) -> Result<bool> {
    let format = ImageReader::open(path)
        .map_err(|e| ScrubError::io("abrir para verificar", path, e))?
        .with_guessed_format()
        .map_err(|e| ScrubError::io("leer", path, e))?
        .format();
    match format {
        Some(format) => verify_encoded(path, format),
        None => Err(ScrubError::verification(path, "no se reconoce el formato de imagen")),
    }
}

fn verify_encoded(path: &Path, format: ImageFormat) -> Result<bool> {
    let file = File::open(path).map_err(|e| ScrubError::io("abrir para verificar", path, e))?;
    let mut reader = BufReader::new(file);

    let exif_clean = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) if format == ImageFormat::Tiff => exif.fields().all(is_tiff_structure),
        Ok(exif) => exif.fields().next().is_none(),
        Err(exif::Error::NotFound(_)) | Err(exif::Error::BlankValue(_)) => true,
        Err(exif::Error::InvalidFormat(_)) => true,
        Err(exif::Error::Io(err)) => {
            return Err(ScrubError::io("leer EXIF durante la verificación de", path, err));
        }
        Err(other) => {
            return Err(ScrubError::verification(
                path,
                format!("error verificando metadata EXIF: {other}"),
            ));
        }
    };

    if format == ImageFormat::Png {
        Ok(exif_clean && png_chunks_clean(path)?)
    } else {
        Ok(exif_clean)
    }
}

/// Un TIFF siempre lleva su IFD0; solo se aceptan las etiquetas de estructura.
fn is_tiff_structure(field: &exif::Field) -> bool {
    field.ifd_num == exif::In::PRIMARY
        && field.tag.context() == exif::Context::Tiff
        && TIFF_STRUCTURAL_TAGS.contains(&field.tag.number())
}

/// Revisa los bloques auxiliares de un PNG.
fn png_chunks_clean(path: &Path) -> Result<bool> {
    let file = File::open(path).map_err(|e| ScrubError::io("abrir para verificar", path, e))?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let reader = decoder
        .read_info()
        .map_err(|e| ScrubError::verification(path, format!("PNG ilegible: {e}")))?;
    let info = reader.info();

    Ok(info.uncompressed_latin1_text.is_empty()
        && info.compressed_latin1_text.is_empty()
        && info.utf8_text.is_empty()
        && info.exif_metadata.is_none()
        && info.icc_profile.is_none())
}
