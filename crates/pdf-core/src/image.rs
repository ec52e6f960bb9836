//! Image XObjects

use crate::{PdfError, Result};
use image::{DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// How an image is sized into its target box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageScaleMode {
    /// Fill the box exactly, ignoring aspect ratio
    #[default]
    Stretch,
    /// Largest size that fits inside the box, aspect preserved
    FitBox,
    /// FitBox, then centered inside the box
    FitCenter,
}

/// Display size in points for an image of `px_width` x `px_height` pixels
pub fn calculate_scaled_dimensions(
    px_width: u32,
    px_height: u32,
    box_width: f64,
    box_height: f64,
    mode: ImageScaleMode,
) -> (f64, f64) {
    if px_width == 0 || px_height == 0 {
        return (0.0, 0.0);
    }
    match mode {
        ImageScaleMode::Stretch => (box_width, box_height),
        ImageScaleMode::FitBox | ImageScaleMode::FitCenter => {
            let scale = (box_width / px_width as f64).min(box_height / px_height as f64);
            (px_width as f64 * scale, px_height as f64 * scale)
        }
    }
}

/// Sniff the format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(ImageFormat::Jpeg);
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(ImageFormat::Png);
    }
    Err(PdfError::ImageError("Unknown image format".to_string()))
}

/// An image ready to be written as a PDF XObject stream
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// "DeviceRGB" or "DeviceGray"
    pub color_space: &'static str,
    /// "DCTDecode" for passthrough JPEG, "FlateDecode" otherwise
    pub filter: &'static str,
    pub data: Vec<u8>,
}

/// Scan JPEG segments for the first start-of-frame marker
fn jpeg_frame(data: &[u8]) -> Result<(u32, u32, u8)> {
    let mut i = 2;
    while i + 9 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        // C4 (DHT), C8 (JPG) and CC (DAC) share the range but are not frames
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Ok((width, height, data[i + 9]));
        }
        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if length < 2 {
            break;
        }
        i += 2 + length;
    }
    Err(PdfError::ImageError("Could not parse JPEG frame".to_string()))
}

/// Composite a channel value over white
fn over_white(value: u8, alpha: u8) -> u8 {
    let a = alpha as f32 / 255.0;
    (value as f32 * a + 255.0 * (1.0 - a)).round() as u8
}

impl ImageXObject {
    /// Build from JPEG or PNG bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// JPEG streams embed as-is under DCTDecode. CMYK sources are decoded
    /// and re-encoded as RGB since readers disagree on Adobe inversion.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let (width, height, components) = jpeg_frame(data)?;
        match components {
            1 | 3 => Ok(Self {
                width,
                height,
                color_space: if components == 1 { "DeviceGray" } else { "DeviceRGB" },
                filter: "DCTDecode",
                data: data.to_vec(),
            }),
            _ => Self::from_decoded(data),
        }
    }

    pub fn from_png(data: &[u8]) -> Result<Self> {
        Self::from_decoded(data)
    }

    /// Decode to raw samples, flatten alpha onto white, then deflate
    fn from_decoded(data: &[u8]) -> Result<Self> {
        let decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        let (raw, color_space) = match color_type {
            image::ColorType::L8 | image::ColorType::L16 => {
                (image.to_luma8().into_raw(), "DeviceGray")
            }
            image::ColorType::La8 | image::ColorType::La16 => {
                let raw = image
                    .to_luma_alpha8()
                    .pixels()
                    .map(|p| over_white(p[0], p[1]))
                    .collect();
                (raw, "DeviceGray")
            }
            image::ColorType::Rgba8 | image::ColorType::Rgba16 | image::ColorType::Rgba32F => {
                let raw = image
                    .to_rgba8()
                    .pixels()
                    .flat_map(|p| [p[0], p[1], p[2]].map(|c| over_white(c, p[3])))
                    .collect();
                (raw, "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: "FlateDecode",
            data: encoder.finish()?,
        })
    }

    pub fn to_pdf_stream(&self) -> Stream {
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(self.width as i64)),
            ("Height", Object::Integer(self.height as i64)),
            ("ColorSpace", Object::Name(self.color_space.as_bytes().to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(self.filter.as_bytes().to_vec())),
        ]);
        // Already compressed; keep lopdf from deflating it again
        Stream::new(dict, self.data.clone()).with_compression(false)
    }
}

/// Operators that paint `image_name` into the rectangle at (x, y), PDF space
pub fn generate_image_operators(image_name: &str, x: f64, y: f64, width: f64, height: f64) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}
