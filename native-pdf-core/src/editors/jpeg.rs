use crate::error::{PdfError, Result};

/// Colour space implied by a JPEG frame's component count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// Frame header values of a baseline or progressive JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
}

fn invalid(message: &str) -> PdfError {
    PdfError::InvalidArgument(format!("invalid JPEG: {message}"))
}

/// Walk marker segments up to the first start-of-frame and read its header.
pub fn parse_jpeg_header(data: &[u8]) -> Result<JpegInfo> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(invalid("missing SOI marker"));
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return Err(invalid("expected a marker"));
        }
        let marker = data[pos + 1];
        pos += 2;

        match marker {
            // Fill byte before a marker
            0xFF => pos -= 1,
            // Start of frame (DHT, JPG and DAC share the range but are not frames)
            0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                if pos + 8 > data.len() {
                    return Err(invalid("truncated frame header"));
                }
                let precision = data[pos + 2];
                let height = u32::from(u16::from_be_bytes([data[pos + 3], data[pos + 4]]));
                let width = u32::from(u16::from_be_bytes([data[pos + 5], data[pos + 6]]));
                let components = data[pos + 7];

                if width == 0 || height == 0 {
                    return Err(invalid("zero image dimension"));
                }
                let color_space = match components {
                    1 => ColorSpace::DeviceGray,
                    3 => ColorSpace::DeviceRGB,
                    4 => ColorSpace::DeviceCMYK,
                    n => return Err(invalid(&format!("unsupported component count {n}"))),
                };
                return Ok(JpegInfo {
                    width,
                    height,
                    bits_per_component: precision,
                    color_space,
                });
            }
            0xD9 | 0xDA => break,
            0x01 | 0xD0..=0xD8 => {}
            _ => {
                if pos + 1 >= data.len() {
                    return Err(invalid("truncated segment"));
                }
                let length = usize::from(u16::from_be_bytes([data[pos], data[pos + 1]]));
                pos += length;
            }
        }
    }

    Err(invalid("no start-of-frame marker"))
}
