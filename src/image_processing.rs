use anyhow::{Context, Result};
use exif::{In, Reader, Tag};
use image::{DynamicImage, GenericImageView};
use std::fs;
use std::path::Path;

/// Media kinds the pipeline knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Jpeg,
    Heic,
    Unsupported,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => MediaKind::Jpeg,
            "heic" | "heif" => MediaKind::Heic,
            _ => MediaKind::Unsupported,
        }
    }
}

/// Output parameters for converted media
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub max_width: u32,
    pub quality: i32,
}

/// EXIF orientation tag of a file, 1 (upright) when missing or unreadable.
pub fn read_exif_orientation(source_path: &Path) -> u32 {
    let file = match fs::File::open(source_path) {
        Ok(f) => f,
        Err(_) => return 1,
    };

    let mut bufreader = std::io::BufReader::new(&file);
    let exif = match Reader::new().read_from_container(&mut bufreader) {
        Ok(e) => e,
        Err(_) => return 1,
    };

    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Orientations 5 to 8 swap width and height when displayed.
fn swaps_dimensions(orientation: u32) -> bool {
    (5..=8).contains(&orientation)
}

/// Rotates/flips a decoded image into its displayed orientation.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate270().fliph(),
        6 => img.rotate90(),
        7 => img.rotate90().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Decodes a JPEG with turbojpeg, letting libjpeg downscale while decoding when the
/// displayed image is much wider than `target_width`. Returns `None` if the data is not a JPEG.
///
/// With `rotated` set the stored height becomes the displayed width.
fn try_load_jpeg(path: &Path, target_width: u32, rotated: bool) -> Result<Option<DynamicImage>> {
    let data = fs::read(path)?;

    // JPEG magic bytes (FF D8 FF)
    if data.len() < 3 || data[0] != 0xFF || data[1] != 0xD8 || data[2] != 0xFF {
        return Ok(None);
    }

    let mut decompressor = turbojpeg::Decompressor::new()?;
    let header = decompressor.read_header(&data)?;

    let displayed_width = if rotated { header.height } else { header.width };

    // Smallest downscaling factor that still leaves the displayed image at least target_width wide
    let scaling_factor = turbojpeg::Decompressor::supported_scaling_factors()
        .iter()
        .filter(|f| f.num() <= f.denom())
        .filter(|f| (displayed_width * f.num()).div_ceil(f.denom()) >= target_width as usize)
        .min_by_key(|f| (f.num() * 1000) / f.denom())
        .cloned()
        .unwrap_or(turbojpeg::ScalingFactor::new(1, 1));

    decompressor.set_scaling_factor(scaling_factor)?;

    let scaled_width = (header.width * scaling_factor.num()).div_ceil(scaling_factor.denom());
    let scaled_height = (header.height * scaling_factor.num()).div_ceil(scaling_factor.denom());

    let mut image = image::RgbImage::new(scaled_width as u32, scaled_height as u32);
    let turbo_image = turbojpeg::Image {
        pixels: image.as_mut(),
        width: scaled_width,
        height: scaled_height,
        format: turbojpeg::PixelFormat::RGB,
        pitch: scaled_width * 3,
    };

    match decompressor.decompress(&data, turbo_image) {
        Ok(_) => Ok(Some(DynamicImage::ImageRgb8(image))),
        Err(_) => Ok(None),
    }
}

fn load_jpeg(path: &Path, target_width: u32) -> Result<DynamicImage> {
    let orientation = read_exif_orientation(path);
    let img = if let Ok(Some(img)) = try_load_jpeg(path, target_width, swaps_dimensions(orientation)) {
        img
    } else {
        image::open(path).with_context(|| format!("Failed to open image: {:?}", path))?
    };
    Ok(apply_orientation(img, orientation))
}

/// Decodes the primary image of a HEIC file. libheif applies the container's rotation itself.
fn decode_heic_native(path: &Path) -> Result<DynamicImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let path_str = path
        .to_str()
        .with_context(|| format!("Non UTF-8 path: {:?}", path))?;
    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_file(path_str)
        .with_context(|| format!("Failed to read HEIC container: {:?}", path))?;
    let handle = ctx.primary_image_handle()?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .with_context(|| format!("Failed to decode HEIC image: {:?}", path))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .context("Decoded HEIC image has no interleaved RGB plane")?;

    let (width, height) = (plane.width, plane.height);
    let row_len = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }

    let rgb = image::RgbImage::from_raw(width, height, pixels)
        .context("HEIC plane size does not match its dimensions")?;
    Ok(DynamicImage::ImageRgb8(rgb))
}

/// Decodes HEIC natively, falling back to `sips` on macOS.
fn load_heic(path: &Path) -> Result<DynamicImage> {
    match decode_heic_native(path) {
        Ok(img) => return Ok(img),
        Err(e) => tracing::debug!("Native HEIC decode failed for {:?}: {:#}", path, e),
    }

    if cfg!(target_os = "macos") {
        if let Ok(output) = std::process::Command::new("sips")
            .arg("-s")
            .arg("format")
            .arg("jpeg")
            .arg(path)
            .arg("--out")
            .arg("/dev/stdout")
            .output()
        {
            if output.status.success() {
                return image::load_from_memory(&output.stdout)
                    .with_context(|| format!("Failed to read sips output for {:?}", path));
            }
        }
    }

    anyhow::bail!("Failed to convert HEIC file: {}", path.display())
}

/// Target size for an image no wider than `max_width`; narrower images keep their size.
pub fn fit_to_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}

fn resize_to_width(img: DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = fit_to_width(width, height, max_width);
    if (new_width, new_height) == (width, height) {
        img
    } else {
        img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
    }
}

fn encode_jpeg(img: &DynamicImage, quality: i32) -> Result<Vec<u8>> {
    let rgb_image = img.to_rgb8();
    let jpeg_data = turbojpeg::compress_image(&rgb_image, quality, turbojpeg::Subsamp::Sub2x2)
        .with_context(|| "Failed to compress image with turbojpeg")?;
    Ok(jpeg_data.to_vec())
}

/// Decodes a JPEG or HEIC file, resizes it to the configured width and re-encodes it as JPEG.
pub fn convert_to_web_jpeg(source_path: &Path, options: OutputOptions) -> Result<Vec<u8>> {
    let img = match MediaKind::from_path(source_path) {
        MediaKind::Jpeg => load_jpeg(source_path, options.max_width)?,
        MediaKind::Heic => load_heic(source_path)?,
        MediaKind::Unsupported => {
            anyhow::bail!("Unsupported media file: {}", source_path.display())
        }
    };

    let resized = resize_to_width(img, options.max_width);
    encode_jpeg(&resized, options.quality)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save(path).unwrap();
    }

    /// TIFF block with a single Orientation entry, little endian.
    fn exif_app1_segment(orientation: u16) -> Vec<u8> {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
        payload.extend_from_slice(&[0x01, 0x00]);
        payload.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00]);
        payload.extend_from_slice(&orientation.to_le_bytes());
        payload.extend_from_slice(&[0x00, 0x00]);
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        segment.extend_from_slice(&payload);
        segment
    }

    fn write_oriented_jpeg(path: &Path, width: u32, height: u32, orientation: u16) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        let mut encoded = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut encoded, image::ImageFormat::Jpeg)
            .unwrap();
        let encoded = encoded.into_inner();

        // APP1 goes right after SOI
        let mut data = encoded[..2].to_vec();
        data.extend_from_slice(&exif_app1_segment(orientation));
        data.extend_from_slice(&encoded[2..]);
        std::fs::write(path, data).unwrap();
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/IMG_3927.JPG")), MediaKind::Jpeg);
        assert_eq!(MediaKind::from_path(Path::new("IMG_3846.heic")), MediaKind::Heic);
        assert_eq!(MediaKind::from_path(Path::new("IMG_4126.HEIF")), MediaKind::Heic);
        assert_eq!(MediaKind::from_path(Path::new("clip.mp4")), MediaKind::Unsupported);
        assert_eq!(MediaKind::from_path(Path::new("README")), MediaKind::Unsupported);
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width(4032, 3024, 1280), (1280, 960));
        assert_eq!(fit_to_width(800, 600, 1280), (800, 600));
        assert_eq!(fit_to_width(1280, 720, 1280), (1280, 720));
        assert_eq!(fit_to_width(100_000, 10, 1280), (1280, 1));
    }

    #[test]
    fn test_convert_large_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("wide.jpg");
        write_test_jpeg(&source, 2560, 1440);

        let options = OutputOptions { max_width: 1280, quality: 80 };
        let data = convert_to_web_jpeg(&source, options).unwrap();
        let converted = image::load_from_memory(&data).unwrap();
        assert_eq!(converted.dimensions(), (1280, 720));
    }

    #[test]
    fn test_small_jpeg_keeps_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("small.JPEG");
        write_test_jpeg(&source, 320, 200);

        let options = OutputOptions { max_width: 1280, quality: 80 };
        let data = convert_to_web_jpeg(&source, options).unwrap();
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (320, 200));
    }

    #[test]
    fn test_reads_orientation_tag() {
        let dir = tempfile::tempdir().unwrap();
        let rotated = dir.path().join("portrait.jpg");
        write_oriented_jpeg(&rotated, 64, 32, 6);
        assert_eq!(read_exif_orientation(&rotated), 6);

        let plain = dir.path().join("plain.jpg");
        write_test_jpeg(&plain, 64, 32);
        assert_eq!(read_exif_orientation(&plain), 1);
    }

    #[test]
    fn test_rotated_jpeg_is_resized_to_full_width() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("IMG_4126.JPG");
        // stored landscape, displayed as 1440x2560 portrait
        write_oriented_jpeg(&source, 2560, 1440, 6);

        let options = OutputOptions { max_width: 1280, quality: 80 };
        let data = convert_to_web_jpeg(&source, options).unwrap();
        let converted = image::load_from_memory(&data).unwrap();
        assert_eq!(converted.dimensions(), (1280, 2276));
    }

    #[test]
    fn test_slightly_wide_jpeg_is_not_decoded_upscaled() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("narrow.jpg");
        write_test_jpeg(&source, 1200, 900);

        let img = load_jpeg(&source, 1280).unwrap();
        assert_eq!(img.dimensions(), (1200, 900));
    }

    #[test]
    fn test_unsupported_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "hello").unwrap();
        let options = OutputOptions { max_width: 1280, quality: 80 };
        assert!(convert_to_web_jpeg(&source, options).is_err());
    }
}
