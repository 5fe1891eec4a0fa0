use quill_processing::fixtures::{jpeg_with_exif, png_bytes, ExifFixture};

/// `photo.jpg`: 2000x1500 with a GPS fix in San Francisco.
pub fn photo_jpeg() -> Vec<u8> {
    jpeg_with_exif(
        2000,
        1500,
        &ExifFixture {
            gps: Some((37.77, -122.41)),
            ..ExifFixture::default()
        },
    )
}

pub fn small_png() -> Vec<u8> {
    png_bytes(40, 30)
}
