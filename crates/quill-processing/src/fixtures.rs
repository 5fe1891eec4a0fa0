//! Synthetic images with hand-built EXIF blocks, for tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_GPS_IFD_POINTER: u16 = 0x8825;
const TAG_DATE_TIME: u16 = 0x0132;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_PIXEL_X_DIMENSION: u16 = 0xA002;
const TAG_PIXEL_Y_DIMENSION: u16 = 0xA003;
const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
const TAG_GPS_LATITUDE: u16 = 0x0002;
const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
const TAG_GPS_LONGITUDE: u16 = 0x0004;

/// What to put in the EXIF block.
#[derive(Debug, Clone, Default)]
pub struct ExifFixture {
    /// Signed decimal degrees.
    pub gps: Option<(f64, f64)>,
    pub date_time_original: Option<&'static str>,
    pub date_time: Option<&'static str>,
    pub pixel_dimensions: Option<(u32, u32)>,
}

#[derive(Clone)]
struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    fn ascii(tag: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        Entry {
            tag,
            kind: TYPE_ASCII,
            count: data.len() as u32,
            data,
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        Entry {
            tag,
            kind: TYPE_LONG,
            count: 1,
            data: value.to_le_bytes().to_vec(),
        }
    }

    fn rationals(tag: u16, values: &[(u32, u32)]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for (num, denom) in values {
            data.extend_from_slice(&num.to_le_bytes());
            data.extend_from_slice(&denom.to_le_bytes());
        }
        Entry {
            tag,
            kind: TYPE_RATIONAL,
            count: values.len() as u32,
            data,
        }
    }
}

fn ifd_len(entries: usize) -> u32 {
    (2 + 12 * entries + 4) as u32
}

/// Serialize one IFD that starts at `start` (offset from the TIFF header).
fn write_ifd(entries: &[Entry], start: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let mut data_area: Vec<u8> = Vec::new();
    let data_start = start + ifd_len(entries.len());

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.kind.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.data.len() <= 4 {
            let mut inline = entry.data.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            let offset = data_start + data_area.len() as u32;
            out.extend_from_slice(&offset.to_le_bytes());
            data_area.extend_from_slice(&entry.data);
            if data_area.len() % 2 == 1 {
                data_area.push(0);
            }
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data_area);
    out
}

/// Decimal degrees to DMS rationals with seconds at 1/10000 precision.
fn to_dms(value: f64) -> [(u32, u32); 3] {
    let abs = value.abs();
    let degrees = abs.trunc();
    let minutes = ((abs - degrees) * 60.0).trunc();
    let seconds = (abs - degrees - minutes / 60.0) * 3600.0;
    [
        (degrees as u32, 1),
        (minutes as u32, 1),
        ((seconds * 10_000.0).round() as u32, 10_000),
    ]
}

/// A little-endian TIFF structure holding only the requested EXIF fields.
pub fn exif_tiff(fixture: &ExifFixture) -> Vec<u8> {
    let mut ifd0: Vec<Entry> = Vec::new();
    if let Some(date) = fixture.date_time {
        ifd0.push(Entry::ascii(TAG_DATE_TIME, date));
    }

    let mut exif_ifd: Vec<Entry> = Vec::new();
    if let Some(date) = fixture.date_time_original {
        exif_ifd.push(Entry::ascii(TAG_DATE_TIME_ORIGINAL, date));
    }
    if let Some((w, h)) = fixture.pixel_dimensions {
        exif_ifd.push(Entry::long(TAG_PIXEL_X_DIMENSION, w));
        exif_ifd.push(Entry::long(TAG_PIXEL_Y_DIMENSION, h));
    }

    let mut gps_ifd: Vec<Entry> = Vec::new();
    if let Some((lat, lon)) = fixture.gps {
        gps_ifd.push(Entry::ascii(
            TAG_GPS_LATITUDE_REF,
            if lat < 0.0 { "S" } else { "N" },
        ));
        gps_ifd.push(Entry::rationals(TAG_GPS_LATITUDE, &to_dms(lat)));
        gps_ifd.push(Entry::ascii(
            TAG_GPS_LONGITUDE_REF,
            if lon < 0.0 { "W" } else { "E" },
        ));
        gps_ifd.push(Entry::rationals(TAG_GPS_LONGITUDE, &to_dms(lon)));
    }

    // IFD0 size depends on how many pointer entries it carries, and pointer values are
    // inline, so the layout can be computed up front.
    let pointer_count = usize::from(!exif_ifd.is_empty()) + usize::from(!gps_ifd.is_empty());
    let ifd0_start = 8u32;
    let mut sized = ifd0.clone();
    sized.extend((0..pointer_count).map(|_| Entry::long(0, 0)));
    let ifd0_size = write_ifd(&sized, ifd0_start).len() as u32;

    let exif_start = ifd0_start + ifd0_size;
    let exif_bytes = if exif_ifd.is_empty() {
        Vec::new()
    } else {
        write_ifd(&exif_ifd, exif_start)
    };
    let gps_start = exif_start + exif_bytes.len() as u32;
    let gps_bytes = if gps_ifd.is_empty() {
        Vec::new()
    } else {
        write_ifd(&gps_ifd, gps_start)
    };

    if !exif_ifd.is_empty() {
        ifd0.push(Entry::long(TAG_EXIF_IFD_POINTER, exif_start));
    }
    if !gps_ifd.is_empty() {
        ifd0.push(Entry::long(TAG_GPS_IFD_POINTER, gps_start));
    }
    // IFD entries must be sorted by tag.
    ifd0.sort_by_key(|e| e.tag);

    let mut tiff = vec![b'I', b'I', 42, 0];
    tiff.extend_from_slice(&ifd0_start.to_le_bytes());
    tiff.extend_from_slice(&write_ifd(&ifd0, ifd0_start));
    tiff.extend_from_slice(&exif_bytes);
    tiff.extend_from_slice(&gps_bytes);
    tiff
}

/// A real, decodable PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode png fixture");
    out
}

/// A real JPEG of the given size with an APP1 EXIF segment right after SOI.
pub fn jpeg_with_exif(width: u32, height: u32, fixture: &ExifFixture) -> Vec<u8> {
    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
        .expect("encode jpeg fixture");

    let tiff = exif_tiff(fixture);
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(encoded.len() + payload.len() + 4);
    out.extend_from_slice(&encoded[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&encoded[2..]);
    out
}
