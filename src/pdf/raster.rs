use anyhow::Context;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;

/// PDF viewers refuse pages larger than 14400pt on either side
const MAX_PAGE_POINTS: f64 = 14_400.0;

/// CSS pixels to PDF points (96 dpi to 72 dpi)
const POINTS_PER_PIXEL: f64 = 0.75;

/// Wraps a PNG screenshot in a single-page PDF
///
/// The image is re-encoded as JPEG and embedded as an image XObject that
/// fills the page. The page keeps the screenshot's aspect ratio, scaled down
/// if it would exceed the largest page size viewers accept.
pub fn png_to_pdf(png: &[u8]) -> anyhow::Result<Vec<u8>> {
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png)
        .context("decoding screenshot")?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let (width_px, height_px) = (rgb.width(), rgb.height());
    anyhow::ensure!(width_px > 0 && height_px > 0, "screenshot is empty");

    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .context("encoding screenshot as JPEG")?;

    let mut width_pt = f64::from(width_px) * POINTS_PER_PIXEL;
    let mut height_pt = f64::from(height_px) * POINTS_PER_PIXEL;
    let scale = (MAX_PAGE_POINTS / width_pt)
        .min(MAX_PAGE_POINTS / height_pt)
        .min(1.0);
    width_pt = (width_pt * scale).round().max(1.0);
    height_pt = (height_pt * scale).round().max(1.0);
    let (w, h) = (width_pt as i64, height_pt as i64);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width_px),
            "Height" => i64::from(height_px),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
    .with_compression(false);
    let image_id = doc.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().context("encoding page content")?,
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).context("serializing screenshot PDF")?;
    Ok(out)
}
