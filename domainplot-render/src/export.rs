//! PNG export with embedded metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::{debug, info};

use domainplot_core::{ColorParams, PlotRequest, Viewport};

use crate::buffer::RenderBuffer;
use crate::renderer::{render_headless, RenderOutput};

/// Default height in pixels of an exported image.
pub const EXPORT_HEIGHT: u32 = 2048;

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone)]
pub struct ExportMetadata {
    pub expression: String,
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
}

impl ExportMetadata {
    pub fn from_request(request: &PlotRequest, width: u32, height: u32) -> Self {
        Self {
            expression: request.expression.source().to_string(),
            viewport: request.viewport,
            width,
            height,
        }
    }
}

/// Write an RGBA pixel buffer as a PNG file with embedded plot metadata.
///
/// Uses the `png` crate directly to inject custom tEXt chunks readable by
/// exiftool and most image viewers. Missing parent directories are created.
pub fn export_png(
    buffer: &RenderBuffer,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "DomainPlot".to_string())?;
    encoder.add_text_chunk("Description".to_string(), build_description(metadata))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&buffer.pixels)?;

    debug!(
        "Exported PNG {}x{} to {}",
        buffer.width,
        buffer.height,
        path.display()
    );
    Ok(())
}

/// Render `request` headlessly at `height` pixels, with the width chosen to
/// preserve the viewport's aspect ratio, and write it to `path`.
pub fn export_plot(
    request: &PlotRequest,
    height: u32,
    params: &ColorParams,
    path: &Path,
) -> crate::Result<RenderOutput> {
    let width = request.viewport.export_width(height);
    let output = render_headless(
        &request.expression,
        &request.viewport,
        width,
        height,
        params,
    )?;
    let metadata = ExportMetadata::from_request(request, width, height);
    export_png(&output.image, path, &metadata)?;
    info!(
        path = %path.display(),
        width,
        height,
        elapsed_ms = output.elapsed.as_millis(),
        "Exported plot"
    );
    Ok(output)
}

fn build_description(meta: &ExportMetadata) -> String {
    let vp = &meta.viewport;
    format!(
        "f(z) = {} over Re [{}, {}], Im [{}, {}]",
        meta.expression, vp.re_lower, vp.re_upper, vp.im_lower, vp.im_upper,
    )
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    let vp = &meta.viewport;
    vec![
        ("DomainPlot.Expression".into(), meta.expression.clone()),
        ("DomainPlot.ReUpper".into(), vp.re_upper.to_string()),
        ("DomainPlot.ReLower".into(), vp.re_lower.to_string()),
        ("DomainPlot.ImUpper".into(), vp.im_upper.to_string()),
        ("DomainPlot.ImLower".into(), vp.im_lower.to_string()),
        (
            "DomainPlot.Resolution".into(),
            format!("{}x{}", meta.width, meta.height),
        ),
    ]
}
