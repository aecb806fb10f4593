use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use domainplot_core::viewport::validate_dimensions;
use domainplot_core::{domain_color, ColorParams, Expression, PlotRequest, Rgb, Viewport};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current render generation for cancellation and progress.
///
/// Incrementing the generation signals every in-flight row to stop early.
/// The progress counters report finished rows.
#[derive(Debug)]
pub struct RenderCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Cancel the current render by advancing the generation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Read the current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset progress for a new render of `total` rows.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    /// Increment completed rows by one.
    pub fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the current progress as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A completed, uninterrupted render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub image: RenderBuffer,
    pub elapsed: Duration,
    /// Pixels whose evaluation failed or produced a non-finite value.
    pub undefined_pixels: usize,
}

// ---------------------------------------------------------------------------
// Full-frame render
// ---------------------------------------------------------------------------

/// Render `expression` over `viewport` into a `width × height` image.
///
/// Rows are processed in parallel via Rayon, each with its own scratch
/// stack. Before starting a row the worker compares the `cancel`
/// generation against the one captured at entry; if another thread has
/// advanced it, the remaining rows are skipped and the render returns
/// [`RenderError::Cancelled`]. A partially computed image is never returned.
///
/// Pixels whose evaluation fails (a pole, say) are painted
/// [`Rgb::UNDEFINED`] and the render carries on.
pub fn render(
    expression: &Expression,
    viewport: &Viewport,
    width: u32,
    height: u32,
    params: &ColorParams,
    cancel: &Arc<RenderCancel>,
) -> crate::Result<RenderOutput> {
    let gen = cancel.generation();
    render_at_generation(expression, viewport, width, height, params, cancel, gen)
}

/// Render a [`PlotRequest`] snapshot.
pub fn render_request(
    request: &PlotRequest,
    width: u32,
    height: u32,
    params: &ColorParams,
    cancel: &Arc<RenderCancel>,
) -> crate::Result<RenderOutput> {
    render(
        &request.expression,
        &request.viewport,
        width,
        height,
        params,
        cancel,
    )
}

/// Render on the calling thread's pool with a private, never-cancelled
/// handle. Used for exports and tests.
pub fn render_headless(
    expression: &Expression,
    viewport: &Viewport,
    width: u32,
    height: u32,
    params: &ColorParams,
) -> crate::Result<RenderOutput> {
    let cancel = Arc::new(RenderCancel::new());
    render(expression, viewport, width, height, params, &cancel)
}

fn render_at_generation(
    expression: &Expression,
    viewport: &Viewport,
    width: u32,
    height: u32,
    params: &ColorParams,
    cancel: &RenderCancel,
    gen: u64,
) -> crate::Result<RenderOutput> {
    if validate_dimensions(width, height).is_err() {
        return Err(RenderError::InvalidDimensions { width, height });
    }

    let start = Instant::now();
    debug!(
        width,
        height,
        expression = expression.source(),
        "Starting render"
    );

    let mut image = RenderBuffer::new(width, height);
    let stride = image.stride();
    let undefined = AtomicUsize::new(0);
    cancel.reset_progress(height as usize);

    image
        .pixels
        .par_chunks_mut(stride)
        .enumerate()
        .for_each_init(
            || expression.scratch(),
            |stack, (row, line)| {
                if cancel.generation() != gen {
                    return;
                }
                let row_undefined =
                    render_row(expression, viewport, width, height, params, stack, row, line);
                undefined.fetch_add(row_undefined, Ordering::Relaxed);
                cancel.inc_progress();
            },
        );

    if cancel.generation() != gen {
        let (done, total) = cancel.progress();
        debug!(rows_done = done, rows_total = total, "Render cancelled");
        return Err(RenderError::Cancelled);
    }

    let undefined_pixels = undefined.load(Ordering::Relaxed);
    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        width, height, undefined_pixels, "Render complete"
    );

    Ok(RenderOutput {
        image,
        elapsed,
        undefined_pixels,
    })
}

/// Color one row of RGBA bytes. Returns the number of undefined pixels.
#[allow(clippy::too_many_arguments)]
fn render_row(
    expression: &Expression,
    viewport: &Viewport,
    width: u32,
    height: u32,
    params: &ColorParams,
    stack: &mut Vec<domainplot_core::Complex>,
    row: usize,
    line: &mut [u8],
) -> usize {
    let mut undefined = 0;
    for (col, px) in line.chunks_exact_mut(RenderBuffer::CHANNELS).enumerate() {
        let z = viewport.pixel_to_complex(col as f64, row as f64, width, height);
        let color = match expression.eval_with(z, stack) {
            Ok(w) if w.is_finite() => domain_color(w, params),
            _ => {
                undefined += 1;
                Rgb::UNDEFINED
            }
        };
        px.copy_from_slice(&color.to_rgba());
    }
    undefined
}

#[cfg(test)]
mod tests {
    use super::*;
    use domainplot_core::Complex;

    fn expr(src: &str) -> Expression {
        Expression::parse(src).unwrap()
    }

    #[test]
    fn basic_render_produces_pixels() {
        let viewport = Viewport::centered(2.0).unwrap();
        let out = render_headless(&expr("z"), &viewport, 128, 96, &ColorParams::default()).unwrap();

        assert_eq!(out.image.width, 128);
        assert_eq!(out.image.height, 96);
        assert_eq!(out.image.pixels.len(), 128 * 96 * 4);
        assert_eq!(out.undefined_pixels, 0);
    }

    #[test]
    fn pixels_match_pointwise_coloring() {
        let viewport = Viewport::new(3.0, -1.0, 2.0, -2.0).unwrap();
        let e = expr("z z * 1 -");
        let params = ColorParams::default();
        let out = render_headless(&e, &viewport, 16, 8, &params).unwrap();

        for (col, row) in [(0, 0), (5, 3), (15, 7)] {
            let z = viewport.pixel_to_complex(col as f64, row as f64, 16, 8);
            let expected = domain_color(e.eval(z).unwrap(), &params);
            assert_eq!(out.image.pixel(col, row), Some(expected));
        }
    }

    #[test]
    fn pole_is_counted_undefined() {
        let viewport = Viewport::centered(1.0).unwrap();
        let out = render_headless(&expr("1 z /"), &viewport, 4, 4, &ColorParams::default())
            .unwrap();
        assert_eq!(out.undefined_pixels, 1);
        assert_eq!(out.image.pixel(2, 2), Some(Rgb::UNDEFINED));
    }

    #[test]
    fn non_finite_output_is_undefined() {
        // ln 0 = -inf, propagated through the product.
        let viewport = Viewport::centered(1.0).unwrap();
        let out =
            render_headless(&expr("z ln 2 *"), &viewport, 4, 4, &ColorParams::default()).unwrap();
        assert_eq!(out.undefined_pixels, 1);
        assert_eq!(out.image.pixel(2, 2), Some(Rgb::UNDEFINED));
        assert_ne!(out.image.pixel(0, 0), Some(Rgb::UNDEFINED));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let viewport = Viewport::default();
        let err = render_headless(&expr("z"), &viewport, 0, 10, &ColorParams::default());
        assert!(matches!(
            err,
            Err(RenderError::InvalidDimensions {
                width: 0,
                height: 10
            })
        ));
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        use domainplot_core::viewport::MAX_DIMENSION;

        let viewport = Viewport::default();
        let params = ColorParams::default();
        for (width, height) in [
            (MAX_DIMENSION + 1, 1),
            (1, u32::MAX),
            (MAX_DIMENSION, MAX_DIMENSION),
            (200_000, 200_000),
        ] {
            let result = render_headless(&expr("z"), &viewport, width, height, &params);
            assert!(
                matches!(result, Err(RenderError::InvalidDimensions { .. })),
                "{width}x{height} should be rejected"
            );
        }
    }

    #[test]
    fn stale_generation_renders_nothing() {
        let cancel = RenderCancel::new();
        cancel.cancel();
        let result = render_at_generation(
            &expr("z"),
            &Viewport::default(),
            64,
            64,
            &ColorParams::default(),
            &cancel,
            0,
        );
        assert!(matches!(result, Err(RenderError::Cancelled)));
        assert_eq!(cancel.progress(), (0, 64));
    }

    #[test]
    fn progress_reaches_total() {
        let cancel = Arc::new(RenderCancel::new());
        render(
            &expr("z sin"),
            &Viewport::default(),
            32,
            20,
            &ColorParams::default(),
            &cancel,
        )
        .unwrap();
        assert_eq!(cancel.progress(), (20, 20));
    }

    #[test]
    fn cancellation_stops_render() {
        let e = expr("z sin z cos * z exp / z 3 ^ +");
        let viewport = Viewport::default();
        let cancel = Arc::new(RenderCancel::new());

        let cancel_clone = Arc::clone(&cancel);
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(5));
            cancel_clone.cancel();
        });

        match render(&e, &viewport, 2048, 2048, &ColorParams::default(), &cancel) {
            Err(RenderError::Cancelled) => {
                let (done, total) = cancel.progress();
                assert!(done < total, "not every row should have been rendered");
            }
            Ok(out) => assert_eq!(out.image.height, 2048),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn render_request_matches_render() {
        let request = PlotRequest::new(expr("z conj"), Viewport::centered(1.0).unwrap());
        let cancel = Arc::new(RenderCancel::new());
        let a = render_request(&request, 8, 8, &ColorParams::default(), &cancel).unwrap();
        let b = render_headless(
            &request.expression,
            &request.viewport,
            8,
            8,
            &ColorParams::default(),
        )
        .unwrap();
        assert_eq!(a.image, b.image);
        assert_eq!(
            a.image.pixel(0, 0),
            Some(domain_color(Complex::new(-1.0, -1.0), &ColorParams::default()))
        );
    }
}
