//! Interactive plotting session driven by line commands.
//!
//! A [`Session`] holds the last accepted plot, the output size and the
//! cursor, and owns the background [`PlotRenderer`]. Submissions are
//! validated as a whole: a rejected submission leaves the previous plot in
//! place.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info, warn};

use domainplot_core::viewport::validate_dimensions;
use domainplot_core::{ColorParams, PlotRequest, Readout};
use domainplot_render::{export_plot, Frame, PlotEvent, PlotRenderer, RenderOutput};

use crate::error::AppError;
use crate::preferences::Preferences;

/// How long `wait` blocks for a render.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Session {
    request: PlotRequest,
    width: u32,
    height: u32,
    cursor: Option<(f64, f64)>,
    params: ColorParams,
    export_height: u32,
    images_dir: PathBuf,
    renderer: PlotRenderer,
}

impl Session {
    /// Start a session showing the preferred default plot and request its
    /// first render.
    pub fn new(preferences: &Preferences) -> Result<Self, AppError> {
        let (width, height) = (preferences.preview_width, preferences.preview_height);
        let (width, height) = match validate_dimensions(width, height) {
            Ok(()) => (width, height),
            Err(e) => {
                warn!("Ignoring preview size: {e}");
                let defaults = Preferences::default();
                (defaults.preview_width, defaults.preview_height)
            }
        };
        let mut session = Self {
            request: preferences.initial_request(),
            width,
            height,
            cursor: None,
            params: preferences.color_params(),
            export_height: preferences.export_height.max(1),
            images_dir: preferences.images_dir(),
            renderer: PlotRenderer::new()?,
        };
        session.rerender()?;
        Ok(session)
    }

    /// Validate and commit a new plot, then re-render.
    ///
    /// Every field is checked; if any fails the previous plot is retained and
    /// all failures are returned together.
    pub fn submit(
        &mut self,
        expression: &str,
        re_upper: &str,
        re_lower: &str,
        im_upper: &str,
        im_lower: &str,
    ) -> Result<u64, AppError> {
        let request =
            match PlotRequest::from_fields(expression, re_upper, re_lower, im_upper, im_lower) {
                Ok(request) => request,
                Err(e) => {
                    warn!("Plot rejected: {e}");
                    return Err(e.into());
                }
            };
        info!(expression = request.expression.source(), "Plot accepted");
        self.request = request;
        self.renderer.notify(PlotEvent::InputChanged);
        self.rerender()
    }

    /// Change the output size. Renders again only if it actually changed.
    ///
    /// Sizes that are empty or too large to render are rejected and the
    /// previous size is kept.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Option<u64>, AppError> {
        validate_dimensions(width, height)?;
        if (width, height) == (self.width, self.height) {
            debug!(width, height, "Size unchanged");
            return Ok(None);
        }
        self.width = width;
        self.height = height;
        self.rerender().map(Some)
    }

    /// Move the cursor to `(col, row)` and read out the point beneath it.
    pub fn point(&mut self, col: f64, row: f64) -> Result<Readout, AppError> {
        let readout = Readout::at_pixel(&self.request, col, row, self.width, self.height)?;
        self.cursor = Some((col, row));
        self.renderer.notify(PlotEvent::CursorMoved { col, row });
        Ok(readout)
    }

    /// Block until the latest render is installed.
    pub fn wait(&mut self, timeout: Duration) -> Result<Option<&Frame>, AppError> {
        Ok(self.renderer.wait_latest(timeout)?)
    }

    /// Render the committed plot at export resolution and write it to `path`.
    pub fn export(&self, path: &Path) -> Result<RenderOutput, AppError> {
        Ok(export_plot(
            &self.request,
            self.export_height,
            &self.params,
            path,
        )?)
    }

    /// Export into the images directory under a generated name.
    pub fn export_default(&self) -> Result<(PathBuf, RenderOutput), AppError> {
        let path = self
            .images_dir
            .join(crate::app_dir::export_file_name());
        let output = self.export(&path)?;
        Ok((path, output))
    }

    pub fn request(&self) -> &PlotRequest {
        &self.request
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    #[cfg(test)]
    pub fn renderer_mut(&mut self) -> &mut PlotRenderer {
        &mut self.renderer
    }

    fn rerender(&mut self) -> Result<u64, AppError> {
        Ok(self
            .renderer
            .request(self.request.clone(), self.width, self.height, self.params)?)
    }

    /// Execute one command, writing its response to `out`.
    ///
    /// Returns `false` once the session should end.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<bool, AppError> {
        // Install whatever finished since the last command.
        self.renderer.poll()?;
        match command {
            Command::Plot { expression, bounds } => {
                let [ru, rl, iu, il] = &bounds;
                let gen = self.submit(&expression, ru, rl, iu, il)?;
                writeln!(out, "rendering generation {gen}")?;
            }
            Command::Size { width, height } => match self.resize(width, height)? {
                Some(gen) => writeln!(out, "rendering generation {gen}")?,
                None => writeln!(out, "size unchanged")?,
            },
            Command::Point { col, row } => {
                let readout = self.point(col, row)?;
                writeln!(out, "{readout}")?;
            }
            Command::Wait => match self.wait(WAIT_TIMEOUT)? {
                Some(frame) => writeln!(
                    out,
                    "image ready: generation {}, {}x{}, {} undefined pixels, {} ms",
                    frame.generation,
                    frame.output.image.width,
                    frame.output.image.height,
                    frame.output.undefined_pixels,
                    frame.output.elapsed.as_millis()
                )?,
                None => writeln!(out, "no image")?,
            },
            Command::Export { path } => {
                let (path, output) = match path {
                    Some(path) => {
                        let output = self.export(&path)?;
                        (path, output)
                    }
                    None => self.export_default()?,
                };
                writeln!(
                    out,
                    "exported {}x{} to {}",
                    output.image.width,
                    output.image.height,
                    path.display()
                )?;
            }
            Command::Status => {
                let vp = &self.request().viewport;
                writeln!(
                    out,
                    "plot: f(z) = {} over Re [{}, {}], Im [{}, {}]",
                    self.request().expression,
                    vp.re_lower,
                    vp.re_upper,
                    vp.im_lower,
                    vp.im_upper
                )?;
                let (width, height) = self.size();
                let (done, total) = self.renderer.progress();
                writeln!(
                    out,
                    "size: {width}x{height}, generation {}, rows {done}/{total}",
                    self.renderer.latest_generation()
                )?;
                match self.cursor() {
                    Some((col, row)) => writeln!(out, "cursor: ({col}, {row})")?,
                    None => writeln!(out, "cursor: none")?,
                }
                match self.renderer.current() {
                    Some(frame) => writeln!(out, "image: generation {}", frame.generation)?,
                    None => writeln!(out, "image: none")?,
                }
            }
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Read commands from `input` until it ends or `quit` is read.
    ///
    /// Bad commands and rejected plots are reported on `out` and the session
    /// carries on; only I/O failures end it early.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<(), AppError> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let result = line
                .parse::<Command>()
                .and_then(|command| self.execute(command, &mut out));
            match result {
                Ok(true) => {}
                Ok(false) => break,
                Err(AppError::Io(e)) => return Err(AppError::Io(e)),
                Err(e) => writeln!(out, "error: {e}")?,
            }
            out.flush()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One line of session input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `plot <expr> ; <re_upper> <re_lower> <im_upper> <im_lower>`
    Plot {
        expression: String,
        bounds: [String; 4],
    },
    /// `size <width> <height>`
    Size { width: u32, height: u32 },
    /// `point <col> <row>`
    Point { col: f64, row: f64 },
    /// `wait`
    Wait,
    /// `export [path]`
    Export { path: Option<PathBuf> },
    /// `status`
    Status,
    /// `quit`
    Quit,
}

const PLOT_USAGE: &str = "plot <expr> ; <re_upper> <re_lower> <im_upper> <im_lower>";
const SIZE_USAGE: &str = "size <width> <height>";
const POINT_USAGE: &str = "point <col> <row>";

impl FromStr for Command {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(v, r)| (v, r.trim()))
            .unwrap_or((line, ""));

        match verb {
            "plot" => {
                let (expression, bounds) = rest.split_once(';').ok_or(AppError::Usage(PLOT_USAGE))?;
                let bounds: Vec<&str> = bounds.split_whitespace().collect();
                let bounds: [&str; 4] = bounds
                    .try_into()
                    .map_err(|_| AppError::Usage(PLOT_USAGE))?;
                Ok(Command::Plot {
                    expression: expression.trim().to_string(),
                    bounds: bounds.map(str::to_string),
                })
            }
            "size" => {
                let [width, height] = two_numbers(rest, SIZE_USAGE)?;
                Ok(Command::Size { width, height })
            }
            "point" => {
                let [col, row] = two_numbers(rest, POINT_USAGE)?;
                Ok(Command::Point { col, row })
            }
            "wait" => Ok(Command::Wait),
            "export" => Ok(Command::Export {
                path: (!rest.is_empty()).then(|| PathBuf::from(rest)),
            }),
            "status" => Ok(Command::Status),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(AppError::UnknownCommand(other.to_string())),
        }
    }
}

fn two_numbers<T: FromStr>(text: &str, usage: &'static str) -> Result<[T; 2], AppError> {
    let mut parts = text.split_whitespace().map(str::parse::<T>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok([a, b]),
        _ => Err(AppError::Usage(usage)),
    }
}
