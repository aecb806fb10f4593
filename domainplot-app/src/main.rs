mod app_dir;
mod error;
mod preferences;
mod session;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use domainplot_core::{Complex, Expression, PlotRequest, Readout};
use domainplot_render::export_plot;

use error::AppError;
use preferences::Preferences;
use session::Session;

#[derive(Parser)]
#[command(
    name = "domainplot",
    version,
    about = "Domain-coloring plots of complex functions written in postfix notation"
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Evaluate an expression at one point
    Eval {
        /// Postfix expression in the variable `z`, e.g. "z 2 ^ 1 +"
        expression: String,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        re: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        im: f64,
    },
    /// Render an expression and write it as a PNG
    Export {
        expression: String,
        #[command(flatten)]
        bounds: BoundArgs,
        /// Image height in pixels; the width follows the viewport's aspect ratio
        #[arg(long)]
        height: Option<u32>,
        /// Output file (default: a new file in the images directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the input and output values under one pixel
    Readout {
        expression: String,
        #[command(flatten)]
        bounds: BoundArgs,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, allow_hyphen_values = true)]
        col: f64,
        #[arg(long, allow_hyphen_values = true)]
        row: f64,
    },
    /// Read plot, size, point, wait and export commands from stdin
    Session,
}

/// Viewport bounds as typed. Missing bounds come from preferences.
#[derive(Args)]
struct BoundArgs {
    #[arg(long, allow_hyphen_values = true)]
    re_upper: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    re_lower: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    im_upper: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    im_lower: Option<String>,
}

impl BoundArgs {
    /// Validate the expression and bounds together.
    fn request(&self, expression: &str, prefs: &Preferences) -> Result<PlotRequest, AppError> {
        let or_default = |arg: &Option<String>, fallback: f64| {
            arg.clone().unwrap_or_else(|| fallback.to_string())
        };
        Ok(PlotRequest::from_fields(
            expression,
            &or_default(&self.re_upper, prefs.re_upper),
            &or_default(&self.re_lower, prefs.re_lower),
            &or_default(&self.im_upper, prefs.im_upper),
            &or_default(&self.im_lower, prefs.im_lower),
        )?)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let prefs = Preferences::load();

    let result = match cli.command {
        Cmd::Eval { expression, re, im } => cmd_eval(&expression, Complex::new(re, im)),
        Cmd::Export {
            expression,
            bounds,
            height,
            output,
        } => cmd_export(&expression, &bounds, height, output, &prefs),
        Cmd::Readout {
            expression,
            bounds,
            width,
            height,
            col,
            row,
        } => cmd_readout(&expression, &bounds, width, height, col, row, &prefs),
        Cmd::Session => cmd_session(&prefs),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_eval(expression: &str, z: Complex) -> Result<(), AppError> {
    let expression = Expression::parse(expression)?;
    let value = expression.eval(z)?;
    println!("{value}");
    Ok(())
}

fn cmd_export(
    expression: &str,
    bounds: &BoundArgs,
    height: Option<u32>,
    output: Option<PathBuf>,
    prefs: &Preferences,
) -> Result<(), AppError> {
    let request = bounds.request(expression, prefs)?;
    let height = height.unwrap_or(prefs.export_height).max(1);
    let path = output.unwrap_or_else(|| prefs.images_dir().join(app_dir::export_file_name()));

    let out = export_plot(&request, height, &prefs.color_params(), &path)?;
    info!(
        undefined_pixels = out.undefined_pixels,
        "Wrote {}", path.display()
    );
    println!(
        "exported {}x{} to {}",
        out.image.width,
        out.image.height,
        path.display()
    );
    Ok(())
}

fn cmd_readout(
    expression: &str,
    bounds: &BoundArgs,
    width: u32,
    height: u32,
    col: f64,
    row: f64,
    prefs: &Preferences,
) -> Result<(), AppError> {
    let request = bounds.request(expression, prefs)?;
    let readout = Readout::at_pixel(&request, col, row, width, height)?;
    println!("{readout}");
    if let Some((c, r)) = readout.input_marker {
        println!("input marker  : ({c}, {r})");
    }
    if let Some((c, r)) = readout.output_marker {
        println!("output marker : ({c}, {r})");
    }
    Ok(())
}

fn cmd_session(prefs: &Preferences) -> Result<(), AppError> {
    info!("Starting DomainPlot session");
    let mut session = Session::new(prefs)?;
    let stdin = io::stdin();
    let stdout = BufWriter::new(io::stdout().lock());
    session.run(stdin.lock(), stdout)?;
    io::stdout().flush()?;
    Ok(())
}
