pub mod buffer;
pub mod error;
pub mod events;
pub mod export;
pub mod renderer;
pub mod worker;

pub use buffer::RenderBuffer;
pub use error::RenderError;
pub use events::PlotEvent;
pub use export::{export_plot, export_png, ExportMetadata, EXPORT_HEIGHT};
pub use renderer::{render, render_headless, render_request, RenderCancel, RenderOutput};
pub use worker::{Frame, PlotRenderer, RenderJob};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
