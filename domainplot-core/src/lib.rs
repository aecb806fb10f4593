pub mod arith;
pub mod color;
pub mod complex;
pub mod error;
pub mod expr;
pub mod notify;
pub mod readout;
pub mod request;
pub mod viewport;

// Re-export primary types for convenience.
pub use color::{domain_color, ColorParams, Rgb};
pub use complex::Complex;
pub use error::{CoreError, ValidationError};
pub use expr::{evaluate, Expression, Token};
pub use notify::Notifier;
pub use readout::{PointSummary, Readout};
pub use request::PlotRequest;
pub use viewport::Viewport;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
