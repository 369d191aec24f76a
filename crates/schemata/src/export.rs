//! Export of laid-out canvases.
//!
//! The [`Exporter`] trait is the last step of the pipeline:
//!
//! ```text
//! Schema store
//!     ↓ reload
//! Canvas (positioned nodes, derived handles)
//!     ↓ edge geometry
//! Straight edges and self-loop arcs
//!     ↓ export (this module)
//! Output file
//! ```
//!
//! [`Error`] converts into [`SchemataError::Export`] at the crate boundary.
//!
//! [`SchemataError::Export`]: crate::SchemataError::Export

/// SVG export backend.
pub mod svg;

use crate::canvas::CanvasState;

/// Abstraction for canvas export backends.
pub trait Exporter {
    /// Exports every node and edge of `state` to the backend's output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the canvas cannot be converted to the
    /// target format, or [`Error::Io`] if writing the output fails.
    fn export_canvas(&mut self, state: &CanvasState) -> Result<(), Error>;
}

/// Errors that can occur during export.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
