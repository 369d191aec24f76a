//! Error adapter for converting SchemataError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use schemata::{SchemataError, store::StoreError};

/// Adapter giving a [`SchemataError`] a diagnostic code and, where one
/// helps, a hint on fixing the input.
pub struct ErrorAdapter<'a>(pub &'a SchemataError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            SchemataError::Io(_) => "schemata::io",
            SchemataError::Store(StoreError::Io { .. }) => "schemata::store::io",
            SchemataError::Store(StoreError::Parse { .. }) => "schemata::store::parse",
            SchemataError::Store(_) => "schemata::store",
            SchemataError::Schema(_) => "schemata::schema",
            SchemataError::Config(_) => "schemata::config",
            SchemataError::Unsaved(_) => "schemata::unsaved",
            SchemataError::Export(_) => "schemata::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            SchemataError::Store(StoreError::Parse { .. }) => {
                "schema files hold [[node_type]] and [[edge_type]] tables"
            }
            SchemataError::Store(StoreError::UnknownEndpoint { .. }) => {
                "declare a [[node_type]] for every `from` and `to` of an edge type"
            }
            SchemataError::Store(StoreError::DuplicateNodeType(_))
            | SchemataError::Store(StoreError::DuplicateEdgeType(_)) => {
                "names are compared after conversion to SCREAMING_SNAKE_CASE"
            }
            SchemataError::Config(_) => "colors accept any CSS color, such as \"teal\" or \"#2563EB\"",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Wrap `err` for rendering by a miette report handler.
pub fn to_reportable(err: &SchemataError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use schemata::identifier::Id;

    use super::*;

    #[test]
    fn test_code_per_variant() {
        let err = SchemataError::Config("bad".to_string());
        let reportable = to_reportable(&err);
        assert_eq!(reportable.code().unwrap().to_string(), "schemata::config");
        assert_eq!(reportable.to_string(), "Configuration error: bad");

        let err = SchemataError::Store(StoreError::Io {
            path: PathBuf::from("schema.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        assert_eq!(
            to_reportable(&err).code().unwrap().to_string(),
            "schemata::store::io"
        );
        assert!(to_reportable(&err).help().is_none());
    }

    #[test]
    fn test_unknown_endpoint_has_help() {
        let err = SchemataError::Store(StoreError::UnknownEndpoint {
            edge: Id::new("WORKS_AT"),
            node: Id::new("COMPANY"),
        });
        let reportable = to_reportable(&err);
        assert_eq!(reportable.code().unwrap().to_string(), "schemata::store");
        assert!(reportable.help().unwrap().to_string().contains("[[node_type]]"));
    }

    #[test]
    fn test_unsaved_changes() {
        let err = SchemataError::Unsaved(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "2 change(s) could not be saved: a; b");
        assert_eq!(
            to_reportable(&err).code().unwrap().to_string(),
            "schemata::unsaved"
        );
    }
}
