//! Error types for the dataset pipeline.

use thiserror::Error;

/// Errors raised by pipeline stages and configuration validation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Option type other than call or put.
    #[error("option type must be either 'call' or 'put', got '{0}'")]
    InvalidOptionType(String),

    /// A required column is absent from a source table.
    #[error("table '{table}' is missing column '{column}'")]
    MissingColumn {
        /// Source table name.
        table: String,
        /// Column that was expected.
        column: String,
    },

    /// A source table could not be read or parsed.
    #[error("failed to read source table '{table}': {reason}")]
    SourceRead {
        /// Source table name.
        table: String,
        /// Underlying failure.
        reason: String,
    },

    /// A stage left no rows to continue with.
    #[error("stage '{stage}' produced an empty panel")]
    EmptyPanel {
        /// Name of the stage that emptied the panel.
        stage: String,
    },

    /// Partition fractions outside (0, 1) or summing to 1 or more.
    #[error("invalid partition fractions: train {train}, validate {validate}")]
    InvalidFraction {
        /// Train fraction.
        train: f64,
        /// Validate fraction.
        validate: f64,
    },

    /// Configuration values that cannot be used together.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Creates a source read error.
    pub fn source_read(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceRead {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing column error.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an empty panel error.
    pub fn empty_panel(stage: impl Into<String>) -> Self {
        Self::EmptyPanel {
            stage: stage.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_message_names_table_and_column() {
        let err = PipelineError::missing_column("ratios", "roa");
        assert_eq!(err.to_string(), "table 'ratios' is missing column 'roa'");
    }

    #[test]
    fn empty_panel_message_names_stage() {
        let err = PipelineError::empty_panel("join_prices");
        assert!(err.to_string().contains("join_prices"));
    }
}
