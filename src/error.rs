/// Crate-level error types for refdoc diagnostics.
use std::path::PathBuf;

use crate::reference::{Projection, SyntaxLanguage};

/// All errors in refdoc carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the symbol, slot, file, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A config file named on the command line does not exist.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// A symbol's formatting could not be produced by the extraction collaborator.
    #[error("formatting fault for `{symbol}`: {reason}")]
    FormattingFault {
        /// Id of the symbol being formatted.
        symbol: String,
        /// What the formatter could not produce.
        reason: String,
    },

    /// A page id does not match `[a-zA-Z0-9-_.@/]+` or has an empty, `.` or `..` segment.
    #[error("invalid page id: `{id}`")]
    InvalidPageId {
        /// The rejected id.
        id: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// An extraction manifest is structurally valid JSON but unusable.
    #[error("manifest corrupt: {}: {reason}", path.display())]
    ManifestCorrupt {
        /// Manifest file that failed validation.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// A persisted document does not start with the expected schema marker.
    #[error("expected `{expected}` document, found `{found}`")]
    MimeMismatch {
        /// Marker the decoder expected.
        expected: String,
        /// First line actually found.
        found: String,
    },

    /// Two non-empty projection sequences for one symbol differ in length.
    #[error(
        "projection mismatch for `{id}`: {projection} ({language}) has {base_len} tokens in base, {incoming_len} incoming"
    )]
    ProjectionLengthMismatch {
        /// Symbol id whose fragments disagree.
        id: String,
        /// Token count in the base fragment.
        base_len: usize,
        /// Token count in the incoming fragment.
        incoming_len: usize,
        /// Language key of the sequence.
        language: SyntaxLanguage,
        /// Projection slot of the sequence.
        projection: Projection,
    },

    /// A language key appears in some projection slots of a wire item but not all of them.
    #[error("projection slots incomplete: {language} has no `{missing}` projection")]
    ProjectionSlotsIncomplete {
        /// Language key present in the other slots.
        language: SyntaxLanguage,
        /// The slot that lacks the language.
        missing: Projection,
    },

    /// Two projection sequences disagree on the symbol id at one position.
    #[error(
        "projection mismatch for `{id}`: {projection} ({language}) token {index} is `{}` in base, `{}` incoming",
        base.as_deref().unwrap_or("<none>"),
        incoming.as_deref().unwrap_or("<none>")
    )]
    ProjectionTokenMismatch {
        /// Symbol id whose fragments disagree.
        id: String,
        /// Token id in the base fragment.
        base: Option<String>,
        /// Token id in the incoming fragment.
        incoming: Option<String>,
        /// Zero-based token position.
        index: usize,
        /// Language key of the sequence.
        language: SyntaxLanguage,
        /// Projection slot of the sequence.
        projection: Projection,
    },

    /// Two fragments disagree on a scalar field and the conflict policy is `abort`.
    #[error("conflicting `{field}` for `{id}`: `{existing}` vs `{incoming}`")]
    ScalarConflict {
        /// Symbol id whose fragments disagree.
        id: String,
        /// Name of the conflicting field.
        field: String,
        /// Value already held by the registry.
        existing: String,
        /// Value carried by the incoming fragment.
        incoming: String,
    },

    /// A section was nested deeper than two levels.
    #[error("section `{header}` nests sections {depth} levels deep (max 2)")]
    SectionTooDeep {
        /// Header of the outermost offending section.
        header: String,
        /// Depth the section would have reached.
        depth: usize,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A type kind the assembler must render has no page layout.
    #[error("unsupported type kind `{kind}` for `{symbol}`")]
    UnsupportedKind {
        /// Id of the type symbol.
        symbol: String,
        /// Kind label the assembler could not render.
        kind: String,
    },

    /// Filesystem watcher could not be created.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },

    /// YAML serialization or deserialization failed.
    #[error("yaml: {0}")]
    Yaml(
        /// The wrapped YAML error.
        #[from]
        serde_yaml::Error,
    ),
}
