use std::fmt::Write as _;

use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ProjectionLengthMismatch {
            id,
            base_len,
            incoming_len,
            language,
            projection,
        } => render_projection_mismatch(
            id,
            &format!("the `{projection}` projection ({language}) has {base_len} tokens in one fragment and {incoming_len} in another"),
        ),
        Error::ProjectionTokenMismatch {
            id,
            base,
            incoming,
            index,
            language,
            projection,
        } => render_projection_mismatch(
            id,
            &format!(
                "token {index} of the `{projection}` projection ({language}) refers to `{}` in one fragment and `{}` in another",
                base.as_deref().unwrap_or("<text>"),
                incoming.as_deref().unwrap_or("<text>")
            ),
        ),
        Error::ScalarConflict {
            id,
            field,
            existing,
            incoming,
        } => render_scalar_conflict(id, field, existing, incoming),
        Error::UnsupportedKind { symbol, kind } => render_unsupported_kind(symbol, kind),
        _ => render_generic(e),
    };
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::ConfigNotFound { path } => format!("\
# Error: Config Not Found

`{}` does not exist.

## Fix

Check the `--config` path, or drop it to use `./.refdoc.toml`.
", path.display()),

        Error::FormattingFault { symbol, reason } => format!("\
# Error: Formatting Fault

Could not format `{symbol}`: {reason}.

The extraction output is incomplete for a symbol that must be documented.
Re-run extraction for its module.
"),

        Error::InvalidPageId { id } => format!("\
# Error: Invalid Page Id

`{id}` contains characters outside `[a-zA-Z0-9-_.@/]` or a path segment
that is empty, `.` or `..`.
"),

        Error::ManifestCorrupt { path, reason } => format!("\
# Error: Manifest Corrupt

`{}`: {reason}

## Fix

Re-run extraction to regenerate the manifest.
", path.display()),

        Error::MimeMismatch { expected, found } => format!("\
# Error: Wrong Document Kind

Expected a `{expected}` document, found `{found}`.
"),

        Error::ProjectionSlotsIncomplete { language, missing } => format!("\
# Error: Incomplete Projections

A fragment lists `{language}` tokens but has no `{missing}` projection for it.
All three projections of a language must be present together.
"),

        Error::SectionTooDeep { header, depth } => format!("\
# Error: Section Too Deep

Section `{header}` nests sections {depth} levels deep; at most 2 are allowed.
"),

        Error::Watch { reason } => format!("\
# Error: Watch Failed

{reason}
"),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `.refdoc.toml` against the documented keys.
"),
        Error::Yaml(e) => format!("\
# Error: Invalid YAML

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    };
}

fn render_projection_mismatch(id: &str, detail: &str) -> String {
    return format!("\
# Error: Projection Mismatch

Fragments for `{id}` do not describe the same symbol: {detail}.

## Fix

Two extraction passes disagree on how `{id}` is displayed. Re-run
extraction for both modules from the same build.
");
}

fn render_scalar_conflict(id: &str, field: &str, existing: &str, incoming: &str) -> String {
    let mut out = format!("\
# Error: Conflicting Fragments

Fragments for `{id}` disagree on `{field}`.

## Values

");
    let _ = writeln!(out, "- kept: `{existing}`");
    let _ = writeln!(out, "- incoming: `{incoming}`");
    out.push_str("\
\n## Fix

Set `on_conflict = \"prefer-base\"` in `.refdoc.toml` to keep the first value,
or run `refdoc check` to list every conflict.
");
    return out;
}

fn render_unsupported_kind(symbol: &str, kind: &str) -> String {
    return format!("\
# Error: Unsupported Kind

`{symbol}` is a `{kind}`, which has no page layout.

Extraction and page assembly disagree on the supported kinds.
");
}
