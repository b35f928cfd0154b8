//! MCP tool parameter types.
//!
//! Each struct corresponds to the input parameters for one MCP tool.
//! All parameter structs derive `Deserialize` and `JsonSchema` as required by rmcp.

use serde::Deserialize;

// ── Scan ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ScanParams {
    #[schemars(description = "Directory to scan for .java files (default: current directory)")]
    pub path: Option<String>,
    /// Pre-supplied relative paths; when set, no directory is walked.
    #[schemars(
        description = "Relative file paths to scan instead of walking a directory (e.g. ['src/Foo.java', 'src/Foo_tests.java'])"
    )]
    pub files: Option<Vec<String>>,
}

// ── List ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListParams {
    #[schemars(description = "Case-insensitive substring of file name or relative path")]
    pub search: Option<String>,
    #[schemars(description = "Include files with both tests and docs complete (default: true)")]
    pub show_completed: Option<bool>,
    #[schemars(description = "Include files missing tests or docs (default: true)")]
    pub show_incomplete: Option<bool>,
    #[schemars(description = "Include files with an auto-detected companion (default: true)")]
    pub show_auto_detected: Option<bool>,
    #[schemars(
        description = "Keep only files in these directories or below, relative to the scan root (e.g. ['src/main/util'])"
    )]
    pub directories: Option<Vec<String>>,
    #[schemars(description = "Sort key: name, path or status (default: name)")]
    pub sort: Option<String>,
    #[schemars(description = "Maximum results to return")]
    pub limit: Option<usize>,
    #[schemars(description = "Results to skip before the first returned")]
    pub offset: Option<usize>,
}

// ── Show ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ShowParams {
    #[schemars(description = "Record id as returned by list")]
    pub id: String,
}

// ── Update ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateParams {
    #[schemars(description = "Record id as returned by list")]
    pub id: String,
    #[schemars(description = "Mark tests complete or incomplete (omit to leave unchanged)")]
    pub test_completed: Option<bool>,
    #[schemars(description = "Mark docs complete or incomplete (omit to leave unchanged)")]
    pub doc_completed: Option<bool>,
    #[schemars(description = "Replace the free-text notes (omit to leave unchanged)")]
    pub notes: Option<String>,
}

// ── Stats ───────────────────────────────────────────────────────
// No parameters needed.
