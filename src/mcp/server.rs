//! MCP server implementation using rmcp.
//!
//! Exposes the tracker as MCP tools over stdio transport. Each tool calls the
//! same operations as the CLI commands.

use std::path::PathBuf;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo, Tool};
use rmcp::{tool, tool_handler, tool_router, ServerHandler, ServiceExt};
use serde::Serialize;

use crate::cli::output;
use crate::config::Config;
use crate::error::TrackerError;
use crate::ingest::listing::Listing;
use crate::models::record::RecordEdit;
use crate::operations::{self, ListFilter, ListResult, ScanSource, SortKey};
use crate::tracker::Tracker;

use super::tools::{ListParams, ScanParams, ShowParams, UpdateParams};

/// The tracker MCP server.
///
/// Holds the working directory. The store is opened on demand for each tool
/// call, so no connection outlives a request.
#[derive(Clone)]
pub struct TrackerServer {
    home: PathBuf,
    tool_router: ToolRouter<Self>,
}

// ── Helper functions ────────────────────────────────────────────

impl TrackerServer {
    fn config(&self) -> Config {
        Config::new(&self.home)
    }

    fn open(&self) -> crate::error::Result<Tracker> {
        Tracker::open(&self.config())
    }

    fn respond<T: Serialize>(result: crate::error::Result<T>) -> String {
        match result {
            Ok(val) => output::format_json(&val),
            Err(e) => output::format_error(&e),
        }
    }

    fn scan_source(&self, params: ScanParams) -> ScanSource {
        match (params.files, params.path) {
            (Some(files), _) => ScanSource::Listing(Listing::from_paths(files)),
            (None, Some(path)) => ScanSource::Directory(self.home.join(path)),
            (None, None) => ScanSource::Directory(self.home.clone()),
        }
    }

    fn list_filter(params: ListParams) -> crate::error::Result<ListFilter> {
        let sort = params
            .sort
            .as_deref()
            .map(str::parse::<SortKey>)
            .transpose()?
            .unwrap_or_default();
        Ok(ListFilter {
            search: params.search,
            show_completed: params.show_completed.unwrap_or(true),
            show_incomplete: params.show_incomplete.unwrap_or(true),
            show_auto_detected: params.show_auto_detected.unwrap_or(true),
            directories: params.directories.unwrap_or_default(),
            sort,
            offset: params.offset.unwrap_or(0),
            limit: params.limit,
        })
    }

    fn list_records(&self, params: ListParams) -> crate::error::Result<ListResult> {
        let filter = Self::list_filter(params)?;
        let config = self.config();
        let tracker = Tracker::open(&config)?;
        Ok(operations::list_records(
            tracker.records(),
            &filter,
            config.settings.scan.batch_size,
            |_| {},
        ))
    }

    /// Tools registered on this server.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }
}

// ── Tool implementations ────────────────────────────────────────

#[tool_router]
impl TrackerServer {
    #[must_use]
    pub fn new(home: PathBuf) -> Self {
        Self {
            home,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Scan a directory (or a supplied list of relative paths) for .java files, detect Foo_tests.java and Foo.pdf companions in the same directory, and merge with the stored records. Notes and manual overrides survive."
    )]
    async fn scan(&self, Parameters(params): Parameters<ScanParams>) -> String {
        let source = self.scan_source(params);
        let config = self.config();
        Self::respond(operations::run_scan(&config, &source, |p| {
            tracing::debug!(done = p.done, total = p.total, "scan batch");
        }))
    }

    #[tool(
        description = "List tracked files with completion badges. Supports search, directory and visibility filters, sort (name, path, status) and paging."
    )]
    async fn list(&self, Parameters(params): Parameters<ListParams>) -> String {
        Self::respond(self.list_records(params))
    }

    #[tool(description = "Show one tracked file by id.")]
    async fn show(&self, Parameters(params): Parameters<ShowParams>) -> String {
        Self::respond(
            self.open()
                .and_then(|tracker| operations::show_record(&tracker, &params.id)),
        )
    }

    #[tool(
        description = "Update a tracked file's test/doc completion or notes. A value that differs from auto-detection is kept as a manual override."
    )]
    async fn update(&self, Parameters(params): Parameters<UpdateParams>) -> String {
        let edit = RecordEdit {
            test_completed: params.test_completed,
            doc_completed: params.doc_completed,
            notes: params.notes,
        };
        Self::respond(
            self.open()
                .and_then(|mut tracker| operations::update_record(&mut tracker, &params.id, &edit)),
        )
    }

    #[tool(description = "Completion statistics: totals, test/doc progress percentages, last scan time.")]
    async fn stats(&self) -> String {
        Self::respond(self.open().map(|tracker| operations::get_stats(tracker.records())))
    }
}

#[tool_handler]
impl ServerHandler for TrackerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "jtrack: tracks which Java source files have tests (Foo_tests.java) and docs (Foo.pdf). \
                 Run 'scan' first, then 'list' or 'stats'. Use 'update' to mark a file manually; \
                 manual marks that disagree with auto-detection are kept as overrides across scans. \
                 Files that disappear from a scan are kept and reported as missing."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ── Server startup ──────────────────────────────────────────────

/// Start the MCP server on stdio transport.
pub async fn start_mcp_server() -> crate::error::Result<()> {
    // Initialize tracing to stderr (stdout is the MCP transport)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting jtrack MCP server");

    let home = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let server = TrackerServer::new(home);

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| TrackerError::Other(format!("MCP server error: {e}")))?;

    tracing::info!("MCP server running on stdio");

    service
        .waiting()
        .await
        .map_err(|e| TrackerError::Other(format!("MCP server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn list_filter_defaults_show_everything() {
        let filter = TrackerServer::list_filter(ListParams::default()).unwrap();
        assert!(filter.show_completed && filter.show_incomplete && filter.show_auto_detected);
        assert!(filter.directories.is_empty());
        assert_eq!(filter.sort, SortKey::Name);
    }

    #[test]
    fn list_filter_rejects_unknown_sort() {
        let params = ListParams {
            sort: Some("size".into()),
            ..Default::default()
        };
        assert!(matches!(
            TrackerServer::list_filter(params),
            Err(TrackerError::InvalidSortKey { .. })
        ));
    }

    #[test]
    fn list_records_filters_by_directory() {
        let tmp = TempDir::new().unwrap();
        let server = TrackerServer::new(tmp.path().to_path_buf());
        let params = ScanParams {
            path: None,
            files: Some(vec![
                "a/One.java".into(),
                "a/b/Two.java".into(),
                "c/Three.java".into(),
            ]),
        };
        let config = server.config();
        operations::run_scan(&config, &server.scan_source(params), |_| {}).unwrap();

        let result = server
            .list_records(ListParams {
                directories: Some(vec!["a".into()]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.summary.total, 3);
        assert_eq!(result.summary.matched, 2);
    }
}
