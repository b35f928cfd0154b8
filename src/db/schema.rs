/// SQL statements for creating the tracker schema.
pub const CREATE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT
);

CREATE TABLE IF NOT EXISTS files (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    relative_path TEXT UNIQUE NOT NULL,
    directory TEXT NOT NULL,
    test_completed INTEGER NOT NULL,
    doc_completed INTEGER NOT NULL,
    auto_detected_test INTEGER NOT NULL,
    auto_detected_doc INTEGER NOT NULL,
    test_file TEXT,
    doc_file TEXT,
    manual_test_override INTEGER,
    manual_doc_override INTEGER,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    last_updated TEXT
);

CREATE INDEX IF NOT EXISTS idx_files_position ON files(position);
CREATE INDEX IF NOT EXISTS idx_files_directory ON files(directory);
";
