use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::formats::ImportRecord;

pub const URLMAP_FILE: &str = "urlmap.txt";
pub const HTACCESS_FILE: &str = "htaccess.txt";
pub const IMPORT_LOG_FILE: &str = "import.jsonl";

/// The run's append-only ledgers, truncated when the run starts. Each
/// row goes out in a single write, so an aborted run leaves whole lines.
pub struct RunLedgers {
    urlmap: File,
    htaccess: File,
    import_log: File,
}

impl RunLedgers {
    pub fn create(site_dir: &Path) -> anyhow::Result<RunLedgers> {
        Ok(RunLedgers {
            urlmap: truncate(site_dir, URLMAP_FILE)?,
            htaccess: truncate(site_dir, HTACCESS_FILE)?,
            import_log: truncate(site_dir, IMPORT_LOG_FILE)?,
        })
    }

    /// Old public URL to new public URL, for link checkers and sanity
    /// reading after the run.
    pub fn map_url(&mut self, old: &str, new: &str) -> anyhow::Result<()> {
        self.urlmap
            .write_all(format!("{old}, {new}\n").as_bytes())
            .with_context(|| format!("append to {URLMAP_FILE}"))
    }

    /// Apache redirect line for the old site's path.
    pub fn redirect(&mut self, old_path: &str, new_path: &str) -> anyhow::Result<()> {
        self.htaccess
            .write_all(format!("Redirect permanent {old_path} {new_path}\n").as_bytes())
            .with_context(|| format!("append to {HTACCESS_FILE}"))
    }

    pub fn imported(&mut self, record: &ImportRecord) -> anyhow::Result<()> {
        let mut row = serde_json::to_string(record).context("encode import record")?;
        row.push('\n');
        self.import_log
            .write_all(row.as_bytes())
            .with_context(|| format!("append to {IMPORT_LOG_FILE}"))
    }
}

fn truncate(site_dir: &Path, name: &str) -> anyhow::Result<File> {
    let path = site_dir.join(name);
    File::create(&path).with_context(|| format!("create ledger {}", path.display()))
}
