use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::InspectArgs;
use crate::config::SiteConfig;
use crate::import;
use crate::paths;
use crate::record::PostRecord;
use crate::wxr;

/// Read-only preview of a run: per-type item counts, then the planned
/// output file for every supported item. Writes and fetches nothing.
pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let site_dir = PathBuf::from(&args.site_dir);
    let config = SiteConfig::load(&site_dir.join(&args.config))?;
    let export_path = import::resolve_export(&site_dir, args.export.as_deref(), &config)?;

    let xml = fs::read_to_string(&export_path)
        .with_context(|| format!("read export {}", export_path.display()))?;
    let items = wxr::parse_export(&xml)?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut planned: Vec<String> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        *counts.entry(item.post_type.as_str()).or_default() += 1;
        let record = PostRecord::from_item(item, &config)
            .with_context(|| format!("item {} ({})", index + 1, import::item_name(item)))?;
        if let Some(record) = record {
            planned.push(paths::plan(&record, &config).file);
        }
    }

    println!("{} items in {}", items.len(), export_path.display());
    for (post_type, count) in &counts {
        println!("{count:5}  {post_type}");
    }
    println!();
    for file in &planned {
        println!("{file}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspect_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "url_root: http://example.com\nimport_location: export.xml\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("export.xml"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
  xmlns:content="http://purl.org/rss/1.0/modules/content/"
  xmlns:wp="http://wordpress.org/export/1.1/">
<channel>
  <item>
    <title>Plain post</title>
    <link>http://example.com/?p=12</link>
    <wp:post_type>post</wp:post_type>
    <wp:post_name>plain-post</wp:post_name>
    <wp:post_date>2012-01-05 10:00:00</wp:post_date>
    <wp:status>publish</wp:status>
    <content:encoded><![CDATA[<img src="http://old/pic.jpg">]]></content:encoded>
  </item>
</channel>
</rss>
"#,
        )
        .unwrap();

        run(InspectArgs {
            config: "_config.yml".to_owned(),
            export: None,
            site_dir: dir.path().to_string_lossy().into_owned(),
        })
        .unwrap();

        assert!(!dir.path().join("_posts").exists());
        assert!(!dir.path().join("urlmap.txt").exists());
        assert!(!dir.path().join("gfx").exists());
    }
}
