use std::fs;
use std::path::Path;

use anyhow::Context as _;

use crate::formats::ImportRecord;
use crate::ledger::RunLedgers;
use crate::paths::{HeroPlan, PostPlan};
use crate::record::{PostKind, PostRecord, WP_DATE_FORMAT};

/// Renders the post file: ordered front-matter block, blank line, body.
pub fn render(record: &PostRecord, plan: &PostPlan, body: &str, hero: Option<&HeroPlan>) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("layout: {}\n", layout(&record.kind)));
    out.push_str(&format!("title: \"{}\"\n", yaml_escape(&record.title)));
    if record.private {
        out.push_str("published: false\n");
    }
    out.push_str(&format!("categories: [{}]\n", plan.bucket));
    out.push_str(&format!("tags: [{}]\n", record.categories.join(",")));
    out.push_str(&format!("date: {}\n", record.date.format(WP_DATE_FORMAT)));
    if let Some(hero) = hero {
        out.push_str(&format!("image: {}\n", hero.site_path));
    }
    out.push_str("---\n\n");
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn layout(kind: &PostKind) -> &'static str {
    match kind {
        PostKind::Blog => "post",
        PostKind::Webcomic(_) => "webcomic",
    }
}

/// Backslashes and quotes are the only characters that need escaping in
/// a YAML double-quoted scalar built from a WordPress title.
fn yaml_escape(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Writes the post file and appends the run's ledger rows. The mapping
/// rows are written only when the post actually moved.
pub fn emit(
    site_dir: &Path,
    record: &PostRecord,
    plan: &PostPlan,
    body: &str,
    hero: Option<&HeroPlan>,
    ledgers: &mut RunLedgers,
) -> anyhow::Result<()> {
    let target = site_dir.join(&plan.file);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(&target, render(record, plan, body, hero))
        .with_context(|| format!("write {}", target.display()))?;

    let old_url = record.original_link.as_str();
    if old_url != plan.public_url {
        ledgers.map_url(old_url, &plan.public_url)?;
    }
    let old_path = record.original_link.path();
    if old_path != plan.public_path {
        ledgers.redirect(old_path, &plan.public_path)?;
    }
    ledgers.imported(&ImportRecord {
        kind: record.kind.label().to_owned(),
        slug: record.slug.clone(),
        title: record.title.clone(),
        date: record.date.format(WP_DATE_FORMAT).to_string(),
        file: plan.file.clone(),
        url: plan.public_url.clone(),
    })?;
    Ok(())
}
