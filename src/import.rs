use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::ImportArgs;
use crate::config::SiteConfig;
use crate::emit;
use crate::fetch::ResourceFetcher;
use crate::ledger::RunLedgers;
use crate::paths;
use crate::record::{PostKind, PostRecord};
use crate::rewrite;
use crate::wxr::{self, Item};

/// Everything one run owns: parsed configuration, the output tree root,
/// the shared fetcher, and the truncated ledgers.
struct RunContext {
    config: SiteConfig,
    site_dir: PathBuf,
    fetcher: ResourceFetcher,
    ledgers: RunLedgers,
}

enum Outcome {
    Emitted { fetched: usize },
    Skipped,
}

pub fn run(args: ImportArgs) -> anyhow::Result<()> {
    let site_dir = PathBuf::from(&args.site_dir);
    let config = SiteConfig::load(&site_dir.join(&args.config))?;
    let export_path = resolve_export(&site_dir, args.export.as_deref(), &config)?;

    let xml = fs::read_to_string(&export_path)
        .with_context(|| format!("read export {}", export_path.display()))?;
    let items = wxr::parse_export(&xml)?;
    tracing::info!(
        items = items.len(),
        export = %export_path.display(),
        "parsed export"
    );

    let mut context = RunContext {
        fetcher: ResourceFetcher::new(&site_dir)?,
        ledgers: RunLedgers::create(&site_dir)?,
        config,
        site_dir,
    };

    let mut emitted = 0usize;
    let mut skipped = 0usize;
    let mut fetched = 0usize;
    for (index, item) in items.iter().enumerate() {
        let outcome = process_item(&mut context, item)
            .with_context(|| format!("item {} ({})", index + 1, item_name(item)))?;
        match outcome {
            Outcome::Emitted { fetched: count } => {
                emitted += 1;
                fetched += count;
            }
            Outcome::Skipped => skipped += 1,
        }
    }

    tracing::info!(emitted, skipped, fetched, "import finished");
    Ok(())
}

/// `--export` wins; otherwise `import_location` from the configuration,
/// resolved against the site directory.
pub fn resolve_export(
    site_dir: &Path,
    flag: Option<&str>,
    config: &SiteConfig,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(PathBuf::from(path));
    }
    match &config.import_location {
        Some(location) => Ok(site_dir.join(location)),
        None => anyhow::bail!(
            "no export file: pass --export or set import_location in the site configuration"
        ),
    }
}

fn process_item(context: &mut RunContext, item: &Item) -> anyhow::Result<Outcome> {
    let Some(record) = PostRecord::from_item(item, &context.config)? else {
        tracing::debug!(post_type = %item.post_type, title = %item.title, "skipping item");
        return Ok(Outcome::Skipped);
    };

    let plan = paths::plan(&record, &context.config);
    let rewritten = rewrite::rewrite(&record.raw_content, &plan.image_dir, &context.config);

    let mut fetched = 0usize;
    for job in &rewritten.fetches {
        if context.fetcher.ensure(&job.remote_url, &job.local_file)? {
            fetched += 1;
        }
    }
    let hero = match &record.kind {
        PostKind::Webcomic(webcomic) => Some(paths::hero(webcomic, &context.config)),
        PostKind::Blog => None,
    };
    if let Some(hero) = &hero
        && context.fetcher.ensure(&hero.remote_url, &hero.local_file)?
    {
        fetched += 1;
    }

    emit::emit(
        &context.site_dir,
        &record,
        &plan,
        &rewritten.html,
        hero.as_ref(),
        &mut context.ledgers,
    )?;
    tracing::info!(
        kind = record.kind.label(),
        slug = %record.slug,
        file = %plan.file,
        "emitted"
    );
    Ok(Outcome::Emitted { fetched })
}

pub(crate) fn item_name(item: &Item) -> &str {
    if !item.post_name.is_empty() {
        &item.post_name
    } else {
        &item.title
    }
}
