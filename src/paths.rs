use crate::config::SiteConfig;
use crate::record::{PostKind, PostRecord, WebcomicPost};

/// Output locations for one post, derived once before rewriting.
#[derive(Debug, Clone)]
pub struct PostPlan {
    /// Directory bucket under `_posts`.
    pub bucket: String,
    /// Content file, relative to the site directory.
    pub file: String,
    /// Site-absolute page path, baseurl included.
    pub public_path: String,
    /// Fully qualified page URL.
    pub public_url: String,
    /// Directory for fetched inline images, relative to the site directory.
    pub image_dir: String,
}

pub fn plan(record: &PostRecord, config: &SiteConfig) -> PostPlan {
    let bucket = match &record.kind {
        PostKind::Blog => "blog".to_owned(),
        PostKind::Webcomic(webcomic) => webcomic.collection.clone(),
    };
    let file = format!(
        "_posts/{bucket}/{}-{}.md",
        record.date.format("%Y-%m-%d"),
        record.slug
    );
    let public_path = config.site_path(&format!(
        "{}/{}/",
        record.date.format("%Y/%m/%d"),
        record.slug
    ));
    let public_url = config.absolute_url(&public_path);
    let image_dir = format!("gfx/posts/{}", record.slug);
    PostPlan {
        bucket,
        file,
        public_path,
        public_url,
        image_dir,
    }
}

/// Where a webcomic's full-size image comes from and where it lands.
#[derive(Debug, Clone)]
pub struct HeroPlan {
    pub remote_url: String,
    /// Local file, relative to the site directory.
    pub local_file: String,
    /// Site-absolute path, the front-matter `image` value.
    pub site_path: String,
}

/// The webcomic plugin serves full images from
/// `wp-content/webcomic/<collection>/` under the old site's baseurl.
/// Renames apply to the local side only.
pub fn hero(webcomic: &WebcomicPost, config: &SiteConfig) -> HeroPlan {
    let local_file = format!("comics/{}/{}", webcomic.collection, webcomic.hero_file);
    let remote_url = config.absolute_url(&config.site_path(&format!(
        "wp-content/webcomic/{}/{}",
        webcomic.source_collection, webcomic.hero_file
    )));
    let site_path = config.site_path(&local_file);
    HeroPlan {
        remote_url,
        local_file,
        site_path,
    }
}
