use anyhow::Context as _;
use chrono::NaiveDateTime;
use url::Url;

use crate::config::SiteConfig;
use crate::php;
use crate::wxr::Item;

pub const WEBCOMIC_META_KEY: &str = "webcomic";

pub const WP_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FALLBACK_SLUG: &str = "no_name";

/// One export item, normalized and ready for path planning and emission.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub kind: PostKind,
    pub title: String,
    pub slug: String,
    /// `wp:post_date` is the site's local wall-clock time already.
    pub date: NaiveDateTime,
    pub private: bool,
    pub categories: Vec<String>,
    pub original_link: Url,
    pub raw_content: String,
}

#[derive(Debug, Clone)]
pub enum PostKind {
    Blog,
    Webcomic(WebcomicPost),
}

impl PostKind {
    pub fn label(&self) -> &'static str {
        match self {
            PostKind::Blog => "blog",
            PostKind::Webcomic(_) => "webcomic",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebcomicPost {
    /// Collection identifier used for output naming, overrides applied.
    pub collection: String,
    /// Taxonomy nicename as exported; the remote site stores files under
    /// this name regardless of any rename.
    pub source_collection: String,
    /// Full-size image filename from the `webcomic` postmeta.
    pub hero_file: String,
}

impl PostRecord {
    /// Builds a record from an export item. `Ok(None)` means the item's
    /// post type is not migrated (pages, attachments, menus); a missing
    /// field on a supported type is an error.
    pub fn from_item(item: &Item, config: &SiteConfig) -> anyhow::Result<Option<PostRecord>> {
        let kind = match item.post_type.as_str() {
            "post" => PostKind::Blog,
            "webcomic_post" => PostKind::Webcomic(webcomic_fields(item, config)?),
            _ => return Ok(None),
        };

        let slug = if item.post_name.is_empty() {
            FALLBACK_SLUG.to_owned()
        } else {
            item.post_name.clone()
        };

        let date = NaiveDateTime::parse_from_str(&item.post_date, WP_DATE_FORMAT)
            .with_context(|| format!("parse wp:post_date {:?}", item.post_date))?;

        let original_link =
            Url::parse(&item.link).with_context(|| format!("parse link {:?}", item.link))?;

        let mut categories: Vec<String> = Vec::new();
        for text in item.category_texts("category") {
            if !categories.iter().any(|seen| seen == text) {
                categories.push(text.to_owned());
            }
        }

        Ok(Some(PostRecord {
            kind,
            title: item.title.clone(),
            slug,
            date,
            private: item.status == "private",
            categories,
            original_link,
            raw_content: item.content.clone(),
        }))
    }
}

fn webcomic_fields(item: &Item, config: &SiteConfig) -> anyhow::Result<WebcomicPost> {
    let source_collection = item
        .categories
        .iter()
        .find(|c| c.domain == "webcomic_collection" && !c.nicename.is_empty())
        .map(|c| c.nicename.clone())
        .ok_or_else(|| anyhow::anyhow!("webcomic item has no webcomic_collection category"))?;

    let raw_meta = item
        .meta_value(WEBCOMIC_META_KEY)
        .ok_or_else(|| anyhow::anyhow!("webcomic item has no `webcomic` postmeta"))?;
    let meta = php::unserialize(raw_meta).context("parse `webcomic` postmeta")?;

    let hero_file = meta
        .get("files")
        .and_then(|files| files.get("full"))
        .and_then(|full| full.idx(0))
        .and_then(php::Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow::anyhow!("`webcomic` postmeta has no files.full[0] entry"))?
        .to_owned();

    Ok(WebcomicPost {
        collection: config.resolve_collection(&source_collection, &item.title),
        source_collection,
        hero_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wxr::Category;

    fn test_config() -> SiteConfig {
        serde_yaml::from_str("url_root: http://example.com\nbaseurl: /yay\n").unwrap()
    }

    fn category(domain: &str, nicename: &str, text: &str) -> Category {
        Category {
            domain: domain.to_owned(),
            nicename: nicename.to_owned(),
            text: text.to_owned(),
        }
    }

    fn blog_item() -> Item {
        Item {
            title: "My trip".to_owned(),
            link: "http://example.com/yay/2012/01/05/my-trip/".to_owned(),
            post_type: "post".to_owned(),
            post_name: "my-trip".to_owned(),
            post_date: "2012-01-05 10:00:00".to_owned(),
            status: "publish".to_owned(),
            content: "<p>hi</p>".to_owned(),
            categories: vec![
                category("category", "travel", "travel"),
                category("category", "travel", "travel"),
                category("category", "photos", "photos"),
                category("post_tag", "boats", "boats"),
            ],
            postmeta: Vec::new(),
        }
    }

    fn webcomic_item() -> Item {
        Item {
            title: "Chapter 1, page 1".to_owned(),
            link: "http://example.com/yay/?p=6".to_owned(),
            post_type: "webcomic_post".to_owned(),
            post_name: "chap1-01".to_owned(),
            post_date: "2010-03-02 08:30:00".to_owned(),
            status: "publish".to_owned(),
            content: String::new(),
            categories: vec![category("webcomic_collection", "strip1", "Strip One")],
            postmeta: vec![(
                WEBCOMIC_META_KEY.to_owned(),
                "a:1:{s:5:\"files\";a:1:{s:4:\"full\";a:1:{i:0;s:14:\"chap1_01_b.jpg\";}}}"
                    .to_owned(),
            )],
        }
    }

    #[test]
    fn builds_blog_record() {
        let record = PostRecord::from_item(&blog_item(), &test_config())
            .unwrap()
            .unwrap();
        assert!(matches!(record.kind, PostKind::Blog));
        assert_eq!(record.slug, "my-trip");
        assert_eq!(record.date.to_string(), "2012-01-05 10:00:00");
        assert!(!record.private);
        assert_eq!(record.categories, ["travel", "photos"]);
        assert_eq!(record.original_link.path(), "/yay/2012/01/05/my-trip/");
    }

    #[test]
    fn skips_unsupported_types() {
        let mut item = blog_item();
        for post_type in ["page", "attachment", "nav_menu_item"] {
            item.post_type = post_type.to_owned();
            assert!(
                PostRecord::from_item(&item, &test_config())
                    .unwrap()
                    .is_none()
            );
        }
    }

    #[test]
    fn empty_slug_gets_the_sentinel() {
        let mut item = blog_item();
        item.post_name = String::new();
        let record = PostRecord::from_item(&item, &test_config())
            .unwrap()
            .unwrap();
        assert_eq!(record.slug, "no_name");
    }

    #[test]
    fn private_status_sets_the_flag() {
        let mut item = blog_item();
        item.status = "private".to_owned();
        let record = PostRecord::from_item(&item, &test_config())
            .unwrap()
            .unwrap();
        assert!(record.private);
    }

    #[test]
    fn bad_date_is_fatal_for_the_item() {
        let mut item = blog_item();
        item.post_date = "0000-13-40".to_owned();
        assert!(PostRecord::from_item(&item, &test_config()).is_err());
    }

    #[test]
    fn builds_webcomic_record() {
        let record = PostRecord::from_item(&webcomic_item(), &test_config())
            .unwrap()
            .unwrap();
        let PostKind::Webcomic(webcomic) = &record.kind else {
            panic!("expected webcomic kind");
        };
        assert_eq!(webcomic.collection, "strip1");
        assert_eq!(webcomic.source_collection, "strip1");
        assert_eq!(webcomic.hero_file, "chap1_01_b.jpg");
    }

    #[test]
    fn title_override_renames_the_collection() {
        let mut item = webcomic_item();
        item.title = "Paul takes a walk".to_owned();
        let record = PostRecord::from_item(&item, &test_config())
            .unwrap()
            .unwrap();
        let PostKind::Webcomic(webcomic) = &record.kind else {
            panic!("expected webcomic kind");
        };
        assert_eq!(webcomic.collection, "paul");
        assert_eq!(webcomic.source_collection, "strip1");
    }

    #[test]
    fn webcomic_without_collection_is_fatal() {
        let mut item = webcomic_item();
        item.categories.clear();
        let err = PostRecord::from_item(&item, &test_config()).unwrap_err();
        assert!(err.to_string().contains("webcomic_collection"));
    }

    #[test]
    fn webcomic_without_meta_is_fatal() {
        let mut item = webcomic_item();
        item.postmeta.clear();
        assert!(PostRecord::from_item(&item, &test_config()).is_err());

        let mut item = webcomic_item();
        item.postmeta = vec![(
            WEBCOMIC_META_KEY.to_owned(),
            "a:1:{s:5:\"files\";a:1:{s:4:\"full\";a:0:{}}}".to_owned(),
        )];
        let err = PostRecord::from_item(&item, &test_config()).unwrap_err();
        assert!(err.to_string().contains("files.full[0]"));
    }
}
