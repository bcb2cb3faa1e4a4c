use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

/// The slice of `_config.yml` the importer cares about; every other Jekyll
/// key is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub url_root: String,
    #[serde(default)]
    pub baseurl: String,
    #[serde(default)]
    pub import_location: Option<String>,
    #[serde(default = "default_collection_overrides")]
    pub collection_overrides: Vec<CollectionOverride>,
}

/// Renames a webcomic collection for output purposes. A rule matches when
/// every condition it states holds; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionOverride {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub title_contains: Option<String>,
    pub rename_to: String,
}

impl CollectionOverride {
    fn matches(&self, collection: &str, title: &str) -> bool {
        if let Some(want) = &self.collection
            && want != collection
        {
            return false;
        }
        if let Some(needle) = &self.title_contains
            && !title.contains(needle.as_str())
        {
            return false;
        }
        true
    }
}

fn default_collection_overrides() -> Vec<CollectionOverride> {
    vec![CollectionOverride {
        collection: None,
        title_contains: Some("Paul".to_owned()),
        rename_to: "paul".to_owned(),
    }]
}

impl SiteConfig {
    pub fn load(path: &Path) -> anyhow::Result<SiteConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let mut config: SiteConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parse config: {}", path.display()))?;

        config.url_root = config.url_root.trim_end_matches('/').to_owned();
        config.baseurl = normalize_baseurl(&config.baseurl);

        for rule in &config.collection_overrides {
            if rule.collection.is_none() && rule.title_contains.is_none() {
                anyhow::bail!(
                    "collection override renaming to {:?} needs `collection` or `title_contains`",
                    rule.rename_to
                );
            }
        }

        Ok(config)
    }

    /// Site-absolute path for a path relative to the site root.
    pub fn site_path(&self, rel: &str) -> String {
        format!("{}/{rel}", self.baseurl)
    }

    pub fn absolute_url(&self, site_path: &str) -> String {
        format!("{}{site_path}", self.url_root)
    }

    pub fn resolve_collection(&self, taxonomy: &str, title: &str) -> String {
        self.collection_overrides
            .iter()
            .find(|rule| rule.matches(taxonomy, title))
            .map(|rule| rule.rename_to.clone())
            .unwrap_or_else(|| taxonomy.to_owned())
    }
}

fn normalize_baseurl(baseurl: &str) -> String {
    let trimmed = baseurl.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> SiteConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        std::fs::write(&path, yaml).unwrap();
        SiteConfig::load(&path).unwrap()
    }

    #[test]
    fn loads_config_and_ignores_jekyll_keys() {
        let config = parse(
            "title: Some Blog\n\
             markdown: kramdown\n\
             url_root: http://example.com/\n\
             baseurl: yay/\n\
             import_location: dump.xml\n\
             emoji: gfx/emoji\n",
        );
        assert_eq!(config.url_root, "http://example.com");
        assert_eq!(config.baseurl, "/yay");
        assert_eq!(config.import_location.as_deref(), Some("dump.xml"));
    }

    #[test]
    fn baseurl_defaults_to_empty() {
        let config = parse("url_root: http://example.com\n");
        assert_eq!(config.baseurl, "");
        assert_eq!(config.site_path("gfx/a.png"), "/gfx/a.png");
        assert_eq!(
            config.absolute_url("/gfx/a.png"),
            "http://example.com/gfx/a.png"
        );
    }

    #[test]
    fn default_overrides_keep_the_paul_rule() {
        let config = parse("url_root: http://example.com\n");
        assert_eq!(config.resolve_collection("strip1", "Paul goes out"), "paul");
        assert_eq!(config.resolve_collection("strip1", "Chapter 3"), "strip1");
    }

    #[test]
    fn explicit_overrides_replace_the_default() {
        let config = parse(
            "url_root: http://example.com\n\
             collection_overrides:\n\
             - collection: strip1\n  \
               rename_to: one\n\
             - collection: strip1\n  \
               title_contains: Special\n  \
               rename_to: never-reached\n",
        );
        assert_eq!(config.resolve_collection("strip1", "Special day"), "one");
        assert_eq!(config.resolve_collection("strip2", "Paul again"), "strip2");
    }

    #[test]
    fn rejects_condition_free_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        std::fs::write(
            &path,
            "url_root: http://example.com\n\
             collection_overrides:\n\
             - rename_to: oops\n",
        )
        .unwrap();
        let err = SiteConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("oops"));
    }
}
