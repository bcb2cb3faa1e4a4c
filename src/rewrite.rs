use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::SiteConfig;

/// Remote resource referenced by the rewritten markup, to be mirrored at
/// `local_file` (relative to the site directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub remote_url: String,
    pub local_file: String,
}

#[derive(Debug)]
pub struct Rewritten {
    pub html: String,
    /// First-appearance order, deduplicated by local path.
    pub fetches: Vec<FetchJob>,
}

static CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[caption [^\]]+ caption="([^"]*)"\](.*?)\[/caption\]"#).unwrap()
});
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img\s[^>]*>").unwrap());
static A_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a\s[^>]*>").unwrap());

const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

/// Rewrites a post body so every remote image reference points at a local
/// copy under `image_dir`, and reports which remote files must be
/// mirrored. Pure with respect to the filesystem; the caller runs the
/// fetch jobs.
pub fn rewrite(raw: &str, image_dir: &str, config: &SiteConfig) -> Rewritten {
    let html = CAPTION.replace_all(
        raw,
        "<div class=\"post-image\">${2}</div><div class=\"post-image-caption\">${1}</div>",
    );

    let mut fetches: Vec<FetchJob> = Vec::new();
    let html = localize_tags(&html, &IMG_TAG, "src", false, image_dir, config, &mut fetches);
    let html = localize_tags(&html, &A_TAG, "href", true, image_dir, config, &mut fetches);

    Rewritten { html, fetches }
}

fn localize_tags(
    html: &str,
    tag: &Regex,
    target_attr: &str,
    image_links_only: bool,
    image_dir: &str,
    config: &SiteConfig,
    fetches: &mut Vec<FetchJob>,
) -> String {
    tag.replace_all(html, |caps: &regex::Captures| {
        let original = &caps[0];
        match localize_tag(original, target_attr, image_links_only, image_dir, config) {
            Some((rendered, job)) => {
                if !fetches.iter().any(|seen| seen.local_file == job.local_file) {
                    fetches.push(job);
                }
                rendered
            }
            None => original.to_string(),
        }
    })
    .into_owned()
}

/// Rebuilds one tag with `target_attr` pointing at the local mirror and
/// any `style`/`class` attributes dropped. `None` leaves the tag as-is:
/// the attribute is absent, not an absolute http(s) URL, or (for links)
/// not an image target.
fn localize_tag(
    tag_text: &str,
    target_attr: &str,
    image_links_only: bool,
    image_dir: &str,
    config: &SiteConfig,
) -> Option<(String, FetchJob)> {
    let parsed = ParsedTag::parse(tag_text)?;
    let remote = parsed.attr(target_attr)?;
    let url = Url::parse(remote).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if image_links_only && !has_image_extension(url.path()) {
        return None;
    }
    let basename = basename(url.path())?;

    let local_file = format!("{image_dir}/{basename}");
    let local_url = config.absolute_url(&config.site_path(&local_file));
    let job = FetchJob {
        remote_url: remote.to_owned(),
        local_file,
    };

    let mut out = format!("<{}", parsed.name);
    for (name, value) in &parsed.attrs {
        if name == "style" || name == "class" {
            continue;
        }
        if name == target_attr {
            out.push_str(&format!(" {name}=\"{local_url}\""));
        } else {
            match value {
                Some(value) => out.push_str(&format!(" {name}=\"{value}\"")),
                None => out.push_str(&format!(" {name}")),
            }
        }
    }
    if parsed.self_closing {
        out.push_str(" />");
    } else {
        out.push('>');
    }
    Some((out, job))
}

fn has_image_extension(path: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn basename(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

struct ParsedTag {
    name: String,
    attrs: Vec<(String, Option<String>)>,
    self_closing: bool,
}

impl ParsedTag {
    fn parse(tag_text: &str) -> Option<ParsedTag> {
        let inner = tag_text.strip_prefix('<')?.strip_suffix('>')?;
        let (inner, self_closing) = match inner.strip_suffix('/') {
            Some(rest) => (rest, true),
            None => (inner, false),
        };
        let inner = inner.trim_end();
        let name_end = inner
            .find(|c: char| c.is_whitespace())
            .unwrap_or(inner.len());
        let name = &inner[..name_end];
        if name.is_empty() {
            return None;
        }
        Some(ParsedTag {
            name: name.to_owned(),
            attrs: parse_attrs(&inner[name_end..]),
            self_closing,
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .and_then(|(_, value)| value.as_deref())
    }
}

fn parse_attrs(input: &str) -> Vec<(String, Option<String>)> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let name_start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'=' {
            pos += 1;
        }
        if pos == name_start {
            break;
        }
        let name = input[name_start..pos].to_owned();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] != b'=' {
            attrs.push((name, None));
            continue;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let value = if pos < bytes.len() && (bytes[pos] == b'"' || bytes[pos] == b'\'') {
            let quote = bytes[pos];
            pos += 1;
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != quote {
                pos += 1;
            }
            let value = input[value_start..pos].to_owned();
            if pos < bytes.len() {
                pos += 1;
            }
            value
        } else {
            let value_start = pos;
            while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            input[value_start..pos].to_owned()
        };
        attrs.push((name, Some(value)));
    }
    attrs
}
