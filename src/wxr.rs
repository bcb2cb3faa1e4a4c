use anyhow::Context as _;
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesStart, Event};

/// One `<item>` of a WXR export, fields still raw. WXR qualifies its
/// WordPress fields with the `wp:` prefix and ships post bodies as CDATA
/// inside `content:encoded`.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub post_type: String,
    pub post_name: String,
    pub post_date: String,
    pub status: String,
    pub content: String,
    pub categories: Vec<Category>,
    pub postmeta: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct Category {
    pub domain: String,
    pub nicename: String,
    pub text: String,
}

impl Item {
    pub fn category_texts(&self, domain: &str) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .filter(move |c| c.domain == domain)
            .map(|c| c.text.as_str())
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.postmeta
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v.as_str()))
    }
}

pub fn parse_export(xml: &str) -> anyhow::Result<Vec<Item>> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();

    loop {
        match reader.read_event().context("read export xml")? {
            Event::Start(tag) if tag.name().as_ref() == b"item" => {
                let item = parse_item(&mut reader)
                    .with_context(|| format!("parse export item {}", items.len()))?;
                items.push(item);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn parse_item(reader: &mut Reader<&[u8]>) -> anyhow::Result<Item> {
    let mut item = Item::default();

    loop {
        match reader.read_event().context("read export xml")? {
            Event::Start(tag) => match tag.name().as_ref() {
                b"title" => item.title = read_text(reader, b"title")?,
                b"link" => item.link = read_text(reader, b"link")?,
                b"wp:post_type" => item.post_type = read_text(reader, b"wp:post_type")?,
                b"wp:post_name" => item.post_name = read_text(reader, b"wp:post_name")?,
                b"wp:post_date" => item.post_date = read_text(reader, b"wp:post_date")?,
                b"wp:status" => item.status = read_text(reader, b"wp:status")?,
                b"content:encoded" => item.content = read_text(reader, b"content:encoded")?,
                b"category" => {
                    let mut category = category_from_attrs(&tag)?;
                    category.text = read_text(reader, b"category")?;
                    item.categories.push(category);
                }
                b"wp:postmeta" => item.postmeta.push(parse_postmeta(reader)?),
                _ => {}
            },
            Event::End(tag) if tag.name().as_ref() == b"item" => return Ok(item),
            Event::Eof => anyhow::bail!("export ended inside an <item>"),
            _ => {}
        }
    }
}

fn parse_postmeta(reader: &mut Reader<&[u8]>) -> anyhow::Result<(String, String)> {
    let mut key = String::new();
    let mut value = String::new();

    loop {
        match reader.read_event().context("read export xml")? {
            Event::Start(tag) => match tag.name().as_ref() {
                b"wp:meta_key" => key = read_text(reader, b"wp:meta_key")?,
                b"wp:meta_value" => value = read_text(reader, b"wp:meta_value")?,
                _ => {}
            },
            Event::End(tag) if tag.name().as_ref() == b"wp:postmeta" => return Ok((key, value)),
            Event::Eof => anyhow::bail!("export ended inside a <wp:postmeta>"),
            _ => {}
        }
    }
}

fn category_from_attrs(tag: &BytesStart) -> anyhow::Result<Category> {
    let mut category = Category::default();
    for attr in tag.attributes() {
        let attr = attr.context("read category attribute")?;
        match attr.key.as_ref() {
            b"domain" => {
                category.domain = attr
                    .unescape_value()
                    .context("unescape category domain")?
                    .into_owned();
            }
            b"nicename" => {
                category.nicename = attr
                    .unescape_value()
                    .context("unescape category nicename")?
                    .into_owned();
            }
            _ => {}
        }
    }
    Ok(category)
}

/// Collects text and CDATA until the matching end tag, ignoring any markup
/// nested inside (comment blocks and the like carry none we care about).
fn read_text(reader: &mut Reader<&[u8]>, element: &[u8]) -> anyhow::Result<String> {
    let mut text = String::new();

    loop {
        match reader.read_event().context("read export xml")? {
            Event::Text(t) => text.push_str(&t.unescape().context("unescape text")?),
            Event::CData(cd) => text.push_str(&cdata_to_string(cd)?),
            Event::End(tag) if tag.name().as_ref() == element => return Ok(text),
            Event::Eof => anyhow::bail!(
                "export ended inside <{}>",
                String::from_utf8_lossy(element)
            ),
            _ => {}
        }
    }
}

fn cdata_to_string(cd: BytesCData) -> anyhow::Result<String> {
    String::from_utf8(cd.into_inner().into_owned()).context("decode CDATA as utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
    xmlns:content="http://purl.org/rss/1.0/modules/content/"
    xmlns:wp="http://wordpress.org/export/1.1/">
<channel>
    <title>Some Blog</title>
    <link>http://example.com/yay</link>
    <item>
        <title>Fish &amp; Chips</title>
        <link>http://example.com/yay/2012/01/05/my-trip/</link>
        <category domain="category" nicename="travel"><![CDATA[travel]]></category>
        <category domain="category" nicename="travel"><![CDATA[travel]]></category>
        <category domain="post_tag" nicename="boats"><![CDATA[boats]]></category>
        <content:encoded><![CDATA[<p>Hello & goodbye</p>]]></content:encoded>
        <wp:post_date>2012-01-05 10:00:00</wp:post_date>
        <wp:post_name>my-trip</wp:post_name>
        <wp:post_type>post</wp:post_type>
        <wp:status>publish</wp:status>
        <wp:comment>
            <wp:comment_author><![CDATA[someone]]></wp:comment_author>
            <wp:comment_content><![CDATA[nice post]]></wp:comment_content>
        </wp:comment>
    </item>
    <item>
        <title>Page one</title>
        <link>http://example.com/yay/?page_id=2</link>
        <wp:post_name/>
        <wp:post_type>page</wp:post_type>
        <wp:status>publish</wp:status>
        <wp:postmeta>
            <wp:meta_key><![CDATA[webcomic]]></wp:meta_key>
            <wp:meta_value><![CDATA[a:1:{s:5:"files";a:0:{}}]]></wp:meta_value>
        </wp:postmeta>
    </item>
</channel>
</rss>
"#;

    #[test]
    fn parses_items_with_cdata_and_entities() {
        let items = parse_export(EXPORT).unwrap();
        assert_eq!(items.len(), 2);

        let post = &items[0];
        assert_eq!(post.title, "Fish & Chips");
        assert_eq!(post.post_type, "post");
        assert_eq!(post.post_name, "my-trip");
        assert_eq!(post.post_date, "2012-01-05 10:00:00");
        assert_eq!(post.status, "publish");
        assert_eq!(post.link, "http://example.com/yay/2012/01/05/my-trip/");
        assert_eq!(post.content, "<p>Hello & goodbye</p>");
    }

    #[test]
    fn filters_categories_by_domain() {
        let items = parse_export(EXPORT).unwrap();
        let texts: Vec<&str> = items[0].category_texts("category").collect();
        assert_eq!(texts, ["travel", "travel"]);
        let tags: Vec<&str> = items[0].category_texts("post_tag").collect();
        assert_eq!(tags, ["boats"]);
    }

    #[test]
    fn reads_postmeta_and_empty_elements() {
        let items = parse_export(EXPORT).unwrap();
        let page = &items[1];
        assert_eq!(page.post_name, "");
        assert_eq!(page.meta_value("webcomic"), Some("a:1:{s:5:\"files\";a:0:{}}"));
        assert_eq!(page.meta_value("missing"), None);
    }

    #[test]
    fn comment_blocks_do_not_leak_into_item_fields() {
        let items = parse_export(EXPORT).unwrap();
        assert!(!items[0].content.contains("nice post"));
        assert_eq!(items[0].title, "Fish & Chips");
    }

    #[test]
    fn rejects_truncated_exports() {
        let truncated = &EXPORT[..EXPORT.find("</item>").unwrap()];
        assert!(parse_export(truncated).is_err());
    }
}
