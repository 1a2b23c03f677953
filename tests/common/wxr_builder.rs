/// A post item of a fixture export
#[derive(Debug, Clone)]
pub struct PostFixture {
    pub title: String,
    pub creator: String,
    pub date: Option<String>,
    pub modified: Option<String>,
    pub status: String,
    pub content: Option<String>,
}

impl PostFixture {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            creator: "alice".to_string(),
            date: None,
            modified: None,
            status: "publish".to_string(),
            content: Some(String::new()),
        }
    }

    pub fn by(mut self, creator: &str) -> Self {
        self.creator = creator.to_string();
        self
    }

    pub fn dated(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    pub fn modified(mut self, date: &str) -> Self {
        self.modified = Some(date.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn content(mut self, html: &str) -> Self {
        self.content = Some(html.to_string());
        self
    }

    pub fn without_content(mut self) -> Self {
        self.content = None;
        self
    }
}

/// Builds a minimal WXR document
#[derive(Debug, Default)]
pub struct WxrBuilder {
    items: Vec<String>,
    next_id: u32,
}

impl WxrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(mut self, post: PostFixture) -> Self {
        self.next_id += 1;
        let mut item = String::new();
        item.push_str("<item>\n");
        item.push_str(&format!("<title>{}</title>\n", escape(&post.title)));
        item.push_str(&format!("<dc:creator><![CDATA[{}]]></dc:creator>\n", post.creator));
        if let Some(content) = &post.content {
            item.push_str(&format!(
                "<content:encoded><![CDATA[{}]]></content:encoded>\n",
                content
            ));
        }
        item.push_str(&format!("<wp:post_id>{}</wp:post_id>\n", self.next_id));
        if let Some(date) = &post.date {
            item.push_str(&format!("<wp:post_date><![CDATA[{}]]></wp:post_date>\n", date));
        }
        if let Some(modified) = &post.modified {
            item.push_str(&format!(
                "<wp:post_modified><![CDATA[{}]]></wp:post_modified>\n",
                modified
            ));
        }
        item.push_str(&format!("<wp:status><![CDATA[{}]]></wp:status>\n", post.status));
        item.push_str("<wp:post_type><![CDATA[post]]></wp:post_type>\n");
        item.push_str("</item>\n");
        self.items.push(item);
        self
    }

    pub fn attachment(mut self, url: &str) -> Self {
        self.next_id += 1;
        self.items.push(format!(
            "<item>\n<title>attachment</title>\n<guid isPermaLink=\"false\">{url}</guid>\n\
             <wp:post_id>{id}</wp:post_id>\n\
             <wp:post_type><![CDATA[attachment]]></wp:post_type>\n\
             <wp:attachment_url><![CDATA[{url}]]></wp:attachment_url>\n</item>\n",
            url = url,
            id = self.next_id
        ));
        self
    }

    pub fn page(mut self, title: &str) -> Self {
        self.next_id += 1;
        self.items.push(format!(
            "<item>\n<title>{}</title>\n<wp:post_id>{}</wp:post_id>\n\
             <wp:post_type><![CDATA[page]]></wp:post_type>\n</item>\n",
            escape(title),
            self.next_id
        ));
        self
    }

    pub fn build(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" ?>
<rss version="2.0"
  xmlns:excerpt="http://wordpress.org/export/1.2/excerpt/"
  xmlns:content="http://purl.org/rss/1.0/modules/content/"
  xmlns:wfw="http://wellformedweb.org/CommentAPI/"
  xmlns:dc="http://purl.org/dc/elements/1.1/"
  xmlns:wp="http://wordpress.org/export/1.2/">
<channel>
<title>Fixture blog</title>
<wp:wxr_version>1.2</wp:wxr_version>
{}</channel>
</rss>
"#,
            self.items.concat()
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
