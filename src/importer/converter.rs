//! WordPress block markup to Haven content converter
//!
//! Haven stores markdown with inline HTML for media. The converter parses
//! the post body as an HTML fragment and walks its top-level nodes:
//! block comments are dropped, image and audio figures are replaced by
//! references to freshly created media records, and the remaining blocks
//! become their markdown counterparts.

use std::collections::BTreeMap;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

use super::media::{CachedMedia, MediaCache};
use crate::error::ImportError;
use crate::platform::{ImageRecord, MediaStore};
use crate::wxr::AttachmentIndex;

/// Structural kind of a top-level node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Comment,
    Figure,
    Paragraph,
    /// `h1` to `h4`
    Heading(u8),
    UnorderedList,
    OrderedList,
    BlockQuote,
    Pre,
    Rule,
    Div,
    Other,
}

impl NodeKind {
    pub fn classify(node: &Node) -> Self {
        match node {
            Node::Text(_) => NodeKind::Text,
            Node::Comment(_) => NodeKind::Comment,
            Node::Element(element) => match element.name() {
                "figure" => NodeKind::Figure,
                "p" => NodeKind::Paragraph,
                "h1" => NodeKind::Heading(1),
                "h2" => NodeKind::Heading(2),
                "h3" => NodeKind::Heading(3),
                "h4" => NodeKind::Heading(4),
                "ul" => NodeKind::UnorderedList,
                "ol" => NodeKind::OrderedList,
                "blockquote" => NodeKind::BlockQuote,
                "pre" => NodeKind::Pre,
                "hr" => NodeKind::Rule,
                "div" => NodeKind::Div,
                _ => NodeKind::Other,
            },
            _ => NodeKind::Other,
        }
    }

    fn feature(&self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Comment => "block_comments",
            NodeKind::Figure => "figures",
            NodeKind::Paragraph => "paragraphs",
            NodeKind::Heading(_) => "headings",
            NodeKind::UnorderedList | NodeKind::OrderedList => "lists",
            NodeKind::BlockQuote => "blockquotes",
            NodeKind::Pre => "code_blocks",
            NodeKind::Rule => "horizontal_rules",
            NodeKind::Div => "divs",
            NodeKind::Other => "other",
        }
    }
}

/// Block editor figure variants, told apart by their class markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureKind {
    Audio,
    Image,
    Plain,
}

impl FigureKind {
    pub fn classify(class: &str) -> Self {
        if class.contains("wp-block-audio") {
            FigureKind::Audio
        } else if class.contains("wp-block-image") {
            FigureKind::Image
        } else {
            FigureKind::Plain
        }
    }
}

/// Ordered output fragments, joined once when conversion is done
#[derive(Debug, Default)]
pub struct OutputBuffer {
    fragments: Vec<String>,
}

impl OutputBuffer {
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Join the fragments, collapse runs of 3+ newlines to 2 and trim
    pub fn finish(self, blank_lines: &Regex) -> String {
        let joined = self.fragments.concat();
        blank_lines.replace_all(&joined, "\n\n").trim().to_string()
    }
}

/// Inline media tag for a created record.
///
/// Audio and video get a player element with a single source; anything else
/// is an image. The tag is surrounded by blank lines so it stands as its own
/// markdown block.
pub fn media_tag(record: &ImageRecord, extension: &str) -> String {
    let path = record.raw_path();
    let src = html_escape::encode_double_quoted_attribute(&path);
    match extension {
        ".m4a" | ".mp3" => {
            let mime = if extension == ".m4a" {
                "audio/mp4"
            } else {
                "audio/mpeg"
            };
            format!(
                "\n\n<audio controls><source src=\"{}\" type=\"{}\"></audio>\n\n",
                src, mime
            )
        }
        ".mp4" | ".mov" => format!(
            "\n\n<video controls><source src=\"{}\" type=\"video/mp4\"></video>\n\n",
            src
        ),
        _ => format!("\n\n<img src=\"{}\"></img>\n\n", src),
    }
}

fn text_of(node: NodeRef<'_, Node>) -> String {
    node.descendants()
        .filter_map(|n| n.value().as_text().map(|t| &**t))
        .collect()
}

fn first_descendant<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == name)
}

fn descendants_named<'a>(
    element: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == name)
}

/// Converts post bodies, creating media records through the cache
pub struct ContentConverter<'a> {
    attachments: &'a AttachmentIndex,
    line_break: Regex,
    blank_lines: Regex,
    feature_counts: BTreeMap<String, usize>,
    external_media: usize,
}

impl<'a> ContentConverter<'a> {
    pub fn new(attachments: &'a AttachmentIndex) -> Self {
        Self {
            attachments,
            line_break: Regex::new(r"<br\s*/?>").unwrap(),
            blank_lines: Regex::new(r"\n{3,}").unwrap(),
            feature_counts: BTreeMap::new(),
            external_media: 0,
        }
    }

    /// Convert one post body
    pub fn convert(
        &mut self,
        html: &str,
        media: &mut MediaCache,
        store: &mut dyn MediaStore,
    ) -> Result<String, ImportError> {
        if html.trim().is_empty() {
            return Ok(String::new());
        }

        let fragment = Html::parse_fragment(html);
        let mut out = OutputBuffer::default();
        for node in fragment.root_element().children() {
            self.convert_node(node, media, store, &mut out)?;
        }
        Ok(out.finish(&self.blank_lines))
    }

    fn convert_node(
        &mut self,
        node: NodeRef<'_, Node>,
        media: &mut MediaCache,
        store: &mut dyn MediaStore,
        out: &mut OutputBuffer,
    ) -> Result<(), ImportError> {
        let kind = NodeKind::classify(node.value());
        log::trace!("Converting {:?} node", kind);

        let element = ElementRef::wrap(node);
        match (kind, element) {
            (NodeKind::Text, _) => {
                let text = text_of(node);
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text);
                    out.push("\n");
                }
            }
            (NodeKind::Comment, _) => {}
            (NodeKind::Figure, Some(figure)) => {
                self.convert_figure(figure, media, store, out)?;
            }
            (NodeKind::Paragraph, Some(p)) => {
                let inner = p.inner_html();
                let inner = self.line_break.replace_all(&inner, "\n");
                out.push(inner.trim());
                out.push("\n\n");
            }
            (NodeKind::Heading(level), _) => {
                out.push(format!(
                    "{} {}\n\n",
                    "#".repeat(level as usize),
                    text_of(node).trim()
                ));
            }
            (NodeKind::UnorderedList, Some(list)) => {
                for li in descendants_named(list, "li") {
                    out.push(format!("- {}\n", text_of(*li).trim()));
                }
                out.push("\n");
            }
            (NodeKind::OrderedList, Some(list)) => {
                for (i, li) in descendants_named(list, "li").enumerate() {
                    out.push(format!("{}. {}\n", i + 1, text_of(*li).trim()));
                }
                out.push("\n");
            }
            (NodeKind::BlockQuote, _) => {
                for line in text_of(node).trim().lines() {
                    out.push(format!("> {}\n", line.trim()));
                }
                out.push("\n");
            }
            (NodeKind::Pre, Some(pre)) => {
                let text = match first_descendant(pre, "code") {
                    Some(code) => text_of(*code),
                    None => text_of(node),
                };
                out.push(format!("```\n{}\n```\n\n", text));
            }
            (NodeKind::Rule, _) => out.push("---\n\n"),
            (NodeKind::Div, Some(div)) => {
                let inner = div.inner_html();
                let inner = inner.trim();
                if !inner.is_empty() {
                    out.push(inner);
                    out.push("\n\n");
                }
            }
            _ => {
                let text = text_of(node);
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text);
                    out.push("\n\n");
                }
            }
        }

        *self.feature_counts.entry(kind.feature().to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn convert_figure(
        &mut self,
        figure: ElementRef<'_>,
        media: &mut MediaCache,
        store: &mut dyn MediaStore,
        out: &mut OutputBuffer,
    ) -> Result<(), ImportError> {
        let class = figure.value().attr("class").unwrap_or("");
        match FigureKind::classify(class) {
            FigureKind::Audio => {
                let src = first_descendant(figure, "audio").and_then(|a| a.value().attr("src"));
                if let Some(src) = src {
                    self.push_media(src, media, store, out)?;
                }
            }
            FigureKind::Image => {
                let src = first_descendant(figure, "img").and_then(|img| img.value().attr("src"));
                if let Some(src) = src {
                    self.push_media(src, media, store, out)?;
                }
                if let Some(caption) = first_descendant(figure, "figcaption") {
                    let caption = text_of(*caption);
                    let caption = caption.trim();
                    if !caption.is_empty() {
                        out.push(format!("*{}*\n\n", caption));
                    }
                }
            }
            FigureKind::Plain => {
                out.push(text_of(*figure).trim());
                out.push("\n\n");
            }
        }
        Ok(())
    }

    fn push_media(
        &mut self,
        src: &str,
        media: &mut MediaCache,
        store: &mut dyn MediaStore,
        out: &mut OutputBuffer,
    ) -> Result<(), ImportError> {
        if !self.attachments.contains(src) {
            log::debug!("Media {} is not an attachment of the export", src);
            self.external_media += 1;
        }
        if let Some(CachedMedia { record, extension }) = media.record_for(src, store)? {
            out.push(media_tag(&record, &extension));
        }
        Ok(())
    }

    /// Count of each block kind converted so far
    pub fn feature_counts(&self) -> &BTreeMap<String, usize> {
        &self.feature_counts
    }

    /// Media references whose URL is not among the export's attachments
    pub fn external_media(&self) -> usize {
        self.external_media
    }
}
