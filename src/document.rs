//! Feed Document - Append-Only RSS Output

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use crate::config::{ChannelConfig, FeedConfig};
use crate::engine::{FeedItem, FeedNode};
use crate::renderer::FeedError;
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedDocument {
    pub channel: ChannelConfig,
    pub namespace_prefix: String,
    pub namespace_uri: String,
    items: Vec<FeedItem>,
}

impl FeedDocument {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            namespace_prefix: config.namespace_prefix.clone(),
            namespace_uri: config.namespace_uri.clone(),
            items: vec![],
        }
    }

    pub fn push(&mut self, item: FeedItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize as an RSS 2.0 document. Text content is escaped.
    pub fn to_rss(&self) -> Result<String, FeedError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        if !self.namespace_prefix.is_empty() {
            let xmlns = format!("xmlns:{}", self.namespace_prefix);
            rss.push_attribute((xmlns.as_str(), self.namespace_uri.as_str()));
        }
        writer.write_event(Event::Start(rss)).map_err(xml_error)?;
        start(&mut writer, "channel")?;

        text_element(&mut writer, "title", &self.channel.title)?;
        text_element(&mut writer, "link", &self.channel.link)?;
        text_element(&mut writer, "description", &self.channel.description)?;
        text_element(&mut writer, "generator", &format!("productfeed-core {}", ENGINE_VERSION))?;

        for item in &self.items {
            start(&mut writer, "item")?;
            write_nodes(&mut writer, &item.fields)?;
            end(&mut writer, "item")?;
        }

        end(&mut writer, "channel")?;
        end(&mut writer, "rss")?;

        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }
}

fn write_nodes(writer: &mut Writer<Vec<u8>>, nodes: &[FeedNode]) -> Result<(), FeedError> {
    for node in nodes {
        match node {
            FeedNode::Field { tag, value } => text_element(writer, tag, value)?,
            FeedNode::Group { tag, children } => {
                start(writer, tag)?;
                write_nodes(writer, children)?;
                end(writer, tag)?;
            }
        }
    }
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<(), FeedError> {
    start(writer, tag)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    end(writer, tag)
}

fn start(writer: &mut Writer<Vec<u8>>, tag: &str) -> Result<(), FeedError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(xml_error)
}

fn end(writer: &mut Writer<Vec<u8>>, tag: &str) -> Result<(), FeedError> {
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(xml_error)
}

fn xml_error(e: impl std::fmt::Display) -> FeedError {
    FeedError::Xml(e.to_string())
}
