//! Publish adapter: block sequence → Notion page.
//!
//! [`to_publish_payload`] maps blocks onto Notion's block shapes and applies
//! the API's per-request cap of [`MAX_BLOCKS_PER_REQUEST`] children. Blocks
//! past the cap are dropped, never an error; the count is kept on the request
//! so callers can report it.
//!
//! | Block | Notion block |
//! |-------|--------------|
//! | `Heading` | `heading_2` |
//! | `BulletItem` | `bulleted_list_item` |
//! | `NumberedItem` | `numbered_list_item` |
//! | `Paragraph` | `paragraph` |
//!
//! Each block carries its text as rich-text runs of at most
//! [`MAX_RICH_TEXT_CHARS`] characters; ordinary blocks need exactly one run.
//!
//! The HTTP side lives behind [`Publisher`] so the pipeline can be driven
//! with a stub in tests. [`NotionPublisher`] is the real client; it takes its
//! key and database id from an explicit [`NotionConfig`].

use crate::block::{Block, BlockKind, BlockSequence};
use crate::error::Pdf2NotionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Children accepted by one create-page request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

/// Characters accepted by one rich-text run.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_TITLE_PROPERTY: &str = "Name";

// ── Block shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichText {
    Text { text: TextContent },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichTextBody {
    pub rich_text: Vec<RichText>,
}

impl RichTextBody {
    fn new(text: &str) -> Self {
        Self {
            rich_text: rich_text_runs(text),
        }
    }

    /// The text of all runs, concatenated.
    pub fn plain_text(&self) -> String {
        self.rich_text
            .iter()
            .map(|RichText::Text { text }| text.content.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotionBlockBody {
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: RichTextBody },
    Paragraph { paragraph: RichTextBody },
    BulletedListItem { bulleted_list_item: RichTextBody },
    NumberedListItem { numbered_list_item: RichTextBody },
}

/// One child block of the create-page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotionBlock {
    pub object: &'static str,
    #[serde(flatten)]
    pub body: NotionBlockBody,
}

impl NotionBlock {
    pub fn type_name(&self) -> &'static str {
        match self.body {
            NotionBlockBody::Heading2 { .. } => "heading_2",
            NotionBlockBody::Paragraph { .. } => "paragraph",
            NotionBlockBody::BulletedListItem { .. } => "bulleted_list_item",
            NotionBlockBody::NumberedListItem { .. } => "numbered_list_item",
        }
    }

    pub fn plain_text(&self) -> String {
        match &self.body {
            NotionBlockBody::Heading2 { heading_2: b }
            | NotionBlockBody::Paragraph { paragraph: b }
            | NotionBlockBody::BulletedListItem {
                bulleted_list_item: b,
            }
            | NotionBlockBody::NumberedListItem {
                numbered_list_item: b,
            } => b.plain_text(),
        }
    }
}

impl From<&Block> for NotionBlock {
    fn from(block: &Block) -> Self {
        let rich = RichTextBody::new(block.text());
        let body = match block.kind {
            BlockKind::Heading => NotionBlockBody::Heading2 { heading_2: rich },
            BlockKind::BulletItem => NotionBlockBody::BulletedListItem {
                bulleted_list_item: rich,
            },
            BlockKind::NumberedItem => NotionBlockBody::NumberedListItem {
                numbered_list_item: rich,
            },
            BlockKind::Paragraph => NotionBlockBody::Paragraph { paragraph: rich },
        };
        Self {
            object: "block",
            body,
        }
    }
}

/// Split text into runs that each fit the rich-text limit.
fn rich_text_runs(text: &str) -> Vec<RichText> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![RichText::Text {
            text: TextContent {
                content: String::new(),
            },
        }];
    }
    chars
        .chunks(MAX_RICH_TEXT_CHARS)
        .map(|chunk| RichText::Text {
            text: TextContent {
                content: chunk.iter().collect(),
            },
        })
        .collect()
}

// ── Payload ───────────────────────────────────────────────────────────────

/// Title plus at most [`MAX_BLOCKS_PER_REQUEST`] children, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRequest {
    pub title: String,
    pub children: Vec<NotionBlock>,
    /// Blocks cut off by the request cap.
    #[serde(skip)]
    pub dropped: usize,
}

impl PublishRequest {
    /// Full create-page body for the given database.
    pub fn to_body(&self, database_id: &str, title_property: &str) -> Value {
        json!({
            "parent": { "database_id": database_id },
            "properties": {
                title_property: { "title": rich_text_runs(&self.title) }
            },
            "children": self.children,
        })
    }
}

/// Build the publish payload. Never fails; truncates silently.
pub fn to_publish_payload(blocks: &BlockSequence, title: &str) -> PublishRequest {
    let dropped = blocks.len().saturating_sub(MAX_BLOCKS_PER_REQUEST);
    if dropped > 0 {
        warn!(
            "Document has {} blocks; only the first {} are published ({} dropped)",
            blocks.len(),
            MAX_BLOCKS_PER_REQUEST,
            dropped
        );
    }
    PublishRequest {
        title: title.trim().to_string(),
        children: blocks
            .iter()
            .take(MAX_BLOCKS_PER_REQUEST)
            .map(NotionBlock::from)
            .collect(),
        dropped,
    }
}

// ── Publisher ─────────────────────────────────────────────────────────────

/// A page created by the document API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPage {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Materialises a publish request somewhere.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishedPage, Pdf2NotionError>;
}

/// Connection settings for [`NotionPublisher`].
#[derive(Clone)]
pub struct NotionConfig {
    /// Integration secret.
    pub api_key: String,
    /// Database the page is created in.
    pub database_id: String,
    pub api_base: String,
    pub notion_version: String,
    /// Name of the database's title property.
    pub title_property: String,
    pub timeout_secs: u64,
}

impl NotionConfig {
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            database_id: database_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            title_property: DEFAULT_TITLE_PROPERTY.to_string(),
            timeout_secs: 60,
        }
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = version.into();
        self
    }

    pub fn title_property(mut self, name: impl Into<String>) -> Self {
        self.title_property = name.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_key", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("api_base", &self.api_base)
            .field("notion_version", &self.notion_version)
            .field("title_property", &self.title_property)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Creates pages through the Notion REST API.
#[derive(Debug)]
pub struct NotionPublisher {
    config: NotionConfig,
    client: reqwest::Client,
}

impl NotionPublisher {
    pub fn new(config: NotionConfig) -> Result<Self, Pdf2NotionError> {
        if config.api_key.trim().is_empty() {
            return Err(Pdf2NotionError::InvalidConfig(
                "Notion API key must not be empty (set NOTION_API_KEY)".into(),
            ));
        }
        if config.database_id.trim().is_empty() {
            return Err(Pdf2NotionError::InvalidConfig(
                "Notion database id must not be empty (set NOTION_DATABASE_ID)".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Pdf2NotionError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    fn pages_url(&self) -> String {
        format!("{}/pages", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Publisher for NotionPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishedPage, Pdf2NotionError> {
        let body = request.to_body(&self.config.database_id, &self.config.title_property);
        debug!(
            "Creating Notion page '{}' with {} blocks",
            request.title,
            request.children.len()
        );

        let response = self
            .client
            .post(self.pages_url())
            .bearer_auth(&self.config.api_key)
            .header("Notion-Version", &self.config.notion_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| Pdf2NotionError::PublishUnreachable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Pdf2NotionError::PublishUnreachable {
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(Pdf2NotionError::PublishRejected {
                status: status.as_u16(),
                message: rejection_message(&text),
            });
        }

        let page: PublishedPage = serde_json::from_str(&text).map_err(|e| {
            Pdf2NotionError::Internal(format!("Unexpected Notion response: {e}"))
        })?;
        info!("Created Notion page {}", page.id);
        Ok(page)
    }
}

/// Notion's `message` field when present, else the raw body.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
