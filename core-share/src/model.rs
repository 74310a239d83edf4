//! # Record Model
//!
//! The canonical shape handed to the scripting runtime:
//!
//! ```text
//! { action: string, items: [Item...], text?: string, exit: boolean }
//! ```
//!
//! Field names on the wire follow the consumer's JS conventions (`type`,
//! `imageType`, `qrStrings`), absent optional fields are omitted, and
//! `processed` only appears once barcode decoding was attempted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

/// Uniform type hint for a shared link.
pub const UTI_URL: &str = "public.url";
/// Uniform type hint for a shared image.
pub const UTI_IMAGE: &str = "public.image";
/// MIME type reported for a browser preview screenshot.
pub const PREVIEW_IMAGE_TYPE: &str = "image/jpeg";

/// One shared thing: an image or a link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Item {
    /// MIME type of the share (image items).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uti: Option<String>,
    /// Link address, or resolved path of an image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Subject line of a shared link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// File name of the resolved path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Content reference the item was read from; `load` accepts it back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Base64 payload of an image item. Empty when the read failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Base64 payload of a link's preview screenshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    /// Page text attached by enrichment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub processed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qr_strings: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Item {
    /// A synthetic link item.
    pub fn url(url: Option<String>, title: Option<String>) -> Self {
        Self {
            uti: Some(UTI_URL.to_string()),
            url,
            title,
            ..Self::default()
        }
    }

    /// An image item with no payload yet.
    pub fn image(mime_type: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            uti: Some(UTI_IMAGE.to_string()),
            uri: Some(uri.into()),
            data: Some(String::new()),
            ..Self::default()
        }
    }

    /// Record the outcome of a barcode decode attempt.
    pub fn set_barcodes(&mut self, values: Vec<String>) {
        self.processed = true;
        self.qr_strings = values;
    }

    pub fn is_url(&self) -> bool {
        self.uti.as_deref() == Some(UTI_URL)
    }
}

/// A normalized share, ready for the delivery queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Local identity used in pipeline events; never serialized.
    #[serde(skip, default = "Uuid::new_v4")]
    pub id: Uuid,
    pub action: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub exit: bool,
}

impl Record {
    pub fn new(action: impl Into<String>, exit: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.into(),
            items: Vec::new(),
            text: None,
            exit,
        }
    }

    /// Parse a record serialized by an earlier pass through the normalizer.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The single item, if the record carries exactly one.
    pub fn sole_item(&self) -> Option<&Item> {
        match self.items.as_slice() {
            [item] => Some(item),
            _ => None,
        }
    }

    pub fn sole_item_mut(&mut self) -> Option<&mut Item> {
        match self.items.as_mut_slice() {
            [item] => Some(item),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_record_wire_shape() {
        let mut record = Record::new("SEND", false);
        record.items.push(Item::url(
            Some("https://ex.com".to_string()),
            Some("Example".to_string()),
        ));
        record.text = Some("hello https://ex.com".to_string());

        assert_eq!(
            record.to_json().unwrap(),
            json!({
                "action": "SEND",
                "items": [{"uti": "public.url", "url": "https://ex.com", "title": "Example"}],
                "text": "hello https://ex.com",
                "exit": false
            })
        );
    }

    #[test]
    fn test_image_item_omits_absent_fields() {
        let mut item = Item::image("image/png", "content://media/1");
        item.set_barcodes(vec!["otpauth://totp/x".to_string()]);

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "image/png");
        assert_eq!(value["uti"], "public.image");
        assert_eq!(value["data"], "");
        assert_eq!(value["processed"], true);
        assert_eq!(value["qrStrings"], json!(["otpauth://totp/x"]));
        assert!(value.get("content").is_none());
        assert!(value.get("imageType").is_none());
    }

    #[test]
    fn test_processed_without_codes_has_no_qr_strings() {
        let mut item = Item::image("image/jpeg", "content://media/2");
        item.set_barcodes(Vec::new());

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["processed"], true);
        assert!(value.get("qrStrings").is_none());
    }

    #[test]
    fn test_from_json_accepts_serialized_record() {
        let record = Record::from_json(
            r#"{"action":"SEND","exit":true,"items":[{"uti":"public.url","url":"https://ex.com","imageType":"image/jpeg"}]}"#,
        )
        .unwrap();

        assert_eq!(record.action, "SEND");
        assert!(record.exit);
        let item = record.sole_item().unwrap();
        assert!(item.is_url());
        assert_eq!(item.image_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        assert!(Record::from_json("{\"action\": ").is_err());
        assert!(Record::from_json("{\"items\": []}").is_err());
    }

    #[test]
    fn test_sole_item() {
        let mut record = Record::new("VIEW", false);
        assert!(record.sole_item().is_none());

        record.items.push(Item::default());
        assert!(record.sole_item().is_some());

        record.items.push(Item::default());
        assert!(record.sole_item_mut().is_none());
    }
}
