use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dao::document_store::{CollectionPath, Document};

pub const ID_SEPARATOR: &str = "::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<CouchDocument>,
}

/// Raw CouchDB document: reserved `_id`/`_rev` plus the application body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl CouchDocument {
    /// Convert into a store document, stripping the collection prefix from the id.
    pub fn into_document(self, prefix: &str) -> Document {
        let id = self
            .id
            .strip_prefix(prefix)
            .map(str::to_string)
            .unwrap_or(self.id);
        Document {
            id,
            body: Value::Object(self.body),
        }
    }
}

/// All documents of a collection share this `_id` prefix.
pub fn collection_prefix(collection: &CollectionPath) -> String {
    format!("{}{}", collection.as_str().replace('/', ":"), ID_SEPARATOR)
}

pub fn doc_id(collection: &CollectionPath, id: &str) -> String {
    format!("{}{}", collection_prefix(collection), id)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn doc_ids_flatten_collection_path() {
        let games = CollectionPath::games("hub");
        assert_eq!(
            doc_id(&games, "abc"),
            "artifacts:hub:public:data:games::abc"
        );
    }

    #[test]
    fn into_document_strips_reserved_fields() {
        let raw: CouchDocument = serde_json::from_value(json!({
            "_id": "artifacts:hub:public:data:games::abc",
            "_rev": "1-x",
            "name": "Snake"
        }))
        .unwrap();
        let doc = raw.into_document(&collection_prefix(&CollectionPath::games("hub")));
        assert_eq!(doc.id, "abc");
        assert_eq!(doc.body, json!({"name": "Snake"}));
    }
}
