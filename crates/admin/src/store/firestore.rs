//! Cloud Firestore REST backend.
//!
//! Writes go through `documents:commit` so that a single request can carry
//! the field data, an existence precondition, and `REQUEST_TIME` transforms
//! for server-assigned timestamps. Reads use the plain document endpoints.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::config::FirebaseConfig;
use crate::gateway::Identity;

use super::{
    Collection, Document, FieldValue, Fields, RecordStore, StoreError, check_document_id,
    is_valid_document_id,
};

/// Documents requested per page when listing a collection.
const LIST_PAGE_SIZE: u32 = 300;

/// Firestore-backed record store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    /// `{base}/v1/projects/{project}/databases/{database}/documents`
    documents_url: String,
    /// `projects/{project}/databases/{database}`
    database_path: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Which precondition a commit write carries.
#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Insert,
    Update,
}

impl FirestoreStore {
    /// Create a client for the configured project and database.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let base_url = config.firestore_url.trim_end_matches('/').to_string();
        let database_path = format!(
            "projects/{}/databases/{}",
            config.project_id, config.database
        );
        Self {
            client: reqwest::Client::new(),
            documents_url: format!("{base_url}/v1/{database_path}/documents"),
            database_path,
            base_url,
        }
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection.as_str(), id)
    }

    fn document_name(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}/documents/{}/{}",
            self.database_path,
            collection.as_str(),
            id
        )
    }

    async fn commit(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
        fields: &Fields,
        kind: WriteKind,
    ) -> Result<(), StoreError> {
        let body = json!({ "writes": [self.write_json(collection, id, fields, kind)] });
        let response = self
            .client
            .post(format!("{}/v1/{}/documents:commit", self.base_url, self.database_path))
            .bearer_auth(caller.id_token().expose_secret())
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(error_from_response(response, collection, id).await)
    }

    fn write_json(&self, collection: Collection, id: &str, fields: &Fields, kind: WriteKind) -> Value {
        let mut data = Map::new();
        let mut transforms = Vec::new();
        for (key, value) in fields {
            match encode_value(value) {
                Some(encoded) => {
                    data.insert(key.clone(), encoded);
                }
                None => transforms.push(json!({
                    "fieldPath": key,
                    "setToServerValue": "REQUEST_TIME",
                })),
            }
        }

        let mut write = json!({
            "update": {
                "name": self.document_name(collection, id),
                "fields": Value::Object(data.clone()),
            },
            "currentDocument": { "exists": matches!(kind, WriteKind::Update) },
        });
        if matches!(kind, WriteKind::Update) {
            // Only the listed paths are touched; everything else is preserved.
            write["updateMask"] = json!({ "fieldPaths": data.keys().collect::<Vec<_>>() });
        }
        if !transforms.is_empty() {
            write["updateTransforms"] = Value::Array(transforms);
        }
        write
    }
}

#[async_trait]
impl RecordStore for FirestoreStore {
    #[instrument(skip(self, caller, fields), fields(uid = %caller.uid()))]
    async fn insert(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        check_document_id(collection, id)?;
        self.commit(caller, collection, id, &fields, WriteKind::Insert)
            .await
    }

    #[instrument(skip(self, caller, fields), fields(uid = %caller.uid()))]
    async fn update(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        check_document_id(collection, id)?;
        self.commit(caller, collection, id, &fields, WriteKind::Update)
            .await
    }

    #[instrument(skip(self, caller), fields(uid = %caller.uid()))]
    async fn delete(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
    ) -> Result<(), StoreError> {
        check_document_id(collection, id)?;
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .bearer_auth(caller.id_token().expose_secret())
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(error_from_response(response, collection, id).await)
    }

    #[instrument(skip(self, caller), fields(uid = %caller.uid()))]
    async fn get(
        &self,
        caller: &Identity,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        if !is_valid_document_id(id) {
            return Ok(None);
        }
        let response = self
            .client
            .get(self.document_url(collection, id))
            .bearer_auth(caller.id_token().expose_secret())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response, collection, id).await);
        }

        let document: FirestoreDocument = response.json().await?;
        Ok(Some(decode_document(document)))
    }

    #[instrument(skip(self, caller), fields(uid = %caller.uid()))]
    async fn list(
        &self,
        caller: &Identity,
        collection: Collection,
    ) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/{}", self.documents_url, collection.as_str());
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(caller.id_token().expose_secret())
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(error_from_response(response, collection, "").await);
            }

            let page: ListDocumentsResponse = response.json().await?;
            documents.extend(page.documents.into_iter().map(decode_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = documents.len(), "Listed documents");
        Ok(documents)
    }
}

// =============================================================================
// Value Encoding
// =============================================================================

/// Encode a field as a Firestore `Value`. Returns `None` for the server
/// timestamp sentinel, which travels as a transform instead.
fn encode_value(value: &FieldValue) -> Option<Value> {
    let encoded = match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        // int64 values are JSON strings on the wire.
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        FieldValue::ServerTimestamp => return None,
    };
    Some(encoded)
}

fn decode_value(value: &Value) -> FieldValue {
    let Some(object) = value.as_object() else {
        return FieldValue::Null;
    };

    if let Some(s) = object.get("stringValue").and_then(Value::as_str) {
        return FieldValue::String(s.to_owned());
    }
    if let Some(raw) = object.get("integerValue") {
        let parsed = raw
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| raw.as_i64());
        if let Some(i) = parsed {
            return FieldValue::Integer(i);
        }
    }
    if let Some(d) = object.get("doubleValue").and_then(Value::as_f64) {
        return FieldValue::Double(d);
    }
    if let Some(ts) = object
        .get("timestampValue")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    {
        return FieldValue::Timestamp(ts.with_timezone(&Utc));
    }
    FieldValue::Null
}

fn decode_document(document: FirestoreDocument) -> Document {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let fields = document
        .fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect();
    Document { id, fields }
}

async fn error_from_response(
    response: reqwest::Response,
    collection: Collection,
    id: &str,
) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let (message, code) = serde_json::from_str::<ErrorEnvelope>(&body).map_or_else(
        |_| (body.clone(), String::new()),
        |envelope| (envelope.error.message, envelope.error.status),
    );

    match (status, code.as_str()) {
        (StatusCode::NOT_FOUND, _) | (_, "NOT_FOUND") => StoreError::NotFound {
            collection,
            id: id.to_owned(),
        },
        (StatusCode::CONFLICT, _) | (_, "ALREADY_EXISTS") => StoreError::AlreadyExists {
            collection,
            id: id.to_owned(),
        },
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            StoreError::PermissionDenied(message)
        }
        _ => StoreError::Service {
            status: status.as_u16(),
            message,
        },
    }
}
