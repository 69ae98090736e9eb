//! JSON:API v1.1 document types and the stateless resource formatter.
//!
//! Every optional member is skipped when absent so that documents never carry
//! `null` placeholders. The two meaningful nulls are the primary `data: null`
//! of an empty success document and `relationships.*.data: null`.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use todoapi_service_shared::jsonapi::JsonApiFormatter;
//!
//! let formatter = JsonApiFormatter;
//! let doc = formatter.format_list_response(
//!     "todos",
//!     vec![json!({"id": 1, "content": "a", "isDone": false})],
//!     None,
//!     None,
//! );
//! let value = serde_json::to_value(&doc).unwrap();
//! assert_eq!(value["data"][0]["id"], "1");
//! assert_eq!(value["jsonapi"]["version"], "1.1");
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version advertised in every document's `jsonapi` member.
pub const JSONAPI_VERSION: &str = "1.1";

/// Media type of every JSON:API document.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Attribute map of a resource object.
pub type Attributes = serde_json::Map<String, Value>;

/// Free-form `meta` member.
pub type Meta = serde_json::Map<String, Value>;

/// Named relationships of a resource object.
pub type Relationships = BTreeMap<String, RelationshipObject>;

/// `{type, id}` pair identifying a resource within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ResourceIdentifier {
    pub fn new(resource_type: impl Into<String>, id: impl Display) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.to_string(),
            meta: None,
        }
    }
}

/// Link members used on documents, resources and errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl Links {
    /// Links carrying only `self`.
    pub fn self_link(url: impl Into<String>) -> Self {
        Self {
            self_link: Some(url.into()),
            ..Self::default()
        }
    }

    /// Links carrying only `about` (used on error objects).
    pub fn about(url: impl Into<String>) -> Self {
        Self {
            about: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Linkage of a relationship: to-one or to-many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

/// A relationship as passed through from the handler; never resolved here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipObject {
    /// `None` serializes as `null` (an empty to-one relationship).
    pub data: Option<RelationshipData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// A typed, identified resource with its attributes.
///
/// `attributes` never contains `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Relationships>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ResourceObject {
    pub fn with_relationships(mut self, relationships: Relationships) -> Self {
        self.relationships = Some(relationships);
        self
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Where in the request an error originated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl ErrorSource {
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Self {
            pointer: Some(pointer.into()),
            ..Self::default()
        }
    }

    pub fn parameter(parameter: impl Into<String>) -> Self {
        Self {
            parameter: Some(parameter.into()),
            ..Self::default()
        }
    }

    pub fn header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            ..Self::default()
        }
    }
}

/// A JSON:API error object. `status` and `code` are always strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Primary data of a success document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    One(Box<ResourceObject>),
    Many(Vec<ResourceObject>),
}

impl From<ResourceObject> for PrimaryData {
    fn from(resource: ResourceObject) -> Self {
        PrimaryData::One(Box::new(resource))
    }
}

impl From<Vec<ResourceObject>> for PrimaryData {
    fn from(resources: Vec<ResourceObject>) -> Self {
        PrimaryData::Many(resources)
    }
}

/// The `data` / `errors` half of a document. Exactly one is ever emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentBody {
    Data(Option<PrimaryData>),
    Errors(Vec<JsonApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonApiVersion {
    pub version: String,
}

impl Default for JsonApiVersion {
    fn default() -> Self {
        Self {
            version: JSONAPI_VERSION.to_string(),
        }
    }
}

/// A top-level JSON:API document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonApiDocument {
    #[serde(flatten)]
    pub body: DocumentBody,
    pub jsonapi: JsonApiVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl JsonApiDocument {
    pub fn is_error(&self) -> bool {
        matches!(self.body, DocumentBody::Errors(_))
    }
}

/// Optional members of an error object, collected before [`JsonApiFormatter::create_error`].
///
/// Setters coerce `status` and `code` to strings. Unset or empty fields are
/// left out of the resulting error.
#[derive(Debug, Clone, Default)]
pub struct ErrorFields {
    id: Option<String>,
    status: Option<String>,
    code: Option<String>,
    title: Option<String>,
    detail: Option<String>,
    source: Option<ErrorSource>,
    links: Option<Links>,
    meta: Option<Meta>,
}

impl ErrorFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn status(mut self, status: impl ToString) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn code(mut self, code: impl ToString) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn source(mut self, source: ErrorSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Natural string form of a JSON id: strings verbatim, numbers and booleans
/// as written, `null` as the empty string.
pub fn stringify_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Stateless builder of resource objects and top-level documents. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiFormatter;

impl JsonApiFormatter {
    /// Build a resource object. Optional members are attached with the
    /// [`ResourceObject`] `with_*` builders.
    pub fn format_resource(
        &self,
        resource_type: &str,
        id: impl Display,
        attributes: Attributes,
    ) -> ResourceObject {
        ResourceObject {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
            attributes,
            relationships: None,
            links: None,
            meta: None,
        }
    }

    /// Success document. `None` data means "no content" and serializes as `data: null`.
    pub fn format_data_response(
        &self,
        data: Option<PrimaryData>,
        included: Vec<ResourceObject>,
        meta: Option<Meta>,
        links: Option<Links>,
    ) -> JsonApiDocument {
        JsonApiDocument {
            body: DocumentBody::Data(data),
            jsonapi: JsonApiVersion::default(),
            included: (!included.is_empty()).then_some(included),
            meta,
            links,
        }
    }

    /// Error document. Callers always pass at least one error.
    pub fn format_error_response(
        &self,
        errors: Vec<JsonApiError>,
        meta: Option<Meta>,
        links: Option<Links>,
    ) -> JsonApiDocument {
        JsonApiDocument {
            body: DocumentBody::Errors(errors),
            jsonapi: JsonApiVersion::default(),
            included: None,
            meta,
            links,
        }
    }

    pub fn create_error(&self, fields: ErrorFields) -> JsonApiError {
        JsonApiError {
            id: non_empty(fields.id),
            status: non_empty(fields.status),
            code: non_empty(fields.code),
            title: non_empty(fields.title),
            detail: non_empty(fields.detail),
            source: fields.source,
            links: fields.links,
            meta: fields.meta,
        }
    }

    /// List document from plain JSON objects: `id` becomes the resource id and
    /// every other key not starting with `@` becomes an attribute.
    pub fn format_list_response(
        &self,
        resource_type: &str,
        items: Vec<Value>,
        meta: Option<Meta>,
        links: Option<Links>,
    ) -> JsonApiDocument {
        let resources = items
            .into_iter()
            .map(|item| {
                let (id, attributes) = split_list_item(item);
                self.format_resource(resource_type, id, attributes)
            })
            .collect::<Vec<_>>();
        self.format_data_response(Some(PrimaryData::Many(resources)), Vec::new(), meta, links)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn split_list_item(item: Value) -> (String, Attributes) {
    let Value::Object(mut object) = item else {
        return (String::new(), Attributes::new());
    };
    let id = object.remove("id").map(|id| stringify_id(&id)).unwrap_or_default();
    object.retain(|key, _| !key.starts_with('@'));
    (id, object)
}
