//! Success-path envelope building.
//!
//! Handler results are classified once into [`HandlerOutput`] and then
//! formatted by [`ResponseInterceptor::intercept`], which also attaches request
//! `meta` (duration, method, timestamp) and the `self` link.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::context::RequestContext;
use crate::jsonapi::{
    stringify_id, Attributes, JsonApiDocument, JsonApiFormatter, Links, Meta, PrimaryData,
    Relationships, ResourceObject,
};

/// Resource type used when neither a declaration nor the URL yields one.
pub const DEFAULT_RESOURCE_TYPE: &str = "resources";

/// Id given to synthetic single resources (primitives, wrapped objects).
const SYNTHETIC_ID: &str = "1";

/// What a self-describing value says about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub resource_type: String,
    pub id: String,
    pub attributes: Attributes,
    pub relationships: Option<Relationships>,
}

impl ResourceDescriptor {
    pub fn new(resource_type: impl Into<String>, id: impl ToString, attributes: Attributes) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.to_string(),
            attributes,
            relationships: None,
        }
    }

    pub fn with_relationships(mut self, relationships: Relationships) -> Self {
        self.relationships = Some(relationships);
        self
    }
}

/// Values that know their own JSON:API representation.
pub trait JsonApiResource {
    fn to_jsonapi(&self) -> ResourceDescriptor;
}

/// Shape of a successful handler result.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// No value (acknowledgements, deletes).
    Empty,
    SelfDescribing(ResourceDescriptor),
    SelfDescribingList(Vec<ResourceDescriptor>),
    /// An array of plain values.
    PlainList(Vec<Value>),
    /// A JSON object carrying an `id` member.
    PlainObjectWithId(serde_json::Map<String, Value>),
    /// A string, number or boolean.
    Primitive(Value),
    /// A JSON object without `id`.
    PlainObject(serde_json::Map<String, Value>),
}

impl HandlerOutput {
    /// Classify arbitrary JSON. Self-describing values never arrive as JSON;
    /// use [`HandlerOutput::resource`] / [`HandlerOutput::resources`] for them.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => HandlerOutput::Empty,
            Value::Array(items) => HandlerOutput::PlainList(items),
            Value::Object(object) if has_id(&object) => HandlerOutput::PlainObjectWithId(object),
            Value::Object(object) => HandlerOutput::PlainObject(object),
            primitive => HandlerOutput::Primitive(primitive),
        }
    }

    pub fn resource<R: JsonApiResource + ?Sized>(resource: &R) -> Self {
        HandlerOutput::SelfDescribing(resource.to_jsonapi())
    }

    pub fn resources<R: JsonApiResource>(resources: &[R]) -> Self {
        HandlerOutput::SelfDescribingList(resources.iter().map(JsonApiResource::to_jsonapi).collect())
    }

    pub fn message(message: impl Into<String>) -> Self {
        HandlerOutput::Primitive(Value::String(message.into()))
    }
}

fn has_id(object: &serde_json::Map<String, Value>) -> bool {
    object.get("id").is_some_and(|id| !id.is_null())
}

/// Declared resource types, keyed by route prefix.
///
/// The longest matching prefix wins. Matching respects path segment
/// boundaries, so `/api/v1/todo` does not match `/api/v1/todos`.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypes {
    entries: Vec<(String, String)>,
}

impl ResourceTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, prefix: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        self.entries.push((prefix, resource_type.into()));
        self
    }

    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(prefix, _)| matches_prefix(path, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, resource_type)| resource_type.as_str())
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.is_empty(),
        None => false,
    }
}

/// Naive English plural: `-s` stays, `-y` becomes `-ies`, anything else gains `s`.
pub fn pluralize(word: &str) -> String {
    if word.ends_with('s') {
        word.to_string()
    } else if let Some(stem) = word.strip_suffix('y') {
        format!("{stem}ies")
    } else {
        format!("{word}s")
    }
}

/// Guess a resource type for endpoints nobody declared.
///
/// A component name loses its `Controller` suffix and is lower-cased and
/// pluralized. Without one, the first path segment is used verbatim, then
/// [`DEFAULT_RESOURCE_TYPE`].
pub fn infer_resource_type(component: Option<&str>, path: &str) -> String {
    if let Some(name) = component {
        let name = name.replacen("Controller", "", 1).to_lowercase();
        if !name.is_empty() {
            return pluralize(&name);
        }
    }
    path.split('?')
        .next()
        .unwrap_or_default()
        .split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(DEFAULT_RESOURCE_TYPE)
        .to_string()
}

/// Formats successful handler results into JSON:API documents.
#[derive(Debug, Clone, Default)]
pub struct ResponseInterceptor {
    formatter: JsonApiFormatter,
    resource_types: ResourceTypes,
}

impl ResponseInterceptor {
    pub fn new(resource_types: ResourceTypes) -> Self {
        Self {
            formatter: JsonApiFormatter,
            resource_types,
        }
    }

    /// An explicit per-response type, then the registry, then the URL heuristic.
    pub fn resource_type(&self, ctx: &RequestContext, declared: Option<&str>) -> String {
        declared
            .or_else(|| self.resource_types.resolve(&ctx.path))
            .map(str::to_string)
            .unwrap_or_else(|| infer_resource_type(None, &ctx.path))
    }

    pub fn intercept(
        &self,
        output: HandlerOutput,
        ctx: &RequestContext,
        declared_type: Option<&str>,
    ) -> JsonApiDocument {
        let meta = Some(request_meta(ctx));
        let links = Some(Links::self_link(ctx.self_link.clone()));
        let resource_type = self.resource_type(ctx, declared_type);

        let data: Option<PrimaryData> = match output {
            HandlerOutput::Empty => None,
            HandlerOutput::SelfDescribing(descriptor) => Some(self.describe(descriptor).into()),
            HandlerOutput::SelfDescribingList(descriptors) => Some(PrimaryData::Many(
                descriptors.into_iter().map(|d| self.describe(d)).collect(),
            )),
            HandlerOutput::PlainList(items) if is_identified_list(&items) => {
                return self
                    .formatter
                    .format_list_response(&resource_type, items, meta, links);
            }
            HandlerOutput::PlainList(items) => {
                let mut attributes = Attributes::new();
                attributes.insert("items".to_string(), Value::Array(items));
                Some(self.synthetic(&resource_type, attributes).into())
            }
            HandlerOutput::PlainObjectWithId(mut object) => {
                let id = object.remove("id").map(|id| stringify_id(&id)).unwrap_or_default();
                Some(
                    self.formatter
                        .format_resource(&resource_type, id, object)
                        .into(),
                )
            }
            HandlerOutput::Primitive(value) => {
                let mut attributes = Attributes::new();
                attributes.insert("message".to_string(), value);
                Some(self.synthetic(&resource_type, attributes).into())
            }
            HandlerOutput::PlainObject(object) => {
                Some(self.synthetic(&resource_type, object).into())
            }
        };

        self.formatter
            .format_data_response(data, Vec::new(), meta, links)
    }

    fn describe(&self, descriptor: ResourceDescriptor) -> ResourceObject {
        let resource = self.formatter.format_resource(
            &descriptor.resource_type,
            descriptor.id,
            descriptor.attributes,
        );
        match descriptor.relationships {
            Some(relationships) => resource.with_relationships(relationships),
            None => resource,
        }
    }

    fn synthetic(&self, resource_type: &str, attributes: Attributes) -> ResourceObject {
        self.formatter
            .format_resource(resource_type, SYNTHETIC_ID, attributes)
    }
}

fn is_identified_list(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.as_object().is_some_and(has_id))
}

/// `{duration, method, timestamp}` for the document `meta`.
pub fn request_meta(ctx: &RequestContext) -> Meta {
    let mut meta = Meta::new();
    meta.insert(
        "duration".to_string(),
        Value::String(format!("{}ms", ctx.elapsed_ms())),
    );
    meta.insert("method".to_string(), Value::String(ctx.method.to_string()));
    meta.insert("timestamp".to_string(), Value::String(now_timestamp()));
    meta
}

/// Current UTC time, RFC 3339 with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
