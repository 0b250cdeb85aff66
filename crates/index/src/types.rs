use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque identifier of an item. Unique only within its collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Fresh random id (UUID v4).
    pub fn generate() -> Self {
        ItemId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId(value)
    }
}

/// Garment slot an item fills in an outfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
        }
    }

    /// The slot that completes an outfit with this one.
    pub fn complement(self) -> Self {
        match self {
            Category::Top => Category::Bottom,
            Category::Bottom => Category::Top,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}', expected 'top' or 'bottom'")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Category::Top),
            "bottom" => Ok(Category::Bottom),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// Free-form metadata attached to an item.
///
/// A JSON object. Well-known keys are `image_path`, `category`, `description`,
/// `product_name`, `price`, `tags` and, once injected, `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload of a garment: the two keys every stored item carries.
    pub fn garment(image_path: impl Into<String>, category: Category) -> Self {
        let mut payload = Self::new();
        payload.insert("image_path", image_path.into());
        payload.insert("category", category.as_str());
        payload
    }

    /// Wrap an arbitrary JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Payload(map)),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with("description", description.into())
    }

    pub fn with_product_name(self, name: impl Into<String>) -> Self {
        self.with("product_name", name.into())
    }

    pub fn with_price(self, price: f64) -> Self {
        self.with("price", price)
    }

    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<Value> = tags.into_iter().map(|t| Value::String(t.into())).collect();
        self.with("tags", tags)
    }

    /// Copy of this payload carrying the item id under `id`.
    pub fn with_id(&self, id: &ItemId) -> Self {
        self.clone().with("id", id.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<ItemId> {
        self.get_str("id").map(ItemId::from)
    }

    pub fn image_path(&self) -> Option<&str> {
        self.get_str("image_path")
    }

    /// Parsed `category`, `None` when missing or not a known slot.
    pub fn category(&self) -> Option<Category> {
        self.get_str("category").and_then(|c| c.parse().ok())
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    pub fn product_name(&self) -> Option<&str> {
        self.get_str("product_name")
    }

    /// Display label: `product_name`, else `description`.
    pub fn label(&self) -> Option<&str> {
        self.product_name().or_else(|| self.description())
    }

    pub fn price(&self) -> Option<f64> {
        self.0.get("price").and_then(Value::as_f64)
    }

    pub fn tags(&self) -> Vec<&str> {
        match self.0.get("tags") {
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A point in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

impl Item {
    pub fn new(id: ItemId, vector: Vec<f32>, payload: Payload) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }
}

/// Query hit: the stored item plus its similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub item: Item,
    pub score: f32,
}

/// Conjunction of exact-match conditions on payload fields.
///
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadFilter {
    must: Vec<(String, Value)>,
}

impl PayloadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(category: Category) -> Self {
        Self::new().must_match("category", category.as_str())
    }

    pub fn must_match(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.must.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        self.must
            .iter()
            .all(|(key, expected)| payload.get(key) == Some(expected))
    }
}
