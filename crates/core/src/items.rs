//! Items
//!
//! Line-item identity as read from the page's data attributes.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ITEM_ID_KEYS: [&str; 3] = ["itemId", "productId", "courseId"];
const ITEM_TYPE_KEYS: [&str; 2] = ["itemType", "productType"];
const ITEM_NAME_KEYS: [&str; 2] = ["itemName", "productName"];
const URL_KEY: &str = "url";

/// Errors raised while resolving an item from data attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No item id attribute was present (or it was blank).
    #[error("item id not found")]
    MissingItemId,

    /// The item type attribute named an unsupported type.
    #[error("unknown item type: {0}")]
    UnknownItemType(String),
}

/// Kind of purchasable item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A course (the storefront default).
    #[default]
    Course,

    /// A physical or digital product.
    Product,
}

impl ItemType {
    /// Wire name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Course => "course",
            ItemType::Product => "product",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ResolveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "course" => Ok(ItemType::Course),
            "product" => Ok(ItemType::Product),
            other => Err(ResolveError::UnknownItemType(other.to_string())),
        }
    }
}

/// Data attributes of a page element, keyed the way the DOM dataset exposes them
/// (`data-product-id` becomes `productId`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAttributes(BTreeMap<String, String>);

impl DataAttributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace one attribute.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up one attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Attributes of an enclosing element fill in keys this set lacks.
    #[must_use]
    pub fn inherit(mut self, parent: &DataAttributes) -> Self {
        for (key, value) in &parent.0 {
            self.0.entry(key.clone()).or_insert_with(|| value.clone());
        }

        self
    }

    /// Endpoint override carried by the element, if any.
    pub fn url(&self) -> Option<&str> {
        self.get(URL_KEY).filter(|url| !url.trim().is_empty())
    }

    fn first_present(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DataAttributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Identity of one cart line as shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItemRef {
    item_id: String,
    item_type: ItemType,
    display_name: Option<String>,
}

impl CartItemRef {
    /// Create a reference with no display name.
    pub fn new(item_id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            item_id: item_id.into(),
            item_type,
            display_name: None,
        }
    }

    /// Attach a display name used in confirmation prompts.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Resolve a reference from an element's data attributes.
    ///
    /// A missing type defaults to [`ItemType::Course`].
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MissingItemId`]: no id attribute is present.
    /// - [`ResolveError::UnknownItemType`]: the type attribute is not `course` or `product`.
    pub fn from_attributes(attributes: &DataAttributes) -> Result<Self, ResolveError> {
        let item_id = attributes
            .first_present(&ITEM_ID_KEYS)
            .ok_or(ResolveError::MissingItemId)?;

        let item_type = attributes
            .first_present(&ITEM_TYPE_KEYS)
            .map(str::parse::<ItemType>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            item_id: item_id.to_string(),
            item_type,
            display_name: attributes.first_present(&ITEM_NAME_KEYS).map(str::to_string),
        })
    }

    /// Opaque item id.
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Item type.
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Display name, if the page provided one.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether two references point at the same cart line, ignoring display names.
    pub fn same_line(&self, other: &CartItemRef) -> bool {
        self.item_id == other.item_id && self.item_type == other.item_type
    }
}

impl fmt::Display for CartItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item_type, self.item_id)
    }
}
