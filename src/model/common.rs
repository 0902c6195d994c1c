use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ArchicadError;
use crate::model::wire::WireValue;

pub const CLASSIFICATION_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ElementId {
    pub guid: String,
}

impl ElementId {
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.guid)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PropertyId {
    pub guid: String,
}

impl PropertyId {
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }
}

/// Locally constructed property identifier; resolved to a [`PropertyId`] by the connector.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropertyUserId {
    #[serde(rename = "BuiltIn", rename_all = "camelCase")]
    BuiltIn { non_localized_name: String },
    #[serde(rename = "UserDefined", rename_all = "camelCase")]
    UserDefined { localized_name: Vec<String> },
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub version: u32,
    pub build_number: u32,
    pub language_code: String,
}

impl std::fmt::Display for ProductInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ARCHICAD {} {} Build {}",
            self.version, self.language_code, self.build_number
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClassificationSystemId {
    pub guid: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClassificationItemId {
    pub guid: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSystem {
    pub classification_system_id: ClassificationSystemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub version: String,
    pub date: String,
}

impl ClassificationSystem {
    pub fn release_date(&self) -> Result<NaiveDate, ArchicadError> {
        parse_classification_date(&self.date)
    }
}

pub fn parse_classification_date(value: &str) -> Result<NaiveDate, ArchicadError> {
    NaiveDate::parse_from_str(value, CLASSIFICATION_DATE_FORMAT).map_err(|err| {
        ArchicadError::Config {
            reason: format!("invalid classification date `{value}`: {err}"),
        }
    })
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationItem {
    pub classification_item_id: ClassificationItemId,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub children: Vec<ClassificationItemInTree>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationItemInTree {
    pub classification_item: ClassificationItem,
}

impl ClassificationItem {
    /// Depth-first search of this item and its descendants by user-facing id.
    pub fn find(&self, id: &str) -> Option<&ClassificationItem> {
        if self.id == id {
            return Some(self);
        }

        self.children
            .iter()
            .find_map(|child| child.classification_item.find(id))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinMode {
    Intersect,
    Union,
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "intersect" => Ok(Self::Intersect),
            "union" => Ok(Self::Union),
            _ => Err(format!(
                "unknown join mode `{value}`; expected `intersect` or `union`"
            )),
        }
    }
}

/// Combines element lists; the first list's order is kept, later lists only
/// filter (intersect) or append unseen elements (union).
pub fn join_elements(mode: JoinMode, lists: &[Vec<ElementId>]) -> Vec<ElementId> {
    let mut lists = lists.iter();
    let Some(first) = lists.next() else {
        return Vec::new();
    };

    let mut joined = first.clone();
    for list in lists {
        match mode {
            JoinMode::Intersect => joined.retain(|element| list.contains(element)),
            JoinMode::Union => {
                for element in list {
                    if !joined.contains(element) {
                        joined.push(element.clone());
                    }
                }
            }
        }
    }

    joined
}

/// Element query; set filters are intersected, an empty filter matches nothing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ElementFilter {
    pub element_type: Option<String>,
    pub classification: Option<ClassificationItemId>,
}

impl ElementFilter {
    pub fn by_type(element_type: impl Into<String>) -> Self {
        Self {
            element_type: Some(element_type.into()),
            classification: None,
        }
    }

    pub fn with_classification(mut self, classification: ClassificationItemId) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.element_type.is_none() && self.classification.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementPropertyValue {
    pub element_id: ElementId,
    pub property_id: PropertyId,
    pub property_value: WireValue,
}

impl ElementPropertyValue {
    pub(crate) fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "elementId": { "guid": self.element_id.guid },
            "propertyId": { "guid": self.property_id.guid },
            "propertyValue": self.property_value.to_json(),
        })
    }
}

/// One cell of a `GetPropertyValuesOfElements` response.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValueOrError {
    Value(WireValue),
    Error { code: i64, message: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExecutionResult {
    Success,
    Failure { code: i64, message: String },
}

pub const SUCCESS_CODE: i64 = 0;
pub const SUCCESS_MESSAGE: &str = "Success";

/// Outcome counts of one submission batch, keyed by `(code, message)`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransactionSummary {
    pub outcomes: BTreeMap<(i64, String), usize>,
}

impl TransactionSummary {
    pub fn total(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .get(&(SUCCESS_CODE, SUCCESS_MESSAGE.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}
