use serde_json::{json, Map, Value};

use crate::error::ArchicadError;

/// Concrete kinds of property value objects understood by the ArchiCAD JSON API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum WireKind {
    NormalInteger,
    NormalNumber,
    NormalLength,
    NormalArea,
    NormalVolume,
    NormalAngle,
    NormalBoolean,
    NormalString,
    NormalIntegerList,
    NormalNumberList,
    NormalLengthList,
    NormalAreaList,
    NormalVolumeList,
    NormalAngleList,
    NormalBooleanList,
    NormalStringList,
    NormalSingleEnum,
    NormalMultiEnum,
    EnumValueIdWrapper,
    DisplayValueEnumId,
    NonLocalizedValueEnumId,
    NotAvailable,
    NotEvaluated,
    UserUndefined,
}

impl WireKind {
    /// Argument name that carries the payload when rebuilding this kind.
    /// `None` for the absence kinds, which carry no payload at all.
    pub fn value_argument(self) -> Option<&'static str> {
        match self {
            Self::DisplayValueEnumId => Some("displayValue"),
            Self::EnumValueIdWrapper => Some("enumValueId"),
            Self::NonLocalizedValueEnumId => Some("nonLocalizedValue"),
            Self::NotAvailable | Self::NotEvaluated | Self::UserUndefined => None,
            _ => Some("value"),
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Self::NormalInteger => "NormalIntegerPropertyValue",
            Self::NormalNumber => "NormalNumberPropertyValue",
            Self::NormalLength => "NormalLengthPropertyValue",
            Self::NormalArea => "NormalAreaPropertyValue",
            Self::NormalVolume => "NormalVolumePropertyValue",
            Self::NormalAngle => "NormalAnglePropertyValue",
            Self::NormalBoolean => "NormalBooleanPropertyValue",
            Self::NormalString => "NormalStringPropertyValue",
            Self::NormalIntegerList => "NormalIntegerListPropertyValue",
            Self::NormalNumberList => "NormalNumberListPropertyValue",
            Self::NormalLengthList => "NormalLengthListPropertyValue",
            Self::NormalAreaList => "NormalAreaListPropertyValue",
            Self::NormalVolumeList => "NormalVolumeListPropertyValue",
            Self::NormalAngleList => "NormalAngleListPropertyValue",
            Self::NormalBooleanList => "NormalBooleanListPropertyValue",
            Self::NormalStringList => "NormalStringListPropertyValue",
            Self::NormalSingleEnum => "NormalSingleEnumPropertyValue",
            Self::NormalMultiEnum => "NormalMultiEnumPropertyValue",
            Self::EnumValueIdWrapper => "EnumValueIdWrapper",
            Self::DisplayValueEnumId => "DisplayValueEnumId",
            Self::NonLocalizedValueEnumId => "NonLocalizedValueEnumId",
            Self::NotAvailable => "NotAvailablePropertyValue",
            Self::NotEvaluated => "NotEvaluatedPropertyValue",
            Self::UserUndefined => "UserUndefinedPropertyValue",
        }
    }

    /// The JSON `type` discriminator of the normal kinds and the enum ids.
    pub fn type_name(self) -> Option<&'static str> {
        let name = match self {
            Self::NormalInteger => "integer",
            Self::NormalNumber => "number",
            Self::NormalLength => "length",
            Self::NormalArea => "area",
            Self::NormalVolume => "volume",
            Self::NormalAngle => "angle",
            Self::NormalBoolean => "boolean",
            Self::NormalString => "string",
            Self::NormalIntegerList => "integerList",
            Self::NormalNumberList => "numberList",
            Self::NormalLengthList => "lengthList",
            Self::NormalAreaList => "areaList",
            Self::NormalVolumeList => "volumeList",
            Self::NormalAngleList => "angleList",
            Self::NormalBooleanList => "booleanList",
            Self::NormalStringList => "stringList",
            Self::NormalSingleEnum => "singleEnum",
            Self::NormalMultiEnum => "multiEnum",
            Self::DisplayValueEnumId => "displayValue",
            Self::NonLocalizedValueEnumId => "nonLocalizedValue",
            Self::EnumValueIdWrapper
            | Self::NotAvailable
            | Self::NotEvaluated
            | Self::UserUndefined => return None,
        };

        Some(name)
    }

    pub(crate) fn from_normal_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "integer" => Self::NormalInteger,
            "number" => Self::NormalNumber,
            "length" => Self::NormalLength,
            "area" => Self::NormalArea,
            "volume" => Self::NormalVolume,
            "angle" => Self::NormalAngle,
            "boolean" => Self::NormalBoolean,
            "string" => Self::NormalString,
            "integerList" => Self::NormalIntegerList,
            "numberList" => Self::NormalNumberList,
            "lengthList" => Self::NormalLengthList,
            "areaList" => Self::NormalAreaList,
            "volumeList" => Self::NormalVolumeList,
            "angleList" => Self::NormalAngleList,
            "booleanList" => Self::NormalBooleanList,
            "stringList" => Self::NormalStringList,
            "singleEnum" => Self::NormalSingleEnum,
            "multiEnum" => Self::NormalMultiEnum,
            _ => return None,
        };

        Some(kind)
    }

    /// The JSON `status` of property value kinds; `None` for enum ids and wrappers.
    pub fn status_name(self) -> Option<&'static str> {
        match self {
            Self::NotAvailable => Some(STATUS_NOT_AVAILABLE),
            Self::NotEvaluated => Some(STATUS_NOT_EVALUATED),
            Self::UserUndefined => Some(STATUS_USER_UNDEFINED),
            Self::EnumValueIdWrapper | Self::DisplayValueEnumId | Self::NonLocalizedValueEnumId => {
                None
            }
            _ => Some(STATUS_NORMAL),
        }
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            Self::NormalIntegerList
                | Self::NormalNumberList
                | Self::NormalLengthList
                | Self::NormalAreaList
                | Self::NormalVolumeList
                | Self::NormalAngleList
                | Self::NormalBooleanList
                | Self::NormalStringList
        )
    }

    pub fn is_absent(self) -> bool {
        matches!(
            self,
            Self::NotAvailable | Self::NotEvaluated | Self::UserUndefined
        )
    }

    /// Kinds that cannot be written back and are left out of submissions.
    pub fn is_omitted_on_write(self) -> bool {
        matches!(self, Self::NotAvailable | Self::NotEvaluated)
    }
}

impl std::fmt::Display for WireKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

const STATUS_NORMAL: &str = "normal";
const STATUS_NOT_AVAILABLE: &str = "notAvailable";
const STATUS_NOT_EVALUATED: &str = "notEvaluated";
const STATUS_USER_UNDEFINED: &str = "userUndefined";

/// One polymorphic property value as sent over the wire.
///
/// Enum variants nest: a single enum holds an enum id, a multi enum holds
/// [`WireValue::EnumValueIdWrapper`] items, each wrapping an enum id.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    NormalInteger(i64),
    NormalNumber(f64),
    NormalLength(f64),
    NormalArea(f64),
    NormalVolume(f64),
    NormalAngle(f64),
    NormalBoolean(bool),
    NormalString(String),
    NormalIntegerList(Vec<i64>),
    NormalNumberList(Vec<f64>),
    NormalLengthList(Vec<f64>),
    NormalAreaList(Vec<f64>),
    NormalVolumeList(Vec<f64>),
    NormalAngleList(Vec<f64>),
    NormalBooleanList(Vec<bool>),
    NormalStringList(Vec<String>),
    NormalSingleEnum(Box<WireValue>),
    NormalMultiEnum(Vec<WireValue>),
    EnumValueIdWrapper(Box<WireValue>),
    DisplayValueEnumId(String),
    NonLocalizedValueEnumId(String),
    NotAvailable { value_type: Option<String> },
    NotEvaluated { value_type: Option<String> },
    UserUndefined { value_type: Option<String> },
}

impl WireValue {
    pub fn kind(&self) -> WireKind {
        match self {
            Self::NormalInteger(_) => WireKind::NormalInteger,
            Self::NormalNumber(_) => WireKind::NormalNumber,
            Self::NormalLength(_) => WireKind::NormalLength,
            Self::NormalArea(_) => WireKind::NormalArea,
            Self::NormalVolume(_) => WireKind::NormalVolume,
            Self::NormalAngle(_) => WireKind::NormalAngle,
            Self::NormalBoolean(_) => WireKind::NormalBoolean,
            Self::NormalString(_) => WireKind::NormalString,
            Self::NormalIntegerList(_) => WireKind::NormalIntegerList,
            Self::NormalNumberList(_) => WireKind::NormalNumberList,
            Self::NormalLengthList(_) => WireKind::NormalLengthList,
            Self::NormalAreaList(_) => WireKind::NormalAreaList,
            Self::NormalVolumeList(_) => WireKind::NormalVolumeList,
            Self::NormalAngleList(_) => WireKind::NormalAngleList,
            Self::NormalBooleanList(_) => WireKind::NormalBooleanList,
            Self::NormalStringList(_) => WireKind::NormalStringList,
            Self::NormalSingleEnum(_) => WireKind::NormalSingleEnum,
            Self::NormalMultiEnum(_) => WireKind::NormalMultiEnum,
            Self::EnumValueIdWrapper(_) => WireKind::EnumValueIdWrapper,
            Self::DisplayValueEnumId(_) => WireKind::DisplayValueEnumId,
            Self::NonLocalizedValueEnumId(_) => WireKind::NonLocalizedValueEnumId,
            Self::NotAvailable { .. } => WireKind::NotAvailable,
            Self::NotEvaluated { .. } => WireKind::NotEvaluated,
            Self::UserUndefined { .. } => WireKind::UserUndefined,
        }
    }

    /// The `type` attribute present on this object, if any.
    pub fn type_attribute(&self) -> Option<String> {
        match self {
            Self::NotAvailable { value_type }
            | Self::NotEvaluated { value_type }
            | Self::UserUndefined { value_type } => value_type.clone(),
            other => other.kind().type_name().map(str::to_string),
        }
    }

    /// The `status` attribute present on this object, if any.
    pub fn status_attribute(&self) -> Option<String> {
        self.kind().status_name().map(str::to_string)
    }

    /// Parses a property value object, e.g. the `propertyValue` member of a
    /// `PropertyValueOrErrorItem`.
    pub fn from_json_property(json: &Value) -> Result<Self, ArchicadError> {
        let status = str_field(json, "status")?;
        let value_type = json.get("type").and_then(Value::as_str);

        match status {
            STATUS_NOT_AVAILABLE => {
                return Ok(Self::NotAvailable {
                    value_type: value_type.map(str::to_string),
                })
            }
            STATUS_NOT_EVALUATED => {
                return Ok(Self::NotEvaluated {
                    value_type: value_type.map(str::to_string),
                })
            }
            STATUS_USER_UNDEFINED => {
                return Ok(Self::UserUndefined {
                    value_type: value_type.map(str::to_string),
                })
            }
            STATUS_NORMAL => {}
            other => {
                return Err(ArchicadError::UnsupportedWireKind {
                    kind: format!("status `{other}`"),
                })
            }
        }

        let type_name = value_type.ok_or_else(|| missing_field("type"))?;
        let kind = WireKind::from_normal_type_name(type_name).ok_or_else(|| {
            ArchicadError::UnsupportedWireKind {
                kind: format!("type `{type_name}`"),
            }
        })?;
        let value = json.get("value").ok_or_else(|| missing_field("value"))?;

        let parsed = match kind {
            WireKind::NormalInteger => Self::NormalInteger(as_i64(value)?),
            WireKind::NormalNumber => Self::NormalNumber(as_f64(value)?),
            WireKind::NormalLength => Self::NormalLength(as_f64(value)?),
            WireKind::NormalArea => Self::NormalArea(as_f64(value)?),
            WireKind::NormalVolume => Self::NormalVolume(as_f64(value)?),
            WireKind::NormalAngle => Self::NormalAngle(as_f64(value)?),
            WireKind::NormalBoolean => Self::NormalBoolean(as_bool(value)?),
            WireKind::NormalString => Self::NormalString(as_str(value)?.to_string()),
            WireKind::NormalIntegerList => Self::NormalIntegerList(list_of(value, as_i64)?),
            WireKind::NormalNumberList => Self::NormalNumberList(list_of(value, as_f64)?),
            WireKind::NormalLengthList => Self::NormalLengthList(list_of(value, as_f64)?),
            WireKind::NormalAreaList => Self::NormalAreaList(list_of(value, as_f64)?),
            WireKind::NormalVolumeList => Self::NormalVolumeList(list_of(value, as_f64)?),
            WireKind::NormalAngleList => Self::NormalAngleList(list_of(value, as_f64)?),
            WireKind::NormalBooleanList => Self::NormalBooleanList(list_of(value, as_bool)?),
            WireKind::NormalStringList => {
                Self::NormalStringList(list_of(value, |item| as_str(item).map(str::to_string))?)
            }
            WireKind::NormalSingleEnum => {
                Self::NormalSingleEnum(Box::new(Self::from_json_enum_id(value)?))
            }
            WireKind::NormalMultiEnum => {
                Self::NormalMultiEnum(list_of(value, Self::from_json_enum_wrapper)?)
            }
            other => {
                return Err(ArchicadError::UnsupportedWireKind {
                    kind: other.class_name().to_string(),
                })
            }
        };

        Ok(parsed)
    }

    fn from_json_enum_wrapper(json: &Value) -> Result<Self, ArchicadError> {
        let inner = json
            .get("enumValueId")
            .ok_or_else(|| missing_field("enumValueId"))?;
        Ok(Self::EnumValueIdWrapper(Box::new(Self::from_json_enum_id(
            inner,
        )?)))
    }

    fn from_json_enum_id(json: &Value) -> Result<Self, ArchicadError> {
        match str_field(json, "type")? {
            "displayValue" => Ok(Self::DisplayValueEnumId(
                str_field(json, "displayValue")?.to_string(),
            )),
            "nonLocalizedValue" => Ok(Self::NonLocalizedValueEnumId(
                str_field(json, "nonLocalizedValue")?.to_string(),
            )),
            other => Err(ArchicadError::UnsupportedWireKind {
                kind: format!("enum value id type `{other}`"),
            }),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::NormalInteger(value) => self.normal_json(json!(value)),
            Self::NormalNumber(value)
            | Self::NormalLength(value)
            | Self::NormalArea(value)
            | Self::NormalVolume(value)
            | Self::NormalAngle(value) => self.normal_json(json!(value)),
            Self::NormalBoolean(value) => self.normal_json(json!(value)),
            Self::NormalString(value) => self.normal_json(json!(value)),
            Self::NormalIntegerList(values) => self.normal_json(json!(values)),
            Self::NormalNumberList(values)
            | Self::NormalLengthList(values)
            | Self::NormalAreaList(values)
            | Self::NormalVolumeList(values)
            | Self::NormalAngleList(values) => self.normal_json(json!(values)),
            Self::NormalBooleanList(values) => self.normal_json(json!(values)),
            Self::NormalStringList(values) => self.normal_json(json!(values)),
            Self::NormalSingleEnum(inner) => self.normal_json(inner.to_json()),
            Self::NormalMultiEnum(items) => {
                self.normal_json(Value::Array(items.iter().map(Self::to_json).collect()))
            }
            Self::EnumValueIdWrapper(inner) => json!({ "enumValueId": inner.to_json() }),
            Self::DisplayValueEnumId(value) => {
                json!({ "type": "displayValue", "displayValue": value })
            }
            Self::NonLocalizedValueEnumId(value) => {
                json!({ "type": "nonLocalizedValue", "nonLocalizedValue": value })
            }
            Self::NotAvailable { value_type }
            | Self::NotEvaluated { value_type }
            | Self::UserUndefined { value_type } => {
                let mut object = Map::new();
                if let Some(value_type) = value_type {
                    object.insert("type".to_string(), json!(value_type));
                }
                if let Some(status) = self.kind().status_name() {
                    object.insert("status".to_string(), json!(status));
                }
                Value::Object(object)
            }
        }
    }

    fn normal_json(&self, value: Value) -> Value {
        json!({
            "type": self.kind().type_name(),
            "status": STATUS_NORMAL,
            "value": value,
        })
    }
}

fn missing_field(field: &str) -> ArchicadError {
    ArchicadError::JsonDecode(format!("property value is missing `{field}`"))
}

fn str_field<'a>(json: &'a Value, field: &str) -> Result<&'a str, ArchicadError> {
    json.get(field)
        .ok_or_else(|| missing_field(field))
        .and_then(as_str)
}

fn as_str(value: &Value) -> Result<&str, ArchicadError> {
    value
        .as_str()
        .ok_or_else(|| ArchicadError::JsonDecode(format!("expected a string, got `{value}`")))
}

fn as_i64(value: &Value) -> Result<i64, ArchicadError> {
    value
        .as_i64()
        .ok_or_else(|| ArchicadError::JsonDecode(format!("expected an integer, got `{value}`")))
}

fn as_f64(value: &Value) -> Result<f64, ArchicadError> {
    value
        .as_f64()
        .ok_or_else(|| ArchicadError::JsonDecode(format!("expected a number, got `{value}`")))
}

fn as_bool(value: &Value) -> Result<bool, ArchicadError> {
    value
        .as_bool()
        .ok_or_else(|| ArchicadError::JsonDecode(format!("expected a boolean, got `{value}`")))
}

fn list_of<T>(
    value: &Value,
    item: impl Fn(&Value) -> Result<T, ArchicadError>,
) -> Result<Vec<T>, ArchicadError> {
    value
        .as_array()
        .ok_or_else(|| ArchicadError::JsonDecode(format!("expected a list, got `{value}`")))?
        .iter()
        .map(item)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{WireKind, WireValue};
    use crate::error::ArchicadError;

    #[test]
    fn parses_single_enum_with_non_localized_id() {
        let json = json!({
            "type": "singleEnum",
            "status": "normal",
            "value": { "type": "nonLocalizedValue", "nonLocalizedValue": "AllRelevantFilters" },
        });

        let value = WireValue::from_json_property(&json).expect("single enum should parse");
        assert_eq!(
            value,
            WireValue::NormalSingleEnum(Box::new(WireValue::NonLocalizedValueEnumId(
                "AllRelevantFilters".to_string()
            )))
        );
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn parses_multi_enum_wrappers() {
        let json = json!({
            "type": "multiEnum",
            "status": "normal",
            "value": [
                { "enumValueId": { "type": "displayValue", "displayValue": "PAS 24:2012" } },
                { "enumValueId": { "type": "displayValue", "displayValue": "Building Regulations Part Q" } },
            ],
        });

        let value = WireValue::from_json_property(&json).expect("multi enum should parse");
        match &value {
            WireValue::NormalMultiEnum(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].kind(), WireKind::EnumValueIdWrapper);
            }
            other => panic!("unexpected value: {other:?}"),
        }
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn parses_absence_kinds_with_optional_type() {
        let value = WireValue::from_json_property(&json!({ "type": "length", "status": "notAvailable" }))
            .expect("not available should parse");
        assert_eq!(
            value,
            WireValue::NotAvailable {
                value_type: Some("length".to_string())
            }
        );

        let value = WireValue::from_json_property(&json!({ "status": "userUndefined" }))
            .expect("user undefined without type should parse");
        assert_eq!(value, WireValue::UserUndefined { value_type: None });
        assert_eq!(value.to_json(), json!({ "status": "userUndefined" }));
    }

    #[test]
    fn unknown_type_is_unsupported_kind() {
        let result = WireValue::from_json_property(&json!({
            "type": "colorList",
            "status": "normal",
            "value": [],
        }));
        assert!(matches!(
            result,
            Err(ArchicadError::UnsupportedWireKind { .. })
        ));

        let result = WireValue::from_json_property(&json!({ "type": "string", "status": "locked" }));
        assert!(matches!(
            result,
            Err(ArchicadError::UnsupportedWireKind { .. })
        ));
    }

    #[test]
    fn wrong_scalar_shape_is_decode_error() {
        let result = WireValue::from_json_property(&json!({
            "type": "integer",
            "status": "normal",
            "value": "twelve",
        }));
        assert!(matches!(result, Err(ArchicadError::JsonDecode(_))));
    }

    #[test]
    fn value_argument_table() {
        assert_eq!(
            WireKind::DisplayValueEnumId.value_argument(),
            Some("displayValue")
        );
        assert_eq!(
            WireKind::EnumValueIdWrapper.value_argument(),
            Some("enumValueId")
        );
        assert_eq!(
            WireKind::NonLocalizedValueEnumId.value_argument(),
            Some("nonLocalizedValue")
        );
        assert_eq!(WireKind::NormalStringList.value_argument(), Some("value"));
        assert_eq!(WireKind::NotEvaluated.value_argument(), None);
    }

    #[test]
    fn attributes_follow_kind() {
        let value = WireValue::NormalArea(12.5);
        assert_eq!(value.type_attribute().as_deref(), Some("area"));
        assert_eq!(value.status_attribute().as_deref(), Some("normal"));

        let wrapper = WireValue::EnumValueIdWrapper(Box::new(WireValue::DisplayValueEnumId(
            "A".to_string(),
        )));
        assert_eq!(wrapper.type_attribute(), None);
        assert_eq!(wrapper.status_attribute(), None);
    }
}
