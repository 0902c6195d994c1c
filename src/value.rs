//! Property value trees.
//!
//! [`decode`] turns one [`WireValue`] into a [`PropertyValue`] tree plus the
//! flat value a user edits. The tree is kept as a template and
//! [`PropertyValue::encode`] rebuilds a wire value of the same shape from an
//! edited flat value.

use serde_json::Value;

use crate::error::ArchicadError;
use crate::model::wire::{WireKind, WireValue};

#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl Scalar {
    fn is_informative(&self) -> bool {
        match self {
            Self::Boolean(value) => *value,
            Self::Integer(value) => *value != 0,
            Self::Number(value) => *value != 0.0,
            Self::String(value) => !value.is_empty(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Boolean(value) => Value::from(*value),
            Self::Integer(value) => Value::from(*value),
            Self::Number(value) => Value::from(*value),
            Self::String(value) => Value::from(value.as_str()),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(Self::Boolean(*value)),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Integer)
                .or_else(|| number.as_f64().map(Self::Number)),
            Value::String(value) => Some(Self::String(value.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value}"),
        }
    }
}

/// Fully unwrapped value of one cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FlatValue {
    #[default]
    Absent,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl FlatValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Truthiness used for template capture: absent, empty, zero and `false`
    /// values say nothing about the column.
    pub fn is_informative(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::Scalar(scalar) => scalar.is_informative(),
            Self::List(items) => !items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Scalar(Scalar::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(Scalar::Number(value)) => Some(*value),
            Self::Scalar(Scalar::Integer(value)) => Some(*value as f64),
            _ => None,
        }
    }

    fn into_scalars(self) -> Vec<Scalar> {
        match self {
            Self::Absent => Vec::new(),
            Self::Scalar(scalar) => vec![scalar],
            Self::List(items) => items,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Absent => Value::Null,
            Self::Scalar(scalar) => scalar.to_json(),
            Self::List(items) => Value::Array(items.iter().map(Scalar::to_json).collect()),
        }
    }

    /// Accepts `null`, a scalar, or a list of scalars.
    pub fn from_json(value: &Value) -> Result<Self, ArchicadError> {
        let invalid = || ArchicadError::JsonDecode(format!("`{value}` is not a flat value"));

        match value {
            Value::Null => Ok(Self::Absent),
            Value::Array(items) => items
                .iter()
                .map(|item| Scalar::from_json(item).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => Scalar::from_json(other).map(Self::Scalar).ok_or_else(invalid),
        }
    }
}

impl std::fmt::Display for FlatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "-"),
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::List(items) => {
                let joined = items
                    .iter()
                    .map(Scalar::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{joined}]")
            }
        }
    }
}

impl From<&str> for FlatValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for FlatValue {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::String(value))
    }
}

impl From<i64> for FlatValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }
}

impl From<f64> for FlatValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Number(value))
    }
}

impl From<bool> for FlatValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Boolean(value))
    }
}

impl<T: Into<FlatValue>> From<Option<T>> for FlatValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

impl From<Vec<&str>> for FlatValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(
            values
                .into_iter()
                .map(|value| Scalar::String(value.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<Scalar>> for FlatValue {
    fn from(values: Vec<Scalar>) -> Self {
        Self::List(values)
    }
}

/// Auxiliary attributes copied from the source wire object.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WireArgs {
    pub value_type: Option<String>,
    pub status: Option<String>,
}

impl WireArgs {
    fn of(wire: &WireValue) -> Self {
        Self {
            value_type: wire.type_attribute().filter(|value| !value.is_empty()),
            status: wire.status_attribute().filter(|value| !value.is_empty()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Flat(FlatValue),
    Nested(Box<PropertyValue>),
}

/// A decoded property value that remembers how to rebuild its wire shape.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyValue {
    pub tag: WireKind,
    pub value: Slot,
    pub args: WireArgs,
}

/// Result of decoding one wire value.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub flat: FlatValue,
    /// `None` only for an empty multi enum, which has no item to learn the
    /// enum id shape from.
    pub template: Option<PropertyValue>,
}

pub fn decode(wire: &WireValue) -> Decoded {
    let tree = unpack(wire);
    let flat = tree.flat().clone();
    let shapeless = tree.tag == WireKind::NormalMultiEnum && matches!(tree.value, Slot::Flat(_));
    let template = (!shapeless).then_some(tree);

    Decoded { flat, template }
}

fn unpack(wire: &WireValue) -> PropertyValue {
    let value = match wire {
        WireValue::NotAvailable { .. }
        | WireValue::NotEvaluated { .. }
        | WireValue::UserUndefined { .. } => Slot::Flat(FlatValue::Absent),
        WireValue::NormalSingleEnum(inner) | WireValue::EnumValueIdWrapper(inner) => {
            Slot::Nested(Box::new(unpack(inner)))
        }
        WireValue::NormalMultiEnum(items) => {
            let mut children: Vec<PropertyValue> = items.iter().map(unpack).collect();
            if children.is_empty() {
                Slot::Flat(FlatValue::List(Vec::new()))
            } else {
                let flats = children
                    .iter()
                    .flat_map(|child| child.flat().clone().into_scalars())
                    .collect();
                let mut shared = children.swap_remove(0);
                shared.set_flat(FlatValue::List(flats));
                Slot::Nested(Box::new(shared))
            }
        }
        WireValue::DisplayValueEnumId(value) | WireValue::NonLocalizedValueEnumId(value) => {
            Slot::Flat(FlatValue::from(value.as_str()))
        }
        WireValue::NormalInteger(value) => Slot::Flat(FlatValue::from(*value)),
        WireValue::NormalNumber(value)
        | WireValue::NormalLength(value)
        | WireValue::NormalArea(value)
        | WireValue::NormalVolume(value)
        | WireValue::NormalAngle(value) => Slot::Flat(FlatValue::from(*value)),
        WireValue::NormalBoolean(value) => Slot::Flat(FlatValue::from(*value)),
        WireValue::NormalString(value) => Slot::Flat(FlatValue::from(value.as_str())),
        WireValue::NormalIntegerList(values) => {
            Slot::Flat(list(values.iter().map(|value| Scalar::Integer(*value))))
        }
        WireValue::NormalNumberList(values)
        | WireValue::NormalLengthList(values)
        | WireValue::NormalAreaList(values)
        | WireValue::NormalVolumeList(values)
        | WireValue::NormalAngleList(values) => {
            Slot::Flat(list(values.iter().map(|value| Scalar::Number(*value))))
        }
        WireValue::NormalBooleanList(values) => {
            Slot::Flat(list(values.iter().map(|value| Scalar::Boolean(*value))))
        }
        WireValue::NormalStringList(values) => {
            Slot::Flat(list(values.iter().map(|value| Scalar::String(value.clone()))))
        }
    };

    PropertyValue {
        tag: wire.kind(),
        value,
        args: WireArgs::of(wire),
    }
}

fn list(items: impl Iterator<Item = Scalar>) -> FlatValue {
    FlatValue::List(items.collect())
}

enum Rebuilt {
    One(WireValue),
    Many(Vec<WireValue>),
}

impl Rebuilt {
    fn into_one(self, kind: WireKind) -> Result<WireValue, ArchicadError> {
        match self {
            Self::One(wire) => Ok(wire),
            Self::Many(items) => Err(ArchicadError::ValueShape {
                kind: kind.class_name(),
                reason: format!("expected one value, got a list of {}", items.len()),
            }),
        }
    }
}

enum Payload {
    Flat(FlatValue),
    Wire(WireValue),
    Wires(Vec<WireValue>),
}

impl PropertyValue {
    /// Innermost flat value, descending through nested nodes.
    pub fn flat(&self) -> &FlatValue {
        match &self.value {
            Slot::Flat(flat) => flat,
            Slot::Nested(inner) => inner.flat(),
        }
    }

    /// Replaces the innermost flat value, descending through nested nodes.
    pub fn set_flat(&mut self, value: FlatValue) {
        match &mut self.value {
            Slot::Flat(flat) => *flat = value,
            Slot::Nested(inner) => inner.set_flat(value),
        }
    }

    /// A `UserUndefined` node whose value type names a scalar or list kind can
    /// stand in for a template of that kind. Enum kinds cannot: the enum id
    /// flavour is only known from a defined value.
    pub fn promote_user_undefined(&self) -> Option<PropertyValue> {
        if self.tag != WireKind::UserUndefined {
            return None;
        }

        let kind = WireKind::from_normal_type_name(self.args.value_type.as_deref()?)?;
        if matches!(kind, WireKind::NormalSingleEnum | WireKind::NormalMultiEnum) {
            return None;
        }

        Some(PropertyValue {
            tag: kind,
            value: Slot::Flat(FlatValue::Absent),
            args: WireArgs {
                value_type: self.args.value_type.clone(),
                status: kind.status_name().map(str::to_string),
            },
        })
    }

    /// Rebuilds a wire value of this tree's shape carrying `value`.
    ///
    /// An absent `value` on a template of a present kind encodes as
    /// `UserUndefined` of the same value type.
    pub fn encode(&self, value: &FlatValue) -> Result<WireValue, ArchicadError> {
        if value.is_absent() && !self.tag.is_absent() {
            return Ok(WireValue::UserUndefined {
                value_type: self.args.value_type.clone(),
            });
        }

        self.rebuild(value)?.into_one(self.tag)
    }

    fn rebuild(&self, value: &FlatValue) -> Result<Rebuilt, ArchicadError> {
        let argument = self.tag.value_argument();

        let payload = match &self.value {
            Slot::Flat(_) => {
                if let FlatValue::List(items) = value {
                    if argument.is_some() && !self.tag.is_list() {
                        // Repeated leaf: the enclosing multi-valued node wraps the list.
                        let rebuilt = items
                            .iter()
                            .map(|item| {
                                self.rebuild(&FlatValue::Scalar(item.clone()))?
                                    .into_one(self.tag)
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        return Ok(Rebuilt::Many(rebuilt));
                    }
                }
                Payload::Flat(value.clone())
            }
            Slot::Nested(inner) if inner.tag == WireKind::EnumValueIdWrapper => {
                let items = match value {
                    FlatValue::List(items) => items.clone(),
                    other => other.clone().into_scalars(),
                };
                let rebuilt = items
                    .into_iter()
                    .map(|item| inner.rebuild(&FlatValue::Scalar(item))?.into_one(inner.tag))
                    .collect::<Result<Vec<_>, _>>()?;
                Payload::Wires(rebuilt)
            }
            Slot::Nested(inner) => match inner.rebuild(value)? {
                Rebuilt::One(wire) => Payload::Wire(wire),
                Rebuilt::Many(items) => Payload::Wires(items),
            },
        };

        let payload = argument.map(|_| payload);
        instantiate(self.tag, &self.args, payload).map(Rebuilt::One)
    }
}

fn instantiate(
    kind: WireKind,
    args: &WireArgs,
    payload: Option<Payload>,
) -> Result<WireValue, ArchicadError> {
    let value_type = || args.value_type.clone();

    let Some(payload) = payload else {
        return match kind {
            WireKind::NotAvailable => Ok(WireValue::NotAvailable {
                value_type: value_type(),
            }),
            WireKind::NotEvaluated => Ok(WireValue::NotEvaluated {
                value_type: value_type(),
            }),
            WireKind::UserUndefined => Ok(WireValue::UserUndefined {
                value_type: value_type(),
            }),
            other => Err(shape_error(other, "no payload supplied".to_string())),
        };
    };

    let wire = match (kind, payload) {
        (WireKind::NormalInteger, Payload::Flat(flat)) => {
            WireValue::NormalInteger(integer(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalNumber, Payload::Flat(flat)) => {
            WireValue::NormalNumber(number(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalLength, Payload::Flat(flat)) => {
            WireValue::NormalLength(number(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalArea, Payload::Flat(flat)) => {
            WireValue::NormalArea(number(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalVolume, Payload::Flat(flat)) => {
            WireValue::NormalVolume(number(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalAngle, Payload::Flat(flat)) => {
            WireValue::NormalAngle(number(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalBoolean, Payload::Flat(flat)) => {
            WireValue::NormalBoolean(boolean(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalString, Payload::Flat(flat)) => {
            WireValue::NormalString(string(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalIntegerList, Payload::Flat(flat)) => {
            WireValue::NormalIntegerList(each(kind, flat, integer)?)
        }
        (WireKind::NormalNumberList, Payload::Flat(flat)) => {
            WireValue::NormalNumberList(each(kind, flat, number)?)
        }
        (WireKind::NormalLengthList, Payload::Flat(flat)) => {
            WireValue::NormalLengthList(each(kind, flat, number)?)
        }
        (WireKind::NormalAreaList, Payload::Flat(flat)) => {
            WireValue::NormalAreaList(each(kind, flat, number)?)
        }
        (WireKind::NormalVolumeList, Payload::Flat(flat)) => {
            WireValue::NormalVolumeList(each(kind, flat, number)?)
        }
        (WireKind::NormalAngleList, Payload::Flat(flat)) => {
            WireValue::NormalAngleList(each(kind, flat, number)?)
        }
        (WireKind::NormalBooleanList, Payload::Flat(flat)) => {
            WireValue::NormalBooleanList(each(kind, flat, boolean)?)
        }
        (WireKind::NormalStringList, Payload::Flat(flat)) => {
            WireValue::NormalStringList(each(kind, flat, string)?)
        }
        (WireKind::DisplayValueEnumId, Payload::Flat(flat)) => {
            WireValue::DisplayValueEnumId(string(kind, single(kind, flat)?)?)
        }
        (WireKind::NonLocalizedValueEnumId, Payload::Flat(flat)) => {
            WireValue::NonLocalizedValueEnumId(string(kind, single(kind, flat)?)?)
        }
        (WireKind::NormalSingleEnum, Payload::Wire(inner)) => {
            WireValue::NormalSingleEnum(Box::new(inner))
        }
        (WireKind::EnumValueIdWrapper, Payload::Wire(inner)) => {
            WireValue::EnumValueIdWrapper(Box::new(inner))
        }
        (WireKind::NormalMultiEnum, Payload::Wires(items)) => WireValue::NormalMultiEnum(items),
        (WireKind::NormalMultiEnum, Payload::Wire(item)) => WireValue::NormalMultiEnum(vec![item]),
        (kind, Payload::Wires(items)) => {
            return Err(shape_error(
                kind,
                format!("a list of {} values cannot be written here", items.len()),
            ))
        }
        (kind, _) => {
            return Err(shape_error(
                kind,
                "payload does not match the value shape".to_string(),
            ))
        }
    };

    Ok(wire)
}

fn shape_error(kind: WireKind, reason: String) -> ArchicadError {
    ArchicadError::ValueShape {
        kind: kind.class_name(),
        reason,
    }
}

fn single(kind: WireKind, flat: FlatValue) -> Result<Scalar, ArchicadError> {
    match flat {
        FlatValue::Scalar(scalar) => Ok(scalar),
        FlatValue::Absent => Err(shape_error(kind, "value is absent".to_string())),
        FlatValue::List(items) => Err(shape_error(
            kind,
            format!("expected one value, got a list of {}", items.len()),
        )),
    }
}

/// A scalar written to a list kind becomes a one-element list.
fn each<T>(
    kind: WireKind,
    flat: FlatValue,
    convert: impl Fn(WireKind, Scalar) -> Result<T, ArchicadError>,
) -> Result<Vec<T>, ArchicadError> {
    flat.into_scalars()
        .into_iter()
        .map(|scalar| convert(kind, scalar))
        .collect()
}

fn integer(kind: WireKind, scalar: Scalar) -> Result<i64, ArchicadError> {
    match scalar {
        Scalar::Integer(value) => Ok(value),
        Scalar::Number(value)
            if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 =>
        {
            Ok(value as i64)
        }
        other => Err(shape_error(kind, format!("`{other}` is not an integer"))),
    }
}

fn number(kind: WireKind, scalar: Scalar) -> Result<f64, ArchicadError> {
    match scalar {
        Scalar::Number(value) => Ok(value),
        Scalar::Integer(value) => Ok(value as f64),
        other => Err(shape_error(kind, format!("`{other}` is not a number"))),
    }
}

fn boolean(kind: WireKind, scalar: Scalar) -> Result<bool, ArchicadError> {
    match scalar {
        Scalar::Boolean(value) => Ok(value),
        other => Err(shape_error(kind, format!("`{other}` is not a boolean"))),
    }
}

fn string(kind: WireKind, scalar: Scalar) -> Result<String, ArchicadError> {
    match scalar {
        Scalar::String(value) => Ok(value),
        other => Err(shape_error(kind, format!("`{other}` is not a string"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode, FlatValue, Scalar, Slot};
    use crate::error::ArchicadError;
    use crate::model::wire::{WireKind, WireValue};

    fn display(value: &str) -> WireValue {
        WireValue::EnumValueIdWrapper(Box::new(WireValue::DisplayValueEnumId(value.to_string())))
    }

    fn round_trip(wire: WireValue) {
        let decoded = decode(&wire);
        let template = decoded
            .template
            .expect("non-empty values should produce a template");
        assert_eq!(template.tag, wire.kind());
        let rebuilt = template
            .encode(&decoded.flat)
            .expect("decoded value should encode against its own template");
        assert_eq!(rebuilt, wire);
    }

    #[test]
    fn scalar_kinds_round_trip() {
        round_trip(WireValue::NormalString("Wall A".to_string()));
        round_trip(WireValue::NormalInteger(42));
        round_trip(WireValue::NormalLength(0.3));
        round_trip(WireValue::NormalBoolean(true));
        round_trip(WireValue::NormalAngle(1.5708));
    }

    #[test]
    fn every_normal_kind_round_trips() {
        let values = vec![
            WireValue::NormalInteger(-7),
            WireValue::NormalNumber(3.25),
            WireValue::NormalLength(0.3),
            WireValue::NormalArea(12.5),
            WireValue::NormalVolume(0.75),
            WireValue::NormalAngle(1.5708),
            WireValue::NormalBoolean(true),
            WireValue::NormalString("Wall A".to_string()),
            WireValue::NormalIntegerList(vec![1, 2, 3]),
            WireValue::NormalNumberList(vec![0.5, 1.5]),
            WireValue::NormalLengthList(vec![2.4, 3.0]),
            WireValue::NormalAreaList(vec![1.0, 2.5]),
            WireValue::NormalVolumeList(vec![0.1]),
            WireValue::NormalAngleList(vec![0.0, 3.1416]),
            WireValue::NormalBooleanList(vec![true, false]),
            WireValue::NormalStringList(vec!["a".to_string(), "b".to_string()]),
        ];

        let kinds: std::collections::BTreeSet<WireKind> =
            values.iter().map(WireValue::kind).collect();
        assert_eq!(kinds.len(), 16);
        assert!(kinds.iter().all(|kind| kind.type_name().is_some()));

        for value in values {
            round_trip(value);
        }
    }

    #[test]
    fn list_kinds_round_trip_as_one_value() {
        round_trip(WireValue::NormalStringList(vec![
            "a".to_string(),
            "b".to_string(),
        ]));
        round_trip(WireValue::NormalIntegerList(vec![1, 2, 3]));
        round_trip(WireValue::NormalAreaList(vec![1.0, 2.5]));
    }

    #[test]
    fn single_enum_round_trips() {
        round_trip(WireValue::NormalSingleEnum(Box::new(
            WireValue::NonLocalizedValueEnumId("AllRelevantFilters".to_string()),
        )));
        round_trip(WireValue::NormalSingleEnum(Box::new(
            WireValue::DisplayValueEnumId("Existing".to_string()),
        )));
    }

    #[test]
    fn multi_enum_round_trips() {
        round_trip(WireValue::NormalMultiEnum(vec![
            display("PAS 24:2012"),
            display("Building Regulations Part Q"),
        ]));
    }

    #[test]
    fn absence_kinds_round_trip() {
        round_trip(WireValue::NotAvailable {
            value_type: Some("string".to_string()),
        });
        round_trip(WireValue::NotEvaluated { value_type: None });
        round_trip(WireValue::UserUndefined {
            value_type: Some("length".to_string()),
        });
    }

    #[test]
    fn absence_kinds_decode_to_absent() {
        let decoded = decode(&WireValue::NotAvailable {
            value_type: Some("string".to_string()),
        });
        assert_eq!(decoded.flat, FlatValue::Absent);
        let template = decoded.template.expect("absence kinds keep a template");
        assert_eq!(template.args.status.as_deref(), Some("notAvailable"));
        assert_eq!(template.args.value_type.as_deref(), Some("string"));
    }

    #[test]
    fn args_capture_type_and_status() {
        let decoded = decode(&WireValue::NormalSingleEnum(Box::new(
            WireValue::NonLocalizedValueEnumId("AllRelevantFilters".to_string()),
        )));
        let template = decoded.template.expect("single enum has a template");
        assert_eq!(template.args.value_type.as_deref(), Some("singleEnum"));
        assert_eq!(template.args.status.as_deref(), Some("normal"));
        match &template.value {
            Slot::Nested(inner) => {
                assert_eq!(inner.tag, WireKind::NonLocalizedValueEnumId);
                assert_eq!(inner.args.value_type.as_deref(), Some("nonLocalizedValue"));
                assert_eq!(inner.args.status, None);
            }
            other => panic!("unexpected slot: {other:?}"),
        }
        assert_eq!(decoded.flat, FlatValue::from("AllRelevantFilters"));
    }

    #[test]
    fn multi_enum_flattens_to_one_template() {
        let wire = WireValue::NormalMultiEnum(vec![display("A"), display("B"), display("C")]);
        let decoded = decode(&wire);
        assert_eq!(decoded.flat, FlatValue::from(vec!["A", "B", "C"]));

        let template = decoded.template.expect("multi enum has a template");
        assert_eq!(template.flat(), &FlatValue::from(vec!["A", "B", "C"]));

        let five = FlatValue::from(vec!["1", "2", "3", "4", "5"]);
        let rebuilt = template.encode(&five).expect("five items should encode");
        match rebuilt {
            WireValue::NormalMultiEnum(items) => {
                assert_eq!(items.len(), 5);
                assert_eq!(items[4], display("5"));
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn multi_enum_overwrite_with_single_item() {
        let wire = WireValue::NormalMultiEnum(vec![display("Opt1"), display("Opt2")]);
        let template = decode(&wire).template.expect("multi enum has a template");

        let rebuilt = template
            .encode(&FlatValue::from(vec!["Opt3"]))
            .expect("one item should encode");
        assert_eq!(rebuilt, WireValue::NormalMultiEnum(vec![display("Opt3")]));

        let rebuilt = template
            .encode(&FlatValue::from("Opt3"))
            .expect("a scalar should be coerced to one item");
        assert_eq!(rebuilt, WireValue::NormalMultiEnum(vec![display("Opt3")]));
        assert_eq!(
            rebuilt.to_json(),
            json!({
                "type": "multiEnum",
                "status": "normal",
                "value": [{ "enumValueId": { "type": "displayValue", "displayValue": "Opt3" } }],
            })
        );
    }

    #[test]
    fn empty_multi_enum_has_no_template() {
        let decoded = decode(&WireValue::NormalMultiEnum(Vec::new()));
        assert_eq!(decoded.flat, FlatValue::List(Vec::new()));
        assert!(decoded.template.is_none());
    }

    #[test]
    fn list_for_single_valued_kind_is_rejected() {
        let template = decode(&WireValue::NormalString("x".to_string()))
            .template
            .expect("string has a template");
        let result = template.encode(&FlatValue::from(vec!["a", "b"]));
        assert!(matches!(result, Err(ArchicadError::ValueShape { .. })));

        let template = decode(&WireValue::NormalSingleEnum(Box::new(
            WireValue::DisplayValueEnumId("x".to_string()),
        )))
        .template
        .expect("single enum has a template");
        let result = template.encode(&FlatValue::from(vec!["a", "b"]));
        assert!(matches!(result, Err(ArchicadError::ValueShape { .. })));
    }

    #[test]
    fn mismatched_scalar_is_rejected() {
        let template = decode(&WireValue::NormalInteger(3))
            .template
            .expect("integer has a template");
        let result = template.encode(&FlatValue::from("three"));
        assert!(matches!(result, Err(ArchicadError::ValueShape { .. })));

        let rebuilt = template
            .encode(&FlatValue::from(4.0))
            .expect("integral numbers are accepted for integer kinds");
        assert_eq!(rebuilt, WireValue::NormalInteger(4));

        for out_of_range in [1e20, -1e20, 9.223_372_036_854_775_807e18, f64::INFINITY] {
            let result = template.encode(&FlatValue::from(out_of_range));
            assert!(
                matches!(result, Err(ArchicadError::ValueShape { .. })),
                "{out_of_range} should not fit an integer: {result:?}"
            );
        }
        let rebuilt = template
            .encode(&FlatValue::from(-9.223_372_036_854_775_808e18))
            .expect("i64::MIN is representable");
        assert_eq!(rebuilt, WireValue::NormalInteger(i64::MIN));
    }

    #[test]
    fn absent_value_encodes_as_user_undefined() {
        let template = decode(&WireValue::NormalLength(2.4))
            .template
            .expect("length has a template");
        let rebuilt = template
            .encode(&FlatValue::Absent)
            .expect("absent should encode");
        assert_eq!(
            rebuilt,
            WireValue::UserUndefined {
                value_type: Some("length".to_string())
            }
        );
    }

    #[test]
    fn user_undefined_promotes_only_scalar_kinds() {
        let template = decode(&WireValue::UserUndefined {
            value_type: Some("string".to_string()),
        })
        .template
        .expect("user undefined keeps a template");
        let promoted = template
            .promote_user_undefined()
            .expect("string type should promote");
        assert_eq!(promoted.tag, WireKind::NormalString);
        assert_eq!(
            promoted
                .encode(&FlatValue::from("Wall B"))
                .expect("promoted template should encode"),
            WireValue::NormalString("Wall B".to_string())
        );

        let enum_template = decode(&WireValue::UserUndefined {
            value_type: Some("singleEnum".to_string()),
        })
        .template
        .expect("user undefined keeps a template");
        assert!(enum_template.promote_user_undefined().is_none());
    }

    #[test]
    fn informative_follows_truthiness() {
        assert!(!FlatValue::Absent.is_informative());
        assert!(!FlatValue::from("").is_informative());
        assert!(!FlatValue::from(0_i64).is_informative());
        assert!(!FlatValue::from(false).is_informative());
        assert!(!FlatValue::List(Vec::new()).is_informative());
        assert!(FlatValue::from("Wall A").is_informative());
        assert!(FlatValue::List(vec![Scalar::Integer(0)]).is_informative());
    }

    #[test]
    fn flat_value_json_conversion() {
        let value = FlatValue::from_json(&json!(["Opt1", 2, 2.5, true]))
            .expect("list of scalars should convert");
        assert_eq!(
            value,
            FlatValue::List(vec![
                Scalar::String("Opt1".to_string()),
                Scalar::Integer(2),
                Scalar::Number(2.5),
                Scalar::Boolean(true),
            ])
        );
        assert_eq!(
            FlatValue::from_json(&json!(null)).expect("null should convert"),
            FlatValue::Absent
        );
        assert!(FlatValue::from_json(&json!({ "a": 1 })).is_err());
        assert!(FlatValue::from_json(&json!([[1]])).is_err());
    }
}
