use std::str::FromStr;

use crate::error::ArchicadError;
use crate::model::common::PropertyUserId;

/// Reserved first group segment of built-in (non user-defined) properties.
pub const BUILTIN_GROUP_NAME: &str = "Built-in Properties";
pub const GROUP_PROPERTY_SEPARATOR: &str = ">>>";
pub const PROPERTY_BRANCH_DELIMITER: &str = "::";

/// Column identity of a property: `<group::path>>>><property::path>`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PropertyColumn {
    group_path: Vec<String>,
    property_path: Vec<String>,
}

impl PropertyColumn {
    pub fn new<G, P>(group_path: G, property_path: P) -> Result<Self, ArchicadError>
    where
        G: IntoIterator,
        G::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let group_path: Vec<String> = group_path.into_iter().map(Into::into).collect();
        let property_path: Vec<String> = property_path.into_iter().map(Into::into).collect();

        validate_path(&group_path, &property_path, "group")?;
        validate_path(&property_path, &group_path, "property")?;

        Ok(Self {
            group_path,
            property_path,
        })
    }

    pub fn group_path(&self) -> &[String] {
        &self.group_path
    }

    pub fn property_path(&self) -> &[String] {
        &self.property_path
    }

    pub fn is_built_in(&self) -> bool {
        self.group_path.first().map(String::as_str) == Some(BUILTIN_GROUP_NAME)
    }

    /// Maps a connector property id to its column.
    ///
    /// Built-in names split at the first `_`: `General_Width` becomes
    /// `Built-in Properties::General>>>Width`. User-defined localized names
    /// use every segment but the last as the group.
    pub fn from_user_id(user_id: &PropertyUserId) -> Result<Self, ArchicadError> {
        match user_id {
            PropertyUserId::BuiltIn { non_localized_name } => {
                let (group, property) = non_localized_name.split_once('_').ok_or_else(|| {
                    ArchicadError::InvalidColumnName {
                        name: non_localized_name.clone(),
                        reason: "built-in property name has no `_` group separator".to_string(),
                    }
                })?;
                Self::new([BUILTIN_GROUP_NAME, group], [property])
            }
            PropertyUserId::UserDefined { localized_name } => {
                let Some((property, group)) = localized_name.split_last() else {
                    return Err(ArchicadError::InvalidColumnName {
                        name: String::new(),
                        reason: "user-defined property has an empty localized name".to_string(),
                    });
                };
                Self::new(group.iter().cloned(), [property.clone()])
            }
        }
    }

    pub fn to_user_id(&self) -> PropertyUserId {
        if self.is_built_in() {
            let group = self.group_path[1..].join(PROPERTY_BRANCH_DELIMITER);
            let property = self.property_path.join(PROPERTY_BRANCH_DELIMITER);
            return PropertyUserId::BuiltIn {
                non_localized_name: format!("{group}_{property}"),
            };
        }

        PropertyUserId::UserDefined {
            localized_name: self
                .group_path
                .iter()
                .chain(self.property_path.iter())
                .cloned()
                .collect(),
        }
    }
}

fn validate_path(
    path: &[String],
    other: &[String],
    which: &str,
) -> Result<(), ArchicadError> {
    let name = || {
        format!(
            "{}{GROUP_PROPERTY_SEPARATOR}{}",
            path.join(PROPERTY_BRANCH_DELIMITER),
            other.join(PROPERTY_BRANCH_DELIMITER)
        )
    };

    if path.is_empty() {
        return Err(ArchicadError::InvalidColumnName {
            name: name(),
            reason: format!("{which} path is empty"),
        });
    }

    for segment in path {
        if segment.is_empty() {
            return Err(ArchicadError::InvalidColumnName {
                name: name(),
                reason: format!("{which} path has an empty segment"),
            });
        }
        if segment.contains(PROPERTY_BRANCH_DELIMITER) || segment.contains(GROUP_PROPERTY_SEPARATOR)
        {
            return Err(ArchicadError::InvalidColumnName {
                name: name(),
                reason: format!("{which} segment `{segment}` contains a reserved delimiter"),
            });
        }
    }

    Ok(())
}

impl std::fmt::Display for PropertyColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{GROUP_PROPERTY_SEPARATOR}{}",
            self.group_path.join(PROPERTY_BRANCH_DELIMITER),
            self.property_path.join(PROPERTY_BRANCH_DELIMITER)
        )
    }
}

impl FromStr for PropertyColumn {
    type Err = ArchicadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (group, property) = value.split_once(GROUP_PROPERTY_SEPARATOR).ok_or_else(|| {
            ArchicadError::InvalidColumnName {
                name: value.to_string(),
                reason: format!("missing `{GROUP_PROPERTY_SEPARATOR}` separator"),
            }
        })?;

        Self::new(
            group.split(PROPERTY_BRANCH_DELIMITER),
            property.split(PROPERTY_BRANCH_DELIMITER),
        )
        .map_err(|err| match err {
            ArchicadError::InvalidColumnName { reason, .. } => ArchicadError::InvalidColumnName {
                name: value.to_string(),
                reason,
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::PropertyColumn;
    use crate::error::ArchicadError;
    use crate::model::common::PropertyUserId;

    #[test]
    fn built_in_column_round_trips() {
        let column = PropertyColumn::new(["Built-in Properties", "Category"], ["Name"])
            .expect("built-in column should be valid");
        let name = column.to_string();
        assert_eq!(name, "Built-in Properties::Category>>>Name");

        let decoded = PropertyColumn::from_str(&name).expect("column name should decode");
        assert_eq!(decoded, column);
        assert!(decoded.is_built_in());
    }

    #[test]
    fn user_defined_column_round_trips() {
        let column = PropertyColumn::new(["GENERAL RATINGS"], ["Security", "Rating"])
            .expect("user-defined column should be valid");
        let decoded =
            PropertyColumn::from_str(&column.to_string()).expect("column name should decode");
        assert_eq!(decoded.group_path(), ["GENERAL RATINGS"]);
        assert_eq!(decoded.property_path(), ["Security", "Rating"]);
        assert!(!decoded.is_built_in());
    }

    #[test]
    fn delimiter_segments_are_rejected() {
        let result = PropertyColumn::new(["WORK::FLOW"], ["Status"]);
        assert!(matches!(
            result,
            Err(ArchicadError::InvalidColumnName { .. })
        ));

        let result = PropertyColumn::new(["WORKFLOW"], ["A>>>B"]);
        assert!(matches!(
            result,
            Err(ArchicadError::InvalidColumnName { .. })
        ));

        let result = PropertyColumn::new(Vec::<String>::new(), ["Status"]);
        assert!(matches!(
            result,
            Err(ArchicadError::InvalidColumnName { .. })
        ));
    }

    #[test]
    fn malformed_names_are_rejected() {
        assert!(PropertyColumn::from_str("WORKFLOW::Status").is_err());
        assert!(PropertyColumn::from_str("WORKFLOW>>>").is_err());
        assert!(PropertyColumn::from_str("A::::B>>>C").is_err());
        // The separator splits once; a second one lands in a property segment.
        assert!(PropertyColumn::from_str("A>>>B>>>C").is_err());
    }

    #[test]
    fn built_in_user_id_maps_to_column_and_back() {
        let user_id = PropertyUserId::BuiltIn {
            non_localized_name: "Category_ShowOnRenovationFilter".to_string(),
        };
        let column = PropertyColumn::from_user_id(&user_id).expect("built-in id should map");
        assert_eq!(
            column.to_string(),
            "Built-in Properties::Category>>>ShowOnRenovationFilter"
        );
        assert_eq!(column.to_user_id(), user_id);
    }

    #[test]
    fn built_in_name_keeps_underscores_after_first() {
        let user_id = PropertyUserId::BuiltIn {
            non_localized_name: "IdAndCategories_Element_ID".to_string(),
        };
        let column = PropertyColumn::from_user_id(&user_id).expect("built-in id should map");
        assert_eq!(column.property_path(), ["Element_ID"]);
        assert_eq!(column.to_user_id(), user_id);
    }

    #[test]
    fn user_defined_user_id_maps_to_column_and_back() {
        let user_id = PropertyUserId::UserDefined {
            localized_name: vec!["WORKFLOW".to_string(), "Status".to_string()],
        };
        let column = PropertyColumn::from_user_id(&user_id).expect("user id should map");
        assert_eq!(column.to_string(), "WORKFLOW>>>Status");
        assert_eq!(column.to_user_id(), user_id);
    }

    #[test]
    fn built_in_name_without_separator_is_rejected() {
        let user_id = PropertyUserId::BuiltIn {
            non_localized_name: "Width".to_string(),
        };
        assert!(PropertyColumn::from_user_id(&user_id).is_err());
    }
}
