//! Element property table.
//!
//! Rows are elements, columns are properties. Cells hold [`FlatValue`]s for
//! editing; next to them every column keeps the [`PropertyValue`] template
//! captured at read time, which is what makes the table writable again.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::error::ArchicadError;
use crate::model::column::PropertyColumn;
use crate::model::common::{
    ElementId, ElementPropertyValue, ExecutionResult, PropertyId, PropertyValueOrError,
    TransactionSummary, SUCCESS_CODE, SUCCESS_MESSAGE,
};
use crate::model::wire::{WireKind, WireValue};
use crate::value::{decode, Decoded, FlatValue, PropertyValue};

#[derive(Clone, Debug, PartialEq)]
pub struct ElementRow {
    pub element_id: ElementId,
    pub cells: Vec<FlatValue>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyTable {
    columns: Vec<PropertyColumn>,
    rows: Vec<ElementRow>,
    row_index: HashMap<ElementId, usize>,
    templates: BTreeMap<PropertyColumn, PropertyValue>,
}

/// Read access to one row while computing edits.
#[derive(Clone, Copy, Debug)]
pub struct RowView<'a> {
    columns: &'a [PropertyColumn],
    row: &'a ElementRow,
}

impl<'a> RowView<'a> {
    pub fn element_id(&self) -> &'a ElementId {
        &self.row.element_id
    }

    pub fn get(&self, column: &str) -> Result<&'a FlatValue, ArchicadError> {
        let index = column_index(self.columns, column)?;
        Ok(&self.row.cells[index])
    }
}

impl PropertyTable {
    /// Builds the table from a `GetPropertyValuesOfElements` response.
    ///
    /// `matrix` has one entry per element, each with one value per column, in
    /// request order.
    pub fn assemble(
        element_ids: &[ElementId],
        columns: Vec<PropertyColumn>,
        matrix: Vec<Vec<PropertyValueOrError>>,
    ) -> Result<Self, ArchicadError> {
        if matrix.len() != element_ids.len() {
            return Err(ArchicadError::ShapeMismatch {
                what: "property values per element",
                expected: element_ids.len(),
                actual: matrix.len(),
            });
        }

        let mut table = Self {
            columns,
            ..Self::default()
        };

        for (element_id, values) in element_ids.iter().zip(matrix) {
            if values.len() != table.columns.len() {
                return Err(ArchicadError::ShapeMismatch {
                    what: "property values of one element",
                    expected: table.columns.len(),
                    actual: values.len(),
                });
            }

            let mut cells = Vec::with_capacity(values.len());
            for (column, item) in table.columns.iter().zip(values) {
                let wire = match item {
                    PropertyValueOrError::Value(wire) => wire,
                    PropertyValueOrError::Error { code, message } => {
                        return Err(ArchicadError::PropertyRead {
                            element: element_id.guid.clone(),
                            column: column.to_string(),
                            code,
                            message,
                        });
                    }
                };

                let Decoded { flat, template } = decode(&wire);
                if let Some(template) = template {
                    record_template(&mut table.templates, column, template);
                }
                cells.push(flat);
            }

            table.push_row(ElementRow {
                element_id: element_id.clone(),
                cells,
            })?;
        }

        Ok(table)
    }

    fn push_row(&mut self, row: ElementRow) -> Result<(), ArchicadError> {
        if self.row_index.contains_key(&row.element_id) {
            return Err(ArchicadError::DuplicateElement {
                element: row.element_id.guid,
            });
        }

        self.row_index
            .insert(row.element_id.clone(), self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[PropertyColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[ElementRow] {
        &self.rows
    }

    pub fn element_ids(&self) -> impl Iterator<Item = &ElementId> {
        self.rows.iter().map(|row| &row.element_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn templates(&self) -> &BTreeMap<PropertyColumn, PropertyValue> {
        &self.templates
    }

    pub fn template(&self, column: &str) -> Result<Option<&PropertyValue>, ArchicadError> {
        let index = column_index(&self.columns, column)?;
        Ok(self.templates.get(&self.columns[index]))
    }

    pub fn row(&self, element_id: &ElementId) -> Result<RowView<'_>, ArchicadError> {
        let row = self.row_position(element_id)?;
        Ok(RowView {
            columns: &self.columns,
            row: &self.rows[row],
        })
    }

    pub fn get(&self, element_id: &ElementId, column: &str) -> Result<&FlatValue, ArchicadError> {
        let column = column_index(&self.columns, column)?;
        let row = self.row_position(element_id)?;
        Ok(&self.rows[row].cells[column])
    }

    pub fn set(
        &mut self,
        element_id: &ElementId,
        column: &str,
        value: impl Into<FlatValue>,
    ) -> Result<(), ArchicadError> {
        let column = column_index(&self.columns, column)?;
        let row = self.row_position(element_id)?;
        self.rows[row].cells[column] = value.into();
        Ok(())
    }

    /// Writes the same value into every row of `column`.
    pub fn fill_column(
        &mut self,
        column: &str,
        value: impl Into<FlatValue>,
    ) -> Result<(), ArchicadError> {
        let column = column_index(&self.columns, column)?;
        let value = value.into();
        for row in &mut self.rows {
            row.cells[column] = value.clone();
        }
        Ok(())
    }

    /// Recomputes `column` row by row from a view of the unmodified row.
    pub fn update_column<F>(&mut self, column: &str, mut compute: F) -> Result<(), ArchicadError>
    where
        F: FnMut(RowView<'_>) -> Result<FlatValue, ArchicadError>,
    {
        let index = column_index(&self.columns, column)?;
        let values = self
            .rows
            .iter()
            .map(|row| {
                compute(RowView {
                    columns: &self.columns,
                    row,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (row, value) in self.rows.iter_mut().zip(values) {
            row.cells[index] = value;
        }
        Ok(())
    }

    /// Projection onto `columns`, in the given order. Templates travel with
    /// their columns.
    pub fn select_columns(&self, columns: &[&str]) -> Result<Self, ArchicadError> {
        let indices = columns
            .iter()
            .map(|column| column_index(&self.columns, column))
            .collect::<Result<Vec<_>, _>>()?;

        let selected: Vec<PropertyColumn> = indices
            .iter()
            .map(|index| self.columns[*index].clone())
            .collect();
        let templates = selected
            .iter()
            .filter_map(|column| {
                self.templates
                    .get(column)
                    .map(|template| (column.clone(), template.clone()))
            })
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| ElementRow {
                element_id: row.element_id.clone(),
                cells: indices.iter().map(|index| row.cells[*index].clone()).collect(),
            })
            .collect();

        Ok(Self {
            columns: selected,
            rows,
            row_index: self.row_index.clone(),
            templates,
        })
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(RowView<'_>) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|row| keep(RowView { columns, row }));
        self.row_index = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| (row.element_id.clone(), index))
            .collect();
    }

    /// Rebuilds one wire value per cell for `SetPropertyValuesOfElements`.
    ///
    /// `property_ids` must be parallel to [`PropertyTable::columns`]. Cells of
    /// columns whose template is `NotAvailable` or `NotEvaluated` are left out.
    pub fn element_property_values(
        &self,
        property_ids: &[PropertyId],
    ) -> Result<Vec<ElementPropertyValue>, ArchicadError> {
        if property_ids.len() != self.columns.len() {
            return Err(ArchicadError::ShapeMismatch {
                what: "property ids per column",
                expected: self.columns.len(),
                actual: property_ids.len(),
            });
        }

        let templates = self
            .columns
            .iter()
            .map(|column| {
                self.templates
                    .get(column)
                    .ok_or_else(|| ArchicadError::MissingTemplate {
                        column: column.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut values = Vec::new();
        for row in &self.rows {
            for (index, cell) in row.cells.iter().enumerate() {
                let column = &self.columns[index];
                let Some(property_value) = encode_cell(column, templates[index], cell)? else {
                    continue;
                };

                values.push(ElementPropertyValue {
                    element_id: row.element_id.clone(),
                    property_id: property_ids[index].clone(),
                    property_value,
                });
            }
        }

        Ok(values)
    }

    fn row_position(&self, element_id: &ElementId) -> Result<usize, ArchicadError> {
        self.row_index
            .get(element_id)
            .copied()
            .ok_or_else(|| ArchicadError::UnknownElement {
                element: element_id.guid.clone(),
            })
    }
}

fn column_index(columns: &[PropertyColumn], column: &str) -> Result<usize, ArchicadError> {
    let wanted = PropertyColumn::from_str(column)?;
    columns
        .iter()
        .position(|candidate| *candidate == wanted)
        .ok_or_else(|| ArchicadError::UnknownColumn {
            column: column.to_string(),
        })
}

/// How much a template tells about its column: informative values beat
/// uninformative ones of a present kind, which beat the absence kinds.
fn template_rank(template: &PropertyValue) -> u8 {
    if template.flat().is_informative() {
        2
    } else if !template.tag.is_absent() {
        1
    } else {
        0
    }
}

fn record_template(
    templates: &mut BTreeMap<PropertyColumn, PropertyValue>,
    column: &PropertyColumn,
    template: PropertyValue,
) {
    match templates.entry(column.clone()) {
        Entry::Vacant(entry) => {
            entry.insert(template);
        }
        Entry::Occupied(mut entry) => {
            if template_rank(&template) > template_rank(entry.get()) {
                tracing::debug!(
                    column = %column,
                    previous = %entry.get().tag,
                    replacement = %template.tag,
                    "replacing uninformative column template"
                );
                entry.insert(template);
            }
        }
    }
}

fn encode_cell(
    column: &PropertyColumn,
    template: &PropertyValue,
    cell: &FlatValue,
) -> Result<Option<WireValue>, ArchicadError> {
    if template.tag.is_omitted_on_write() {
        if !cell.is_absent() {
            tracing::warn!(
                column = %column,
                template = %template.tag,
                "dropping edit of a column that cannot be written"
            );
        }
        return Ok(None);
    }

    if template.tag == WireKind::UserUndefined && !cell.is_absent() {
        let promoted =
            template
                .promote_user_undefined()
                .ok_or_else(|| ArchicadError::MissingTemplate {
                    column: column.to_string(),
                })?;
        return promoted.encode(cell).map(Some);
    }

    template.encode(cell).map(Some)
}

/// Tallies execution results into `(code, message)` buckets.
pub fn summarize_execution_results(results: &[ExecutionResult]) -> TransactionSummary {
    let mut summary = TransactionSummary::default();

    for result in results {
        let key = match result {
            ExecutionResult::Success => (SUCCESS_CODE, SUCCESS_MESSAGE.to_string()),
            ExecutionResult::Failure { code, message } => (*code, message.clone()),
        };
        *summary.outcomes.entry(key).or_insert(0) += 1;
    }

    summary
}
