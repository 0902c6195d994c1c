use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::runtime::Runtime;

use crate::client::{ArchicadClient, ClientBuilder};
use crate::error::ArchicadError;
use crate::model::column::PropertyColumn;
use crate::model::common::{
    ClassificationItem, ClassificationItemId, ClassificationSystem, ClassificationSystemId,
    ElementFilter, ElementId, ElementPropertyValue, ExecutionResult, ProductInfo, PropertyId,
    PropertyUserId, PropertyValueOrError, TransactionSummary,
};
use crate::table::PropertyTable;

/// Synchronous facade over [`ArchicadClient`]; every call blocks on a private
/// current-thread runtime.
#[derive(Clone, Debug)]
pub struct ArchicadClientBlocking {
    inner: ArchicadClient,
    runtime: Arc<Runtime>,
}

#[derive(Clone, Debug, Default)]
pub struct ArchicadClientBlockingBuilder {
    inner: ClientBuilder,
}

impl ArchicadClientBlockingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.inner = self.inner.host(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.inner = self.inner.port(port);
        self
    }

    pub fn connect(self) -> Result<ArchicadClientBlocking, ArchicadError> {
        let runtime = build_runtime()?;
        let inner = runtime.block_on(self.inner.connect())?;
        Ok(ArchicadClientBlocking {
            inner,
            runtime: Arc::new(runtime),
        })
    }
}

fn build_runtime() -> Result<Runtime, ArchicadError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| ArchicadError::RuntimeJoin(err.to_string()))
}

impl ArchicadClientBlocking {
    pub fn builder() -> ArchicadClientBlockingBuilder {
        ArchicadClientBlockingBuilder::new()
    }

    pub fn connect() -> Result<Self, ArchicadError> {
        ArchicadClientBlockingBuilder::new().connect()
    }

    pub fn inner(&self) -> &ArchicadClient {
        &self.inner
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    pub fn is_alive(&self) -> Result<bool, ArchicadError> {
        self.block_on(self.inner.is_alive())
    }

    pub fn get_product_info(&self) -> Result<ProductInfo, ArchicadError> {
        self.block_on(self.inner.get_product_info())
    }

    pub fn get_all_property_names(&self) -> Result<Vec<PropertyUserId>, ArchicadError> {
        self.block_on(self.inner.get_all_property_names())
    }

    pub fn get_all_property_columns(&self) -> Result<Vec<PropertyColumn>, ArchicadError> {
        self.block_on(self.inner.get_all_property_columns())
    }

    pub fn get_property_ids(
        &self,
        columns: &[PropertyColumn],
    ) -> Result<Vec<PropertyId>, ArchicadError> {
        self.block_on(self.inner.get_property_ids(columns))
    }

    pub fn get_property_values_of_elements(
        &self,
        element_ids: &[ElementId],
        property_ids: &[PropertyId],
    ) -> Result<Vec<Vec<PropertyValueOrError>>, ArchicadError> {
        self.block_on(
            self.inner
                .get_property_values_of_elements(element_ids, property_ids),
        )
    }

    pub fn set_property_values_of_elements(
        &self,
        values: &[ElementPropertyValue],
    ) -> Result<Vec<ExecutionResult>, ArchicadError> {
        self.block_on(self.inner.set_property_values_of_elements(values))
    }

    pub fn get_elements_by_type(&self, element_type: &str) -> Result<Vec<ElementId>, ArchicadError> {
        self.block_on(self.inner.get_elements_by_type(element_type))
    }

    pub fn get_elements_by_classification(
        &self,
        classification: &ClassificationItemId,
    ) -> Result<Vec<ElementId>, ArchicadError> {
        self.block_on(self.inner.get_elements_by_classification(classification))
    }

    pub fn elements(&self, filter: &ElementFilter) -> Result<Vec<ElementId>, ArchicadError> {
        self.block_on(self.inner.elements(filter))
    }

    pub fn get_all_classification_systems(
        &self,
    ) -> Result<Vec<ClassificationSystem>, ArchicadError> {
        self.block_on(self.inner.get_all_classification_systems())
    }

    pub fn get_all_classifications_in_system(
        &self,
        system: &ClassificationSystemId,
    ) -> Result<Vec<ClassificationItem>, ArchicadError> {
        self.block_on(self.inner.get_all_classifications_in_system(system))
    }

    pub fn find_classification_system(
        &self,
        name: &str,
        date: Option<NaiveDate>,
        case_sensitive: bool,
    ) -> Result<Option<ClassificationSystem>, ArchicadError> {
        self.block_on(
            self.inner
                .find_classification_system(name, date, case_sensitive),
        )
    }

    pub fn find_classification(
        &self,
        system: &ClassificationSystemId,
        item_id: &str,
    ) -> Result<Option<ClassificationItemId>, ArchicadError> {
        self.block_on(self.inner.find_classification(system, item_id))
    }

    pub fn find_properties_by_group(
        &self,
        group_path: &[&str],
        case_sensitive: bool,
    ) -> Result<Vec<PropertyColumn>, ArchicadError> {
        self.block_on(
            self.inner
                .find_properties_by_group(group_path, case_sensitive),
        )
    }

    pub fn get_element_property_table(
        &self,
        element_ids: &[ElementId],
        columns: Vec<PropertyColumn>,
    ) -> Result<PropertyTable, ArchicadError> {
        self.block_on(self.inner.get_element_property_table(element_ids, columns))
    }

    pub fn set_property_table(
        &self,
        table: &PropertyTable,
    ) -> Result<TransactionSummary, ArchicadError> {
        self.block_on(self.inner.set_property_table(table))
    }
}
