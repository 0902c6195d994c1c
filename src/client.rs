use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::envelope::{self, ApiResponse};
use crate::error::ArchicadError;
use crate::model::column::PropertyColumn;
use crate::model::common::{
    join_elements, ClassificationItem, ClassificationItemId, ClassificationItemInTree,
    ClassificationSystem, ClassificationSystemId, ElementFilter, ElementId, ElementPropertyValue,
    ExecutionResult, JoinMode, ProductInfo, PropertyId, PropertyUserId, PropertyValueOrError,
    TransactionSummary,
};
use crate::model::wire::WireValue;
use crate::table::{summarize_execution_results, PropertyTable};
use crate::transport::{endpoint_url, Transport};

const ARCHICAD_API_HOST_ENV: &str = "ARCHICAD_API_HOST";
const ARCHICAD_API_PORT_ENV: &str = "ARCHICAD_API_PORT";

const DEFAULT_HOST: &str = "127.0.0.1";
const PORT_RANGE_START: u16 = 19723;
const PORT_RANGE_END: u16 = 19744;

const CMD_IS_ALIVE: &str = "IsAlive";
const CMD_GET_PRODUCT_INFO: &str = "GetProductInfo";
const CMD_GET_ALL_PROPERTY_NAMES: &str = "GetAllPropertyNames";
const CMD_GET_PROPERTY_IDS: &str = "GetPropertyIds";
const CMD_GET_PROPERTY_VALUES_OF_ELEMENTS: &str = "GetPropertyValuesOfElements";
const CMD_SET_PROPERTY_VALUES_OF_ELEMENTS: &str = "SetPropertyValuesOfElements";
const CMD_GET_ELEMENTS_BY_TYPE: &str = "GetElementsByType";
const CMD_GET_ELEMENTS_BY_CLASSIFICATION: &str = "GetElementsByClassification";
const CMD_GET_ALL_CLASSIFICATION_SYSTEMS: &str = "GetAllClassificationSystems";
const CMD_GET_ALL_CLASSIFICATIONS_IN_SYSTEM: &str = "GetAllClassificationsInSystem";

#[derive(Clone, Debug)]
pub struct ArchicadClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    transport: Transport,
    timeout: Duration,
    endpoint: String,
}

#[derive(Clone, Debug)]
struct ClientConfig {
    timeout: Duration,
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Clone, Debug)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig {
                timeout: Duration::from_millis(3_000),
                host: None,
                port: None,
            },
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Pins the port; otherwise `ARCHICAD_API_PORT` or a probe of the
    /// connector port range decides.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    pub async fn connect(self) -> Result<ArchicadClient, ArchicadError> {
        let host = resolve_host(
            self.config.host.as_deref(),
            std::env::var(ARCHICAD_API_HOST_ENV).ok().as_deref(),
        );
        let ports = candidate_ports(
            self.config.port,
            std::env::var(ARCHICAD_API_PORT_ENV).ok().as_deref(),
        )?;
        let timeout = self.config.timeout;

        let mut tried = Vec::with_capacity(ports.len());
        for port in ports {
            let endpoint = endpoint_url(&host, port);
            let client = ArchicadClient {
                inner: Arc::new(ClientInner {
                    transport: Transport::connect(&endpoint, timeout)?,
                    timeout,
                    endpoint: endpoint.clone(),
                }),
            };

            match client.is_alive().await {
                Ok(true) => {
                    tracing::debug!(endpoint = %endpoint, "found live ArchiCAD JSON API");
                    return Ok(client);
                }
                Ok(false) => tracing::debug!(endpoint = %endpoint, "connector reports not alive"),
                Err(err) => tracing::debug!(endpoint = %endpoint, error = %err, "port probe failed"),
            }
            tried.push(endpoint);
        }

        Err(ArchicadError::ConnectorUnavailable { candidates: tried })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchicadClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub async fn connect() -> Result<Self, ArchicadError> {
        ClientBuilder::new().connect().await
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub async fn is_alive(&self) -> Result<bool, ArchicadError> {
        let (command, response) = self.send_command(CMD_IS_ALIVE, None).await?;
        envelope::result_field(&command, &response, "isAlive")
    }

    pub async fn get_product_info(&self) -> Result<ProductInfo, ArchicadError> {
        let (command, response) = self.send_command(CMD_GET_PRODUCT_INFO, None).await?;
        let result = response
            .result
            .ok_or_else(|| ArchicadError::MissingPayload {
                command: command.clone(),
                field: "result".to_string(),
            })?;
        ProductInfo::deserialize(result)
            .map_err(|err| ArchicadError::JsonDecode(format!("{command}: {err}")))
    }

    pub async fn get_all_property_names(&self) -> Result<Vec<PropertyUserId>, ArchicadError> {
        let (command, response) = self.send_command(CMD_GET_ALL_PROPERTY_NAMES, None).await?;
        envelope::result_field(&command, &response, "properties")
    }

    /// All property columns known to the project.
    pub async fn get_all_property_columns(&self) -> Result<Vec<PropertyColumn>, ArchicadError> {
        self.get_all_property_names()
            .await?
            .iter()
            .map(PropertyColumn::from_user_id)
            .collect()
    }

    /// Resolves columns to connector property ids, in order.
    pub async fn get_property_ids(
        &self,
        columns: &[PropertyColumn],
    ) -> Result<Vec<PropertyId>, ArchicadError> {
        let user_ids: Vec<PropertyUserId> = columns.iter().map(PropertyColumn::to_user_id).collect();
        let parameters = json!({ "properties": user_ids });
        let (command, response) = self
            .send_command(CMD_GET_PROPERTY_IDS, Some(parameters))
            .await?;
        let items = envelope::result_value(&command, &response, "properties")?;
        parse_property_ids(columns, items)
    }

    pub async fn get_property_values_of_elements(
        &self,
        element_ids: &[ElementId],
        property_ids: &[PropertyId],
    ) -> Result<Vec<Vec<PropertyValueOrError>>, ArchicadError> {
        let parameters = json!({
            "elements": element_ids
                .iter()
                .map(|element| json!({ "elementId": element }))
                .collect::<Vec<_>>(),
            "properties": property_ids
                .iter()
                .map(|property| json!({ "propertyId": property }))
                .collect::<Vec<_>>(),
        });
        let (command, response) = self
            .send_command(CMD_GET_PROPERTY_VALUES_OF_ELEMENTS, Some(parameters))
            .await?;
        let items = envelope::result_value(&command, &response, "propertyValuesForElements")?;
        parse_property_values_matrix(items)
    }

    /// Submits values in one batch; per-item failures come back as results.
    pub async fn set_property_values_of_elements(
        &self,
        values: &[ElementPropertyValue],
    ) -> Result<Vec<ExecutionResult>, ArchicadError> {
        let parameters = json!({
            "elementPropertyValues": values
                .iter()
                .map(ElementPropertyValue::to_json)
                .collect::<Vec<_>>(),
        });
        let (command, response) = self
            .send_command(CMD_SET_PROPERTY_VALUES_OF_ELEMENTS, Some(parameters))
            .await?;
        let items = envelope::result_value(&command, &response, "executionResults")?;
        parse_execution_results(items)
    }

    pub async fn get_elements_by_type(
        &self,
        element_type: &str,
    ) -> Result<Vec<ElementId>, ArchicadError> {
        let parameters = json!({ "elementType": element_type });
        let (command, response) = self
            .send_command(CMD_GET_ELEMENTS_BY_TYPE, Some(parameters))
            .await?;
        parse_element_ids(&command, &response)
    }

    pub async fn get_elements_by_classification(
        &self,
        classification: &ClassificationItemId,
    ) -> Result<Vec<ElementId>, ArchicadError> {
        let parameters = json!({ "classificationItemId": classification });
        let (command, response) = self
            .send_command(CMD_GET_ELEMENTS_BY_CLASSIFICATION, Some(parameters))
            .await?;
        parse_element_ids(&command, &response)
    }

    pub async fn elements(&self, filter: &ElementFilter) -> Result<Vec<ElementId>, ArchicadError> {
        let mut lists = Vec::with_capacity(2);
        if let Some(classification) = filter.classification.as_ref() {
            lists.push(self.get_elements_by_classification(classification).await?);
        }
        if let Some(element_type) = filter.element_type.as_deref() {
            lists.push(self.get_elements_by_type(element_type).await?);
        }

        Ok(join_elements(JoinMode::Intersect, &lists))
    }

    pub async fn get_all_classification_systems(
        &self,
    ) -> Result<Vec<ClassificationSystem>, ArchicadError> {
        let (command, response) = self
            .send_command(CMD_GET_ALL_CLASSIFICATION_SYSTEMS, None)
            .await?;
        envelope::result_field(&command, &response, "classificationSystems")
    }

    pub async fn get_all_classifications_in_system(
        &self,
        system: &ClassificationSystemId,
    ) -> Result<Vec<ClassificationItem>, ArchicadError> {
        let parameters = json!({ "classificationSystemId": system });
        let (command, response) = self
            .send_command(CMD_GET_ALL_CLASSIFICATIONS_IN_SYSTEM, Some(parameters))
            .await?;
        let trees: Vec<ClassificationItemInTree> =
            envelope::result_field(&command, &response, "classificationItems")?;
        Ok(trees.into_iter().map(|tree| tree.classification_item).collect())
    }

    /// Looks a system up by name. Without `date` the newest release wins.
    pub async fn find_classification_system(
        &self,
        name: &str,
        date: Option<NaiveDate>,
        case_sensitive: bool,
    ) -> Result<Option<ClassificationSystem>, ArchicadError> {
        let systems = self.get_all_classification_systems().await?;
        select_classification_system(systems, name, date, case_sensitive)
    }

    pub async fn find_classification(
        &self,
        system: &ClassificationSystemId,
        item_id: &str,
    ) -> Result<Option<ClassificationItemId>, ArchicadError> {
        let roots = self.get_all_classifications_in_system(system).await?;
        Ok(roots
            .iter()
            .find_map(|root| root.find(item_id))
            .map(|item| item.classification_item_id.clone()))
    }

    /// Columns whose group path starts with `group_path`, segment by segment.
    pub async fn find_properties_by_group(
        &self,
        group_path: &[&str],
        case_sensitive: bool,
    ) -> Result<Vec<PropertyColumn>, ArchicadError> {
        Ok(self
            .get_all_property_columns()
            .await?
            .into_iter()
            .filter(|column| group_matches(column.group_path(), group_path, case_sensitive))
            .collect())
    }

    pub async fn get_element_property_table(
        &self,
        element_ids: &[ElementId],
        columns: Vec<PropertyColumn>,
    ) -> Result<PropertyTable, ArchicadError> {
        self.ensure_alive().await?;
        let property_ids = self.get_property_ids(&columns).await?;
        let matrix = self
            .get_property_values_of_elements(element_ids, &property_ids)
            .await?;
        PropertyTable::assemble(element_ids, columns, matrix)
    }

    pub async fn set_property_table(
        &self,
        table: &PropertyTable,
    ) -> Result<TransactionSummary, ArchicadError> {
        self.ensure_alive().await?;
        let property_ids = self.get_property_ids(table.columns()).await?;
        let values = table.element_property_values(&property_ids)?;
        if values.is_empty() {
            return Ok(TransactionSummary::default());
        }

        let results = self.set_property_values_of_elements(&values).await?;
        if results.len() != values.len() {
            return Err(ArchicadError::ShapeMismatch {
                what: "execution results per submitted value",
                expected: values.len(),
                actual: results.len(),
            });
        }

        for (value, result) in values.iter().zip(&results) {
            if let ExecutionResult::Failure { code, message } = result {
                tracing::warn!(
                    element = %value.element_id,
                    property = %value.property_id.guid,
                    code,
                    message = %message,
                    "property value was not written"
                );
            }
        }

        Ok(summarize_execution_results(&results))
    }

    /// Table reads and writes refuse to start unless the connector still
    /// answers `API.IsAlive`.
    async fn ensure_alive(&self) -> Result<(), ArchicadError> {
        let reason = match self.is_alive().await {
            Ok(true) => return Ok(()),
            Ok(false) => "connector reports not alive".to_string(),
            Err(err) => err.to_string(),
        };

        tracing::warn!(endpoint = %self.inner.endpoint, reason = %reason, "connector went away");
        Err(ArchicadError::ConnectorUnavailable {
            candidates: vec![self.inner.endpoint.clone()],
        })
    }

    /// Sends `name` (without the `API.` prefix) and returns the qualified
    /// command name with its successful response.
    async fn send_command(
        &self,
        name: &str,
        parameters: Option<Value>,
    ) -> Result<(String, ApiResponse), ArchicadError> {
        let command = envelope::qualified_command(name);
        tracing::debug!(command = %command, endpoint = %self.inner.endpoint, "sending command");

        let request_bytes = envelope::encode_request(&command, parameters.as_ref())?;
        let response_bytes = self.inner.transport.roundtrip(request_bytes).await?;
        let response = envelope::decode_response(&response_bytes)?;

        if let Some(err) = envelope::status_error(&command, &response) {
            return Err(err);
        }

        Ok((command, response))
    }
}

fn resolve_host(explicit: Option<&str>, from_env: Option<&str>) -> String {
    explicit
        .or(from_env.filter(|host| !host.is_empty()))
        .unwrap_or(DEFAULT_HOST)
        .to_string()
}

fn candidate_ports(explicit: Option<u16>, from_env: Option<&str>) -> Result<Vec<u16>, ArchicadError> {
    if let Some(port) = explicit {
        return Ok(vec![port]);
    }

    match from_env.map(str::trim).filter(|port| !port.is_empty()) {
        Some(raw) => raw
            .parse::<u16>()
            .map(|port| vec![port])
            .map_err(|err| ArchicadError::Config {
                reason: format!("{ARCHICAD_API_PORT_ENV}=`{raw}` is not a port: {err}"),
            }),
        None => Ok((PORT_RANGE_START..=PORT_RANGE_END).collect()),
    }
}

#[derive(Deserialize)]
struct ApiErrorItem {
    code: i64,
    message: String,
}

fn item_error(item: &Value) -> Option<ApiErrorItem> {
    item.get("error")
        .and_then(|error| ApiErrorItem::deserialize(error).ok())
}

fn parse_property_ids(
    columns: &[PropertyColumn],
    items: &Value,
) -> Result<Vec<PropertyId>, ArchicadError> {
    let items = json_array(items, "properties")?;
    if items.len() != columns.len() {
        return Err(ArchicadError::ShapeMismatch {
            what: "property ids per requested column",
            expected: columns.len(),
            actual: items.len(),
        });
    }

    columns
        .iter()
        .zip(items)
        .map(|(column, item)| {
            if let Some(error) = item_error(item) {
                return Err(ArchicadError::PropertyIdLookup {
                    column: column.to_string(),
                    code: error.code,
                    message: error.message,
                });
            }

            let id = item
                .get("propertyId")
                .ok_or_else(|| ArchicadError::JsonDecode(format!(
                    "property id item for `{column}` has neither `propertyId` nor `error`"
                )))?;
            PropertyId::deserialize(id).map_err(|err| ArchicadError::JsonDecode(err.to_string()))
        })
        .collect()
}

fn parse_property_values_matrix(
    items: &Value,
) -> Result<Vec<Vec<PropertyValueOrError>>, ArchicadError> {
    json_array(items, "propertyValuesForElements")?
        .iter()
        .map(|element| {
            let values = element
                .get("propertyValues")
                .ok_or_else(|| ArchicadError::JsonDecode(
                    "element entry without `propertyValues`".to_string(),
                ))?;

            json_array(values, "propertyValues")?
                .iter()
                .map(|item| {
                    if let Some(error) = item_error(item) {
                        return Ok(PropertyValueOrError::Error {
                            code: error.code,
                            message: error.message,
                        });
                    }

                    let value = item.get("propertyValue").ok_or_else(|| {
                        ArchicadError::JsonDecode(
                            "property value item has neither `propertyValue` nor `error`"
                                .to_string(),
                        )
                    })?;
                    WireValue::from_json_property(value).map(PropertyValueOrError::Value)
                })
                .collect()
        })
        .collect()
}

fn parse_execution_results(items: &Value) -> Result<Vec<ExecutionResult>, ArchicadError> {
    json_array(items, "executionResults")?
        .iter()
        .map(|item| {
            let success = item
                .get("success")
                .and_then(Value::as_bool)
                .ok_or_else(|| {
                    ArchicadError::JsonDecode("execution result without `success`".to_string())
                })?;
            if success {
                return Ok(ExecutionResult::Success);
            }

            let error = item_error(item).unwrap_or(ApiErrorItem {
                code: -1,
                message: "unknown failure".to_string(),
            });
            Ok(ExecutionResult::Failure {
                code: error.code,
                message: error.message,
            })
        })
        .collect()
}

fn parse_element_ids(command: &str, response: &ApiResponse) -> Result<Vec<ElementId>, ArchicadError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ElementIdArrayItem {
        element_id: ElementId,
    }

    let items: Vec<ElementIdArrayItem> = envelope::result_field(command, response, "elements")?;
    Ok(items.into_iter().map(|item| item.element_id).collect())
}

fn json_array<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>, ArchicadError> {
    value
        .as_array()
        .ok_or_else(|| ArchicadError::JsonDecode(format!("`{field}` is not an array")))
}

fn text_eq(left: &str, right: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        left == right
    } else {
        left.to_lowercase() == right.to_lowercase()
    }
}

fn group_matches(group: &[String], prefix: &[&str], case_sensitive: bool) -> bool {
    prefix.len() <= group.len()
        && group
            .iter()
            .zip(prefix)
            .all(|(segment, wanted)| text_eq(segment, wanted, case_sensitive))
}

fn select_classification_system(
    systems: Vec<ClassificationSystem>,
    name: &str,
    date: Option<NaiveDate>,
    case_sensitive: bool,
) -> Result<Option<ClassificationSystem>, ArchicadError> {
    let mut newest: Option<(NaiveDate, ClassificationSystem)> = None;

    for system in systems {
        if !text_eq(&system.name, name, case_sensitive) {
            continue;
        }

        let released = system.release_date()?;
        match date {
            Some(wanted) if wanted == released => return Ok(Some(system)),
            Some(_) => {}
            None => {
                if newest.as_ref().map_or(true, |(best, _)| released > *best) {
                    newest = Some((released, system));
                }
            }
        }
    }

    Ok(newest.map(|(_, system)| system))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use chrono::NaiveDate;
    use serde_json::json;

    use super::{
        candidate_ports, ArchicadClient, group_matches, parse_execution_results, parse_property_ids,
        parse_property_values_matrix, resolve_host, select_classification_system,
    };
    use crate::error::ArchicadError;
    use crate::model::column::PropertyColumn;
    use crate::model::common::{
        ClassificationSystem, ClassificationSystemId, ExecutionResult, PropertyId,
        PropertyValueOrError,
    };
    use crate::model::wire::WireValue;
    use crate::table::PropertyTable;

    /// Serves exactly one `API.IsAlive` exchange on a loopback port, then
    /// closes the listener.
    fn serve_one_is_alive() -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("loopback bind should succeed");
        let port = listener
            .local_addr()
            .expect("bound listener has an address")
            .port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("client should connect");
            let mut request = Vec::new();
            let mut buffer = [0_u8; 1024];
            loop {
                let read = stream.read(&mut buffer).expect("request should be readable");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let body_len = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + body_len {
                        break;
                    }
                }
            }

            let body = r#"{"succeeded":true,"result":{"isAlive":true}}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .expect("response should be writable");
        });

        (port, server)
    }

    #[test]
    fn table_operations_report_vanished_connector() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("test runtime should build");
        let (port, server) = serve_one_is_alive();

        let client = runtime
            .block_on(
                ArchicadClient::builder()
                    .host("127.0.0.1")
                    .port(port)
                    .timeout(Duration::from_millis(1_000))
                    .connect(),
            )
            .expect("first IsAlive should succeed");
        server.join().expect("stub server should finish");

        let read = runtime.block_on(client.get_element_property_table(
            &[crate::model::common::ElementId::new("E1")],
            vec![column("A>>>B")],
        ));
        match read {
            Err(ArchicadError::ConnectorUnavailable { candidates }) => {
                assert_eq!(candidates, vec![format!("http://127.0.0.1:{port}")]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let empty = PropertyTable::assemble(&[], Vec::new(), Vec::new())
            .expect("empty table should assemble");
        let write = runtime.block_on(client.set_property_table(&empty));
        assert!(matches!(
            write,
            Err(ArchicadError::ConnectorUnavailable { .. })
        ));
    }

    fn system(guid: &str, name: &str, date: &str) -> ClassificationSystem {
        ClassificationSystem {
            classification_system_id: ClassificationSystemId {
                guid: guid.to_string(),
            },
            name: name.to_string(),
            description: String::new(),
            source: String::new(),
            version: String::new(),
            date: date.to_string(),
        }
    }

    fn column(name: &str) -> PropertyColumn {
        name.parse().expect("test column names are valid")
    }

    #[test]
    fn resolve_host_prefers_explicit_then_env() {
        assert_eq!(resolve_host(Some("10.0.0.2"), Some("10.0.0.3")), "10.0.0.2");
        assert_eq!(resolve_host(None, Some("10.0.0.3")), "10.0.0.3");
        assert_eq!(resolve_host(None, Some("")), "127.0.0.1");
        assert_eq!(resolve_host(None, None), "127.0.0.1");
    }

    #[test]
    fn candidate_ports_probe_full_range_by_default() {
        let ports = candidate_ports(None, None).expect("default ports should resolve");
        assert_eq!(ports.len(), 22);
        assert_eq!(ports.first(), Some(&19723));
        assert_eq!(ports.last(), Some(&19744));

        assert_eq!(
            candidate_ports(None, Some("19730")).expect("env port should parse"),
            vec![19730]
        );
        assert_eq!(
            candidate_ports(Some(19724), Some("19730")).expect("explicit port wins"),
            vec![19724]
        );
        assert!(matches!(
            candidate_ports(None, Some("archicad")),
            Err(ArchicadError::Config { .. })
        ));
    }

    #[test]
    fn group_matches_whole_segments() {
        let group = vec!["CLT FABRICATION".to_string(), "Panels".to_string()];
        assert!(group_matches(&group, &["CLT FABRICATION"], true));
        assert!(group_matches(&group, &["clt fabrication", "panels"], false));
        assert!(!group_matches(&group, &["clt fabrication"], true));
        assert!(!group_matches(&group, &["CLT"], true));
        assert!(!group_matches(&group, &["CLT FABRICATION", "Panels", "Extra"], true));
        assert!(group_matches(&group, &[], true));
    }

    #[test]
    fn select_classification_system_picks_newest_without_date() {
        let systems = vec![
            system("a", "Uniclass 2015", "2015-06-01"),
            system("b", "Uniclass 2015", "2021-10-01"),
            system("c", "ARCHICAD Classification", "2019-01-01"),
            system("d", "Uniclass 2015", "2019-04-01"),
        ];

        let newest = select_classification_system(systems.clone(), "uniclass 2015", None, false)
            .expect("selection should succeed")
            .expect("a system should match");
        assert_eq!(newest.classification_system_id.guid, "b");

        let dated = select_classification_system(
            systems.clone(),
            "Uniclass 2015",
            Some(NaiveDate::from_ymd_opt(2015, 6, 1).expect("valid date")),
            true,
        )
        .expect("selection should succeed")
        .expect("a system should match");
        assert_eq!(dated.classification_system_id.guid, "a");

        let missing = select_classification_system(systems, "uniclass 2015", None, true)
            .expect("selection should succeed");
        assert!(missing.is_none());
    }

    #[test]
    fn parse_property_ids_maps_errors_to_columns() {
        let columns = vec![column("WORKFLOW>>>Status"), column("WORKFLOW>>>Owner")];
        let items = json!([
            { "propertyId": { "guid": "P-1" } },
            { "error": { "code": 4001, "message": "Property not found" } },
        ]);

        match parse_property_ids(&columns, &items) {
            Err(ArchicadError::PropertyIdLookup { column, code, .. }) => {
                assert_eq!(column, "WORKFLOW>>>Owner");
                assert_eq!(code, 4001);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let ids = parse_property_ids(&columns[..1], &json!([{ "propertyId": { "guid": "P-1" } }]))
            .expect("ids should parse");
        assert_eq!(ids, vec![PropertyId::new("P-1")]);
    }

    #[test]
    fn parse_property_values_matrix_keeps_item_errors() {
        let items = json!([
            {
                "propertyValues": [
                    { "propertyValue": { "type": "string", "status": "normal", "value": "Wall A" } },
                    { "error": { "code": 4002, "message": "Not available" } },
                ]
            }
        ]);

        let matrix = parse_property_values_matrix(&items).expect("matrix should parse");
        assert_eq!(matrix.len(), 1);
        assert_eq!(
            matrix[0][0],
            PropertyValueOrError::Value(WireValue::NormalString("Wall A".to_string()))
        );
        assert!(matches!(
            matrix[0][1],
            PropertyValueOrError::Error { code: 4002, .. }
        ));
    }

    #[test]
    fn parse_execution_results_reads_failures() {
        let items = json!([
            { "success": true },
            { "success": false, "error": { "code": 4010, "message": "Read-only property" } },
        ]);

        let results = parse_execution_results(&items).expect("results should parse");
        assert_eq!(results[0], ExecutionResult::Success);
        assert_eq!(
            results[1],
            ExecutionResult::Failure {
                code: 4010,
                message: "Read-only property".to_string()
            }
        );
    }
}
