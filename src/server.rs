//! Core MCP server implementation

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::{
    ApplicationNumberFilters, DailyMedClient, DrugClassFilters, DrugNameFilters, PageRequest, RxCuiFilters,
    SplSearchParams, UniiFilters, validate_set_id,
};
use crate::config::ServerConfig;
use crate::error::DailyMedError;
use crate::mapping::MappingIndex;
use crate::tools::params::{
    FilteredSearch, PharmaSetIdParams, PharmacologicClassSearchParams, RxCuiParams, RxNormNameParams, SetIdParams,
};
use crate::tools::{DailyMedContext, ToolDefinition, catalog};
use crate::transport::{McpError, McpMessage, MessageHandler};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "dailymed-mcp";

/// JSON-RPC "invalid params", used for unknown tool names
pub const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i32 = -32601;

/// MCP server exposing DailyMed label data and the cross-reference index
#[derive(Clone)]
pub struct McpServer {
    config: ServerConfig,
    client: DailyMedClient,
}

/// MCP server initialization result
#[derive(Debug, Clone)]
pub struct ServerInitResult {
    pub protocol_version: String,
    pub server_name: String,
    pub server_version: String,
    pub instructions: Option<String>,
}

/// Tool call result
#[derive(Debug, Clone)]
pub struct ToolCallResult {
    pub success: bool,
    pub content: String,
    pub error: Option<String>,
}

impl ToolCallResult {
    fn from_outcome(outcome: crate::error::Result<Value>) -> Self {
        let rendered = outcome.and_then(|value| Ok(serde_json::to_string_pretty(&value)?));
        match rendered {
            Ok(content) => Self {
                success: true,
                content,
                error: None,
            },
            Err(e) => Self {
                success: false,
                content: format!("Error: {}", e),
                error: Some(e.to_string()),
            },
        }
    }

    /// MCP `tools/call` result payload
    pub fn to_mcp_content(&self) -> Value {
        let mut result = json!({
            "content": [{ "type": "text", "text": self.content }]
        });
        if !self.success {
            result["isError"] = Value::Bool(true);
        }
        result
    }
}

fn parse_args<P: DeserializeOwned>(args: Value) -> crate::error::Result<P> {
    serde_json::from_value(args).map_err(|e| DailyMedError::validation(format!("Invalid arguments: {}", e)))
}

fn respond<T: Serialize>(value: T) -> crate::error::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Set ids and RxCUIs must not be blank
fn required<'a>(value: &'a str, what: &str) -> crate::error::Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DailyMedError::validation(format!("Valid {} is required", what)));
    }
    Ok(trimmed)
}

impl McpServer {
    /// Create a server over an already loaded index
    pub fn new(config: ServerConfig, index: Arc<MappingIndex>) -> Result<Self> {
        let client = DailyMedClient::new(&config.client_config(), index)?;
        Ok(Self { config, client })
    }

    /// Load the mapping datasets from `config.data_dir` and build the server
    pub fn initialize(config: ServerConfig) -> Result<Self> {
        info!("Loading mapping files from {}", config.data_dir.display());
        let index = MappingIndex::load_from_dir(&config.data_dir).map_err(DailyMedError::from)?;
        Self::new(config, Arc::new(index))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn client(&self) -> &DailyMedClient {
        &self.client
    }

    /// Get MCP initialize result
    pub fn get_initialize_result(&self) -> ServerInitResult {
        ServerInitResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            server_name: SERVER_NAME.to_string(),
            server_version: crate::VERSION.to_string(),
            instructions: Some(
                "DailyMed MCP Server - FDA drug labeling (SPL) search and retrieval with RxNorm and pharmacologic class cross-references"
                    .to_string(),
            ),
        }
    }

    /// Get available tools list
    pub fn get_tools(&self) -> Vec<ToolDefinition> {
        catalog()
    }

    /// Handle MCP tool call by name.
    ///
    /// Only an unknown tool name is an `Err`; every other failure is
    /// reported inside the returned [`ToolCallResult`].
    pub async fn handle_tool_call(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let arguments = if arguments.is_null() { json!({}) } else { arguments };
        let outcome = match self.dispatch(name, arguments).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => return Err(anyhow::anyhow!("Unknown tool: {}", name)),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                Err(e)
            }
        };
        debug!("Tool {} completed (ok: {})", name, outcome.is_ok());
        Ok(ToolCallResult::from_outcome(outcome))
    }

    /// Run a tool; `Ok(None)` when no tool has that name
    async fn dispatch(&self, name: &str, args: Value) -> crate::error::Result<Option<Value>> {
        let client = &self.client;
        let index = client.index();

        let value = match name {
            "get_dailymed_context" => respond(DailyMedContext::new(client.base_url()))?,

            "get_drug_details" => {
                let p: SetIdParams = parse_args(args)?;
                respond(client.spl_by_set_id(&p.set_id).await?)?
            }
            "get_drug_history" => {
                let p: SetIdParams = parse_args(args)?;
                respond(client.spl_history(&p.set_id).await?)?
            }
            "get_drug_ndcs" => {
                let p: SetIdParams = parse_args(args)?;
                respond(client.spl_ndcs(&p.set_id).await?)?
            }
            "get_drug_packaging" => {
                let p: SetIdParams = parse_args(args)?;
                client.spl_packaging(&p.set_id).await?
            }
            "get_drug_media" => {
                let p: SetIdParams = parse_args(args)?;
                respond(client.spl_media(&p.set_id).await?)?
            }
            "get_download_links" => {
                let p: SetIdParams = parse_args(args)?;
                respond(client.download_links(&p.set_id)?)?
            }

            "get_all_drug_names" => {
                let paging: PageRequest = parse_args(args)?;
                respond(client.drug_names(&DrugNameFilters::default(), paging).await?)?
            }
            "get_all_drug_classes" => {
                let paging: PageRequest = parse_args(args)?;
                respond(client.drug_classes(&DrugClassFilters::default(), paging).await?)?
            }
            "get_all_ndcs" => {
                let paging: PageRequest = parse_args(args)?;
                respond(client.ndcs(paging).await?)?
            }
            "get_all_rxcuis" => {
                let paging: PageRequest = parse_args(args)?;
                respond(client.rxcuis(&RxCuiFilters::default(), paging).await?)?
            }
            "get_all_uniis" => {
                let paging: PageRequest = parse_args(args)?;
                respond(client.uniis(&UniiFilters::default(), paging).await?)?
            }
            "get_all_application_numbers" => {
                let paging: PageRequest = parse_args(args)?;
                respond(
                    client
                        .application_numbers(&ApplicationNumberFilters::default(), paging)
                        .await?,
                )?
            }

            "search_spls" => {
                let p: SplSearchParams = parse_args(args)?;
                respond(client.search_spls(&p).await?)?
            }
            "search_rxcuis" => {
                let p: FilteredSearch<RxCuiFilters> = parse_args(args)?;
                respond(client.rxcuis(&p.filters, p.paging).await?)?
            }
            "search_drug_names" => {
                let p: FilteredSearch<DrugNameFilters> = parse_args(args)?;
                respond(client.drug_names(&p.filters, p.paging).await?)?
            }
            "search_uniis" => {
                let p: FilteredSearch<UniiFilters> = parse_args(args)?;
                respond(client.uniis(&p.filters, p.paging).await?)?
            }
            "search_application_numbers" => {
                let p: FilteredSearch<ApplicationNumberFilters> = parse_args(args)?;
                respond(client.application_numbers(&p.filters, p.paging).await?)?
            }
            "search_drug_classes" => {
                let p: FilteredSearch<DrugClassFilters> = parse_args(args)?;
                respond(client.drug_classes(&p.filters, p.paging).await?)?
            }
            "search_drugs_by_pharmacologic_class" => {
                let p: PharmacologicClassSearchParams = parse_args(args)?;
                let page = client
                    .drugs_by_pharmacologic_class(&p.drug_class_code, p.coding_system.as_deref(), p.paging)
                    .await?;
                respond(page)?
            }

            "get_mapping_statistics" => respond(index.statistics())?,
            "search_by_rxnorm_mapping" => {
                let p: RxNormNameParams = parse_args(args)?;
                respond(index.search_rxnorm_by_name(required(&p.drug_name, "drug name")?))?
            }
            "get_rxnorm_mappings_for_setid" => {
                let p: SetIdParams = parse_args(args)?;
                respond(index.rxnorm_mappings(validate_set_id(&p.set_id)?))?
            }
            "get_pharmacologic_class_mappings_for_setid" => {
                let p: SetIdParams = parse_args(args)?;
                respond(index.pharmacologic_class_mappings(validate_set_id(&p.set_id)?))?
            }
            "get_mappings_by_rxcui" => {
                let p: RxCuiParams = parse_args(args)?;
                respond(index.mappings_by_rxcui(required(&p.rxcui, "RxCUI")?))?
            }
            "get_rxnorm_mappings_by_pharmacologic_class" => {
                let p: PharmaSetIdParams = parse_args(args)?;
                respond(index.rxnorm_by_pharmacologic_class(required(&p.pharma_set_id, "pharmacologic class SET ID")?))?
            }
            "get_all_pharmacologic_class_setids" => respond(index.pharmacologic_class_set_ids())?,
            "get_pharmacologic_class_details" => {
                let p: PharmaSetIdParams = parse_args(args)?;
                respond(index.pharmacologic_class_details(required(&p.pharma_set_id, "pharmacologic class SET ID")?))?
            }

            _ => return Ok(None),
        };

        Ok(Some(value))
    }
}

/// Implementation of MessageHandler for McpServer
#[async_trait]
impl MessageHandler for McpServer {
    async fn handle_message(&self, message: McpMessage) -> Result<Option<McpMessage>> {
        match message {
            McpMessage::Initialize { id, params } => {
                info!(
                    "Received initialize request from client: {} (protocol {})",
                    params.client_info.name, params.protocol_version
                );

                let init_result = self.get_initialize_result();
                Ok(Some(McpMessage::result(
                    id,
                    json!({
                        "protocolVersion": init_result.protocol_version,
                        "serverInfo": {
                            "name": init_result.server_name,
                            "version": init_result.server_version
                        },
                        "capabilities": {
                            "tools": {
                                "listChanged": false
                            }
                        },
                        "instructions": init_result.instructions
                    }),
                )))
            }

            McpMessage::ToolsList { id } => {
                debug!("Received tools list request");
                Ok(Some(McpMessage::result(id, json!({ "tools": self.get_tools() }))))
            }

            McpMessage::ToolsCall { id, params } => {
                info!("Received tool call: {}", params.name);

                let arguments = params.arguments.unwrap_or(Value::Null);
                match self.handle_tool_call(&params.name, arguments).await {
                    Ok(result) => Ok(Some(McpMessage::result(id, result.to_mcp_content()))),
                    Err(e) => {
                        warn!("Tool call rejected: {}", e);
                        Ok(Some(McpMessage::error(id, McpError::new(INVALID_PARAMS, e.to_string()))))
                    }
                }
            }

            McpMessage::Ping { id } => Ok(Some(McpMessage::result(id, json!({})))),

            McpMessage::Unsupported { id, method } => {
                warn!("Unsupported method: {}", method);
                Ok(Some(McpMessage::error(
                    id,
                    McpError::new(METHOD_NOT_FOUND, format!("Method not found: {}", method)),
                )))
            }

            McpMessage::Notification { method, params: _ } => {
                debug!("Received notification: {}", method);
                Ok(None)
            }

            McpMessage::Response { .. } => {
                warn!("Received unexpected response message");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{PharmacologicClassMapping, RxNormMapping};
    use crate::transport::{ClientInfo, InitializeParams, ToolsCallParams};

    fn test_index() -> MappingIndex {
        MappingIndex::from_records(
            vec![PharmacologicClassMapping {
                spl_set_id: "spl-1".to_string(),
                spl_version: 1,
                pharma_set_id: "class-1".to_string(),
                pharma_version: 2,
            }],
            vec![RxNormMapping {
                set_id: "spl-1".to_string(),
                spl_version: 1,
                rxcui: "1191".to_string(),
                rxstring: "Aspirin 325 MG Oral Tablet".to_string(),
                rxtty: "SCD".to_string(),
            }],
        )
    }

    fn create_test_server() -> McpServer {
        let config = ServerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        McpServer::new(config, Arc::new(test_index())).unwrap()
    }

    #[test]
    fn test_server_initialization() {
        let result = create_test_server().get_initialize_result();
        assert_eq!(result.protocol_version, "2024-11-05");
        assert_eq!(result.server_name, "dailymed-mcp");
        assert_eq!(result.server_version, crate::VERSION);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = create_test_server();
        let err = server.handle_tool_call("unknown_tool", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: unknown_tool");
    }

    #[tokio::test]
    async fn every_listed_tool_is_dispatched() {
        let server = create_test_server();
        for tool in server.get_tools() {
            // Invalid arguments keep network tools from reaching the upstream
            let result = server.handle_tool_call(&tool.name, json!({ "setId": 1, "page": 0 })).await;
            assert!(result.is_ok(), "{} is not dispatched", tool.name);
        }
    }

    #[tokio::test]
    async fn mapping_tools_answer_from_the_index() {
        let server = create_test_server();

        let result = server
            .handle_tool_call("search_by_rxnorm_mapping", json!({ "drugName": "aspirin" }))
            .await
            .unwrap();
        assert!(result.success);
        let mappings: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(mappings[0]["rxcui"], "1191");

        let result = server
            .handle_tool_call("get_pharmacologic_class_details", json!({ "pharmaSetId": "class-1" }))
            .await
            .unwrap();
        let details: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(details["relatedDrugs"], 1);
        assert_eq!(details["splSetIds"], json!(["spl-1"]));

        let result = server.handle_tool_call("get_mapping_statistics", Value::Null).await.unwrap();
        let stats: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(stats["rxNormMappings"], 1);
    }

    #[tokio::test]
    async fn failures_are_reported_in_content() {
        let server = create_test_server();
        let result = server
            .handle_tool_call("get_rxnorm_mappings_for_setid", json!({ "setId": "" }))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.content, "Error: Valid SET ID is required");

        let content = result.to_mcp_content();
        assert_eq!(content["isError"], true);
        assert_eq!(content["content"][0]["text"], "Error: Valid SET ID is required");

        let result = server
            .handle_tool_call("get_drug_history", json!({ "setId": "../spls" }))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Valid SET ID is required"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_validation_errors() {
        let server = create_test_server();
        let result = server.handle_tool_call("get_drug_details", json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.content.starts_with("Error: Invalid arguments"));
    }

    #[tokio::test]
    async fn download_links_need_no_network() {
        let server = create_test_server();
        let result = server
            .handle_tool_call("get_download_links", json!({ "setId": "abc-123" }))
            .await
            .unwrap();
        let links: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(links["zipDownload"], "http://127.0.0.1:9/spls/abc-123.zip");
    }

    #[tokio::test]
    async fn handler_maps_protocol_messages() {
        let server = create_test_server();

        let response = server
            .handle_message(McpMessage::Initialize {
                id: json!(1),
                params: InitializeParams {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    client_info: ClientInfo {
                        name: "test-client".to_string(),
                        version: "1.0.0".to_string(),
                    },
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        match response {
            Some(McpMessage::Response { result: Some(result), .. }) => {
                assert_eq!(result["serverInfo"]["name"], "dailymed-mcp");
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let response = server
            .handle_message(McpMessage::ToolsCall {
                id: json!("a"),
                params: ToolsCallParams {
                    name: "nope".to_string(),
                    arguments: None,
                },
            })
            .await
            .unwrap();
        match response {
            Some(McpMessage::Response { id, error: Some(error), .. }) => {
                assert_eq!(id, json!("a"));
                assert_eq!(error.code, INVALID_PARAMS);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let response = server
            .handle_message(McpMessage::Notification {
                method: "notifications/initialized".to_string(),
                params: None,
            })
            .await
            .unwrap();
        assert!(response.is_none());
    }
}
