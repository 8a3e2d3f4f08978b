// src/mcp_server.rs

use rmcp::{
    ServerHandler, ServiceExt,
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
};
use rust_trip_planner::{
    logging::init_logging, CityListNormalizer, LocationResolver, PlannerConfig, ReferenceIndex,
    ResolverMode,
};
use serde::{Deserialize, Serialize};
use anyhow::Result;
use tracing::{info, warn, error, debug};
use std::path::PathBuf;
use std::sync::Arc;

/// Location resolution MCP server
#[derive(Clone)]
pub struct TripPlannerServer {
    index: Arc<ReferenceIndex>,
    mode: Option<ResolverMode>,
}

impl TripPlannerServer {
    pub fn new(index: ReferenceIndex, mode: Option<ResolverMode>) -> Self {
        Self {
            index: Arc::new(index),
            mode,
        }
    }

    fn resolver(&self, mode: Option<ResolverMode>) -> LocationResolver<'_> {
        let resolver = LocationResolver::new(&self.index);
        match mode.or(self.mode) {
            Some(mode) => resolver.with_mode(mode),
            None => resolver,
        }
    }

    fn resolve_locations_json(&self, params: ResolveLocationParams) -> String {
        let mode = match params.mode.as_deref().map(str::parse::<ResolverMode>).transpose() {
            Ok(mode) => mode,
            Err(e) => {
                error!("Invalid resolver mode: {}", e);
                return serde_json::json!({ "error": e.to_string() }).to_string();
            }
        };

        if params.locations.is_empty() {
            warn!("Empty locations list provided for resolution");
            return r#"{"error": "At least one location must be specified"}"#.to_string();
        }

        let resolver = self.resolver(mode);
        let results: Vec<ResolvedEntry> = params
            .locations
            .into_iter()
            .map(|input| {
                let resolved = resolver.resolve(&input);
                debug!(input = input.as_str(), resolved = %resolved, "Resolved location");
                ResolvedEntry {
                    input,
                    resolved: resolved.is_resolved(),
                    code: resolved.into_option(),
                }
            })
            .collect();

        let unresolved = results.iter().filter(|r| !r.resolved).count();
        info!(
            total = results.len(),
            unresolved,
            "Location resolution completed"
        );

        serde_json::to_string_pretty(&results).unwrap_or_else(|e| {
            format!(r#"{{"error": "Failed to serialize results: {}"}}"#, e)
        })
    }

    fn normalize_cities_json(&self, params: NormalizeCitiesParams) -> String {
        let normalizer = CityListNormalizer::new(&self.index);
        let cities = normalizer.normalize(&params.text, params.country.as_deref());

        if cities.is_empty() {
            warn!(country = params.country.as_deref(), "No cities recovered from text");
            return serde_json::json!({
                "cities": [],
                "error": "No cities found"
            }).to_string();
        }

        info!(cities = cities.len(), "City list normalized");
        serde_json::json!({ "cities": cities }).to_string()
    }
}

/// Location resolution request
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct ResolveLocationParams {
    #[schemars(description = "City names, airport names or 3-letter airport codes (e.g., 'New Delhi', 'BKK')")]
    pub locations: Vec<String>,
    #[schemars(description = "Resolver mode: staged (default for full datasets) or flat")]
    pub mode: Option<String>,
}

/// City list normalization request
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct NormalizeCitiesParams {
    #[schemars(description = "Generated text that should contain a JSON array of city names")]
    pub text: String,
    #[schemars(description = "Country whose known cities the list is checked against (e.g., France)")]
    pub country: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ResolvedEntry {
    pub input: String,
    pub resolved: bool,
    pub code: Option<String>,
}

#[tool(tool_box)]
impl TripPlannerServer {
    /// Resolve locations to airport codes
    #[tool(description = "Resolve city names, airport names or airport codes to 3-letter airport codes. Unknown locations come back with resolved=false.")]
    async fn resolve_location(
        &self,
        #[tool(aggr)] params: ResolveLocationParams,
    ) -> String {
        info!(
            locations = params.locations.len(),
            mode = params.mode.as_deref(),
            "Location resolution request received"
        );
        self.resolve_locations_json(params)
    }

    /// Clean generated city list text
    #[tool(description = "Normalize generated text into a deduplicated list of at most 12 city names, optionally restricted to the known cities of a country.")]
    async fn normalize_cities(
        &self,
        #[tool(aggr)] params: NormalizeCitiesParams,
    ) -> String {
        info!(
            text_length = params.text.len(),
            country = params.country.as_deref(),
            "City normalization request received"
        );
        self.normalize_cities_json(params)
    }
}

#[tool(tool_box)]
impl ServerHandler for TripPlannerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("A trip planning helper that resolves locations to airport codes and cleans generated city lists. Returns structured JSON results.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = PlannerConfig::from_env()?;

    // stdout carries the protocol, so logs always go to a file
    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("logs"));
    if let Err(e) = init_logging(Some(&log_dir), "rust-trip-planner-mcp.log") {
        eprintln!("Failed to initialize logging: {}", e);
        // Continue without logging rather than failing
    }

    info!("Starting MCP Trip Planner Server");
    debug!(?config, "Configuration loaded");

    // Built before serving; shared read-only by every request
    let index = ReferenceIndex::load(&config.dataset_path);
    let server = TripPlannerServer::new(index, config.resolver_mode);
    let transport = stdio();

    info!("MCP server initialized, starting service");

    let service = server.serve(transport).await?;

    info!("MCP service started, waiting for requests");

    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}
