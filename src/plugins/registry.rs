//! Plugin registry and dispatcher
//!
//! Owns the active capabilities in registration order, aggregates their
//! function specs and routes calls by function name.

use super::capability::{Capability, HostServices};
use super::exposure::{policy_from_config, AlwaysExpose, ExposurePolicy};
use super::loader::Catalog;
use super::protocol::{Arguments, CallResult, FunctionSpec};
use super::schema::validate_arguments;
use crate::config::Config;
use crate::logging::{redact_secrets, truncate_preview};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Active capabilities, fixed after construction
pub struct PluginRegistry {
    capabilities: Vec<Box<dyn Capability>>,
    policy: Box<dyn ExposurePolicy>,
    force_expose: bool,
}

impl PluginRegistry {
    /// Build the registry described by configuration
    pub fn initialize(config: &Config, catalog: &Catalog) -> Self {
        let exposure = &config.plugins.exposure;
        Self::from_ids(config.plugins.enabled.as_slice(), catalog, config)
            .with_policy(policy_from_config(exposure))
            .with_force_expose(exposure.forces_all())
    }

    /// Instantiate `ids` in order; identifiers missing from the catalog are skipped
    pub fn from_ids<S: AsRef<str>>(ids: &[S], catalog: &Catalog, config: &Config) -> Self {
        let mut capabilities = Vec::with_capacity(ids.len());

        for id in ids {
            let id = id.as_ref();
            match catalog.construct(id, config) {
                Some(capability) => {
                    debug!(
                        "Activated capability '{}' ({})",
                        id,
                        capability.source_name()
                    );
                    capabilities.push(capability);
                }
                None => debug!("Skipping unknown capability '{}'", id),
            }
        }

        info!("Plugin registry initialized with {} capabilities", capabilities.len());

        Self {
            capabilities,
            policy: Box::new(AlwaysExpose),
            force_expose: false,
        }
    }

    /// Replace the exposure policy
    pub fn with_policy(mut self, policy: Box<dyn ExposurePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Expose every spec regardless of the policy
    pub fn with_force_expose(mut self, force: bool) -> Self {
        self.force_expose = force;
        self
    }

    /// All function specs, in registration order, if the selector is admitted
    pub fn aggregated_specs(&self, selector: Option<&str>) -> Vec<FunctionSpec> {
        if !self.force_expose && !self.policy.admits(selector) {
            debug!("Exposure policy withheld function specs");
            return Vec::new();
        }

        self.capabilities
            .iter()
            .flat_map(|capability| capability.specs())
            .collect()
    }

    /// Source name of the capability owning `function_name`
    pub fn source_name_for(&self, function_name: &str) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|capability| capability.owns(function_name))
            .map(|capability| capability.source_name())
    }

    /// First registered capability declaring `function_name`, with its spec
    fn owner_of(&self, function_name: &str) -> Option<(&dyn Capability, FunctionSpec)> {
        self.capabilities.iter().find_map(|capability| {
            capability
                .specs()
                .into_iter()
                .find(|spec| spec.name == function_name)
                .map(|spec| (capability.as_ref(), spec))
        })
    }

    /// Route a call to its owner and return the owner's result.
    ///
    /// Always yields a result: decode failures, unknown names, schema
    /// mismatches and panics inside a capability all become
    /// [`CallResult::Error`].
    pub async fn dispatch(
        &self,
        function_name: &str,
        host: &dyn HostServices,
        raw_arguments: &str,
    ) -> CallResult {
        let call_id = Uuid::new_v4();
        let span = tracing::debug_span!("dispatch", %call_id, function = function_name);

        async move {
            debug!(
                "Dispatching with arguments {}",
                truncate_preview(&redact_secrets(raw_arguments))
            );

            let result = self.route(function_name, host, raw_arguments).await;
            match &result {
                CallResult::Error(message) => warn!("Call failed: {}", message),
                CallResult::Direct(direct) => debug!(
                    "Returned direct {} ({} bytes)",
                    direct.kind,
                    direct.payload.byte_len()
                ),
                CallResult::Structured(map) => debug!("Returned {} fields", map.len()),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn route(
        &self,
        function_name: &str,
        host: &dyn HostServices,
        raw_arguments: &str,
    ) -> CallResult {
        let (capability, spec) = match self.owner_of(function_name) {
            Some(owner) => owner,
            None => return CallResult::error(format!("Function {} not found", function_name)),
        };

        let args = match Arguments::parse(raw_arguments) {
            Ok(args) => args,
            Err(e) => {
                return CallResult::error(format!("Invalid arguments for {}: {}", function_name, e))
            }
        };

        if let Err(e) = validate_arguments(&spec, &args) {
            return CallResult::error(format!("Invalid arguments for {}: {}", function_name, e));
        }

        debug!("Routing to {}", capability.source_name());

        // A panicking capability must not take the host down with it
        match AssertUnwindSafe(capability.execute(function_name, host, args))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => CallResult::error(format!(
                "Function {} failed: {}",
                function_name,
                panic_message(panic.as_ref())
            )),
        }
    }

    /// Source names of active capabilities, in registration order
    pub fn source_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.source_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExposureMode, HttpConfig};
    use crate::error::PluginError;
    use crate::plugins::capability::NoHostServices;
    use crate::plugins::exposure::KeywordExposure;
    use crate::plugins::protocol::{DirectKind, DirectPayload};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    /// Declares `ping` and answers with its own source name
    struct Ping {
        source: &'static str,
    }

    #[async_trait]
    impl Capability for Ping {
        fn source_name(&self) -> &str {
            self.source
        }

        fn specs(&self) -> Vec<FunctionSpec> {
            vec![FunctionSpec::new(
                "ping",
                "Answer with pong",
                json!({"type": "object", "properties": {}}),
            )]
        }

        async fn execute(
            &self,
            _function_name: &str,
            _host: &dyn HostServices,
            _args: Arguments,
        ) -> CallResult {
            CallResult::structured(json!({"pong": self.source}))
        }
    }

    /// Two functions, one of them with a required parameter
    struct Echo;

    #[async_trait]
    impl Capability for Echo {
        fn source_name(&self) -> &str {
            "Echo"
        }

        fn specs(&self) -> Vec<FunctionSpec> {
            vec![
                FunctionSpec::new(
                    "echo",
                    "Echo a message",
                    json!({
                        "type": "object",
                        "properties": {"message": {"type": "string"}},
                        "required": ["message"],
                    }),
                ),
                FunctionSpec::new(
                    "snapshot",
                    "Send a tiny picture",
                    json!({"type": "object", "properties": {}}),
                ),
            ]
        }

        async fn execute(
            &self,
            function_name: &str,
            _host: &dyn HostServices,
            args: Arguments,
        ) -> CallResult {
            match function_name {
                "echo" => CallResult::structured(json!({"message": args.get_str("message")})),
                _ => CallResult::direct(DirectKind::Photo, DirectPayload::Binary(vec![0xff, 0xd8])),
            }
        }
    }

    struct Exploding;

    #[async_trait]
    impl Capability for Exploding {
        fn source_name(&self) -> &str {
            "Exploding"
        }

        fn specs(&self) -> Vec<FunctionSpec> {
            vec![FunctionSpec::new("explode", "Panics", json!({"type": "object"}))]
        }

        async fn execute(
            &self,
            _function_name: &str,
            _host: &dyn HostServices,
            _args: Arguments,
        ) -> CallResult {
            panic!("capability bug")
        }
    }

    /// Talks to an address nobody listens on
    struct Unreachable;

    #[async_trait]
    impl Capability for Unreachable {
        fn source_name(&self) -> &str {
            "Unreachable"
        }

        fn specs(&self) -> Vec<FunctionSpec> {
            vec![FunctionSpec::new("fetch", "Fetch", json!({"type": "object"}))]
        }

        async fn execute(
            &self,
            _function_name: &str,
            _host: &dyn HostServices,
            _args: Arguments,
        ) -> CallResult {
            let outcome = async {
                let client = reqwest::Client::builder()
                    .timeout(std::time::Duration::from_secs(HttpConfig::default().timeout))
                    .build()?;
                let body = client.get("http://127.0.0.1:9/").send().await?.text().await?;
                Ok::<_, PluginError>(CallResult::structured(json!({ "body": body })))
            }
            .await;
            CallResult::from_outcome(outcome)
        }
    }

    fn test_catalog() -> Catalog {
        Catalog::empty()
            .with("first", |_| Box::new(Ping { source: "First" }))
            .with("second", |_| Box::new(Ping { source: "Second" }))
            .with("echo", |_| Box::new(Echo))
            .with("exploding", |_| Box::new(Exploding))
            .with("unreachable", |_| Box::new(Unreachable))
    }

    fn registry(ids: &[&str]) -> PluginRegistry {
        PluginRegistry::from_ids(ids, &test_catalog(), &Config::default())
    }

    fn spec_names(specs: &[FunctionSpec]) -> Vec<&str> {
        specs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_specs_follow_registration_order() {
        let registry = registry(&["echo", "first"]);
        let specs = registry.aggregated_specs(None);
        assert_eq!(spec_names(&specs), vec!["echo", "snapshot", "ping"]);

        let reversed = self::registry(&["first", "echo"]);
        assert_eq!(
            spec_names(&reversed.aggregated_specs(None)),
            vec!["ping", "echo", "snapshot"]
        );
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let registry = registry(&["wolfram", "echo", "spotify"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.source_names(), vec!["Echo"]);
        assert_eq!(
            spec_names(&registry.aggregated_specs(None)),
            vec!["echo", "snapshot"]
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = registry(&[]);
        assert!(registry.is_empty());
        assert!(registry.aggregated_specs(Some("anything")).is_empty());
    }

    #[test]
    fn test_aggregated_specs_idempotent() {
        let registry = registry(&["first", "echo"])
            .with_policy(Box::new(KeywordExposure::new(["echo"])));

        for selector in [None, Some("please echo this"), Some("hello")] {
            assert_eq!(
                registry.aggregated_specs(selector),
                registry.aggregated_specs(selector)
            );
        }
    }

    #[test]
    fn test_policy_withholds_specs() {
        let registry = registry(&["first"])
            .with_policy(Box::new(KeywordExposure::new(["ping"])));
        assert!(registry.aggregated_specs(Some("hello")).is_empty());
        assert_eq!(registry.aggregated_specs(Some("ping me")).len(), 1);
    }

    #[test]
    fn test_force_expose_overrides_policy() {
        let registry = registry(&["first"])
            .with_policy(Box::new(KeywordExposure::new(["ping"])))
            .with_force_expose(true);
        assert_eq!(registry.aggregated_specs(Some("hello")).len(), 1);
    }

    #[test]
    fn test_initialize_from_config() {
        let mut config = Config::default();
        config.plugins.enabled = vec!["second".to_string(), "bogus".to_string()];
        config.plugins.exposure.mode = Some(ExposureMode::Keywords);
        config.plugins.exposure.keywords = vec!["ping".to_string()];

        let registry = PluginRegistry::initialize(&config, &test_catalog());
        assert_eq!(registry.source_names(), vec!["Second"]);
        assert!(registry.aggregated_specs(Some("hi")).is_empty());

        config.plugins.exposure.force_all = Some(true);
        let registry = PluginRegistry::initialize(&config, &test_catalog());
        assert_eq!(registry.aggregated_specs(Some("hi")).len(), 1);
    }

    #[test]
    fn test_source_name_lookup() {
        let registry = registry(&["echo", "first"]);
        assert_eq!(registry.source_name_for("snapshot"), Some("Echo"));
        assert_eq!(registry.source_name_for("ping"), Some("First"));
        assert_eq!(registry.source_name_for("missing"), None);
    }

    #[tokio::test]
    async fn test_duplicate_name_routes_to_first_owner() {
        let registry = registry(&["first", "second"]);
        assert_eq!(registry.source_name_for("ping"), Some("First"));

        let result = registry.dispatch("ping", &NoHostServices, "{}").await;
        assert_eq!(result.to_json(), json!({"pong": "First"}));

        let swapped = self::registry(&["second", "first"]);
        let result = swapped.dispatch("ping", &NoHostServices, "{}").await;
        assert_eq!(result.to_json(), json!({"pong": "Second"}));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let registry = registry(&["first"]);
        let result = registry.dispatch("nope", &NoHostServices, "{}").await;
        assert_eq!(result, CallResult::error("Function nope not found"));
        assert_eq!(result.to_json(), json!({"error": "Function nope not found"}));
    }

    #[tokio::test]
    async fn test_unknown_function_with_malformed_arguments() {
        let registry = registry(&["echo"]);
        for raw in ["not json", "[1]", ""] {
            let result = registry.dispatch("nope", &NoHostServices, raw).await;
            assert_eq!(result, CallResult::error("Function nope not found"));
        }
    }

    #[tokio::test]
    async fn test_malformed_arguments() {
        let registry = registry(&["echo"]);
        for raw in ["", "{", "not json", "[1, 2]", "\"text\"", "42", "null"] {
            let result = registry.dispatch("echo", &NoHostServices, raw).await;
            let message = result.error_message().unwrap();
            assert!(
                message.starts_with("Invalid arguments for echo"),
                "unexpected message for {:?}: {}",
                raw,
                message
            );
        }
    }

    #[tokio::test]
    async fn test_schema_violation_never_reaches_capability() {
        let registry = registry(&["echo"]);

        let missing = registry.dispatch("echo", &NoHostServices, "{}").await;
        assert_eq!(
            missing.error_message(),
            Some("Invalid arguments for echo: Missing required parameter: message")
        );

        let wrong_type = registry
            .dispatch("echo", &NoHostServices, r#"{"message": 5}"#)
            .await;
        assert!(wrong_type.is_error());

        let ok = registry
            .dispatch("echo", &NoHostServices, r#"{"message": "hi"}"#)
            .await;
        assert_eq!(ok.to_json(), json!({"message": "hi"}));
    }

    #[tokio::test]
    async fn test_panicking_capability_is_contained() {
        let registry = registry(&["exploding", "first"]);
        let result = registry.dispatch("explode", &NoHostServices, "{}").await;
        assert_eq!(
            result.error_message(),
            Some("Function explode failed: capability bug")
        );

        // The registry keeps working afterwards
        let result = registry.dispatch("ping", &NoHostServices, "{}").await;
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn test_network_failure_becomes_error_result() {
        let registry = registry(&["unreachable"]);
        let result = registry.dispatch("fetch", &NoHostServices, "{}").await;
        assert!(result.error_message().unwrap().starts_with("Network error"));
    }

    #[tokio::test]
    async fn test_direct_result_passes_through_unchanged() {
        let registry = registry(&["echo"]);
        let result = registry.dispatch("snapshot", &NoHostServices, "{}").await;

        assert!(result.is_direct());
        assert_eq!(
            result,
            CallResult::direct(DirectKind::Photo, DirectPayload::Binary(vec![0xff, 0xd8]))
        );
        assert_eq!(result.to_text(), "[photo sent directly]");
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_are_independent() {
        let registry = Arc::new(registry(&["first", "echo"]));

        let (a, b, c) = tokio::join!(
            registry.dispatch("ping", &NoHostServices, "{}"),
            registry.dispatch("echo", &NoHostServices, r#"{"message": "one"}"#),
            registry.dispatch("echo", &NoHostServices, r#"{"message": "two"}"#),
        );

        assert_eq!(a.to_json(), json!({"pong": "First"}));
        assert_eq!(b.to_json(), json!({"message": "one"}));
        assert_eq!(c.to_json(), json!({"message": "two"}));

        let shared = Arc::clone(&registry);
        let handle = tokio::spawn(async move {
            shared.dispatch("ping", &NoHostServices, "{}").await
        });
        assert!(!handle.await.unwrap().is_error());
    }
}
