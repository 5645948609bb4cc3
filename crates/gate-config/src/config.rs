// gate-config/src/config.rs
// ============================================================================
// Module: Omar Gate Configuration
// Description: Parses `INPUT_*`/`GITHUB_*` environment variables into a
//              validated, masked `GateConfig`.
// Purpose: Give every other stage one frozen, already-validated view of the
//          action's configured inputs: a load-then-validate shape sourced
//          from environment variables instead of a TOML file.
// Dependencies: gate-core, serde, toml, thiserror
// ============================================================================

//! ## Overview
//! `GateConfig::from_env` reads the `INPUT_`-prefixed variables GitHub
//! Actions exposes for a composite/JS/Docker action's `with:` block (the
//! host upper-cases the input name and replaces `-` with `_`), validates
//! them into typed fields, and masks any authentication material so it can
//! never be printed verbatim. A `GATE_CONFIG_FILE` escape hatch loads the
//! same fields from a TOML document for local/dev runs outside CI, with
//! environment variables taking precedence over file values field-by-field.
//!
//! Security posture: every input here is attacker-influenced (a PR author
//! controls workflow dispatch inputs in some configurations) and is
//! validated before use; nothing here is trusted implicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use gate_core::ForkPolicy;
use gate_core::LlmFailurePolicy;
use gate_core::ParseScanModeError;
use gate_core::ParseSeverityGateError;
use gate_core::RateLimitFailMode;
use gate_core::ScanMode;
use gate_core::SeverityGate;
use gate_core::TelemetryTier;
use serde::Deserialize;
use thiserror::Error;

use crate::secret::SecretString;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable that, if set, points at a TOML config file used in
/// place of (but overridable by) `INPUT_*` variables.
pub const CONFIG_FILE_ENV_VAR: &str = "GATE_CONFIG_FILE";
/// Maximum size accepted for the `GATE_CONFIG_FILE` escape hatch.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default minimum interval, in seconds, between runs for the same head SHA.
pub const DEFAULT_RATE_LIMIT_MIN_INTERVAL_SECS: u64 = 300;
/// Default maximum runs per day for the same head SHA.
pub const DEFAULT_RATE_LIMIT_DAILY_CAP: u32 = 50;
/// Default maximum tokens of assembled LLM context.
pub const DEFAULT_MAX_INPUT_TOKENS: u32 = 12_000;
/// Default USD threshold above which cost approval is required.
pub const DEFAULT_COST_THRESHOLD_USD: f64 = 2.0;
/// Default PR label checked by `approval.mode = pr_label`.
pub const DEFAULT_APPROVAL_LABEL: &str = "gate:approved";
/// Default policy pack identifier.
pub const DEFAULT_POLICY_PACK: &str = "default";
/// Default policy pack version.
pub const DEFAULT_POLICY_PACK_VERSION: &str = "1";
/// Default action major version, used as a dedupe-key input.
pub const DEFAULT_ACTION_MAJOR: &str = "1";
/// Default ignore-file path, relative to the repository root.
pub const DEFAULT_IGNORE_FILE: &str = ".sentinelayerignore";
/// Default run-directory root when `RUNS_DIR` is unset.
pub const DEFAULT_RUNS_DIR: &str = "gate-runs";
/// Default agentic CLI binary name, if the agentic path is enabled.
pub const DEFAULT_AGENTIC_CLI_BINARY: &str = "agentic-review";
/// Default LLM API call timeout, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
/// Default agentic CLI timeout, in seconds.
pub const DEFAULT_AGENTIC_TIMEOUT_SECS: u64 = 300;
/// Default top-level wall-clock deadline for one orchestrator run, in
/// seconds.
pub const DEFAULT_RUN_DEADLINE_SECS: u64 = 1_800;

// ============================================================================
// SECTION: LLM Provider Kind
// ============================================================================

/// Which reference `LlmProvider` implementation serves a configured model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    /// OpenAI-compatible chat completions endpoint.
    OpenAi,
    /// Anthropic messages endpoint.
    Anthropic,
    /// Azure-hosted OpenAI deployment.
    AzureOpenAi,
    /// A managed-runtime hosted model endpoint.
    Bedrock,
}

/// Error returned when a provider-kind string does not match the legal set.
#[derive(Debug, Clone, Error)]
#[error("invalid llm provider {0:?}, expected one of openai, anthropic, azure_openai, bedrock")]
pub struct ParseLlmProviderKindError(String);

impl FromStr for LlmProviderKind {
    type Err = ParseLlmProviderKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "azure_openai" => Ok(Self::AzureOpenAi),
            "bedrock" => Ok(Self::Bedrock),
            other => Err(ParseLlmProviderKindError(other.to_string())),
        }
    }
}

impl LlmProviderKind {
    /// Auto-detects a provider from a model name's conventional prefix, used
    /// to pick the fallback provider when only a fallback model is
    /// configured.
    #[must_use]
    pub fn from_model_prefix(model: &str) -> Option<Self> {
        if model.starts_with("gpt-") || model.starts_with("o1-") || model.starts_with("o3-") {
            Some(Self::OpenAi)
        } else if model.starts_with("claude-") {
            Some(Self::Anthropic)
        } else if model.starts_with("azure-") {
            Some(Self::AzureOpenAi)
        } else if model.starts_with("amazon.") || model.starts_with("anthropic.") {
            Some(Self::Bedrock)
        } else {
            None
        }
    }
}

// ============================================================================
// SECTION: Sub-Configs
// ============================================================================

/// LLM analyzer configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Primary provider.
    pub provider: LlmProviderKind,
    /// Primary model identifier, passed through to the provider verbatim.
    pub model: String,
    /// Fallback model identifier, tried once if the primary model fails
    /// twice (initial attempt + one retry).
    pub fallback_model: Option<String>,
    /// API key for the primary provider (and fallback, if same provider).
    pub api_key: SecretString,
    /// Per-call timeout.
    pub timeout_secs: u64,
    /// Enables the agentic CLI path in addition to (or instead of) the API
    /// path, per `agentic_mode`.
    pub agentic_enabled: bool,
    /// Agentic CLI binary name, resolved against `PATH`.
    pub agentic_binary: String,
    /// Agentic CLI timeout, in seconds.
    pub agentic_timeout_secs: u64,
    /// Azure OpenAI resource name, required only when `provider` (or the
    /// fallback provider) resolves to [`LlmProviderKind::AzureOpenAi`].
    pub azure_resource: Option<String>,
    /// Azure OpenAI deployment name, required only when `provider` (or the
    /// fallback provider) resolves to [`LlmProviderKind::AzureOpenAi`].
    pub azure_deployment: Option<String>,
    /// Bedrock runtime invoke URL, required only when `provider` (or the
    /// fallback provider) resolves to [`LlmProviderKind::Bedrock`].
    pub bedrock_invoke_url: Option<String>,
}

impl LlmConfig {
    /// Resolves the provider that should serve the fallback model: the
    /// explicitly configured provider if the fallback shares the primary's
    /// vendor family, else a prefix-based auto-detection.
    #[must_use]
    pub fn fallback_provider(&self) -> Option<LlmProviderKind> {
        let fallback_model = self.fallback_model.as_deref()?;
        LlmProviderKind::from_model_prefix(fallback_model).or(Some(self.provider))
    }
}

/// Preflight rate-limit configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Minimum interval, in seconds, between runs for the same head SHA.
    pub min_interval_secs: u64,
    /// Maximum runs per rolling 24h window for the same head SHA.
    pub daily_cap: u32,
    /// Behavior when the host API errors while checking rate limits.
    pub fail_mode: RateLimitFailMode,
}

/// Cost-approval configuration.
#[derive(Debug, Clone)]
pub struct ApprovalConfig {
    /// Mechanism used to approve an over-threshold cost estimate.
    pub mode: gate_core::ApprovalMode,
    /// PR label checked when `mode = pr_label`.
    pub label: String,
    /// USD threshold above which approval is required.
    pub cost_threshold_usd: f64,
}

/// Publisher behavior configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishConfig {
    /// When true, a publisher error changes `GateResult` instead of being
    /// recorded as a non-fatal warning.
    pub strict: bool,
}

// ============================================================================
// SECTION: GateConfig
// ============================================================================

/// Frozen, validated configuration for one orchestrator run.
///
/// Constructed only by [`GateConfig::from_env`] (or, in tests, a proptest/
/// unit fixture calling the same validation path); there is no `&mut self`
/// method on this type once built.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Selected scan mode.
    pub scan_mode: ScanMode,
    /// Blocking severity threshold.
    pub severity_gate: SeverityGate,
    /// LLM analyzer configuration.
    pub llm: LlmConfig,
    /// Behavior when the LLM analyzer exhausts its retry budget.
    pub failure_policy: LlmFailurePolicy,
    /// Fork-PR admission policy.
    pub fork_policy: ForkPolicy,
    /// Preflight rate-limit configuration.
    pub rate_limit: RateLimitConfig,
    /// Cost-approval configuration.
    pub approval: ApprovalConfig,
    /// Maximum tokens of assembled LLM context.
    pub max_input_tokens: u32,
    /// Top-level wall-clock budget for one run, from admission through
    /// merge. A stage not yet started when this elapses is skipped rather
    /// than started, and the run still writes evidence for whatever
    /// completed before the deadline.
    pub run_deadline_secs: u64,
    /// Telemetry upload tier.
    pub telemetry_tier: TelemetryTier,
    /// Publisher behavior.
    pub publish: PublishConfig,
    /// Policy pack identifier, a dedupe-key input.
    pub policy_pack: String,
    /// Policy pack version, a dedupe-key input.
    pub policy_pack_version: String,
    /// Action major version, a dedupe-key input.
    pub action_major: String,
    /// Repository-relative ignore file path (gitignore semantics).
    pub ignore_file: PathBuf,
    /// Root directory under which `<run_id>/` evidence bundles are written.
    pub runs_dir: PathBuf,
    /// Host API token (masked).
    pub host_token: SecretString,
    /// Optional caller-supplied telemetry bearer token (masked), used when
    /// OIDC workload identity is unavailable.
    pub telemetry_token: Option<SecretString>,
}

impl GateConfig {
    /// Loads configuration from `INPUT_*` environment variables, falling
    /// back to a `GATE_CONFIG_FILE` TOML document (if set) for any field an
    /// environment variable did not set, and finally to the documented
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a present value fails to parse or the
    /// resulting configuration fails [`GateConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&EnvSource::current()?)
    }

    /// Builds configuration from an explicit [`EnvSource`], used by
    /// `from_env` and directly by tests that need a hermetic environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a present value fails to parse or the
    /// resulting configuration fails [`GateConfig::validate`].
    pub fn from_source(source: &EnvSource) -> Result<Self, ConfigError> {
        let scan_mode = source.parse_or_default("SCAN_MODE", ScanMode::PrDiff, |s| {
            s.parse::<ScanMode>().map_err(ParseScanModeError::to_string)
        })?;
        let severity_gate = source.parse_or_default("SEVERITY_GATE", SeverityGate::P1, |s| {
            s.parse::<SeverityGate>().map_err(ParseSeverityGateError::to_string)
        })?;
        let llm_provider =
            source.parse_or_default("LLM_PROVIDER", LlmProviderKind::OpenAi, |s| {
                s.parse::<LlmProviderKind>().map_err(|err| err.to_string())
            })?;
        let llm_model = source.string_or_default("LLM_MODEL", "gpt-4o-mini");
        let llm_fallback_model = source.optional_string("LLM_FALLBACK_MODEL");
        let llm_api_key = source.secret("LLM_API_KEY");
        let llm_timeout_secs =
            source.parse_or_default("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS, parse_u64)?;
        let agentic_enabled =
            source.parse_or_default("AGENTIC_ENABLED", false, parse_bool)?;
        let agentic_binary =
            source.string_or_default("AGENTIC_CLI", DEFAULT_AGENTIC_CLI_BINARY);
        let agentic_timeout_secs = source.parse_or_default(
            "AGENTIC_TIMEOUT_SECS",
            DEFAULT_AGENTIC_TIMEOUT_SECS,
            parse_u64,
        )?;
        let azure_resource = source.optional_string("AZURE_RESOURCE");
        let azure_deployment = source.optional_string("AZURE_DEPLOYMENT");
        let bedrock_invoke_url = source.optional_string("BEDROCK_INVOKE_URL");

        let failure_policy =
            source.parse_or_default("LLM_FAILURE_POLICY", LlmFailurePolicy::Block, |s| {
                parse_llm_failure_policy(s).ok_or_else(|| s.to_string())
            })?;
        let fork_policy = source.parse_or_default("FORK_POLICY", ForkPolicy::Limited, |s| {
            parse_fork_policy(s).ok_or_else(|| s.to_string())
        })?;

        let rate_limit_min_interval_secs = source.parse_or_default(
            "RATE_LIMIT_MIN_INTERVAL_SECS",
            DEFAULT_RATE_LIMIT_MIN_INTERVAL_SECS,
            parse_u64,
        )?;
        let rate_limit_daily_cap = source.parse_or_default(
            "RATE_LIMIT_DAILY_CAP",
            DEFAULT_RATE_LIMIT_DAILY_CAP,
            parse_u32,
        )?;
        let rate_limit_fail_mode = source.parse_or_default(
            "RATE_LIMIT_FAIL_MODE",
            RateLimitFailMode::Closed,
            |s| parse_rate_limit_fail_mode(s).ok_or_else(|| s.to_string()),
        )?;

        let approval_mode =
            source.parse_or_default("APPROVAL_MODE", gate_core::ApprovalMode::None, |s| {
                parse_approval_mode(s).ok_or_else(|| s.to_string())
            })?;
        let approval_label = source.string_or_default("APPROVAL_LABEL", DEFAULT_APPROVAL_LABEL);
        let cost_threshold_usd = source.parse_or_default(
            "COST_THRESHOLD_USD",
            DEFAULT_COST_THRESHOLD_USD,
            parse_f64,
        )?;

        let max_input_tokens = source.parse_or_default(
            "MAX_INPUT_TOKENS",
            DEFAULT_MAX_INPUT_TOKENS,
            parse_u32,
        )?;
        let run_deadline_secs = source.parse_or_default(
            "RUN_DEADLINE_SECS",
            DEFAULT_RUN_DEADLINE_SECS,
            parse_u64,
        )?;
        let telemetry_tier =
            source.parse_or_default("TELEMETRY_TIER", TelemetryTier::Tier1, |s| {
                parse_telemetry_tier(s).ok_or_else(|| s.to_string())
            })?;
        let publish_strict =
            source.parse_or_default("PUBLISH_STRICT", false, parse_bool)?;

        let policy_pack = source.string_or_default("POLICY_PACK", DEFAULT_POLICY_PACK);
        let policy_pack_version =
            source.string_or_default("POLICY_PACK_VERSION", DEFAULT_POLICY_PACK_VERSION);
        let action_major = source.string_or_default("ACTION_MAJOR", DEFAULT_ACTION_MAJOR);

        let ignore_file =
            PathBuf::from(source.string_or_default("IGNORE_FILE", DEFAULT_IGNORE_FILE));
        let runs_dir = PathBuf::from(
            source
                .raw_env_var("RUNS_DIR")
                .unwrap_or_else(|| DEFAULT_RUNS_DIR.to_string()),
        );

        let host_token = source.secret("GITHUB_TOKEN");
        let telemetry_token = {
            let secret = source.secret("TELEMETRY_TOKEN");
            if secret.is_empty() {
                None
            } else {
                Some(secret)
            }
        };

        let config = Self {
            scan_mode,
            severity_gate,
            llm: LlmConfig {
                provider: llm_provider,
                model: llm_model,
                fallback_model: llm_fallback_model,
                api_key: llm_api_key,
                timeout_secs: llm_timeout_secs,
                agentic_enabled,
                agentic_binary,
                agentic_timeout_secs,
                azure_resource,
                azure_deployment,
                bedrock_invoke_url,
            },
            failure_policy,
            fork_policy,
            rate_limit: RateLimitConfig {
                min_interval_secs: rate_limit_min_interval_secs,
                daily_cap: rate_limit_daily_cap,
                fail_mode: rate_limit_fail_mode,
            },
            approval: ApprovalConfig {
                mode: approval_mode,
                label: approval_label,
                cost_threshold_usd,
            },
            max_input_tokens,
            run_deadline_secs,
            telemetry_tier,
            publish: PublishConfig {
                strict: publish_strict,
            },
            policy_pack,
            policy_pack_version,
            action_major,
            ignore_file,
            runs_dir,
            host_token,
            telemetry_token,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field invariants that a single parsed value cannot
    /// enforce on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a value is present but out of its
    /// documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_tokens == 0 {
            return Err(ConfigError::Invalid("max_input_tokens must be non-zero".to_string()));
        }
        if self.rate_limit.daily_cap == 0 {
            return Err(ConfigError::Invalid("rate_limit.daily_cap must be non-zero".to_string()));
        }
        if self.approval.cost_threshold_usd < 0.0 {
            return Err(ConfigError::Invalid(
                "approval.cost_threshold_usd must be non-negative".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Environment Source
// ============================================================================

/// A resolved source of configuration values: the process environment plus
/// an optional `GATE_CONFIG_FILE` fallback table, env-var values always
/// winning field-by-field.
pub struct EnvSource {
    env: HashMap<String, String>,
    file: HashMap<String, String>,
}

impl EnvSource {
    /// Reads the current process environment and, if `GATE_CONFIG_FILE` is
    /// set, the TOML file it names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file is set but cannot be read
    /// or parsed, or exceeds [`MAX_CONFIG_FILE_SIZE`].
    pub fn current() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = env::vars().collect();
        let file = if let Some(path) = env.get(CONFIG_FILE_ENV_VAR) {
            load_toml_file(Path::new(path))?
        } else {
            HashMap::new()
        };
        Ok(Self { env, file })
    }

    /// Builds a hermetic source directly from maps, used by tests.
    #[must_use]
    pub fn from_maps(env: HashMap<String, String>, file: HashMap<String, String>) -> Self {
        Self { env, file }
    }

    /// Looks up `INPUT_<NAME>` in the environment, then `name` (lowercased)
    /// in the file table.
    fn lookup(&self, name: &str) -> Option<String> {
        let input_key = format!("INPUT_{name}");
        if let Some(value) = self.env.get(&input_key) {
            return Some(value.clone());
        }
        self.file.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Looks up a non-`INPUT_`-prefixed variable directly (host-provided
    /// context, e.g. `RUNS_DIR`, `GITHUB_EVENT_PATH`).
    #[must_use]
    pub fn raw_env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    /// Returns a string field or `default` if unset.
    fn string_or_default(&self, name: &str, default: &str) -> String {
        self.lookup(name).unwrap_or_else(|| default.to_string())
    }

    /// Returns an optional string field, `None` if unset or blank.
    fn optional_string(&self, name: &str) -> Option<String> {
        self.lookup(name).filter(|value| !value.trim().is_empty())
    }

    /// Returns a masked secret field, empty if unset.
    fn secret(&self, name: &str) -> SecretString {
        SecretString::new(self.lookup(name).unwrap_or_default())
    }

    /// Parses a field with `parser`, falling back to `default` if unset,
    /// surfacing a present-but-invalid value as [`ConfigError::InvalidInput`].
    fn parse_or_default<T>(
        &self,
        name: &str,
        default: T,
        parser: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, ConfigError> {
        match self.lookup(name) {
            Some(raw) => parser(&raw)
                .map_err(|reason| ConfigError::InvalidInput { field: name.to_string(), reason }),
            None => Ok(default),
        }
    }
}

/// Reads and validates a `GATE_CONFIG_FILE` TOML document, flattening its
/// top-level keys into a `name -> string-value` map so the same
/// `parse_or_default` path handles both sources uniformly.
fn load_toml_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
    let table: toml::Table = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
    let mut flattened = HashMap::new();
    for (key, value) in table {
        let rendered = match value {
            toml::Value::String(s) => s,
            other => other.to_string(),
        };
        flattened.insert(key.to_ascii_lowercase(), rendered);
    }
    Ok(flattened)
}

// ============================================================================
// SECTION: Primitive Parsers
// ============================================================================

/// Parses a literal `"true"`/`"false"` value.
fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected \"true\" or \"false\", got {other:?}")),
    }
}

/// Parses a non-negative 32-bit integer field.
fn parse_u32(raw: &str) -> Result<u32, String> {
    raw.parse::<u32>().map_err(|_| format!("expected a non-negative integer, got {raw:?}"))
}

/// Parses a non-negative 64-bit integer field.
fn parse_u64(raw: &str) -> Result<u64, String> {
    raw.parse::<u64>().map_err(|_| format!("expected a non-negative integer, got {raw:?}"))
}

/// Parses a decimal field.
fn parse_f64(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>().map_err(|_| format!("expected a decimal number, got {raw:?}"))
}

/// Parses the `LLM_FAILURE_POLICY` legal value set.
fn parse_llm_failure_policy(raw: &str) -> Option<LlmFailurePolicy> {
    match raw {
        "block" => Some(LlmFailurePolicy::Block),
        "deterministic_only" => Some(LlmFailurePolicy::DeterministicOnly),
        "allow_with_warning" => Some(LlmFailurePolicy::AllowWithWarning),
        _ => None,
    }
}

/// Parses the `FORK_POLICY` legal value set.
fn parse_fork_policy(raw: &str) -> Option<ForkPolicy> {
    match raw {
        "block" => Some(ForkPolicy::Block),
        "limited" => Some(ForkPolicy::Limited),
        "allow" => Some(ForkPolicy::Allow),
        _ => None,
    }
}

/// Parses the `RATE_LIMIT_FAIL_MODE` legal value set.
fn parse_rate_limit_fail_mode(raw: &str) -> Option<RateLimitFailMode> {
    match raw {
        "closed" => Some(RateLimitFailMode::Closed),
        "open" => Some(RateLimitFailMode::Open),
        _ => None,
    }
}

/// Parses the `APPROVAL_MODE` legal value set.
fn parse_approval_mode(raw: &str) -> Option<gate_core::ApprovalMode> {
    match raw {
        "pr_label" => Some(gate_core::ApprovalMode::PrLabel),
        "workflow_dispatch" => Some(gate_core::ApprovalMode::WorkflowDispatch),
        "none" => Some(gate_core::ApprovalMode::None),
        _ => None,
    }
}

/// Parses the `TELEMETRY_TIER` legal value set.
fn parse_telemetry_tier(raw: &str) -> Option<TelemetryTier> {
    match raw {
        "off" => Some(TelemetryTier::Off),
        "tier1" => Some(TelemetryTier::Tier1),
        "tier2" => Some(TelemetryTier::Tier2),
        "tier3" => Some(TelemetryTier::Tier3),
        _ => None,
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration load/validation failure. Every variant maps to exit code
/// `2` in `gate-cli`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading the `GATE_CONFIG_FILE` escape hatch.
    #[error("config io error: {0}")]
    Io(String),
    /// The `GATE_CONFIG_FILE` document could not be parsed as TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A configured field failed to parse into its typed representation.
    #[error("invalid value for {field}: {reason}")]
    InvalidInput {
        /// The `INPUT_*` field name (without prefix).
        field: String,
        /// Human-readable reason the value was rejected.
        reason: String,
    },
    /// A cross-field invariant failed after all fields parsed individually.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// A required field in the event payload was missing or malformed.
    #[error("missing or malformed event field: {0}")]
    MissingEventField(String),
}

impl fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSource")
            .field("env_keys", &self.env.keys().count())
            .field("file_keys", &self.file.keys().count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::EnvSource;
    use super::GateConfig;
    use gate_core::ScanMode;
    use gate_core::SeverityGate;

    fn source(pairs: &[(&str, &str)]) -> EnvSource {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        EnvSource::from_maps(env, HashMap::new())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = GateConfig::from_source(&source(&[])).expect("defaults are valid");
        assert_eq!(config.scan_mode, ScanMode::PrDiff);
        assert_eq!(config.severity_gate, SeverityGate::P1);
        assert_eq!(config.max_input_tokens, super::DEFAULT_MAX_INPUT_TOKENS);
    }

    #[test]
    fn explicit_inputs_override_defaults() {
        let config = GateConfig::from_source(&source(&[
            ("INPUT_SCAN_MODE", "deep"),
            ("INPUT_SEVERITY_GATE", "none"),
        ]))
        .expect("valid config");
        assert_eq!(config.scan_mode, ScanMode::Deep);
        assert_eq!(config.severity_gate, SeverityGate::None);
    }

    #[test]
    fn invalid_scan_mode_is_rejected() {
        let err = GateConfig::from_source(&source(&[("INPUT_SCAN_MODE", "bogus")])).unwrap_err();
        assert!(matches!(err, super::ConfigError::InvalidInput { field, .. } if field == "SCAN_MODE"));
    }

    #[test]
    #[allow(clippy::use_debug, reason = "asserting secrets are masked requires rendering Debug")]
    fn secrets_never_appear_in_debug_output() {
        let config = GateConfig::from_source(&source(&[
            ("INPUT_GITHUB_TOKEN", "ghp_abc123"),
            ("INPUT_LLM_API_KEY", "sk-supersecret"),
        ]))
        .expect("valid config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_abc123"));
        assert!(!rendered.contains("sk-supersecret"));
    }

    #[test]
    fn zero_max_input_tokens_fails_validation() {
        let err =
            GateConfig::from_source(&source(&[("INPUT_MAX_INPUT_TOKENS", "0")])).unwrap_err();
        assert!(matches!(err, super::ConfigError::Invalid(_)));
    }
}
