use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::text::{DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub embedding: EmbeddingConfig,
    pub detection: DetectionConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CURATOR_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CURATOR_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            embedding: EmbeddingConfig::from_env_profiled(p),
            detection: DetectionConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  llm:         provider={}, configured={}", self.llm.provider, self.llm.is_configured());
        tracing::info!("  ollama:      url={}", self.ollama.url);
        tracing::info!(
            "  embedding:   provider={}, dimensions={}",
            self.embedding.provider,
            self.embedding.dimensions
        );
        tracing::info!(
            "  detection:   length={}..={}, k={}, metric={}, timeout={}s",
            self.detection.min_length,
            self.detection.max_length,
            self.detection.k,
            self.detection.similarity_metric,
            self.detection.timeout_secs
        );
    }
}

// ── LLM (OpenAI / Anthropic) ─────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "openai"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.0),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 1024),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" | "claude" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub embedding_model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
            embedding_model: profiled_env_or(p, "OLLAMA_EMBEDDING_MODEL", "nomic-embed-text"),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "hashing", "ollama", "openai"
    pub provider: String,
    pub dimensions: u32,
    /// Model name for the OpenAI-compatible backend.
    pub model: String,
    /// LRU capacity for text → vector caching; 0 disables the cache.
    pub cache_size: u32,
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "EMBEDDING_PROVIDER", "hashing"),
            dimensions: profiled_env_parse(p, "EMBEDDING_DIMENSIONS", 768),
            model: profiled_env_or(p, "EMBEDDING_MODEL", "text-embedding-3-small"),
            cache_size: profiled_env_parse(p, "EMBEDDING_CACHE_SIZE", 1024),
        }
    }
}

// ── Detection workflow ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Number of similar historical cases to retrieve.
    pub k: usize,
    /// Score function for the case index: "cosine", "dot" or "euclidean".
    pub similarity_metric: String,
    /// Per-capability call timeout.
    pub timeout_secs: u64,
    /// Drop neighbours scoring below this similarity.
    pub min_similarity: Option<f32>,
    pub generate_summary: bool,
    /// Add confirmed fraud cases to the index after each run.
    pub remember_cases: bool,
    /// Normalized similarity needed for a fuzzy fraud-type match.
    pub fuzzy_match_threshold: f64,
    /// Optional JSON file backing the fraud type registry.
    pub fraud_types_path: Option<PathBuf>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            k: 3,
            similarity_metric: "cosine".to_string(),
            timeout_secs: 30,
            min_similarity: None,
            generate_summary: true,
            remember_cases: false,
            fuzzy_match_threshold: 0.85,
            fraud_types_path: None,
        }
    }
}

impl DetectionConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            min_length: profiled_env_parse(p, "MIN_TEXT_LENGTH", d.min_length),
            max_length: profiled_env_parse(p, "MAX_TEXT_LENGTH", d.max_length),
            k: profiled_env_parse(p, "SIMILAR_CASES_K", d.k),
            similarity_metric: profiled_env_or(p, "SIMILARITY_METRIC", &d.similarity_metric)
                .to_lowercase(),
            timeout_secs: profiled_env_parse(p, "CAPABILITY_TIMEOUT_SECS", d.timeout_secs),
            min_similarity: profiled_env_opt(p, "MIN_SIMILARITY").and_then(|v| v.parse().ok()),
            generate_summary: profiled_env_bool(p, "GENERATE_SUMMARY", d.generate_summary),
            remember_cases: profiled_env_bool(p, "REMEMBER_CASES", d.remember_cases),
            fuzzy_match_threshold: profiled_env_parse(
                p,
                "FUZZY_MATCH_THRESHOLD",
                d.fuzzy_match_threshold,
            ),
            fraud_types_path: profiled_env_opt(p, "FRAUD_TYPES_PATH").map(PathBuf::from),
        }
    }
}
