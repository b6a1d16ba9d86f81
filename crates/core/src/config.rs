//! Configuration management for Guidebot.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.guidebot/config.yaml` or `GUIDEBOT_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Relative paths are resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the generation boundary knows how to reach.
pub const KNOWN_PROVIDERS: [&str; 1] = ["ollama"];

/// Embedding backends the knowledge crate can construct.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .guidebot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Primary knowledge document (plain text)
    pub document_path: PathBuf,

    /// FAQ source document
    pub faq_path: PathBuf,

    /// SQLite file holding persisted semantic indexes
    pub index_path: PathBuf,

    /// Generation provider (e.g., "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Generation provider endpoint
    pub endpoint: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub retrieval: RetrievalSettings,

    pub generation: GenerationSettings,

    pub translation: TranslationSettings,

    /// Embedder used for document chunks and user queries against them
    pub document_embedding: EmbeddingSettings,

    /// Embedder used for FAQ questions and user queries against them
    pub faq_embedding: EmbeddingSettings,
}

/// Chunking and retrieval knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Number of chunks fed to generation
    pub top_k: usize,

    /// Number of FAQ questions suggested on an ungrounded answer
    pub suggestion_k: usize,

    /// Load a matching persisted index instead of re-embedding
    pub reuse_persisted_index: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 300,
            top_k: 4,
            suggestion_k: 5,
            reuse_persisted_index: true,
        }
    }
}

/// Sampling parameters for answer generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,

    /// Sequences that end generation early
    pub stop: Vec<String>,

    /// Upper bound on a single generation call
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: 1000,
            top_p: 0.98,
            top_k: 50,
            stop: Vec::new(),
            timeout_secs: 60,
        }
    }
}

/// Translation overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslationSettings {
    /// Language the knowledge base is written in
    pub source_language: String,

    /// Upper bound on a single translation call
    pub timeout_secs: u64,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            timeout_secs: 20,
        }
    }
}

/// Embedding model selection.
///
/// Vectors are only comparable when produced under identical settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Endpoint for remote providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

impl EmbeddingSettings {
    /// Validate that vectors produced under `other` are comparable with ours.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::Embedding(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::Embedding(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Embedding(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    sources: Option<SourcesSection>,
    generation: Option<GenerationSection>,
    retrieval: Option<RetrievalSettings>,
    translation: Option<TranslationSettings>,
    embeddings: Option<EmbeddingsSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourcesSection {
    document: Option<PathBuf>,
    faq: Option<PathBuf>,
    index: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerationSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(flatten)]
    sampling: GenerationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingsSection {
    document: Option<EmbeddingSettings>,
    faq: Option<EmbeddingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::for_workspace(workspace)
    }
}

impl AppConfig {
    /// Default configuration rooted at `workspace`.
    pub fn for_workspace(workspace: PathBuf) -> Self {
        Self {
            document_path: workspace.join("JJM_Operational_Guidelines.txt"),
            faq_path: workspace.join("faq.txt"),
            index_path: workspace.join(".guidebot").join("index.sqlite"),
            workspace,
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
            retrieval: RetrievalSettings::default(),
            generation: GenerationSettings::default(),
            translation: TranslationSettings::default(),
            document_embedding: EmbeddingSettings::default(),
            faq_embedding: EmbeddingSettings::default(),
        }
    }

    /// Load configuration from defaults, the config file and environment.
    ///
    /// Environment variables:
    /// - `GUIDEBOT_WORKSPACE`: Override workspace path
    /// - `GUIDEBOT_CONFIG`: Path to config file
    /// - `GUIDEBOT_PROVIDER`: Generation provider
    /// - `GUIDEBOT_MODEL`: Generation model
    /// - `GUIDEBOT_ENDPOINT`: Generation endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use guidebot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Document: {:?}", config.document_path);
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let workspace = workspace
            .or_else(|| std::env::var_os("GUIDEBOT_WORKSPACE").map(PathBuf::from))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        if !workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                workspace
            )));
        }

        let mut config = Self::for_workspace(workspace);
        config.config_file =
            config_file.or_else(|| std::env::var_os("GUIDEBOT_CONFIG").map(PathBuf::from));

        let config_path = match config.config_file {
            Some(ref cf) => config.resolve(cf),
            None => config.guidebot_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        if let Ok(provider) = std::env::var("GUIDEBOT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("GUIDEBOT_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("GUIDEBOT_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        self.apply_file(file);
        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(sources) = file.sources {
            if let Some(document) = sources.document {
                self.document_path = self.resolve(&document);
            }
            if let Some(faq) = sources.faq {
                self.faq_path = self.resolve(&faq);
            }
            if let Some(index) = sources.index {
                self.index_path = self.resolve(&index);
            }
        }

        if let Some(generation) = file.generation {
            if let Some(provider) = generation.provider {
                self.provider = provider;
            }
            if let Some(model) = generation.model {
                self.model = model;
            }
            if let Some(endpoint) = generation.endpoint {
                self.endpoint = endpoint;
            }
            self.generation = generation.sampling;
        }

        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }

        if let Some(translation) = file.translation {
            self.translation = translation;
        }

        if let Some(embeddings) = file.embeddings {
            if let Some(document) = embeddings.document {
                self.document_embedding = document;
            }
            if let Some(faq) = embeddings.faq {
                self.faq_embedding = faq;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a possibly relative path against the workspace.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get the path to the .guidebot directory.
    pub fn guidebot_dir(&self) -> PathBuf {
        self.workspace.join(".guidebot")
    }

    /// Validate configuration before any service is constructed.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        for (label, settings) in [
            ("document", &self.document_embedding),
            ("faq", &self.faq_embedding),
        ] {
            if !KNOWN_EMBEDDING_PROVIDERS.contains(&settings.provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown {} embedding provider: {}. Supported: {}",
                    label,
                    settings.provider,
                    KNOWN_EMBEDDING_PROVIDERS.join(", ")
                )));
            }
            if settings.dimensions == 0 {
                return Err(AppError::Config(format!(
                    "{} embedding dimensions must be positive",
                    label
                )));
            }
        }

        let retrieval = &self.retrieval;
        if retrieval.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }
        if retrieval.chunk_overlap >= retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                retrieval.chunk_overlap, retrieval.chunk_size
            )));
        }
        if retrieval.top_k == 0 || retrieval.suggestion_k == 0 {
            return Err(AppError::Config(
                "topK and suggestionK must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
