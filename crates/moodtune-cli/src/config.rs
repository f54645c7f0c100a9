use moodtune_core::mood::{DEFAULT_MAPPING_FILE, DEFAULT_PLAYLIST_URL};
use moodtune_core::report::DEFAULT_OUTPUT_FILE;
use moodtune_core::{CommandAnalyzer, FaceAnalyzer, OnnxAnalyzer, RunSettings};
use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON file mapping emotion labels to playlist URLs.
    pub mapping_path: PathBuf,
    /// Where the analysis record is written.
    pub output_path: PathBuf,
    /// Playlist used when the dominant emotion is not mapped.
    pub default_playlist: String,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// External analysis command; replaces the ONNX analyzer when set.
    pub analyzer_cmd: Option<String>,
}

impl Config {
    /// Load configuration from `MOODTUNE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        // Empty values count as unset.
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        Self {
            mapping_path: var("MOODTUNE_PLAYLIST_MAPPING")
                .unwrap_or_else(|| DEFAULT_MAPPING_FILE.to_string())
                .into(),
            output_path: var("MOODTUNE_OUTPUT")
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string())
                .into(),
            default_playlist: var("MOODTUNE_DEFAULT_PLAYLIST")
                .unwrap_or_else(|| DEFAULT_PLAYLIST_URL.to_string()),
            model_dir: var("MOODTUNE_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(moodtune_core::default_model_dir),
            analyzer_cmd: var("MOODTUNE_ANALYZER_CMD"),
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            mapping_path: self.mapping_path.clone(),
            output_path: self.output_path.clone(),
            default_playlist: self.default_playlist.clone(),
        }
    }

    /// Build the configured analyzer backend.
    pub fn analyzer(&self) -> Box<dyn FaceAnalyzer> {
        match self.analyzer_cmd.as_deref().and_then(CommandAnalyzer::from_command_line) {
            Some(command) => {
                tracing::info!(program = command.program(), "using external analysis command");
                Box::new(command)
            }
            None => {
                tracing::info!(model_dir = %self.model_dir.display(), "using ONNX analyzer");
                Box::new(OnnxAnalyzer::new(&self.model_dir))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.mapping_path, PathBuf::from("mood_playlist_mapping_soundcloud.json"));
        assert_eq!(config.output_path, PathBuf::from("face_analyse.json"));
        assert_eq!(config.default_playlist, "https://soundcloud.com/search?q=default playlist");
        assert!(config.model_dir.ends_with("moodtune/models"));
        assert_eq!(config.analyzer_cmd, None);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("MOODTUNE_PLAYLIST_MAPPING", "/etc/moodtune/mapping.json"),
            ("MOODTUNE_OUTPUT", "/tmp/out.json"),
            ("MOODTUNE_DEFAULT_PLAYLIST", "https://example.com/chill"),
            ("MOODTUNE_MODEL_DIR", "/opt/models"),
            ("MOODTUNE_ANALYZER_CMD", "python3 analyze.py"),
        ]);
        assert_eq!(config.mapping_path, PathBuf::from("/etc/moodtune/mapping.json"));
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.json"));
        assert_eq!(config.default_playlist, "https://example.com/chill");
        assert_eq!(config.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(config.analyzer_cmd.as_deref(), Some("python3 analyze.py"));

        let settings = config.run_settings();
        assert_eq!(settings.output_path, PathBuf::from("/tmp/out.json"));
        assert_eq!(settings.default_playlist, "https://example.com/chill");
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = config_from(&[("MOODTUNE_DEFAULT_PLAYLIST", ""), ("MOODTUNE_ANALYZER_CMD", "  ")]);
        assert_eq!(config.default_playlist, DEFAULT_PLAYLIST_URL);
        assert_eq!(config.analyzer_cmd, None);
    }
}
