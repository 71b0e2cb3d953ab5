use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Config, Mode};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub ranking: Option<RankingConfig>,
    pub snippet: Option<SnippetConfig>,
    pub headings: Option<HeadingsConfig>,
    pub refiner: Option<RefinerConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// `"pages"` or `"sections"`.
    pub mode: Option<String>,
    pub top_k: Option<usize>,
    /// Document-frequency cutoff; `1.0` disables pruning.
    pub max_df: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetConfig {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingsConfig {
    /// `"layout"` or `"average-size"`.
    pub strategy: Option<String>,
    pub size_ratio: Option<f32>,
    pub max_heading_chars: Option<usize>,
    pub max_section_chars: Option<usize>,
    pub require_title_case: Option<bool>,
    pub average_size_threshold: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefinerConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub indent: Option<usize>,
    pub include_timestamp: Option<bool>,
    pub config_file_name: Option<String>,
    pub output_file_name: Option<String>,
    pub output_dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/docrank/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docrank").join("config.toml"))
}

/// Load config by cascading CWD `.docrank.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".docrank.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

fn pick<T>(overlay: Option<T>, base: Option<T>) -> Option<T> {
    overlay.or(base)
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (rb, ro) = (base.ranking.unwrap_or_default(), overlay.ranking.unwrap_or_default());
    let (sb, so) = (base.snippet.unwrap_or_default(), overlay.snippet.unwrap_or_default());
    let (hb, ho) = (base.headings.unwrap_or_default(), overlay.headings.unwrap_or_default());
    let (fb, fo) = (base.refiner.unwrap_or_default(), overlay.refiner.unwrap_or_default());
    let (ob, oo) = (base.output.unwrap_or_default(), overlay.output.unwrap_or_default());

    ConfigFile {
        ranking: Some(RankingConfig {
            mode: pick(ro.mode, rb.mode),
            top_k: pick(ro.top_k, rb.top_k),
            max_df: pick(ro.max_df, rb.max_df),
        }),
        snippet: Some(SnippetConfig {
            limit: pick(so.limit, sb.limit),
        }),
        headings: Some(HeadingsConfig {
            strategy: pick(ho.strategy, hb.strategy),
            size_ratio: pick(ho.size_ratio, hb.size_ratio),
            max_heading_chars: pick(ho.max_heading_chars, hb.max_heading_chars),
            max_section_chars: pick(ho.max_section_chars, hb.max_section_chars),
            require_title_case: pick(ho.require_title_case, hb.require_title_case),
            average_size_threshold: pick(ho.average_size_threshold, hb.average_size_threshold),
        }),
        refiner: Some(RefinerConfig {
            enabled: pick(fo.enabled, fb.enabled),
            base_url: pick(fo.base_url, fb.base_url),
            model: pick(fo.model, fb.model),
            timeout_secs: pick(fo.timeout_secs, fb.timeout_secs),
            max_retries: pick(fo.max_retries, fb.max_retries),
        }),
        output: Some(OutputConfig {
            indent: pick(oo.indent, ob.indent),
            include_timestamp: pick(oo.include_timestamp, ob.include_timestamp),
            config_file_name: pick(oo.config_file_name, ob.config_file_name),
            output_file_name: pick(oo.output_file_name, ob.output_file_name),
            output_dir: pick(oo.output_dir, ob.output_dir),
        }),
    }
}

impl ConfigFile {
    /// The mode named in `[ranking]`, if present and valid.
    pub fn mode(&self) -> Option<Mode> {
        let raw = self.ranking.as_ref()?.mode.as_deref()?;
        match raw.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid mode in config file");
                None
            }
        }
    }

    /// Build a runtime [`Config`] for `mode`, overriding its defaults with
    /// every value present in this file.
    pub fn to_config(&self, mode: Mode) -> Config {
        let mut config = Config::for_mode(mode);

        if let Some(r) = &self.ranking {
            if let Some(k) = r.top_k {
                config.top_k = k;
            }
            if let Some(df) = r.max_df {
                config.max_df = if df >= 1.0 { None } else { Some(df) };
            }
        }
        if let Some(limit) = self.snippet.as_ref().and_then(|s| s.limit) {
            config.snippet_limit = limit;
        }
        if let Some(f) = &self.refiner {
            if let Some(enabled) = f.enabled {
                config.refiner.enabled = enabled;
            }
            if let Some(url) = &f.base_url {
                config.refiner.base_url = url.clone();
            }
            if let Some(model) = &f.model {
                config.refiner.model = model.clone();
            }
            if let Some(t) = f.timeout_secs {
                config.refiner.timeout_secs = t;
            }
            if let Some(n) = f.max_retries {
                config.refiner.max_retries = n;
            }
        }
        if let Some(o) = &self.output {
            if let Some(indent) = o.indent {
                config.json_indent = indent;
            }
            if let Some(ts) = o.include_timestamp {
                config.include_timestamp = ts;
            }
            if let Some(name) = &o.config_file_name {
                config.config_file_name = name.clone();
            }
            if let Some(name) = &o.output_file_name {
                config.output_file_name = name.clone();
            }
            if let Some(dir) = &o.output_dir {
                config.output_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_parses() {
        let toml_str = "[ranking]\ntop_k = 3\n\n[refiner]\nmodel = \"llama3\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.ranking.unwrap().top_k, Some(3));
        assert_eq!(parsed.refiner.unwrap().model.as_deref(), Some("llama3"));
        assert!(parsed.headings.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            ranking: Some(RankingConfig {
                top_k: Some(10),
                max_df: Some(0.8),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            ranking: Some(RankingConfig {
                top_k: Some(3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        let ranking = merged.ranking.unwrap();
        assert_eq!(ranking.top_k, Some(3));
        assert_eq!(ranking.max_df, Some(0.8));
    }

    #[test]
    fn to_config_overrides_mode_defaults() {
        let file = ConfigFile {
            ranking: Some(RankingConfig {
                max_df: Some(1.0),
                ..Default::default()
            }),
            snippet: Some(SnippetConfig { limit: Some(120) }),
            output: Some(OutputConfig {
                include_timestamp: Some(true),
                output_dir: Some("/tmp/out".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = file.to_config(Mode::Pages);
        assert_eq!(config.max_df, None);
        assert_eq!(config.snippet_limit, 120);
        assert!(config.include_timestamp);
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn invalid_mode_is_ignored() {
        let file = ConfigFile {
            ranking: Some(RankingConfig {
                mode: Some("chapters".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(file.mode(), None);
    }

    #[test]
    fn round_trip_toml() {
        let file = ConfigFile {
            headings: Some(HeadingsConfig {
                size_ratio: Some(0.75),
                strategy: Some("average-size".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&file).unwrap();
        let parsed: ConfigFile = toml::from_str(&text).unwrap();
        assert_eq!(parsed, file);
    }
}
