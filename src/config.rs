use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const FIELDS_BY_ORDER_PATH: &str = "/api/fields-by-order";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub upstream: UpstreamConfig,
    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path_ref = path.as_ref();

        let contents = fs::read_to_string(path_ref)
            .map_err(|e| format!("Failed to read config file '{}': {}", path_ref.display(), e))?;

        let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
            format!(
                "Failed to parse config file '{}': {}",
                path_ref.display(),
                e
            )
        })?;

        Ok(config)
    }

    /// Config pointing at `base_url` with the default route table
    pub fn with_upstream(base_url: impl Into<String>) -> Self {
        Self {
            upstream: UpstreamConfig {
                base_url: base_url.into(),
                timeout_secs: None,
            },
            routes: default_routes(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.upstream.validate()?;

        if self.routes.is_empty() {
            return Err("Config must have at least one route".to_string());
        }

        let mut seen = HashSet::new();
        for (idx, route) in self.routes.iter().enumerate() {
            if let Err(e) = route.validate() {
                return Err(format!("Route {}: {}", idx, e));
            }
            if !seen.insert(route.path.as_str()) {
                return Err(format!("Route {}: duplicate path {}", idx, route.path));
            }
        }

        Ok(())
    }

    pub fn find_route(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl UpstreamConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("upstream.base_url cannot be empty".to_string());
        }

        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| format!("upstream.base_url is not a valid URL: {}", e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!(
                "upstream.base_url must use http or https, got {}",
                parsed.scheme()
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err("upstream.timeout_secs must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    #[serde(default)]
    pub required_params: Vec<String>,
    #[serde(default)]
    pub upstream_path: Option<String>,
}

impl Route {
    fn validate(&self) -> Result<(), String> {
        if !self.path.starts_with('/') {
            return Err(format!("path must start with '/': {}", self.path));
        }

        if let Some(upstream_path) = &self.upstream_path {
            if !upstream_path.starts_with('/') {
                return Err(format!(
                    "upstream_path must start with '/': {}",
                    upstream_path
                ));
            }
        }

        if self.required_params.iter().any(|p| p.trim().is_empty()) {
            return Err("required_params cannot contain empty names".to_string());
        }

        Ok(())
    }

    pub fn matches(&self, path: &str) -> bool {
        // Tolerate a single trailing slash on the inbound path
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        self.path == path
    }

    /// Path appended to the upstream base URL
    pub fn upstream_path(&self) -> &str {
        self.upstream_path.as_deref().unwrap_or(&self.path)
    }
}

fn default_routes() -> Vec<Route> {
    vec![Route {
        path: FIELDS_BY_ORDER_PATH.to_string(),
        required_params: vec!["orderId".to_string()],
        upstream_path: None,
    }]
}
