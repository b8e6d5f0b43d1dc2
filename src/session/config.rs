//! Session configuration

use std::env;

use crate::render::RendererConfig;

/// Configuration for one reader session, passed in explicitly at session
/// start. Nothing here lives in module-wide globals, so independent viewer
/// instances (and tests) never share state.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the parsing/translation backend, e.g. `http://host/api`.
    pub api_base: String,
    /// Target language for translation operations.
    pub default_target_lang: String,
    /// Raster backend configuration. Its `default_scale` is the session's
    /// initial render scale.
    pub renderer: RendererConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            api_base: "http://localhost:5000/api".to_string(),
            default_target_lang: "zh".to_string(),
            renderer: RendererConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        SessionConfig {
            api_base: env::var("LECTOR_API_BASE").unwrap_or(defaults.api_base),
            default_target_lang: env::var("LECTOR_TARGET_LANG")
                .unwrap_or(defaults.default_target_lang),
            renderer: RendererConfig {
                worker_src: env::var("LECTOR_WORKER_SRC").ok(),
                default_scale: env::var("LECTOR_SCALE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.renderer.default_scale),
                ..defaults.renderer
            },
        }
    }
}
