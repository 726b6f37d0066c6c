//! Viewer page rendering.

use map_common::{ViewerError, ViewerResult};
use tera::{Context, Tera};

use crate::viewer_config::ViewerConfig;

const VIEWER_TEMPLATE: &str = "viewer.html";

/// Compiled page templates.
pub struct ViewerTemplates {
    tera: Tera,
}

impl ViewerTemplates {
    pub fn new() -> ViewerResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(VIEWER_TEMPLATE, include_str!("../templates/viewer.html"))
            .map_err(|e| ViewerError::Configuration(format!("invalid viewer template: {}", e)))?;
        Ok(Self { tera })
    }

    /// Render the viewer HTML for `config`.
    pub fn render_viewer(&self, config: &ViewerConfig) -> ViewerResult<String> {
        let json = serde_json::to_string(config)
            .map_err(|e| ViewerError::Configuration(format!("cannot serialize viewer config: {}", e)))?
            // Keep the JSON from closing the surrounding <script> element
            .replace("</", "<\\/");

        let scales: Vec<String> = config.scales.iter().map(u64::to_string).collect();
        let extent = config.extent.to_string();

        let mut context = Context::new();
        context.insert("config", config);
        context.insert("config_json", &json);
        context.insert("scales_text", &scales.join(","));
        context.insert("extent_text", &extent);

        self.tera
            .render(VIEWER_TEMPLATE, &context)
            .map_err(|e| ViewerError::Configuration(format!("cannot render viewer page: {}", e)))
    }
}
