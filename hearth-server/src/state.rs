use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context as _, Result};
use hearth_core::{markdown, Config, RenderResult, TemplateSet};

/// A markdown document bound to a route. Resolved once when the state is
/// built: a missing source stays a 404 for the lifetime of the process
/// (unless `content.reload` re-reads it per request).
#[derive(Debug, Clone)]
pub enum PreparedDoc {
    Ready(RenderResult),
    Missing,
}

/// Everything the handlers need, built once before serving and shared
/// read-only across requests.
pub struct AppState {
    pub config: Config,
    pub templates: TemplateSet,
    /// URL pattern -> (source path, prepared render).
    pub docs: HashMap<String, (String, PreparedDoc)>,
    pub start: Instant,
    pub cmd: String,
}

/// Templates every deployment must provide on top of the configured
/// endpoint templates.
const REQUIRED_TEMPLATES: [&str; 3] = ["markdown.html", "article.html", "blog.html"];

impl AppState {
    pub fn build(config: Config) -> Result<Self> {
        let templates = TemplateSet::from_glob(&config.content.templates)
            .with_context(|| format!("failed to load templates from {}", config.content.templates))?;

        // Catch unknown template names before the first request.
        templates
            .verify(
                config
                    .endpoints
                    .values()
                    .map(String::as_str)
                    .chain(REQUIRED_TEMPLATES),
            )
            .context("route table references a template that was not loaded")?;

        let mut docs = HashMap::new();
        for (pattern, source) in &config.documents {
            // Any failed source read leaves the route answering 404 for
            // the life of the process; startup only fails for template
            // or config problems.
            let doc = match markdown::render_file(source) {
                Ok(result) => PreparedDoc::Ready(result),
                Err(err) => {
                    tracing::warn!("source {} for {} is unreadable ({}), route will 404", source, pattern, err);
                    PreparedDoc::Missing
                }
            };
            docs.insert(pattern.clone(), (source.clone(), doc));
        }

        let cmd = std::env::args().next().unwrap_or_else(|| "hearth".to_string());

        Ok(Self {
            config,
            templates,
            docs,
            start: Instant::now(),
            cmd,
        })
    }

    /// Whole seconds since process start, rounded. Recomputed on every
    /// call, never cached.
    pub fn uptime(&self) -> u64 {
        self.start.elapsed().as_secs_f64().round() as u64
    }
}
