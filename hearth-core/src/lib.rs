pub mod blog;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod meta;
pub mod template;

// Re-export main types
pub use blog::{BlogEntry, BlogError};
pub use config::Config;
pub use markdown::{render, render_file, RenderError, RenderResult};
pub use meta::{DocDate, DocMeta, MetaError};
pub use template::{TemplateError, TemplateSet};
