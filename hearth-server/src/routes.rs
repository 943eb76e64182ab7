use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tera::Context;
use tower_http::{services::ServeDir, trace::TraceLayer};

use hearth_core::{blog, markdown, BlogError, RenderError, RenderResult, TemplateError};

use crate::state::{AppState, PreparedDoc};

/// Request-scoped failures. Everything is recovered here and turned into
/// a status code; nothing propagates past the handler layer.
#[derive(Debug)]
pub enum PageError {
    NotFound,
    Render(RenderError),
    Template(TemplateError),
    Blog(BlogError),
}

impl From<TemplateError> for PageError {
    fn from(err: TemplateError) -> Self {
        PageError::Template(err)
    }
}

impl From<BlogError> for PageError {
    fn from(err: BlogError) -> Self {
        PageError::Blog(err)
    }
}

impl From<RenderError> for PageError {
    fn from(err: RenderError) -> Self {
        if err.is_not_found() {
            PageError::NotFound
        } else {
            PageError::Render(err)
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => (StatusCode::NOT_FOUND, "404 page not found\n").into_response(),
            PageError::Render(err) => {
                tracing::error!("markdown render failed: {}", err);
                internal_error()
            }
            PageError::Template(err) => {
                tracing::error!("template render failed: {}", err);
                internal_error()
            }
            PageError::Blog(err) => {
                tracing::error!("blog index failed: {}", err);
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error\n").into_response()
}

/// Builds the full route table from the configuration. Endpoints and
/// documents are exact matches; `/static` and `/blog` are the only
/// prefix-matched namespaces.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/blog/", get(blog_index))
        .route("/blog/{slug}", get(blog_article))
        .nest_service("/static", ServeDir::new(&state.config.content.static_dir));

    for (pattern, template) in &state.config.endpoints {
        let template = template.clone();
        tracing::info!("added template '{}' for pattern '{}'", template, pattern);
        app = app.route(
            pattern,
            get(move |state: State<Arc<AppState>>| endpoint(state, template)),
        );
    }

    for pattern in state.config.documents.keys() {
        let key = pattern.clone();
        app = app.route(
            pattern,
            get(move |state: State<Arc<AppState>>| document(state, key)),
        );
    }

    app.fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Base context every page gets: uptime and the process name.
fn page_context(state: &AppState) -> Context {
    let mut ctx = Context::new();
    ctx.insert("uptime", &state.uptime());
    ctx.insert("cmd", &state.cmd);
    ctx
}

async fn endpoint(
    State(state): State<Arc<AppState>>,
    template: String,
) -> Result<Html<String>, PageError> {
    let ctx = page_context(&state);
    Ok(Html(state.templates.render(&template, &ctx)?))
}

async fn document(
    State(state): State<Arc<AppState>>,
    pattern: String,
) -> Result<Html<String>, PageError> {
    let Some((source, doc)) = state.docs.get(&pattern) else {
        return Err(PageError::NotFound);
    };

    if state.config.content.reload {
        let result = markdown::render_file(source)?;
        return render_document(&state, "markdown.html", &result);
    }

    match doc {
        PreparedDoc::Ready(result) => render_document(&state, "markdown.html", result),
        PreparedDoc::Missing => Err(PageError::NotFound),
    }
}

async fn blog_index(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let entries = blog::scan(&state.config.content.blog_dir)?;
    let mut ctx = page_context(&state);
    ctx.insert("blogEntries", &entries);
    Ok(Html(state.templates.render("blog.html", &ctx)?))
}

async fn blog_article(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    // The extractor percent-decodes, so "..%2F" arrives as "../". A slug
    // is a bare file stem; anything with a separator stays out of the
    // filesystem join.
    if slug.contains(['/', '\\']) {
        return Err(PageError::NotFound);
    }
    let path = PathBuf::from(&state.config.content.blog_dir).join(format!("{}.md", slug));
    let result = markdown::render_file(path)?;
    render_document(&state, "article.html", &result)
}

fn render_document(
    state: &AppState,
    template: &str,
    result: &RenderResult,
) -> Result<Html<String>, PageError> {
    let mut ctx = page_context(state);
    // Trusted fragment: the renderer already did the sanitizing, the
    // template embeds it with `| safe`.
    ctx.insert("markdown", &result.html);
    if let Some(title) = result.fields.get("Title") {
        ctx.insert("title", title);
    }
    Ok(Html(state.templates.render(template, &ctx)?))
}

async fn not_found() -> PageError {
    PageError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use hearth_core::Config;
    use std::fs;
    use std::path::Path as StdPath;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write(path: &StdPath, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn site_config(tmp: &TempDir) -> Config {
        let root = tmp.path();
        write(&root.join("templates/index.html"), "home uptime={{ uptime }} cmd={{ cmd }}");
        write(&root.join("templates/contact.html"), "contact page");
        write(
            &root.join("templates/markdown.html"),
            "{% if title is defined %}[{{ title }}]{% endif %}{{ markdown | safe }}",
        );
        write(
            &root.join("templates/article.html"),
            "article {% if title is defined %}[{{ title }}]{% endif %}{{ markdown | safe }}",
        );
        write(
            &root.join("templates/blog.html"),
            "{% for e in blogEntries %}{{ e.slug }}|{{ e.title }}|{{ e.date }};{% endfor %}",
        );
        write(
            &root.join("content/resume.md"),
            "---\nTitle: Resume\n---\n# Work\n",
        );
        write(
            &root.join("content/blog/first.md"),
            "---\nTitle: First\nDate: 01/01/2023\n---\nHello.\n",
        );
        write(
            &root.join("content/blog/second.md"),
            "---\nTitle: Second\nDate: 01/01/2024\n---\nAgain.\n",
        );
        write(&root.join("content/blog/notes.txt"), "not a post");
        fs::create_dir_all(root.join("content/blog/drafts")).unwrap();
        write(&root.join("static/style.css"), "body {}");

        let mut config = Config::default();
        config.content.templates = format!("{}/templates/*.html", root.display());
        config.content.static_dir = root.join("static").display().to_string();
        config.content.blog_dir = root.join("content/blog").display().to_string();
        config
            .documents
            .insert("/resume".to_string(), root.join("content/resume.md").display().to_string());
        config
    }

    fn build_router(config: Config) -> Router {
        router(Arc::new(AppState::build(config).unwrap()))
    }

    async fn get_page(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn fixed_endpoints_render_their_template() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));

        let (status, body) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("home uptime="));

        let (status, body) = get_page(&app, "/contact").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "contact page");
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));

        let (status, _) = get_page(&app, "/nonexistent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn resume_renders_markdown_with_title() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));

        let (status, body) = get_page(&app, "/resume").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("[Resume]"));
        assert!(body.contains("<h1 id=\"work\">Work</h1>"));
    }

    #[tokio::test]
    async fn missing_document_source_stays_404() {
        let tmp = TempDir::new().unwrap();
        let mut config = site_config(&tmp);
        config.documents.insert(
            "/resume".to_string(),
            tmp.path().join("content/absent.md").display().to_string(),
        );
        let app = build_router(config);

        let (status, _) = get_page(&app, "/resume").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreadable_document_source_is_404_not_a_startup_failure() {
        let tmp = TempDir::new().unwrap();
        let config = site_config(&tmp);
        // Not valid UTF-8, so the startup render fails without the file
        // being absent.
        fs::write(tmp.path().join("content/resume.md"), [0x68, 0x69, 0xff, 0xfe]).unwrap();
        let app = build_router(config);

        let (status, _) = get_page(&app, "/resume").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn document_is_bound_once_without_reload() {
        let tmp = TempDir::new().unwrap();
        let config = site_config(&tmp);
        let resume = tmp.path().join("content/resume.md");
        let app = build_router(config);

        write(&resume, "---\nTitle: Changed\n---\nNew text.\n");
        let (_, body) = get_page(&app, "/resume").await;
        assert!(body.contains("[Resume]"), "edit must not show without reload");
    }

    #[tokio::test]
    async fn reload_picks_up_edits_per_request() {
        let tmp = TempDir::new().unwrap();
        let mut config = site_config(&tmp);
        config.content.reload = true;
        let resume = tmp.path().join("content/resume.md");
        let app = build_router(config);

        write(&resume, "---\nTitle: Changed\n---\nNew text.\n");
        let (_, body) = get_page(&app, "/resume").await;
        assert!(body.contains("[Changed]"));
    }

    #[tokio::test]
    async fn blog_index_lists_markdown_entries_in_date_order() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));

        let (status, body) = get_page(&app, "/blog/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "first|First|01 Jan 2023;second|Second|01 Jan 2024;"
        );
    }

    #[tokio::test]
    async fn blog_index_reflects_new_files_on_next_request() {
        let tmp = TempDir::new().unwrap();
        let config = site_config(&tmp);
        let blog_dir = tmp.path().join("content/blog");
        let app = build_router(config);

        let (_, body) = get_page(&app, "/blog/").await;
        assert!(!body.contains("third"));

        write(
            &blog_dir.join("third.md"),
            "---\nTitle: Third\nDate: 01/01/2025\n---\nMore.\n",
        );
        let (_, body) = get_page(&app, "/blog/").await;
        assert!(body.contains("third|Third|01 Jan 2025"));
    }

    #[tokio::test]
    async fn blog_article_renders_by_slug() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));

        let (status, body) = get_page(&app, "/blog/first").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("article [First]"));
        assert!(body.contains("<p>Hello.</p>"));
    }

    #[tokio::test]
    async fn encoded_separators_cannot_escape_the_blog_dir() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));
        // Readable by the process, but outside the blog directory.
        write(
            &tmp.path().join("content/secret.md"),
            "---\nTitle: Secret\n---\nhidden\n",
        );

        let (status, body) = get_page(&app, "/blog/..%2Fsecret").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("hidden"));

        let (status, _) = get_page(&app, "/blog/..%5Csecret").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_blog_article_is_404_not_500() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));

        let (status, _) = get_page(&app, "/blog/missing-slug").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_blog_directory_is_a_scoped_500() {
        let tmp = TempDir::new().unwrap();
        let mut config = site_config(&tmp);
        config.content.blog_dir = tmp.path().join("gone").display().to_string();
        let app = build_router(config);

        let (status, _) = get_page(&app, "/blog/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // Other routes keep serving.
        let (status, _) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn static_files_pass_through() {
        let tmp = TempDir::new().unwrap();
        let app = build_router(site_config(&tmp));

        let (status, body) = get_page(&app, "/static/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");

        let (status, _) = get_page(&app, "/static/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn startup_rejects_unknown_endpoint_template() {
        let tmp = TempDir::new().unwrap();
        let mut config = site_config(&tmp);
        config
            .endpoints
            .insert("/about".to_string(), "about.html".to_string());

        assert!(AppState::build(config).is_err());
    }
}
