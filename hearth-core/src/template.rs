use tera::{Context, Tera};

#[derive(Debug)]
pub enum TemplateError {
    Tera(tera::Error),
    Missing(String),
}

impl From<tera::Error> for TemplateError {
    fn from(err: tera::Error) -> Self {
        TemplateError::Tera(err)
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Tera(e) => write!(f, "template error: {}", e),
            TemplateError::Missing(name) => write!(f, "no template named '{}'", name),
        }
    }
}

impl std::error::Error for TemplateError {}

/// The process-wide template set, loaded once at startup and read-only
/// afterwards.
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    pub fn from_glob(glob: &str) -> Result<Self, TemplateError> {
        let tera = Tera::new(glob)?;
        Ok(Self { tera })
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &Context) -> Result<String, TemplateError> {
        Ok(self.tera.render(name, context)?)
    }

    /// Confirms every name exists in the set. Run at startup against the
    /// full route table so an unknown template name can never surface
    /// mid-request.
    pub fn verify<'a, I>(&self, names: I) -> Result<(), TemplateError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            if !self.tera.get_template_names().any(|have| have == name) {
                return Err(TemplateError::Missing(name.to_string()));
            }
        }
        Ok(())
    }
}
