use handlebars::Handlebars;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::types::View;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    #[error("Template directory error: {0}")]
    WalkError(#[from] walkdir::Error),
}

/// Built-in views, registered under their file stem
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("header", include_str!("templates/header.hbs")),
    ("footer", include_str!("templates/footer.hbs")),
    ("issue_list", include_str!("templates/issue_list.hbs")),
    ("issue", include_str!("templates/issue.hbs")),
    ("issue_form", include_str!("templates/issue_form.hbs")),
    ("new_issue", include_str!("templates/new_issue.hbs")),
    ("edit_issue", include_str!("templates/edit_issue.hbs")),
    ("not_existing_page", include_str!("templates/not_existing_page.hbs")),
    ("unauthorized", include_str!("templates/unauthorized.hbs")),
];

pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Engine with the built-in views only
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        for (name, source) in BUILTIN_TEMPLATES {
            handlebars.register_template_string(name, *source)?;
        }
        Ok(Self { handlebars })
    }

    /// Engine whose built-in views are replaced by any `<name>.hbs` found under `dir`
    pub fn with_overrides(dir: &Path) -> Result<Self, TemplateError> {
        let mut engine = Self::new()?;

        if !dir.exists() {
            debug!(path = %dir.display(), "Template override directory missing, using built-ins");
            return Ok(engine);
        }

        for entry in WalkDir::new(dir) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("hbs")
            {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let source = std::fs::read_to_string(path)?;
            engine.handlebars.register_template_string(name, source)?;
            info!(template = name, path = %path.display(), "Registered template override");
        }

        Ok(engine)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Render a view to HTML
    pub fn render(&self, view: &View) -> Result<String, TemplateError> {
        let name = view.template_name();
        let html = match view {
            View::IssueList(context) => self.handlebars.render(name, context),
            View::IssueDetail(context) => self.handlebars.render(name, context),
            View::NewIssue(context) | View::EditIssue(context) => {
                self.handlebars.render(name, context)
            }
            View::NotExisting(context) => self.handlebars.render(name, context),
            View::Unauthorized(context) => self.handlebars.render(name, context),
        }?;
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_compile() {
        let engine = TemplateEngine::new().unwrap();
        for (name, _) in BUILTIN_TEMPLATES {
            assert!(engine.has_template(name), "missing template {}", name);
        }
    }

    #[test]
    fn test_missing_override_dir_falls_back_to_builtins() {
        let engine = TemplateEngine::with_overrides(Path::new("/nonexistent/forge/views")).unwrap();
        assert!(engine.has_template("issue_list"));
    }
}
