use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

/// Templates compiled into the binary, addressed by file name
const BUNDLED: &[(&str, &str)] = &[
    ("persona.md", include_str!("prompts/persona.md")),
    ("planner.md", include_str!("prompts/planner.md")),
    ("web_search.md", include_str!("prompts/web_search.md")),
    ("writer.md", include_str!("prompts/writer.md")),
    ("email.md", include_str!("prompts/email.md")),
    ("crew_agent.md", include_str!("prompts/crew_agent.md")),
    ("crew_task.md", include_str!("prompts/crew_task.md")),
];

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}

/// Render a bundled template by name, or any other template file from disk.
/// Bundled names never read the working directory.
pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();
    let bundled = template_path
        .to_str()
        .and_then(|name| BUNDLED.iter().find(|(file, _)| *file == name))
        .map(|(_, content)| *content);
    if let Some(content) = bundled {
        return load_prompt(content, context_data);
    }

    let template_content = fs::read_to_string(&template_path)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}
