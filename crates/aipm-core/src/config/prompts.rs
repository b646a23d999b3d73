use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use super::shellexpand;

/// Bundled prompt file, embedded at compile time.
const BUNDLED_PROMPTS: &str = include_str!("../../../../prompts/PROMPTS.md");

/// Prompt templates, loaded from `<data_dir>/prompts/PROMPTS.md`.
///
/// Missing files or sections fall back to the bundled text.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// Metadata extraction. Placeholders: `{team}`, `{context}`.
    pub metadata: String,
    /// Task extraction. Placeholders: `{team}`, `{context}`, `{first_id}`.
    pub tasks: String,
    /// System framing for free-form questions.
    pub query: String,
}

impl Default for Prompts {
    fn default() -> Self {
        let mut sections = parse_markdown_sections(BUNDLED_PROMPTS);
        Self {
            metadata: sections.remove("Metadata").unwrap_or_default(),
            tasks: sections.remove("Tasks").unwrap_or_default(),
            query: sections.remove("Query").unwrap_or_default(),
        }
    }
}

impl Prompts {
    /// Load prompts from `<data_dir>/prompts/PROMPTS.md`.
    pub fn load(data_dir: &str) -> Self {
        let mut prompts = Self::default();
        let dir = shellexpand(data_dir);
        let path = format!("{dir}/prompts/PROMPTS.md");

        if let Ok(content) = std::fs::read_to_string(&path) {
            let mut sections = parse_markdown_sections(&content);
            if let Some(v) = sections.remove("Metadata") {
                prompts.metadata = v;
            }
            if let Some(v) = sections.remove("Tasks") {
                prompts.tasks = v;
            }
            if let Some(v) = sections.remove("Query") {
                prompts.query = v;
            }
            info!("loaded prompts from {path}");
        }

        prompts
    }
}

/// Fill `{name}` placeholders. Unknown braces are left alone, so JSON
/// examples inside a template survive.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

/// Deploy the bundled prompt file to `<data_dir>/prompts/`.
///
/// Never overwrites an existing file so user edits are preserved.
pub fn install_bundled_prompts(data_dir: &str) {
    let expanded = shellexpand(data_dir);
    let dir = Path::new(&expanded).join("prompts");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("prompts: failed to create {}: {e}", dir.display());
        return;
    }

    let dest = dir.join("PROMPTS.md");
    if !dest.exists() {
        if let Err(e) = std::fs::write(&dest, BUNDLED_PROMPTS) {
            warn!("prompts: failed to write {}: {e}", dest.display());
        } else {
            info!("prompts: deployed bundled PROMPTS.md");
        }
    }
}

/// Parse a markdown file with `## Section` headers into a map of section name → body.
fn parse_markdown_sections(content: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();
    let mut current_key: Option<String> = None;
    let mut current_body = String::new();

    for line in content.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            if let Some(key) = current_key.take() {
                let trimmed = current_body.trim().to_string();
                if !trimmed.is_empty() {
                    sections.insert(key, trimmed);
                }
            }
            current_key = Some(header.trim().to_string());
            current_body.clear();
        } else if current_key.is_some() {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }

    if let Some(key) = current_key {
        let trimmed = current_body.trim().to_string();
        if !trimmed.is_empty() {
            sections.insert(key, trimmed);
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_sections_present() {
        let prompts = Prompts::default();
        assert!(prompts.metadata.contains("team_add"));
        assert!(prompts.tasks.contains("{first_id}"));
        assert!(prompts.query.contains("1 to 3 sentences"));
    }

    #[test]
    fn test_parse_markdown_sections() {
        let md = "# Title\nignored\n## One\nfirst body\n\n## Two\nsecond\nbody\n## Empty\n";
        let sections = parse_markdown_sections(md);
        assert_eq!(sections.get("One").map(String::as_str), Some("first body"));
        assert_eq!(sections.get("Two").map(String::as_str), Some("second\nbody"));
        assert!(!sections.contains_key("Empty"));
    }

    #[test]
    fn test_render_keeps_json_braces() {
        let out = render(
            "Team: {team}\n{\"team_add\": []}",
            &[("team", "Alice Moyo, Bob Singh")],
        );
        assert_eq!(out, "Team: Alice Moyo, Bob Singh\n{\"team_add\": []}");
    }
}
