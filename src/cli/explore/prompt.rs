use rustyline::{Config, Editor, Result};

use super::form::Field;

pub const SEARCH_PROMPT: &str = "search> ";

pub fn generate_prompt(label: &str) -> String {
    format!("{} > ", label)
}

pub fn field_prompt(field: Field) -> String {
    generate_prompt(&format!("{} *", field.label()))
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}
