//! Prompt construction for the remote generator

use crate::core::types::Gender;
use crate::llm::client::CompletionRequest;

/// Fixed system instruction sent with every request
pub const SYSTEM_PROMPT: &str =
    "You are an assistant that generates names and characters for fiction.";

/// Substitute gender and style into a template.
///
/// Both the Spanish (`{genero}`, `{estilo}`) and English (`{gender}`,
/// `{style}`) placeholders are filled; `{genero}` takes the Spanish tag.
pub fn fill_template(template: &str, gender: Gender, style: &str) -> String {
    template
        .replace("{genero}", gender.spanish_label())
        .replace("{gender}", gender.label())
        .replace("{estilo}", style)
        .replace("{style}", style)
}

pub fn build_request(template: &str, gender: Gender, style: &str) -> CompletionRequest {
    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user: fill_template(template, gender, style),
    }
}
