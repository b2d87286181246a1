//! Character generation through the remote text-generation service
//!
//! One request per call, no retries. Once a reply has been received a
//! detailed request always produces a record, annotated when the reply had
//! to be recovered. Configuration and transport faults surface as errors.

use crate::core::config::RemoteServiceConfig;
use crate::core::error::{ForgeError, Result};
use crate::core::types::{now, Age, CharacterRecord, Gender, Generated};
use crate::data::store::DataStore;
use crate::generator::offline::resolve_gender;
use crate::llm::client::CompletionBackend;
use crate::llm::parser::{
    first_line, first_non_empty_line, parse_character, strip_decorations, ExtractedFields,
};
use crate::llm::prompt::build_request;
use rand::Rng;
use std::ops::RangeInclusive;

/// Age drawn when a reply does not carry one
pub const FALLBACK_AGE: RangeInclusive<i64> = 20..=50;

/// Name used when nothing usable can be derived from a reply
pub const UNNAMED: &str = "Unnamed character";

/// Annotation set on records built from unstructured replies
pub const FORMAT_ERROR_NOTE: &str = "response was not valid JSON";

pub struct RemoteGenerator {
    service: Option<RemoteServiceConfig>,
    backend: Box<dyn CompletionBackend>,
}

impl RemoteGenerator {
    pub fn new(service: Option<RemoteServiceConfig>, backend: Box<dyn CompletionBackend>) -> Self {
        Self { service, backend }
    }

    pub fn service(&self) -> Option<&RemoteServiceConfig> {
        self.service.as_ref()
    }

    /// Generate a name (`detailed = false`) or a full record.
    ///
    /// The caller is responsible for appending returned records to a history.
    pub fn generate<R: Rng>(
        &self,
        data: &DataStore,
        gender: Gender,
        style: &str,
        detailed: bool,
        rng: &mut R,
    ) -> Result<Generated> {
        let gender = resolve_gender(gender, rng);
        let style = data.resolve_style(style);

        let service = self.service.as_ref().ok_or(ForgeError::MissingCredential)?;
        let template = service.template(detailed).ok_or(ForgeError::MissingPrompt)?;

        let request = build_request(template, gender, &style);
        let reply = self.backend.complete(service, &request)?;

        if !detailed {
            return Ok(Generated::Name(reply.trim().to_string()));
        }

        let record = match parse_character(&reply) {
            Ok(fields) => assemble_record(fields, &reply, &style, gender, rng),
            Err(ForgeError::Decoding(reason)) => {
                tracing::warn!("Reply was not structured ({}), keeping it as a description", reason);
                unstructured_record(&reply, &style, gender, rng)
            }
            Err(e) => {
                tracing::error!("Could not process reply: {}", e);
                return Err(e);
            }
        };
        Ok(Generated::Character(record))
    }
}

fn derive_name(line: &str) -> String {
    let name = strip_decorations(line);
    if name.is_empty() {
        UNNAMED.to_string()
    } else {
        name
    }
}

/// Build a record from extracted fields, filling whatever the reply lacked
pub fn assemble_record<R: Rng>(
    fields: ExtractedFields,
    raw: &str,
    style: &str,
    gender: Gender,
    rng: &mut R,
) -> CharacterRecord {
    let name = fields
        .usable_name()
        .unwrap_or_else(|| derive_name(first_line(raw)));
    let age = fields
        .age()
        .unwrap_or_else(|| Age::Years(rng.gen_range(FALLBACK_AGE)));
    let text = |field: &str| fields.text(field).unwrap_or_default();

    CharacterRecord {
        name,
        title: text("title"),
        age,
        profession: text("profession"),
        trait_: text("trait"),
        motivation: text("motivation"),
        style: style.to_string(),
        gender,
        generated_at: now(),
        description: Some(text("description")),
        format_error: None,
        extra: CharacterRecord::namespaced_extra(fields.extra),
    }
}

/// Minimal record for a reply with no recognizable structure
pub fn unstructured_record<R: Rng>(
    raw: &str,
    style: &str,
    gender: Gender,
    rng: &mut R,
) -> CharacterRecord {
    CharacterRecord {
        name: derive_name(first_non_empty_line(raw)),
        title: String::new(),
        age: Age::Years(rng.gen_range(FALLBACK_AGE)),
        profession: String::new(),
        trait_: String::new(),
        motivation: String::new(),
        style: style.to_string(),
        gender,
        generated_at: now(),
        description: Some(raw.to_string()),
        format_error: Some(FORMAT_ERROR_NOTE.to_string()),
        extra: Default::default(),
    }
}
