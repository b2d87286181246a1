//! Character generation from the local Data Store
//!
//! Every function takes the random source explicitly so callers can seed it.
//! None of them fail: missing optional data degrades to empty fields.

use crate::core::types::{now, Age, CharacterRecord, Gender};
use crate::data::store::{CategoryTable, DataStore};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Resolve `Random` to a concrete gender; concrete genders pass through
pub fn resolve_gender<R: Rng>(gender: Gender, rng: &mut R) -> Gender {
    match gender {
        Gender::Random => *Gender::CONCRETE.choose(rng).unwrap_or(&Gender::Neutral),
        concrete => concrete,
    }
}

/// Inclusive age range for a style
pub fn age_range(style: &str) -> RangeInclusive<i64> {
    match style {
        "medieval" => 16..=60,
        "moderno" | "modern" => 18..=75,
        _ => 20..=500,
    }
}

fn pick<R: Rng>(list: &[String], rng: &mut R) -> String {
    list.choose(rng).cloned().unwrap_or_default()
}

/// Given name plus surname, for an already-resolved gender
fn compose_name<R: Rng>(table: &CategoryTable, gender: Gender, rng: &mut R) -> String {
    let given = pick(table.names_for(gender), rng);
    let surname = pick(table.surnames(), rng);
    if surname.is_empty() {
        given
    } else {
        format!("{} {}", given, surname)
    }
}

fn resolved_table<'a>(data: &'a DataStore, style: &str) -> (String, Option<&'a CategoryTable>) {
    let style = data.resolve_style(style);
    let table = data.category(&style);
    if table.is_none() {
        tracing::warn!("No category table for default style '{}'", style);
    }
    (style, table)
}

/// Generate a bare name (no title)
pub fn generate_name<R: Rng>(
    data: &DataStore,
    gender: Gender,
    style: &str,
    rng: &mut R,
) -> String {
    let gender = resolve_gender(gender, rng);
    let (_, table) = resolved_table(data, style);
    table
        .map(|t| compose_name(t, gender, rng))
        .unwrap_or_default()
}

/// Generate a name followed by a title when one resolves for the gender
pub fn generate_name_with_title<R: Rng>(
    data: &DataStore,
    gender: Gender,
    style: &str,
    rng: &mut R,
) -> String {
    let gender = resolve_gender(gender, rng);
    let (_, table) = resolved_table(data, style);
    let Some(table) = table else {
        return String::new();
    };

    let name = compose_name(table, gender, rng);
    let title = pick(table.titles_for(gender), rng);
    if title.is_empty() {
        name
    } else {
        format!("{} {}", name, title)
    }
}

/// Generate a full record. The caller owns appending it to a history.
pub fn generate_character<R: Rng>(
    data: &DataStore,
    gender: Gender,
    style: &str,
    rng: &mut R,
) -> CharacterRecord {
    let gender = resolve_gender(gender, rng);
    let (style, table) = resolved_table(data, style);

    let name = table
        .map(|t| compose_name(t, gender, rng))
        .unwrap_or_default();

    let titles = table.map(|t| t.titles_for(gender)).unwrap_or(&[]);
    let title = if !titles.is_empty() && rng.gen_bool(0.5) {
        pick(titles, rng)
    } else {
        String::new()
    };

    let profession = pick(data.professions_for(&style), rng);
    let age = rng.gen_range(age_range(&style));
    let trait_ = pick(table.map(|t| t.traits()).unwrap_or(&[]), rng);
    let motivation = pick(&data.motivations, rng);

    CharacterRecord {
        name,
        title,
        age: Age::Years(age),
        profession,
        trait_,
        motivation,
        style,
        gender,
        generated_at: now(),
        description: None,
        format_error: None,
        extra: BTreeMap::new(),
    }
}
