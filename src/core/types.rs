//! Core type definitions used throughout the codebase

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Style used when the requested one has no category table
pub const DEFAULT_STYLE: &str = "fantasia";

/// Requested or resolved gender of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "masculino")]
    Male,
    #[serde(alias = "femenino")]
    Female,
    #[serde(alias = "neutro")]
    Neutral,
    /// Resolved to one of the concrete genders before any lookup
    #[serde(alias = "aleatorio")]
    Random,
}

impl Gender {
    pub const CONCRETE: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Neutral];

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Neutral => "neutral",
            Gender::Random => "random",
        }
    }

    /// Spanish tag, as written by templates using `{genero}`
    pub fn spanish_label(&self) -> &'static str {
        match self {
            Gender::Male => "masculino",
            Gender::Female => "femenino",
            Gender::Neutral => "neutro",
            Gender::Random => "aleatorio",
        }
    }

    /// Keys under which a category table lists names or titles for this gender
    pub fn table_keys(&self) -> &'static [&'static str] {
        match self {
            Gender::Male => &["masculinos", "male"],
            Gender::Female => &["femeninos", "female"],
            Gender::Neutral => &["neutros", "neutral"],
            Gender::Random => &[],
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "masculino" | "m" => Ok(Gender::Male),
            "female" | "femenino" | "f" => Ok(Gender::Female),
            "neutral" | "neutro" | "n" => Ok(Gender::Neutral),
            "random" | "aleatorio" => Ok(Gender::Random),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// Which generator serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Offline,
    #[serde(alias = "ia", alias = "ai")]
    Remote,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "offline" => Ok(Mode::Offline),
            "remote" | "ia" | "ai" => Ok(Mode::Remote),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// Character age: a number of years, or the raw text a remote reply
/// carried when it could not be read as an integer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Age {
    Years(i64),
    Raw(String),
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Age::Years(years) => write!(f, "{}", years),
            Age::Raw(raw) => f.write_str(raw),
        }
    }
}

/// A generated character profile
///
/// Written with English keys; history files using the Spanish keys
/// (`nombre`, `edad`, `fecha_generacion`, ...) are read as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "titulo")]
    pub title: String,
    #[serde(alias = "edad")]
    pub age: Age,
    #[serde(default, alias = "profesion")]
    pub profession: String,
    #[serde(rename = "trait", default, alias = "rasgo")]
    pub trait_: String,
    #[serde(default, alias = "motivacion")]
    pub motivation: String,
    #[serde(alias = "estilo")]
    pub style: String,
    #[serde(alias = "genero")]
    pub gender: Gender,
    #[serde(with = "timestamp", alias = "fecha_generacion")]
    pub generated_at: NaiveDateTime,
    /// Only present on remote detailed records
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "descripcion")]
    pub description: Option<String>,
    /// Set when the remote reply needed recovery
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "error_formato")]
    pub format_error: Option<String>,
    /// Additional keys the remote service returned
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Every key a record is written or read under, Spanish aliases included
pub const RECORD_KEYS: &[&str] = &[
    "name", "nombre", "title", "titulo", "age", "edad", "profession", "profesion",
    "trait", "rasgo", "motivation", "motivacion", "style", "estilo", "gender", "genero",
    "generated_at", "fecha_generacion", "description", "descripcion", "format_error",
    "error_formato",
];

/// Prefix given to additional keys that would shadow a record field
pub const RESERVED_KEY_PREFIX: &str = "reply_";

impl CharacterRecord {
    /// Rename additional keys that collide with record fields.
    ///
    /// A colliding key would be written twice and make the saved history
    /// unreadable, so `gender` becomes `reply_gender` and so on.
    pub fn namespaced_extra(
        extra: BTreeMap<String, serde_json::Value>,
    ) -> BTreeMap<String, serde_json::Value> {
        let mut kept = BTreeMap::new();
        for (key, value) in extra {
            if RECORD_KEYS.contains(&key.as_str()) {
                kept.entry(format!("{}{}", RESERVED_KEY_PREFIX, key))
                    .or_insert(value);
            } else {
                kept.insert(key, value);
            }
        }
        kept
    }
}

/// Outcome of a successful generation call
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Name(String),
    Character(CharacterRecord),
}

impl Generated {
    /// Short label for progress lines
    pub fn headline(&self) -> &str {
        match self {
            Generated::Name(name) => name,
            Generated::Character(record) => &record.name,
        }
    }

    pub fn as_record(&self) -> Option<&CharacterRecord> {
        match self {
            Generated::Character(record) => Some(record),
            Generated::Name(_) => None,
        }
    }
}

impl fmt::Display for Generated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generated::Name(name) => f.write_str(name),
            Generated::Character(record) => write!(f, "{}", record),
        }
    }
}

impl fmt::Display for CharacterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        if !self.title.is_empty() {
            writeln!(f, "Title: {}", self.title)?;
        }
        writeln!(f, "Age: {}", self.age)?;
        if !self.profession.is_empty() {
            writeln!(f, "Profession: {}", self.profession)?;
        }
        if !self.trait_.is_empty() {
            writeln!(f, "Distinctive trait: {}", self.trait_)?;
        }
        if !self.motivation.is_empty() {
            writeln!(f, "Motivation: {}", self.motivation)?;
        }
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(f, "\nDescription: {}", description)?;
        }
        if let Some(note) = &self.format_error {
            writeln!(f, "\nNote: {}", note)?;
        }
        write!(f, "\nGender: {} | Style: {}", self.gender, self.style)
    }
}

/// Creation timestamp, truncated to whole seconds so it survives the
/// durable text form unchanged
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub(crate) mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CharacterRecord {
        CharacterRecord {
            name: "Lyra Vance".into(),
            title: "the Bold".into(),
            age: Age::Years(34),
            profession: "Cartographer".into(),
            trait_: "scar over one eye".into(),
            motivation: "revenge".into(),
            style: "fantasia".into(),
            gender: Gender::Female,
            generated_at: NaiveDateTime::parse_from_str("2024-05-01 10:20:30", timestamp::FORMAT)
                .unwrap(),
            description: None,
            format_error: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_gender_parses_both_languages() {
        assert_eq!("masculino".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("neutro".parse::<Gender>().unwrap(), Gender::Neutral);
        assert_eq!("aleatorio".parse::<Gender>().unwrap(), Gender::Random);
        assert!("robot".parse::<Gender>().is_err());
    }

    #[test]
    fn test_gender_deserializes_spanish_alias() {
        let gender: Gender = serde_json::from_str("\"femenino\"").unwrap();
        assert_eq!(gender, Gender::Female);
        assert_eq!(serde_json::to_string(&Gender::Neutral).unwrap(), "\"neutral\"");
    }

    #[test]
    fn test_record_serializes_trait_and_timestamp() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["trait"], "scar over one eye");
        assert_eq!(json["generated_at"], "2024-05-01 10:20:30");
        assert_eq!(json["age"], 34);
        assert!(json.get("description").is_none());
        assert!(json.get("format_error").is_none());
    }

    #[test]
    fn test_record_keeps_unknown_keys() {
        let json = r#"{
            "name": "Kael", "title": "", "age": "very old", "profession": "",
            "trait": "", "motivation": "", "style": "fantasia", "gender": "male",
            "generated_at": "2024-05-01 10:20:30", "description": "A wanderer",
            "weapon": "spear"
        }"#;
        let record: CharacterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.age, Age::Raw("very old".into()));
        assert_eq!(record.description.as_deref(), Some("A wanderer"));
        assert_eq!(record.extra["weapon"], "spear");
    }

    #[test]
    fn test_record_reads_spanish_history() {
        let json = r#"[{
            "nombre": "Aldric Nightbloom", "titulo": "", "edad": 212,
            "profesion": "Alchemist", "rasgo": "glowing tattoos",
            "motivacion": "find the truth", "estilo": "fantasia", "genero": "masculino",
            "fecha_generacion": "2024-05-01 10:20:30"
        }, {
            "nombre": "Mira", "titulo": "", "edad": "unknown", "profesion": "",
            "descripcion": "A smuggler", "motivacion": "", "rasgo": "",
            "estilo": "moderno", "genero": "femenino",
            "fecha_generacion": "2024-05-02 08:00:00",
            "error_formato": "La respuesta no tenía formato JSON válido"
        }]"#;
        let records: Vec<CharacterRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].name, "Aldric Nightbloom");
        assert_eq!(records[0].age, Age::Years(212));
        assert_eq!(records[0].gender, Gender::Male);
        assert_eq!(records[0].trait_, "glowing tattoos");
        assert_eq!(records[0].generated_at, sample_record().generated_at);
        assert!(records[0].extra.is_empty());
        assert_eq!(records[1].gender, Gender::Female);
        assert_eq!(records[1].age, Age::Raw("unknown".into()));
        assert_eq!(records[1].description.as_deref(), Some("A smuggler"));
        assert!(records[1].format_error.is_some());

        // Written back with English keys only
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["name"], "Aldric Nightbloom");
        assert_eq!(json["gender"], "male");
        assert!(json.get("nombre").is_none());
    }

    #[test]
    fn test_colliding_extra_keys_are_renamed() {
        let extra: BTreeMap<String, serde_json::Value> = [
            ("gender".to_string(), serde_json::json!("male")),
            ("estilo".to_string(), serde_json::json!("noir")),
            ("weapon".to_string(), serde_json::json!("spear")),
        ]
        .into_iter()
        .collect();
        let extra = CharacterRecord::namespaced_extra(extra);
        assert_eq!(extra["reply_gender"], "male");
        assert_eq!(extra["reply_estilo"], "noir");
        assert_eq!(extra["weapon"], "spear");
        assert!(!extra.contains_key("gender"));

        let mut record = sample_record();
        record.extra = extra;
        let text = serde_json::to_string(&record).unwrap();
        let back: CharacterRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_display_skips_empty_fields() {
        let mut record = sample_record();
        record.title.clear();
        let text = record.to_string();
        assert!(text.contains("Name: Lyra Vance"));
        assert!(!text.contains("Title:"));
        assert!(text.contains("Age: 34"));
    }

    #[test]
    fn test_now_has_whole_seconds() {
        use chrono::Timelike;
        assert_eq!(now().nanosecond(), 0);
    }
}
