use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::GenerationError;

/// Semantic category a value source knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    LastName,
    FirstName,
    Address,
    PostalCode,
    City,
    Country,
    Phone,
    Email,
    Job,
    SmallNumber,
    Number,
    RecentDate,
    Date,
}

impl FieldType {
    /// Catalogue in presentation order.
    pub const ALL: [FieldType; 13] = [
        FieldType::LastName,
        FieldType::FirstName,
        FieldType::Address,
        FieldType::PostalCode,
        FieldType::City,
        FieldType::Country,
        FieldType::Phone,
        FieldType::Email,
        FieldType::Job,
        FieldType::SmallNumber,
        FieldType::Number,
        FieldType::RecentDate,
        FieldType::Date,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FieldType::LastName => "Last name",
            FieldType::FirstName => "First name",
            FieldType::Address => "Address",
            FieldType::PostalCode => "Postal code",
            FieldType::City => "City",
            FieldType::Country => "Country",
            FieldType::Phone => "Phone",
            FieldType::Email => "Email",
            FieldType::Job => "Job",
            FieldType::SmallNumber => "Number [0,10]",
            FieldType::Number => "Number [0,10000]",
            FieldType::RecentDate => "Recent date",
            FieldType::Date => "Date",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Option<FieldType> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|field_type| field_type.label().eq_ignore_ascii_case(label))
    }

    /// Corpus file backing this type under the resources directory.
    pub fn corpus_file(self) -> &'static str {
        match self {
            FieldType::LastName => "lastname.txt",
            FieldType::FirstName => "firstname.txt",
            FieldType::Address => "address.txt",
            FieldType::PostalCode => "postal_code.txt",
            FieldType::City => "city.txt",
            FieldType::Country => "country.txt",
            FieldType::Phone => "phone.txt",
            FieldType::Email => "email.txt",
            FieldType::Job => "job.txt",
            FieldType::SmallNumber => "number_0_10.txt",
            FieldType::Number => "number_0_10000.txt",
            FieldType::RecentDate => "recent_date.txt",
            FieldType::Date => "date.txt",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldType {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FieldType::from_label(value).ok_or_else(|| {
            GenerationError::InvalidConfig(format!(
                "unknown field type '{value}' (expected one of: {})",
                FieldType::ALL.map(FieldType::label).join(", ")
            ))
        })
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_case_insensitively() {
        for field_type in FieldType::ALL {
            assert_eq!(FieldType::from_label(field_type.label()), Some(field_type));
        }
        assert_eq!(FieldType::from_label("number [0,10]"), Some(FieldType::SmallNumber));
        assert_eq!(FieldType::from_label("  EMAIL "), Some(FieldType::Email));
        assert_eq!(FieldType::from_label("VARCHAR(20)"), None);
    }

    #[test]
    fn parse_error_lists_the_catalogue() {
        let err = "Surname".parse::<FieldType>().expect_err("not a label");
        let message = err.to_string();
        assert!(message.contains("Surname"));
        assert!(message.contains("Number [0,10000]"));
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&FieldType::RecentDate).expect("serialize");
        assert_eq!(json, "\"Recent date\"");
        let parsed: FieldType = serde_json::from_str("\"postal code\"").expect("deserialize");
        assert_eq!(parsed, FieldType::PostalCode);
    }
}
