use chrono::{Duration, NaiveDate, Utc};
use fake::Fake;
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryName, StateAbbr, StreetName, ZipCode,
};
use fake::faker::internet::en::SafeEmail;
use fake::faker::job::en::Title;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::field_type::FieldType;
use crate::source::{UNKNOWN_VALUE, ValueSource, pick_constrained};

const RECENT_DAYS: i64 = 365;

/// Synthesizes values on demand with the `fake` crate.
#[derive(Debug, Clone)]
pub struct FakerSource {
    rng: ChaCha8Rng,
    today: NaiveDate,
}

impl FakerSource {
    pub fn new(seed: u64) -> Self {
        Self::with_today(seed, Utc::now().date_naive())
    }

    /// Pin the reference date used for `Recent date` and `Date`.
    pub fn with_today(seed: u64, today: NaiveDate) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            today,
        }
    }

    fn synthesize(&mut self, field_type: FieldType) -> String {
        let rng = &mut self.rng;
        match field_type {
            FieldType::LastName => LastName().fake_with_rng(rng),
            FieldType::FirstName => FirstName().fake_with_rng(rng),
            FieldType::Address => {
                let number: String = BuildingNumber().fake_with_rng(rng);
                let street: String = StreetName().fake_with_rng(rng);
                let city: String = CityName().fake_with_rng(rng);
                let state: String = StateAbbr().fake_with_rng(rng);
                let zip: String = ZipCode().fake_with_rng(rng);
                format!("{number} {street}, {city}, {state} {zip}")
            }
            FieldType::PostalCode => ZipCode().fake_with_rng(rng),
            FieldType::City => CityName().fake_with_rng(rng),
            FieldType::Country => CountryName().fake_with_rng(rng),
            FieldType::Phone => PhoneNumber().fake_with_rng(rng),
            FieldType::Email => SafeEmail().fake_with_rng(rng),
            FieldType::Job => Title().fake_with_rng(rng),
            FieldType::SmallNumber => rng.random_range(0..=10_u32).to_string(),
            FieldType::Number => rng.random_range(0..=10_000_u32).to_string(),
            FieldType::RecentDate => {
                let back = rng.random_range(0..=RECENT_DAYS);
                (self.today - Duration::days(back))
                    .format("%Y-%m-%d")
                    .to_string()
            }
            FieldType::Date => {
                let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
                let span = (self.today - epoch).num_days().max(0);
                let offset = rng.random_range(0..=span);
                (epoch + Duration::days(offset))
                    .format("%Y-%m-%d")
                    .to_string()
            }
        }
    }
}

impl ValueSource for FakerSource {
    fn values(&self, field_type: &str) -> Result<Vec<String>> {
        debug!(field_type, "faker values are synthesized on demand");
        Ok(Vec::new())
    }

    fn random_value(&mut self, field_type: &str, constraint: Option<&[String]>) -> Result<String> {
        if let Some(value) = pick_constrained(constraint, &mut self.rng) {
            debug!(field_type, value = %value, "picked referenced value");
            return Ok(value);
        }

        let Some(known) = FieldType::from_label(field_type) else {
            warn!(field_type, "unknown field type; using placeholder value");
            return Ok(UNKNOWN_VALUE.to_string());
        };
        let value = self.synthesize(known);
        debug!(field_type, value = %value, "synthesized value");
        Ok(value)
    }
}
