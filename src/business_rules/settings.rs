// Settings snapshot
//
// Typed view over the key -> JSON configuration table. A snapshot is built
// once per operation and never mutated afterwards; updates produce a new one.

use crate::business_rules::error::{RulesError, RulesResult};
use chrono::{Datelike, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A persisted configuration entry (value is a JSON document stored as text)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
    pub version: i64,
}

/// Known configuration keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    DeliveryTiers,
    DeliveryFee,
    LoyaltyProgram,
    PromoOffer,
    Schedule,
    Announcement,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::DeliveryTiers,
        SettingKey::DeliveryFee,
        SettingKey::LoyaltyProgram,
        SettingKey::PromoOffer,
        SettingKey::Schedule,
        SettingKey::Announcement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::DeliveryTiers => "delivery_tiers",
            SettingKey::DeliveryFee => "delivery_fee",
            SettingKey::LoyaltyProgram => "loyalty_program",
            SettingKey::PromoOffer => "promo_offer",
            SettingKey::Schedule => "schedule",
            SettingKey::Announcement => "announcement",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| RulesError::InvalidConfiguration(format!("Unknown setting key: {}", s)))
    }
}

/// A postal code served by a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub postal_code: String,
    pub city: String,
}

/// Delivery zone grouping with its own minimum order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTier {
    pub id: String,
    pub min_order: Decimal,
    pub zones: Vec<Zone>,
}

impl DeliveryTier {
    pub fn serves(&self, postal_code: &str) -> bool {
        let postal_code = postal_code.trim();
        self.zones.iter().any(|zone| zone.postal_code.trim() == postal_code)
    }
}

fn default_qualifying_category() -> String {
    "pizza".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    pub enabled: bool,
    /// Points needed for one reward; also the points consumed by a redemption
    pub target_pizzas: i32,
    pub require_purchase_for_reward: bool,
    /// Category whose paid units earn one point each
    #[serde(default = "default_qualifying_category")]
    pub qualifying_category: String,
}

impl Default for LoyaltyProgram {
    fn default() -> Self {
        Self {
            enabled: false,
            target_pizzas: 10,
            require_purchase_for_reward: true,
            qualifying_category: default_qualifying_category(),
        }
    }
}

/// "Buy N get M" offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoOffer {
    pub enabled: bool,
    pub buy_quantity: u32,
    pub get_quantity: u32,
    /// Category counted toward the offer; empty matches every category
    #[serde(default)]
    pub item_category_filter: String,
}

impl PromoOffer {
    pub fn matches_category(&self, category: &str) -> bool {
        let filter = self.item_category_filter.trim();
        filter.is_empty() || filter.eq_ignore_ascii_case(category.trim())
    }
}

impl Default for PromoOffer {
    fn default() -> Self {
        Self {
            enabled: false,
            buy_quantity: 3,
            get_quantity: 1,
            item_category_filter: "pizza".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day_name: String,
    /// "HH:MM"
    pub opens_at: String,
    /// "HH:MM"; earlier than `opens_at` means the service ends after midnight
    pub closes_at: String,
    #[serde(default)]
    pub closed: bool,
}

impl ScheduleDay {
    fn hours(&self) -> RulesResult<(NaiveTime, NaiveTime)> {
        Ok((parse_hhmm(&self.opens_at)?, parse_hhmm(&self.closes_at)?))
    }

    /// Open at `time` within this day's own service, from `opens_at` on
    fn serves_from_opening(&self, time: NaiveTime) -> RulesResult<bool> {
        if self.closed {
            return Ok(false);
        }
        let (opens, closes) = self.hours()?;
        if opens <= closes {
            Ok(time >= opens && time < closes)
        } else {
            Ok(time >= opens)
        }
    }

    /// Open at `time` on the next calendar day, before an overnight close
    fn serves_after_midnight(&self, time: NaiveTime) -> RulesResult<bool> {
        if self.closed {
            return Ok(false);
        }
        let (opens, closes) = self.hours()?;
        Ok(opens > closes && time < closes)
    }
}

fn parse_hhmm(value: &str) -> RulesResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        RulesError::InvalidConfiguration(format!("Invalid time '{}': expected HH:MM", value))
    })
}

fn default_schedule() -> Vec<ScheduleDay> {
    [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ]
    .into_iter()
    .map(|day| ScheduleDay {
        day_name: day.to_string(),
        opens_at: "11:00".to_string(),
        closes_at: "22:30".to_string(),
        closed: false,
    })
    .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub enabled: bool,
    #[serde(default)]
    pub message: String,
}

/// Immutable business configuration for one operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsSnapshot {
    pub delivery_tiers: Vec<DeliveryTier>,
    pub delivery_fee: Decimal,
    pub loyalty_program: LoyaltyProgram,
    pub promo_offer: PromoOffer,
    pub schedule: Vec<ScheduleDay>,
    pub announcement: Announcement,
    pub version: i64,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            delivery_tiers: Vec::new(),
            delivery_fee: Decimal::ZERO,
            loyalty_program: LoyaltyProgram::default(),
            promo_offer: PromoOffer::default(),
            schedule: default_schedule(),
            announcement: Announcement::default(),
            version: 0,
        }
    }
}

impl SettingsSnapshot {
    /// Build a snapshot from persisted entries. Missing keys keep their
    /// defaults; unknown keys are skipped.
    pub fn from_entries(entries: &[SettingEntry]) -> RulesResult<Self> {
        let mut snapshot = SettingsSnapshot::default();

        for entry in entries {
            let key = match entry.key.parse::<SettingKey>() {
                Ok(key) => key,
                Err(_) => {
                    tracing::warn!("Ignoring unknown setting key '{}'", entry.key);
                    continue;
                }
            };
            let value: serde_json::Value = serde_json::from_str(&entry.value).map_err(|e| {
                RulesError::InvalidConfiguration(format!("Setting '{}' is not valid JSON: {}", key, e))
            })?;
            snapshot.apply(key, value)?;
            snapshot.version = snapshot.version.max(entry.version);
        }

        snapshot.normalize();
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Copy of this snapshot with one key replaced, validated as a whole
    pub fn with_value(&self, key: SettingKey, value: serde_json::Value) -> RulesResult<Self> {
        let mut next = self.clone();
        next.apply(key, value)?;
        next.normalize();
        next.validate()?;
        Ok(next)
    }

    fn apply(&mut self, key: SettingKey, value: serde_json::Value) -> RulesResult<()> {
        let invalid = |e: serde_json::Error| {
            RulesError::InvalidConfiguration(format!("Invalid value for '{}': {}", key, e))
        };
        match key {
            SettingKey::DeliveryTiers => {
                self.delivery_tiers = serde_json::from_value(value).map_err(invalid)?
            }
            SettingKey::DeliveryFee => self.delivery_fee = serde_json::from_value(value).map_err(invalid)?,
            SettingKey::LoyaltyProgram => {
                self.loyalty_program = serde_json::from_value(value).map_err(invalid)?
            }
            SettingKey::PromoOffer => self.promo_offer = serde_json::from_value(value).map_err(invalid)?,
            SettingKey::Schedule => self.schedule = serde_json::from_value(value).map_err(invalid)?,
            SettingKey::Announcement => {
                self.announcement = serde_json::from_value(value).map_err(invalid)?
            }
        }
        Ok(())
    }

    /// Tiers are kept in ascending minimum-order order
    fn normalize(&mut self) {
        self.delivery_tiers.sort_by(|a, b| a.min_order.cmp(&b.min_order));
    }

    /// Configuration-time invariants
    pub fn validate(&self) -> RulesResult<()> {
        if self.delivery_fee < Decimal::ZERO {
            return Err(RulesError::InvalidConfiguration(
                "delivery_fee must be non-negative".to_string(),
            ));
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for tier in &self.delivery_tiers {
            if tier.min_order < Decimal::ZERO {
                return Err(RulesError::InvalidConfiguration(format!(
                    "min_order for tier '{}' must be non-negative",
                    tier.id
                )));
            }
            for zone in &tier.zones {
                let code = zone.postal_code.trim();
                if code.is_empty() {
                    return Err(RulesError::InvalidConfiguration(format!(
                        "Tier '{}' has a zone without postal code",
                        tier.id
                    )));
                }
                if let Some(other) = seen.insert(code, tier.id.as_str()) {
                    return Err(RulesError::InvalidConfiguration(format!(
                        "Postal code {} appears in tiers '{}' and '{}'",
                        code, other, tier.id
                    )));
                }
            }
        }

        if self.loyalty_program.target_pizzas < 1 {
            return Err(RulesError::InvalidConfiguration(
                "target_pizzas must be at least 1".to_string(),
            ));
        }

        if self.promo_offer.buy_quantity < 1 {
            return Err(RulesError::InvalidConfiguration(
                "buy_quantity must be at least 1".to_string(),
            ));
        }

        if self.schedule.len() != 7 {
            return Err(RulesError::InvalidConfiguration(format!(
                "schedule must have 7 days, got {}",
                self.schedule.len()
            )));
        }
        for day in &self.schedule {
            day.hours()?;
        }

        Ok(())
    }

    /// Whether the pizzeria takes orders at the given local time
    pub fn is_open_at(&self, at: NaiveDateTime) -> RulesResult<bool> {
        let index = at.weekday().num_days_from_monday() as usize;
        let previous = (index + 6) % 7;
        let time = at.time();

        if let Some(day) = self.schedule.get(previous) {
            if day.serves_after_midnight(time)? {
                return Ok(true);
            }
        }
        match self.schedule.get(index) {
            Some(day) => day.serves_from_opening(time),
            None => Ok(false),
        }
    }

    /// Serialized value for one key, as stored in the settings table
    pub fn value_for(&self, key: SettingKey) -> RulesResult<String> {
        let value = match key {
            SettingKey::DeliveryTiers => serde_json::to_string(&self.delivery_tiers)?,
            SettingKey::DeliveryFee => serde_json::to_string(&self.delivery_fee)?,
            SettingKey::LoyaltyProgram => serde_json::to_string(&self.loyalty_program)?,
            SettingKey::PromoOffer => serde_json::to_string(&self.promo_offer)?,
            SettingKey::Schedule => serde_json::to_string(&self.schedule)?,
            SettingKey::Announcement => serde_json::to_string(&self.announcement)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn entry(key: &str, value: serde_json::Value, version: i64) -> SettingEntry {
        SettingEntry {
            key: key.to_string(),
            value: value.to_string(),
            version,
        }
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let snapshot = SettingsSnapshot::from_entries(&[]).unwrap();
        assert_eq!(snapshot, SettingsSnapshot::default());
        assert_eq!(snapshot.schedule.len(), 7);
    }

    #[test]
    fn test_tiers_are_sorted_by_minimum() {
        let entries = vec![entry(
            "delivery_tiers",
            json!([
                {"id": "far", "min_order": "25", "zones": [{"postal_code": "13009", "city": "Marseille"}]},
                {"id": "near", "min_order": "15", "zones": [{"postal_code": "13008", "city": "Marseille"}]}
            ]),
            3,
        )];
        let snapshot = SettingsSnapshot::from_entries(&entries).unwrap();
        assert_eq!(snapshot.delivery_tiers[0].id, "near");
        assert_eq!(snapshot.delivery_tiers[1].id, "far");
        assert_eq!(snapshot.version, 3);
    }

    #[test]
    fn test_duplicate_postal_code_rejected() {
        let entries = vec![entry(
            "delivery_tiers",
            json!([
                {"id": "a", "min_order": "15", "zones": [{"postal_code": "13008", "city": "Marseille"}]},
                {"id": "b", "min_order": "20", "zones": [{"postal_code": "13008", "city": "Marseille"}]}
            ]),
            1,
        )];
        let err = SettingsSnapshot::from_entries(&entries).unwrap_err();
        assert!(matches!(err, RulesError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_unknown_keys_are_ignored_on_load() {
        let entries = vec![entry("legacy_banner", json!("hello"), 9)];
        let snapshot = SettingsSnapshot::from_entries(&entries).unwrap();
        assert_eq!(snapshot.version, 0);
    }

    #[test]
    fn test_with_value_rejects_zero_buy_quantity() {
        let snapshot = SettingsSnapshot::default();
        let err = snapshot
            .with_value(
                SettingKey::PromoOffer,
                json!({"enabled": true, "buy_quantity": 0, "get_quantity": 1}),
            )
            .unwrap_err();
        assert!(matches!(err, RulesError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_with_value_does_not_touch_original() {
        let snapshot = SettingsSnapshot::default();
        let next = snapshot.with_value(SettingKey::DeliveryFee, json!("2.50")).unwrap();
        assert_eq!(next.delivery_fee, dec!(2.50));
        assert_eq!(snapshot.delivery_fee, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_must_have_seven_days() {
        let snapshot = SettingsSnapshot::default();
        let err = snapshot
            .with_value(
                SettingKey::Schedule,
                json!([{"day_name": "Monday", "opens_at": "11:00", "closes_at": "22:00"}]),
            )
            .unwrap_err();
        assert!(matches!(err, RulesError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_is_open_at_honours_closed_days_and_midnight() {
        let mut snapshot = SettingsSnapshot::default();
        // Monday closed, Tuesday open past midnight
        snapshot.schedule[0].closed = true;
        snapshot.schedule[1].opens_at = "18:00".to_string();
        snapshot.schedule[1].closes_at = "01:00".to_string();

        // 2024-01-01 is a Monday
        let monday_noon = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let tuesday_late = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(23, 30, 0).unwrap();
        let tuesday_noon = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(12, 0, 0).unwrap();

        assert!(!snapshot.is_open_at(monday_noon).unwrap());
        assert!(snapshot.is_open_at(tuesday_late).unwrap());
        assert!(!snapshot.is_open_at(tuesday_noon).unwrap());
    }

    #[test]
    fn test_is_open_at_after_midnight_follows_previous_day() {
        let mut snapshot = SettingsSnapshot::default();
        // Monday 18:00 to 01:00, Tuesday closed
        snapshot.schedule[0].opens_at = "18:00".to_string();
        snapshot.schedule[0].closes_at = "01:00".to_string();
        snapshot.schedule[1].closed = true;

        // 2030-01-07 is a Monday
        let monday_early = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap().and_hms_opt(0, 30, 0).unwrap();
        let tuesday_early = NaiveDate::from_ymd_opt(2030, 1, 8).unwrap().and_hms_opt(0, 30, 0).unwrap();
        let tuesday_one = NaiveDate::from_ymd_opt(2030, 1, 8).unwrap().and_hms_opt(1, 0, 0).unwrap();
        let tuesday_late = NaiveDate::from_ymd_opt(2030, 1, 8).unwrap().and_hms_opt(23, 30, 0).unwrap();

        assert!(snapshot.is_open_at(tuesday_early).unwrap());
        assert!(!snapshot.is_open_at(tuesday_one).unwrap());
        assert!(!snapshot.is_open_at(tuesday_late).unwrap());
        // Sunday closes at 22:30, so Monday's own evening hours do not reach back
        assert!(!snapshot.is_open_at(monday_early).unwrap());
    }

    #[test]
    fn test_is_open_at_early_morning_of_day_opening_late() {
        let mut snapshot = SettingsSnapshot::default();
        // Monday closed, Tuesday 18:00 to 01:00
        snapshot.schedule[0].closed = true;
        snapshot.schedule[1].opens_at = "18:00".to_string();
        snapshot.schedule[1].closes_at = "01:00".to_string();

        let tuesday_early = NaiveDate::from_ymd_opt(2030, 1, 8).unwrap().and_hms_opt(0, 30, 0).unwrap();
        let wednesday_early = NaiveDate::from_ymd_opt(2030, 1, 9).unwrap().and_hms_opt(0, 30, 0).unwrap();

        assert!(!snapshot.is_open_at(tuesday_early).unwrap());
        assert!(snapshot.is_open_at(wednesday_early).unwrap());
    }

    #[test]
    fn test_promo_category_matching() {
        let mut promo = PromoOffer::default();
        assert!(promo.matches_category("Pizza"));
        assert!(!promo.matches_category("drink"));
        promo.item_category_filter = String::new();
        assert!(promo.matches_category("drink"));
    }

    #[test]
    fn test_setting_key_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!("nope".parse::<SettingKey>().is_err());
    }
}
