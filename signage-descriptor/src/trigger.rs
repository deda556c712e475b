//! Playlist item triggers and their localized description.
//!
//! The authoring UI offers four ways to start a playlist item: a recurring
//! wallclock time, an access key, a touch on another element and a
//! notification. [`compose`] builds the localized catalogue the UI renders;
//! [`ItemTrigger`] renders the matching SMIL `begin` expression, sharing the
//! repeat vocabulary with the standby schedule encoder.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Source of localized labels.
pub trait Localizer {
    /// Translate `key`, returning the key itself when it is unknown.
    fn translate(&self, key: &str) -> String;
}

/// Flat key/label translation catalogue with an optional fallback.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    entries: HashMap<String, String>,
    fallback: Option<Box<Translations>>,
}

impl Translations {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self {
            entries,
            fallback: None,
        }
    }

    /// Consult `fallback` for keys missing from this catalogue.
    pub fn with_fallback(mut self, fallback: Translations) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .or_else(|| self.fallback.as_ref().and_then(|f| f.lookup(key)))
    }
}

impl Localizer for Translations {
    fn translate(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }
}

impl Localizer for HashMap<String, String> {
    fn translate(&self, key: &str) -> String {
        self.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

/// Trigger kinds offered for a playlist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Wallclock,
    AccessKey,
    Touch,
    Notify,
}

impl TriggerType {
    pub const ALL: [TriggerType; 4] = [
        TriggerType::Wallclock,
        TriggerType::AccessKey,
        TriggerType::Touch,
        TriggerType::Notify,
    ];

    /// Translation key of the trigger's label.
    pub fn key(&self) -> &'static str {
        match self {
            TriggerType::Wallclock => "wallclock",
            TriggerType::AccessKey => "accesskey",
            TriggerType::Touch => "touch",
            TriggerType::Notify => "notify",
        }
    }
}

/// Unit of a repeat period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl RepeatUnit {
    pub const ALL: [RepeatUnit; 6] = [
        RepeatUnit::Minutes,
        RepeatUnit::Hours,
        RepeatUnit::Days,
        RepeatUnit::Weeks,
        RepeatUnit::Months,
        RepeatUnit::Years,
    ];

    /// Translation key of the unit's label.
    pub fn key(&self) -> &'static str {
        match self {
            RepeatUnit::Minutes => "minutes",
            RepeatUnit::Hours => "hours",
            RepeatUnit::Days => "days",
            RepeatUnit::Weeks => "weeks",
            RepeatUnit::Months => "months",
            RepeatUnit::Years => "years",
        }
    }

    /// ISO-8601 period for `count` units, e.g. `PT15M` or `P1W`.
    pub fn period(&self, count: u32) -> String {
        let count = count.max(1);
        match self {
            RepeatUnit::Minutes => format!("PT{}M", count),
            RepeatUnit::Hours => format!("PT{}H", count),
            RepeatUnit::Days => format!("P{}D", count),
            RepeatUnit::Weeks => format!("P{}W", count),
            RepeatUnit::Months => format!("P{}M", count),
            RepeatUnit::Years => format!("P{}Y", count),
        }
    }
}

/// How often a wallclock trigger repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    None,
    Infinite,
    Count(u32),
}

impl Repeat {
    /// Translation keys of the repeat choices, in UI order.
    pub const KEYS: [(&'static str, &'static str); 3] = [
        ("none", "repeat_none"),
        ("infinite", "repeat_infinite"),
        ("count", "repeat_count"),
    ];
}

/// A concrete trigger attached to a playlist item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemTrigger {
    Wallclock {
        start: NaiveDateTime,
        repeat: Repeat,
        every: u32,
        unit: RepeatUnit,
    },
    AccessKey(char),
    Touch {
        target: String,
    },
    Notify(String),
}

impl fmt::Display for ItemTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemTrigger::Wallclock {
                start,
                repeat,
                every,
                unit,
            } => {
                let start = start.format("%Y-%m-%dT%H:%M:%S");
                match repeat {
                    Repeat::None => write!(f, "wallclock({})", start),
                    Repeat::Infinite => write!(f, "wallclock(R/{}/{})", start, unit.period(*every)),
                    Repeat::Count(n) => {
                        write!(f, "wallclock(R{}/{}/{})", n, start, unit.period(*every))
                    }
                }
            }
            ItemTrigger::AccessKey(key) => write!(f, "accesskey({})", key),
            ItemTrigger::Touch { target } => write!(f, "{}.activateEvent", target),
            ItemTrigger::Notify(topic) => write!(f, "notify({})", topic),
        }
    }
}

/// Join item triggers into a SMIL `begin` attribute value.
pub fn begin_expression(triggers: &[ItemTrigger]) -> String {
    triggers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Label, "add" and "remove" texts for one trigger kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerLabels {
    pub kind: TriggerType,
    pub label: String,
    pub add: String,
    pub remove: String,
}

/// A selectable option with a localized label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledOption<T> {
    pub value: T,
    pub label: String,
}

/// Weekday choice; index 0 is Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayOption {
    pub index: u8,
    pub label: String,
}

/// Localized trigger catalogue for one playlist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerDescription {
    pub item_id: String,
    pub triggers: Vec<TriggerLabels>,
    pub repeat_label: String,
    pub repeats: Vec<LabeledOption<&'static str>>,
    pub units: Vec<LabeledOption<RepeatUnit>>,
    pub weekdays: Vec<WeekdayOption>,
}

/// Weekday name keys, Sunday first.
pub const WEEKDAY_KEYS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Compose the trigger description for `item_id`.
pub fn compose(item_id: &str, strings: &dyn Localizer) -> TriggerDescription {
    let triggers = TriggerType::ALL
        .iter()
        .map(|kind| TriggerLabels {
            kind: *kind,
            label: strings.translate(kind.key()),
            add: strings.translate(&format!("add_{}", kind.key())),
            remove: strings.translate(&format!("remove_{}", kind.key())),
        })
        .collect();

    let repeats = Repeat::KEYS
        .iter()
        .map(|(value, key)| LabeledOption {
            value: *value,
            label: strings.translate(key),
        })
        .collect();

    let units = RepeatUnit::ALL
        .iter()
        .map(|unit| LabeledOption {
            value: *unit,
            label: strings.translate(unit.key()),
        })
        .collect();

    let weekdays = WEEKDAY_KEYS
        .iter()
        .zip(0u8..)
        .map(|(key, index)| WeekdayOption {
            index,
            label: strings.translate(key),
        })
        .collect();

    TriggerDescription {
        item_id: item_id.to_string(),
        triggers,
        repeat_label: strings.translate("repeat"),
        repeats,
        units,
        weekdays,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn german() -> Translations {
        let entries = [
            ("wallclock", "Uhrzeit"),
            ("add_wallclock", "Uhrzeit hinzufügen"),
            ("sunday", "Sonntag"),
            ("monday", "Montag"),
            ("weeks", "Wochen"),
        ];
        Translations::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_compose_catalogue_shape() {
        let desc = compose("item-17", &german());
        assert_eq!(desc.item_id, "item-17");
        assert_eq!(desc.triggers.len(), 4);
        assert_eq!(desc.repeats.len(), 3);
        assert_eq!(desc.units.len(), 6);
        assert_eq!(desc.weekdays.len(), 7);
        assert_eq!(
            desc.weekdays.iter().map(|w| w.index).collect::<Vec<_>>(),
            (0..7).collect::<Vec<u8>>()
        );
    }

    #[test]
    fn test_compose_translates_and_falls_back_to_key() {
        let desc = compose("1", &german());
        assert_eq!(desc.triggers[0].label, "Uhrzeit");
        assert_eq!(desc.triggers[0].add, "Uhrzeit hinzufügen");
        assert_eq!(desc.triggers[0].remove, "remove_wallclock");
        assert_eq!(desc.triggers[1].label, "accesskey");
        assert_eq!(desc.weekdays[0].label, "Sonntag");
        assert_eq!(desc.weekdays[6].label, "saturday");
        assert_eq!(desc.units[3].label, "Wochen");
        assert_eq!(desc.repeats[1].value, "infinite");
    }

    #[test]
    fn test_translations_fallback_chain() {
        let english = Translations::new(
            [("tuesday".to_string(), "Tuesday".to_string())].into_iter().collect(),
        );
        let strings = german().with_fallback(english);
        assert_eq!(strings.translate("monday"), "Montag");
        assert_eq!(strings.translate("tuesday"), "Tuesday");
        assert_eq!(strings.translate("friday"), "friday");
        assert_eq!(strings.len(), german().len());
        assert!(Translations::default().is_empty());
    }

    #[test]
    fn test_period_designators() {
        assert_eq!(RepeatUnit::Minutes.period(15), "PT15M");
        assert_eq!(RepeatUnit::Hours.period(2), "PT2H");
        assert_eq!(RepeatUnit::Days.period(1), "P1D");
        assert_eq!(RepeatUnit::Weeks.period(1), "P1W");
        assert_eq!(RepeatUnit::Months.period(3), "P3M");
        assert_eq!(RepeatUnit::Years.period(0), "P1Y");
    }

    #[test]
    fn test_wallclock_trigger_expressions() {
        let once = ItemTrigger::Wallclock {
            start: start(),
            repeat: Repeat::None,
            every: 1,
            unit: RepeatUnit::Days,
        };
        assert_eq!(once.to_string(), "wallclock(2024-05-01T08:30:00)");

        let forever = ItemTrigger::Wallclock {
            start: start(),
            repeat: Repeat::Infinite,
            every: 1,
            unit: RepeatUnit::Weeks,
        };
        assert_eq!(forever.to_string(), "wallclock(R/2024-05-01T08:30:00/P1W)");

        let counted = ItemTrigger::Wallclock {
            start: start(),
            repeat: Repeat::Count(5),
            every: 30,
            unit: RepeatUnit::Minutes,
        };
        assert_eq!(counted.to_string(), "wallclock(R5/2024-05-01T08:30:00/PT30M)");
    }

    #[test]
    fn test_begin_expression_joins_triggers() {
        let triggers = vec![
            ItemTrigger::AccessKey('a'),
            ItemTrigger::Touch {
                target: "logo".to_string(),
            },
            ItemTrigger::Notify("emergency".to_string()),
        ];
        assert_eq!(
            begin_expression(&triggers),
            "accesskey(a);logo.activateEvent;notify(emergency)"
        );
        assert_eq!(begin_expression(&[]), "");
    }

    #[test]
    fn test_description_serializes_snake_case() {
        let desc = compose("9", &HashMap::<String, String>::new());
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["triggers"][1]["kind"], "access_key");
        assert_eq!(json["units"][0]["value"], "minutes");
    }
}
