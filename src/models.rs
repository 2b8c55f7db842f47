use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Category {
    A,
    M,
    B,
}

impl Category {
    /// Lane order, top to bottom.
    pub const ALL: [Category; 3] = [Category::A, Category::M, Category::B];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "A" => Some(Category::A),
            "M" => Some(Category::M),
            "B" => Some(Category::B),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Category::A => 0,
            Category::M => 1,
            Category::B => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::A => "A",
            Category::M => "M",
            Category::B => "B",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One customer's lifecycle as reported in the result history.
///
/// Decoding never fails on odd field values: ticks that are not numbers
/// become `None`, and the category is kept verbatim so that unknown values
/// can be skipped by the layout instead of rejected here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomerEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(
        rename = "tipo",
        alias = "category",
        default,
        deserialize_with = "lenient_string"
    )]
    pub category: String,
    #[serde(
        rename = "llegada",
        alias = "arrival_tick",
        default,
        deserialize_with = "lenient_tick"
    )]
    pub arrival_tick: Option<i64>,
    #[serde(
        rename = "inicio",
        alias = "service_start_tick",
        default,
        deserialize_with = "lenient_tick"
    )]
    pub service_start_tick: Option<i64>,
    #[serde(
        rename = "fin",
        alias = "service_end_tick",
        default,
        deserialize_with = "lenient_tick"
    )]
    pub service_end_tick: Option<i64>,
}

impl CustomerEvent {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn with_ticks(mut self, arrival: Option<i64>, start: Option<i64>, end: Option<i64>) -> Self {
        self.arrival_tick = arrival;
        self.service_start_tick = start;
        self.service_end_tick = end;
        self
    }

    pub fn lane(&self) -> Option<Category> {
        Category::parse(&self.category)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryStats {
    #[serde(rename = "llegaron", alias = "arrived", default)]
    pub arrived: u64,
    #[serde(rename = "atendidos", alias = "served", default)]
    pub served: u64,
    #[serde(rename = "no_atendidos", alias = "unserved", default)]
    pub unserved: u64,
}

/// Final payload of a finished simulation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResultPayload {
    #[serde(
        rename = "estadisticas",
        alias = "statistics",
        default,
        deserialize_with = "lenient_statistics"
    )]
    pub statistics: BTreeMap<String, CategoryStats>,
    #[serde(
        rename = "historial",
        alias = "history",
        default,
        deserialize_with = "lenient_history"
    )]
    pub history: Vec<CustomerEvent>,
}

impl ResultPayload {
    pub fn stats_for(&self, category: Category) -> Option<&CategoryStats> {
        self.statistics.get(category.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobStatus {
    pub running: bool,
    #[serde(rename = "pausado", alias = "paused")]
    pub paused: bool,
    #[serde(rename = "tiempo_total", alias = "total_ticks")]
    pub total_ticks: u64,
    #[serde(rename = "cola_tamaño", alias = "queue_size")]
    pub queue_size: u64,
    #[serde(rename = "logs_count", alias = "event_count")]
    pub event_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobResult {
    Pending,
    Ready(ResultPayload),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartAck {
    Started { run_id: Option<String> },
    AlreadyRunning,
    Rejected(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Probabilities {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "M")]
    pub m: f64,
    #[serde(rename = "B")]
    pub b: f64,
}

impl Probabilities {
    fn validate(&self, name: &str) -> Result<()> {
        for (category, value) in Category::ALL.iter().zip([self.a, self.m, self.b]) {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Validation(format!(
                    "{}.{} must be within 0..1 (got {})",
                    name, category, value
                )));
            }
        }
        Ok(())
    }
}

/// Optional overrides sent with a start request; omitted fields keep the
/// service's defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct StartParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiempo: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prob_llegada: Option<Probabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prob_servicio: Option<Probabilities>,
}

impl StartParams {
    pub fn validate(&self) -> Result<()> {
        if let Some(tiempo) = self.tiempo {
            if tiempo < 0 {
                return Err(Error::Validation(format!(
                    "tiempo must be >= 0 (got {})",
                    tiempo
                )));
            }
        }
        if let Some(probs) = &self.prob_llegada {
            probs.validate("prob_llegada")?;
        }
        if let Some(probs) = &self.prob_servicio {
            probs.validate("prob_servicio")?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tiempo.is_none() && self.prob_llegada.is_none() && self.prob_servicio.is_none()
    }
}

fn lenient_tick<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|tick| tick.is_finite())
                .map(|tick| tick.floor() as i64)
        }),
        _ => None,
    })
}

/// Anything but an array reads as no history; non-object entries are dropped.
fn lenient_history<'de, D>(deserializer: D) -> std::result::Result<Vec<CustomerEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(entries)) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// Anything but an object reads as no statistics; unreadable entries are dropped.
fn lenient_statistics<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, CategoryStats>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(entries)) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(category, stats)| {
            serde_json::from_value(stats)
                .ok()
                .map(|stats| (category, stats))
        })
        .collect())
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}
