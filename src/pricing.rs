// Costing: derives the traveller count and the package total from the per-head inputs
// entered in the costing step of the itinerary builder.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// Digit grouping convention used when formatting a derived total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// en-IN: last three digits, then pairs (`12,34,567`)
    #[default]
    Indian,
    /// Thousands (`1,234,567`)
    Western,
}

impl FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indian" | "en-in" => Ok(Grouping::Indian),
            "western" | "en-us" | "en-gb" => Ok(Grouping::Western),
            other => Err(format!("unknown grouping '{}'", other)),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Indian => write!(f, "indian"),
            Grouping::Western => write!(f, "western"),
        }
    }
}

// Pricing configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub grouping: Grouping,
    pub suffix: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            grouping: Grouping::Indian,
            suffix: "/-".to_string(),
        }
    }
}

// Nights spent at one destination, shown in the costing table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NightStay {
    pub destination: String,
    #[serde(deserialize_with = "lenient_count")]
    pub nights: i64,
}

/// The costing record of an itinerary.
///
/// Prices are free text as typed by the agent ("Rs. 5,000/-"); only their digits count.
/// `total_travelers` is derived and `total_cost` is either derived or a manual override
/// such as "Price on Request". Wire names follow the stored itinerary documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostInputs {
    #[serde(rename = "totalPax", deserialize_with = "lenient_count")]
    pub total_travelers: i64,
    #[serde(rename = "adults", deserialize_with = "lenient_count")]
    pub adult_count: i64,
    #[serde(rename = "children", deserialize_with = "lenient_count")]
    pub child_count: i64,
    #[serde(deserialize_with = "lenient_count")]
    pub rooms: i64,
    #[serde(rename = "extraBeds", deserialize_with = "lenient_count")]
    pub extra_bed_count: i64,
    #[serde(deserialize_with = "lenient_text")]
    pub extra_bed_price: String,
    #[serde(rename = "cnbCount", deserialize_with = "lenient_count")]
    pub child_no_bed_count: i64,
    #[serde(rename = "cnbPrice", deserialize_with = "lenient_text")]
    pub child_no_bed_price: String,
    #[serde(deserialize_with = "lenient_text")]
    pub per_adult_price: String,
    #[serde(deserialize_with = "lenient_text")]
    pub per_child_price: String,
    #[serde(deserialize_with = "lenient_text")]
    pub total_cost: String,
    pub night_breakup: Vec<NightStay>,
}

// Counts arrive from form inputs; anything that is not a number counts as zero
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f.trunc() as i64).unwrap_or(0),
        Value::Bool(b) => b as i64,
        _ => 0,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Extracts the integer value of a free-text price.
///
/// Every non-digit character is dropped and the remaining digits are read as one
/// base-10 number, so `"Rs. 5,000/-"` is `5000` and `"N/A"` is `0`. Never fails;
/// a digit run too long for `i64` saturates.
pub fn parse_price(raw: &str) -> i64 {
    raw.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit))
        })
}

// Formats an amount with the given digit grouping, without suffix
pub fn format_amount(amount: i64, grouping: Grouping) -> String {
    let digits = amount.unsigned_abs().to_string();
    let grouped = match grouping {
        Grouping::Indian => group_digits(&digits, 3, 2),
        Grouping::Western => group_digits(&digits, 3, 3),
    };

    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn group_digits(digits: &str, lead: usize, step: usize) -> String {
    if digits.len() <= lead {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - lead);
    let mut groups = vec![tail];
    let mut remaining = head;
    while remaining.len() > step {
        let (rest, group) = remaining.split_at(remaining.len() - step);
        groups.push(group);
        remaining = rest;
    }
    groups.push(remaining);
    groups.reverse();
    groups.join(",")
}

// Values derived from a cost record, before they are written back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedCost {
    pub total_travelers: i64,
    pub subtotal: i64,
}

// Outcome of a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Unchanged,
    Updated {
        travelers_changed: bool,
        total_cost_changed: bool,
    },
}

impl Reconciliation {
    pub fn is_updated(&self) -> bool {
        matches!(self, Reconciliation::Updated { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PricingReconciler {
    config: PricingConfig,
}

impl PricingReconciler {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn derive(&self, inputs: &CostInputs) -> DerivedCost {
        let line = |count: i64, price: &str| count.saturating_mul(parse_price(price));

        let subtotal = line(inputs.adult_count, &inputs.per_adult_price)
            .saturating_add(line(inputs.child_count, &inputs.per_child_price))
            .saturating_add(line(inputs.extra_bed_count, &inputs.extra_bed_price))
            .saturating_add(line(inputs.child_no_bed_count, &inputs.child_no_bed_price));

        DerivedCost {
            total_travelers: inputs.adult_count.saturating_add(inputs.child_count),
            subtotal,
        }
    }

    // Formatted total for a positive subtotal, None otherwise
    pub fn format_total(&self, subtotal: i64) -> Option<String> {
        (subtotal > 0).then(|| {
            format!(
                "{}{}",
                format_amount(subtotal, self.config.grouping),
                self.config.suffix
            )
        })
    }

    /// Brings `total_travelers` and `total_cost` in line with the current inputs.
    ///
    /// `total_cost` is only overwritten when the derived subtotal is positive, so a
    /// manual value survives while no prices are filled in. Nothing is written when
    /// both fields already hold the derived values.
    pub fn reconcile(&self, inputs: &mut CostInputs) -> Reconciliation {
        let derived = self.derive(inputs);
        let formatted = self.format_total(derived.subtotal);

        let travelers_changed = derived.total_travelers != inputs.total_travelers;
        let total_cost_changed = formatted
            .as_ref()
            .is_some_and(|total| *total != inputs.total_cost);

        if !travelers_changed && !total_cost_changed {
            return Reconciliation::Unchanged;
        }

        inputs.total_travelers = derived.total_travelers;
        if let Some(total) = formatted {
            inputs.total_cost = total;
        }

        debug!(
            travelers = inputs.total_travelers,
            subtotal = derived.subtotal,
            total_cost = %inputs.total_cost,
            "reconciled costing"
        );

        Reconciliation::Updated {
            travelers_changed,
            total_cost_changed,
        }
    }
}
