use crate::id::{CropId, ExpenseId, FarmId, IncomeId, TaskId};
use crate::temporal::DateValue;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a wire token names no known enum variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {token}")]
pub struct ParseVariantError {
    /// Name of the enum that was being parsed.
    pub kind: &'static str,
    /// Offending token as supplied.
    pub token: String,
}

fn normalize_token(token: &str) -> String {
    token.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// Unit used for a farm's total area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaUnit {
    /// Imperial acres.
    #[default]
    Acres,
    /// Metric hectares.
    Hectares,
    /// Square feet.
    SquareFeet,
    /// Square meters.
    SquareMeters,
}

impl AreaUnit {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acres => "acres",
            Self::Hectares => "hectares",
            Self::SquareFeet => "square-feet",
            Self::SquareMeters => "square-meters",
        }
    }
}

impl FromStr for AreaUnit {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "acres" | "acre" => Ok(Self::Acres),
            "hectares" | "hectare" => Ok(Self::Hectares),
            "square-feet" | "sqft" => Ok(Self::SquareFeet),
            "square-meters" | "sqm" => Ok(Self::SquareMeters),
            _ => Err(ParseVariantError {
                kind: "area unit",
                token: s.to_owned(),
            }),
        }
    }
}

/// Growth stage of a crop planting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStatus {
    /// Planted and growing.
    #[default]
    Growing,
    /// In bloom.
    Flowering,
    /// Harvest completed.
    Harvested,
    /// Planting was lost.
    Failed,
}

impl CropStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Growing => "growing",
            Self::Flowering => "flowering",
            Self::Harvested => "harvested",
            Self::Failed => "failed",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Growing => "Growing",
            Self::Flowering => "Flowering",
            Self::Harvested => "Harvested",
            Self::Failed => "Failed",
        }
    }

    /// A crop is active while it is still in the field.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Growing | Self::Flowering)
    }
}

impl FromStr for CropStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "growing" => Ok(Self::Growing),
            "flowering" => Ok(Self::Flowering),
            "harvested" => Ok(Self::Harvested),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseVariantError {
                kind: "crop status",
                token: s.to_owned(),
            }),
        }
    }
}

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal urgency.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseVariantError {
                kind: "priority",
                token: s.to_owned(),
            }),
        }
    }
}

/// A farm (land holding).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    /// Unique identifier.
    #[serde(rename = "Id")]
    pub id: FarmId,
    /// Display name.
    pub name: String,
    /// Free-form location.
    pub location: String,
    /// Total area expressed in `unit`.
    pub total_area: f64,
    /// Unit of `total_area`.
    pub unit: AreaUnit,
    /// Optional notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateValue,
}

/// A crop planted on a farm.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    /// Unique identifier.
    #[serde(rename = "Id")]
    pub id: CropId,
    /// Farm the crop is planted on (weak reference).
    pub farm_id: Option<FarmId>,
    /// Crop species, e.g. "Tomatoes".
    pub crop_name: String,
    /// Cultivar, e.g. "Cherokee Purple".
    pub variety: String,
    /// When the crop went into the ground.
    pub planting_date: DateValue,
    /// Expected harvest date, when known.
    pub expected_harvest_date: DateValue,
    /// Planted area.
    pub area_planted: f64,
    /// Growth stage.
    pub status: CropStatus,
    /// Optional notes.
    pub notes: Option<String>,
}

/// A farm chore with a due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier.
    #[serde(rename = "Id")]
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Associated farm (weak reference).
    pub farm_id: Option<FarmId>,
    /// Associated crop (weak reference).
    pub crop_id: Option<CropId>,
    /// Due date.
    pub due_date: DateValue,
    /// Urgency.
    pub priority: Priority,
    /// Whether the task is done.
    pub completed: bool,
    /// When the task was completed. Never set on an open task; a completed
    /// task loaded from a record without a timestamp carries `None`.
    pub completed_at: Option<DateValue>,
}

impl Task {
    /// Build an open task.
    #[must_use]
    pub fn open(id: TaskId, title: impl Into<String>, due_date: DateValue) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            farm_id: None,
            crop_id: None,
            due_date,
            priority: Priority::default(),
            completed: false,
            completed_at: None,
        }
    }

    /// Set the completion flag, keeping `completed_at` in step with it.
    pub fn set_completed(&mut self, completed: bool, at: DateValue) {
        self.completed = completed;
        self.completed_at = completed.then_some(at);
    }

    /// Flip the completion flag.
    pub fn toggle(&mut self, at: DateValue) {
        self.set_completed(!self.completed, at);
    }
}

/// Money spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Unique identifier.
    #[serde(rename = "Id")]
    pub id: ExpenseId,
    /// Date of the expense.
    pub date: DateValue,
    /// Free-form category, e.g. "Seeds".
    pub category: String,
    /// Amount spent; `None` when the stored value was not numeric.
    pub amount: Option<f64>,
    /// What the money was spent on.
    pub description: String,
    /// Farm the expense is charged to; `None` for general overhead.
    pub farm_id: Option<FarmId>,
}

/// Money earned from selling a harvest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    /// Unique identifier.
    #[serde(rename = "Id")]
    pub id: IncomeId,
    /// Date of sale.
    pub date: DateValue,
    /// Crop that was sold (weak reference).
    pub crop_id: Option<CropId>,
    /// Farm credited with the sale, when recorded.
    pub farm_id: Option<FarmId>,
    /// Units sold; `None` when the stored value was not numeric.
    pub quantity: Option<f64>,
    /// Price per unit; `None` when the stored value was not numeric.
    pub price_per_unit: Option<f64>,
    /// Buyer name.
    pub buyer: String,
}

impl Income {
    /// Revenue of this sale, always `quantity * price_per_unit`.
    ///
    /// Missing or non-finite factors count as zero, and so does a product
    /// that overflows; use [`Income::has_numeric_anomaly`] to detect them.
    #[must_use]
    pub fn total_amount(&self) -> f64 {
        let total = self.product();
        if total.is_finite() { total } else { 0.0 }
    }

    /// True when either factor failed numeric coercion or their product
    /// is not finite.
    #[must_use]
    pub fn has_numeric_anomaly(&self) -> bool {
        !is_usable(self.quantity)
            || !is_usable(self.price_per_unit)
            || !self.product().is_finite()
    }

    fn product(&self) -> f64 {
        coerce(self.quantity) * coerce(self.price_per_unit)
    }
}

/// Zero for missing or non-finite values.
#[must_use]
pub fn coerce(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// True for present, finite values.
#[must_use]
pub fn is_usable(value: Option<f64>) -> bool {
    value.is_some_and(f64::is_finite)
}
