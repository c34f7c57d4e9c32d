//! Loose persisted records to canonical shapes.
//!
//! Stored collections were written by more than one generation of tooling,
//! so the same field may arrive as a number, a numeric string, `null` or
//! under an older key. Everything here is forgiving: a bad field degrades
//! to its absent or default value. Only a record that is not an object or
//! has no usable id is dropped.

use farmtrack_core::id::{CropId, ExpenseId, FarmId, IncomeId, TaskId};
use farmtrack_core::{
    Crop, CropStatus, DateValue, Expense, Farm, Income, Priority, Task, WeatherCondition,
    WeatherDay,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Identifier keys accepted on read. The first is the one written back.
pub const ID_KEYS: [&str; 2] = ["Id", "id"];

/// Crop name keys accepted on read, current first.
const CROP_NAME_KEYS: [&str; 2] = ["cropName", "name"];

/// Why a stored record was left out.
#[derive(Debug, Error)]
enum Skip {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no usable id")]
    MissingId,
    #[error("record fields are malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFarm {
    name: Option<Value>,
    location: Option<Value>,
    total_area: Option<Value>,
    unit: Option<Value>,
    notes: Option<Value>,
    created_at: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCrop {
    farm_id: Option<Value>,
    variety: Option<Value>,
    planting_date: Option<Value>,
    expected_harvest_date: Option<Value>,
    area_planted: Option<Value>,
    status: Option<Value>,
    notes: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    title: Option<Value>,
    description: Option<Value>,
    farm_id: Option<Value>,
    crop_id: Option<Value>,
    due_date: Option<Value>,
    priority: Option<Value>,
    completed: Option<Value>,
    completed_at: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExpense {
    date: Option<Value>,
    category: Option<Value>,
    amount: Option<Value>,
    description: Option<Value>,
    farm_id: Option<Value>,
}

// A stored `totalAmount` is ignored; the total is always recomputed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIncome {
    date: Option<Value>,
    crop_id: Option<Value>,
    farm_id: Option<Value>,
    quantity: Option<Value>,
    price_per_unit: Option<Value>,
    buyer: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWeatherDay {
    date: Option<Value>,
    condition: Option<Value>,
    high: Option<Value>,
    low: Option<Value>,
    precipitation: Option<Value>,
    humidity: Option<Value>,
    wind_speed: Option<Value>,
}

/// Identifier of a stored record, read from `Id` or else `id`.
#[must_use]
pub fn record_id(value: &Value) -> Option<u64> {
    ID_KEYS.iter().find_map(|key| loose_id(value.get(key)))
}

fn fields<T: DeserializeOwned>(value: &Value) -> Result<T, Skip> {
    if !value.is_object() {
        return Err(Skip::NotAnObject);
    }
    Ok(T::deserialize(value)?)
}

fn identified<T: DeserializeOwned>(value: &Value) -> Result<(u64, T), Skip> {
    let raw = fields(value)?;
    let id = record_id(value).ok_or(Skip::MissingId)?;
    Ok((id, raw))
}

/// Adapt a single farm.
#[must_use]
pub fn farm(value: &Value) -> Option<Farm> {
    try_farm(value).ok()
}

fn try_farm(value: &Value) -> Result<Farm, Skip> {
    let (id, raw): (u64, RawFarm) = identified(value)?;
    Ok(Farm {
        id: FarmId(id),
        name: text(raw.name.as_ref()),
        location: text(raw.location.as_ref()),
        total_area: number_or_zero(raw.total_area.as_ref()),
        unit: variant(raw.unit.as_ref()),
        notes: optional_text(raw.notes.as_ref()),
        created_at: date(raw.created_at.as_ref()),
    })
}

/// Adapt a single crop planting. The name comes from `cropName`, else `name`.
#[must_use]
pub fn crop(value: &Value) -> Option<Crop> {
    try_crop(value).ok()
}

fn try_crop(value: &Value) -> Result<Crop, Skip> {
    let (id, raw): (u64, RawCrop) = identified(value)?;
    let crop_name = CROP_NAME_KEYS
        .iter()
        .find_map(|key| value.get(key).filter(|name| !name.is_null()));
    Ok(Crop {
        id: CropId(id),
        farm_id: loose_id(raw.farm_id.as_ref()).map(FarmId),
        crop_name: text(crop_name),
        variety: text(raw.variety.as_ref()),
        planting_date: date(raw.planting_date.as_ref()),
        expected_harvest_date: date(raw.expected_harvest_date.as_ref()),
        area_planted: number_or_zero(raw.area_planted.as_ref()),
        status: variant::<CropStatus>(raw.status.as_ref()),
        notes: optional_text(raw.notes.as_ref()),
    })
}

/// Adapt a single task.
///
/// A `completedAt` on an open task is dropped.
#[must_use]
pub fn task(value: &Value) -> Option<Task> {
    try_task(value).ok()
}

fn try_task(value: &Value) -> Result<Task, Skip> {
    let (id, raw): (u64, RawTask) = identified(value)?;
    let id = TaskId(id);
    let completed = flag(raw.completed.as_ref());
    let completed_at = if completed {
        let at = date(raw.completed_at.as_ref());
        if at.is_absent() {
            warn!(task = %id, "completed task has no completion timestamp");
            None
        } else {
            Some(at)
        }
    } else {
        if raw.completed_at.is_some() {
            debug!(task = %id, "dropping completion timestamp of open task");
        }
        None
    };
    Ok(Task {
        id,
        title: text(raw.title.as_ref()),
        description: optional_text(raw.description.as_ref()),
        farm_id: loose_id(raw.farm_id.as_ref()).map(FarmId),
        crop_id: loose_id(raw.crop_id.as_ref()).map(CropId),
        due_date: date(raw.due_date.as_ref()),
        priority: variant::<Priority>(raw.priority.as_ref()),
        completed,
        completed_at,
    })
}

/// Adapt a single expense.
#[must_use]
pub fn expense(value: &Value) -> Option<Expense> {
    try_expense(value).ok()
}

fn try_expense(value: &Value) -> Result<Expense, Skip> {
    let (id, raw): (u64, RawExpense) = identified(value)?;
    Ok(Expense {
        id: ExpenseId(id),
        date: date(raw.date.as_ref()),
        category: text(raw.category.as_ref()),
        amount: loose_number(raw.amount.as_ref()),
        description: text(raw.description.as_ref()),
        farm_id: loose_id(raw.farm_id.as_ref()).map(FarmId),
    })
}

/// Adapt a single income record.
#[must_use]
pub fn income(value: &Value) -> Option<Income> {
    try_income(value).ok()
}

fn try_income(value: &Value) -> Result<Income, Skip> {
    let (id, raw): (u64, RawIncome) = identified(value)?;
    Ok(Income {
        id: IncomeId(id),
        date: date(raw.date.as_ref()),
        crop_id: loose_id(raw.crop_id.as_ref()).map(CropId),
        farm_id: loose_id(raw.farm_id.as_ref()).map(FarmId),
        quantity: loose_number(raw.quantity.as_ref()),
        price_per_unit: loose_number(raw.price_per_unit.as_ref()),
        buyer: text(raw.buyer.as_ref()),
    })
}

/// Adapt a single forecast day. Weather days carry no identifier.
#[must_use]
pub fn weather_day(value: &Value) -> Option<WeatherDay> {
    try_weather_day(value).ok()
}

fn try_weather_day(value: &Value) -> Result<WeatherDay, Skip> {
    let raw: RawWeatherDay = fields(value)?;
    Ok(WeatherDay {
        date: date(raw.date.as_ref()),
        condition: variant::<WeatherCondition>(raw.condition.as_ref()),
        high: number_or_zero(raw.high.as_ref()),
        low: number_or_zero(raw.low.as_ref()),
        precipitation: number_or_zero(raw.precipitation.as_ref()),
        humidity: number_or_zero(raw.humidity.as_ref()),
        wind_speed: number_or_zero(raw.wind_speed.as_ref()),
    })
}

/// Adapt every farm, skipping unusable records.
#[must_use]
pub fn farms(values: &[Value]) -> Vec<Farm> {
    adapt_all("farms", values, try_farm)
}

/// Adapt every crop, skipping unusable records.
#[must_use]
pub fn crops(values: &[Value]) -> Vec<Crop> {
    adapt_all("crops", values, try_crop)
}

/// Adapt every task, skipping unusable records.
#[must_use]
pub fn tasks(values: &[Value]) -> Vec<Task> {
    adapt_all("tasks", values, try_task)
}

/// Adapt every expense, skipping unusable records.
#[must_use]
pub fn expenses(values: &[Value]) -> Vec<Expense> {
    adapt_all("expenses", values, try_expense)
}

/// Adapt every income record, skipping unusable records.
#[must_use]
pub fn income_records(values: &[Value]) -> Vec<Income> {
    adapt_all("income", values, try_income)
}

/// Adapt every forecast day, skipping non-object entries.
#[must_use]
pub fn weather(values: &[Value]) -> Vec<WeatherDay> {
    adapt_all("weather", values, try_weather_day)
}

fn adapt_all<T>(
    collection: &'static str,
    values: &[Value],
    adapt: fn(&Value) -> Result<T, Skip>,
) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            adapt(value)
                .inspect_err(|reason| warn!(collection, index, %reason, "skipping record"))
                .ok()
        })
        .collect()
}

fn loose_id(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn loose_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn number_or_zero(value: Option<&Value>) -> f64 {
    loose_number(value).unwrap_or(0.0)
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        other => Some(text(Some(other))),
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

// Integral numbers are epoch milliseconds; anything else is left for the
// normalizer to reject.
fn date(value: Option<&Value>) -> DateValue {
    match value {
        Some(Value::String(text)) => DateValue::Text(text.clone()),
        Some(Value::Number(number)) => number
            .as_i64()
            .map_or_else(|| DateValue::Text(number.to_string()), DateValue::EpochMillis),
        _ => DateValue::Absent,
    }
}

fn variant<T>(value: Option<&Value>) -> T
where
    T: FromStr + Default,
{
    match value {
        Some(Value::String(token)) => token.parse().unwrap_or_else(|_| {
            debug!(token = %token, "unknown variant; using default");
            T::default()
        }),
        _ => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmtrack_core::AreaUnit;
    use serde_json::json;

    #[test]
    fn accepts_either_identifier_key() {
        let upper = farm(&json!({"Id": 3, "name": "North"}))
            .unwrap_or_else(|| panic!("farm with Id"));
        let lower = farm(&json!({"id": "4", "name": "South"}))
            .unwrap_or_else(|| panic!("farm with id"));
        assert_eq!(upper.id, FarmId(3));
        assert_eq!(lower.id, FarmId(4));
        assert_eq!(record_id(&json!({"id": " 9 "})), Some(9));
    }

    #[test]
    fn records_without_usable_id_are_skipped() {
        let adapted = farms(&[
            json!({"name": "no id"}),
            json!({"Id": "abc"}),
            json!({"Id": -1}),
            json!("not an object"),
            json!({"Id": 1, "name": "kept"}),
        ]);
        assert_eq!(adapted.len(), 1);
        assert_eq!(adapted[0].name, "kept");
    }

    #[test]
    fn records_carrying_both_id_keys_are_kept() {
        let adapted = tasks(&[
            json!({"Id": 1, "id": 1, "title": "Irrigate", "dueDate": "2024-06-15"}),
            json!({"Id": 2, "title": "Fence"}),
        ]);
        assert_eq!(adapted.len(), 2);
        assert_eq!(adapted[0].id, TaskId(1));
        assert_eq!(adapted[0].due_date, DateValue::text("2024-06-15"));

        let both = farm(&json!({"Id": "7", "id": 3, "name": "East"})).unwrap_or_else(|| panic!("farm"));
        assert_eq!(both.id, FarmId(7));
        let fallback = expense(&json!({"Id": "abc", "id": 5})).unwrap_or_else(|| panic!("expense"));
        assert_eq!(fallback.id, ExpenseId(5));
    }

    #[test]
    fn crop_with_both_name_keys_prefers_crop_name() {
        let adapted = crops(&[json!({"Id": 1, "id": 1, "cropName": "Corn", "name": "Maize"})]);
        assert_eq!(adapted.len(), 1);
        assert_eq!(adapted[0].crop_name, "Corn");

        let null_current = crop(&json!({"Id": 2, "cropName": null, "name": "Kale"}))
            .unwrap_or_else(|| panic!("crop"));
        assert_eq!(null_current.crop_name, "Kale");
    }

    #[test]
    fn skip_reason_names_the_actual_cause() {
        assert!(matches!(try_task(&json!(["Id", 1])), Err(Skip::NotAnObject)));
        assert!(matches!(try_task(&json!({"title": "no id"})), Err(Skip::MissingId)));
        assert!(matches!(try_weather_day(&json!(7)), Err(Skip::NotAnObject)));
        assert_eq!(Skip::MissingId.to_string(), "record has no usable id");
    }

    #[test]
    fn crop_name_falls_back_to_name_key() {
        let legacy = crop(&json!({"Id": 1, "farmId": "2", "name": "Tomato"}))
            .unwrap_or_else(|| panic!("legacy crop"));
        assert_eq!(legacy.crop_name, "Tomato");
        assert_eq!(legacy.farm_id, Some(FarmId(2)));

        let current = crop(&json!({"Id": 1, "cropName": "Corn", "status": "flowering"}))
            .unwrap_or_else(|| panic!("current crop"));
        assert_eq!(current.crop_name, "Corn");
        assert_eq!(current.status, CropStatus::Flowering);
    }

    #[test]
    fn unknown_variants_use_defaults() {
        let farm = farm(&json!({"Id": 1, "unit": "furlongs"})).unwrap_or_else(|| panic!("farm"));
        assert_eq!(farm.unit, AreaUnit::Acres);
        let crop = crop(&json!({"Id": 1, "status": 7})).unwrap_or_else(|| panic!("crop"));
        assert_eq!(crop.status, CropStatus::Growing);
        let task = task(&json!({"Id": 1, "priority": "urgent"})).unwrap_or_else(|| panic!("task"));
        assert_eq!(task.priority, Priority::Medium);
        let day = weather_day(&json!({"condition": "hail"})).unwrap_or_else(|| panic!("day"));
        assert_eq!(day.condition, WeatherCondition::Sunny);
    }

    #[test]
    fn numbers_are_coerced_loosely() {
        let adapted = expenses(&[
            json!({"Id": 1, "amount": "12.5"}),
            json!({"Id": 2, "amount": 3}),
            json!({"Id": 3, "amount": "lots"}),
            json!({"Id": 4, "amount": null}),
            json!({"Id": 5, "amount": true}),
            json!({"Id": 6}),
        ]);
        let amounts: Vec<_> = adapted.iter().map(|expense| expense.amount).collect();
        assert_eq!(amounts, vec![Some(12.5), Some(3.0), None, None, None, None]);
    }

    #[test]
    fn stored_income_total_is_ignored() {
        let income = income(&json!({
            "Id": 1,
            "cropId": 2,
            "quantity": "10",
            "pricePerUnit": 2.5,
            "totalAmount": 999
        }))
        .unwrap_or_else(|| panic!("income"));
        assert!((income.total_amount() - 25.0).abs() < f64::EPSILON);
        assert_eq!(income.crop_id, Some(CropId(2)));
    }

    #[test]
    fn date_fields_accept_strings_numbers_and_null() {
        let task = task(&json!({"Id": 1, "dueDate": 1_718_409_600_000_i64}))
            .unwrap_or_else(|| panic!("task"));
        assert_eq!(task.due_date, DateValue::EpochMillis(1_718_409_600_000));
        let task = tasks(&[json!({"Id": 2, "dueDate": null})]);
        assert_eq!(task[0].due_date, DateValue::Absent);
        let task = tasks(&[json!({"Id": 3, "dueDate": "2024-06-15"})]);
        assert_eq!(task[0].due_date, DateValue::text("2024-06-15"));
    }

    #[test]
    fn stale_completion_timestamp_is_dropped() {
        let open = task(&json!({"Id": 1, "completed": false, "completedAt": "2024-06-01"}))
            .unwrap_or_else(|| panic!("open task"));
        assert!(!open.completed);
        assert_eq!(open.completed_at, None);

        let done = task(&json!({"Id": 2, "completed": true, "completedAt": "2024-06-01"}))
            .unwrap_or_else(|| panic!("done task"));
        assert_eq!(done.completed_at, Some(DateValue::text("2024-06-01")));

        let untimed = task(&json!({"Id": 3, "completed": true}))
            .unwrap_or_else(|| panic!("untimed task"));
        assert!(untimed.completed);
        assert_eq!(untimed.completed_at, None);
    }

    #[test]
    fn optional_text_keeps_empty_strings() {
        let task = task(&json!({"Id": 1, "description": "", "title": 42}))
            .unwrap_or_else(|| panic!("task"));
        assert_eq!(task.description.as_deref(), Some(""));
        assert_eq!(task.title, "42");
    }
}
