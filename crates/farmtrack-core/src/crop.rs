use crate::id::FarmId;
use crate::record::{Crop, CropStatus, Farm};
use crate::temporal::normalize;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use time::OffsetDateTime;

/// Time left until a crop's expected harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarvestCountdown {
    /// Expected harvest date has passed.
    PastDue,
    /// Harvest is expected today.
    Today,
    /// Whole days remaining.
    InDays(i64),
}

impl fmt::Display for HarvestCountdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PastDue => f.write_str("Past due"),
            Self::Today => f.write_str("Today"),
            Self::InDays(days) => write!(f, "{days} days"),
        }
    }
}

/// Countdown for crops still in the field with a readable harvest date.
#[must_use]
pub fn harvest_countdown(crop: &Crop, now: OffsetDateTime) -> Option<HarvestCountdown> {
    if crop.status == CropStatus::Harvested {
        return None;
    }
    let harvest = normalize(&crop.expected_harvest_date).calendar_date(now.offset())?;
    let days = (harvest - now.date()).whole_days();
    Some(match days {
        d if d < 0 => HarvestCountdown::PastDue,
        0 => HarvestCountdown::Today,
        d => HarvestCountdown::InDays(d),
    })
}

/// Crops that are growing or flowering.
#[must_use]
pub fn active_crops(crops: &[Crop]) -> Vec<&Crop> {
    crops.iter().filter(|crop| crop.status.is_active()).collect()
}

/// Crops matching an optional farm and an optional status.
#[must_use]
pub fn filter_crops(crops: &[Crop], farm: Option<FarmId>, status: Option<CropStatus>) -> Vec<&Crop> {
    crops
        .iter()
        .filter(|crop| farm.is_none_or(|farm| crop.farm_id == Some(farm)))
        .filter(|crop| status.is_none_or(|status| crop.status == status))
        .collect()
}

/// Crop totals for one farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FarmCropCounts {
    /// Farm the counts belong to.
    pub farm_id: FarmId,
    /// Every crop planted on the farm.
    pub total: usize,
    /// Crops still growing or flowering.
    pub active: usize,
}

/// Per-farm crop counts in farm order. Crops on unknown farms are ignored.
#[must_use]
pub fn farm_crop_counts(farms: &[Farm], crops: &[Crop]) -> Vec<FarmCropCounts> {
    let mut counts: HashMap<FarmId, (usize, usize)> = HashMap::with_capacity(farms.len());
    for crop in crops {
        let Some(farm_id) = crop.farm_id else {
            continue;
        };
        let entry = counts.entry(farm_id).or_default();
        entry.0 += 1;
        if crop.status.is_active() {
            entry.1 += 1;
        }
    }
    farms
        .iter()
        .map(|farm| {
            let (total, active) = counts.get(&farm.id).copied().unwrap_or_default();
            FarmCropCounts {
                farm_id: farm.id,
                total,
                active,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::CropId;
    use crate::record::AreaUnit;
    use crate::temporal::DateValue;
    use time::macros::datetime;

    fn crop(id: u64, farm: u64, status: CropStatus, harvest: &str) -> Crop {
        Crop {
            id: CropId(id),
            farm_id: Some(FarmId(farm)),
            crop_name: "Beans".into(),
            variety: "Pinto".into(),
            planting_date: DateValue::text("2024-04-01"),
            expected_harvest_date: DateValue::text(harvest),
            area_planted: 2.0,
            status,
            notes: None,
        }
    }

    fn farm(id: u64) -> Farm {
        Farm {
            id: FarmId(id),
            name: format!("Farm {id}"),
            location: String::new(),
            total_area: 1.0,
            unit: AreaUnit::Acres,
            notes: None,
            created_at: DateValue::Absent,
        }
    }

    #[test]
    fn countdown_reports_days_today_and_past_due() {
        let now = datetime!(2024-06-15 18:00 UTC);
        let growing = |harvest| crop(1, 1, CropStatus::Growing, harvest);
        assert_eq!(harvest_countdown(&growing("2024-06-25"), now), Some(HarvestCountdown::InDays(10)));
        assert_eq!(harvest_countdown(&growing("2024-06-15"), now), Some(HarvestCountdown::Today));
        assert_eq!(harvest_countdown(&growing("2024-06-14"), now), Some(HarvestCountdown::PastDue));
        assert_eq!(harvest_countdown(&growing(""), now), None);
        assert_eq!(
            harvest_countdown(&crop(1, 1, CropStatus::Harvested, "2024-06-25"), now),
            None
        );
        assert_eq!(HarvestCountdown::InDays(3).to_string(), "3 days");
        assert_eq!(HarvestCountdown::PastDue.to_string(), "Past due");
    }

    #[test]
    fn counts_total_and_active_crops_per_farm() {
        let farms = vec![farm(1), farm(2)];
        let crops = vec![
            crop(1, 1, CropStatus::Growing, ""),
            crop(2, 1, CropStatus::Harvested, ""),
            crop(3, 1, CropStatus::Flowering, ""),
            crop(4, 9, CropStatus::Growing, ""),
        ];
        let counts = farm_crop_counts(&farms, &crops);
        assert_eq!(
            counts,
            vec![
                FarmCropCounts { farm_id: FarmId(1), total: 3, active: 2 },
                FarmCropCounts { farm_id: FarmId(2), total: 0, active: 0 },
            ]
        );
        assert_eq!(active_crops(&crops).len(), 3);
    }

    #[test]
    fn filters_by_farm_and_status() {
        let crops = vec![
            crop(1, 1, CropStatus::Growing, ""),
            crop(2, 2, CropStatus::Growing, ""),
            crop(3, 1, CropStatus::Failed, ""),
        ];
        assert_eq!(filter_crops(&crops, None, None).len(), 3);
        assert_eq!(filter_crops(&crops, Some(FarmId(1)), None).len(), 2);
        let failed = filter_crops(&crops, Some(FarmId(1)), Some(CropStatus::Failed));
        assert_eq!(failed.iter().map(|crop| crop.id).collect::<Vec<_>>(), vec![CropId(3)]);
    }
}
