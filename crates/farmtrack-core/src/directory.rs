//! Reference resolution for weak farm/crop ids.

use crate::id::{CropId, FarmId};
use crate::record::{Crop, Farm};
use std::collections::HashMap;

/// Label for expenses not charged to any farm.
pub const GENERAL_LABEL: &str = "General";
/// Label for a farm id that resolves to nothing.
pub const UNKNOWN_FARM_LABEL: &str = "Unknown Farm";
/// Label for a crop id that resolves to nothing.
pub const UNKNOWN_CROP_LABEL: &str = "Unknown Crop";

/// Hash index over farms and crops, built once per computation.
///
/// Duplicate ids keep the first record seen.
#[derive(Debug, Clone, Default)]
pub struct Directory<'a> {
    farms: HashMap<FarmId, &'a Farm>,
    crops: HashMap<CropId, &'a Crop>,
}

impl<'a> Directory<'a> {
    /// Index the given collections.
    #[must_use]
    pub fn new(farms: &'a [Farm], crops: &'a [Crop]) -> Self {
        let mut directory = Self {
            farms: HashMap::with_capacity(farms.len()),
            crops: HashMap::with_capacity(crops.len()),
        };
        for farm in farms {
            directory.farms.entry(farm.id).or_insert(farm);
        }
        for crop in crops {
            directory.crops.entry(crop.id).or_insert(crop);
        }
        directory
    }

    /// Look up a farm.
    #[must_use]
    pub fn farm(&self, id: FarmId) -> Option<&'a Farm> {
        self.farms.get(&id).copied()
    }

    /// Look up a crop.
    #[must_use]
    pub fn crop(&self, id: CropId) -> Option<&'a Crop> {
        self.crops.get(&id).copied()
    }

    /// Name of the referenced farm, if both the reference and the farm exist.
    #[must_use]
    pub fn farm_name(&self, id: Option<FarmId>) -> Option<&'a str> {
        id.and_then(|id| self.farm(id)).map(|farm| farm.name.as_str())
    }

    /// Display label for an optional farm reference.
    #[must_use]
    pub fn farm_label(&self, id: Option<FarmId>) -> String {
        match id {
            None => GENERAL_LABEL.to_owned(),
            Some(id) => self
                .farm(id)
                .map_or_else(|| UNKNOWN_FARM_LABEL.to_owned(), |farm| farm.name.clone()),
        }
    }

    /// Display label for an optional crop reference.
    #[must_use]
    pub fn crop_label(&self, id: Option<CropId>) -> String {
        id.and_then(|id| self.crop(id))
            .map_or_else(|| UNKNOWN_CROP_LABEL.to_owned(), crop_label)
    }
}

/// `"<cropName> - <variety>"`.
#[must_use]
pub fn crop_label(crop: &Crop) -> String {
    format!("{} - {}", crop.crop_name, crop.variety)
}
