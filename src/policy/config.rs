use std::collections::{BTreeMap, BTreeSet};

use crate::records::HotelStandard;

/// Everything the evaluator compares rate plans against.
#[derive(Debug, Clone, Default)]
pub struct ComplianceStandards {
    standards: BTreeMap<String, HotelStandard>,
    city_tax_hotels: BTreeSet<String>,
    excluded_hotels: BTreeSet<String>,
    duplicate_hotels: Vec<String>,
}

impl ComplianceStandards {
    /// When a hotel appears twice the first standard is kept.
    pub fn new(standards: impl IntoIterator<Item = HotelStandard>) -> Self {
        let mut by_hotel = BTreeMap::new();
        let mut duplicate_hotels = Vec::new();

        for standard in standards {
            if by_hotel.contains_key(&standard.hotel_code) {
                duplicate_hotels.push(standard.hotel_code.clone());
                continue;
            }
            by_hotel.insert(standard.hotel_code.clone(), standard);
        }

        Self {
            standards: by_hotel,
            duplicate_hotels,
            ..Self::default()
        }
    }

    pub fn with_city_tax_hotels<I, S>(mut self, hotels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.city_tax_hotels = hotels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded_hotels<I, S>(mut self, hotels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_hotels = hotels.into_iter().map(Into::into).collect();
        self
    }

    pub fn standard_for(&self, hotel_code: &str) -> Option<&HotelStandard> {
        self.standards.get(hotel_code)
    }

    pub fn is_city_tax_hotel(&self, hotel_code: &str) -> bool {
        self.city_tax_hotels.contains(hotel_code)
    }

    pub fn is_excluded(&self, hotel_code: &str) -> bool {
        self.excluded_hotels.contains(hotel_code)
    }

    pub fn hotel_count(&self) -> usize {
        self.standards.len()
    }

    pub fn city_tax_hotels(&self) -> impl Iterator<Item = &str> {
        self.city_tax_hotels.iter().map(String::as_str)
    }

    /// Hotels with more than one standard row; all but the first were ignored.
    pub fn duplicate_hotels(&self) -> &[String] {
        &self.duplicate_hotels
    }
}
