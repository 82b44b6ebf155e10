use crate::types::forecast::ForecastTarget;
use crate::types::parameter::ParameterCode;
use chrono::{DateTime, Utc};

/// What a cached value was fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Current(u32),
    Forecast(ForecastTarget),
    History(u32),
    Comparison(Vec<u32>),
}

/// Identifies one cached fetch: scope, parameter set and (for windows) the covered interval.
///
/// The parameter set is sorted and deduplicated so that the order a caller listed parameters in
/// does not matter. An empty set means "everything the source returns".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scope: CacheScope,
    pub parameters: Vec<ParameterCode>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

impl CacheKey {
    /// A key covering every parameter and no particular window.
    pub fn new(scope: CacheScope) -> Self {
        Self {
            scope,
            parameters: Vec::new(),
            window_start: None,
            window_end: None,
        }
    }

    pub fn with_parameters(mut self, parameters: &[ParameterCode]) -> Self {
        let mut parameters = parameters.to_vec();
        parameters.sort();
        parameters.dedup();
        self.parameters = parameters;
        self
    }

    /// Restricts the key to the interval `[start, end)`.
    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window_start = Some(start);
        self.window_end = Some(end);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parameter_order_does_not_change_the_key() {
        let a = CacheKey::new(CacheScope::Current(1))
            .with_parameters(&[ParameterCode::WindSpeed, ParameterCode::AirTemperature]);
        let b = CacheKey::new(CacheScope::Current(1)).with_parameters(&[
            ParameterCode::AirTemperature,
            ParameterCode::WindSpeed,
            ParameterCode::WindSpeed,
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_window_bounds_are_part_of_the_key() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let key = CacheKey::new(CacheScope::History(1)).with_window(start, end);
        assert_ne!(key, CacheKey::new(CacheScope::History(1)));
        assert_ne!(key, CacheKey::new(CacheScope::History(2)).with_window(start, end));
    }
}
