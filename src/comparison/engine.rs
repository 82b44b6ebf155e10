use crate::error::{InvalidInput, MeteoHubError};
use crate::history::assembler::WindowAssembler;
use crate::stations::registry::StationRegistry;
use crate::types::comparison::{ComparisonReport, ComparisonSeries};
use crate::types::parameter::ParameterCode;
use crate::types::series::SeriesBundle;
use crate::types::window::ComparisonPeriod;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use log::{info, warn};
use std::sync::Arc;

/// Lines up the latest windows of several stations parameter by parameter.
#[derive(Clone)]
pub struct ComparisonEngine {
    registry: Arc<StationRegistry>,
    assembler: Arc<WindowAssembler>,
}

impl ComparisonEngine {
    pub fn new(registry: Arc<StationRegistry>, assembler: Arc<WindowAssembler>) -> Self {
        Self {
            registry,
            assembler,
        }
    }

    /// Compares the latest `period` of every station in `station_ids`.
    pub async fn compare(
        &self,
        station_ids: &[u32],
        period: ComparisonPeriod,
        parameters: &[ParameterCode],
    ) -> Result<ComparisonReport, MeteoHubError> {
        self.compare_at(station_ids, period, parameters, Utc::now())
            .await
    }

    /// Fetches every station's window ending at the hour of `now` and reshapes the result.
    ///
    /// Unknown stations and stations whose window could not be fetched are listed in
    /// [`ComparisonReport::omitted`]; only internal faults abort the whole comparison.
    pub async fn compare_at(
        &self,
        station_ids: &[u32],
        period: ComparisonPeriod,
        parameters: &[ParameterCode],
        now: DateTime<Utc>,
    ) -> Result<ComparisonReport, MeteoHubError> {
        let mut unique: Vec<u32> = Vec::with_capacity(station_ids.len());
        for id in station_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            return Err(InvalidInput::NoStations.into());
        }

        let fetches = unique.iter().map(|&id| async move {
            let Some(station) = self.registry.lookup(id) else {
                return (id, None);
            };
            let outcome = self
                .assembler
                .latest_window_at(station, period.hours(), now)
                .await;
            (id, Some(outcome))
        });
        let outcomes = join_all(fetches).await;

        let mut report = ComparisonReport::default();
        let mut bundles: Vec<SeriesBundle> = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                None => {
                    warn!("Omitting unknown station {} from comparison", id);
                    report.omitted.push(id);
                }
                Some(Ok(window)) => {
                    if window.is_partial() {
                        report.partial.push(id);
                    }
                    bundles.push(window.bundle);
                }
                Some(Err(e)) if e.is_upstream_unavailable() => {
                    warn!("Omitting station {} from comparison: {}", id, e);
                    report.omitted.push(id);
                }
                Some(Err(e)) => return Err(e),
            }
        }

        report.series = group_by_parameter(&bundles, parameters);
        info!(
            "Compared {} stations over {}: {} parameters, {} omitted",
            bundles.len(),
            period,
            report.series.len(),
            report.omitted.len()
        );
        Ok(report)
    }
}

/// Turns per-station bundles into one [`ComparisonSeries`] per parameter.
///
/// Parameters appear in the order they are first met; a parameter only gets a series if at
/// least one station has a non-empty series for it. Unit and display name are taken from the
/// first station that reported it. A non-empty `parameters` filter restricts the output.
pub fn group_by_parameter(
    bundles: &[SeriesBundle],
    parameters: &[ParameterCode],
) -> Vec<ComparisonSeries> {
    let mut grouped: Vec<ComparisonSeries> = Vec::new();
    for bundle in bundles {
        for series in bundle.series.iter().filter(|s| !s.is_empty()) {
            if !parameters.is_empty() && !parameters.contains(&series.parameter_code) {
                continue;
            }
            let entry = (bundle.station_id, series.clone());
            match grouped
                .iter_mut()
                .find(|c| c.parameter_code == series.parameter_code)
            {
                Some(existing) => existing.per_station.push(entry),
                None => grouped.push(ComparisonSeries {
                    parameter_code: series.parameter_code,
                    unit: series.unit.clone(),
                    display_name: series.parameter_code.display_name().to_string(),
                    per_station: vec![entry],
                }),
            }
        }
    }
    grouped
}
