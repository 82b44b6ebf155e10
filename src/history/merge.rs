use crate::types::parameter::ParameterCode;
use crate::types::series::{ObservationPoint, SeriesBundle};
use crate::types::window::{truncate_to_hour, ChunkSpan, HistoricalWindowRequest};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Stitches chunk bundles into one bundle covering `request`.
///
/// Timestamps are snapped to the full hour and points outside the window are dropped. When two
/// chunks deliver the same hour, the chunk whose start lies closer to that hour wins; on a tie the
/// later chunk wins. Parameters keep the order in which they first appear, walking the chunks
/// from earliest to latest.
pub fn merge_chunks(
    request: &HistoricalWindowRequest,
    chunks: &[(ChunkSpan, SeriesBundle)],
) -> SeriesBundle {
    let mut ordered: Vec<&(ChunkSpan, SeriesBundle)> = chunks.iter().collect();
    ordered.sort_by_key(|(span, _)| span.start);

    // (distance from the owning chunk's start in seconds, point)
    let mut slots: Vec<(ParameterCode, BTreeMap<DateTime<Utc>, (i64, ObservationPoint)>)> =
        Vec::new();

    for (span, bundle) in ordered {
        for series in &bundle.series {
            let idx = match slots.iter().position(|(code, _)| *code == series.parameter_code) {
                Some(idx) => idx,
                None => {
                    slots.push((series.parameter_code, BTreeMap::new()));
                    slots.len() - 1
                }
            };
            let by_hour = &mut slots[idx].1;

            for point in series.points() {
                let hour = truncate_to_hour(point.timestamp);
                if !request.contains(hour) {
                    continue;
                }
                let distance = (hour - span.start).num_seconds().abs();
                let keep_existing = by_hour
                    .get(&hour)
                    .is_some_and(|(existing, _)| *existing < distance);
                if !keep_existing {
                    by_hour.insert(hour, (distance, ObservationPoint::new(hour, point.value)));
                }
            }
        }
    }

    let mut merged = SeriesBundle::new(request.station_id);
    for (code, by_hour) in slots {
        let series = merged.get_or_insert(code);
        for (_, (_, point)) in by_hour {
            series.push(point);
        }
    }
    merged
}
