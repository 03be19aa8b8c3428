//! The analytics payload served from a poll's read endpoint: response
//! totals, the best candidate slots, and the time-zone spread of the group.

use crate::poll::{hhmm, EngineError, ParticipantResponse, Poll};
use crate::rank::{aggregate_screened, rank_screened, screen, SkippedResponse, SlotScore};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// A top-ranked slot with its definition inlined, so API clients need no
/// second lookup to render it.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BestSlot {
    #[serde(rename = "slotIndex")]
    pub slot_index: usize,
    pub date: NaiveDate,
    #[serde(rename = "startTime", with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(rename = "endTime", with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(rename = "voteCount")]
    pub vote_count: usize,
    #[serde(rename = "compositeScore")]
    pub composite_score: f64,
    pub rank: usize,
}

/// Summary statistics over one poll + response snapshot.
///
/// Zone names in `timezone_distribution` are counted verbatim, never
/// bucketed by UTC offset: two zones that agree today can diverge at the
/// next DST transition. The `BTreeMap` keeps serialized output
/// byte-identical across calls.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PollAnalytics {
    #[serde(rename = "pollId")]
    pub poll_id: String,
    pub title: String,
    #[serde(rename = "totalResponses")]
    pub total_responses: usize,
    #[serde(rename = "bestTimeSlots")]
    pub best_time_slots: Vec<BestSlot>,
    #[serde(rename = "timezoneDistribution")]
    pub timezone_distribution: BTreeMap<String, usize>,
    #[serde(rename = "allSlotScores")]
    pub all_slot_scores: Vec<SlotScore>,
    pub skipped: Vec<SkippedResponse>,
}

/// How many of the ranked slots are surfaced as `bestTimeSlots`.
const BEST_SLOT_COUNT: usize = 3;

/// Derives the full analytics payload for a snapshot: aggregate, rank, then
/// shape for the API boundary.
///
/// `total_responses` counts the responses that were actually aggregated;
/// rejected ones are itemized in `skipped`. An empty poll yields empty
/// rankings, not an error.
///
/// # Errors
/// `EngineError::InvalidTimeZone` if the poll's reference zone is
/// unrecognized, or a slot invariant from `Poll::validate` is broken.
pub fn summarize(
    poll: &Poll,
    responses: &[ParticipantResponse],
) -> Result<PollAnalytics, EngineError> {
    poll.validate()?;

    // One screening pass per snapshot; aggregation, ranking, and the
    // distribution all reuse it.
    let (valid, skipped) = screen(poll, responses);
    let aggregation = aggregate_screened(poll, &valid, skipped);
    let all_slot_scores = rank_screened(poll, &aggregation, &valid)?;

    let mut timezone_distribution = BTreeMap::new();
    for screened in &valid {
        *timezone_distribution
            .entry(screened.response.time_zone.clone())
            .or_insert(0) += 1;
    }

    let best_time_slots = all_slot_scores
        .iter()
        .take(BEST_SLOT_COUNT)
        .map(|score| {
            let slot = &poll.time_slots[score.slot_index];
            BestSlot {
                slot_index: score.slot_index,
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                vote_count: score.vote_count,
                composite_score: score.composite_score,
                rank: score.rank,
            }
        })
        .collect();

    Ok(PollAnalytics {
        poll_id: poll.id.clone(),
        title: poll.title.clone(),
        total_responses: valid.len(),
        best_time_slots,
        timezone_distribution,
        all_slot_scores,
        skipped: aggregation.skipped,
    })
}
