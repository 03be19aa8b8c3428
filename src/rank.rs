use crate::poll::{EngineError, ParticipantResponse, Poll};
use crate::time::{parse_zone, to_instant, working_hours_band};
use chrono_tz::Tz;
use itertools::Itertools;
use log::{debug, trace};
use serde::Serialize;

/// Neutral fitness used when no valid response provides a time zone to
/// evaluate against.
const NEUTRAL_FITNESS: f64 = 0.5;

/// How many participants can make a slot, and who they are. Voter names are
/// sorted, so the tally is independent of submission order.
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct SlotTally {
    #[serde(rename = "slotIndex")]
    pub slot_index: usize,
    #[serde(rename = "voteCount")]
    pub vote_count: usize,
    #[serde(rename = "voterNames")]
    pub voter_names: Vec<String>,
}

/// A response excluded from aggregation, and why. Skipped responses never
/// contribute to any count; the caller decides how to surface them.
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct SkippedResponse {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    pub reason: EngineError,
}

/// Per-slot vote tallies plus the data-integrity report for the snapshot
/// they were computed from. `tallies` mirrors `Poll::time_slots` ordering.
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct Aggregation {
    pub tallies: Vec<SlotTally>,
    pub skipped: Vec<SkippedResponse>,
}

/// One slot's place in the final ranking. A pure projection of the current
/// poll + response snapshot; recomputed on every query.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SlotScore {
    #[serde(rename = "slotIndex")]
    pub slot_index: usize,
    #[serde(rename = "voteCount")]
    pub vote_count: usize,
    #[serde(rename = "workingHoursFitness")]
    pub working_hours_fitness: f64,
    #[serde(rename = "compositeScore")]
    pub composite_score: f64,
    pub rank: usize,
}

/// A response that passed screening, with its zone already resolved.
pub(crate) struct Screened<'a> {
    pub response: &'a ParticipantResponse,
    pub tz: Tz,
}

/// Splits a snapshot into responses the engine will count and responses it
/// must reject: availability vectors of the wrong length and unrecognized
/// time zones are skipped, never truncated, padded, or defaulted to UTC.
pub(crate) fn screen<'a>(
    poll: &Poll,
    responses: &'a [ParticipantResponse],
) -> (Vec<Screened<'a>>, Vec<SkippedResponse>) {
    let expected = poll.time_slots.len();
    let mut valid = Vec::with_capacity(responses.len());
    let mut skipped = Vec::new();

    for response in responses {
        let found = response.availability.len();
        if found != expected {
            trace!(
                "excluding response from {}: {} availability entries, {} slots",
                response.participant_id,
                found,
                expected
            );
            skipped.push(SkippedResponse {
                participant_id: response.participant_id.clone(),
                reason: EngineError::AvailabilityLengthMismatch {
                    participant: response.name.clone(),
                    expected,
                    found,
                },
            });
            continue;
        }

        match parse_zone(&response.time_zone) {
            Ok(tz) => valid.push(Screened { response, tz }),
            Err(reason) => {
                trace!(
                    "excluding response from {}: unrecognized zone {}",
                    response.participant_id,
                    response.time_zone
                );
                skipped.push(SkippedResponse {
                    participant_id: response.participant_id.clone(),
                    reason,
                });
            }
        }
    }

    (valid, skipped)
}

/// Folds the response snapshot into per-slot vote counts and voter lists.
///
/// Output order mirrors `poll.time_slots` (ascending slot index). Responses
/// that fail screening are reported in `skipped` and contribute to nothing.
/// Idempotent and side-effect-free.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use meetsync_engine::poll::{ParticipantResponse, Poll, TimeSlot};
/// use meetsync_engine::rank::aggregate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let slot = |h: u32| {
///     TimeSlot::new(
///         date,
///         NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
///         NaiveTime::from_hms_opt(h + 1, 0, 0).unwrap(),
///     )
/// };
/// let poll = Poll::new("p1", "Sync", vec![slot(9), slot(14)], "UTC");
///
/// let responses = vec![
///     ParticipantResponse::new("a", "Alex", "America/New_York", vec![true, false]),
///     ParticipantResponse::new("b", "Maria", "America/Los_Angeles", vec![true, true]),
/// ];
///
/// let aggregation = aggregate(&poll, &responses);
/// assert_eq!(aggregation.tallies[0].vote_count, 2);
/// assert_eq!(aggregation.tallies[1].vote_count, 1);
/// assert_eq!(aggregation.tallies[0].voter_names, vec!["Alex", "Maria"]);
/// assert!(aggregation.skipped.is_empty());
/// ```
pub fn aggregate(poll: &Poll, responses: &[ParticipantResponse]) -> Aggregation {
    let (valid, skipped) = screen(poll, responses);
    aggregate_screened(poll, &valid, skipped)
}

pub(crate) fn aggregate_screened(
    poll: &Poll,
    valid: &[Screened],
    skipped: Vec<SkippedResponse>,
) -> Aggregation {
    let mut tallies = (0..poll.time_slots.len())
        .map(|slot_index| SlotTally {
            slot_index,
            vote_count: 0,
            voter_names: vec![],
        })
        .collect_vec();

    for screened in valid {
        for (slot_index, _) in screened
            .response
            .availability
            .iter()
            .enumerate()
            .filter(|(_, &available)| available)
        {
            tallies[slot_index].vote_count += 1;
            tallies[slot_index]
                .voter_names
                .push(screened.response.name.clone());
        }
    }

    for tally in tallies.iter_mut() {
        tally.voter_names.sort_unstable();
    }

    debug!(
        "aggregated {} responses over {} slots ({} skipped)",
        valid.len(),
        poll.time_slots.len(),
        skipped.len()
    );

    Aggregation { tallies, skipped }
}

/// Ranks every slot, best first.
///
/// Each slot's instant is anchored in the poll's reference zone; its
/// working-hours fitness is the average score of that instant across every
/// screened-in responder's local clock, whether or not they voted for the
/// slot. A slot nobody finds convenient should not rank highly just because
/// two people happened to be free.
///
/// `compositeScore = voteCount + workingHoursFitness`: votes dominate by
/// integer weight, fitness breaks ties within a vote count, and remaining
/// ties break on ascending slot index. The result is a total order,
/// byte-identical across calls for the same snapshot.
///
/// # Errors
/// `EngineError::InvalidTimeZone` if the poll's reference zone is not in
/// the tz database.
pub fn rank(
    poll: &Poll,
    aggregation: &Aggregation,
    responses: &[ParticipantResponse],
) -> Result<Vec<SlotScore>, EngineError> {
    let (valid, _) = screen(poll, responses);
    rank_screened(poll, aggregation, &valid)
}

pub(crate) fn rank_screened(
    poll: &Poll,
    aggregation: &Aggregation,
    valid: &[Screened],
) -> Result<Vec<SlotScore>, EngineError> {
    let mut scores = Vec::with_capacity(poll.time_slots.len());
    for (slot_index, slot) in poll.time_slots.iter().enumerate() {
        let instant = to_instant(slot.date, slot.start_time, &poll.reference_time_zone)?;

        // Sum the curve as integer tenths and divide once: the average is
        // the same no matter how the responses were ordered.
        let working_hours_fitness = if valid.is_empty() {
            NEUTRAL_FITNESS
        } else {
            let band_sum: u32 = valid
                .iter()
                .map(|screened| working_hours_band(instant, screened.tz))
                .sum();
            f64::from(band_sum) / (10 * valid.len()) as f64
        };

        let vote_count = aggregation
            .tallies
            .get(slot_index)
            .map(|tally| tally.vote_count)
            .unwrap_or(0);

        trace!(
            "slot {}: votes {}, fitness {:.3}",
            slot_index,
            vote_count,
            working_hours_fitness
        );

        scores.push(SlotScore {
            slot_index,
            vote_count,
            working_hours_fitness,
            composite_score: vote_count as f64 + working_hours_fitness,
            rank: 0,
        });
    }

    scores.sort_by(|a, b| {
        b.composite_score
            .total_cmp(&a.composite_score)
            .then(a.slot_index.cmp(&b.slot_index))
    });

    for (position, score) in scores.iter_mut().enumerate() {
        score.rank = position + 1;
    }

    Ok(scores)
}
