//! Availability aggregation and slot-ranking for group meeting polls.
//!
//! Given a poll (a fixed, ordered sequence of candidate time slots anchored
//! to a reference time zone) and a snapshot of participant responses (one
//! boolean availability vector per participant, tagged with their own IANA
//! zone), the engine produces per-slot vote tallies, a deterministic
//! ranking that blends vote counts with timezone-aware working-hours
//! fitness, and a summary payload shaped for a poll-analytics endpoint.
//!
//! The engine is a pure, synchronous function of its inputs: no I/O, no
//! clock reads, no shared mutable state. Storage, transport, and auth
//! belong to the caller.

pub mod poll;
pub mod rank;
pub mod report;
pub mod time;

pub use crate::poll::{EngineError, Location, ParticipantResponse, Poll, TimeSlot};
pub use crate::rank::{aggregate, rank, Aggregation, SkippedResponse, SlotScore, SlotTally};
pub use crate::report::{summarize, BestSlot, PollAnalytics};
pub use crate::time::{to_instant, working_hours_score};

#[cfg(test)]
mod tests {
    use crate::poll::{ParticipantResponse, Poll, TimeSlot};
    use crate::report::summarize;
    use chrono::{NaiveDate, NaiveTime};

    fn slot(day: u32, hour: u32, minute: u32) -> TimeSlot {
        TimeSlot::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            NaiveTime::from_hms_opt(hour, 59, 0).unwrap(),
        )
    }

    #[test]
    fn basic_ranking() {
        let poll = Poll::new(
            "poll-1",
            "Team Meeting - Q1 Planning",
            vec![slot(15, 9, 0), slot(15, 14, 0)],
            "UTC",
        );
        let responses = vec![
            ParticipantResponse::new("a", "Alex Chen", "UTC", vec![true, false]),
            ParticipantResponse::new("b", "Maria Rodriguez", "UTC", vec![true, true]),
        ];

        let analytics = summarize(&poll, &responses).unwrap();

        assert_eq!(analytics.total_responses, 2);
        assert_eq!(analytics.all_slot_scores[0].slot_index, 0);
        assert_eq!(analytics.all_slot_scores[0].vote_count, 2);
        assert_eq!(analytics.all_slot_scores[0].rank, 1);
        assert_eq!(analytics.all_slot_scores[1].slot_index, 1);
        assert_eq!(analytics.all_slot_scores[1].vote_count, 1);
        assert_eq!(analytics.all_slot_scores[1].rank, 2);
    }

    #[test]
    fn fitness_breaks_ties_within_a_vote_count() {
        // Both slots get one vote; 10:00 UTC scores 1.0 for UTC residents,
        // 23:00 scores 0.0, so the morning slot must win.
        let poll = Poll::new("poll-1", "", vec![slot(15, 10, 0), slot(15, 23, 0)], "UTC");
        let responses = vec![
            ParticipantResponse::new("a", "A", "UTC", vec![true, false]),
            ParticipantResponse::new("b", "B", "UTC", vec![false, true]),
        ];

        let analytics = summarize(&poll, &responses).unwrap();
        let scores = &analytics.all_slot_scores;

        assert_eq!(scores[0].vote_count, scores[1].vote_count);
        assert_eq!(scores[0].slot_index, 0);
        assert_eq!(scores[0].rank, 1);
        assert!((scores[0].working_hours_fitness - 1.0).abs() < 1e-9);
        assert!((scores[1].working_hours_fitness - 0.0).abs() < 1e-9);
    }

    #[test]
    fn zero_responses_yield_neutral_fitness() {
        let poll = Poll::new(
            "poll-1",
            "",
            vec![slot(15, 9, 0), slot(16, 9, 0), slot(17, 9, 0)],
            "America/New_York",
        );

        let analytics = summarize(&poll, &[]).unwrap();

        assert_eq!(analytics.total_responses, 0);
        assert_eq!(analytics.all_slot_scores.len(), 3);
        for (i, score) in analytics.all_slot_scores.iter().enumerate() {
            assert_eq!(score.slot_index, i);
            assert_eq!(score.vote_count, 0);
            assert!((score.composite_score - 0.5).abs() < 1e-9);
            assert_eq!(score.rank, i + 1);
        }
        assert!(analytics.timezone_distribution.is_empty());
    }

    #[test]
    fn empty_poll_yields_empty_ranking_without_error() {
        let poll = Poll::new("poll-1", "", vec![], "UTC");
        let responses = vec![ParticipantResponse::new("a", "A", "UTC", vec![])];

        let analytics = summarize(&poll, &responses).unwrap();

        assert_eq!(analytics.total_responses, 1);
        assert!(analytics.best_time_slots.is_empty());
        assert!(analytics.all_slot_scores.is_empty());
        assert!(analytics.skipped.is_empty());
    }

    #[test]
    fn output_is_independent_of_response_ordering() {
        let poll = Poll::new(
            "poll-1",
            "Q1 Planning",
            vec![slot(15, 9, 0), slot(15, 14, 0), slot(16, 10, 0)],
            "America/Los_Angeles",
        );
        let a = ParticipantResponse::new("a", "Alex", "America/New_York", vec![true, false, true]);
        let b = ParticipantResponse::new("b", "Maria", "America/Los_Angeles", vec![true, true, false]);
        let c = ParticipantResponse::new("c", "Kenji", "Asia/Tokyo", vec![false, true, true]);

        let forward = summarize(&poll, &[a.clone(), b.clone(), c.clone()]).unwrap();
        let reversed = summarize(&poll, &[c, b, a]).unwrap();

        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&reversed).unwrap()
        );
    }

    #[test]
    fn fitness_average_is_exact_under_reordering() {
        // At 12:00 UTC the three zones land in three different bands:
        // 12:00 UTC (1.0), 17:00 Karachi (0.6), 19:00 Bangkok (0.3). The
        // average must come out identical for every permutation, down to
        // the last bit of the serialized float.
        let poll = Poll::new("poll-1", "", vec![slot(15, 12, 0)], "UTC");
        let a = ParticipantResponse::new("a", "Asha", "UTC", vec![true]);
        let b = ParticipantResponse::new("b", "Bilal", "Asia/Karachi", vec![true]);
        let c = ParticipantResponse::new("c", "Chanya", "Asia/Bangkok", vec![false]);

        let forward = summarize(&poll, &[a.clone(), b.clone(), c.clone()]).unwrap();
        let reversed = summarize(&poll, &[c.clone(), b.clone(), a.clone()]).unwrap();
        let rotated = summarize(&poll, &[b, c, a]).unwrap();

        let fitness = forward.all_slot_scores[0].working_hours_fitness;
        assert!((fitness - 19.0 / 30.0).abs() < 1e-12);

        let forward_json = serde_json::to_string(&forward).unwrap();
        assert_eq!(forward_json, serde_json::to_string(&reversed).unwrap());
        assert_eq!(forward_json, serde_json::to_string(&rotated).unwrap());
    }

    #[test]
    fn slot_ranking_spans_a_dst_transition() {
        // Slot 0 is before the 2024-03-10 spring-forward in New York, slot 1
        // after; each must use the offset observed on its own date.
        let morning = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let poll = Poll::new(
            "poll-1",
            "",
            vec![
                TimeSlot::new(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(), morning, end),
                TimeSlot::new(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), morning, end),
            ],
            "America/New_York",
        );
        // 09:00 New York is 06:00 in Los Angeles either way; both slots
        // score identically, so ranking falls back to slot order.
        let responses = vec![ParticipantResponse::new(
            "a",
            "A",
            "America/Los_Angeles",
            vec![true, true],
        )];

        let analytics = summarize(&poll, &responses).unwrap();

        assert_eq!(analytics.all_slot_scores[0].slot_index, 0);
        assert!(
            (analytics.all_slot_scores[0].working_hours_fitness
                - analytics.all_slot_scores[1].working_hours_fitness)
                .abs()
                < 1e-9
        );
    }
}
