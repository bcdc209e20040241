//! Per-record state machines behind adding and removing a day.
//!
//! A scan is fed the streak records in start order. Each [`visit`] plans the
//! mutations that record needs and says whether to keep scanning; nothing
//! here touches the store, the driving loop in [`crate::streak`] does.
//!
//! [`visit`]: AddScan::visit

use chrono::NaiveDate;

use crate::error::{StreakError, StreakResult};
use crate::record::{day_after, DaySpan, StreakRecord};

/// A single planned change to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { span: DaySpan },
    Update { id: String, span: DaySpan },
    Delete { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// What to do after visiting one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub mutations: Vec<Mutation>,
    pub flow: Flow,
}

impl Visit {
    fn next() -> Self {
        Visit {
            mutations: Vec::new(),
            flow: Flow::Continue,
        }
    }

    fn stop() -> Self {
        Visit {
            mutations: Vec::new(),
            flow: Flow::Stop,
        }
    }

    fn apply_then(mutations: Vec<Mutation>, flow: Flow) -> Self {
        Visit { mutations, flow }
    }
}

/// Result of visiting a record once its mutations have been applied.
#[derive(Debug)]
pub enum ScanResult {
    Continue,
    StopSuccess,
    StopFailure(StreakError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The day was already inside a record.
    AlreadyCovered,
    /// A record starting the next day now starts on the day.
    ExtendedStart,
    /// A record ending on the day now includes it.
    ExtendedEnd,
    /// The day joined two records into one.
    Merged,
    /// A new single-day record was created.
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    NotCovered,
    Deleted,
    ShrunkStart,
    ShrunkEnd,
    Split,
}

/// State of an add-day scan.
#[derive(Debug, Clone)]
pub struct AddScan {
    day: NaiveDate,
    next_day: NaiveDate,
    /// Record extended to end after `day`, which may now touch its successor.
    pending_merge: Option<StreakRecord>,
    covered: bool,
    outcome: Option<AddOutcome>,
}

impl AddScan {
    pub fn new(day: NaiveDate) -> StreakResult<Self> {
        Ok(AddScan {
            day,
            next_day: day_after(day)?,
            pending_merge: None,
            covered: false,
            outcome: None,
        })
    }

    pub fn covered(&self) -> bool {
        self.covered
    }

    pub fn pending_merge(&self) -> Option<&StreakRecord> {
        self.pending_merge.as_ref()
    }

    pub fn visit(&mut self, record: &StreakRecord) -> Visit {
        if let Some(prev) = self.pending_merge.take() {
            if record.span.start != prev.span.end {
                return Visit::stop();
            }
            self.outcome = Some(AddOutcome::Merged);
            return Visit::apply_then(
                vec![
                    Mutation::Update {
                        id: record.id.clone(),
                        span: DaySpan::new(prev.span.start, record.span.end),
                    },
                    Mutation::Delete { id: prev.id },
                ],
                Flow::Stop,
            );
        }

        let span = record.span;

        if span.contains(self.day) {
            self.covered = true;
            self.outcome = Some(AddOutcome::AlreadyCovered);
            return Visit::stop();
        }

        if span.start == self.next_day {
            self.covered = true;
            self.outcome = Some(AddOutcome::ExtendedStart);
            return Visit::apply_then(
                vec![Mutation::Update {
                    id: record.id.clone(),
                    span: DaySpan::new(self.day, span.end),
                }],
                Flow::Stop,
            );
        }

        if span.end == self.day {
            let extended = DaySpan::new(span.start, self.next_day);
            self.covered = true;
            self.outcome = Some(AddOutcome::ExtendedEnd);
            self.pending_merge = Some(StreakRecord {
                id: record.id.clone(),
                span: extended,
            });
            return Visit::apply_then(
                vec![Mutation::Update {
                    id: record.id.clone(),
                    span: extended,
                }],
                Flow::Continue,
            );
        }

        Visit::next()
    }

    /// Mutations still owed once the scan is over, with the final outcome.
    pub fn finish(self) -> (AddOutcome, Vec<Mutation>) {
        if self.covered {
            let outcome = self.outcome.unwrap_or(AddOutcome::AlreadyCovered);
            return (outcome, Vec::new());
        }
        (
            AddOutcome::Created,
            vec![Mutation::Create {
                span: DaySpan::new(self.day, self.next_day),
            }],
        )
    }
}

/// State of a remove-day scan.
#[derive(Debug, Clone)]
pub struct RemoveScan {
    day: NaiveDate,
    next_day: NaiveDate,
    outcome: RemoveOutcome,
}

impl RemoveScan {
    pub fn new(day: NaiveDate) -> StreakResult<Self> {
        Ok(RemoveScan {
            day,
            next_day: day_after(day)?,
            outcome: RemoveOutcome::NotCovered,
        })
    }

    pub fn visit(&mut self, record: &StreakRecord) -> Visit {
        let span = record.span;
        if !span.contains(self.day) {
            return Visit::next();
        }

        let id = record.id.clone();
        let (outcome, mutations) = if span.start == self.day && span.end == self.next_day {
            (RemoveOutcome::Deleted, vec![Mutation::Delete { id }])
        } else if span.start == self.day {
            (
                RemoveOutcome::ShrunkStart,
                vec![Mutation::Update {
                    id,
                    span: DaySpan::new(self.next_day, span.end),
                }],
            )
        } else if span.end == self.next_day {
            (
                RemoveOutcome::ShrunkEnd,
                vec![Mutation::Update {
                    id,
                    span: DaySpan::new(span.start, self.day),
                }],
            )
        } else {
            (
                RemoveOutcome::Split,
                vec![
                    Mutation::Update {
                        id,
                        span: DaySpan::new(span.start, self.day),
                    },
                    Mutation::Create {
                        span: DaySpan::new(self.next_day, span.end),
                    },
                ],
            )
        };

        self.outcome = outcome;
        Visit::apply_then(mutations, Flow::Stop)
    }

    pub fn finish(self) -> RemoveOutcome {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_date;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn rec(id: &str, start: &str, end: &str) -> StreakRecord {
        StreakRecord {
            id: id.to_string(),
            span: DaySpan::new(d(start), d(end)),
        }
    }

    #[test]
    fn test_add_inside_record_stops_without_changes() {
        let mut scan = AddScan::new(d("2024-01-02")).unwrap();
        let visit = scan.visit(&rec("a", "2024-01-01", "2024-01-04"));

        assert_eq!(visit, Visit::stop());
        assert!(scan.covered());
        assert_eq!(scan.finish(), (AddOutcome::AlreadyCovered, vec![]));
    }

    #[test]
    fn test_add_before_record_extends_its_start() {
        let mut scan = AddScan::new(d("2024-01-04")).unwrap();
        let visit = scan.visit(&rec("a", "2024-01-05", "2024-01-08"));

        assert_eq!(visit.flow, Flow::Stop);
        assert_eq!(
            visit.mutations,
            vec![Mutation::Update {
                id: "a".into(),
                span: DaySpan::new(d("2024-01-04"), d("2024-01-08")),
            }]
        );
        assert_eq!(scan.finish().0, AddOutcome::ExtendedStart);
    }

    #[test]
    fn test_add_after_record_extends_end_and_keeps_scanning() {
        let mut scan = AddScan::new(d("2024-01-03")).unwrap();
        let visit = scan.visit(&rec("a", "2024-01-01", "2024-01-03"));

        assert_eq!(visit.flow, Flow::Continue);
        assert_eq!(
            scan.pending_merge().map(|r| r.span),
            Some(DaySpan::new(d("2024-01-01"), d("2024-01-04")))
        );

        // Next record leaves a gap: stop, nothing else to do.
        assert_eq!(scan.visit(&rec("b", "2024-01-10", "2024-01-12")), Visit::stop());
        assert_eq!(scan.finish(), (AddOutcome::ExtendedEnd, vec![]));
    }

    #[test]
    fn test_add_filling_gap_merges_records() {
        let mut scan = AddScan::new(d("2024-01-03")).unwrap();
        scan.visit(&rec("a", "2024-01-01", "2024-01-03"));
        let visit = scan.visit(&rec("b", "2024-01-04", "2024-01-06"));

        assert_eq!(visit.flow, Flow::Stop);
        assert_eq!(
            visit.mutations,
            vec![
                Mutation::Update {
                    id: "b".into(),
                    span: DaySpan::new(d("2024-01-01"), d("2024-01-06")),
                },
                Mutation::Delete { id: "a".into() },
            ]
        );
        assert_eq!(scan.finish(), (AddOutcome::Merged, vec![]));
    }

    #[test]
    fn test_add_with_gaps_everywhere_creates_record() {
        let mut scan = AddScan::new(d("2024-01-05")).unwrap();
        assert_eq!(scan.visit(&rec("a", "2024-01-01", "2024-01-03")), Visit::next());
        assert_eq!(scan.visit(&rec("b", "2024-01-08", "2024-01-09")), Visit::next());

        assert_eq!(
            scan.finish(),
            (
                AddOutcome::Created,
                vec![Mutation::Create {
                    span: DaySpan::new(d("2024-01-05"), d("2024-01-06")),
                }]
            )
        );
    }

    #[test]
    fn test_add_to_empty_streak_creates_record() {
        let scan = AddScan::new(d("2024-01-05")).unwrap();
        assert_eq!(scan.finish().0, AddOutcome::Created);
    }

    #[test]
    fn test_remove_skips_records_not_covering_day() {
        let mut scan = RemoveScan::new(d("2024-01-05")).unwrap();
        assert_eq!(scan.visit(&rec("a", "2024-01-01", "2024-01-05")), Visit::next());
        assert_eq!(scan.visit(&rec("b", "2024-01-06", "2024-01-09")), Visit::next());
        assert_eq!(scan.finish(), RemoveOutcome::NotCovered);
    }

    #[test]
    fn test_remove_single_day_deletes() {
        let mut scan = RemoveScan::new(d("2024-01-05")).unwrap();
        let visit = scan.visit(&rec("a", "2024-01-05", "2024-01-06"));
        assert_eq!(visit.mutations, vec![Mutation::Delete { id: "a".into() }]);
        assert_eq!(visit.flow, Flow::Stop);
        assert_eq!(scan.finish(), RemoveOutcome::Deleted);
    }

    #[test]
    fn test_remove_first_day_moves_start() {
        let mut scan = RemoveScan::new(d("2024-01-05")).unwrap();
        let visit = scan.visit(&rec("a", "2024-01-05", "2024-01-08"));
        assert_eq!(
            visit.mutations,
            vec![Mutation::Update {
                id: "a".into(),
                span: DaySpan::new(d("2024-01-06"), d("2024-01-08")),
            }]
        );
        assert_eq!(scan.finish(), RemoveOutcome::ShrunkStart);
    }

    #[test]
    fn test_remove_last_day_moves_end() {
        let mut scan = RemoveScan::new(d("2024-01-07")).unwrap();
        let visit = scan.visit(&rec("a", "2024-01-05", "2024-01-08"));
        assert_eq!(
            visit.mutations,
            vec![Mutation::Update {
                id: "a".into(),
                span: DaySpan::new(d("2024-01-05"), d("2024-01-07")),
            }]
        );
        assert_eq!(scan.finish(), RemoveOutcome::ShrunkEnd);
    }

    #[test]
    fn test_remove_interior_day_splits() {
        let mut scan = RemoveScan::new(d("2024-01-05")).unwrap();
        let visit = scan.visit(&rec("a", "2024-01-01", "2024-01-10"));
        assert_eq!(
            visit.mutations,
            vec![
                Mutation::Update {
                    id: "a".into(),
                    span: DaySpan::new(d("2024-01-01"), d("2024-01-05")),
                },
                Mutation::Create {
                    span: DaySpan::new(d("2024-01-06"), d("2024-01-10")),
                },
            ]
        );
        assert_eq!(scan.finish(), RemoveOutcome::Split);
    }
}
