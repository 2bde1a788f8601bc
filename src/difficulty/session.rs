use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::difficulty::types::{PerformanceRecord, SessionSample, SessionState};

/// True when no session is open or the open one started more than
/// `timeout_hours` before `now`. A timeout too large for a `Duration` never
/// expires.
pub fn is_expired(session: &SessionState, now: DateTime<Utc>, timeout_hours: i64) -> bool {
    match (session.session_id, session.started_at) {
        (Some(_), Some(started_at)) => match Duration::try_hours(timeout_hours) {
            Some(timeout) => now - started_at > timeout,
            None => false,
        },
        _ => true,
    }
}

/// Appends `record` to the running session, opening a fresh one first when
/// none exists or the current one is older than the timeout.
///
/// Returns `true` when a new session was opened.
pub fn track(
    session: &mut SessionState,
    record: &PerformanceRecord,
    now: DateTime<Utc>,
    timeout_hours: i64,
) -> bool {
    let opened = is_expired(session, now, timeout_hours);
    if opened {
        *session = SessionState {
            session_id: Some(Uuid::new_v4()),
            started_at: Some(now),
            questions_in_session: 0,
            samples: Vec::new(),
        };
    }

    session.questions_in_session += 1;
    session.samples.push(SessionSample::from(record));
    opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::types::{PerformanceInput, Tier};

    fn record(now: DateTime<Utc>) -> PerformanceRecord {
        PerformanceRecord::from_input(
            PerformanceInput::new("q").with_accuracy(0.8).with_response_time(9.0),
            Tier::Advanced,
            now,
        )
    }

    #[test]
    fn test_first_record_opens_session() {
        let now = Utc::now();
        let mut session = SessionState::default();
        assert!(track(&mut session, &record(now), now, 2));
        assert!(session.session_id.is_some());
        assert_eq!(session.started_at, Some(now));
        assert_eq!(session.questions_in_session, 1);
        assert_eq!(session.samples[0].difficulty, Tier::Advanced);
    }

    #[test]
    fn test_within_timeout_continues_session() {
        let start = Utc::now();
        let mut session = SessionState::default();
        track(&mut session, &record(start), start, 2);
        let id = session.session_id;

        let later = start + Duration::minutes(119);
        assert!(!track(&mut session, &record(later), later, 2));
        assert_eq!(session.session_id, id);
        assert_eq!(session.questions_in_session, 2);
        assert_eq!(session.samples.len(), 2);
    }

    #[test]
    fn test_expired_session_is_replaced() {
        let now = Utc::now();
        let mut session = SessionState {
            session_id: Some(Uuid::new_v4()),
            started_at: Some(now - Duration::hours(3)),
            questions_in_session: 12,
            samples: vec![SessionSample::from(&record(now))],
        };
        let old_id = session.session_id;

        assert!(track(&mut session, &record(now), now, 2));
        assert_ne!(session.session_id, old_id);
        assert_eq!(session.questions_in_session, 1);
        assert_eq!(session.samples.len(), 1);
    }

    #[test]
    fn test_exactly_at_timeout_is_not_expired() {
        let now = Utc::now();
        let session = SessionState {
            session_id: Some(Uuid::new_v4()),
            started_at: Some(now - Duration::hours(2)),
            questions_in_session: 1,
            samples: Vec::new(),
        };
        assert!(!is_expired(&session, now, 2));
    }

    #[test]
    fn test_huge_timeout_never_expires() {
        let now = Utc::now();
        let session = SessionState {
            session_id: Some(Uuid::new_v4()),
            started_at: Some(now - Duration::days(365)),
            questions_in_session: 1,
            samples: Vec::new(),
        };
        assert!(!is_expired(&session, now, 9_000_000_000_000));
        assert!(!is_expired(&session, now, i64::MAX));
        assert!(is_expired(&SessionState::default(), now, i64::MAX));
    }
}
