//! Concurrent registry of recording sessions.
//!
//! Sessions live behind their own lock so frames for different sessions never
//! contend; the map itself is only touched to look a slot up, add or evict.

use crate::services::analysis::MetricsAggregator;
use crate::types::{AnalysisMetrics, DetectionResult, Session, SessionError, SessionSummary};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

struct SessionSlot {
    started_at: DateTime<Utc>,
    session: Mutex<Session>,
}

/// Result of ending a session
#[derive(Debug, Clone)]
pub struct Ending {
    pub metrics: Arc<AnalysisMetrics>,
    /// False when the session had already been ended before this call
    pub newly_ended: bool,
}

pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionSlot>>,
    aggregator: MetricsAggregator,
}

impl SessionRegistry {
    pub fn new(aggregator: MetricsAggregator) -> Self {
        Self {
            sessions: DashMap::new(),
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }

    pub fn create(&self, user_id: &str, question_id: &str, response_id: Option<String>) -> Session {
        self.create_at(user_id, question_id, response_id, Utc::now())
    }

    pub(crate) fn create_at(
        &self,
        user_id: &str,
        question_id: &str,
        response_id: Option<String>,
        started_at: DateTime<Utc>,
    ) -> Session {
        loop {
            let session_id = Uuid::new_v4().to_string();
            if let Entry::Vacant(entry) = self.sessions.entry(session_id.clone()) {
                let mut session = Session::new(
                    session_id.clone(),
                    user_id.to_string(),
                    question_id.to_string(),
                    response_id.clone(),
                );
                session.start_time = started_at;

                let created = session.clone();
                entry.insert(Arc::new(SessionSlot {
                    started_at,
                    session: Mutex::new(session),
                }));

                tracing::info!(
                    "🎬 Session {} created (user={}, question={})",
                    session_id,
                    user_id,
                    question_id
                );
                return created;
            }
        }
    }

    fn slot(&self, session_id: &str) -> Option<Arc<SessionSlot>> {
        self.sessions.get(session_id).map(|entry| Arc::clone(entry.value()))
    }

    fn require(&self, session_id: &str) -> Result<Arc<SessionSlot>, SessionError> {
        self.slot(session_id).ok_or_else(|| SessionError::not_found(session_id))
    }

    /// Full snapshot including frames
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.slot(session_id).map(|slot| slot.session.lock().clone())
    }

    pub fn summary(&self, session_id: &str) -> Option<SessionSummary> {
        self.slot(session_id).map(|slot| slot.session.lock().summary())
    }

    /// Fails unless the session exists and still accepts frames
    pub fn ensure_active(&self, session_id: &str) -> Result<(), SessionError> {
        let slot = self.require(session_id)?;
        let session = slot.session.lock();
        if session.is_active {
            Ok(())
        } else {
            Err(SessionError::not_active(session_id))
        }
    }

    /// Append a measurement, returning the new frame count
    pub fn append_frame(&self, session_id: &str, frame: DetectionResult) -> Result<usize, SessionError> {
        let slot = self.require(session_id)?;
        let mut session = slot.session.lock();
        if !session.is_active {
            return Err(SessionError::not_active(session_id));
        }
        session.frames.push(frame);
        Ok(session.frames.len())
    }

    pub fn attach_response_id(&self, session_id: &str, response_id: String) -> Result<(), SessionError> {
        let slot = self.require(session_id)?;
        slot.session.lock().response_id = Some(response_id);
        Ok(())
    }

    /// Stop accepting frames and freeze the metrics. Repeated calls return
    /// the same metrics with `newly_ended == false`.
    pub fn end(&self, session_id: &str) -> Result<Ending, SessionError> {
        let slot = self.require(session_id)?;
        let mut session = slot.session.lock();

        if let (false, Some(metrics)) = (session.is_active, session.metrics.as_ref()) {
            return Ok(Ending {
                metrics: Arc::clone(metrics),
                newly_ended: false,
            });
        }

        session.is_active = false;
        let metrics = Arc::new(self.aggregator.compute(&session));
        session.metrics = Some(Arc::clone(&metrics));

        tracing::info!(
            "🏁 Session {} ended after {} frames ({:.1}s)",
            session_id,
            session.frames.len(),
            metrics.duration
        );

        Ok(Ending {
            metrics,
            newly_ended: true,
        })
    }

    /// Frozen metrics of an ended session, or a fresh uncached computation
    pub fn metrics(&self, session_id: &str) -> Result<Arc<AnalysisMetrics>, SessionError> {
        let slot = self.require(session_id)?;
        let session = slot.session.lock();
        Ok(match &session.metrics {
            Some(metrics) => Arc::clone(metrics),
            None => Arc::new(self.aggregator.compute(&session)),
        })
    }

    /// Drop every session started more than `max_age` ago, returning how many went
    pub fn evict_older_than(&self, max_age: chrono::Duration) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            return 0;
        };
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| slot.started_at >= cutoff);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().session.lock().is_active)
            .count()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(MetricsAggregator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::fixtures::{face, faces};
    use crate::types::Expression;

    #[test]
    fn test_create_and_lookup() {
        let registry = SessionRegistry::default();
        let session = registry.create("u1", "q1", Some("r1".to_string()));

        assert!(session.is_active);
        assert!(session.frames.is_empty());
        assert!(Uuid::parse_str(&session.session_id).is_ok());

        let summary = registry.summary(&session.session_id).unwrap();
        assert_eq!(summary.user_id, "u1");
        assert_eq!(summary.response_id.as_deref(), Some("r1"));
        assert_eq!(summary.frames_count, 0);
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_frames_only_reach_their_own_session() {
        let registry = SessionRegistry::default();
        let a = registry.create("u1", "q1", None).session_id;
        let b = registry.create("u2", "q2", None).session_id;
        assert_ne!(a, b);

        for frame in faces(Expression::Happy, 0.9, 3) {
            registry.append_frame(&a, frame).unwrap();
        }
        registry.append_frame(&b, face(Expression::Sad, 0.1)).unwrap();

        assert_eq!(registry.get(&a).unwrap().frames.len(), 3);
        let b_frames = registry.get(&b).unwrap().frames;
        assert_eq!(b_frames.len(), 1);
        assert_eq!(b_frames[0].dominant(), Some(Expression::Sad));
    }

    #[test]
    fn test_end_is_idempotent() {
        let registry = SessionRegistry::default();
        let id = registry.create("u1", "q1", None).session_id;
        registry.append_frame(&id, face(Expression::Neutral, 0.8)).unwrap();

        let first = registry.end(&id).unwrap();
        let second = registry.end(&id).unwrap();
        assert!(first.newly_ended);
        assert!(!second.newly_ended);
        assert!(Arc::ptr_eq(&first.metrics, &second.metrics));
        assert!(Arc::ptr_eq(&first.metrics, &registry.metrics(&id).unwrap()));
        assert!(!registry.summary(&id).unwrap().is_active);
    }

    #[test]
    fn test_ended_session_rejects_frames() {
        let registry = SessionRegistry::default();
        let id = registry.create("u1", "q1", None).session_id;
        registry.end(&id).unwrap();

        assert_eq!(
            registry.append_frame(&id, face(Expression::Neutral, 0.8)),
            Err(SessionError::not_active(&id))
        );
        assert_eq!(registry.ensure_active(&id), Err(SessionError::not_active(&id)));
        assert_eq!(registry.get(&id).unwrap().frames.len(), 0);
    }

    #[test]
    fn test_unknown_session() {
        let registry = SessionRegistry::default();
        let err = SessionError::not_found("nope");
        assert_eq!(registry.append_frame("nope", face(Expression::Neutral, 0.8)), Err(err.clone()));
        assert_eq!(registry.end("nope").unwrap_err(), err);
        assert_eq!(registry.metrics("nope").unwrap_err(), err);
        assert_eq!(registry.attach_response_id("nope", "r".to_string()), Err(err));
    }

    #[test]
    fn test_metrics_of_active_session_are_not_cached() {
        let registry = SessionRegistry::default();
        let id = registry.create("u1", "q1", None).session_id;
        registry.append_frame(&id, face(Expression::Happy, 0.9)).unwrap();

        let first = registry.metrics(&id).unwrap();
        assert!(!Arc::ptr_eq(&first, &registry.metrics(&id).unwrap()));
        assert!(registry.get(&id).unwrap().metrics.is_none());
        assert!(registry.get(&id).unwrap().is_active);
    }

    #[test]
    fn test_response_id_attached_before_end() {
        let registry = SessionRegistry::default();
        let id = registry.create("u1", "q1", None).session_id;
        registry.attach_response_id(&id, "r9".to_string()).unwrap();

        let ending = registry.end(&id).unwrap();
        assert_eq!(ending.metrics.response_id.as_deref(), Some("r9"));
    }

    #[test]
    fn test_eviction_by_age() {
        let registry = SessionRegistry::default();
        let now = Utc::now();
        let stale = registry
            .create_at("u1", "q1", None, now - chrono::Duration::hours(25))
            .session_id;
        let fresh = registry
            .create_at("u2", "q2", None, now - chrono::Duration::hours(1))
            .session_id;

        assert_eq!(registry.evict_older_than(chrono::Duration::hours(24)), 1);
        assert!(registry.get(&stale).is_none());
        assert!(registry.get(&fresh).is_some());
        assert_eq!(registry.append_frame(&stale, face(Expression::Neutral, 0.8)), Err(SessionError::not_found(&stale)));
    }

    #[test]
    fn test_eviction_with_huge_age_keeps_everything() {
        let registry = SessionRegistry::default();
        registry.create("u1", "q1", None);
        assert_eq!(registry.evict_older_than(chrono::TimeDelta::MAX), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_appends() {
        let registry = Arc::new(SessionRegistry::default());
        let ids: Vec<String> = (0..4).map(|i| registry.create(&format!("u{}", i), "q", None).session_id).collect();

        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        registry.append_frame(&id, face(Expression::Neutral, 0.8)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for id in &ids {
            assert_eq!(registry.summary(id).unwrap().frames_count, 250);
        }
        assert_eq!(registry.active_count(), 4);
    }
}
