//! Challenge engine: join/leave/progress lifecycle, streak accounting
//! and one-time trophy awarding.
//!
//! One engine instance exists per user session, with an injected clock
//! and store. The engine enforces the single-active-challenge invariant
//! itself: joining a different challenge while one is active is an
//! error, and switching happens through an explicit leave (or through
//! `create_challenge`, where creating is the switch).

use crate::catalog;
use crate::clock::Clock;
use crate::store::{self, load_or_default, StateStore};
use crate::types::{Challenge, ChallengeKind, ChallengeParticipant, GameProfile, NewChallenge};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Document key for the persisted engine state
const STATE_KEY: &str = "challenges";

/// User id used when no identity provider is attached
const LOCAL_USER: &str = "local-user";

/// Persisted engine state. Built-in challenges are re-seeded from the
/// catalog on load, so only user-created ones are stored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct EngineState {
    #[serde(default)]
    custom_challenges: Vec<Challenge>,
    #[serde(default)]
    active_id: Option<String>,
    #[serde(default)]
    participant: Option<ChallengeParticipant>,
    #[serde(default)]
    profile: GameProfile,
}

/// The per-user challenge state machine
pub struct ChallengeEngine<C: Clock> {
    state: EngineState,
    clock: C,
    user_id: String,
    store: Box<dyn StateStore>,
    mirror: Option<Box<dyn StateStore>>,
    /// Challenge id awaiting host acknowledgement; in-memory only
    just_completed: Option<String>,
}

impl<C: Clock> ChallengeEngine<C> {
    /// Open the engine, loading persisted state and running the streak
    /// staleness pass.
    ///
    /// `user_id` comes from the identity provider; None means
    /// local-only/offline mode. `mirror` is an optional secondary store
    /// written best-effort after every flush.
    pub fn open(
        store: Box<dyn StateStore>,
        mirror: Option<Box<dyn StateStore>>,
        clock: C,
        user_id: Option<String>,
    ) -> Result<Self> {
        let mut state: EngineState = load_or_default(store.as_ref(), STATE_KEY)?;

        // Stored customs that collide with built-in ids are dropped;
        // the catalog is authoritative for those
        state
            .custom_challenges
            .retain(|c| !catalog::is_builtin(&c.id));

        let mut engine = Self {
            state,
            clock,
            user_id: user_id.unwrap_or_else(|| LOCAL_USER.to_string()),
            store,
            mirror,
            just_completed: None,
        };

        // Staleness pass: a last-active day before yesterday means the
        // streak is already broken, independent of any new activity
        let today = engine.clock.today();
        let yesterday = today.pred_opt().unwrap_or(today);
        if let Some(last) = engine.state.profile.last_active_date {
            if last != today && last != yesterday && engine.state.profile.streak != 0 {
                tracing::info!(
                    "Streak broken: last activity on {}, resetting from {}",
                    last,
                    engine.state.profile.streak
                );
                engine.state.profile.streak = 0;
                engine.flush()?;
            }
        }

        Ok(engine)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All available challenges: built-ins in fixed order, then user
    /// created ones newest first
    pub fn available(&self) -> Vec<&Challenge> {
        catalog::builtin_challenges()
            .iter()
            .chain(self.state.custom_challenges.iter())
            .collect()
    }

    /// Look up a challenge by id
    pub fn challenge(&self, id: &str) -> Option<&Challenge> {
        self.available().into_iter().find(|c| c.id == id)
    }

    /// The currently active challenge, if any
    pub fn active_challenge(&self) -> Option<&Challenge> {
        self.state
            .active_id
            .as_deref()
            .and_then(|id| self.challenge(id))
    }

    /// Progress record for the active challenge
    pub fn participant(&self) -> Option<&ChallengeParticipant> {
        self.state.participant.as_ref()
    }

    /// Trophies, streak, username and the completed-id set
    pub fn game_profile(&self) -> &GameProfile {
        &self.state.profile
    }

    /// Challenge whose completion still awaits acknowledgement
    pub fn pending_celebration(&self) -> Option<&Challenge> {
        self.just_completed
            .as_deref()
            .and_then(|id| self.challenge(id))
    }

    /// Opaque shareable link embedding the active challenge id
    pub fn invite_link(&self) -> Option<String> {
        self.state
            .active_id
            .as_ref()
            .map(|id| format!("vitalog://join/{id}"))
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    /// Join a challenge. Joining resets progress to zero, also when
    /// re-joining the currently active challenge. Joining a *different*
    /// challenge while one is active is rejected.
    pub fn join(&mut self, id: &str) -> Result<()> {
        if self.challenge(id).is_none() {
            return Err(Error::NotFound(id.to_string()));
        }

        if let Some(active) = self.state.active_id.as_deref() {
            if active != id {
                return Err(Error::ChallengeActive(active.to_string()));
            }
        }

        tracing::info!("Joining challenge '{}'", id);
        self.state.participant = Some(ChallengeParticipant {
            user_id: self.user_id.clone(),
            challenge_id: id.to_string(),
            progress: 0.0,
            joined_at: self.clock.now(),
        });
        self.state.active_id = Some(id.to_string());
        self.record_daily_activity();
        self.flush()
    }

    /// Leave the active challenge. No-op when idle.
    pub fn leave(&mut self) -> Result<()> {
        if self.state.active_id.is_none() {
            return Ok(());
        }

        tracing::info!("Leaving challenge {:?}", self.state.active_id);
        self.state.active_id = None;
        self.state.participant = None;
        self.flush()
    }

    /// Add progress toward the active challenge's goal.
    ///
    /// Non-positive amounts and calls while idle are complete no-ops,
    /// with no streak side effect. Returns true when this call crossed
    /// the goal for the first time ever on this challenge id (one
    /// trophy, one celebration).
    pub fn log_progress(&mut self, amount: f64) -> Result<bool> {
        if amount <= 0.0 {
            return Ok(false);
        }

        let Some(active_id) = self.state.active_id.clone() else {
            return Ok(false);
        };
        let Some(goal) = self.challenge(&active_id).map(|c| c.goal_value) else {
            return Ok(false);
        };

        let Some(participant) = self.state.participant.as_mut() else {
            return Ok(false);
        };

        let previous = participant.progress;
        participant.progress += amount;
        let crossed = previous < goal && participant.progress >= goal;

        self.record_daily_activity();

        let mut completed_now = false;
        if crossed && !self.state.profile.completed_challenges.contains(&active_id) {
            self.state.profile.trophies += 1;
            self.state
                .profile
                .completed_challenges
                .insert(active_id.clone());
            if self.just_completed.is_none() {
                self.just_completed = Some(active_id.clone());
            }
            completed_now = true;
            tracing::info!(
                "Challenge '{}' completed; trophies now {}",
                active_id,
                self.state.profile.trophies
            );
        }

        self.flush()?;
        Ok(completed_now)
    }

    /// Route a journal delta to the active challenge if its tracked
    /// metric matches. Returns the `log_progress` completion flag, or
    /// false when nothing was routed.
    pub fn auto_track(&mut self, kind: ChallengeKind, amount: f64) -> Result<bool> {
        let matches = self
            .active_challenge()
            .map(|c| c.kind == kind)
            .unwrap_or(false);
        if !matches {
            return Ok(false);
        }
        self.log_progress(amount)
    }

    /// Create a user challenge and immediately join it. Creating is an
    /// explicit switch, so any current challenge is left first.
    pub fn create_challenge(&mut self, spec: NewChallenge) -> Result<String> {
        let challenge = Challenge {
            id: format!("custom-{}", Uuid::new_v4()),
            title: spec.title,
            description: spec.description,
            kind: spec.kind,
            goal_value: spec.goal_value,
            unit: spec.unit,
            duration_days: spec.duration_days,
            color: spec.color,
            icon: spec.icon,
        };

        let errors = catalog::validate(std::slice::from_ref(&challenge));
        if !errors.is_empty() {
            return Err(Error::ChallengeValidation(errors.join("; ")));
        }

        let id = challenge.id.clone();
        self.state.custom_challenges.insert(0, challenge);
        if self.state.active_id.is_some() {
            self.leave()?;
        }
        self.join(&id)?;
        Ok(id)
    }

    /// Delete a user-created challenge. Built-ins are protected: the
    /// call fails with zero state change, leaving the list and any
    /// active selection untouched. Deleting the active challenge leaves
    /// it first.
    pub fn delete_challenge(&mut self, id: &str) -> Result<()> {
        if catalog::is_builtin(id) {
            return Err(Error::ProtectedChallenge(id.to_string()));
        }

        let Some(pos) = self
            .state
            .custom_challenges
            .iter()
            .position(|c| c.id == id)
        else {
            return Err(Error::NotFound(id.to_string()));
        };

        if self.state.active_id.as_deref() == Some(id) {
            self.leave()?;
        }

        self.state.custom_challenges.remove(pos);
        tracing::info!("Deleted challenge '{}'", id);
        self.flush()
    }

    /// Store the display name shown on the leaderboard and invites
    pub fn set_username(&mut self, name: &str) -> Result<()> {
        self.state.profile.username = name.to_string();
        self.flush()
    }

    /// Acknowledge the pending completion celebration, allowing the
    /// next one to surface. Returns the acknowledged challenge id.
    pub fn dismiss_celebration(&mut self) -> Option<String> {
        self.just_completed.take()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Count today toward the streak: at most one increment per
    /// calendar day, reset to 1 after a gap.
    fn record_daily_activity(&mut self) {
        let today = self.clock.today();
        let yesterday = today.pred_opt().unwrap_or(today);
        let profile = &mut self.state.profile;

        match profile.last_active_date {
            Some(last) if last == today => return,
            Some(last) if last == yesterday => profile.streak += 1,
            None => profile.streak += 1,
            Some(_) => profile.streak = 1,
        }
        profile.last_active_date = Some(today);
    }

    /// Persist state. The primary store's failure surfaces to the
    /// caller (memory stays mutated); the mirror is fire-and-forget.
    fn flush(&self) -> Result<()> {
        let doc = serde_json::to_value(&self.state)?;
        let result = self.store.save(STATE_KEY, &doc);
        if let Some(mirror) = &self.mirror {
            store::mirror_document(mirror.as_ref(), STATE_KEY, &doc);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{JsonFileStore, MemoryStore};
    use chrono::DateTime;

    fn clock_at(s: &str) -> ManualClock {
        ManualClock::new(DateTime::parse_from_rfc3339(s).unwrap())
    }

    fn engine_with(clock: ManualClock) -> ChallengeEngine<ManualClock> {
        ChallengeEngine::open(Box::new(MemoryStore::new()), None, clock, None).unwrap()
    }

    fn custom_spec(goal: f64) -> NewChallenge {
        NewChallenge {
            title: "Evening walks".into(),
            description: "A walk after dinner every day".into(),
            kind: ChallengeKind::Workout,
            goal_value: goal,
            unit: "walk".into(),
            duration_days: 14,
            color: "amber".into(),
            icon: "🚶".into(),
        }
    }

    /// Store that always fails, for persistence-failure behavior
    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn load(&self, _key: &str) -> crate::Result<Option<serde_json::Value>> {
            Ok(None)
        }

        fn save(&self, _key: &str, _doc: &serde_json::Value) -> crate::Result<()> {
            Err(Error::State("disk gone".into()))
        }
    }

    #[test]
    fn test_available_lists_builtins_then_customs_newest_first() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));

        let first = engine.create_challenge(custom_spec(5.0)).unwrap();
        engine.leave().unwrap();
        let second = engine.create_challenge(custom_spec(7.0)).unwrap();

        let ids: Vec<_> = engine.available().iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(&ids[..3], &["sugar_free", "water_marathon", "steps_100k"]);
        assert_eq!(ids[3], second);
        assert_eq!(ids[4], first);
    }

    #[test]
    fn test_join_unknown_challenge_fails() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        let err = engine.join("no-such-challenge").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(engine.active_challenge().is_none());
    }

    #[test]
    fn test_join_while_active_on_other_is_rejected() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        engine.join("water_marathon").unwrap();

        let err = engine.join("steps_100k").unwrap_err();
        assert!(matches!(err, Error::ChallengeActive(_)));
        assert_eq!(engine.active_challenge().unwrap().id, "water_marathon");

        engine.leave().unwrap();
        engine.join("steps_100k").unwrap();
        assert_eq!(engine.active_challenge().unwrap().id, "steps_100k");
    }

    #[test]
    fn test_rejoin_resets_progress_without_second_trophy() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        engine.join("water_marathon").unwrap();

        // Cross the 90 L goal
        assert!(engine.log_progress(95.0).unwrap());
        assert_eq!(engine.game_profile().trophies, 1);
        assert_eq!(engine.participant().unwrap().progress, 95.0);

        // Rejoining the same (still active) challenge zeroes progress
        engine.join("water_marathon").unwrap();
        assert_eq!(engine.participant().unwrap().progress, 0.0);

        // Re-crossing awards nothing further
        assert!(!engine.log_progress(95.0).unwrap());
        assert_eq!(engine.game_profile().trophies, 1);
        assert_eq!(engine.game_profile().completed_challenges.len(), 1);
    }

    #[test]
    fn test_completion_fires_once_at_crossing() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        engine.join("water_marathon").unwrap();

        assert!(!engine.log_progress(50.0).unwrap());
        assert_eq!(engine.game_profile().trophies, 0);
        assert!(engine.pending_celebration().is_none());

        // This call crosses 90
        assert!(engine.log_progress(45.0).unwrap());
        assert_eq!(engine.game_profile().trophies, 1);
        assert_eq!(
            engine.pending_celebration().unwrap().id,
            "water_marathon"
        );

        // Progress past the goal changes nothing more
        assert!(!engine.log_progress(10.0).unwrap());
        assert_eq!(engine.game_profile().trophies, 1);

        assert_eq!(
            engine.dismiss_celebration().as_deref(),
            Some("water_marathon")
        );
        assert!(engine.pending_celebration().is_none());
    }

    #[test]
    fn test_non_positive_progress_is_a_complete_noop() {
        let clock = clock_at("2024-03-01T10:00:00+03:00");
        let mut engine = engine_with(clock.clone());
        engine.join("water_marathon").unwrap();
        let streak_before = engine.game_profile().streak;

        clock.advance_days(1);
        assert!(!engine.log_progress(0.0).unwrap());
        assert!(!engine.log_progress(-3.0).unwrap());

        // Neither progress nor the streak moved: the no-op short
        // circuits before the daily-activity side effect
        assert_eq!(engine.participant().unwrap().progress, 0.0);
        assert_eq!(engine.game_profile().streak, streak_before);
        assert_eq!(
            engine.game_profile().last_active_date,
            Some(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_progress_while_idle_is_a_noop() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        assert!(!engine.log_progress(10.0).unwrap());
        assert_eq!(engine.game_profile().streak, 0);
        assert!(engine.participant().is_none());
    }

    #[test]
    fn test_streak_increments_once_per_day() {
        let clock = clock_at("2024-03-01T10:00:00+03:00");
        let mut engine = engine_with(clock.clone());

        engine.join("steps_100k").unwrap();
        assert_eq!(engine.game_profile().streak, 1);

        // More activity the same day does not double count
        engine.log_progress(2000.0).unwrap();
        engine.log_progress(1500.0).unwrap();
        assert_eq!(engine.game_profile().streak, 1);

        clock.advance_days(1);
        engine.log_progress(3000.0).unwrap();
        assert_eq!(engine.game_profile().streak, 2);

        clock.advance_days(1);
        engine.log_progress(500.0).unwrap();
        assert_eq!(engine.game_profile().streak, 3);
    }

    #[test]
    fn test_streak_resets_after_gap() {
        let clock = clock_at("2024-03-01T10:00:00+03:00");
        let mut engine = engine_with(clock.clone());

        engine.join("steps_100k").unwrap();
        clock.advance_days(1);
        engine.log_progress(1000.0).unwrap();
        assert_eq!(engine.game_profile().streak, 2);

        // Skip two days
        clock.advance_days(3);
        engine.log_progress(1000.0).unwrap();
        assert_eq!(engine.game_profile().streak, 1);
    }

    #[test]
    fn test_stale_streak_zeroed_on_open() {
        let temp_dir = tempfile::tempdir().unwrap();
        let clock = clock_at("2024-03-01T10:00:00+03:00");

        {
            let mut engine = ChallengeEngine::open(
                Box::new(JsonFileStore::new(temp_dir.path())),
                None,
                clock.clone(),
                None,
            )
            .unwrap();
            engine.join("steps_100k").unwrap();
            clock.advance_days(1);
            engine.log_progress(1000.0).unwrap();
            assert_eq!(engine.game_profile().streak, 2);
        }

        // Reopen three days later: streak is stale, zeroed before any
        // new activity is recorded
        clock.advance_days(3);
        let engine = ChallengeEngine::open(
            Box::new(JsonFileStore::new(temp_dir.path())),
            None,
            clock.clone(),
            None,
        )
        .unwrap();
        assert_eq!(engine.game_profile().streak, 0);

        // Reopening the next day keeps a fresh streak alive
        let clock2 = clock_at("2024-03-01T10:00:00+03:00");
        let temp_dir2 = tempfile::tempdir().unwrap();
        {
            let mut engine = ChallengeEngine::open(
                Box::new(JsonFileStore::new(temp_dir2.path())),
                None,
                clock2.clone(),
                None,
            )
            .unwrap();
            engine.join("steps_100k").unwrap();
        }
        clock2.advance_days(1);
        let engine = ChallengeEngine::open(
            Box::new(JsonFileStore::new(temp_dir2.path())),
            None,
            clock2,
            None,
        )
        .unwrap();
        assert_eq!(engine.game_profile().streak, 1);
    }

    #[test]
    fn test_create_prepends_and_auto_joins() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        engine.join("water_marathon").unwrap();
        engine.log_progress(10.0).unwrap();

        let id = engine.create_challenge(custom_spec(5.0)).unwrap();

        assert!(id.starts_with("custom-"));
        assert_eq!(engine.active_challenge().unwrap().id, id);
        assert_eq!(engine.participant().unwrap().progress, 0.0);
    }

    #[test]
    fn test_create_rejects_invalid_goal() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        let err = engine.create_challenge(custom_spec(0.0)).unwrap_err();
        assert!(matches!(err, Error::ChallengeValidation(_)));
        assert_eq!(engine.available().len(), 3);
    }

    #[test]
    fn test_delete_builtin_is_a_complete_noop() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        engine.join("water_marathon").unwrap();
        engine.log_progress(12.0).unwrap();

        let err = engine.delete_challenge("water_marathon").unwrap_err();
        assert!(matches!(err, Error::ProtectedChallenge(_)));

        // List unchanged, active selection and progress untouched
        assert_eq!(engine.available().len(), 3);
        assert_eq!(engine.active_challenge().unwrap().id, "water_marathon");
        assert_eq!(engine.participant().unwrap().progress, 12.0);
    }

    #[test]
    fn test_delete_active_custom_leaves_first() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        let id = engine.create_challenge(custom_spec(5.0)).unwrap();

        engine.delete_challenge(&id).unwrap();
        assert!(engine.active_challenge().is_none());
        assert!(engine.participant().is_none());
        assert_eq!(engine.available().len(), 3);
    }

    #[test]
    fn test_delete_unknown_fails() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        let err = engine.delete_challenge("custom-missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_auto_track_routes_only_matching_kind() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        engine.join("water_marathon").unwrap();

        engine.auto_track(ChallengeKind::Step, 5000.0).unwrap();
        assert_eq!(engine.participant().unwrap().progress, 0.0);

        engine.auto_track(ChallengeKind::Water, 1.5).unwrap();
        assert_eq!(engine.participant().unwrap().progress, 1.5);
    }

    #[test]
    fn test_leave_when_idle_is_noop() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        engine.leave().unwrap();
        assert!(engine.active_challenge().is_none());
    }

    #[test]
    fn test_state_persists_across_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let clock = clock_at("2024-03-01T10:00:00+03:00");

        let custom_id;
        {
            let mut engine = ChallengeEngine::open(
                Box::new(JsonFileStore::new(temp_dir.path())),
                None,
                clock.clone(),
                None,
            )
            .unwrap();
            engine.set_username("sasha").unwrap();
            custom_id = engine.create_challenge(custom_spec(5.0)).unwrap();
            engine.log_progress(5.0).unwrap();
        }

        let engine = ChallengeEngine::open(
            Box::new(JsonFileStore::new(temp_dir.path())),
            None,
            clock,
            None,
        )
        .unwrap();

        assert_eq!(engine.game_profile().username, "sasha");
        assert_eq!(engine.game_profile().trophies, 1);
        assert!(engine
            .game_profile()
            .completed_challenges
            .contains(&custom_id));
        assert_eq!(engine.active_challenge().unwrap().id, custom_id);
        assert_eq!(engine.participant().unwrap().progress, 5.0);
        // The celebration slot is runtime-only and does not survive
        assert!(engine.pending_celebration().is_none());
    }

    #[test]
    fn test_mirror_failure_never_surfaces() {
        let clock = clock_at("2024-03-01T10:00:00+03:00");
        let mut engine = ChallengeEngine::open(
            Box::new(MemoryStore::new()),
            Some(Box::new(BrokenStore)),
            clock,
            None,
        )
        .unwrap();

        engine.join("water_marathon").unwrap();
        engine.log_progress(3.0).unwrap();
        assert_eq!(engine.participant().unwrap().progress, 3.0);
    }

    #[test]
    fn test_primary_store_failure_surfaces_but_memory_holds() {
        let clock = clock_at("2024-03-01T10:00:00+03:00");
        let mut engine =
            ChallengeEngine::open(Box::new(BrokenStore), None, clock, None).unwrap();

        assert!(engine.join("water_marathon").is_err());
        // In-memory state moved anyway; the session keeps working
        assert_eq!(engine.active_challenge().unwrap().id, "water_marathon");
    }

    #[test]
    fn test_invite_link_embeds_active_id() {
        let mut engine = engine_with(clock_at("2024-03-01T10:00:00+03:00"));
        assert!(engine.invite_link().is_none());

        engine.join("steps_100k").unwrap();
        assert_eq!(
            engine.invite_link().as_deref(),
            Some("vitalog://join/steps_100k")
        );
    }
}
