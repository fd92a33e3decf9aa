//! Progress tracker, the single writer of a user's quest progress.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::storage::{self, KeyValueStore, ProgressState};
use crate::tiers;
use crate::types::{
    QuestOutcome, QuestProgressRecord, QuestStatus, UserImpact, UserTierProgress,
};

/// Owns one user's progress and writes it through to `S` after every change.
pub struct ProgressTracker<S: KeyValueStore> {
    store: S,
    key: String,
    state: ProgressState,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Build a tracker over `store`, reading `key` once.
    pub fn load(store: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = storage::load_state(&store, &key);
        debug!(
            "Loaded progress for {key}: {} records, {} points",
            state.records.len(),
            state.total_points
        );
        Self { store, key, state }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Mark a quest as in progress.
    ///
    /// Completed quests are left untouched and `false` is returned.
    pub fn start_quest(&mut self, quest_id: &str) -> bool {
        self.start_quest_at(quest_id, Utc::now())
    }

    pub fn start_quest_at(&mut self, quest_id: &str, now: DateTime<Utc>) -> bool {
        match self.state.records.get_mut(quest_id) {
            Some(record) if record.status == QuestStatus::Completed => {
                debug!("Ignoring start of completed quest {quest_id}");
                return false;
            }
            Some(record) => {
                record.status = QuestStatus::InProgress;
                record.started_at = Some(now);
            }
            None => {
                self.state
                    .records
                    .insert(quest_id.to_string(), QuestProgressRecord::started(now));
            }
        }
        debug!("Quest {quest_id} started for {}", self.key);
        self.persist();
        true
    }

    /// Record a completion and credit `points`.
    ///
    /// Prior status is not checked: completing the same quest twice credits
    /// the points twice. Callers guard with [`Self::is_quest_completed`].
    pub fn complete_quest(
        &mut self,
        quest_id: &str,
        points: u32,
        bonus_earned: bool,
        outcome: Option<QuestOutcome>,
    ) -> &QuestProgressRecord {
        self.complete_quest_at(quest_id, points, bonus_earned, outcome, Utc::now())
    }

    pub fn complete_quest_at(
        &mut self,
        quest_id: &str,
        points: u32,
        bonus_earned: bool,
        outcome: Option<QuestOutcome>,
        now: DateTime<Utc>,
    ) -> &QuestProgressRecord {
        self.state.total_points += u64::from(points);
        self.state
            .impact
            .record_completion(points, outcome.as_ref());

        let started_at = self
            .state
            .records
            .get(quest_id)
            .and_then(|record| record.started_at);
        self.state.records.insert(
            quest_id.to_string(),
            QuestProgressRecord {
                status: QuestStatus::Completed,
                started_at,
                completed_at: Some(now),
                points_earned: Some(points),
                bonus_earned,
                outcome,
            },
        );
        debug!(
            "Quest {quest_id} completed for {}: +{points} points (total {})",
            self.key, self.state.total_points
        );
        self.persist();
        &self.state.records[quest_id]
    }

    pub fn is_quest_completed(&self, quest_id: &str) -> bool {
        self.status(quest_id) == Some(QuestStatus::Completed)
    }

    pub fn is_quest_in_progress(&self, quest_id: &str) -> bool {
        self.status(quest_id) == Some(QuestStatus::InProgress)
    }

    /// Stored status; `None` means not started.
    pub fn status(&self, quest_id: &str) -> Option<QuestStatus> {
        self.state.records.get(quest_id).map(|record| record.status)
    }

    pub fn record(&self, quest_id: &str) -> Option<&QuestProgressRecord> {
        self.state.records.get(quest_id)
    }

    pub fn records(&self) -> &BTreeMap<String, QuestProgressRecord> {
        &self.state.records
    }

    pub fn total_points(&self) -> u64 {
        self.state.total_points
    }

    pub fn user_impact(&self) -> &UserImpact {
        &self.state.impact
    }

    pub fn tier_progress(&self) -> UserTierProgress {
        tiers::tier_progress(self.state.total_points)
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    fn persist(&self) {
        storage::save_state(&self.store, &self.key, &self.state);
    }
}
