use crate::enums::ChallengeStatus;
use crate::error::CoreError;
use crate::structs::{Challenge, SaveChallenge};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl SaveChallenge {
    /// Starts a challenge for a save with no goals completed.
    pub fn start(save_id: Uuid, challenge_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            save_id,
            challenge_id,
            completed_goal_ids: Vec::new(),
            status: ChallengeStatus::InProgress,
            started_at: now,
            completed_at: None,
        }
    }

    /// Marks a goal as completed or not and recomputes the status.
    ///
    /// The challenge is `Completed` exactly when every one of its goals is in
    /// `completed_goal_ids`.
    pub fn set_goal(
        &mut self,
        challenge: &Challenge,
        goal_id: Uuid,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if !challenge.goals.iter().any(|g| g.id == goal_id) {
            return Err(CoreError::invalid("goal_id", format!("{goal_id} is not a goal of this challenge")));
        }

        let already = self.completed_goal_ids.contains(&goal_id);
        match (completed, already) {
            (true, false) => self.completed_goal_ids.push(goal_id),
            (false, true) => self.completed_goal_ids.retain(|id| *id != goal_id),
            _ => {}
        }

        let all_done = challenge
            .goals
            .iter()
            .all(|g| self.completed_goal_ids.contains(&g.id));

        if all_done {
            if self.status != ChallengeStatus::Completed {
                self.status = ChallengeStatus::Completed;
                self.completed_at = Some(now);
            }
        } else {
            self.status = ChallengeStatus::InProgress;
            self.completed_at = None;
        }
        Ok(())
    }
}
