use super::{ContentShape, EntityKind, require_text};
use crate::core::{EntityError, EntityId, StoreResult, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Vote {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub vote_options: Vec<String>,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<DateTime<Utc>>,
}

impl Vote {
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.closes_at.is_some_and(|closes_at| closes_at <= now)
    }

    pub fn option(&self, choice_index: usize) -> Option<&str> {
        self.vote_options.get(choice_index).map(String::as_str)
    }
}

impl ContentShape for Vote {
    const KIND: EntityKind = EntityKind::Vote;

    fn validate(&self) -> StoreResult<()> {
        require_text("vote title", &self.title)?;
        if self.vote_options.len() < 2 {
            return Err(EntityError::invalid_content("a vote needs at least two options"));
        }
        for option in &self.vote_options {
            require_text("vote option", option)?;
        }
        Ok(())
    }

    fn display_title(&self) -> Option<String> {
        Some(self.title.clone())
    }

    fn display_summary(&self) -> Option<String> {
        self.description.clone()
    }
}

/// One ballot, parented to its vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VoteSubmission {
    pub vote_id: EntityId,
    pub choice_index: usize,
    /// Set on anonymous ballots instead of `created_by`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id_hash: Option<String>,
}

impl ContentShape for VoteSubmission {
    const KIND: EntityKind = EntityKind::VoteSubmission;

    fn validate(&self) -> StoreResult<()> {
        if self.vote_id.is_nil() {
            return Err(EntityError::invalid_content("vote_id must be set"));
        }
        Ok(())
    }
}

/// 32-bit string hash of `user_id + vote_id` (the `s[0]*31^(n-1) + ...` hashCode).
///
/// Lets a client recognise its own anonymous ballot. It is not an anonymity
/// guarantee: anyone holding the member list can recompute it.
pub fn voter_hash(user_id: UserId, vote_id: EntityId) -> String {
    let input = format!("{user_id}{vote_id}");
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    hash.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn votes_need_two_non_blank_options() {
        let mut vote = Vote {
            title: "Lunch".into(),
            vote_options: vec!["Tacos".into()],
            ..Vote::default()
        };
        assert!(vote.validate().is_err());

        vote.vote_options.push(" ".into());
        assert!(vote.validate().is_err());

        vote.vote_options[1] = "Ramen".into();
        assert!(vote.validate().is_ok());
        assert_eq!(vote.option(1), Some("Ramen"));
        assert_eq!(vote.option(2), None);
    }

    #[test]
    fn voter_hash_is_stable_and_distinct() {
        let user = UserId::new_v4();
        let vote = EntityId::new_v4();
        assert_eq!(voter_hash(user, vote), voter_hash(user, vote));
        assert_ne!(voter_hash(user, vote), voter_hash(UserId::new_v4(), vote));
    }

    #[test]
    fn voter_hash_matches_string_hash_code() {
        let user = UserId::nil();
        let vote: EntityId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(voter_hash(user, vote), "-10905256");
    }

    #[test]
    fn closed_votes() {
        let now = Utc::now();
        let vote = Vote {
            closes_at: Some(now),
            ..Vote::default()
        };
        assert!(vote.is_closed(now));
        assert!(!Vote::default().is_closed(now));
    }
}
