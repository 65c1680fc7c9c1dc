//! Polls and ballots.
//!
//! Each ballot is a `vote_submission` row parented to its vote. Ballots on anonymous
//! votes carry no `created_by`; the voter is recorded only as [`voter_hash`].

use super::require_typed;
use crate::content::{ContentShape, Vote, VoteSubmission, voter_hash};
use crate::core::{EntityError, EntityId, SpaceId, StoreResult, UserId};
use crate::model::{EntityFilters, EntityWithContent};
use crate::store::{EntityPlacement, EntityStore};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub async fn create_vote(
    store: &EntityStore,
    space_id: SpaceId,
    vote: &Vote,
    created_by: Option<UserId>,
) -> StoreResult<EntityWithContent<Vote>> {
    let entity = store
        .create_typed(space_id, vote, EntityPlacement::root().by(created_by))
        .await?;
    Ok(entity.with_content())
}

/// Casts `user_id`'s ballot. Closed votes, unknown options and second ballots are refused.
pub async fn submit_vote(
    store: &EntityStore,
    vote_id: EntityId,
    user_id: UserId,
    choice_index: usize,
) -> StoreResult<EntityWithContent<VoteSubmission>> {
    let vote = require_typed::<Vote>(store, vote_id).await?;

    if vote.parsed_content.is_closed(Utc::now()) {
        warn!(vote_id = %vote_id, "ballot on closed vote");
        return Err(EntityError::invalid_content("vote is closed"));
    }
    if vote.parsed_content.option(choice_index).is_none() {
        warn!(vote_id = %vote_id, choice_index, "ballot for unknown option");
        return Err(EntityError::invalid_content(format!(
            "choice {choice_index} is out of range for {} options",
            vote.parsed_content.vote_options.len()
        )));
    }
    if has_voted(store, vote_id, user_id).await? {
        warn!(vote_id = %vote_id, "duplicate ballot");
        return Err(EntityError::invalid_content("user has already voted"));
    }

    let anonymous = vote.parsed_content.is_anonymous;
    let submission = VoteSubmission {
        vote_id,
        choice_index,
        user_id_hash: anonymous.then(|| voter_hash(user_id, vote_id)),
    };
    let placement = EntityPlacement::under(vote_id, Vote::KIND.as_str())
        .by((!anonymous).then_some(user_id));

    let entity = store
        .create_typed(vote.space_id, &submission, placement)
        .await?;
    info!(vote_id = %vote_id, anonymous, "ballot recorded");
    Ok(entity.with_content())
}

/// True when `user_id` already has a live ballot on the vote, named or anonymous.
pub async fn has_voted(store: &EntityStore, vote_id: EntityId, user_id: UserId) -> StoreResult<bool> {
    let hash = voter_hash(user_id, vote_id);
    let ballots = ballots(store, vote_id).await?;
    Ok(ballots.iter().any(|ballot| {
        ballot.created_by == Some(user_id)
            || ballot.parsed_content.user_id_hash.as_deref() == Some(hash.as_str())
    }))
}

/// Ballot count per option index. Every option appears, including those with no ballots.
pub async fn tally_votes(store: &EntityStore, vote_id: EntityId) -> StoreResult<BTreeMap<usize, usize>> {
    let vote = require_typed::<Vote>(store, vote_id).await?;

    let mut tally: BTreeMap<usize, usize> = (0..vote.parsed_content.vote_options.len())
        .map(|index| (index, 0))
        .collect();
    for ballot in ballots(store, vote_id).await? {
        *tally.entry(ballot.parsed_content.choice_index).or_default() += 1;
    }
    Ok(tally)
}

async fn ballots(
    store: &EntityStore,
    vote_id: EntityId,
) -> StoreResult<Vec<EntityWithContent<VoteSubmission>>> {
    let filters = EntityFilters::active().entity_type(VoteSubmission::KIND.as_str());
    store.get_entity_children_with_content(vote_id, filters).await
}
