//! Counter arithmetic for the denormalized `likes` / `dislikes` columns.
//!
//! Every store applies the same transition: given the vote a user had before
//! and the vote they have after, the parent's counters move by a fixed delta.

use crate::models::VoteDirection;

/// Amount to add to the parent's `likes` and `dislikes` columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub likes: i64,
    pub dislikes: i64,
}

impl CounterDelta {
    /// Delta for moving a user's vote from `previous` to `next`.
    /// `None` means "no vote row".
    pub fn transition(previous: Option<VoteDirection>, next: Option<VoteDirection>) -> Self {
        let mut delta = CounterDelta::default();
        if previous == next {
            return delta;
        }
        match previous {
            Some(VoteDirection::Like) => delta.likes -= 1,
            Some(VoteDirection::Dislike) => delta.dislikes -= 1,
            None => {}
        }
        match next {
            Some(VoteDirection::Like) => delta.likes += 1,
            Some(VoteDirection::Dislike) => delta.dislikes += 1,
            None => {}
        }
        delta
    }

    pub fn is_zero(&self) -> bool {
        self.likes == 0 && self.dislikes == 0
    }

    /// Applies the delta to a pair of counters.
    pub fn apply(&self, likes: &mut i64, dislikes: &mut i64) {
        *likes += self.likes;
        *dislikes += self.dislikes;
    }
}
