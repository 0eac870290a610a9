use crate::catalog::PollCatalog;
use crate::error::CoreError;
use pollroom_models::{Command, Poll, PollCollectionState, PollOption};

/// Why a command was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownPoll,
    InactivePoll,
    UnknownOption,
}

/// Result of applying a command. Only `Accepted` warrants a resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, Outcome::Accepted)
    }
}

#[derive(Debug, Clone)]
struct PollRecord {
    id: String,
    name: String,
    question: String,
    options: Vec<PollOption>,
}

/// Authoritative poll state for one room.
///
/// The active poll is held as a single index into `polls`, so there is
/// always exactly one active poll and `currentPollId` cannot disagree with
/// it. Both are derived when a snapshot is taken.
#[derive(Debug, Clone)]
pub struct PollStateManager {
    polls: Vec<PollRecord>,
    active: usize,
}

impl PollStateManager {
    pub fn new(catalog: &PollCatalog) -> Result<Self, CoreError> {
        catalog.validate()?;
        Ok(Self::seed(catalog))
    }

    /// Seed from a catalog that has already passed `validate`.
    pub(crate) fn seed(catalog: &PollCatalog) -> Self {
        let polls = catalog
            .polls
            .iter()
            .map(|poll| PollRecord {
                id: poll.id.clone(),
                name: poll.name.clone(),
                question: poll.question.clone(),
                options: poll
                    .options
                    .iter()
                    .map(|option| PollOption {
                        id: option.id.clone(),
                        text: option.text.clone(),
                        votes: 0,
                    })
                    .collect(),
            })
            .collect();

        Self {
            polls,
            active: catalog.initial_index(),
        }
    }

    pub fn snapshot(&self) -> PollCollectionState {
        PollCollectionState {
            polls: self
                .polls
                .iter()
                .enumerate()
                .map(|(index, poll)| Poll {
                    id: poll.id.clone(),
                    name: poll.name.clone(),
                    question: poll.question.clone(),
                    options: poll.options.clone(),
                    is_active: index == self.active,
                })
                .collect(),
            current_poll_id: self.current_poll_id().to_string(),
        }
    }

    pub fn current_poll_id(&self) -> &str {
        &self.polls[self.active].id
    }

    fn position(&self, poll_id: &str) -> Option<usize> {
        self.polls.iter().position(|p| p.id == poll_id)
    }

    pub fn apply_vote(&mut self, poll_id: &str, option_id: &str) -> Outcome {
        let Some(index) = self.position(poll_id) else {
            return Outcome::Rejected(Rejection::UnknownPoll);
        };
        if index != self.active {
            return Outcome::Rejected(Rejection::InactivePoll);
        }
        let Some(option) = self.polls[index]
            .options
            .iter_mut()
            .find(|o| o.id == option_id)
        else {
            return Outcome::Rejected(Rejection::UnknownOption);
        };

        option.votes = option.votes.saturating_add(1);
        Outcome::Accepted
    }

    /// Make `poll_id` the active poll. Re-selecting the current poll is accepted.
    pub fn change_active_poll(&mut self, poll_id: &str) -> Outcome {
        match self.position(poll_id) {
            Some(index) => {
                self.active = index;
                Outcome::Accepted
            }
            None => Outcome::Rejected(Rejection::UnknownPoll),
        }
    }

    /// Zero every option of `poll_id`, whether or not it is active.
    pub fn reset_poll_votes(&mut self, poll_id: &str) -> Outcome {
        let Some(index) = self.position(poll_id) else {
            return Outcome::Rejected(Rejection::UnknownPoll);
        };
        for option in &mut self.polls[index].options {
            option.votes = 0;
        }
        Outcome::Accepted
    }

    pub fn apply(&mut self, command: &Command) -> Outcome {
        match command {
            Command::Vote { poll_id, option_id } => self.apply_vote(poll_id, option_id),
            Command::ChangePoll { poll_id } => self.change_active_poll(poll_id),
            Command::ResetPoll { poll_id } => self.reset_poll_votes(poll_id),
        }
    }
}

impl Default for PollStateManager {
    fn default() -> Self {
        Self::seed(&PollCatalog::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogOption, CatalogPoll};

    fn two_poll_catalog() -> PollCatalog {
        let options = |ids: &[&str]| -> Vec<CatalogOption> {
            ids.iter()
                .map(|id| CatalogOption {
                    id: id.to_string(),
                    text: id.to_uppercase(),
                })
                .collect()
        };
        PollCatalog {
            initial_poll: None,
            polls: vec![
                CatalogPoll {
                    id: "poll1".into(),
                    name: "Poll 1".into(),
                    question: "Which option is correct?".into(),
                    options: options(&["a", "b", "c", "d", "e"]),
                },
                CatalogPoll {
                    id: "poll2".into(),
                    name: "Poll 2".into(),
                    question: "Which option is the best?".into(),
                    options: options(&["a", "b", "c", "d"]),
                },
            ],
        }
    }

    fn votes(state: &PollCollectionState, poll_id: &str, option_id: &str) -> u64 {
        state.poll(poll_id).unwrap().option(option_id).unwrap().votes
    }

    fn assert_single_active(state: &PollCollectionState) {
        let active: Vec<&str> = state.active_polls().map(|p| p.id.as_str()).collect();
        assert_eq!(active, vec![state.current_poll_id.as_str()]);
    }

    #[test]
    fn seeds_with_zero_votes_and_first_poll_active() {
        let manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        let state = manager.snapshot();
        assert_eq!(state.current_poll_id, "poll1");
        assert_single_active(&state);
        assert!(state
            .polls
            .iter()
            .flat_map(|p| p.options.iter())
            .all(|o| o.votes == 0));
    }

    #[test]
    fn honours_configured_initial_poll() {
        let mut catalog = two_poll_catalog();
        catalog.initial_poll = Some("poll2".into());
        let manager = PollStateManager::new(&catalog).unwrap();
        assert_eq!(manager.current_poll_id(), "poll2");
        assert_single_active(&manager.snapshot());
    }

    #[test]
    fn construction_rejects_invalid_catalog() {
        let mut catalog = two_poll_catalog();
        catalog.polls[1].id = "poll1".into();
        assert!(matches!(
            PollStateManager::new(&catalog),
            Err(CoreError::DuplicatePoll(_))
        ));
    }

    #[test]
    fn default_manager_uses_builtin_catalog() {
        let state = PollStateManager::default().snapshot();
        assert_eq!(state.polls.len(), 5);
        assert_eq!(state.current_poll_id, "poll1");
        assert_single_active(&state);
    }

    #[test]
    fn vote_increments_only_the_target_option() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        let before = manager.snapshot();

        assert_eq!(manager.apply_vote("poll1", "c"), Outcome::Accepted);

        let after = manager.snapshot();
        assert_eq!(votes(&after, "poll1", "c"), 1);
        let mut expected = before;
        expected.polls[0].options[2].votes = 1;
        assert_eq!(after, expected);
    }

    #[test]
    fn vote_rejections_leave_state_untouched() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        manager.apply_vote("poll1", "a");
        let before = manager.snapshot();

        assert_eq!(
            manager.apply_vote("poll2", "a"),
            Outcome::Rejected(Rejection::InactivePoll)
        );
        assert_eq!(
            manager.apply_vote("nope", "a"),
            Outcome::Rejected(Rejection::UnknownPoll)
        );
        assert_eq!(
            manager.apply_vote("poll1", "z"),
            Outcome::Rejected(Rejection::UnknownOption)
        );
        assert_eq!(manager.snapshot(), before);
    }

    #[test]
    fn change_active_poll_moves_the_single_active_flag() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();

        assert_eq!(manager.change_active_poll("poll2"), Outcome::Accepted);

        let state = manager.snapshot();
        assert_eq!(state.current_poll_id, "poll2");
        assert!(!state.poll("poll1").unwrap().is_active);
        assert!(state.poll("poll2").unwrap().is_active);
        assert_single_active(&state);
    }

    #[test]
    fn reselecting_active_poll_is_accepted() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        assert_eq!(manager.change_active_poll("poll1"), Outcome::Accepted);
        assert_eq!(manager.current_poll_id(), "poll1");
    }

    #[test]
    fn change_to_unknown_poll_is_rejected() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        let before = manager.snapshot();
        assert_eq!(
            manager.change_active_poll("poll9"),
            Outcome::Rejected(Rejection::UnknownPoll)
        );
        assert_eq!(manager.snapshot(), before);
    }

    #[test]
    fn change_keeps_votes() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        manager.apply_vote("poll1", "b");
        manager.change_active_poll("poll2");
        assert_eq!(votes(&manager.snapshot(), "poll1", "b"), 1);
    }

    #[test]
    fn reset_zeroes_only_the_target_poll() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        manager.apply_vote("poll1", "a");
        manager.apply_vote("poll1", "e");
        manager.change_active_poll("poll2");
        manager.apply_vote("poll2", "d");

        // poll1 is inactive here; reset is still allowed
        assert_eq!(manager.reset_poll_votes("poll1"), Outcome::Accepted);

        let state = manager.snapshot();
        assert_eq!(state.poll("poll1").unwrap().total_votes(), 0);
        assert_eq!(votes(&state, "poll2", "d"), 1);
        assert_eq!(state.current_poll_id, "poll2");
    }

    #[test]
    fn reset_unknown_poll_is_rejected() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        manager.apply_vote("poll1", "a");
        let before = manager.snapshot();
        assert_eq!(
            manager.reset_poll_votes("poll7"),
            Outcome::Rejected(Rejection::UnknownPoll)
        );
        assert_eq!(manager.snapshot(), before);
    }

    #[test]
    fn apply_dispatches_commands() {
        let mut manager = PollStateManager::new(&two_poll_catalog()).unwrap();
        let vote = Command::Vote {
            poll_id: "poll1".into(),
            option_id: "a".into(),
        };
        assert!(manager.apply(&vote).is_accepted());
        assert!(manager.apply(&vote).is_accepted());
        assert_eq!(votes(&manager.snapshot(), "poll1", "a"), 2);

        assert!(manager
            .apply(&Command::ChangePoll {
                poll_id: "poll2".into()
            })
            .is_accepted());
        assert!(!manager.apply(&vote).is_accepted());

        assert!(manager
            .apply(&Command::ResetPoll {
                poll_id: "poll1".into()
            })
            .is_accepted());
        assert_eq!(votes(&manager.snapshot(), "poll1", "a"), 0);
    }

    #[test]
    fn single_active_poll_holds_across_command_sequence() {
        let mut manager = PollStateManager::default();
        let ids = ["poll3", "poll1", "missing", "poll5", "poll5", "poll2", ""];
        for id in ids {
            manager.change_active_poll(id);
            manager.apply_vote(id, "a");
            manager.reset_poll_votes(id);
            assert_single_active(&manager.snapshot());
        }
        assert_eq!(manager.current_poll_id(), "poll2");
    }
}
