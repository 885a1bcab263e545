//! Progress tracking and next-question selection.
//!
//! Both selection modes work on the same candidate list produced by
//! [`Tracker::unanswered`]; only the [`SelectionPolicy`] differs.

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::answers::AnswerRepository;
use crate::model::Question;
use crate::questions::QuestionStore;

/// Picks one question out of the unanswered candidates.
pub trait SelectionPolicy {
    fn select<'q>(&mut self, candidates: &[&'q Question]) -> Option<&'q Question>;
}

/// Deterministic policy: lowest `(category, numeric index)` wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl SelectionPolicy for Sequential {
    fn select<'q>(&mut self, candidates: &[&'q Question]) -> Option<&'q Question> {
        candidates
            .iter()
            .copied()
            .min_by(|a, b| (&a.category, a.index()).cmp(&(&b.category, b.index())))
    }
}

/// Uniform random pick. Each call is independent of earlier ones.
#[derive(Debug, Clone)]
pub struct RandomPick<R> {
    rng: R,
}

impl<R: Rng> RandomPick<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPick<rand::rngs::ThreadRng> {
    /// Random policy backed by the thread-local generator.
    pub fn thread() -> Self {
        Self::new(rand::rng())
    }
}

impl<R: Rng> SelectionPolicy for RandomPick<R> {
    fn select<'q>(&mut self, candidates: &[&'q Question]) -> Option<&'q Question> {
        candidates.choose(&mut self.rng).copied()
    }
}

/// Result of skipping the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome<'q> {
    /// Another unanswered question was picked.
    Next(&'q Question),
    /// Nothing else is left; stay on the current question.
    KeepCurrent(&'q Question),
    /// Nothing unanswered remains in scope.
    Exhausted,
}

/// Answered/total counts for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.answered == self.total
    }

    /// Completion as a percentage; 0 for an empty scope.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.answered as f64 / self.total as f64 * 100.0
        }
    }
}

/// Computes progress and picks questions for a user.
#[derive(Debug, Clone, Copy)]
pub struct Tracker<'a> {
    questions: &'a QuestionStore,
    answers: &'a AnswerRepository,
}

impl<'a> Tracker<'a> {
    pub fn new(questions: &'a QuestionStore, answers: &'a AnswerRepository) -> Self {
        Self { questions, answers }
    }

    /// Answered/total for the whole bank, or one category if given.
    ///
    /// Unknown users get `(0, total)`; unknown categories get `(0, 0)`.
    pub fn progress(&self, username: &str, category: Option<&str>) -> Progress {
        let mut progress = Progress::default();
        for q in self.questions.scope(category) {
            progress.total += 1;
            if self.answers.exists(username, &q.category, &q.id) {
                progress.answered += 1;
            }
        }
        progress
    }

    /// Progress for every category, keyed by slug.
    pub fn category_progress(&self, username: &str) -> BTreeMap<String, Progress> {
        self.questions
            .categories()
            .into_iter()
            .map(|c| (c.to_string(), self.progress(username, Some(c))))
            .collect()
    }

    /// Unanswered questions in scope, in bank order, leaving out `exclude`.
    pub fn unanswered(
        &self,
        username: &str,
        category: Option<&str>,
        exclude: Option<(&str, &str)>,
    ) -> Vec<&'a Question> {
        self.questions
            .scope(category)
            .filter(|q| exclude != Some((q.category.as_str(), q.id.as_str())))
            .filter(|q| !self.answers.exists(username, &q.category, &q.id))
            .collect()
    }

    /// Next unanswered question chosen by `policy`, or `None` when exhausted.
    pub fn next_with(
        &self,
        username: &str,
        category: Option<&str>,
        policy: &mut dyn SelectionPolicy,
    ) -> Option<&'a Question> {
        let candidates = self.unanswered(username, category, None);
        policy.select(&candidates)
    }

    /// Next unanswered question, random or sequential.
    pub fn next_question(
        &self,
        username: &str,
        category: Option<&str>,
        randomize: bool,
    ) -> Option<&'a Question> {
        if randomize {
            self.next_with(username, category, &mut RandomPick::thread())
        } else {
            self.next_with(username, category, &mut Sequential)
        }
    }

    /// Move past `current` without answering it.
    ///
    /// Picks among the other unanswered questions. If there are none, the
    /// current question is kept (even if it is the only one left), as long
    /// as it exists in the bank.
    pub fn skip(
        &self,
        username: &str,
        category: Option<&str>,
        current: Option<(&str, &str)>,
        policy: &mut dyn SelectionPolicy,
    ) -> SkipOutcome<'a> {
        let candidates = self.unanswered(username, category, current);
        if let Some(next) = policy.select(&candidates) {
            return SkipOutcome::Next(next);
        }

        match current.and_then(|(c, id)| self.questions.get(c, id)) {
            Some(q) => SkipOutcome::KeepCurrent(q),
            None => SkipOutcome::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn q(category: &str, id: &str) -> Question {
        Question {
            category: category.into(),
            id: id.into(),
            text: format!("{category} {id}?"),
        }
    }

    fn fixture() -> (tempfile::TempDir, QuestionStore, AnswerRepository) {
        let dir = tempfile::tempdir().unwrap();
        let store = QuestionStore::from_questions(vec![
            q("habits", "q1"),
            q("goals", "q10"),
            q("goals", "q2"),
            q("goals", "q1"),
        ]);
        let repo = AnswerRepository::new(dir.path());
        (dir, store, repo)
    }

    fn answer(repo: &AnswerRepository, user: &str, question: &Question) {
        assert!(repo.save(user, &Answer::for_question(question, "ok")));
    }

    #[test]
    fn new_user_has_zero_progress() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);
        assert_eq!(tracker.progress("ghost", None), Progress { answered: 0, total: 4 });
        assert_eq!(tracker.progress("ghost", Some("goals")).total, 3);
        assert_eq!(tracker.progress("ghost", Some("nope")).total, 0);
    }

    #[test]
    fn sequential_orders_numerically() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);

        let order: Vec<String> = std::iter::from_fn(|| {
            let next = tracker.next_question("alice", None, false)?;
            answer(&repo, "alice", next);
            Some(format!("{}/{}", next.category, next.id))
        })
        .collect();

        assert_eq!(order, vec!["goals/q1", "goals/q2", "goals/q10", "habits/q1"]);
        assert!(tracker.progress("alice", None).is_complete());
    }

    #[test]
    fn sequential_is_repeatable() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);
        let first = tracker.next_question("alice", Some("habits"), false);
        let second = tracker.next_question("alice", Some("habits"), false);
        assert_eq!(first, second);
        assert_eq!(first.unwrap().id, "q1");
    }

    #[test]
    fn random_only_picks_unanswered() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);
        for question in store.questions_in("goals") {
            answer(&repo, "alice", question);
        }

        let mut policy = RandomPick::new(StdRng::seed_from_u64(7));
        for _ in 0..20 {
            let next = tracker.next_with("alice", None, &mut policy).unwrap();
            assert_eq!(next.category, "habits");
        }
    }

    #[test]
    fn random_covers_candidates() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);
        let mut policy = RandomPick::new(StdRng::seed_from_u64(42));

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let next = tracker.next_with("alice", None, &mut policy).unwrap();
            seen.insert((next.category.clone(), next.id.clone()));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn exhausted_returns_none() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);
        for question in store.iter() {
            answer(&repo, "alice", question);
        }
        assert!(tracker.next_question("alice", None, true).is_none());
        assert!(tracker.next_question("alice", None, false).is_none());
    }

    #[test]
    fn skip_excludes_current() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);

        let outcome = tracker.skip("alice", Some("goals"), Some(("goals", "q1")), &mut Sequential);
        assert_eq!(outcome, SkipOutcome::Next(store.get("goals", "q2").unwrap()));
    }

    #[test]
    fn skip_keeps_current_when_nothing_else() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);

        let outcome = tracker.skip("alice", Some("habits"), Some(("habits", "q1")), &mut Sequential);
        assert_eq!(outcome, SkipOutcome::KeepCurrent(store.get("habits", "q1").unwrap()));

        answer(&repo, "alice", store.get("habits", "q1").unwrap());
        let outcome = tracker.skip("alice", Some("habits"), None, &mut Sequential);
        assert_eq!(outcome, SkipOutcome::Exhausted);
    }

    #[test]
    fn category_progress_counts() {
        let (_dir, store, repo) = fixture();
        let tracker = Tracker::new(&store, &repo);
        answer(&repo, "alice", store.get("goals", "q2").unwrap());

        let stats = tracker.category_progress("alice");
        assert_eq!(stats["goals"], Progress { answered: 1, total: 3 });
        assert_eq!(stats["habits"], Progress { answered: 0, total: 1 });
        assert!((stats["goals"].percent() - 33.333).abs() < 0.01);
    }
}
