//! The exam-taking session.
//!
//! A session starts `Running` on the first question with the test's full
//! time limit. The caller ticks it once per second. When the countdown hits
//! zero the session moves to `TimedOut`: answers are frozen as they stand,
//! input is disabled, and only pages the student had already seen can be
//! revisited. Finishing builds the student's result and hands it to a
//! [`DegreeSink`]; only a successful write moves the session to `Finished`.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::SessionError;
use crate::model::{StudentDegree, StudentInfo, Test};
use crate::scoring::{aggregate, any_unanswered, AnswerSheet, Degree};
use crate::traits::DegreeSink;

/// Lifecycle of a session. There is no way back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    TimedOut,
    Finished,
}

/// The page the student is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Question(usize),
    Results,
}

/// What a one-second tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Time left, with the `m:ss` text for the current question page.
    Remaining { seconds: u32, display: Option<String> },
    /// The countdown just reached zero. Returned exactly once.
    TimedOut,
    /// The clock is not running.
    Stopped,
}

/// Format seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One student taking one test.
#[derive(Debug)]
pub struct Session {
    test_name: String,
    out_of: f64,
    student: StudentInfo,
    sheets: Vec<AnswerSheet>,
    display_orders: Vec<Vec<usize>>,
    state: SessionState,
    page: Page,
    remaining: u32,
    visited: BTreeSet<usize>,
    /// Degrees as they stood when input was locked (timeout or finish).
    frozen: Option<Vec<Degree>>,
    record: Option<StudentDegree>,
}

impl Session {
    /// Start a session on the first question. The answers of each question
    /// are shuffled for display with `rng`.
    pub fn new<R: Rng + ?Sized>(
        test: &Test,
        student: StudentInfo,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        let display_orders = test
            .questions
            .iter()
            .map(|q| {
                let mut order: Vec<usize> = (0..q.answers.len()).collect();
                order.shuffle(rng);
                order
            })
            .collect();
        Self::start(test, student, display_orders)
    }

    /// Start a session showing every question's answers in authoring order.
    pub fn in_authoring_order(test: &Test, student: StudentInfo) -> Result<Self, SessionError> {
        let display_orders = test
            .questions
            .iter()
            .map(|q| (0..q.answers.len()).collect())
            .collect();
        Self::start(test, student, display_orders)
    }

    fn start(
        test: &Test,
        student: StudentInfo,
        display_orders: Vec<Vec<usize>>,
    ) -> Result<Self, SessionError> {
        test.validate()?;
        student.validate()?;

        let degree_per_question = test.degree_per_question();
        let sheets: Vec<AnswerSheet> = test
            .questions
            .iter()
            .map(|q| AnswerSheet::new(q.clone(), degree_per_question))
            .collect();

        tracing::info!(
            test = %test.name,
            student = %student.name,
            questions = sheets.len(),
            seconds = test.time_limit_seconds,
            "exam session started"
        );

        Ok(Self {
            test_name: test.name.clone(),
            out_of: test.max_degree,
            student,
            sheets,
            display_orders,
            state: SessionState::Running,
            page: Page::Question(0),
            remaining: test.time_limit_seconds,
            visited: BTreeSet::from([0]),
            frozen: None,
            record: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    pub fn student(&self) -> &StudentInfo {
        &self.student
    }

    pub fn question_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn clock(&self) -> String {
        format_clock(self.remaining)
    }

    pub fn sheet(&self, question: usize) -> Option<&AnswerSheet> {
        self.sheets.get(question)
    }

    /// Authoring indices of a question's answers in the order to show them.
    pub fn display_order(&self, question: usize) -> Option<&[usize]> {
        self.display_orders.get(question).map(Vec::as_slice)
    }

    pub fn visited(&self) -> &BTreeSet<usize> {
        &self.visited
    }

    /// Whether answers can still change.
    pub fn accepts_input(&self) -> bool {
        self.state == SessionState::Running && self.frozen.is_none()
    }

    /// Current per-question degrees; frozen ones once input is locked.
    pub fn degrees(&self) -> Vec<Degree> {
        match &self.frozen {
            Some(frozen) => frozen.clone(),
            None => self.sheets.iter().map(AnswerSheet::degree).collect(),
        }
    }

    /// Indices of questions with nothing selected.
    pub fn unanswered(&self) -> Vec<usize> {
        self.degrees()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_unanswered())
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether submitting should first ask the student to confirm leaving
    /// questions unanswered. Never after a timeout.
    pub fn needs_confirmation(&self) -> bool {
        self.state == SessionState::Running && any_unanswered(&self.degrees())
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        if !self.accepts_input() {
            return Tick::Stopped;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.time_out();
            return Tick::TimedOut;
        }
        let display = match self.page {
            Page::Question(_) => Some(self.clock()),
            Page::Results => None,
        };
        Tick::Remaining {
            seconds: self.remaining,
            display,
        }
    }

    fn time_out(&mut self) {
        self.lock_input();
        self.state = SessionState::TimedOut;
        tracing::info!(
            test = %self.test_name,
            visited = ?self.visited,
            "exam time is up, answers frozen"
        );
    }

    fn lock_input(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.sheets.iter().map(AnswerSheet::degree).collect());
        }
    }

    fn check_question(&self, question: usize) -> Result<(), SessionError> {
        if question >= self.sheets.len() {
            return Err(SessionError::NoSuchQuestion {
                index: question,
                count: self.sheets.len(),
            });
        }
        Ok(())
    }

    /// Choose an answer (authoring index) on a question.
    pub fn choose(&mut self, question: usize, answer: usize) -> Result<Degree, SessionError> {
        if self.state == SessionState::Finished {
            return Err(SessionError::Finished);
        }
        if !self.accepts_input() {
            return Err(SessionError::InputDisabled);
        }
        self.check_question(question)?;
        Ok(self.sheets[question].choose(answer)?)
    }

    /// Whether an answer can be chosen right now.
    pub fn is_enabled(&self, question: usize, answer: usize) -> bool {
        self.accepts_input()
            && self
                .sheets
                .get(question)
                .is_some_and(|s| s.is_enabled(answer))
    }

    /// Where "next" leads from the current page.
    ///
    /// After a timeout, "next" leads to the closest visited page after the
    /// current one; past them lies the results page.
    pub fn next_page(&self) -> Page {
        match (self.state, self.page) {
            (SessionState::Running, Page::Question(i)) if i + 1 < self.sheets.len() => {
                Page::Question(i + 1)
            }
            (SessionState::Running, _) => Page::Results,
            (_, Page::Question(i)) => self
                .visited
                .range(i + 1..)
                .next()
                .map_or(Page::Results, |&next| Page::Question(next)),
            (_, Page::Results) => Page::Results,
        }
    }

    /// Move to the next question page. When the only way forward is the
    /// results page the current page is kept and `Page::Results` returned;
    /// reaching it is [`Session::finish`]'s job.
    pub fn advance(&mut self) -> Result<Page, SessionError> {
        if self.state == SessionState::Finished {
            return Err(SessionError::Finished);
        }
        match self.next_page() {
            Page::Question(next) => self.goto(next),
            Page::Results => Ok(Page::Results),
        }
    }

    /// Move to the previous question page, staying put on the first one.
    /// After a timeout this is the closest visited page before the current
    /// one.
    pub fn back(&mut self) -> Result<Page, SessionError> {
        match (self.state, self.page) {
            (SessionState::Finished, _) => Err(SessionError::Finished),
            (SessionState::TimedOut, Page::Question(i)) => {
                match self.visited.range(..i).next_back().copied() {
                    Some(previous) => self.goto(previous),
                    None => Ok(self.page),
                }
            }
            (_, Page::Question(i)) if i > 0 => self.goto(i - 1),
            (_, page) => Ok(page),
        }
    }

    /// Jump to a question page.
    pub fn goto(&mut self, question: usize) -> Result<Page, SessionError> {
        match self.state {
            SessionState::Finished => return Err(SessionError::Finished),
            SessionState::TimedOut if !self.visited.contains(&question) => {
                self.check_question(question)?;
                return Err(SessionError::NotVisited(question));
            }
            _ => {}
        }
        self.check_question(question)?;
        self.visited.insert(question);
        self.page = Page::Question(question);
        Ok(self.page)
    }

    /// Finish the exam: lock the answers, build the result and append it to
    /// `sink`.
    ///
    /// Calling this again after it succeeded returns the same result without
    /// writing it twice. If the write fails the error is returned, the
    /// session stays unfinished and its answers stay locked.
    pub fn finish<S: DegreeSink + ?Sized>(
        &mut self,
        sink: &S,
    ) -> Result<&StudentDegree, SessionError> {
        if self.record.is_some() {
            return self.record.as_ref().ok_or(SessionError::Finished);
        }

        self.lock_input();
        let degrees = self.degrees();
        let outcome = aggregate(&degrees);
        let record = StudentDegree {
            name: self.student.name.clone(),
            phone: self.student.phone.clone(),
            school: self.student.school.clone(),
            grade: self.student.grade.clone(),
            degree: outcome.total_degree,
            out_of: self.out_of,
            failed_at: outcome.failed_at,
            left: outcome.left,
            test: self.test_name.clone(),
        };

        if let Err(e) = sink.append(&record) {
            tracing::error!(
                test = %self.test_name,
                student = %self.student.name,
                "failed to save exam result: {e}"
            );
            return Err(SessionError::Persistence(e));
        }

        tracing::info!(
            test = %self.test_name,
            student = %record.name,
            degree = record.degree,
            out_of = record.out_of,
            "exam finished"
        );
        self.state = SessionState::Finished;
        self.page = Page::Results;
        let record: &StudentDegree = self.record.insert(record);
        Ok(record)
    }

    /// The saved result, once finished.
    pub fn record(&self) -> Option<&StudentDegree> {
        self.record.as_ref()
    }

    /// Abandon the exam. Nothing is saved.
    pub fn abort(self) {
        tracing::info!(
            test = %self.test_name,
            student = %self.student.name,
            finished = self.record.is_some(),
            "exam session closed"
        );
    }
}
