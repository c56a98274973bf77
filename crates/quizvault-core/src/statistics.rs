//! Result statistics for the results page and the results viewer.

use serde::Serialize;

use crate::model::{StudentDegree, Test};
use crate::scoring::Aggregate;

/// Full circle in the sixteenths of a degree pie charts are drawn in.
pub const FULL_CIRCLE: i32 = 5760;

/// Percentage of questions left, failed and credited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeShares {
    pub left_pct: f64,
    pub failed_pct: f64,
    pub credited_pct: f64,
}

impl OutcomeShares {
    /// # Panics
    ///
    /// Panics if `question_count` is zero.
    pub fn new(left: usize, failed: usize, question_count: usize) -> Self {
        assert!(question_count > 0, "outcome shares over zero questions");
        let n = question_count as f64;
        let credited = question_count.saturating_sub(left + failed);
        Self {
            left_pct: left as f64 / n * 100.0,
            failed_pct: failed as f64 / n * 100.0,
            credited_pct: credited as f64 / n * 100.0,
        }
    }

    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        Self::new(
            aggregate.left.len(),
            aggregate.failed_at.len(),
            aggregate.question_count,
        )
    }

    /// `None` when the test has no questions, e.g. a hand-edited bank.
    pub fn from_degree(degree: &StudentDegree, question_count: usize) -> Option<Self> {
        (question_count > 0)
            .then(|| Self::new(degree.left.len(), degree.failed_at.len(), question_count))
    }
}

/// Degree-weighted pie of one result: what the left and failed questions
/// were worth, against what was earned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PieSlices {
    pub left: f64,
    pub failed: f64,
    pub earned: f64,
}

impl PieSlices {
    /// # Panics
    ///
    /// Panics if `question_count` is zero.
    pub fn new(
        left: usize,
        failed: usize,
        question_count: usize,
        max_degree: f64,
        earned: f64,
    ) -> Self {
        assert!(question_count > 0, "pie slices over zero questions");
        let per_question = max_degree / question_count as f64;
        Self {
            left: left as f64 * per_question,
            failed: failed as f64 * per_question,
            earned,
        }
    }

    /// `None` when the test has no questions.
    pub fn from_degree(degree: &StudentDegree, question_count: usize) -> Option<Self> {
        (question_count > 0).then(|| {
            Self::new(
                degree.left.len(),
                degree.failed_at.len(),
                question_count,
                degree.out_of,
                degree.degree,
            )
        })
    }

    pub fn total(&self) -> f64 {
        self.left + self.failed + self.earned
    }

    /// Span of each slice in sixteenths of a degree, in slice order
    /// (left, failed, earned). Each span is rounded on its own, so the sum
    /// may be off [`FULL_CIRCLE`] by one or two.
    pub fn spans(&self) -> [i32; 3] {
        let total = self.total();
        if total <= 0.0 {
            return [0; 3];
        }
        [self.left, self.failed, self.earned].map(|piece| {
            (piece * f64::from(FULL_CIRCLE) / total).round() as i32
        })
    }
}

/// Results of one test across every student who took it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub test: String,
    pub attempts: usize,
    pub max_degree: f64,
    pub mean_degree: Option<f64>,
    pub best_degree: Option<f64>,
    pub worst_degree: Option<f64>,
    /// How many students failed each question, by question index.
    pub failed_per_question: Vec<usize>,
    /// How many students left each question unanswered.
    pub left_per_question: Vec<usize>,
}

impl TestSummary {
    /// The question most students got wrong, if anyone got one wrong.
    pub fn hardest_question(&self) -> Option<usize> {
        self.failed_per_question
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(i, _)| i)
    }
}

/// Summarize a test from its attached results.
pub fn summarize(test: &Test) -> TestSummary {
    let n = test.questions.len();
    let mut failed_per_question = vec![0; n];
    let mut left_per_question = vec![0; n];
    for degree in &test.student_degrees {
        for &i in &degree.failed_at {
            if let Some(count) = failed_per_question.get_mut(i) {
                *count += 1;
            }
        }
        for &i in &degree.left {
            if let Some(count) = left_per_question.get_mut(i) {
                *count += 1;
            }
        }
    }

    let degrees: Vec<f64> = test.student_degrees.iter().map(|d| d.degree).collect();
    let attempts = degrees.len();
    let mean_degree = (attempts > 0).then(|| degrees.iter().sum::<f64>() / attempts as f64);
    let best_degree = degrees.iter().copied().reduce(f64::max);
    let worst_degree = degrees.iter().copied().reduce(f64::min);

    TestSummary {
        test: test.name.clone(),
        attempts,
        max_degree: test.max_degree,
        mean_degree,
        best_degree,
        worst_degree,
        failed_per_question,
        left_per_question,
    }
}

/// Summaries for every test in the bank, in bank order.
pub fn summarize_bank(tests: &[Test]) -> Vec<TestSummary> {
    tests.iter().map(summarize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Question};
    use crate::scoring::{aggregate, Degree};
    use std::collections::BTreeSet;

    fn degree(score: f64, failed: &[usize], left: &[usize]) -> StudentDegree {
        StudentDegree {
            name: "Ali Omar".into(),
            phone: String::new(),
            school: String::new(),
            grade: "First".into(),
            degree: score,
            out_of: 30.0,
            failed_at: failed.iter().copied().collect::<BTreeSet<_>>(),
            left: left.iter().copied().collect::<BTreeSet<_>>(),
            test: "Science".into(),
        }
    }

    fn science() -> Test {
        let q = Question::new("q", None, vec![Answer::correct("a"), Answer::wrong("b")]).unwrap();
        Test::new(1, "Science", "", 60, vec![q.clone(), q.clone(), q], 30.0).unwrap()
    }

    #[test]
    fn shares_of_a_finished_exam() {
        let result = aggregate(&[Degree::Earned(10.0), Degree::Earned(0.0), Degree::Unanswered]);
        let shares = OutcomeShares::from_aggregate(&result);
        let third = 100.0 / 3.0;
        assert!((shares.left_pct - third).abs() < 1e-9);
        assert!((shares.failed_pct - third).abs() < 1e-9);
        assert!((shares.credited_pct - third).abs() < 1e-9);
    }

    #[test]
    fn pie_is_degree_weighted() {
        let pie = PieSlices::from_degree(&degree(10.0, &[1], &[2]), 3).unwrap();
        assert_eq!(pie.left, 10.0);
        assert_eq!(pie.failed, 10.0);
        assert_eq!(pie.earned, 10.0);
        assert_eq!(pie.spans(), [1920, 1920, 1920]);
    }

    #[test]
    fn no_shares_for_a_test_without_questions() {
        let result = degree(0.0, &[], &[]);
        assert_eq!(OutcomeShares::from_degree(&result, 0), None);
        assert_eq!(PieSlices::from_degree(&result, 0), None);
        assert!(OutcomeShares::from_degree(&result, 3).is_some());
    }

    #[test]
    fn empty_pie_has_no_spans() {
        let pie = PieSlices::new(0, 0, 2, 10.0, 0.0);
        assert_eq!(pie.spans(), [0, 0, 0]);
    }

    #[test]
    fn summary_over_attempts() {
        let mut test = science();
        test.student_degrees = vec![
            degree(30.0, &[], &[]),
            degree(10.0, &[1], &[2]),
            degree(20.0, &[1], &[]),
        ];
        let summary = summarize(&test);
        assert_eq!(summary.attempts, 3);
        assert_eq!(summary.mean_degree, Some(20.0));
        assert_eq!(summary.best_degree, Some(30.0));
        assert_eq!(summary.worst_degree, Some(10.0));
        assert_eq!(summary.failed_per_question, vec![0, 2, 0]);
        assert_eq!(summary.left_per_question, vec![0, 0, 1]);
        assert_eq!(summary.hardest_question(), Some(1));
    }

    #[test]
    fn summary_without_attempts() {
        let summary = summarize(&science());
        assert_eq!(summary.attempts, 0);
        assert_eq!(summary.mean_degree, None);
        assert_eq!(summary.hardest_question(), None);
    }
}
