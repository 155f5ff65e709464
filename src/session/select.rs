// src/session/select.rs

use rand::Rng;

use crate::models::question::Question;

/// Draws the question set for one session: a uniform Fisher-Yates shuffle
/// over a copy of the bank (decreasing index, swap partner from [0, i]),
/// truncated to `min(target, bank.len())`. The stored quiz is never
/// mutated; if the bank is smaller than the target, every question is used.
pub fn select_questions<R: Rng + ?Sized>(
    rng: &mut R,
    bank: &[Question],
    target: usize,
) -> Vec<Question> {
    let mut pool: Vec<Question> = bank.to_vec();

    let mut i = pool.len();
    while i > 1 {
        i -= 1;
        let j = rng.gen_range(0..=i);
        pool.swap(i, j);
    }

    pool.truncate(target.min(pool.len()));
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bank(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question::Mcq {
                question: format!("q{}", i),
                options: vec!["a".to_string(), "b".to_string()],
                correct_answer: "a".to_string(),
            })
            .collect()
    }

    fn texts(questions: &[Question]) -> Vec<String> {
        questions.iter().map(|q| q.text().to_string()).collect()
    }

    #[test]
    fn selects_exactly_min_of_target_and_bank() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select_questions(&mut rng, &bank(25), 10).len(), 10);
        assert_eq!(select_questions(&mut rng, &bank(4), 10).len(), 4);
        assert_eq!(select_questions(&mut rng, &bank(0), 10).len(), 0);
    }

    #[test]
    fn selection_has_no_duplicates_and_comes_from_the_bank() {
        let source = bank(30);
        let mut rng = StdRng::seed_from_u64(42);
        let picked = select_questions(&mut rng, &source, 10);

        let mut seen = texts(&picked);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), picked.len());

        let source_texts = texts(&source);
        assert!(picked.iter().all(|q| source_texts.contains(&q.text().to_string())));
    }

    #[test]
    fn full_length_shuffle_is_a_permutation_of_the_bank() {
        let source = bank(8);
        let mut rng = StdRng::seed_from_u64(3);
        let picked = select_questions(&mut rng, &source, 10);

        let mut got = texts(&picked);
        let mut want = texts(&source);
        got.sort();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn source_bank_is_untouched() {
        let source = bank(12);
        let before = texts(&source);
        let mut rng = StdRng::seed_from_u64(99);
        let _ = select_questions(&mut rng, &source, 5);
        assert_eq!(texts(&source), before);
    }
}
