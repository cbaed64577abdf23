//! K-way ordered merge of lazy sequences.
//!
//! Used to combine per-provider departure streams into one time-ordered
//! listing without draining any input further than necessary.

use std::iter::Peekable;

/// Merge already-sorted iterators into one sequence sorted under `key`.
///
/// When two heads tie on the key, the one from the earlier-listed input is
/// yielded first. Inputs are assumed individually sorted ascending under the
/// same key; only the selected input is advanced on each step.
pub fn merge_by_key<I, K, F>(inputs: Vec<I>, key: F) -> MergeByKey<I, F>
where
    I: Iterator,
    K: Ord,
    F: Fn(&I::Item) -> K,
{
    MergeByKey {
        inputs: inputs.into_iter().map(Iterator::peekable).collect(),
        key,
    }
}

/// Iterator returned by [`merge_by_key`].
pub struct MergeByKey<I, F>
where
    I: Iterator,
{
    inputs: Vec<Peekable<I>>,
    key: F,
}

impl<I, K, F> Iterator for MergeByKey<I, F>
where
    I: Iterator,
    K: Ord,
    F: Fn(&I::Item) -> K,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        // Drop exhausted inputs so they are not rescanned on every call.
        self.inputs.retain_mut(|input| input.peek().is_some());

        let mut smallest: Option<(usize, K)> = None;
        for (index, input) in self.inputs.iter_mut().enumerate() {
            let head = (self.key)(input.peek()?);
            // Strict comparison keeps the earliest-listed input on ties.
            match &smallest {
                Some((_, best)) if head >= *best => {}
                _ => smallest = Some((index, head)),
            }
        }
        let (index, _) = smallest?;
        self.inputs[index].next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_sorted_inputs() {
        let merged: Vec<i32> =
            merge_by_key(vec![vec![1, 4, 7].into_iter(), vec![2, 3, 9].into_iter()], |x| *x)
                .collect();
        assert_eq!(merged, vec![1, 2, 3, 4, 7, 9]);
    }

    #[test]
    fn ties_prefer_earlier_input() {
        // Items carry their input of origin; on a key tie the first-listed
        // input must win.
        let a = vec![(5, "a"), (6, "a")].into_iter();
        let b = vec![(5, "b")].into_iter();
        let merged: Vec<(i32, &str)> = merge_by_key(vec![a, b], |x| x.0).collect();
        assert_eq!(merged, vec![(5, "a"), (5, "b"), (6, "a")]);
    }

    #[test]
    fn handles_empty_inputs() {
        let merged: Vec<i32> = merge_by_key(
            vec![Vec::new().into_iter(), vec![1, 2].into_iter(), Vec::new().into_iter()],
            |x| *x,
        )
        .collect();
        assert_eq!(merged, vec![1, 2]);

        let empty: Vec<i32> = merge_by_key(Vec::<std::vec::IntoIter<i32>>::new(), |x| *x).collect();
        assert!(empty.is_empty());
    }

    #[test]
    fn advances_only_the_selected_input() {
        // A lazy input panics if drained past what the merge needed.
        let lazy = (0..).map(|i| {
            assert!(i < 3, "input drained too far");
            i * 10
        });
        let finite = vec![5, 15].into_iter();
        let merged: Vec<i32> = merge_by_key::<Box<dyn Iterator<Item = i32>>, _, _>(
            vec![Box::new(lazy), Box::new(finite)],
            |x| *x,
        )
        .take(4)
        .collect();
        assert_eq!(merged, vec![0, 5, 10, 15]);
    }
}
