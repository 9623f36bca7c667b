/*!
Lazy sequence helpers shared by the definite and indefinite container paths of the decoder.
*/

use core::iter::{FusedIterator, Take};

/// Consume at most `n` items from `iter`.
pub fn take<I: IntoIterator>(n: usize, iter: I) -> Take<I::IntoIter> {
    iter.into_iter().take(n)
}

/// Group `iter` into consecutive `(first, second)` pairs.
pub fn pairs<I: IntoIterator>(iter: I) -> Pairs<I::IntoIter> {
    Pairs {
        iter: iter.into_iter(),
        dangling: None,
        done: false,
    }
}

/// Iterator returned by [`pairs`].
///
/// Iteration stops as soon as either half of a pair is exhausted. An unmatched first half is
/// kept and can be recovered with [`Pairs::into_dangling`], so callers can tell a clean end
/// from a truncated one.
pub struct Pairs<I: Iterator> {
    iter: I,
    dangling: Option<I::Item>,
    done: bool,
}

impl<I: Iterator> Pairs<I> {
    pub fn has_dangling(&self) -> bool {
        self.dangling.is_some()
    }

    pub fn into_dangling(self) -> Option<I::Item> {
        self.dangling
    }
}

impl<I: Iterator> Iterator for Pairs<I> {
    type Item = (I::Item, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(first) = self.iter.next() else {
            self.done = true;
            return None;
        };
        match self.iter.next() {
            Some(second) => Some((first, second)),
            None => {
                self.done = true;
                self.dangling = Some(first);
                None
            }
        }
    }
}

impl<I: Iterator> FusedIterator for Pairs<I> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn even_sequence() {
        let mut p = pairs([1, 2, 3, 4]);
        assert_eq!(p.next(), Some((1, 2)));
        assert_eq!(p.next(), Some((3, 4)));
        assert_eq!(p.next(), None);
        assert!(p.into_dangling().is_none());
    }

    #[test]
    fn odd_sequence_keeps_dangling() {
        let mut p = pairs(["a", "b", "c"]);
        assert_eq!(p.by_ref().collect::<Vec<_>>(), [("a", "b")]);
        assert!(p.has_dangling());
        assert_eq!(p.next(), None);
        assert_eq!(p.into_dangling(), Some("c"));
    }

    #[test]
    fn take_is_bounded() {
        assert_eq!(take(2, 1..).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(pairs(take(3, 1..)).collect::<Vec<_>>(), [(1, 2)]);
    }
}
