//! Unique names within one scope: `Foo`, `Foo1`, `Foo2`, ...

use std::collections::{HashMap, HashSet};

/// Assigns each candidate the first free name among `base`, `base1`, `base2`, ...
///
/// State is per scope: create one per document (or per class) and drop it afterwards.
#[derive(Debug, Default)]
pub struct NameDisambiguator {
    taken: HashSet<String>,
    // Suffixes below this were already found taken; the set only grows, so they stay taken.
    next_suffix: HashMap<String, usize>,
}

impl NameDisambiguator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut suffix = self.next_suffix.get(base).copied().unwrap_or(1);
        loop {
            let candidate = format!("{base}{suffix}");
            suffix += 1;
            if self.taken.insert(candidate.clone()) {
                self.next_suffix.insert(base.to_string(), suffix);
                return candidate;
            }
        }
    }
}

/// Disambiguate a whole sequence in order with fresh state.
pub fn disambiguate<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scope = NameDisambiguator::new();
    names.into_iter().map(|n| scope.assign(n.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_get_increasing_suffixes() {
        assert_eq!(
            disambiguate(["Foo", "Foo", "Bar", "Foo"]),
            vec!["Foo", "Foo1", "Bar", "Foo2"]
        );
        assert_eq!(disambiguate(["X", "X", "X"]), vec!["X", "X1", "X2"]);
    }

    #[test]
    fn explicit_suffixed_name_is_skipped() {
        assert_eq!(
            disambiguate(["Foo1", "Foo", "Foo"]),
            vec!["Foo1", "Foo", "Foo2"]
        );
    }

    #[test]
    fn scopes_do_not_leak() {
        let first = disambiguate(["Run", "Run"]);
        let second = disambiguate(["Run"]);
        assert_eq!(first, vec!["Run", "Run1"]);
        assert_eq!(second, vec!["Run"]);
    }

    #[test]
    fn many_repeats_stay_iterative() {
        let names = disambiguate(std::iter::repeat_n("M", 2_000));
        assert_eq!(names[0], "M");
        assert_eq!(names[1_999], "M1999");
    }

    #[test]
    fn empty_input() {
        assert!(disambiguate(Vec::<String>::new()).is_empty());
        let mut scope = NameDisambiguator::new();
        assert_eq!(scope.assign(""), "");
        assert_eq!(scope.assign(""), "1");
    }
}
