use std::collections::HashSet;

/// Case-insensitive set of agent names already in use.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    folded: HashSet<String>,
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.folded.contains(&fold(name))
    }

    pub fn insert(&mut self, name: &str) {
        self.folded.insert(fold(name));
    }
}

impl<S: AsRef<str>> FromIterator<S> for NameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

/// Returns `desired` unchanged when free, otherwise the first free
/// `desired (N)` with N counting up from 2.
pub fn resolve_unique_name(desired: &str, taken: &NameSet) -> String {
    let desired = desired.trim();
    if !taken.contains(desired) {
        return desired.to_string();
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{desired} ({suffix})");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
