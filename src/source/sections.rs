//! Registry of browsable sections and their aliases.

/// Alias → feed path. Several aliases may share one path.
const ALIASES: &[(&str, &str)] = &[
    ("leaders", "leaders"),
    ("briefing", "briefing"),
    ("finance", "finance-and-economics"),
    ("finance-and-economics", "finance-and-economics"),
    ("us", "united-states"),
    ("united-states", "united-states"),
    ("britain", "britain"),
    ("europe", "europe"),
    ("middle-east", "middle-east-and-africa"),
    ("asia", "asia"),
    ("china", "china"),
    ("americas", "the-americas"),
    ("business", "business"),
    ("science", "science-and-technology"),
    ("tech", "science-and-technology"),
    ("culture", "culture"),
    ("graphic", "graphic-detail"),
    ("world-this-week", "the-world-this-week"),
];

pub const DEFAULT_SECTION: &str = "leaders";

/// One browsable section: its feed path, the shortest alias and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub path: &'static str,
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
}

/// Sections sorted by path, each named by its shortest alias.
pub fn section_list() -> Vec<SectionInfo> {
    let mut paths: Vec<&'static str> = ALIASES.iter().map(|(_, p)| *p).collect();
    paths.sort_unstable();
    paths.dedup();

    paths
        .into_iter()
        .map(|path| {
            let mut aliases: Vec<&'static str> = ALIASES
                .iter()
                .filter(|(_, p)| *p == path)
                .map(|(a, _)| *a)
                .collect();
            aliases.sort_unstable_by(|a, b| a.len().cmp(&b.len()).then(a.cmp(b)));
            let name = aliases.remove(0);
            SectionInfo {
                path,
                name,
                aliases,
            }
        })
        .collect()
}

/// Feed path for an alias or path; unknown names pass through unchanged.
pub fn resolve(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    ALIASES
        .iter()
        .find(|(alias, path)| *alias == lower || *path == lower)
        .map(|(_, path)| (*path).to_string())
        .unwrap_or(lower)
}

/// Position of `name` (alias or path) in [`section_list`].
pub fn position(name: &str) -> Option<usize> {
    let path = resolve(name);
    section_list().iter().position(|s| s.path == path)
}

/// The section `step` places away from `current`, wrapping at both ends.
///
/// An unknown current section steps from the start of the list.
pub fn step(current: &str, step: isize) -> &'static str {
    let list = section_list();
    let len = list.len() as isize;
    let from = position(current).map(|p| p as isize).unwrap_or(0);
    let idx = (from + step).rem_euclid(len) as usize;
    list[idx].name
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_is_unique_and_sorted_by_path() {
        let list = section_list();
        let paths: Vec<_> = list.iter().map(|s| s.path).collect();
        let mut sorted = paths.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(paths, sorted);
        assert_eq!(list.len(), 15);
    }

    #[test]
    fn test_shortest_alias_is_primary() {
        let list = section_list();
        let science = list
            .iter()
            .find(|s| s.path == "science-and-technology")
            .unwrap();
        assert_eq!(science.name, "tech");
        assert_eq!(science.aliases, vec!["science"]);

        let finance = list
            .iter()
            .find(|s| s.path == "finance-and-economics")
            .unwrap();
        assert_eq!(finance.name, "finance");
    }

    #[test]
    fn test_resolve_aliases_and_paths() {
        assert_eq!(resolve("US"), "united-states");
        assert_eq!(resolve("united-states"), "united-states");
        assert_eq!(resolve("obituary"), "obituary");
    }

    #[test]
    fn test_step_wraps() {
        let list = section_list();
        let first = list[0].name;
        let last = list[list.len() - 1].name;
        assert_eq!(step(last, 1), first);
        assert_eq!(step(first, -1), last);
        assert_eq!(step("leaders", 0), "leaders");
    }
}
