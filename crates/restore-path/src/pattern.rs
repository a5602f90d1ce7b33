//! Regular-expression patterns over canonical path strings.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

use regex::Regex;
use tracing::warn;

use crate::{Path, PathError};

/// A compiled path pattern.
///
/// The pattern text is a raw regular expression tested against
/// [`Path::as_str`]. Metacharacters are significant: `.` is "any character",
/// so a literal dot must be written `\.`.
///
/// ```
/// use restore_path::{Path, Pattern};
///
/// let pattern = Pattern::new("/users/.*/comments").unwrap();
/// assert!(pattern.is_match(&Path::parse("/users/0/comments").unwrap()));
/// assert!(!pattern.is_match(&Path::parse("/users/0/comments/1").unwrap()));
/// ```
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` anchored at both ends of the path string.
    pub fn new(source: &str) -> Result<Self, PathError> {
        Self::compile(source, true)
    }

    /// Compiles `source` as a search: any substring of the path may match.
    pub fn unanchored(source: &str) -> Result<Self, PathError> {
        Self::compile(source, false)
    }

    fn compile(source: &str, anchored: bool) -> Result<Self, PathError> {
        let expr = if anchored {
            anchor(source)
        } else {
            source.to_owned()
        };
        let regex = Regex::new(&expr).map_err(|source_err| PathError::InvalidPattern {
            pattern: source.to_owned(),
            source: source_err,
        })?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.regex.is_match(path.as_str())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

fn anchor(source: &str) -> String {
    format!("^(?:{source})$")
}

/// Process-wide cache of anchored patterns used by [`Path::matches`].
///
/// Invalid expressions are cached as `None` so the warning is logged once.
pub(crate) fn compiled(source: &str) -> Option<Regex> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<Regex>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut table = cache
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(entry) = table.get(source) {
        return entry.clone();
    }
    let entry = match Regex::new(&anchor(source)) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(pattern = source, error = %err, "path pattern does not compile; it matches nothing");
            None
        }
    };
    table.insert(source.to_owned(), entry.clone());
    entry
}
