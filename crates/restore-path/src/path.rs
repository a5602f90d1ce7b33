//! Interned structural paths.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};

use restore_value::Value;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::pattern::compiled;
use crate::{is_valid_index, PathError, Segment};

struct PathInner {
    segments: Box<[Segment]>,
    text: String,
}

/// An interned address into a tree.
///
/// Every distinct segment sequence maps to exactly one `Path` instance for the
/// lifetime of the process. Equality and hashing are therefore pointer
/// based: two paths are equal iff they are the same allocation.
///
/// ```
/// use restore_path::Path;
///
/// let a = Path::new(["users", "0", "comments"]);
/// let b = Path::root().child("users").child(0).child("comments");
/// assert!(Path::ptr_eq(&a, &b));
/// assert_eq!(a.to_string(), "/users/0/comments");
/// ```
#[derive(Clone)]
pub struct Path(Arc<PathInner>);

fn interner() -> &'static Mutex<HashMap<Box<[Segment]>, Path>> {
    static INTERNER: OnceLock<Mutex<HashMap<Box<[Segment]>, Path>>> = OnceLock::new();
    INTERNER.get_or_init(|| Mutex::new(HashMap::new()))
}

fn render(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_owned();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(&segment.to_string());
    }
    out
}

/// `Key` text spelling a canonical index becomes that index, so every
/// rendering maps to one segment sequence.
fn canonical(segment: Segment) -> Segment {
    match segment {
        Segment::Key(key) if is_valid_index(&key) => Segment::parse(&key),
        other => other,
    }
}

impl Path {
    /// Returns the interned path for `segments`.
    pub fn new<I>(segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Segment>,
    {
        let segments: Vec<Segment> = segments.into_iter().map(Into::into).collect();
        Self::intern(segments)
    }

    fn intern(segments: Vec<Segment>) -> Self {
        let segments: Vec<Segment> = segments.into_iter().map(canonical).collect();
        // A poisoned interner still holds a consistent map: entries are only
        // ever inserted whole.
        let mut table = interner()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(path) = table.get(segments.as_slice()) {
            return path.clone();
        }
        let segments = segments.into_boxed_slice();
        let text = render(&segments);
        let path = Path(Arc::new(PathInner {
            segments: segments.clone(),
            text,
        }));
        table.insert(segments, path.clone());
        path
    }

    /// The empty path, addressing the whole tree.
    pub fn root() -> Self {
        Self::intern(Vec::new())
    }

    /// Parses the `/seg1/seg2` form.
    ///
    /// `""` and `"/"` both denote the root. Any other input must start with
    /// `/`.
    ///
    /// ```
    /// use restore_path::Path;
    ///
    /// let path = Path::parse("/users/1/comments").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert!(Path::parse("/").unwrap().is_root());
    /// assert!(Path::parse("users").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, PathError> {
        if text.is_empty() || text == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(PathError::InvalidPath {
                path: text.to_owned(),
                reason: "path must start with '/'",
            });
        };
        Ok(Self::new(rest.split('/')))
    }

    /// True when both handles are the same interned instance.
    pub fn ptr_eq(a: &Path, b: &Path) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0.segments
    }

    pub fn len(&self) -> usize {
        self.0.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.segments.last()
    }

    pub fn as_str(&self) -> &str {
        &self.0.text
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.0.segments.iter()
    }

    /// Segments from the deepest to the root.
    pub fn reversed(&self) -> std::iter::Rev<std::slice::Iter<'_, Segment>> {
        self.0.segments.iter().rev()
    }

    /// The interned path one segment deeper.
    pub fn child(&self, segment: impl Into<Segment>) -> Path {
        let mut segments = Vec::with_capacity(self.len() + 1);
        segments.extend_from_slice(&self.0.segments);
        segments.push(segment.into());
        Self::intern(segments)
    }

    /// The interned path one segment shallower.
    ///
    /// # Errors
    ///
    /// The root has no parent and yields [`PathError::InvalidPath`].
    pub fn parent(&self) -> Result<Path, PathError> {
        match self.0.segments.split_last() {
            Some((_, init)) => Ok(Self::intern(init.to_vec())),
            None => Err(PathError::InvalidPath {
                path: self.to_string(),
                reason: "the root path has no parent",
            }),
        }
    }

    /// The first `len` segments of this path.
    pub fn prefix(&self, len: usize) -> Path {
        let len = len.min(self.len());
        Self::intern(self.0.segments[..len].to_vec())
    }

    /// Tests this path against `pattern` read as a regular expression.
    ///
    /// The pattern's string form is anchored at both ends, so segment counts
    /// must line up unless the pattern itself spans separators (`.*`).
    ///
    /// ```
    /// use restore_path::Path;
    ///
    /// let path = Path::new(["users", "0", "comments"]);
    /// assert!(path.matches(&Path::new(["users", ".", "comments"])));
    /// assert!(!path.matches(&Path::new(["users", "."])));
    /// ```
    pub fn matches(&self, pattern: &Path) -> bool {
        match compiled(pattern.as_str()) {
            Some(regex) => regex.is_match(self.as_str()),
            None => false,
        }
    }

    /// True iff `other` lies strictly beneath this path.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        other.len() > self.len() && other.segments().starts_with(self.segments())
    }

    /// Indexes into `value` segment by segment.
    ///
    /// # Errors
    ///
    /// [`PathError::PathNotFound`] as soon as a segment is absent or the value
    /// reached so far is a scalar.
    pub fn walk<'v>(&self, value: &'v Value) -> Result<&'v Value, PathError> {
        self.iter().try_fold(value, |current, segment| {
            segment
                .index_into(current)
                .ok_or_else(|| PathError::PathNotFound {
                    path: self.to_string(),
                })
        })
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        Path::ptr_eq(self, other)
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl Default for Path {
    fn default() -> Self {
        Path::root()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.text)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.0.text)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Path::parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_renders_as_slash() {
        assert_eq!(Path::root().to_string(), "/");
        assert!(Path::root().is_root());
        assert!(Path::ptr_eq(&Path::root(), &Path::new(Vec::<Segment>::new())));
    }

    #[test]
    fn test_numeric_text_and_index_intern_together() {
        let a = Path::new(["users", "0"]);
        let b = Path::new([Segment::from("users"), Segment::Index(0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_explicit_numeric_key_segment_is_canonicalised() {
        let key = Path::new([Segment::Key("users".into()), Segment::Key("0".into())]);
        let index = Path::new([Segment::from("users"), Segment::Index(0)]);
        assert!(Path::ptr_eq(&key, &index));
        assert_eq!(key.segments()[1], Segment::Index(0));
        assert_eq!(Path::root().child(Segment::Key("3".into())), Path::parse("/3").unwrap());

        let padded = Path::new([Segment::Key("01".into())]);
        assert_eq!(padded.segments()[0], Segment::Key("01".into()));
    }

    #[test]
    fn test_prefix() {
        let path = Path::new(["a", "b", "c"]);
        assert_eq!(path.prefix(0), Path::root());
        assert_eq!(path.prefix(2), Path::new(["a", "b"]));
        assert_eq!(path.prefix(10), path);
    }

    #[test]
    fn test_walk_reports_full_path() {
        let doc = Value::from(json!({"users": []}));
        let err = Path::new(["people", "0"]).walk(&doc).unwrap_err();
        assert_eq!(err.to_string(), "path /people/0 not found");
    }

    #[test]
    fn test_walk_through_scalar_fails() {
        let doc = Value::from(json!({"name": "Diego"}));
        let err = Path::new(["name", "first"]).walk(&doc).unwrap_err();
        assert!(matches!(err, PathError::PathNotFound { .. }));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let path = Path::new(["users", "3"]);
        let text = serde_json::to_string(&path).unwrap();
        assert_eq!(text, "\"/users/3\"");
        let back: Path = serde_json::from_str(&text).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<Path>("\"users\"").is_err());
    }
}
