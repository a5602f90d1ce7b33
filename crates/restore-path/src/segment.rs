//! A single step of a [`Path`](crate::Path).

use std::fmt;

use restore_value::Value;

/// One path step: an object key or a sequence index.
///
/// Text that spells a canonical non-negative integer is always stored as
/// [`Segment::Index`], so `"0"` and `0` address the same location and intern
/// to the same path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    /// Builds a segment from text, normalising numeric keys to indices.
    ///
    /// ```
    /// use restore_path::Segment;
    ///
    /// assert_eq!(Segment::parse("12"), Segment::Index(12));
    /// assert_eq!(Segment::parse("users"), Segment::Key("users".into()));
    /// // Leading zeros and signs keep the text as a key.
    /// assert_eq!(Segment::parse("01"), Segment::Key("01".into()));
    /// assert_eq!(Segment::parse("-1"), Segment::Key("-1".into()));
    /// ```
    pub fn parse(text: &str) -> Self {
        if is_valid_index(text) {
            if let Ok(index) = text.parse::<usize>() {
                return Segment::Index(index);
            }
        }
        Segment::Key(text.to_owned())
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    /// The member name this segment uses when applied to an object.
    pub fn to_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }

    /// Steps one level into `value`.
    ///
    /// Returns `None` when the member or element is absent or when `value` is
    /// a scalar.
    pub fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (self, value) {
            (Segment::Key(key), Value::Object(map)) => map.get(key.as_str()),
            (Segment::Index(i), Value::Object(map)) => map.get(i.to_string().as_str()),
            (Segment::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::parse(s)
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        if is_valid_index(&s) {
            return Segment::parse(&s);
        }
        Segment::Key(s)
    }
}

impl From<&String> for Segment {
    fn from(s: &String) -> Self {
        Segment::parse(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

impl From<u32> for Segment {
    fn from(i: u32) -> Self {
        Segment::Index(i as usize)
    }
}

/// Lets bare integer literals name indices; negative numbers become keys.
impl From<i32> for Segment {
    fn from(i: i32) -> Self {
        match usize::try_from(i) {
            Ok(index) => Segment::Index(index),
            Err(_) => Segment::Key(i.to_string()),
        }
    }
}

impl From<&Segment> for Segment {
    fn from(s: &Segment) -> Self {
        s.clone()
    }
}

/// Check if a string is a canonical non-negative integer (no sign, no leading
/// zeros).
pub fn is_valid_index(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(u8::is_ascii_digit)
}
