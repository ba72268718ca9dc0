use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

static INTERNER: OnceLock<ThreadedRodeo> = OnceLock::new();

fn interner() -> &'static ThreadedRodeo {
    INTERNER.get_or_init(ThreadedRodeo::new)
}

/// A binary qualified name (`java.lang.String`, `com.example.Outer$Inner`).
///
/// Names are interned process-wide, so a `DotName` is `Copy` and equality is a
/// key comparison. Ordering follows the textual name, which keeps sorted output
/// stable across runs regardless of interning order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DotName(Spur);

impl DotName {
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    pub fn as_str(&self) -> &'static str {
        interner().resolve(&self.0)
    }

    /// The name without its package prefix. Nested classes keep their `$` separator.
    pub fn simple_name(&self) -> &'static str {
        let name = self.as_str();
        name.rsplit_once('.').map(|(_, simple)| simple).unwrap_or(name)
    }

    /// The package of this name, or `None` for the unnamed package.
    pub fn package(&self) -> Option<&'static str> {
        self.as_str().rsplit_once('.').map(|(pkg, _)| pkg)
    }

    /// Returns `true` for names that belong to the JDK (`java.*`, `javax.*`, `jdk.*`, `sun.*`).
    pub fn is_jdk(&self) -> bool {
        let name = self.as_str();
        ["java.", "javax.", "jdk.", "sun."]
            .iter()
            .any(|prefix| name.starts_with(prefix))
    }
}

impl From<&str> for DotName {
    fn from(value: &str) -> Self {
        DotName::new(value)
    }
}

impl PartialOrd for DotName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DotName {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for DotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for DotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DotName({})", self.as_str())
    }
}

impl Serialize for DotName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DotName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DotName::new(&raw))
    }
}
