//! Version tag parsing for revision discovery
//!
//! Discovery only needs to order release tags and step between patch
//! levels, so this is a deliberately small `vMAJOR.MINOR.PATCH[-PRE]`
//! parser rather than a full semantic-version implementation.

/// A parsed release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Prerelease identifier after the first `-`, if any
    pub pre: Option<String>,
    tag: String,
}

impl TagVersion {
    /// Parse a tag of the form `v1.2.3`, `1.2.3` or `v1.2.3-rc.1`.
    pub fn parse(tag: &str) -> Option<Self> {
        let body = tag.strip_prefix('v').unwrap_or(tag);
        let (core, pre) = match body.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return None,
            None => (body, None),
        };

        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            major,
            minor,
            patch,
            pre,
            tag: tag.to_string(),
        })
    }

    /// The tag string exactly as it appears in the repository.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// True when the tag carries no prerelease identifier.
    pub fn is_final(&self) -> bool {
        self.pre.is_none()
    }

    /// True for final `x.y.0` releases, the anchors of minor discovery.
    pub fn is_minor_release(&self) -> bool {
        self.patch == 0 && self.is_final()
    }

    /// The tag one patch level down, or `None` at `.0`.
    ///
    /// Keeps the `v` prefix convention of the original tag.
    pub fn previous_patch(&self) -> Option<TagVersion> {
        if self.patch == 0 {
            return None;
        }
        let prefix = if self.tag.starts_with('v') { "v" } else { "" };
        let tag = format!("{prefix}{}.{}.{}", self.major, self.minor, self.patch - 1);
        TagVersion::parse(&tag)
    }
}

impl Ord for TagVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // A final release ranks above any prerelease of the same triple.
        let pre_rank = |v: &TagVersion| u8::from(v.pre.is_none());
        (self.major, self.minor, self.patch, pre_rank(self), &self.pre, &self.tag).cmp(&(
            other.major,
            other.minor,
            other.patch,
            pre_rank(other),
            &other.pre,
            &other.tag,
        ))
    }
}

impl PartialOrd for TagVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for TagVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_prefixed() {
        let v = TagVersion::parse("v1.20.3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 20, 3));
        assert!(v.is_final());
        assert_eq!(v.tag(), "v1.20.3");

        let v = TagVersion::parse("2.0.0").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (2, 0, 0));
        assert!(v.is_minor_release());
    }

    #[test]
    fn test_parse_prerelease() {
        let v = TagVersion::parse("v1.21.0-rc.1").unwrap();
        assert_eq!(v.pre.as_deref(), Some("rc.1"));
        assert!(!v.is_final());
        assert!(!v.is_minor_release());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TagVersion::parse("not-a-tag").is_none());
        assert!(TagVersion::parse("v1.2").is_none());
        assert!(TagVersion::parse("v1.2.3.4").is_none());
        assert!(TagVersion::parse("").is_none());
        assert!(TagVersion::parse("v1.2.3-").is_none());
    }

    #[test]
    fn test_ordering() {
        let mut tags = vec![
            TagVersion::parse("v1.20.0").unwrap(),
            TagVersion::parse("v1.19.7").unwrap(),
            TagVersion::parse("v1.21.0-rc.1").unwrap(),
            TagVersion::parse("v1.21.0").unwrap(),
        ];
        tags.sort();
        let ordered: Vec<&str> = tags.iter().map(|t| t.tag()).collect();
        assert_eq!(ordered, vec!["v1.19.7", "v1.20.0", "v1.21.0-rc.1", "v1.21.0"]);
    }

    #[test]
    fn test_previous_patch() {
        let v = TagVersion::parse("v1.18.4").unwrap();
        assert_eq!(v.previous_patch().unwrap().tag(), "v1.18.3");

        let v = TagVersion::parse("1.18.4").unwrap();
        assert_eq!(v.previous_patch().unwrap().tag(), "1.18.3");

        let v = TagVersion::parse("v1.18.0").unwrap();
        assert!(v.previous_patch().is_none());
    }
}
