//! Version ordering derived from wheel file names.
//!
//! Only the leading `major.minor.patch` integers are compared numerically;
//! whatever follows them is compared as a plain string. This is not a full
//! implementation of Python version ordering (`1.1.dev6` and `1.1.6rc6` are
//! ordered as strings), which is acceptable for choosing between release
//! wheels.

use crate::naming::version_field;
use regex::Regex;
use std::sync::OnceLock;

/// Comparable version parsed from a wheel file name.
///
/// Field order matters: the derived `Ord` compares the integers first and
/// the trailing text last.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct WheelVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Text following the numeric run, e.g. `rc1` or `.post2`
    pub suffix: String,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("version pattern is valid")
    })
}

impl WheelVersion {
    /// Parses the version field of a wheel file name.
    ///
    /// The field is the text between the first and second `-`. Names without
    /// a version field, or whose field does not start with a digit, parse as
    /// `0.0.0` with an empty suffix.
    ///
    /// ```
    /// use wheel_sync::version::WheelVersion;
    ///
    /// let v = WheelVersion::from_filename("pkg-1.2rc1-py3-none-any.whl");
    /// assert_eq!((v.major, v.minor, v.patch, v.suffix.as_str()), (1, 2, 0, "rc1"));
    /// ```
    pub fn from_filename(filename: &str) -> Self {
        version_field(filename)
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    /// Parses a version string such as `2.31.0` or `1.0.post1`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = version_regex().captures(text)?;
        // Digit runs too long for u64 saturate so they still sort highest
        let number = |i: usize| {
            caps.get(i)
                .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
                .unwrap_or(0)
        };
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);

        Some(Self {
            major: number(1),
            minor: number(2),
            patch: number(3),
            suffix: text[end..].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u64, minor: u64, patch: u64, suffix: &str) -> WheelVersion {
        WheelVersion {
            major,
            minor,
            patch,
            suffix: suffix.to_string(),
        }
    }

    #[test]
    fn test_parse_full_and_partial() {
        assert_eq!(WheelVersion::parse("1.2.3"), Some(v(1, 2, 3, "")));
        assert_eq!(WheelVersion::parse("1.5"), Some(v(1, 5, 0, "")));
        assert_eq!(WheelVersion::parse("7"), Some(v(7, 0, 0, "")));
        assert_eq!(WheelVersion::parse("1.2.3.4"), Some(v(1, 2, 3, ".4")));
        assert_eq!(WheelVersion::parse("2.0rc1"), Some(v(2, 0, 0, "rc1")));
        assert_eq!(WheelVersion::parse("dev"), None);
    }

    #[test]
    fn test_from_filename() {
        assert_eq!(
            WheelVersion::from_filename("requests-2.31.0-py3-none-any.whl"),
            v(2, 31, 0, "")
        );
        assert_eq!(WheelVersion::from_filename("noversion.whl"), v(0, 0, 0, ""));
        assert_eq!(
            WheelVersion::from_filename("pkg-latest-py3.whl"),
            v(0, 0, 0, "")
        );
        // Without a trailing tag the extension lands in the suffix
        assert_eq!(WheelVersion::from_filename("pkg-1.0.whl"), v(1, 0, 0, ".whl"));
    }

    #[test]
    fn test_ordering_numeric_before_suffix() {
        assert!(v(2, 0, 0, "") > v(1, 5, 0, ""));
        assert!(v(1, 10, 0, "") > v(1, 9, 9, ""));
        assert!(v(1, 0, 0, "b") > v(1, 0, 0, "a"));
        assert!(v(1, 0, 1, "") > v(1, 0, 0, "zzz"));
    }

    #[test]
    fn test_oversized_component_saturates() {
        let huge = WheelVersion::from_filename("pkg-99999999999999999999.0-x.whl");
        assert_eq!(huge.major, u64::MAX);
        assert!(huge > WheelVersion::from_filename("pkg-1.0-x.whl"));

        let leading_zeros = WheelVersion::parse("0000000000000000000000001.2").unwrap();
        assert_eq!(leading_zeros, v(1, 2, 0, ""));
    }

    #[test]
    fn test_suffix_compared_as_text() {
        // "1.1.dev6" vs "1.1.6rc6" is decided on the integers alone
        let dev = WheelVersion::parse("1.1.dev6").unwrap();
        let rc = WheelVersion::parse("1.1.6rc6").unwrap();
        assert_eq!(dev, v(1, 1, 0, ".dev6"));
        assert!(rc > dev);
    }
}
