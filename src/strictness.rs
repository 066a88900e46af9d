//! Handling of format violations
//!
//! Real-world capture files are not always conformant. Instead of aborting on every problem,
//! decoders and encoders report them to a [`Strictness`] policy, which decides whether the
//! problem is fatal, repaired, logged or silently ignored.

use std::fmt;
use std::str::FromStr;

use crate::error::PcapError;

/// Policy applied when a non-conformant construct is found
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strictness {
    /// Abort the operation with [`PcapError::Strictness`]
    #[default]
    Fail,
    /// Log a warning and try to repair the problem
    Fix,
    /// Log a warning and continue
    Warn,
    /// Continue silently (the problem is still visible at debug level)
    Ignore,
}

impl Strictness {
    /// Report a problem
    ///
    /// Returns an error if the policy is `Fail`, `Ok(())` otherwise.
    pub fn problem<S: AsRef<str>>(self, msg: S) -> Result<(), PcapError> {
        let msg = msg.as_ref();
        match self {
            Strictness::Fail => Err(PcapError::Strictness(msg.to_string())),
            Strictness::Fix | Strictness::Warn => {
                tracing::warn!("{}", msg);
                Ok(())
            }
            Strictness::Ignore => {
                tracing::debug!("ignored: {}", msg);
                Ok(())
            }
        }
    }

    /// Emit a warning, unless problems are ignored. Never fails.
    pub fn warn<S: AsRef<str>>(self, msg: S) {
        if self != Strictness::Ignore {
            tracing::warn!("{}", msg.as_ref());
        }
    }

    /// Returns true if reported problems should be repaired
    #[inline]
    pub fn should_fix(self) -> bool {
        self == Strictness::Fix
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Strictness::Fail => "fail",
            Strictness::Fix => "fix",
            Strictness::Warn => "warn",
            Strictness::Ignore => "ignore",
        };
        f.write_str(s)
    }
}

impl FromStr for Strictness {
    type Err = PcapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Strictness::Fail),
            "fix" => Ok(Strictness::Fix),
            "warn" => Ok(Strictness::Warn),
            "ignore" => Ok(Strictness::Ignore),
            _ => Err(PcapError::invalid_value(
                "strictness",
                format!("unknown policy '{}'", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn fail_returns_error() {
        let res = Strictness::Fail.problem("bad length");
        assert_eq!(res, Err(PcapError::Strictness("bad length".to_string())));
        assert!(!Strictness::Fail.should_fix());
    }

    #[traced_test]
    #[test]
    fn warn_logs_problem() {
        assert!(Strictness::Warn.problem("odd padding").is_ok());
        assert!(logs_contain("odd padding"));
        assert!(!Strictness::Warn.should_fix());
    }

    #[traced_test]
    #[test]
    fn fix_logs_and_fixes() {
        assert!(Strictness::Fix.problem("obsolete block").is_ok());
        assert!(logs_contain("obsolete block"));
        assert!(Strictness::Fix.should_fix());
    }

    #[traced_test]
    #[test]
    fn ignore_logs_at_debug_level() {
        assert!(Strictness::Ignore.problem("whatever").is_ok());
        Strictness::Ignore.warn("not shown");
        assert!(logs_contain("ignored: whatever"));
        assert!(!logs_contain("WARN"));
        assert!(!logs_contain("not shown"));
    }

    #[test]
    fn parse_policy() {
        assert_eq!("fix".parse::<Strictness>(), Ok(Strictness::Fix));
        assert_eq!("IGNORE".parse::<Strictness>(), Ok(Strictness::Ignore));
        assert!("lenient".parse::<Strictness>().is_err());
        assert_eq!(Strictness::Warn.to_string(), "warn");
        assert_eq!(Strictness::default(), Strictness::Fail);
    }
}
