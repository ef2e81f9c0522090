use std::{fmt, io::BufRead, str::FromStr};

use clap::ArgMatches;

/// LogLevel
///
/// Represents minimum level of messages that will be logged
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel {
    pub level: usize,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel { level: 0 }),
            "warn" => Ok(LogLevel { level: 1 }),
            "info" => Ok(LogLevel { level: 2 }),
            "debug" => Ok(LogLevel { level: 3 }),
            "trace" => Ok(LogLevel { level: 4 }),
            "none" => Ok(LogLevel { level: 5 }),
            _ => Err("no match"),
        }
    }
}

impl LogLevel {
    pub fn is_none(&self) -> bool {
        self.level > 4
    }
    pub fn get_level(&self) -> usize {
        if self.level > 4 {
            0
        } else {
            self.level
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_str = ["error", "warn", "info", "debug", "trace", "none"];
        if self.level < 6 {
            write!(f, "{}", level_str[self.level])
        } else {
            write!(f, "unknown")
        }
    }
}

/// Initialize logging from command line arguments
pub fn init_log(m: &ArgMatches) -> anyhow::Result<()> {
    let verbose = m
        .get_one::<LogLevel>("loglevel")
        .copied()
        .unwrap_or(LogLevel { level: 1 });
    let quiet = verbose.is_none() || m.get_flag("quiet");
    let ts = m
        .get_one::<stderrlog::Timestamp>("timestamp")
        .copied()
        .unwrap_or(stderrlog::Timestamp::Off);

    stderrlog::new()
        .quiet(quiet)
        .verbosity(verbose.get_level())
        .timestamp(ts)
        .init()?;
    Ok(())
}

/// Read in next line and split on white space.
///
/// Returns None at EOF.  Blank lines give an empty field vector.
pub fn get_next_line<'a, R: BufRead>(
    rdr: &mut R,
    buf: &'a mut String,
) -> anyhow::Result<Option<Vec<&'a str>>> {
    buf.clear();
    if rdr.read_line(buf)? == 0 {
        Ok(None)
    } else {
        Ok(Some(buf.split_whitespace().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn log_level_parsing() {
        assert_eq!(LogLevel::from_str("WARN"), Ok(LogLevel { level: 1 }));
        assert_eq!(LogLevel::from_str("trace").unwrap().get_level(), 4);
        let none = LogLevel::from_str("none").unwrap();
        assert!(none.is_none());
        assert_eq!(none.get_level(), 0);
        assert!(LogLevel::from_str("loud").is_err());
        assert_eq!(format!("{}", LogLevel { level: 2 }), "info");
    }

    #[test]
    fn next_line_splits_on_any_white_space() {
        let mut rdr = Cursor::new("a\tb  c\n\nlast");
        let mut buf = String::new();

        let v = get_next_line(&mut rdr, &mut buf).unwrap().unwrap();
        assert_eq!(v, vec!["a", "b", "c"]);

        let v = get_next_line(&mut rdr, &mut buf).unwrap().unwrap();
        assert!(v.is_empty());

        let v = get_next_line(&mut rdr, &mut buf).unwrap().unwrap();
        assert_eq!(v, vec!["last"]);

        assert!(get_next_line(&mut rdr, &mut buf).unwrap().is_none());
    }
}
