use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, trace};

use super::ConfigError;

/// Separator used by [`Config::new`].
pub const DEFAULT_SEPARATOR: char = '=';

/// A flat `name = value` table loaded from line-oriented text.
///
/// Parsed values live in one table and explicitly set defaults in another.
/// Lookups consult the parsed values first and fall back to the defaults;
/// a name missing from both is reported as [`ConfigError::NotFound`].
///
/// Lines are trimmed before they are interpreted. Blank lines and lines
/// starting with `#` are ignored, as are lines without a separator or with
/// an empty name. Everything else is split on the first separator and both
/// halves are trimmed. A later line for the same name replaces the earlier one.
///
/// ## Example
///
/// ```
/// use dragon_kv::Config;
///
/// let mut config = Config::new();
/// config.set_default("port", "8080");
/// config.load_str("# server\nhost = localhost\n")?;
///
/// assert_eq!(config.get_str("host")?, "localhost");
/// assert_eq!(config.get_int("port")?, 8080);
/// # Ok::<(), dragon_kv::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    separator: char,
    values: HashMap<String, String>,
    defaults: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_separator(DEFAULT_SEPARATOR)
    }
}

impl Config {
    /// Creates an empty store using `=` as the separator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that splits lines on `separator`.
    pub fn with_separator(separator: char) -> Self {
        Self {
            separator,
            values: HashMap::new(),
            defaults: HashMap::new(),
        }
    }

    /// The character lines are split on.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Loads every line of the file at `path`.
    ///
    /// The file is closed before this returns, whether the load succeeded or not.
    /// Lines parsed before a read failure stay in the store.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.read_lines(BufReader::new(file), &path.display().to_string())
            .map_err(|source| ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Loads the file at `path` if it exists.
    ///
    /// Returns `Ok(false)` when there is no such file. Any other failure to
    /// open or read it is an error.
    pub fn load_optional_file(&mut self, path: impl AsRef<Path>) -> Result<bool, ConfigError> {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => {
                self.read_lines(BufReader::new(file), &path.display().to_string())
                    .map_err(|source| ConfigError::ReadError {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("optional config file {} not present", path.display());
                Ok(false)
            }
            Err(source) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Loads lines from an in-memory string.
    pub fn load_str(&mut self, content: &str) -> Result<(), ConfigError> {
        self.load_reader(content.as_bytes())
    }

    /// Loads lines from any buffered reader until it is exhausted.
    ///
    /// A final line without a trailing newline is still parsed. A read error
    /// aborts the load; lines read before it are kept.
    pub fn load_reader<R: BufRead>(&mut self, reader: R) -> Result<(), ConfigError> {
        self.read_lines(reader, "reader")?;
        Ok(())
    }

    fn read_lines<R: BufRead>(&mut self, mut reader: R, source: &str) -> std::io::Result<()> {
        let mut line = String::new();
        let mut line_no = 0usize;
        let mut stored = 0usize;

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_no += 1;

            match parse_line(&line, self.separator) {
                Line::Entry(name, value) => {
                    trace!("{source}:{line_no}: {name} set");
                    self.values.insert(name.to_string(), value.to_string());
                    stored += 1;
                }
                Line::Malformed => {
                    debug!("{source}:{line_no}: ignoring malformed line");
                }
                Line::Blank | Line::Comment => {}
            }
        }

        debug!("loaded {stored} entries from {source}");
        Ok(())
    }

    /// Sets the fallback value for `name`. Both arguments are trimmed.
    ///
    /// Defaults are never touched by loading, so a parsed value for the same
    /// name always wins.
    pub fn set_default(&mut self, name: &str, value: &str) {
        self.defaults
            .insert(name.trim().to_string(), value.trim().to_string());
    }

    /// Returns the raw text for `name`.
    pub fn get_str(&self, name: &str) -> Result<&str, ConfigError> {
        self.values
            .get(name)
            .or_else(|| self.defaults.get(name))
            .map(String::as_str)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    /// Returns the value for `name` parsed as a base-10 signed integer.
    pub fn get_int(&self, name: &str) -> Result<i64, ConfigError> {
        let value = self.get_str(name)?;
        value
            .parse()
            .map_err(|source| ConfigError::InvalidInteger {
                name: name.to_string(),
                value: value.to_string(),
                source,
            })
    }

    /// Returns the value for `name` parsed as a boolean.
    ///
    /// Accepts `true`/`false`, `t`/`f` and `1`/`0`, ignoring ASCII case.
    pub fn get_bool(&self, name: &str) -> Result<bool, ConfigError> {
        let value = self.get_str(name)?;
        parse_bool(value).ok_or_else(|| ConfigError::InvalidBool {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Returns true if `name` has a parsed value or a default.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.defaults.contains_key(name)
    }

    /// Returns every known name, from both tables, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .values
            .keys()
            .chain(self.defaults.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Values read from loaded input.
    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Fallbacks set with [`Config::set_default`].
    pub fn defaults(&self) -> &HashMap<String, String> {
        &self.defaults
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Comment,
    Malformed,
    Entry(&'a str, &'a str),
}

fn parse_line(line: &str, separator: char) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if trimmed.starts_with('#') {
        return Line::Comment;
    }
    match trimmed.split_once(separator) {
        Some((name, value)) if !name.is_empty() => Line::Entry(name.trim(), value.trim()),
        _ => Line::Malformed,
    }
}

/// Parses the boolean spellings accepted by [`Config::get_bool`].
pub fn parse_bool(s: &str) -> Option<bool> {
    const TRUE: [&str; 3] = ["true", "t", "1"];
    const FALSE: [&str; 3] = ["false", "f", "0"];

    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_line_kinds() {
        assert_eq!(parse_line("", '='), Line::Blank);
        assert_eq!(parse_line("   \t\n", '='), Line::Blank);
        assert_eq!(parse_line("  # a=b", '='), Line::Comment);
        assert_eq!(parse_line("no separator", '='), Line::Malformed);
        assert_eq!(parse_line(" =value", '='), Line::Malformed);
        assert_eq!(parse_line(" key = a=b \n", '='), Line::Entry("key", "a=b"));
        assert_eq!(parse_line("key=", '='), Line::Entry("key", ""));
    }

    #[test]
    fn test_load_str_name_and_age() {
        let mut config = Config::new();
        config.load_str("name=piyo\nage=28").unwrap();

        assert_eq!(config.get_str("name").unwrap(), "piyo");
        assert_eq!(config.get_str("age").unwrap(), "28");
        assert_eq!(config.get_int("age").unwrap(), 28);
        assert!(matches!(
            config.get_int("name"),
            Err(ConfigError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_ignored_lines_leave_store_untouched() {
        let mut config = Config::new();
        config
            .load_str("\n   \n# comment = 1\n  #x=y\njunk\n=value\n")
            .unwrap();

        assert!(config.values().is_empty());
        assert!(config.keys().is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut config = Config::new();
        config.load_str("a=1\na=2").unwrap();
        assert_eq!(config.get_str("a").unwrap(), "2");

        config.load_str("a = 3").unwrap();
        assert_eq!(config.get_str("a").unwrap(), "3");
    }

    #[test]
    fn test_values_take_precedence_over_defaults() {
        let mut config = Config::new();
        config.set_default(" host ", " example.org ");
        config.set_default("port", "80");
        config.load_str("port=8080").unwrap();

        assert_eq!(config.get_str("host").unwrap(), "example.org");
        assert_eq!(config.get_int("port").unwrap(), 8080);

        config.set_default("port", "81");
        assert_eq!(config.get_int("port").unwrap(), 8080);
        assert_eq!(config.keys(), vec!["host", "port"]);
    }

    #[test]
    fn test_missing_name_is_not_found() {
        let config = Config::new();
        let err = config.get_str("missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(config.get_int("missing").unwrap_err().is_not_found());
        assert!(config.get_bool("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_get_int_signs() {
        let mut config = Config::new();
        config.load_str("neg=-42\npos=+7\nspace=1 2").unwrap();

        assert_eq!(config.get_int("neg").unwrap(), -42);
        assert_eq!(config.get_int("pos").unwrap(), 7);
        assert!(matches!(
            config.get_int("space"),
            Err(ConfigError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_get_bool_literals() {
        let mut config = Config::new();
        config
            .load_str("a=TRUE\nb=f\nc=1\nd=False\ne=yes")
            .unwrap();

        assert!(config.get_bool("a").unwrap());
        assert!(!config.get_bool("b").unwrap());
        assert!(config.get_bool("c").unwrap());
        assert!(!config.get_bool("d").unwrap());
        assert!(matches!(
            config.get_bool("e"),
            Err(ConfigError::InvalidBool { .. })
        ));
    }

    #[test]
    fn test_custom_separator() {
        let mut config = Config::with_separator(':');
        config.load_str("host: localhost\nurl=ignored").unwrap();

        assert_eq!(config.separator(), ':');
        assert_eq!(config.get_str("host").unwrap(), "localhost");
        assert!(!config.contains("url"));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# generated").unwrap();
        writeln!(file, "name = piyo").unwrap();
        write!(file, "age = 28").unwrap();

        let mut config = Config::new();
        config.load_file(file.path()).unwrap();

        assert_eq!(config.get_str("name").unwrap(), "piyo");
        assert_eq!(config.get_int("age").unwrap(), 28);
    }

    #[test]
    fn test_load_file_missing() {
        let mut config = Config::new();
        let result = config.load_file("/nonexistent/path/app.conf");

        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_optional_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key=value").unwrap();

        let mut config = Config::new();
        assert!(config.load_optional_file(file.path()).unwrap());
        assert!(!config.load_optional_file("/nonexistent/path/app.conf").unwrap());
        assert_eq!(config.get_str("key").unwrap(), "value");
    }

    /// Yields its data once, then fails.
    struct FailingReader {
        data: &'static [u8],
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::other("disk on fire"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_error_keeps_partial_load() {
        let reader = io::BufReader::new(FailingReader {
            data: b"first=1\nsecond=2\nthird",
        });

        let mut config = Config::new();
        let result = config.load_reader(reader);

        assert!(matches!(result, Err(ConfigError::Io(_))));
        assert_eq!(config.get_int("first").unwrap(), 1);
        assert_eq!(config.get_int("second").unwrap(), 2);
        assert!(!config.contains("third"));
    }
}
