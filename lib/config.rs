//! Validator configuration.
//!
//! A [`CheckerConfig`] says where the external validator lives and how each
//! call runs. Values are layered: built-in defaults, then an optional TOML
//! file, then environment overrides.

use crate::constants::{
    BIN_ENV, CONFIG_ENV, DEFAULT_CONFIG_PATH, DEFAULT_JAR_PATH, DEFAULT_JAVA,
    DEFAULT_SCRATCH_PATH, JAR_ENV, JAVA_ENV, TIMEOUT_ENV,
};
use crate::error::{EpubCheckError, EpubCheckResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Entry point of the external validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorCommand {
    /// Program to launch.
    pub program: PathBuf,
    /// Arguments placed before the validator's own arguments.
    pub leading_args: Vec<OsString>,
}

/// Where the validator writes its report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputDestination {
    /// A uniquely named scratch file, read once and deleted.
    #[default]
    TempFile,
    /// The validator's standard output.
    Stdout,
}

/// How a non-zero validator exit interacts with decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitPolicy {
    /// Decode whatever the validator produced; fail only if it produced nothing.
    #[default]
    Lenient,
    /// Any non-zero exit fails the call.
    Strict,
}

/// Configuration shared by validation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Validator entry point.
    pub command: ValidatorCommand,
    /// Directory for scratch output files.
    pub scratch_dir: PathBuf,
    /// Where reports are written.
    pub destination: OutputDestination,
    /// Non-zero exit handling.
    pub exit_policy: ExitPolicy,
    /// Kill the validator after this long.
    pub timeout: Option<Duration>,
}

/// On-disk representation of [`CheckerConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ConfigFile {
    /// Java launcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java: Option<PathBuf>,

    /// EPUBCheck jar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar: Option<PathBuf>,

    /// Direct command line, e.g. `["epubcheck"]`. Wins over `java`/`jar`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<OutputDestination>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_policy: Option<ExitPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ValidatorCommand {
    /// Run the validator jar through a Java launcher.
    pub fn java(java: impl Into<PathBuf>, jar: impl AsRef<Path>) -> Self {
        Self {
            program: java.into(),
            leading_args: vec!["-jar".into(), jar.as_ref().as_os_str().to_owned()],
        }
    }

    /// Run a directly executable validator.
    pub fn executable(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Add arguments placed before the validator's own.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Jar run by a `java -jar <jar>` command.
    pub fn jar(&self) -> Option<&Path> {
        match self.leading_args.as_slice() {
            [flag, jar] if flag == "-jar" => Some(Path::new(jar)),
            _ => None,
        }
    }

    /// Replace the launcher, the jar, or both.
    ///
    /// The part not given is kept from a current `java -jar` command and
    /// falls back to the default otherwise.
    pub fn override_java(&self, java: Option<PathBuf>, jar: Option<PathBuf>) -> Self {
        let current_jar = self.jar().map(Path::to_path_buf);
        let java = java.unwrap_or_else(|| match current_jar {
            Some(_) => self.program.clone(),
            None => PathBuf::from(DEFAULT_JAVA),
        });
        let jar = jar
            .or(current_jar)
            .unwrap_or_else(|| DEFAULT_JAR_PATH.clone());
        Self::java(java, jar)
    }

    /// Parse a command line given as a list of words.
    pub fn from_words(words: &[String]) -> EpubCheckResult<Self> {
        let (program, rest) = words
            .split_first()
            .ok_or_else(|| EpubCheckError::Config("validator command is empty".into()))?;
        Ok(Self::executable(program).with_leading_args(rest))
    }
}

impl Default for ValidatorCommand {
    fn default() -> Self {
        Self::java(DEFAULT_JAVA, DEFAULT_JAR_PATH.as_path())
    }
}

impl CheckerConfig {
    /// Create a configuration for the given validator entry point.
    pub fn new(command: ValidatorCommand) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    /// Load defaults, the config file (if any) and environment overrides.
    pub fn load() -> EpubCheckResult<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.clone());

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else if let Some(path) = explicit {
            return Err(EpubCheckError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        } else {
            Self::default()
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load a TOML config file on top of the defaults.
    pub fn from_file(path: &Path) -> EpubCheckResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML config content on top of the defaults.
    pub fn from_toml(content: &str) -> EpubCheckResult<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.merge(file)?;
        Ok(config)
    }

    /// Apply the values present in `file`.
    pub fn merge(&mut self, file: ConfigFile) -> EpubCheckResult<()> {
        if let Some(words) = file.command {
            self.command = ValidatorCommand::from_words(&words)?;
        } else if file.java.is_some() || file.jar.is_some() {
            self.command = self.command.override_java(file.java, file.jar);
        }

        if let Some(dir) = file.scratch_dir {
            self.scratch_dir = dir;
        }
        if let Some(destination) = file.destination {
            self.destination = destination;
        }
        if let Some(policy) = file.exit_policy {
            self.exit_policy = policy;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs);
        }

        Ok(())
    }

    /// Apply `EPUBCHECK_*` environment overrides.
    pub fn apply_env(&mut self) -> EpubCheckResult<()> {
        self.apply_vars(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> EpubCheckResult<()> {
        if let Some(bin) = var(BIN_ENV) {
            self.command = ValidatorCommand::executable(bin);
        } else {
            let java = var(JAVA_ENV).map(PathBuf::from);
            let jar = var(JAR_ENV).map(PathBuf::from);
            if java.is_some() || jar.is_some() {
                self.command = self.command.override_java(java, jar);
            }
        }

        if let Some(raw) = var(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                EpubCheckError::Config(format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, raw))
            })?;
            self.timeout = timeout_from_secs(secs);
        }

        Ok(())
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            command: ValidatorCommand::default(),
            scratch_dir: DEFAULT_SCRATCH_PATH.clone(),
            destination: OutputDestination::default(),
            exit_policy: ExitPolicy::default(),
            timeout: None,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Zero means "no timeout".
pub(crate) fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_runs_jar_through_java() {
        let config = CheckerConfig::default();
        assert_eq!(config.command.program, PathBuf::from("java"));
        assert_eq!(config.command.leading_args[0], OsString::from("-jar"));
        assert_eq!(config.destination, OutputDestination::TempFile);
        assert_eq!(config.exit_policy, ExitPolicy::Lenient);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_from_toml_java_and_jar() {
        let config = CheckerConfig::from_toml(
            r#"
            java = "/usr/lib/jvm/bin/java"
            jar = "/opt/epubcheck/epubcheck.jar"
            destination = "stdout"
            exit_policy = "strict"
            timeout_secs = 90
            "#,
        )
        .unwrap();

        assert_eq!(
            config.command,
            ValidatorCommand::java("/usr/lib/jvm/bin/java", "/opt/epubcheck/epubcheck.jar")
        );
        assert_eq!(config.destination, OutputDestination::Stdout);
        assert_eq!(config.exit_policy, ExitPolicy::Strict);
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_from_toml_command_wins() {
        let config = CheckerConfig::from_toml(
            r#"
            jar = "/ignored.jar"
            command = ["epubcheck", "--locale", "en"]
            scratch_dir = "/var/tmp/checks"
            "#,
        )
        .unwrap();

        assert_eq!(config.command.program, PathBuf::from("epubcheck"));
        assert_eq!(
            config.command.leading_args,
            vec![OsString::from("--locale"), OsString::from("en")]
        );
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/checks"));
    }

    #[test]
    fn test_from_toml_rejects_empty_command() {
        let err = CheckerConfig::from_toml("command = []").unwrap_err();
        assert!(matches!(err, EpubCheckError::Config(_)));
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = CheckerConfig::from_toml("jvm = \"java\"").unwrap_err();
        assert!(matches!(err, EpubCheckError::ConfigParse(_)));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = CheckerConfig::from_toml("timeout_secs = 0").unwrap();
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_env_bin_overrides_command() {
        let mut config = CheckerConfig::default();
        config
            .apply_vars(vars(&[(BIN_ENV, "/usr/local/bin/epubcheck"), (TIMEOUT_ENV, "30")]))
            .unwrap();

        assert_eq!(
            config.command,
            ValidatorCommand::executable("/usr/local/bin/epubcheck")
        );
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_env_jar_keeps_default_java() {
        let mut config = CheckerConfig::default();
        config.apply_vars(vars(&[(JAR_ENV, "/opt/e.jar")])).unwrap();
        assert_eq!(config.command, ValidatorCommand::java("java", "/opt/e.jar"));
    }

    #[test]
    fn test_env_java_keeps_file_jar() {
        let mut config = CheckerConfig::from_toml("jar = \"/opt/custom/epubcheck.jar\"").unwrap();
        config
            .apply_vars(vars(&[(JAVA_ENV, "/usr/lib/jvm/17/bin/java")]))
            .unwrap();

        assert_eq!(
            config.command,
            ValidatorCommand::java("/usr/lib/jvm/17/bin/java", "/opt/custom/epubcheck.jar")
        );
    }

    #[test]
    fn test_env_jar_keeps_file_java() {
        let mut config = CheckerConfig::from_toml("java = \"/usr/lib/jvm/17/bin/java\"").unwrap();
        config.apply_vars(vars(&[(JAR_ENV, "/opt/e.jar")])).unwrap();

        assert_eq!(
            config.command,
            ValidatorCommand::java("/usr/lib/jvm/17/bin/java", "/opt/e.jar")
        );
    }

    #[test]
    fn test_override_java_on_direct_executable() {
        let command = ValidatorCommand::executable("/usr/local/bin/epubcheck");
        assert!(command.jar().is_none());

        let command = command.override_java(None, Some(PathBuf::from("/opt/e.jar")));
        assert_eq!(command, ValidatorCommand::java(DEFAULT_JAVA, "/opt/e.jar"));
        assert_eq!(command.jar(), Some(Path::new("/opt/e.jar")));
    }

    #[test]
    fn test_env_bad_timeout() {
        let mut config = CheckerConfig::default();
        let err = config
            .apply_vars(vars(&[(TIMEOUT_ENV, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(TIMEOUT_ENV));
    }
}
