//! Constants for epubcheck-rs.
//!
//! Flag tokens understood by the external validator, environment variable
//! names, and default paths.

use std::path::PathBuf;
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants: Validator Flags
//--------------------------------------------------------------------------------------------------

/// Suppresses console chatter; diagnostics only go to the requested output.
pub const QUIET_FLAG: &str = "-q";

/// Lets the validator overwrite an existing output file.
pub const FORCE_FLAG: &str = "-f";

/// Selects the validation profile.
pub const PROFILE_FLAG: &str = "--profile";

/// Output target meaning "write to standard output".
pub const STDOUT_SENTINEL: &str = "-";

/// Flag for the assessment XML document.
pub const XML_OUTPUT_FLAG: &str = "--out";

/// Flag for the assessment XMP document.
pub const XMP_OUTPUT_FLAG: &str = "--xmp";

/// Flag for the assessment JSON document.
pub const JSON_OUTPUT_FLAG: &str = "--json";

//--------------------------------------------------------------------------------------------------
// Constants: Environment
//--------------------------------------------------------------------------------------------------

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "EPUBCHECK_CONFIG";

/// Environment variable for the Java launcher.
pub const JAVA_ENV: &str = "EPUBCHECK_JAVA";

/// Environment variable for the EPUBCheck jar.
pub const JAR_ENV: &str = "EPUBCHECK_JAR";

/// Environment variable for a directly executable validator (wins over the jar).
pub const BIN_ENV: &str = "EPUBCHECK_BIN";

/// Environment variable for the per-call timeout, in seconds.
pub const TIMEOUT_ENV: &str = "EPUBCHECK_TIMEOUT";

/// Java launcher used when nothing else is configured.
pub const DEFAULT_JAVA: &str = "java";

/// Config file name inside the home directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Read buffer size for streaming drains.
pub const STREAM_CHUNK_SIZE: usize = 8 * 1024;

//--------------------------------------------------------------------------------------------------
// Constants: Paths
//--------------------------------------------------------------------------------------------------

/// Default home directory for epubcheck-rs configuration.
pub static DEFAULT_HOME_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .map(|h| h.join(".epubcheck"))
        .unwrap_or_else(|| PathBuf::from(".epubcheck"))
});

/// Default location of the EPUBCheck jar.
pub static DEFAULT_JAR_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| DEFAULT_HOME_PATH.join("epubcheck.jar"));

/// Default config file.
pub static DEFAULT_CONFIG_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| DEFAULT_HOME_PATH.join(CONFIG_FILE_NAME));

/// Default directory for scratch output files.
pub static DEFAULT_SCRATCH_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| std::env::temp_dir().join("epubcheck"));
