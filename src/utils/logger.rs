use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

/// Map `error|warn|info|debug|trace` to a filter; anything else is `info`.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn rolling(
    base: &Path,
    name: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{name}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{name}.log")), Box::new(policy))?)
}

/// Build the log4rs configuration.
/// - `dir`: base directory for `app.log`, `metrics.log` (and `dev6.log`); `None` logs to stderr.
/// - `level`: error|warn|info|debug|trace
/// - `retention`: number of rolled files to keep (default 7)
///
/// # Errors
/// Returns an error if the directory or an appender cannot be created.
pub fn build_config(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    enable_dev6: bool,
) -> Result<Config, Box<dyn std::error::Error>> {
    let lvl = parse_level(level);
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(u32::MAX);
    let Some(base) = dir else {
        let console = ConsoleAppender::builder()
            .target(log4rs::append::console::Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();
        return Ok(Config::builder()
            .appender(Appender::builder().build("console", Box::new(console)))
            .logger(Logger::builder().additive(false).build("rowbridge::dev6", LevelFilter::Off))
            .build(Root::builder().appender("console").build(lvl))?);
    };
    std::fs::create_dir_all(base)?;
    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(base, "app", keep)?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(base, "metrics", keep)?)))
        .logger(Logger::builder().appender("metrics").additive(false).build("rowbridge::metrics", lvl));
    builder = if enable_dev6 {
        builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(base, "dev6", keep)?)))
            .logger(
                Logger::builder().appender("dev6").additive(false).build("rowbridge::dev6", LevelFilter::Trace),
            )
    } else {
        builder.logger(Logger::builder().additive(false).build("rowbridge::dev6", LevelFilter::Off))
    };
    Ok(builder.build(Root::builder().appender("app").build(lvl))?)
}

/// Configure logging globally for the process. A second call in the same process is
/// ignored by log4rs and reported as an error.
///
/// # Errors
/// Returns an error if the configuration cannot be built or installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    configure_logging_with_dev(dir, level, retention, false)
}

/// # Errors
/// Returns an error if the configuration cannot be built or installed.
pub fn configure_logging_with_dev(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    enable_dev6: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(dir, level, retention, enable_dev6)?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - `ROWBRIDGE_LOG_DIR`
/// - `ROWBRIDGE_LOG_LEVEL`
/// - `ROWBRIDGE_LOG_RETENTION`
/// - `ROWBRIDGE_DEV6`
///
/// # Errors
/// Returns an error if the configuration cannot be built or installed.
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::var("ROWBRIDGE_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("ROWBRIDGE_LOG_LEVEL").ok();
    let retention =
        std::env::var("ROWBRIDGE_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    let dev6_enabled = std::env::var("ROWBRIDGE_DEV6")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging_with_dev(dir.as_deref(), level.as_deref(), retention, dev6_enabled)
}
