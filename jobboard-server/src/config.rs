//! Server configuration and CLI argument parsing
//!
//! Every setting can come from a command-line flag or a `JOBBOARD_`-prefixed
//! environment variable.
//!
//! # Configuration Priority
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Default values (lowest priority)
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! jobboard --http-port 9000 --store memory --jwt-secret "$(openssl rand -hex 32)"
//!
//! # Using environment variables
//! export JOBBOARD_REDIS_URL=redis://cache:6379
//! export JOBBOARD_LIMIT_SIGN_IN=10/60
//! jobboard
//! ```

use crate::admission::{FailurePolicy, LimitedEndpoint};
use anyhow::{Result, anyhow};
use clap::Parser;
use jobboard::WindowLimit;
use std::time::Duration;

/// Shortest accepted token signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 16;

/// Main configuration structure for the server
#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub store: StoreConfig,
    /// What admission does when the limiter store fails
    pub failure_policy: FailurePolicy,
    pub limits: EndpointLimits,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    /// Account seeded at startup, if configured
    pub admin: Option<AdminConfig>,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

/// Shared key-value store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub store_type: StoreType,
    /// Connection URL, used by the Redis store only
    pub redis_url: String,
    /// Initial capacity, used by the in-process store only
    pub capacity: usize,
    /// Expired key sweep interval, used by the in-process store only
    pub cleanup_interval: Duration,
}

/// Available key-value store backends
///
/// - **Redis**: shared between every server process, required when running
///   more than one replica
/// - **Memory**: in-process, for single-process deployments and development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Redis,
    Memory,
}

impl std::str::FromStr for StoreType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(StoreType::Redis),
            "memory" => Ok(StoreType::Memory),
            _ => Err(anyhow!(
                "Invalid store type: {}. Valid options are: redis, memory",
                s
            )),
        }
    }
}

/// Per-endpoint sliding-window limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointLimits {
    pub sign_in: WindowLimit,
    pub edit_password: WindowLimit,
    pub delete_user: WindowLimit,
    pub search_resumes: WindowLimit,
    pub search_vacancies: WindowLimit,
    pub apply_to_vacancy: WindowLimit,
    pub set_status: WindowLimit,
}

impl EndpointLimits {
    pub fn get(&self, endpoint: LimitedEndpoint) -> WindowLimit {
        match endpoint {
            LimitedEndpoint::SignIn => self.sign_in,
            LimitedEndpoint::EditPassword => self.edit_password,
            LimitedEndpoint::DeleteUser => self.delete_user,
            LimitedEndpoint::SearchResumes => self.search_resumes,
            LimitedEndpoint::SearchVacancies => self.search_vacancies,
            LimitedEndpoint::ApplyToVacancy => self.apply_to_vacancy,
            LimitedEndpoint::SetStatus => self.set_status,
        }
    }

    /// The same limit on every endpoint
    pub fn uniform(limit: WindowLimit) -> Self {
        Self {
            sign_in: limit,
            edit_password: limit,
            delete_user: limit,
            search_resumes: limit,
            search_vacancies: limit,
            apply_to_vacancy: limit,
            set_status: limit,
        }
    }
}

impl Default for EndpointLimits {
    fn default() -> Self {
        Self::uniform(WindowLimit::default())
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL of version-tagged search entries
    pub search_ttl: Duration,
    /// TTL of direct-key profile entries
    pub profile_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// bcrypt cost factor
    pub password_cost: u32,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Parse `<max_requests>/<window_seconds>`, e.g. `5/60`
pub fn parse_window_limit(s: &str) -> std::result::Result<WindowLimit, String> {
    let (max, window) = s
        .split_once('/')
        .ok_or_else(|| format!("expected <max_requests>/<window_seconds>, got {s:?}"))?;
    let max_requests: u32 = max
        .trim()
        .parse()
        .map_err(|_| format!("invalid max_requests in {s:?}"))?;
    let window_seconds: u64 = window
        .trim()
        .parse()
        .map_err(|_| format!("invalid window_seconds in {s:?}"))?;
    if max_requests == 0 || window_seconds == 0 {
        return Err(format!("limit {s:?} must be non-zero on both sides"));
    }
    Ok(WindowLimit::new(max_requests, window_seconds))
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// JOBBOARD_ prefix. CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "jobboard",
    about = "Job-board backend with shared-store rate limiting",
    long_about = "Job-board HTTP backend. Rate limits and caches live in a shared key-value store (Redis by default).\n\nEnvironment variables with JOBBOARD_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    // HTTP
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host",
        default_value = "127.0.0.1",
        env = "JOBBOARD_HTTP_HOST"
    )]
    pub http_host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port",
        default_value_t = 8000,
        env = "JOBBOARD_HTTP_PORT"
    )]
    pub http_port: u16,

    // Store
    #[arg(
        long,
        value_name = "TYPE",
        help = "Key-value store: redis, memory",
        default_value = "redis",
        env = "JOBBOARD_STORE"
    )]
    pub store: StoreType,
    #[arg(
        long,
        value_name = "URL",
        help = "Redis connection URL",
        default_value = "redis://127.0.0.1:6379",
        env = "JOBBOARD_REDIS_URL"
    )]
    pub redis_url: String,
    #[arg(
        long,
        value_name = "SIZE",
        help = "Initial capacity of the in-process store",
        default_value_t = 10_000,
        env = "JOBBOARD_STORE_CAPACITY"
    )]
    pub store_capacity: usize,
    #[arg(
        long,
        value_name = "SECS",
        help = "Expired key sweep interval of the in-process store (seconds)",
        default_value_t = 60,
        env = "JOBBOARD_STORE_CLEANUP_INTERVAL"
    )]
    pub store_cleanup_interval: u64,

    // Admission
    #[arg(
        long,
        value_name = "POLICY",
        help = "Behaviour when the limiter store fails: closed (503), open (admit)",
        default_value = "closed",
        env = "JOBBOARD_LIMITER_FAILURE_POLICY"
    )]
    pub limiter_failure_policy: FailurePolicy,
    #[arg(long, value_name = "MAX/SECS", default_value = "5/60", value_parser = parse_window_limit, env = "JOBBOARD_LIMIT_SIGN_IN")]
    pub limit_sign_in: WindowLimit,
    #[arg(long, value_name = "MAX/SECS", default_value = "5/60", value_parser = parse_window_limit, env = "JOBBOARD_LIMIT_EDIT_PASSWORD")]
    pub limit_edit_password: WindowLimit,
    #[arg(long, value_name = "MAX/SECS", default_value = "5/60", value_parser = parse_window_limit, env = "JOBBOARD_LIMIT_DELETE_USER")]
    pub limit_delete_user: WindowLimit,
    #[arg(long, value_name = "MAX/SECS", default_value = "5/60", value_parser = parse_window_limit, env = "JOBBOARD_LIMIT_SEARCH_RESUMES")]
    pub limit_search_resumes: WindowLimit,
    #[arg(long, value_name = "MAX/SECS", default_value = "5/60", value_parser = parse_window_limit, env = "JOBBOARD_LIMIT_SEARCH_VACANCIES")]
    pub limit_search_vacancies: WindowLimit,
    #[arg(long, value_name = "MAX/SECS", default_value = "5/60", value_parser = parse_window_limit, env = "JOBBOARD_LIMIT_APPLY_TO_VACANCY")]
    pub limit_apply_to_vacancy: WindowLimit,
    #[arg(long, value_name = "MAX/SECS", default_value = "5/60", value_parser = parse_window_limit, env = "JOBBOARD_LIMIT_SET_STATUS")]
    pub limit_set_status: WindowLimit,

    // Cache
    #[arg(
        long,
        value_name = "SECS",
        help = "TTL of cached search results (seconds)",
        default_value_t = 300,
        env = "JOBBOARD_SEARCH_CACHE_TTL"
    )]
    pub search_cache_ttl: u64,
    #[arg(
        long,
        value_name = "SECS",
        help = "TTL of cached user profiles (seconds)",
        default_value_t = 3600,
        env = "JOBBOARD_PROFILE_CACHE_TTL"
    )]
    pub profile_cache_ttl: u64,

    // Auth
    #[arg(
        long,
        value_name = "SECRET",
        help = "HS256 token signing secret",
        env = "JOBBOARD_JWT_SECRET",
        hide_env_values = true
    )]
    pub jwt_secret: Option<String>,
    #[arg(
        long,
        value_name = "SECS",
        help = "Access token lifetime (seconds)",
        default_value_t = 3600,
        env = "JOBBOARD_TOKEN_TTL"
    )]
    pub token_ttl: u64,
    #[arg(
        long,
        value_name = "COST",
        help = "bcrypt cost factor (4-31)",
        default_value_t = bcrypt::DEFAULT_COST,
        env = "JOBBOARD_PASSWORD_COST"
    )]
    pub password_cost: u32,

    // Bootstrap admin
    #[arg(long, value_name = "EMAIL", env = "JOBBOARD_ADMIN_EMAIL")]
    pub admin_email: Option<String>,
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "JOBBOARD_ADMIN_PASSWORD",
        hide_env_values = true
    )]
    pub admin_password: Option<String>,
    #[arg(
        long,
        value_name = "NAME",
        default_value = "admin",
        env = "JOBBOARD_ADMIN_NAME"
    )]
    pub admin_name: String,

    // General options
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "JOBBOARD_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the token secret is missing or too short, if only
    /// one of admin email and password is given, or if a TTL is zero.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        Self::from_args(args)
    }

    /// Build and validate configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let admin = match (args.admin_email, args.admin_password) {
            (Some(email), Some(password)) => Some(AdminConfig {
                email,
                password,
                name: args.admin_name,
            }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "--admin-email and --admin-password must be given together"
                ));
            }
        };

        let config = Config {
            http: HttpConfig {
                host: args.http_host,
                port: args.http_port,
            },
            store: StoreConfig {
                store_type: args.store,
                redis_url: args.redis_url,
                capacity: args.store_capacity,
                cleanup_interval: Duration::from_secs(args.store_cleanup_interval),
            },
            failure_policy: args.limiter_failure_policy,
            limits: EndpointLimits {
                sign_in: args.limit_sign_in,
                edit_password: args.limit_edit_password,
                delete_user: args.limit_delete_user,
                search_resumes: args.limit_search_resumes,
                search_vacancies: args.limit_search_vacancies,
                apply_to_vacancy: args.limit_apply_to_vacancy,
                set_status: args.limit_set_status,
            },
            cache: CacheConfig {
                search_ttl: Duration::from_secs(args.search_cache_ttl),
                profile_ttl: Duration::from_secs(args.profile_cache_ttl),
            },
            auth: AuthConfig {
                jwt_secret: args.jwt_secret.unwrap_or_default(),
                token_ttl: Duration::from_secs(args.token_ttl),
                password_cost: args.password_cost,
            },
            admin,
            log_level: args.log_level,
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow!(
                "A token signing secret of at least {} bytes is required.\n\n\
                Set it with:\n  \
                --jwt-secret <SECRET>\n  \
                JOBBOARD_JWT_SECRET=<SECRET>\n\n\
                For more information, try '--help'",
                MIN_JWT_SECRET_LEN
            ));
        }

        if self.cache.search_ttl.is_zero() || self.cache.profile_ttl.is_zero() {
            return Err(anyhow!("Cache TTLs must be at least one second"));
        }

        if self.auth.token_ttl.is_zero() {
            return Err(anyhow!("Token TTL must be at least one second"));
        }

        if !(4..=31).contains(&self.auth.password_cost) {
            return Err(anyhow!(
                "Invalid password cost: {}. bcrypt accepts 4 to 31",
                self.auth.password_cost
            ));
        }

        if let Some(admin) = &self.admin {
            if admin.email.is_empty() || admin.password.is_empty() {
                return Err(anyhow!("Bootstrap admin email and password must not be empty"));
            }
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("Jobboard Environment Variables");
        println!("==============================");
        println!();
        println!("All environment variables use the JOBBOARD_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("HTTP Configuration:");
        println!("  JOBBOARD_HTTP_HOST=<host>              HTTP host [default: 127.0.0.1]");
        println!("  JOBBOARD_HTTP_PORT=<port>              HTTP port [default: 8000]");
        println!();

        println!("Store Configuration:");
        println!("  JOBBOARD_STORE=<type>                  Store type: redis, memory [default: redis]");
        println!(
            "  JOBBOARD_REDIS_URL=<url>               Redis URL [default: redis://127.0.0.1:6379]"
        );
        println!();
        println!("  For memory store:");
        println!("    JOBBOARD_STORE_CAPACITY=<size>       Initial capacity [default: 10000]");
        println!(
            "    JOBBOARD_STORE_CLEANUP_INTERVAL=<secs>   Expired key sweep interval [default: 60]"
        );
        println!();

        println!("Admission Configuration:");
        println!(
            "  JOBBOARD_LIMITER_FAILURE_POLICY=<p>    On store failure: closed, open [default: closed]"
        );
        for endpoint in LimitedEndpoint::ALL {
            println!(
                "  {:<38} {} [default: 5/60]",
                format!("{}=<max/secs>", endpoint.env_var()),
                endpoint.key()
            );
        }
        println!();

        println!("Cache Configuration:");
        println!("  JOBBOARD_SEARCH_CACHE_TTL=<secs>       Search result TTL [default: 300]");
        println!("  JOBBOARD_PROFILE_CACHE_TTL=<secs>      Profile TTL [default: 3600]");
        println!();

        println!("Auth Configuration:");
        println!("  JOBBOARD_JWT_SECRET=<secret>           Token signing secret (required)");
        println!("  JOBBOARD_TOKEN_TTL=<secs>              Token lifetime [default: 3600]");
        println!("  JOBBOARD_PASSWORD_COST=<cost>          bcrypt cost factor [default: 12]");
        println!("  JOBBOARD_ADMIN_EMAIL=<email>           Bootstrap admin email");
        println!("  JOBBOARD_ADMIN_PASSWORD=<password>     Bootstrap admin password");
        println!("  JOBBOARD_ADMIN_NAME=<name>             Bootstrap admin name [default: admin]");
        println!();

        println!("General Configuration:");
        println!(
            "  JOBBOARD_LOG_LEVEL=<level>             Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  # Single process without Redis");
        println!("  export JOBBOARD_STORE=memory");
        println!();
        println!("  # Looser login limit");
        println!("  export JOBBOARD_LIMIT_SIGN_IN=20/60");
        println!();
        println!("  # Run server (CLI args override env vars)");
        println!("  jobboard --http-port 9090");
    }
}
