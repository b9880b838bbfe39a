//! Configuration for the waymark navigation core
//!
//! - [`env`]: prefixed, validated environment variable access
//! - [`settings`]: [`NavigationSettings`], layered from defaults, TOML and
//!   the environment

pub mod env;
pub mod settings;

pub use env::{Env, EnvError};
pub use settings::{
	DEFAULT_MAX_REDIRECTS, DEFAULT_RECOVERY_KEY, NavigationSettings, RecoveryStoreKind,
	SettingsError, normalize_base,
};
