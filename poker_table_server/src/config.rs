//! 服务器配置
//!
//! 命令行参数优先，其次是环境变量，最后是默认值。

use std::net::SocketAddr;
use std::str::FromStr;

use pico_args::Arguments;
use poker_table_core::{sanitize_name, TableConfig};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 25917;
pub const DEFAULT_ADMIN_NAME: &str = "jolupa";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// 以此名字入座的玩家拥有管理员权限（大小写不敏感）
    pub admin_name: String,
    /// 牌桌创建时使用的初始配置
    pub table: TableConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置项 {var} 无效: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("命令行参数错误: {0}")]
    Args(#[from] pico_args::Error),
}

impl ServerConfig {
    pub fn from_env(args: Arguments) -> Result<Self, ConfigError> {
        Self::from_sources(args, |var| std::env::var(var).ok())
    }

    pub fn from_sources(
        mut args: Arguments,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match args.opt_value_from_str::<_, SocketAddr>("--bind")? {
            Some(addr) => addr,
            None => parse_or(&env, "TABLE_BIND", SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))?,
        };

        let raw_admin = match args.opt_value_from_str::<_, String>("--admin")? {
            Some(name) => name,
            None => env("TABLE_ADMIN").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
        };
        let admin_name = sanitize_name(&raw_admin);
        if admin_name.is_empty() {
            return Err(ConfigError::Invalid {
                var: "TABLE_ADMIN",
                reason: "管理员名字不能为空".to_string(),
            });
        }

        let defaults = TableConfig::default();
        let table = TableConfig::new(
            parse_or(&env, "TABLE_BET_LIMIT", defaults.bet_limit)?,
            parse_or(&env, "TABLE_INITIAL_STACK", defaults.initial_stack)?,
            parse_or(&env, "TABLE_SMALL_BLIND", defaults.small_blind)?,
        )
        .map_err(|e| ConfigError::Invalid {
            var: "TABLE_*",
            reason: e.to_string(),
        })?;

        Ok(Self { bind, admin_name, table })
    }
}

/// 判断某个入座名字是否是管理员（大小写不敏感）
pub fn is_admin_name(admin_name: &str, name: &str) -> bool {
    admin_name.to_lowercase() == name.to_lowercase()
}

fn parse_or<T: FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match env(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("无法解析 '{}'", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::from_sources(args(&[]), env_from(&[])).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:25917".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.admin_name, "jolupa");
        assert_eq!(cfg.table, TableConfig::default());
    }

    #[test]
    fn test_args_override_env() {
        let cfg = ServerConfig::from_sources(
            args(&["--bind", "127.0.0.1:4000", "--admin", "Boss"]),
            env_from(&[("TABLE_BIND", "127.0.0.1:5000"), ("TABLE_ADMIN", "other")]),
        )
        .unwrap();
        assert_eq!(cfg.bind, "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
        assert!(is_admin_name(&cfg.admin_name, "boss"));
        assert!(!is_admin_name(&cfg.admin_name, "other"));
    }

    #[test]
    fn test_table_from_env() {
        let cfg = ServerConfig::from_sources(
            args(&[]),
            env_from(&[("TABLE_BET_LIMIT", "100"), ("TABLE_INITIAL_STACK", "2000"), ("TABLE_SMALL_BLIND", "25")]),
        )
        .unwrap();
        assert_eq!(cfg.table, TableConfig { bet_limit: 100, initial_stack: 2000, small_blind: 25 });
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_sources(args(&[]), env_from(&[("TABLE_SMALL_BLIND", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TABLE_SMALL_BLIND", .. }));

        let err = ServerConfig::from_sources(args(&[]), env_from(&[("TABLE_BET_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TABLE_*", .. }));

        let err = ServerConfig::from_sources(args(&["--admin", "   "]), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TABLE_ADMIN", .. }));

        let err = ServerConfig::from_sources(args(&["--bind", "nope"]), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Args(_)));
    }
}
