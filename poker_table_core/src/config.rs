use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BET_LIMIT: u32 = 50;
pub const DEFAULT_INITIAL_STACK: u32 = 500;
pub const DEFAULT_SMALL_BLIND: u32 = 5;

/// 牌桌参数，所有下注计算都会读取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub bet_limit: u32,     // 单次下注/加注的增量上限
    pub initial_stack: u32, // 入座（以及重置）时的初始筹码
    pub small_blind: u32,   // 小盲注，大盲注 = 2 * 小盲
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            bet_limit: DEFAULT_BET_LIMIT,
            initial_stack: DEFAULT_INITIAL_STACK,
            small_blind: DEFAULT_SMALL_BLIND,
        }
    }
}

impl TableConfig {
    /// 创建一份经过校验的配置，任何一项为 0 都会被拒绝
    pub fn new(bet_limit: u32, initial_stack: u32, small_blind: u32) -> Result<Self> {
        if bet_limit == 0 || initial_stack == 0 || small_blind == 0 {
            return Err(TableError::InvalidConfig);
        }
        Ok(Self { bet_limit, initial_stack, small_blind })
    }

    /// 从客户端传来的原始数值构造配置。
    /// 非有限值或 <= 0 的值会被拒绝，小数部分向下取整。
    pub fn from_raw(bet_limit: f64, initial_stack: f64, small_blind: f64) -> Result<Self> {
        let floor = |v: f64| -> Result<u32> {
            if !v.is_finite() || v <= 0.0 || v >= u32::MAX as f64 {
                return Err(TableError::InvalidConfig);
            }
            Ok(v.floor() as u32)
        };
        Self::new(floor(bet_limit)?, floor(initial_stack)?, floor(small_blind)?)
    }

    pub fn big_blind(&self) -> u32 {
        self.small_blind.saturating_mul(2)
    }
}
