use crate::error::{Result, TableError};
use crate::state::{Player, PlayerHandle};

pub const MAX_NAME_LEN: usize = 16;

/// 按入座顺序排列的玩家列表，入座顺序同时决定行动顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRoster {
    players: Vec<Player>,
}

/// 合并连续空白、截断到 16 个字符、再去掉尾部空白
///
/// 先合并再截断，结果的长度按合并后的名字计算，且截断后不会留下尾随空格。
pub fn sanitize_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_NAME_LEN).collect();
    capped.trim_end().to_string()
}

impl PlayerRoster {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Player> {
        self.players.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Player> {
        self.players.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn find_by_handle(&self, handle: &PlayerHandle) -> Option<usize> {
        self.players.iter().position(|p| &p.handle == handle)
    }

    /// 新玩家入座到末尾。名字会先被规范化，大小写不敏感地判重。
    pub fn join(&mut self, handle: PlayerHandle, raw_name: &str, stack: u32) -> Result<&Player> {
        if self.find_by_handle(&handle).is_some() {
            return Err(TableError::AlreadySeated);
        }

        let name = sanitize_name(raw_name);
        if name.is_empty() {
            return Err(TableError::InvalidName);
        }
        let lower = name.to_lowercase();
        if self.players.iter().any(|p| p.name.to_lowercase() == lower) {
            return Err(TableError::DuplicateName(name));
        }

        self.players.push(Player::new(handle, name, stack));
        Ok(&self.players[self.players.len() - 1])
    }

    /// 移除座位。调用方负责处理进行中的牌局（见 `Table::remove_player`）。
    pub(crate) fn remove(&mut self, idx: usize) -> Player {
        self.players.remove(idx)
    }

    pub fn count_in_hand(&self) -> usize {
        self.players.iter().filter(|p| p.in_hand).count()
    }

    /// 从 `from` 的下一个座位开始循环查找第一个仍在局中的玩家。
    ///
    /// 会检查包括 `from` 本身在内的所有座位；没有人在局中时返回 `None`。
    pub fn next_in_hand(&self, from: usize) -> Option<usize> {
        let n = self.players.len();
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|&j| self.players[j].in_hand)
    }

    pub(crate) fn reset_round_flags(&mut self) {
        for p in self.players.iter_mut() {
            p.bet_this_round = 0;
            p.has_acted = false;
        }
    }
}
