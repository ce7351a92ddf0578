//! inode 编号表
//!
//! 内核按 inode 编号调用 FUSE 操作，而 [`FileSystem`] 以路径为键。命名空间在挂载期间
//! 不会变化，所以启动时遍历一次即可得到完整的双向映射。

use std::collections::HashMap;

use fuser::FUSE_ROOT_ID;
use vfs::{FileSystem, FsError, InodeType, join_path};

/// 表中的一个节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeEntry {
    /// 绝对路径
    pub path: String,
    /// 父目录 inode（根的父目录是根自身）
    pub parent: u64,
    /// 节点类型
    pub kind: InodeType,
}

/// inode 编号与路径的双向映射
#[derive(Debug)]
pub struct InodeTable {
    entries: Vec<InodeEntry>,
    by_path: HashMap<String, u64>,
}

impl InodeTable {
    /// 遍历文件系统建表
    ///
    /// 根为 [`FUSE_ROOT_ID`]，其余节点按 `readdir` 返回顺序连续编号。
    /// 重复的路径只保留第一次出现的编号。
    pub fn build(fs: &dyn FileSystem) -> Result<Self, FsError> {
        let mut table = Self {
            entries: Vec::new(),
            by_path: HashMap::new(),
        };
        let root = table.insert("/".to_string(), FUSE_ROOT_ID, InodeType::Directory);

        let mut pending = vec![(root, "/".to_string())];
        while let Some((dir_ino, dir_path)) = pending.pop() {
            let mut subdirs = Vec::new();
            for entry in fs.readdir(&dir_path)? {
                if entry.name == "." || entry.name == ".." {
                    continue;
                }
                let path = join_path(&dir_path, &entry.name);
                if table.by_path.contains_key(&path) {
                    continue;
                }
                let ino = table.insert(path.clone(), dir_ino, entry.inode_type);
                if entry.inode_type == InodeType::Directory {
                    subdirs.push((ino, path));
                }
            }
            // 逆序入栈，使子目录按声明顺序展开
            pending.extend(subdirs.into_iter().rev());
        }

        log::debug!("inode table: {} entries", table.entries.len());
        Ok(table)
    }

    fn insert(&mut self, path: String, parent: u64, kind: InodeType) -> u64 {
        let ino = FUSE_ROOT_ID + self.entries.len() as u64;
        self.by_path.insert(path.clone(), ino);
        self.entries.push(InodeEntry { path, parent, kind });
        ino
    }

    /// 按编号查找
    pub fn get(&self, ino: u64) -> Option<&InodeEntry> {
        let index = ino.checked_sub(FUSE_ROOT_ID)?;
        self.entries.get(usize::try_from(index).ok()?)
    }

    /// 按路径查找编号
    pub fn ino_of(&self, path: &str) -> Option<u64> {
        self.by_path.get(path).copied()
    }

    /// 在目录 `parent` 下按名字查找
    pub fn lookup(&self, parent: u64, name: &str) -> Option<u64> {
        let dir = self.get(parent)?;
        self.ino_of(&join_path(&dir.path, name))
    }

    /// 节点总数（含根）
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
