//! 路径解析
//!
//! 命名空间只有两层：`/<group>` 是目录，`/<group>/<register>` 是文件。
//!
//! 名字比较是精确且区分大小写的。描述文件不保证名字唯一，解析总是返回**第一个**
//! 结构上匹配的组或寄存器；后出现的同名项不可达，可用
//! [`SocDescriptor::duplicate_names`] 找出这些路径。

use vfs::{PathComponent, parse_path};

use crate::{GroupBlock, RegisterEntry, SocDescriptor};

/// 路径解析结果
///
/// 每次请求即时计算，不做缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathResolution<'a> {
    /// 根目录
    Root,
    /// 寄存器组目录
    Group(&'a GroupBlock),
    /// 寄存器文件
    Register(&'a RegisterEntry),
    /// 路径不存在或形状不合法
    NotFound,
}

impl PathResolution<'_> {
    /// 是否解析为目录（根或寄存器组）
    pub fn is_dir(&self) -> bool {
        matches!(self, PathResolution::Root | PathResolution::Group(_))
    }
}

impl SocDescriptor {
    /// 将文件系统路径解析为根、寄存器组、寄存器或不存在
    pub fn resolve(&self, path: &str) -> PathResolution<'_> {
        let Ok(components) = parse_path(path) else {
            return PathResolution::NotFound;
        };

        match components.as_slice() {
            [PathComponent::Root] => PathResolution::Root,
            [PathComponent::Root, PathComponent::Normal(group)] => self
                .find_group(group)
                .map_or(PathResolution::NotFound, PathResolution::Group),
            [
                PathComponent::Root,
                PathComponent::Normal(group),
                PathComponent::Normal(reg),
            ] => self
                .find_group(group)
                .and_then(|group| group.find_register(reg))
                .map_or(PathResolution::NotFound, PathResolution::Register),
            _ => PathResolution::NotFound,
        }
    }
}
