//! 路径解析
//!
//! 宿主运行时交给文件系统的总是规范化的绝对路径，因此这里的解析是严格的：
//!
//! - 路径必须以 `/` 开头
//! - `/` 本身解析为 [`PathComponent::Root`]
//! - 其余部分按 `/` 切分，任何空组件（`//`、结尾的 `/`）都使路径无效
//! - `.` 与 `..` 不做特殊处理，按普通名字对待

use alloc::string::String;
use alloc::vec::Vec;

use crate::FsError;

/// 路径组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathComponent<'a> {
    /// 根目录 "/"
    Root,
    /// 正常的文件名
    Normal(&'a str),
}

/// 将路径字符串解析为组件列表
///
/// 结果总以 [`PathComponent::Root`] 开头。
pub fn parse_path(path: &str) -> Result<Vec<PathComponent<'_>>, FsError> {
    let rest = path.strip_prefix('/').ok_or(FsError::InvalidArgument)?;

    let mut components = Vec::new();
    components.push(PathComponent::Root);

    if rest.is_empty() {
        return Ok(components);
    }

    for part in rest.split('/') {
        if part.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        components.push(PathComponent::Normal(part));
    }

    Ok(components)
}

/// 拼接目录路径与子项名
pub fn join_path(dir: &str, name: &str) -> String {
    let mut path = String::with_capacity(dir.len() + name.len() + 1);
    path.push_str(dir);
    if !dir.ends_with('/') {
        path.push('/');
    }
    path.push_str(name);
    path
}
