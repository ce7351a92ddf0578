//! 命令行配置
//!
//! 启动时解析一次，之后以只读的 [`Config`] 传递给各子系统。

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// 日志级别选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// 只记录错误
    Error,
    /// 警告及以上
    Warn,
    /// 信息及以上
    Info,
    /// 调试及以上
    Debug,
    /// 全部
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "socfs",
    version,
    about = "Expose the registers of a SoC as files",
    override_usage = "socfs [OPTIONS] --soc_file <PATH> <MOUNTPOINT>"
)]
struct Args {
    /// Directory to mount the filesystem on
    mountpoint: PathBuf,

    /// Name of the "soc" descriptor file
    #[arg(long = "soc_file", visible_alias = "soc-file", value_name = "PATH")]
    soc_file: PathBuf,

    /// Physical memory device
    #[arg(long, value_name = "PATH", default_value = "/dev/mem")]
    mem: PathBuf,

    /// Refuse descriptors with duplicate group or register names
    #[arg(long)]
    strict: bool,

    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,

    /// Unmount automatically when the process exits
    #[arg(long)]
    auto_unmount: bool,

    /// Log verbosity
    #[arg(long, value_enum, value_name = "LEVEL", default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

/// 运行配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 挂载点
    pub mountpoint: PathBuf,
    /// SoC 描述文件
    pub soc_file: PathBuf,
    /// 物理内存设备
    pub mem: PathBuf,
    /// 描述文件存在重名时拒绝启动
    pub strict: bool,
    /// FUSE `allow_other`
    pub allow_other: bool,
    /// FUSE `auto_unmount`
    pub auto_unmount: bool,
    /// 日志级别
    pub log_level: LevelFilter,
}

impl Config {
    /// 从进程参数解析
    pub fn try_from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(std::env::args_os())
    }

    /// 从给定参数解析（第一个元素为程序名）
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Args::try_parse_from(args).map(Self::from)
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            mountpoint: args.mountpoint,
            soc_file: args.soc_file,
            mem: args.mem,
            strict: args.strict,
            allow_other: args.allow_other,
            auto_unmount: args.auto_unmount,
            log_level: args.log_level.into(),
        }
    }
}
