//! socfs - 以文件形式导出 SoC 寄存器
//!
//! 启动流程：
//!
//! 1. 解析命令行（`config`）并初始化日志（`log`）
//! 2. 加载描述文件，报告重名路径（`--strict` 下直接拒绝）
//! 3. 以 `O_SYNC` 打开物理内存设备
//! 4. 建立 inode 表并挂载（`fuse`），直到卸载才返回
//!
//! 只有启动阶段的错误会让进程退出；挂载后每个请求的错误都作为操作结果返回。

mod config;
mod fuse;
mod log;

use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ::fs::SocFs;
use fuser::MountOption;
use mm::{DevMem, RegisterIo};
use soc::{FormatError, SocDescriptor};
use thiserror::Error;
use vfs::FsError;

use crate::config::Config;
use crate::fuse::SocFuse;

/// 启动阶段的致命错误
#[derive(Debug, Error)]
enum StartupError {
    #[error("can't use SoC file {path}: {source}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error("can't open {path}: {source}")]
    Mem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("can't build the inode table: {0}")]
    Inodes(FsError),
    #[error("can't mount on {path}: {source}")]
    Mount {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn load_descriptor(config: &Config) -> Result<SocDescriptor, StartupError> {
    let descriptor_error = |source| StartupError::Descriptor {
        path: config.soc_file.clone(),
        source,
    };

    let soc = SocDescriptor::load(&config.soc_file).map_err(descriptor_error)?;
    if config.strict {
        soc.check_unique_names().map_err(descriptor_error)?;
    } else {
        for path in soc.duplicate_names() {
            ::log::warn!("duplicate name {path} is unreachable, the first match wins");
        }
    }
    Ok(soc)
}

fn open_mem(config: &Config) -> Result<DevMem, StartupError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(&config.mem)
        .map_err(|source| StartupError::Mem {
            path: config.mem.clone(),
            source,
        })?;
    Ok(DevMem::new(file))
}

fn mount_options(config: &Config) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName("socfs".to_string()),
        MountOption::Subtype("socfs".to_string()),
        MountOption::DefaultPermissions,
    ];
    if config.allow_other {
        options.push(MountOption::AllowOther);
    }
    if config.auto_unmount {
        options.push(MountOption::AutoUnmount);
    }
    options
}

fn run(config: &Config) -> Result<(), StartupError> {
    let soc = load_descriptor(config)?;
    let mem = open_mem(config)?;

    let fs = SocFs::new(Arc::new(soc), RegisterIo::new(Arc::new(mem)));
    let fuse = SocFuse::new(fs).map_err(StartupError::Inodes)?;
    ::log::info!(
        "mounting {} inodes on {}",
        fuse.inodes().len(),
        config.mountpoint.display()
    );

    fuser::mount2(fuse, &config.mountpoint, &mount_options(config)).map_err(|source| {
        StartupError::Mount {
            path: config.mountpoint.clone(),
            source,
        }
    })
}

fn main() -> ExitCode {
    let config = match Config::try_from_env() {
        Ok(config) => config,
        Err(err) => {
            // --help/--version 输出到 stdout 并正常退出
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = log::init(config.log_level) {
        eprintln!("socfs: {err}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("socfs: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use test_support::DescriptorImage;

    use super::*;

    fn config_for(soc_file: PathBuf, strict: bool) -> Config {
        let mut args = vec![
            "socfs".to_string(),
            format!("--soc_file={}", soc_file.display()),
            "/mnt".to_string(),
        ];
        if strict {
            args.push("--strict".to_string());
        }
        Config::try_parse_from(args).unwrap()
    }

    fn write_duplicate_image(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("socfs-{}-{name}", std::process::id()));
        DescriptorImage::new("soc")
            .group("cpu", &[("ctrl", 0x10, 32), ("ctrl", 0x14, 32)])
            .write_to(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_duplicates_warned_by_default() {
        let path = write_duplicate_image("dup-default.soc");
        let result = load_descriptor(&config_for(path.clone(), false));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(result.unwrap().register_count(), 2);
    }

    #[test]
    fn test_duplicates_rejected_when_strict() {
        let path = write_duplicate_image("dup-strict.soc");
        let result = load_descriptor(&config_for(path.clone(), true));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(StartupError::Descriptor {
                source: FormatError::DuplicateName(_),
                ..
            })
        ));
    }

    #[test]
    fn test_missing_mem_device() {
        let mut config = config_for(PathBuf::from("unused.soc"), false);
        config.mem = std::env::temp_dir().join("socfs-no-such-mem-device");
        assert!(matches!(open_mem(&config), Err(StartupError::Mem { .. })));
    }

    #[test]
    fn test_mount_options() {
        let mut config = config_for(PathBuf::from("a.soc"), false);
        assert_eq!(mount_options(&config).len(), 3);

        config.allow_other = true;
        config.auto_unmount = true;
        let options = mount_options(&config);
        assert!(options.contains(&MountOption::AllowOther));
        assert!(options.contains(&MountOption::AutoUnmount));
    }
}
