//! 测试支持 crate
//!
//! 提供描述文件镜像构造器和 Mock 实现，用于各 crate 的集成测试

pub mod image;
pub mod mock;

pub use image::DescriptorImage;
pub use mock::SimPhysMem;
