use std::path::{Path, PathBuf};

use serde::Serialize;

/// 一道对比题对应的图片
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionImage {
    /// 题号（文件名第一个 `_` 之前的部分）
    pub identifier: String,
    /// 文件名
    pub file_name: String,
    /// 完整路径
    pub path: PathBuf,
}

impl QuestionImage {
    pub fn new(identifier: impl Into<String>, file_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            file_name: file_name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 题目目录
///
/// 按文件名字典序排列，题号唯一。每次会话都按这个顺序展示题目，
/// 提交的结果列也按这个顺序排列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    images: Vec<QuestionImage>,
}

impl Catalog {
    /// 调用方保证 `images` 已排序且题号唯一（见 `load_catalog`）
    pub(crate) fn from_sorted(images: Vec<QuestionImage>) -> Self {
        Self { images }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[QuestionImage] {
        &self.images
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|img| img.identifier.as_str())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.images.iter().any(|img| img.identifier == identifier)
    }

    /// 按文件名查找（图片路由只允许访问目录中的文件）
    pub fn find_by_file_name(&self, file_name: &str) -> Option<&QuestionImage> {
        self.images.iter().find(|img| img.file_name == file_name)
    }
}
