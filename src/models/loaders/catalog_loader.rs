use std::collections::HashMap;
use std::path::Path;

use phf::phf_map;
use tokio::fs;

use crate::error::CatalogError;
use crate::models::question_image::{Catalog, QuestionImage};

/// 允许的图片扩展名（小写）及其 Content-Type
static IMAGE_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
};

/// 文件名是否以受支持的图片扩展名结尾（忽略大小写）
pub fn is_image_file(file_name: &str) -> bool {
    image_content_type(file_name).is_some()
}

/// 图片的 Content-Type；不是受支持的图片时返回 `None`
pub fn image_content_type(file_name: &str) -> Option<&'static str> {
    let ext = extension_of(file_name)?.to_ascii_lowercase();
    IMAGE_TYPES.get(ext.as_str()).copied()
}

/// 从文件名推导题号
///
/// `Q01_blur.png` → `Q01`；没有 `_` 时取去掉扩展名的文件名
pub fn derive_identifier(file_name: &str) -> String {
    match file_name.split_once('_') {
        Some((prefix, _)) => prefix.to_string(),
        None => match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => file_name.to_string(),
        },
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

/// 从目录加载题目列表
///
/// 只读取目录，按文件名字典序排序，拒绝空题号和重复题号
pub async fn load_catalog(image_dir: &Path) -> Result<Catalog, CatalogError> {
    let dir_display = image_dir.display().to_string();

    if !fs::try_exists(image_dir).await.unwrap_or(false) {
        return Err(CatalogError::DirectoryNotFound { path: dir_display });
    }

    let read_failed = |e: std::io::Error| CatalogError::ReadFailed {
        path: dir_display.clone(),
        source: Box::new(e),
    };

    let mut entries = fs::read_dir(image_dir).await.map_err(read_failed)?;
    let mut images = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let file_type = entry.file_type().await.map_err(read_failed)?;
        if !file_type.is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if !is_image_file(&file_name) {
            tracing::debug!("跳过非图片文件: {}", file_name);
            continue;
        }

        images.push(QuestionImage::new(
            derive_identifier(&file_name),
            file_name,
            entry.path(),
        ));
    }

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for img in &images {
        if img.identifier.is_empty() {
            return Err(CatalogError::EmptyIdentifier {
                file_name: img.file_name.clone(),
            });
        }
        if let Some(first) = seen.insert(&img.identifier, &img.file_name) {
            return Err(CatalogError::DuplicateIdentifier {
                identifier: img.identifier.clone(),
                first: first.to_string(),
                second: img.file_name.clone(),
            });
        }
    }

    tracing::info!("✓ 从 {} 加载了 {} 道题目", dir_display, images.len());

    Ok(Catalog::from_sorted(images))
}
