use std::path::Path;

use tracing::info;

pub fn file_location_lines(encrypted_json_path: &Path, image_path: &Path) -> [String; 2] {
    [
        format!("Encrypted meme JSON file location: {}", encrypted_json_path.display()),
        format!("Meme image file location: {}", image_path.display()),
    ]
}

/// 先输出加密 JSON 的位置，再输出图片位置
pub fn log_file_locations(encrypted_json_path: impl AsRef<Path>, image_path: impl AsRef<Path>) {
    for line in file_location_lines(encrypted_json_path.as_ref(), image_path.as_ref()) {
        info!("{}", line);
    }
}
