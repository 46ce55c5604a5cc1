use crate::models::meme::Meme;

/// 按名称过滤表情包，大小写不敏感的子串匹配，保持原有顺序
pub fn filter_by_name<'a>(memes: &'a [Meme], keyword: &str) -> Vec<&'a Meme> {
    let keyword = keyword.to_lowercase();
    memes
        .iter()
        .filter(|meme| meme.name.to_lowercase().contains(&keyword))
        .collect()
}
