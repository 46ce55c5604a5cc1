use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 上游接口返回的单个表情包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meme {
    #[schema(example = "181913649")]
    pub id: String,
    #[schema(example = "Drake Hotline Bling")]
    pub name: String,
    #[schema(example = "https://i.imgflip.com/30b1gx.jpg")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_count: Option<u32>,
}
