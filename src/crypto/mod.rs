//! AES-256-CBC 加密 JSON 负载。
//!
//! 密文使用标准 base64 (带填充) 编码，key 与 iv 取字符串的 UTF-8 字节。

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;

use crate::utils::error::{AppError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

fn key_and_iv<'a>(key: &'a str, iv: &'a str) -> Result<(&'a [u8], &'a [u8])> {
    let (key, iv) = (key.as_bytes(), iv.as_bytes());
    if key.len() != KEY_LEN {
        return Err(AppError::Crypto(format!(
            "invalid key length: expected {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    if iv.len() != IV_LEN {
        return Err(AppError::Crypto(format!(
            "invalid iv length: expected {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    Ok((key, iv))
}

/// 序列化为 JSON 后加密，返回 base64 文本
pub fn encrypt_json<T: Serialize + ?Sized>(value: &T, key: &str, iv: &str) -> Result<String> {
    let (key, iv) = key_and_iv(key, iv)?;
    let plaintext = serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("failed to serialize payload: {e}")))?;

    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| AppError::Crypto(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(STANDARD.encode(ciphertext))
}

/// 解密 `encrypt_json` 的输出，返回原始 JSON 文本
pub fn decrypt_json(encoded: &str, key: &str, iv: &str) -> Result<String> {
    let (key, iv) = key_and_iv(key, iv)?;
    let ciphertext = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Crypto(format!("base64 decoding failed: {e}")))?;

    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| AppError::Crypto(e.to_string()))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| AppError::Crypto("decryption failed: bad padding".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| AppError::Crypto("decrypted payload is not UTF-8".to_string()))
}
