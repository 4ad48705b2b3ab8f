use rand::Rng;
use rand::distributions::Alphanumeric;

pub const GIFT_CODE_LENGTH: usize = 8;

/// 生成礼品码: 8 位大写字母 + 数字
pub fn generate_gift_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GIFT_CODE_LENGTH)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}
