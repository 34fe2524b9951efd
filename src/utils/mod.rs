pub mod csv_handler;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 小写 base36 随机串（访客 ID、上传文件名后缀）
pub fn random_base36(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| BASE36[rand::random_range(0..BASE36.len())] as char)
        .take(length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_base36() {
        let s = random_base36(11);
        assert_eq!(s.len(), 11);
        assert!(s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(random_base36(16), random_base36(16));
    }
}
