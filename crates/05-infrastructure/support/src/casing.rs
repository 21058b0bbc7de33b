//! 创建方法命名用的大小写转换

/// 转换为蛇形命名
///
/// 小写或数字后紧跟大写字母时插入下划线，连字符、空格和点视为分隔符。
///
/// ```
/// use support::casing::snake;
///
/// assert_eq!(snake("MySQL"), "my_sql");
/// assert_eq!(snake("redis-cluster"), "redis_cluster");
/// assert_eq!(snake("s3"), "s3");
/// ```
pub fn snake(value: &str) -> String {
    let mut output = String::with_capacity(value.len() + 4);
    let mut previous: Option<char> = None;

    for ch in value.chars() {
        if matches!(ch, '-' | ' ' | '.' | '_') {
            if !output.is_empty() && !output.ends_with('_') {
                output.push('_');
            }
            previous = None;
            continue;
        }

        if ch.is_uppercase()
            && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
            && !output.ends_with('_')
        {
            output.push('_');
        }
        output.extend(ch.to_lowercase());
        previous = Some(ch);
    }

    while output.ends_with('_') {
        output.pop();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::snake;

    #[test]
    fn splits_camel_and_separators() {
        assert_eq!(snake("sqlite"), "sqlite");
        assert_eq!(snake("PostgreSQL"), "postgre_sql");
        assert_eq!(snake("fileSystem"), "file_system");
        assert_eq!(snake("redis--cluster "), "redis_cluster");
        assert_eq!(snake("driver"), "driver");
        assert_eq!(snake(""), "");
    }
}
