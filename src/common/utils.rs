use chrono::{DateTime, Local};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// 文件大小格式化，1024 进制，保留两位小数并去掉末尾的 0
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// unix 秒转本地时间字符串
pub fn format_modified_time(unix_secs: f64) -> String {
    let secs = unix_secs.trunc() as i64;
    let nanos = (unix_secs.fract() * 1e9) as u32;
    match DateTime::from_timestamp(secs, nanos) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}
