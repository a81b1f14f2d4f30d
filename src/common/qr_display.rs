use colored::Colorize;
use qrcode::QrCode;
use qrcode::types::QrError;

/// 把下载链接渲染成终端里的二维码
pub fn render_qr(url: &str) -> Result<String, QrError> {
    let code = QrCode::new(url)?;
    Ok(code
        .render::<qrcode::render::unicode::Dense1x2>()
        .quiet_zone(true)
        .module_dimensions(1, 1)
        .build())
}

pub fn display_qr(url: &str) -> Result<(), QrError> {
    let image = render_qr(url)?;
    println!("{}: {}", "扫描二维码下载".green(), url);
    print!("\n{}\n", image);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_non_empty_block() {
        let image = render_qr("http://127.0.0.1:9898/download/CN1.pdf").unwrap();
        assert!(image.lines().count() > 10);
    }
}
