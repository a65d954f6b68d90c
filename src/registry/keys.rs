//! Display names for keys.

/// Debug-style representation, e.g. `'a'` or `'\u{1b}'`
pub fn key_repr(ch: char) -> String {
    format!("{:?}", ch)
}

/// Human-friendly name used when listing hotkeys
pub fn key_display(ch: char) -> String {
    let name = match ch {
        '\x1b' => "(esc)",
        '\r' | '\n' => "(enter)",
        '\t' => "(tab)",
        ' ' => "(space)",
        '\x7f' | '\x08' => "(backspace)",
        c if (c as u32) < 0x20 => return format!("(ctrl+{})", ((c as u8) | 0x60) as char),
        c => return c.to_string(),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_repr() {
        assert_eq!(key_repr('a'), "'a'");
        assert_eq!(key_repr('\x1b'), "'\\u{1b}'");
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key_display('h'), "h");
        assert_eq!(key_display(' '), "(space)");
        assert_eq!(key_display('\x1b'), "(esc)");
        assert_eq!(key_display('\x01'), "(ctrl+a)");
        assert_eq!(key_display('\x1a'), "(ctrl+z)");
    }
}
