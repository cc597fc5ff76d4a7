use crate::common::Toast;

const BELL: char = '\u{7}';

pub fn render(toast: &Toast) -> String {
    let mut line = String::new();
    if toast.play_sound {
        line.push(BELL);
    }
    line.push_str(&format!("[!] {}", toast.title));
    if !toast.body.is_empty() {
        line.push_str(&format!(": {}", toast.body));
    }
    line
}

pub fn render_error(message: &str) -> String {
    format!("[error] {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_only_when_sound_enabled() {
        let mut toast = Toast {
            title: "New like".into(),
            body: "Huy liked your photo".into(),
            related_id: None,
            play_sound: true,
        };
        assert!(render(&toast).starts_with(BELL));

        toast.play_sound = false;
        assert_eq!(render(&toast), "[!] New like: Huy liked your photo");
    }
}
