use winit::keyboard::{Key, NamedKey};

/// What a key press asks the app to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    SelectNext,
    SelectPrev,
    /// Nudge the selected parameter by this many steps.
    Adjust(i32),
    TogglePause,
    Reseed,
    ToggleCapture,
    CycleCaptureFormat,
    ToggleGlow,
    ToggleWireframe,
    CycleShape,
    Help,
    Quit,
}

/// Steps per Up/Down press while Shift is held.
pub const COARSE_STEPS: i32 = 10;

pub const HELP: &[&str] = &[
    "Tab / Shift+Tab   select parameter",
    "Up / Down         adjust selected (Shift: x10)",
    "Space             pause / resume",
    "R                 reseed and rebuild rings and shapes",
    "C                 start / stop capture",
    "F                 switch capture format (gif / png sequence)",
    "G                 toggle glow",
    "W                 toggle wireframe",
    "S                 cycle shape",
    "H                 show this help",
    "Esc               quit",
];

pub fn action_for_key(key: &Key, shift: bool) -> Option<Action> {
    let steps = if shift { COARSE_STEPS } else { 1 };
    match key {
        Key::Named(NamedKey::Tab) if shift => Some(Action::SelectPrev),
        Key::Named(NamedKey::Tab) => Some(Action::SelectNext),
        Key::Named(NamedKey::ArrowUp) => Some(Action::Adjust(steps)),
        Key::Named(NamedKey::ArrowDown) => Some(Action::Adjust(-steps)),
        Key::Named(NamedKey::Space) => Some(Action::TogglePause),
        Key::Named(NamedKey::Escape) => Some(Action::Quit),
        Key::Character(c) => match c.to_ascii_lowercase().as_str() {
            "r" => Some(Action::Reseed),
            "c" => Some(Action::ToggleCapture),
            "f" => Some(Action::CycleCaptureFormat),
            "g" => Some(Action::ToggleGlow),
            "w" => Some(Action::ToggleWireframe),
            "s" => Some(Action::CycleShape),
            "h" | "?" => Some(Action::Help),
            " " => Some(Action::TogglePause),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(s: &str) -> Key {
        Key::Character(s.into())
    }

    #[test]
    fn tab_direction_follows_shift() {
        assert_eq!(action_for_key(&Key::Named(NamedKey::Tab), false), Some(Action::SelectNext));
        assert_eq!(action_for_key(&Key::Named(NamedKey::Tab), true), Some(Action::SelectPrev));
    }

    #[test]
    fn arrows_adjust_with_coarse_shift() {
        assert_eq!(action_for_key(&Key::Named(NamedKey::ArrowUp), false), Some(Action::Adjust(1)));
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::ArrowDown), true),
            Some(Action::Adjust(-COARSE_STEPS))
        );
    }

    #[test]
    fn letters_are_case_insensitive() {
        assert_eq!(action_for_key(&ch("c"), false), Some(Action::ToggleCapture));
        assert_eq!(action_for_key(&ch("C"), true), Some(Action::ToggleCapture));
        assert_eq!(action_for_key(&ch("W"), true), Some(Action::ToggleWireframe));
        assert_eq!(action_for_key(&ch("s"), false), Some(Action::CycleShape));
        assert_eq!(action_for_key(&ch("x"), false), None);
    }

    #[test]
    fn escape_quits_and_space_pauses() {
        assert_eq!(action_for_key(&Key::Named(NamedKey::Escape), false), Some(Action::Quit));
        assert_eq!(action_for_key(&Key::Named(NamedKey::Space), false), Some(Action::TogglePause));
    }

    #[test]
    fn help_describes_every_letter_key() {
        for key in ["R ", "C ", "F ", "G ", "W ", "S ", "H "] {
            assert!(HELP.iter().any(|l| l.starts_with(key)), "no help for {key}");
        }
        // reseeding rebuilds both pools
        let reseed = HELP.iter().find(|l| l.starts_with("R ")).unwrap();
        assert!(reseed.contains("rings") && reseed.contains("shapes"));
    }
}
